use anyhow::{Context, Result};
use directories::BaseDirs;
use std::path::PathBuf;

/// All computed paths used by awsprof
#[derive(Debug, Clone)]
pub struct Paths {
    /// ~/.awsprof
    pub base_dir: PathBuf,
    /// ~/.awsprof/state.json
    pub state_file: PathBuf,
}

impl Paths {
    pub fn new() -> Result<Self> {
        let base_dirs = BaseDirs::new().context("Failed to determine home directory")?;
        Ok(Self::with_base(base_dirs.home_dir().join(".awsprof")))
    }

    pub fn with_base(base_dir: PathBuf) -> Self {
        let state_file = base_dir.join("state.json");
        Self {
            base_dir,
            state_file,
        }
    }
}
