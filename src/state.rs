//! Persistent record of the last active profile.
//!
//! A child process cannot change its parent shell's `AWS_PROFILE`, so the
//! indicator outlives a command through `~/.awsprof/state.json`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::warn;

/// State stored in ~/.awsprof/state.json
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct State {
    /// The last profile made active
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_profile: Option<String>,

    /// When the state was last updated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl State {
    /// Read state from file, returning default if file doesn't exist
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {:?}", path))
    }

    /// Like [`State::read`], but an unreadable file is logged and ignored
    pub fn load(path: &Path) -> Self {
        Self::read(path).unwrap_or_else(|e| {
            warn!("Ignoring state file: {e:#}");
            Self::default()
        })
    }
}

/// A locked state file handle for safe concurrent access
pub struct LockedState {
    file: File,
    state: State,
    path: std::path::PathBuf,
}

impl LockedState {
    /// Open and lock the state file for exclusive access
    pub fn lock(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create state directory: {:?}", parent))?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("Failed to open state file: {:?}", path))?;

        // Blocks until any other awsprof process releases it
        file.lock_exclusive()
            .with_context(|| format!("Failed to lock state file: {:?}", path))?;

        let state = Self::read_from_file(&file, path)?;

        Ok(Self {
            file,
            state,
            path: path.to_path_buf(),
        })
    }

    fn read_from_file(mut file: &File, path: &Path) -> Result<State> {
        let mut content = String::new();
        file.read_to_string(&mut content)
            .with_context(|| format!("Failed to read state file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(State::default());
        }

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {:?}", path))
    }

    /// Update and save the state
    pub fn update<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut State),
    {
        f(&mut self.state);
        self.state.updated_at = Some(Utc::now());
        self.save()
    }

    fn save(&mut self) -> Result<()> {
        let content =
            serde_json::to_string_pretty(&self.state).context("Failed to serialize state")?;

        self.file
            .set_len(0)
            .with_context(|| format!("Failed to truncate state file: {:?}", self.path))?;
        self.file
            .seek(SeekFrom::Start(0))
            .with_context(|| format!("Failed to seek state file: {:?}", self.path))?;
        self.file
            .write_all(content.as_bytes())
            .with_context(|| format!("Failed to write state file: {:?}", self.path))?;
        self.file
            .sync_all()
            .with_context(|| format!("Failed to sync state file: {:?}", self.path))?;

        Ok(())
    }
}

impl Drop for LockedState {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// Record `profile` (or its absence) as the last active profile
pub fn persist_active(path: &Path, profile: Option<&str>) -> Result<()> {
    let mut locked = LockedState::lock(path)?;
    locked.update(|s| s.active_profile = profile.map(String::from))
}
