//! Access key CSV import.
//!
//! The IAM console offers new access keys as a CSV download with the
//! columns `Access key ID` and `Secret access key` (newer exports add user
//! name and console link columns, which are ignored).

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::Path;

use crate::error::ProfileError;

/// Long-lived key pair for an IAM profile
#[derive(Clone, PartialEq, Eq)]
pub struct AccessKeys {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl std::fmt::Debug for AccessKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessKeys")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"****")
            .finish()
    }
}

#[derive(Deserialize)]
struct Row {
    #[serde(rename = "Access key ID")]
    access_key_id: String,
    #[serde(rename = "Secret access key")]
    secret_access_key: String,
}

/// Read the first key pair from an access key CSV
pub fn read_access_keys(path: &Path) -> Result<AccessKeys> {
    if !path.is_file() {
        return Err(ProfileError::InvalidPath(path.to_path_buf()).into());
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open credential file: {}", path.display()))?;

    let Some(row) = reader.deserialize::<Row>().next() else {
        bail!("Credential file has no key rows: {}", path.display());
    };
    let row = row.with_context(|| {
        format!(
            "Failed to read credential file: {}\nHint: Expected columns 'Access key ID' and 'Secret access key'.",
            path.display()
        )
    })?;

    if row.access_key_id.is_empty() || row.secret_access_key.is_empty() {
        bail!("Credential file has an empty key: {}", path.display());
    }

    Ok(AccessKeys {
        access_key_id: row.access_key_id,
        secret_access_key: row.secret_access_key,
    })
}
