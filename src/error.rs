//! Typed failures surfaced by the profile managers.
//!
//! Command handlers wrap these in `anyhow::Error`; tests downcast to match
//! on the variant.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    /// A profile the operation depends on is not configured
    #[error("Profile '{profile}' does not exist{hint}")]
    NotFound { profile: String, hint: String },

    /// A credential file path that does not exist
    #[error("Credential file not found: {}", .0.display())]
    InvalidPath(PathBuf),

    /// `sts get-session-token` reported failure
    #[error("Token exchange for '{profile}' failed:\n{response}")]
    TokenExchangeFailure { profile: String, response: String },

    #[error("Invalid {what} '{name}': {reason}")]
    InvalidName {
        what: &'static str,
        name: String,
        reason: &'static str,
    },
}

impl ProfileError {
    pub fn not_found(profile: impl Into<String>) -> Self {
        Self::NotFound {
            profile: profile.into(),
            hint: String::new(),
        }
    }

    pub fn not_found_with_hint(profile: impl Into<String>, hint: impl AsRef<str>) -> Self {
        Self::NotFound {
            profile: profile.into(),
            hint: format!(".\nHint: {}", hint.as_ref()),
        }
    }
}
