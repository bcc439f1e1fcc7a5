//! Profile store contract.
//!
//! The managers only talk to these traits. [`crate::aws_cli::AwsCli`] backs
//! them with the AWS CLI; tests use an in-memory store.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeSet;

use crate::error::ProfileError;

/// Config keys written into the AWS config/credentials files
pub mod keys {
    pub const ACCESS_KEY_ID: &str = "aws_access_key_id";
    pub const SECRET_ACCESS_KEY: &str = "aws_secret_access_key";
    pub const SESSION_TOKEN: &str = "aws_session_token";
    pub const MFA_SERIAL: &str = "mfa_serial";
    pub const ROLE_ARN: &str = "role_arn";
    pub const SOURCE_PROFILE: &str = "source_profile";

    /// Keys whose values must never reach the logs
    pub fn is_secret(key: &str) -> bool {
        matches!(key, SECRET_ACCESS_KEY | SESSION_TOKEN)
    }
}

/// Validity window requested for MFA session credentials (24h)
pub const SESSION_DURATION_SECS: u32 = 86_400;

pub trait ProfileStore {
    /// All configured profile names, sorted
    fn list_profiles(&self) -> Result<BTreeSet<String>>;

    fn profile_exists(&self, name: &str) -> Result<bool> {
        Ok(self.list_profiles()?.contains(name))
    }

    /// Value of `key` in `profile`, or `None` when unset
    fn get_config_value(&self, profile: &str, key: &str) -> Result<Option<String>>;

    fn set_config_value(&self, profile: &str, key: &str, value: &str) -> Result<()>;
}

/// Inputs to `sts get-session-token`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequest {
    /// Profile whose long-lived keys sign the request
    pub profile: String,
    pub serial_number: String,
    pub token_code: String,
    pub duration_secs: u32,
}

pub trait TokenExchange {
    fn get_session_token(&self, request: &TokenRequest) -> Result<SessionCredentials>;
}

/// Temporary credentials returned by the token exchange
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SessionCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    #[serde(default)]
    pub expiration: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SessionTokenResponse {
    credentials: SessionCredentials,
}

impl SessionCredentials {
    /// Parse the JSON body printed by `aws sts get-session-token`
    pub fn from_response(profile: &str, body: &str) -> Result<Self, ProfileError> {
        serde_json::from_str::<SessionTokenResponse>(body)
            .map(|r| r.credentials)
            .map_err(|e| ProfileError::TokenExchangeFailure {
                profile: profile.to_string(),
                response: format!("unexpected response ({e}):\n{body}"),
            })
    }
}
