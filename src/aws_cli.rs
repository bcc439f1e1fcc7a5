//! [`ProfileStore`] and [`TokenExchange`] backed by the AWS CLI.
//!
//! Every operation spawns the CLI and waits for it. Child processes get the
//! active profile as `AWS_PROFILE`, or no `AWS_PROFILE` at all while the
//! indicator is suspended.

use anyhow::{Context, Result, bail};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use tracing::{debug, info};

use crate::active::{ActiveProfile, PROFILE_ENV_VAR};
use crate::error::ProfileError;
use crate::store::{ProfileStore, SessionCredentials, TokenExchange, TokenRequest, keys};

/// Default program name, resolved through `PATH`
pub const DEFAULT_PROGRAM: &str = "aws";

#[derive(Debug, Clone)]
pub struct AwsCli {
    program: PathBuf,
    active: ActiveProfile,
}

impl AwsCli {
    pub fn new(program: impl Into<PathBuf>, active: ActiveProfile) -> Self {
        Self {
            program: program.into(),
            active,
        }
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(args).stdin(Stdio::null());
        if let Some(profile) = self.active.get() {
            cmd.env(PROFILE_ENV_VAR, profile);
        } else {
            cmd.env_remove(PROFILE_ENV_VAR);
        }
        cmd
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        debug!(
            program = %self.program.display(),
            args = %redact(args),
            ambient = ?self.active.get(),
            "Running AWS CLI"
        );

        let output = self.command(args).output().with_context(|| {
            format!(
                "Failed to run '{}'.\nHint: Install the AWS CLI or point --aws-cli at it.",
                self.program.display()
            )
        })?;

        debug!(status = %output.status, "AWS CLI exited");
        Ok(output)
    }
}

impl ProfileStore for AwsCli {
    fn list_profiles(&self) -> Result<BTreeSet<String>> {
        let output = self.run(&["configure", "list-profiles"])?;
        if !output.status.success() {
            bail!(
                "Failed to list profiles: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }

    fn get_config_value(&self, profile: &str, key: &str) -> Result<Option<String>> {
        let output = self.run(&["configure", "--profile", profile, "get", key])?;

        // `configure get` exits 1 when the key is unset
        if output.status.code() == Some(1) {
            return Ok(None);
        }
        if !output.status.success() {
            bail!(
                "Failed to read '{}' from profile '{}': {}",
                key,
                profile,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(Some(value).filter(|v| !v.is_empty()))
    }

    fn set_config_value(&self, profile: &str, key: &str, value: &str) -> Result<()> {
        let output = self.run(&["configure", "--profile", profile, "set", key, value])?;
        if !output.status.success() {
            bail!(
                "Failed to set '{}' on profile '{}': {}",
                key,
                profile,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        info!(profile, key, "Updated profile");
        Ok(())
    }
}

impl TokenExchange for AwsCli {
    fn get_session_token(&self, request: &TokenRequest) -> Result<SessionCredentials> {
        let duration = request.duration_secs.to_string();
        let output = self.run(&[
            "sts",
            "get-session-token",
            "--profile",
            &request.profile,
            "--serial-number",
            &request.serial_number,
            "--token-code",
            &request.token_code,
            "--duration-seconds",
            &duration,
            "--output",
            "json",
        ])?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let response = [stdout.trim(), stderr.trim()]
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join("\n");
            return Err(ProfileError::TokenExchangeFailure {
                profile: request.profile.clone(),
                response,
            }
            .into());
        }

        Ok(SessionCredentials::from_response(&request.profile, &stdout)?)
    }
}

/// Render CLI arguments for logging with secrets masked
fn redact(args: &[&str]) -> String {
    let mut rendered: Vec<&str> = args.to_vec();
    for (i, arg) in args.iter().enumerate() {
        let masked = match *arg {
            "--token-code" => Some(i + 1),
            "set" if args.get(i + 1).is_some_and(|k| keys::is_secret(k)) => Some(i + 2),
            _ => None,
        };
        if let Some(slot) = masked.and_then(|j| rendered.get_mut(j)) {
            *slot = "****";
        }
    }
    rendered.join(" ")
}
