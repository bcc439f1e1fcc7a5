//! Account management: the `<account>:iam` profiles holding long-lived keys.

use anyhow::Result;
use std::path::Path;
use tracing::info;

use crate::credentials_file::{AccessKeys, read_access_keys};
use crate::error::ProfileError;
use crate::profile::{ProfileName, validate_segment};
use crate::prompt::Prompter;
use crate::store::{ProfileStore, keys};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountOutcome {
    Created { profile: String },
    Updated { profile: String },
    /// Nothing was written
    AlreadyExists { profile: String },
}

/// Create `<name>:iam`. An existing account is left untouched.
pub fn create_account(
    store: &impl ProfileStore,
    prompter: &impl Prompter,
    name: &str,
    file: Option<&Path>,
) -> Result<AccountOutcome> {
    validate_segment("account name", name)?;
    let profile = ProfileName::iam(name).to_string();

    if store.profile_exists(&profile)? {
        return Ok(AccountOutcome::AlreadyExists { profile });
    }

    write_keys(store, prompter, &profile, file)?;
    info!(%profile, "Created account");
    Ok(AccountOutcome::Created { profile })
}

/// Replace the keys of an existing `<name>:iam`
pub fn edit_account(
    store: &impl ProfileStore,
    prompter: &impl Prompter,
    name: &str,
    file: Option<&Path>,
) -> Result<AccountOutcome> {
    let profile = ProfileName::iam(name).to_string();

    if !store.profile_exists(&profile)? {
        return Err(ProfileError::not_found_with_hint(
            profile,
            format!("Use 'awsprof create-account {name}' to add it."),
        )
        .into());
    }

    write_keys(store, prompter, &profile, file)?;
    info!(%profile, "Updated account keys");
    Ok(AccountOutcome::Updated { profile })
}

fn write_keys(
    store: &impl ProfileStore,
    prompter: &impl Prompter,
    profile: &str,
    file: Option<&Path>,
) -> Result<()> {
    let access_keys = match file {
        Some(path) => read_access_keys(path)?,
        None => AccessKeys {
            access_key_id: prompter.secret(&format!("Access key ID for {profile}:"))?,
            secret_access_key: prompter.secret(&format!("Secret access key for {profile}:"))?,
        },
    };

    store.set_config_value(profile, keys::ACCESS_KEY_ID, &access_keys.access_key_id)?;
    store.set_config_value(profile, keys::SECRET_ACCESS_KEY, &access_keys.secret_access_key)?;
    Ok(())
}
