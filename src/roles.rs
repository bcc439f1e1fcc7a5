//! Role profiles: `<account>:<role>` assuming `role_arn` from an IAM or MFA
//! source profile.

use anyhow::Result;
use tracing::info;

use crate::error::ProfileError;
use crate::profile::{IAM_SUFFIX, MFA_SUFFIX, ProfileName, validate_segment};
use crate::store::{ProfileStore, keys};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleProfile {
    pub profile: String,
    pub source_profile: String,
    pub role_arn: String,
}

/// Write `<account>:<role>` pointing at `<account>:iam` or `<account>:mfa`.
///
/// Re-running with a different ARN overwrites the previous one.
pub fn create_role(
    store: &impl ProfileStore,
    account: &str,
    role: &str,
    role_arn: &str,
    use_iam: bool,
) -> Result<RoleProfile> {
    validate_segment("account name", account)?;
    validate_segment("role name", role)?;
    if role == IAM_SUFFIX || role == MFA_SUFFIX {
        return Err(ProfileError::InvalidName {
            what: "role name",
            name: role.to_string(),
            reason: "reserved for account profiles",
        }
        .into());
    }

    let source = if use_iam {
        ProfileName::iam(account)
    } else {
        ProfileName::mfa(account)
    }
    .to_string();

    if !store.profile_exists(&source)? {
        let hint = if use_iam {
            format!("Use 'awsprof create-account {account}' first.")
        } else {
            format!("Use 'awsprof refresh {source}' to create it, or pass --iam.")
        };
        return Err(ProfileError::not_found_with_hint(source, hint).into());
    }

    let profile = ProfileName::role(account, role).to_string();
    store.set_config_value(&profile, keys::ROLE_ARN, role_arn)?;
    store.set_config_value(&profile, keys::SOURCE_PROFILE, &source)?;

    info!(%profile, %source, "Wrote role profile");
    Ok(RoleProfile {
        profile,
        source_profile: source,
        role_arn: role_arn.to_string(),
    })
}
