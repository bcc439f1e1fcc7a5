//! MFA session refresh.
//!
//! An `<account>:mfa` profile holds temporary credentials obtained by
//! exchanging the keys of `<account>:iam` plus an MFA code through
//! `sts get-session-token`. Role profiles sourced from it are refreshed by
//! refreshing the MFA profile behind them.

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::active::ActiveProfile;
use crate::error::ProfileError;
use crate::profile::ProfileName;
use crate::prompt::Prompter;
use crate::selector::pick_profile;
use crate::store::{ProfileStore, SESSION_DURATION_SECS, TokenExchange, TokenRequest, keys};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Long-lived keys back this profile; nothing to refresh
    NotRequired { profile: String },
    Refreshed {
        profile: String,
        mfa_profile: String,
        expiration: Option<DateTime<Utc>>,
    },
}

/// Refresh the MFA session behind `profile` and make `profile` active.
///
/// `profile` is picked interactively when `None`. `code` and `arn` are
/// prompted for when needed and not given. A device ARN already stored on
/// the MFA profile takes precedence over `arn`.
pub fn refresh_session<S>(
    store: &S,
    prompter: &impl Prompter,
    active: &ActiveProfile,
    profile: Option<&str>,
    code: Option<&str>,
    arn: Option<&str>,
) -> Result<RefreshOutcome>
where
    S: ProfileStore + TokenExchange,
{
    let profile = match profile {
        Some(p) => p.to_string(),
        None => pick_profile(store, prompter, "Select the profile to refresh:")?,
    };

    let parsed = ProfileName::parse(&profile);
    if parsed.is_iam() {
        return Ok(RefreshOutcome::NotRequired { profile });
    }

    let mfa = if parsed.is_mfa() {
        parsed
    } else {
        let Some(source) = store.get_config_value(&profile, keys::SOURCE_PROFILE)? else {
            return Err(ProfileError::not_found_with_hint(
                format!("{profile} (source_profile)"),
                format!("'{profile}' has no source profile to refresh."),
            )
            .into());
        };
        let source = ProfileName::parse(&source);
        if source.is_iam() {
            return Ok(RefreshOutcome::NotRequired { profile });
        }
        if !source.is_mfa() {
            bail!(
                "Source profile '{}' of '{}' is not an MFA profile",
                source,
                profile
            );
        }
        source
    };

    let expiration = {
        // Child processes must not run against the profile being refreshed
        let _suspended = active.suspend();
        refresh_mfa(store, prompter, &mfa, code, arn)?
    };

    active.set(profile.as_str());
    Ok(RefreshOutcome::Refreshed {
        profile,
        mfa_profile: mfa.to_string(),
        expiration,
    })
}

fn refresh_mfa<S>(
    store: &S,
    prompter: &impl Prompter,
    mfa: &ProfileName,
    code: Option<&str>,
    arn: Option<&str>,
) -> Result<Option<DateTime<Utc>>>
where
    S: ProfileStore + TokenExchange,
{
    let Some(iam) = mfa.paired_iam() else {
        bail!("'{}' is not an MFA profile", mfa);
    };
    let account = mfa.account().unwrap_or_default().to_string();
    let (mfa, iam) = (mfa.to_string(), iam.to_string());

    if !store.profile_exists(&iam)? {
        return Err(ProfileError::not_found_with_hint(
            iam.clone(),
            format!("Use 'awsprof create-account {account}' first."),
        )
        .into());
    }

    let stored = if store.profile_exists(&mfa)? {
        store.get_config_value(&mfa, keys::MFA_SERIAL)?
    } else {
        None
    };

    let serial_number = match stored {
        Some(serial) => {
            if arn.is_some_and(|a| a != serial) {
                warn!(%mfa, stored = %serial, "Ignoring supplied MFA ARN in favour of the stored one");
            }
            serial
        }
        None => {
            let serial = match arn {
                Some(a) => a.to_string(),
                None => prompter.text(&format!("MFA device ARN for {mfa}:"))?,
            };
            store.set_config_value(&mfa, keys::MFA_SERIAL, &serial)?;
            serial
        }
    };

    let token_code = match code {
        Some(c) => c.to_string(),
        None => prompter.secret(&format!("MFA code for {serial_number}:"))?,
    };

    let credentials = store.get_session_token(&TokenRequest {
        profile: iam,
        serial_number,
        token_code,
        duration_secs: SESSION_DURATION_SECS,
    })?;

    store.set_config_value(&mfa, keys::ACCESS_KEY_ID, &credentials.access_key_id)?;
    store.set_config_value(&mfa, keys::SECRET_ACCESS_KEY, &credentials.secret_access_key)?;
    store.set_config_value(&mfa, keys::SESSION_TOKEN, &credentials.session_token)?;

    info!(profile = %mfa, expiration = ?credentials.expiration, "Refreshed MFA session");
    Ok(credentials.expiration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MemoryStore, ScriptedPrompter};

    const DEVICE: &str = "arn:aws:iam::000000000000:mfa/me";

    fn work_store(active: &ActiveProfile) -> MemoryStore {
        MemoryStore::new(active).with_profile(
            "work:iam",
            &[("aws_access_key_id", "AKIA"), ("aws_secret_access_key", "s")],
        )
    }

    #[test]
    fn test_iam_profile_is_noop() {
        let active = ActiveProfile::new(Some("before".to_string()));
        let store = work_store(&active);
        let prompter = ScriptedPrompter::default();

        let outcome =
            refresh_session(&store, &prompter, &active, Some("work:iam"), None, None).unwrap();

        assert_eq!(
            outcome,
            RefreshOutcome::NotRequired {
                profile: "work:iam".to_string()
            }
        );
        assert!(store.exchanges().is_empty());
        assert!(store.writes().is_empty());
        assert_eq!(active.get().as_deref(), Some("before"));
    }

    #[test]
    fn test_first_refresh_persists_device_and_credentials() {
        let active = ActiveProfile::default();
        let store = work_store(&active);
        let prompter = ScriptedPrompter::default();

        let outcome = refresh_session(
            &store,
            &prompter,
            &active,
            Some("work:mfa"),
            Some("123456"),
            Some(DEVICE),
        )
        .unwrap();

        assert!(matches!(outcome, RefreshOutcome::Refreshed { .. }));
        let exchanges = store.exchanges();
        assert_eq!(exchanges.len(), 1);
        let (request, _) = &exchanges[0];
        assert_eq!(request.profile, "work:iam");
        assert_eq!(request.serial_number, DEVICE);
        assert_eq!(request.token_code, "123456");
        assert_eq!(request.duration_secs, 86_400);

        let mfa = store.profile("work:mfa");
        assert_eq!(mfa["mfa_serial"], DEVICE);
        assert_eq!(mfa["aws_access_key_id"], "ASIA1");
        assert_eq!(mfa["aws_secret_access_key"], "ASIA1-secret");
        assert_eq!(mfa["aws_session_token"], "ASIA1-token");
        assert_eq!(active.get().as_deref(), Some("work:mfa"));
    }

    #[test]
    fn test_stored_device_wins_over_supplied_arn() {
        let active = ActiveProfile::default();
        let store = work_store(&active).with_profile("work:mfa", &[("mfa_serial", DEVICE)]);
        let prompter = ScriptedPrompter::default();

        refresh_session(
            &store,
            &prompter,
            &active,
            Some("work:mfa"),
            Some("123456"),
            Some("arn:aws:iam::000000000000:mfa/someone-else"),
        )
        .unwrap();

        assert_eq!(store.exchanges()[0].0.serial_number, DEVICE);
        assert_eq!(store.value("work:mfa", "mfa_serial").unwrap(), DEVICE);
    }

    #[test]
    fn test_unreadable_device_is_not_overwritten() {
        let active = ActiveProfile::default();
        let store = work_store(&active).with_profile("work:mfa", &[("mfa_serial", DEVICE)]);
        store.fail_reads("config file is not valid");
        let prompter = ScriptedPrompter::default();

        let err = refresh_session(
            &store,
            &prompter,
            &active,
            Some("work:mfa"),
            Some("123456"),
            Some("arn:aws:iam::000000000000:mfa/someone-else"),
        )
        .unwrap_err();

        assert!(err.to_string().contains("not valid"));
        assert!(store.writes().is_empty());
        assert!(store.exchanges().is_empty());
        assert_eq!(store.value("work:mfa", "mfa_serial").unwrap(), DEVICE);
    }

    #[test]
    fn test_prompts_for_missing_arn_and_code() {
        let active = ActiveProfile::default();
        let store = work_store(&active);
        let prompter = ScriptedPrompter::new(&[DEVICE, "654321"]);

        refresh_session(&store, &prompter, &active, Some("work:mfa"), None, None).unwrap();

        assert_eq!(prompter.asked().len(), 2);
        assert_eq!(store.value("work:mfa", "mfa_serial").unwrap(), DEVICE);
        assert_eq!(store.exchanges()[0].0.token_code, "654321");
    }

    #[test]
    fn test_role_refreshes_its_mfa_source() {
        let active = ActiveProfile::new(Some("work:admin".to_string()));
        let store = work_store(&active)
            .with_profile("work:mfa", &[("mfa_serial", DEVICE)])
            .with_profile(
                "work:admin",
                &[("role_arn", "arn:aws:iam::0:role/Admin"), ("source_profile", "work:mfa")],
            );
        let prompter = ScriptedPrompter::default();

        let outcome = refresh_session(
            &store,
            &prompter,
            &active,
            Some("work:admin"),
            Some("111111"),
            None,
        )
        .unwrap();

        assert_eq!(
            outcome,
            RefreshOutcome::Refreshed {
                profile: "work:admin".to_string(),
                mfa_profile: "work:mfa".to_string(),
                expiration: None,
            }
        );
        let (_, ambient) = &store.exchanges()[0];
        assert!(ambient.is_none(), "exchange ran with {ambient:?} active");
        assert_eq!(active.get().as_deref(), Some("work:admin"));
    }

    #[test]
    fn test_failed_exchange_restores_active_profile() {
        let active = ActiveProfile::new(Some("home:readonly".to_string()));
        let store = work_store(&active).with_profile("work:mfa", &[("mfa_serial", DEVICE)]);
        store.fail_exchange("An error occurred (AccessDenied)");
        let prompter = ScriptedPrompter::default();

        let err = refresh_session(
            &store,
            &prompter,
            &active,
            Some("work:mfa"),
            Some("000000"),
            None,
        )
        .unwrap_err();

        match err.downcast_ref::<ProfileError>() {
            Some(ProfileError::TokenExchangeFailure { response, .. }) => {
                assert!(response.contains("AccessDenied"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.exchanges()[0].1, None);
        assert_eq!(active.get().as_deref(), Some("home:readonly"));
        assert!(store.value("work:mfa", "aws_session_token").is_none());
    }

    #[test]
    fn test_missing_iam_profile_is_not_found() {
        let active = ActiveProfile::new(Some("before".to_string()));
        let store = MemoryStore::new(&active);
        let prompter = ScriptedPrompter::default();

        let err = refresh_session(
            &store,
            &prompter,
            &active,
            Some("ghost:mfa"),
            Some("000000"),
            Some(DEVICE),
        )
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ProfileError>(),
            Some(ProfileError::NotFound { .. })
        ));
        assert!(store.exchanges().is_empty());
        assert_eq!(active.get().as_deref(), Some("before"));
    }

    #[test]
    fn test_role_without_source_is_not_found() {
        let active = ActiveProfile::default();
        let store = work_store(&active).with_profile("work:admin", &[]);
        let prompter = ScriptedPrompter::default();

        let err = refresh_session(&store, &prompter, &active, Some("work:admin"), None, None)
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ProfileError>(),
            Some(ProfileError::NotFound { .. })
        ));
    }

    #[test]
    fn test_role_on_iam_source_is_noop() {
        let active = ActiveProfile::default();
        let store = work_store(&active)
            .with_profile("work:readonly", &[("source_profile", "work:iam")]);
        let prompter = ScriptedPrompter::default();

        let outcome =
            refresh_session(&store, &prompter, &active, Some("work:readonly"), None, None)
                .unwrap();

        assert!(matches!(outcome, RefreshOutcome::NotRequired { .. }));
        assert!(store.exchanges().is_empty());
    }

    #[test]
    fn test_picks_profile_when_none_given() {
        let active = ActiveProfile::default();
        let store = work_store(&active).with_profile("work:mfa", &[("mfa_serial", DEVICE)]);
        let prompter = ScriptedPrompter::new(&["work:mfa", "222222"]);

        let outcome = refresh_session(&store, &prompter, &active, None, None, None).unwrap();

        assert!(matches!(
            outcome,
            RefreshOutcome::Refreshed { ref profile, .. } if profile == "work:mfa"
        ));
        assert_eq!(active.get().as_deref(), Some("work:mfa"));
    }
}
