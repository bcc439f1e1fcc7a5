//! Active profile selection.

use anyhow::Result;
use tracing::info;

use crate::active::ActiveProfile;
use crate::error::ProfileError;
use crate::prompt::Prompter;
use crate::store::ProfileStore;

const HOTKEYS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Menu hotkey for the entry at `index`: digits, then lowercase, then
/// uppercase letters. Entries past the alphabet get none.
pub fn hotkey(index: usize) -> Option<char> {
    HOTKEYS.get(index).map(|&b| b as char)
}

/// Menu labels for `profiles`, in order
pub fn menu_labels<'a>(profiles: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    profiles
        .into_iter()
        .enumerate()
        .map(|(i, name)| match hotkey(i) {
            Some(key) => format!("[{key}] {name}"),
            None => format!("    {name}"),
        })
        .collect()
}

/// Menu filter score for `label` given the typed `input`.
///
/// A single typed character is a hotkey and keeps only the entry labelled
/// with it. Longer input keeps labels containing it, ignoring case.
pub fn hotkey_score(input: &str, label: &str) -> Option<i64> {
    let mut chars = input.chars();
    match (chars.next(), chars.next()) {
        (None, _) => Some(0),
        (Some(key), None) => label.starts_with(&format!("[{key}] ")).then_some(i64::MAX),
        _ => label
            .to_lowercase()
            .contains(&input.to_lowercase())
            .then_some(0),
    }
}

/// Let the user pick one of the configured profiles
pub fn pick_profile(
    store: &impl ProfileStore,
    prompter: &impl Prompter,
    message: &str,
) -> Result<String> {
    let profiles: Vec<String> = store.list_profiles()?.into_iter().collect();
    if profiles.is_empty() {
        return Err(ProfileError::not_found_with_hint(
            "(any)",
            "Use 'awsprof create-account <name>' to add one.",
        )
        .into());
    }

    let index = prompter.select(message, menu_labels(&profiles))?;
    match profiles.into_iter().nth(index) {
        Some(profile) => Ok(profile),
        None => anyhow::bail!("Selection {} is out of range", index),
    }
}

/// Set the active profile, prompting when `profile` is `None`.
///
/// Returns the profile now active.
pub fn set_active_profile(
    store: &impl ProfileStore,
    prompter: &impl Prompter,
    active: &ActiveProfile,
    profile: Option<&str>,
) -> Result<String> {
    let profile = match profile {
        Some(p) => p.to_string(),
        None => pick_profile(store, prompter, "Select the active profile:")?,
    };

    active.set(profile.as_str());
    info!(%profile, "Active profile set");
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MemoryStore, ScriptedPrompter};

    #[test]
    fn test_hotkey_alphabet() {
        assert_eq!(hotkey(0), Some('0'));
        assert_eq!(hotkey(9), Some('9'));
        assert_eq!(hotkey(10), Some('a'));
        assert_eq!(hotkey(35), Some('z'));
        assert_eq!(hotkey(36), Some('A'));
        assert_eq!(hotkey(61), Some('Z'));
        assert_eq!(hotkey(62), None);
    }

    #[test]
    fn test_menu_labels() {
        let names: Vec<String> = (0..63).map(|i| format!("p{i}")).collect();
        let labels = menu_labels(&names);
        assert_eq!(labels[0], "[0] p0");
        assert_eq!(labels[10], "[a] p10");
        assert_eq!(labels[62], "    p62");
    }

    #[test]
    fn test_hotkey_score_matches_own_label() {
        let labels = menu_labels(&["alpha:iam".to_string(), "beta:mfa".to_string()]);
        assert_eq!(hotkey_score("0", &labels[0]), Some(i64::MAX));
        assert_eq!(hotkey_score("0", &labels[1]), None);
        assert_eq!(hotkey_score("a", &labels[0]), None);
        assert_eq!(hotkey_score("", &labels[1]), Some(0));
        assert_eq!(hotkey_score("BETA", &labels[1]), Some(0));
        assert_eq!(hotkey_score("beta", &labels[0]), None);
    }

    #[test]
    fn test_explicit_profile_skips_menu() {
        let active = ActiveProfile::default();
        let store = MemoryStore::new(&active);
        let prompter = ScriptedPrompter::default();

        let chosen = set_active_profile(&store, &prompter, &active, Some("work:admin")).unwrap();

        assert_eq!(chosen, "work:admin");
        assert_eq!(active.get().as_deref(), Some("work:admin"));
        assert!(prompter.asked().is_empty());
    }

    #[test]
    fn test_menu_is_sorted_and_sets_choice() {
        let active = ActiveProfile::new(Some("old".to_string()));
        let store = MemoryStore::new(&active)
            .with_profile("work:mfa", &[])
            .with_profile("home:iam", &[])
            .with_profile("work:iam", &[]);
        let prompter = ScriptedPrompter::new(&["[1] work:iam"]);

        let chosen = set_active_profile(&store, &prompter, &active, None).unwrap();

        assert_eq!(chosen, "work:iam");
        assert_eq!(active.get().as_deref(), Some("work:iam"));
    }

    #[test]
    fn test_empty_store_is_not_found() {
        let active = ActiveProfile::new(Some("old".to_string()));
        let store = MemoryStore::new(&active);
        let prompter = ScriptedPrompter::default();

        let err = set_active_profile(&store, &prompter, &active, None).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ProfileError>(),
            Some(ProfileError::NotFound { .. })
        ));
        assert_eq!(active.get().as_deref(), Some("old"));
    }
}
