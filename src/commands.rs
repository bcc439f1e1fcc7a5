//! High-level command orchestration for the CLI.
//!
//! Each function here corresponds to a subcommand in `main.rs`. The
//! managers (`accounts`, `roles`, `session`, `selector`) do the work; this
//! layer reports outcomes through [`Ui`] and persists the active profile.

use anyhow::Result;
use std::path::Path;

use crate::accounts::{self, AccountOutcome};
use crate::active::{ActiveProfile, PROFILE_ENV_VAR};
use crate::paths::Paths;
use crate::profile::ProfileName;
use crate::prompt::Prompter;
use crate::roles;
use crate::selector;
use crate::session::{self, RefreshOutcome};
use crate::state::{State, persist_active};
use crate::store::{ProfileStore, TokenExchange};
use crate::ui::Ui;

/// Everything a command needs: the store, the console and the indicator
pub struct Context<S, P> {
    pub store: S,
    pub prompter: P,
    pub active: ActiveProfile,
    pub paths: Paths,
    pub ui: Ui,
}

impl<S, P> Context<S, P>
where
    S: ProfileStore + TokenExchange,
    P: Prompter,
{
    fn announce_active(&self, profile: &str) -> Result<()> {
        persist_active(&self.paths.state_file, Some(profile))?;
        self.ui.ok(format!("Active profile: {}", profile));
        self.ui.println(self.ui.dim(format!(
            "  Apply it to this shell with: eval \"$(awsprof env)\"   ({})",
            shell_export(Some(profile))
        )));
        Ok(())
    }
}

/// Add `<name>:iam`
pub fn create_account<S, P>(ctx: &Context<S, P>, name: &str, file: Option<&Path>) -> Result<()>
where
    S: ProfileStore + TokenExchange,
    P: Prompter,
{
    match accounts::create_account(&ctx.store, &ctx.prompter, name, file)? {
        AccountOutcome::AlreadyExists { profile } => {
            ctx.ui.info(format!(
                "Account '{}' already exists; nothing changed.",
                profile
            ));
            ctx.ui
                .println(format!("  Use 'awsprof edit-account {}' to replace its keys.", name));
        }
        AccountOutcome::Created { profile } | AccountOutcome::Updated { profile } => {
            ctx.ui.ok(format!("Created account '{}'", profile));
        }
    }
    Ok(())
}

/// Replace the keys of `<name>:iam`
pub fn edit_account<S, P>(ctx: &Context<S, P>, name: &str, file: Option<&Path>) -> Result<()>
where
    S: ProfileStore + TokenExchange,
    P: Prompter,
{
    let outcome = accounts::edit_account(&ctx.store, &ctx.prompter, name, file)?;
    if let AccountOutcome::Updated { profile } = outcome {
        ctx.ui.ok(format!("Updated keys for '{}'", profile));
    }
    Ok(())
}

/// Add `<account>:<role>`
pub fn create_role<S, P>(
    ctx: &Context<S, P>,
    account: &str,
    role: &str,
    role_arn: &str,
    use_iam: bool,
) -> Result<()>
where
    S: ProfileStore + TokenExchange,
    P: Prompter,
{
    let created = roles::create_role(&ctx.store, account, role, role_arn, use_iam)?;

    ctx.ui.ok(format!("Wrote role profile '{}'", created.profile));
    let mut table = ctx.ui.simple_table();
    table.add_row(vec![ctx.ui.cell("  role_arn"), ctx.ui.cell(&created.role_arn)]);
    table.add_row(vec![
        ctx.ui.cell("  source_profile"),
        ctx.ui.cell(&created.source_profile),
    ]);
    ctx.ui.println(table.to_string());
    Ok(())
}

/// Make a profile active, picking one interactively when none is given
pub fn use_profile<S, P>(ctx: &Context<S, P>, profile: Option<&str>) -> Result<()>
where
    S: ProfileStore + TokenExchange,
    P: Prompter,
{
    if let Some(name) = profile
        && !ctx.store.profile_exists(name)?
    {
        selector::set_active_profile(&ctx.store, &ctx.prompter, &ctx.active, Some(name))?;
        ctx.ui.warn(format!(
            "Profile '{}' is not configured in the AWS CLI yet; it was not saved.",
            name
        ));
        ctx.ui.println(format!("  {}", shell_export(Some(name))));
        return Ok(());
    }

    let chosen = selector::set_active_profile(&ctx.store, &ctx.prompter, &ctx.active, profile)?;
    ctx.announce_active(&chosen)
}

/// Refresh the MFA session behind a profile and make it active
pub fn refresh<S, P>(
    ctx: &Context<S, P>,
    profile: Option<&str>,
    code: Option<&str>,
    arn: Option<&str>,
) -> Result<()>
where
    S: ProfileStore + TokenExchange,
    P: Prompter,
{
    match session::refresh_session(&ctx.store, &ctx.prompter, &ctx.active, profile, code, arn)? {
        RefreshOutcome::NotRequired { profile } => {
            ctx.ui.info(format!(
                "'{}' uses long-lived IAM keys; no session to refresh.",
                profile
            ));
        }
        RefreshOutcome::Refreshed {
            profile,
            mfa_profile,
            expiration,
        } => {
            let until = expiration
                .map(|t| format!(" (valid until {})", t.format("%Y-%m-%d %H:%M:%S UTC")))
                .unwrap_or_default();
            ctx.ui
                .ok(format!("Refreshed session for '{}'{}", mfa_profile, until));
            ctx.announce_active(&profile)?;
        }
    }
    Ok(())
}

/// List configured profiles with their kind
pub fn list<S, P>(ctx: &Context<S, P>) -> Result<()>
where
    S: ProfileStore + TokenExchange,
    P: Prompter,
{
    let spinner = ctx.ui.spinner("Reading profiles...");
    let profiles = ctx.store.list_profiles();
    spinner.finish_and_clear();
    let profiles = profiles?;

    if profiles.is_empty() {
        ctx.ui.warn("No profiles found.");
        ctx.ui.newline();
        ctx.ui.println("Create one with:");
        ctx.ui
            .println(format!("  {} create-account <name>", ctx.ui.bold("awsprof")));
        return Ok(());
    }

    let current = ctx.active.get();

    let mut table = ctx.ui.simple_table();
    table.set_header(vec![
        ctx.ui.header_cell(""),
        ctx.ui.header_cell("Profile"),
        ctx.ui.header_cell("Kind"),
        ctx.ui.header_cell("Status"),
    ]);

    for name in &profiles {
        let is_active = current.as_deref() == Some(name.as_str());
        let status = if is_active {
            ctx.ui.colored_cell("active", comfy_table::Color::Green)
        } else {
            ctx.ui.cell("-")
        };
        table.add_row(vec![
            ctx.ui.cell(if is_active { ctx.ui.icon_ok() } else { " " }),
            ctx.ui.cell(name),
            ctx.ui.cell(ProfileName::parse(name).kind()),
            status,
        ]);
    }

    ctx.ui.section("Profiles");
    ctx.ui.println(table.to_string());
    Ok(())
}

/// Show the active profile and the persisted record
pub fn current<S, P>(ctx: &Context<S, P>) -> Result<()>
where
    S: ProfileStore + TokenExchange,
    P: Prompter,
{
    let state = match State::read(&ctx.paths.state_file) {
        Ok(state) => state,
        Err(e) => {
            ctx.ui.warn(format!("{e:#}"));
            State::default()
        }
    };

    ctx.ui.section("Current Profile");
    ctx.ui.newline();

    let mut table = ctx.ui.simple_table();
    let from_env = std::env::var(PROFILE_ENV_VAR).ok().filter(|v| !v.is_empty());
    table.add_row(vec![
        ctx.ui.cell(format!("{}:", PROFILE_ENV_VAR)),
        ctx.ui.cell(from_env.unwrap_or_else(|| "(unset)".to_string())),
    ]);
    table.add_row(vec![
        ctx.ui.cell("Last selected:"),
        ctx.ui.header_cell(
            state
                .active_profile
                .clone()
                .unwrap_or_else(|| "(none)".to_string()),
        ),
    ]);
    if let Some(updated) = &state.updated_at {
        table.add_row(vec![
            ctx.ui.cell("Selected at:"),
            ctx.ui.cell(updated.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
        ]);
    }
    table.add_row(vec![
        ctx.ui.cell("State file:"),
        ctx.ui.cell(ctx.paths.state_file.display().to_string()),
    ]);

    ctx.ui.println(table.to_string());
    Ok(())
}

/// Print the shell line that applies the active profile
pub fn env<S, P>(ctx: &Context<S, P>) -> Result<()>
where
    S: ProfileStore + TokenExchange,
    P: Prompter,
{
    ctx.ui.println(shell_export(ctx.active.get().as_deref()));
    Ok(())
}

/// `export AWS_PROFILE='<name>'`, or `unset AWS_PROFILE` for none
pub fn shell_export(profile: Option<&str>) -> String {
    match profile {
        Some(name) => format!(
            "export {}='{}'",
            PROFILE_ENV_VAR,
            name.replace('\'', r"'\''")
        ),
        None => format!("unset {}", PROFILE_ENV_VAR),
    }
}
