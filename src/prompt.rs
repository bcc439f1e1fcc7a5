//! Interactive console input.

use anyhow::{Context, Result};
use inquire::{Password, PasswordDisplayMode, Select, Text};

use crate::selector::hotkey_score;

/// Console prompts used by the managers
pub trait Prompter {
    /// Masked single-line input (keys, MFA codes)
    fn secret(&self, message: &str) -> Result<String>;

    fn text(&self, message: &str) -> Result<String>;

    /// Single choice; returns the index into `options`
    fn select(&self, message: &str, options: Vec<String>) -> Result<usize>;
}

/// [`Prompter`] backed by `inquire`
#[derive(Debug, Default, Clone, Copy)]
pub struct InquirePrompter;

impl Prompter for InquirePrompter {
    fn secret(&self, message: &str) -> Result<String> {
        let value = Password::new(message)
            .with_display_mode(PasswordDisplayMode::Masked)
            .without_confirmation()
            .prompt()
            .context("Input cancelled")?;
        Ok(value.trim().to_string())
    }

    fn text(&self, message: &str) -> Result<String> {
        let value = Text::new(message).prompt().context("Input cancelled")?;
        Ok(value.trim().to_string())
    }

    fn select(&self, message: &str, options: Vec<String>) -> Result<usize> {
        let choice = Select::new(message, options)
            .with_scorer(&|input, _, label, _| hotkey_score(input, label))
            .with_help_message("↑↓ to move, type a hotkey to jump, Enter to select")
            .raw_prompt()
            .context("Selection cancelled")?;
        Ok(choice.index)
    }
}
