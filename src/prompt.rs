//! Interactive selection and confirmation prompts.
//!
//! The controller talks to a [`SelectionPrompt`] trait rather than a
//! terminal directly, so the checkbox UI stays a pluggable capability:
//! the binary wires in the dialoguer-backed [`TerminalPrompt`], tests
//! inject scripted implementations.

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, MultiSelect};

use crate::error::Result;

/// A checkbox/confirm capability. `select` returns the chosen indices, or
/// `None` when the user cancelled — cancellation aborts the whole
/// operation with no state changes.
pub trait SelectionPrompt {
    fn select(&self, title: &str, items: &[String]) -> Result<Option<Vec<usize>>>;
    fn confirm(&self, message: &str) -> Result<bool>;
}

/// Terminal implementation backed by dialoguer.
pub struct TerminalPrompt;

impl SelectionPrompt for TerminalPrompt {
    fn select(&self, title: &str, items: &[String]) -> Result<Option<Vec<usize>>> {
        let selection = MultiSelect::with_theme(&ColorfulTheme::default())
            .with_prompt(title)
            .items(items)
            .interact_opt()?;
        Ok(selection)
    }

    fn confirm(&self, message: &str) -> Result<bool> {
        let answer = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(message)
            .default(false)
            .interact_opt()?;
        Ok(answer.unwrap_or(false))
    }
}
