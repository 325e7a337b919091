// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! User prompts.
//!
//! Confirmations before destructive steps are the only place a run can be
//! cancelled. They go through the [`Prompter`] trait so tests can script the
//! answers.

use inquire::{error::InquireError, Confirm, Text};
use tracing::warn;

/// Layer of indirection for interactive questions.
pub trait Prompter {
    /// Ask a yes/no question.
    fn confirm(&mut self, message: &str, default: bool) -> Result<bool>;

    /// Ask for one line of free-form input.
    fn input(&mut self, message: &str, default: &str) -> Result<String>;
}

/// Prompts on the terminal through inquire.
#[derive(Debug, Default)]
pub struct InquirePrompter;

impl InquirePrompter {
    pub fn new() -> Self {
        Self
    }
}

impl Prompter for InquirePrompter {
    /// Ask a yes/no question on the terminal.
    ///
    /// A terminal that cannot show prompts counts as an answer of "no", so
    /// nothing destructive happens without an explicit yes.
    fn confirm(&mut self, message: &str, default: bool) -> Result<bool> {
        match Confirm::new(message).with_default(default).prompt() {
            Ok(answer) => Ok(answer),
            Err(InquireError::NotTTY) => {
                warn!("cannot prompt without a terminal, assuming no: {message}");
                Ok(false)
            }
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(false),
            Err(err) => Err(PromptError::Inquire(err)),
        }
    }

    fn input(&mut self, message: &str, default: &str) -> Result<String> {
        match Text::new(message).with_default(default).prompt() {
            Ok(answer) => Ok(answer),
            Err(InquireError::NotTTY) => Ok(default.to_string()),
            Err(err) => Err(PromptError::Inquire(err)),
        }
    }
}

/// Prompt error types.
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    /// Terminal prompt failed.
    #[error(transparent)]
    Inquire(#[from] InquireError),
}

/// Friendly result alias :3
pub type Result<T, E = PromptError> = std::result::Result<T, E>;
