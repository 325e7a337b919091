// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Per-run accounting.
//!
//! Every check or action logs one leveled line as it happens. The [`Report`]
//! additionally keeps what changed and what went wrong without stopping the
//! run, so the end of the run can summarize it.

use crate::mutate::MutationResult;

use tracing::{error, info, warn};

/// Changes and non-fatal problems accumulated during one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Report {
    changes: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log a satisfied check. Nothing is recorded.
    pub fn ok(&self, message: impl AsRef<str>) {
        info!("ok: {}", message.as_ref());
    }

    /// Record a change made to the workstation.
    pub fn change(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("{message}");
        self.changes.push(message);
    }

    /// Record a mutation if it actually changed its target.
    pub fn mutation(&mut self, result: &MutationResult) {
        if result.applied {
            self.changes.push(format!(
                "updated {}: {}",
                result.target.display(),
                result.affected.lines().next().unwrap_or_default()
            ));
        } else {
            self.ok(format!(
                "{} already holds {}",
                result.target.display(),
                result.affected.lines().next().unwrap_or_default()
            ));
        }
    }

    /// Record a non-fatal problem.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{message}");
        self.warnings.push(message);
    }

    /// Record a skipped request or a failed expectation.
    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!("{message}");
        self.errors.push(message);
    }

    pub fn changes(&self) -> &[String] {
        &self.changes
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}
