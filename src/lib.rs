// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Workstation reconciliation engine.
//!
//! rigup brings a developer workstation to a declared configuration (shell,
//! editor, terminal multiplexer, notes directory) and keeps it there across
//! repeated runs. Each run classifies the current state of the machine with
//! read-only [probes](probe), snapshots anything it is about to change with
//! the [backup manager](backup), closes the gap through idempotent
//! [mutations](mutate), and re-probes the result.
//!
//! Work is organized into [components](component) processed in dependency
//! order under one of four [modes](mode): full install, minimal update, fix,
//! and uninstall.
//!
//! Every operation receives an explicit [`Workstation`] context instead of
//! reading the home directory or `PATH` from the environment, so everything
//! can be driven against a fabricated root.

pub mod backup;
pub mod component;
pub mod config;
pub mod exec;
pub mod mode;
pub mod mutate;
pub mod path;
pub mod probe;
pub mod prompt;
pub mod report;
pub mod session;
pub mod version;
pub mod workstation;

pub use component::{ComponentId, Registry};
pub use config::Settings;
pub use mode::{Engine, Mode, ModeKind, Outcome, Request, Status};
pub use session::{Depth, Session, Style};
pub use workstation::Workstation;
