// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Component registry.
//!
//! A __component__ is a named, independently installable, fixable, and
//! uninstallable slice of the workstation: core tooling, the shell, the
//! editor, the terminal multiplexer, and the notes directory.
//!
//! # Registry
//!
//! Components live in a static [`Registry`] built once at startup. Each
//! [`Entry`] maps a [`ComponentId`] to its three operations, the components
//! it requires, the targets it is expected to leave behind, and the paths it
//! manages. Dispatch is by enum, never by string; names only exist at the
//! command line boundary through [`ComponentId::from_str`].
//!
//! # Ordering
//!
//! Components are always processed in dependency order. Foundational tooling
//! comes first because every other installer assumes the package manager and
//! base tools are there. Ties are broken by declaration order of
//! [`ComponentId`], so ordering is deterministic.
//!
//! # Validation
//!
//! Before a mode runs, every activated entry is checked for all three
//! operations. A gap aborts the mode before anything is touched.

pub mod core;
pub mod editor;
pub mod multiplexer;
pub mod notes;
pub mod payload;
pub mod shell;

use crate::{
    config::Settings,
    probe::{Expectation, ProbeResult, StateProbe},
    session::{Depth, Result as OpResult, Session, Style},
    workstation::Workstation,
};

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::{Display, Formatter, Result as FmtResult},
    path::PathBuf,
    str::FromStr,
};

/// Identity of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentId {
    Core,
    Shell,
    Editor,
    Multiplexer,
    Notes,
}

impl ComponentId {
    /// Every known component, in declaration order.
    pub const ALL: [ComponentId; 5] = [
        Self::Core,
        Self::Shell,
        Self::Editor,
        Self::Multiplexer,
        Self::Notes,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Shell => "shell",
            Self::Editor => "editor",
            Self::Multiplexer => "multiplexer",
            Self::Notes => "notes",
        }
    }
}

impl Display for ComponentId {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.name())
    }
}

impl FromStr for ComponentId {
    type Err = RegistryError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.name() == name.trim().to_ascii_lowercase())
            .ok_or_else(|| RegistryError::UnknownComponent(name.into()))
    }
}

/// Install operation.
pub type InstallFn = fn(&mut Session, Style) -> OpResult<()>;

/// Troubleshoot-and-fix operation.
pub type FixFn = fn(&mut Session) -> OpResult<()>;

/// Uninstall operation.
pub type UninstallFn = fn(&mut Session, Depth) -> OpResult<()>;

/// Targets a component is expected to leave behind.
pub type ExpectFn = fn(&Workstation, &Settings) -> Vec<Expectation>;

/// Paths a component owns or edits.
pub type ManagedFn = fn(&Workstation) -> Vec<PathBuf>;

/// The three operations every component must provide.
#[derive(Debug, Clone, Copy, Default)]
pub struct Operations {
    pub install: Option<InstallFn>,
    pub fix: Option<FixFn>,
    pub uninstall: Option<UninstallFn>,
}

/// A registered component.
#[derive(Debug, Clone)]
pub struct Entry {
    pub id: ComponentId,
    pub requires: &'static [ComponentId],
    pub operations: Operations,
    pub expectations: ExpectFn,
    pub managed_paths: ManagedFn,
}

/// Static table of components.
#[derive(Debug, Clone)]
pub struct Registry {
    entries: BTreeMap<ComponentId, Entry>,
}

impl Registry {
    /// The standard workstation components.
    pub fn standard() -> Self {
        Self::from_entries([
            core::entry(),
            shell::entry(),
            editor::entry(),
            multiplexer::entry(),
            notes::entry(),
        ])
    }

    /// Build registry from arbitrary entries.
    pub fn from_entries(entries: impl IntoIterator<Item = Entry>) -> Self {
        Self {
            entries: entries.into_iter().map(|entry| (entry.id, entry)).collect(),
        }
    }

    pub fn entry(&self, id: ComponentId) -> Option<&Entry> {
        self.entries.get(&id)
    }

    /// Registered component identities in declaration order.
    pub fn ids(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.entries.keys().copied()
    }

    /// Close `requested` over prerequisites, in dependency order.
    ///
    /// # Errors
    ///
    /// - Return [`RegistryError::NotRegistered`] if a requested component or
    ///   a prerequisite has no entry.
    /// - Return [`RegistryError::Cycle`] if prerequisites form a cycle.
    pub fn resolve(&self, requested: &[ComponentId]) -> Result<Vec<ComponentId>> {
        let mut selected = BTreeSet::new();
        let mut pending = requested.to_vec();
        while let Some(id) = pending.pop() {
            let entry = self.entry(id).ok_or(RegistryError::NotRegistered(id))?;
            if selected.insert(id) {
                pending.extend(entry.requires.iter().copied());
            }
        }

        let mut in_degree: BTreeMap<ComponentId, usize> = BTreeMap::new();
        let mut dependents: BTreeMap<ComponentId, BTreeSet<ComponentId>> = BTreeMap::new();
        for id in &selected {
            let requires = self.entries[id].requires;
            in_degree.insert(*id, requires.len());
            for prerequisite in requires {
                dependents.entry(*prerequisite).or_default().insert(*id);
            }
        }

        let mut ready: BTreeSet<ComponentId> = in_degree
            .iter()
            .filter_map(|(id, degree)| (*degree == 0).then_some(*id))
            .collect();
        let mut ordered = Vec::new();
        while let Some(next) = ready.pop_first() {
            ordered.push(next);
            for child in dependents.get(&next).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(child) {
                    *degree = degree.saturating_sub(1);
                    if *degree == 0 {
                        ready.insert(*child);
                    }
                }
            }
        }

        if ordered.len() != selected.len() {
            let cycle = selected
                .into_iter()
                .filter(|id| !ordered.contains(id))
                .collect();
            return Err(RegistryError::Cycle(cycle));
        }

        Ok(ordered)
    }

    /// Check that every activated component provides all three operations.
    ///
    /// # Errors
    ///
    /// - Return [`RegistryError::NotRegistered`] if a component has no entry.
    /// - Return [`RegistryError::MissingOperation`] on the first gap found.
    pub fn validate(&self, activated: &[ComponentId]) -> Result<()> {
        for id in activated {
            let entry = self.entry(*id).ok_or(RegistryError::NotRegistered(*id))?;
            let ops = &entry.operations;
            for (operation, present) in [
                ("install", ops.install.is_some()),
                ("fix", ops.fix.is_some()),
                ("uninstall", ops.uninstall.is_some()),
            ] {
                if !present {
                    return Err(RegistryError::MissingOperation {
                        component: *id,
                        operation,
                    });
                }
            }
        }

        Ok(())
    }

    /// Probe every expectation of target components, read-only.
    pub fn survey(
        &self,
        components: &[ComponentId],
        workstation: &Workstation,
        settings: &Settings,
    ) -> Vec<(ComponentId, ProbeResult)> {
        let probe = StateProbe::new(workstation);
        components
            .iter()
            .filter_map(|id| self.entry(*id))
            .flat_map(|entry| {
                (entry.expectations)(workstation, settings)
                    .into_iter()
                    .map(move |expectation| (entry.id, probe.check(&expectation)))
            })
            .collect()
    }
}

/// Alias name assigned by an `alias name=...` line.
pub(crate) fn alias_name(line: &str) -> Option<&str> {
    line.trim_start()
        .strip_prefix("alias ")
        .and_then(|rest| rest.split_once('='))
        .map(|(name, _)| name.trim())
}

/// Registry error types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Name does not match any component.
    #[error("unknown component {0:?}")]
    UnknownComponent(String),

    /// Component has no registry entry.
    #[error("component {0} is not registered")]
    NotRegistered(ComponentId),

    /// Component lacks a required operation.
    #[error("component {component} has no {operation} operation")]
    MissingOperation {
        component: ComponentId,
        operation: &'static str,
    },

    /// Prerequisites are circular.
    #[error("dependency cycle detected involving: {0:?}")]
    Cycle(Vec<ComponentId>),
}

/// Friendly result alias :3
pub type Result<T, E = RegistryError> = std::result::Result<T, E>;
