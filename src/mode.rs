// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Mode controller.
//!
//! The [`Engine`] drives one run: it selects the components a [`Request`]
//! activates, validates them, snapshots what is about to change, applies the
//! mode's operation to each component in dependency order, re-probes every
//! expected target, and records the version when the whole workstation was
//! brought up to date.
//!
//! # Phases
//!
//! ```text
//! Idle -> SelectingMode -> BackingUp -> Applying -> Verifying -> Recording -> Done
//! ```
//!
//! Any fatal error moves the run straight to [`Phase::Aborted`]. Fatal means
//! a missing dependency (external tool or registry operation) or a failed
//! write/backup. Everything else is accumulated in the [`Report`] and the run
//! goes on.

use crate::{
    backup::{BackupError, BackupRecord},
    component::{ComponentId, Registry, RegistryError},
    probe::ProbeResult,
    prompt::PromptError,
    report::Report,
    session::{ComponentError, Depth, Session, Style},
    version::{VersionError, VersionRecord, VersionTracker},
};

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter, Result as FmtResult, Write},
    path::PathBuf,
};
use tracing::{debug, info, instrument};

/// File name of the fix mode diagnostic summary inside a backup run.
pub const DIAGNOSTICS: &str = "diagnostics.txt";

/// Mode identity as persisted in the version record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeKind {
    Full,
    Minimal,
    Fix,
    Uninstall,
}

impl ModeKind {
    /// Modes in menu order.
    pub const ALL: [ModeKind; 4] = [Self::Full, Self::Minimal, Self::Fix, Self::Uninstall];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Minimal => "minimal",
            Self::Fix => "fix",
            Self::Uninstall => "uninstall",
        }
    }

    /// Interpret one line of menu input.
    ///
    /// Accepts the 1-based menu number or the mode name. Empty input selects
    /// [`ModeKind::Full`].
    pub fn from_menu_choice(input: &str) -> Option<Self> {
        let input = input.trim().to_ascii_lowercase();
        if input.is_empty() {
            return Some(Self::Full);
        }

        if let Ok(number) = input.parse::<usize>() {
            return number
                .checked_sub(1)
                .and_then(|index| Self::ALL.get(index).copied());
        }

        Self::ALL.into_iter().find(|mode| mode.name() == input)
    }

    /// Numbered menu shown when no mode was given.
    pub fn menu() -> String {
        Self::ALL
            .iter()
            .enumerate()
            .fold(String::new(), |mut menu, (index, mode)| {
                let _ = writeln!(menu, "  {}) {mode}", index + 1);
                menu
            })
    }
}

impl Display for ModeKind {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.name())
    }
}

/// Mode to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Install everything, replacing managed configuration wholesale.
    Full,

    /// Install everything, keeping existing customization.
    Minimal,

    /// Repair whatever expected targets are absent.
    Fix,

    /// Remove managed configuration, and tools too at [`Depth::Full`].
    Uninstall(Depth),
}

impl Mode {
    pub fn kind(&self) -> ModeKind {
        match self {
            Self::Full => ModeKind::Full,
            Self::Minimal => ModeKind::Minimal,
            Self::Fix => ModeKind::Fix,
            Self::Uninstall(_) => ModeKind::Uninstall,
        }
    }

    /// Install style, for modes that run installers.
    pub fn style(&self) -> Option<Style> {
        match self {
            Self::Full => Some(Style::Clean),
            Self::Minimal => Some(Style::Preserve),
            Self::Fix | Self::Uninstall(_) => None,
        }
    }
}

impl Display for Mode {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Uninstall(Depth::Full) => fmt.write_str("uninstall (purge)"),
            mode => write!(fmt, "{}", mode.kind()),
        }
    }
}

/// What one invocation asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub mode: Mode,

    /// Component names to target. Empty means the whole workstation.
    pub components: Vec<String>,
}

impl Request {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            components: Vec::new(),
        }
    }

    /// Narrow request to named components.
    pub fn with_components(mut self, components: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.components = components.into_iter().map(Into::into).collect();
        self
    }
}

/// Step of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    SelectingMode,
    BackingUp,
    Applying,
    Verifying,
    Recording,
    Done,
    Aborted,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// Everything requested is in place. Warnings may still exist.
    Succeeded,

    /// Run completed but some expected targets are still absent.
    Incomplete,

    /// User declined the confirmation; nothing was changed.
    Cancelled,

    /// Fatal error stopped the run.
    Aborted(String),
}

/// Everything known about a finished run.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub status: Status,
    pub report: Report,
    pub activated: Vec<ComponentId>,
    pub probes: Vec<(ComponentId, ProbeResult)>,
    pub backup_dir: Option<PathBuf>,
    pub backups: Vec<BackupRecord>,
    pub record: Option<VersionRecord>,
    pub trace: Vec<Phase>,
}

impl Outcome {
    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self.status {
            Status::Succeeded | Status::Cancelled => 0,
            Status::Incomplete | Status::Aborted(_) => 1,
        }
    }

    /// Final phase reached.
    pub fn phase(&self) -> Phase {
        self.trace.last().copied().unwrap_or(Phase::Idle)
    }

    /// Expectations still absent after the run.
    pub fn missing(&self) -> impl Iterator<Item = &(ComponentId, ProbeResult)> + '_ {
        self.probes.iter().filter(|(_, result)| !result.present)
    }

    /// One-paragraph summary for the end of the run.
    pub fn summary(&self) -> String {
        let report = &self.report;
        let mut summary = match &self.status {
            Status::Succeeded => "run succeeded".to_string(),
            Status::Cancelled => "run cancelled, nothing changed".to_string(),
            Status::Incomplete => format!(
                "run incomplete: {} expected target(s) still absent",
                self.missing().count()
            ),
            Status::Aborted(reason) => format!("run aborted: {reason}"),
        };
        let _ = write!(
            summary,
            " ({} change(s), {} warning(s), {} error(s))",
            report.changes().len(),
            report.warnings().len(),
            report.errors().len()
        );

        if self.exit_code() != 0 {
            if let Some(dir) = &self.backup_dir {
                let _ = write!(summary, "; backups of this run are in {}", dir.display());
            }
        }

        summary
    }
}

/// Drives a single run against one session.
pub struct Engine {
    registry: Registry,
    session: Session,
    version: String,
    trace: Vec<Phase>,
}

impl Engine {
    /// Construct new engine, recording this crate's version on success.
    pub fn new(registry: Registry, session: Session) -> Self {
        Self {
            registry,
            session,
            version: env!("CARGO_PKG_VERSION").into(),
            trace: vec![Phase::Idle],
        }
    }

    /// Override version written to the version record.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Execute `request` to completion or abort.
    #[instrument(skip(self, request), fields(mode = %request.mode), level = "debug")]
    pub fn run(mut self, request: &Request) -> Outcome {
        let mut activated = Vec::new();
        let mut probes = Vec::new();
        let mut record = None;
        let result = self.execute(request, &mut activated, &mut probes, &mut record);

        let status = match result {
            Ok(status) => {
                self.enter(Phase::Done);
                status
            }
            Err(err) => {
                self.session.report.error(format!("{err}"));
                self.enter(Phase::Aborted);
                Status::Aborted(err.to_string())
            }
        };

        Outcome {
            status,
            report: self.session.report,
            activated,
            probes,
            backup_dir: self.session.backups.run_dir().map(PathBuf::from),
            backups: self.session.backups.records().to_vec(),
            record,
            trace: self.trace,
        }
    }

    fn execute(
        &mut self,
        request: &Request,
        activated: &mut Vec<ComponentId>,
        probes: &mut Vec<(ComponentId, ProbeResult)>,
        record: &mut Option<VersionRecord>,
    ) -> Result<Status> {
        self.enter(Phase::SelectingMode);
        let whole = request.components.is_empty();
        *activated = self.select(request)?;
        self.registry.validate(activated)?;
        info!("{} mode for: {}", request.mode, join(activated));
        if activated.is_empty() {
            return Ok(Status::Succeeded);
        }

        self.preflight(request.mode)?;
        if let Mode::Uninstall(_) = request.mode {
            let question = format!("Remove rigup configuration for {}?", join(activated));
            if !self.session.prompter.confirm(&question, false)? {
                info!("uninstall declined");
                return Ok(Status::Cancelled);
            }
        }

        self.enter(Phase::BackingUp);
        match request.mode {
            Mode::Full | Mode::Uninstall(_) => self.snapshot(activated)?,
            Mode::Fix => self.write_diagnostics(activated)?,
            Mode::Minimal => debug!("minimal mode backs up lazily before each change"),
        }

        self.enter(Phase::Applying);
        for id in activated.iter().copied() {
            self.apply(request.mode, id)?;
        }

        if let Mode::Uninstall(_) = request.mode {
            return Ok(Status::Succeeded);
        }

        self.enter(Phase::Verifying);
        *probes = self
            .registry
            .survey(activated, &self.session.workstation, &self.session.settings);
        let mut complete = true;
        for (id, result) in probes.iter() {
            if result.present {
                debug!("[{id}] {result}");
            } else {
                complete = false;
                self.session.report.error(format!("[{id}] {result}"));
            }
        }
        if !complete {
            return Ok(Status::Incomplete);
        }

        if whole && matches!(request.mode, Mode::Full | Mode::Minimal) {
            self.enter(Phase::Recording);
            let tracker = VersionTracker::new(&self.session.layout().version_file);
            *record = Some(tracker.record(&self.version, request.mode.kind())?);
        }

        Ok(Status::Succeeded)
    }

    /// Turn requested names into an ordered list of components.
    ///
    /// Unknown names are reported and skipped. Installs and repairs pull in
    /// prerequisites; uninstall only removes what was named, in reverse order.
    fn select(&mut self, request: &Request) -> Result<Vec<ComponentId>> {
        let requested: Vec<ComponentId> = if request.components.is_empty() {
            self.registry.ids().collect()
        } else {
            let mut requested = Vec::new();
            for name in &request.components {
                match name.parse::<ComponentId>() {
                    Ok(id) => requested.push(id),
                    Err(err) => self.session.report.error(format!("{err}, skipping")),
                }
            }
            requested
        };

        let mut ordered = self.registry.resolve(&requested)?;
        if let Mode::Uninstall(_) = request.mode {
            ordered.retain(|id| requested.contains(id));
            ordered.reverse();
        }

        Ok(ordered)
    }

    fn preflight(&self, mode: Mode) -> Result<()> {
        if mode.style().is_none() {
            return Ok(());
        }

        let manager = &self.session.settings.package_manager.command;
        let probe = self.session.probe().command_on_path(manager);
        if !probe.present {
            return Err(EngineError::MissingDependency {
                command: manager.clone(),
            });
        }
        self.session.report.ok(format!("package manager {probe}"));

        Ok(())
    }

    fn snapshot(&mut self, activated: &[ComponentId]) -> Result<()> {
        for id in activated {
            let Some(entry) = self.registry.entry(*id) else {
                continue;
            };
            for path in (entry.managed_paths)(&self.session.workstation) {
                self.session.backups.backup(&path)?;
            }
        }

        Ok(())
    }

    fn write_diagnostics(&mut self, activated: &[ComponentId]) -> Result<()> {
        let workstation = &self.session.workstation;
        let mut note = String::new();
        let _ = writeln!(note, "home: {}", workstation.home().display());
        let _ = writeln!(
            note,
            "search path: {}",
            workstation
                .search_path()
                .iter()
                .map(|dir| dir.display().to_string())
                .collect::<Vec<_>>()
                .join(":")
        );
        for package in &self.session.settings.packages.shell {
            let _ = writeln!(
                note,
                "shell: {}",
                self.session.probe().command_on_path(package.command())
            );
        }
        let _ = writeln!(note, "\nprobes before fix:");
        for (id, result) in self
            .registry
            .survey(activated, workstation, &self.session.settings)
        {
            let _ = writeln!(note, "  [{id}] {result}");
        }

        let path = self.session.backups.write_note(DIAGNOSTICS, note)?;
        info!("wrote diagnostics to {:?}", path.display());

        Ok(())
    }

    fn apply(&mut self, mode: Mode, id: ComponentId) -> Result<()> {
        let Some(entry) = self.registry.entry(id) else {
            return Err(RegistryError::NotRegistered(id).into());
        };
        let operations = entry.operations;
        let missing = |operation| RegistryError::MissingOperation {
            component: id,
            operation,
        };

        info!("[{id}] {mode}");
        let result = match mode {
            Mode::Full | Mode::Minimal => {
                let install = operations.install.ok_or_else(|| missing("install"))?;
                install(&mut self.session, mode.style().unwrap_or(Style::Preserve))
            }
            Mode::Fix => {
                let fix = operations.fix.ok_or_else(|| missing("fix"))?;
                fix(&mut self.session)
            }
            Mode::Uninstall(depth) => {
                let uninstall = operations.uninstall.ok_or_else(|| missing("uninstall"))?;
                uninstall(&mut self.session, depth)
            }
        };

        result.map_err(|err| EngineError::Component {
            source: err,
            component: id,
        })
    }

    fn enter(&mut self, phase: Phase) {
        debug!("entering {phase:?}");
        self.trace.push(phase);
    }
}

fn join(ids: &[ComponentId]) -> String {
    ids.iter()
        .map(ComponentId::name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Fatal engine error types.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Component table is unusable for this request.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Required external tool is not on the search path.
    #[error("required command {command:?} not found on search path")]
    MissingDependency { command: String },

    /// Snapshot of managed paths failed.
    #[error(transparent)]
    Backup(#[from] BackupError),

    /// Component operation failed fatally.
    #[error("component {component} failed: {source}")]
    Component {
        #[source]
        source: ComponentError,
        component: ComponentId,
    },

    /// Version record cannot be written.
    #[error(transparent)]
    Version(#[from] VersionError),

    /// Confirmation could not be asked.
    #[error(transparent)]
    Prompt(#[from] PromptError),
}

/// Friendly result alias :3
pub type Result<T, E = EngineError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use simple_test_case::test_case;

    #[test_case("", Some(ModeKind::Full); "empty defaults to full")]
    #[test_case("2", Some(ModeKind::Minimal); "menu number")]
    #[test_case(" Fix ", Some(ModeKind::Fix); "mode name")]
    #[test_case("4", Some(ModeKind::Uninstall); "last entry")]
    #[test_case("0", None; "zero")]
    #[test_case("5", None; "past the end")]
    #[test_case("reinstall", None; "unknown name")]
    #[test]
    fn menu_choices(input: &str, expect: Option<ModeKind>) {
        assert_eq!(ModeKind::from_menu_choice(input), expect);
    }

    #[test]
    fn menu_lists_modes_in_order() {
        assert_eq!(
            ModeKind::menu(),
            "  1) full\n  2) minimal\n  3) fix\n  4) uninstall\n"
        );
    }

    #[test]
    fn only_install_modes_have_a_style() {
        assert_eq!(Mode::Full.style(), Some(Style::Clean));
        assert_eq!(Mode::Minimal.style(), Some(Style::Preserve));
        assert_eq!(Mode::Fix.style(), None);
        assert_eq!(Mode::Uninstall(Depth::Soft).style(), None);
    }

    #[test]
    fn exit_codes_follow_status() {
        let outcome = |status| Outcome {
            status,
            report: Report::new(),
            activated: Vec::new(),
            probes: Vec::new(),
            backup_dir: None,
            backups: Vec::new(),
            record: None,
            trace: vec![Phase::Idle],
        };

        assert_eq!(outcome(Status::Succeeded).exit_code(), 0);
        assert_eq!(outcome(Status::Cancelled).exit_code(), 0);
        assert_eq!(outcome(Status::Incomplete).exit_code(), 1);
        assert_eq!(outcome(Status::Aborted("boom".into())).exit_code(), 1);
    }
}
