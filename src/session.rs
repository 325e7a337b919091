// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! State shared by every component operation during one run.
//!
//! A [`Session`] bundles the workstation context, the run's backup manager,
//! the external collaborators, and the report. Component operations only
//! ever touch the machine through it.

use crate::{
    backup::{BackupError, BackupManager},
    config::{Package, Settings},
    exec::Toolbox,
    mutate::{MutateError, Mutator},
    probe::{is_executable, StateProbe},
    prompt::{PromptError, Prompter},
    report::Report,
    workstation::{Layout, Workstation},
};

use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

/// How an installer treats existing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// Replace managed files and blocks wholesale, after backing them up.
    Clean,

    /// Only add what is missing; never overwrite existing content.
    Preserve,
}

/// How far an uninstall goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    /// Remove managed configuration only.
    Soft,

    /// Also remove the underlying tools, asking per tool.
    Full,
}

/// Everything a component operation may use.
pub struct Session {
    pub workstation: Workstation,
    pub settings: Settings,
    pub backups: BackupManager,
    pub toolbox: Box<dyn Toolbox>,
    pub prompter: Box<dyn Prompter>,
    pub report: Report,
}

impl Session {
    /// Construct new session for one run.
    pub fn new(
        workstation: Workstation,
        settings: Settings,
        toolbox: Box<dyn Toolbox>,
        prompter: Box<dyn Prompter>,
    ) -> Self {
        let backups = BackupManager::new(
            workstation.layout().backups_dir.clone(),
            workstation.home().to_path_buf(),
        );
        Self {
            workstation,
            settings,
            backups,
            toolbox,
            prompter,
            report: Report::new(),
        }
    }

    pub fn layout(&self) -> &Layout {
        self.workstation.layout()
    }

    pub fn probe(&self) -> StateProbe<'_> {
        StateProbe::new(&self.workstation)
    }

    pub fn mutator(&mut self) -> Mutator<'_> {
        Mutator::new(&mut self.backups)
    }

    /// Install every package whose command is not on the search path.
    ///
    /// Install failures are warnings; the run goes on and verification
    /// reports what is still missing.
    pub fn ensure_packages(&mut self, packages: &[Package]) {
        let manager = self.settings.package_manager.clone();
        for package in packages {
            let probe = self.probe().command_on_path(package.command());
            if probe.present {
                self.report.ok(format!("{} {}", package.command(), probe.diagnostic));
                continue;
            }

            if !self.probe().command_on_path(&manager.command).present {
                self.report.warn(format!(
                    "cannot install {}: package manager {} not found",
                    package.name, manager.command
                ));
                continue;
            }

            match self.toolbox.install_package(&manager, package) {
                Ok(_) => self.report.change(format!("installed package {}", package.name)),
                Err(err) => self
                    .report
                    .warn(format!("failed to install package {}: {err}", package.name)),
            }
        }
    }

    /// Ask per package, then uninstall the ones confirmed.
    ///
    /// # Errors
    ///
    /// - Return [`ComponentError::Prompt`] if the question cannot be asked.
    pub fn remove_packages(&mut self, packages: &[Package]) -> Result<()> {
        let manager = self.settings.package_manager.clone();
        for package in packages {
            if !self.probe().command_on_path(package.command()).present {
                debug!("{} not installed, nothing to remove", package.name);
                continue;
            }

            let question = format!("Remove package {}?", package.name);
            if !self.prompter.confirm(&question, false)? {
                self.report.ok(format!("kept package {}", package.name));
                continue;
            }

            match self.toolbox.uninstall_package(&manager, package) {
                Ok(_) => self.report.change(format!("removed package {}", package.name)),
                Err(err) => self
                    .report
                    .warn(format!("failed to remove package {}: {err}", package.name)),
            }
        }

        Ok(())
    }

    /// Create directory (and parents) if missing.
    ///
    /// # Errors
    ///
    /// - Return [`ComponentError::Io`] if creation fails.
    pub fn ensure_dir(&mut self, path: &Path) -> Result<bool> {
        if path.is_dir() {
            self.report.ok(format!("{} exists", path.display()));
            return Ok(false);
        }

        fs::create_dir_all(path).map_err(|err| ComponentError::Io {
            source: err,
            path: path.into(),
        })?;
        self.report.change(format!("created directory {}", path.display()));

        Ok(true)
    }

    /// Write a whole managed file according to `style`.
    ///
    /// [`Style::Clean`] replaces the file if its content differs.
    /// [`Style::Preserve`] only creates it when absent.
    ///
    /// # Errors
    ///
    /// - Return [`ComponentError::Backup`] if backup or write fails.
    pub fn write_file(&mut self, content: &str, path: &Path, style: Style) -> Result<bool> {
        if style == Style::Preserve && path.exists() {
            self.report.ok(format!("kept existing {}", path.display()));
            return Ok(false);
        }

        let changed = self.backups.safe_update(content, path)?;
        if changed {
            self.report.change(format!("wrote {}", path.display()));
        } else {
            self.report.ok(format!("{} up to date", path.display()));
        }

        Ok(changed)
    }

    /// Set the execute bits on target file, backing it up first.
    ///
    /// # Errors
    ///
    /// - Return [`ComponentError::Backup`] if the backup fails.
    /// - Return [`ComponentError::Io`] if permissions cannot be changed.
    pub fn ensure_executable(&mut self, path: &Path) -> Result<bool> {
        if !path.is_file() || is_executable(path) {
            return Ok(false);
        }

        self.backups.backup(path)?;
        set_executable(path).map_err(|err| ComponentError::Io {
            source: err,
            path: path.into(),
        })?;
        self.report.change(format!("made {} executable", path.display()));

        Ok(true)
    }

    /// Back up target path, then remove it.
    ///
    /// # Errors
    ///
    /// - Return [`ComponentError::Backup`] if backup or removal fails.
    pub fn remove_path(&mut self, path: &Path) -> Result<bool> {
        let removed = self.backups.safe_remove(path)?;
        if removed {
            self.report.change(format!("removed {}", path.display()));
        } else {
            self.report.ok(format!("{} already absent", path.display()));
        }

        Ok(removed)
    }
}

#[cfg(unix)]
fn set_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_mode(permissions.mode() | 0o111);
    fs::set_permissions(path, permissions)
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Component operation error types.
///
/// Every variant is fatal for the current mode.
#[derive(Debug, thiserror::Error)]
pub enum ComponentError {
    /// Backup, or the write depending on it, failed.
    #[error(transparent)]
    Backup(#[from] BackupError),

    /// Configuration file mutation failed.
    #[error(transparent)]
    Mutate(#[from] MutateError),

    /// Confirmation could not be asked.
    #[error(transparent)]
    Prompt(#[from] PromptError),

    /// Directory or permission change failed.
    #[error("failed to update {:?}", path.display())]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = ComponentError> = std::result::Result<T, E>;
