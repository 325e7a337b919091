// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! External collaborators.
//!
//! Package installation and repository cloning are delegated to tools rigup
//! does not own: the system package manager, and remote Git repositories.
//! Both are reached through the [`Toolbox`] trait so the engine can be driven
//! against a fake in tests. Every call blocks until the tool finishes.

use crate::config::{Package, PackageManager};

use git2::{build::RepoBuilder, FetchOptions, RemoteCallbacks};
use indicatif::{ProgressBar, ProgressStyle};
use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    process::Command,
    time::{Duration, Instant},
};
use tracing::{debug, instrument};

/// Layer of indirection for external tools.
pub trait Toolbox {
    /// Run `program` with `args` to completion, returning combined output.
    fn run(&mut self, program: &str, args: &[String]) -> Result<String>;

    /// Clone remote repository at `url` into `dest`.
    fn clone_repository(&mut self, url: &str, dest: &Path) -> Result<()>;

    /// Install target package through the package manager.
    fn install_package(&mut self, manager: &PackageManager, package: &Package) -> Result<String> {
        self.run(&manager.command, &manager.install_args(package))
    }

    /// Uninstall target package through the package manager.
    fn uninstall_package(&mut self, manager: &PackageManager, package: &Package) -> Result<String> {
        self.run(&manager.command, &manager.uninstall_args(package))
    }
}

/// Real tools on the host system.
#[derive(Debug, Default)]
pub struct SystemToolbox;

impl SystemToolbox {
    pub fn new() -> Self {
        Self
    }
}

impl Toolbox for SystemToolbox {
    #[instrument(skip(self, args), level = "debug")]
    fn run(&mut self, program: &str, args: &[String]) -> Result<String> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
        bar.set_message(format!("{program} {}", args.join(" ")));
        bar.enable_steady_tick(Duration::from_millis(100));
        let output = syscall_non_interactive(program, args);
        bar.finish_and_clear();

        output
    }

    /// Clone remote repository with a progress bar.
    ///
    /// Only anonymous access is supported; plugin repositories are public.
    #[instrument(skip(self), level = "debug")]
    fn clone_repository(&mut self, url: &str, dest: &Path) -> Result<()> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{elapsed_precise:.green}  {msg:<50}  [{wide_bar:.yellow/blue}]",
        )?
        .progress_chars("-Cco.");
        bar.set_style(style);
        bar.set_message(url.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));

        let mut throttle = Instant::now();
        let mut rc = RemoteCallbacks::new();
        rc.transfer_progress(|progress| {
            if throttle.elapsed() > Duration::from_millis(10) {
                throttle = Instant::now();
                bar.set_length(progress.total_objects() as u64);
                bar.set_position(progress.received_objects() as u64);
            }
            true
        });

        let mut fo = FetchOptions::new();
        fo.remote_callbacks(rc);
        let cloned = RepoBuilder::new()
            .fetch_options(fo)
            .clone(url, dest)
            .map_err(|err| ToolError::Clone {
                source: err,
                url: url.into(),
                dest: dest.into(),
            });
        bar.finish_and_clear();
        cloned?;

        debug!("cloned {url} into {:?}", dest.display());
        Ok(())
    }

    /// Install package with inherited stdio.
    ///
    /// Package managers may ask for a password or confirmation, so their
    /// output goes straight to the terminal instead of behind a spinner.
    #[instrument(skip(self, manager), level = "debug")]
    fn install_package(&mut self, manager: &PackageManager, package: &Package) -> Result<String> {
        syscall_interactive(&manager.command, manager.install_args(package))?;
        Ok(String::new())
    }

    #[instrument(skip(self, manager), level = "debug")]
    fn uninstall_package(&mut self, manager: &PackageManager, package: &Package) -> Result<String> {
        syscall_interactive(&manager.command, manager.uninstall_args(package))?;
        Ok(String::new())
    }
}

fn syscall_interactive(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> Result<()> {
    let program = cmd.as_ref().to_string_lossy().into_owned();
    let status = Command::new(cmd.as_ref())
        .args(args)
        .spawn()
        .and_then(|mut child| child.wait())
        .map_err(|err| ToolError::Spawn {
            source: err,
            program: program.clone(),
        })?;

    if !status.success() {
        return Err(ToolError::Failed {
            program,
            message: format!("exited with {status}"),
        });
    }

    Ok(())
}

fn syscall_non_interactive(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> Result<String> {
    let program = cmd.as_ref().to_string_lossy().into_owned();
    let output = Command::new(cmd.as_ref())
        .args(args)
        .output()
        .map_err(|err| ToolError::Spawn {
            source: err,
            program: program.clone(),
        })?;
    let stdout = String::from_utf8_lossy(output.stdout.as_slice()).into_owned();
    let stderr = String::from_utf8_lossy(output.stderr.as_slice()).into_owned();
    let mut message = String::new();

    if !stdout.is_empty() {
        message.push_str(format!("stdout: {stdout}").as_str());
    }

    if !stderr.is_empty() {
        message.push_str(format!("stderr: {stderr}").as_str());
    }

    // INVARIANT: Chomp trailing newlines.
    let message = message
        .strip_suffix("\r\n")
        .or(message.strip_suffix('\n'))
        .map(ToString::to_string)
        .unwrap_or(message);

    if !output.status.success() {
        return Err(ToolError::Failed { program, message });
    }

    Ok(message)
}

/// External tool error types.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Program could not be started at all.
    #[error("failed to run {program:?}")]
    Spawn {
        #[source]
        source: std::io::Error,
        program: String,
    },

    /// Program ran but reported failure.
    #[error("command {program:?} failed:\n{message}")]
    Failed { program: String, message: String },

    /// Repository clone failed.
    #[error("failed to clone {url} into {:?}", dest.display())]
    Clone {
        #[source]
        source: git2::Error,
        url: String,
        dest: PathBuf,
    },

    /// Style template cannot be set for progress bars.
    #[error(transparent)]
    IndicatifStyleTemplate(#[from] indicatif::style::TemplateError),
}

/// Friendly result alias :3
pub type Result<T, E = ToolError> = std::result::Result<T, E>;
