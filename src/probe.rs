// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Read-only state checks.
//!
//! A __probe__ answers one question about the workstation: is this command on
//! the search path, does this file exist, is this shell function defined in
//! the profile, and so on. Probes never fail. A missing target is the normal
//! outcome that drives installation and repair, so it is reported as an
//! absent [`ProbeResult`] with a short diagnostic instead of an error.

use crate::workstation::Workstation;

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs::read_to_string,
    io::ErrorKind,
    path::{Path, PathBuf},
};

/// What a probe looked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    Executable,
    File,
    Directory,
    ShellFunction,
    ShellAlias,
}

impl Display for ProbeKind {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Self::Executable => "executable",
            Self::File => "file",
            Self::Directory => "directory",
            Self::ShellFunction => "shell function",
            Self::ShellAlias => "shell alias",
        };
        fmt.write_str(name)
    }
}

/// Outcome of a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub target: String,
    pub kind: ProbeKind,
    pub present: bool,
    pub diagnostic: String,
}

impl ProbeResult {
    fn present(target: impl Into<String>, kind: ProbeKind, diagnostic: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            kind,
            present: true,
            diagnostic: diagnostic.into(),
        }
    }

    fn absent(target: impl Into<String>, kind: ProbeKind, diagnostic: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            kind,
            present: false,
            diagnostic: diagnostic.into(),
        }
    }
}

impl Display for ProbeResult {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let mark = if self.present { "present" } else { "absent" };
        write!(
            fmt,
            "{} {}: {mark} ({})",
            self.kind, self.target, self.diagnostic
        )
    }
}

/// Something a component expects to find once it is installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    Command(String),
    File(PathBuf),
    Directory(PathBuf),
    Executable(PathBuf),
    Function(String),
    Alias(String),
}

/// Read-only checks against a workstation.
#[derive(Debug, Clone, Copy)]
pub struct StateProbe<'ws> {
    workstation: &'ws Workstation,
}

impl<'ws> StateProbe<'ws> {
    /// Construct new probe over target workstation.
    pub fn new(workstation: &'ws Workstation) -> Self {
        Self { workstation }
    }

    /// Dispatch a probe for target expectation.
    pub fn check(&self, expectation: &Expectation) -> ProbeResult {
        match expectation {
            Expectation::Command(name) => self.command_on_path(name),
            Expectation::File(path) => self.file_exists(path),
            Expectation::Directory(path) => self.directory_exists(path),
            Expectation::Executable(path) => self.file_is_executable(path),
            Expectation::Function(name) => self.function_defined(name),
            Expectation::Alias(name) => self.alias_defined(name),
        }
    }

    /// Check if `name` resolves to an executable file on the search path.
    pub fn command_on_path(&self, name: &str) -> ProbeResult {
        for dir in self.workstation.search_path() {
            let candidate = dir.join(name);
            if is_executable(&candidate) {
                return ProbeResult::present(
                    name,
                    ProbeKind::Executable,
                    format!("found at {}", candidate.display()),
                );
            }
        }

        ProbeResult::absent(name, ProbeKind::Executable, "not found on search path")
    }

    /// Check if `path` exists as a regular file.
    pub fn file_exists(&self, path: &Path) -> ProbeResult {
        let target = path.display().to_string();
        if path.is_file() {
            ProbeResult::present(target, ProbeKind::File, "exists")
        } else if path.exists() {
            ProbeResult::absent(target, ProbeKind::File, "exists but is not a file")
        } else {
            ProbeResult::absent(target, ProbeKind::File, "missing")
        }
    }

    /// Check if `path` exists as a directory.
    pub fn directory_exists(&self, path: &Path) -> ProbeResult {
        let target = path.display().to_string();
        if path.is_dir() {
            ProbeResult::present(target, ProbeKind::Directory, "exists")
        } else if path.exists() {
            ProbeResult::absent(target, ProbeKind::Directory, "exists but is not a directory")
        } else {
            ProbeResult::absent(target, ProbeKind::Directory, "missing")
        }
    }

    /// Check if `path` is a file with an execute bit set.
    pub fn file_is_executable(&self, path: &Path) -> ProbeResult {
        let target = path.display().to_string();
        if !path.is_file() {
            return ProbeResult::absent(target, ProbeKind::Executable, "missing");
        }

        if is_executable(path) {
            ProbeResult::present(target, ProbeKind::Executable, "executable")
        } else {
            ProbeResult::absent(target, ProbeKind::Executable, "not executable")
        }
    }

    /// Check if shell function `name` is defined in the profile.
    ///
    /// Accepts both `name() {` and `function name` definition styles.
    pub fn function_defined(&self, name: &str) -> ProbeResult {
        self.search_profile(name, ProbeKind::ShellFunction, |line| {
            defines_function(line, name)
        })
    }

    /// Check if shell alias `name` is assigned in the profile.
    pub fn alias_defined(&self, name: &str) -> ProbeResult {
        let pattern = format!("alias {name}=");
        self.search_profile(name, ProbeKind::ShellAlias, |line| line.starts_with(&pattern))
    }

    fn search_profile(
        &self,
        name: &str,
        kind: ProbeKind,
        matches: impl Fn(&str) -> bool,
    ) -> ProbeResult {
        let profile = &self.workstation.layout().profile;
        let content = match read_to_string(profile) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return ProbeResult::absent(name, kind, "profile missing");
            }
            Err(err) => {
                return ProbeResult::absent(
                    name,
                    kind,
                    format!("cannot read {}: {err}", profile.display()),
                );
            }
        };

        match content
            .lines()
            .position(|line| matches(line.trim_start()))
        {
            Some(index) => ProbeResult::present(
                name,
                kind,
                format!("defined at {}:{}", profile.display(), index + 1),
            ),
            None => ProbeResult::absent(name, kind, format!("not defined in {}", profile.display())),
        }
    }
}

fn defines_function(line: &str, name: &str) -> bool {
    if let Some(rest) = line.strip_prefix("function ") {
        let rest = rest.trim_start();
        return rest
            .strip_prefix(name)
            .is_some_and(|tail| tail.is_empty() || tail.starts_with([' ', '(', '{']));
    }

    line.strip_prefix(name)
        .map(str::trim_start)
        .is_some_and(|tail| tail.starts_with("()"))
}

#[cfg(unix)]
pub(crate) fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
pub(crate) fn is_executable(path: &Path) -> bool {
    path.is_file()
}
