// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Snapshot-before-mutate backups.
//!
//! Every file or directory rigup is about to overwrite or remove is first
//! copied into a __backup run__ directory. One run directory exists per
//! top-level invocation, named after the time the invocation started, so
//! everything touched by one run can be restored in one go.
//!
//! # Backup Run Layout
//!
//! ```text
//! $state_dir/backups/20261019-141502/
//! ├── manifest.toml        # every BackupRecord of the run
//! ├── diagnostics.txt      # fix mode only
//! ├── .zshrc               # paths under home keep their relative layout
//! └── .config/nvim/...
//! ```
//!
//! Paths outside the home directory are stored by base name. The run
//! directory is only created once something actually needs backing up.
//!
//! Backups are never pruned by rigup. Retention is the user's business.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, read_to_string, write},
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument};

/// Name of the manifest file inside a backup run directory.
pub const MANIFEST: &str = "manifest.toml";

/// Kind of filesystem entry captured by a backup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// Proof that a path was snapshotted before being touched.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BackupRecord {
    pub source: PathBuf,
    pub backup: PathBuf,
    pub timestamp: DateTime<Local>,
    pub kind: EntryKind,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct Manifest {
    #[serde(default)]
    records: Vec<BackupRecord>,
}

/// Take and track backups for one invocation.
#[derive(Debug)]
pub struct BackupManager {
    backups_dir: PathBuf,
    home: PathBuf,
    started: DateTime<Local>,
    run_dir: Option<PathBuf>,
    records: Vec<BackupRecord>,
}

impl BackupManager {
    /// Construct new backup manager.
    ///
    /// The run timestamp is fixed here, once per invocation.
    pub fn new(backups_dir: impl Into<PathBuf>, home: impl Into<PathBuf>) -> Self {
        Self {
            backups_dir: backups_dir.into(),
            home: home.into(),
            started: Local::now(),
            run_dir: None,
            records: Vec::new(),
        }
    }

    /// Run directory, if anything has been backed up yet.
    pub fn run_dir(&self) -> Option<&Path> {
        self.run_dir.as_deref()
    }

    /// All records taken during this run, in order.
    pub fn records(&self) -> &[BackupRecord] {
        &self.records
    }

    /// Find the record covering target path, if any.
    pub fn record_for(&self, path: impl AsRef<Path>) -> Option<&BackupRecord> {
        self.records
            .iter()
            .find(|record| record.source == path.as_ref())
    }

    /// Snapshot target path into the run directory.
    ///
    /// Directories are copied recursively. Returns `None` without touching
    /// anything if the path does not exist. A path already backed up during
    /// this run keeps its first snapshot, which is its state from before the
    /// run started mutating it.
    ///
    /// # Errors
    ///
    /// - Return [`BackupError::CreateRun`] if run directory cannot be made.
    /// - Return [`BackupError::Copy`] if the copy fails.
    /// - Return [`BackupError::WriteManifest`] if the manifest cannot be
    ///   updated.
    #[instrument(skip(self, path), level = "debug")]
    pub fn backup(&mut self, path: impl AsRef<Path>) -> Result<Option<PathBuf>> {
        let path = path.as_ref();
        let Ok(meta) = fs::symlink_metadata(path) else {
            debug!("nothing to back up at {:?}", path.display());
            return Ok(None);
        };

        if let Some(record) = self.record_for(path) {
            debug!("{:?} already backed up this run", path.display());
            return Ok(Some(record.backup.clone()));
        }

        let relative = match path.strip_prefix(&self.home) {
            Ok(relative) if !relative.as_os_str().is_empty() => relative.to_path_buf(),
            _ => PathBuf::from(path.file_name().unwrap_or(path.as_os_str())),
        };
        let mut dest = self.ensure_run_dir()?.join(relative);
        while dest.exists() {
            let mut name = dest.as_os_str().to_owned();
            name.push(".1");
            dest = PathBuf::from(name);
        }

        let kind = if meta.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        if let Some(parent) = dest.parent() {
            mkdirp::mkdirp(parent).map_err(|err| BackupError::Copy {
                source: err,
                from: path.into(),
                to: dest.clone(),
            })?;
        }
        copy_entry(path, &dest).map_err(|err| BackupError::Copy {
            source: err,
            from: path.into(),
            to: dest.clone(),
        })?;

        info!("backed up {:?} to {:?}", path.display(), dest.display());
        self.records.push(BackupRecord {
            source: path.into(),
            backup: dest.clone(),
            timestamp: Local::now(),
            kind,
        });
        self.write_manifest()?;

        Ok(Some(dest))
    }

    /// Back up target file if present, then overwrite it with new content.
    ///
    /// Parent directories are created as needed. Returns whether the file
    /// changed. A file that already holds `content` is left alone and is not
    /// backed up.
    ///
    /// # Errors
    ///
    /// - Return any [`BackupError`] from [`BackupManager::backup`]; the
    ///   target is not written in that case.
    /// - Return [`BackupError::Write`] if the target cannot be written.
    pub fn safe_update(&mut self, content: impl AsRef<[u8]>, target: impl AsRef<Path>) -> Result<bool> {
        let target = target.as_ref();
        let content = content.as_ref();
        if fs::read(target).is_ok_and(|current| current == content) {
            debug!("{:?} already up to date", target.display());
            return Ok(false);
        }

        self.backup(target)?;
        if let Some(parent) = target.parent() {
            mkdirp::mkdirp(parent).map_err(|err| BackupError::Write {
                source: err,
                path: target.into(),
            })?;
        }
        write(target, content).map_err(|err| BackupError::Write {
            source: err,
            path: target.into(),
        })?;

        Ok(true)
    }

    /// Back up target path, then remove it.
    ///
    /// Returns whether anything was removed.
    ///
    /// # Errors
    ///
    /// - Return any [`BackupError`] from [`BackupManager::backup`]; nothing is
    ///   removed in that case.
    /// - Return [`BackupError::Remove`] if removal fails.
    pub fn safe_remove(&mut self, target: impl AsRef<Path>) -> Result<bool> {
        let target = target.as_ref();
        let Ok(meta) = fs::symlink_metadata(target) else {
            return Ok(false);
        };

        self.backup(target)?;
        let removed = if meta.is_dir() {
            fs::remove_dir_all(target)
        } else {
            fs::remove_file(target)
        };
        removed.map_err(|err| BackupError::Remove {
            source: err,
            path: target.into(),
        })?;

        Ok(true)
    }

    /// Write a free-form text note into the run directory.
    ///
    /// # Errors
    ///
    /// - Return [`BackupError::CreateRun`] if run directory cannot be made.
    /// - Return [`BackupError::Write`] if the note cannot be written.
    pub fn write_note(&mut self, name: &str, content: impl AsRef<str>) -> Result<PathBuf> {
        let path = self.ensure_run_dir()?.join(name);
        write(&path, content.as_ref()).map_err(|err| BackupError::Write {
            source: err,
            path: path.clone(),
        })?;

        Ok(path)
    }

    /// Restore every record of a previous backup run to its source path.
    ///
    /// Whatever currently sits at each source path is backed up into this
    /// run first.
    ///
    /// # Errors
    ///
    /// - Return [`BackupError::ReadManifest`] if the run has no readable
    ///   manifest.
    /// - Return any error from backing up or removing the current state.
    /// - Return [`BackupError::Copy`] if a restore copy fails.
    #[instrument(skip(self, run_dir), level = "debug")]
    pub fn restore_run(&mut self, run_dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let manifest = read_manifest(run_dir.as_ref())?;
        let mut restored = Vec::new();
        for record in manifest.records {
            self.safe_remove(&record.source)?;
            if let Some(parent) = record.source.parent() {
                mkdirp::mkdirp(parent).map_err(|err| BackupError::Write {
                    source: err,
                    path: record.source.clone(),
                })?;
            }
            copy_entry(&record.backup, &record.source).map_err(|err| BackupError::Copy {
                source: err,
                from: record.backup.clone(),
                to: record.source.clone(),
            })?;
            info!("restored {:?}", record.source.display());
            restored.push(record.source);
        }

        Ok(restored)
    }

    fn ensure_run_dir(&mut self) -> Result<PathBuf> {
        if let Some(run_dir) = &self.run_dir {
            return Ok(run_dir.clone());
        }

        // INVARIANT: Never share a run directory with a previous invocation.
        let stamp = self.started.format("%Y%m%d-%H%M%S").to_string();
        let mut run_dir = self.backups_dir.join(&stamp);
        let mut bump = 1;
        while run_dir.exists() {
            run_dir = self.backups_dir.join(format!("{stamp}-{bump}"));
            bump += 1;
        }

        fs::create_dir_all(&run_dir).map_err(|err| BackupError::CreateRun {
            source: err,
            path: run_dir.clone(),
        })?;
        info!("backup directory for this run: {:?}", run_dir.display());
        self.run_dir = Some(run_dir.clone());

        Ok(run_dir)
    }

    fn write_manifest(&mut self) -> Result<()> {
        let path = self.ensure_run_dir()?.join(MANIFEST);
        let manifest = Manifest {
            records: self.records.clone(),
        };
        let content = toml::ser::to_string_pretty(&manifest).map_err(BackupError::SerializeManifest)?;
        write(&path, content).map_err(|err| BackupError::WriteManifest { source: err, path })
    }
}

/// List every backup run under target backups directory, oldest first.
///
/// Only directories holding a manifest count as runs.
///
/// # Errors
///
/// - Return [`BackupError::Pattern`] if the directory path cannot form a
///   valid glob pattern.
pub fn list_runs(backups_dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let escaped = glob::Pattern::escape(&backups_dir.as_ref().to_string_lossy());
    let pattern = format!("{escaped}/*/{MANIFEST}");

    let mut runs = glob::glob(&pattern)?
        .filter_map(std::result::Result::ok)
        .filter_map(|manifest| manifest.parent().map(Path::to_path_buf))
        .collect::<Vec<_>>();
    runs.sort();

    Ok(runs)
}

fn read_manifest(run_dir: &Path) -> Result<Manifest> {
    let path = run_dir.join(MANIFEST);
    let content = read_to_string(&path).map_err(|err| BackupError::ReadManifest {
        source: err,
        path: path.clone(),
    })?;

    Ok(toml::de::from_str(&content)?)
}

fn copy_entry(from: &Path, to: &Path) -> std::io::Result<()> {
    let meta = fs::symlink_metadata(from)?;
    if meta.is_dir() {
        fs::create_dir_all(to)?;
        for entry in fs::read_dir(from)? {
            let entry = entry?;
            copy_entry(&entry.path(), &to.join(entry.file_name()))?;
        }
        return Ok(());
    }

    #[cfg(unix)]
    if meta.file_type().is_symlink() {
        return std::os::unix::fs::symlink(fs::read_link(from)?, to);
    }

    fs::copy(from, to).map(|_| ())
}

/// Backup error types.
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    /// Run directory cannot be created.
    #[error("failed to create backup directory at {:?}", path.display())]
    CreateRun {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Snapshot copy fails.
    #[error("failed to copy {:?} to {:?}", from.display(), to.display())]
    Copy {
        #[source]
        source: std::io::Error,
        from: PathBuf,
        to: PathBuf,
    },

    /// Target cannot be written after backup.
    #[error("failed to write {:?}", path.display())]
    Write {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Target cannot be removed after backup.
    #[error("failed to remove {:?}", path.display())]
    Remove {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Manifest cannot be written.
    #[error("failed to write backup manifest at {:?}", path.display())]
    WriteManifest {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Manifest cannot be read.
    #[error("failed to read backup manifest at {:?}", path.display())]
    ReadManifest {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Manifest cannot be parsed.
    #[error(transparent)]
    ParseManifest(#[from] toml::de::Error),

    /// Manifest cannot be serialized.
    #[error(transparent)]
    SerializeManifest(toml::ser::Error),

    /// Backups directory does not form a valid glob pattern.
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),
}

/// Friendly result alias :3
pub type Result<T, E = BackupError> = std::result::Result<T, E>;
