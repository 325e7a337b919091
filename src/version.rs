// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Outcome of the last completed install.
//!
//! One small TOML record per machine remembers which version of rigup last
//! brought the workstation fully up to date, when, and in which mode. The
//! record is informational only; it never gates fix or uninstall.

use crate::mode::ModeKind;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs::read_to_string,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Last successful full or minimal run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VersionRecord {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub mode: ModeKind,
}

impl Display for VersionRecord {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(
            fmt,
            "version {} installed {} ({} mode)",
            self.version,
            self.timestamp.to_rfc3339(),
            self.mode
        )
    }
}

/// Persist and read the version record.
#[derive(Debug, Clone)]
pub struct VersionTracker {
    path: PathBuf,
}

impl VersionTracker {
    /// Construct new tracker over target state file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the record with `version` and `mode`, stamped now.
    ///
    /// Written to a temporary file beside the target and renamed into place,
    /// so an interrupted write leaves the previous record intact.
    ///
    /// # Errors
    ///
    /// - Return [`VersionError::Write`] if the record cannot be written.
    /// - Return [`VersionError::Serialize`] if serialization fails.
    pub fn record(&self, version: impl Into<String>, mode: ModeKind) -> Result<VersionRecord> {
        let record = VersionRecord {
            version: version.into(),
            timestamp: Utc::now(),
            mode,
        };
        let content = toml::ser::to_string_pretty(&record)?;

        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        mkdirp::mkdirp(parent).map_err(|err| self.write_error(err))?;
        let mut tmp = NamedTempFile::new_in(parent).map_err(|err| self.write_error(err))?;
        tmp.write_all(content.as_bytes())
            .map_err(|err| self.write_error(err))?;
        tmp.as_file()
            .sync_all()
            .map_err(|err| self.write_error(err))?;
        tmp.persist(&self.path)
            .map_err(|err| self.write_error(err.error))?;

        info!("recorded {record}");
        Ok(record)
    }

    /// Read the last record, or `None` if no install ever completed.
    ///
    /// # Errors
    ///
    /// - Return [`VersionError::Read`] if the file exists but is unreadable.
    /// - Return [`VersionError::Deserialize`] if the file is malformed.
    pub fn read(&self) -> Result<Option<VersionRecord>> {
        let content = match read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("no version record at {:?}", self.path.display());
                return Ok(None);
            }
            Err(err) => {
                return Err(VersionError::Read {
                    source: err,
                    path: self.path.clone(),
                })
            }
        };

        Ok(Some(toml::de::from_str(&content)?))
    }

    fn write_error(&self, err: std::io::Error) -> VersionError {
        VersionError::Write {
            source: err,
            path: self.path.clone(),
        }
    }
}

/// Version record error types.
#[derive(Debug, thiserror::Error)]
pub enum VersionError {
    /// Record cannot be read.
    #[error("failed to read version record at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Record cannot be written.
    #[error("failed to write version record at {:?}", path.display())]
    Write {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Record is malformed.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Record cannot be serialized.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),
}

/// Friendly result alias :3
pub type Result<T, E = VersionError> = std::result::Result<T, E>;
