// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Workstation context.
//!
//! A [`Workstation`] is the one explicit value every probe, mutation, and
//! component operation receives in place of ambient globals like `HOME` and
//! `PATH`. The binary builds it from the real environment, tests build it
//! over a temporary directory.

use crate::config::Settings;

use std::path::{Path, PathBuf};

/// Name of the editor's entry point inside the editor directory.
pub const EDITOR_INIT: &str = "init.lua";

/// Name of the notes synchronization script inside the bin directory.
pub const NOTE_SYNC_SCRIPT: &str = "note-sync";

/// Name of the version record inside the state directory.
pub const VERSION_FILE: &str = "version.toml";

/// The machine being brought to its target configuration.
#[derive(Debug, Clone)]
pub struct Workstation {
    home: PathBuf,
    search_path: Vec<PathBuf>,
    layout: Layout,
}

impl Workstation {
    /// Construct new workstation rooted at `home`.
    ///
    /// Commands are looked up in `search_path` in order. Paths in `settings`
    /// are resolved against `home` unless already absolute.
    pub fn new(home: impl Into<PathBuf>, search_path: Vec<PathBuf>, settings: &Settings) -> Self {
        let home = home.into();
        let layout = Layout::resolve(&home, settings);
        Self {
            home,
            search_path,
            layout,
        }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }
}

/// Resolved absolute locations of every managed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub profile: PathBuf,
    pub editor_dir: PathBuf,
    pub editor_init: PathBuf,
    pub multiplexer_conf: PathBuf,
    pub multiplexer_plugins: PathBuf,
    pub plugin_manager: PathBuf,
    pub notes_dir: PathBuf,
    pub bin_dir: PathBuf,
    pub note_sync: PathBuf,
    pub state_dir: PathBuf,
    pub backups_dir: PathBuf,
    pub version_file: PathBuf,
}

impl Layout {
    fn resolve(home: &Path, settings: &Settings) -> Self {
        // INVARIANT: Joining an absolute path replaces the home prefix.
        let paths = &settings.paths;
        let editor_dir = home.join(&paths.editor_dir);
        let multiplexer_plugins = home.join(&paths.multiplexer_plugins);
        let bin_dir = home.join(&paths.bin_dir);
        let state_dir = home.join(&paths.state_dir);

        Self {
            profile: home.join(&paths.profile),
            editor_init: editor_dir.join(EDITOR_INIT),
            editor_dir,
            multiplexer_conf: home.join(&paths.multiplexer_conf),
            plugin_manager: multiplexer_plugins.join("tpm"),
            multiplexer_plugins,
            notes_dir: home.join(&paths.notes_dir),
            note_sync: bin_dir.join(NOTE_SYNC_SCRIPT),
            bin_dir,
            backups_dir: state_dir.join("backups"),
            version_file: state_dir.join(VERSION_FILE),
            state_dir,
        }
    }
}
