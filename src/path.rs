// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine where the user's home directory and rigup's own configuration
//! file live. Everything else is resolved relative to the home directory
//! through [`Workstation`](crate::workstation::Workstation).

use std::path::PathBuf;

/// Determine absolute path to user's home directory.
///
/// Does not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or(NoWayHome)
}

/// Determine default absolute path to rigup's configuration file.
///
/// Uses XDG Base Directory path `$XDG_CONFIG_HOME/rigup/config.toml`. Does not
/// check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
///
/// # See Also
///
/// - [XDG Base Directory](https://wiki.archlinux.org/title/XDG_Base_Directory)
pub fn default_config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|path| path.join("rigup").join("config.toml"))
        .ok_or(NoWayHome)
}

/// Split the `PATH` environment variable into its directory entries.
///
/// Empty entries are dropped. An unset `PATH` yields an empty search path, so
/// every command probe will report absent rather than fail.
pub fn search_path() -> Vec<PathBuf> {
    std::env::var_os("PATH")
        .map(|raw| {
            std::env::split_paths(&raw)
                .filter(|entry| !entry.as_os_str().is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// No way to determine user's home directory.
///
/// # See Also
///
/// - [`dirs::home_dir`](https://docs.rs/dirs/latest/dirs/fn.home_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's home directory")]
pub struct NoWayHome;

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;
