// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of rigup's configuration file. Every section is
//! optional, any field left out falls back to the built-in default. The
//! payloads themselves (aliases, editor configuration, etc.) are not
//! configurable here; only _where_ they go and _which_ packages provide the
//! tools they rely on.
//!
//! # General Layout
//!
//! ```toml
//! [paths]
//! profile = ".zshrc"
//! notes_dir = "$HOME/notes"
//!
//! [package_manager]
//! command = "brew"
//! install = ["install"]
//! uninstall = ["uninstall"]
//!
//! [[packages.editor]]
//! name = "neovim"
//! command = "nvim"
//! ```
//!
//! Relative paths are relative to the home directory. All paths go through
//! shell expansion at parse time.

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs::read_to_string,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;

/// Top-level configuration settings.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Locations of managed files and directories.
    pub paths: PathSettings,

    /// External package manager used to install tools.
    pub package_manager: PackageManager,

    /// Packages each component relies on.
    pub packages: Packages,

    /// Remote repositories cloned during installation.
    pub repositories: Repositories,
}

impl Settings {
    /// Load settings from target configuration file.
    ///
    /// A missing file is not an error when `required` is false; the default
    /// settings are used instead.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Read`] if the file exists but cannot be read,
    ///   or if it is missing while `required` is true.
    /// - Return [`ConfigError::Deserialize`] if parsing fails.
    pub fn load(path: impl AsRef<Path>, required: bool) -> Result<Self> {
        let path = path.as_ref();
        if !required && !path.exists() {
            debug!("no configuration at {:?}, using defaults", path.display());
            return Ok(Self::default());
        }

        read_to_string(path)
            .map_err(|err| ConfigError::Read {
                source: err,
                path: path.into(),
            })?
            .parse()
    }
}

impl FromStr for Settings {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut settings: Settings = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on every path field.
        let paths = &mut settings.paths;
        for field in [
            &mut paths.profile,
            &mut paths.editor_dir,
            &mut paths.multiplexer_conf,
            &mut paths.multiplexer_plugins,
            &mut paths.notes_dir,
            &mut paths.bin_dir,
            &mut paths.state_dir,
        ] {
            let expanded = expand(field)?;
            *field = expanded;
        }

        Ok(settings)
    }
}

impl Display for Settings {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

fn expand(path: &Path) -> Result<PathBuf> {
    Ok(PathBuf::from(
        shellexpand::full(path.to_string_lossy().as_ref())
            .map_err(ConfigError::ShellExpansion)?
            .into_owned(),
    ))
}

/// Locations of everything rigup manages.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathSettings {
    /// Shell profile that receives managed blocks.
    pub profile: PathBuf,

    /// Editor configuration directory.
    pub editor_dir: PathBuf,

    /// Multiplexer configuration file.
    pub multiplexer_conf: PathBuf,

    /// Directory holding multiplexer plugins.
    pub multiplexer_plugins: PathBuf,

    /// User's notes directory.
    pub notes_dir: PathBuf,

    /// Directory for helper scripts.
    pub bin_dir: PathBuf,

    /// Directory for rigup's own state (version record, backups).
    pub state_dir: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            profile: ".zshrc".into(),
            editor_dir: ".config/nvim".into(),
            multiplexer_conf: ".tmux.conf".into(),
            multiplexer_plugins: ".tmux/plugins".into(),
            notes_dir: "notes".into(),
            bin_dir: ".local/bin".into(),
            state_dir: ".rigup".into(),
        }
    }
}

/// External package manager invocation.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PackageManager {
    /// Package manager binary.
    pub command: String,

    /// Arguments placed before the package name to install it.
    pub install: Vec<String>,

    /// Arguments placed before the package name to uninstall it.
    pub uninstall: Vec<String>,
}

impl PackageManager {
    /// Full argument list to install target package.
    pub fn install_args(&self, package: &Package) -> Vec<String> {
        let mut args = self.install.clone();
        args.push(package.name.clone());
        args
    }

    /// Full argument list to uninstall target package.
    pub fn uninstall_args(&self, package: &Package) -> Vec<String> {
        let mut args = self.uninstall.clone();
        args.push(package.name.clone());
        args
    }
}

impl Default for PackageManager {
    fn default() -> Self {
        Self {
            command: "brew".into(),
            install: vec!["install".into()],
            uninstall: vec!["uninstall".into()],
        }
    }
}

/// A package as known to the package manager.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct Package {
    /// Name passed to the package manager.
    pub name: String,

    /// Command the package puts on `PATH`, if it differs from the name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl Package {
    /// Construct package whose command matches its name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: None,
        }
    }

    /// Construct package that provides a differently named command.
    pub fn providing(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: Some(command.into()),
        }
    }

    /// Command this package provides.
    pub fn command(&self) -> &str {
        self.command.as_deref().unwrap_or(&self.name)
    }
}

/// Package listings per component.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Packages {
    pub core: Vec<Package>,
    pub shell: Vec<Package>,
    pub editor: Vec<Package>,
    pub multiplexer: Vec<Package>,
}

impl Default for Packages {
    fn default() -> Self {
        Self {
            core: vec![
                Package::new("git"),
                Package::new("curl"),
                Package::providing("ripgrep", "rg"),
                Package::new("fzf"),
                Package::new("node"),
            ],
            shell: vec![Package::new("zsh")],
            editor: vec![Package::providing("neovim", "nvim")],
            multiplexer: vec![Package::new("tmux")],
        }
    }
}

/// Remote repositories.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Repositories {
    /// Multiplexer plugin manager.
    pub plugin_manager: String,
}

impl Default for Repositories {
    fn default() -> Self {
        Self {
            plugin_manager: "https://github.com/tmux-plugins/tpm".into(),
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file cannot be read.
    #[error("failed to read configuration at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    #[sealed_test(env = [("NOTES", "/srv/notes")])]
    fn deserialize_settings_expands_paths() -> anyhow::Result<()> {
        let result: Settings = r#"
            [paths]
            profile = ".bashrc"
            notes_dir = "$NOTES/personal"

            [package_manager]
            command = "apt-get"
            install = ["install", "-y"]
            uninstall = ["remove", "-y"]

            [[packages.editor]]
            name = "neovim"
            command = "nvim"
        "#
        .parse()?;

        let expect = Settings {
            paths: PathSettings {
                profile: ".bashrc".into(),
                notes_dir: "/srv/notes/personal".into(),
                ..PathSettings::default()
            },
            package_manager: PackageManager {
                command: "apt-get".into(),
                install: vec!["install".into(), "-y".into()],
                uninstall: vec!["remove".into(), "-y".into()],
            },
            packages: Packages {
                editor: vec![Package::providing("neovim", "nvim")],
                ..Packages::default()
            },
            repositories: Repositories::default(),
        };

        assert_eq!(result, expect);

        Ok(())
    }

    #[test]
    fn empty_configuration_yields_defaults() -> anyhow::Result<()> {
        let result: Settings = "".parse()?;
        assert_eq!(result, Settings::default());
        Ok(())
    }

    #[test]
    fn displayed_settings_parse_back() -> anyhow::Result<()> {
        let settings = Settings::default();
        let result: Settings = settings.to_string().parse()?;
        assert_eq!(result, settings);
        Ok(())
    }

    #[test]
    fn package_manager_builds_argument_lists() {
        let manager = PackageManager::default();
        let package = Package::providing("ripgrep", "rg");
        assert_eq!(manager.install_args(&package), vec!["install", "ripgrep"]);
        assert_eq!(manager.uninstall_args(&package), vec!["uninstall", "ripgrep"]);
        assert_eq!(package.command(), "rg");
    }

    #[sealed_test]
    fn missing_optional_file_yields_defaults() -> anyhow::Result<()> {
        let result = Settings::load("does-not-exist.toml", false)?;
        assert_eq!(result, Settings::default());
        assert!(Settings::load("does-not-exist.toml", true).is_err());
        Ok(())
    }
}
