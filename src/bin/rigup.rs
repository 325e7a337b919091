// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use rigup::{
    backup::{list_runs, BackupManager},
    config::Settings,
    exec::SystemToolbox,
    mode::{Engine, Mode, ModeKind, Request},
    path::{default_config_path, home_dir, search_path},
    prompt::{InquirePrompter, Prompter},
    session::{Depth, Session},
    version::VersionTracker,
    workstation::Workstation,
    ComponentId, Registry,
};

use anyhow::{anyhow, bail, Result};
use clap::{Parser, ValueEnum};
use std::{path::PathBuf, process::exit};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about = "Bring a developer workstation to its declared configuration and keep it there",
    override_usage = "\n  rigup [options] [--mode <mode>] [--component <name>]...\n  rigup [options] <--list | --status | --backups | --restore [run]>",
    version
)]
struct Cli {
    /// Mode to run. Prompts with a menu when omitted.
    #[arg(short, long, value_enum, value_name = "mode")]
    pub mode: Option<CliMode>,

    /// Only target named component (and its prerequisites).
    #[arg(short, long = "component", value_name = "name")]
    pub components: Vec<String>,

    /// With uninstall, also remove installed packages (asks per package).
    #[arg(long)]
    pub purge: bool,

    /// List known components and their prerequisites.
    #[arg(long, group = "query")]
    pub list: bool,

    /// Show last completed install and probe every expected target.
    #[arg(long, group = "query")]
    pub status: bool,

    /// List backup runs, oldest first.
    #[arg(long, group = "query")]
    pub backups: bool,

    /// Restore a backup run (latest when omitted).
    #[arg(long, group = "query", value_name = "run", num_args = 0..=1)]
    pub restore: Option<Option<String>>,

    /// Path to configuration file.
    #[arg(long, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Show debug output.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CliMode {
    /// Install everything, replacing managed configuration after backing it up.
    Full,

    /// Install everything, keeping existing customization.
    Minimal,

    /// Repair absent targets without running installers.
    Fix,

    /// Remove managed configuration.
    Uninstall,
}

impl From<CliMode> for ModeKind {
    fn from(mode: CliMode) -> Self {
        match mode {
            CliMode::Full => ModeKind::Full,
            CliMode::Minimal => ModeKind::Minimal,
            CliMode::Fix => ModeKind::Fix,
            CliMode::Uninstall => ModeKind::Uninstall,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_timer(false)
        .without_time();
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    match run(cli) {
        Ok(code) => exit(code),
        Err(error) => {
            error!("{error:?}");
            exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let settings = match &cli.config {
        Some(path) => Settings::load(path, true)?,
        None => Settings::load(default_config_path()?, false)?,
    };
    let workstation = Workstation::new(home_dir()?, search_path(), &settings);
    let registry = Registry::standard();

    if cli.list {
        run_list(&registry);
        return Ok(0);
    }

    if cli.status {
        run_status(&registry, &workstation, &settings)?;
        return Ok(0);
    }

    if cli.backups {
        run_backups(&workstation)?;
        return Ok(0);
    }

    if let Some(run) = cli.restore {
        run_restore(&workstation, run)?;
        return Ok(0);
    }

    let mut prompter = InquirePrompter::new();
    let kind = match cli.mode {
        Some(mode) => ModeKind::from(mode),
        None => select_mode(&mut prompter)?,
    };
    if cli.purge && kind != ModeKind::Uninstall {
        warn!("--purge only applies to uninstall, ignoring it");
    }
    let mode = match kind {
        ModeKind::Full => Mode::Full,
        ModeKind::Minimal => Mode::Minimal,
        ModeKind::Fix => Mode::Fix,
        ModeKind::Uninstall if cli.purge => Mode::Uninstall(Depth::Full),
        ModeKind::Uninstall => Mode::Uninstall(Depth::Soft),
    };
    let request = Request::new(mode).with_components(cli.components);

    let session = Session::new(
        workstation,
        settings,
        Box::new(SystemToolbox::new()),
        Box::new(prompter),
    );
    let outcome = Engine::new(registry, session).run(&request);
    if outcome.exit_code() == 0 {
        info!("{}", outcome.summary());
    } else {
        error!("{}", outcome.summary());
    }

    Ok(outcome.exit_code())
}

fn select_mode(prompter: &mut impl Prompter) -> Result<ModeKind> {
    println!("Select mode:\n{}", ModeKind::menu());
    let choice = prompter.input("Mode [1-4, default 1]:", "")?;
    ModeKind::from_menu_choice(&choice).ok_or_else(|| anyhow!("unknown mode choice {choice:?}"))
}

fn run_list(registry: &Registry) {
    for id in registry.ids() {
        let requires = registry
            .entry(id)
            .map(|entry| {
                entry
                    .requires
                    .iter()
                    .map(ComponentId::name)
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        if requires.is_empty() {
            println!("{id}");
        } else {
            println!("{id} (requires {requires})");
        }
    }
}

fn run_status(registry: &Registry, workstation: &Workstation, settings: &Settings) -> Result<()> {
    let tracker = VersionTracker::new(&workstation.layout().version_file);
    match tracker.read()? {
        Some(record) => println!("last install: {record}"),
        None => println!("last install: no completed install"),
    }

    let ids = registry.ids().collect::<Vec<_>>();
    for (id, result) in registry.survey(&ids, workstation, settings) {
        println!("[{id}] {result}");
    }

    Ok(())
}

fn run_backups(workstation: &Workstation) -> Result<()> {
    let runs = list_runs(&workstation.layout().backups_dir)?;
    if runs.is_empty() {
        println!("no backup runs");
    }
    for run in runs {
        println!("{}", run.display());
    }

    Ok(())
}

fn run_restore(workstation: &Workstation, run: Option<String>) -> Result<()> {
    let backups_dir = &workstation.layout().backups_dir;
    let run_dir = match run {
        Some(name) => {
            let path = PathBuf::from(&name);
            if path.is_dir() {
                path
            } else {
                backups_dir.join(name)
            }
        }
        None => match list_runs(backups_dir)?.pop() {
            Some(latest) => latest,
            None => bail!("no backup runs in {:?}", backups_dir.display()),
        },
    };

    let mut prompter = InquirePrompter::new();
    let question = format!("Restore backup run {}?", run_dir.display());
    if !prompter.confirm(&question, false)? {
        info!("restore declined");
        return Ok(());
    }

    let mut manager = BackupManager::new(backups_dir, workstation.home());
    let restored = manager.restore_run(&run_dir)?;
    info!("restored {} path(s) from {}", restored.len(), run_dir.display());
    if let Some(dir) = manager.run_dir() {
        info!("previous state saved in {}", dir.display());
    }

    Ok(())
}
