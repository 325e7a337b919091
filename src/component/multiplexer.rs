// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Terminal multiplexer package, configuration, and plugin manager.

use crate::{
    component::{payload::MULTIPLEXER_CONF, ComponentId, Entry, Operations},
    config::Settings,
    probe::Expectation,
    session::{Depth, Result, Session, Style},
    workstation::Workstation,
};

pub(crate) fn entry() -> Entry {
    Entry {
        id: ComponentId::Multiplexer,
        requires: &[ComponentId::Core],
        operations: Operations {
            install: Some(install),
            fix: Some(fix),
            uninstall: Some(uninstall),
        },
        expectations,
        managed_paths: |ws| {
            vec![
                ws.layout().multiplexer_conf.clone(),
                ws.layout().multiplexer_plugins.clone(),
            ]
        },
    }
}

fn install(session: &mut Session, style: Style) -> Result<()> {
    let packages = session.settings.packages.multiplexer.clone();
    session.ensure_packages(&packages);

    let conf = session.layout().multiplexer_conf.clone();
    session.write_file(MULTIPLEXER_CONF, &conf, style)?;
    ensure_plugin_manager(session);

    Ok(())
}

/// Clone the plugin manager if absent. Clone failures are warnings.
fn ensure_plugin_manager(session: &mut Session) {
    let dest = session.layout().plugin_manager.clone();
    if dest.is_dir() {
        session.report.ok(format!("{} exists", dest.display()));
        return;
    }

    let url = session.settings.repositories.plugin_manager.clone();
    match session.toolbox.clone_repository(&url, &dest) {
        Ok(()) => session
            .report
            .change(format!("cloned {url} into {}", dest.display())),
        Err(err) => session
            .report
            .warn(format!("failed to clone plugin manager: {err}")),
    }
}

fn fix(session: &mut Session) -> Result<()> {
    install(session, Style::Preserve)
}

fn uninstall(session: &mut Session, depth: Depth) -> Result<()> {
    let layout = session.layout().clone();
    session.remove_path(&layout.multiplexer_conf)?;
    session.remove_path(&layout.multiplexer_plugins)?;

    if depth == Depth::Full {
        let packages = session.settings.packages.multiplexer.clone();
        session.remove_packages(&packages)?;
    }

    Ok(())
}

fn expectations(workstation: &Workstation, settings: &Settings) -> Vec<Expectation> {
    let layout = workstation.layout();
    settings
        .packages
        .multiplexer
        .iter()
        .map(|package| Expectation::Command(package.command().into()))
        .chain([
            Expectation::File(layout.multiplexer_conf.clone()),
            Expectation::Directory(layout.plugin_manager.clone()),
        ])
        .collect()
}
