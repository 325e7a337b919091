// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Base tooling every other component assumes.

use crate::{
    component::{ComponentId, Entry, Operations},
    config::Settings,
    probe::Expectation,
    session::{Depth, Result, Session, Style},
    workstation::Workstation,
};

pub(crate) fn entry() -> Entry {
    Entry {
        id: ComponentId::Core,
        requires: &[],
        operations: Operations {
            install: Some(install),
            fix: Some(fix),
            uninstall: Some(uninstall),
        },
        expectations,
        managed_paths: |_| Vec::new(),
    }
}

fn install(session: &mut Session, _style: Style) -> Result<()> {
    let packages = session.settings.packages.core.clone();
    session.ensure_packages(&packages);
    Ok(())
}

fn fix(session: &mut Session) -> Result<()> {
    install(session, Style::Preserve)
}

fn uninstall(session: &mut Session, depth: Depth) -> Result<()> {
    if depth == Depth::Full {
        let packages = session.settings.packages.core.clone();
        session.remove_packages(&packages)?;
    }

    Ok(())
}

fn expectations(_: &Workstation, settings: &Settings) -> Vec<Expectation> {
    std::iter::once(settings.package_manager.command.clone())
        .chain(settings.packages.core.iter().map(|package| package.command().to_string()))
        .map(Expectation::Command)
        .collect()
}
