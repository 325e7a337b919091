// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Shell package and the managed `aliases` block of the profile.

use crate::{
    component::{alias_name, payload::ALIASES, ComponentId, Entry, Operations},
    config::Settings,
    probe::Expectation,
    session::{Depth, Result, Session, Style},
    workstation::Workstation,
};

/// Name of the managed profile block.
pub const BLOCK: &str = "aliases";

pub(crate) fn entry() -> Entry {
    Entry {
        id: ComponentId::Shell,
        requires: &[ComponentId::Core],
        operations: Operations {
            install: Some(install),
            fix: Some(fix),
            uninstall: Some(uninstall),
        },
        expectations,
        managed_paths: |ws| vec![ws.layout().profile.clone()],
    }
}

fn install(session: &mut Session, style: Style) -> Result<()> {
    let packages = session.settings.packages.shell.clone();
    session.ensure_packages(&packages);

    let profile = session.layout().profile.clone();
    let result = match style {
        Style::Clean => session.mutator().replace_block(BLOCK, ALIASES, &profile)?,
        Style::Preserve => session.mutator().append_block_if_absent(BLOCK, ALIASES, &profile)?,
    };
    session.report.mutation(&result);

    Ok(())
}

fn fix(session: &mut Session) -> Result<()> {
    let packages = session.settings.packages.shell.clone();
    session.ensure_packages(&packages);

    let profile = session.layout().profile.clone();
    let missing = ALIASES
        .iter()
        .copied()
        .filter(|line| {
            alias_name(line).is_some_and(|name| !session.probe().alias_defined(name).present)
        })
        .collect::<Vec<_>>();

    // INVARIANT: Repairs land inside the managed block so uninstall removes them.
    let result = session.mutator().extend_block(BLOCK, &missing, &profile)?;
    session.report.mutation(&result);

    Ok(())
}

fn uninstall(session: &mut Session, depth: Depth) -> Result<()> {
    let profile = session.layout().profile.clone();
    let result = session.mutator().remove_block(BLOCK, &profile)?;
    session.report.mutation(&result);

    if depth == Depth::Full {
        let packages = session.settings.packages.shell.clone();
        session.remove_packages(&packages)?;
    }

    Ok(())
}

fn expectations(_: &Workstation, settings: &Settings) -> Vec<Expectation> {
    settings
        .packages
        .shell
        .iter()
        .map(|package| Expectation::Command(package.command().into()))
        .chain(
            ALIASES
                .iter()
                .filter_map(|line| alias_name(line))
                .map(|name| Expectation::Alias(name.into())),
        )
        .collect()
}
