// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Editor package, its configuration directory, and the `EDITOR` setting.
//!
//! An `EDITOR` assignment rigup adds lives in the managed `editor` block of
//! the profile. A full install rewrites an assignment the user already has in
//! place instead.

use crate::{
    component::{
        payload::{EDITOR_INIT, EDITOR_PLUGIN_SYNC},
        ComponentId, Entry, Operations,
    },
    config::Settings,
    probe::Expectation,
    session::{Depth, Result, Session, Style},
    workstation::Workstation,
};

/// Shell setting pointing at the editor command.
pub const EDITOR_SETTING: &str = "EDITOR";

/// Name of the managed profile block.
pub const BLOCK: &str = "editor";

pub(crate) fn entry() -> Entry {
    Entry {
        id: ComponentId::Editor,
        requires: &[ComponentId::Core],
        operations: Operations {
            install: Some(install),
            fix: Some(fix),
            uninstall: Some(uninstall),
        },
        expectations,
        managed_paths: |ws| {
            vec![
                ws.layout().editor_dir.clone(),
                ws.layout().profile.clone(),
            ]
        },
    }
}

fn editor_command(settings: &Settings) -> String {
    settings
        .packages
        .editor
        .first()
        .map(|package| package.command().to_string())
        .unwrap_or_else(|| "vi".into())
}

fn install(session: &mut Session, style: Style) -> Result<()> {
    let packages = session.settings.packages.editor.clone();
    session.ensure_packages(&packages);

    let layout = session.layout().clone();
    session.ensure_dir(&layout.editor_dir)?;
    session.write_file(EDITOR_INIT, &layout.editor_init, style)?;

    let command = editor_command(&session.settings);
    let result = match style {
        Style::Clean => {
            session
                .mutator()
                .replace_or_append_setting(EDITOR_SETTING, &command, BLOCK, &layout.profile)?
        }
        Style::Preserve => {
            session
                .mutator()
                .append_setting_if_absent(EDITOR_SETTING, &command, BLOCK, &layout.profile)?
        }
    };
    session.report.mutation(&result);

    sync_plugins(session, &command);

    Ok(())
}

/// Best effort: plugin sync needs network access and a working editor.
fn sync_plugins(session: &mut Session, command: &str) {
    if !session.probe().command_on_path(command).present {
        session
            .report
            .warn(format!("skipping plugin sync: {command} not found"));
        return;
    }

    let args: Vec<String> = EDITOR_PLUGIN_SYNC.iter().map(|arg| arg.to_string()).collect();
    match session.toolbox.run(command, &args) {
        Ok(_) => session.report.ok("editor plugins synced"),
        Err(err) => session.report.warn(format!("editor plugin sync failed: {err}")),
    }
}

fn fix(session: &mut Session) -> Result<()> {
    let packages = session.settings.packages.editor.clone();
    session.ensure_packages(&packages);

    let layout = session.layout().clone();
    session.ensure_dir(&layout.editor_dir)?;
    session.write_file(EDITOR_INIT, &layout.editor_init, Style::Preserve)?;

    let command = editor_command(&session.settings);
    let result = session
        .mutator()
        .append_setting_if_absent(EDITOR_SETTING, &command, BLOCK, &layout.profile)?;
    session.report.mutation(&result);

    Ok(())
}

fn uninstall(session: &mut Session, depth: Depth) -> Result<()> {
    let layout = session.layout().clone();
    let result = session.mutator().remove_block(BLOCK, &layout.profile)?;
    session.report.mutation(&result);
    session.remove_path(&layout.editor_dir)?;

    if depth == Depth::Full {
        let packages = session.settings.packages.editor.clone();
        session.remove_packages(&packages)?;
    }

    Ok(())
}

fn expectations(workstation: &Workstation, settings: &Settings) -> Vec<Expectation> {
    let layout = workstation.layout();
    settings
        .packages
        .editor
        .iter()
        .map(|package| Expectation::Command(package.command().into()))
        .chain([
            Expectation::Directory(layout.editor_dir.clone()),
            Expectation::File(layout.editor_init.clone()),
        ])
        .collect()
}
