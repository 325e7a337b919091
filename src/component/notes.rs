// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Notes directory structure, the `wk` shell function, and the sync script.
//!
//! The notes directory itself belongs to the user. Installers only create
//! what is missing inside it, and uninstall never touches it.

use crate::{
    component::{
        payload::{DAILY_TEMPLATE, DAILY_TEMPLATE_PATH, NOTES_DIRS, NOTE_SYNC_SCRIPT, WK_FUNCTION},
        ComponentId, Entry, Operations,
    },
    config::Settings,
    probe::Expectation,
    session::{Depth, Result, Session, Style},
    workstation::{Layout, Workstation},
};

/// Name of the managed profile block.
pub const BLOCK: &str = "notes";

/// Shell setting pointing at the notes directory.
pub const NOTES_SETTING: &str = "NOTES_DIR";

/// Shell function opening today's work log.
pub const WK: &str = "wk";

pub(crate) fn entry() -> Entry {
    Entry {
        id: ComponentId::Notes,
        requires: &[ComponentId::Shell],
        operations: Operations {
            install: Some(install),
            fix: Some(fix),
            uninstall: Some(uninstall),
        },
        expectations,
        managed_paths: |ws| vec![ws.layout().profile.clone(), ws.layout().note_sync.clone()],
    }
}

fn notes_value(layout: &Layout) -> String {
    format!("\"{}\"", layout.notes_dir.display())
}

fn ensure_structure(session: &mut Session) -> Result<()> {
    let notes_dir = session.layout().notes_dir.clone();
    session.ensure_dir(&notes_dir)?;
    for name in NOTES_DIRS {
        session.ensure_dir(&notes_dir.join(name))?;
    }

    // INVARIANT: Never overwrite a template the user may have edited.
    session.write_file(DAILY_TEMPLATE, &notes_dir.join(DAILY_TEMPLATE_PATH), Style::Preserve)?;

    Ok(())
}

fn install(session: &mut Session, style: Style) -> Result<()> {
    ensure_structure(session)?;

    let layout = session.layout().clone();
    let setting = format!("export {NOTES_SETTING}={}", notes_value(&layout));
    let lines = [setting.as_str(), WK_FUNCTION];
    let result = match style {
        Style::Clean => session.mutator().replace_block(BLOCK, &lines, &layout.profile)?,
        Style::Preserve => {
            session
                .mutator()
                .append_block_if_absent(BLOCK, &lines, &layout.profile)?
        }
    };
    session.report.mutation(&result);

    session.ensure_dir(&layout.bin_dir)?;
    session.write_file(NOTE_SYNC_SCRIPT, &layout.note_sync, style)?;
    session.ensure_executable(&layout.note_sync)?;

    Ok(())
}

fn fix(session: &mut Session) -> Result<()> {
    ensure_structure(session)?;

    let layout = session.layout().clone();
    let result = session.mutator().append_setting_if_absent(
        NOTES_SETTING,
        &notes_value(&layout),
        BLOCK,
        &layout.profile,
    )?;
    session.report.mutation(&result);

    if !session.probe().function_defined(WK).present {
        let result = session
            .mutator()
            .extend_block(BLOCK, &[WK_FUNCTION], &layout.profile)?;
        session.report.mutation(&result);
    }

    if !layout.note_sync.is_file() {
        session.ensure_dir(&layout.bin_dir)?;
        session.write_file(NOTE_SYNC_SCRIPT, &layout.note_sync, Style::Preserve)?;
    }
    session.ensure_executable(&layout.note_sync)?;

    Ok(())
}

fn uninstall(session: &mut Session, _depth: Depth) -> Result<()> {
    let layout = session.layout().clone();
    let result = session.mutator().remove_block(BLOCK, &layout.profile)?;
    session.report.mutation(&result);
    session.remove_path(&layout.note_sync)?;

    Ok(())
}

fn expectations(workstation: &Workstation, _: &Settings) -> Vec<Expectation> {
    let layout = workstation.layout();
    std::iter::once(Expectation::Directory(layout.notes_dir.clone()))
        .chain(
            NOTES_DIRS
                .iter()
                .map(|name| Expectation::Directory(layout.notes_dir.join(name))),
        )
        .chain([
            Expectation::File(layout.notes_dir.join(DAILY_TEMPLATE_PATH)),
            Expectation::Function(WK.into()),
            Expectation::Executable(layout.note_sync.clone()),
        ])
        .collect()
}
