// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{is_executable, HomeFixture};

use anyhow::Result;
use indoc::indoc;
use pretty_assertions::assert_eq;
use rigup::{
    mode::{Mode, Request, Status},
    session::Depth,
    version::VersionTracker,
    ModeKind,
};
use std::{fs, os::unix::fs::PermissionsExt};

#[test]
fn full_install_on_empty_home() -> Result<()> {
    let fixture = HomeFixture::new()?;
    let outcome = fixture.run_mode(Mode::Full);
    assert_eq!(outcome.status, Status::Succeeded);
    assert_eq!(outcome.exit_code(), 0);

    let profile = fixture.read(".zshrc")?;
    assert_eq!(profile.matches("# >>> rigup:aliases >>>").count(), 1);
    assert_eq!(
        profile
            .lines()
            .filter(|line| line.trim_start().starts_with("wk() {"))
            .count(),
        1
    );

    let layout = fixture.layout();
    let record = VersionTracker::new(&layout.version_file).read()?;
    assert_eq!(record.as_ref().map(|record| record.mode), Some(ModeKind::Full));
    assert_eq!(record.map(|record| record.version), Some("1.2.3".to_string()));
    assert!(is_executable(&layout.note_sync));
    assert!(layout.plugin_manager.is_dir());

    Ok(())
}

#[test]
fn minimal_install_keeps_existing_alias_unique() -> Result<()> {
    let fixture = HomeFixture::new()?;
    fixture.write(".zshrc", "alias gs='git status'\n")?;

    let outcome = fixture.run_mode(Mode::Minimal);
    assert_eq!(outcome.status, Status::Succeeded);

    let profile = fixture.read(".zshrc")?;
    assert_eq!(profile.matches("alias gs='git status'").count(), 1);
    assert!(profile.starts_with("alias gs='git status'\n"));
    assert!(profile.contains("alias ga='git add'"));

    Ok(())
}

#[test]
fn fix_repairs_missing_directory_and_exec_bit() -> Result<()> {
    let fixture = HomeFixture::new()?;
    fixture.run_mode(Mode::Full);

    let layout = fixture.layout();
    let inbox = layout.notes_dir.join("inbox");
    fs::remove_dir(&inbox)?;
    fs::set_permissions(&layout.note_sync, fs::Permissions::from_mode(0o644))?;

    let first = fixture.run_mode(Mode::Fix);
    assert_eq!(first.status, Status::Succeeded);
    assert!(inbox.is_dir());
    assert!(is_executable(&layout.note_sync));
    assert_eq!(first.report.changes().len(), 2);

    let second = fixture.run_mode(Mode::Fix);
    assert_eq!(second.status, Status::Succeeded);
    assert!(second.report.changes().is_empty());

    Ok(())
}

#[test]
fn soft_uninstall_backs_up_and_removes_managed_files() -> Result<()> {
    let fixture = HomeFixture::new()?;
    fixture.run_mode(Mode::Full);
    fixture.write("notes/inbox/idea.md", "# keep me\n")?;

    let layout = fixture.layout();
    let managed = [
        layout.profile.clone(),
        layout.editor_dir.clone(),
        layout.multiplexer_conf.clone(),
        layout.multiplexer_plugins.clone(),
        layout.note_sync.clone(),
    ];
    let sync_script = fs::read_to_string(&layout.note_sync)?;
    let notes_before = fixture
        .snapshot()?
        .into_iter()
        .filter(|(path, _)| path.starts_with(&layout.notes_dir))
        .collect::<Vec<_>>();

    let (outcome, _) = fixture.run(&Request::new(Mode::Uninstall(Depth::Soft)), &[true]);
    assert_eq!(outcome.status, Status::Succeeded);

    for path in &managed {
        assert!(
            outcome.backups.iter().any(|record| &record.source == path),
            "no backup of {}",
            path.display()
        );
    }
    let sync_backup = outcome
        .backups
        .iter()
        .find(|record| record.source == layout.note_sync)
        .map(|record| fs::read_to_string(&record.backup))
        .transpose()?;
    assert_eq!(sync_backup, Some(sync_script));

    assert!(!layout.editor_dir.exists());
    assert!(!layout.multiplexer_conf.exists());
    assert!(!layout.multiplexer_plugins.exists());
    assert!(!layout.note_sync.exists());
    // Every line rigup added to the profile lived in a managed block.
    assert_eq!(fixture.read(".zshrc")?, "");

    let notes_after = fixture
        .snapshot()?
        .into_iter()
        .filter(|(path, _)| path.starts_with(&layout.notes_dir))
        .collect::<Vec<_>>();
    assert_eq!(notes_after, notes_before);

    Ok(())
}

#[test]
fn single_component_uninstall_leaves_others() -> Result<()> {
    let fixture = HomeFixture::new()?;
    fixture.write(".zshrc", "export PATH=\"$HOME/bin:$PATH\"\n")?;
    fixture.run_mode(Mode::Full);

    let request = Request::new(Mode::Uninstall(Depth::Soft)).with_components(["notes"]);
    let (outcome, _) = fixture.run(&request, &[true]);
    assert_eq!(outcome.status, Status::Succeeded);
    assert_eq!(outcome.activated, vec![rigup::ComponentId::Notes]);

    let profile = fixture.read(".zshrc")?;
    assert!(profile.contains("# >>> rigup:aliases >>>"));
    assert!(!profile.contains("rigup:notes"));
    assert!(fixture.layout().editor_init.is_file());

    Ok(())
}

#[test]
fn full_install_replaces_customized_conf_after_backup() -> Result<()> {
    let original = indoc! {r#"
        set -g mouse off
        set -g status-style bg=red
    "#};
    let fixture = HomeFixture::new()?;
    fixture.write(".tmux.conf", original)?;

    let outcome = fixture.run_mode(Mode::Full);
    assert_eq!(outcome.status, Status::Succeeded);
    assert!(fixture.read(".tmux.conf")?.contains("set -g mouse on"));

    let layout = fixture.layout();
    let backup = outcome
        .backups
        .iter()
        .find(|record| record.source == layout.multiplexer_conf)
        .map(|record| fs::read_to_string(&record.backup))
        .transpose()?;
    assert_eq!(backup.as_deref(), Some(original));

    Ok(())
}
