// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::HomeFixture;

use anyhow::Result;
use rigup::{
    backup::BackupManager,
    mode::{Mode, Phase, Request, Status, DIAGNOSTICS},
    session::Depth,
    ComponentId, Registry,
};
use simple_test_case::test_case;
use std::fs;

#[test_case(Mode::Full; "full")]
#[test_case(Mode::Minimal; "minimal")]
#[test]
fn install_twice_is_idempotent(mode: Mode) -> Result<()> {
    let fixture = HomeFixture::new()?;
    fixture.write(".zshrc", "export PATH=\"$HOME/bin:$PATH\"\nalias gs='git status'\n")?;

    let first = fixture.run_mode(mode);
    assert_eq!(first.status, Status::Succeeded);
    let after_first = fixture.snapshot()?;

    let second = fixture.run_mode(mode);
    assert_eq!(second.status, Status::Succeeded);
    assert_eq!(fixture.snapshot()?, after_first);
    assert!(second.report.changes().is_empty());

    Ok(())
}

#[test]
fn minimal_keeps_customized_files() -> Result<()> {
    let fixture = HomeFixture::new()?;
    fixture.write(".tmux.conf", "set -g mouse off\n")?;
    fixture.write(".zshrc", "export EDITOR=hx\n")?;

    let outcome = fixture.run_mode(Mode::Minimal);
    assert_eq!(outcome.status, Status::Succeeded);
    assert_eq!(fixture.read(".tmux.conf")?, "set -g mouse off\n");

    let profile = fixture.read(".zshrc")?;
    assert!(profile.starts_with("export EDITOR=hx\n"));
    assert_eq!(profile.matches("EDITOR=").count(), 1);

    Ok(())
}

#[test]
fn full_rewrites_setting_in_place() -> Result<()> {
    let fixture = HomeFixture::new()?;
    fixture.write(".zshrc", "export EDITOR=hx\n")?;

    fixture.run_mode(Mode::Full);
    let profile = fixture.read(".zshrc")?;
    assert!(profile.starts_with("export EDITOR=nvim\n"));
    assert_eq!(profile.matches("EDITOR=").count(), 1);

    Ok(())
}

#[test]
fn every_mutated_file_has_a_backup_of_its_prior_content() -> Result<()> {
    let original = "export PATH=\"/opt/bin:$PATH\"\n";
    let fixture = HomeFixture::new()?;
    fixture.write(".zshrc", original)?;

    let outcome = fixture.run_mode(Mode::Minimal);
    let layout = fixture.layout();
    let record = outcome
        .backups
        .iter()
        .find(|record| record.source == layout.profile);
    let content = record.map(|record| fs::read_to_string(&record.backup)).transpose()?;
    assert_eq!(content.as_deref(), Some(original));
    assert_eq!(
        outcome.backup_dir.as_deref(),
        record.and_then(|record| record.backup.parent())
    );

    Ok(())
}

#[test]
fn core_is_installed_before_dependents() -> Result<()> {
    let fixture = HomeFixture::new()?;
    let request = Request::new(Mode::Full).with_components(["editor"]);
    let (outcome, log) = fixture.run(&request, &[]);

    assert_eq!(outcome.status, Status::Succeeded);
    assert_eq!(outcome.activated, vec![ComponentId::Core, ComponentId::Editor]);
    let git = log.position("install git");
    let editor = log.position("install neovim");
    assert!(git.is_some() && editor.is_some() && git < editor, "{:?}", log.calls());

    // Single-component runs never touch the version record.
    assert_eq!(outcome.record, None);
    assert!(!fixture.layout().version_file.exists());

    Ok(())
}

#[test]
fn missing_package_manager_aborts_before_any_change() -> Result<()> {
    let fixture = HomeFixture::without_package_manager()?;
    let (outcome, log) = fixture.run(&Request::new(Mode::Full), &[]);

    assert!(matches!(outcome.status, Status::Aborted(_)));
    assert_eq!(outcome.phase(), Phase::Aborted);
    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(log.calls(), Vec::<String>::new());
    assert!(fixture.snapshot()?.is_empty());
    assert!(!fixture.layout().version_file.exists());

    Ok(())
}

#[test]
fn unknown_component_is_skipped() -> Result<()> {
    let fixture = HomeFixture::new()?;
    let request = Request::new(Mode::Minimal).with_components(["emacs", "shell"]);
    let (outcome, _) = fixture.run(&request, &[]);

    assert_eq!(outcome.status, Status::Succeeded);
    assert_eq!(outcome.activated, vec![ComponentId::Core, ComponentId::Shell]);
    assert_eq!(outcome.report.errors().len(), 1);
    assert!(outcome.report.errors()[0].contains("emacs"));

    Ok(())
}

#[test]
fn failed_install_leaves_run_incomplete() -> Result<()> {
    let fixture = HomeFixture::new()?.break_package("tmux");
    let outcome = fixture.run_mode(Mode::Full);

    assert_eq!(outcome.status, Status::Incomplete);
    assert_eq!(outcome.exit_code(), 1);
    assert!(outcome
        .report
        .warnings()
        .iter()
        .any(|warning| warning.contains("tmux")));
    assert_eq!(
        outcome
            .missing()
            .map(|(id, result)| (*id, result.target.clone()))
            .collect::<Vec<_>>(),
        vec![(ComponentId::Multiplexer, "tmux".to_string())]
    );
    assert!(!fixture.layout().version_file.exists());

    Ok(())
}

#[test]
fn declined_uninstall_changes_nothing() -> Result<()> {
    let fixture = HomeFixture::new()?;
    fixture.run_mode(Mode::Full);
    let before = fixture.snapshot()?;

    let (outcome, log) = fixture.run(&Request::new(Mode::Uninstall(Depth::Soft)), &[false]);
    assert_eq!(outcome.status, Status::Cancelled);
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(log.calls().len(), 1);
    assert_eq!(fixture.snapshot()?, before);

    Ok(())
}

#[test]
fn purge_asks_per_package() -> Result<()> {
    let fixture = HomeFixture::new()?;
    fixture.run_mode(Mode::Full);

    // Yes to the uninstall, yes to the first package asked about (tmux),
    // no to everything after.
    let (outcome, log) = fixture.run(&Request::new(Mode::Uninstall(Depth::Full)), &[true, true]);
    assert_eq!(outcome.status, Status::Succeeded);

    let calls = log.calls();
    assert!(calls.contains(&"confirm Remove package tmux?".to_string()));
    assert!(calls.contains(&"uninstall tmux".to_string()));
    assert!(!calls.contains(&"uninstall neovim".to_string()));
    assert!(!fixture.bin_dir().join("tmux").exists());
    assert!(fixture.bin_dir().join("nvim").exists());

    Ok(())
}

#[test]
fn fix_converges_from_scratch() -> Result<()> {
    let fixture = HomeFixture::new()?;

    let first = fixture.run_mode(Mode::Fix);
    assert_eq!(first.status, Status::Succeeded);
    assert!(!first.report.changes().is_empty());
    // Repairs never count as a completed install.
    assert_eq!(first.record, None);

    let second = fixture.run_mode(Mode::Fix);
    assert!(second.report.changes().is_empty());

    Ok(())
}

#[test]
fn fix_writes_diagnostics_into_backup_run() -> Result<()> {
    let fixture = HomeFixture::new()?;
    fixture.run_mode(Mode::Full);

    let outcome = fixture.run_mode(Mode::Fix);
    let notes = outcome
        .backup_dir
        .map(|dir| fs::read_to_string(dir.join(DIAGNOSTICS)))
        .transpose()?
        .unwrap_or_default();
    assert!(notes.contains(&format!("home: {}", fixture.home().display())));
    assert!(notes.contains("probes before fix:"));
    assert!(notes.contains("[notes] shell function wk: present"));

    Ok(())
}

#[test]
fn phases_run_in_order() -> Result<()> {
    let fixture = HomeFixture::new()?;
    let outcome = fixture.run_mode(Mode::Full);
    assert_eq!(
        outcome.trace,
        vec![
            Phase::Idle,
            Phase::SelectingMode,
            Phase::BackingUp,
            Phase::Applying,
            Phase::Verifying,
            Phase::Recording,
            Phase::Done,
        ]
    );

    Ok(())
}

#[test]
fn backup_run_restores_previous_state() -> Result<()> {
    let original = "alias ll='ls -l'\n";
    let fixture = HomeFixture::new()?;
    fixture.write(".zshrc", original)?;

    let outcome = fixture.run_mode(Mode::Full);
    assert_ne!(fixture.read(".zshrc")?, original);

    let layout = fixture.layout();
    let mut manager = BackupManager::new(&layout.backups_dir, fixture.home());
    let run = outcome.backup_dir.ok_or_else(|| anyhow::anyhow!("no backup run"))?;
    let restored = manager.restore_run(&run)?;
    assert!(restored.contains(&layout.profile));
    assert_eq!(fixture.read(".zshrc")?, original);

    Ok(())
}

#[test]
fn missing_operation_aborts_before_any_change() -> Result<()> {
    let fixture = HomeFixture::new()?;
    fixture.write(".zshrc", "export FOO=1\n")?;
    let before = fixture.snapshot()?;

    let standard = Registry::standard();
    let registry = Registry::from_entries(ComponentId::ALL.into_iter().filter_map(|id| {
        let mut entry = standard.entry(id).cloned()?;
        if id == ComponentId::Shell {
            entry.operations.fix = None;
        }
        Some(entry)
    }));
    let (outcome, log) = fixture.run_with(registry, &Request::new(Mode::Full), &[]);

    assert!(matches!(outcome.status, Status::Aborted(ref why) if why.contains("shell")));
    assert_eq!(outcome.phase(), Phase::Aborted);
    assert_eq!(log.calls(), Vec::<String>::new());
    assert_eq!(fixture.snapshot()?, before);
    assert!(outcome.backups.is_empty());
    assert!(!fixture.layout().version_file.exists());

    Ok(())
}

#[test]
fn failed_backup_aborts_and_keeps_version_record() -> Result<()> {
    let fixture = HomeFixture::new()?;
    fixture.run_mode(Mode::Minimal);
    let layout = fixture.layout();
    let record = fs::read_to_string(&layout.version_file)?;

    // A plain file where the backup runs should go makes every backup fail.
    if layout.backups_dir.exists() {
        fs::remove_dir_all(&layout.backups_dir)?;
    }
    fs::write(&layout.backups_dir, "not a directory\n")?;
    fixture.write(".zshrc", "alias gs='git status -s'\n")?;
    let before = fixture.snapshot()?;

    let outcome = fixture.run_mode(Mode::Full);
    assert!(matches!(outcome.status, Status::Aborted(_)));
    assert_eq!(outcome.phase(), Phase::Aborted);
    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(fixture.snapshot()?, before);
    assert_eq!(fs::read_to_string(&layout.version_file)?, record);

    Ok(())
}

#[test]
fn commented_alias_does_not_block_install_or_fix() -> Result<()> {
    let fixture = HomeFixture::new()?;
    fixture.write(".zshrc", "# alias gs='git status'\n")?;

    let outcome = fixture.run_mode(Mode::Full);
    assert_eq!(outcome.status, Status::Succeeded);
    assert_eq!(outcome.missing().count(), 0);
    assert!(fixture.read(".zshrc")?.starts_with("# alias gs='git status'\n"));

    let again = fixture.run_mode(Mode::Fix);
    assert_eq!(again.status, Status::Succeeded);
    assert!(again.report.changes().is_empty());

    Ok(())
}

#[test]
fn fix_repairs_are_removed_by_uninstall() -> Result<()> {
    let original = "export PATH=\"$HOME/bin:$PATH\"\n";
    let fixture = HomeFixture::new()?;
    fixture.write(".zshrc", original)?;

    let outcome = fixture.run_mode(Mode::Fix);
    assert_eq!(outcome.status, Status::Succeeded);
    let profile = fixture.read(".zshrc")?;
    assert!(profile.contains("alias gs='git status'"));
    assert!(profile.contains("wk() {"));
    assert!(profile.contains("export EDITOR="));

    let (outcome, _) = fixture.run(&Request::new(Mode::Uninstall(Depth::Soft)), &[true]);
    assert_eq!(outcome.status, Status::Succeeded);
    assert_eq!(fixture.read(".zshrc")?, original);

    Ok(())
}
