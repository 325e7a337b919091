// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Idempotent text mutations over configuration files.
//!
//! Configuration files are shared with the user, so rigup never edits them
//! by pattern substitution. Instead every change is one of a handful of
//! primitives whose repeated application is a no-op:
//!
//! - append a line unless it already appears somewhere in the file,
//! - materialize a __managed block__ unless its marker is already present,
//! - replace (or append) the value of a named setting.
//!
//! # Managed Blocks
//!
//! A managed block is a section delimited by two marker comments:
//!
//! ```text
//! # >>> rigup:aliases >>>
//! alias gs='git status'
//! # <<< rigup:aliases <<<
//! ```
//!
//! Presence of the begin marker means the section was already materialized.
//! Blocks may hold content that varies between runs, so block presence is
//! never decided by comparing block text. Lines of a block that are already
//! __defined__ elsewhere in the file are left out of the block to avoid
//! defining the same thing twice. A line counts as defined only if some line
//! of the file equals it once surrounding whitespace is trimmed, so a
//! commented-out copy never counts.
//!
//! Everything rigup adds to a shared file lives inside a managed block.
//! Removing the block removes every line rigup ever added.
//!
//! Every mutation of an existing file is preceded by a backup through
//! [`BackupManager`].

use crate::backup::{BackupError, BackupManager};

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs::{read_to_string, write},
    io::ErrorKind,
    ops::Range,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// Begin marker of managed block `name`.
pub fn begin_marker(name: &str) -> String {
    format!("# >>> rigup:{name} >>>")
}

/// End marker of managed block `name`.
pub fn end_marker(name: &str) -> String {
    format!("# <<< rigup:{name} <<<")
}

/// Outcome of a single mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationResult {
    pub target: PathBuf,
    pub applied: bool,
    pub affected: String,
}

/// Apply idempotent mutations to files, backing each one up first.
#[derive(Debug)]
pub struct Mutator<'b> {
    backups: &'b mut BackupManager,
}

impl<'b> Mutator<'b> {
    /// Construct new mutator recording backups into `backups`.
    pub fn new(backups: &'b mut BackupManager) -> Self {
        Self { backups }
    }

    /// Check if `line` appears anywhere in `file` as an exact substring.
    ///
    /// Returns false if the file does not exist or cannot be read.
    pub fn line_exists(line: &str, file: impl AsRef<Path>) -> bool {
        read_to_string(file.as_ref()).is_ok_and(|content| content.contains(line))
    }

    /// Check if managed block `name` was already materialized in `file`.
    pub fn block_exists(name: &str, file: impl AsRef<Path>) -> bool {
        Self::line_exists(&begin_marker(name), file)
    }

    /// Append `line` to `file` unless it is already present.
    ///
    /// Creates the file and its parent directories if missing.
    ///
    /// # Errors
    ///
    /// - Return [`MutateError::Read`] if the file exists but cannot be read.
    /// - Return [`MutateError::Backup`] if the backup fails.
    /// - Return [`MutateError::Write`] if the file cannot be written.
    pub fn append_if_absent(&mut self, line: &str, file: impl AsRef<Path>) -> Result<MutationResult> {
        self.edit(file.as_ref(), line, |edit| {
            if !edit.contains(line) {
                edit.append(line);
            }
            Ok(())
        })
    }

    /// Replace the value of shell setting `key`, or append it to managed
    /// block `block` if unset.
    ///
    /// Recognizes both `KEY=value` and `export KEY=value` assignments. The
    /// first assignment is rewritten in place keeping its indentation and
    /// `export` prefix.
    ///
    /// # Errors
    ///
    /// - Return [`MutateError::Read`] if the file exists but cannot be read.
    /// - Return [`MutateError::UnterminatedBlock`] if the block has no end
    ///   marker.
    /// - Return [`MutateError::Backup`] if the backup fails.
    /// - Return [`MutateError::Write`] if the file cannot be written.
    pub fn replace_or_append_setting(
        &mut self,
        key: &str,
        value: &str,
        block: &str,
        file: impl AsRef<Path>,
    ) -> Result<MutationResult> {
        self.edit_setting(key, value, block, file.as_ref(), true)
    }

    /// Append shell setting `key` to managed block `block` only if no
    /// assignment to it exists yet.
    ///
    /// # Errors
    ///
    /// - Same as [`Mutator::replace_or_append_setting`].
    pub fn append_setting_if_absent(
        &mut self,
        key: &str,
        value: &str,
        block: &str,
        file: impl AsRef<Path>,
    ) -> Result<MutationResult> {
        self.edit_setting(key, value, block, file.as_ref(), false)
    }

    fn edit_setting(
        &mut self,
        key: &str,
        value: &str,
        block: &str,
        path: &Path,
        overwrite: bool,
    ) -> Result<MutationResult> {
        let affected = format!("{key}={value}");
        self.edit(path, &affected, |edit| {
            edit.set_in_block(block, key, value, overwrite)
                .map_err(|_| MutateError::UnterminatedBlock {
                    name: block.into(),
                    path: path.into(),
                })
        })
    }

    /// Materialize managed block `name` unless its marker is present.
    ///
    /// # Errors
    ///
    /// - Return [`MutateError::Read`] if the file exists but cannot be read.
    /// - Return [`MutateError::Backup`] if the backup fails.
    /// - Return [`MutateError::Write`] if the file cannot be written.
    pub fn append_block_if_absent(
        &mut self,
        name: &str,
        lines: &[&str],
        file: impl AsRef<Path>,
    ) -> Result<MutationResult> {
        let path = file.as_ref();
        self.edit(path, &begin_marker(name), |edit| {
            if edit.contains(&begin_marker(name)) {
                return Ok(());
            }
            edit.replace_block(name, lines)
                .map_err(|_| MutateError::UnterminatedBlock {
                    name: name.into(),
                    path: path.into(),
                })
        })
    }

    /// Replace managed block `name` wholesale, appending it if absent.
    ///
    /// # Errors
    ///
    /// - Return [`MutateError::UnterminatedBlock`] if the begin marker has no
    ///   matching end marker.
    /// - Otherwise same as [`Mutator::append_block_if_absent`].
    pub fn replace_block(
        &mut self,
        name: &str,
        lines: &[&str],
        file: impl AsRef<Path>,
    ) -> Result<MutationResult> {
        let path = file.as_ref();
        self.edit(path, &begin_marker(name), |edit| {
            edit.replace_block(name, lines)
                .map_err(|_| MutateError::UnterminatedBlock {
                    name: name.into(),
                    path: path.into(),
                })
        })
    }

    /// Add `lines` not yet defined in `file` to the end of managed block
    /// `name`, materializing the block if absent.
    ///
    /// Lines already inside the block are left alone.
    ///
    /// # Errors
    ///
    /// - Return [`MutateError::UnterminatedBlock`] if the begin marker has no
    ///   matching end marker.
    /// - Otherwise same as [`Mutator::append_block_if_absent`].
    pub fn extend_block(
        &mut self,
        name: &str,
        lines: &[&str],
        file: impl AsRef<Path>,
    ) -> Result<MutationResult> {
        let path = file.as_ref();
        self.edit(path, &begin_marker(name), |edit| {
            edit.extend_block(name, lines)
                .map_err(|_| MutateError::UnterminatedBlock {
                    name: name.into(),
                    path: path.into(),
                })
        })
    }

    /// Remove managed block `name` from `file`, leaving everything else.
    ///
    /// # Errors
    ///
    /// - Return [`MutateError::UnterminatedBlock`] if the begin marker has no
    ///   matching end marker.
    /// - Otherwise same as [`Mutator::append_block_if_absent`].
    pub fn remove_block(&mut self, name: &str, file: impl AsRef<Path>) -> Result<MutationResult> {
        let path = file.as_ref();
        if !path.exists() {
            return Ok(MutationResult {
                target: path.into(),
                applied: false,
                affected: begin_marker(name),
            });
        }

        self.edit(path, &begin_marker(name), |edit| {
            edit.remove_block(name)
                .map_err(|_| MutateError::UnterminatedBlock {
                    name: name.into(),
                    path: path.into(),
                })
        })
    }

    fn edit<E>(&mut self, path: &Path, affected: &str, editor: E) -> Result<MutationResult>
    where
        E: FnOnce(&mut TextEdit) -> Result<()>,
    {
        let (content, existed) = match read_to_string(path) {
            Ok(content) => (content, true),
            Err(err) if err.kind() == ErrorKind::NotFound => (String::new(), false),
            Err(err) => {
                return Err(MutateError::Read {
                    source: err,
                    path: path.into(),
                })
            }
        };

        let mut edit = TextEdit::from(content);
        editor(&mut edit)?;

        let result = MutationResult {
            target: path.into(),
            applied: edit.changed,
            affected: affected.into(),
        };
        if !edit.changed {
            debug!("{:?} already holds {affected:?}", path.display());
            return Ok(result);
        }

        // INVARIANT: Snapshot pre-existing files before writing.
        if existed {
            self.backups.backup(path)?;
        }
        if let Some(parent) = path.parent() {
            mkdirp::mkdirp(parent).map_err(|err| MutateError::Write {
                source: err,
                path: path.into(),
            })?;
        }
        write(path, edit.to_string()).map_err(|err| MutateError::Write {
            source: err,
            path: path.into(),
        })?;
        info!("updated {:?}: {affected}", path.display());

        Ok(result)
    }
}

/// In-memory text editor.
///
/// # Invariant
///
/// - `changed` is set only when the content actually differs.
/// - Appended text always starts on a fresh line.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TextEdit {
    content: String,
    changed: bool,
}

impl TextEdit {
    /// Check if text appears anywhere in the content.
    pub fn contains(&self, text: &str) -> bool {
        self.content.contains(text)
    }

    /// Check if the lines of `text` are already defined by the content.
    pub fn defines(&self, text: &str) -> bool {
        defines(&self.content, text)
    }

    /// Whether any edit changed the content.
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Append text on its own line(s).
    pub fn append(&mut self, text: &str) {
        self.start_fresh_line();
        self.content.push_str(text);
        if !text.ends_with('\n') {
            self.content.push('\n');
        }
        self.changed = true;
    }

    /// Index of the first line assigning `key`, if any.
    pub fn setting_line(&self, key: &str) -> Option<usize> {
        self.content
            .lines()
            .position(|line| split_assignment(line, key).is_some())
    }

    /// Replace or append assignment of `key`.
    pub fn set(&mut self, key: &str, value: &str) {
        let mut lines = self.content.lines().map(str::to_owned).collect::<Vec<_>>();
        let Some(index) = self.setting_line(key) else {
            self.append(&format!("export {key}={value}"));
            return;
        };

        let Some(prefix) = split_assignment(&lines[index], key).map(str::to_owned) else {
            return;
        };
        let updated = format!("{prefix}{key}={value}");
        if lines[index] == updated {
            return;
        }

        lines[index] = updated;
        let trailing = self.content.ends_with('\n');
        self.content = lines.join("\n");
        if trailing {
            self.content.push('\n');
        }
        self.changed = true;
    }

    /// Assign `key` unless already assigned, adding the assignment to managed
    /// block `name`. Existing assignments are rewritten in place only if
    /// `overwrite` is set.
    ///
    /// # Errors
    ///
    /// - Return [`UnterminatedBlock`] if only the begin marker exists.
    pub fn set_in_block(
        &mut self,
        name: &str,
        key: &str,
        value: &str,
        overwrite: bool,
    ) -> Result<(), UnterminatedBlock> {
        if self.setting_line(key).is_none() {
            let line = format!("export {key}={value}");
            return self.extend_block(name, &[line.as_str()]);
        }

        if overwrite {
            self.set(key, value);
        }

        Ok(())
    }

    /// Add `lines` not yet defined anywhere in the content to the end of
    /// managed block `name`, appending the block if absent.
    ///
    /// # Errors
    ///
    /// - Return [`UnterminatedBlock`] if only the begin marker exists.
    pub fn extend_block(&mut self, name: &str, lines: &[&str]) -> Result<(), UnterminatedBlock> {
        let missing = lines
            .iter()
            .copied()
            .filter(|line| !self.defines(line))
            .collect::<Vec<_>>();
        let Some(range) = self.block_range(name)? else {
            if missing.is_empty() {
                return Ok(());
            }
            return self.replace_block(name, &missing);
        };
        if missing.is_empty() {
            return Ok(());
        }

        let end = end_marker(name);
        let Some(offset) = self.content[range.clone()].rfind(&end) else {
            return Err(UnterminatedBlock);
        };
        let at = range.start + offset;

        let mut insert = String::new();
        if !self.content[..at].ends_with('\n') {
            insert.push('\n');
        }
        for line in missing {
            insert.push_str(line);
            if !line.ends_with('\n') {
                insert.push('\n');
            }
        }
        self.content.insert_str(at, &insert);
        self.changed = true;

        Ok(())
    }

    /// Replace managed block `name` or append it if absent.
    ///
    /// Lines already defined outside the block are dropped from it.
    ///
    /// # Errors
    ///
    /// - Return [`UnterminatedBlock`] if only the begin marker exists.
    pub fn replace_block(&mut self, name: &str, lines: &[&str]) -> Result<(), UnterminatedBlock> {
        let range = self.block_range(name)?;
        let outside = match &range {
            Some(range) => format!("{}{}", &self.content[..range.start], &self.content[range.end..]),
            None => self.content.clone(),
        };
        let rendered = render_block(name, lines.iter().filter(|line| !defines(&outside, line)));

        match range {
            Some(range) => {
                if self.content[range.clone()] != rendered {
                    self.content.replace_range(range, &rendered);
                    self.changed = true;
                }
            }
            None => {
                // INVARIANT: Separate new block from preceding content by one blank line.
                if !self.content.is_empty() {
                    self.start_fresh_line();
                    if !self.content.ends_with("\n\n") {
                        self.content.push('\n');
                    }
                }
                self.content.push_str(&rendered);
                self.changed = true;
            }
        }

        Ok(())
    }

    /// Remove managed block `name` along with its separating blank line.
    ///
    /// # Errors
    ///
    /// - Return [`UnterminatedBlock`] if only the begin marker exists.
    pub fn remove_block(&mut self, name: &str) -> Result<(), UnterminatedBlock> {
        let Some(mut range) = self.block_range(name)? else {
            return Ok(());
        };

        if self.content[..range.start].ends_with("\n\n") {
            range.start -= 1;
        }
        self.content.replace_range(range, "");
        self.changed = true;

        Ok(())
    }

    fn block_range(&self, name: &str) -> Result<Option<Range<usize>>, UnterminatedBlock> {
        let begin = begin_marker(name);
        let end = end_marker(name);
        let Some(start) = self.content.find(&begin) else {
            return Ok(None);
        };
        let Some(offset) = self.content[start..].find(&end) else {
            return Err(UnterminatedBlock);
        };

        let mut stop = start + offset + end.len();
        if self.content[stop..].starts_with('\n') {
            stop += 1;
        }

        Ok(Some(start..stop))
    }

    fn start_fresh_line(&mut self) {
        if !self.content.is_empty() && !self.content.ends_with('\n') {
            self.content.push('\n');
        }
    }
}

impl Display for TextEdit {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(&self.content)
    }
}

impl From<String> for TextEdit {
    fn from(content: String) -> Self {
        Self {
            content,
            changed: false,
        }
    }
}

impl From<&str> for TextEdit {
    fn from(content: &str) -> Self {
        Self::from(content.to_owned())
    }
}

/// Managed block has a begin marker but no end marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("managed block is missing its end marker")]
pub struct UnterminatedBlock;

fn render_block<'a>(name: &str, lines: impl IntoIterator<Item = &'a &'a str>) -> String {
    let mut out = begin_marker(name);
    out.push('\n');
    for line in lines {
        out.push_str(line);
        if !line.ends_with('\n') {
            out.push('\n');
        }
    }
    out.push_str(&end_marker(name));
    out.push('\n');
    out
}

// A text is defined when its lines appear as consecutive lines of content,
// compared with surrounding whitespace trimmed.
fn defines(content: &str, text: &str) -> bool {
    let wanted = text.lines().map(str::trim).collect::<Vec<_>>();
    if wanted.is_empty() {
        return true;
    }

    let have = content.lines().map(str::trim).collect::<Vec<_>>();
    have.windows(wanted.len()).any(|window| window == wanted.as_slice())
}

// Returns everything before the key (indentation and optional export) when
// line assigns key.
fn split_assignment<'l>(line: &'l str, key: &str) -> Option<&'l str> {
    let trimmed = line.trim_start();
    let unexported = trimmed
        .strip_prefix("export ")
        .map(str::trim_start)
        .unwrap_or(trimmed);
    unexported
        .strip_prefix(key)
        .filter(|rest| rest.starts_with('='))
        .map(|_| &line[..line.len() - unexported.len()])
}

/// Mutation error types.
#[derive(Debug, thiserror::Error)]
pub enum MutateError {
    /// Target file exists but cannot be read.
    #[error("failed to read {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Target file cannot be written.
    #[error("failed to write {:?}", path.display())]
    Write {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Managed block in target file lost its end marker.
    #[error("managed block {name:?} in {:?} has no end marker", path.display())]
    UnterminatedBlock { name: String, path: PathBuf },

    /// Backup before mutation failed.
    #[error(transparent)]
    Backup(#[from] BackupError),
}

/// Friendly result alias :3
pub type Result<T, E = MutateError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use std::fs::{read_to_string, write};

    #[test]
    fn append_if_absent_is_idempotent() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let profile = root.path().join(".zshrc");
        let mut backups = BackupManager::new(root.path().join("backups"), root.path());
        let mut mutator = Mutator::new(&mut backups);

        let first = mutator.append_if_absent("alias gs='git status'", &profile)?;
        let second = mutator.append_if_absent("alias gs='git status'", &profile)?;

        assert!(first.applied);
        assert!(!second.applied);
        let content = read_to_string(&profile)?;
        assert_eq!(content.matches("alias gs='git status'").count(), 1);
        assert_eq!(content, "alias gs='git status'\n");

        Ok(())
    }

    #[test]
    fn append_starts_on_fresh_line_and_backs_up() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let profile = root.path().join(".zshrc");
        write(&profile, "export FOO=1")?;
        let mut backups = BackupManager::new(root.path().join("backups"), root.path());

        Mutator::new(&mut backups).append_if_absent("alias ll='ls -lah'", &profile)?;

        assert_eq!(read_to_string(&profile)?, "export FOO=1\nalias ll='ls -lah'\n");
        let record = backups.record_for(&profile).expect("profile backed up");
        assert_eq!(read_to_string(&record.backup)?, "export FOO=1");

        Ok(())
    }

    #[test]
    fn line_exists_is_not_regex() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let profile = root.path().join(".zshrc");
        assert!(!Mutator::line_exists("x", &profile));

        write(&profile, "alias ll='ls -lah'\n")?;
        assert!(Mutator::line_exists("ls -lah", &profile));
        assert!(!Mutator::line_exists("ls.-lah", &profile));
        assert!(!Mutator::block_exists("aliases", &profile));

        write(&profile, render_block("aliases", &["alias ll='ls -lah'"]))?;
        assert!(Mutator::block_exists("aliases", &profile));

        Ok(())
    }

    #[test]
    fn replace_block_skips_lines_defined_elsewhere() {
        let mut edit = TextEdit::from("alias gs='git status'\n");
        edit.replace_block("aliases", &["alias gs='git status'", "alias ga='git add'"])
            .unwrap();

        let expect = indoc! {r#"
            alias gs='git status'

            # >>> rigup:aliases >>>
            alias ga='git add'
            # <<< rigup:aliases <<<
        "#};
        assert_eq!(edit.to_string(), expect);
    }

    #[test]
    fn commented_copy_does_not_count_as_defined() {
        let mut edit = TextEdit::from("# alias gs='git status'\n");
        edit.replace_block("aliases", &["alias gs='git status'"]).unwrap();

        let expect = indoc! {r#"
            # alias gs='git status'

            # >>> rigup:aliases >>>
            alias gs='git status'
            # <<< rigup:aliases <<<
        "#};
        assert_eq!(edit.to_string(), expect);
        assert!(edit.defines("  alias gs='git status'"));
        assert!(!edit.defines("alias gs='git"));
    }

    #[test]
    fn extend_block_adds_only_missing_lines_inside_block() {
        let mut edit = TextEdit::from(indoc! {r#"
            alias gs='git status'
            # alias ga='git add'

            # >>> rigup:aliases >>>
            alias v='nvim'
            # <<< rigup:aliases <<<
        "#});
        edit.extend_block("aliases", &["alias gs='git status'", "alias ga='git add'", "alias v='nvim'"])
            .unwrap();

        let expect = indoc! {r#"
            alias gs='git status'
            # alias ga='git add'

            # >>> rigup:aliases >>>
            alias v='nvim'
            alias ga='git add'
            # <<< rigup:aliases <<<
        "#};
        assert_eq!(edit.to_string(), expect);

        let mut again = TextEdit::from(expect);
        again.extend_block("aliases", &["alias ga='git add'"]).unwrap();
        assert!(!again.is_changed());

        again.remove_block("aliases").unwrap();
        assert_eq!(again.to_string(), "alias gs='git status'\n# alias ga='git add'\n");
    }

    #[test]
    fn extend_block_materializes_missing_block() {
        let mut edit = TextEdit::default();
        edit.extend_block("notes", &["wk() { :; }"]).unwrap();
        assert_eq!(
            edit.to_string(),
            "# >>> rigup:notes >>>\nwk() { :; }\n# <<< rigup:notes <<<\n"
        );

        let mut untouched = TextEdit::default();
        untouched.extend_block("notes", &[]).unwrap();
        assert!(!untouched.is_changed());
    }

    #[test]
    fn set_in_block_keeps_added_settings_removable() {
        let mut edit = TextEdit::from("export PATH=\"$HOME/bin:$PATH\"\n");
        edit.set_in_block("editor", "EDITOR", "nvim", true).unwrap();
        assert!(edit.to_string().contains("# >>> rigup:editor >>>\nexport EDITOR=nvim\n"));

        edit.remove_block("editor").unwrap();
        assert_eq!(edit.to_string(), "export PATH=\"$HOME/bin:$PATH\"\n");

        let mut user = TextEdit::from("EDITOR=hx\n");
        user.set_in_block("editor", "EDITOR", "nvim", false).unwrap();
        assert!(!user.is_changed());
        user.set_in_block("editor", "EDITOR", "nvim", true).unwrap();
        assert_eq!(user.to_string(), "EDITOR=nvim\n");
    }

    #[test]
    fn replace_block_rewrites_contents_in_place() {
        let mut edit = TextEdit::from(indoc! {r#"
            # mine
            # >>> rigup:aliases >>>
            alias old='stale'
            # <<< rigup:aliases <<<
            # also mine
        "#});
        edit.replace_block("aliases", &["alias v='nvim'"]).unwrap();

        let expect = indoc! {r#"
            # mine
            # >>> rigup:aliases >>>
            alias v='nvim'
            # <<< rigup:aliases <<<
            # also mine
        "#};
        assert_eq!(edit.to_string(), expect);
        assert!(edit.is_changed());

        let mut again = TextEdit::from(expect);
        again.replace_block("aliases", &["alias v='nvim'"]).unwrap();
        assert!(!again.is_changed());
    }

    #[test]
    fn remove_block_undoes_append() {
        let original = "export FOO=1\n";
        let mut edit = TextEdit::from(original);
        edit.replace_block("notes", &["wk() { :; }"]).unwrap();
        edit.remove_block("notes").unwrap();
        assert_eq!(edit.to_string(), original);
    }

    #[test]
    fn unterminated_block_is_rejected() {
        let mut edit = TextEdit::from("# >>> rigup:aliases >>>\nalias a='b'\n");
        assert_eq!(edit.replace_block("aliases", &[]), Err(UnterminatedBlock));
        assert_eq!(edit.remove_block("aliases"), Err(UnterminatedBlock));
        assert!(!edit.is_changed());
    }

    #[test]
    fn set_replaces_existing_assignment() {
        let mut edit = TextEdit::from("  export EDITOR=vim\nEDITORIAL=yes\n");
        edit.set("EDITOR", "nvim");
        assert_eq!(edit.to_string(), "  export EDITOR=nvim\nEDITORIAL=yes\n");

        let mut edit = TextEdit::from("EDITOR=vim\n");
        edit.set("EDITOR", "nvim");
        assert_eq!(edit.to_string(), "EDITOR=nvim\n");
    }

    #[test]
    fn set_appends_missing_assignment() {
        let mut edit = TextEdit::from("EDITORIAL=yes\n");
        edit.set("EDITOR", "nvim");
        assert_eq!(edit.to_string(), "EDITORIAL=yes\nexport EDITOR=nvim\n");

        let mut same = TextEdit::from(edit.to_string());
        same.set("EDITOR", "nvim");
        assert!(!same.is_changed());
    }

    #[test]
    fn append_setting_if_absent_keeps_user_value() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let profile = root.path().join(".zshrc");
        write(&profile, "export EDITOR=emacs\n")?;
        let mut backups = BackupManager::new(root.path().join("backups"), root.path());

        let result =
            Mutator::new(&mut backups).append_setting_if_absent("EDITOR", "nvim", "editor", &profile)?;

        assert!(!result.applied);
        assert_eq!(read_to_string(&profile)?, "export EDITOR=emacs\n");
        assert!(backups.records().is_empty());

        Ok(())
    }
}
