// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration payloads.
//!
//! Opaque content the components materialize. Nothing in the engine depends
//! on what these say, only on where they go.

/// Shell aliases, one per line.
pub const ALIASES: &[&str] = &[
    "alias gs='git status'",
    "alias ga='git add'",
    "alias gc='git commit'",
    "alias gp='git push'",
    "alias gl='git log --oneline --graph --decorate'",
    "alias ll='ls -lah'",
    "alias v='nvim'",
    "alias t='tmux new-session -A -s main'",
];

/// Opens today's work log in the notes directory.
pub const WK_FUNCTION: &str = r#"wk() {
  local note="$NOTES_DIR/work/$(date +%Y-%m-%d).md"
  mkdir -p "$NOTES_DIR/work"
  if [ ! -f "$note" ]; then
    sed "s/{{date}}/$(date +%Y-%m-%d)/" "$NOTES_DIR/templates/daily.md" > "$note"
  fi
  "${EDITOR:-nvim}" "$note"
}"#;

/// Subdirectories created inside the notes directory.
pub const NOTES_DIRS: &[&str] = &["inbox", "work", "projects", "archive", "templates"];

/// Daily note template, relative to the notes directory.
pub const DAILY_TEMPLATE_PATH: &str = "templates/daily.md";

pub const DAILY_TEMPLATE: &str = r#"# {{date}}

## Focus

## Log

## Follow-ups
"#;

/// Commits and pushes the notes directory if it is a Git repository.
pub const NOTE_SYNC_SCRIPT: &str = r#"#!/bin/sh
set -eu
cd "${NOTES_DIR:-$HOME/notes}"
[ -d .git ] || { echo "notes directory is not a git repository" >&2; exit 1; }
git add -A
git diff --cached --quiet || git commit -m "notes: $(date +%Y-%m-%d)"
git pull --rebase --quiet && git push --quiet
"#;

pub const EDITOR_INIT: &str = r#"-- Managed by rigup. Local changes are backed up and replaced on full installs.
vim.g.mapleader = " "
vim.opt.number = true
vim.opt.relativenumber = true
vim.opt.expandtab = true
vim.opt.shiftwidth = 2
vim.opt.tabstop = 2
vim.opt.termguicolors = true
vim.opt.undofile = true

local lazypath = vim.fn.stdpath("data") .. "/lazy/lazy.nvim"
if not vim.loop.fs_stat(lazypath) then
  vim.fn.system({ "git", "clone", "--filter=blob:none", "https://github.com/folke/lazy.nvim.git", lazypath })
end
vim.opt.rtp:prepend(lazypath)

require("lazy").setup({
  { "nvim-treesitter/nvim-treesitter", build = ":TSUpdate" },
  { "neovim/nvim-lspconfig" },
  { "nvim-telescope/telescope.nvim", dependencies = { "nvim-lua/plenary.nvim" } },
})
"#;

/// Headless plugin sync arguments for the editor.
pub const EDITOR_PLUGIN_SYNC: &[&str] = &["--headless", "+Lazy! sync", "+qa"];

pub const MULTIPLEXER_CONF: &str = r##"# Managed by rigup. Local changes are backed up and replaced on full installs.
set -g prefix C-a
unbind C-b
bind C-a send-prefix
set -g mouse on
set -g base-index 1
set -g history-limit 50000
set -g default-terminal "tmux-256color"
bind | split-window -h -c "#{pane_current_path}"
bind - split-window -v -c "#{pane_current_path}"

set -g @plugin 'tmux-plugins/tpm'
set -g @plugin 'tmux-plugins/tmux-sensible'
run '~/.tmux/plugins/tpm/tpm'
"##;
