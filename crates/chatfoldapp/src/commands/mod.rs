//! # Command Layer
//!
//! This module contains the **core business logic** of chatfold. Each command is a
//! plain function over a [`Library`](crate::model::Library): it mutates or reads the
//! in-memory aggregate and returns structured data. Commands never touch storage; the
//! API facade decides whether to persist based on [`CmdResult::changed`].
//!
//! ## What Commands Do NOT Do
//!
//! - **Any I/O**: no stdout, no files, no storage calls
//! - **User interaction**: no prompts; commands return what the UI needs to ask
//!   (see [`chats::unlink_preview`])
//! - **Persistence**: the facade runs the quota gatekeeper and writes
//!
//! ## Structured Returns
//!
//! Mutating commands return [`CmdResult`]:
//! - `changed`: whether the library was modified and must be persisted
//! - `affected_folders` / `affected_chats`: ids touched by the operation
//! - `messages`: leveled messages (info, success, warning, error)
//!
//! Read-only commands return their own typed views (search hits, tag counts, reports).
//!
//! ## Testing Strategy
//!
//! **This is where most of the testing lives.** Commands are exercised directly against
//! in-memory libraries; no storage is involved.
//!
//! ## Command Modules
//!
//! - [`folders`]: create, rename, move, delete, annotate, sort and list folders
//! - [`chats`]: save, unlink, delete, rename, annotate and tag chats
//! - [`tags`]: library-wide tag listing, rename and delete
//! - [`cleanup`]: unlinked chat listing, prune and archive
//! - [`search`]: query evaluation with location badges
//! - [`pins`]: pinned searches
//! - [`export`]: backup, CSV and outline exports
//! - [`import`]: backup restore and link import
//! - [`diagnostics`]: aggregate status report
//! - [`helpers`]: folder and chat selector resolution

use serde::Serialize;

pub mod chats;
pub mod cleanup;
pub mod diagnostics;
pub mod export;
pub mod folders;
pub mod helpers;
pub mod import;
pub mod pins;
pub mod search;
pub mod tags;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CmdResult {
    /// The library was modified and must go through the save path.
    pub changed: bool,
    pub affected_folders: Vec<String>,
    pub affected_chats: Vec<String>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    /// A result for an operation that modified the library.
    pub fn changed() -> Self {
        Self {
            changed: true,
            ..Default::default()
        }
    }

    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_message(mut self, message: CmdMessage) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_affected_folders(mut self, ids: Vec<String>) -> Self {
        self.affected_folders = ids;
        self
    }

    pub fn with_affected_chats(mut self, ids: Vec<String>) -> Self {
        self.affected_chats = ids;
        self
    }
}

pub(crate) fn plural(count: usize, word: &str) -> String {
    format!("{} {}{}", count, word, if count == 1 { "" } else { "s" })
}
