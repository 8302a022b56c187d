//! # Chat Linking
//!
//! A chat lives in `allChats` exactly once and is referenced from any number of folders.
//! This module owns the three operations that change those references:
//!
//! - [`link`]: reference a chat from a folder, upserting its record
//! - [`unlink`]: drop one folder's reference, optionally reclaiming the record
//! - [`global_delete`]: drop every reference and always reclaim the record
//!
//! ## Reclamation Policy
//!
//! Removing a chat's last reference makes it *unlinked*. Whether the record is then
//! reclaimed is the caller's decision: [`unlink_preview`] tells the caller in advance so
//! it can ask the user, and [`unlink`] only deletes the record when asked to. Records
//! that are left behind are picked up later by [`crate::gc`].

use crate::error::{ChatfoldError, Result};
use crate::model::{ChatMeta, ChatRecord, Library};
use crate::tags::{normalize_tag, normalize_tags, push_unique};
use crate::tree;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The reference was appended. `created` is true when the chat record is new.
    Linked { created: bool },
    /// The folder already referenced the chat. Nothing changed.
    AlreadyPresent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlinkOutcome {
    /// No folder references the chat any more.
    pub became_unlinked: bool,
    /// The `allChats` entry was deleted.
    pub reclaimed: bool,
}

/// Links `meta.id` into `folder_id`.
///
/// The chat record is upserted: a new record is created when absent; an existing one
/// keeps its `timestamp`, gets a fresh `updatedAt`, takes the new title when it is
/// non-empty, merges in the new tags and replaces the note when one is given.
pub fn link(lib: &mut Library, folder_id: &str, meta: ChatMeta) -> Result<LinkOutcome> {
    let folder = tree::find_mut(&mut lib.folders, folder_id)
        .ok_or_else(|| ChatfoldError::FolderNotFound(folder_id.to_string()))?;

    if folder.holds(&meta.id) {
        return Ok(LinkOutcome::AlreadyPresent);
    }
    folder.chat_ids.push(meta.id.clone());

    let created = upsert(lib, meta);
    Ok(LinkOutcome::Linked { created })
}

/// Creates or refreshes the `allChats` entry. Returns true when the record is new.
pub(crate) fn upsert(lib: &mut Library, meta: ChatMeta) -> bool {
    match lib.all_chats.get_mut(&meta.id) {
        Some(record) => {
            if !meta.title.trim().is_empty() {
                record.title = meta.title;
            }
            for tag in meta.tags.iter().filter_map(|t| normalize_tag(t)) {
                push_unique(&mut record.tags, tag);
            }
            if meta.note.is_some() {
                record.note = meta.note;
            }
            record.touch();
            false
        }
        None => {
            let mut record = ChatRecord::new(meta.id.clone(), meta.title);
            record.tags = normalize_tags(&meta.tags);
            record.note = meta.note;
            lib.all_chats.insert(meta.id, record);
            true
        }
    }
}

/// Reports whether removing the reference would leave the chat unlinked.
pub fn unlink_preview(lib: &Library, folder_id: &str, chat_id: &str) -> Result<bool> {
    let folder = tree::find(&lib.folders, folder_id)
        .ok_or_else(|| ChatfoldError::FolderNotFound(folder_id.to_string()))?;
    if !folder.holds(chat_id) {
        return Err(ChatfoldError::ChatNotFound(chat_id.to_string()));
    }
    Ok(tree::holder_count(&lib.folders, chat_id) == 1)
}

/// Removes `chat_id` from a single folder.
///
/// When this was the last reference and `reclaim` is set, the `allChats` entry is
/// deleted too.
pub fn unlink(
    lib: &mut Library,
    folder_id: &str,
    chat_id: &str,
    reclaim: bool,
) -> Result<UnlinkOutcome> {
    let folder = tree::find_mut(&mut lib.folders, folder_id)
        .ok_or_else(|| ChatfoldError::FolderNotFound(folder_id.to_string()))?;
    let before = folder.chat_ids.len();
    folder.chat_ids.retain(|id| id != chat_id);
    if folder.chat_ids.len() == before {
        return Err(ChatfoldError::ChatNotFound(chat_id.to_string()));
    }

    let became_unlinked = tree::holder_count(&lib.folders, chat_id) == 0;
    let reclaimed = became_unlinked && reclaim && lib.all_chats.remove(chat_id).is_some();
    Ok(UnlinkOutcome {
        became_unlinked,
        reclaimed,
    })
}

/// Removes the chat from every folder and deletes its record.
///
/// Returns the number of folder references that were dropped.
pub fn global_delete(lib: &mut Library, chat_id: &str) -> Result<usize> {
    let references = tree::holder_count(&lib.folders, chat_id);
    if references == 0 && !lib.all_chats.contains_key(chat_id) {
        return Err(ChatfoldError::ChatNotFound(chat_id.to_string()));
    }
    let removed = tree::detach_everywhere(&mut lib.folders, chat_id);
    lib.all_chats.remove(chat_id);
    Ok(removed)
}
