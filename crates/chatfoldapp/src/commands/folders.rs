//! Folder commands.
//!
//! - `create`: add a root folder or a subfolder
//! - `rename`, `set_note`, `set_sort`: edit folder attributes
//! - `move_to`: re-parent a folder (cycle-checked)
//! - `delete`: remove a folder and its subtree; chats are dereferenced, never deleted
//! - `list_chats`: a folder's chats in its sort order
//! - `rows`: the flattened tree for display

use crate::commands::{plural, CmdMessage, CmdResult};
use crate::error::{ChatfoldError, Result};
use crate::model::{ChatRecord, Folder, Library, SortOrder};
use crate::tree;
use serde::Serialize;
use std::cmp::Reverse;
use tracing::warn;

/// One line of the folder tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderRow {
    pub id: String,
    pub name: String,
    pub depth: usize,
    pub chat_count: usize,
    pub note: Option<String>,
    pub sort_order: SortOrder,
}

fn clean_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ChatfoldError::Api("Folder name cannot be empty".to_string()));
    }
    Ok(name.to_string())
}

fn folder_mut<'a>(lib: &'a mut Library, id: &str) -> Result<&'a mut Folder> {
    tree::find_mut(&mut lib.folders, id).ok_or_else(|| ChatfoldError::FolderNotFound(id.to_string()))
}

pub fn create(lib: &mut Library, parent_id: Option<&str>, name: &str) -> Result<CmdResult> {
    let folder = Folder::new(clean_name(name)?);
    let id = folder.id.clone();
    let message = format!("Created folder '{}'", folder.name);
    tree::insert(&mut lib.folders, parent_id, folder)?;
    Ok(CmdResult::changed()
        .with_affected_folders(vec![id])
        .with_message(CmdMessage::success(message)))
}

pub fn rename(lib: &mut Library, id: &str, name: &str) -> Result<CmdResult> {
    let name = clean_name(name)?;
    let folder = folder_mut(lib, id)?;
    if folder.name == name {
        return Ok(CmdResult::default().with_message(CmdMessage::info("Name unchanged")));
    }
    let old = std::mem::replace(&mut folder.name, name);
    let message = format!("Renamed folder '{}' to '{}'", old, folder.name);
    Ok(CmdResult::changed()
        .with_affected_folders(vec![id.to_string()])
        .with_message(CmdMessage::success(message)))
}

/// Sets the folder annotation. `None` or blank text clears it.
pub fn set_note(lib: &mut Library, id: &str, note: Option<&str>) -> Result<CmdResult> {
    let note = note.map(str::trim).filter(|n| !n.is_empty()).map(str::to_string);
    let folder = folder_mut(lib, id)?;
    if folder.note == note {
        return Ok(CmdResult::default().with_message(CmdMessage::info("Note unchanged")));
    }
    let message = if note.is_some() {
        format!("Updated note on '{}'", folder.name)
    } else {
        format!("Cleared note on '{}'", folder.name)
    };
    folder.note = note;
    Ok(CmdResult::changed()
        .with_affected_folders(vec![id.to_string()])
        .with_message(CmdMessage::success(message)))
}

pub fn set_sort(lib: &mut Library, id: &str, order: SortOrder) -> Result<CmdResult> {
    let folder = folder_mut(lib, id)?;
    if folder.sort_order == order {
        return Ok(CmdResult::default());
    }
    folder.sort_order = order;
    Ok(CmdResult::changed().with_affected_folders(vec![id.to_string()]))
}

/// Moves a folder under `destination_id`, or to the root when `None`.
pub fn move_to(lib: &mut Library, id: &str, destination_id: Option<&str>) -> Result<CmdResult> {
    tree::move_folder(&mut lib.folders, id, destination_id)?;
    let name = tree::find(&lib.folders, id)
        .map(|f| f.name.clone())
        .unwrap_or_default();
    let target = match destination_id.and_then(|d| tree::breadcrumb(&lib.folders, d)) {
        Some(path) => format!("'{}'", path.join(" > ")),
        None => "the root".to_string(),
    };
    Ok(CmdResult::changed()
        .with_affected_folders(vec![id.to_string()])
        .with_message(CmdMessage::success(format!(
            "Moved folder '{}' to {}",
            name, target
        ))))
}

/// Removes the folder and its subtree. Chats only referenced from inside the subtree
/// become unlinked.
pub fn delete(lib: &mut Library, id: &str) -> Result<CmdResult> {
    let removed = tree::remove(&mut lib.folders, id)?;

    let mut removed_ids = Vec::new();
    let mut orphaned: Vec<String> = Vec::new();
    for visit in tree::walk(std::slice::from_ref(&removed)) {
        removed_ids.push(visit.folder.id.clone());
        for chat_id in &visit.folder.chat_ids {
            if lib.all_chats.contains_key(chat_id)
                && tree::holder_count(&lib.folders, chat_id) == 0
                && !orphaned.contains(chat_id)
            {
                orphaned.push(chat_id.clone());
            }
        }
    }

    let mut result = CmdResult::changed()
        .with_affected_folders(removed_ids)
        .with_message(CmdMessage::success(format!(
            "Deleted folder '{}'",
            removed.name
        )));
    if !orphaned.is_empty() {
        result.add_message(CmdMessage::warning(format!(
            "{} now unlinked (recover them with gc archive)",
            plural(orphaned.len(), "chat")
        )));
    }
    Ok(result.with_affected_chats(orphaned))
}

/// The folder's chats, ordered by its sort order. References to missing chats are skipped.
pub fn list_chats(lib: &Library, id: &str) -> Result<Vec<ChatRecord>> {
    let folder =
        tree::find(&lib.folders, id).ok_or_else(|| ChatfoldError::FolderNotFound(id.to_string()))?;

    let mut chats: Vec<ChatRecord> = Vec::with_capacity(folder.chat_ids.len());
    for chat_id in &folder.chat_ids {
        match lib.chat(chat_id) {
            Some(chat) => chats.push(chat.clone()),
            None => warn!(folder = %folder.id, chat = %chat_id, "Skipping reference to missing chat"),
        }
    }
    sort_chats(&mut chats, folder.sort_order);
    Ok(chats)
}

pub fn sort_chats(chats: &mut [ChatRecord], order: SortOrder) {
    match order {
        SortOrder::Updated => chats.sort_by_key(|c| Reverse(c.updated_at)),
        SortOrder::Created => chats.sort_by_key(|c| Reverse(c.timestamp)),
        SortOrder::Alpha => chats.sort_by_key(|c| c.title.to_lowercase()),
    }
}

pub fn rows(lib: &Library) -> Vec<FolderRow> {
    tree::walk(&lib.folders)
        .into_iter()
        .map(|visit| FolderRow {
            id: visit.folder.id.clone(),
            name: visit.folder.name.clone(),
            depth: visit.depth,
            chat_count: visit
                .folder
                .chat_ids
                .iter()
                .filter(|id| lib.all_chats.contains_key(id.as_str()))
                .count(),
            note: visit.folder.note.clone(),
            sort_order: visit.folder.sort_order,
        })
        .collect()
}
