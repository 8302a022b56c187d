//! # Garbage Collection of Unlinked Chats
//!
//! A chat record with no folder referencing it is *unlinked*. That is a normal
//! transient state (the user removed it from its last folder) and is never resolved
//! automatically. Two remediations are offered:
//!
//! - **Archive** (safe default): append one new root folder referencing every unlinked
//!   chat. Purely additive.
//! - **Prune**: delete the records from `allChats`. Irreversible; the caller must have
//!   asked for confirmation.
//!
//! References to ids missing from `allChats` are not chats and are never reported here.

use crate::model::{Folder, Library};
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Every chat id referenced by any folder in the tree.
pub fn referenced_ids(lib: &Library) -> BTreeSet<String> {
    let mut ids = BTreeSet::new();
    collect(&lib.folders, &mut ids);
    ids
}

fn collect(folders: &[Folder], ids: &mut BTreeSet<String>) {
    for folder in folders {
        ids.extend(folder.chat_ids.iter().cloned());
        collect(&folder.subfolders, ids);
    }
}

/// `keys(allChats) − referenced`, in id order.
pub fn find_unlinked(lib: &Library) -> Vec<String> {
    let referenced = referenced_ids(lib);
    lib.all_chats
        .keys()
        .filter(|id| !referenced.contains(*id))
        .cloned()
        .collect()
}

/// Deletes every listed id from `allChats`. Returns how many records were removed.
pub fn prune(lib: &mut Library, ids: &[String]) -> usize {
    ids.iter()
        .filter(|id| lib.all_chats.remove(id.as_str()).is_some())
        .count()
}

/// Appends a new root folder named `name` referencing exactly `ids`.
///
/// Returns the new folder's id, or `None` when there is nothing to archive.
pub fn archive(lib: &mut Library, ids: &[String], name: impl Into<String>) -> Option<String> {
    if ids.is_empty() {
        return None;
    }
    let mut folder = Folder::new(name);
    for id in ids {
        if !folder.holds(id) {
            folder.chat_ids.push(id.clone());
        }
    }
    let id = folder.id.clone();
    lib.folders.push(folder);
    Some(id)
}

/// `"{prefix} 2026-10-16"`
pub fn archive_folder_name(prefix: &str, date: NaiveDate) -> String {
    format!("{} {}", prefix, date.format("%Y-%m-%d"))
}

/// Folder references that point at ids absent from `allChats`, as `(folder id, chat id)`.
pub fn malformed_references(lib: &Library) -> Vec<(String, String)> {
    crate::tree::walk(&lib.folders)
        .into_iter()
        .flat_map(|visit| {
            visit
                .folder
                .chat_ids
                .iter()
                .filter(|id| !lib.all_chats.contains_key(id.as_str()))
                .map(|id| (visit.folder.id.clone(), id.clone()))
                .collect::<Vec<_>>()
        })
        .collect()
}
