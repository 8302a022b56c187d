//! # Folder Tree Operations
//!
//! Stateless functions that locate, insert, move and remove folders inside the owned
//! folder tree of a [`Library`](crate::model::Library).
//!
//! ## Traversal
//!
//! Every lookup is a depth-first walk over the root `folders` and recursively into
//! `subfolders`. The first match wins; folder ids are unique across the whole tree so
//! this is unambiguous.
//!
//! ## Ownership
//!
//! A folder owns its `subfolders` subtree, so moving or removing a folder carries the
//! whole subtree with it. Chat references inside a removed subtree are simply dropped
//! with it: the chat records stay in `allChats` and become unlinked if nothing else
//! references them (see [`crate::gc`]).
//!
//! ## Cycle Prevention
//!
//! [`move_folder`] refuses to move a folder into itself or into any folder inside its
//! own subtree, at any depth. The check walks the moving folder's subtree looking for
//! the destination before anything is detached.

use crate::error::{ChatfoldError, Result};
use crate::model::Folder;
use std::collections::HashSet;

/// Result of [`locate`]: the folder, the folder owning the collection it sits in
/// (`None` for the root collection), and its index inside that collection.
#[derive(Debug, Clone, Copy)]
pub struct Located<'a> {
    pub folder: &'a Folder,
    pub parent: Option<&'a Folder>,
    pub index: usize,
}

/// A folder reached during a depth-first walk, with its depth and breadcrumb.
#[derive(Debug, Clone)]
pub struct Visit<'a> {
    pub folder: &'a Folder,
    pub depth: usize,
    /// Folder names from the root down to and including this folder.
    pub path: Vec<&'a str>,
}

pub fn locate<'a>(folders: &'a [Folder], id: &str) -> Option<Located<'a>> {
    locate_in(folders, None, id)
}

fn locate_in<'a>(
    folders: &'a [Folder],
    parent: Option<&'a Folder>,
    id: &str,
) -> Option<Located<'a>> {
    for (index, folder) in folders.iter().enumerate() {
        if folder.id == id {
            return Some(Located {
                folder,
                parent,
                index,
            });
        }
        if let Some(found) = locate_in(&folder.subfolders, Some(folder), id) {
            return Some(found);
        }
    }
    None
}

pub fn find<'a>(folders: &'a [Folder], id: &str) -> Option<&'a Folder> {
    locate(folders, id).map(|located| located.folder)
}

pub fn find_mut<'a>(folders: &'a mut [Folder], id: &str) -> Option<&'a mut Folder> {
    for folder in folders.iter_mut() {
        if folder.id == id {
            return Some(folder);
        }
        if let Some(found) = find_mut(&mut folder.subfolders, id) {
            return Some(found);
        }
    }
    None
}

pub fn contains(folders: &[Folder], id: &str) -> bool {
    locate(folders, id).is_some()
}

/// Returns true when `candidate_id` sits anywhere inside the subtree of `ancestor_id`.
pub fn is_descendant(folders: &[Folder], ancestor_id: &str, candidate_id: &str) -> bool {
    find(folders, ancestor_id)
        .map(|ancestor| contains(&ancestor.subfolders, candidate_id))
        .unwrap_or(false)
}

/// Appends `folder` to the subfolders of `parent_id`, or to the root collection.
pub fn insert(folders: &mut Vec<Folder>, parent_id: Option<&str>, folder: Folder) -> Result<()> {
    match parent_id {
        None => folders.push(folder),
        Some(parent_id) => {
            let parent = find_mut(folders, parent_id)
                .ok_or_else(|| ChatfoldError::FolderNotFound(parent_id.to_string()))?;
            parent.subfolders.push(folder);
        }
    }
    Ok(())
}

/// Moves a folder (with its subtree) under `destination_id`, or to the root.
///
/// Rejects moving a folder into itself or into one of its descendants; the tree is left
/// untouched on error.
pub fn move_folder(
    folders: &mut Vec<Folder>,
    folder_id: &str,
    destination_id: Option<&str>,
) -> Result<()> {
    let moving = find(folders, folder_id)
        .ok_or_else(|| ChatfoldError::FolderNotFound(folder_id.to_string()))?;

    if let Some(dest) = destination_id {
        if dest == folder_id {
            return Err(ChatfoldError::InvalidMove(format!(
                "cannot move folder '{}' into itself",
                moving.name
            )));
        }
        if is_descendant(folders, folder_id, dest) {
            return Err(ChatfoldError::InvalidMove(format!(
                "cannot move folder '{}' into its own descendant",
                moving.name
            )));
        }
        if !contains(folders, dest) {
            return Err(ChatfoldError::FolderNotFound(dest.to_string()));
        }
    }

    let detached = take(folders, folder_id)
        .ok_or_else(|| ChatfoldError::FolderNotFound(folder_id.to_string()))?;
    insert(folders, destination_id, detached)
}

/// Splices a folder and its owned subtree out of the tree and returns it.
pub fn remove(folders: &mut Vec<Folder>, folder_id: &str) -> Result<Folder> {
    take(folders, folder_id).ok_or_else(|| ChatfoldError::FolderNotFound(folder_id.to_string()))
}

fn take(folders: &mut Vec<Folder>, id: &str) -> Option<Folder> {
    if let Some(pos) = folders.iter().position(|f| f.id == id) {
        return Some(folders.remove(pos));
    }
    for folder in folders.iter_mut() {
        if let Some(found) = take(&mut folder.subfolders, id) {
            return Some(found);
        }
    }
    None
}

/// Depth-first walk of the whole tree, parents before children.
pub fn walk(folders: &[Folder]) -> Vec<Visit<'_>> {
    let mut out = Vec::new();
    walk_into(folders, 0, &[], &mut out);
    out
}

fn walk_into<'a>(folders: &'a [Folder], depth: usize, prefix: &[&'a str], out: &mut Vec<Visit<'a>>) {
    for folder in folders {
        let mut path = prefix.to_vec();
        path.push(folder.name.as_str());
        out.push(Visit {
            folder,
            depth,
            path: path.clone(),
        });
        walk_into(&folder.subfolders, depth + 1, &path, out);
    }
}

/// Folder names from the root down to `folder_id`.
pub fn breadcrumb<'a>(folders: &'a [Folder], folder_id: &str) -> Option<Vec<&'a str>> {
    walk(folders)
        .into_iter()
        .find(|visit| visit.folder.id == folder_id)
        .map(|visit| visit.path)
}

/// Every folder whose `chatIds` references `chat_id`, in traversal order.
pub fn holders<'a>(folders: &'a [Folder], chat_id: &str) -> Vec<Visit<'a>> {
    walk(folders)
        .into_iter()
        .filter(|visit| visit.folder.holds(chat_id))
        .collect()
}

pub fn holder_count(folders: &[Folder], chat_id: &str) -> usize {
    folders
        .iter()
        .map(|f| usize::from(f.holds(chat_id)) + holder_count(&f.subfolders, chat_id))
        .sum()
}

/// Drops `chat_id` from every folder in the tree. Returns how many references went away.
pub fn detach_everywhere(folders: &mut [Folder], chat_id: &str) -> usize {
    let mut removed = 0;
    for folder in folders.iter_mut() {
        let before = folder.chat_ids.len();
        folder.chat_ids.retain(|id| id != chat_id);
        removed += before - folder.chat_ids.len();
        removed += detach_everywhere(&mut folder.subfolders, chat_id);
    }
    removed
}

pub fn folder_count(folders: &[Folder]) -> usize {
    folders
        .iter()
        .map(|f| 1 + folder_count(&f.subfolders))
        .sum()
}

/// Folder ids that appear more than once in the tree.
pub fn duplicate_ids(folders: &[Folder]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut dups = Vec::new();
    for visit in walk(folders) {
        if !seen.insert(visit.folder.id.as_str()) {
            dups.push(visit.folder.id.clone());
        }
    }
    dups
}
