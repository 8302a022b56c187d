//! Unlinked chat remediation.
//!
//! `archive` is the safe default: it only adds a folder. `prune` deletes records and
//! cannot be undone, so the UI confirms first (see `prune_preview`).

use crate::commands::{plural, CmdMessage, CmdResult};
use crate::error::Result;
use crate::gc;
use crate::model::{ChatRecord, Library};
use chrono::NaiveDate;
use tracing::{info, warn};

/// Unlinked chats, most recently updated first.
pub fn list_unlinked(lib: &Library) -> Vec<ChatRecord> {
    let mut chats: Vec<ChatRecord> = gc::find_unlinked(lib)
        .iter()
        .filter_map(|id| lib.chat(id).cloned())
        .collect();
    chats.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    chats
}

/// The ids `prune` would delete: the requested ids that are unlinked, or every unlinked
/// chat when `ids` is empty.
pub fn prune_preview(lib: &Library, ids: &[String]) -> Vec<String> {
    let unlinked = gc::find_unlinked(lib);
    if ids.is_empty() {
        return unlinked;
    }
    ids.iter()
        .filter(|id| unlinked.contains(id))
        .cloned()
        .collect()
}

/// Deletes unlinked chat records. Ids still referenced by a folder are skipped so no
/// folder is left pointing at a missing record.
pub fn prune(lib: &mut Library, ids: &[String]) -> Result<CmdResult> {
    let targets = prune_preview(lib, ids);
    let skipped: Vec<&String> = ids.iter().filter(|id| !targets.contains(id)).collect();

    let mut result = if targets.is_empty() {
        CmdResult::default().with_message(CmdMessage::info("No unlinked chats to prune"))
    } else {
        let removed = gc::prune(lib, &targets);
        info!(removed, "Pruned unlinked chats");
        CmdResult::changed()
            .with_affected_chats(targets)
            .with_message(CmdMessage::success(format!(
                "Permanently deleted {}",
                plural(removed, "unlinked chat")
            )))
    };

    for id in skipped {
        warn!(chat = %id, "Refusing to prune a chat that is not unlinked");
        result.add_message(CmdMessage::warning(format!(
            "Skipped '{}': not an unlinked chat",
            id
        )));
    }
    Ok(result)
}

/// Moves every unlinked chat into a new root folder `"{prefix} {date}"`.
pub fn archive(lib: &mut Library, prefix: &str, date: NaiveDate) -> Result<CmdResult> {
    let ids = gc::find_unlinked(lib);
    let name = gc::archive_folder_name(prefix, date);
    match gc::archive(lib, &ids, name.clone()) {
        None => Ok(CmdResult::default().with_message(CmdMessage::info("No unlinked chats to archive"))),
        Some(folder_id) => {
            info!(chats = ids.len(), folder = %folder_id, "Archived unlinked chats");
            Ok(CmdResult::changed()
                .with_affected_folders(vec![folder_id])
                .with_message(CmdMessage::success(format!(
                    "Archived {} into '{}'",
                    plural(ids.len(), "chat"),
                    name
                )))
                .with_affected_chats(ids))
        }
    }
}
