//! Chat commands.
//!
//! Saving, unlinking and deleting go through [`crate::links`]; editing commands change
//! the single shared record, so every folder holding the chat sees the edit.

use crate::commands::helpers::display_path;
use crate::commands::{plural, CmdMessage, CmdResult};
use crate::error::{ChatfoldError, Result};
use crate::links::{self, LinkOutcome};
use crate::model::{ChatMeta, ChatRecord, Library};
use crate::tags::{normalize_tag, push_unique, same_tag};
use crate::tree;
use serde::Serialize;

/// A folder holding a chat, for location badges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderBadge {
    pub id: String,
    pub name: String,
    /// Breadcrumb from the root, `Research > Drafts`.
    pub path: String,
}

/// What unlinking a chat from a folder would do, for the confirmation prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnlinkPreview {
    pub chat_id: String,
    pub folder_id: String,
    pub becomes_unlinked: bool,
}

fn chat_mut<'a>(lib: &'a mut Library, id: &str) -> Result<&'a mut ChatRecord> {
    lib.chat_mut(id)
        .ok_or_else(|| ChatfoldError::ChatNotFound(id.to_string()))
}

/// Saves a chat into a folder, creating or refreshing its record.
pub fn save(lib: &mut Library, folder_id: &str, meta: ChatMeta) -> Result<CmdResult> {
    let chat_id = meta.id.clone();
    let result = match links::link(lib, folder_id, meta)? {
        LinkOutcome::AlreadyPresent => {
            CmdResult::default().with_message(CmdMessage::info("Chat is already in this folder"))
        }
        LinkOutcome::Linked { created } => CmdResult::changed()
            .with_affected_folders(vec![folder_id.to_string()])
            .with_message(CmdMessage::success(if created {
                "Saved chat"
            } else {
                "Linked existing chat"
            })),
    };
    Ok(result.with_affected_chats(vec![chat_id]))
}

pub fn unlink_preview(lib: &Library, folder_id: &str, chat_id: &str) -> Result<UnlinkPreview> {
    let becomes_unlinked = links::unlink_preview(lib, folder_id, chat_id)?;
    Ok(UnlinkPreview {
        chat_id: chat_id.to_string(),
        folder_id: folder_id.to_string(),
        becomes_unlinked,
    })
}

/// Removes the chat from one folder. `reclaim` deletes the record when this was its
/// last folder; otherwise the chat is left unlinked.
pub fn unlink(lib: &mut Library, folder_id: &str, chat_id: &str, reclaim: bool) -> Result<CmdResult> {
    let outcome = links::unlink(lib, folder_id, chat_id, reclaim)?;
    let mut result = CmdResult::changed()
        .with_affected_folders(vec![folder_id.to_string()])
        .with_affected_chats(vec![chat_id.to_string()])
        .with_message(CmdMessage::success("Removed chat from folder"));
    if outcome.reclaimed {
        result.add_message(CmdMessage::info("Chat was in no other folder and has been deleted"));
    } else if outcome.became_unlinked {
        result.add_message(CmdMessage::warning(
            "Chat is now unlinked (recover it with gc archive)",
        ));
    }
    Ok(result)
}

/// Removes the chat from every folder and deletes its record.
pub fn delete(lib: &mut Library, chat_id: &str) -> Result<CmdResult> {
    let references = links::global_delete(lib, chat_id)?;
    Ok(CmdResult::changed()
        .with_affected_chats(vec![chat_id.to_string()])
        .with_message(CmdMessage::success(format!(
            "Deleted chat from {}",
            plural(references, "folder")
        ))))
}

pub fn rename(lib: &mut Library, chat_id: &str, title: &str) -> Result<CmdResult> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ChatfoldError::Api("Chat title cannot be empty".to_string()));
    }
    let chat = chat_mut(lib, chat_id)?;
    if chat.title == title {
        return Ok(CmdResult::default());
    }
    chat.title = title.to_string();
    chat.touch();
    Ok(CmdResult::changed()
        .with_affected_chats(vec![chat_id.to_string()])
        .with_message(CmdMessage::success("Renamed chat")))
}

/// Sets the chat annotation. `None` or blank text clears it.
pub fn set_note(lib: &mut Library, chat_id: &str, note: Option<&str>) -> Result<CmdResult> {
    let note = note.map(str::trim).filter(|n| !n.is_empty()).map(str::to_string);
    let chat = chat_mut(lib, chat_id)?;
    if chat.note == note {
        return Ok(CmdResult::default());
    }
    let message = if note.is_some() {
        "Updated note"
    } else {
        "Cleared note"
    };
    chat.note = note;
    chat.touch();
    Ok(CmdResult::changed()
        .with_affected_chats(vec![chat_id.to_string()])
        .with_message(CmdMessage::success(message)))
}

pub fn add_tags(lib: &mut Library, chat_id: &str, tags: &[String]) -> Result<CmdResult> {
    let chat = chat_mut(lib, chat_id)?;
    let mut added = 0;
    for tag in tags.iter().filter_map(|t| normalize_tag(t)) {
        if push_unique(&mut chat.tags, tag) {
            added += 1;
        }
    }
    if added == 0 {
        return Ok(CmdResult::default().with_message(CmdMessage::info("No new tags")));
    }
    chat.touch();
    Ok(CmdResult::changed()
        .with_affected_chats(vec![chat_id.to_string()])
        .with_message(CmdMessage::success(format!("Added {}", plural(added, "tag")))))
}

pub fn remove_tags(lib: &mut Library, chat_id: &str, tags: &[String]) -> Result<CmdResult> {
    let chat = chat_mut(lib, chat_id)?;
    let before = chat.tags.len();
    chat.tags
        .retain(|existing| !tags.iter().any(|t| same_tag(existing, t)));
    let removed = before - chat.tags.len();
    if removed == 0 {
        return Ok(CmdResult::default().with_message(CmdMessage::info("No matching tags")));
    }
    chat.touch();
    Ok(CmdResult::changed()
        .with_affected_chats(vec![chat_id.to_string()])
        .with_message(CmdMessage::success(format!(
            "Removed {}",
            plural(removed, "tag")
        ))))
}

/// Folders referencing the chat, in tree order.
pub fn locations(lib: &Library, chat_id: &str) -> Vec<FolderBadge> {
    tree::holders(&lib.folders, chat_id)
        .into_iter()
        .map(|visit| FolderBadge {
            id: visit.folder.id.clone(),
            name: visit.folder.name.clone(),
            path: display_path(&visit.path),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Folder;

    fn setup() -> (Library, String, String) {
        let mut lib = Library::new();
        let mut research = Folder::new("Research");
        let drafts = Folder::new("Drafts");
        let drafts_id = drafts.id.clone();
        research.subfolders.push(drafts);
        let research_id = research.id.clone();
        lib.folders.push(research);
        (lib, research_id, drafts_id)
    }

    #[test]
    fn test_save_new_then_again() {
        let (mut lib, research, _) = setup();
        let first = save(&mut lib, &research, ChatMeta::new("c1", "Pricing Study")).unwrap();
        assert!(first.changed);
        assert_eq!(first.messages[0].content, "Saved chat");

        let second = save(&mut lib, &research, ChatMeta::new("c1", "Pricing Study")).unwrap();
        assert!(!second.changed);
        assert_eq!(lib.folders[0].chat_ids.len(), 1);
    }

    #[test]
    fn test_unlink_last_reference_warns() {
        let (mut lib, research, _) = setup();
        save(&mut lib, &research, ChatMeta::new("c1", "x")).unwrap();

        let preview = unlink_preview(&lib, &research, "c1").unwrap();
        assert!(preview.becomes_unlinked);

        let result = unlink(&mut lib, &research, "c1", false).unwrap();
        assert!(result
            .messages
            .iter()
            .any(|m| m.level == crate::commands::MessageLevel::Warning));
        assert!(lib.all_chats.contains_key("c1"));
    }

    #[test]
    fn test_unlink_confirmed_reclaims() {
        let (mut lib, research, _) = setup();
        save(&mut lib, &research, ChatMeta::new("c1", "x")).unwrap();
        unlink(&mut lib, &research, "c1", true).unwrap();
        assert!(lib.all_chats.is_empty());
    }

    #[test]
    fn test_delete_everywhere() {
        let (mut lib, research, drafts) = setup();
        save(&mut lib, &research, ChatMeta::new("c1", "x")).unwrap();
        save(&mut lib, &drafts, ChatMeta::new("c1", "x")).unwrap();
        let result = delete(&mut lib, "c1").unwrap();
        assert!(result.messages[0].content.contains("2 folders"));
        assert!(lib.all_chats.is_empty());
    }

    #[test]
    fn test_edits_are_shared_across_folders() {
        let (mut lib, research, drafts) = setup();
        save(&mut lib, &research, ChatMeta::new("c1", "Old")).unwrap();
        save(&mut lib, &drafts, ChatMeta::new("c1", "")).unwrap();

        rename(&mut lib, "c1", "New").unwrap();
        set_note(&mut lib, "c1", Some("remember")).unwrap();
        assert_eq!(lib.all_chats.len(), 1);
        let chat = lib.chat("c1").unwrap();
        assert_eq!(chat.title, "New");
        assert_eq!(chat.note.as_deref(), Some("remember"));
    }

    #[test]
    fn test_rename_rejects_blank() {
        let (mut lib, research, _) = setup();
        save(&mut lib, &research, ChatMeta::new("c1", "x")).unwrap();
        assert!(rename(&mut lib, "c1", " ").is_err());
        assert!(matches!(
            rename(&mut lib, "missing", "y"),
            Err(ChatfoldError::ChatNotFound(_))
        ));
    }

    #[test]
    fn test_tag_and_untag() {
        let (mut lib, research, _) = setup();
        save(&mut lib, &research, ChatMeta::new("c1", "x")).unwrap();

        let added = add_tags(&mut lib, "c1", &["work".into(), "#Work".into(), "#".into()]).unwrap();
        assert!(added.changed);
        assert_eq!(lib.chat("c1").unwrap().tags, vec!["#work"]);

        assert!(!add_tags(&mut lib, "c1", &["WORK".into()]).unwrap().changed);

        let removed = remove_tags(&mut lib, "c1", &["Work".into()]).unwrap();
        assert!(removed.changed);
        assert!(lib.chat("c1").unwrap().tags.is_empty());
    }

    #[test]
    fn test_locations_carry_breadcrumbs() {
        let (mut lib, research, drafts) = setup();
        save(&mut lib, &research, ChatMeta::new("c1", "x")).unwrap();
        save(&mut lib, &drafts, ChatMeta::new("c1", "x")).unwrap();
        let badges = locations(&lib, "c1");
        assert_eq!(badges.len(), 2);
        assert_eq!(badges[0].name, "Research");
        assert_eq!(badges[1].path, "Research > Drafts");
    }
}
