//! Imports: full backup restore and chat link import.
//!
//! A backup is validated completely before the current library is touched:
//!
//! 1. It must be a JSON object with a `folders` array and an `allChats` object
//! 2. It must decode into a [`Library`]
//! 3. No folder id may appear twice
//! 4. Every `allChats` key must equal the id of the record it maps to
//! 5. At most [`MAX_PINNED_SEARCHES`] searches may be pinned
//!
//! Repeated chat ids within a folder are collapsed and tags are normalized before the
//! library is installed. Only then is the library replaced wholesale. References to
//! chats missing from `allChats` are tolerated and reported.

use crate::commands::export::ID_PLACEHOLDER;
use crate::commands::{plural, CmdMessage, CmdResult};
use crate::error::{ChatfoldError, Result};
use crate::gc;
use crate::links::{self, LinkOutcome};
use crate::model::{ChatMeta, Folder, Library, MAX_PINNED_SEARCHES};
use crate::tags::normalize_tags;
use crate::tree;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Validates and decodes a backup document without touching any library.
pub fn parse_backup(raw: &str) -> Result<Library> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| ChatfoldError::InvalidImportSchema(format!("not valid JSON: {}", e)))?;

    let Some(object) = value.as_object() else {
        return Err(ChatfoldError::InvalidImportSchema(
            "expected a JSON object".to_string(),
        ));
    };
    if !object.get("folders").is_some_and(Value::is_array) {
        return Err(ChatfoldError::InvalidImportSchema(
            "missing 'folders' list".to_string(),
        ));
    }
    if !object.get("allChats").is_some_and(Value::is_object) {
        return Err(ChatfoldError::InvalidImportSchema(
            "missing 'allChats' dictionary".to_string(),
        ));
    }

    let mut lib: Library = serde_json::from_value(value)
        .map_err(|e| ChatfoldError::InvalidImportSchema(e.to_string()))?;

    let duplicates = tree::duplicate_ids(&lib.folders);
    if !duplicates.is_empty() {
        return Err(ChatfoldError::InvalidImportSchema(format!(
            "duplicate folder id '{}'",
            duplicates[0]
        )));
    }
    if let Some((key, record)) = lib.all_chats.iter().find(|(key, record)| **key != record.id) {
        return Err(ChatfoldError::InvalidImportSchema(format!(
            "chat stored under '{}' has id '{}'",
            key, record.id
        )));
    }
    if lib.pinned_searches.len() > MAX_PINNED_SEARCHES {
        return Err(ChatfoldError::InvalidImportSchema(format!(
            "{} pinned searches, at most {} allowed",
            lib.pinned_searches.len(),
            MAX_PINNED_SEARCHES
        )));
    }

    canonicalize(&mut lib);
    Ok(lib)
}

/// Collapses repeated chat ids per folder and normalizes every chat's tags.
fn canonicalize(lib: &mut Library) {
    let repeated = dedupe_chat_ids(&mut lib.folders);
    let mut retagged = 0;
    for record in lib.all_chats.values_mut() {
        let tags = normalize_tags(&record.tags);
        if tags != record.tags {
            record.tags = tags;
            retagged += 1;
        }
    }
    if repeated > 0 || retagged > 0 {
        debug!(repeated, retagged, "Canonicalized imported backup");
    }
}

fn dedupe_chat_ids(folders: &mut [Folder]) -> usize {
    let mut removed = 0;
    for folder in folders {
        let mut seen = BTreeSet::new();
        let before = folder.chat_ids.len();
        folder.chat_ids.retain(|id| seen.insert(id.clone()));
        removed += before - folder.chat_ids.len();
        removed += dedupe_chat_ids(&mut folder.subfolders);
    }
    removed
}

/// Replaces the library with the backup in `raw`.
pub fn import_backup(lib: &mut Library, raw: &str) -> Result<CmdResult> {
    let imported = parse_backup(raw)?;

    let malformed = gc::malformed_references(&imported).len();
    let mut result = CmdResult::changed().with_message(CmdMessage::success(format!(
        "Imported {} and {}",
        plural(tree::folder_count(&imported.folders), "folder"),
        plural(imported.all_chats.len(), "chat")
    )));
    if malformed > 0 {
        warn!(malformed, "Imported backup references missing chats");
        result.add_message(CmdMessage::warning(format!(
            "{} point at missing chats and will be ignored",
            plural(malformed, "folder reference")
        )));
    }

    info!(
        folders = tree::folder_count(&imported.folders),
        chats = imported.all_chats.len(),
        "Library replaced from backup"
    );
    *lib = imported;
    Ok(result)
}

/// Builds the pattern extracting chat ids from URLs made with `template`.
pub fn chat_id_pattern(template: &str) -> Result<Regex> {
    let Some((prefix, suffix)) = template.split_once(ID_PLACEHOLDER) else {
        return Err(ChatfoldError::Config(format!(
            "chat URL template '{}' has no {} placeholder",
            template, ID_PLACEHOLDER
        )));
    };
    let pattern = format!(
        "{}([A-Za-z0-9_-]+){}",
        regex::escape(prefix),
        regex::escape(suffix)
    );
    Regex::new(&pattern).map_err(|e| ChatfoldError::Config(e.to_string()))
}

/// Distinct chat ids found in `text`, in first-seen order.
pub fn chat_ids_in(text: &str, template: &str) -> Result<Vec<String>> {
    let pattern = chat_id_pattern(template)?;
    let mut seen = BTreeSet::new();
    Ok(pattern
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .filter(|id| seen.insert(id.clone()))
        .collect())
}

/// Links every chat URL found in `text` into `folder_id`. New chats are titled with
/// their id; existing chats keep their title.
pub fn import_links(lib: &mut Library, folder_id: &str, text: &str, template: &str) -> Result<CmdResult> {
    if !tree::contains(&lib.folders, folder_id) {
        return Err(ChatfoldError::FolderNotFound(folder_id.to_string()));
    }
    let ids = chat_ids_in(text, template)?;
    if ids.is_empty() {
        return Ok(CmdResult::default().with_message(CmdMessage::info("No chat links found")));
    }

    let mut linked = Vec::new();
    let mut skipped = 0;
    for id in ids {
        let title = if lib.all_chats.contains_key(&id) {
            String::new()
        } else {
            id.clone()
        };
        match links::link(lib, folder_id, ChatMeta::new(id.clone(), title))? {
            LinkOutcome::Linked { .. } => linked.push(id),
            LinkOutcome::AlreadyPresent => skipped += 1,
        }
    }

    let mut result = if linked.is_empty() {
        CmdResult::default()
    } else {
        CmdResult::changed().with_affected_folders(vec![folder_id.to_string()])
    };
    result.add_message(CmdMessage::success(format!(
        "Imported {}",
        plural(linked.len(), "chat link")
    )));
    if skipped > 0 {
        result.add_message(CmdMessage::info(format!(
            "{} already in folder",
            plural(skipped, "chat")
        )));
    }
    Ok(result.with_affected_chats(linked))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::export;
    use crate::model::{ChatRecord, PinnedSearch};

    const TEMPLATE: &str = "https://chat.example/app/{id}";

    fn sample() -> Library {
        let mut lib = Library::new();
        let mut folder = Folder::new("Research");
        folder.chat_ids.push("c1".into());
        lib.folders.push(folder);
        lib.all_chats
            .insert("c1".into(), ChatRecord::new("c1", "Pricing Study"));
        lib
    }

    #[test]
    fn test_backup_roundtrip_is_deep_equal() {
        let original = sample();
        let json = export::backup(&original).unwrap();
        let mut target = Library::new();
        import_backup(&mut target, &json).unwrap();
        assert_eq!(target, original);
    }

    #[test]
    fn test_rejects_missing_all_chats_without_touching_library() {
        let mut lib = sample();
        let before = lib.clone();
        let err = import_backup(&mut lib, r#"{"folders": []}"#).unwrap_err();
        assert!(matches!(err, ChatfoldError::InvalidImportSchema(_)));
        assert_eq!(lib, before);
    }

    #[test]
    fn test_rejects_non_object_and_bad_json() {
        assert!(matches!(
            parse_backup("[1,2]"),
            Err(ChatfoldError::InvalidImportSchema(_))
        ));
        assert!(matches!(
            parse_backup("{oops"),
            Err(ChatfoldError::InvalidImportSchema(_))
        ));
        assert!(matches!(
            parse_backup(r#"{"folders": {}, "allChats": {}}"#),
            Err(ChatfoldError::InvalidImportSchema(_))
        ));
    }

    #[test]
    fn test_rejects_undecodable_records() {
        let raw = r#"{"folders": [], "allChats": {"c1": {"id": "c1"}}}"#;
        assert!(matches!(
            parse_backup(raw),
            Err(ChatfoldError::InvalidImportSchema(_))
        ));
    }

    #[test]
    fn test_rejects_duplicate_folder_ids() {
        let raw = r#"{"folders": [{"id": "f1", "name": "A"}, {"id": "f1", "name": "B"}], "allChats": {}}"#;
        let err = parse_backup(raw).unwrap_err();
        assert!(err.to_string().contains("duplicate folder id"));
    }

    #[test]
    fn test_rejects_chat_key_that_differs_from_record_id() {
        let raw = r#"{"folders": [], "allChats": {"c1": {"id": "c2", "title": "x", "timestamp": 0}}}"#;
        let err = parse_backup(raw).unwrap_err();
        assert!(matches!(err, ChatfoldError::InvalidImportSchema(_)));
        assert!(err.to_string().contains("'c1'"));
    }

    #[test]
    fn test_rejects_too_many_pinned_searches() {
        let mut lib = sample();
        for n in 0..=MAX_PINNED_SEARCHES {
            lib.pinned_searches
                .push(PinnedSearch::new(format!("Pin {}", n), "#work"));
        }
        let raw = export::backup(&lib).unwrap();
        let mut target = Library::new();
        let err = import_backup(&mut target, &raw).unwrap_err();
        assert!(matches!(err, ChatfoldError::InvalidImportSchema(_)));
        assert!(target.is_empty());
    }

    #[test]
    fn test_repeated_chat_ids_collapse_per_folder() {
        let raw = r#"{
            "folders": [{"id": "f1", "name": "A", "chatIds": ["c1", "c1"],
                         "subfolders": [{"id": "f2", "name": "B", "chatIds": ["c1", "c1", "c1"]}]}],
            "allChats": {"c1": {"id": "c1", "title": "x", "timestamp": 0}}
        }"#;
        let lib = parse_backup(raw).unwrap();
        assert_eq!(lib.folders[0].chat_ids, vec!["c1"]);
        assert_eq!(lib.folders[0].subfolders[0].chat_ids, vec!["c1"]);
    }

    #[test]
    fn test_imported_tags_are_normalized() {
        let raw = r##"{
            "folders": [],
            "allChats": {"c1": {"id": "c1", "title": "x", "timestamp": 0,
                                "tags": ["work", "#Work", " ", "#ideas"]}}
        }"##;
        let lib = parse_backup(raw).unwrap();
        assert_eq!(lib.chat("c1").unwrap().tags, vec!["#work", "#ideas"]);
    }

    #[test]
    fn test_minimal_document_fills_defaults() {
        let lib = parse_backup(r#"{"folders": [], "allChats": {}}"#).unwrap();
        assert!(lib.is_empty());
    }

    #[test]
    fn test_tolerates_malformed_references() {
        let raw = r#"{"folders": [{"id": "f1", "name": "A", "chatIds": ["ghost"]}], "allChats": {}}"#;
        let mut lib = Library::new();
        let result = import_backup(&mut lib, raw).unwrap();
        assert!(result
            .messages
            .iter()
            .any(|m| m.content.contains("missing chats")));
        assert_eq!(lib.folders[0].chat_ids, vec!["ghost"]);
    }

    #[test]
    fn test_chat_ids_in_text() {
        let text = "see https://chat.example/app/abc123 and https://chat.example/app/x_y-z, \
                    again https://chat.example/app/abc123 but not https://other.example/app/nope";
        assert_eq!(chat_ids_in(text, TEMPLATE).unwrap(), vec!["abc123", "x_y-z"]);
    }

    #[test]
    fn test_template_without_placeholder() {
        assert!(matches!(
            chat_id_pattern("https://chat.example/app/"),
            Err(ChatfoldError::Config(_))
        ));
    }

    #[test]
    fn test_import_links() {
        let mut lib = sample();
        let folder_id = lib.folders[0].id.clone();
        let text = "https://chat.example/app/c1\nhttps://chat.example/app/c9";
        let result = import_links(&mut lib, &folder_id, text, TEMPLATE).unwrap();
        assert!(result.changed);
        assert_eq!(result.affected_chats, vec!["c9"]);
        assert_eq!(lib.chat("c9").unwrap().title, "c9");
        assert_eq!(lib.chat("c1").unwrap().title, "Pricing Study");
        assert_eq!(lib.folders[0].chat_ids, vec!["c1", "c9"]);
    }
}
