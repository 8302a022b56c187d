//! # Domain Model: The Normalized Library
//!
//! This module defines the core data structures for chatfold: [`Folder`], [`ChatRecord`],
//! [`PinnedSearch`] and the root aggregate [`Library`].
//!
//! ## The Problem
//!
//! One chat often belongs in several folders ("Pricing Study" lives under both "Research"
//! and "Clients/Acme"). If every folder embedded its own copy of the chat's title, tags
//! and note, an edit in one place would silently diverge from the others, and the
//! duplicated text would eat into the ~100KB storage quota.
//!
//! ## The Normalized Shape
//!
//! ```text
//! Library
//! ├── folders: [Folder]              <-- owned tree; folders own their subfolders
//! │     └── chatIds: ["c1", "c2"]    <-- references only, never chat data
//! ├── allChats: { "c1": ChatRecord } <-- the one shared copy of each chat
//! └── pinnedSearches: [PinnedSearch] <-- at most 5
//! ```
//!
//! A folder's `chatIds` entry is a weak back-reference: removing it never deletes the
//! record, and a record is only reclaimed once nothing references it (see [`crate::gc`]).
//!
//! ## Wire Format
//!
//! The library serializes with camelCase keys and millisecond timestamps, which is also
//! the full-fidelity backup format. `allChats` is a `BTreeMap` so the serialization is
//! canonical: two equal libraries always produce byte-identical JSON.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Maximum number of pinned searches a library may hold.
pub const MAX_PINNED_SEARCHES: usize = 5;

/// Generates a new time-ordered identifier for folders and pinned searches.
pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}

/// Current time at the millisecond precision the wire format keeps.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Updated,
    Created,
    Alpha,
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "updated" => Ok(SortOrder::Updated),
            "created" => Ok(SortOrder::Created),
            "alpha" => Ok(SortOrder::Alpha),
            other => Err(format!(
                "unknown sort order '{}' (expected updated, created or alpha)",
                other
            )),
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SortOrder::Updated => "updated",
            SortOrder::Created => "created",
            SortOrder::Alpha => "alpha",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub chat_ids: Vec<String>,
    #[serde(default)]
    pub subfolders: Vec<Folder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub sort_order: SortOrder,
}

impl Folder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            chat_ids: Vec::new(),
            subfolders: Vec::new(),
            note: None,
            sort_order: SortOrder::default(),
        }
    }

    pub fn holds(&self, chat_id: &str) -> bool {
        self.chat_ids.iter().any(|id| id == chat_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRecord {
    pub id: String,
    pub title: String,
    /// Normalized tags, each carrying the leading [`crate::tags::TAG_MARKER`].
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

// Records written before edits were tracked carry no `updatedAt`.
// If missing, it defaults to the creation `timestamp`.
impl<'de> Deserialize<'de> for ChatRecord {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let helper = ChatRecordHelper::deserialize(deserializer)?;

        Ok(ChatRecord {
            id: helper.id,
            title: helper.title,
            tags: helper.tags,
            note: helper.note,
            timestamp: helper.timestamp,
            updated_at: helper.updated_at.unwrap_or(helper.timestamp),
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatRecordHelper {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    note: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    timestamp: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    updated_at: Option<DateTime<Utc>>,
}

impl ChatRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = now();
        Self {
            id: id.into(),
            title: title.into(),
            tags: Vec::new(),
            note: None,
            timestamp: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = now();
    }
}

/// Chat metadata supplied when saving a chat into a folder.
///
/// The host page provides the id and title; tags and note are optional user input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatMeta {
    pub id: String,
    pub title: String,
    pub tags: Vec<String>,
    pub note: Option<String>,
}

impl ChatMeta {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinnedSearch {
    pub id: String,
    pub title: String,
    pub query: String,
}

impl PinnedSearch {
    pub fn new(title: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            query: query.into(),
        }
    }
}

/// The root aggregate: unit of serialization, persistence and quota measurement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Library {
    #[serde(default)]
    pub folders: Vec<Folder>,
    #[serde(default)]
    pub all_chats: BTreeMap<String, ChatRecord>,
    #[serde(default)]
    pub pinned_searches: Vec<PinnedSearch>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chat(&self, id: &str) -> Option<&ChatRecord> {
        self.all_chats.get(id)
    }

    pub fn chat_mut(&mut self, id: &str) -> Option<&mut ChatRecord> {
        self.all_chats.get_mut(id)
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.all_chats.is_empty() && self.pinned_searches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_serializes_with_camel_case_keys() {
        let mut lib = Library::new();
        let mut folder = Folder::new("Research");
        folder.chat_ids.push("c1".into());
        lib.folders.push(folder);
        lib.all_chats
            .insert("c1".into(), ChatRecord::new("c1", "Pricing Study"));

        let json = serde_json::to_string(&lib).unwrap();
        assert!(json.contains("\"allChats\""));
        assert!(json.contains("\"chatIds\""));
        assert!(json.contains("\"pinnedSearches\""));
        assert!(json.contains("\"updatedAt\""));
        assert!(json.contains("\"sortOrder\":\"updated\""));
        // Absent notes are not serialized at all
        assert!(!json.contains("\"note\""));
    }

    #[test]
    fn test_library_roundtrip_is_deep_equal() {
        let mut lib = Library::new();
        let mut folder = Folder::new("Research");
        folder.note = Some("Q3 work".into());
        folder.sort_order = SortOrder::Alpha;
        folder.subfolders.push(Folder::new("Drafts"));
        folder.chat_ids.push("c1".into());
        lib.folders.push(folder);
        let mut chat = ChatRecord::new("c1", "Pricing Study");
        chat.tags.push("#strategy".into());
        chat.note = Some("follow up".into());
        lib.all_chats.insert("c1".into(), chat);
        lib.pinned_searches
            .push(PinnedSearch::new("Strategy", "#strategy"));

        let json = serde_json::to_string(&lib).unwrap();
        let loaded: Library = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, lib);
    }

    #[test]
    fn test_missing_updated_at_defaults_to_timestamp() {
        let json = r#"{"id":"c1","title":"Old","tags":[],"timestamp":1700000000000}"#;
        let chat: ChatRecord = serde_json::from_str(json).unwrap();
        assert_eq!(chat.updated_at, chat.timestamp);
        assert_eq!(chat.timestamp.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_folder_missing_optional_fields_uses_defaults() {
        let json = r#"{"id":"f1","name":"Bare"}"#;
        let folder: Folder = serde_json::from_str(json).unwrap();
        assert!(folder.chat_ids.is_empty());
        assert!(folder.subfolders.is_empty());
        assert_eq!(folder.sort_order, SortOrder::Updated);
    }

    #[test]
    fn test_new_ids_are_unique() {
        let a = new_id();
        let b = new_id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_sort_order_from_str() {
        assert_eq!("alpha".parse::<SortOrder>().unwrap(), SortOrder::Alpha);
        assert_eq!("Created".parse::<SortOrder>().unwrap(), SortOrder::Created);
        assert!("random".parse::<SortOrder>().is_err());
    }
}
