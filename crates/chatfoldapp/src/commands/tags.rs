//! Library-wide tag management.
//!
//! Tags live on chat records; there is no separate registry. These commands derive the
//! tag set from `allChats` and rewrite it in place:
//! - `list_tags`: unique tags with usage counts
//! - `rename_tag`: rename a tag on every chat carrying it
//! - `delete_tag`: strip a tag from every chat

use crate::commands::{plural, CmdMessage, CmdResult};
use crate::error::{ChatfoldError, Result};
use crate::model::Library;
use crate::tags::{normalize_tag, same_tag};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// Unique tags (case-insensitive) with the number of chats carrying them, most used
/// first. The first spelling seen is the one reported.
pub fn list_tags(lib: &Library) -> Vec<TagCount> {
    let mut counts: BTreeMap<String, TagCount> = BTreeMap::new();
    for chat in lib.all_chats.values() {
        for tag in &chat.tags {
            counts
                .entry(tag.to_lowercase())
                .or_insert_with(|| TagCount {
                    tag: tag.clone(),
                    count: 0,
                })
                .count += 1;
        }
    }
    let mut tags: Vec<TagCount> = counts.into_values().collect();
    tags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    tags
}

pub fn unique_tag_count(lib: &Library) -> usize {
    list_tags(lib).len()
}

pub fn rename_tag(lib: &mut Library, old: &str, new: &str) -> Result<CmdResult> {
    let new_tag = normalize_tag(new)
        .ok_or_else(|| ChatfoldError::Api("New tag name cannot be empty".to_string()))?;
    let old_tag =
        normalize_tag(old).ok_or_else(|| ChatfoldError::Api(format!("Tag '{}' not found", old)))?;

    let mut affected = Vec::new();
    for chat in lib.all_chats.values_mut() {
        let Some(pos) = chat.tags.iter().position(|t| same_tag(t, &old_tag)) else {
            continue;
        };
        if chat.tags[pos] == new_tag {
            continue;
        }
        let already = chat
            .tags
            .iter()
            .enumerate()
            .any(|(i, t)| i != pos && same_tag(t, &new_tag));
        if already {
            chat.tags.remove(pos);
        } else {
            chat.tags[pos] = new_tag.clone();
        }
        chat.touch();
        affected.push(chat.id.clone());
    }

    if affected.is_empty() {
        return Err(ChatfoldError::Api(format!("Tag '{}' not found", old_tag)));
    }

    Ok(CmdResult::changed()
        .with_message(CmdMessage::success(format!(
            "Renamed tag '{}' to '{}' on {}",
            old_tag,
            new_tag,
            plural(affected.len(), "chat")
        )))
        .with_affected_chats(affected))
}

pub fn delete_tag(lib: &mut Library, tag: &str) -> Result<CmdResult> {
    let target =
        normalize_tag(tag).ok_or_else(|| ChatfoldError::Api(format!("Tag '{}' not found", tag)))?;

    let mut affected = Vec::new();
    for chat in lib.all_chats.values_mut() {
        let before = chat.tags.len();
        chat.tags.retain(|t| !same_tag(t, &target));
        if chat.tags.len() != before {
            chat.touch();
            affected.push(chat.id.clone());
        }
    }

    if affected.is_empty() {
        return Err(ChatfoldError::Api(format!("Tag '{}' not found", target)));
    }

    Ok(CmdResult::changed()
        .with_message(CmdMessage::success(format!(
            "Deleted tag '{}' from {}",
            target,
            plural(affected.len(), "chat")
        )))
        .with_affected_chats(affected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChatRecord;

    /// Tags are given space-separated: `("c1", "#work #home")`.
    fn tagged(entries: &[(&str, &str)]) -> Library {
        let mut lib = Library::new();
        for (id, tags) in entries {
            let mut chat = ChatRecord::new(*id, *id);
            chat.tags = tags.split_whitespace().map(str::to_string).collect();
            lib.all_chats.insert(id.to_string(), chat);
        }
        lib
    }

    #[test]
    fn test_list_tags_counts_ignoring_case() {
        let lib = tagged(&[
            ("c1", "#work #home"),
            ("c2", "#Work"),
            ("c3", ""),
        ]);
        let tags = list_tags(&lib);
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].tag, "#work");
        assert_eq!(tags[0].count, 2);
        assert_eq!(tags[1].count, 1);
        assert_eq!(unique_tag_count(&lib), 2);
    }

    #[test]
    fn test_rename_tag_everywhere() {
        let mut lib = tagged(&[("c1", "#work"), ("c2", "#Work #x"), ("c3", "#x")]);
        let result = rename_tag(&mut lib, "work", "job").unwrap();
        assert_eq!(result.affected_chats.len(), 2);
        assert_eq!(lib.chat("c1").unwrap().tags, vec!["#job"]);
        assert_eq!(lib.chat("c2").unwrap().tags, vec!["#job", "#x"]);
        assert_eq!(lib.chat("c3").unwrap().tags, vec!["#x"]);
    }

    #[test]
    fn test_rename_into_existing_tag_merges() {
        let mut lib = tagged(&[("c1", "#work #job")]);
        rename_tag(&mut lib, "#work", "#job").unwrap();
        assert_eq!(lib.chat("c1").unwrap().tags, vec!["#job"]);
    }

    #[test]
    fn test_rename_missing_tag() {
        let mut lib = tagged(&[("c1", "#work")]);
        assert!(rename_tag(&mut lib, "nope", "job").is_err());
        assert!(rename_tag(&mut lib, "work", "#").is_err());
    }

    #[test]
    fn test_delete_tag() {
        let mut lib = tagged(&[("c1", "#work #home"), ("c2", "#WORK")]);
        let result = delete_tag(&mut lib, "work").unwrap();
        assert_eq!(result.affected_chats.len(), 2);
        assert_eq!(lib.chat("c1").unwrap().tags, vec!["#home"]);
        assert!(lib.chat("c2").unwrap().tags.is_empty());
        assert!(delete_tag(&mut lib, "work").is_err());
    }
}
