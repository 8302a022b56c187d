//! Search over all chats.
//!
//! An empty query yields [`SearchOutcome::Dashboard`]: the caller shows the folder tree
//! instead of a result list. Otherwise every chat in `allChats` is tested, including
//! unlinked ones (which carry no location badges), and hits are ordered most recently
//! updated first.

use crate::commands::chats::{locations, FolderBadge};
use crate::model::{ChatRecord, Library};
use crate::query::Query;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub chat: ChatRecord,
    /// Folders referencing the chat.
    pub locations: Vec<FolderBadge>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "hits", rename_all = "lowercase")]
pub enum SearchOutcome {
    #[default]
    Dashboard,
    Matches(Vec<SearchHit>),
}

impl SearchOutcome {
    pub fn hits(&self) -> &[SearchHit] {
        match self {
            SearchOutcome::Dashboard => &[],
            SearchOutcome::Matches(hits) => hits,
        }
    }
}

pub fn run(lib: &Library, raw_query: &str) -> SearchOutcome {
    let query = Query::parse(raw_query);
    if query.is_empty() {
        return SearchOutcome::Dashboard;
    }

    let mut matched: Vec<&ChatRecord> = lib
        .all_chats
        .values()
        .filter(|chat| query.matches(chat))
        .collect();
    matched.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    SearchOutcome::Matches(
        matched
            .into_iter()
            .map(|chat| SearchHit {
                chat: chat.clone(),
                locations: locations(lib, &chat.id),
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{chats, folders};
    use crate::model::ChatMeta;

    fn library() -> Library {
        let mut lib = Library::new();
        let research = folders::create(&mut lib, None, "Research")
            .unwrap()
            .affected_folders[0]
            .clone();
        let work = folders::create(&mut lib, None, "Work")
            .unwrap()
            .affected_folders[0]
            .clone();
        chats::save(
            &mut lib,
            &research,
            ChatMeta::new("c1", "Pricing Study").with_tags(["strategy"]),
        )
        .unwrap();
        chats::save(
            &mut lib,
            &work,
            ChatMeta::new("c2", "Roadmap").with_tags(["work"]),
        )
        .unwrap();
        chats::save(
            &mut lib,
            &work,
            ChatMeta::new("c3", "Old project notes").with_tags(["work"]),
        )
        .unwrap();
        chats::save(&mut lib, &research, ChatMeta::new("c2", "")).unwrap();
        lib
    }

    #[test]
    fn test_empty_query_is_dashboard() {
        let lib = library();
        assert_eq!(run(&lib, "   "), SearchOutcome::Dashboard);
        assert!(run(&lib, "").hits().is_empty());
    }

    #[test]
    fn test_tag_search_with_badges() {
        let lib = library();
        let outcome = run(&lib, "#strategy");
        let hits = outcome.hits();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chat.id, "c1");
        assert_eq!(hits[0].locations.len(), 1);
        assert_eq!(hits[0].locations[0].name, "Research");
    }

    #[test]
    fn test_conjunction_with_excluded_phrase() {
        let lib = library();
        let outcome = run(&lib, r#"#work -"old project""#);
        let ids: Vec<&str> = outcome.hits().iter().map(|h| h.chat.id.as_str()).collect();
        assert_eq!(ids, vec!["c2"]);
        // c2 lives in two folders
        assert_eq!(outcome.hits()[0].locations.len(), 2);
    }

    #[test]
    fn test_unlinked_chats_are_found_without_badges() {
        let mut lib = library();
        lib.all_chats
            .insert("u1".into(), ChatRecord::new("u1", "Lost pricing idea"));
        let outcome = run(&lib, "pricing");
        let lost = outcome
            .hits()
            .iter()
            .find(|h| h.chat.id == "u1")
            .unwrap();
        assert!(lost.locations.is_empty());
    }
}
