//! # Query Engine
//!
//! Turns a raw search string into typed predicates and evaluates them against chats.
//!
//! ## Grammar
//!
//! The string is scanned left to right. Each token is an optional `-` (exclusion)
//! followed by either a `"quoted phrase"` or a run of non-whitespace characters:
//!
//! | input            | kind       | matches when                                  |
//! |------------------|------------|-----------------------------------------------|
//! | `pricing`        | `Text`     | title or note contains it                     |
//! | `-pricing`       | `NotText`  | neither title nor note contains it            |
//! | `#work`          | `Tag`      | some tag body contains `work`                 |
//! | `-#work`         | `NotTag`   | no tag body contains `work`                   |
//! | `"#not a tag"`   | `Text`     | quoted tokens are always literal text         |
//!
//! All comparisons are case-insensitive. A chat matches when **every** token holds.
//! A bare `#` carries no body and is ignored; a query with no usable tokens is empty,
//! which callers treat as dashboard mode (show the tree, no filtering).

use crate::model::ChatRecord;
use crate::tags::{tag_body, TAG_MARKER};
use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(-?)(?:"([^"]+)"|(\S+))"#).expect("valid query token regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Text,
    NotText,
    Tag,
    NotTag,
}

/// One predicate. `value` is lowercased; for tags it is the body without the marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryToken {
    pub kind: TokenKind,
    pub value: String,
}

impl QueryToken {
    fn holds(&self, chat: &ChatRecord) -> bool {
        match self.kind {
            TokenKind::Text => text_contains(chat, &self.value),
            TokenKind::NotText => !text_contains(chat, &self.value),
            TokenKind::Tag => tag_contains(chat, &self.value),
            TokenKind::NotTag => !tag_contains(chat, &self.value),
        }
    }
}

fn text_contains(chat: &ChatRecord, needle: &str) -> bool {
    chat.title.to_lowercase().contains(needle)
        || chat
            .note
            .as_deref()
            .is_some_and(|note| note.to_lowercase().contains(needle))
}

fn tag_contains(chat: &ChatRecord, needle: &str) -> bool {
    chat.tags
        .iter()
        .any(|tag| tag_body(tag).to_lowercase().contains(needle))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    tokens: Vec<QueryToken>,
}

impl Query {
    pub fn parse(raw: &str) -> Self {
        let mut tokens = Vec::new();
        for caps in TOKEN_RE.captures_iter(raw.trim()) {
            let negated = caps.get(1).is_some_and(|m| !m.as_str().is_empty());

            if let Some(phrase) = caps.get(2) {
                tokens.push(QueryToken {
                    kind: if negated {
                        TokenKind::NotText
                    } else {
                        TokenKind::Text
                    },
                    value: phrase.as_str().to_lowercase(),
                });
                continue;
            }

            let Some(word) = caps.get(3).map(|m| m.as_str()) else {
                continue;
            };
            if word.starts_with(TAG_MARKER) {
                let body = tag_body(word).trim().to_lowercase();
                if body.is_empty() {
                    continue;
                }
                tokens.push(QueryToken {
                    kind: if negated {
                        TokenKind::NotTag
                    } else {
                        TokenKind::Tag
                    },
                    value: body,
                });
            } else {
                tokens.push(QueryToken {
                    kind: if negated {
                        TokenKind::NotText
                    } else {
                        TokenKind::Text
                    },
                    value: word.to_lowercase(),
                });
            }
        }
        Self { tokens }
    }

    /// Dashboard mode: nothing to filter on.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[QueryToken] {
        &self.tokens
    }

    pub fn matches(&self, chat: &ChatRecord) -> bool {
        self.tokens.iter().all(|token| token.holds(chat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat(title: &str, tags: &[&str], note: Option<&str>) -> ChatRecord {
        let mut chat = ChatRecord::new("c", title);
        chat.tags = tags.iter().map(|t| t.to_string()).collect();
        chat.note = note.map(str::to_string);
        chat
    }

    fn kinds(q: &Query) -> Vec<(TokenKind, &str)> {
        q.tokens()
            .iter()
            .map(|t| (t.kind, t.value.as_str()))
            .collect()
    }

    #[test]
    fn test_tokenizes_all_kinds() {
        let q = Query::parse(r#"Pricing -draft #work -#old "a phrase" -"old project""#);
        assert_eq!(
            kinds(&q),
            vec![
                (TokenKind::Text, "pricing"),
                (TokenKind::NotText, "draft"),
                (TokenKind::Tag, "work"),
                (TokenKind::NotTag, "old"),
                (TokenKind::Text, "a phrase"),
                (TokenKind::NotText, "old project"),
            ]
        );
    }

    #[test]
    fn test_quoted_marker_is_literal_text() {
        let q = Query::parse(r##""#work""##);
        assert_eq!(kinds(&q), vec![(TokenKind::Text, "#work")]);

        let tagged = chat("Plain", &["#work"], None);
        assert!(!q.matches(&tagged));
        let literal = chat("Notes on #work items", &[], None);
        assert!(q.matches(&literal));
    }

    #[test]
    fn test_empty_and_whitespace_queries_are_dashboard() {
        assert!(Query::parse("").is_empty());
        assert!(Query::parse("   \t ").is_empty());
        assert!(Query::parse("#").is_empty());
    }

    #[test]
    fn test_conjunction_of_tag_and_excluded_phrase() {
        let q = Query::parse(r#"#work -"old project""#);

        assert!(q.matches(&chat("Roadmap", &["#work"], None)));
        assert!(!q.matches(&chat("The old project", &["#work"], None)));
        assert!(!q.matches(&chat("Roadmap", &["#work"], Some("see OLD PROJECT"))));
        assert!(!q.matches(&chat("Roadmap", &["#home"], None)));
    }

    #[test]
    fn test_text_is_case_insensitive_over_title_and_note() {
        let q = Query::parse("PRICING");
        assert!(q.matches(&chat("pricing study", &[], None)));
        assert!(q.matches(&chat("Study", &[], Some("about Pricing"))));
        assert!(!q.matches(&chat("Study", &[], None)));
    }

    #[test]
    fn test_phrase_does_not_span_title_and_note() {
        let q = Query::parse(r#""y a""#);
        assert!(!q.matches(&chat("Study", &[], Some("about"))));
        assert!(q.matches(&chat("Study", &[], Some("a day a week"))));

        let excluded = Query::parse(r#"-"y a""#);
        assert!(excluded.matches(&chat("Study", &[], Some("about"))));
    }

    #[test]
    fn test_tag_matches_by_containment() {
        let q = Query::parse("#strat");
        assert!(q.matches(&chat("x", &["#Strategy"], None)));
        assert!(!q.matches(&chat("x", &["#work"], None)));
        assert!(!q.matches(&chat("strategy in title", &[], None)));
    }

    #[test]
    fn test_not_tag_excludes() {
        let q = Query::parse("-#archive");
        assert!(q.matches(&chat("x", &[], None)));
        assert!(!q.matches(&chat("x", &["#archived"], None)));
    }
}
