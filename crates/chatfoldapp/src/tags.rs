//! Tag normalization for chatfold.
//!
//! Tags are free-form labels attached to chat records. Users type them with or without
//! the marker, with stray whitespace, or as a bare `#`. Every tag is canonicalized
//! before it is stored so that the query engine and the tag manager only ever see one
//! spelling:
//!
//! - Exactly one leading [`TAG_MARKER`]
//! - Followed by a trimmed, non-empty body
//!
//! Empty or marker-only input is dropped silently.

/// Marker character that prefixes every stored tag and introduces tag tokens in queries.
pub const TAG_MARKER: char = '#';

/// Canonicalizes a single tag, returning `None` when nothing usable remains.
///
/// # Examples
/// ```
/// use chatfoldapp::tags::normalize_tag;
///
/// assert_eq!(normalize_tag("work"), Some("#work".to_string()));
/// assert_eq!(normalize_tag("  ##work  "), Some("#work".to_string()));
/// assert_eq!(normalize_tag("# deep work "), Some("#deep work".to_string()));
/// assert_eq!(normalize_tag("#"), None);
/// assert_eq!(normalize_tag("   "), None);
/// ```
pub fn normalize_tag(raw: &str) -> Option<String> {
    let body = raw.trim().trim_start_matches(TAG_MARKER).trim();
    if body.is_empty() {
        return None;
    }
    Some(format!("{}{}", TAG_MARKER, body))
}

/// Canonicalizes a list of tags, dropping empties and case-insensitive duplicates
/// while keeping first-seen order.
pub fn normalize_tags<I, T>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in raw {
        if let Some(tag) = normalize_tag(tag.as_ref()) {
            push_unique(&mut out, tag);
        }
    }
    out
}

/// Appends `tag` unless an equal tag (ignoring case) is already present.
/// Returns true when the tag was added.
pub fn push_unique(tags: &mut Vec<String>, tag: String) -> bool {
    let lower = tag.to_lowercase();
    if tags.iter().any(|t| t.to_lowercase() == lower) {
        return false;
    }
    tags.push(tag);
    true
}

/// Returns the tag body without its marker.
pub fn tag_body(tag: &str) -> &str {
    tag.trim_start_matches(TAG_MARKER)
}

/// Case-insensitive tag equality on normalized forms.
pub fn same_tag(a: &str, b: &str) -> bool {
    match (normalize_tag(a), normalize_tag(b)) {
        (Some(a), Some(b)) => a.to_lowercase() == b.to_lowercase(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adds_missing_marker() {
        assert_eq!(normalize_tag("strategy").as_deref(), Some("#strategy"));
    }

    #[test]
    fn test_collapses_repeated_markers() {
        assert_eq!(normalize_tag("###strategy").as_deref(), Some("#strategy"));
    }

    #[test]
    fn test_trims_body() {
        assert_eq!(normalize_tag("  #  strategy ").as_deref(), Some("#strategy"));
    }

    #[test]
    fn test_drops_empty_and_marker_only() {
        assert_eq!(normalize_tag(""), None);
        assert_eq!(normalize_tag("#"), None);
        assert_eq!(normalize_tag(" ## "), None);
    }

    #[test]
    fn test_normalize_tags_dedups_ignoring_case() {
        let tags = normalize_tags(["Work", "#work", "", "#", "home"]);
        assert_eq!(tags, vec!["#Work", "#home"]);
    }

    #[test]
    fn test_tag_body_strips_marker() {
        assert_eq!(tag_body("#work"), "work");
        assert_eq!(tag_body("work"), "work");
    }

    #[test]
    fn test_same_tag() {
        assert!(same_tag("work", "#WORK"));
        assert!(!same_tag("work", "#working"));
        assert!(!same_tag("#", "#"));
    }
}
