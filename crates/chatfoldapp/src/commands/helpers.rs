use crate::error::{ChatfoldError, Result};
use crate::model::Library;
use crate::tree;

/// Separator for folder paths typed by users: `Research/Drafts`.
pub const PATH_SEPARATOR: char = '/';

/// Resolves a folder selector to a folder id.
///
/// Accepted forms, tried in order:
/// 1. An exact folder id
/// 2. A slash-separated path of names from the root (`Research/Drafts`)
/// 3. A bare name, if it is unique across the tree
///
/// Name comparisons ignore case.
pub fn resolve_folder(lib: &Library, selector: &str) -> Result<String> {
    let selector = selector.trim();
    if tree::contains(&lib.folders, selector) {
        return Ok(selector.to_string());
    }

    let wanted: Vec<String> = selector
        .split(PATH_SEPARATOR)
        .map(|part| part.trim().to_lowercase())
        .filter(|part| !part.is_empty())
        .collect();
    if wanted.is_empty() {
        return Err(ChatfoldError::FolderNotFound(selector.to_string()));
    }

    let visits = tree::walk(&lib.folders);

    let by_path: Vec<&str> = visits
        .iter()
        .filter(|v| {
            v.path.len() == wanted.len()
                && v.path.iter().zip(&wanted).all(|(a, b)| a.to_lowercase() == *b)
        })
        .map(|v| v.folder.id.as_str())
        .collect();
    if let Some(result) = single(by_path, selector)? {
        return Ok(result);
    }

    if wanted.len() == 1 {
        let by_name: Vec<&str> = visits
            .iter()
            .filter(|v| v.folder.name.to_lowercase() == wanted[0])
            .map(|v| v.folder.id.as_str())
            .collect();
        if let Some(result) = single(by_name, selector)? {
            return Ok(result);
        }
    }

    Err(ChatfoldError::FolderNotFound(selector.to_string()))
}

fn single(matches: Vec<&str>, selector: &str) -> Result<Option<String>> {
    match matches.len() {
        0 => Ok(None),
        1 => Ok(Some(matches[0].to_string())),
        n => Err(ChatfoldError::Api(format!(
            "'{}' matches {} folders, use a full path or the folder id",
            selector, n
        ))),
    }
}

/// Resolves a chat selector (id, or a unique exact title ignoring case) to a chat id.
pub fn resolve_chat(lib: &Library, selector: &str) -> Result<String> {
    let selector = selector.trim();
    if lib.all_chats.contains_key(selector) {
        return Ok(selector.to_string());
    }
    let lower = selector.to_lowercase();
    let matches: Vec<&str> = lib
        .all_chats
        .values()
        .filter(|chat| chat.title.to_lowercase() == lower)
        .map(|chat| chat.id.as_str())
        .collect();
    match matches.len() {
        1 => Ok(matches[0].to_string()),
        0 => Err(ChatfoldError::ChatNotFound(selector.to_string())),
        n => Err(ChatfoldError::Api(format!(
            "'{}' matches {} chats, use the chat id",
            selector, n
        ))),
    }
}

/// Breadcrumb for display: `Research > Drafts`.
pub fn display_path(path: &[&str]) -> String {
    path.join(" > ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChatRecord, Folder};

    fn sample() -> Library {
        let mut lib = Library::new();
        let mut research = Folder::new("Research");
        research.subfolders.push(Folder::new("Drafts"));
        let mut work = Folder::new("Work");
        work.subfolders.push(Folder::new("Drafts"));
        lib.folders.push(research);
        lib.folders.push(work);
        lib.all_chats
            .insert("c1".into(), ChatRecord::new("c1", "Pricing Study"));
        lib.all_chats.insert("c2".into(), ChatRecord::new("c2", "Dup"));
        lib.all_chats.insert("c3".into(), ChatRecord::new("c3", "dup"));
        lib
    }

    #[test]
    fn test_resolve_by_id() {
        let lib = sample();
        let id = lib.folders[1].id.clone();
        assert_eq!(resolve_folder(&lib, &id).unwrap(), id);
    }

    #[test]
    fn test_resolve_by_path_ignoring_case() {
        let lib = sample();
        let expected = lib.folders[0].subfolders[0].id.clone();
        assert_eq!(resolve_folder(&lib, "research/DRAFTS").unwrap(), expected);
        assert_eq!(resolve_folder(&lib, " Research / Drafts ").unwrap(), expected);
    }

    #[test]
    fn test_resolve_unique_bare_name() {
        let lib = sample();
        assert_eq!(
            resolve_folder(&lib, "work").unwrap(),
            lib.folders[1].id.clone()
        );
    }

    #[test]
    fn test_ambiguous_bare_name() {
        let lib = sample();
        assert!(matches!(
            resolve_folder(&lib, "Drafts"),
            Err(ChatfoldError::Api(_))
        ));
    }

    #[test]
    fn test_missing_folder() {
        let lib = sample();
        assert!(matches!(
            resolve_folder(&lib, "Nope/Drafts"),
            Err(ChatfoldError::FolderNotFound(_))
        ));
        assert!(matches!(
            resolve_folder(&lib, "/"),
            Err(ChatfoldError::FolderNotFound(_))
        ));
    }

    #[test]
    fn test_resolve_chat() {
        let lib = sample();
        assert_eq!(resolve_chat(&lib, "c1").unwrap(), "c1");
        assert_eq!(resolve_chat(&lib, "pricing study").unwrap(), "c1");
        assert!(matches!(resolve_chat(&lib, "DUP"), Err(ChatfoldError::Api(_))));
        assert!(matches!(
            resolve_chat(&lib, "missing"),
            Err(ChatfoldError::ChatNotFound(_))
        ));
    }
}
