//! Pinned searches: saved queries shown as shortcuts, at most
//! [`MAX_PINNED_SEARCHES`](crate::model::MAX_PINNED_SEARCHES).

use crate::commands::search::{self, SearchOutcome};
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{ChatfoldError, Result};
use crate::model::{Library, PinnedSearch, MAX_PINNED_SEARCHES};

/// Pins `query` under `title` (defaults to the query). Pinning a query that is already
/// pinned changes nothing.
pub fn pin(lib: &mut Library, title: Option<&str>, query: &str) -> Result<CmdResult> {
    let query = query.trim();
    if query.is_empty() {
        return Err(ChatfoldError::Api("Cannot pin an empty search".to_string()));
    }
    if lib.pinned_searches.iter().any(|p| p.query == query) {
        return Ok(CmdResult::default().with_message(CmdMessage::info("Search is already pinned")));
    }
    if lib.pinned_searches.len() >= MAX_PINNED_SEARCHES {
        return Err(ChatfoldError::PinnedSearchLimit(MAX_PINNED_SEARCHES));
    }

    let title = title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(query);
    let pinned = PinnedSearch::new(title, query);
    let message = format!("Pinned '{}'", pinned.title);
    lib.pinned_searches.push(pinned);
    Ok(CmdResult::changed().with_message(CmdMessage::success(message)))
}

fn position(lib: &Library, selector: &str) -> Result<usize> {
    lib.pinned_searches
        .iter()
        .position(|p| p.id == selector)
        .or_else(|| {
            lib.pinned_searches
                .iter()
                .position(|p| p.title.eq_ignore_ascii_case(selector))
        })
        .ok_or_else(|| ChatfoldError::PinnedSearchNotFound(selector.to_string()))
}

/// Removes a pin by id or title.
pub fn unpin(lib: &mut Library, selector: &str) -> Result<CmdResult> {
    let index = position(lib, selector)?;
    let removed = lib.pinned_searches.remove(index);
    Ok(CmdResult::changed().with_message(CmdMessage::success(format!(
        "Unpinned '{}'",
        removed.title
    ))))
}

pub fn rename(lib: &mut Library, selector: &str, title: &str) -> Result<CmdResult> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ChatfoldError::Api("Pin title cannot be empty".to_string()));
    }
    let index = position(lib, selector)?;
    let pinned = &mut lib.pinned_searches[index];
    if pinned.title == title {
        return Ok(CmdResult::default());
    }
    pinned.title = title.to_string();
    Ok(CmdResult::changed().with_message(CmdMessage::success(format!("Renamed pin to '{}'", title))))
}

pub fn list(lib: &Library) -> Vec<PinnedSearch> {
    lib.pinned_searches.clone()
}

/// Runs the pinned query.
pub fn run(lib: &Library, selector: &str) -> Result<SearchOutcome> {
    let index = position(lib, selector)?;
    Ok(search::run(lib, &lib.pinned_searches[index].query))
}
