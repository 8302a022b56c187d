//! # Sync Reconciler
//!
//! Every running instance holds its own in-memory [`Library`]. The shared store tells
//! each instance about writes through its change feed; the reconciler decides whether
//! the local copy is stale and replaces it wholesale when it is.
//!
//! ## States
//!
//! ```text
//!             startup                 snapshot differs
//!   Loading ───────────▶ Idle ◀──────────────────────── Stale-Detected
//!                         │                                   ▲
//!                         └──── change / focus ───────────────┘
//!                               (identical snapshot: stay Idle, count a skip)
//! ```
//!
//! - **Loading**: the first read at startup. An absent entry becomes an empty library.
//! - **Change notification**: compare the canonical serialization of the notified
//!   snapshot with the in-memory one. Identical means skip. Different means replace and
//!   refresh. This also filters the notifications an instance receives for its own
//!   writes.
//! - **Focus regained**: unconditionally re-read the store, then apply the same check.
//!   This catches notifications missed while the instance was suspended.
//!
//! There is no merge: whatever the store accepted last wins.

use crate::error::Result;
use crate::model::Library;
use crate::quota::canonical_json;
use crate::store::{StorageChange, SyncStorage};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncState {
    #[default]
    Idle,
    Loading,
    StaleDetected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The incoming snapshot equals the in-memory one.
    Skipped,
    /// The in-memory library was replaced.
    Refreshed,
    /// The notification was for another key.
    Ignored,
}

/// Per-instance counters, reset on startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionCounters {
    pub refreshes: u64,
    pub skips: u64,
    pub last_refresh_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub struct Reconciler {
    key: String,
    state: SyncState,
    counters: SessionCounters,
}

impl Reconciler {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn counters(&self) -> SessionCounters {
        self.counters
    }

    /// Startup read. Missing data initializes an empty library.
    pub fn load<S: SyncStorage>(&mut self, storage: &S) -> Result<Library> {
        self.state = SyncState::Loading;
        let loaded = storage.get(&self.key);
        self.state = SyncState::Idle;
        match loaded? {
            Some(lib) => {
                debug!(
                    key = %self.key,
                    folders = lib.folders.len(),
                    chats = lib.all_chats.len(),
                    "Loaded library"
                );
                Ok(lib)
            }
            None => {
                debug!(key = %self.key, "No stored library, starting empty");
                Ok(Library::new())
            }
        }
    }

    /// Replaces `current` with `incoming` unless they serialize identically.
    pub fn apply_snapshot(&mut self, current: &mut Library, incoming: Library) -> Result<SyncOutcome> {
        if canonical_json(&incoming)? == canonical_json(current)? {
            self.counters.skips += 1;
            debug!(skips = self.counters.skips, "Snapshot unchanged, skipping refresh");
            return Ok(SyncOutcome::Skipped);
        }

        self.state = SyncState::StaleDetected;
        *current = incoming;
        self.counters.refreshes += 1;
        self.counters.last_refresh_at = Some(Utc::now());
        self.state = SyncState::Idle;
        info!(
            refreshes = self.counters.refreshes,
            folders = current.folders.len(),
            chats = current.all_chats.len(),
            "Stale library replaced"
        );
        Ok(SyncOutcome::Refreshed)
    }

    /// Handles one change notification. A cleared key counts as an empty library.
    pub fn on_change(&mut self, current: &mut Library, change: StorageChange) -> Result<SyncOutcome> {
        if change.key != self.key {
            return Ok(SyncOutcome::Ignored);
        }
        self.apply_snapshot(current, change.new_value.unwrap_or_default())
    }

    /// Handles every notification drained since the last pump.
    ///
    /// Only the newest change for this key matters: earlier ones describe states the
    /// store has already moved past, and comparing them against the current library
    /// would roll a writer back to its own older snapshot.
    pub fn on_changes(
        &mut self,
        current: &mut Library,
        changes: Vec<StorageChange>,
    ) -> Result<SyncOutcome> {
        let superseded = changes.len();
        let Some(latest) = changes.into_iter().rev().find(|c| c.key == self.key) else {
            return Ok(SyncOutcome::Ignored);
        };
        if superseded > 1 {
            debug!(pending = superseded, "Collapsing change notifications to the newest");
        }
        self.on_change(current, latest)
    }

    /// Focus regained: re-read the store and reconcile.
    pub fn on_focus<S: SyncStorage>(&mut self, storage: &S, current: &mut Library) -> Result<SyncOutcome> {
        let incoming = storage.get(&self.key)?.unwrap_or_default();
        self.apply_snapshot(current, incoming)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChatRecord, Folder};
    use crate::store::MemStorage;

    fn with_folder(name: &str) -> Library {
        let mut lib = Library::new();
        lib.folders.push(Folder::new(name));
        lib
    }

    #[test]
    fn test_load_missing_key_starts_empty() {
        let store = MemStorage::new();
        let mut reconciler = Reconciler::new("library");
        let lib = reconciler.load(&store).unwrap();
        assert!(lib.is_empty());
        assert_eq!(reconciler.state(), SyncState::Idle);
    }

    #[test]
    fn test_identical_snapshot_is_skipped() {
        let mut current = with_folder("A");
        let snapshot = current.clone();
        let mut reconciler = Reconciler::new("library");
        let outcome = reconciler.apply_snapshot(&mut current, snapshot).unwrap();
        assert_eq!(outcome, SyncOutcome::Skipped);
        assert_eq!(reconciler.counters().skips, 1);
        assert_eq!(reconciler.counters().refreshes, 0);
    }

    #[test]
    fn test_different_snapshot_replaces_wholesale() {
        let mut current = with_folder("A");
        let mut incoming = with_folder("B");
        incoming
            .all_chats
            .insert("c1".into(), ChatRecord::new("c1", "x"));
        let mut reconciler = Reconciler::new("library");

        let outcome = reconciler
            .apply_snapshot(&mut current, incoming.clone())
            .unwrap();
        assert_eq!(outcome, SyncOutcome::Refreshed);
        assert_eq!(current, incoming);
        assert_eq!(reconciler.state(), SyncState::Idle);
        assert_eq!(reconciler.counters().refreshes, 1);
        assert!(reconciler.counters().last_refresh_at.is_some());
    }

    #[test]
    fn test_other_keys_are_ignored() {
        let mut current = with_folder("A");
        let mut reconciler = Reconciler::new("library");
        let change = StorageChange {
            key: "settings".into(),
            old_value: None,
            new_value: None,
        };
        assert_eq!(
            reconciler.on_change(&mut current, change).unwrap(),
            SyncOutcome::Ignored
        );
        assert_eq!(current.folders.len(), 1);
    }

    #[test]
    fn test_cleared_key_becomes_empty_library() {
        let mut current = with_folder("A");
        let mut reconciler = Reconciler::new("library");
        let change = StorageChange {
            key: "library".into(),
            old_value: None,
            new_value: None,
        };
        assert_eq!(
            reconciler.on_change(&mut current, change).unwrap(),
            SyncOutcome::Refreshed
        );
        assert!(current.is_empty());
    }

    #[test]
    fn test_focus_rereads_store() {
        let store = MemStorage::new();
        let stored = with_folder("Remote");
        store.set("library", &stored).unwrap();

        let mut current = Library::new();
        let mut reconciler = Reconciler::new("library");
        assert_eq!(
            reconciler.on_focus(&store, &mut current).unwrap(),
            SyncOutcome::Refreshed
        );
        assert_eq!(current, stored);
        assert_eq!(
            reconciler.on_focus(&store, &mut current).unwrap(),
            SyncOutcome::Skipped
        );
    }

    #[test]
    fn test_batch_reconciles_only_the_newest_change() {
        let first = with_folder("A");
        let mut second = first.clone();
        second.folders.push(Folder::new("B"));
        let change = |old: Option<Library>, new: Library| StorageChange {
            key: "library".into(),
            old_value: old,
            new_value: Some(new),
        };

        // The writer already holds `second`; its echo of `first` must not roll it back
        let mut current = second.clone();
        let mut reconciler = Reconciler::new("library");
        let batch = vec![
            change(None, first.clone()),
            change(Some(first.clone()), second.clone()),
        ];
        assert_eq!(
            reconciler.on_changes(&mut current, batch).unwrap(),
            SyncOutcome::Skipped
        );
        assert_eq!(current, second);
        assert_eq!(reconciler.counters().refreshes, 0);
        assert_eq!(reconciler.counters().skips, 1);
    }

    #[test]
    fn test_empty_or_foreign_batch_is_ignored() {
        let mut current = with_folder("A");
        let mut reconciler = Reconciler::new("library");
        assert_eq!(
            reconciler.on_changes(&mut current, Vec::new()).unwrap(),
            SyncOutcome::Ignored
        );
        let foreign = StorageChange {
            key: "settings".into(),
            old_value: None,
            new_value: None,
        };
        assert_eq!(
            reconciler.on_changes(&mut current, vec![foreign]).unwrap(),
            SyncOutcome::Ignored
        );
        assert_eq!(current.folders.len(), 1);
    }
}
