use super::{ChangeFeed, StorageChange, Subscribers, SyncStorage};
use crate::error::{ChatfoldError, Result};
use crate::model::Library;
use crate::quota::canonical_json;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Default)]
struct Shared {
    entries: RefCell<HashMap<String, String>>,
    host_quota: Cell<Option<usize>>,
    simulate_write_error: Cell<bool>,
    torn_down: Cell<bool>,
    subscribers: Subscribers,
}

/// In-memory synchronized store.
///
/// Uses `Rc<RefCell>` since chatfold is single-threaded. Cloning the handle shares the
/// underlying store, which is how tests run several instances against one host.
/// Values are kept serialized, as a real host would keep them.
#[derive(Clone, Default)]
pub struct MemStorage {
    shared: Rc<Shared>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host-side byte limit, checked independently of the gatekeeper.
    pub fn with_host_quota(self, bytes: usize) -> Self {
        self.shared.host_quota.set(Some(bytes));
        self
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.shared.simulate_write_error.set(simulate);
    }

    /// Simulates the hosting environment going away. Every later call fails with
    /// `EnvironmentUnavailable` and existing feeds stop receiving.
    pub fn tear_down(&self) {
        self.shared.torn_down.set(true);
        self.shared.subscribers.clear();
    }

    /// Clears a key, notifying subscribers with an empty new value.
    pub fn remove(&self, key: &str) -> Result<()> {
        self.ensure_available()?;
        let old = self.shared.entries.borrow_mut().remove(key);
        let old_value = old.map(|raw| serde_json::from_str(&raw)).transpose()?;
        self.shared.subscribers.notify(StorageChange {
            key: key.to_string(),
            old_value,
            new_value: None,
        });
        Ok(())
    }

    /// Raw stored bytes for `key`.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.shared.entries.borrow().get(key).cloned()
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.subscribers.len()
    }

    fn ensure_available(&self) -> Result<()> {
        if self.shared.torn_down.get() {
            return Err(ChatfoldError::EnvironmentUnavailable);
        }
        Ok(())
    }
}

impl SyncStorage for MemStorage {
    fn get(&self, key: &str) -> Result<Option<Library>> {
        self.ensure_available()?;
        let entries = self.shared.entries.borrow();
        match entries.get(key) {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, library: &Library) -> Result<()> {
        self.ensure_available()?;
        if self.shared.simulate_write_error.get() {
            return Err(ChatfoldError::HostWrite("Simulated write error".to_string()));
        }

        let raw = canonical_json(library)?;
        if let Some(limit) = self.shared.host_quota.get() {
            if raw.len() > limit {
                return Err(ChatfoldError::HostWrite(format!(
                    "host quota of {} bytes exceeded ({} bytes)",
                    limit,
                    raw.len()
                )));
            }
        }

        let old = self
            .shared
            .entries
            .borrow_mut()
            .insert(key.to_string(), raw);
        let old_value = old.and_then(|raw| serde_json::from_str(&raw).ok());

        self.shared.subscribers.notify(StorageChange {
            key: key.to_string(),
            old_value,
            new_value: Some(library.clone()),
        });
        Ok(())
    }

    fn subscribe(&self) -> Result<ChangeFeed> {
        self.ensure_available()?;
        Ok(self.shared.subscribers.subscribe())
    }

    fn is_available(&self) -> bool {
        !self.shared.torn_down.get()
    }
}
