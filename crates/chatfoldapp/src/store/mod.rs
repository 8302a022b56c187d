//! # Persistence Port
//!
//! chatfold keeps the whole [`Library`] under a single key of a synchronized, quota-limited
//! key-value store. The store is shared by every running instance (several open windows,
//! several devices) while each instance holds its own in-memory copy. The
//! [`SyncStorage`] trait is the seam between the two.
//!
//! ## Contract
//!
//! - `get(key)`: the stored library, or `None` when nothing was ever written.
//! - `set(key, library)`: replace the stored value. Hosts enforce their own quota and may
//!   refuse; that surfaces as [`ChatfoldError::HostWrite`](crate::error::ChatfoldError)
//!   and is never retried.
//! - `subscribe()`: a [`ChangeFeed`] receiving `(key, old, new)` for every accepted
//!   write, **including the subscriber's own writes**. Consumers filter self-triggered
//!   notifications by comparing snapshots (see [`crate::sync`]).
//! - `is_available()`: false once the hosting environment is gone. From then on every
//!   call fails with `EnvironmentUnavailable`.
//!
//! Last write wins. There is no compare-and-swap and no merge.
//!
//! ## Implementations
//!
//! - [`mem_backend::MemStorage`]: shared in-memory store. Clones share state, so a test
//!   can hand one clone to each simulated instance.
//! - [`fs_backend::FsStorage`]: one JSON file per key, written atomically.
//!
//! ```text
//! <data dir>/
//! ├── chatfold.toml     # configuration
//! └── library.json      # the stored Library
//! ```

use crate::model::Library;
use std::cell::RefCell;
use std::sync::mpsc::{channel, Receiver, Sender};

pub mod fs_backend;
pub mod mem_backend;

pub use fs_backend::FsStorage;
pub use mem_backend::MemStorage;

use crate::error::Result;

pub trait SyncStorage {
    fn get(&self, key: &str) -> Result<Option<Library>>;

    /// Replace the value stored under `key` and notify every subscriber.
    fn set(&self, key: &str, library: &Library) -> Result<()>;

    fn subscribe(&self) -> Result<ChangeFeed>;

    fn is_available(&self) -> bool;
}

/// One change notification. `new_value` is `None` when the key was cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    pub key: String,
    pub old_value: Option<Library>,
    pub new_value: Option<Library>,
}

/// Receiving end of a subscription.
pub struct ChangeFeed {
    rx: Receiver<StorageChange>,
}

impl ChangeFeed {
    /// Next pending notification, without blocking.
    pub fn try_next(&self) -> Option<StorageChange> {
        self.rx.try_recv().ok()
    }

    /// All pending notifications, oldest first.
    pub fn drain(&self) -> Vec<StorageChange> {
        self.rx.try_iter().collect()
    }
}

/// Subscriber registry shared by the backends.
#[derive(Default)]
pub(crate) struct Subscribers {
    senders: RefCell<Vec<Sender<StorageChange>>>,
}

impl Subscribers {
    pub(crate) fn subscribe(&self) -> ChangeFeed {
        let (tx, rx) = channel();
        self.senders.borrow_mut().push(tx);
        ChangeFeed { rx }
    }

    /// Delivers `change` to every live subscriber and forgets the dropped ones.
    pub(crate) fn notify(&self, change: StorageChange) {
        self.senders
            .borrow_mut()
            .retain(|tx| tx.send(change.clone()).is_ok());
    }

    pub(crate) fn clear(&self) {
        self.senders.borrow_mut().clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.senders.borrow().len()
    }
}
