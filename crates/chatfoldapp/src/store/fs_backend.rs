use super::{ChangeFeed, StorageChange, Subscribers, SyncStorage};
use crate::error::{ChatfoldError, Result};
use crate::model::Library;
use crate::quota::canonical_json;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use uuid::Uuid;

/// File-backed synchronized store: one `<key>.json` per key in `root`.
///
/// Handles cloned from the same `FsStorage` share their subscribers, so in-process
/// instances see each other's writes. Other processes writing the same directory are
/// only noticed on the next explicit re-read.
#[derive(Clone)]
pub struct FsStorage {
    root: PathBuf,
    subscribers: Rc<Subscribers>,
}

impl FsStorage {
    /// Opens (creating if needed) the store directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            subscribers: Rc::new(Subscribers::default()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }

    fn ensure_available(&self) -> Result<()> {
        if !self.is_available() {
            return Err(ChatfoldError::EnvironmentUnavailable);
        }
        Ok(())
    }

    fn read(&self, key: &str) -> Result<Option<Library>> {
        let path = self.key_path(key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ChatfoldError::Io(e)),
        };
        let lib = serde_json::from_str(&content).map_err(ChatfoldError::Serialization)?;
        Ok(Some(lib))
    }
}

impl SyncStorage for FsStorage {
    fn get(&self, key: &str) -> Result<Option<Library>> {
        self.ensure_available()?;
        self.read(key)
    }

    fn set(&self, key: &str, library: &Library) -> Result<()> {
        self.ensure_available()?;
        let old_value = self.read(key).ok().flatten();

        let content = canonical_json(library)?;
        let target = self.key_path(key);
        let tmp_file = self.root.join(format!(".{}-{}.tmp", key, Uuid::now_v7()));
        fs::write(&tmp_file, content).map_err(|e| ChatfoldError::HostWrite(e.to_string()))?;
        if let Err(e) = fs::rename(&tmp_file, &target) {
            let _ = fs::remove_file(&tmp_file);
            return Err(ChatfoldError::HostWrite(e.to_string()));
        }

        self.subscribers.notify(StorageChange {
            key: key.to_string(),
            old_value,
            new_value: Some(library.clone()),
        });
        Ok(())
    }

    fn subscribe(&self) -> Result<ChangeFeed> {
        self.ensure_available()?;
        Ok(self.subscribers.subscribe())
    }

    /// The store directory still exists.
    fn is_available(&self) -> bool {
        self.root.is_dir()
    }
}
