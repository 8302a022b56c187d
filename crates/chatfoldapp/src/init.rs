//! # Context Initialization
//!
//! Resolves where the library lives, loads configuration from the same place, and opens
//! an [`ChatfoldApi`] over the file store.
//!
//! ## Data Directory Resolution
//!
//! 1. An explicit `data_override` (the CLI's `--data` flag)
//! 2. The `CHATFOLD_DATA` environment variable (mostly for tests)
//! 3. The OS data directory via the `directories` crate
//!
//! The directory is created when missing. `chatfold.toml` is looked up inside it and
//! merged over the compiled defaults; a missing or unreadable file falls back to defaults.

use crate::api::ChatfoldApi;
use crate::config::ChatfoldConfig;
use crate::error::{ChatfoldError, Result};
use crate::store::FsStorage;
use clapfig::{Clapfig, SearchMode, SearchPath};
use directories::ProjectDirs;
use std::path::PathBuf;
use tracing::debug;

pub const DATA_DIR_ENV: &str = "CHATFOLD_DATA";

pub struct ChatfoldContext {
    pub api: ChatfoldApi<FsStorage>,
    pub config: ChatfoldConfig,
    pub data_dir: PathBuf,
}

/// Picks the data directory without touching the filesystem.
pub fn resolve_data_dir(data_override: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = data_override {
        return Ok(path);
    }
    if let Some(path) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    ProjectDirs::from("com", "chatfold", "chatfold")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| ChatfoldError::Config("could not determine a data directory".to_string()))
}

pub fn load_config(data_dir: &std::path::Path) -> ChatfoldConfig {
    Clapfig::builder()
        .app_name("chatfold")
        .file_name("chatfold.toml")
        .search_paths(vec![SearchPath::Path(data_dir.to_path_buf())])
        .search_mode(SearchMode::Merge)
        .load()
        .unwrap_or_default()
}

/// Opens the library for this process.
///
/// ```ignore
/// let ctx = initialize(None)?;                                  // OS data dir
/// let ctx = initialize(Some(PathBuf::from("/tmp/chatfold")))?;  // explicit
/// ```
pub fn initialize(data_override: Option<PathBuf>) -> Result<ChatfoldContext> {
    let data_dir = resolve_data_dir(data_override)?;
    let storage = FsStorage::new(&data_dir)?;
    let config = load_config(&data_dir);
    debug!(root = %storage.root().display(), key = %config.storage_key, "Initializing chatfold");

    let api = ChatfoldApi::open(storage, config.clone())?;
    Ok(ChatfoldContext {
        api,
        config,
        data_dir,
    })
}
