//! # API Facade
//!
//! [`ChatfoldApi`] is the single coordinating component of a running chatfold instance.
//! It owns the in-memory [`Library`], the storage handle, the sync reconciler (with the
//! session counters) and the change feed. Every UI goes through it.
//!
//! ## Role and Responsibilities
//!
//! The facade:
//! - **Resolves selectors**: folders by id or path, chats by id or title
//!   (see [`crate::commands::helpers`])
//! - **Dispatches** to the command layer
//! - **Runs the save path** after every command that changed the library
//! - **Delivers inbound sync messages**: [`pump_changes`](ChatfoldApi::pump_changes)
//!   and [`on_focus`](ChatfoldApi::on_focus)
//!
//! Business logic stays in `commands/*.rs`.
//!
//! ## The Save Path
//!
//! ```text
//! command mutates Library ──▶ changed? ──▶ Quota Gatekeeper ──▶ storage.set
//!                                 │ no           │ rejected          │ host error
//!                                 ▼              ▼                   ▼
//!                               done      QuotaExceeded          HostWrite
//! ```
//!
//! On either failure the in-memory change stays visible but is never committed; the
//! next reload from storage discards it. Nothing is retried.
//!
//! ## Environment Teardown
//!
//! Once the storage reports itself unavailable, every call becomes a silent no-op that
//! returns an empty result. The instance is going away and must not fail loudly.
//!
//! ## Generic Over SyncStorage
//!
//! - Production: `ChatfoldApi<FsStorage>`
//! - Testing: `ChatfoldApi<MemStorage>`, several instances sharing one store

use crate::commands::chats::{FolderBadge, UnlinkPreview};
use crate::commands::diagnostics::DiagnosticReport;
use crate::commands::export::ExportFormat;
use crate::commands::folders::FolderRow;
use crate::commands::helpers::{resolve_chat, resolve_folder};
use crate::commands::search::SearchOutcome;
use crate::commands::tags::TagCount;
use crate::commands::{self, CmdResult};
use crate::config::ChatfoldConfig;
use crate::error::{ChatfoldError, Result};
use crate::model::{ChatMeta, ChatRecord, Library, PinnedSearch, SortOrder};
use crate::quota::QuotaPolicy;
use crate::store::{ChangeFeed, SyncStorage};
use crate::sync::{Reconciler, SessionCounters, SyncOutcome, SyncState};
use chrono::Utc;
use tracing::{debug, warn};

/// The main API facade for chatfold operations.
pub struct ChatfoldApi<S: SyncStorage> {
    storage: S,
    library: Library,
    reconciler: Reconciler,
    feed: Option<ChangeFeed>,
    config: ChatfoldConfig,
    policy: QuotaPolicy,
}

impl<S: SyncStorage> ChatfoldApi<S> {
    /// Subscribes to the store and loads the library. An unavailable store yields an
    /// inert instance rather than an error.
    pub fn open(storage: S, config: ChatfoldConfig) -> Result<Self> {
        let mut reconciler = Reconciler::new(config.storage_key.clone());
        let policy = config.quota_policy();

        let (feed, library) = if storage.is_available() {
            let feed = storage.subscribe()?;
            let library = reconciler.load(&storage)?;
            (Some(feed), library)
        } else {
            warn!("Storage unavailable at startup, running inert");
            (None, Library::new())
        };

        Ok(Self {
            storage,
            library,
            reconciler,
            feed,
            config,
            policy,
        })
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn config(&self) -> &ChatfoldConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn sync_state(&self) -> SyncState {
        self.reconciler.state()
    }

    pub fn session(&self) -> SessionCounters {
        self.reconciler.counters()
    }

    fn is_live(&self) -> bool {
        self.storage.is_available()
    }

    /// Runs a mutating command and, if it changed anything, the save path.
    fn mutate<F>(&mut self, op: F) -> Result<CmdResult>
    where
        F: FnOnce(&mut Library) -> Result<CmdResult>,
    {
        if !self.is_live() {
            debug!("Storage unavailable, ignoring mutation");
            return Ok(CmdResult::default());
        }
        let result = op(&mut self.library)?;
        if result.changed {
            self.persist()?;
        }
        Ok(result)
    }

    fn read<T, F>(&self, op: F) -> Result<T>
    where
        T: Default,
        F: FnOnce(&Library) -> Result<T>,
    {
        if !self.is_live() {
            return Ok(T::default());
        }
        op(&self.library)
    }

    fn persist(&mut self) -> Result<()> {
        let measured = match self.policy.ensure_fits(&self.library) {
            Ok(measured) => measured,
            Err(e) => {
                warn!(error = %e, "Save rejected by quota gatekeeper");
                return Err(e);
            }
        };
        match self.storage.set(self.reconciler.key(), &self.library) {
            Ok(()) => {
                debug!(bytes = measured, "Library saved");
                Ok(())
            }
            Err(ChatfoldError::EnvironmentUnavailable) => {
                warn!("Storage went away during save, dropping write");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Storage rejected save");
                Err(e)
            }
        }
    }

    // --- Sync ---

    /// Drains pending change notifications and reconciles against the newest one.
    pub fn pump_changes(&mut self) -> Result<SyncOutcome> {
        if !self.is_live() {
            return Ok(SyncOutcome::Ignored);
        }
        let Some(feed) = &self.feed else {
            return Ok(SyncOutcome::Ignored);
        };
        let changes = feed.drain();
        self.reconciler.on_changes(&mut self.library, changes)
    }

    /// The instance became active again: re-read storage.
    pub fn on_focus(&mut self) -> Result<SyncOutcome> {
        if !self.is_live() {
            return Ok(SyncOutcome::Ignored);
        }
        match self.reconciler.on_focus(&self.storage, &mut self.library) {
            Err(ChatfoldError::EnvironmentUnavailable) => Ok(SyncOutcome::Ignored),
            other => other,
        }
    }

    // --- Folders ---

    /// Creates a folder under `parent` (a folder selector), or at the root.
    pub fn create_folder(&mut self, parent: Option<&str>, name: &str) -> Result<CmdResult> {
        self.mutate(|lib| {
            let parent_id = parent.map(|p| resolve_folder(lib, p)).transpose()?;
            commands::folders::create(lib, parent_id.as_deref(), name)
        })
    }

    pub fn rename_folder(&mut self, folder: &str, name: &str) -> Result<CmdResult> {
        self.mutate(|lib| {
            let id = resolve_folder(lib, folder)?;
            commands::folders::rename(lib, &id, name)
        })
    }

    pub fn move_folder(&mut self, folder: &str, destination: Option<&str>) -> Result<CmdResult> {
        self.mutate(|lib| {
            let id = resolve_folder(lib, folder)?;
            let dest = destination.map(|d| resolve_folder(lib, d)).transpose()?;
            commands::folders::move_to(lib, &id, dest.as_deref())
        })
    }

    pub fn delete_folder(&mut self, folder: &str) -> Result<CmdResult> {
        self.mutate(|lib| {
            let id = resolve_folder(lib, folder)?;
            commands::folders::delete(lib, &id)
        })
    }

    pub fn set_folder_note(&mut self, folder: &str, note: Option<&str>) -> Result<CmdResult> {
        self.mutate(|lib| {
            let id = resolve_folder(lib, folder)?;
            commands::folders::set_note(lib, &id, note)
        })
    }

    pub fn set_folder_sort(&mut self, folder: &str, order: SortOrder) -> Result<CmdResult> {
        self.mutate(|lib| {
            let id = resolve_folder(lib, folder)?;
            commands::folders::set_sort(lib, &id, order)
        })
    }

    pub fn folder_rows(&self) -> Result<Vec<FolderRow>> {
        self.read(|lib| Ok(commands::folders::rows(lib)))
    }

    pub fn folder_chats(&self, folder: &str) -> Result<Vec<ChatRecord>> {
        self.read(|lib| {
            let id = resolve_folder(lib, folder)?;
            commands::folders::list_chats(lib, &id)
        })
    }

    // --- Chats ---

    pub fn save_chat(&mut self, folder: &str, meta: ChatMeta) -> Result<CmdResult> {
        self.mutate(|lib| {
            let id = resolve_folder(lib, folder)?;
            commands::chats::save(lib, &id, meta)
        })
    }

    pub fn chat(&self, chat: &str) -> Result<Option<ChatRecord>> {
        self.read(|lib| {
            let id = resolve_chat(lib, chat)?;
            Ok(lib.chat(&id).cloned())
        })
    }

    pub fn unlink_preview(&self, folder: &str, chat: &str) -> Result<UnlinkPreview> {
        self.read(|lib| {
            let folder_id = resolve_folder(lib, folder)?;
            let chat_id = resolve_chat(lib, chat)?;
            commands::chats::unlink_preview(lib, &folder_id, &chat_id)
        })
    }

    /// Removes a chat from one folder. Pass `reclaim` once the user confirmed deleting a
    /// chat that would otherwise be left unlinked.
    pub fn unlink_chat(&mut self, folder: &str, chat: &str, reclaim: bool) -> Result<CmdResult> {
        self.mutate(|lib| {
            let folder_id = resolve_folder(lib, folder)?;
            let chat_id = resolve_chat(lib, chat)?;
            commands::chats::unlink(lib, &folder_id, &chat_id, reclaim)
        })
    }

    pub fn delete_chat(&mut self, chat: &str) -> Result<CmdResult> {
        self.mutate(|lib| {
            let id = resolve_chat(lib, chat)?;
            commands::chats::delete(lib, &id)
        })
    }

    pub fn rename_chat(&mut self, chat: &str, title: &str) -> Result<CmdResult> {
        self.mutate(|lib| {
            let id = resolve_chat(lib, chat)?;
            commands::chats::rename(lib, &id, title)
        })
    }

    pub fn set_chat_note(&mut self, chat: &str, note: Option<&str>) -> Result<CmdResult> {
        self.mutate(|lib| {
            let id = resolve_chat(lib, chat)?;
            commands::chats::set_note(lib, &id, note)
        })
    }

    pub fn tag_chat(&mut self, chat: &str, tags: &[String]) -> Result<CmdResult> {
        self.mutate(|lib| {
            let id = resolve_chat(lib, chat)?;
            commands::chats::add_tags(lib, &id, tags)
        })
    }

    pub fn untag_chat(&mut self, chat: &str, tags: &[String]) -> Result<CmdResult> {
        self.mutate(|lib| {
            let id = resolve_chat(lib, chat)?;
            commands::chats::remove_tags(lib, &id, tags)
        })
    }

    pub fn chat_locations(&self, chat: &str) -> Result<Vec<FolderBadge>> {
        self.read(|lib| {
            let id = resolve_chat(lib, chat)?;
            Ok(commands::chats::locations(lib, &id))
        })
    }

    // --- Search & pins ---

    pub fn search(&self, query: &str) -> Result<SearchOutcome> {
        self.read(|lib| Ok(commands::search::run(lib, query)))
    }

    pub fn pin_search(&mut self, title: Option<&str>, query: &str) -> Result<CmdResult> {
        self.mutate(|lib| commands::pins::pin(lib, title, query))
    }

    pub fn unpin_search(&mut self, pin: &str) -> Result<CmdResult> {
        self.mutate(|lib| commands::pins::unpin(lib, pin))
    }

    pub fn rename_pin(&mut self, pin: &str, title: &str) -> Result<CmdResult> {
        self.mutate(|lib| commands::pins::rename(lib, pin, title))
    }

    pub fn pins(&self) -> Result<Vec<PinnedSearch>> {
        self.read(|lib| Ok(commands::pins::list(lib)))
    }

    pub fn run_pin(&self, pin: &str) -> Result<SearchOutcome> {
        self.read(|lib| commands::pins::run(lib, pin))
    }

    // --- Tags ---

    pub fn tags(&self) -> Result<Vec<TagCount>> {
        self.read(|lib| Ok(commands::tags::list_tags(lib)))
    }

    pub fn rename_tag(&mut self, old: &str, new: &str) -> Result<CmdResult> {
        self.mutate(|lib| commands::tags::rename_tag(lib, old, new))
    }

    pub fn delete_tag(&mut self, tag: &str) -> Result<CmdResult> {
        self.mutate(|lib| commands::tags::delete_tag(lib, tag))
    }

    // --- Garbage collection ---

    pub fn unlinked(&self) -> Result<Vec<ChatRecord>> {
        self.read(|lib| Ok(commands::cleanup::list_unlinked(lib)))
    }

    /// Ids `prune` would delete. An empty `chats` means every unlinked chat.
    pub fn prune_preview(&self, chats: &[String]) -> Result<Vec<String>> {
        self.read(|lib| {
            let ids = resolve_chats(lib, chats)?;
            Ok(commands::cleanup::prune_preview(lib, &ids))
        })
    }

    pub fn prune(&mut self, chats: &[String]) -> Result<CmdResult> {
        self.mutate(|lib| {
            let ids = resolve_chats(lib, chats)?;
            commands::cleanup::prune(lib, &ids)
        })
    }

    pub fn archive_unlinked(&mut self) -> Result<CmdResult> {
        let prefix = self.config.archive_folder_prefix.clone();
        let today = Utc::now().date_naive();
        self.mutate(|lib| commands::cleanup::archive(lib, &prefix, today))
    }

    // --- Import / export ---

    pub fn export(&self, format: ExportFormat) -> Result<String> {
        let template = self.config.chat_url_template.as_str();
        self.read(|lib| commands::export::render(lib, format, template))
    }

    pub fn import_backup(&mut self, raw: &str) -> Result<CmdResult> {
        self.mutate(|lib| commands::import::import_backup(lib, raw))
    }

    pub fn import_links(&mut self, folder: &str, text: &str) -> Result<CmdResult> {
        let template = self.config.chat_url_template.clone();
        self.mutate(|lib| {
            let id = resolve_folder(lib, folder)?;
            commands::import::import_links(lib, &id, text, &template)
        })
    }

    // --- Diagnostics ---

    pub fn diagnostics(&self) -> Result<DiagnosticReport> {
        let state = self.reconciler.state();
        let session = self.reconciler.counters();
        self.read(|lib| commands::diagnostics::run(lib, &self.policy, state, session))
    }
}

fn resolve_chats(lib: &Library, selectors: &[String]) -> Result<Vec<String>> {
    selectors.iter().map(|s| resolve_chat(lib, s)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStorage;

    fn api() -> ChatfoldApi<MemStorage> {
        ChatfoldApi::open(MemStorage::new(), ChatfoldConfig::default()).unwrap()
    }

    #[test]
    fn test_mutations_are_persisted() {
        let mut api = api();
        api.create_folder(None, "Research").unwrap();
        let stored = api.storage().get("library").unwrap().unwrap();
        assert_eq!(&stored, api.library());
    }

    #[test]
    fn test_unchanged_results_skip_the_save_path() {
        let mut api = api();
        api.create_folder(None, "Research").unwrap();
        api.storage().set_simulate_write_error(true);
        // Renaming to the same name changes nothing, so nothing is written
        assert!(api.rename_folder("Research", "Research").is_ok());
        assert!(api.rename_folder("Research", "Other").is_err());
    }

    #[test]
    fn test_selectors_resolve_paths_and_titles() {
        let mut api = api();
        api.create_folder(None, "Research").unwrap();
        api.create_folder(Some("Research"), "Drafts").unwrap();
        api.save_chat("Research/Drafts", ChatMeta::new("c1", "Pricing Study"))
            .unwrap();
        api.tag_chat("pricing study", &["strategy".to_string()])
            .unwrap();
        let badges = api.chat_locations("c1").unwrap();
        assert_eq!(badges[0].path, "Research > Drafts");
        assert_eq!(api.chat("c1").unwrap().unwrap().tags, vec!["#strategy"]);
    }

    #[test]
    fn test_quota_rejection_keeps_store_untouched() {
        let config = ChatfoldConfig {
            quota_bytes: 300,
            safety_buffer_bytes: 0,
            ..Default::default()
        };
        let mut api = ChatfoldApi::open(MemStorage::new(), config).unwrap();
        api.create_folder(None, "A").unwrap();
        let committed = api.storage().raw("library").unwrap();

        let err = api
            .save_chat("A", ChatMeta::new("c1", "x".repeat(400)))
            .unwrap_err();
        assert!(matches!(err, ChatfoldError::QuotaExceeded { .. }));
        assert_eq!(api.storage().raw("library").unwrap(), committed);
        // Still visible locally until the next reload
        assert!(api.library().all_chats.contains_key("c1"));

        api.on_focus().unwrap();
        assert!(api.library().all_chats.is_empty());
    }

    #[test]
    fn test_host_write_failure_is_reported() {
        let mut api = api();
        api.storage().set_simulate_write_error(true);
        assert!(matches!(
            api.create_folder(None, "A"),
            Err(ChatfoldError::HostWrite(_))
        ));
    }

    #[test]
    fn test_own_writes_are_skipped_by_pump() {
        let mut api = api();
        api.create_folder(None, "A").unwrap();
        assert_eq!(api.pump_changes().unwrap(), SyncOutcome::Skipped);
        assert_eq!(api.session().skips, 1);
    }

    #[test]
    fn test_several_own_writes_never_roll_back() {
        let mut api = api();
        api.create_folder(None, "A").unwrap();
        api.create_folder(None, "B").unwrap();
        let latest = api.library().clone();

        assert_eq!(api.pump_changes().unwrap(), SyncOutcome::Skipped);
        assert_eq!(api.library(), &latest);
        assert_eq!(api.session().refreshes, 0);
        assert_eq!(api.session().skips, 1);
    }

    #[test]
    fn test_teardown_turns_everything_into_noops() {
        let mut api = api();
        api.create_folder(None, "A").unwrap();
        api.storage().tear_down();

        let result = api.create_folder(None, "B").unwrap();
        assert!(!result.changed);
        assert!(result.messages.is_empty());
        assert!(api.folder_rows().unwrap().is_empty());
        assert_eq!(api.search("x").unwrap(), SearchOutcome::Dashboard);
        assert_eq!(api.pump_changes().unwrap(), SyncOutcome::Ignored);
        assert_eq!(api.on_focus().unwrap(), SyncOutcome::Ignored);
        assert_eq!(api.diagnostics().unwrap(), DiagnosticReport::default());
        // Errors that would normally surface are swallowed too
        assert!(api.delete_folder("does-not-exist").is_ok());
    }

    #[test]
    fn test_open_on_unavailable_storage() {
        let storage = MemStorage::new();
        storage.tear_down();
        let mut api = ChatfoldApi::open(storage, ChatfoldConfig::default()).unwrap();
        assert!(api.library().is_empty());
        assert!(!api.create_folder(None, "A").unwrap().changed);
    }
}
