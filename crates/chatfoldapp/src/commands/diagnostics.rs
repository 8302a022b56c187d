//! Read-only status report.
//!
//! The report carries aggregate counts only. It never includes chat titles, notes or
//! folder names, so it is safe to paste into a bug report.

use crate::commands::tags::unique_tag_count;
use crate::error::Result;
use crate::gc;
use crate::model::Library;
use crate::quota::{measure, QuotaPolicy, QuotaUsage};
use crate::sync::{SessionCounters, SyncState};
use crate::tree;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiagnosticReport {
    pub folder_count: usize,
    pub chat_count: usize,
    pub unlinked_count: usize,
    pub pinned_count: usize,
    pub unique_tag_count: usize,
    /// Folder references pointing at chats missing from `allChats`.
    pub malformed_reference_count: usize,
    pub usage: QuotaUsage,
    /// Largest serialization the gatekeeper accepts.
    pub effective_limit_bytes: usize,
    pub sync_state: SyncState,
    pub session: SessionCounters,
}

impl DiagnosticReport {
    /// Usage is at or past the gatekeeper limit; the next growing edit will be rejected.
    pub fn is_near_limit(&self) -> bool {
        self.usage.bytes_used >= self.effective_limit_bytes
    }
}

pub fn run(
    lib: &Library,
    policy: &QuotaPolicy,
    sync_state: SyncState,
    session: SessionCounters,
) -> Result<DiagnosticReport> {
    Ok(DiagnosticReport {
        folder_count: tree::folder_count(&lib.folders),
        chat_count: lib.all_chats.len(),
        unlinked_count: gc::find_unlinked(lib).len(),
        pinned_count: lib.pinned_searches.len(),
        unique_tag_count: unique_tag_count(lib),
        malformed_reference_count: gc::malformed_references(lib).len(),
        usage: policy.usage(measure(lib)?),
        effective_limit_bytes: policy.effective_limit(),
        sync_state,
        session,
    })
}
