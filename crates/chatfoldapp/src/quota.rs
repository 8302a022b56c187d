//! # Quota Gatekeeper
//!
//! The synchronized store behind chatfold has a hard byte quota. A write that crosses it
//! is refused by the host, and nothing useful can be done with a half-written library.
//! So every save path runs [`QuotaPolicy::attempt_persist`] first: the library is
//! serialized, measured, and rejected *before* it reaches storage whenever
//!
//! ```text
//! measured_bytes > limit_bytes - safety_buffer_bytes
//! ```
//!
//! A library of exactly `limit - buffer` bytes is accepted.
//!
//! ## Canonical Serialization
//!
//! [`canonical_json`] is the one serialization used for measuring, persisting and
//! comparing snapshots. Struct fields serialize in declaration order and `allChats` is a
//! sorted map, so equal libraries always produce identical bytes.

use crate::error::{ChatfoldError, Result};
use crate::model::Library;
use serde::Serialize;

/// Host quota in bytes.
pub const QUOTA_LIMIT: usize = 102_400;

/// Headroom kept below [`QUOTA_LIMIT`].
pub const SAFETY_BUFFER: usize = 2_048;

pub fn canonical_json(lib: &Library) -> Result<String> {
    Ok(serde_json::to_string(lib)?)
}

/// UTF-8 byte length of the canonical serialization.
pub fn measure(lib: &Library) -> Result<usize> {
    canonical_json(lib).map(|json| json.len())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaVerdict {
    Accepted { measured_bytes: usize },
    Rejected { measured_bytes: usize },
}

impl QuotaVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, QuotaVerdict::Accepted { .. })
    }

    pub fn measured_bytes(&self) -> usize {
        match self {
            QuotaVerdict::Accepted { measured_bytes } | QuotaVerdict::Rejected { measured_bytes } => {
                *measured_bytes
            }
        }
    }
}

/// Byte usage relative to the host quota, for status displays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct QuotaUsage {
    pub bytes_used: usize,
    pub limit_bytes: usize,
    /// `bytes_used / limit_bytes * 100`, rounded to one decimal.
    pub percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub limit_bytes: usize,
    pub safety_buffer_bytes: usize,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            limit_bytes: QUOTA_LIMIT,
            safety_buffer_bytes: SAFETY_BUFFER,
        }
    }
}

impl QuotaPolicy {
    pub fn new(limit_bytes: usize, safety_buffer_bytes: usize) -> Self {
        Self {
            limit_bytes,
            safety_buffer_bytes,
        }
    }

    /// Largest serialization the gatekeeper lets through.
    pub fn effective_limit(&self) -> usize {
        self.limit_bytes.saturating_sub(self.safety_buffer_bytes)
    }

    pub fn check_bytes(&self, measured_bytes: usize) -> QuotaVerdict {
        if measured_bytes > self.effective_limit() {
            QuotaVerdict::Rejected { measured_bytes }
        } else {
            QuotaVerdict::Accepted { measured_bytes }
        }
    }

    pub fn attempt_persist(&self, lib: &Library) -> Result<QuotaVerdict> {
        Ok(self.check_bytes(measure(lib)?))
    }

    /// Like [`attempt_persist`](Self::attempt_persist), turning a rejection into
    /// [`ChatfoldError::QuotaExceeded`]. Returns the measured size when accepted.
    pub fn ensure_fits(&self, lib: &Library) -> Result<usize> {
        match self.attempt_persist(lib)? {
            QuotaVerdict::Accepted { measured_bytes } => Ok(measured_bytes),
            QuotaVerdict::Rejected { measured_bytes } => Err(ChatfoldError::QuotaExceeded {
                measured_bytes,
                limit_bytes: self.effective_limit(),
            }),
        }
    }

    pub fn usage(&self, bytes_used: usize) -> QuotaUsage {
        let percent = if self.limit_bytes == 0 {
            100.0
        } else {
            (bytes_used as f64 / self.limit_bytes as f64 * 1000.0).round() / 10.0
        };
        QuotaUsage {
            bytes_used,
            limit_bytes: self.limit_bytes,
            percent,
        }
    }
}
