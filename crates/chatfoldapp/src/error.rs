use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatfoldError {
    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    #[error("Chat not found: {0}")]
    ChatNotFound(String),

    #[error("Pinned search not found: {0}")]
    PinnedSearchNotFound(String),

    #[error("Invalid move: {0}")]
    InvalidMove(String),

    #[error("Cannot pin more than {0} searches")]
    PinnedSearchLimit(usize),

    /// Raised by the quota gatekeeper before anything reaches storage.
    #[error("Storage quota exceeded: library is {measured_bytes} bytes, limit is {limit_bytes} bytes")]
    QuotaExceeded {
        measured_bytes: usize,
        limit_bytes: usize,
    },

    #[error("Invalid import: {0}")]
    InvalidImportSchema(String),

    /// The storage host refused or failed the write. Never retried automatically.
    #[error("Save failed: {0}")]
    HostWrite(String),

    #[error("Storage environment is no longer available")]
    EnvironmentUnavailable,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Api Error: {0}")]
    Api(String),
}

impl ChatfoldError {
    /// Validation failures the caller can report and recover from.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ChatfoldError::QuotaExceeded { .. }
                | ChatfoldError::InvalidImportSchema(_)
                | ChatfoldError::InvalidMove(_)
                | ChatfoldError::PinnedSearchLimit(_)
                | ChatfoldError::Api(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ChatfoldError>;
