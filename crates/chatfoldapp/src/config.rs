//! # Configuration
//!
//! chatfold configuration is managed by [`clapfig`], which handles layered loading from
//! TOML files, environment variables, and compiled defaults.
//!
//! ## Resolution Order
//!
//! 1. **Environment variables**: `CHATFOLD__QUOTA_BYTES`, `CHATFOLD__STORAGE_KEY`, etc.
//! 2. **Data directory config**: `<data dir>/chatfold.toml`
//! 3. **Compiled defaults**: `#[config(default = ...)]`
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `quota_bytes` | `102400` | Host storage quota |
//! | `safety_buffer_bytes` | `2048` | Headroom kept below the quota |
//! | `storage_key` | `library` | Key the library is stored under |
//! | `chat_url_template` | `https://gemini.google.com/app/{id}` | Canonical chat URL |
//! | `archive_folder_prefix` | `Recovered` | Name prefix of archive folders |

use crate::commands::export::chat_url;
use crate::quota::{QuotaPolicy, QUOTA_LIMIT, SAFETY_BUFFER};
use confique::Config;
use serde::{Deserialize, Serialize};

pub const DEFAULT_STORAGE_KEY: &str = "library";
pub const DEFAULT_CHAT_URL_TEMPLATE: &str = "https://gemini.google.com/app/{id}";
pub const DEFAULT_ARCHIVE_PREFIX: &str = "Recovered";

/// Configuration for chatfold, stored in `chatfold.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChatfoldConfig {
    /// Host storage quota in bytes.
    #[config(default = 102400)]
    pub quota_bytes: usize,

    /// Bytes kept free below the quota. Saves larger than
    /// `quota_bytes - safety_buffer_bytes` are refused.
    #[config(default = 2048)]
    pub safety_buffer_bytes: usize,

    /// Key the library is stored under.
    #[config(default = "library")]
    pub storage_key: String,

    /// Canonical chat URL; `{id}` is replaced with the chat id.
    #[config(default = "https://gemini.google.com/app/{id}")]
    pub chat_url_template: String,

    /// Archive folders are named "<prefix> <date>".
    #[config(default = "Recovered")]
    pub archive_folder_prefix: String,
}

impl Default for ChatfoldConfig {
    fn default() -> Self {
        Self {
            quota_bytes: QUOTA_LIMIT,
            safety_buffer_bytes: SAFETY_BUFFER,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            chat_url_template: DEFAULT_CHAT_URL_TEMPLATE.to_string(),
            archive_folder_prefix: DEFAULT_ARCHIVE_PREFIX.to_string(),
        }
    }
}

impl ChatfoldConfig {
    pub fn quota_policy(&self) -> QuotaPolicy {
        QuotaPolicy::new(self.quota_bytes, self.safety_buffer_bytes)
    }

    pub fn chat_url(&self, chat_id: &str) -> String {
        chat_url(&self.chat_url_template, chat_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ChatfoldConfig::default();
        assert_eq!(config.quota_bytes, 102_400);
        assert_eq!(config.safety_buffer_bytes, 2_048);
        assert_eq!(config.storage_key, "library");
        assert_eq!(config.quota_policy().effective_limit(), 100_352);
    }

    #[test]
    fn test_chat_url() {
        let config = ChatfoldConfig::default();
        assert_eq!(config.chat_url("abc"), "https://gemini.google.com/app/abc");
    }

    #[test]
    fn test_custom_policy() {
        let config = ChatfoldConfig {
            quota_bytes: 1000,
            safety_buffer_bytes: 100,
            ..Default::default()
        };
        assert_eq!(config.quota_policy().effective_limit(), 900);
    }

    #[test]
    fn test_deserializes_all_keys() {
        let json = r#"{"quota_bytes":5000,"safety_buffer_bytes":0,"storage_key":"k","chat_url_template":"u/{id}","archive_folder_prefix":"R"}"#;
        let config: ChatfoldConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.chat_url("x"), "u/x");
    }
}
