//! # Chatfold Architecture
//!
//! Chatfold organizes chat sessions into a user-defined folder tree. It layers folders,
//! tags, notes and saved searches over chats it does not own; a chat is identified by its
//! id and the conversation itself stays with the chat service.
//!
//! The whole organizational state is one document, the [`model::Library`], kept under a
//! single key of a synchronized, quota-limited key-value store that every running
//! instance shares.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI (chatfold crate)                                       │
//! │  - Parses arguments, renders results, prompts               │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API (api.rs)                                               │
//! │  - Resolves selectors, runs the save path                   │
//! │  - Delivers sync notifications to the reconciler            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Commands (commands/*.rs) over the core modules             │
//! │  tree, links, gc, tags, query                               │
//! │  - Pure functions on &Library / &mut Library                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Persistence (quota.rs, sync.rs, store/)                    │
//! │  - Quota gatekeeper in front of every write                 │
//! │  - SyncStorage trait: FsStorage, MemStorage                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants Kept by the Core
//!
//! - A chat record exists once, in `allChats`; folders reference it by id.
//! - A folder lists a chat id at most once.
//! - The folder graph is a tree: no folder is its own ancestor.
//! - Nothing is written to storage unless it fits under the quota limit minus the
//!   safety buffer.
//!
//! ## Module Overview
//!
//! - [`api`]: The facade, entry point for all operations
//! - [`commands`]: Business logic for each command
//! - [`tree`]: Recursive folder tree operations
//! - [`links`]: Saving and removing chat references
//! - [`gc`]: Unlinked chat detection, pruning and archiving
//! - [`query`]: Search query parsing and matching
//! - [`tags`]: Tag normalization
//! - [`quota`]: The quota gatekeeper
//! - [`sync`]: Multi-instance reconciliation
//! - [`store`]: Storage port and implementations
//! - [`model`]: Core data types
//! - [`config`]: Configuration
//! - [`init`]: Data directory and context setup
//! - [`error`]: Error types

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod gc;
pub mod init;
pub mod links;
pub mod model;
pub mod query;
pub mod quota;
pub mod store;
pub mod sync;
pub mod tags;
pub mod tree;
