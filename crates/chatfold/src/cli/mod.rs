//! # CLI Behavior
//!
//! This is **one possible UI client** for chatfold, not the application itself.
//!
//! ## Selectors
//!
//! Folders are addressed by id, by slash path (`Research/Drafts`, case-insensitive) or by
//! a bare name when it is unique. Chats are addressed by id or by a unique title.
//!
//! ## Naked Execution
//!
//! Running `chatfold` with no subcommand prints the folder tree, the same view an empty
//! search shows.
//!
//! ## Confirmation
//!
//! Two operations destroy data and ask first:
//! - `chat unlink` when the chat would be left in no folder (declining keeps it unlinked)
//! - `gc prune`
//!
//! `--yes` answers for you. Without a terminal the answer is no.
//!
//! ## Logging
//!
//! Diagnostics go to stderr through `tracing`. `-v` raises the default level to debug;
//! `RUST_LOG` takes an `EnvFilter` directive and wins over both.
//!
//! ## Module Structure
//!
//! - `setup`: Argument parsing via clap
//! - `commands`: Per-command handlers that call the API and print results
//! - `render`: Output formatting
//! - `styles`: Terminal styles

mod commands;
mod render;
pub mod setup;
mod styles;

pub use commands::run;
