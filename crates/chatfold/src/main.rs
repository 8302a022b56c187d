//! # Chatfold CLI
//!
//! The binary is thin: argument parsing, dispatch and rendering live in `src/cli/`, and
//! this file only invokes `cli::run()` and handles process termination.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI (crates/chatfold/src/cli/)                             │
//! │  - clap argument parsing (setup.rs)                         │
//! │  - Dispatch + prompts (commands.rs)                         │
//! │  - Terminal rendering (render.rs, styles.rs)                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  chatfoldapp::api::ChatfoldApi                              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything from the API inward is UI agnostic. The CLI owns every user-facing
//! concern: parsing, confirmation prompts, output formatting, logging setup and exit
//! codes.

mod cli;

use chatfoldapp::error::ChatfoldError;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {:#}", e);
        // 2 for input the user can fix, 1 for everything else
        let recoverable = e
            .downcast_ref::<ChatfoldError>()
            .is_some_and(ChatfoldError::is_recoverable);
        std::process::exit(if recoverable { 2 } else { 1 });
    }
}
