use chatfoldapp::model::SortOrder;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "chatfold",
    bin_name = "chatfold",
    version,
    disable_help_subcommand = true
)]
#[command(about = "Organize chat sessions into folders, tags and saved searches", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Data directory (defaults to $CHATFOLD_DATA, then the OS data dir)
    #[arg(long, global = true, value_name = "DIR", help_heading = "Options")]
    pub data: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage folders
    #[command(subcommand, display_order = 1)]
    Folder(FolderCommands),

    /// Save, edit and remove chats
    #[command(subcommand, display_order = 2)]
    Chat(ChatCommands),

    /// Search chats: words, "quoted phrases", #tag, -exclude, -#tag
    #[command(display_order = 3)]
    Search {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        query: Vec<String>,

        /// Print hits as JSON
        #[arg(long)]
        json: bool,
    },

    /// Pinned searches
    #[command(subcommand, display_order = 4)]
    Pins(PinCommands),

    /// Library-wide tag management
    #[command(subcommand, display_order = 5)]
    Tags(TagCommands),

    /// Find and recover chats that are in no folder
    #[command(subcommand, display_order = 6)]
    Gc(GcCommands),

    /// Export the library
    #[command(subcommand, display_order = 7)]
    Export(ExportCommands),

    /// Import a backup or chat links
    #[command(subcommand, display_order = 8)]
    Import(ImportCommands),

    /// Library size, counts and sync state
    #[command(display_order = 9)]
    Status {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Re-read storage and replace the in-memory library if it is stale
    #[command(display_order = 10)]
    Sync,
}

#[derive(Subcommand, Debug)]
pub enum FolderCommands {
    /// Create a folder
    Add {
        name: String,

        /// Parent folder (id, path or unique name); defaults to the root
        #[arg(long, short)]
        parent: Option<String>,
    },

    /// Rename a folder
    Rename { folder: String, name: String },

    /// Move a folder under another one
    Mv {
        folder: String,

        /// Destination folder; omit to move to the root
        #[arg(long)]
        to: Option<String>,
    },

    /// Delete a folder and its subfolders (chats are kept)
    #[command(alias = "delete")]
    Rm { folder: String },

    /// Set a folder note; no text clears it
    Note {
        folder: String,
        #[arg(trailing_var_arg = true)]
        text: Vec<String>,
    },

    /// Set how a folder orders its chats
    Sort {
        folder: String,
        /// updated, created or alpha
        order: SortOrder,
    },

    /// Show the folder tree, or the chats of one folder
    #[command(alias = "list")]
    Ls { folder: Option<String> },
}

#[derive(Subcommand, Debug)]
pub enum ChatCommands {
    /// Save a chat into a folder
    Save {
        folder: String,
        id: String,

        #[arg(long, short)]
        title: Option<String>,

        /// Tag to add (repeatable)
        #[arg(long = "tag", short = 'g')]
        tags: Vec<String>,

        #[arg(long, short)]
        note: Option<String>,
    },

    /// Show a chat and the folders holding it
    Show { chat: String },

    /// Remove a chat from one folder
    Unlink {
        folder: String,
        chat: String,

        /// Delete the chat without asking if this was its last folder
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Delete a chat from every folder
    #[command(alias = "delete")]
    Rm { chat: String },

    /// Rename a chat
    Rename {
        chat: String,
        #[arg(trailing_var_arg = true, required = true)]
        title: Vec<String>,
    },

    /// Set a chat note; no text clears it
    Note {
        chat: String,
        #[arg(trailing_var_arg = true)]
        text: Vec<String>,
    },

    /// Add tags to a chat
    Tag {
        chat: String,
        #[arg(required = true)]
        tags: Vec<String>,
    },

    /// Remove tags from a chat
    Untag {
        chat: String,
        #[arg(required = true)]
        tags: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum PinCommands {
    /// Pin a search query
    Add {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        query: Vec<String>,

        #[arg(long, short)]
        title: Option<String>,
    },

    /// Remove a pinned search
    Rm { pin: String },

    /// Rename a pinned search
    Rename { pin: String, title: String },

    /// List pinned searches
    Ls,

    /// Run a pinned search
    Run { pin: String },
}

#[derive(Subcommand, Debug)]
pub enum TagCommands {
    /// List tags with usage counts
    Ls,

    /// Rename a tag on every chat
    Rename { old: String, new: String },

    /// Remove a tag from every chat
    Rm { tag: String },
}

#[derive(Subcommand, Debug)]
pub enum GcCommands {
    /// List chats that are in no folder
    Ls,

    /// Permanently delete unlinked chats (all of them when none are named)
    Prune {
        chats: Vec<String>,

        /// Skip confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Move every unlinked chat into a new dated folder
    Archive,
}

#[derive(Subcommand, Debug)]
pub enum ExportCommands {
    /// Full-fidelity JSON backup
    Backup {
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Spreadsheet rows: Path,Title,URL,Tags,Note
    Csv {
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Markdown outline of the folder tree
    Outline {
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ImportCommands {
    /// Replace the library with a JSON backup
    Backup { file: PathBuf },

    /// Save every chat URL found in a text file ('-' reads stdin) into a folder
    Links { folder: String, file: PathBuf },
}
