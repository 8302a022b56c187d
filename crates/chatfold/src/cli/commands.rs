//! # CLI Layer
//!
//! The **only** place in the codebase that:
//! - Knows about terminal I/O (stdout, stderr)
//! - Prompts the user
//! - Sets up logging
//! - Formats output for human consumption
//!
//! ## Responsibilities
//!
//! 1. **Argument Parsing**: `Cli::parse()` from `setup.rs`
//! 2. **Context Setup**: `chatfoldapp::init::initialize` with the `--data` override
//! 3. **API Dispatch**: one `handle_*` function per command
//! 4. **Output Formatting**: `render.rs`
//! 5. **Error Handling**: errors bubble up to `main`, which prints them and picks the exit code

use super::render::{
    print_messages, render_chat, render_chats, render_pins, render_report, render_search,
    render_tags, render_tree,
};
use super::setup::{
    ChatCommands, Cli, Commands, ExportCommands, FolderCommands, GcCommands, ImportCommands,
    PinCommands, TagCommands,
};
use anyhow::{Context, Result};
use chatfoldapp::api::ChatfoldApi;
use chatfoldapp::commands::export::ExportFormat;
use chatfoldapp::init::initialize;
use chatfoldapp::model::ChatMeta;
use chatfoldapp::store::FsStorage;
use chatfoldapp::sync::SyncOutcome;
use clap::Parser;
use console::Term;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

struct AppContext {
    api: ChatfoldApi<FsStorage>,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut ctx = init_context(&cli)?;

    match cli.command {
        Some(Commands::Folder(cmd)) => match cmd {
            FolderCommands::Add { name, parent } => handle_folder_add(&mut ctx, &name, parent),
            FolderCommands::Rename { folder, name } => {
                print_messages(&ctx.api.rename_folder(&folder, &name)?.messages);
                Ok(())
            }
            FolderCommands::Mv { folder, to } => {
                print_messages(&ctx.api.move_folder(&folder, to.as_deref())?.messages);
                Ok(())
            }
            FolderCommands::Rm { folder } => {
                print_messages(&ctx.api.delete_folder(&folder)?.messages);
                Ok(())
            }
            FolderCommands::Note { folder, text } => {
                let note = joined(&text);
                print_messages(&ctx.api.set_folder_note(&folder, note.as_deref())?.messages);
                Ok(())
            }
            FolderCommands::Sort { folder, order } => {
                print_messages(&ctx.api.set_folder_sort(&folder, order)?.messages);
                Ok(())
            }
            FolderCommands::Ls { folder } => handle_folder_ls(&ctx, folder),
        },
        Some(Commands::Chat(cmd)) => match cmd {
            ChatCommands::Save {
                folder,
                id,
                title,
                tags,
                note,
            } => handle_chat_save(&mut ctx, &folder, id, title, tags, note),
            ChatCommands::Show { chat } => handle_chat_show(&ctx, &chat),
            ChatCommands::Unlink { folder, chat, yes } => {
                handle_chat_unlink(&mut ctx, &folder, &chat, yes)
            }
            ChatCommands::Rm { chat } => {
                print_messages(&ctx.api.delete_chat(&chat)?.messages);
                Ok(())
            }
            ChatCommands::Rename { chat, title } => {
                print_messages(&ctx.api.rename_chat(&chat, &title.join(" "))?.messages);
                Ok(())
            }
            ChatCommands::Note { chat, text } => {
                let note = joined(&text);
                print_messages(&ctx.api.set_chat_note(&chat, note.as_deref())?.messages);
                Ok(())
            }
            ChatCommands::Tag { chat, tags } => {
                print_messages(&ctx.api.tag_chat(&chat, &tags)?.messages);
                Ok(())
            }
            ChatCommands::Untag { chat, tags } => {
                print_messages(&ctx.api.untag_chat(&chat, &tags)?.messages);
                Ok(())
            }
        },
        Some(Commands::Search { query, json }) => handle_search(&ctx, &query.join(" "), json),
        Some(Commands::Pins(cmd)) => match cmd {
            PinCommands::Add { query, title } => {
                let result = ctx.api.pin_search(title.as_deref(), &query.join(" "))?;
                print_messages(&result.messages);
                Ok(())
            }
            PinCommands::Rm { pin } => {
                print_messages(&ctx.api.unpin_search(&pin)?.messages);
                Ok(())
            }
            PinCommands::Rename { pin, title } => {
                print_messages(&ctx.api.rename_pin(&pin, &title)?.messages);
                Ok(())
            }
            PinCommands::Ls => {
                print!("{}", render_pins(&ctx.api.pins()?));
                Ok(())
            }
            PinCommands::Run { pin } => {
                let outcome = ctx.api.run_pin(&pin)?;
                print!("{}", render_search(&outcome, &ctx.api.folder_rows()?));
                Ok(())
            }
        },
        Some(Commands::Tags(cmd)) => match cmd {
            TagCommands::Ls => {
                print!("{}", render_tags(&ctx.api.tags()?));
                Ok(())
            }
            TagCommands::Rename { old, new } => {
                print_messages(&ctx.api.rename_tag(&old, &new)?.messages);
                Ok(())
            }
            TagCommands::Rm { tag } => {
                print_messages(&ctx.api.delete_tag(&tag)?.messages);
                Ok(())
            }
        },
        Some(Commands::Gc(cmd)) => match cmd {
            GcCommands::Ls => {
                let unlinked = ctx.api.unlinked()?;
                if unlinked.is_empty() {
                    println!("No unlinked chats.");
                } else {
                    print!("{}", render_chats(&unlinked));
                }
                Ok(())
            }
            GcCommands::Prune { chats, yes } => handle_prune(&mut ctx, &chats, yes),
            GcCommands::Archive => {
                print_messages(&ctx.api.archive_unlinked()?.messages);
                Ok(())
            }
        },
        Some(Commands::Export(cmd)) => {
            let (format, output) = match cmd {
                ExportCommands::Backup { output } => (ExportFormat::Backup, output),
                ExportCommands::Csv { output } => (ExportFormat::Csv, output),
                ExportCommands::Outline { output } => (ExportFormat::Outline, output),
            };
            handle_export(&ctx, format, output)
        }
        Some(Commands::Import(cmd)) => match cmd {
            ImportCommands::Backup { file } => {
                let raw = read_input(&file)?;
                print_messages(&ctx.api.import_backup(&raw)?.messages);
                Ok(())
            }
            ImportCommands::Links { folder, file } => {
                let text = read_input(&file)?;
                print_messages(&ctx.api.import_links(&folder, &text)?.messages);
                Ok(())
            }
        },
        Some(Commands::Status { json }) => handle_status(&ctx, json),
        Some(Commands::Sync) => handle_sync(&mut ctx),
        None => handle_folder_ls(&ctx, None),
    }
}

/// Logs go to stderr so they never mix with command output.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "chatfold=debug,chatfoldapp=debug"
    } else {
        "chatfold=warn,chatfoldapp=warn"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A second init (tests calling run twice) is harmless
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

fn init_context(cli: &Cli) -> Result<AppContext> {
    let ctx = initialize(cli.data.clone()).context("could not open the chatfold library")?;
    debug!(data_dir = %ctx.data_dir.display(), "Context ready");
    Ok(AppContext { api: ctx.api })
}

fn joined(words: &[String]) -> Option<String> {
    let text = words.join(" ");
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Reads a file, or stdin for `-`.
fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("could not read stdin")?;
        return Ok(buffer);
    }
    std::fs::read_to_string(path).with_context(|| format!("could not read {}", path.display()))
}

/// Asks a yes/no question on stderr. Without a terminal the answer is no.
fn confirm(question: &str) -> Result<bool> {
    let term = Term::stderr();
    if !term.is_term() {
        return Ok(false);
    }
    term.write_str(&format!("{} [y/N] ", question))?;
    let answer = term.read_line()?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn handle_folder_add(ctx: &mut AppContext, name: &str, parent: Option<String>) -> Result<()> {
    let result = ctx.api.create_folder(parent.as_deref(), name)?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_folder_ls(ctx: &AppContext, folder: Option<String>) -> Result<()> {
    match folder {
        None => print!("{}", render_tree(&ctx.api.folder_rows()?)),
        Some(folder) => print!("{}", render_chats(&ctx.api.folder_chats(&folder)?)),
    }
    Ok(())
}

fn handle_chat_save(
    ctx: &mut AppContext,
    folder: &str,
    id: String,
    title: Option<String>,
    tags: Vec<String>,
    note: Option<String>,
) -> Result<()> {
    // A missing title falls back to the id for new chats; existing chats keep theirs
    let title = match title {
        Some(title) => title,
        None if ctx.api.library().all_chats.contains_key(&id) => String::new(),
        None => id.clone(),
    };
    let mut meta = ChatMeta::new(id, title).with_tags(tags);
    if let Some(note) = note {
        meta = meta.with_note(note);
    }
    print_messages(&ctx.api.save_chat(folder, meta)?.messages);
    Ok(())
}

fn handle_chat_show(ctx: &AppContext, chat: &str) -> Result<()> {
    match ctx.api.chat(chat)? {
        Some(record) => {
            let badges = ctx.api.chat_locations(&record.id)?;
            print!("{}", render_chat(&record, &badges));
        }
        None => println!("No such chat."),
    }
    Ok(())
}

fn handle_chat_unlink(ctx: &mut AppContext, folder: &str, chat: &str, yes: bool) -> Result<()> {
    let preview = ctx.api.unlink_preview(folder, chat)?;
    let reclaim = preview.becomes_unlinked
        && (yes || confirm("This chat is in no other folder. Delete it permanently?")?);
    print_messages(&ctx.api.unlink_chat(folder, chat, reclaim)?.messages);
    Ok(())
}

fn handle_prune(ctx: &mut AppContext, chats: &[String], yes: bool) -> Result<()> {
    let targets = ctx.api.prune_preview(chats)?;
    if targets.is_empty() {
        println!("No unlinked chats to prune.");
        return Ok(());
    }
    let question = format!(
        "Permanently delete {} unlinked chat{}?",
        targets.len(),
        if targets.len() == 1 { "" } else { "s" }
    );
    if !yes && !confirm(&question)? {
        println!("Nothing deleted. Pass --yes to prune without asking.");
        return Ok(());
    }
    print_messages(&ctx.api.prune(chats)?.messages);
    Ok(())
}

fn handle_search(ctx: &AppContext, query: &str, json: bool) -> Result<()> {
    let outcome = ctx.api.search(query)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print!("{}", render_search(&outcome, &ctx.api.folder_rows()?));
    }
    Ok(())
}

fn handle_export(ctx: &AppContext, format: ExportFormat, output: Option<PathBuf>) -> Result<()> {
    let rendered = ctx.api.export(format)?;
    match output {
        Some(path) => {
            std::fs::write(&path, rendered)
                .with_context(|| format!("could not write {}", path.display()))?;
            println!("Exported to {}", path.display());
        }
        None if rendered.ends_with('\n') => print!("{}", rendered),
        None => println!("{}", rendered),
    }
    Ok(())
}

fn handle_status(ctx: &AppContext, json: bool) -> Result<()> {
    let report = ctx.api.diagnostics()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_report(&report));
    }
    Ok(())
}

fn handle_sync(ctx: &mut AppContext) -> Result<()> {
    let pumped = ctx.api.pump_changes()?;
    let outcome = ctx.api.on_focus()?;
    debug!(?pumped, ?outcome, "Sync finished");
    match outcome {
        SyncOutcome::Refreshed => println!("Library reloaded from storage."),
        SyncOutcome::Skipped | SyncOutcome::Ignored => println!("Library is up to date."),
    }
    Ok(())
}
