//! Library exports.
//!
//! - **Backup**: pretty JSON of the whole library; re-importable with full fidelity.
//! - **CSV**: one row per (folder, chat) pair, `Path,Title,URL,Tags,Note`.
//! - **Outline**: nested markdown bullets, one per folder, chats as links.
//!
//! CSV and outline walk the folder tree, so unlinked chats do not appear in them, and
//! references to missing chats are skipped.

use crate::error::Result;
use crate::model::{ChatRecord, Folder, Library};
use crate::tree;

/// Placeholder replaced by the chat id in URL templates.
pub const ID_PLACEHOLDER: &str = "{id}";

pub const CSV_HEADER: &str = "Path,Title,URL,Tags,Note";

/// Breadcrumb separator in the CSV `Path` column.
pub const PATH_JOIN: &str = " > ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Backup,
    Csv,
    Outline,
}

impl ExportFormat {
    /// Detect format from filename extension. Defaults to backup JSON.
    pub fn from_filename(filename: &str) -> Self {
        let lower = filename.to_lowercase();
        if lower.ends_with(".csv") {
            ExportFormat::Csv
        } else if lower.ends_with(".md") || lower.ends_with(".markdown") {
            ExportFormat::Outline
        } else {
            ExportFormat::Backup
        }
    }
}

pub fn chat_url(template: &str, chat_id: &str) -> String {
    template.replace(ID_PLACEHOLDER, chat_id)
}

pub fn render(lib: &Library, format: ExportFormat, url_template: &str) -> Result<String> {
    match format {
        ExportFormat::Backup => backup(lib),
        ExportFormat::Csv => Ok(csv(lib, url_template)),
        ExportFormat::Outline => Ok(outline(lib, url_template)),
    }
}

pub fn backup(lib: &Library) -> Result<String> {
    Ok(serde_json::to_string_pretty(lib)?)
}

/// Quotes a CSV field when it contains a delimiter, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn csv(lib: &Library, url_template: &str) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for visit in tree::walk(&lib.folders) {
        let path = visit.path.join(PATH_JOIN);
        for chat in chats_of(lib, visit.folder) {
            let fields = [
                csv_field(&path),
                csv_field(&chat.title),
                csv_field(&chat_url(url_template, &chat.id)),
                csv_field(&chat.tags.join(", ")),
                csv_field(chat.note.as_deref().unwrap_or_default()),
            ];
            out.push_str(&fields.join(","));
            out.push('\n');
        }
    }
    out
}

pub fn outline(lib: &Library, url_template: &str) -> String {
    let mut out = String::new();
    outline_into(lib, &lib.folders, 0, url_template, &mut out);
    out
}

fn outline_into(lib: &Library, folders: &[Folder], depth: usize, url_template: &str, out: &mut String) {
    for folder in folders {
        let indent = "  ".repeat(depth);
        out.push_str(&format!("{}- {}\n", indent, single_line(&folder.name)));
        for chat in chats_of(lib, folder) {
            let mut line = format!(
                "{}  - [{}]({})",
                indent,
                link_text(&chat.title),
                chat_url(url_template, &chat.id)
            );
            if let Some(note) = &chat.note {
                line.push_str(&format!(" ({})", single_line(note)));
            }
            for tag in &chat.tags {
                line.push(' ');
                line.push_str(tag);
            }
            out.push_str(&line);
            out.push('\n');
        }
        outline_into(lib, &folder.subfolders, depth + 1, url_template, out);
    }
}

/// Flattens line breaks so an entry stays on one outline line.
fn single_line(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\r', '\n'], " ")
}

/// Escapes the characters that would end or nest a Markdown link label.
fn link_text(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for c in single_line(title).chars() {
        if matches!(c, '\\' | '[' | ']') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn chats_of<'a>(lib: &'a Library, folder: &'a Folder) -> impl Iterator<Item = &'a ChatRecord> + 'a {
    folder.chat_ids.iter().filter_map(|id| lib.chat(id))
}
