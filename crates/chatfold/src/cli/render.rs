//! # Rendering
//!
//! Turns API results into terminal text. Every `render_*` function returns a `String`
//! so output can be tested without a terminal; `commands.rs` prints it.
//!
//! Chat lines are laid out in a fixed width: the title is truncated (by display width,
//! so wide characters count double) to leave room for tags and the relative timestamp.

use super::styles::{BADGE, FOLDER, ID, MUTED, NOTE, SUCCESS, TAG, TIME, TITLE, WARNING};
use chatfoldapp::commands::chats::FolderBadge;
use chatfoldapp::commands::diagnostics::DiagnosticReport;
use chatfoldapp::commands::folders::FolderRow;
use chatfoldapp::commands::search::{SearchHit, SearchOutcome};
use chatfoldapp::commands::tags::TagCount;
use chatfoldapp::commands::{CmdMessage, MessageLevel};
use chatfoldapp::model::{ChatRecord, PinnedSearch};
use chrono::{DateTime, Utc};
use timeago::Formatter;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub const LINE_WIDTH: usize = 100;
const TIME_WIDTH: usize = 16;
const MIN_TITLE_WIDTH: usize = 20;
const INDENT: &str = "  ";

pub fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        println!("{}", render_message(message));
    }
}

pub fn render_message(message: &CmdMessage) -> String {
    let style = match message.level {
        MessageLevel::Info => &*MUTED,
        MessageLevel::Success => &*SUCCESS,
        MessageLevel::Warning => &*WARNING,
    };
    style.apply_to(&message.content).to_string()
}

pub fn render_tree(rows: &[FolderRow]) -> String {
    if rows.is_empty() {
        return "No folders yet. Create one with `chatfold folder add <name>`.\n".to_string();
    }
    let mut out = String::new();
    for row in rows {
        out.push_str(&INDENT.repeat(row.depth));
        out.push_str(&FOLDER.apply_to(&row.name).to_string());
        out.push(' ');
        out.push_str(&MUTED.apply_to(format!("({})", row.chat_count)).to_string());
        if let Some(note) = &row.note {
            out.push_str(&format!("  {}", NOTE.apply_to(first_line(note))));
        }
        out.push('\n');
    }
    out
}

pub fn render_chats(chats: &[ChatRecord]) -> String {
    if chats.is_empty() {
        return "No chats.\n".to_string();
    }
    chats.iter().map(|chat| chat_line(chat) + "\n").collect()
}

/// Title, tags and age on one line, then the note (if any) indented below.
pub fn chat_line(chat: &ChatRecord) -> String {
    let tags = chat.tags.join(" ");
    let tags_width = if tags.is_empty() { 0 } else { tags.width() + 1 };
    let title_width = LINE_WIDTH
        .saturating_sub(TIME_WIDTH + tags_width)
        .max(MIN_TITLE_WIDTH);
    let title = truncate_to_width(&chat.title, title_width);
    let padding = title_width.saturating_sub(title.width());

    let mut line = format!(
        "{}{}",
        TITLE.apply_to(&title),
        " ".repeat(padding)
    );
    if !tags.is_empty() {
        line.push_str(&format!(" {}", TAG.apply_to(&tags)));
    }
    line.push_str(
        &TIME
            .apply_to(format!(
                "{:>width$}",
                format_time_ago(chat.updated_at),
                width = TIME_WIDTH
            ))
            .to_string(),
    );
    if let Some(note) = &chat.note {
        line.push_str(&format!("\n{}{}", INDENT, NOTE.apply_to(first_line(note))));
    }
    line
}

pub fn render_chat(chat: &ChatRecord, badges: &[FolderBadge]) -> String {
    let mut out = format!(
        "{} {}\n",
        TITLE.apply_to(&chat.title),
        ID.apply_to(format!("[{}]", chat.id))
    );
    if !chat.tags.is_empty() {
        out.push_str(&format!("{}{}\n", INDENT, TAG.apply_to(chat.tags.join(" "))));
    }
    if let Some(note) = &chat.note {
        for line in note.lines() {
            out.push_str(&format!("{}{}\n", INDENT, NOTE.apply_to(line)));
        }
    }
    out.push_str(&format!("{}{}\n", INDENT, render_badges(badges)));
    out.push_str(&format!(
        "{}{}\n",
        INDENT,
        MUTED.apply_to(format!(
            "saved {}, updated {}",
            format_time_ago(chat.timestamp),
            format_time_ago(chat.updated_at)
        ))
    ));
    out
}

fn render_badges(badges: &[FolderBadge]) -> String {
    if badges.is_empty() {
        return WARNING.apply_to("(unlinked)").to_string();
    }
    let paths: Vec<String> = badges
        .iter()
        .map(|b| BADGE.apply_to(&b.path).to_string())
        .collect();
    format!("in {}", paths.join(", "))
}

/// Hits with their location badges. A dashboard outcome renders the folder tree.
pub fn render_search(outcome: &SearchOutcome, rows: &[FolderRow]) -> String {
    match outcome {
        SearchOutcome::Dashboard => render_tree(rows),
        SearchOutcome::Matches(hits) if hits.is_empty() => "No matching chats.\n".to_string(),
        SearchOutcome::Matches(hits) => hits.iter().map(render_hit).collect(),
    }
}

fn render_hit(hit: &SearchHit) -> String {
    format!(
        "{}\n{}{}\n",
        chat_line(&hit.chat),
        INDENT,
        render_badges(&hit.locations)
    )
}

pub fn render_pins(pins: &[PinnedSearch]) -> String {
    if pins.is_empty() {
        return "No pinned searches.\n".to_string();
    }
    pins.iter()
        .enumerate()
        .map(|(i, pin)| {
            format!(
                "{}. {}  {}\n",
                i + 1,
                TITLE.apply_to(&pin.title),
                MUTED.apply_to(&pin.query)
            )
        })
        .collect()
}

pub fn render_tags(tags: &[TagCount]) -> String {
    if tags.is_empty() {
        return "No tags.\n".to_string();
    }
    let width = tags.iter().map(|t| t.tag.width()).max().unwrap_or(0);
    tags.iter()
        .map(|t| {
            let padding = width.saturating_sub(t.tag.width());
            format!(
                "{}{}  {}\n",
                TAG.apply_to(&t.tag),
                " ".repeat(padding),
                MUTED.apply_to(t.count)
            )
        })
        .collect()
}

pub fn render_report(report: &DiagnosticReport) -> String {
    let usage = &report.usage;
    let size_style = if report.is_near_limit() {
        &*WARNING
    } else {
        &*SUCCESS
    };
    let mut out = format!(
        "Storage   {} of {} bytes ({:.1}%), saves refused above {} bytes\n",
        size_style.apply_to(usage.bytes_used),
        usage.limit_bytes,
        usage.percent,
        report.effective_limit_bytes
    );
    out.push_str(&format!(
        "Library   {} folders, {} chats, {} tags, {} pinned searches\n",
        report.folder_count, report.chat_count, report.unique_tag_count, report.pinned_count
    ));
    let unlinked = format!("{} unlinked chats", report.unlinked_count);
    out.push_str(&format!(
        "Cleanup   {}, {} dangling references\n",
        if report.unlinked_count > 0 {
            WARNING.apply_to(unlinked).to_string()
        } else {
            unlinked
        },
        report.malformed_reference_count
    ));
    let last = report
        .session
        .last_refresh_at
        .map(format_time_ago)
        .unwrap_or_else(|| "never".to_string());
    out.push_str(&format!(
        "Sync      {:?}, {} refreshes, {} skipped, last refresh {}\n",
        report.sync_state, report.session.refreshes, report.session.skips, last
    ));
    out
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

pub fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut current_width = 0;
    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            break;
        }
        result.push(c);
        current_width += char_width;
    }
    result.push('…');
    result
}

pub fn format_time_ago(timestamp: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(timestamp);
    Formatter::new().convert(duration.to_std().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatfoldapp::model::SortOrder;

    fn plain() {
        console::set_colors_enabled(false);
    }

    fn row(name: &str, depth: usize, chats: usize) -> FolderRow {
        FolderRow {
            id: name.to_lowercase(),
            name: name.to_string(),
            depth,
            chat_count: chats,
            note: None,
            sort_order: SortOrder::Updated,
        }
    }

    #[test]
    fn test_truncate_respects_display_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("abcdefghij", 5), "abcd…");
        // Each CJK character is two columns wide
        assert_eq!(truncate_to_width("日本語テキスト", 7), "日本語…");
    }

    #[test]
    fn test_tree_indents_by_depth() {
        plain();
        let out = render_tree(&[row("Research", 0, 2), row("Drafts", 1, 1)]);
        assert_eq!(out, "Research (2)\n  Drafts (1)\n");
    }

    #[test]
    fn test_empty_tree_hints_at_folder_add() {
        assert!(render_tree(&[]).contains("folder add"));
    }

    #[test]
    fn test_chat_line_shows_tags_and_note() {
        plain();
        let mut chat = ChatRecord::new("c1", "Pricing Study");
        chat.tags = vec!["#work".into(), "#q3".into()];
        chat.note = Some("first pass\nsecond line".into());
        let line = chat_line(&chat);
        assert!(line.starts_with("Pricing Study"));
        assert!(line.contains("#work #q3"));
        assert!(line.ends_with("\n  first pass"));
    }

    #[test]
    fn test_unlinked_hit_is_marked() {
        plain();
        let hit = SearchHit {
            chat: ChatRecord::new("c1", "Lost"),
            locations: vec![],
        };
        let out = render_search(&SearchOutcome::Matches(vec![hit]), &[]);
        assert!(out.contains("(unlinked)"));
    }

    #[test]
    fn test_hit_lists_locations() {
        plain();
        let hit = SearchHit {
            chat: ChatRecord::new("c1", "Found"),
            locations: vec![
                FolderBadge {
                    id: "r".into(),
                    name: "Research".into(),
                    path: "Research".into(),
                },
                FolderBadge {
                    id: "d".into(),
                    name: "Drafts".into(),
                    path: "Research > Drafts".into(),
                },
            ],
        };
        let out = render_search(&SearchOutcome::Matches(vec![hit]), &[]);
        assert!(out.contains("in Research, Research > Drafts"));
    }

    #[test]
    fn test_dashboard_renders_tree() {
        plain();
        let out = render_search(&SearchOutcome::Dashboard, &[row("Research", 0, 0)]);
        assert_eq!(out, "Research (0)\n");
    }

    #[test]
    fn test_tags_are_aligned() {
        plain();
        let out = render_tags(&[
            TagCount {
                tag: "#work".into(),
                count: 3,
            },
            TagCount {
                tag: "#q3".into(),
                count: 1,
            },
        ]);
        assert_eq!(out, "#work  3\n#q3    1\n");
    }

    #[test]
    fn test_report_mentions_limits() {
        plain();
        let report = DiagnosticReport {
            effective_limit_bytes: 100_352,
            unlinked_count: 2,
            ..Default::default()
        };
        let out = render_report(&report);
        assert!(out.contains("100352"));
        assert!(out.contains("2 unlinked chats"));
        assert!(out.contains("last refresh never"));
    }
}
