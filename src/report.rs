//! Rendering of activity reports and group lists
//!
//! Everything here is pure: data in, Telegram HTML out. User-controlled text
//! (usernames and group titles) is always escaped.

use crate::storage::{ActivityCount, TrackedGroup};
use html_escape::encode_text;

/// Maximum message length for Telegram with safety margin.
/// Telegram's official limit is 4096 characters.
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4000;

/// One group's line in an activity report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupActivity {
    /// Title of the group as first tracked
    pub group_title: String,
    /// Counts for the report target in this group
    pub counts: ActivityCount,
}

/// Render the activity report for `target`.
///
/// Rows are rendered in the order given.
#[must_use]
pub fn format_report(target: &str, rows: &[GroupActivity]) -> String {
    let mut text = format!(
        "📊 <b>User Activity Report</b>\n👤 Username: @{}\n\n",
        encode_text(target)
    );
    for row in rows {
        text.push_str(&format!(
            "🏘️ <b>Community:</b> {}\n📨 Total Messages: {}\n⏱️ Last 24h: {}\n\n",
            encode_text(&row.group_title),
            row.counts.total,
            row.counts.last_24h
        ));
    }
    text.trim_end().to_string()
}

/// Message shown when the caller shares no tracked group.
#[must_use]
pub const fn no_access_message() -> &'static str {
    "❌ You don’t have access to any communities with this user’s messages."
}

/// Render the list of tracked groups.
#[must_use]
pub fn format_group_list(groups: &[TrackedGroup]) -> String {
    if groups.is_empty() {
        return "❌ No communities tracked yet.".to_string();
    }

    let mut text = String::from("🌐 <b>Communities I'm tracking:</b>\n\n");
    for group in groups {
        text.push_str(&format!(
            "🔸 {} (<code>{}</code>)\n",
            encode_text(&group.title),
            group.group_id
        ));
    }
    text.trim_end().to_string()
}

/// Split rendered text into Telegram-sized parts.
///
/// Splits only between lines so HTML tags opened on a line stay balanced.
/// A single line longer than `max_chars` is cut by characters, never inside
/// an HTML entity such as `&amp;`.
#[must_use]
pub fn split_for_telegram(text: &str, max_chars: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.lines() {
        let line_len = line.chars().count();

        if line_len > max_chars {
            if !current.trim().is_empty() {
                parts.push(current.trim_end().to_string());
            }
            current.clear();
            current_len = 0;

            parts.extend(cut_line(line, max_chars));
            continue;
        }

        if current_len + line_len + 1 > max_chars && !current.trim().is_empty() {
            parts.push(current.trim_end().to_string());
            current.clear();
            current_len = 0;
        }

        current.push_str(line);
        current.push('\n');
        current_len += line_len + 1;
    }

    if !current.trim().is_empty() {
        parts.push(current.trim_end().to_string());
    }

    parts
}

/// Longest named or numeric entity `html_escape` produces (`&#x27;`).
const MAX_ENTITY_LEN: usize = 6;

fn cut_line(line: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    let mut parts = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let mut end = (start + max_chars).min(chars.len());
        if end < chars.len() {
            end = entity_safe_end(&chars, start, end);
        }
        parts.push(chars[start..end].iter().collect());
        start = end;
    }

    parts
}

/// Move `end` back to the `&` of an entity that would otherwise be split.
fn entity_safe_end(chars: &[char], start: usize, end: usize) -> usize {
    let window_start = end.saturating_sub(MAX_ENTITY_LEN).max(start + 1);
    for i in (window_start..end).rev() {
        match chars[i] {
            ';' => return end,
            '&' => return i,
            _ => {}
        }
    }
    end
}
