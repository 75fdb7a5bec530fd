//! Prompt construction for mood analysis.
//!
//! Selection and formatting are pure: the same entries and reference time always
//! produce the same lines and the same prompt.

use chrono::{DateTime, Duration, Utc};

use crate::models::MoodEntry;

/// How far back the analysis window reaches.
pub const WINDOW_DAYS: i64 = 14;

/// Earliest `created_at` that still falls inside the window ending at `reference_time`.
pub fn window_start(reference_time: DateTime<Utc>) -> DateTime<Utc> {
    reference_time - Duration::days(WINDOW_DAYS)
}

/// Format the entries inside the window, one line each, in arrival order.
///
/// Only a lower bound is applied, so entries dated after `reference_time` are kept.
pub fn select_window(entries: &[MoodEntry], reference_time: DateTime<Utc>) -> Vec<String> {
    let since = window_start(reference_time);

    entries
        .iter()
        .filter(|entry| entry.created_at >= since)
        .map(format_entry)
        .collect()
}

fn format_entry(entry: &MoodEntry) -> String {
    let date = entry.created_at.format("%Y-%m-%d");
    if entry.note.is_empty() {
        format!("{}: {}", date, entry.mood)
    } else {
        format!("{}: {} - {}", date, entry.mood, entry.note)
    }
}

/// Embed the formatted lines in the analysis instructions.
pub fn build_prompt(lines: &[String]) -> String {
    let mood_entries = lines.join("\n");

    format!(
        "You are a supportive emotional wellness assistant. Analyze these mood journal entries from the past 2 weeks:
{mood_entries}

Please provide a brief, warm analysis with:

1. **Patterns**: What emotional patterns do you notice?
2. **Insights**: Any trends or observations about their emotional state?
3. **Suggestions**: 2-3 gentle, actionable suggestions to improve their wellbeing

Keep your response warm, supportive, and under 300 words. Use emojis sparingly for a friendly touch. Focus on being helpful and encouraging."
    )
}
