//! Presentation formatting for habit statistics.
//!
//! Pure string assembly over engine output; the only rule that lives here
//! is the bar's floor semantics: `filled = floor(percent * segments)`,
//! computed in integer arithmetic so segment boundaries are exact.

use crate::stats::{ProgressSnapshot, StreakSnapshot};

const FILLED_MARKER: char = '█';
const EMPTY_MARKER: char = '░';

/// Render an N-segment progress bar for a day's goal progress.
pub fn render_progress_bar(snapshot: &ProgressSnapshot, segments: usize) -> String {
    if segments == 0 {
        return String::new();
    }

    // count * segments / goal == floor(percent * segments), capped at full.
    let filled = ((snapshot.count as u64 * segments as u64) / u64::from(snapshot.goal.max(1)))
        .min(segments as u64) as usize;

    let mut bar = String::with_capacity(segments * FILLED_MARKER.len_utf8());
    for _ in 0..filled {
        bar.push(FILLED_MARKER);
    }
    for _ in filled..segments {
        bar.push(EMPTY_MARKER);
    }
    bar
}

/// One-line goal progress: bar, count, and target.
pub fn progress_line(snapshot: &ProgressSnapshot, segments: usize) -> String {
    let bar = render_progress_bar(snapshot, segments);
    if snapshot.goal_reached {
        format!("{bar} {}/{} goal reached", snapshot.count, snapshot.goal)
    } else {
        format!("{bar} {}/{}", snapshot.count, snapshot.goal)
    }
}

/// Human-readable streak lines for the stats view.
pub fn streak_summary(streaks: &StreakSnapshot) -> Vec<(String, String)> {
    let mut lines = vec![
        (
            "Current streak".to_string(),
            format_days(streaks.current_streak),
        ),
        (
            "Longest streak".to_string(),
            format_days(streaks.longest_streak),
        ),
        (
            "Days with completions".to_string(),
            streaks.total_completion_days.to_string(),
        ),
    ];
    if let Some(date) = streaks.last_completion_date {
        lines.push(("Last completion".to_string(), date.to_string()));
    }
    lines
}

/// Consistency percentage with the engine's one-decimal contract.
pub fn format_consistency(value: f64) -> String {
    format!("{value:.1}%")
}

fn format_days(days: u32) -> String {
    if days == 1 {
        "1 day".to_string()
    } else {
        format!("{days} days")
    }
}
