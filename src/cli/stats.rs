//! tally stats command implementation.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cli::load_context;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::report;
use crate::stats::{ProgressSnapshot, StatsEngine, StreakSnapshot};

pub struct StatsOptions {
    pub goal: Option<i64>,
    pub window: Option<u32>,
    pub user: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(Serialize)]
struct StatsReport {
    user: String,
    generated_at: DateTime<Utc>,
    streaks: StreakSnapshot,
    progress: ProgressSnapshot,
    progress_bar: String,
    consistency_window_days: u32,
    consistency: f64,
    lookback_days: u32,
    completions_in_window: usize,
    active_days_in_window: usize,
}

pub fn run_stats(options: StatsOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user, true)?;

    let goal = options.goal.unwrap_or(ctx.config.stats.daily_goal);
    let window_days = options
        .window
        .unwrap_or(ctx.config.stats.consistency_window_days);
    let segments = ctx.config.stats.bar_segments;

    let lookback_days = ctx.config.stats.lookback_days;

    let engine = StatsEngine::new(&ctx.store);
    let streaks = engine.compute_streaks(&ctx.user)?;
    let progress = engine.compute_progress(&ctx.user, goal)?;
    let consistency = engine.compute_consistency(&ctx.user, window_days)?;
    let daily = engine.compute_daily_counts(&ctx.user, lookback_days)?;
    let progress_bar = report::render_progress_bar(&progress, segments);

    let output = StatsReport {
        user: ctx.user.clone(),
        generated_at: Utc::now(),
        streaks,
        progress,
        progress_bar,
        consistency_window_days: window_days,
        consistency,
        lookback_days,
        completions_in_window: daily.values().sum(),
        active_days_in_window: daily.len(),
    };

    let mut human = HumanOutput::new(format!("Habit stats for {}", ctx.user));
    human.push_summary("Today", report::progress_line(&output.progress, segments));
    for (key, value) in report::streak_summary(&output.streaks) {
        human.push_summary(key, value);
    }
    human.push_summary(
        format!("Consistency ({window_days}d)"),
        report::format_consistency(output.consistency),
    );
    human.push_summary(
        format!("Last {lookback_days}d"),
        format!(
            "{} completions across {} days",
            output.completions_in_window, output.active_days_in_window
        ),
    );
    if output.streaks.current_streak == 0 {
        human.push_next_step("complete a task today to start a streak");
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "stats",
        &output,
        Some(&human),
    )
}
