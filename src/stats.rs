//! Habit statistics over task completion records.
//!
//! Everything here is pure computation: each operation is a function of the
//! fetched records, an explicit `now`, and the requested goal or window.
//! Nothing is cached between calls and nothing writes back to storage;
//! correctness comes from recomputation per query. Calendar arithmetic is
//! UTC-day based throughout.
//!
//! Data-quality problems (a completed record with no completion timestamp)
//! degrade with a warning instead of failing; the only hard error is a
//! missing user identifier, which is a caller contract violation.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::policy;
use crate::store::{TaskRecord, TaskStore};

/// Today's completion count relative to the daily goal
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    pub count: usize,
    pub goal: u32,
    /// Fraction of the goal reached, capped at 1.0
    pub percent: f64,
    pub goal_reached: bool,
}

/// Streak state derived from the full completion history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreakSnapshot {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_completion_date: Option<NaiveDate>,
    pub total_completion_days: usize,
}

/// Source of task records for one user.
///
/// The engine takes its record source as an injected capability so tests
/// can substitute an in-memory fake for the durable store.
pub trait RecordSource {
    fn tasks_for_user(&self, user_id: &str) -> Result<Vec<TaskRecord>>;
}

impl RecordSource for TaskStore {
    fn tasks_for_user(&self, user_id: &str) -> Result<Vec<TaskRecord>> {
        TaskStore::tasks_for_user(self, user_id)
    }
}

impl<S: RecordSource> RecordSource for &S {
    fn tasks_for_user(&self, user_id: &str) -> Result<Vec<TaskRecord>> {
        (**self).tasks_for_user(user_id)
    }
}

/// Facade over the pure computations: fetches records once per call and
/// evaluates them as of `Utc::now()`.
pub struct StatsEngine<S> {
    source: S,
}

impl<S: RecordSource> StatsEngine<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn compute_streaks(&self, user_id: &str) -> Result<StreakSnapshot> {
        let records = self.fetch(user_id)?;
        Ok(streak_snapshot(&records, Utc::now()))
    }

    pub fn compute_progress(&self, user_id: &str, goal: i64) -> Result<ProgressSnapshot> {
        let records = self.fetch(user_id)?;
        Ok(progress(&records, Utc::now(), goal))
    }

    pub fn compute_consistency(&self, user_id: &str, window_days: u32) -> Result<f64> {
        let records = self.fetch(user_id)?;
        Ok(consistency(&records, Utc::now(), window_days))
    }

    pub fn compute_daily_counts(
        &self,
        user_id: &str,
        lookback_days: u32,
    ) -> Result<BTreeMap<NaiveDate, usize>> {
        let records = self.fetch(user_id)?;
        Ok(daily_counts(&records, Utc::now(), lookback_days))
    }

    fn fetch(&self, user_id: &str) -> Result<Vec<TaskRecord>> {
        let user = user_id.trim();
        if user.is_empty() {
            return Err(Error::MissingUser);
        }
        self.source.tasks_for_user(user)
    }
}

/// Count completions per UTC calendar date within `[now - lookback, now]`.
///
/// Records that are not completed, carry no completion timestamp, or fall
/// outside the window are dropped; the malformed case is logged. The result
/// is empty, never absent, when nothing qualifies.
pub fn daily_counts(
    records: &[TaskRecord],
    now: DateTime<Utc>,
    lookback_days: u32,
) -> BTreeMap<NaiveDate, usize> {
    let window_start = now - Duration::days(i64::from(lookback_days));
    let mut buckets = BTreeMap::new();

    for record in records {
        if !record.is_completed {
            continue;
        }
        let Some(completed_at) = record.completed_at else {
            tracing::warn!(
                "completed task {} has no completion timestamp, excluded from daily counts",
                record.id
            );
            continue;
        };
        if completed_at < window_start || completed_at > now {
            continue;
        }
        *buckets.entry(completed_at.date_naive()).or_insert(0) += 1;
    }

    buckets
}

/// Consecutive days with at least one completion, ending today or yesterday.
///
/// Today is special-cased: a day-zero gap is skipped rather than breaking
/// the walk, because the user may still complete a task before midnight.
/// Any earlier gap terminates the streak. The walk is bounded by a 365-day
/// lookback, so streaks longer than a year read as the window length.
pub fn current_streak(records: &[TaskRecord], now: DateTime<Utc>) -> u32 {
    let counts = daily_counts(records, now, policy::STREAK_LOOKBACK_DAYS);
    let today = now.date_naive();

    let has = |date: NaiveDate| counts.get(&date).copied().unwrap_or(0) > 0;

    let yesterday = match today.pred_opt() {
        Some(date) => date,
        None => return 0,
    };
    if !has(today) && !has(yesterday) {
        return 0;
    }

    let mut streak = 0;
    let mut day = today;
    loop {
        if has(day) {
            streak += 1;
        } else if day != today {
            break;
        }
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }

    streak
}

/// Longest run of consecutive completion dates anywhere in history.
///
/// Duplicate completions on one date neither break nor extend a run.
/// Returns 0 for an empty history, 1 for a single date.
pub fn longest_streak(records: &[TaskRecord]) -> u32 {
    let dates = completion_dates(records);

    let mut longest = 0u32;
    let mut run = 0u32;
    let mut previous: Option<NaiveDate> = None;

    for date in dates {
        run = match previous {
            Some(prev) if date - prev == Duration::days(1) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(date);
    }

    longest
}

/// Today's completion count relative to the daily goal.
///
/// A non-positive goal coerces to the policy default; this operation never
/// fails on configuration input.
pub fn progress(records: &[TaskRecord], now: DateTime<Utc>, goal: i64) -> ProgressSnapshot {
    let goal = policy::effective_goal(goal);
    let counts = daily_counts(records, now, 1);
    let count = counts.get(&now.date_naive()).copied().unwrap_or(0);

    let percent = (count as f64 / f64::from(goal)).min(1.0);
    ProgressSnapshot {
        count,
        goal,
        percent,
        goal_reached: count as u64 >= u64::from(goal),
    }
}

/// Percentage (0-100, one decimal) of tasks active in the trailing window
/// that were completed in it.
///
/// A task is active when it was created within the window, regardless of
/// completion state. A task counts as completed-in-window when it is
/// completed and its completion timestamp is absent or at/after the window
/// start. No active tasks means 0.0, not a division by zero.
pub fn consistency(records: &[TaskRecord], now: DateTime<Utc>, window_days: u32) -> f64 {
    let window_start = now - Duration::days(i64::from(window_days));

    let active: Vec<&TaskRecord> = records
        .iter()
        .filter(|record| record.created_at >= window_start && record.created_at <= now)
        .collect();
    if active.is_empty() {
        return 0.0;
    }

    let completed = active
        .iter()
        .filter(|record| {
            record.is_completed
                && record
                    .completed_at
                    .map(|completed_at| completed_at >= window_start)
                    .unwrap_or(true)
        })
        .count();

    let percentage = (completed as f64 / active.len() as f64) * 100.0;
    (percentage * 10.0).round() / 10.0
}

/// Full streak state for a user as of `now`.
pub fn streak_snapshot(records: &[TaskRecord], now: DateTime<Utc>) -> StreakSnapshot {
    let dates = completion_dates(records);

    StreakSnapshot {
        current_streak: current_streak(records, now),
        longest_streak: longest_streak(records),
        last_completion_date: dates.iter().next_back().copied(),
        total_completion_days: dates.len(),
    }
}

/// Distinct completion dates across the full history, malformed records
/// excluded.
fn completion_dates(records: &[TaskRecord]) -> BTreeSet<NaiveDate> {
    let mut dates = BTreeSet::new();
    for record in records {
        if !record.is_completed {
            continue;
        }
        let Some(completed_at) = record.completed_at else {
            tracing::warn!(
                "completed task {} has no completion timestamp, excluded from streaks",
                record.id
            );
            continue;
        };
        dates.insert(completed_at.date_naive());
    }
    dates
}
