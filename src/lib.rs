//! tally - Task Tracking with Habit Statistics
//!
//! This library provides the core functionality for the tally CLI tool:
//! a small task tracker whose completion history drives derived habit
//! metrics (streaks, daily goal progress, consistency).
//!
//! # Core Concepts
//!
//! - **Tasks**: per-user records replayed from an append-only event log
//! - **Completion records**: the terminal state transition the stats
//!   engine consumes
//! - **Streaks**: consecutive UTC calendar days with at least one
//!   completion
//! - **Goal progress**: today's completion count against a configured
//!   daily target
//! - **Consistency**: completed-vs-active ratio over a trailing window
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `tally.toml`
//! - `error`: Error types and result aliases
//! - `store`: Event log storage and task state replay
//! - `stats`: The habit statistics engine (pure computation)
//! - `policy`: Daily-goal and window defaults
//! - `report`: Presentation formatting for engine output
//! - `export`: CSV assembly for the completion archive
//! - `user`: User identity resolution
//! - `paths`: Data directory resolution
//! - `lock`: File locking and atomic writes for concurrency safety
//! - `output`: Human and JSON output envelopes

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod lock;
pub mod output;
pub mod paths;
pub mod policy;
pub mod report;
pub mod stats;
pub mod store;
pub mod user;

pub use error::{Error, Result};
