//! Command-line interface for tally
//!
//! This module defines the CLI structure using clap derive macros.
//! Command implementations live in per-domain submodules.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::Result;
use crate::paths;
use crate::store::TaskStore;
use crate::user;

mod archive;
mod stats;
mod task;
mod user_cmd;

/// tally - task tracking with habit statistics
///
/// Add and complete tasks, then watch streaks, daily goal progress, and
/// consistency derived from your completion history.
#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory (defaults to the platform data dir)
    #[arg(long, global = true, env = "TALLY_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// User the command acts for
    #[arg(long, global = true, env = "TALLY_USER")]
    pub user: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a new task
    Add {
        /// Task name
        name: String,

        /// Longer description
        #[arg(long)]
        description: Option<String>,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,

        /// Priority: low, medium, high
        #[arg(long)]
        priority: Option<String>,

        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,

        /// Project the task belongs to
        #[arg(long)]
        project: Option<String>,
    },

    /// List open tasks, newest first
    List {
        /// Show at most this many tasks
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Mark a task as done
    Done {
        /// Task id or unique prefix
        id: String,
    },

    /// Delete a task
    Delete {
        /// Task id or unique prefix
        id: String,
    },

    /// Habit statistics: streaks, goal progress, consistency
    Stats {
        /// Daily completion goal (overrides config)
        #[arg(long)]
        goal: Option<i64>,

        /// Consistency window in days (overrides config)
        #[arg(long)]
        window: Option<u32>,
    },

    /// Browse completed tasks
    Archive {
        /// Time range: today, week, month
        #[arg(long, default_value = "month")]
        range: String,

        /// Page number, starting at 0
        #[arg(long, default_value_t = 0)]
        page: usize,

        /// Tasks per page
        #[arg(long, default_value_t = 10)]
        page_size: usize,
    },

    /// Export completed tasks as CSV
    Export {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// User identity management
    #[command(subcommand)]
    User(UserCommands),
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Persist the default user identity
    Set {
        /// User name
        name: String,
    },

    /// Show the resolved user identity
    Show,
}

/// Shared per-invocation context: resolved data dir, config, store, user.
pub(crate) struct CommandContext {
    pub store: TaskStore,
    pub config: Config,
    pub user: String,
    pub data_dir: PathBuf,
}

/// Build the command context shared by every handler.
///
/// `require_user` is false only for commands that manage identity itself.
pub(crate) fn load_context(
    data_dir: Option<PathBuf>,
    cli_user: Option<String>,
    require_user: bool,
) -> Result<CommandContext> {
    let data_dir = paths::resolve_data_dir(data_dir.as_deref())?;
    let config = Config::load_from_data_dir(&data_dir);
    let store = TaskStore::new(data_dir.clone(), config.tasks.clone());

    let user = match user::resolve_user(&data_dir, cli_user.as_deref(), &config) {
        Ok(user) => user,
        Err(err) if require_user => return Err(err),
        Err(_) => String::new(),
    };

    Ok(CommandContext {
        store,
        config,
        user,
        data_dir,
    })
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Add {
                name,
                description,
                due,
                priority,
                tags,
                project,
            } => task::run_add(task::AddOptions {
                name,
                description,
                due,
                priority,
                tags,
                project,
                user: self.user,
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::List { limit } => task::run_list(task::ListOptions {
                limit,
                user: self.user,
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Done { id } => task::run_done(task::DoneOptions {
                id,
                user: self.user,
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Delete { id } => task::run_delete(task::DeleteOptions {
                id,
                user: self.user,
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Stats { goal, window } => stats::run_stats(stats::StatsOptions {
                goal,
                window,
                user: self.user,
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Archive {
                range,
                page,
                page_size,
            } => archive::run_archive(archive::ArchiveOptions {
                range,
                page,
                page_size,
                user: self.user,
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Export { output } => archive::run_export(archive::ExportOptions {
                output,
                user: self.user,
                data_dir: self.data_dir,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::User(cmd) => match cmd {
                UserCommands::Set { name } => user_cmd::run_set(user_cmd::SetOptions {
                    name,
                    data_dir: self.data_dir,
                    json: self.json,
                    quiet: self.quiet,
                }),
                UserCommands::Show => user_cmd::run_show(user_cmd::ShowOptions {
                    user: self.user,
                    data_dir: self.data_dir,
                    json: self.json,
                    quiet: self.quiet,
                }),
            },
        }
    }
}
