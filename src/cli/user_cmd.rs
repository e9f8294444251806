//! tally user command implementation (set/show).

use std::path::PathBuf;

use crate::cli::load_context;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::user;

pub struct SetOptions {
    pub name: String,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ShowOptions {
    pub user: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct UserSetReport {
    user: String,
    path: PathBuf,
}

#[derive(serde::Serialize)]
struct UserShowReport {
    user: String,
}

pub fn run_set(options: SetOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, None, false)?;

    user::persist_user(&ctx.data_dir, &options.name)?;
    let user_name = options.name.trim().to_string();
    let user_path = ctx.data_dir.join("user");

    let report = UserSetReport {
        user: user_name.clone(),
        path: user_path.clone(),
    };

    let mut human = HumanOutput::new(format!("User set: {user_name}"));
    human.push_summary("User", user_name);
    human.push_summary("Path", user_path.display().to_string());
    human.push_next_step("tally add <name>");

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "user set",
        &report,
        Some(&human),
    )
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user, false)?;

    if ctx.user.is_empty() {
        return Err(Error::MissingUser);
    }

    let report = UserShowReport {
        user: ctx.user.clone(),
    };

    let mut human = HumanOutput::new(format!("User: {}", ctx.user));
    human.push_summary("User", ctx.user.clone());

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "user show",
        &report,
        Some(&human),
    )
}
