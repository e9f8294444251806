//! tally task command implementations: add, list, done, delete.

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;

use crate::cli::load_context;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::store::{NewTask, TaskRecord};

pub struct AddOptions {
    pub name: String,
    pub description: Option<String>,
    pub due: Option<String>,
    pub priority: Option<String>,
    pub tags: Option<String>,
    pub project: Option<String>,
    pub user: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ListOptions {
    pub limit: Option<usize>,
    pub user: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct DoneOptions {
    pub id: String,
    pub user: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct DeleteOptions {
    pub id: String,
    pub user: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(Serialize)]
struct TaskListOutput {
    total: usize,
    tasks: Vec<TaskRecord>,
}

#[derive(Serialize)]
struct TaskDeletedOutput {
    id: String,
    name: String,
}

pub fn run_add(options: AddOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user, true)?;
    let due_date = parse_due_date(options.due.as_deref())?;

    let task = ctx.store.create_task(
        &ctx.user,
        NewTask {
            name: options.name,
            description: options.description,
            due_date,
            priority: options.priority,
            tags: options.tags,
            project: options.project,
        },
    )?;

    let mut human = HumanOutput::new("Task created");
    human.push_summary("ID", task.id.clone());
    human.push_summary("Name", task.name.clone());
    human.push_summary("Priority", task.priority.clone());
    if let Some(due) = task.due_date {
        human.push_summary("Due", due.to_string());
    }
    if let Some(project) = task.project.clone() {
        human.push_summary("Project", project);
    }
    human.push_next_step(format!("tally done {}", short_id(&task.id)));

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "add",
        &task,
        Some(&human),
    )
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user, true)?;
    let mut tasks = ctx.store.active_for_user(&ctx.user)?;
    if let Some(limit) = options.limit {
        tasks.truncate(limit);
    }

    let output = TaskListOutput {
        total: tasks.len(),
        tasks: tasks.clone(),
    };

    let mut human = HumanOutput::new(format!("Open tasks for {}", ctx.user));
    human.push_summary("Total", tasks.len().to_string());
    for task in &tasks {
        human.push_detail(format_task_line(task));
    }
    if tasks.is_empty() {
        human.push_next_step("tally add <name>".to_string());
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "list",
        &output,
        Some(&human),
    )
}

pub fn run_done(options: DoneOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user, true)?;
    let outcome = ctx.store.complete_task(&ctx.user, &options.id)?;

    let header = if outcome.already_completed {
        "Task already done"
    } else {
        "Task done"
    };
    let mut human = HumanOutput::new(header);
    human.push_summary("ID", outcome.task.id.clone());
    human.push_summary("Name", outcome.task.name.clone());
    if let Some(completed_at) = outcome.task.completed_at {
        human.push_summary("Completed", completed_at.to_rfc3339());
    }
    if outcome.already_completed {
        human.push_warning("task was already completed; completion time unchanged");
    }
    human.push_next_step("tally stats");

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "done",
        &outcome,
        Some(&human),
    )
}

pub fn run_delete(options: DeleteOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user, true)?;
    let task = ctx.store.delete_task(&ctx.user, &options.id)?;

    let output = TaskDeletedOutput {
        id: task.id.clone(),
        name: task.name.clone(),
    };

    let mut human = HumanOutput::new("Task deleted");
    human.push_summary("ID", task.id);
    human.push_summary("Name", task.name);

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "delete",
        &output,
        Some(&human),
    )
}

fn parse_due_date(value: Option<&str>) -> Result<Option<NaiveDate>> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let parsed = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|err| {
        Error::InvalidArgument(format!("invalid due date '{trimmed}' (expected YYYY-MM-DD): {err}"))
    })?;
    Ok(Some(parsed))
}

fn format_task_line(task: &TaskRecord) -> String {
    let mut line = format!("[{}] {} ({})", short_id(&task.id), task.name, task.priority);
    if let Some(due) = task.due_date {
        line.push_str(&format!(", due {due}"));
    }
    if let Some(project) = task.project.as_deref() {
        line.push_str(&format!(", {project}"));
    }
    line
}

/// First eight characters of a ULID, enough to resolve by prefix in practice.
fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}
