//! tally archive and export command implementations.

use std::path::PathBuf;

use chrono::{Duration, Utc};
use serde::Serialize;

use crate::cli::load_context;
use crate::error::{Error, Result};
use crate::export;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::store::TaskRecord;

pub struct ArchiveOptions {
    pub range: String,
    pub page: usize,
    pub page_size: usize,
    pub user: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ExportOptions {
    pub output: Option<PathBuf>,
    pub user: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveRange {
    Today,
    Week,
    Month,
}

impl ArchiveRange {
    fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(Self::Today),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            other => Err(Error::InvalidArgument(format!(
                "unknown archive range '{other}' (expected today, week, or month)"
            ))),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

#[derive(Serialize)]
struct ArchiveOutput {
    range: &'static str,
    page: usize,
    page_size: usize,
    total_in_range: usize,
    has_more: bool,
    tasks: Vec<TaskRecord>,
}

#[derive(Serialize)]
struct ExportOutput {
    rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    csv: Option<String>,
}

pub fn run_archive(options: ArchiveOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user, true)?;
    let range = ArchiveRange::parse(&options.range)?;
    if options.page_size == 0 {
        return Err(Error::InvalidArgument("page size must be at least 1".to_string()));
    }

    let now = Utc::now();
    let completed = ctx.store.completed_for_user(&ctx.user)?;
    let in_range: Vec<TaskRecord> = completed
        .into_iter()
        .filter(|task| {
            let Some(completed_at) = task.completed_at else {
                // No timestamp to classify by; export still carries these.
                return false;
            };
            match range {
                ArchiveRange::Today => completed_at.date_naive() == now.date_naive(),
                ArchiveRange::Week => completed_at >= now - Duration::days(7),
                ArchiveRange::Month => completed_at >= now - Duration::days(30),
            }
        })
        .collect();

    let total_in_range = in_range.len();
    let start = options.page.saturating_mul(options.page_size);
    let page_tasks: Vec<TaskRecord> = in_range
        .into_iter()
        .skip(start)
        .take(options.page_size)
        .collect();
    let has_more = start + page_tasks.len() < total_in_range;

    let output = ArchiveOutput {
        range: range.label(),
        page: options.page,
        page_size: options.page_size,
        total_in_range,
        has_more,
        tasks: page_tasks.clone(),
    };

    let mut human = HumanOutput::new(format!(
        "Archive ({}) for {}",
        range.label(),
        ctx.user
    ));
    human.push_summary("Completed in range", total_in_range.to_string());
    human.push_summary(
        "Page",
        format!("{} ({} per page)", options.page, options.page_size),
    );
    for task in &page_tasks {
        let completed = task
            .completed_at
            .map(|ts| ts.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        human.push_detail(format!("{completed}  {}", task.name));
    }
    if has_more {
        human.push_next_step(format!(
            "tally archive --range {} --page {}",
            range.label(),
            options.page + 1
        ));
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "archive",
        &output,
        Some(&human),
    )
}

pub fn run_export(options: ExportOptions) -> Result<()> {
    let ctx = load_context(options.data_dir, options.user, true)?;
    let completed = ctx.store.completed_for_user(&ctx.user)?;
    let csv = export::archive_csv(&completed);
    let rows = completed.len();

    if let Some(path) = options.output {
        std::fs::write(&path, &csv)?;

        let output = ExportOutput {
            rows,
            path: Some(path.clone()),
            csv: None,
        };
        let mut human = HumanOutput::new("Archive exported");
        human.push_summary("Rows", rows.to_string());
        human.push_summary("Path", path.display().to_string());

        return emit_success(
            OutputOptions {
                json: options.json,
                quiet: options.quiet,
            },
            "export",
            &output,
            Some(&human),
        );
    }

    if options.json {
        let output = ExportOutput {
            rows,
            path: None,
            csv: Some(csv),
        };
        return emit_success(
            OutputOptions {
                json: true,
                quiet: options.quiet,
            },
            "export",
            &output,
            None,
        );
    }

    // Raw CSV on stdout so the command composes with shell pipelines.
    print!("{csv}");
    Ok(())
}
