//! Task storage for tally.
//!
//! Tasks are stored as append-only events in `tasks.jsonl` inside the data
//! directory, with a replayed state snapshot in `tasks.snapshot.json`.
//! Writers serialize through a file lock; the snapshot is rewritten
//! atomically after every append so reads stay cheap.

use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::config::TasksConfig;
use crate::error::{Error, Result};
use crate::lock::{self, FileLock, DEFAULT_LOCK_TIMEOUT_MS};

const TASKS_LOG: &str = "tasks.jsonl";
const TASKS_SNAPSHOT: &str = "tasks.snapshot.json";
const TASKS_LOCK: &str = "tasks.lock";
const TASKS_SCHEMA_VERSION: &str = "tally.tasks.v1";

fn default_task_priority() -> String {
    "medium".to_string()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskEventType {
    TaskCreated,
    TaskCompleted,
    TaskDeleted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEvent {
    pub event_id: String,
    pub task_id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub event_type: TaskEventType,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

impl TaskEvent {
    pub fn new(
        event_type: TaskEventType,
        task_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            event_id: Ulid::new().to_string(),
            task_id: task_id.into(),
            user_id: user_id.into(),
            event_type,
            timestamp: Utc::now(),
            name: None,
            description: None,
            due_date: None,
            priority: None,
            tags: None,
            project: None,
        }
    }
}

/// Replayed task state. The completion fields (`is_completed`,
/// `completed_at`) are the completion record the stats engine consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default = "default_task_priority")]
    pub priority: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub tasks: Vec<TaskRecord>,
}

impl TaskSnapshot {
    pub fn empty() -> Self {
        Self {
            schema_version: TASKS_SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            tasks: Vec::new(),
        }
    }
}

/// Creation payload for a new task
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub name: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<String>,
    pub tags: Option<String>,
    pub project: Option<String>,
}

/// Outcome of a completion request
#[derive(Debug, Clone, Serialize)]
pub struct CompleteOutcome {
    pub task: TaskRecord,
    /// True when the task was already completed; no event was written
    pub already_completed: bool,
}

#[derive(Debug, Clone)]
pub struct TaskStore {
    data_dir: PathBuf,
    config: TasksConfig,
}

impl TaskStore {
    pub fn new(data_dir: PathBuf, config: TasksConfig) -> Self {
        Self { data_dir, config }
    }

    pub fn config(&self) -> &TasksConfig {
        &self.config
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(TASKS_LOG)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(TASKS_SNAPSHOT)
    }

    fn lock_path(&self) -> PathBuf {
        self.data_dir.join(TASKS_LOCK)
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Create a task for a user and return its replayed record.
    pub fn create_task(&self, user_id: &str, new_task: NewTask) -> Result<TaskRecord> {
        let name = new_task.name.trim();
        if name.is_empty() {
            return Err(Error::InvalidArgument("task name cannot be empty".to_string()));
        }

        let mut event = TaskEvent::new(TaskEventType::TaskCreated, Ulid::new().to_string(), user_id);
        event.name = Some(name.to_string());
        event.description = normalize_optional(new_task.description);
        event.due_date = new_task.due_date;
        event.priority = Some(self.config.normalize_priority(new_task.priority.as_deref()));
        event.tags = normalize_optional(new_task.tags);
        event.project = normalize_optional(new_task.project);

        let task_id = event.task_id.clone();
        let snapshot = self.append_event(event)?;
        snapshot
            .tasks
            .into_iter()
            .find(|task| task.id == task_id)
            .ok_or_else(|| Error::OperationFailed("created task missing from snapshot".to_string()))
    }

    /// Mark a task as completed.
    ///
    /// Completing an already-completed task is reported, not re-stamped:
    /// the original completion timestamp is the one streaks are built from.
    pub fn complete_task(&self, user_id: &str, id_or_prefix: &str) -> Result<CompleteOutcome> {
        let task = self.resolve_task(user_id, id_or_prefix)?;
        if task.is_completed {
            return Ok(CompleteOutcome {
                task,
                already_completed: true,
            });
        }

        let event = TaskEvent::new(TaskEventType::TaskCompleted, task.id.clone(), user_id);
        let snapshot = self.append_event(event)?;
        let task = snapshot
            .tasks
            .into_iter()
            .find(|entry| entry.id == task.id)
            .ok_or_else(|| Error::TaskNotFound(task.id.clone()))?;
        Ok(CompleteOutcome {
            task,
            already_completed: false,
        })
    }

    /// Delete a task and return its last known record.
    pub fn delete_task(&self, user_id: &str, id_or_prefix: &str) -> Result<TaskRecord> {
        let task = self.resolve_task(user_id, id_or_prefix)?;
        let event = TaskEvent::new(TaskEventType::TaskDeleted, task.id.clone(), user_id);
        self.append_event(event)?;
        Ok(task)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// All tasks owned by a user, in replay order.
    pub fn tasks_for_user(&self, user_id: &str) -> Result<Vec<TaskRecord>> {
        let snapshot = self.load_snapshot()?;
        Ok(snapshot
            .tasks
            .into_iter()
            .filter(|task| task.user_id == user_id)
            .collect())
    }

    /// Open tasks for a user, newest first.
    pub fn active_for_user(&self, user_id: &str) -> Result<Vec<TaskRecord>> {
        let mut tasks = self.tasks_for_user(user_id)?;
        tasks.retain(|task| !task.is_completed);
        tasks.sort_by(|left, right| {
            right
                .created_at
                .cmp(&left.created_at)
                .then_with(|| left.id.cmp(&right.id))
        });
        Ok(tasks)
    }

    /// Completed tasks for a user, most recently completed first.
    ///
    /// Malformed records (completed without a timestamp) sort last rather
    /// than disappearing; the stats engine excludes them separately.
    pub fn completed_for_user(&self, user_id: &str) -> Result<Vec<TaskRecord>> {
        let mut tasks = self.tasks_for_user(user_id)?;
        tasks.retain(|task| task.is_completed);
        tasks.sort_by(|left, right| {
            right
                .completed_at
                .cmp(&left.completed_at)
                .then_with(|| left.id.cmp(&right.id))
        });
        Ok(tasks)
    }

    /// Resolve a task by exact id or unique prefix, scoped to one user.
    pub fn resolve_task(&self, user_id: &str, id_or_prefix: &str) -> Result<TaskRecord> {
        let needle = id_or_prefix.trim();
        if needle.is_empty() {
            return Err(Error::InvalidArgument("task id cannot be empty".to_string()));
        }

        let tasks = self.tasks_for_user(user_id)?;
        if let Some(task) = tasks.iter().find(|task| task.id.eq_ignore_ascii_case(needle)) {
            return Ok(task.clone());
        }

        let needle_upper = needle.to_uppercase();
        let matches: Vec<&TaskRecord> = tasks
            .iter()
            .filter(|task| task.id.starts_with(&needle_upper))
            .collect();
        match matches.len() {
            0 => Err(Error::TaskNotFound(needle.to_string())),
            1 => Ok(matches[0].clone()),
            count => Err(Error::AmbiguousTaskId {
                id: needle.to_string(),
                matches: count,
            }),
        }
    }

    // =========================================================================
    // Event log and snapshot plumbing
    // =========================================================================

    /// Append an event and refresh the snapshot, returning the new state.
    pub fn append_event(&self, event: TaskEvent) -> Result<TaskSnapshot> {
        self.ensure_dirs()?;
        let _guard = FileLock::acquire(self.lock_path(), DEFAULT_LOCK_TIMEOUT_MS)?;

        self.append_to_log(&event)?;

        let mut snapshot = self.load_snapshot_unlocked()?;
        let mut by_id = index_tasks(snapshot.tasks);
        apply_event(&mut by_id, &event);
        snapshot.tasks = collect_tasks(by_id);
        snapshot.generated_at = Utc::now();
        self.write_snapshot(&snapshot)?;

        Ok(snapshot)
    }

    /// Load the snapshot, rebuilding from the event log when it is missing
    /// or unreadable.
    pub fn load_snapshot(&self) -> Result<TaskSnapshot> {
        let _guard = FileLock::acquire(self.lock_path(), DEFAULT_LOCK_TIMEOUT_MS)?;
        self.load_snapshot_unlocked()
    }

    fn load_snapshot_unlocked(&self) -> Result<TaskSnapshot> {
        let path = self.snapshot_path();
        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(raw) => match serde_json::from_str::<TaskSnapshot>(&raw) {
                    Ok(snapshot) if snapshot.schema_version == TASKS_SCHEMA_VERSION => {
                        return Ok(snapshot)
                    }
                    Ok(snapshot) => {
                        tracing::warn!(
                            "snapshot schema '{}' does not match '{}', replaying log",
                            snapshot.schema_version,
                            TASKS_SCHEMA_VERSION
                        );
                    }
                    Err(err) => {
                        tracing::warn!("snapshot unreadable ({err}), replaying log");
                    }
                },
                Err(err) => {
                    tracing::warn!("snapshot unreadable ({err}), replaying log");
                }
            }
        }
        self.replay()
    }

    /// Rebuild state from the event log.
    ///
    /// Lines that fail to parse are skipped with a warning: a torn write
    /// from a killed process must not poison the whole store.
    pub fn replay(&self) -> Result<TaskSnapshot> {
        let events = self.read_events()?;
        let mut by_id = HashMap::new();
        for event in &events {
            apply_event(&mut by_id, event);
        }

        Ok(TaskSnapshot {
            schema_version: TASKS_SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            tasks: collect_tasks(by_id),
        })
    }

    /// Read all parseable events from the log.
    pub fn read_events(&self) -> Result<Vec<TaskEvent>> {
        let path = self.log_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = fs::File::open(&path)?;
        let reader = BufReader::new(file);
        let mut events = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<TaskEvent>(&line) {
                Ok(event) => events.push(event),
                Err(err) => {
                    tracing::warn!("skipping malformed event at line {} ({err})", index + 1);
                }
            }
        }
        Ok(events)
    }

    fn append_to_log(&self, event: &TaskEvent) -> Result<()> {
        let json = serde_json::to_string(event)?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_path())?;
        writeln!(file, "{}", json)?;
        file.sync_all()?;
        Ok(())
    }

    fn write_snapshot(&self, snapshot: &TaskSnapshot) -> Result<()> {
        let json = serde_json::to_string_pretty(snapshot)?;
        lock::write_atomic_str(self.snapshot_path(), &json)
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value.and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn index_tasks(tasks: Vec<TaskRecord>) -> HashMap<String, TaskRecord> {
    tasks.into_iter().map(|task| (task.id.clone(), task)).collect()
}

fn collect_tasks(by_id: HashMap<String, TaskRecord>) -> Vec<TaskRecord> {
    let mut tasks: Vec<TaskRecord> = by_id.into_values().collect();
    tasks.sort_by(|left, right| {
        left.created_at
            .cmp(&right.created_at)
            .then_with(|| left.id.cmp(&right.id))
    });
    tasks
}

/// Apply one event to the replayed state.
///
/// Events that do not match a known task (or target another user's task)
/// are skipped with a warning; replay is total over whatever is in the log.
fn apply_event(tasks: &mut HashMap<String, TaskRecord>, event: &TaskEvent) {
    match event.event_type {
        TaskEventType::TaskCreated => {
            let Some(name) = event.name.as_deref() else {
                tracing::warn!("create event {} has no task name, skipping", event.event_id);
                return;
            };
            if tasks.contains_key(&event.task_id) {
                tracing::warn!("duplicate create for task {}, skipping", event.task_id);
                return;
            }
            tasks.insert(
                event.task_id.clone(),
                TaskRecord {
                    id: event.task_id.clone(),
                    user_id: event.user_id.clone(),
                    name: name.to_string(),
                    description: event.description.clone(),
                    due_date: event.due_date,
                    priority: event
                        .priority
                        .clone()
                        .unwrap_or_else(default_task_priority),
                    tags: event.tags.clone(),
                    project: event.project.clone(),
                    created_at: event.timestamp,
                    is_completed: false,
                    completed_at: None,
                },
            );
        }
        TaskEventType::TaskCompleted => {
            let Some(task) = tasks.get_mut(&event.task_id) else {
                tracing::warn!("completion for unknown task {}, skipping", event.task_id);
                return;
            };
            if task.user_id != event.user_id {
                tracing::warn!(
                    "completion for task {} by non-owner '{}', skipping",
                    event.task_id,
                    event.user_id
                );
                return;
            }
            if task.is_completed {
                // First completion wins; replays of duplicate events keep
                // the original timestamp.
                return;
            }
            task.is_completed = true;
            task.completed_at = Some(event.timestamp);
        }
        TaskEventType::TaskDeleted => {
            let owner_matches = tasks
                .get(&event.task_id)
                .map(|task| task.user_id == event.user_id)
                .unwrap_or(false);
            if owner_matches {
                tasks.remove(&event.task_id);
            } else {
                tracing::warn!("delete for unknown task {}, skipping", event.task_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_in(dir: &Path) -> TaskStore {
        TaskStore::new(dir.to_path_buf(), TasksConfig::default())
    }

    #[test]
    fn apply_event_builds_record() {
        let mut tasks = HashMap::new();
        let mut create = TaskEvent::new(TaskEventType::TaskCreated, "task-1", "alice");
        create.name = Some("Water the plants".to_string());
        create.priority = Some("high".to_string());
        apply_event(&mut tasks, &create);

        let complete = TaskEvent::new(TaskEventType::TaskCompleted, "task-1", "alice");
        apply_event(&mut tasks, &complete);

        let task = tasks.get("task-1").expect("task");
        assert_eq!(task.name, "Water the plants");
        assert_eq!(task.priority, "high");
        assert!(task.is_completed);
        assert_eq!(task.completed_at, Some(complete.timestamp));
    }

    #[test]
    fn completion_by_non_owner_is_skipped() {
        let mut tasks = HashMap::new();
        let mut create = TaskEvent::new(TaskEventType::TaskCreated, "task-1", "alice");
        create.name = Some("Private".to_string());
        apply_event(&mut tasks, &create);

        let complete = TaskEvent::new(TaskEventType::TaskCompleted, "task-1", "bob");
        apply_event(&mut tasks, &complete);

        assert!(!tasks.get("task-1").expect("task").is_completed);
    }

    #[test]
    fn duplicate_completion_keeps_first_timestamp() {
        let mut tasks = HashMap::new();
        let mut create = TaskEvent::new(TaskEventType::TaskCreated, "task-1", "alice");
        create.name = Some("Task".to_string());
        apply_event(&mut tasks, &create);

        let mut first = TaskEvent::new(TaskEventType::TaskCompleted, "task-1", "alice");
        first.timestamp = Utc::now() - chrono::Duration::hours(2);
        apply_event(&mut tasks, &first);

        let second = TaskEvent::new(TaskEventType::TaskCompleted, "task-1", "alice");
        apply_event(&mut tasks, &second);

        let task = tasks.get("task-1").expect("task");
        assert_eq!(task.completed_at, Some(first.timestamp));
    }

    #[test]
    fn lifecycle_round_trip() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(dir.path());

        let created = store
            .create_task(
                "alice",
                NewTask {
                    name: "Write report".to_string(),
                    description: Some("quarterly".to_string()),
                    priority: Some("HIGH".to_string()),
                    ..NewTask::default()
                },
            )
            .expect("create");
        assert_eq!(created.priority, "high");
        assert!(!created.is_completed);

        let active = store.active_for_user("alice").expect("active");
        assert_eq!(active.len(), 1);

        let outcome = store.complete_task("alice", &created.id).expect("complete");
        assert!(!outcome.already_completed);
        assert!(outcome.task.is_completed);
        assert!(outcome.task.completed_at.is_some());

        let again = store.complete_task("alice", &created.id).expect("again");
        assert!(again.already_completed);
        assert_eq!(again.task.completed_at, outcome.task.completed_at);

        assert!(store.active_for_user("alice").expect("active").is_empty());
        assert_eq!(store.completed_for_user("alice").expect("done").len(), 1);

        store.delete_task("alice", &created.id).expect("delete");
        assert!(store.tasks_for_user("alice").expect("all").is_empty());
    }

    #[test]
    fn users_are_isolated() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(dir.path());

        let task = store
            .create_task(
                "alice",
                NewTask {
                    name: "Alice's task".to_string(),
                    ..NewTask::default()
                },
            )
            .expect("create");

        assert!(store.tasks_for_user("bob").expect("bob").is_empty());
        assert!(matches!(
            store.complete_task("bob", &task.id),
            Err(Error::TaskNotFound(_))
        ));
    }

    #[test]
    fn prefix_resolution() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(dir.path());

        let task = store
            .create_task(
                "alice",
                NewTask {
                    name: "Prefixed".to_string(),
                    ..NewTask::default()
                },
            )
            .expect("create");

        let prefix = &task.id[..8];
        let resolved = store.resolve_task("alice", &prefix.to_lowercase()).expect("resolve");
        assert_eq!(resolved.id, task.id);

        assert!(matches!(
            store.resolve_task("alice", "zzzzzz"),
            Err(Error::TaskNotFound(_))
        ));
    }

    #[test]
    fn replay_skips_torn_lines() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(dir.path());

        store
            .create_task(
                "alice",
                NewTask {
                    name: "Survives".to_string(),
                    ..NewTask::default()
                },
            )
            .expect("create");

        // Simulate a torn concurrent write.
        let mut file = fs::OpenOptions::new()
            .append(true)
            .open(store.log_path())
            .expect("open log");
        writeln!(file, "{{\"event_id\":\"trunc").expect("write");
        drop(file);

        let snapshot = store.replay().expect("replay");
        assert_eq!(snapshot.tasks.len(), 1);
        assert_eq!(snapshot.tasks[0].name, "Survives");
    }

    #[test]
    fn snapshot_rebuilds_when_unreadable() {
        let dir = tempdir().expect("tempdir");
        let store = store_in(dir.path());

        store
            .create_task(
                "alice",
                NewTask {
                    name: "Persistent".to_string(),
                    ..NewTask::default()
                },
            )
            .expect("create");

        fs::write(store.snapshot_path(), "not json").expect("corrupt snapshot");

        let tasks = store.tasks_for_user("alice").expect("load");
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name, "Persistent");
    }
}
