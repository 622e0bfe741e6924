/// Task model and database operations
///
/// Tasks are the core entity of Taskdeck. Every task belongs to exactly one
/// user; the owner is set at creation, never changes, and every read or write
/// statement filters on it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(100) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     status VARCHAR(20) NOT NULL DEFAULT 'pending',
///     priority INTEGER NOT NULL DEFAULT 3,
///     due_date TIMESTAMPTZ,
///     is_completed BOOLEAN NOT NULL DEFAULT FALSE,
///     tags TEXT[] NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// `is_completed` is derived: it is recomputed from `status` by this module
/// on every insert and update and is not settable by callers. Validation is a
/// pure step ([`validate_task_input`]) invoked before the store normalizes
/// and persists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::Violation;
use crate::query::{self, BindValue, TaskFilter};

/// Task workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Not started yet
    Pending,

    /// Being worked on
    InProgress,

    /// Done; implies `is_completed`
    Completed,
}

impl TaskStatus {
    /// All statuses, in display order
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
    ];

    /// Converts status to its stored string form
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        }
    }

    /// Parses a stored or user-supplied status string
    ///
    /// Returns `None` for anything outside the three valid values.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(TaskStatus::Pending),
            "in-progress" => Some(TaskStatus::InProgress),
            "completed" => Some(TaskStatus::Completed),
            _ => None,
        }
    }

    /// Whether this status means the task is finished
    pub fn is_completed(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }
}

/// Task model representing a personal task record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Owning user; immutable after creation
    pub user_id: Uuid,

    /// Title (3-100 characters)
    pub title: String,

    /// Optional free-form description (up to 1000 characters)
    pub description: String,

    /// Stored status string; always one of [`TaskStatus::ALL`]
    pub status: String,

    /// Priority from 1 (lowest) to 5 (highest)
    pub priority: i32,

    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,

    /// Derived flag: exactly `status == "completed"`
    pub is_completed: bool,

    /// Up to 10 trimmed, non-empty tags
    pub tags: Vec<String>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Typed view of the stored status
    pub fn status(&self) -> Option<TaskStatus> {
        TaskStatus::parse(&self.status)
    }

    /// Whether the task is past its due date and still open
    pub fn is_overdue(&self) -> bool {
        match self.due_date {
            Some(due) if !self.is_completed => Utc::now() > due,
            _ => false,
        }
    }
}

/// Validated input for creating or fully updating a task
///
/// Owner id is deliberately not part of the input: it comes from the
/// authenticated session and is bound by the store operations themselves.
#[derive(Debug, Clone)]
pub struct TaskInput {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: i32,
    pub due_date: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
}

impl TaskInput {
    /// Normalizes the input before persisting
    ///
    /// Trims title and description, trims tags and drops the empty ones.
    /// Invoked by [`Task::create`] and [`Task::update`]; validation runs on
    /// the same normalized form via [`validate_task_input`].
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.description = self.description.trim().to_string();
        self.tags = self
            .tags
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        self
    }
}

/// Validates a normalized task input
///
/// Pure function: `now` is passed in so the due-date rule is checked at a
/// well-defined instant. Returns one violation per failed rule; an empty
/// vector means the input may be persisted.
pub fn validate_task_input(input: &TaskInput, now: DateTime<Utc>) -> Vec<Violation> {
    let mut violations = Vec::new();

    let title_len = input.title.chars().count();
    if !(3..=100).contains(&title_len) {
        violations.push(Violation::new(
            "title",
            "Title must be between 3 and 100 characters",
        ));
    }

    if input.description.chars().count() > 1000 {
        violations.push(Violation::new(
            "description",
            "Description cannot exceed 1000 characters",
        ));
    }

    if !(1..=5).contains(&input.priority) {
        violations.push(Violation::new(
            "priority",
            "Priority must be between 1 and 5",
        ));
    }

    if let Some(due) = input.due_date {
        if due < now {
            violations.push(Violation::new("due_date", "Due date must be in the future"));
        }
    }

    if input.tags.len() > 10 {
        violations.push(Violation::new(
            "tags",
            "A task cannot have more than 10 tags",
        ));
    }

    violations
}

impl Task {
    /// Creates a new task owned by `owner`
    ///
    /// Normalizes the input and derives `is_completed` from the status.
    pub async fn create(
        pool: &PgPool,
        owner: Uuid,
        input: TaskInput,
    ) -> Result<Self, sqlx::Error> {
        let input = input.normalized();

        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (user_id, title, description, status, priority, due_date, is_completed, tags)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, user_id, title, description, status, priority, due_date,
                      is_completed, tags, created_at, updated_at
            "#,
        )
        .bind(owner)
        .bind(input.title)
        .bind(input.description)
        .bind(input.status.as_str())
        .bind(input.priority)
        .bind(input.due_date)
        .bind(input.status.is_completed())
        .bind(input.tags)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID, scoped to its owner
    ///
    /// Returns `None` both when the task does not exist and when it belongs
    /// to another user; callers surface one merged outcome for the two cases
    /// so the existence of other users' tasks is never leaked.
    pub async fn find_for_owner(
        pool: &PgPool,
        id: Uuid,
        owner: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, title, description, status, priority, due_date,
                   is_completed, tags, created_at, updated_at
            FROM tasks
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Replaces a task's fields, scoped to its owner
    ///
    /// `is_completed` and `updated_at` are recomputed; the owner column is
    /// never touched. Returns `None` when no row matched (absent or owned by
    /// someone else). Concurrent edits by the same owner are last-write-wins.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        owner: Uuid,
        input: TaskInput,
    ) -> Result<Option<Self>, sqlx::Error> {
        let input = input.normalized();

        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET title = $3,
                description = $4,
                status = $5,
                priority = $6,
                due_date = $7,
                is_completed = $8,
                tags = $9,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, title, description, status, priority, due_date,
                      is_completed, tags, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(input.title)
        .bind(input.description)
        .bind(input.status.as_str())
        .bind(input.priority)
        .bind(input.due_date)
        .bind(input.status.is_completed())
        .bind(input.tags)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Deletes a task, scoped to its owner
    ///
    /// Returns true if a row was removed. Deleting a missing task and
    /// deleting another user's task are indistinguishable, matching
    /// [`Task::find_for_owner`].
    pub async fn delete(pool: &PgPool, id: Uuid, owner: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists the owner's tasks matching a filter specification
    ///
    /// The filter is compiled by [`query::compose`]; the owner predicate is
    /// always first and cannot be displaced by filter input.
    pub async fn list(
        pool: &PgPool,
        owner: Uuid,
        filter: &TaskFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let composed = query::compose(owner, filter);

        let mut q = sqlx::query_as::<_, Task>(&composed.sql);
        for bind in composed.binds {
            q = match bind {
                BindValue::Uuid(v) => q.bind(v),
                BindValue::Text(v) => q.bind(v),
                BindValue::Int(v) => q.bind(v),
            };
        }

        q.fetch_all(pool).await
    }

    /// Lists all of the owner's tasks, newest first
    ///
    /// Used alongside [`Task::list`] to compute per-status counts and the
    /// distinct tag list independent of any active filter.
    pub async fn list_all(pool: &PgPool, owner: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, title, description, status, priority, due_date,
                   is_completed, tags, created_at, updated_at
            FROM tasks
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }
}
