/// Task endpoints
///
/// List with search/filter/sort, plus create/edit/update/delete. Every
/// handler takes [`CurrentUser`], and every store operation is scoped to the
/// authenticated owner. A task that does not exist and a task owned by
/// someone else produce the same outcome and the same message, so these
/// endpoints never reveal whether another user's task id is real.
///
/// # Endpoints
///
/// - `GET /tasks` - list/search/filter/sort
/// - `GET /tasks/new`, `POST /tasks` - render/create
/// - `GET /tasks/edit/:id`, `POST /tasks/update/:id` - render/update
/// - `POST /tasks/delete/:id` - delete

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;
use uuid::Uuid;

use taskdeck_core::auth::session::{AuthSession, FlashKind};
use taskdeck_core::models::task::{validate_task_input, Task, TaskInput, TaskStatus};
use taskdeck_core::models::Violation;
use taskdeck_core::query::{TaskBoard, TaskFilter};

use crate::{
    app::AppState,
    error::WebResult,
    middleware::{auth::CurrentUser, csrf::CsrfToken},
};

/// The single user-facing message for a missing task and a foreign task
const NOT_FOUND_OR_FORBIDDEN: &str = "Task not found or you do not have permission";

/// Raw listing parameters; anything invalid is ignored by the filter parser
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub tag: Option<String>,
    pub sort: Option<String>,
}

/// Task form fields, as submitted
#[derive(Debug, Deserialize)]
pub struct TaskForm {
    pub title: String,

    #[serde(default)]
    pub description: String,

    pub status: String,

    pub priority: String,

    /// Accepts RFC 3339, `YYYY-MM-DDTHH:MM` (datetime-local inputs), or a
    /// bare date; empty means no due date
    #[serde(default)]
    pub due_date: String,

    /// Comma-separated
    #[serde(default)]
    pub tags: String,
}

impl TaskForm {
    /// Converts the submitted strings into validated task input
    ///
    /// Field-shape problems (unknown status, unparseable date) and rule
    /// violations are collected together so the form re-renders with the
    /// complete list.
    fn parse(&self, now: DateTime<Utc>) -> Result<TaskInput, Vec<Violation>> {
        let mut violations = Vec::new();

        let status = match TaskStatus::parse(self.status.trim()) {
            Some(status) => status,
            None => {
                violations.push(Violation::new("status", "Invalid status"));
                TaskStatus::Pending
            }
        };

        // Out-of-range sentinel; validate_task_input reports the range
        let priority = self.priority.trim().parse::<i32>().unwrap_or(0);

        let due_date = match self.due_date.trim() {
            "" => None,
            raw => match parse_due_date(raw) {
                Some(parsed) => Some(parsed),
                None => {
                    violations.push(Violation::new("due_date", "Invalid date format"));
                    None
                }
            },
        };

        let tags = self
            .tags
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        let input = TaskInput {
            title: self.title.clone(),
            description: self.description.clone(),
            status,
            priority,
            due_date,
            tags,
        }
        .normalized();

        violations.extend(validate_task_input(&input, now));

        if violations.is_empty() {
            Ok(input)
        } else {
            Err(violations)
        }
    }

    /// Prior input echoed back on re-render
    fn echo(&self) -> serde_json::Value {
        json!({
            "title": self.title,
            "description": self.description,
            "status": self.status,
            "priority": self.priority,
            "due_date": self.due_date,
            "tags": self.tags,
        })
    }
}

/// Parses the due-date field in the formats browsers actually submit
fn parse_due_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M") {
        return Some(parsed.and_utc());
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(parsed.and_utc());
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return parsed.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    None
}

/// GET /tasks
///
/// The filtered listing plus filter-independent aggregates: per-status
/// counts and the distinct tag list come from the owner's full task set, so
/// the status board and the tag dropdown stay stable while filters narrow
/// the visible rows.
pub async fn list_tasks(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    session: Session,
    Extension(csrf): Extension<CsrfToken>,
    Query(params): Query<ListParams>,
) -> WebResult<Response> {
    let filter = TaskFilter::from_raw(
        params.search.as_deref(),
        params.status.as_deref(),
        params.priority.as_deref(),
        params.tag.as_deref(),
        params.sort.as_deref(),
    );

    let tasks = Task::list(&state.db, user.id, &filter).await?;

    // One query when nothing narrows the listing
    let board = if filter.is_unfiltered() {
        TaskBoard::summarize(&tasks)
    } else {
        let all = Task::list_all(&state.db, user.id).await?;
        TaskBoard::summarize(&all)
    };

    let auth = AuthSession::new(session);
    let flashes = auth.take_flashes().await?;

    Ok(state.renderer.render(
        "tasks/index",
        json!({
            "title": "My Tasks - Taskdeck",
            "csrf": csrf.0,
            "flashes": flashes,
            "current_user": user,
            "tasks": tasks,
            "counts": board.counts,
            "all_tags": board.tags,
            "filters": {
                "search": params.search.unwrap_or_default(),
                "status": params.status.unwrap_or_default(),
                "priority": params.priority.unwrap_or_default(),
                "tag": params.tag.unwrap_or_default(),
                "sort": params.sort.unwrap_or_default(),
            },
        }),
    ))
}

/// GET /tasks/new
pub async fn new_task_form(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    session: Session,
    Extension(csrf): Extension<CsrfToken>,
) -> WebResult<Response> {
    let auth = AuthSession::new(session);
    let flashes = auth.take_flashes().await?;

    Ok(state.renderer.render(
        "tasks/new",
        json!({
            "title": "New Task - Taskdeck",
            "csrf": csrf.0,
            "flashes": flashes,
            "current_user": user,
            "errors": [],
            "form": {},
        }),
    ))
}

/// POST /tasks
pub async fn create_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    session: Session,
    Extension(csrf): Extension<CsrfToken>,
    Form(form): Form<TaskForm>,
) -> WebResult<Response> {
    let auth = AuthSession::new(session);

    let input = match form.parse(Utc::now()) {
        Ok(input) => input,
        Err(violations) => {
            let flashes = auth.take_flashes().await?;
            let page = state.renderer.render(
                "tasks/new",
                json!({
                    "title": "New Task - Taskdeck",
                    "csrf": csrf.0,
                    "flashes": flashes,
                    "current_user": user,
                    "errors": violations,
                    "form": form.echo(),
                }),
            );
            return Ok((StatusCode::BAD_REQUEST, page).into_response());
        }
    };

    Task::create(&state.db, user.id, input).await?;

    auth.flash(FlashKind::Success, "Task created successfully!").await?;
    Ok(Redirect::to("/tasks").into_response())
}

/// GET /tasks/edit/:id
pub async fn edit_task_form(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    session: Session,
    Extension(csrf): Extension<CsrfToken>,
    Path(id): Path<Uuid>,
) -> WebResult<Response> {
    let auth = AuthSession::new(session);

    let Some(task) = Task::find_for_owner(&state.db, id, user.id).await? else {
        auth.flash(FlashKind::Error, NOT_FOUND_OR_FORBIDDEN).await?;
        return Ok(Redirect::to("/tasks").into_response());
    };

    let flashes = auth.take_flashes().await?;
    Ok(state.renderer.render(
        "tasks/edit",
        json!({
            "title": "Edit Task - Taskdeck",
            "csrf": csrf.0,
            "flashes": flashes,
            "current_user": user,
            "errors": [],
            "task": task,
            "form": {},
        }),
    ))
}

/// POST /tasks/update/:id
pub async fn update_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    session: Session,
    Extension(csrf): Extension<CsrfToken>,
    Path(id): Path<Uuid>,
    Form(form): Form<TaskForm>,
) -> WebResult<Response> {
    let auth = AuthSession::new(session);

    let input = match form.parse(Utc::now()) {
        Ok(input) => input,
        Err(violations) => {
            // Reload the task (ownership-checked) so the form has something
            // to re-render around
            let Some(task) = Task::find_for_owner(&state.db, id, user.id).await? else {
                auth.flash(FlashKind::Error, NOT_FOUND_OR_FORBIDDEN).await?;
                return Ok(Redirect::to("/tasks").into_response());
            };

            let flashes = auth.take_flashes().await?;
            let page = state.renderer.render(
                "tasks/edit",
                json!({
                    "title": "Edit Task - Taskdeck",
                    "csrf": csrf.0,
                    "flashes": flashes,
                    "current_user": user,
                    "errors": violations,
                    "task": task,
                    "form": form.echo(),
                }),
            );
            return Ok((StatusCode::BAD_REQUEST, page).into_response());
        }
    };

    match Task::update(&state.db, id, user.id, input).await? {
        Some(_) => {
            auth.flash(FlashKind::Success, "Task updated successfully!").await?;
        }
        None => {
            auth.flash(FlashKind::Error, NOT_FOUND_OR_FORBIDDEN).await?;
        }
    }

    Ok(Redirect::to("/tasks").into_response())
}

/// POST /tasks/delete/:id
///
/// Idempotent from the caller's view: a second delete, a bogus id, and
/// another user's id all produce the same outcome.
pub async fn delete_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    session: Session,
    Path(id): Path<Uuid>,
) -> WebResult<Response> {
    let auth = AuthSession::new(session);

    if Task::delete(&state.db, id, user.id).await? {
        auth.flash(FlashKind::Success, "Task deleted successfully!").await?;
    } else {
        auth.flash(FlashKind::Error, NOT_FOUND_OR_FORBIDDEN).await?;
    }

    Ok(Redirect::to("/tasks").into_response())
}
