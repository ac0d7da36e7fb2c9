//! Task API endpoints
//!
//! RESTful API for task CRUD operations.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use task_core::cache::CacheStatus;
use task_core::pagination::PageRequest;
use task_core::task::{Task, TaskDraft, TaskId};

use crate::error::ApiError;
use crate::extract::{Json as JsonBody, Path, Query};
use crate::state::AppState;

/// Total number of tasks before pagination
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksQuery {
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub items_per_page: Option<usize>,
}

/// Body of POST and PUT; any `id` field is ignored
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_completed: bool,
}

impl From<TaskPayload> for TaskDraft {
    fn from(payload: TaskPayload) -> Self {
        TaskDraft::new(payload.title)
            .with_description(payload.description)
            .completed(payload.is_completed)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub is_completed: bool,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            is_completed: task.is_completed,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /tasks - List one page of tasks, served through the list cache
async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<ListTasksQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = PageRequest::new(query.page, query.items_per_page, state.page_limits())
        .map_err(|e| ApiError::new("list_tasks", None, e))?;

    // Dropping the request future (client gone) cancels the listing.
    let cancel = state.shutdown_token().child_token();
    let _cancel_on_drop = cancel.clone().drop_guard();

    let listed = state
        .list_cache()
        .get_all(&cancel)
        .await
        .map_err(|e| ApiError::new("list_tasks", None, e))?;

    match listed.status {
        CacheStatus::Hit => tracing::info!("Tasks retrieved from cache"),
        CacheStatus::Miss => tracing::info!("Tasks retrieved from repository and cached"),
    }

    let total = listed.tasks.len();
    let items: Vec<TaskResponse> = page
        .slice(listed.tasks.as_slice())
        .iter()
        .cloned()
        .map(TaskResponse::from)
        .collect();

    Ok(([(TOTAL_COUNT_HEADER, total.to_string())], Json(items)))
}

/// POST /tasks - Create a new task
async fn create_task(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<TaskPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state
        .repository()
        .add(payload.into())
        .await
        .map_err(|e| ApiError::new("create_task", None, e))?;

    tracing::info!(task_id = created.id, "Task created");

    let location = format!("/tasks/{}", created.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(TaskResponse::from(created)),
    ))
}

/// GET /tasks/{id} - Get a single task
async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<TaskId>,
) -> Result<Json<TaskResponse>, ApiError> {
    let task = state
        .repository()
        .get_by_id(id)
        .await
        .map_err(|e| ApiError::new("get_task", Some(id), e))?;

    Ok(Json(TaskResponse::from(task)))
}

/// PUT /tasks/{id} - Replace a task's title, description and completion flag
async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<TaskId>,
    JsonBody(payload): JsonBody<TaskPayload>,
) -> Result<Json<TaskResponse>, ApiError> {
    let draft = TaskDraft::from(payload);
    draft
        .validate()
        .map_err(|e| ApiError::new("update_task", Some(id), e))?;

    let mut task = state
        .repository()
        .get_by_id(id)
        .await
        .map_err(|e| ApiError::new("update_task", Some(id), e))?;

    task.apply(draft);

    let updated = state
        .repository()
        .update(task)
        .await
        .map_err(|e| ApiError::new("update_task", Some(id), e))?;

    Ok(Json(TaskResponse::from(updated)))
}

/// DELETE /tasks/{id} - Delete a task
async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<TaskId>,
) -> Result<StatusCode, ApiError> {
    let task = state
        .repository()
        .get_by_id(id)
        .await
        .map_err(|e| ApiError::new("delete_task", Some(id), e))?;

    state
        .repository()
        .remove(&task)
        .await
        .map_err(|e| ApiError::new("delete_task", Some(id), e))?;

    tracing::info!(task_id = id, "Task deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Router
// ============================================================================

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
}
