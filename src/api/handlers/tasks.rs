use crate::{
    auth::middleware::AuthUser,
    db::{Page, PageRequest},
    types::{
        CommentRequest, CommentView, CreateTaskRequest, PriorityParams, Result,
        StatusUpdateRequest, TaskView, UpdateTaskRequest,
    },
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

/// List every task
pub async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<TaskView>>> {
    let tasks = state.tasks.list_all().await?;
    Ok(Json(tasks.into_iter().map(TaskView::from).collect()))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TaskView>> {
    Ok(Json(state.tasks.get(id).await?.into()))
}

pub async fn create_task(
    State(state): State<AppState>,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<Json<TaskView>> {
    Ok(Json(state.tasks.create(payload).await?.into()))
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<Json<TaskView>> {
    Ok(Json(state.tasks.update_fields(id, payload).await?.into()))
}

/// Change the status of a task; only its executor may do this
pub async fn update_status(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<StatusUpdateRequest>,
) -> Result<Json<TaskView>> {
    let task = state
        .tasks
        .update_status(id, payload.status, &identity.name)
        .await?;
    Ok(Json(task.into()))
}

pub async fn update_priority(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<PriorityParams>,
) -> Result<Json<TaskView>> {
    let task = state.tasks.update_priority(id, params.priority).await?;
    Ok(Json(task.into()))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.tasks.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Comment on a task as the authenticated principal
pub async fn add_comment(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<CommentRequest>,
) -> Result<Json<CommentView>> {
    let view = state
        .tasks
        .add_comment(id, payload.content, &identity.name)
        .await?;
    Ok(Json(view))
}

pub async fn tasks_by_author(
    State(state): State<AppState>,
    Path(author_id): Path<i64>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<TaskView>>> {
    let page = state.tasks.by_author(author_id, page).await?;
    Ok(Json(page.map(TaskView::from)))
}

pub async fn tasks_by_executor(
    State(state): State<AppState>,
    Path(executor_id): Path<i64>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<TaskView>>> {
    let page = state.tasks.by_executor(executor_id, page).await?;
    Ok(Json(page.map(TaskView::from)))
}
