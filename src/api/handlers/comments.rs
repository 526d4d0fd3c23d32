use crate::{
    db::{Page, PageRequest},
    types::{CommentView, Result},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

/// All comments on a task
pub async fn list_for_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
) -> Result<Json<Vec<CommentView>>> {
    Ok(Json(state.comments.list_for_task(task_id).await?))
}

/// One page of comments on a task
pub async fn page_for_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<CommentView>>> {
    Ok(Json(state.comments.page_for_task(task_id, page).await?))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.comments.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
