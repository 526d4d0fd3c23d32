use crate::{
    types::{PersonView, Result},
    AppState,
};
use axum::{
    extract::{Path, State},
    Json,
};

/// Directory of every registered principal (administrators only)
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<PersonView>>> {
    Ok(Json(state.accounts.list().await?))
}

pub async fn get_user_by_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<PersonView>> {
    Ok(Json(state.accounts.find_by_email(&email).await?))
}
