use crate::{
    types::{LoginRequest, RegisterRequest, Result, TokenResponse},
    AppState,
};
use axum::{extract::State, Json};

/// Register a new principal and receive a credential
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<TokenResponse>> {
    let token = state.accounts.register(payload).await?;
    Ok(Json(token))
}

/// Login with name and password
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>> {
    let token = state.accounts.login(payload).await?;
    Ok(Json(token))
}
