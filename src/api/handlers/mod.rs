//! API request handlers.
//!
//! This module contains all HTTP request handlers organized by functionality.

/// Authentication handlers (login, registration).
pub mod auth;
/// Comment listing and deletion handlers.
pub mod comments;
/// Task lifecycle handlers.
pub mod tasks;
/// People directory handlers.
pub mod users;

use axum::Json;
use serde_json::{json, Value};

/// Liveness check
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
