use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============= Principal Types =============

/// Closed set of roles a principal can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            other => Err(AppError::Database(format!("Unknown role: {}", other))),
        }
    }
}

/// A stored, authenticable identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: i64,
    pub name: String,
    pub password_hash: String,
    pub role: Role,
    pub email: String,
}

/// Principal fields before the store assigns an id.
#[derive(Debug, Clone)]
pub struct NewPrincipal {
    pub name: String,
    pub password_hash: String,
    pub role: Role,
    pub email: String,
}

/// The principal bound to the current request by the authentication gate.
///
/// Lives in the request extensions only; it is never persisted and is
/// dropped with the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    pub principal_id: i64,
    pub name: String,
    pub role: Role,
}

impl From<&Principal> for AuthenticatedIdentity {
    fn from(p: &Principal) -> Self {
        Self {
            principal_id: p.id,
            name: p.name.clone(),
            role: p.role,
        }
    }
}

// ============= Task Types =============

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub author_id: i64,
    pub executor_id: Option<i64>,
}

/// Task fields before the store assigns an id.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub author_id: i64,
    pub executor_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: i64,
    pub task_id: i64,
    pub author_id: i64,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub task_id: i64,
    pub author_id: i64,
    pub content: String,
}

// ============= Credential Claims =============

/// Claims carried by an issued credential.
///
/// Unknown claims are rejected during decoding rather than ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

// ============= API Request/Response Types =============

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(rename = "jwt-token")]
    pub jwt_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub author_id: i64,
    #[serde(default)]
    pub executor_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    #[serde(default)]
    pub author_id: Option<i64>,
    #[serde(default)]
    pub executor_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PriorityParams {
    pub priority: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

/// Task as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub author_id: i64,
    pub executor_id: Option<i64>,
}

impl From<Task> for TaskView {
    fn from(t: Task) -> Self {
        Self {
            id: t.id,
            title: t.title,
            description: t.description,
            status: t.status,
            priority: t.priority,
            author_id: t.author_id,
            executor_id: t.executor_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: i64,
    pub task_id: i64,
    pub author_id: i64,
    pub author_name: String,
    pub content: String,
}

/// Public view of a principal; never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonView {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl From<Principal> for PersonView {
    fn from(p: Principal) -> Self {
        Self {
            id: p.id,
            username: p.name,
            email: p.email,
            role: p.role,
        }
    }
}

// ============= Error Types =============

/// Message returned when the bearer value is empty.
pub const BLANK_TOKEN_MESSAGE: &str = "JWT TOKEN IS BLANK OR INVALID";
/// Message returned for any credential that fails parsing or verification.
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid JWT token";
/// Message returned when the acting principal is not the task's executor.
pub const NOT_EXECUTOR_MESSAGE: &str = "Access denied: You are not the executor of this task";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("JWT TOKEN IS BLANK OR INVALID")]
    BlankCredential,

    #[error("Invalid JWT token")]
    MalformedCredential,

    #[error("Invalid JWT token")]
    InvalidCredential,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Principal not found: {0}")]
    PrincipalNotFound(String),

    #[error("Author not found: {0}")]
    UnresolvedAuthor(i64),

    #[error("Executor not found: {0}")]
    UnresolvedExecutor(i64),

    #[error("Task not found: {0}")]
    TaskNotFound(i64),

    #[error("Comment not found: {0}")]
    CommentNotFound(i64),

    #[error("Access denied: You are not the executor of this task")]
    AccessDenied,

    #[error("Forbidden")]
    RoleForbidden,

    #[error("A user with email {0} already exists")]
    DuplicateEmail(String),

    #[error("A user named {0} already exists")]
    DuplicateName(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status and machine-readable code for this error.
    pub fn status_and_code(&self) -> (axum::http::StatusCode, &'static str) {
        use axum::http::StatusCode;

        match self {
            AppError::BlankCredential => (StatusCode::BAD_REQUEST, "BLANK_TOKEN"),
            AppError::MalformedCredential | AppError::InvalidCredential => {
                (StatusCode::BAD_REQUEST, "INVALID_TOKEN")
            }
            AppError::Unauthenticated => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            AppError::Auth(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::PrincipalNotFound(_) => (StatusCode::NOT_FOUND, "PRINCIPAL_NOT_FOUND"),
            AppError::UnresolvedAuthor(_) => (StatusCode::BAD_REQUEST, "UNRESOLVED_AUTHOR"),
            AppError::UnresolvedExecutor(_) => (StatusCode::BAD_REQUEST, "UNRESOLVED_EXECUTOR"),
            AppError::TaskNotFound(_) => (StatusCode::NOT_FOUND, "TASK_NOT_FOUND"),
            AppError::CommentNotFound(_) => (StatusCode::NOT_FOUND, "COMMENT_NOT_FOUND"),
            AppError::AccessDenied => (StatusCode::FORBIDDEN, "NOT_EXECUTOR"),
            AppError::RoleForbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            AppError::DuplicateEmail(_) | AppError::DuplicateName(_) => {
                (StatusCode::CONFLICT, "CONFLICT")
            }
            AppError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            AppError::Database(_) | AppError::Configuration(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, code) = self.status_and_code();

        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = serde_json::json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
