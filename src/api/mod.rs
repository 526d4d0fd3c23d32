//! HTTP API Handlers and Routes
//!
//! This module provides the REST API layer for taskgate, built on the Axum web framework.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//!
//! # API Endpoints
//!
//! ## Authentication (public)
//! - `POST /auth/registration` - Register and receive a credential
//! - `POST /auth/login` - Login and receive a credential
//!
//! ## Tasks (any member)
//! - `GET /tasks`, `POST /tasks` - List or create tasks
//! - `GET /tasks/{id}`, `PUT /tasks/{id}`, `DELETE /tasks/{id}`
//! - `PUT /tasks/{id}/status` - Change status (task executor only)
//! - `PUT /tasks/{id}/priority?priority=...` - Change priority
//! - `POST /tasks/{id}/comments` - Comment as the caller
//! - `GET /tasks/author/{id}`, `GET /tasks/executor/{id}` - Paginated (`?page=&size=`)
//!
//! ## Comments (any member)
//! - `GET /comments/tasks/{task_id}` - All comments on a task
//! - `GET /comments/task/{task_id}` - Paginated comments on a task
//! - `DELETE /comments/{id}`
//!
//! ## People
//! - `GET /users/{email}` - Any member
//! - `GET /users` - Administrators only
//!
//! ## Health (public)
//! - `GET /health`
//!
//! # Authentication
//!
//! Protected endpoints require a credential in the `Authorization` header:
//! ```text
//! Authorization: Bearer <token>
//! ```

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;
