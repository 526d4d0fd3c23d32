//! # taskgate
//!
//! A task tracking API behind a stateless bearer-token gate.
//!
//! ## Overview
//!
//! taskgate can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `taskgate-server` binary
//! 2. **As a library** - Build the router into your own Axum application
//!
//! ### Basic Example
//!
//! ```rust,ignore
//! use taskgate::{build_app, AppState, TaskgateConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TaskgateConfig::load("taskgate.toml")?;
//!     let secret = config.jwt_secret()?;
//!     let stores = config.database_provider().create_stores().await?;
//!
//!     let app = build_app(AppState::new(config, &secret, stores));
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`api`] - REST API handlers and routes
//! - [`auth`] - Credential codec, authentication layer and access policy
//! - [`db`] - Principal, task and comment stores (memory, SQLite)
//! - [`services`] - Task lifecycle, comments and accounts
//! - [`types`] - Common types and error handling
//! - [`utils`] - TOML configuration
//!
//! ## Request Pipeline
//!
//! Every request passes the authentication layer first, then the role check
//! of its route group, then the handler. Only the executor of a task may
//! change its status.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Credentials, authentication and access policy.
pub mod auth;
/// Stores for principals, tasks and comments.
pub mod db;
/// Command-line interface.
pub mod cli;
/// Domain services.
pub mod services;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration utilities (TOML).
pub mod utils;

// Re-export commonly used types
pub use auth::jwt::JwtCodec;
pub use auth::password::{Argon2Hasher, PasswordHasher};
pub use db::{DatabaseProvider, Stores};
pub use services::{AccountService, CommentService, TaskService};
pub use types::{AppError, Result};
pub use utils::toml_config::TaskgateConfig;

use axum::{middleware, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// TOML-based infrastructure configuration
    pub config: Arc<TaskgateConfig>,
    /// Credential codec, immutable after startup
    pub codec: Arc<JwtCodec>,
    /// Principal, task and comment stores
    pub stores: Stores,
    /// Task lifecycle operations
    pub tasks: TaskService,
    /// Comment reads and deletes
    pub comments: CommentService,
    /// Registration, login and people directory
    pub accounts: AccountService,
}

impl AppState {
    /// Wires services over `stores` with Argon2 password hashing.
    pub fn new(config: TaskgateConfig, secret: &str, stores: Stores) -> Self {
        Self::with_hasher(config, secret, stores, Arc::new(Argon2Hasher))
    }

    pub fn with_hasher(
        config: TaskgateConfig,
        secret: &str,
        stores: Stores,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        let codec = Arc::new(JwtCodec::new(secret, config.auth.jwt_lifetime_minutes));

        Self {
            config: Arc::new(config),
            tasks: TaskService::new(stores.clone()),
            comments: CommentService::new(stores.clone()),
            accounts: AccountService::new(stores.clone(), codec.clone(), hasher),
            codec,
            stores,
        }
    }
}

/// Full application router: routes, role checks, authentication and tracing.
pub fn build_app(state: AppState) -> Router {
    api::routes::create_router()
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::authenticate,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
