//! Domain services used by the HTTP handlers.
//!
//! - [`TaskService`] - task lifecycle, including the executor-only status change
//! - [`CommentService`] - comment listing and deletion
//! - [`AccountService`] - registration, login and the people directory

pub mod accounts;
pub mod comments;
pub mod tasks;

pub use accounts::AccountService;
pub use comments::CommentService;
pub use tasks::TaskService;
