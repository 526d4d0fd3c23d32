//! Store abstraction traits
//!
//! The services in this crate reach principals, tasks and comments only
//! through these traits. Each method is one atomic unit from the caller's
//! point of view; implementations are responsible for that atomicity.
//!
//! # Example
//!
//! ```rust,ignore
//! use taskgate::db::{DatabaseProvider, Stores};
//!
//! // Use the in-process store (default for development/testing)
//! let stores = DatabaseProvider::Memory.create_stores().await?;
//!
//! // Use a libsql database file
//! let stores = DatabaseProvider::Sqlite { path: "taskgate.db".into() }
//!     .create_stores()
//!     .await?;
//! ```

use crate::types::{Comment, NewComment, NewPrincipal, NewTask, Principal, Result, Task};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

fn default_page_size() -> u32 {
    10
}

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Zero-based page selector for paginated queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: default_page_size(),
        }
    }
}

impl PageRequest {
    /// Creates a page request, clamping `size` into `1..=MAX_PAGE_SIZE`.
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size: size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Same request with `size` clamped; used on values coming off the wire.
    pub fn normalized(self) -> Self {
        Self::new(self.page, self.size)
    }

    pub fn offset(&self) -> u64 {
        self.page as u64 * self.size as u64
    }
}

/// One page of results plus totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        let size = request.size.max(1) as u64;
        Self {
            content,
            page: request.page,
            size: request.size,
            total_elements,
            total_pages: total_elements.div_ceil(size),
        }
    }

    /// Cuts one page out of an already ordered, complete result set.
    pub fn from_ordered(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len() as u64;
        let content = all
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.size as usize)
            .collect();
        Self::new(content, request, total)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

/// Lookup and persistence of principals.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    async fn find_by_name(&self, name: &str) -> Result<Option<Principal>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Principal>>;

    /// All principals ordered by id.
    async fn find_all(&self) -> Result<Vec<Principal>>;

    /// Inserts a new principal and returns it with its assigned id.
    async fn save(&self, principal: NewPrincipal) -> Result<Principal>;
}

/// Lookup and persistence of tasks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Task>>;

    /// All tasks ordered by id.
    async fn find_all(&self) -> Result<Vec<Task>>;

    /// Inserts a new task and returns it with its assigned id.
    async fn insert(&self, task: NewTask) -> Result<Task>;

    /// Overwrites an existing task. Last write wins.
    async fn save(&self, task: Task) -> Result<Task>;

    /// Sets only the status column, leaving concurrent changes to the other
    /// fields in place.
    async fn update_status(&self, id: i64, status: &str) -> Result<Task>;

    /// Removes a task together with all of its comments.
    async fn delete_by_id(&self, id: i64) -> Result<()>;

    async fn exists_by_id(&self, id: i64) -> Result<bool>;

    async fn find_by_author(&self, author_id: i64, page: PageRequest) -> Result<Page<Task>>;

    async fn find_by_executor(&self, executor_id: i64, page: PageRequest) -> Result<Page<Task>>;
}

/// Lookup and persistence of comments.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn save(&self, comment: NewComment) -> Result<Comment>;

    async fn exists_by_id(&self, id: i64) -> Result<bool>;

    async fn delete_by_id(&self, id: i64) -> Result<()>;

    /// All comments on a task ordered by id.
    async fn find_by_task_id(&self, task_id: i64) -> Result<Vec<Comment>>;

    async fn find_by_task(&self, task_id: i64, page: PageRequest) -> Result<Page<Comment>>;
}
