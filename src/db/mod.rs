//! Stores for principals, tasks and comments.
//!
//! This module provides:
//! - **Store traits**: `PrincipalStore`, `TaskStore`, `CommentStore`
//! - **Memory**: lock-guarded maps, the default for development and tests
//! - **SQLite**: libsql database file with the same semantics

pub mod memory;
pub mod sqlite;
pub mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{CommentStore, Page, PageRequest, PrincipalStore, TaskStore};

use crate::types::Result;
use std::sync::Arc;

/// Handles to the three stores, usually backed by one database.
#[derive(Clone)]
pub struct Stores {
    pub principals: Arc<dyn PrincipalStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub comments: Arc<dyn CommentStore>,
}

impl Stores {
    /// Uses one backend for all three stores.
    pub fn shared<S>(backend: Arc<S>) -> Self
    where
        S: PrincipalStore + TaskStore + CommentStore + 'static,
    {
        Self {
            principals: backend.clone(),
            tasks: backend.clone(),
            comments: backend,
        }
    }

    /// Fresh in-memory stores.
    pub fn in_memory() -> Self {
        Self::shared(Arc::new(MemoryStore::new()))
    }
}

/// Database backend selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DatabaseProvider {
    /// In-process maps (ephemeral, lost on restart)
    #[default]
    Memory,
    /// libsql database file
    Sqlite {
        /// Path to the database file
        path: String,
    },
}

impl DatabaseProvider {
    /// `:memory:` (or an empty string) selects the in-process store; anything
    /// else is treated as a database file path.
    pub fn from_url(url: &str) -> Self {
        if url.is_empty() || url == ":memory:" {
            DatabaseProvider::Memory
        } else {
            DatabaseProvider::Sqlite {
                path: url.to_string(),
            }
        }
    }

    pub async fn create_stores(&self) -> Result<Stores> {
        match self {
            DatabaseProvider::Memory => Ok(Stores::in_memory()),
            DatabaseProvider::Sqlite { path } => {
                let store = SqliteStore::new_local(path).await?;
                Ok(Stores::shared(Arc::new(store)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_url() {
        assert_eq!(DatabaseProvider::from_url(":memory:"), DatabaseProvider::Memory);
        assert_eq!(DatabaseProvider::from_url(""), DatabaseProvider::Memory);
        assert_eq!(
            DatabaseProvider::from_url("./data/taskgate.db"),
            DatabaseProvider::Sqlite {
                path: "./data/taskgate.db".to_string()
            }
        );
    }
}
