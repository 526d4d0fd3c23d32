use crate::db::traits::{CommentStore, Page, PageRequest, PrincipalStore, TaskStore};
use crate::types::{
    AppError, Comment, NewComment, NewPrincipal, NewTask, Principal, Result, Role, Task,
};
use async_trait::async_trait;
use libsql::{Builder, Connection, Database, Row, Rows};
use tracing::info;

const PRINCIPAL_COLUMNS: &str = "id, name, password_hash, role, email";
const TASK_COLUMNS: &str = "id, title, description, status, priority, author_id, executor_id";
const COMMENT_COLUMNS: &str = "id, task_id, author_id, content";

/// libsql-backed store for principals, tasks and comments.
///
/// A single connection is opened up front and shared by all calls, which
/// also keeps `:memory:` databases alive for the lifetime of the store.
pub struct SqliteStore {
    _db: Database,
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) a database file and initializes the schema.
    pub async fn new_local(path: &str) -> Result<Self> {
        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open database: {}", e)))?;
        let conn = db
            .connect()
            .map_err(|e| AppError::Database(format!("Failed to get connection: {}", e)))?;

        let store = Self { _db: db, conn };
        store.initialize_schema().await?;
        info!(path, "database ready");

        Ok(store)
    }

    /// Opens a private in-memory database.
    pub async fn new_memory() -> Result<Self> {
        Self::new_local(":memory:").await
    }

    async fn initialize_schema(&self) -> Result<()> {
        self.conn
            .execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| AppError::Database(format!("Failed to enable foreign keys: {}", e)))?;

        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS principals (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT UNIQUE NOT NULL,
                    password_hash TEXT NOT NULL,
                    role TEXT NOT NULL,
                    email TEXT UNIQUE NOT NULL
                )",
                (),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to create principals table: {}", e)))?;

        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS tasks (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    title TEXT NOT NULL,
                    description TEXT NOT NULL,
                    status TEXT NOT NULL,
                    priority TEXT NOT NULL,
                    author_id INTEGER NOT NULL,
                    executor_id INTEGER,
                    FOREIGN KEY (author_id) REFERENCES principals(id),
                    FOREIGN KEY (executor_id) REFERENCES principals(id)
                )",
                (),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to create tasks table: {}", e)))?;

        self.conn
            .execute(
                "CREATE TABLE IF NOT EXISTS comments (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    task_id INTEGER NOT NULL,
                    author_id INTEGER NOT NULL,
                    content TEXT NOT NULL,
                    FOREIGN KEY (task_id) REFERENCES tasks(id) ON DELETE CASCADE,
                    FOREIGN KEY (author_id) REFERENCES principals(id)
                )",
                (),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to create comments table: {}", e)))?;

        Ok(())
    }

    async fn count(&self, sql: &str, id: i64) -> Result<u64> {
        let mut rows = self
            .conn
            .query(sql, [id])
            .await
            .map_err(|e| AppError::Database(format!("Failed to count rows: {}", e)))?;

        match next_row(&mut rows).await? {
            Some(row) => Ok(row
                .get::<i64>(0)
                .map_err(|e| AppError::Database(e.to_string()))? as u64),
            None => Ok(0),
        }
    }
}

async fn next_row(rows: &mut Rows) -> Result<Option<Row>> {
    rows.next()
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

fn principal_from_row(row: &Row) -> Result<Principal> {
    let role: String = row.get(3).map_err(|e| AppError::Database(e.to_string()))?;
    Ok(Principal {
        id: row.get(0).map_err(|e| AppError::Database(e.to_string()))?,
        name: row.get(1).map_err(|e| AppError::Database(e.to_string()))?,
        password_hash: row.get(2).map_err(|e| AppError::Database(e.to_string()))?,
        role: role.parse::<Role>()?,
        email: row.get(4).map_err(|e| AppError::Database(e.to_string()))?,
    })
}

fn task_from_row(row: &Row) -> Result<Task> {
    Ok(Task {
        id: row.get(0).map_err(|e| AppError::Database(e.to_string()))?,
        title: row.get(1).map_err(|e| AppError::Database(e.to_string()))?,
        description: row.get(2).map_err(|e| AppError::Database(e.to_string()))?,
        status: row.get(3).map_err(|e| AppError::Database(e.to_string()))?,
        priority: row.get(4).map_err(|e| AppError::Database(e.to_string()))?,
        author_id: row.get(5).map_err(|e| AppError::Database(e.to_string()))?,
        executor_id: row
            .get::<Option<i64>>(6)
            .map_err(|e| AppError::Database(e.to_string()))?,
    })
}

fn comment_from_row(row: &Row) -> Result<Comment> {
    Ok(Comment {
        id: row.get(0).map_err(|e| AppError::Database(e.to_string()))?,
        task_id: row.get(1).map_err(|e| AppError::Database(e.to_string()))?,
        author_id: row.get(2).map_err(|e| AppError::Database(e.to_string()))?,
        content: row.get(3).map_err(|e| AppError::Database(e.to_string()))?,
    })
}

async fn collect_rows<T>(mut rows: Rows, map: fn(&Row) -> Result<T>) -> Result<Vec<T>> {
    let mut out = Vec::new();
    while let Some(row) = next_row(&mut rows).await? {
        out.push(map(&row)?);
    }
    Ok(out)
}

#[async_trait]
impl PrincipalStore for SqliteStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Principal>> {
        let sql = format!("SELECT {} FROM principals WHERE name = ?", PRINCIPAL_COLUMNS);
        let mut rows = self
            .conn
            .query(&sql, [name])
            .await
            .map_err(|e| AppError::Database(format!("Failed to query principal: {}", e)))?;

        next_row(&mut rows)
            .await?
            .map(|row| principal_from_row(&row))
            .transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>> {
        let sql = format!("SELECT {} FROM principals WHERE email = ?", PRINCIPAL_COLUMNS);
        let mut rows = self
            .conn
            .query(&sql, [email])
            .await
            .map_err(|e| AppError::Database(format!("Failed to query principal: {}", e)))?;

        next_row(&mut rows)
            .await?
            .map(|row| principal_from_row(&row))
            .transpose()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Principal>> {
        let sql = format!("SELECT {} FROM principals WHERE id = ?", PRINCIPAL_COLUMNS);
        let mut rows = self
            .conn
            .query(&sql, [id])
            .await
            .map_err(|e| AppError::Database(format!("Failed to query principal: {}", e)))?;

        next_row(&mut rows)
            .await?
            .map(|row| principal_from_row(&row))
            .transpose()
    }

    async fn find_all(&self) -> Result<Vec<Principal>> {
        let sql = format!("SELECT {} FROM principals ORDER BY id", PRINCIPAL_COLUMNS);
        let rows = self
            .conn
            .query(&sql, ())
            .await
            .map_err(|e| AppError::Database(format!("Failed to query principals: {}", e)))?;

        collect_rows(rows, principal_from_row).await
    }

    async fn save(&self, principal: NewPrincipal) -> Result<Principal> {
        let mut rows = self
            .conn
            .query(
                "INSERT INTO principals (name, password_hash, role, email)
                 VALUES (?, ?, ?, ?) RETURNING id",
                (
                    principal.name.as_str(),
                    principal.password_hash.as_str(),
                    principal.role.as_str(),
                    principal.email.as_str(),
                ),
            )
            .await
            .map_err(|e| {
                let msg = e.to_string();
                if msg.contains("principals.email") {
                    AppError::DuplicateEmail(principal.email.clone())
                } else if msg.contains("principals.name") {
                    AppError::DuplicateName(principal.name.clone())
                } else {
                    AppError::Database(format!("Failed to create principal: {}", msg))
                }
            })?;

        let id: i64 = next_row(&mut rows)
            .await?
            .ok_or_else(|| AppError::Database("Insert returned no id".to_string()))?
            .get(0)
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Principal {
            id,
            name: principal.name,
            password_hash: principal.password_hash,
            role: principal.role,
            email: principal.email,
        })
    }
}

#[async_trait]
impl TaskStore for SqliteStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Task>> {
        let sql = format!("SELECT {} FROM tasks WHERE id = ?", TASK_COLUMNS);
        let mut rows = self
            .conn
            .query(&sql, [id])
            .await
            .map_err(|e| AppError::Database(format!("Failed to query task: {}", e)))?;

        next_row(&mut rows)
            .await?
            .map(|row| task_from_row(&row))
            .transpose()
    }

    async fn find_all(&self) -> Result<Vec<Task>> {
        let sql = format!("SELECT {} FROM tasks ORDER BY id", TASK_COLUMNS);
        let rows = self
            .conn
            .query(&sql, ())
            .await
            .map_err(|e| AppError::Database(format!("Failed to query tasks: {}", e)))?;

        collect_rows(rows, task_from_row).await
    }

    async fn insert(&self, task: NewTask) -> Result<Task> {
        let mut rows = self
            .conn
            .query(
                "INSERT INTO tasks (title, description, status, priority, author_id, executor_id)
                 VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
                (
                    task.title.as_str(),
                    task.description.as_str(),
                    task.status.as_str(),
                    task.priority.as_str(),
                    task.author_id,
                    task.executor_id,
                ),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to create task: {}", e)))?;

        let id: i64 = next_row(&mut rows)
            .await?
            .ok_or_else(|| AppError::Database("Insert returned no id".to_string()))?
            .get(0)
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Task {
            id,
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority,
            author_id: task.author_id,
            executor_id: task.executor_id,
        })
    }

    async fn save(&self, task: Task) -> Result<Task> {
        let updated = self
            .conn
            .execute(
                "UPDATE tasks SET title = ?, description = ?, status = ?, priority = ?,
                     author_id = ?, executor_id = ?
                 WHERE id = ?",
                (
                    task.title.as_str(),
                    task.description.as_str(),
                    task.status.as_str(),
                    task.priority.as_str(),
                    task.author_id,
                    task.executor_id,
                    task.id,
                ),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to update task: {}", e)))?;

        if updated == 0 {
            return Err(AppError::TaskNotFound(task.id));
        }
        Ok(task)
    }

    async fn update_status(&self, id: i64, status: &str) -> Result<Task> {
        let sql = format!(
            "UPDATE tasks SET status = ? WHERE id = ? RETURNING {}",
            TASK_COLUMNS
        );
        let mut rows = self
            .conn
            .query(&sql, (status, id))
            .await
            .map_err(|e| AppError::Database(format!("Failed to update task status: {}", e)))?;

        match next_row(&mut rows).await? {
            Some(row) => task_from_row(&row),
            None => Err(AppError::TaskNotFound(id)),
        }
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        // Comments go with the task through ON DELETE CASCADE
        self.conn
            .execute("DELETE FROM tasks WHERE id = ?", [id])
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete task: {}", e)))?;
        Ok(())
    }

    async fn exists_by_id(&self, id: i64) -> Result<bool> {
        Ok(self
            .count("SELECT COUNT(*) FROM tasks WHERE id = ?", id)
            .await?
            > 0)
    }

    async fn find_by_author(&self, author_id: i64, page: PageRequest) -> Result<Page<Task>> {
        let total = self
            .count("SELECT COUNT(*) FROM tasks WHERE author_id = ?", author_id)
            .await?;
        let sql = format!(
            "SELECT {} FROM tasks WHERE author_id = ? ORDER BY id LIMIT ? OFFSET ?",
            TASK_COLUMNS
        );
        let rows = self
            .conn
            .query(
                &sql,
                (author_id, page.size as i64, page.offset() as i64),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query tasks: {}", e)))?;

        Ok(Page::new(collect_rows(rows, task_from_row).await?, page, total))
    }

    async fn find_by_executor(&self, executor_id: i64, page: PageRequest) -> Result<Page<Task>> {
        let total = self
            .count("SELECT COUNT(*) FROM tasks WHERE executor_id = ?", executor_id)
            .await?;
        let sql = format!(
            "SELECT {} FROM tasks WHERE executor_id = ? ORDER BY id LIMIT ? OFFSET ?",
            TASK_COLUMNS
        );
        let rows = self
            .conn
            .query(
                &sql,
                (executor_id, page.size as i64, page.offset() as i64),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query tasks: {}", e)))?;

        Ok(Page::new(collect_rows(rows, task_from_row).await?, page, total))
    }
}

#[async_trait]
impl CommentStore for SqliteStore {
    async fn save(&self, comment: NewComment) -> Result<Comment> {
        let mut rows = self
            .conn
            .query(
                "INSERT INTO comments (task_id, author_id, content)
                 VALUES (?, ?, ?) RETURNING id",
                (comment.task_id, comment.author_id, comment.content.as_str()),
            )
            .await
            .map_err(|e| {
                let msg = e.to_string();
                if msg.contains("FOREIGN KEY") {
                    AppError::TaskNotFound(comment.task_id)
                } else {
                    AppError::Database(format!("Failed to create comment: {}", msg))
                }
            })?;

        let id: i64 = next_row(&mut rows)
            .await?
            .ok_or_else(|| AppError::Database("Insert returned no id".to_string()))?
            .get(0)
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Comment {
            id,
            task_id: comment.task_id,
            author_id: comment.author_id,
            content: comment.content,
        })
    }

    async fn exists_by_id(&self, id: i64) -> Result<bool> {
        Ok(self
            .count("SELECT COUNT(*) FROM comments WHERE id = ?", id)
            .await?
            > 0)
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM comments WHERE id = ?", [id])
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete comment: {}", e)))?;
        Ok(())
    }

    async fn find_by_task_id(&self, task_id: i64) -> Result<Vec<Comment>> {
        let sql = format!(
            "SELECT {} FROM comments WHERE task_id = ? ORDER BY id",
            COMMENT_COLUMNS
        );
        let rows = self
            .conn
            .query(&sql, [task_id])
            .await
            .map_err(|e| AppError::Database(format!("Failed to query comments: {}", e)))?;

        collect_rows(rows, comment_from_row).await
    }

    async fn find_by_task(&self, task_id: i64, page: PageRequest) -> Result<Page<Comment>> {
        let total = self
            .count("SELECT COUNT(*) FROM comments WHERE task_id = ?", task_id)
            .await?;
        let sql = format!(
            "SELECT {} FROM comments WHERE task_id = ? ORDER BY id LIMIT ? OFFSET ?",
            COMMENT_COLUMNS
        );
        let rows = self
            .conn
            .query(&sql, (task_id, page.size as i64, page.offset() as i64))
            .await
            .map_err(|e| AppError::Database(format!("Failed to query comments: {}", e)))?;

        Ok(Page::new(
            collect_rows(rows, comment_from_row).await?,
            page,
            total,
        ))
    }
}
