//! In-process store
//!
//! Keeps principals, tasks and comments in ordered maps behind a single
//! `parking_lot::RwLock`. Every trait method takes the lock once, so each
//! call is atomic with respect to concurrent requests.

use crate::db::traits::{CommentStore, Page, PageRequest, PrincipalStore, TaskStore};
use crate::types::{
    AppError, Comment, NewComment, NewPrincipal, NewTask, Principal, Result, Task,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct MemoryState {
    principals: BTreeMap<i64, Principal>,
    tasks: BTreeMap<i64, Task>,
    comments: BTreeMap<i64, Comment>,
    next_principal_id: i64,
    next_task_id: i64,
    next_comment_id: i64,
}

impl MemoryState {
    fn next_id(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }
}

/// Thread-safe in-memory implementation of every store trait.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PrincipalStore for MemoryStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Principal>> {
        let state = self.state.read();
        Ok(state.principals.values().find(|p| p.name == name).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>> {
        let state = self.state.read();
        Ok(state.principals.values().find(|p| p.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Principal>> {
        Ok(self.state.read().principals.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Principal>> {
        Ok(self.state.read().principals.values().cloned().collect())
    }

    async fn save(&self, principal: NewPrincipal) -> Result<Principal> {
        let mut state = self.state.write();

        if state.principals.values().any(|p| p.email == principal.email) {
            return Err(AppError::DuplicateEmail(principal.email));
        }
        if state.principals.values().any(|p| p.name == principal.name) {
            return Err(AppError::DuplicateName(principal.name));
        }

        let id = MemoryState::next_id(&mut state.next_principal_id);
        let stored = Principal {
            id,
            name: principal.name,
            password_hash: principal.password_hash,
            role: principal.role,
            email: principal.email,
        };
        state.principals.insert(id, stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Task>> {
        Ok(self.state.read().tasks.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Task>> {
        Ok(self.state.read().tasks.values().cloned().collect())
    }

    async fn insert(&self, task: NewTask) -> Result<Task> {
        let mut state = self.state.write();
        let id = MemoryState::next_id(&mut state.next_task_id);
        let stored = Task {
            id,
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority,
            author_id: task.author_id,
            executor_id: task.executor_id,
        };
        state.tasks.insert(id, stored.clone());
        Ok(stored)
    }

    async fn save(&self, task: Task) -> Result<Task> {
        let mut state = self.state.write();
        match state.tasks.get_mut(&task.id) {
            Some(slot) => {
                *slot = task.clone();
                Ok(task)
            }
            None => Err(AppError::TaskNotFound(task.id)),
        }
    }

    async fn update_status(&self, id: i64, status: &str) -> Result<Task> {
        let mut state = self.state.write();
        let task = state.tasks.get_mut(&id).ok_or(AppError::TaskNotFound(id))?;
        task.status = status.to_string();
        Ok(task.clone())
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        let mut state = self.state.write();
        state.tasks.remove(&id);
        state.comments.retain(|_, c| c.task_id != id);
        Ok(())
    }

    async fn exists_by_id(&self, id: i64) -> Result<bool> {
        Ok(self.state.read().tasks.contains_key(&id))
    }

    async fn find_by_author(&self, author_id: i64, page: PageRequest) -> Result<Page<Task>> {
        let matching: Vec<Task> = self
            .state
            .read()
            .tasks
            .values()
            .filter(|t| t.author_id == author_id)
            .cloned()
            .collect();
        Ok(Page::from_ordered(matching, page))
    }

    async fn find_by_executor(&self, executor_id: i64, page: PageRequest) -> Result<Page<Task>> {
        let matching: Vec<Task> = self
            .state
            .read()
            .tasks
            .values()
            .filter(|t| t.executor_id == Some(executor_id))
            .cloned()
            .collect();
        Ok(Page::from_ordered(matching, page))
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn save(&self, comment: NewComment) -> Result<Comment> {
        let mut state = self.state.write();
        if !state.tasks.contains_key(&comment.task_id) {
            return Err(AppError::TaskNotFound(comment.task_id));
        }

        let id = MemoryState::next_id(&mut state.next_comment_id);
        let stored = Comment {
            id,
            task_id: comment.task_id,
            author_id: comment.author_id,
            content: comment.content,
        };
        state.comments.insert(id, stored.clone());
        Ok(stored)
    }

    async fn exists_by_id(&self, id: i64) -> Result<bool> {
        Ok(self.state.read().comments.contains_key(&id))
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        self.state.write().comments.remove(&id);
        Ok(())
    }

    async fn find_by_task_id(&self, task_id: i64) -> Result<Vec<Comment>> {
        Ok(self
            .state
            .read()
            .comments
            .values()
            .filter(|c| c.task_id == task_id)
            .cloned()
            .collect())
    }

    async fn find_by_task(&self, task_id: i64, page: PageRequest) -> Result<Page<Comment>> {
        let matching = CommentStore::find_by_task_id(self, task_id).await?;
        Ok(Page::from_ordered(matching, page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn new_principal(name: &str, email: &str) -> NewPrincipal {
        NewPrincipal {
            name: name.to_string(),
            password_hash: "hash".to_string(),
            role: Role::User,
            email: email.to_string(),
        }
    }

    fn new_task(author_id: i64, executor_id: Option<i64>) -> NewTask {
        NewTask {
            title: "title".to_string(),
            description: "description".to_string(),
            status: "OPEN".to_string(),
            priority: "LOW".to_string(),
            author_id,
            executor_id,
        }
    }

    #[tokio::test]
    async fn test_principal_ids_are_sequential() {
        let store = MemoryStore::new();

        let a = PrincipalStore::save(&store, new_principal("alice", "a@x.io"))
            .await
            .unwrap();
        let b = PrincipalStore::save(&store, new_principal("bob", "b@x.io"))
            .await
            .unwrap();

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(
            store.find_by_name("bob").await.unwrap().map(|p| p.id),
            Some(2)
        );
        assert_eq!(
            store.find_by_email("a@x.io").await.unwrap().map(|p| p.id),
            Some(1)
        );
    }

    #[tokio::test]
    async fn test_principal_uniqueness_enforced() {
        let store = MemoryStore::new();
        PrincipalStore::save(&store, new_principal("alice", "a@x.io"))
            .await
            .unwrap();

        let dup_email = PrincipalStore::save(&store, new_principal("other", "a@x.io")).await;
        assert!(matches!(dup_email, Err(AppError::DuplicateEmail(_))));

        let dup_name = PrincipalStore::save(&store, new_principal("alice", "z@x.io")).await;
        assert!(matches!(dup_name, Err(AppError::DuplicateName(_))));
    }

    #[tokio::test]
    async fn test_delete_task_cascades_comments() {
        let store = MemoryStore::new();
        let keep = store.insert(new_task(1, None)).await.unwrap();
        let gone = store.insert(new_task(1, None)).await.unwrap();

        for task_id in [keep.id, gone.id] {
            CommentStore::save(
                &store,
                NewComment {
                    task_id,
                    author_id: 1,
                    content: "hi".to_string(),
                },
            )
            .await
            .unwrap();
        }

        TaskStore::delete_by_id(&store, gone.id).await.unwrap();

        assert!(!TaskStore::exists_by_id(&store, gone.id).await.unwrap());
        assert!(store.find_by_task_id(gone.id).await.unwrap().is_empty());
        assert_eq!(store.find_by_task_id(keep.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_unknown_task_fails() {
        let store = MemoryStore::new();
        let ghost = Task {
            id: 99,
            title: String::new(),
            description: String::new(),
            status: String::new(),
            priority: String::new(),
            author_id: 1,
            executor_id: None,
        };

        assert!(matches!(
            TaskStore::save(&store, ghost).await,
            Err(AppError::TaskNotFound(99))
        ));
    }

    #[tokio::test]
    async fn test_status_update_keeps_reassigned_executor() {
        let store = MemoryStore::new();
        let task = store.insert(new_task(1, Some(2))).await.unwrap();

        // Executor reassigned after the status writer loaded the task.
        let mut reassigned = task.clone();
        reassigned.executor_id = Some(3);
        TaskStore::save(&store, reassigned).await.unwrap();

        let updated = store.update_status(task.id, "DONE").await.unwrap();
        assert_eq!(updated.status, "DONE");
        assert_eq!(updated.executor_id, Some(3));

        assert!(matches!(
            store.update_status(99, "DONE").await,
            Err(AppError::TaskNotFound(99))
        ));
    }

    #[tokio::test]
    async fn test_find_by_executor_paginates() {
        let store = MemoryStore::new();
        for _ in 0..5 {
            store.insert(new_task(1, Some(7))).await.unwrap();
        }
        store.insert(new_task(1, None)).await.unwrap();

        let page = store
            .find_by_executor(7, PageRequest::new(1, 2))
            .await
            .unwrap();

        assert_eq!(page.content.len(), 2);
        assert_eq!(page.total_elements, 5);
        assert_eq!(page.total_pages, 3);
        assert!(page.content.iter().all(|t| t.executor_id == Some(7)));
    }
}
