use crate::auth::policy::ensure_executor;
use crate::db::{Page, PageRequest, Stores};
use crate::services::comments::comment_view;
use crate::types::{
    AppError, CommentView, CreateTaskRequest, NewComment, NewTask, Principal, Result, Task,
    UpdateTaskRequest,
};
use tracing::{debug, info, warn};

/// Task lifecycle operations.
///
/// Every mutation validates its references before touching the store, so a
/// rejected call leaves no partial state behind.
#[derive(Clone)]
pub struct TaskService {
    stores: Stores,
}

impl TaskService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    async fn resolve_author(&self, author_id: i64) -> Result<Principal> {
        self.stores
            .principals
            .find_by_id(author_id)
            .await?
            .ok_or(AppError::UnresolvedAuthor(author_id))
    }

    async fn resolve_executor(&self, executor_id: i64) -> Result<Principal> {
        self.stores
            .principals
            .find_by_id(executor_id)
            .await?
            .ok_or(AppError::UnresolvedExecutor(executor_id))
    }

    async fn load(&self, task_id: i64) -> Result<Task> {
        self.stores
            .tasks
            .find_by_id(task_id)
            .await?
            .ok_or(AppError::TaskNotFound(task_id))
    }

    /// Creates a task. Both the author and, when given, the executor must
    /// already exist.
    pub async fn create(&self, req: CreateTaskRequest) -> Result<Task> {
        self.resolve_author(req.author_id).await.inspect_err(|_| {
            warn!(author_id = req.author_id, "create rejected: unknown author");
        })?;
        if let Some(executor_id) = req.executor_id {
            self.resolve_executor(executor_id).await.inspect_err(|_| {
                warn!(executor_id, "create rejected: unknown executor");
            })?;
        }

        let task = self
            .stores
            .tasks
            .insert(NewTask {
                title: req.title,
                description: req.description,
                status: req.status,
                priority: req.priority,
                author_id: req.author_id,
                executor_id: req.executor_id,
            })
            .await?;

        info!(task_id = task.id, author_id = task.author_id, "task created");
        Ok(task)
    }

    pub async fn get(&self, task_id: i64) -> Result<Task> {
        self.load(task_id).await
    }

    pub async fn list_all(&self) -> Result<Vec<Task>> {
        self.stores.tasks.find_all().await
    }

    /// Tasks written by `author_id`, which must name an existing principal.
    pub async fn by_author(&self, author_id: i64, page: PageRequest) -> Result<Page<Task>> {
        self.resolve_author(author_id).await?;
        self.stores
            .tasks
            .find_by_author(author_id, page.normalized())
            .await
    }

    /// Tasks assigned to `executor_id`, which must name an existing principal.
    pub async fn by_executor(&self, executor_id: i64, page: PageRequest) -> Result<Page<Task>> {
        self.resolve_executor(executor_id).await?;
        self.stores
            .tasks
            .find_by_executor(executor_id, page.normalized())
            .await
    }

    /// Overwrites the scalar fields and, when supplied, the author and
    /// executor references.
    ///
    /// Not executor-gated: any member may rewrite a task this way, unlike
    /// [`TaskService::update_status`].
    pub async fn update_fields(&self, task_id: i64, req: UpdateTaskRequest) -> Result<Task> {
        let mut task = self.load(task_id).await?;

        task.title = req.title;
        task.description = req.description;
        task.status = req.status;
        task.priority = req.priority;

        if let Some(author_id) = req.author_id {
            task.author_id = self.resolve_author(author_id).await?.id;
        }
        if let Some(executor_id) = req.executor_id {
            task.executor_id = Some(self.resolve_executor(executor_id).await?.id);
        }

        let task = self.stores.tasks.save(task).await?;
        info!(task_id, "task updated");
        Ok(task)
    }

    /// Sets the status, allowed only for the task's current executor.
    pub async fn update_status(
        &self,
        task_id: i64,
        status: String,
        acting_name: &str,
    ) -> Result<Task> {
        let task = self.load(task_id).await?;
        ensure_executor(self.stores.principals.as_ref(), &task, acting_name).await?;

        let task = self.stores.tasks.update_status(task_id, &status).await?;
        info!(task_id, principal = %acting_name, status = %task.status, "task status changed");
        Ok(task)
    }

    // TODO: decide whether priority changes should be limited to the author
    // or executor; today any member may change them.
    pub async fn update_priority(&self, task_id: i64, priority: String) -> Result<Task> {
        let mut task = self.load(task_id).await?;
        task.priority = priority;

        let task = self.stores.tasks.save(task).await?;
        info!(task_id, priority = %task.priority, "task priority changed");
        Ok(task)
    }

    /// Deletes a task and every comment on it.
    pub async fn delete(&self, task_id: i64) -> Result<()> {
        if !self.stores.tasks.exists_by_id(task_id).await? {
            return Err(AppError::TaskNotFound(task_id));
        }
        self.stores.tasks.delete_by_id(task_id).await?;
        info!(task_id, "task deleted");
        Ok(())
    }

    /// Adds a comment written by the principal called `author_name`.
    pub async fn add_comment(
        &self,
        task_id: i64,
        content: String,
        author_name: &str,
    ) -> Result<CommentView> {
        let task = self.load(task_id).await?;
        let author = self
            .stores
            .principals
            .find_by_name(author_name)
            .await?
            .ok_or_else(|| AppError::PrincipalNotFound(author_name.to_string()))?;

        let comment = self
            .stores
            .comments
            .save(NewComment {
                task_id: task.id,
                author_id: author.id,
                content,
            })
            .await?;

        debug!(task_id, comment_id = comment.id, "comment added");
        Ok(comment_view(comment, &author))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::traits::{MockPrincipalStore, MockTaskStore};
    use crate::db::{CommentStore, MemoryStore, PrincipalStore, TaskStore};
    use crate::types::{NewPrincipal, Role};
    use rstest::rstest;
    use std::sync::Arc;

    fn create_request(author_id: i64, executor_id: Option<i64>) -> CreateTaskRequest {
        CreateTaskRequest {
            title: "Write report".to_string(),
            description: "Quarterly numbers".to_string(),
            status: "OPEN".to_string(),
            priority: "HIGH".to_string(),
            author_id,
            executor_id,
        }
    }

    async fn add_principal(store: &MemoryStore, name: &str) -> Principal {
        PrincipalStore::save(
            store,
            NewPrincipal {
                name: name.to_string(),
                password_hash: "hash".to_string(),
                role: Role::User,
                email: format!("{}@example.com", name),
            },
        )
        .await
        .unwrap()
    }

    /// Service over a memory store with `alice` as author and `bob` as the
    /// executor of one task.
    async fn seeded() -> (TaskService, Arc<MemoryStore>, Task) {
        let store = Arc::new(MemoryStore::new());
        let alice = add_principal(&store, "alice").await;
        let bob = add_principal(&store, "bob").await;
        add_principal(&store, "carol").await;

        let service = TaskService::new(Stores::shared(store.clone()));
        let task = service
            .create(create_request(alice.id, Some(bob.id)))
            .await
            .unwrap();
        (service, store, task)
    }

    #[tokio::test]
    async fn test_create_with_unknown_author_persists_nothing() {
        let store = Arc::new(MemoryStore::new());
        let service = TaskService::new(Stores::shared(store.clone()));

        let result = service.create(create_request(999, None)).await;

        assert!(matches!(result, Err(AppError::UnresolvedAuthor(999))));
        assert!(TaskStore::find_all(store.as_ref()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_with_unknown_executor_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let alice = add_principal(&store, "alice").await;
        let service = TaskService::new(Stores::shared(store.clone()));

        let result = service.create(create_request(alice.id, Some(404))).await;

        assert!(matches!(result, Err(AppError::UnresolvedExecutor(404))));
        assert!(TaskStore::find_all(store.as_ref()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_without_executor() {
        let store = Arc::new(MemoryStore::new());
        let alice = add_principal(&store, "alice").await;
        let service = TaskService::new(Stores::shared(store));

        let task = service.create(create_request(alice.id, None)).await.unwrap();

        assert_eq!(task.author_id, alice.id);
        assert_eq!(task.executor_id, None);
        assert_eq!(task.status, "OPEN");
    }

    #[tokio::test]
    async fn test_executor_changes_status() {
        let (service, _, task) = seeded().await;

        let updated = service
            .update_status(task.id, "DONE".to_string(), "bob")
            .await
            .unwrap();

        assert_eq!(updated.status, "DONE");
        assert_eq!(service.get(task.id).await.unwrap().status, "DONE");
    }

    #[rstest]
    #[case("alice")]
    #[case("carol")]
    #[case("BOB")]
    #[tokio::test]
    async fn test_non_executor_cannot_change_status(#[case] acting: &str) {
        let (service, _, task) = seeded().await;

        let result = service
            .update_status(task.id, "DONE".to_string(), acting)
            .await;

        assert!(matches!(result, Err(AppError::AccessDenied)));
        assert_eq!(service.get(task.id).await.unwrap().status, "OPEN");
    }

    #[rstest]
    #[case("alice")]
    #[case("bob")]
    #[case("")]
    #[tokio::test]
    async fn test_unassigned_task_status_is_locked(#[case] acting: &str) {
        let store = Arc::new(MemoryStore::new());
        let alice = add_principal(&store, "alice").await;
        add_principal(&store, "bob").await;
        let service = TaskService::new(Stores::shared(store));
        let task = service.create(create_request(alice.id, None)).await.unwrap();

        let result = service
            .update_status(task.id, "DONE".to_string(), acting)
            .await;

        assert!(matches!(result, Err(AppError::AccessDenied)));
    }

    #[tokio::test]
    async fn test_status_on_missing_task_is_not_found() {
        let (service, _, _) = seeded().await;

        let result = service
            .update_status(77, "DONE".to_string(), "bob")
            .await;

        assert!(matches!(result, Err(AppError::TaskNotFound(77))));
    }

    #[tokio::test]
    async fn test_denied_status_change_never_saves() {
        let mut tasks = MockTaskStore::new();
        tasks.expect_find_by_id().returning(|id| {
            Ok(Some(Task {
                id,
                title: "t".to_string(),
                description: "d".to_string(),
                status: "OPEN".to_string(),
                priority: "LOW".to_string(),
                author_id: 1,
                executor_id: Some(42),
            }))
        });
        tasks.expect_save().never();
        tasks.expect_update_status().never();

        let mut principals = MockPrincipalStore::new();
        principals.expect_find_by_id().returning(|id| {
            Ok(Some(Principal {
                id,
                name: "bob".to_string(),
                password_hash: "hash".to_string(),
                role: Role::User,
                email: "bob@example.com".to_string(),
            }))
        });

        let stores = Stores {
            principals: Arc::new(principals),
            tasks: Arc::new(tasks),
            comments: Arc::new(MemoryStore::new()),
        };
        let service = TaskService::new(stores);

        let result = service.update_status(7, "DONE".to_string(), "carol").await;

        assert!(matches!(result, Err(AppError::AccessDenied)));
    }

    #[tokio::test]
    async fn test_status_change_writes_only_the_status() {
        let mut tasks = MockTaskStore::new();
        tasks.expect_find_by_id().returning(|id| {
            Ok(Some(Task {
                id,
                title: "t".to_string(),
                description: "d".to_string(),
                status: "OPEN".to_string(),
                priority: "LOW".to_string(),
                author_id: 1,
                executor_id: Some(42),
            }))
        });
        tasks.expect_save().never();
        tasks
            .expect_update_status()
            .withf(|id, status| *id == 7 && status.to_string() == "DONE")
            .times(1)
            .returning(|id, status| {
                Ok(Task {
                    id,
                    title: "t".to_string(),
                    description: "d".to_string(),
                    status: status.to_string(),
                    priority: "LOW".to_string(),
                    author_id: 1,
                    executor_id: Some(99),
                })
            });

        let mut principals = MockPrincipalStore::new();
        principals.expect_find_by_id().returning(|id| {
            Ok(Some(Principal {
                id,
                name: "bob".to_string(),
                password_hash: "hash".to_string(),
                role: Role::User,
                email: "bob@example.com".to_string(),
            }))
        });

        let stores = Stores {
            principals: Arc::new(principals),
            tasks: Arc::new(tasks),
            comments: Arc::new(MemoryStore::new()),
        };
        let service = TaskService::new(stores);

        let updated = service
            .update_status(7, "DONE".to_string(), "bob")
            .await
            .unwrap();

        assert_eq!(updated.status, "DONE");
        assert_eq!(updated.executor_id, Some(99));
    }

    #[tokio::test]
    async fn test_update_fields_is_not_executor_gated() {
        let (service, store, task) = seeded().await;
        let carol = store.find_by_name("carol").await.unwrap().unwrap();

        let updated = service
            .update_fields(
                task.id,
                UpdateTaskRequest {
                    title: "New title".to_string(),
                    description: "New description".to_string(),
                    status: "IN_PROGRESS".to_string(),
                    priority: "LOW".to_string(),
                    author_id: None,
                    executor_id: Some(carol.id),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "New title");
        assert_eq!(updated.author_id, task.author_id);
        assert_eq!(updated.executor_id, Some(carol.id));
    }

    #[tokio::test]
    async fn test_update_fields_rejects_unknown_references() {
        let (service, _, task) = seeded().await;
        let request = |author_id, executor_id| UpdateTaskRequest {
            title: "x".to_string(),
            description: "x".to_string(),
            status: "x".to_string(),
            priority: "x".to_string(),
            author_id,
            executor_id,
        };

        assert!(matches!(
            service.update_fields(task.id, request(Some(500), None)).await,
            Err(AppError::UnresolvedAuthor(500))
        ));
        assert!(matches!(
            service.update_fields(task.id, request(None, Some(501))).await,
            Err(AppError::UnresolvedExecutor(501))
        ));
        assert_eq!(service.get(task.id).await.unwrap().title, "Write report");
    }

    #[tokio::test]
    async fn test_update_priority() {
        let (service, _, task) = seeded().await;

        let updated = service
            .update_priority(task.id, "LOW".to_string())
            .await
            .unwrap();
        assert_eq!(updated.priority, "LOW");

        assert!(matches!(
            service.update_priority(99, "LOW".to_string()).await,
            Err(AppError::TaskNotFound(99))
        ));
    }

    #[tokio::test]
    async fn test_delete_cascades_comments() {
        let (service, store, task) = seeded().await;
        service
            .add_comment(task.id, "first".to_string(), "carol")
            .await
            .unwrap();

        service.delete(task.id).await.unwrap();

        assert!(matches!(
            service.get(task.id).await,
            Err(AppError::TaskNotFound(_))
        ));
        assert!(store.find_by_task_id(task.id).await.unwrap().is_empty());
        assert!(matches!(
            service.delete(task.id).await,
            Err(AppError::TaskNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_add_comment() {
        let (service, _, task) = seeded().await;

        let view = service
            .add_comment(task.id, "Looks good".to_string(), "carol")
            .await
            .unwrap();
        assert_eq!(view.author_name, "carol");
        assert_eq!(view.task_id, task.id);

        assert!(matches!(
            service.add_comment(task.id, "?".to_string(), "mallory").await,
            Err(AppError::PrincipalNotFound(_))
        ));
        assert!(matches!(
            service.add_comment(123, "?".to_string(), "carol").await,
            Err(AppError::TaskNotFound(123))
        ));
    }

    #[tokio::test]
    async fn test_listing_by_unknown_principal() {
        let (service, _, _) = seeded().await;

        assert!(matches!(
            service.by_author(999, PageRequest::default()).await,
            Err(AppError::UnresolvedAuthor(999))
        ));
        assert!(matches!(
            service.by_executor(999, PageRequest::default()).await,
            Err(AppError::UnresolvedExecutor(999))
        ));
    }

    #[tokio::test]
    async fn test_listing_by_executor() {
        let (service, store, task) = seeded().await;
        let bob = store.find_by_name("bob").await.unwrap().unwrap();

        let page = service
            .by_executor(bob.id, PageRequest::default())
            .await
            .unwrap();

        assert_eq!(page.total_elements, 1);
        assert_eq!(page.content[0].id, task.id);
    }
}
