use crate::db::{Page, PageRequest, Stores};
use crate::types::{AppError, Comment, CommentView, Principal, Result};
use std::collections::HashMap;
use tracing::info;

pub(crate) fn comment_view(comment: Comment, author: &Principal) -> CommentView {
    CommentView {
        id: comment.id,
        task_id: comment.task_id,
        author_id: comment.author_id,
        author_name: author.name.clone(),
        content: comment.content,
    }
}

/// Read and delete access to task comments.
#[derive(Clone)]
pub struct CommentService {
    stores: Stores,
}

impl CommentService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    async fn ensure_task(&self, task_id: i64) -> Result<()> {
        if self.stores.tasks.exists_by_id(task_id).await? {
            Ok(())
        } else {
            Err(AppError::TaskNotFound(task_id))
        }
    }

    /// Attaches author names, looking each distinct author up once.
    async fn views(&self, comments: Vec<Comment>) -> Result<Vec<CommentView>> {
        let mut authors: HashMap<i64, Principal> = HashMap::new();
        let mut views = Vec::with_capacity(comments.len());

        for comment in comments {
            if !authors.contains_key(&comment.author_id) {
                let author = self
                    .stores
                    .principals
                    .find_by_id(comment.author_id)
                    .await?
                    .ok_or_else(|| AppError::PrincipalNotFound(comment.author_id.to_string()))?;
                authors.insert(author.id, author);
            }
            let author = &authors[&comment.author_id];
            views.push(comment_view(comment, author));
        }

        Ok(views)
    }

    /// Every comment on a task, oldest first.
    pub async fn list_for_task(&self, task_id: i64) -> Result<Vec<CommentView>> {
        self.ensure_task(task_id).await?;
        let comments = self.stores.comments.find_by_task_id(task_id).await?;
        self.views(comments).await
    }

    pub async fn page_for_task(
        &self,
        task_id: i64,
        page: PageRequest,
    ) -> Result<Page<CommentView>> {
        self.ensure_task(task_id).await?;
        let page = self
            .stores
            .comments
            .find_by_task(task_id, page.normalized())
            .await?;

        let Page {
            content,
            page,
            size,
            total_elements,
            total_pages,
        } = page;
        Ok(Page {
            content: self.views(content).await?,
            page,
            size,
            total_elements,
            total_pages,
        })
    }

    pub async fn delete(&self, comment_id: i64) -> Result<()> {
        if !self.stores.comments.exists_by_id(comment_id).await? {
            return Err(AppError::CommentNotFound(comment_id));
        }
        self.stores.comments.delete_by_id(comment_id).await?;
        info!(comment_id, "comment deleted");
        Ok(())
    }
}
