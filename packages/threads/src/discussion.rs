// ABOUTME: Comment create, edit, and delete on a request's discussion thread
// ABOUTME: Edits and deletes are restricted to the comment's own author

use std::sync::Arc;

use tracing::{debug, info, warn};

use docket_core::{validate_comment_content, Author, Comment, ReviewError, ReviewResult};
use docket_storage::ThreadStore;

/// Comment operations keyed by thread id.
///
/// Every operation takes the thread id as an `Option`: a missing or blank id
/// means the owner has no discussion attached, and the call does nothing.
pub struct DiscussionService {
    store: Arc<dyn ThreadStore>,
}

fn present(thread_id: Option<&str>) -> Option<&str> {
    thread_id.map(str::trim).filter(|id| !id.is_empty())
}

impl DiscussionService {
    pub fn new(store: Arc<dyn ThreadStore>) -> Self {
        Self { store }
    }

    /// Comments in creation order; empty when there is no thread
    pub async fn list(&self, thread_id: Option<&str>) -> ReviewResult<Vec<Comment>> {
        let Some(thread_id) = present(thread_id) else {
            return Ok(Vec::new());
        };
        Ok(self.store.list_comments(thread_id).await?)
    }

    /// Append a comment. Returns `None` when there is no thread.
    pub async fn create(
        &self,
        thread_id: Option<&str>,
        author: &Author,
        content: &str,
    ) -> ReviewResult<Option<Comment>> {
        let Some(thread_id) = present(thread_id) else {
            debug!("Skipping comment by {}: no thread", author.id());
            return Ok(None);
        };

        let content = validate_comment_content(content)?;
        let comment = self.store.add_comment(thread_id, author, &content).await?;

        info!(
            "Comment {} added to thread {} by {} {}",
            comment.id,
            thread_id,
            author.kind().as_str(),
            author.id()
        );
        Ok(Some(comment))
    }

    /// Replace a comment's content. Only its author may do this.
    pub async fn update(
        &self,
        thread_id: Option<&str>,
        comment_id: &str,
        acting: &Author,
        content: &str,
    ) -> ReviewResult<Option<Comment>> {
        let Some(thread_id) = present(thread_id) else {
            debug!("Skipping edit of {}: no thread", comment_id);
            return Ok(None);
        };

        let content = validate_comment_content(content)?;
        self.authorize(thread_id, comment_id, acting).await?;

        let comment = self
            .store
            .edit_comment(thread_id, comment_id, &content)
            .await?;

        info!("Comment {} edited by {}", comment_id, acting.id());
        Ok(Some(comment))
    }

    /// Permanently remove a comment. Only its author may do this.
    /// A comment that is already gone yields `NotFound` and leaves the thread as it was.
    pub async fn delete(
        &self,
        thread_id: Option<&str>,
        comment_id: &str,
        acting: &Author,
    ) -> ReviewResult<()> {
        let Some(thread_id) = present(thread_id) else {
            debug!("Skipping delete of {}: no thread", comment_id);
            return Ok(());
        };

        self.authorize(thread_id, comment_id, acting).await?;
        self.store.remove_comment(thread_id, comment_id).await?;

        info!("Comment {} deleted by {}", comment_id, acting.id());
        Ok(())
    }

    async fn authorize(
        &self,
        thread_id: &str,
        comment_id: &str,
        acting: &Author,
    ) -> ReviewResult<Comment> {
        let comment = self
            .store
            .get_comment(thread_id, comment_id)
            .await?
            .ok_or_else(|| ReviewError::NotFound(format!("comment {}", comment_id)))?;

        if !comment.author.is_same_identity(acting) {
            warn!(
                "{} {} attempted to modify comment {} owned by {} {}",
                acting.kind().as_str(),
                acting.id(),
                comment_id,
                comment.author.kind().as_str(),
                comment.author.id()
            );
            return Err(ReviewError::Forbidden(format!(
                "comment {} belongs to another author",
                comment_id
            )));
        }

        Ok(comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use docket_storage::{StorageError, StorageResult};
    use mockall::mock;
    use mockall::predicate::{always, eq};

    mock! {
        Threads {}

        #[async_trait::async_trait]
        impl ThreadStore for Threads {
            async fn create_thread(&self) -> StorageResult<String>;
            async fn list_comments(&self, thread_id: &str) -> StorageResult<Vec<Comment>>;
            async fn get_comment(&self, thread_id: &str, comment_id: &str) -> StorageResult<Option<Comment>>;
            async fn add_comment(&self, thread_id: &str, author: &Author, content: &str) -> StorageResult<Comment>;
            async fn edit_comment(&self, thread_id: &str, comment_id: &str, content: &str) -> StorageResult<Comment>;
            async fn remove_comment(&self, thread_id: &str, comment_id: &str) -> StorageResult<()>;
        }
    }

    fn user(id: &str) -> Author {
        Author::User {
            id: id.to_string(),
            name: format!("User {}", id),
        }
    }

    fn comment_by(author: Author) -> Comment {
        Comment {
            id: "cmt-1".to_string(),
            thread_id: "thread-1".to_string(),
            author,
            content: "hello".to_string(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_no_thread_is_a_silent_no_op() {
        // No expectations: any store call would panic
        let service = DiscussionService::new(Arc::new(MockThreads::new()));

        assert_eq!(service.create(None, &user("u1"), "hi").await, Ok(None));
        assert_eq!(
            service.create(Some("  "), &user("u1"), "hi").await,
            Ok(None)
        );
        assert_eq!(
            service.update(None, "cmt-1", &user("u1"), "hi").await,
            Ok(None)
        );
        assert_eq!(service.delete(None, "cmt-1", &user("u1")).await, Ok(()));
        assert_eq!(service.list(None).await, Ok(Vec::new()));
    }

    #[tokio::test]
    async fn test_create_trims_and_rejects_empty_content() {
        let mut store = MockThreads::new();
        store
            .expect_add_comment()
            .with(eq("thread-1"), always(), eq("looks good"))
            .times(1)
            .returning(|_, author, content| {
                let mut comment = comment_by(author.clone());
                comment.content = content.to_string();
                Ok(comment)
            });
        let service = DiscussionService::new(Arc::new(store));

        let created = service
            .create(Some("thread-1"), &user("u1"), "  looks good \n")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(created.content, "looks good");

        let err = service
            .create(Some("thread-1"), &user("u1"), "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, ReviewError::ValidationFailed(_)));
    }

    #[tokio::test]
    async fn test_update_by_other_user_is_forbidden() {
        let mut store = MockThreads::new();
        store
            .expect_get_comment()
            .with(eq("thread-1"), eq("cmt-1"))
            .returning(|_, _| Ok(Some(comment_by(user("u1")))));
        store.expect_edit_comment().never();
        store.expect_remove_comment().never();
        let service = DiscussionService::new(Arc::new(store));

        let err = service
            .update(Some("thread-1"), "cmt-1", &user("u2"), "hijack")
            .await
            .unwrap_err();
        assert!(matches!(err, ReviewError::Forbidden(_)));

        let err = service
            .delete(Some("thread-1"), "cmt-1", &user("u2"))
            .await
            .unwrap_err();
        assert!(matches!(err, ReviewError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_integration_cannot_edit_user_comment_with_same_id() {
        let mut store = MockThreads::new();
        store
            .expect_get_comment()
            .returning(|_, _| Ok(Some(comment_by(user("u1")))));
        store.expect_edit_comment().never();
        let service = DiscussionService::new(Arc::new(store));

        let bot = Author::Integration {
            id: "u1".to_string(),
            name: "Bot".to_string(),
        };
        let err = service
            .update(Some("thread-1"), "cmt-1", &bot, "edit")
            .await
            .unwrap_err();
        assert!(matches!(err, ReviewError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_author_can_edit_even_after_renaming() {
        let mut store = MockThreads::new();
        store
            .expect_get_comment()
            .returning(|_, _| Ok(Some(comment_by(user("u1")))));
        store
            .expect_edit_comment()
            .with(eq("thread-1"), eq("cmt-1"), eq("edited"))
            .times(1)
            .returning(|_, _, content| {
                let mut comment = comment_by(user("u1"));
                comment.content = content.to_string();
                comment.updated_at = Some(Utc::now());
                Ok(comment)
            });
        let service = DiscussionService::new(Arc::new(store));

        let renamed = Author::User {
            id: "u1".to_string(),
            name: "New Name".to_string(),
        };
        let edited = service
            .update(Some("thread-1"), "cmt-1", &renamed, "edited")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(edited.content, "edited");
        assert!(edited.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_missing_comment_is_not_found() {
        let mut store = MockThreads::new();
        store.expect_get_comment().returning(|_, _| Ok(None));
        let service = DiscussionService::new(Arc::new(store));

        let err = service
            .delete(Some("thread-1"), "cmt-gone", &user("u1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ReviewError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_store_failure_is_unreachable() {
        let mut store = MockThreads::new();
        store
            .expect_list_comments()
            .returning(|_| Err(StorageError::Database("disk I/O error".to_string())));
        let service = DiscussionService::new(Arc::new(store));

        let err = service.list(Some("thread-1")).await.unwrap_err();
        assert!(matches!(err, ReviewError::Unreachable(_)));
    }
}
