// ABOUTME: Discussion thread storage layer using SQLite
// ABOUTME: Comments are kept in insertion order and addressed by (thread, comment) pairs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use docket_core::{generate_id, Author, AuthorKind, Comment};

use crate::error::{StorageError, StorageResult};
use crate::traits::ThreadStore;

pub struct SqliteThreadStore {
    pool: SqlitePool,
}

impl SqliteThreadStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn thread_exists(&self, thread_id: &str) -> StorageResult<bool> {
        let found: Option<String> = sqlx::query_scalar("SELECT id FROM threads WHERE id = ?")
            .bind(thread_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;
        Ok(found.is_some())
    }
}

fn row_to_comment(row: &SqliteRow) -> StorageResult<Comment> {
    let kind_str: String = row.try_get("author_type").map_err(StorageError::Sqlx)?;
    let kind = kind_str
        .parse::<AuthorKind>()
        .map_err(|e| StorageError::Database(e.to_string()))?;

    let author = Author::from_parts(
        kind,
        row.try_get("author_id").map_err(StorageError::Sqlx)?,
        row.try_get("author_name").map_err(StorageError::Sqlx)?,
    );

    Ok(Comment {
        id: row.try_get("id").map_err(StorageError::Sqlx)?,
        thread_id: row.try_get("thread_id").map_err(StorageError::Sqlx)?,
        author,
        content: row.try_get("content").map_err(StorageError::Sqlx)?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(StorageError::Sqlx)?,
        updated_at: row.try_get("updated_at").map_err(StorageError::Sqlx)?,
    })
}

#[async_trait]
impl ThreadStore for SqliteThreadStore {
    async fn create_thread(&self) -> StorageResult<String> {
        let id = generate_id("thread");
        debug!("Creating thread: {}", id);

        sqlx::query("INSERT INTO threads (id, created_at) VALUES (?, ?)")
            .bind(&id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        Ok(id)
    }

    async fn list_comments(&self, thread_id: &str) -> StorageResult<Vec<Comment>> {
        debug!("Listing comments for thread: {}", thread_id);

        let rows = sqlx::query("SELECT * FROM comments WHERE thread_id = ? ORDER BY seq")
            .bind(thread_id)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_comment).collect()
    }

    async fn get_comment(
        &self,
        thread_id: &str,
        comment_id: &str,
    ) -> StorageResult<Option<Comment>> {
        debug!("Fetching comment: {} (thread: {})", comment_id, thread_id);

        let row = sqlx::query("SELECT * FROM comments WHERE thread_id = ? AND id = ?")
            .bind(thread_id)
            .bind(comment_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        row.as_ref().map(row_to_comment).transpose()
    }

    async fn add_comment(
        &self,
        thread_id: &str,
        author: &Author,
        content: &str,
    ) -> StorageResult<Comment> {
        if !self.thread_exists(thread_id).await? {
            return Err(StorageError::NotFound(format!("thread {}", thread_id)));
        }

        let id = generate_id("cmt");
        debug!("Adding comment: {} (thread: {})", id, thread_id);

        sqlx::query(
            r#"
            INSERT INTO comments (id, thread_id, author_type, author_id, author_name, content, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(thread_id)
        .bind(author.kind().as_str())
        .bind(author.id())
        .bind(author.name())
        .bind(content)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(StorageError::from_write)?;

        self.get_comment(thread_id, &id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("comment {}", id)))
    }

    async fn edit_comment(
        &self,
        thread_id: &str,
        comment_id: &str,
        content: &str,
    ) -> StorageResult<Comment> {
        debug!("Editing comment: {} (thread: {})", comment_id, thread_id);

        let result =
            sqlx::query("UPDATE comments SET content = ?, updated_at = ? WHERE thread_id = ? AND id = ?")
                .bind(content)
                .bind(Utc::now())
                .bind(thread_id)
                .bind(comment_id)
                .execute(&self.pool)
                .await
                .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("comment {}", comment_id)));
        }

        self.get_comment(thread_id, comment_id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("comment {}", comment_id)))
    }

    async fn remove_comment(&self, thread_id: &str, comment_id: &str) -> StorageResult<()> {
        debug!("Removing comment: {} (thread: {})", comment_id, thread_id);

        let result = sqlx::query("DELETE FROM comments WHERE thread_id = ? AND id = ?")
            .bind(thread_id)
            .bind(comment_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("comment {}", comment_id)));
        }

        Ok(())
    }
}
