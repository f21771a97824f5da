// ABOUTME: Review request storage layer using SQLite
// ABOUTME: Atomic create-with-thread, version-checked full replacement, and filtered listing

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::{debug, warn};

use docket_core::{generate_id, Request, RequestItem, RequestState, UserRef};

use crate::error::{StorageError, StorageResult};
use crate::listing::{title_search_key, RequestFilter, RequestSort};
use crate::pagination::PaginationParams;
use crate::traits::{NewRequest, RequestReplacement, RequestStore};

pub struct SqliteRequestStore {
    pool: SqlitePool,
}

impl SqliteRequestStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn write_reviewers(
        tx: &mut Transaction<'_, Sqlite>,
        request_id: &str,
        reviewers: &[String],
    ) -> StorageResult<()> {
        sqlx::query("DELETE FROM request_reviewers WHERE request_id = ?")
            .bind(request_id)
            .execute(&mut **tx)
            .await
            .map_err(StorageError::Sqlx)?;

        for (position, user_id) in reviewers.iter().enumerate() {
            sqlx::query(
                "INSERT INTO request_reviewers (request_id, user_id, position) VALUES (?, ?, ?)",
            )
            .bind(request_id)
            .bind(user_id)
            .bind(position as i64)
            .execute(&mut **tx)
            .await
            .map_err(StorageError::from_write)?;
        }

        Ok(())
    }

    async fn write_items(
        tx: &mut Transaction<'_, Sqlite>,
        request_id: &str,
        items: &[RequestItem],
    ) -> StorageResult<()> {
        sqlx::query("DELETE FROM request_items WHERE request_id = ?")
            .bind(request_id)
            .execute(&mut **tx)
            .await
            .map_err(StorageError::Sqlx)?;

        for (position, item) in items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO request_items (request_id, item_id, position) VALUES (?, ?, ?)",
            )
            .bind(request_id)
            .bind(&item.item_id)
            .bind(position as i64)
            .execute(&mut **tx)
            .await
            .map_err(StorageError::from_write)?;
        }

        Ok(())
    }

    async fn load_reviewers(
        conn: &mut SqliteConnection,
        request_id: &str,
    ) -> StorageResult<Vec<String>> {
        sqlx::query_scalar(
            "SELECT user_id FROM request_reviewers WHERE request_id = ? ORDER BY position",
        )
        .bind(request_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)
    }

    async fn load_items(
        conn: &mut SqliteConnection,
        request_id: &str,
    ) -> StorageResult<Vec<RequestItem>> {
        let item_ids: Vec<String> = sqlx::query_scalar(
            "SELECT item_id FROM request_items WHERE request_id = ? ORDER BY position",
        )
        .bind(request_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?;

        Ok(item_ids.into_iter().map(RequestItem::new).collect())
    }

    /// Convert a request row and attach its reviewers and items read on the same connection
    async fn hydrate(conn: &mut SqliteConnection, row: &SqliteRow) -> StorageResult<Request> {
        let mut request = row_to_request(row)?;
        request.reviewers = Self::load_reviewers(conn, &request.id).await?;
        request.items = Self::load_items(conn, &request.id).await?;
        Ok(request)
    }

    /// Read one request and its children. Inside a transaction all three reads share a snapshot.
    pub(crate) async fn fetch_request(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> StorageResult<Option<Request>> {
        let row = sqlx::query("SELECT * FROM requests WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(StorageError::Sqlx)?;

        match row {
            Some(r) => Ok(Some(Self::hydrate(conn, &r).await?)),
            None => Ok(None),
        }
    }
}

fn row_to_request(row: &SqliteRow) -> StorageResult<Request> {
    let state_str: String = row.try_get("state").map_err(StorageError::Sqlx)?;
    let state = state_str
        .parse::<RequestState>()
        .map_err(|e| StorageError::Database(e.to_string()))?;

    Ok(Request {
        id: row.try_get("id").map_err(StorageError::Sqlx)?,
        project_id: row.try_get("project_id").map_err(StorageError::Sqlx)?,
        workspace_id: row.try_get("workspace_id").map_err(StorageError::Sqlx)?,
        title: row.try_get("title").map_err(StorageError::Sqlx)?,
        description: row.try_get("description").map_err(StorageError::Sqlx)?,
        state,
        created_by: UserRef {
            id: row.try_get("created_by_id").map_err(StorageError::Sqlx)?,
            name: row.try_get("created_by_name").map_err(StorageError::Sqlx)?,
        },
        reviewers: Vec::new(),
        items: Vec::new(),
        thread_id: row.try_get("thread_id").map_err(StorageError::Sqlx)?,
        version: row.try_get("version").map_err(StorageError::Sqlx)?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(StorageError::Sqlx)?,
        updated_at: row
            .try_get::<DateTime<Utc>, _>("updated_at")
            .map_err(StorageError::Sqlx)?,
        approved_at: row.try_get("approved_at").map_err(StorageError::Sqlx)?,
        closed_at: row.try_get("closed_at").map_err(StorageError::Sqlx)?,
    })
}

#[async_trait]
impl RequestStore for SqliteRequestStore {
    async fn create_request(&self, input: NewRequest) -> StorageResult<Request> {
        let request_id = generate_id("req");
        let thread_id = generate_id("thread");

        debug!(
            "Creating request: {} (project: {}, thread: {})",
            request_id, input.project_id, thread_id
        );

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        sqlx::query("INSERT INTO threads (id, created_at) VALUES (?, ?)")
            .bind(&thread_id)
            .bind(input.created_at)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

        sqlx::query(
            r#"
            INSERT INTO requests (
                id, project_id, workspace_id, title, title_search, description, state,
                created_by_id, created_by_name, thread_id, version,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(&request_id)
        .bind(&input.project_id)
        .bind(&input.workspace_id)
        .bind(&input.title)
        .bind(title_search_key(&input.title))
        .bind(&input.description)
        .bind(input.state.as_str())
        .bind(&input.created_by.id)
        .bind(&input.created_by.name)
        .bind(&thread_id)
        .bind(input.created_at)
        .bind(input.created_at)
        .execute(&mut *tx)
        .await
        .map_err(StorageError::from_write)?;

        Self::write_reviewers(&mut tx, &request_id, &input.reviewers).await?;
        Self::write_items(&mut tx, &request_id, &input.items).await?;

        tx.commit().await.map_err(StorageError::Sqlx)?;

        self.get_request(&request_id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("request {}", request_id)))
    }

    async fn get_request(&self, id: &str) -> StorageResult<Option<Request>> {
        debug!("Fetching request: {}", id);

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;
        let request = Self::fetch_request(&mut *tx, id).await?;
        tx.commit().await.map_err(StorageError::Sqlx)?;

        Ok(request)
    }

    async fn replace_request(
        &self,
        id: &str,
        replacement: RequestReplacement,
    ) -> StorageResult<Request> {
        debug!(
            "Replacing request: {} (expected version: {})",
            id, replacement.expected_version
        );

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        let result = sqlx::query(
            r#"
            UPDATE requests
            SET title = ?, title_search = ?, description = ?, state = ?, updated_at = ?,
                approved_at = ?, closed_at = ?, version = version + 1
            WHERE id = ? AND version = ?
            "#,
        )
        .bind(&replacement.title)
        .bind(title_search_key(&replacement.title))
        .bind(&replacement.description)
        .bind(replacement.state.as_str())
        .bind(replacement.updated_at)
        .bind(replacement.approved_at)
        .bind(replacement.closed_at)
        .bind(id)
        .bind(replacement.expected_version)
        .execute(&mut *tx)
        .await
        .map_err(StorageError::from_write)?;

        if result.rows_affected() == 0 {
            let actual: Option<i64> = sqlx::query_scalar("SELECT version FROM requests WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(StorageError::Sqlx)?;

            tx.rollback().await.map_err(StorageError::Sqlx)?;

            return match actual {
                Some(actual) => {
                    warn!(
                        "Stale write to request {}: expected version {}, found {}",
                        id, replacement.expected_version, actual
                    );
                    Err(StorageError::Conflict {
                        id: id.to_string(),
                        expected: replacement.expected_version,
                        actual,
                    })
                }
                None => Err(StorageError::NotFound(format!("request {}", id))),
            };
        }

        Self::write_reviewers(&mut tx, id, &replacement.reviewers).await?;
        Self::write_items(&mut tx, id, &replacement.items).await?;

        tx.commit().await.map_err(StorageError::Sqlx)?;

        self.get_request(id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("request {}", id)))
    }

    async fn list_requests(
        &self,
        project_id: &str,
        filter: &RequestFilter,
        pagination: &PaginationParams,
        sort: RequestSort,
    ) -> StorageResult<(Vec<Request>, i64)> {
        debug!(
            "Listing requests for project: {} (page: {}, limit: {})",
            project_id,
            pagination.page(),
            pagination.limit()
        );

        let (where_clause, binds) = filter.to_sql(project_id);

        // Count, page, and children all come from one snapshot
        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        let count_sql = format!("SELECT COUNT(*) FROM requests WHERE {}", where_clause);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        for value in &binds {
            count_query = count_query.bind(value);
        }
        let total = count_query
            .fetch_one(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

        let list_sql = format!(
            "SELECT * FROM requests WHERE {} ORDER BY {} LIMIT ? OFFSET ?",
            where_clause,
            sort.order_by()
        );
        let mut list_query = sqlx::query(&list_sql);
        for value in &binds {
            list_query = list_query.bind(value);
        }
        let rows = list_query
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

        let mut requests = Vec::with_capacity(rows.len());
        for row in &rows {
            requests.push(Self::hydrate(&mut *tx, row).await?);
        }

        tx.commit().await.map_err(StorageError::Sqlx)?;

        Ok((requests, total))
    }
}
