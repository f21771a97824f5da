// ABOUTME: Workspace membership storage layer using SQLite
// ABOUTME: Role lookups feeding the membership resolver, plus upsert and removal

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use docket_core::{Role, WorkspaceMember};

use crate::error::{StorageError, StorageResult};
use crate::traits::MembershipSource;

pub struct SqliteMembershipStore {
    pool: SqlitePool,
}

impl SqliteMembershipStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a member or change the role of an existing one
    pub async fn upsert_member(&self, workspace_id: &str, user_id: &str, role: Role) -> StorageResult<()> {
        debug!(
            "Setting role {} for user {} in workspace {}",
            role, user_id, workspace_id
        );

        sqlx::query(
            r#"
            INSERT INTO workspace_members (workspace_id, user_id, role)
            VALUES (?, ?, ?)
            ON CONFLICT (workspace_id, user_id) DO UPDATE SET role = excluded.role
            "#,
        )
        .bind(workspace_id)
        .bind(user_id)
        .bind(role.as_str())
        .execute(&self.pool)
        .await
        .map_err(StorageError::from_write)?;

        Ok(())
    }

    pub async fn remove_member(&self, workspace_id: &str, user_id: &str) -> StorageResult<()> {
        debug!("Removing user {} from workspace {}", user_id, workspace_id);

        let result =
            sqlx::query("DELETE FROM workspace_members WHERE workspace_id = ? AND user_id = ?")
                .bind(workspace_id)
                .bind(user_id)
                .execute(&self.pool)
                .await
                .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!(
                "member {} of workspace {}",
                user_id, workspace_id
            )));
        }

        Ok(())
    }
}

fn row_to_member(row: &SqliteRow) -> StorageResult<WorkspaceMember> {
    let role_str: String = row.try_get("role").map_err(StorageError::Sqlx)?;
    let role = role_str
        .parse::<Role>()
        .map_err(|e| StorageError::Database(e.to_string()))?;

    Ok(WorkspaceMember {
        user_id: row.try_get("user_id").map_err(StorageError::Sqlx)?,
        role,
    })
}

#[async_trait]
impl MembershipSource for SqliteMembershipStore {
    async fn get_workspace_members(
        &self,
        workspace_id: &str,
    ) -> StorageResult<Vec<WorkspaceMember>> {
        debug!("Fetching members of workspace: {}", workspace_id);

        let rows = sqlx::query(
            "SELECT user_id, role FROM workspace_members WHERE workspace_id = ? ORDER BY user_id",
        )
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_member).collect()
    }
}
