//! ContentAccess model: per-user access grants on content items.
//!
//! Grants live and die independently of the content row (except that
//! deleting content removes its grants). Duplicate grants for the same
//! content/user pair are the caller's responsibility.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::models::AccessLevel;

/// Access grant record.
///
/// Note: the database column is "type"; queries alias it to `access_type`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ContentAccess {
    pub content_id: i64,
    pub user_id: i64,
    #[serde(rename = "type")]
    pub access_type: AccessLevel,
    pub tenant_id: i64,
}

const COLUMNS: &str = "content_id, user_id, type AS access_type, tenant_id";

impl ContentAccess {
    /// List grants for a content item within a tenant.
    pub async fn list_for_content(
        pool: &PgPool,
        content_id: i64,
        tenant_id: i64,
    ) -> Result<Vec<Self>> {
        let grants = sqlx::query_as::<_, ContentAccess>(&format!(
            "SELECT {COLUMNS} FROM content_access WHERE content_id = $1 AND tenant_id = $2"
        ))
        .bind(content_id)
        .bind(tenant_id)
        .fetch_all(pool)
        .await
        .context("failed to list content access grants")?;

        Ok(grants)
    }

    /// Insert a grant.
    pub async fn insert(
        pool: &PgPool,
        content_id: i64,
        user_id: i64,
        access_type: AccessLevel,
        tenant_id: i64,
    ) -> Result<Self> {
        let grant = sqlx::query_as::<_, ContentAccess>(&format!(
            r#"
            INSERT INTO content_access (content_id, user_id, type, tenant_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(content_id)
        .bind(user_id)
        .bind(access_type)
        .bind(tenant_id)
        .fetch_one(pool)
        .await
        .context("failed to insert content access grant")?;

        Ok(grant)
    }

    /// Delete matching grants. Returns the number of rows removed.
    pub async fn delete(
        pool: &PgPool,
        content_id: i64,
        user_id: i64,
        access_type: AccessLevel,
        tenant_id: i64,
    ) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM content_access \
             WHERE content_id = $1 AND user_id = $2 AND type = $3 AND tenant_id = $4",
        )
        .bind(content_id)
        .bind(user_id)
        .bind(access_type)
        .bind(tenant_id)
        .execute(pool)
        .await
        .context("failed to delete content access grant")?;

        Ok(result.rows_affected())
    }
}
