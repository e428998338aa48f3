//! ContentType model and CRUD operations.
//!
//! Content types define the shape of content metadata via a runtime schema
//! document. Every query is scoped to a tenant id.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Access level of a content type or content item, stored as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Public,
    Private,
    Paywalled,
    Restricted,
    Subscriber,
    Tokengated,
}

/// Error for unrecognized access level strings.
#[derive(Debug, Error)]
#[error("unknown access level '{0}'")]
pub struct ParseAccessLevelError(String);

impl AccessLevel {
    /// Text stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            AccessLevel::Public => "public",
            AccessLevel::Private => "private",
            AccessLevel::Paywalled => "paywalled",
            AccessLevel::Restricted => "restricted",
            AccessLevel::Subscriber => "subscriber",
            AccessLevel::Tokengated => "tokengated",
        }
    }
}

impl FromStr for AccessLevel {
    type Err = ParseAccessLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(AccessLevel::Public),
            "private" => Ok(AccessLevel::Private),
            "paywalled" => Ok(AccessLevel::Paywalled),
            "restricted" => Ok(AccessLevel::Restricted),
            "subscriber" => Ok(AccessLevel::Subscriber),
            "tokengated" => Ok(AccessLevel::Tokengated),
            other => Err(ParseAccessLevelError(other.to_string())),
        }
    }
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl sqlx::Type<sqlx::Postgres> for AccessLevel {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <&str as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <&str as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for AccessLevel {
    fn decode(
        value: sqlx::postgres::PgValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<'r, sqlx::Postgres>>::decode(value)?;
        Ok(s.parse::<AccessLevel>()?)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for AccessLevel {
    fn encode_by_ref(
        &self,
        buf: &mut <sqlx::Postgres as sqlx::Database>::ArgumentBuffer<'q>,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

/// Content type record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ContentType {
    /// Numeric identifier.
    pub id: i64,

    /// Stable external identifier (UUIDv7).
    pub uuid: Uuid,

    /// Name, unique within a tenant.
    pub name: String,

    /// Default access level for content of this type.
    pub access_level: AccessLevel,

    /// Schema document constraining content metadata (JSONB, nullable).
    pub schema: Option<serde_json::Value>,

    /// Owning tenant.
    pub tenant_id: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a content type.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateContentType {
    pub name: String,
    pub access_level: Option<AccessLevel>,
    pub schema: Option<serde_json::Value>,
}

/// Input for updating a content type. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateContentType {
    pub name: Option<String>,
    pub access_level: Option<AccessLevel>,
    pub schema: Option<serde_json::Value>,
}

const COLUMNS: &str = "id, uuid, name, access_level, schema, tenant_id, created_at, updated_at";

impl ContentType {
    /// Find a content type by id within a tenant.
    pub async fn find_by_id(pool: &PgPool, id: i64, tenant_id: i64) -> Result<Option<Self>> {
        let content_type = sqlx::query_as::<_, ContentType>(&format!(
            "SELECT {COLUMNS} FROM content_type WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch content type by id")?;

        Ok(content_type)
    }

    /// Find a content type by name within a tenant.
    pub async fn find_by_name(pool: &PgPool, name: &str, tenant_id: i64) -> Result<Option<Self>> {
        let content_type = sqlx::query_as::<_, ContentType>(&format!(
            "SELECT {COLUMNS} FROM content_type WHERE name = $1 AND tenant_id = $2"
        ))
        .bind(name)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch content type by name")?;

        Ok(content_type)
    }

    /// List all content types for a tenant, ordered by name.
    pub async fn list(pool: &PgPool, tenant_id: i64) -> Result<Vec<Self>> {
        let types = sqlx::query_as::<_, ContentType>(&format!(
            "SELECT {COLUMNS} FROM content_type WHERE tenant_id = $1 ORDER BY name ASC"
        ))
        .bind(tenant_id)
        .fetch_all(pool)
        .await
        .context("failed to list content types")?;

        Ok(types)
    }

    /// List the first `limit` content types across tenants, ordered by id.
    ///
    /// Used for opportunistic cache warm-up; tenant checks happen at read
    /// time in the cache.
    pub async fn list_for_warmup(pool: &PgPool, limit: i64) -> Result<Vec<Self>> {
        let types = sqlx::query_as::<_, ContentType>(&format!(
            "SELECT {COLUMNS} FROM content_type ORDER BY id ASC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("failed to list content types for warm-up")?;

        Ok(types)
    }

    /// Insert a new content type.
    pub async fn insert(
        pool: &PgPool,
        input: &CreateContentType,
        tenant_id: i64,
    ) -> Result<Self> {
        let now = Utc::now();

        let content_type = sqlx::query_as::<_, ContentType>(&format!(
            r#"
            INSERT INTO content_type (uuid, name, access_level, schema, tenant_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(Uuid::now_v7())
        .bind(&input.name)
        .bind(input.access_level.unwrap_or(AccessLevel::Public))
        .bind(&input.schema)
        .bind(tenant_id)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .context("failed to insert content type")?;

        Ok(content_type)
    }

    /// Persist merged fields for an existing content type.
    pub async fn update(
        pool: &PgPool,
        id: i64,
        tenant_id: i64,
        name: &str,
        access_level: AccessLevel,
        schema: &Option<serde_json::Value>,
    ) -> Result<Option<Self>> {
        let content_type = sqlx::query_as::<_, ContentType>(&format!(
            r#"
            UPDATE content_type
            SET name = $1, access_level = $2, schema = $3, updated_at = $4
            WHERE id = $5 AND tenant_id = $6
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(name)
        .bind(access_level)
        .bind(schema)
        .bind(Utc::now())
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await
        .context("failed to update content type")?;

        Ok(content_type)
    }

    /// Delete a content type.
    pub async fn delete(pool: &PgPool, id: i64, tenant_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM content_type WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(pool)
            .await
            .context("failed to delete content type")?;

        Ok(result.rows_affected() > 0)
    }
}
