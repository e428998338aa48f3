//! Content model and CRUD operations.
//!
//! Content rows are generic, schema-validated records (posts, comments,
//! reactions) with an optional self-referential parent. Every query is
//! scoped to a tenant id, and updates go through a version-conditioned
//! write so concurrent editors are detected at the storage layer.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_query::extension::postgres::PgExpr;
use sea_query::{
    Alias, Asterisk, Cond, Expr, JoinType, Order, PostgresQueryBuilder, Query, SelectStatement,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::content::filter::{ContentFilter, ParentFilter, SortDirection};
use crate::models::AccessLevel;

/// Content record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Content {
    /// Numeric identifier.
    pub id: i64,

    /// Stable external identifier (UUIDv7).
    pub uuid: Uuid,

    /// Optional title.
    pub title: Option<String>,

    /// Dynamic metadata (JSONB), validated against the content type schema.
    pub metadata: serde_json::Value,

    /// Access level of this item.
    pub access_type: AccessLevel,

    /// Author user id.
    pub author_id: i64,

    /// Content type this row conforms to.
    pub content_type_id: i64,

    /// Parent content id (NULL for root-level content).
    pub parent_id: Option<i64>,

    /// Owning tenant.
    pub tenant_id: i64,

    /// Optimistic concurrency counter, starts at 1.
    pub version: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating content.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateContent {
    pub title: Option<String>,
    pub metadata: serde_json::Value,
    /// Defaults to the content type's access level when absent.
    pub access_type: Option<AccessLevel>,
    pub author_id: i64,
    pub content_type_id: i64,
    pub parent_id: Option<i64>,
}

/// Input for updating content. Absent fields are left unchanged.
///
/// `parent_id` distinguishes "leave unchanged" (`None`) from "clear"
/// (`Some(None)`) and "set" (`Some(Some(id))`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateContent {
    pub title: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub access_type: Option<AccessLevel>,
    pub content_type_id: Option<i64>,
    pub parent_id: Option<Option<i64>>,
    /// When supplied, the write only succeeds if the row is still at this
    /// version.
    pub expected_version: Option<i32>,
}

const COLUMNS: &str = "id, uuid, title, metadata, access_type, author_id, content_type_id, \
                       parent_id, tenant_id, version, created_at, updated_at";

impl Content {
    /// Check if this item is root-level (has no parent).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Find a content row by id within a tenant.
    pub async fn find_by_id(pool: &PgPool, id: i64, tenant_id: i64) -> Result<Option<Self>> {
        let content = sqlx::query_as::<_, Content>(&format!(
            "SELECT {COLUMNS} FROM content WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch content by id")?;

        Ok(content)
    }

    /// Insert a new content row at version 1.
    pub async fn insert(
        pool: &PgPool,
        input: &CreateContent,
        access_type: AccessLevel,
        tenant_id: i64,
    ) -> Result<Self> {
        let now = Utc::now();

        let content = sqlx::query_as::<_, Content>(&format!(
            r#"
            INSERT INTO content (uuid, title, metadata, access_type, author_id, content_type_id, parent_id, tenant_id, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 1, $9, $10)
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(Uuid::now_v7())
        .bind(&input.title)
        .bind(&input.metadata)
        .bind(access_type)
        .bind(input.author_id)
        .bind(input.content_type_id)
        .bind(input.parent_id)
        .bind(tenant_id)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .context("failed to insert content")?;

        Ok(content)
    }

    /// Persist merged fields with a single version-conditioned write.
    ///
    /// The version increment and (when `expected_version` is supplied) the
    /// version check happen in one atomic statement; a stale version matches
    /// zero rows and yields `None`. There is no read-modify-write window
    /// wider than the statement itself.
    #[allow(clippy::too_many_arguments)]
    pub async fn update_versioned(
        pool: &PgPool,
        id: i64,
        tenant_id: i64,
        title: &Option<String>,
        metadata: &serde_json::Value,
        access_type: AccessLevel,
        content_type_id: i64,
        parent_id: Option<i64>,
        expected_version: Option<i32>,
    ) -> Result<Option<Self>> {
        let set_clause = "title = $1, metadata = $2, access_type = $3, content_type_id = $4, \
                          parent_id = $5, version = version + 1, updated_at = $6";

        let query = if expected_version.is_some() {
            format!(
                "UPDATE content SET {set_clause} \
                 WHERE id = $7 AND tenant_id = $8 AND version = $9 RETURNING {COLUMNS}"
            )
        } else {
            format!(
                "UPDATE content SET {set_clause} \
                 WHERE id = $7 AND tenant_id = $8 RETURNING {COLUMNS}"
            )
        };

        let mut q = sqlx::query_as::<_, Content>(&query)
            .bind(title)
            .bind(metadata)
            .bind(access_type)
            .bind(content_type_id)
            .bind(parent_id)
            .bind(Utc::now())
            .bind(id)
            .bind(tenant_id);

        if let Some(version) = expected_version {
            q = q.bind(version);
        }

        let content = q
            .fetch_optional(pool)
            .await
            .context("failed to update content")?;

        Ok(content)
    }

    /// Delete a content row, its access grants, and re-parent its children.
    ///
    /// Children are kept (with `parent_id` cleared), not cascade-deleted.
    pub async fn delete_and_reparent(pool: &PgPool, id: i64, tenant_id: i64) -> Result<bool> {
        let mut tx = pool.begin().await.context("failed to start transaction")?;

        sqlx::query("DELETE FROM content_access WHERE content_id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(&mut *tx)
            .await
            .context("failed to delete content access grants")?;

        sqlx::query("UPDATE content SET parent_id = NULL WHERE parent_id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(&mut *tx)
            .await
            .context("failed to re-parent children")?;

        let result = sqlx::query("DELETE FROM content WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(&mut *tx)
            .await
            .context("failed to delete content")?;

        tx.commit().await.context("failed to commit transaction")?;

        Ok(result.rows_affected() > 0)
    }

    /// List children of a content item, newest first.
    pub async fn children(pool: &PgPool, parent_id: i64, tenant_id: i64) -> Result<Vec<Self>> {
        let children = sqlx::query_as::<_, Content>(&format!(
            "SELECT {COLUMNS} FROM content WHERE parent_id = $1 AND tenant_id = $2 \
             ORDER BY created_at DESC"
        ))
        .bind(parent_id)
        .bind(tenant_id)
        .fetch_all(pool)
        .await
        .context("failed to list children")?;

        Ok(children)
    }

    /// List children of a content item restricted to one content type,
    /// newest first. Backs the comment and reaction lookups.
    pub async fn children_of_type(
        pool: &PgPool,
        parent_id: i64,
        content_type_id: i64,
        tenant_id: i64,
    ) -> Result<Vec<Self>> {
        let children = sqlx::query_as::<_, Content>(&format!(
            "SELECT {COLUMNS} FROM content \
             WHERE parent_id = $1 AND content_type_id = $2 AND tenant_id = $3 \
             ORDER BY created_at DESC"
        ))
        .bind(parent_id)
        .bind(content_type_id)
        .bind(tenant_id)
        .fetch_all(pool)
        .await
        .context("failed to list children of type")?;

        Ok(children)
    }

    /// Count content rows referencing a content type.
    pub async fn count_by_type(
        pool: &PgPool,
        content_type_id: i64,
        tenant_id: i64,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM content WHERE content_type_id = $1 AND tenant_id = $2",
        )
        .bind(content_type_id)
        .bind(tenant_id)
        .fetch_one(pool)
        .await
        .context("failed to count content by type")?;

        Ok(count)
    }

    /// List content rows matching a filter.
    pub async fn list_filtered(pool: &PgPool, filter: &ContentFilter) -> Result<Vec<Self>> {
        let sql = build_list_query(filter);

        let items = sqlx::query_as::<_, Content>(&sql)
            .fetch_all(pool)
            .await
            .context("failed to list filtered content")?;

        Ok(items)
    }

    /// Count content rows matching a filter (ignoring pagination).
    pub async fn count_filtered(pool: &PgPool, filter: &ContentFilter) -> Result<i64> {
        let sql = build_count_query(filter);

        let count: i64 = sqlx::query_scalar(&sql)
            .fetch_one(pool)
            .await
            .context("failed to count filtered content")?;

        Ok(count)
    }
}

fn content_col(name: &str) -> (Alias, Alias) {
    (Alias::new("content"), Alias::new(name))
}

/// Apply every filter condition (always including the tenant scope) to a
/// SELECT statement. Shared by the list and count queries.
fn apply_filters(query: &mut SelectStatement, filter: &ContentFilter) {
    query.and_where(Expr::col(content_col("tenant_id")).eq(filter.tenant_id));

    if let Some(type_id) = filter.content_type_id {
        query.and_where(Expr::col(content_col("content_type_id")).eq(type_id));
    }

    if let Some(ref type_name) = filter.content_type_name {
        // Tenant-scoped join: the type must belong to the same tenant.
        query.join(
            JoinType::InnerJoin,
            Alias::new("content_type"),
            Cond::all()
                .add(
                    Expr::col(content_col("content_type_id"))
                        .equals((Alias::new("content_type"), Alias::new("id"))),
                )
                .add(
                    Expr::col((Alias::new("content_type"), Alias::new("tenant_id")))
                        .eq(filter.tenant_id),
                ),
        );
        query.and_where(
            Expr::col((Alias::new("content_type"), Alias::new("name"))).eq(type_name.as_str()),
        );
    }

    if let Some(author_id) = filter.author_id {
        query.and_where(Expr::col(content_col("author_id")).eq(author_id));
    }

    match filter.parent {
        ParentFilter::Any => {}
        ParentFilter::Root => {
            query.and_where(Expr::col(content_col("parent_id")).is_null());
        }
        ParentFilter::Of(parent_id) => {
            query.and_where(Expr::col(content_col("parent_id")).eq(parent_id));
        }
    }

    if let Some(access_type) = filter.access_type {
        query.and_where(Expr::col(content_col("access_type")).eq(access_type.as_str()));
    }

    if let Some(ref term) = filter.search_term {
        if !term.is_empty() {
            query.and_where(
                Expr::col(content_col("title"))
                    .ilike(format!("%{}%", escape_like_wildcards(term))),
            );
        }
    }

    if let Some(cursor) = filter.cursor {
        if let Some(after_id) = cursor.after_id {
            query.and_where(Expr::col(content_col("id")).gt(after_id));
        }
        if let Some(after_created_at) = cursor.after_created_at {
            query.and_where(Expr::col(content_col("created_at")).gt(after_created_at));
        }
    }
}

/// Build the SELECT for a filtered listing, with sort and pagination.
pub fn build_list_query(filter: &ContentFilter) -> String {
    let mut query = Query::select();

    for column in [
        "id",
        "uuid",
        "title",
        "metadata",
        "access_type",
        "author_id",
        "content_type_id",
        "parent_id",
        "tenant_id",
        "version",
        "created_at",
        "updated_at",
    ] {
        query.column(content_col(column));
    }

    query.from(Alias::new("content"));

    apply_filters(&mut query, filter);

    for sort in filter.effective_sort() {
        let order = match sort.direction {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        };
        query.order_by(content_col(sort.field.column()), order);
    }

    query.limit(filter.take.max(0) as u64);
    query.offset(filter.skip.max(0) as u64);

    query.to_string(PostgresQueryBuilder)
}

/// Build the COUNT query for the same filter (no sort, no pagination).
pub fn build_count_query(filter: &ContentFilter) -> String {
    let mut query = Query::select();

    query.expr(Expr::col(Asterisk).count());
    query.from(Alias::new("content"));

    apply_filters(&mut query, filter);

    query.to_string(PostgresQueryBuilder)
}

/// Escape SQL LIKE wildcard characters (`%`, `_`, `\`) in a value.
fn escape_like_wildcards(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
