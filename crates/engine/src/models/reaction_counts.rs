//! ReactionCounts read-only projection.
//!
//! Populated by an external aggregation process; this crate only reads it.

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Pre-aggregated reaction counts for one content item.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReactionCounts {
    pub content_id: i64,
    pub tenant_id: i64,
    pub upvote_count: i64,
    pub downvote_count: i64,
    pub emoji_count: i64,
    pub total_count: i64,
    /// Emoji -> count map (JSONB).
    pub emoji_breakdown: serde_json::Value,
}

const COLUMNS: &str = "content_id, tenant_id, upvote_count, downvote_count, emoji_count, \
                       total_count, emoji_breakdown";

impl ReactionCounts {
    /// Fetch counts for one content item; `None` when no projection row
    /// exists yet.
    pub async fn find_for_content(
        pool: &PgPool,
        content_id: i64,
        tenant_id: i64,
    ) -> Result<Option<Self>> {
        let counts = sqlx::query_as::<_, ReactionCounts>(&format!(
            "SELECT {COLUMNS} FROM content_reaction_counts \
             WHERE content_id = $1 AND tenant_id = $2"
        ))
        .bind(content_id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch reaction counts")?;

        Ok(counts)
    }

    /// Fetch counts for many content items at once.
    ///
    /// The map is sparse: items without a projection row are absent.
    pub async fn find_bulk(
        pool: &PgPool,
        content_ids: &[i64],
        tenant_id: i64,
    ) -> Result<HashMap<i64, Self>> {
        if content_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, ReactionCounts>(&format!(
            "SELECT {COLUMNS} FROM content_reaction_counts \
             WHERE content_id = ANY($1) AND tenant_id = $2"
        ))
        .bind(content_ids)
        .bind(tenant_id)
        .fetch_all(pool)
        .await
        .context("failed to fetch bulk reaction counts")?;

        Ok(rows.into_iter().map(|r| (r.content_id, r)).collect())
    }
}
