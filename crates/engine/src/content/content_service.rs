//! Content service.
//!
//! CRUD, filtering, and relationship management for generic content rows.
//! Every operation takes an explicit tenant id and every query it issues is
//! tenant-scoped. Metadata is validated against the content type's schema,
//! and updates go through a version-conditioned write (see
//! [`Content::update_versioned`]).

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use sqlx::PgPool;
use tracing::info;

use crate::content::filter::{ContentFilter, ContentPage, Cursor, ListMeta};
use crate::content::type_service::ContentTypeService;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AccessLevel, Content, ContentAccess, ContentType, CreateContent, ReactionCounts,
    UpdateContent,
};
use crate::schema::CompiledSchema;

/// Well-known content type name for comments.
const COMMENT_TYPE_NAME: &str = "comment";

/// Well-known content type name for reactions.
const REACTION_TYPE_NAME: &str = "reaction";

/// Service for content CRUD with tenant isolation and optimistic concurrency.
#[derive(Clone)]
pub struct ContentService {
    inner: Arc<ContentServiceInner>,
}

struct ContentServiceInner {
    pool: PgPool,
    types: ContentTypeService,
}

/// A content row with everything a detail view needs.
#[derive(Debug, Clone, Serialize)]
pub struct ContentDetail {
    pub content: Content,
    pub content_type: ContentType,
    pub parent: Option<Content>,
    pub children: Vec<Content>,
    pub access: Vec<ContentAccess>,
    pub reaction_counts: Option<ReactionCounts>,
}

/// Reaction children of a content item plus its counts projection.
#[derive(Debug, Clone, Serialize)]
pub struct ContentReactions {
    pub items: Vec<Content>,
    pub counts: Option<ReactionCounts>,
}

impl ContentService {
    /// Create a new content service.
    pub fn new(pool: PgPool, types: ContentTypeService) -> Self {
        Self {
            inner: Arc::new(ContentServiceInner { pool, types }),
        }
    }

    /// Create a content row after type, parent, and schema checks.
    pub async fn create(&self, input: CreateContent, tenant_id: i64) -> EngineResult<Content> {
        let content_type = match self
            .inner
            .types
            .find_one(input.content_type_id, tenant_id)
            .await
        {
            Ok(ct) => ct,
            Err(EngineError::NotFound) => {
                return Err(EngineError::InvalidContentType(input.content_type_id));
            }
            Err(e) => return Err(e),
        };

        if let Some(parent_id) = input.parent_id {
            if Content::find_by_id(&self.inner.pool, parent_id, tenant_id)
                .await?
                .is_none()
            {
                return Err(EngineError::InvalidParent(format!(
                    "parent content {parent_id} does not exist"
                )));
            }
        }

        if let Some(schema_doc) = &content_type.schema {
            let compiled = CompiledSchema::compile(schema_doc)?;
            compiled
                .validate(&input.metadata)
                .map_err(EngineError::SchemaViolation)?;
        }

        let access_type = input.access_type.unwrap_or(content_type.access_level);
        let content = Content::insert(&self.inner.pool, &input, access_type, tenant_id).await?;

        info!(
            content_id = %content.id,
            content_type_id = %content.content_type_id,
            tenant_id = %tenant_id,
            "content created"
        );
        Ok(content)
    }

    /// List content matching a filter, with pagination metadata.
    pub async fn find_all(&self, filter: &ContentFilter) -> EngineResult<ContentPage> {
        let items = Content::list_filtered(&self.inner.pool, filter).await?;
        let total = Content::count_filtered(&self.inner.pool, filter).await?;

        let has_more = filter.skip.max(0) + (items.len() as i64) < total;
        let cursor = if has_more {
            items.last().map(|last| Cursor {
                after_id: Some(last.id),
                after_created_at: Some(last.created_at),
            })
        } else {
            None
        };

        Ok(ContentPage {
            meta: ListMeta {
                total,
                skip: filter.skip,
                take: filter.take,
                has_more,
                cursor,
                sort_applied: filter.effective_sort(),
            },
            items,
        })
    }

    /// Load a content row with its type, parent, children, grants, and
    /// reaction counts.
    pub async fn find_one(&self, id: i64, tenant_id: i64) -> EngineResult<ContentDetail> {
        let content = Content::find_by_id(&self.inner.pool, id, tenant_id)
            .await?
            .ok_or(EngineError::NotFound)?;

        let content_type = self
            .inner
            .types
            .find_one(content.content_type_id, tenant_id)
            .await?;

        let parent = match content.parent_id {
            Some(parent_id) => Content::find_by_id(&self.inner.pool, parent_id, tenant_id).await?,
            None => None,
        };

        let children = Content::children(&self.inner.pool, id, tenant_id).await?;
        let access = ContentAccess::list_for_content(&self.inner.pool, id, tenant_id).await?;
        let reaction_counts =
            ReactionCounts::find_for_content(&self.inner.pool, id, tenant_id).await?;

        Ok(ContentDetail {
            content,
            content_type,
            parent,
            children,
            access,
            reaction_counts,
        })
    }

    /// Update a content row with optimistic concurrency.
    ///
    /// A stale `expected_version` is rejected before the write; the write
    /// itself is version-conditioned, so a version that moves in between is
    /// still caught and surfaced as a conflict.
    pub async fn update(
        &self,
        id: i64,
        input: UpdateContent,
        tenant_id: i64,
    ) -> EngineResult<Content> {
        let existing = Content::find_by_id(&self.inner.pool, id, tenant_id)
            .await?
            .ok_or(EngineError::NotFound)?;

        if let Some(attempted) = input.expected_version {
            if attempted != existing.version {
                return Err(EngineError::VersionConflict {
                    content_id: id,
                    current_version: existing.version,
                    attempted_version: attempted,
                });
            }
        }

        let target_type_id = input.content_type_id.unwrap_or(existing.content_type_id);
        let type_changed = target_type_id != existing.content_type_id;

        // The governing type is needed whenever the metadata will be
        // re-validated: on a metadata change, or when the row moves to a
        // different type whose schema the old metadata must still satisfy.
        let content_type = if type_changed || input.metadata.is_some() {
            match self.inner.types.find_one(target_type_id, tenant_id).await {
                Ok(ct) => Some(ct),
                Err(EngineError::NotFound) => {
                    return Err(EngineError::InvalidContentType(target_type_id));
                }
                Err(e) => return Err(e),
            }
        } else {
            None
        };

        let parent_id = match input.parent_id {
            None => existing.parent_id,
            Some(None) => None,
            Some(Some(new_parent)) => {
                if new_parent == id {
                    return Err(EngineError::InvalidParent(
                        "content cannot be its own parent".to_string(),
                    ));
                }
                if Content::find_by_id(&self.inner.pool, new_parent, tenant_id)
                    .await?
                    .is_none()
                {
                    return Err(EngineError::InvalidParent(format!(
                        "parent content {new_parent} does not exist"
                    )));
                }
                Some(new_parent)
            }
        };

        let metadata = input.metadata.unwrap_or_else(|| existing.metadata.clone());

        if let Some(ct) = &content_type {
            if let Some(schema_doc) = &ct.schema {
                let compiled = CompiledSchema::compile(schema_doc)?;
                compiled
                    .validate(&metadata)
                    .map_err(EngineError::SchemaViolation)?;
            }
        }

        let title = input.title.or_else(|| existing.title.clone());
        let access_type = input.access_type.unwrap_or(existing.access_type);

        let updated = Content::update_versioned(
            &self.inner.pool,
            id,
            tenant_id,
            &title,
            &metadata,
            access_type,
            target_type_id,
            parent_id,
            input.expected_version,
        )
        .await?;

        match updated {
            Some(content) => {
                info!(
                    content_id = %id,
                    version = %content.version,
                    tenant_id = %tenant_id,
                    "content updated"
                );
                Ok(content)
            }
            None => {
                // Zero rows matched: either the version moved between the
                // precheck and the write, or the row vanished.
                if let Some(attempted) = input.expected_version {
                    if let Some(current) =
                        Content::find_by_id(&self.inner.pool, id, tenant_id).await?
                    {
                        return Err(EngineError::VersionConflict {
                            content_id: id,
                            current_version: current.version,
                            attempted_version: attempted,
                        });
                    }
                }
                Err(EngineError::NotFound)
            }
        }
    }

    /// Delete a content row. Grants are removed and children re-parented to
    /// root rather than cascade-deleted.
    pub async fn remove(&self, id: i64, tenant_id: i64) -> EngineResult<()> {
        Content::find_by_id(&self.inner.pool, id, tenant_id)
            .await?
            .ok_or(EngineError::NotFound)?;

        let deleted = Content::delete_and_reparent(&self.inner.pool, id, tenant_id).await?;
        if !deleted {
            return Err(EngineError::NotFound);
        }

        info!(content_id = %id, tenant_id = %tenant_id, "content removed");
        Ok(())
    }

    /// List comment children of a content item, newest first.
    pub async fn find_comments(
        &self,
        content_id: i64,
        tenant_id: i64,
    ) -> EngineResult<Vec<Content>> {
        self.children_of_well_known(content_id, COMMENT_TYPE_NAME, tenant_id)
            .await
    }

    /// List reaction children of a content item, newest first, with the
    /// pre-computed counts projection attached.
    pub async fn find_reactions(
        &self,
        content_id: i64,
        tenant_id: i64,
    ) -> EngineResult<ContentReactions> {
        let items = self
            .children_of_well_known(content_id, REACTION_TYPE_NAME, tenant_id)
            .await?;
        let counts =
            ReactionCounts::find_for_content(&self.inner.pool, content_id, tenant_id).await?;

        Ok(ContentReactions { items, counts })
    }

    /// Children of the tenant's well-known type with the given name. A
    /// tenant that has not defined the type simply has no such children.
    async fn children_of_well_known(
        &self,
        content_id: i64,
        type_name: &str,
        tenant_id: i64,
    ) -> EngineResult<Vec<Content>> {
        self.require_content(content_id, tenant_id).await?;

        let child_type = match self.inner.types.find_by_name(type_name, tenant_id).await {
            Ok(ct) => ct,
            Err(EngineError::NotFound) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        Ok(
            Content::children_of_type(&self.inner.pool, content_id, child_type.id, tenant_id)
                .await?,
        )
    }

    /// List access grants for a content item.
    pub async fn get_content_access(
        &self,
        content_id: i64,
        tenant_id: i64,
    ) -> EngineResult<Vec<ContentAccess>> {
        self.require_content(content_id, tenant_id).await?;
        Ok(ContentAccess::list_for_content(&self.inner.pool, content_id, tenant_id).await?)
    }

    /// Grant a user access to a content item.
    ///
    /// Takes the parsed [`AccessLevel`], so unknown access strings are
    /// rejected at the boundary before any row is written.
    pub async fn grant_access(
        &self,
        content_id: i64,
        user_id: i64,
        access_type: AccessLevel,
        tenant_id: i64,
    ) -> EngineResult<ContentAccess> {
        self.require_content(content_id, tenant_id).await?;

        let grant = ContentAccess::insert(
            &self.inner.pool,
            content_id,
            user_id,
            access_type,
            tenant_id,
        )
        .await?;

        info!(
            content_id = %content_id,
            user_id = %user_id,
            access_type = %access_type,
            "content access granted"
        );
        Ok(grant)
    }

    /// Revoke matching grants. Returns the number of rows removed.
    pub async fn revoke_access(
        &self,
        content_id: i64,
        user_id: i64,
        access_type: AccessLevel,
        tenant_id: i64,
    ) -> EngineResult<u64> {
        self.require_content(content_id, tenant_id).await?;

        let removed = ContentAccess::delete(
            &self.inner.pool,
            content_id,
            user_id,
            access_type,
            tenant_id,
        )
        .await?;

        info!(
            content_id = %content_id,
            user_id = %user_id,
            removed = %removed,
            "content access revoked"
        );
        Ok(removed)
    }

    /// Reaction counts for one content item; `None` when no projection row
    /// exists. Pure read-through.
    pub async fn get_reaction_counts(
        &self,
        content_id: i64,
        tenant_id: i64,
    ) -> EngineResult<Option<ReactionCounts>> {
        Ok(ReactionCounts::find_for_content(&self.inner.pool, content_id, tenant_id).await?)
    }

    /// Reaction counts for many content items; the map is sparse.
    pub async fn get_bulk_reaction_counts(
        &self,
        content_ids: &[i64],
        tenant_id: i64,
    ) -> EngineResult<HashMap<i64, ReactionCounts>> {
        Ok(ReactionCounts::find_bulk(&self.inner.pool, content_ids, tenant_id).await?)
    }

    async fn require_content(&self, content_id: i64, tenant_id: i64) -> EngineResult<()> {
        Content::find_by_id(&self.inner.pool, content_id, tenant_id)
            .await?
            .ok_or(EngineError::NotFound)?;
        Ok(())
    }
}
