//! Content type service.
//!
//! CRUD and tenant-scoped lookup for content type definitions. Owns the
//! process-wide [`ContentTypeCache`]; reads go cache-first and writes
//! invalidate, so a lookup after any mutation re-queries the backend.

use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;

use crate::cache::{CacheStats, ContentTypeCache};
use crate::error::{EngineError, EngineResult};
use crate::models::{Content, ContentType, CreateContentType, UpdateContentType};
use crate::schema::CompiledSchema;

/// Service for content type CRUD with cache-backed lookups.
#[derive(Clone)]
pub struct ContentTypeService {
    inner: Arc<ContentTypeServiceInner>,
}

struct ContentTypeServiceInner {
    pool: PgPool,
    cache: ContentTypeCache,
}

impl ContentTypeService {
    /// Create a new content type service.
    pub fn new(pool: PgPool) -> Self {
        Self {
            inner: Arc::new(ContentTypeServiceInner {
                pool,
                cache: ContentTypeCache::new(),
            }),
        }
    }

    /// Opportunistically warm the cache at startup. Best-effort.
    pub async fn warm_cache(&self) {
        self.inner.cache.warm(&self.inner.pool).await;
    }

    /// Create a content type after compiling its schema and checking name
    /// uniqueness within the tenant.
    ///
    /// The cache is not pre-populated; the first read does that.
    pub async fn create(
        &self,
        input: CreateContentType,
        tenant_id: i64,
    ) -> EngineResult<ContentType> {
        if let Some(schema) = &input.schema {
            CompiledSchema::compile(schema)?;
        }

        if ContentType::find_by_name(&self.inner.pool, &input.name, tenant_id)
            .await?
            .is_some()
        {
            return Err(EngineError::DuplicateName(input.name));
        }

        let content_type = ContentType::insert(&self.inner.pool, &input, tenant_id).await?;

        info!(
            content_type_id = %content_type.id,
            name = %content_type.name,
            tenant_id = %tenant_id,
            "content type created"
        );
        Ok(content_type)
    }

    /// List all content types for a tenant, ordered by name.
    pub async fn find_all(&self, tenant_id: i64) -> EngineResult<Vec<ContentType>> {
        Ok(ContentType::list(&self.inner.pool, tenant_id).await?)
    }

    /// Find a content type by id, cache-first.
    pub async fn find_one(&self, id: i64, tenant_id: i64) -> EngineResult<ContentType> {
        if let Some(cached) = self.inner.cache.get(id, tenant_id) {
            return Ok(cached);
        }

        let content_type = ContentType::find_by_id(&self.inner.pool, id, tenant_id)
            .await?
            .ok_or(EngineError::NotFound)?;

        self.inner.cache.put(content_type.clone());
        Ok(content_type)
    }

    /// Find a content type by name, cache-first.
    pub async fn find_by_name(&self, name: &str, tenant_id: i64) -> EngineResult<ContentType> {
        if let Some(cached) = self.inner.cache.get_by_name(name, tenant_id) {
            return Ok(cached);
        }

        let content_type = ContentType::find_by_name(&self.inner.pool, name, tenant_id)
            .await?
            .ok_or(EngineError::NotFound)?;

        self.inner.cache.put(content_type.clone());
        Ok(content_type)
    }

    /// Update a content type, invalidating its cache entries.
    pub async fn update(
        &self,
        id: i64,
        input: UpdateContentType,
        tenant_id: i64,
    ) -> EngineResult<ContentType> {
        let existing = ContentType::find_by_id(&self.inner.pool, id, tenant_id)
            .await?
            .ok_or(EngineError::NotFound)?;

        if let Some(schema) = &input.schema {
            CompiledSchema::compile(schema)?;
        }

        if let Some(name) = &input.name {
            if name != &existing.name {
                let collision =
                    ContentType::find_by_name(&self.inner.pool, name, tenant_id).await?;
                if collision.is_some_and(|other| other.id != id) {
                    return Err(EngineError::DuplicateName(name.clone()));
                }
            }
        }

        let name = input.name.unwrap_or_else(|| existing.name.clone());
        let access_level = input.access_level.unwrap_or(existing.access_level);
        let schema = input.schema.or_else(|| existing.schema.clone());

        let updated =
            ContentType::update(&self.inner.pool, id, tenant_id, &name, access_level, &schema)
                .await?
                .ok_or(EngineError::NotFound)?;

        self.inner
            .cache
            .invalidate(id, Some((tenant_id, &existing.name)));

        info!(content_type_id = %id, tenant_id = %tenant_id, "content type updated");
        Ok(updated)
    }

    /// Delete a content type, unless content rows still reference it.
    pub async fn remove(&self, id: i64, tenant_id: i64) -> EngineResult<()> {
        let existing = ContentType::find_by_id(&self.inner.pool, id, tenant_id)
            .await?
            .ok_or(EngineError::NotFound)?;

        let count = Content::count_by_type(&self.inner.pool, id, tenant_id).await?;
        if count > 0 {
            return Err(EngineError::InUse { count });
        }

        ContentType::delete(&self.inner.pool, id, tenant_id).await?;

        self.inner
            .cache
            .invalidate(id, Some((tenant_id, &existing.name)));

        info!(content_type_id = %id, tenant_id = %tenant_id, "content type removed");
        Ok(())
    }

    /// Cache statistics for observability.
    pub fn cache_stats(&self) -> CacheStats {
        self.inner.cache.stats()
    }
}
