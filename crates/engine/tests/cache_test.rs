#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Integration tests for the content type cache.

use std::time::Duration;

use chrono::Utc;
use tenuta_engine::cache::ContentTypeCache;
use tenuta_engine::models::{AccessLevel, ContentType};
use uuid::Uuid;

fn content_type(id: i64, name: &str, tenant_id: i64) -> ContentType {
    ContentType {
        id,
        uuid: Uuid::now_v7(),
        name: name.to_string(),
        access_level: AccessLevel::Public,
        schema: None,
        tenant_id,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

// ============================================================================
// Lookup and tenant isolation
// ============================================================================

#[test]
fn get_by_id_and_name_after_put() {
    let cache = ContentTypeCache::new();
    cache.put(content_type(1, "post", 10));

    assert_eq!(cache.get(1, 10).unwrap().name, "post");
    assert_eq!(cache.get_by_name("post", 10).unwrap().id, 1);
}

#[test]
fn cross_tenant_lookup_never_leaks() {
    let cache = ContentTypeCache::new();
    cache.put(content_type(1, "post", 10));

    // The entry exists in the process-wide cache, but tenant 99 must not
    // see it under either key.
    assert!(cache.get(1, 99).is_none());
    assert!(cache.get_by_name("post", 99).is_none());
}

#[test]
fn name_collisions_across_tenants_resolve_per_tenant() {
    let cache = ContentTypeCache::new();
    cache.put(content_type(1, "comment", 10));
    cache.put(content_type(2, "comment", 20));

    assert_eq!(cache.get_by_name("comment", 10).unwrap().id, 1);
    assert_eq!(cache.get_by_name("comment", 20).unwrap().id, 2);
    // Neither tenant's entry evicted the other's.
    assert_eq!(cache.stats().size, 2);
}

// ============================================================================
// TTL
// ============================================================================

#[test]
fn entries_expire_after_ttl() {
    let cache = ContentTypeCache::with_ttl(Duration::ZERO);
    cache.put(content_type(1, "post", 10));

    assert!(cache.get(1, 10).is_none());
    assert!(cache.get_by_name("post", 10).is_none());
}

#[test]
fn entries_survive_within_ttl() {
    let cache = ContentTypeCache::with_ttl(Duration::from_secs(300));
    cache.put(content_type(1, "post", 10));

    assert!(cache.get(1, 10).is_some());
}

// ============================================================================
// Invalidation
// ============================================================================

#[test]
fn invalidate_clears_both_keys() {
    let cache = ContentTypeCache::new();
    cache.put(content_type(1, "post", 10));

    cache.invalidate(1, Some((10, "post")));

    assert!(cache.get(1, 10).is_none());
    assert!(cache.get_by_name("post", 10).is_none());
}

#[test]
fn invalidate_by_id_alone_scans_the_name_map() {
    let cache = ContentTypeCache::new();
    cache.put(content_type(1, "post", 10));
    cache.put(content_type(2, "page", 10));
    cache.put(content_type(3, "comment", 20));

    cache.invalidate(2, None);

    assert!(cache.get_by_name("page", 10).is_none());
    assert!(cache.get_by_name("post", 10).is_some());
    assert!(cache.get_by_name("comment", 20).is_some());
}

// ============================================================================
// Statistics
// ============================================================================

#[test]
fn stats_track_hits_and_misses_monotonically() {
    let cache = ContentTypeCache::new();

    let empty = cache.stats();
    assert_eq!(empty.total, 0);
    assert_eq!(empty.hit_rate, 0.0);

    cache.put(content_type(1, "post", 10));
    cache.get(1, 10); // hit
    cache.get(1, 10); // hit
    cache.get(2, 10); // miss
    cache.get(1, 99); // tenant mismatch counts as miss

    let stats = cache.stats();
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 2);
    assert_eq!(stats.total, 4);
    assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);
    assert_eq!(stats.size, 1);
}
