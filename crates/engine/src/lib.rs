//! Tenuta Content Engine
//!
//! Multi-tenant content storage core: content types are runtime-defined
//! schema documents, content rows are validated against them on write, and
//! all reads and writes are scoped to a caller-supplied tenant id. Content
//! updates use optimistic concurrency (a version-conditioned write), and
//! content type lookups go through an in-process TTL cache.
//!
//! The HTTP layer that extracts the tenant id from the session and maps
//! [`error::EngineError`] to status codes lives outside this crate.

pub mod cache;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod models;
pub mod schema;
