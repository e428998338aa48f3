//! Content management module.
//!
//! This module provides:
//! - ContentTypeService: content type CRUD with a cache-backed lookup path
//! - ContentService: content CRUD with tenant isolation, schema validation,
//!   and optimistic concurrency
//! - filter: listing filter, sort, and pagination types

pub mod filter;
mod content_service;
mod type_service;

pub use content_service::{ContentDetail, ContentReactions, ContentService};
pub use filter::{
    ContentFilter, ContentPage, Cursor, ListMeta, ParentFilter, SortDirection, SortField,
    SortSpec,
};
pub use type_service::ContentTypeService;
