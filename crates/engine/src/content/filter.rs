//! Content listing filter, sort, and pagination types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{AccessLevel, Content};

/// Default page size when `take` is not supplied.
pub const DEFAULT_TAKE: i64 = 50;

/// Filter on the parent relationship.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentFilter {
    /// No constraint.
    #[default]
    Any,
    /// Root-level content only (`parent_id IS NULL`).
    Root,
    /// Children of a specific content item.
    Of(i64),
}

/// Sortable content columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Id,
    Title,
    CreatedAt,
    UpdatedAt,
    Version,
}

impl SortField {
    /// Column name in the `content` table.
    pub fn column(self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Title => "title",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::Version => "version",
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// One sort instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    /// The default listing order.
    pub fn created_desc() -> Self {
        Self {
            field: SortField::CreatedAt,
            direction: SortDirection::Desc,
        }
    }
}

/// Cursor for keyset pagination: rows strictly after these values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub after_id: Option<i64>,
    pub after_created_at: Option<DateTime<Utc>>,
}

/// Listing filter. Every listing is scoped to `tenant_id`.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentFilter {
    pub tenant_id: i64,

    pub content_type_id: Option<i64>,

    /// Resolved via a tenant-scoped join on `content_type.name`.
    pub content_type_name: Option<String>,

    pub author_id: Option<i64>,

    #[serde(default)]
    pub parent: ParentFilter,

    pub access_type: Option<AccessLevel>,

    /// Case-insensitive substring match on the title.
    pub search_term: Option<String>,

    /// Applied in order; empty means `created_at desc`.
    #[serde(default)]
    pub sort: Vec<SortSpec>,

    #[serde(default)]
    pub skip: i64,

    #[serde(default = "default_take")]
    pub take: i64,

    pub cursor: Option<Cursor>,
}

fn default_take() -> i64 {
    DEFAULT_TAKE
}

impl ContentFilter {
    /// An unconstrained filter for one tenant with default pagination.
    pub fn for_tenant(tenant_id: i64) -> Self {
        Self {
            tenant_id,
            content_type_id: None,
            content_type_name: None,
            author_id: None,
            parent: ParentFilter::Any,
            access_type: None,
            search_term: None,
            sort: Vec::new(),
            skip: 0,
            take: DEFAULT_TAKE,
            cursor: None,
        }
    }

    /// The sort order that will actually be applied.
    pub fn effective_sort(&self) -> Vec<SortSpec> {
        if self.sort.is_empty() {
            vec![SortSpec::created_desc()]
        } else {
            self.sort.clone()
        }
    }
}

/// Pagination metadata returned with every listing.
#[derive(Debug, Clone, Serialize)]
pub struct ListMeta {
    pub total: i64,
    pub skip: i64,
    pub take: i64,
    pub has_more: bool,
    /// Cursor positioned after the last returned row, when more rows exist.
    pub cursor: Option<Cursor>,
    pub sort_applied: Vec<SortSpec>,
}

/// One page of content rows.
#[derive(Debug, Clone, Serialize)]
pub struct ContentPage {
    pub items: Vec<Content>,
    pub meta: ListMeta,
}
