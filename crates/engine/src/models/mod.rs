//! Entity models and their tenant-scoped CRUD operations.

mod content;
mod content_access;
mod content_type;
mod reaction_counts;

pub use content::{
    Content, CreateContent, UpdateContent, build_count_query, build_list_query,
};
pub use content_access::ContentAccess;
pub use content_type::{
    AccessLevel, ContentType, CreateContentType, ParseAccessLevelError, UpdateContentType,
};
pub use reaction_counts::ReactionCounts;
