//! Engine error types.

use thiserror::Error;

use crate::schema::Violation;

/// Caller-visible engine errors.
///
/// The HTTP layer maps these to status codes. Absent entities and entities
/// belonging to a different tenant both surface as [`EngineError::NotFound`]
/// so cross-tenant existence never leaks.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("not found")]
    NotFound,

    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("metadata failed schema validation with {} violation(s)", .0.len())]
    SchemaViolation(Vec<Violation>),

    #[error("content type name '{0}' already exists for this tenant")]
    DuplicateName(String),

    #[error("content type is referenced by {count} content item(s)")]
    InUse { count: i64 },

    #[error("content type {0} does not exist for this tenant")]
    InvalidContentType(i64),

    #[error("invalid parent: {0}")]
    InvalidParent(String),

    #[error(
        "version conflict on content {content_id}: current version is \
         {current_version}, attempted {attempted_version}"
    )]
    VersionConflict {
        content_id: i64,
        current_version: i32,
        attempted_version: i32,
    },

    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

/// Result type alias using EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
