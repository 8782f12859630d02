//! Service error taxonomy.

use souhaits_db::DbError;

/// Errors surfaced to the presentation layer.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Malformed input: bad email, score out of range, unknown theme.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Unknown wishlist, item, user, challenge or session.
    #[error("not found: {0}")]
    NotFound(String),

    /// A uniqueness rule that is not retried, e.g. a duplicate co-editor.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Key space exhausted after bounded retries.
    #[error("store exhausted: {0}")]
    Exhausted(String),

    /// The caller may not perform this mutation.
    #[error("permission denied: {0}")]
    Permission(String),

    /// Any other store failure. The transaction was rolled back.
    #[error("store failure: {0}")]
    Store(DbError),
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(what) => Self::NotFound(what),
            DbError::Constraint(what) => Self::Conflict(what),
            DbError::Exhausted(what) => Self::Exhausted(what),
            other => Self::Store(other),
        }
    }
}

impl From<souhaits_db::rusqlite::Error> for ServiceError {
    fn from(err: souhaits_db::rusqlite::Error) -> Self {
        Self::Store(DbError::Sqlite(err))
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
