//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`], which wraps the underlying
//! [`sqlx`] errors and converts into the store contract's
//! [`StoreError`] at the trait boundary.

use homestead_core::StoreError;
use homestead_types::RecordKind;

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row does not describe a valid record.
    #[error("corrupt {kind:?} row {id}: {reason}")]
    Corrupt {
        /// Table of the row.
        kind: RecordKind,
        /// Key of the row.
        id: i64,
        /// Why the row was rejected.
        reason: String,
    },

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DbError {
    /// A corrupt-row error.
    pub fn corrupt(kind: RecordKind, id: i64, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            kind,
            id,
            reason: reason.into(),
        }
    }
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Corrupt { kind, id, reason } => Self::Corrupt { kind, id, reason },
            other => Self::Backend {
                source: Box::new(other),
            },
        }
    }
}
