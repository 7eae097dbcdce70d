//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup and the reconcile loop.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: homestead_core::ConfigError,
    },

    /// Opening the farm or a command failed.
    #[error("session error: {source}")]
    Session {
        /// The underlying session error.
        #[from]
        source: homestead_core::SessionError,
    },

    /// Connecting to or migrating the database failed.
    #[error("database error: {source}")]
    Database {
        /// The underlying database error.
        #[from]
        source: homestead_db::DbError,
    },

    /// The reconcile task could not be joined.
    #[error("reconciler task failed: {message}")]
    Reconciler {
        /// Description of the failure.
        message: String,
    },
}
