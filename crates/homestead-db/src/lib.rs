//! `PostgreSQL` persistence for the Homestead farming economy.
//!
//! Implements the [`Store`](homestead_core::Store) contract with one typed
//! table per record kind. Batches are written in a single transaction.
//!
//! # Modules
//!
//! - [`postgres`] -- `PostgreSQL` connection pool and configuration
//! - [`pg_store`] -- [`PgStore`], the store implementation
//! - [`rows`] -- Table row types and their conversion into records
//! - [`error`] -- Shared error types

pub mod error;
pub mod pg_store;
pub mod postgres;
pub mod rows;

// Re-export primary types for convenience.
pub use error::DbError;
pub use pg_store::PgStore;
pub use postgres::{PostgresConfig, PostgresPool};
