//! Clock, configuration, persistence contract and session orchestration
//! for the Homestead farming economy.
//!
//! A [`Homestead`] session owns one player's farm. Commands and
//! reconciliation run one at a time under its lock, each as a draft that
//! is diffed, written to the [`Store`] in one atomic batch and only then
//! made live.
//!
//! # Modules
//!
//! - [`clock`] -- [`Clock`] trait, [`SystemClock`] and the test-driven
//!   [`ManualClock`].
//! - [`config`] -- Configuration loading from `homestead-config.yaml` into
//!   strongly-typed structs.
//! - [`store`] -- The [`Store`] persistence contract and [`MemoryStore`].
//! - [`seed`] -- Default catalog and the starting farm.
//! - [`session`] -- The [`Homestead`] session and its commands.
//! - [`runner`] -- Periodic reconciliation until shutdown.
//!
//! [`Clock`]: clock::Clock
//! [`SystemClock`]: clock::SystemClock
//! [`ManualClock`]: clock::ManualClock
//! [`Store`]: store::Store
//! [`MemoryStore`]: store::MemoryStore
//! [`Homestead`]: session::Homestead

pub mod clock;
pub mod config;
pub mod runner;
pub mod seed;
pub mod session;
pub mod store;

// Re-export primary types at crate root.
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, HomesteadConfig};
pub use runner::{RunSummary, run_reconciler};
pub use session::{Homestead, SessionError};
pub use store::{MemoryStore, Store, StoreError};
