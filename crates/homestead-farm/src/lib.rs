//! Plots, machines, inventory and shop transactions for the Homestead
//! farming economy.
//!
//! Everything here is synchronous and clock-free: callers pass `now`. Time
//! progression is derived from stored timestamps, so reconciling at any
//! instant gives the same result no matter how many ticks were missed.
//!
//! # Modules
//!
//! - [`catalog`] -- Read-only item, seed, tool and machine definitions.
//! - [`progress`] -- Elapsed-time fraction shared by growth and processing.
//! - [`inventory`] -- Seed and produce stacks, never stored at zero.
//! - [`plot`] -- The plot lifecycle from tilling to harvest.
//! - [`machine`] -- The machine lifecycle from start to collection.
//! - [`economy`] -- Purchases and sales against the wallet.
//! - [`state`] -- [`FarmState`], its reconciliation and its persistence
//!   diff.
//! - [`views`] -- Status text and flags for the presentation layer.
//! - [`report`] -- Reconciliation summaries and self-healing corrections.
//! - [`error`] -- [`FarmError`] and [`TransitionBlocked`].

pub mod catalog;
pub mod economy;
pub mod error;
pub mod inventory;
pub mod machine;
pub mod plot;
pub mod progress;
pub mod report;
pub mod state;
pub mod views;

// Re-export primary types at crate root.
pub use catalog::Catalog;
pub use economy::{PlotPricing, Receipt};
pub use error::{FarmError, Shortfall, TransitionBlocked};
pub use inventory::Inventory;
pub use report::{Correction, CorrectionKind, CorrectionTarget, ReconcileReport};
pub use state::FarmState;
pub use views::{
    FarmView, InventoryLine, MachineView, OfferCategory, PlotView, ShopOffer, WaterView,
};
