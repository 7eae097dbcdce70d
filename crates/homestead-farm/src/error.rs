//! Error types for the homestead-farm crate.
//!
//! Every guard failure is a typed value. No operation mutates state before
//! returning one of these.

use rust_decimal::Decimal;

use homestead_ledger::LedgerError;
use homestead_types::{MachinePhase, PlotPhase, StockKey};

/// Why a lifecycle transition was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionBlocked {
    /// Tilling needs an empty plot.
    #[error("plot {plot_number} cannot be tilled while {phase:?}")]
    PlotNotEmpty {
        /// The plot.
        plot_number: u32,
        /// Its current phase.
        phase: PlotPhase,
    },

    /// Planting needs a tilled plot.
    #[error("plot {plot_number} is not ready for planting ({phase:?})")]
    PlotNotTilled {
        /// The plot.
        plot_number: u32,
        /// Its current phase.
        phase: PlotPhase,
    },

    /// Watering or harvesting an unplanted plot.
    #[error("nothing is planted on plot {plot_number}")]
    NothingPlanted {
        /// The plot.
        plot_number: u32,
    },

    /// Watering a plot twice.
    #[error("plot {plot_number} is already watered")]
    AlreadyWatered {
        /// The plot.
        plot_number: u32,
    },

    /// Harvesting before the crop is fully grown.
    #[error("crop on plot {plot_number} is not ready ({progress} grown)")]
    CropNotReady {
        /// The plot.
        plot_number: u32,
        /// Growth fraction reached so far.
        progress: Decimal,
    },

    /// Starting a machine that already holds a job.
    #[error("{machine} is already processing ({phase:?})")]
    MachineBusy {
        /// Machine name.
        machine: String,
        /// Its current phase.
        phase: MachinePhase,
    },

    /// Collecting from a machine with no finished job.
    #[error("{machine} has nothing to collect ({progress} done)")]
    JobNotReady {
        /// Machine name.
        machine: String,
        /// Processing fraction reached so far.
        progress: Decimal,
    },

    /// Seeds are bought, never sold.
    #[error("seed stock cannot be sold")]
    SeedsNotSellable,

    /// A purchase of zero units.
    #[error("quantity must be at least 1")]
    ZeroQuantity,
}

/// Errors that can occur during farm, machine and shop operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FarmError {
    /// The player cannot pay.
    #[error("insufficient funds: need {required}, have {available}")]
    InsufficientFunds {
        /// Price of the purchase.
        required: Decimal,
        /// Current balance.
        available: Decimal,
    },

    /// The player has no water to spare.
    #[error("insufficient water: need {required}, have {available}")]
    InsufficientWater {
        /// Units needed.
        required: Decimal,
        /// Units held.
        available: Decimal,
    },

    /// The inventory lacks the required stock.
    #[error("insufficient inventory: need {required}x {item}, have {available}")]
    InsufficientInventory {
        /// Display name of the missing seed or item.
        item: String,
        /// Quantity required.
        required: u32,
        /// Quantity held.
        available: u32,
    },

    /// The action is not allowed in the current lifecycle phase.
    #[error("invalid transition: {0}")]
    InvalidTransition(TransitionBlocked),

    /// A one-time purchase was attempted twice.
    #[error("{name} is already owned")]
    AlreadyOwned {
        /// Name of the tool or machine.
        name: String,
    },

    /// A referenced definition or row does not exist.
    #[error("{what} {id} not found")]
    NotFound {
        /// What was looked up, e.g. "seed" or "plot".
        what: &'static str,
        /// The id that was requested.
        id: i64,
    },

    /// A quantity or money computation overflowed.
    #[error("arithmetic overflow: {context}")]
    ArithmeticOverflow {
        /// What was being computed.
        context: &'static str,
    },

    /// The money journal rejected an entry.
    #[error("journal error: {0}")]
    Journal(LedgerError),
}

impl From<TransitionBlocked> for FarmError {
    fn from(blocked: TransitionBlocked) -> Self {
        Self::InvalidTransition(blocked)
    }
}

impl From<LedgerError> for FarmError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientFunds {
                required,
                available,
            } => Self::InsufficientFunds {
                required,
                available,
            },
            LedgerError::InsufficientWater {
                required,
                available,
            } => Self::InsufficientWater {
                required,
                available,
            },
            LedgerError::ArithmeticOverflow(context) => Self::ArithmeticOverflow { context },
            other => Self::Journal(other),
        }
    }
}

/// A failed inventory withdrawal, before the stock has been named.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortfall {
    /// The stock that ran short.
    pub key: StockKey,
    /// Quantity requested.
    pub required: u32,
    /// Quantity held.
    pub available: u32,
}

impl Shortfall {
    /// Attach a display name and turn into a [`FarmError`].
    pub fn named(self, item: impl Into<String>) -> FarmError {
        FarmError::InsufficientInventory {
            item: item.into(),
            required: self.required,
            available: self.available,
        }
    }
}
