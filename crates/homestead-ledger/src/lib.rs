//! Money, water and the money journal for the Homestead farming economy.
//!
//! The player's two consumable resources live on
//! [`PlayerState`](homestead_types::PlayerState): money and water. This
//! crate owns every rule that mutates them.
//!
//! # Architecture
//!
//! - [`wallet`] -- Debit and credit of money, rounded to two decimal places.
//! - [`water`] -- Time-based water refill, consumption and watering-can
//!   equipment.
//! - [`journal`] -- The [`Journal`]: an append-only log of money movements,
//!   and the [`JournalEntryBuilder`] for validated entry construction.
//! - [`conservation`] -- Balance verification over the journal.
//!
//! # Balance Law
//!
//! For any session with opening balance `O` and closing balance `C`:
//!
//! ```text
//! O + sum(credits) - sum(debits) == C
//! ```
//!
//! A violation produces a [`BalanceAnomaly`]. The ledger never panics; it
//! returns errors.
//!
//! # Usage
//!
//! ```
//! use chrono::Utc;
//! use homestead_ledger::{wallet, Journal, conservation::{verify_balance, BalanceCheck}};
//! use homestead_types::{JournalEntryType, PlayerState};
//! use rust_decimal::Decimal;
//!
//! let now = Utc::now();
//! let mut player = PlayerState::new(Decimal::new(100, 0), now);
//! let mut journal = Journal::new(player.money);
//!
//! let cost = Decimal::new(6, 0);
//! let balance = wallet::spend(&mut player, cost).ok();
//! assert_eq!(balance, Some(Decimal::new(94, 0)));
//! journal
//!     .record(JournalEntryType::SeedPurchase, cost, player.money, "3x Carrot Seeds".to_owned(), now)
//!     .ok();
//!
//! assert_eq!(verify_balance(&journal, player.money), BalanceCheck::Balanced);
//! ```

pub mod conservation;
pub mod journal;
pub mod wallet;
pub mod water;

// Re-export primary types at crate root.
pub use conservation::BalanceCheck;
pub use journal::{Journal, JournalEntryBuilder};

use rust_decimal::Decimal;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised by money and water operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The player cannot pay the requested amount.
    #[error("insufficient funds: need {required}, have {available}")]
    InsufficientFunds {
        /// Amount requested.
        required: Decimal,
        /// Current balance.
        available: Decimal,
    },

    /// The player does not hold enough water.
    #[error("insufficient water: need {required}, have {available}")]
    InsufficientWater {
        /// Units requested.
        required: Decimal,
        /// Units held.
        available: Decimal,
    },

    /// Amounts must not be negative.
    #[error("amount must not be negative, got {amount}")]
    NegativeAmount {
        /// The invalid amount.
        amount: Decimal,
    },

    /// Journal entries must move a non-zero amount.
    #[error("journal entry amount must be non-zero")]
    ZeroAmount,

    /// A required field was not set on the builder.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A decimal computation overflowed.
    #[error("arithmetic overflow in {0}")]
    ArithmeticOverflow(&'static str),
}

// ---------------------------------------------------------------------------
// Anomaly type
// ---------------------------------------------------------------------------

/// A mismatch between the journal and the player's balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceAnomaly {
    /// Balance the journal says the player should have.
    pub expected: Decimal,
    /// Balance the player actually has.
    pub actual: Decimal,
    /// Human-readable description of the anomaly.
    pub message: String,
}

impl core::fmt::Display for BalanceAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}
