//! Balance verification for the money journal.
//!
//! Money enters the economy only through sales and leaves only through
//! purchases. For a journal opened at balance `O`, the check is:
//!
//! ```text
//! O + sum(credits) - sum(debits) == closing balance
//! ```
//!
//! Every entry also carries the balance after it, so the running chain is
//! checked entry by entry. Rounding to cents happens before an entry is
//! recorded, so the chain is exact.

use rust_decimal::Decimal;

use crate::BalanceAnomaly;
use crate::journal::Journal;

/// The result of a balance check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceCheck {
    /// The journal explains the balance.
    Balanced,
    /// The journal and the balance disagree.
    Anomaly(BalanceAnomaly),
}

impl BalanceCheck {
    /// Whether the check passed.
    pub const fn is_balanced(&self) -> bool {
        matches!(self, Self::Balanced)
    }
}

/// Verify that the journal explains `closing_balance`.
pub fn verify_balance(journal: &Journal, closing_balance: Decimal) -> BalanceCheck {
    let mut running = journal.opening_balance();

    for (index, entry) in journal.entries().iter().enumerate() {
        let next = if entry.entry_type.is_credit() {
            running.checked_add(entry.amount)
        } else {
            running.checked_sub(entry.amount)
        };
        let Some(next) = next else {
            return overflow_anomaly(running);
        };
        if next != entry.balance_after {
            return BalanceCheck::Anomaly(BalanceAnomaly {
                expected: next,
                actual: entry.balance_after,
                message: format!(
                    "journal entry {index} ({:?}) records balance {} but the chain gives {next}",
                    entry.entry_type, entry.balance_after
                ),
            });
        }
        running = next;
    }

    if running == closing_balance {
        BalanceCheck::Balanced
    } else {
        tracing::warn!(
            expected = %running,
            actual = %closing_balance,
            "money balance does not match journal"
        );
        BalanceCheck::Anomaly(BalanceAnomaly {
            expected: running,
            actual: closing_balance,
            message: format!(
                "journal closes at {running} but the player holds {closing_balance}"
            ),
        })
    }
}

fn overflow_anomaly(running: Decimal) -> BalanceCheck {
    BalanceCheck::Anomaly(BalanceAnomaly {
        expected: running,
        actual: running,
        message: "arithmetic overflow while replaying the journal".to_owned(),
    })
}
