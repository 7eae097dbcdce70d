//! The money journal: an append-only log of every purchase and sale.
//!
//! - **Append-only**: entries are never modified or deleted.
//! - **Positive amounts**: direction comes from the entry type.
//! - **Precision**: all amounts use [`Decimal`] -- no floating point.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use homestead_types::{JournalEntry, JournalEntryId, JournalEntryType};

use crate::LedgerError;
use crate::conservation::{BalanceCheck, verify_balance};

// ---------------------------------------------------------------------------
// Entry builder
// ---------------------------------------------------------------------------

/// Builder for validated [`JournalEntry`] values.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use homestead_ledger::JournalEntryBuilder;
/// use homestead_types::JournalEntryType;
/// use rust_decimal::Decimal;
///
/// let entry = JournalEntryBuilder::new(JournalEntryType::Sale)
///     .amount(Decimal::new(15, 0))
///     .balance_after(Decimal::new(115, 0))
///     .memo("3x Carrot".to_owned())
///     .at(Utc::now())
///     .build();
///
/// assert!(entry.is_ok());
/// ```
#[derive(Debug)]
pub struct JournalEntryBuilder {
    entry_type: JournalEntryType,
    amount: Option<Decimal>,
    balance_after: Option<Decimal>,
    memo: Option<String>,
    recorded_at: Option<DateTime<Utc>>,
}

impl JournalEntryBuilder {
    /// Start building an entry of the given type.
    pub const fn new(entry_type: JournalEntryType) -> Self {
        Self {
            entry_type,
            amount: None,
            balance_after: None,
            memo: None,
            recorded_at: None,
        }
    }

    /// Set the amount moved.
    #[must_use]
    pub const fn amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Set the balance after the movement.
    #[must_use]
    pub const fn balance_after(mut self, balance: Decimal) -> Self {
        self.balance_after = Some(balance);
        self
    }

    /// Set the description.
    #[must_use]
    pub fn memo(mut self, memo: String) -> Self {
        self.memo = Some(memo);
        self
    }

    /// Set the instant of the movement.
    #[must_use]
    pub const fn at(mut self, at: DateTime<Utc>) -> Self {
        self.recorded_at = Some(at);
        self
    }

    /// Validate inputs and produce a [`JournalEntry`].
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ZeroAmount`] if the amount is zero,
    /// [`LedgerError::NegativeAmount`] if it is negative and
    /// [`LedgerError::MissingField`] if a required field is not set.
    pub fn build(self) -> Result<JournalEntry, LedgerError> {
        let amount = self.amount.ok_or(LedgerError::MissingField("amount"))?;
        let balance_after = self
            .balance_after
            .ok_or(LedgerError::MissingField("balance_after"))?;
        let memo = self.memo.ok_or(LedgerError::MissingField("memo"))?;
        let recorded_at = self
            .recorded_at
            .ok_or(LedgerError::MissingField("recorded_at"))?;

        if amount.is_zero() {
            return Err(LedgerError::ZeroAmount);
        }
        if amount.is_sign_negative() {
            return Err(LedgerError::NegativeAmount { amount });
        }

        Ok(JournalEntry {
            id: JournalEntryId::new(),
            entry_type: self.entry_type,
            amount,
            balance_after,
            memo,
            recorded_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Journal
// ---------------------------------------------------------------------------

/// Append-only record of money movements for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Journal {
    /// Balance when the journal was opened.
    opening_balance: Decimal,
    /// All entries, in insertion order.
    entries: Vec<JournalEntry>,
}

impl Journal {
    /// Open a journal at the given balance.
    pub const fn new(opening_balance: Decimal) -> Self {
        Self {
            opening_balance,
            entries: Vec::new(),
        }
    }

    /// Balance when the journal was opened.
    pub const fn opening_balance(&self) -> Decimal {
        self.opening_balance
    }

    /// Return the number of entries.
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return whether the journal has no entries.
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Balance after the latest entry, or the opening balance.
    pub fn last_balance(&self) -> Decimal {
        self.entries
            .last()
            .map_or(self.opening_balance, |e| e.balance_after)
    }

    /// Append a pre-built entry.
    pub fn append(&mut self, entry: JournalEntry) {
        tracing::debug!(
            entry_type = ?entry.entry_type,
            amount = %entry.amount,
            balance_after = %entry.balance_after,
            "journal entry appended"
        );
        self.entries.push(entry);
    }

    /// Build, validate and append an entry.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the entry fails validation.
    pub fn record(
        &mut self,
        entry_type: JournalEntryType,
        amount: Decimal,
        balance_after: Decimal,
        memo: String,
        at: DateTime<Utc>,
    ) -> Result<&JournalEntry, LedgerError> {
        let entry = JournalEntryBuilder::new(entry_type)
            .amount(amount)
            .balance_after(balance_after)
            .memo(memo)
            .at(at)
            .build()?;
        self.append(entry);
        self.entries
            .last()
            .ok_or(LedgerError::MissingField("entry after append"))
    }

    /// Sum of all credits and all debits, in that order.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ArithmeticOverflow`] if a sum overflows.
    pub fn totals(&self) -> Result<(Decimal, Decimal), LedgerError> {
        let mut credits = Decimal::ZERO;
        let mut debits = Decimal::ZERO;
        for entry in &self.entries {
            let side = if entry.entry_type.is_credit() {
                &mut credits
            } else {
                &mut debits
            };
            *side = side
                .checked_add(entry.amount)
                .ok_or(LedgerError::ArithmeticOverflow("journal totals"))?;
        }
        Ok((credits, debits))
    }

    /// Check the journal against the player's current balance.
    pub fn verify(&self, closing_balance: Decimal) -> BalanceCheck {
        verify_balance(self, closing_balance)
    }
}
