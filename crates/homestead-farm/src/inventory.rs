//! Seed and produce stock held by the player.
//!
//! At most one row exists per [`StockKey`]. Quantities are positive: a row
//! that reaches zero is removed, and the next persistence diff deletes it.
//! All arithmetic is checked.

use std::collections::BTreeMap;

use homestead_types::{InventoryItem, StockKey};

use crate::error::{FarmError, Shortfall};

/// The player's inventory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    rows: BTreeMap<StockKey, InventoryItem>,
}

impl Inventory {
    /// Create an empty inventory.
    pub const fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }

    /// Build an inventory from stored rows.
    ///
    /// Rows at zero are dropped. Duplicate keys are merged into the first
    /// row seen.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = InventoryItem>,
    {
        let mut inventory = Self::new();
        for row in rows {
            if row.quantity == 0 {
                continue;
            }
            match inventory.rows.get_mut(&row.key) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(row.quantity);
                }
                None => {
                    inventory.rows.insert(row.key, row);
                }
            }
        }
        inventory
    }

    /// Quantity held of `key`, 0 if absent.
    pub fn quantity(&self, key: StockKey) -> u32 {
        self.rows.get(&key).map_or(0, |row| row.quantity)
    }

    /// Whether at least `quantity` of `key` is held.
    pub fn has(&self, key: StockKey, quantity: u32) -> bool {
        self.quantity(key) >= quantity
    }

    /// The row for `key`, if any.
    pub fn row(&self, key: StockKey) -> Option<&InventoryItem> {
        self.rows.get(&key)
    }

    /// Mutable access to the row for `key`.
    pub(crate) fn row_mut(&mut self, key: StockKey) -> Option<&mut InventoryItem> {
        self.rows.get_mut(&key)
    }

    /// All rows, ordered by key (seeds first).
    pub fn rows(&self) -> impl Iterator<Item = &InventoryItem> {
        self.rows.values()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the inventory holds nothing.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Add `quantity` of `key`, merging into an existing row or creating
    /// one. Returns the new quantity.
    pub fn add(&mut self, key: StockKey, quantity: u32) -> Result<u32, FarmError> {
        if quantity == 0 {
            return Ok(self.quantity(key));
        }
        match self.rows.get_mut(&key) {
            Some(row) => {
                row.quantity =
                    row.quantity
                        .checked_add(quantity)
                        .ok_or(FarmError::ArithmeticOverflow {
                            context: "inventory add",
                        })?;
                Ok(row.quantity)
            }
            None => {
                self.rows.insert(key, InventoryItem::new(key, quantity));
                Ok(quantity)
            }
        }
    }

    /// Remove `quantity` of `key`. Returns the remaining quantity.
    ///
    /// Fails without mutation when the row is missing or too small. A row
    /// that reaches zero is removed.
    pub fn try_consume(&mut self, key: StockKey, quantity: u32) -> Result<u32, Shortfall> {
        let available = self.quantity(key);
        let Some(remaining) = available.checked_sub(quantity) else {
            return Err(Shortfall {
                key,
                required: quantity,
                available,
            });
        };
        if remaining == 0 {
            self.rows.remove(&key);
        } else if let Some(row) = self.rows.get_mut(&key) {
            row.quantity = remaining;
        }
        Ok(remaining)
    }

    /// Remove and return every produce row, leaving seeds in place.
    pub fn drain_produce(&mut self) -> Vec<InventoryItem> {
        let keys: Vec<StockKey> = self
            .rows
            .keys()
            .copied()
            .filter(|key| !key.is_seed())
            .collect();
        keys.into_iter()
            .filter_map(|key| self.rows.remove(&key))
            .collect()
    }

    /// Put a previously drained row back.
    pub(crate) fn restore(&mut self, row: InventoryItem) {
        self.rows.insert(row.key, row);
    }
}

#[cfg(test)]
mod tests {
    use homestead_types::{InventoryRowId, ItemId, SeedId};

    use super::*;

    const WHEAT: StockKey = StockKey::Produce(ItemId(3));
    const WHEAT_SEEDS: StockKey = StockKey::Seed(SeedId(103));

    #[test]
    fn add_creates_then_merges() {
        let mut inv = Inventory::new();
        assert_eq!(inv.add(WHEAT, 2), Ok(2));
        assert_eq!(inv.add(WHEAT, 3), Ok(5));
        assert_eq!(inv.quantity(WHEAT), 5);
        assert_eq!(inv.len(), 1);
    }

    #[test]
    fn seed_and_produce_rows_are_separate() {
        let mut inv = Inventory::new();
        let _ = inv.add(StockKey::Seed(SeedId::new(3)), 1);
        let _ = inv.add(WHEAT, 4);
        assert_eq!(inv.quantity(StockKey::Seed(SeedId::new(3))), 1);
        assert_eq!(inv.quantity(WHEAT), 4);
    }

    #[test]
    fn consume_removes_row_at_zero() {
        let mut inv = Inventory::new();
        let _ = inv.add(WHEAT_SEEDS, 2);
        assert_eq!(inv.try_consume(WHEAT_SEEDS, 1), Ok(1));
        assert_eq!(inv.try_consume(WHEAT_SEEDS, 1), Ok(0));
        assert!(inv.row(WHEAT_SEEDS).is_none());
        assert!(inv.is_empty());
    }

    #[test]
    fn consume_more_than_held_fails_without_mutation() {
        let mut inv = Inventory::new();
        let _ = inv.add(WHEAT, 1);
        let err = inv.try_consume(WHEAT, 2);
        assert_eq!(
            err,
            Err(Shortfall {
                key: WHEAT,
                required: 2,
                available: 1
            })
        );
        assert_eq!(inv.quantity(WHEAT), 1);
    }

    #[test]
    fn consume_missing_row_fails() {
        let mut inv = Inventory::new();
        assert!(inv.try_consume(WHEAT, 1).is_err());
        assert_eq!(inv.quantity(WHEAT), 0);
    }

    #[test]
    fn add_overflow_is_reported() {
        let mut inv = Inventory::new();
        let _ = inv.add(WHEAT, u32::MAX);
        assert!(matches!(
            inv.add(WHEAT, 1),
            Err(FarmError::ArithmeticOverflow { .. })
        ));
        assert_eq!(inv.quantity(WHEAT), u32::MAX);
    }

    #[test]
    fn from_rows_skips_zero_and_merges_duplicates() {
        let mut a = InventoryItem::new(WHEAT, 2);
        a.id = InventoryRowId::new(4);
        let b = InventoryItem::new(WHEAT, 3);
        let empty = InventoryItem::new(WHEAT_SEEDS, 0);
        let inv = Inventory::from_rows([a, b, empty]);
        assert_eq!(inv.quantity(WHEAT), 5);
        assert_eq!(inv.row(WHEAT).map(|r| r.id), Some(InventoryRowId::new(4)));
        assert_eq!(inv.quantity(WHEAT_SEEDS), 0);
    }

    #[test]
    fn drain_produce_keeps_seeds() {
        let mut inv = Inventory::new();
        let _ = inv.add(WHEAT, 2);
        let _ = inv.add(WHEAT_SEEDS, 5);
        let drained = inv.drain_produce();
        assert_eq!(drained.len(), 1);
        assert_eq!(inv.quantity(WHEAT_SEEDS), 5);
        assert_eq!(inv.quantity(WHEAT), 0);
    }
}
