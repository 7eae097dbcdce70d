//! Shop transactions: buying seeds, tools, machines and plots, and
//! selling produce.
//!
//! Each transaction checks every guard before the first mutation, then
//! moves money and stock together. Paired with the draft-and-commit flow
//! in [`FarmState`], neither side is ever applied alone.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use homestead_ledger::{JournalEntryBuilder, wallet, water};
use homestead_types::{
    JournalEntry, JournalEntryType, MachineId, OwnedMachine, OwnedTool, Plot, SeedId, StockKey,
    ToolDefinition, ToolId, ToolKind,
};

use crate::catalog::Catalog;
use crate::error::{FarmError, TransitionBlocked};
use crate::state::FarmState;

// ---------------------------------------------------------------------------
// Pricing
// ---------------------------------------------------------------------------

/// Price of the next plot: `base + step * plots owned`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotPricing {
    /// Price of the first extra plot when none are owned.
    pub base: Decimal,
    /// Increase per plot already owned.
    pub step: Decimal,
}

impl Default for PlotPricing {
    fn default() -> Self {
        Self {
            base: Decimal::ONE_HUNDRED,
            step: Decimal::new(50, 0),
        }
    }
}

impl PlotPricing {
    /// Price for a player who owns `plot_count` plots.
    pub fn price_for(&self, plot_count: u32) -> Result<Decimal, FarmError> {
        self.step
            .checked_mul(Decimal::from(plot_count))
            .and_then(|extra| self.base.checked_add(extra))
            .map(wallet::round_money)
            .ok_or(FarmError::ArithmeticOverflow {
                context: "plot price",
            })
    }
}

// ---------------------------------------------------------------------------
// Receipt
// ---------------------------------------------------------------------------

/// Outcome of a purchase or sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Units bought or sold.
    pub quantity: u32,
    /// Money moved, rounded to cents.
    pub amount: Decimal,
    /// Player balance afterwards.
    pub balance_after: Decimal,
    /// Journal entry for the movement. `None` when no money moved.
    pub entry: Option<JournalEntry>,
}

fn receipt(
    entry_type: JournalEntryType,
    quantity: u32,
    amount: Decimal,
    balance_after: Decimal,
    memo: String,
    now: DateTime<Utc>,
) -> Result<Receipt, FarmError> {
    let entry = if amount.is_zero() {
        None
    } else {
        Some(
            JournalEntryBuilder::new(entry_type)
                .amount(amount)
                .balance_after(balance_after)
                .memo(memo)
                .at(now)
                .build()?,
        )
    };
    Ok(Receipt {
        quantity,
        amount,
        balance_after,
        entry,
    })
}

// ---------------------------------------------------------------------------
// Purchases
// ---------------------------------------------------------------------------

/// Buy `quantity` seeds.
pub fn buy_seed(
    state: &mut FarmState,
    catalog: &Catalog,
    seed: SeedId,
    quantity: u32,
    now: DateTime<Utc>,
) -> Result<Receipt, FarmError> {
    if quantity == 0 {
        return Err(TransitionBlocked::ZeroQuantity.into());
    }
    let def = catalog.seed(seed)?;
    let key = StockKey::Seed(seed);
    state
        .inventory
        .quantity(key)
        .checked_add(quantity)
        .ok_or(FarmError::ArithmeticOverflow {
            context: "seed stock",
        })?;
    let cost = def
        .cost
        .checked_mul(Decimal::from(quantity))
        .map(wallet::round_money)
        .ok_or(FarmError::ArithmeticOverflow {
            context: "seed cost",
        })?;

    let balance = wallet::spend(&mut state.player, cost)?;
    state.inventory.add(key, quantity)?;
    tracing::info!(seed = %def.name, quantity, cost = %cost, balance = %balance, "seeds bought");
    receipt(
        JournalEntryType::SeedPurchase,
        quantity,
        cost,
        balance,
        format!("{quantity}x {}", def.name),
        now,
    )
}

/// Buy a tool. Fails with [`FarmError::AlreadyOwned`] before charging
/// when the tool is owned. The tool is equipped when it outranks the
/// equipped tool of its category.
pub fn buy_tool(
    state: &mut FarmState,
    catalog: &Catalog,
    tool: ToolId,
    now: DateTime<Utc>,
) -> Result<Receipt, FarmError> {
    let def = catalog.tool(tool)?;
    if state.owns_tool(tool) {
        return Err(FarmError::AlreadyOwned {
            name: def.name.clone(),
        });
    }
    let cost = wallet::round_money(def.cost);
    let balance = wallet::spend(&mut state.player, cost)?;
    state.tools.insert(tool, OwnedTool::new(tool));

    let equipped = if outranks_equipped(state, catalog, def) {
        equip(state, def);
        true
    } else {
        false
    };
    tracing::info!(tool = %def.name, cost = %cost, balance = %balance, equipped, "tool bought");
    receipt(
        JournalEntryType::ToolPurchase,
        1,
        cost,
        balance,
        def.name.clone(),
        now,
    )
}

/// Buy a machine. Fails with [`FarmError::AlreadyOwned`] before charging
/// when the machine is owned.
pub fn buy_machine(
    state: &mut FarmState,
    catalog: &Catalog,
    machine: MachineId,
    now: DateTime<Utc>,
) -> Result<Receipt, FarmError> {
    let def = catalog.machine(machine)?;
    if state.owns_machine(machine) {
        return Err(FarmError::AlreadyOwned {
            name: def.name.clone(),
        });
    }
    let cost = wallet::round_money(def.cost);
    let balance = wallet::spend(&mut state.player, cost)?;
    state.machines.insert(machine, OwnedMachine::new(machine));
    tracing::info!(machine = %def.name, cost = %cost, balance = %balance, "machine bought");
    receipt(
        JournalEntryType::MachinePurchase,
        1,
        cost,
        balance,
        def.name.clone(),
        now,
    )
}

/// Buy one more plot. Returns the new plot's ordinal.
pub fn buy_plot(
    state: &mut FarmState,
    pricing: &PlotPricing,
    now: DateTime<Utc>,
) -> Result<(u32, Receipt), FarmError> {
    let cost = pricing.price_for(state.plot_count())?;
    let plot_number = state.next_plot_number();
    let balance = wallet::spend(&mut state.player, cost)?;
    state.plots.insert(plot_number, Plot::new(plot_number));
    tracing::info!(plot_number, cost = %cost, balance = %balance, "plot bought");
    let receipt = receipt(
        JournalEntryType::PlotPurchase,
        1,
        cost,
        balance,
        format!("Plot #{plot_number}"),
        now,
    )?;
    Ok((plot_number, receipt))
}

// ---------------------------------------------------------------------------
// Equipment
// ---------------------------------------------------------------------------

/// Whether `candidate` should replace the equipped tool of its category.
fn outranks_equipped(state: &FarmState, catalog: &Catalog, candidate: &ToolDefinition) -> bool {
    match state.player.selected(candidate.category()) {
        None => true,
        Some(current) if current == candidate.id => false,
        Some(current) => catalog
            .tool(current)
            .ok()
            .is_none_or(|equipped| candidate.tier > equipped.tier),
    }
}

fn equip(state: &mut FarmState, def: &ToolDefinition) {
    match def.kind {
        ToolKind::Hoe => state.player.selected_hoe = Some(def.id),
        ToolKind::WateringCan(stats) => {
            water::equip_watering_can(&mut state.player, def.id, stats);
        }
    }
}

/// Equip an owned tool, whatever its tier.
pub fn equip_tool(state: &mut FarmState, catalog: &Catalog, tool: ToolId) -> Result<(), FarmError> {
    let def = catalog.tool(tool)?;
    if !state.owns_tool(tool) {
        return Err(FarmError::NotFound {
            what: "owned tool",
            id: tool.get(),
        });
    }
    equip(state, def);
    Ok(())
}

// ---------------------------------------------------------------------------
// Sales
// ---------------------------------------------------------------------------

/// Sell one unit of a produce row.
pub fn sell_item(
    state: &mut FarmState,
    catalog: &Catalog,
    key: StockKey,
    now: DateTime<Utc>,
) -> Result<Receipt, FarmError> {
    let StockKey::Produce(item) = key else {
        return Err(TransitionBlocked::SeedsNotSellable.into());
    };
    let def = catalog.item(item)?;
    state
        .inventory
        .try_consume(key, 1)
        .map_err(|shortfall| shortfall.named(def.name.as_str()))?;
    let amount = wallet::round_money(def.base_sell_price);
    let balance = wallet::credit(&mut state.player, amount)?;
    tracing::info!(item = %def.name, amount = %amount, balance = %balance, "item sold");
    receipt(
        JournalEntryType::Sale,
        1,
        amount,
        balance,
        format!("1x {}", def.name),
        now,
    )
}

/// Sell every produce row. Seed rows are kept.
///
/// The total is `sum(price * quantity)` rounded once. Rows whose item is
/// missing from the catalog are left unsold.
pub fn sell_all_produce(
    state: &mut FarmState,
    catalog: &Catalog,
    now: DateTime<Utc>,
) -> Result<Receipt, FarmError> {
    let overflow = FarmError::ArithmeticOverflow {
        context: "sale total",
    };
    let mut total = Decimal::ZERO;
    let mut units: u32 = 0;
    for row in state.inventory.drain_produce() {
        let StockKey::Produce(item) = row.key else {
            continue;
        };
        let Ok(def) = catalog.item(item) else {
            tracing::warn!(item = %item, quantity = row.quantity, "unknown item left unsold");
            state.inventory.restore(row);
            continue;
        };
        let line = def
            .base_sell_price
            .checked_mul(Decimal::from(row.quantity))
            .ok_or_else(|| overflow.clone())?;
        total = total.checked_add(line).ok_or_else(|| overflow.clone())?;
        units = units.checked_add(row.quantity).ok_or_else(|| overflow.clone())?;
    }

    let amount = wallet::round_money(total);
    let balance = wallet::credit(&mut state.player, amount)?;
    if units > 0 {
        tracing::info!(units, amount = %amount, balance = %balance, "produce sold");
    }
    receipt(
        JournalEntryType::Sale,
        units,
        amount,
        balance,
        format!("{units} items"),
        now,
    )
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use rust_decimal_macros::dec;

    use homestead_types::{
        ItemDefinition, ItemId, ItemStack, MachineDefinition, PlayerState, Record, SeedDefinition,
        WateringCanStats,
    };

    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + Duration::days(20_000)
    }

    fn hoe(id: i64, tier: u32, cost: Decimal) -> Record {
        Record::ToolDefinition(ToolDefinition {
            id: ToolId::new(id),
            name: format!("Hoe {id}"),
            range: tier,
            cost,
            tier,
            kind: ToolKind::Hoe,
        })
    }

    fn can(id: i64, tier: u32, cost: Decimal, capacity: Decimal, rate: Decimal) -> Record {
        Record::ToolDefinition(ToolDefinition {
            id: ToolId::new(id),
            name: format!("Can {id}"),
            range: tier,
            cost,
            tier,
            kind: ToolKind::WateringCan(WateringCanStats {
                max_capacity: capacity,
                refill_rate: rate,
            }),
        })
    }

    fn catalog() -> Catalog {
        Catalog::from_records([
            Record::ItemDefinition(ItemDefinition {
                id: ItemId::new(1),
                name: "Carrot".to_owned(),
                base_sell_price: dec!(5),
                can_be_processed: true,
            }),
            Record::ItemDefinition(ItemDefinition {
                id: ItemId::new(2),
                name: "Tomato".to_owned(),
                base_sell_price: dec!(0.335),
                can_be_processed: true,
            }),
            Record::SeedDefinition(SeedDefinition {
                id: SeedId::new(101),
                name: "Carrot Seeds".to_owned(),
                cost: dec!(2),
                grow_time_secs: 5,
                yields: ItemId::new(1),
            }),
            hoe(201, 1, dec!(0)),
            hoe(202, 2, dec!(100)),
            hoe(209, 0, dec!(10)),
            can(205, 1, dec!(0), dec!(50), dec!(1)),
            can(206, 2, dec!(75), dec!(100), dec!(2)),
            Record::MachineDefinition(MachineDefinition {
                id: MachineId::new(301),
                name: "Mill".to_owned(),
                cost: dec!(150),
                processing_time_secs: 10,
                input: ItemStack {
                    item: ItemId::new(3),
                    quantity: 1,
                },
                output: ItemStack {
                    item: ItemId::new(5),
                    quantity: 1,
                },
            }),
        ])
    }

    fn state(money: Decimal) -> FarmState {
        let mut state = FarmState::new(PlayerState::new(money, t0()));
        state.plots.insert(0, Plot::new(0));
        state
    }

    #[test]
    fn buy_seed_charges_and_stocks() {
        let mut s = state(dec!(100));
        let receipt = buy_seed(&mut s, &catalog(), SeedId::new(101), 3, t0());
        assert_eq!(receipt.as_ref().map(|r| r.amount), Ok(dec!(6)));
        assert_eq!(s.player.money, dec!(94));
        assert_eq!(s.inventory.quantity(StockKey::Seed(SeedId::new(101))), 3);
        assert_eq!(
            receipt.ok().and_then(|r| r.entry).map(|e| e.memo),
            Some("3x Carrot Seeds".to_owned())
        );
    }

    #[test]
    fn unaffordable_seed_changes_nothing() {
        let mut s = state(dec!(5));
        let before = s.clone();
        let result = buy_seed(&mut s, &catalog(), SeedId::new(101), 3, t0());
        assert!(matches!(result, Err(FarmError::InsufficientFunds { .. })));
        assert_eq!(s, before);
    }

    #[test]
    fn zero_seed_quantity_rejected() {
        let mut s = state(dec!(5));
        assert_eq!(
            buy_seed(&mut s, &catalog(), SeedId::new(101), 0, t0()).err(),
            Some(FarmError::InvalidTransition(TransitionBlocked::ZeroQuantity))
        );
    }

    #[test]
    fn tool_bought_once() {
        let mut s = state(dec!(100));
        let cat = catalog();
        assert!(buy_tool(&mut s, &cat, ToolId::new(202), t0()).is_ok());
        assert_eq!(s.player.money, Decimal::ZERO);
        assert!(s.owns_tool(ToolId::new(202)));
        let again = buy_tool(&mut s, &cat, ToolId::new(202), t0());
        assert_eq!(
            again.err(),
            Some(FarmError::AlreadyOwned {
                name: "Hoe 202".to_owned()
            })
        );
        assert_eq!(s.player.money, Decimal::ZERO);
    }

    #[test]
    fn higher_tier_auto_equips() {
        let mut s = state(dec!(500));
        let cat = catalog();
        let _ = buy_tool(&mut s, &cat, ToolId::new(201), t0());
        assert_eq!(s.player.selected_hoe, Some(ToolId::new(201)));
        let _ = buy_tool(&mut s, &cat, ToolId::new(202), t0());
        assert_eq!(s.player.selected_hoe, Some(ToolId::new(202)));
        // A higher id with a lower tier is not an upgrade.
        let _ = buy_tool(&mut s, &cat, ToolId::new(209), t0());
        assert!(s.owns_tool(ToolId::new(209)));
        assert_eq!(s.player.selected_hoe, Some(ToolId::new(202)));
    }

    #[test]
    fn better_can_updates_water_stats() {
        let mut s = state(dec!(500));
        let cat = catalog();
        let _ = buy_tool(&mut s, &cat, ToolId::new(205), t0());
        s.player.current_water = dec!(30);
        let _ = buy_tool(&mut s, &cat, ToolId::new(206), t0());
        assert_eq!(s.player.selected_watering_can, Some(ToolId::new(206)));
        assert_eq!(s.player.max_water, dec!(100));
        assert_eq!(s.player.refill_rate, dec!(2));
        assert_eq!(s.player.current_water, dec!(30));
    }

    #[test]
    fn free_tool_writes_no_journal_entry() {
        let mut s = state(dec!(10));
        let receipt = buy_tool(&mut s, &catalog(), ToolId::new(201), t0());
        assert_eq!(receipt.map(|r| r.entry), Ok(None));
    }

    #[test]
    fn equip_requires_ownership() {
        let mut s = state(dec!(10));
        assert!(matches!(
            equip_tool(&mut s, &catalog(), ToolId::new(202)),
            Err(FarmError::NotFound { .. })
        ));
    }

    #[test]
    fn machine_bought_once() {
        let mut s = state(dec!(400));
        let cat = catalog();
        assert!(buy_machine(&mut s, &cat, MachineId::new(301), t0()).is_ok());
        assert_eq!(s.player.money, dec!(250));
        assert!(matches!(
            buy_machine(&mut s, &cat, MachineId::new(301), t0()),
            Err(FarmError::AlreadyOwned { .. })
        ));
        assert_eq!(s.player.money, dec!(250));
    }

    #[test]
    fn plot_price_scales_with_count() {
        let pricing = PlotPricing::default();
        let mut s = state(dec!(1000));
        let first = buy_plot(&mut s, &pricing, t0());
        assert_eq!(first.as_ref().map(|(n, r)| (*n, r.amount)), Ok((1, dec!(150))));
        let second = buy_plot(&mut s, &pricing, t0());
        assert_eq!(second.map(|(n, r)| (n, r.amount)), Ok((2, dec!(200))));
        assert_eq!(s.player.money, dec!(650));
        assert_eq!(s.plot_count(), 3);
    }

    #[test]
    fn unaffordable_plot_changes_nothing() {
        let mut s = state(dec!(149.99));
        let before = s.clone();
        assert!(buy_plot(&mut s, &PlotPricing::default(), t0()).is_err());
        assert_eq!(s, before);
    }

    #[test]
    fn sell_one_unit() {
        let mut s = state(dec!(10));
        let _ = s.inventory.add(StockKey::Produce(ItemId::new(1)), 2);
        let receipt = sell_item(&mut s, &catalog(), StockKey::Produce(ItemId::new(1)), t0());
        assert_eq!(receipt.map(|r| r.balance_after), Ok(dec!(15)));
        assert_eq!(s.inventory.quantity(StockKey::Produce(ItemId::new(1))), 1);
    }

    #[test]
    fn seeds_cannot_be_sold() {
        let mut s = state(dec!(10));
        let key = StockKey::Seed(SeedId::new(101));
        let _ = s.inventory.add(key, 2);
        assert_eq!(
            sell_item(&mut s, &catalog(), key, t0()).err(),
            Some(FarmError::InvalidTransition(TransitionBlocked::SeedsNotSellable))
        );
        assert_eq!(s.inventory.quantity(key), 2);
    }

    #[test]
    fn selling_missing_stock_fails() {
        let mut s = state(dec!(10));
        let result = sell_item(&mut s, &catalog(), StockKey::Produce(ItemId::new(1)), t0());
        assert!(matches!(result, Err(FarmError::InsufficientInventory { .. })));
        assert_eq!(s.player.money, dec!(10));
    }

    #[test]
    fn sell_all_rounds_total_once_and_keeps_seeds() {
        let mut s = state(dec!(0));
        let _ = s.inventory.add(StockKey::Produce(ItemId::new(1)), 2);
        let _ = s.inventory.add(StockKey::Produce(ItemId::new(2)), 3);
        let _ = s.inventory.add(StockKey::Seed(SeedId::new(101)), 4);
        let receipt = sell_all_produce(&mut s, &catalog(), t0());
        // 2 * 5 + 3 * 0.335 = 11.005 -> 11.00 (midpoint to even)
        assert_eq!(receipt.as_ref().map(|r| r.amount), Ok(dec!(11.00)));
        assert_eq!(receipt.map(|r| r.quantity), Ok(5));
        assert_eq!(s.player.money, dec!(11));
        assert_eq!(s.inventory.quantity(StockKey::Seed(SeedId::new(101))), 4);
        assert_eq!(s.inventory.len(), 1);
    }

    #[test]
    fn sell_all_skips_unknown_items() {
        let mut s = state(dec!(0));
        let _ = s.inventory.add(StockKey::Produce(ItemId::new(77)), 2);
        let receipt = sell_all_produce(&mut s, &catalog(), t0());
        assert_eq!(receipt.map(|r| r.entry), Ok(None));
        assert_eq!(s.inventory.quantity(StockKey::Produce(ItemId::new(77))), 2);
    }
}
