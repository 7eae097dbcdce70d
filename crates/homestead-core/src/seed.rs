//! First-run data: the default catalog and the starting farm.
//!
//! Catalog ids are fixed: items 1-9, seeds 101-104, tools 201-208 and
//! machines 301-304. Tables are only seeded while empty, so edited
//! catalogs survive restarts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use homestead_farm::{Catalog, FarmError, FarmState, economy};
use homestead_ledger::water;
use homestead_types::{
    ItemDefinition, ItemId, ItemStack, MachineDefinition, MachineId, Mutation, OwnedTool,
    PlayerState, Plot, Record, RecordKind, SeedDefinition, SeedId, ToolDefinition, ToolId,
    ToolKind, WateringCanStats,
};

use crate::config::PlayerConfig;
use crate::store::{Store, StoreError};

fn item(id: i64, name: &str, price: i64, can_be_processed: bool) -> Record {
    Record::ItemDefinition(ItemDefinition {
        id: ItemId::new(id),
        name: name.to_owned(),
        base_sell_price: Decimal::new(price, 0),
        can_be_processed,
    })
}

fn seed(id: i64, name: &str, cost: i64, grow_time_secs: u32, yields: i64) -> Record {
    Record::SeedDefinition(SeedDefinition {
        id: SeedId::new(id),
        name: name.to_owned(),
        cost: Decimal::new(cost, 0),
        grow_time_secs,
        yields: ItemId::new(yields),
    })
}

fn hoe(id: i64, name: &str, range: u32, cost: i64, tier: u32) -> Record {
    Record::ToolDefinition(ToolDefinition {
        id: ToolId::new(id),
        name: name.to_owned(),
        range,
        cost: Decimal::new(cost, 0),
        tier,
        kind: ToolKind::Hoe,
    })
}

fn can(id: i64, name: &str, range: u32, cost: i64, tier: u32, capacity: i64, rate: i64) -> Record {
    Record::ToolDefinition(ToolDefinition {
        id: ToolId::new(id),
        name: name.to_owned(),
        range,
        cost: Decimal::new(cost, 0),
        tier,
        kind: ToolKind::WateringCan(WateringCanStats {
            max_capacity: Decimal::new(capacity, 0),
            refill_rate: Decimal::new(rate, 0),
        }),
    })
}

fn machine(
    id: i64,
    name: &str,
    cost: i64,
    processing_time_secs: u32,
    input: i64,
    output: i64,
) -> Record {
    Record::MachineDefinition(MachineDefinition {
        id: MachineId::new(id),
        name: name.to_owned(),
        cost: Decimal::new(cost, 0),
        processing_time_secs,
        input: ItemStack {
            item: ItemId::new(input),
            quantity: 1,
        },
        output: ItemStack {
            item: ItemId::new(output),
            quantity: 1,
        },
    })
}

/// The built-in catalog.
pub fn default_catalog() -> Vec<Record> {
    vec![
        item(1, "Carrot", 5, true),
        item(2, "Tomato", 10, true),
        item(3, "Wheat", 3, true),
        item(4, "Blueberry", 15, true),
        item(5, "Flour", 6, true),
        item(6, "Peeled Carrot", 7, false),
        item(7, "Peeled Tomato", 12, false),
        item(8, "Blueberry Mix", 20, true),
        item(9, "Blueberry Pie", 35, false),
        seed(101, "Carrot Seeds", 2, 5, 1),
        seed(102, "Tomato Seeds", 5, 10, 2),
        seed(103, "Wheat Seeds", 3, 7, 3),
        seed(104, "Blueberry Seeds", 8, 15, 4),
        hoe(201, "Rusty Hoe", 1, 0, 1),
        hoe(202, "Normal Hoe", 3, 50, 2),
        hoe(203, "Advanced Hoe", 5, 200, 3),
        hoe(204, "Super Hoe", 10, 800, 4),
        can(205, "Rusty Watering Can", 1, 0, 1, 50, 1),
        can(206, "Normal Watering Can", 3, 75, 2, 100, 2),
        can(207, "Advanced Watering Can", 5, 300, 3, 250, 5),
        can(208, "Super Watering Can", 10, 1000, 4, 500, 10),
        machine(301, "Mill", 150, 10, 3, 5),
        machine(302, "Veggie Peeler", 100, 5, 1, 6),
        machine(303, "Mixer", 300, 15, 5, 8),
        machine(304, "Oven", 500, 20, 8, 9),
    ]
}

/// Write `records` into every catalog table that is still empty.
/// Returns the number of rows written.
pub async fn seed_catalog<S: Store>(store: &S, records: Vec<Record>) -> Result<usize, StoreError> {
    let mut batch = Vec::new();
    for kind in RecordKind::ALL.into_iter().filter(|k| k.is_catalog()) {
        if store.all(kind).await?.is_empty() {
            batch.extend(
                records
                    .iter()
                    .filter(|r| r.kind() == kind)
                    .cloned()
                    .map(Mutation::Upsert),
            );
        }
    }
    let written = batch.len();
    if written > 0 {
        store.apply(batch).await?;
        tracing::info!(rows = written, "catalog seeded");
    }
    Ok(written)
}

/// The farm a new player starts with: starting money, the starter tools
/// owned and equipped, a full watering can and the starter plots.
pub fn starting_state(
    config: &PlayerConfig,
    catalog: &Catalog,
    now: DateTime<Utc>,
) -> Result<FarmState, FarmError> {
    let mut state = FarmState::new(PlayerState::new(config.starting_money, now));
    for &tool in &config.starter_tools {
        state.tools.insert(tool, OwnedTool::new(tool));
        economy::equip_tool(&mut state, catalog, tool)?;
    }
    water::fill_water(&mut state.player);
    for number in 0..config.starter_plots {
        state.plots.insert(number, Plot::new(number));
    }
    Ok(state)
}
