//! Read models for the presentation layer.
//!
//! Views are computed from reconciled state and never written back. Plot
//! phases read the cached growth fraction, so reconcile before building
//! them.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use homestead_ledger::wallet;
use homestead_types::{
    MachineId, MachinePhase, OwnedMachine, PlayerState, Plot, PlotPhase, StockKey, ToolCategory,
};

use crate::catalog::Catalog;
use crate::economy::PlotPricing;
use crate::error::FarmError;
use crate::progress::percent;
use crate::state::FarmState;
use crate::{machine, plot};

/// Display state of one plot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlotView {
    /// Stable ordinal.
    pub plot_number: u32,
    /// Lifecycle phase.
    pub phase: PlotPhase,
    /// Name of the crop growing here.
    pub crop: Option<String>,
    /// Growth fraction in `[0, 1]`.
    #[ts(as = "String")]
    pub progress: Decimal,
    /// One-line status, e.g. `Carrot (40%)`.
    pub status: String,
}

/// Display state of one owned machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MachineView {
    /// Machine definition.
    pub machine: MachineId,
    /// Machine name.
    pub name: String,
    /// Lifecycle phase.
    pub phase: MachinePhase,
    /// Processing fraction in `[0, 1]`.
    #[ts(as = "String")]
    pub progress: Decimal,
    /// One-line status, e.g. `Processing Wheat (50%)`.
    pub status: String,
    /// Idle with enough input in stock.
    pub can_start: bool,
    /// Job finished and waiting.
    pub can_collect: bool,
}

/// Water gauge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WaterView {
    /// Units held.
    #[ts(as = "String")]
    pub current: Decimal,
    /// Capacity of the equipped can.
    #[ts(as = "String")]
    pub max: Decimal,
    /// Units regained per second.
    #[ts(as = "String")]
    pub refill_rate: Decimal,
    /// `current/max` in whole units, or `N/A` without a can.
    pub status: String,
}

/// Shelf a shop offer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum OfferCategory {
    /// Seeds, bought in any quantity.
    Seed,
    /// Hoes.
    Hoe,
    /// Watering cans.
    WateringCan,
    /// Crafting machines.
    Machine,
}

impl From<ToolCategory> for OfferCategory {
    fn from(category: ToolCategory) -> Self {
        match category {
            ToolCategory::Hoe => Self::Hoe,
            ToolCategory::WateringCan => Self::WateringCan,
        }
    }
}

/// One purchasable catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ShopOffer {
    /// Shelf.
    pub category: OfferCategory,
    /// Definition id within the shelf's catalog.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Unit price.
    #[ts(as = "String")]
    pub price: Decimal,
    /// The player has the money.
    pub can_afford: bool,
    /// One-time purchase already made. Always false for seeds.
    pub owned: bool,
    /// Tool currently in hand.
    pub equipped: bool,
}

/// One inventory row with its catalog details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct InventoryLine {
    /// Row key.
    pub key: StockKey,
    /// Display name.
    pub name: String,
    /// Units held.
    pub quantity: u32,
    /// Purchase price for seeds, sell price for produce.
    #[ts(as = "String")]
    pub unit_price: Decimal,
    /// Whether the row can be sold.
    pub sellable: bool,
}

/// Everything a farm screen shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FarmView {
    /// Player balance.
    #[ts(as = "String")]
    pub money: Decimal,
    /// Water gauge.
    pub water: WaterView,
    /// Plots by ordinal.
    pub plots: Vec<PlotView>,
    /// Owned machines by id.
    pub machines: Vec<MachineView>,
    /// Inventory, seeds first.
    pub inventory: Vec<InventoryLine>,
    /// Shop shelves.
    pub shop: Vec<ShopOffer>,
    /// Price of the next plot.
    #[ts(as = "String")]
    pub next_plot_price: Decimal,
    /// The player can buy the next plot.
    pub can_afford_plot: bool,
}

/// Build the full farm view.
///
/// Machines whose definition is missing from the catalog are left out.
pub fn farm_view(
    state: &FarmState,
    catalog: &Catalog,
    pricing: &PlotPricing,
    now: DateTime<Utc>,
) -> Result<FarmView, FarmError> {
    let next_plot_price = pricing.price_for(state.plot_count())?;
    let machines = state
        .machines
        .values()
        .filter_map(|owned| {
            machine_view(owned, state, catalog, now)
                .inspect_err(|err| {
                    tracing::warn!(
                        machine = %owned.machine,
                        error = %err,
                        "machine left out of view"
                    );
                })
                .ok()
        })
        .collect();
    Ok(FarmView {
        money: state.player.money,
        water: water_view(&state.player),
        plots: state
            .plots
            .values()
            .map(|p| plot_view(p, catalog))
            .collect(),
        machines,
        inventory: inventory_lines(state, catalog),
        shop: shop_offers(state, catalog),
        next_plot_price,
        can_afford_plot: wallet::can_afford(&state.player, next_plot_price),
    })
}

/// Status of one plot.
pub fn plot_view(plot: &Plot, catalog: &Catalog) -> PlotView {
    let phase = plot::phase(plot);
    let crop = plot.planted_seed.map(|seed| {
        catalog.seed(seed).map_or_else(
            |_| "Unknown".to_owned(),
            |def| catalog.item_name(def.yields).to_owned(),
        )
    });
    let crop_name = crop.as_deref().unwrap_or("Unknown");
    let status = match phase {
        PlotPhase::Empty => "Empty".to_owned(),
        PlotPhase::Tilled => "Tilled".to_owned(),
        PlotPhase::NeedsWater => format!("{crop_name} (Needs Water)"),
        PlotPhase::Growing => format!("{crop_name} ({}%)", percent(plot.growth_progress)),
        PlotPhase::ReadyToHarvest => format!("{crop_name} (Ready!)"),
    };
    PlotView {
        plot_number: plot.plot_number,
        phase,
        crop,
        progress: plot.growth_progress,
        status,
    }
}

/// Status of one owned machine.
pub fn machine_view(
    owned: &OwnedMachine,
    state: &FarmState,
    catalog: &Catalog,
    now: DateTime<Utc>,
) -> Result<MachineView, FarmError> {
    let def = catalog.machine(owned.machine)?;
    let phase = machine::phase(owned, def, now);
    let progress = machine::progress_at(owned, def, now);
    let can_start = phase == MachinePhase::Idle && machine::has_input(def, &state.inventory);
    let input = owned.locked_input.unwrap_or(def.input);
    let output = owned.locked_output.unwrap_or(def.output);
    let status = match phase {
        MachinePhase::Idle if can_start => {
            format!("Idle (Ready for {})", catalog.item_name(def.input.item))
        }
        MachinePhase::Idle => format!(
            "Idle (Need {}x {})",
            def.input.quantity,
            catalog.item_name(def.input.item)
        ),
        MachinePhase::Processing => format!(
            "Processing {} ({}%)",
            catalog.item_name(input.item),
            percent(progress)
        ),
        MachinePhase::ReadyToCollect => format!(
            "Ready to Collect {}x {}",
            output.quantity,
            catalog.item_name(output.item)
        ),
    };
    Ok(MachineView {
        machine: owned.machine,
        name: def.name.clone(),
        phase,
        progress,
        status,
        can_start,
        can_collect: phase == MachinePhase::ReadyToCollect,
    })
}

/// Water gauge for the player.
pub fn water_view(player: &PlayerState) -> WaterView {
    let status = if player.selected_watering_can.is_some() {
        format!(
            "{}/{}",
            whole_units(player.current_water),
            whole_units(player.max_water)
        )
    } else {
        "N/A".to_owned()
    };
    WaterView {
        current: player.current_water,
        max: player.max_water,
        refill_rate: player.refill_rate,
        status,
    }
}

fn whole_units(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Inventory rows with names and unit prices, seeds first.
pub fn inventory_lines(state: &FarmState, catalog: &Catalog) -> Vec<InventoryLine> {
    state
        .inventory
        .rows()
        .map(|row| {
            let unit_price = match row.key {
                StockKey::Seed(id) => catalog.seed(id).map(|def| def.cost),
                StockKey::Produce(id) => catalog.item(id).map(|def| def.base_sell_price),
            }
            .unwrap_or(Decimal::ZERO);
            InventoryLine {
                key: row.key,
                name: catalog.stock_name(row.key).to_owned(),
                quantity: row.quantity,
                unit_price,
                sellable: !row.key.is_seed(),
            }
        })
        .collect()
}

/// Every catalog entry on sale, by shelf then id.
pub fn shop_offers(state: &FarmState, catalog: &Catalog) -> Vec<ShopOffer> {
    let player = &state.player;
    let seeds = catalog.seeds().map(|def| ShopOffer {
        category: OfferCategory::Seed,
        id: def.id.get(),
        name: def.name.clone(),
        price: def.cost,
        can_afford: wallet::can_afford(player, def.cost),
        owned: false,
        equipped: false,
    });
    let tools = catalog.tools().map(|def| ShopOffer {
        category: def.category().into(),
        id: def.id.get(),
        name: def.name.clone(),
        price: def.cost,
        can_afford: wallet::can_afford(player, def.cost),
        owned: state.owns_tool(def.id),
        equipped: player.selected(def.category()) == Some(def.id),
    });
    let machines = catalog.machines().map(|def| ShopOffer {
        category: OfferCategory::Machine,
        id: def.id.get(),
        name: def.name.clone(),
        price: def.cost,
        can_afford: wallet::can_afford(player, def.cost),
        owned: state.owns_machine(def.id),
        equipped: false,
    });
    let mut offers: Vec<ShopOffer> = seeds.chain(tools).chain(machines).collect();
    offers.sort_by_key(|offer| (offer.category, offer.id));
    offers
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use rust_decimal_macros::dec;

    use homestead_types::{
        ItemDefinition, ItemId, ItemStack, MachineDefinition, OwnedTool, Record, SeedDefinition,
        SeedId, ToolDefinition, ToolId, ToolKind, WateringCanStats,
    };

    use super::*;

    const CARROT: ItemId = ItemId(1);
    const WHEAT: ItemId = ItemId(3);
    const FLOUR: ItemId = ItemId(5);
    const CARROT_SEEDS: SeedId = SeedId(101);
    const MILL: MachineId = MachineId(301);

    fn t0() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + Duration::days(20_000)
    }

    fn item(id: ItemId, name: &str, price: Decimal) -> Record {
        Record::ItemDefinition(ItemDefinition {
            id,
            name: name.to_owned(),
            base_sell_price: price,
            can_be_processed: true,
        })
    }

    fn catalog() -> Catalog {
        Catalog::from_records([
            item(CARROT, "Carrot", dec!(5)),
            item(WHEAT, "Wheat", dec!(3)),
            item(FLOUR, "Flour", dec!(6)),
            Record::SeedDefinition(SeedDefinition {
                id: CARROT_SEEDS,
                name: "Carrot Seeds".to_owned(),
                cost: dec!(2),
                grow_time_secs: 5,
                yields: CARROT,
            }),
            Record::ToolDefinition(ToolDefinition {
                id: ToolId::new(205),
                name: "Basic Watering Can".to_owned(),
                range: 1,
                cost: dec!(0),
                tier: 1,
                kind: ToolKind::WateringCan(WateringCanStats {
                    max_capacity: dec!(50),
                    refill_rate: dec!(1),
                }),
            }),
            Record::MachineDefinition(mill()),
        ])
    }

    fn mill() -> MachineDefinition {
        MachineDefinition {
            id: MILL,
            name: "Mill".to_owned(),
            cost: dec!(150),
            processing_time_secs: 10,
            input: ItemStack {
                item: WHEAT,
                quantity: 1,
            },
            output: ItemStack {
                item: FLOUR,
                quantity: 1,
            },
        }
    }

    fn state() -> FarmState {
        FarmState::new(PlayerState::new(dec!(100), t0()))
    }

    #[test]
    fn plot_status_follows_lifecycle() {
        let cat = catalog();
        let mut p = Plot::new(0);
        assert_eq!(plot_view(&p, &cat).status, "Empty");
        p.tilled = true;
        assert_eq!(plot_view(&p, &cat).status, "Tilled");
        p.tilled = false;
        p.planted_seed = Some(CARROT_SEEDS);
        p.planted_at = Some(t0());
        assert_eq!(plot_view(&p, &cat).status, "Carrot (Needs Water)");
        p.watered = true;
        p.growth_progress = dec!(0.4);
        let view = plot_view(&p, &cat);
        assert_eq!(view.status, "Carrot (40%)");
        assert_eq!(view.crop.as_deref(), Some("Carrot"));
        p.growth_progress = Decimal::ONE;
        assert_eq!(plot_view(&p, &cat).status, "Carrot (Ready!)");
    }

    #[test]
    fn machine_status_follows_lifecycle() {
        let cat = catalog();
        let mut s = state();
        let mut owned = OwnedMachine::new(MILL);

        let idle = machine_view(&owned, &s, &cat, t0());
        assert_eq!(idle.as_ref().map(|v| v.status.as_str()), Ok("Idle (Need 1x Wheat)"));
        assert_eq!(idle.map(|v| v.can_start), Ok(false));

        let _ = s.inventory.add(StockKey::Produce(WHEAT), 1);
        let ready = machine_view(&owned, &s, &cat, t0());
        assert_eq!(ready.as_ref().map(|v| v.status.as_str()), Ok("Idle (Ready for Wheat)"));
        assert_eq!(ready.map(|v| v.can_start), Ok(true));

        assert_eq!(machine::start(&mut owned, &mill(), &mut s.inventory, &cat, t0()), Ok(()));
        let half = machine_view(&owned, &s, &cat, t0() + Duration::seconds(5));
        assert_eq!(half.map(|v| v.status), Ok("Processing Wheat (50%)".to_owned()));

        let done = machine_view(&owned, &s, &cat, t0() + Duration::seconds(10));
        assert_eq!(done.as_ref().map(|v| v.status.as_str()), Ok("Ready to Collect 1x Flour"));
        assert_eq!(done.map(|v| v.can_collect), Ok(true));
    }

    #[test]
    fn unknown_machine_is_not_found() {
        let owned = OwnedMachine::new(MachineId::new(999));
        assert!(matches!(
            machine_view(&owned, &state(), &catalog(), t0()),
            Err(FarmError::NotFound { .. })
        ));
    }

    #[test]
    fn water_status_needs_a_can() {
        let mut player = PlayerState::new(dec!(0), t0());
        assert_eq!(water_view(&player).status, "N/A");
        player.selected_watering_can = Some(ToolId::new(205));
        player.max_water = dec!(50);
        player.current_water = dec!(12.5);
        assert_eq!(water_view(&player).status, "13/50");
    }

    #[test]
    fn inventory_prices_by_row_kind() {
        let cat = catalog();
        let mut s = state();
        let _ = s.inventory.add(StockKey::Produce(CARROT), 2);
        let _ = s.inventory.add(StockKey::Seed(CARROT_SEEDS), 3);
        let lines = inventory_lines(&s, &cat);
        assert_eq!(lines.len(), 2);
        let seeds = lines.first();
        assert_eq!(seeds.map(|l| l.name.as_str()), Some("Carrot Seeds"));
        assert_eq!(seeds.map(|l| l.unit_price), Some(dec!(2)));
        assert_eq!(seeds.map(|l| l.sellable), Some(false));
        let produce = lines.get(1);
        assert_eq!(produce.map(|l| l.unit_price), Some(dec!(5)));
        assert_eq!(produce.map(|l| l.sellable), Some(true));
    }

    #[test]
    fn shop_flags_affordability_and_ownership() {
        let cat = catalog();
        let mut s = state();
        s.tools.insert(ToolId::new(205), OwnedTool::new(ToolId::new(205)));
        s.player.selected_watering_can = Some(ToolId::new(205));
        let offers = shop_offers(&s, &cat);
        let categories: Vec<_> = offers.iter().map(|o| o.category).collect();
        assert_eq!(
            categories,
            vec![
                OfferCategory::Seed,
                OfferCategory::WateringCan,
                OfferCategory::Machine
            ]
        );
        let can = offers.get(1);
        assert_eq!(can.map(|o| (o.owned, o.equipped)), Some((true, true)));
        let mill = offers.get(2);
        assert_eq!(mill.map(|o| (o.can_afford, o.owned)), Some((false, false)));
    }

    #[test]
    fn farm_view_prices_next_plot() {
        let mut s = state();
        s.plots.insert(0, Plot::new(0));
        let view = farm_view(&s, &catalog(), &PlotPricing::default(), t0());
        assert_eq!(view.as_ref().map(|v| v.next_plot_price), Ok(dec!(150)));
        assert_eq!(view.as_ref().map(|v| v.can_afford_plot), Ok(false));
        assert_eq!(view.map(|v| v.plots.len()), Ok(1));
    }
}
