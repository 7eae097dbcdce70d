//! End-to-end farm scenarios against an in-memory store.
//!
//! Each test opens a session on a fresh [`MemoryStore`] with a
//! [`ManualClock`], drives commands and checks both the live state and
//! what reached the store.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use homestead_core::seed::{default_catalog, seed_catalog};
use homestead_core::{Homestead, HomesteadConfig, ManualClock, MemoryStore, SessionError, Store};
use homestead_farm::{FarmError, TransitionBlocked};
use homestead_types::{
    ItemId, MachineId, MachinePhase, PlayerState, PlotPhase, Record, SeedId, StockKey,
    ToolDefinition, ToolId, ToolKind, WateringCanStats,
};

const CARROT: ItemId = ItemId(1);
const WHEAT: ItemId = ItemId(3);
const FLOUR: ItemId = ItemId(5);
const CARROT_SEEDS: SeedId = SeedId(101);
const WHEAT_SEEDS: SeedId = SeedId(103);
const MILL: MachineId = MachineId(301);

type Session = Homestead<Arc<MemoryStore>, Arc<ManualClock>>;

fn t0() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + Duration::days(20_000)
}

fn config_with_money(money: Decimal) -> HomesteadConfig {
    let mut config = HomesteadConfig::default();
    config.player.starting_money = money;
    config
}

async fn open_with(
    store: Arc<MemoryStore>,
    config: &HomesteadConfig,
) -> (Session, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(t0()));
    let session = Homestead::open(store, Arc::clone(&clock), config)
        .await
        .unwrap();
    (session, clock)
}

async fn open(money: Decimal) -> (Session, Arc<MemoryStore>, Arc<ManualClock>) {
    let store = Arc::new(MemoryStore::new());
    let (session, clock) = open_with(Arc::clone(&store), &config_with_money(money)).await;
    (session, store, clock)
}

fn farm_error(result: Result<impl Sized, SessionError>) -> FarmError {
    match result {
        Err(SessionError::Farm(err)) => err,
        Err(other) => panic!("expected a farm error, got {other}"),
        Ok(_) => panic!("expected a farm error, got success"),
    }
}

// ---------------------------------------------------------------------------
// Scenario A: grow and harvest
// ---------------------------------------------------------------------------

#[tokio::test]
async fn scenario_a_crop_grows_and_harvests() {
    let (session, _, clock) = open(dec!(100)).await;
    session.buy_seed(CARROT_SEEDS, 1).await.unwrap();
    session.till(0).await.unwrap();
    session.plant(0, CARROT_SEEDS).await.unwrap();
    session.water(0).await.unwrap();

    clock.advance(Duration::seconds(5));
    let report = session.reconcile().await.unwrap();
    assert_eq!(report.plots_ready, 1);

    let farm = session.snapshot().await;
    let plot = farm.plots.get(&0).unwrap();
    assert_eq!(plot.growth_progress, Decimal::ONE);

    assert_eq!(session.harvest(0).await.unwrap(), CARROT);
    let farm = session.snapshot().await;
    assert_eq!(farm.inventory.quantity(StockKey::Produce(CARROT)), 1);
    assert_eq!(farm.inventory.quantity(StockKey::Seed(CARROT_SEEDS)), 0);
    assert_eq!(
        homestead_farm::plot::phase(farm.plots.get(&0).unwrap()),
        PlotPhase::Empty
    );
}

#[tokio::test]
async fn harvest_before_ripe_is_rejected() {
    let (session, _, clock) = open(dec!(100)).await;
    session.buy_seed(CARROT_SEEDS, 1).await.unwrap();
    session.till(0).await.unwrap();
    session.plant(0, CARROT_SEEDS).await.unwrap();
    session.water(0).await.unwrap();
    clock.advance(Duration::seconds(4));

    let err = farm_error(session.harvest(0).await);
    assert!(matches!(
        err,
        FarmError::InvalidTransition(TransitionBlocked::CropNotReady { .. })
    ));
    let farm = session.snapshot().await;
    assert!(farm.plots.get(&0).unwrap().is_planted());
}

#[tokio::test]
async fn unwatered_crop_does_not_grow() {
    let (session, _, clock) = open(dec!(100)).await;
    session.buy_seed(CARROT_SEEDS, 1).await.unwrap();
    session.till(0).await.unwrap();
    session.plant(0, CARROT_SEEDS).await.unwrap();

    clock.advance(Duration::minutes(10));
    let view = session.view().await.unwrap();
    let plot = view.plots.first().unwrap();
    assert_eq!(plot.phase, PlotPhase::NeedsWater);
    assert_eq!(plot.progress, Decimal::ZERO);
    assert_eq!(plot.status, "Carrot (Needs Water)");
}

#[tokio::test]
async fn planting_without_seeds_leaves_plot_tilled() {
    let (session, _, _) = open(dec!(100)).await;
    session.till(0).await.unwrap();
    let err = farm_error(session.plant(0, CARROT_SEEDS).await);
    assert_eq!(
        err,
        FarmError::InsufficientInventory {
            item: "Carrot Seeds".to_owned(),
            required: 1,
            available: 0,
        }
    );
    let view = session.view().await.unwrap();
    assert_eq!(view.plots.first().unwrap().status, "Tilled");
}

#[tokio::test]
async fn watering_an_empty_plot_is_rejected() {
    let (session, _, _) = open(dec!(100)).await;
    let water_before = session.snapshot().await.player.current_water;
    let err = farm_error(session.water(0).await);
    assert!(matches!(
        err,
        FarmError::InvalidTransition(TransitionBlocked::NothingPlanted { plot_number: 0 })
    ));
    assert_eq!(session.snapshot().await.player.current_water, water_before);
}

// ---------------------------------------------------------------------------
// Scenario B: machine without input
// ---------------------------------------------------------------------------

#[tokio::test]
async fn scenario_b_machine_needs_input() {
    let (session, _, _) = open(dec!(1000)).await;
    session.buy_machine(MILL).await.unwrap();

    let err = farm_error(session.start_machine(MILL).await);
    assert_eq!(
        err,
        FarmError::InsufficientInventory {
            item: "Wheat".to_owned(),
            required: 1,
            available: 0,
        }
    );
    let view = session.view().await.unwrap();
    let mill = view.machines.first().unwrap();
    assert_eq!(mill.phase, MachinePhase::Idle);
    assert_eq!(mill.status, "Idle (Need 1x Wheat)");
    assert!(!mill.can_start);
}

#[tokio::test]
async fn wheat_to_flour_production_chain() {
    let (session, _, clock) = open(dec!(1000)).await;
    session.buy_machine(MILL).await.unwrap();
    session.buy_seed(WHEAT_SEEDS, 1).await.unwrap();
    session.till(0).await.unwrap();
    session.plant(0, WHEAT_SEEDS).await.unwrap();
    session.water(0).await.unwrap();

    clock.advance(Duration::seconds(7));
    assert_eq!(session.harvest(0).await.unwrap(), WHEAT);

    session.start_machine(MILL).await.unwrap();
    let err = farm_error(session.start_machine(MILL).await);
    assert!(matches!(
        err,
        FarmError::InvalidTransition(TransitionBlocked::MachineBusy { .. })
    ));

    clock.advance(Duration::seconds(5));
    let view = session.view().await.unwrap();
    assert_eq!(view.machines.first().unwrap().status, "Processing Wheat (50%)");

    clock.advance(Duration::seconds(5));
    let report = session.reconcile().await.unwrap();
    assert_eq!(report.machines_ready, 1);
    let collected = session.collect(MILL).await.unwrap();
    assert_eq!(collected.item, FLOUR);
    assert_eq!(collected.quantity, 1);

    let farm = session.snapshot().await;
    assert_eq!(farm.inventory.quantity(StockKey::Produce(FLOUR)), 1);
    assert_eq!(farm.inventory.quantity(StockKey::Produce(WHEAT)), 0);
}

#[tokio::test]
async fn machines_must_be_owned() {
    let (session, _, _) = open(dec!(1000)).await;
    let err = farm_error(session.start_machine(MILL).await);
    assert!(matches!(err, FarmError::NotFound { what: "owned machine", .. }));
}

// ---------------------------------------------------------------------------
// Scenario C: one-time tool purchase
// ---------------------------------------------------------------------------

#[tokio::test]
async fn scenario_c_tool_bought_once() {
    let store = Arc::new(MemoryStore::new());
    let mut catalog = default_catalog();
    catalog.push(Record::ToolDefinition(ToolDefinition {
        id: ToolId::new(209),
        name: "Golden Hoe".to_owned(),
        range: 12,
        cost: dec!(100),
        tier: 5,
        kind: ToolKind::Hoe,
    }));
    seed_catalog(&store, catalog).await.unwrap();
    let (session, _) = open_with(Arc::clone(&store), &config_with_money(dec!(100))).await;

    let receipt = session.buy_tool(ToolId::new(209)).await.unwrap();
    assert_eq!(receipt.balance_after, Decimal::ZERO);
    let farm = session.snapshot().await;
    assert_eq!(farm.player.money, Decimal::ZERO);
    assert!(farm.owns_tool(ToolId::new(209)));
    assert_eq!(farm.player.selected_hoe, Some(ToolId::new(209)));

    let err = farm_error(session.buy_tool(ToolId::new(209)).await);
    assert_eq!(
        err,
        FarmError::AlreadyOwned {
            name: "Golden Hoe".to_owned()
        }
    );
    assert_eq!(session.snapshot().await.player.money, Decimal::ZERO);
}

#[tokio::test]
async fn unaffordable_purchase_changes_nothing() {
    let (session, store, _) = open(dec!(40)).await;
    let writes = store.write_count().await;
    let err = farm_error(session.buy_tool(ToolId::new(202)).await);
    assert_eq!(
        err,
        FarmError::InsufficientFunds {
            required: dec!(50),
            available: dec!(40),
        }
    );
    let farm = session.snapshot().await;
    assert_eq!(farm.player.money, dec!(40));
    assert!(!farm.owns_tool(ToolId::new(202)));
    assert_eq!(store.write_count().await, writes);
}

// ---------------------------------------------------------------------------
// Scenario D: water refill clamps at capacity
// ---------------------------------------------------------------------------

#[tokio::test]
async fn scenario_d_water_refill_is_clamped() {
    let store = Arc::new(MemoryStore::new());
    let mut catalog = default_catalog();
    for record in &mut catalog {
        if let Record::ToolDefinition(tool) = record {
            if tool.id == ToolId::new(205) {
                tool.kind = ToolKind::WateringCan(WateringCanStats {
                    max_capacity: dec!(50),
                    refill_rate: dec!(2),
                });
            }
        }
    }
    seed_catalog(&store, catalog).await.unwrap();
    let mut player = PlayerState::new(dec!(100), t0());
    player.current_water = dec!(40);
    player.max_water = dec!(50);
    player.refill_rate = dec!(2);
    player.selected_watering_can = Some(ToolId::new(205));
    store.upsert(Record::Player(player)).await.unwrap();

    let (session, clock) = open_with(Arc::clone(&store), &HomesteadConfig::default()).await;
    clock.advance(Duration::seconds(10));
    let report = session.reconcile().await.unwrap();
    assert_eq!(report.water_gained, dec!(10));
    let farm = session.snapshot().await;
    assert_eq!(farm.player.current_water, dec!(50));

    let view = session.view().await.unwrap();
    assert_eq!(view.water.status, "50/50");
}

#[tokio::test]
async fn better_can_raises_capacity_without_rescaling() {
    let (session, _, _) = open(dec!(1000)).await;
    session.buy_seed(CARROT_SEEDS, 1).await.unwrap();
    session.till(0).await.unwrap();
    session.plant(0, CARROT_SEEDS).await.unwrap();
    session.water(0).await.unwrap();
    assert_eq!(session.snapshot().await.player.current_water, dec!(49));

    session.buy_tool(ToolId::new(206)).await.unwrap();
    let player = session.snapshot().await.player;
    assert_eq!(player.selected_watering_can, Some(ToolId::new(206)));
    assert_eq!(player.max_water, dec!(100));
    assert_eq!(player.refill_rate, dec!(2));
    assert_eq!(player.current_water, dec!(49));
}

// ---------------------------------------------------------------------------
// Reconciliation properties
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reconcile_is_idempotent_at_fixed_time() {
    let (session, store, clock) = open(dec!(100)).await;
    session.buy_seed(CARROT_SEEDS, 1).await.unwrap();
    session.till(0).await.unwrap();
    session.plant(0, CARROT_SEEDS).await.unwrap();
    session.water(0).await.unwrap();
    clock.advance(Duration::seconds(3));

    let first = session.reconcile().await.unwrap();
    let state = session.snapshot().await;
    let writes = store.write_count().await;

    let second = session.reconcile().await.unwrap();
    assert_eq!(session.snapshot().await, state);
    assert_eq!(store.write_count().await, writes);
    assert_eq!(first.plots_ready, second.plots_ready);
    assert_eq!(second.water_gained, Decimal::ZERO);
}

#[tokio::test]
async fn growth_never_regresses() {
    let (session, _, clock) = open(dec!(100)).await;
    session.buy_seed(CARROT_SEEDS, 1).await.unwrap();
    session.till(0).await.unwrap();
    session.plant(0, CARROT_SEEDS).await.unwrap();
    session.water(0).await.unwrap();

    let mut last = Decimal::ZERO;
    for step in [1, 2, 2, 4, 9] {
        clock.set(t0() + Duration::seconds(step));
        session.reconcile().await.unwrap();
        let progress = session.snapshot().await.plots.get(&0).unwrap().growth_progress;
        assert!(progress >= last);
        assert!(progress <= Decimal::ONE);
        last = progress;
    }

    clock.set(t0() + Duration::seconds(1));
    session.reconcile().await.unwrap();
    let progress = session.snapshot().await.plots.get(&0).unwrap().growth_progress;
    assert_eq!(progress, Decimal::ONE);
}

// ---------------------------------------------------------------------------
// Economy properties
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sales_and_purchases_conserve_money() {
    let (session, _, clock) = open(dec!(1000)).await;
    session.buy_seed(CARROT_SEEDS, 2).await.unwrap();
    session.buy_plot().await.unwrap();
    for plot in [0, 1] {
        session.till(plot).await.unwrap();
        session.plant(plot, CARROT_SEEDS).await.unwrap();
        session.water(plot).await.unwrap();
    }
    clock.advance(Duration::seconds(5));
    session.harvest(0).await.unwrap();
    session.harvest(1).await.unwrap();

    let one = session.sell_item(StockKey::Produce(CARROT)).await.unwrap();
    assert_eq!(one.amount, dec!(5));
    let rest = session.sell_all_produce().await.unwrap();
    assert_eq!(rest.quantity, 1);

    let farm = session.snapshot().await;
    let journal = session.journal().await;
    let (credits, debits) = journal.totals().unwrap();
    assert_eq!(
        journal
            .opening_balance()
            .checked_add(credits)
            .and_then(|m| m.checked_sub(debits)),
        Some(farm.player.money)
    );
    assert_eq!(farm.player.money, dec!(856));
    assert!(session.verify_balance().await.is_balanced());
}

#[tokio::test]
async fn seeds_are_never_sold() {
    let (session, _, _) = open(dec!(100)).await;
    session.buy_seed(CARROT_SEEDS, 3).await.unwrap();
    let err = farm_error(session.sell_item(StockKey::Seed(CARROT_SEEDS)).await);
    assert_eq!(
        err,
        FarmError::InvalidTransition(TransitionBlocked::SeedsNotSellable)
    );
    let receipt = session.sell_all_produce().await.unwrap();
    assert_eq!(receipt.amount, Decimal::ZERO);
    assert!(receipt.entry.is_none());
    let farm = session.snapshot().await;
    assert_eq!(farm.inventory.quantity(StockKey::Seed(CARROT_SEEDS)), 3);
}

#[tokio::test]
async fn balance_never_goes_negative() {
    let (session, _, _) = open(dec!(20)).await;
    let mut bought = 0_u32;
    loop {
        match session.buy_seed(SeedId::new(104), 1).await {
            Ok(_) => bought = bought.saturating_add(1),
            Err(SessionError::Farm(FarmError::InsufficientFunds { .. })) => break,
            Err(other) => panic!("unexpected error: {other}"),
        }
        assert!(!session.snapshot().await.player.money.is_sign_negative());
    }
    assert_eq!(bought, 2);
    assert_eq!(session.snapshot().await.player.money, dec!(4));
}

#[tokio::test]
async fn plot_prices_rise_with_each_plot() {
    let (session, _, _) = open(dec!(1000)).await;
    let (first, receipt) = session.buy_plot().await.unwrap();
    assert_eq!((first, receipt.amount), (1, dec!(150)));
    let (second, receipt) = session.buy_plot().await.unwrap();
    assert_eq!((second, receipt.amount), (2, dec!(200)));
    let view = session.view().await.unwrap();
    assert_eq!(view.plots.len(), 3);
    assert_eq!(view.next_plot_price, dec!(250));
}
