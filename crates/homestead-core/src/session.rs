//! The [`Homestead`] session: one owner of a player's farm.
//!
//! Every command and every reconciliation runs under one lock and follows
//! the same steps:
//!
//! 1. Clone the live [`FarmState`] into a draft.
//! 2. Reconcile the draft at the clock's `now`.
//! 3. Run the command against the draft.
//! 4. Diff the draft against the live state and write the batch
//!    atomically.
//! 5. Swap the draft in.
//!
//! A rejected command or a failed write drops the draft, so the live
//! state and the store always agree.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use homestead_farm::{
    Catalog, FarmError, FarmState, FarmView, PlotPricing, Receipt, ReconcileReport, economy,
    machine, plot, views,
};
use homestead_ledger::{BalanceCheck, Journal};
use homestead_types::{
    ItemId, ItemStack, JournalEntry, MachineId, Mutation, OwnedMachine, Plot, RecordKind, SeedId,
    StockKey, ToolId,
};

use crate::clock::Clock;
use crate::config::HomesteadConfig;
use crate::seed;
use crate::store::{Store, StoreError};

/// Errors returned by session commands.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The farm rules rejected the command.
    #[error("farm error: {0}")]
    Farm(#[from] FarmError),

    /// The store failed. Nothing was changed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl SessionError {
    /// The farm rejection, if that is what this is.
    pub const fn as_farm(&self) -> Option<&FarmError> {
        match self {
            Self::Farm(err) => Some(err),
            Self::Store(_) => None,
        }
    }
}

/// Live state guarded by the session lock.
#[derive(Debug)]
struct Live {
    farm: FarmState,
    journal: Journal,
}

type Outcome<T> = Result<(T, Option<JournalEntry>), FarmError>;

fn plain<T>(value: T) -> (T, Option<JournalEntry>) {
    (value, None)
}

fn journaled(receipt: Receipt) -> (Receipt, Option<JournalEntry>) {
    let entry = receipt.entry.clone();
    (receipt, entry)
}

fn plot_in(plots: &mut BTreeMap<u32, Plot>, plot_number: u32) -> Result<&mut Plot, FarmError> {
    plots.get_mut(&plot_number).ok_or(FarmError::NotFound {
        what: "plot",
        id: i64::from(plot_number),
    })
}

fn machine_in(
    machines: &mut BTreeMap<MachineId, OwnedMachine>,
    id: MachineId,
) -> Result<&mut OwnedMachine, FarmError> {
    machines.get_mut(&id).ok_or(FarmError::NotFound {
        what: "owned machine",
        id: id.get(),
    })
}

/// A player's farm, its store and its clock.
#[derive(Debug)]
pub struct Homestead<S, C> {
    store: S,
    clock: C,
    catalog: Catalog,
    pricing: PlotPricing,
    live: Mutex<Live>,
}

impl<S: Store, C: Clock> Homestead<S, C> {
    /// Open the farm held in `store`.
    ///
    /// Seeds empty catalog tables, then loads the player's rows. On the
    /// first run a starting farm is created and written.
    pub async fn open(store: S, clock: C, config: &HomesteadConfig) -> Result<Self, SessionError> {
        seed::seed_catalog(&store, seed::default_catalog()).await?;

        let mut catalog_rows = Vec::new();
        let mut farm_rows = Vec::new();
        for kind in RecordKind::ALL {
            let rows = store.all(kind).await?;
            if kind.is_catalog() {
                catalog_rows.extend(rows);
            } else {
                farm_rows.extend(rows);
            }
        }
        let catalog = Catalog::from_records(catalog_rows);

        let farm = if let Some(farm) = FarmState::from_records(farm_rows) {
            tracing::info!(
                money = %farm.player.money,
                plots = farm.plot_count(),
                "farm loaded"
            );
            farm
        } else {
            let mut fresh = seed::starting_state(&config.player, &catalog, clock.now())?;
            let batch: Vec<Mutation> = fresh
                .to_records()
                .into_iter()
                .map(Mutation::Upsert)
                .collect();
            let ids = store.apply(batch.clone()).await?;
            fresh.assign_ids(&batch, &ids);
            tracing::info!(
                money = %fresh.player.money,
                plots = fresh.plot_count(),
                "new farm created"
            );
            fresh
        };

        let journal = Journal::new(farm.player.money);
        Ok(Self {
            store,
            clock,
            catalog,
            pricing: config.plot_pricing(),
            live: Mutex::new(Live { farm, journal }),
        })
    }

    /// The catalog loaded at open.
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Plot pricing in effect.
    pub const fn pricing(&self) -> PlotPricing {
        self.pricing
    }

    /// The store behind this session.
    pub const fn store(&self) -> &S {
        &self.store
    }

    // -----------------------------------------------------------------------
    // Command plumbing
    // -----------------------------------------------------------------------

    async fn run<T, F>(&self, command: &'static str, f: F) -> Result<T, SessionError>
    where
        T: Send,
        F: FnOnce(&mut FarmState, &Catalog, DateTime<Utc>) -> Outcome<T> + Send,
    {
        let mut live = self.live.lock().await;
        let (output, _) = self.run_locked(&mut live, command, f).await?;
        Ok(output)
    }

    async fn run_locked<T, F>(
        &self,
        live: &mut Live,
        command: &'static str,
        f: F,
    ) -> Result<(T, ReconcileReport), SessionError>
    where
        T: Send,
        F: FnOnce(&mut FarmState, &Catalog, DateTime<Utc>) -> Outcome<T> + Send,
    {
        let now = self.clock.now();
        let mut draft = live.farm.clone();
        let report = draft.reconcile(&self.catalog, now);
        let (output, entry) = f(&mut draft, &self.catalog, now).inspect_err(|err| {
            if matches!(err, FarmError::NotFound { .. }) {
                tracing::warn!(command, error = %err, "command target not found");
            } else {
                tracing::debug!(command, error = %err, "command rejected");
            }
        })?;

        let batch = draft.diff(&live.farm);
        if !batch.is_empty() {
            let ids = self.store.apply(batch.clone()).await.inspect_err(|err| {
                tracing::warn!(command, error = %err, "write rejected, state unchanged");
            })?;
            draft.assign_ids(&batch, &ids);
            tracing::debug!(command, writes = batch.len(), "committed");
        }

        live.farm = draft;
        if let Some(entry) = entry {
            live.journal.append(entry);
        }
        Ok((output, report))
    }

    // -----------------------------------------------------------------------
    // Reconciliation and views
    // -----------------------------------------------------------------------

    /// Bring water, crops and machines up to date and persist the result.
    ///
    /// Idempotent: a second call at the same instant writes nothing.
    pub async fn reconcile(&self) -> Result<ReconcileReport, SessionError> {
        let mut live = self.live.lock().await;
        let ((), report) = self
            .run_locked(&mut live, "reconcile", |_, _, _| Ok(plain(())))
            .await?;
        Ok(report)
    }

    /// Reconcile, then build the farm view at the same instant.
    pub async fn view(&self) -> Result<FarmView, SessionError> {
        let pricing = self.pricing;
        self.run("view", move |farm, catalog, now| {
            views::farm_view(farm, catalog, &pricing, now).map(plain)
        })
        .await
    }

    /// A copy of the live farm state.
    pub async fn snapshot(&self) -> FarmState {
        self.live.lock().await.farm.clone()
    }

    /// A copy of this session's money journal.
    pub async fn journal(&self) -> Journal {
        self.live.lock().await.journal.clone()
    }

    /// Check the journal against the current balance.
    pub async fn verify_balance(&self) -> BalanceCheck {
        let live = self.live.lock().await;
        live.journal.verify(live.farm.player.money)
    }

    // -----------------------------------------------------------------------
    // Plots
    // -----------------------------------------------------------------------

    /// Till an empty plot.
    pub async fn till(&self, plot_number: u32) -> Result<(), SessionError> {
        self.run("till", move |farm, _, _| {
            plot::till(plot_in(&mut farm.plots, plot_number)?)?;
            Ok(plain(()))
        })
        .await
    }

    /// Plant one seed on a tilled plot.
    pub async fn plant(&self, plot_number: u32, seed: SeedId) -> Result<(), SessionError> {
        self.run("plant", move |farm, catalog, now| {
            let def = catalog.seed(seed)?;
            let target = plot_in(&mut farm.plots, plot_number)?;
            plot::plant(target, &mut farm.inventory, def, now)?;
            Ok(plain(()))
        })
        .await
    }

    /// Water a planted plot, using one unit of water.
    pub async fn water(&self, plot_number: u32) -> Result<(), SessionError> {
        self.run("water", move |farm, _, _| {
            let target = plot_in(&mut farm.plots, plot_number)?;
            plot::water(target, &mut farm.player)?;
            Ok(plain(()))
        })
        .await
    }

    /// Harvest a ripe crop. Returns the item gained.
    pub async fn harvest(&self, plot_number: u32) -> Result<ItemId, SessionError> {
        self.run("harvest", move |farm, catalog, now| {
            let target = plot_in(&mut farm.plots, plot_number)?;
            plot::harvest(target, &mut farm.inventory, catalog, now).map(plain)
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Machines
    // -----------------------------------------------------------------------

    /// Start a job on an owned, idle machine.
    pub async fn start_machine(&self, id: MachineId) -> Result<(), SessionError> {
        self.run("start_machine", move |farm, catalog, now| {
            let def = catalog.machine(id)?;
            let owned = machine_in(&mut farm.machines, id)?;
            machine::start(owned, def, &mut farm.inventory, catalog, now)?;
            Ok(plain(()))
        })
        .await
    }

    /// Collect a finished job. Returns the stack collected.
    pub async fn collect(&self, id: MachineId) -> Result<ItemStack, SessionError> {
        self.run("collect", move |farm, catalog, now| {
            let def = catalog.machine(id)?;
            let owned = machine_in(&mut farm.machines, id)?;
            machine::collect(owned, def, &mut farm.inventory, now).map(plain)
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Shop
    // -----------------------------------------------------------------------

    /// Buy `quantity` seeds.
    pub async fn buy_seed(&self, seed: SeedId, quantity: u32) -> Result<Receipt, SessionError> {
        self.run("buy_seed", move |farm, catalog, now| {
            economy::buy_seed(farm, catalog, seed, quantity, now).map(journaled)
        })
        .await
    }

    /// Buy a tool, equipping it when it is an upgrade.
    pub async fn buy_tool(&self, tool: ToolId) -> Result<Receipt, SessionError> {
        self.run("buy_tool", move |farm, catalog, now| {
            economy::buy_tool(farm, catalog, tool, now).map(journaled)
        })
        .await
    }

    /// Buy a machine.
    pub async fn buy_machine(&self, id: MachineId) -> Result<Receipt, SessionError> {
        self.run("buy_machine", move |farm, catalog, now| {
            economy::buy_machine(farm, catalog, id, now).map(journaled)
        })
        .await
    }

    /// Buy the next plot. Returns its ordinal and the receipt.
    pub async fn buy_plot(&self) -> Result<(u32, Receipt), SessionError> {
        let pricing = self.pricing;
        self.run("buy_plot", move |farm, _, now| {
            let (number, receipt) = economy::buy_plot(farm, &pricing, now)?;
            let entry = receipt.entry.clone();
            Ok(((number, receipt), entry))
        })
        .await
    }

    /// Equip an owned tool.
    pub async fn equip_tool(&self, tool: ToolId) -> Result<(), SessionError> {
        self.run("equip_tool", move |farm, catalog, _| {
            economy::equip_tool(farm, catalog, tool).map(plain)
        })
        .await
    }

    /// Sell one unit of produce.
    pub async fn sell_item(&self, key: StockKey) -> Result<Receipt, SessionError> {
        self.run("sell_item", move |farm, catalog, now| {
            economy::sell_item(farm, catalog, key, now).map(journaled)
        })
        .await
    }

    /// Sell every produce row.
    pub async fn sell_all_produce(&self) -> Result<Receipt, SessionError> {
        self.run("sell_all_produce", |farm, catalog, now| {
            economy::sell_all_produce(farm, catalog, now).map(journaled)
        })
        .await
    }
}
