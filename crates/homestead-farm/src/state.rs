//! The player's whole mutable state and its persistence diff.
//!
//! Commands run against a clone of [`FarmState`]. When the command
//! succeeds, [`FarmState::diff`] turns the difference into store
//! [`Mutation`]s, the batch is written atomically and the clone replaces
//! the live state. A failed command or write discards the clone, so the
//! live state never holds a partial change.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use homestead_ledger::water;
use homestead_types::{
    InventoryRowId, MachineId, MachinePhase, Mutation, OwnedMachine, OwnedMachineId, OwnedTool,
    OwnedToolId, PlayerState, Plot, PlotId, PlotPhase, Record, RecordKind, ToolId,
};

use crate::catalog::Catalog;
use crate::error::FarmError;
use crate::inventory::Inventory;
use crate::report::{CorrectionTarget, ReconcileReport};
use crate::{machine, plot};

/// Everything a player owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FarmState {
    /// Money, water and equipped tools.
    pub player: PlayerState,
    /// Plots keyed by ordinal.
    pub plots: BTreeMap<u32, Plot>,
    /// Seed and produce stock.
    pub inventory: Inventory,
    /// Owned tools keyed by definition.
    pub tools: BTreeMap<ToolId, OwnedTool>,
    /// Owned machines keyed by definition.
    pub machines: BTreeMap<MachineId, OwnedMachine>,
}

impl FarmState {
    /// A state with the given player and nothing else.
    pub const fn new(player: PlayerState) -> Self {
        Self {
            player,
            plots: BTreeMap::new(),
            inventory: Inventory::new(),
            tools: BTreeMap::new(),
            machines: BTreeMap::new(),
        }
    }

    /// Assemble a state from stored records. Catalog records are ignored.
    ///
    /// Returns `None` when no player record is present.
    pub fn from_records<I>(records: I) -> Option<Self>
    where
        I: IntoIterator<Item = Record>,
    {
        let mut player = None;
        let mut plots = BTreeMap::new();
        let mut rows = Vec::new();
        let mut tools = BTreeMap::new();
        let mut machines = BTreeMap::new();
        for record in records {
            match record {
                Record::Player(p) => player = Some(p),
                Record::Plot(p) => {
                    plots.insert(p.plot_number, p);
                }
                Record::InventoryItem(i) => rows.push(i),
                Record::OwnedTool(t) => {
                    tools.insert(t.tool, t);
                }
                Record::OwnedMachine(m) => {
                    machines.insert(m.machine, m);
                }
                Record::ItemDefinition(_)
                | Record::SeedDefinition(_)
                | Record::ToolDefinition(_)
                | Record::MachineDefinition(_) => {}
            }
        }
        Some(Self {
            player: player?,
            plots,
            inventory: Inventory::from_rows(rows),
            tools,
            machines,
        })
    }

    /// Every row as a store record, player first.
    pub fn to_records(&self) -> Vec<Record> {
        core::iter::once(Record::Player(self.player.clone()))
            .chain(self.plots.values().cloned().map(Record::Plot))
            .chain(self.inventory.rows().cloned().map(Record::InventoryItem))
            .chain(self.tools.values().cloned().map(Record::OwnedTool))
            .chain(self.machines.values().cloned().map(Record::OwnedMachine))
            .collect()
    }

    /// The plot with the given ordinal.
    pub fn plot(&self, plot_number: u32) -> Result<&Plot, FarmError> {
        self.plots.get(&plot_number).ok_or(FarmError::NotFound {
            what: "plot",
            id: i64::from(plot_number),
        })
    }

    /// Mutable access to the plot with the given ordinal.
    pub fn plot_mut(&mut self, plot_number: u32) -> Result<&mut Plot, FarmError> {
        self.plots.get_mut(&plot_number).ok_or(FarmError::NotFound {
            what: "plot",
            id: i64::from(plot_number),
        })
    }

    /// Mutable access to an owned machine.
    pub fn machine_mut(&mut self, id: MachineId) -> Result<&mut OwnedMachine, FarmError> {
        self.machines.get_mut(&id).ok_or(FarmError::NotFound {
            what: "owned machine",
            id: id.get(),
        })
    }

    /// Whether the given tool is owned.
    pub fn owns_tool(&self, id: ToolId) -> bool {
        self.tools.contains_key(&id)
    }

    /// Whether the given machine is owned.
    pub fn owns_machine(&self, id: MachineId) -> bool {
        self.machines.contains_key(&id)
    }

    /// Ordinal the next bought plot receives.
    pub fn next_plot_number(&self) -> u32 {
        self.plots
            .keys()
            .next_back()
            .map_or(0, |last| last.saturating_add(1))
    }

    /// Number of plots owned.
    pub fn plot_count(&self) -> u32 {
        u32::try_from(self.plots.len()).unwrap_or(u32::MAX)
    }

    /// Bring water, crops and machines up to date at `now`.
    ///
    /// A plot or machine whose catalog definition is missing is left as
    /// stored and listed in [`ReconcileReport::unresolved`]. Idempotent at a
    /// fixed `now`.
    pub fn reconcile(&mut self, catalog: &Catalog, now: DateTime<Utc>) -> ReconcileReport {
        let mut report = ReconcileReport {
            water_gained: water::refill_water(&mut self.player, now),
            ..ReconcileReport::default()
        };

        for p in self.plots.values_mut() {
            match plot::reconcile(p, catalog, now) {
                Ok(correction) => report.corrections.extend(correction),
                Err(err) => {
                    tracing::warn!(
                        plot_number = p.plot_number,
                        error = %err,
                        "plot skipped during reconcile"
                    );
                    report.unresolved.push(CorrectionTarget::Plot {
                        plot_number: p.plot_number,
                    });
                    continue;
                }
            }
            if plot::phase(p) == PlotPhase::ReadyToHarvest {
                report.plots_ready = report.plots_ready.saturating_add(1);
            }
        }

        for m in self.machines.values_mut() {
            if let Some(correction) = machine::reconcile(m) {
                report.corrections.push(correction);
            }
            let def = match catalog.machine(m.machine) {
                Ok(def) => def,
                Err(err) => {
                    tracing::warn!(
                        machine = %m.machine,
                        error = %err,
                        "machine skipped during reconcile"
                    );
                    report.unresolved.push(CorrectionTarget::Machine { machine: m.machine });
                    continue;
                }
            };
            if machine::phase(m, def, now) == MachinePhase::ReadyToCollect {
                report.machines_ready = report.machines_ready.saturating_add(1);
            }
        }

        tracing::debug!(
            water_gained = %report.water_gained,
            plots_ready = report.plots_ready,
            machines_ready = report.machines_ready,
            corrections = report.corrections.len(),
            unresolved = report.unresolved.len(),
            "reconciled"
        );
        report
    }

    /// The store writes that turn `before` into `self`.
    ///
    /// Changed or new rows become upserts (new rows carry an unset key),
    /// rows that vanished become deletes. An inventory row removed and
    /// re-created inside one command keeps its stored key.
    pub fn diff(&self, before: &Self) -> Vec<Mutation> {
        let mut batch = Vec::new();

        if self.player != before.player {
            batch.push(Mutation::Upsert(Record::Player(self.player.clone())));
        }

        for (number, p) in &self.plots {
            if before.plots.get(number) != Some(p) {
                batch.push(Mutation::Upsert(Record::Plot(p.clone())));
            }
        }

        for row in self.inventory.rows() {
            let old = before.inventory.row(row.key);
            if old == Some(row) {
                continue;
            }
            let mut row = row.clone();
            if row.id.is_unset() {
                if let Some(old) = old {
                    row.id = old.id;
                }
            }
            batch.push(Mutation::Upsert(Record::InventoryItem(row)));
        }
        for old in before.inventory.rows() {
            if self.inventory.row(old.key).is_none() && !old.id.is_unset() {
                batch.push(Mutation::Delete {
                    kind: RecordKind::InventoryItem,
                    id: old.id.get(),
                });
            }
        }

        for (id, tool) in &self.tools {
            if before.tools.get(id) != Some(tool) {
                batch.push(Mutation::Upsert(Record::OwnedTool(tool.clone())));
            }
        }

        for (id, m) in &self.machines {
            if before.machines.get(id) != Some(m) {
                batch.push(Mutation::Upsert(Record::OwnedMachine(m.clone())));
            }
        }

        batch
    }

    /// Copy store-assigned keys back onto the rows they were written from.
    ///
    /// `ids` holds one effective key per mutation, in batch order.
    pub fn assign_ids(&mut self, batch: &[Mutation], ids: &[i64]) {
        for (mutation, &id) in batch.iter().zip(ids) {
            let Mutation::Upsert(record) = mutation else {
                continue;
            };
            match record {
                Record::Plot(p) => {
                    if let Some(live) = self.plots.get_mut(&p.plot_number) {
                        live.id = PlotId::new(id);
                    }
                }
                Record::InventoryItem(row) => {
                    if let Some(live) = self.inventory.row_mut(row.key) {
                        live.id = InventoryRowId::new(id);
                    }
                }
                Record::OwnedTool(t) => {
                    if let Some(live) = self.tools.get_mut(&t.tool) {
                        live.id = OwnedToolId::new(id);
                    }
                }
                Record::OwnedMachine(m) => {
                    if let Some(live) = self.machines.get_mut(&m.machine) {
                        live.id = OwnedMachineId::new(id);
                    }
                }
                Record::Player(_)
                | Record::ItemDefinition(_)
                | Record::SeedDefinition(_)
                | Record::ToolDefinition(_)
                | Record::MachineDefinition(_) => {}
            }
        }
    }
}
