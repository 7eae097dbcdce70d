//! Persistence records.
//!
//! A [`Record`] wraps any entity covered by the store contract so a single
//! store interface can serve every table. A [`Mutation`] is one step of an
//! atomic write batch.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::RecordKind;
use crate::ids::{InventoryRowId, OwnedMachineId, OwnedToolId, PlotId};
use crate::structs::{
    InventoryItem, ItemDefinition, MachineDefinition, OwnedMachine, OwnedTool, PlayerState, Plot,
    SeedDefinition, ToolDefinition,
};

/// Any persisted entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", content = "row")]
#[ts(export, export_to = "bindings/")]
pub enum Record {
    /// The singleton player row.
    Player(PlayerState),
    /// A land plot.
    Plot(Plot),
    /// An inventory stack.
    InventoryItem(InventoryItem),
    /// An owned tool.
    OwnedTool(OwnedTool),
    /// An owned machine.
    OwnedMachine(OwnedMachine),
    /// Catalog item.
    ItemDefinition(ItemDefinition),
    /// Catalog seed.
    SeedDefinition(SeedDefinition),
    /// Catalog tool.
    ToolDefinition(ToolDefinition),
    /// Catalog machine.
    MachineDefinition(MachineDefinition),
}

impl Record {
    /// The kind of entity wrapped.
    pub const fn kind(&self) -> RecordKind {
        match self {
            Self::Player(_) => RecordKind::Player,
            Self::Plot(_) => RecordKind::Plot,
            Self::InventoryItem(_) => RecordKind::InventoryItem,
            Self::OwnedTool(_) => RecordKind::OwnedTool,
            Self::OwnedMachine(_) => RecordKind::OwnedMachine,
            Self::ItemDefinition(_) => RecordKind::ItemDefinition,
            Self::SeedDefinition(_) => RecordKind::SeedDefinition,
            Self::ToolDefinition(_) => RecordKind::ToolDefinition,
            Self::MachineDefinition(_) => RecordKind::MachineDefinition,
        }
    }

    /// The raw primary key. `0` means the store has not assigned one yet.
    pub const fn id(&self) -> i64 {
        match self {
            Self::Player(_) => PlayerState::ROW_ID,
            Self::Plot(p) => p.id.get(),
            Self::InventoryItem(i) => i.id.get(),
            Self::OwnedTool(t) => t.id.get(),
            Self::OwnedMachine(m) => m.id.get(),
            Self::ItemDefinition(d) => d.id.get(),
            Self::SeedDefinition(d) => d.id.get(),
            Self::ToolDefinition(d) => d.id.get(),
            Self::MachineDefinition(d) => d.id.get(),
        }
    }

    /// Return a copy of this record carrying the given primary key.
    ///
    /// Catalog and player keys are fixed; only store-assigned keys change.
    #[must_use]
    pub fn with_id(mut self, id: i64) -> Self {
        match &mut self {
            Self::Plot(p) => p.id = PlotId::new(id),
            Self::InventoryItem(i) => i.id = InventoryRowId::new(id),
            Self::OwnedTool(t) => t.id = OwnedToolId::new(id),
            Self::OwnedMachine(m) => m.id = OwnedMachineId::new(id),
            Self::Player(_)
            | Self::ItemDefinition(_)
            | Self::SeedDefinition(_)
            | Self::ToolDefinition(_)
            | Self::MachineDefinition(_) => {}
        }
        self
    }
}

/// One write in an atomic batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Mutation {
    /// Insert (key unset) or update (key set) a record.
    Upsert(Record),
    /// Remove a record.
    Delete {
        /// Table of the record.
        kind: RecordKind,
        /// Primary key of the record.
        id: i64,
    },
}

impl Mutation {
    /// The table this mutation touches.
    pub const fn kind(&self) -> RecordKind {
        match self {
            Self::Upsert(record) => record.kind(),
            Self::Delete { kind, .. } => *kind,
        }
    }
}
