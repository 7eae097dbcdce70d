//! Enumeration types for the Homestead simulation.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Tool category
// ---------------------------------------------------------------------------

/// The closed set of tool categories.
///
/// Stored as text (`"Hoe"`, `"WateringCan"`). Any other string is rejected
/// when the row is loaded, so an invalid category can never reach the
/// simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ToolCategory {
    /// Tills plots.
    Hoe,
    /// Waters planted plots and sets the player's water capacity.
    WateringCan,
}

impl ToolCategory {
    /// The canonical stored name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hoe => "Hoe",
            Self::WateringCan => "WateringCan",
        }
    }
}

impl core::fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored tool category string did not name a known category.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tool category: {0:?}")]
pub struct UnknownToolCategory(pub String);

impl FromStr for ToolCategory {
    type Err = UnknownToolCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Hoe" => Ok(Self::Hoe),
            "WateringCan" => Ok(Self::WateringCan),
            other => Err(UnknownToolCategory(other.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// Derived lifecycle phases
// ---------------------------------------------------------------------------

/// Lifecycle phase of a plot, derived from its stored fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum PlotPhase {
    /// Not tilled, nothing planted.
    Empty,
    /// Tilled and ready for a seed.
    Tilled,
    /// A seed is planted but has not been watered.
    NeedsWater,
    /// Watered and growing.
    Growing,
    /// Fully grown and waiting to be harvested.
    ReadyToHarvest,
}

/// Lifecycle phase of an owned machine, derived from its stored fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum MachinePhase {
    /// No job loaded.
    Idle,
    /// A job is running.
    Processing,
    /// The job is complete and the output can be collected.
    ReadyToCollect,
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Every entity type covered by the persistence contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum RecordKind {
    /// The singleton player row.
    Player,
    /// A land plot.
    Plot,
    /// An inventory stack.
    InventoryItem,
    /// An owned tool.
    OwnedTool,
    /// An owned machine.
    OwnedMachine,
    /// Catalog: item definition.
    ItemDefinition,
    /// Catalog: seed definition.
    SeedDefinition,
    /// Catalog: tool definition.
    ToolDefinition,
    /// Catalog: machine definition.
    MachineDefinition,
}

impl RecordKind {
    /// All record kinds, catalog first.
    pub const ALL: [Self; 9] = [
        Self::ItemDefinition,
        Self::SeedDefinition,
        Self::ToolDefinition,
        Self::MachineDefinition,
        Self::Player,
        Self::Plot,
        Self::InventoryItem,
        Self::OwnedTool,
        Self::OwnedMachine,
    ];

    /// Table name used by SQL-backed stores.
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::Player => "player_state",
            Self::Plot => "plots",
            Self::InventoryItem => "inventory_items",
            Self::OwnedTool => "owned_tools",
            Self::OwnedMachine => "owned_machines",
            Self::ItemDefinition => "item_definitions",
            Self::SeedDefinition => "seed_definitions",
            Self::ToolDefinition => "tool_definitions",
            Self::MachineDefinition => "machine_definitions",
        }
    }

    /// Whether this kind is immutable catalog data.
    pub const fn is_catalog(self) -> bool {
        matches!(
            self,
            Self::ItemDefinition
                | Self::SeedDefinition
                | Self::ToolDefinition
                | Self::MachineDefinition
        )
    }
}

// ---------------------------------------------------------------------------
// Journal
// ---------------------------------------------------------------------------

/// Category of a money movement recorded in the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum JournalEntryType {
    /// Seeds bought from the shop (debit).
    SeedPurchase,
    /// Tool bought from the shop (debit).
    ToolPurchase,
    /// Machine bought from the shop (debit).
    MachinePurchase,
    /// Additional plot bought (debit).
    PlotPurchase,
    /// Produce sold (credit).
    Sale,
}

impl JournalEntryType {
    /// Whether entries of this type add money to the player.
    pub const fn is_credit(self) -> bool {
        matches!(self, Self::Sale)
    }
}
