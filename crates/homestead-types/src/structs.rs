//! Core entity structs for the Homestead simulation.
//!
//! Catalog definitions ([`ItemDefinition`], [`SeedDefinition`],
//! [`ToolDefinition`], [`MachineDefinition`]) are seeded once and are
//! read-only afterwards. Player rows ([`PlayerState`], [`Plot`],
//! [`InventoryItem`], [`OwnedTool`], [`OwnedMachine`]) are mutated by every
//! action and persisted immediately.
//!
//! All money and water quantities use [`Decimal`] -- no floating point.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{JournalEntryType, ToolCategory, UnknownToolCategory};
use crate::ids::{
    InventoryRowId, ItemId, JournalEntryId, MachineId, OwnedMachineId, OwnedToolId, PlotId,
    SeedId, ToolId,
};

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// A harvestable or processed good.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ItemDefinition {
    /// Catalog id.
    pub id: ItemId,
    /// Display name, e.g. "Carrot" or "Flour".
    pub name: String,
    /// Price paid per unit when sold.
    #[ts(as = "String")]
    pub base_sell_price: Decimal,
    /// Whether some machine accepts this item as input.
    pub can_be_processed: bool,
}

/// A plantable seed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SeedDefinition {
    /// Catalog id.
    pub id: SeedId,
    /// Display name, e.g. "Carrot Seeds".
    pub name: String,
    /// Shop price per seed.
    #[ts(as = "String")]
    pub cost: Decimal,
    /// Seconds from planting to harvestable, counted once watered.
    pub grow_time_secs: u32,
    /// The item one harvest yields.
    pub yields: ItemId,
}

/// Capacity and refill speed granted by a watering can.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WateringCanStats {
    /// Maximum water units held.
    #[ts(as = "String")]
    pub max_capacity: Decimal,
    /// Water units regained per second.
    #[ts(as = "String")]
    pub refill_rate: Decimal,
}

/// Category-specific data of a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ToolKind {
    /// A hoe.
    Hoe,
    /// A watering can with its capacity and refill rate.
    WateringCan(WateringCanStats),
}

impl ToolKind {
    /// The category this kind belongs to.
    pub const fn category(self) -> ToolCategory {
        match self {
            Self::Hoe => ToolCategory::Hoe,
            Self::WateringCan(_) => ToolCategory::WateringCan,
        }
    }
}

/// Errors raised when a stored tool row cannot be turned into a
/// [`ToolDefinition`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolRowError {
    /// The category column holds an unknown value.
    #[error(transparent)]
    Category(#[from] UnknownToolCategory),

    /// A watering can row lacks its capacity or refill rate.
    #[error("watering can {0} is missing capacity or refill rate")]
    MissingWaterStats(ToolId),
}

/// A purchasable tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ToolDefinition {
    /// Catalog id.
    pub id: ToolId,
    /// Display name, e.g. "Rusty Hoe".
    pub name: String,
    /// Area of effect (1 for 1x1, 3 for 3x3, ...).
    pub range: u32,
    /// Shop price.
    #[ts(as = "String")]
    pub cost: Decimal,
    /// Upgrade rank within the category. A higher tier replaces the
    /// equipped tool on purchase.
    pub tier: u32,
    /// Category and category-specific data.
    pub kind: ToolKind,
}

impl ToolDefinition {
    /// The tool's category.
    pub const fn category(&self) -> ToolCategory {
        self.kind.category()
    }

    /// Build a definition from its flat stored columns, validating the
    /// category text and the watering-can columns.
    #[allow(clippy::too_many_arguments)]
    pub fn from_columns(
        id: ToolId,
        name: String,
        category: &str,
        range: u32,
        cost: Decimal,
        tier: u32,
        max_capacity: Option<Decimal>,
        refill_rate: Option<Decimal>,
    ) -> Result<Self, ToolRowError> {
        let kind = match category.parse::<ToolCategory>()? {
            ToolCategory::Hoe => ToolKind::Hoe,
            ToolCategory::WateringCan => match (max_capacity, refill_rate) {
                (Some(max_capacity), Some(refill_rate)) => {
                    ToolKind::WateringCan(WateringCanStats {
                        max_capacity,
                        refill_rate,
                    })
                }
                _ => return Err(ToolRowError::MissingWaterStats(id)),
            },
        };
        Ok(Self {
            id,
            name,
            range,
            cost,
            tier,
            kind,
        })
    }

    /// Watering-can stats, if this tool is a watering can.
    pub const fn water_stats(&self) -> Option<WateringCanStats> {
        match self.kind {
            ToolKind::WateringCan(stats) => Some(stats),
            ToolKind::Hoe => None,
        }
    }
}

/// A quantity of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ItemStack {
    /// The item.
    pub item: ItemId,
    /// How many units.
    pub quantity: u32,
}

/// A purchasable crafting machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MachineDefinition {
    /// Catalog id.
    pub id: MachineId,
    /// Display name, e.g. "Mill".
    pub name: String,
    /// Shop price.
    #[ts(as = "String")]
    pub cost: Decimal,
    /// Seconds one job takes.
    pub processing_time_secs: u32,
    /// Items consumed when a job starts.
    pub input: ItemStack,
    /// Items produced when a job is collected.
    pub output: ItemStack,
}

// ---------------------------------------------------------------------------
// Player rows
// ---------------------------------------------------------------------------

/// The player's money, water and equipped tools.
///
/// There is exactly one row, keyed [`PlayerState::ROW_ID`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlayerState {
    /// Money balance, always rounded to two decimal places.
    #[ts(as = "String")]
    pub money: Decimal,
    /// Water units currently held.
    #[ts(as = "String")]
    pub current_water: Decimal,
    /// Water capacity of the equipped watering can.
    #[ts(as = "String")]
    pub max_water: Decimal,
    /// Water units regained per second.
    #[ts(as = "String")]
    pub refill_rate: Decimal,
    /// Equipped hoe.
    pub selected_hoe: Option<ToolId>,
    /// Equipped watering can.
    pub selected_watering_can: Option<ToolId>,
    /// Instant up to which water refill has been accounted for.
    pub last_observed_at: DateTime<Utc>,
}

impl PlayerState {
    /// Primary key of the singleton row.
    pub const ROW_ID: i64 = 1;

    /// A player with the given money, no water and nothing equipped.
    pub const fn new(money: Decimal, now: DateTime<Utc>) -> Self {
        Self {
            money,
            current_water: Decimal::ZERO,
            max_water: Decimal::ZERO,
            refill_rate: Decimal::ZERO,
            selected_hoe: None,
            selected_watering_can: None,
            last_observed_at: now,
        }
    }

    /// The equipped tool of the given category.
    pub const fn selected(&self, category: ToolCategory) -> Option<ToolId> {
        match category {
            ToolCategory::Hoe => self.selected_hoe,
            ToolCategory::WateringCan => self.selected_watering_can,
        }
    }
}

/// One tile of farmland.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Plot {
    /// Row key.
    pub id: PlotId,
    /// Stable ordinal in the grid, never reused.
    pub plot_number: u32,
    /// Tilled and waiting for a seed.
    pub tilled: bool,
    /// The planted seed, if any.
    pub planted_seed: Option<SeedId>,
    /// When the seed was planted. Growth is measured from here.
    pub planted_at: Option<DateTime<Utc>>,
    /// Whether the planted seed has been watered.
    pub watered: bool,
    /// Cached growth fraction in `[0, 1]`.
    #[ts(as = "String")]
    pub growth_progress: Decimal,
}

impl Plot {
    /// A fresh, empty plot.
    pub const fn new(plot_number: u32) -> Self {
        Self {
            id: PlotId::UNSET,
            plot_number,
            tilled: false,
            planted_seed: None,
            planted_at: None,
            watered: false,
            growth_progress: Decimal::ZERO,
        }
    }

    /// Clear every field back to the empty state, keeping identity.
    pub const fn clear(&mut self) {
        self.tilled = false;
        self.planted_seed = None;
        self.planted_at = None;
        self.watered = false;
        self.growth_progress = Decimal::ZERO;
    }

    /// Whether a seed is planted.
    pub const fn is_planted(&self) -> bool {
        self.planted_seed.is_some()
    }
}

/// Identity of an inventory stack: a seed or a produce item.
///
/// Seed ids and item ids live in separate catalogs, so the discriminant is
/// part of the key. Stored as `(definition_id, is_seed)`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(tag = "kind", content = "id")]
#[ts(export, export_to = "bindings/")]
pub enum StockKey {
    /// Seeds, usable for planting.
    Seed(SeedId),
    /// Harvested or processed goods, sellable.
    Produce(ItemId),
}

impl StockKey {
    /// Rebuild a key from its stored columns.
    pub const fn from_columns(definition_id: i64, is_seed: bool) -> Self {
        if is_seed {
            Self::Seed(SeedId::new(definition_id))
        } else {
            Self::Produce(ItemId::new(definition_id))
        }
    }

    /// The referenced definition id.
    pub const fn definition_id(self) -> i64 {
        match self {
            Self::Seed(id) => id.get(),
            Self::Produce(id) => id.get(),
        }
    }

    /// Whether this key refers to seeds.
    pub const fn is_seed(self) -> bool {
        matches!(self, Self::Seed(_))
    }
}

/// A stack of one seed or item held by the player. Never stored at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct InventoryItem {
    /// Row key.
    pub id: InventoryRowId,
    /// What this stack holds.
    pub key: StockKey,
    /// How many units, always positive.
    pub quantity: u32,
}

impl InventoryItem {
    /// A new, not yet stored stack.
    pub const fn new(key: StockKey, quantity: u32) -> Self {
        Self {
            id: InventoryRowId::UNSET,
            key,
            quantity,
        }
    }
}

/// Ownership of one tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct OwnedTool {
    /// Row key.
    pub id: OwnedToolId,
    /// The tool owned.
    pub tool: ToolId,
}

impl OwnedTool {
    /// A new, not yet stored ownership row.
    pub const fn new(tool: ToolId) -> Self {
        Self {
            id: OwnedToolId::UNSET,
            tool,
        }
    }
}

/// A machine the player owns and its in-flight job, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct OwnedMachine {
    /// Row key.
    pub id: OwnedMachineId,
    /// The machine owned.
    pub machine: MachineId,
    /// Whether a job is loaded.
    pub is_processing: bool,
    /// When the current job started.
    pub started_at: Option<DateTime<Utc>>,
    /// Input consumed by the current job, fixed at start.
    pub locked_input: Option<ItemStack>,
    /// Output owed by the current job, fixed at start.
    pub locked_output: Option<ItemStack>,
}

impl OwnedMachine {
    /// A new, idle, not yet stored machine.
    pub const fn new(machine: MachineId) -> Self {
        Self {
            id: OwnedMachineId::UNSET,
            machine,
            is_processing: false,
            started_at: None,
            locked_input: None,
            locked_output: None,
        }
    }

    /// Drop the current job and return to idle.
    pub const fn reset(&mut self) {
        self.is_processing = false;
        self.started_at = None;
        self.locked_input = None;
        self.locked_output = None;
    }
}

// ---------------------------------------------------------------------------
// Journal
// ---------------------------------------------------------------------------

/// One money movement, appended for every purchase and sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct JournalEntry {
    /// Unique identifier.
    pub id: JournalEntryId,
    /// Category of the movement.
    pub entry_type: JournalEntryType,
    /// Absolute amount moved, always positive.
    #[ts(as = "String")]
    pub amount: Decimal,
    /// Player balance after the movement.
    #[ts(as = "String")]
    pub balance_after: Decimal,
    /// Human-readable description, e.g. "3x Carrot Seeds".
    pub memo: String,
    /// When the movement happened.
    pub recorded_at: DateTime<Utc>,
}
