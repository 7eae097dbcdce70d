//! Flat table rows and their conversion into [`Record`]s.
//!
//! Unsigned counters are stored as `BIGINT` and narrowed on the way back;
//! a value that does not fit, an unknown tool category or a half-filled
//! locked stack is reported as [`DbError::Corrupt`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;

use homestead_types::{
    InventoryItem, InventoryRowId, ItemDefinition, ItemId, ItemStack, MachineDefinition, MachineId,
    OwnedMachine, OwnedMachineId, OwnedTool, OwnedToolId, PlayerState, Plot, PlotId, Record,
    RecordKind, SeedDefinition, SeedId, StockKey, ToolDefinition, ToolId,
};

use crate::error::DbError;

/// A table row that decodes into one [`Record`].
pub trait StoredRow: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin {
    /// The table this row comes from.
    const KIND: RecordKind;
    /// Column list for `SELECT`.
    const COLUMNS: &'static str;

    /// Validate and convert.
    fn into_record(self) -> Result<Record, DbError>;
}

fn narrow(kind: RecordKind, id: i64, field: &str, value: i64) -> Result<u32, DbError> {
    u32::try_from(value).map_err(|err| DbError::corrupt(kind, id, format!("{field} {value}: {err}")))
}

fn stack(
    kind: RecordKind,
    id: i64,
    field: &str,
    item: Option<i64>,
    quantity: Option<i64>,
) -> Result<Option<ItemStack>, DbError> {
    match (item, quantity) {
        (Some(item), Some(quantity)) => Ok(Some(ItemStack {
            item: ItemId::new(item),
            quantity: narrow(kind, id, field, quantity)?,
        })),
        (None, None) => Ok(None),
        _ => Err(DbError::corrupt(kind, id, format!("{field} is half set"))),
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// A row from `item_definitions`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ItemRow {
    /// Catalog id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Sell price per unit.
    pub base_sell_price: Decimal,
    /// Whether a machine accepts it.
    pub can_be_processed: bool,
}

impl StoredRow for ItemRow {
    const KIND: RecordKind = RecordKind::ItemDefinition;
    const COLUMNS: &'static str = "id, name, base_sell_price, can_be_processed";

    fn into_record(self) -> Result<Record, DbError> {
        Ok(Record::ItemDefinition(ItemDefinition {
            id: ItemId::new(self.id),
            name: self.name,
            base_sell_price: self.base_sell_price,
            can_be_processed: self.can_be_processed,
        }))
    }
}

/// A row from `seed_definitions`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SeedRow {
    /// Catalog id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Shop price.
    pub cost: Decimal,
    /// Seconds to grow.
    pub grow_time_secs: i64,
    /// Item yielded.
    pub yields_item_id: i64,
}

impl StoredRow for SeedRow {
    const KIND: RecordKind = RecordKind::SeedDefinition;
    const COLUMNS: &'static str = "id, name, cost, grow_time_secs, yields_item_id";

    fn into_record(self) -> Result<Record, DbError> {
        Ok(Record::SeedDefinition(SeedDefinition {
            id: SeedId::new(self.id),
            grow_time_secs: narrow(Self::KIND, self.id, "grow_time_secs", self.grow_time_secs)?,
            name: self.name,
            cost: self.cost,
            yields: ItemId::new(self.yields_item_id),
        }))
    }
}

/// A row from `tool_definitions`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ToolRow {
    /// Catalog id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// `Hoe` or `WateringCan`.
    pub category: String,
    /// Area of effect.
    pub range: i64,
    /// Shop price.
    pub cost: Decimal,
    /// Upgrade rank.
    pub tier: i64,
    /// Watering cans only.
    pub max_capacity: Option<Decimal>,
    /// Watering cans only.
    pub refill_rate: Option<Decimal>,
}

impl StoredRow for ToolRow {
    const KIND: RecordKind = RecordKind::ToolDefinition;
    const COLUMNS: &'static str =
        "id, name, category, range, cost, tier, max_capacity, refill_rate";

    fn into_record(self) -> Result<Record, DbError> {
        let range = narrow(Self::KIND, self.id, "range", self.range)?;
        let tier = narrow(Self::KIND, self.id, "tier", self.tier)?;
        ToolDefinition::from_columns(
            ToolId::new(self.id),
            self.name,
            &self.category,
            range,
            self.cost,
            tier,
            self.max_capacity,
            self.refill_rate,
        )
        .map(Record::ToolDefinition)
        .map_err(|err| DbError::corrupt(Self::KIND, self.id, err.to_string()))
    }
}

/// A row from `machine_definitions`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MachineRow {
    /// Catalog id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Shop price.
    pub cost: Decimal,
    /// Seconds per job.
    pub processing_time_secs: i64,
    /// Input item.
    pub input_item_id: i64,
    /// Input quantity.
    pub input_quantity: i64,
    /// Output item.
    pub output_item_id: i64,
    /// Output quantity.
    pub output_quantity: i64,
}

impl StoredRow for MachineRow {
    const KIND: RecordKind = RecordKind::MachineDefinition;
    const COLUMNS: &'static str = "id, name, cost, processing_time_secs, input_item_id, \
         input_quantity, output_item_id, output_quantity";

    fn into_record(self) -> Result<Record, DbError> {
        let id = self.id;
        let input = ItemStack {
            item: ItemId::new(self.input_item_id),
            quantity: narrow(Self::KIND, id, "input_quantity", self.input_quantity)?,
        };
        let output = ItemStack {
            item: ItemId::new(self.output_item_id),
            quantity: narrow(Self::KIND, id, "output_quantity", self.output_quantity)?,
        };
        Ok(Record::MachineDefinition(MachineDefinition {
            id: MachineId::new(id),
            name: self.name,
            cost: self.cost,
            processing_time_secs: narrow(
                Self::KIND,
                id,
                "processing_time_secs",
                self.processing_time_secs,
            )?,
            input,
            output,
        }))
    }
}

// ---------------------------------------------------------------------------
// Player rows
// ---------------------------------------------------------------------------

/// The row in `player_state`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlayerRow {
    /// Always [`PlayerState::ROW_ID`].
    pub id: i64,
    /// Money balance.
    pub money: Decimal,
    /// Water held.
    pub current_water: Decimal,
    /// Water capacity.
    pub max_water: Decimal,
    /// Water per second.
    pub refill_rate: Decimal,
    /// Equipped hoe.
    pub selected_hoe: Option<i64>,
    /// Equipped watering can.
    pub selected_watering_can: Option<i64>,
    /// Last refill observation.
    pub last_observed_at: DateTime<Utc>,
}

impl StoredRow for PlayerRow {
    const KIND: RecordKind = RecordKind::Player;
    const COLUMNS: &'static str = "id, money, current_water, max_water, refill_rate, \
         selected_hoe, selected_watering_can, last_observed_at";

    fn into_record(self) -> Result<Record, DbError> {
        if self.id != PlayerState::ROW_ID {
            return Err(DbError::corrupt(Self::KIND, self.id, "unexpected player key"));
        }
        Ok(Record::Player(PlayerState {
            money: self.money,
            current_water: self.current_water,
            max_water: self.max_water,
            refill_rate: self.refill_rate,
            selected_hoe: self.selected_hoe.map(ToolId::new),
            selected_watering_can: self.selected_watering_can.map(ToolId::new),
            last_observed_at: self.last_observed_at,
        }))
    }
}

/// A row from `plots`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlotRow {
    /// Row key.
    pub id: i64,
    /// Grid ordinal.
    pub plot_number: i64,
    /// Tilled flag.
    pub tilled: bool,
    /// Planted seed.
    pub planted_seed: Option<i64>,
    /// Plant time.
    pub planted_at: Option<DateTime<Utc>>,
    /// Watered flag.
    pub watered: bool,
    /// Cached growth fraction.
    pub growth_progress: Decimal,
}

impl StoredRow for PlotRow {
    const KIND: RecordKind = RecordKind::Plot;
    const COLUMNS: &'static str =
        "id, plot_number, tilled, planted_seed, planted_at, watered, growth_progress";

    fn into_record(self) -> Result<Record, DbError> {
        Ok(Record::Plot(Plot {
            id: PlotId::new(self.id),
            plot_number: narrow(Self::KIND, self.id, "plot_number", self.plot_number)?,
            tilled: self.tilled,
            planted_seed: self.planted_seed.map(SeedId::new),
            planted_at: self.planted_at,
            watered: self.watered,
            growth_progress: self.growth_progress,
        }))
    }
}

/// A row from `inventory_items`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InventoryRow {
    /// Row key.
    pub id: i64,
    /// Seed or item definition.
    pub definition_id: i64,
    /// Whether `definition_id` names a seed.
    pub is_seed: bool,
    /// Units held.
    pub quantity: i64,
}

impl StoredRow for InventoryRow {
    const KIND: RecordKind = RecordKind::InventoryItem;
    const COLUMNS: &'static str = "id, definition_id, is_seed, quantity";

    fn into_record(self) -> Result<Record, DbError> {
        Ok(Record::InventoryItem(InventoryItem {
            id: InventoryRowId::new(self.id),
            key: StockKey::from_columns(self.definition_id, self.is_seed),
            quantity: narrow(Self::KIND, self.id, "quantity", self.quantity)?,
        }))
    }
}

/// A row from `owned_tools`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OwnedToolRow {
    /// Row key.
    pub id: i64,
    /// Tool owned.
    pub tool_id: i64,
}

impl StoredRow for OwnedToolRow {
    const KIND: RecordKind = RecordKind::OwnedTool;
    const COLUMNS: &'static str = "id, tool_id";

    fn into_record(self) -> Result<Record, DbError> {
        Ok(Record::OwnedTool(OwnedTool {
            id: OwnedToolId::new(self.id),
            tool: ToolId::new(self.tool_id),
        }))
    }
}

/// A row from `owned_machines`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OwnedMachineRow {
    /// Row key.
    pub id: i64,
    /// Machine owned.
    pub machine_id: i64,
    /// Job loaded.
    pub is_processing: bool,
    /// Job start.
    pub started_at: Option<DateTime<Utc>>,
    /// Locked input item.
    pub locked_input_item: Option<i64>,
    /// Locked input quantity.
    pub locked_input_quantity: Option<i64>,
    /// Locked output item.
    pub locked_output_item: Option<i64>,
    /// Locked output quantity.
    pub locked_output_quantity: Option<i64>,
}

impl StoredRow for OwnedMachineRow {
    const KIND: RecordKind = RecordKind::OwnedMachine;
    const COLUMNS: &'static str = "id, machine_id, is_processing, started_at, \
         locked_input_item, locked_input_quantity, locked_output_item, locked_output_quantity";

    fn into_record(self) -> Result<Record, DbError> {
        let id = self.id;
        Ok(Record::OwnedMachine(OwnedMachine {
            id: OwnedMachineId::new(id),
            machine: MachineId::new(self.machine_id),
            is_processing: self.is_processing,
            started_at: self.started_at,
            locked_input: stack(
                Self::KIND,
                id,
                "locked input",
                self.locked_input_item,
                self.locked_input_quantity,
            )?,
            locked_output: stack(
                Self::KIND,
                id,
                "locked output",
                self.locked_output_item,
                self.locked_output_quantity,
            )?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn watering_can_row_decodes() {
        let row = ToolRow {
            id: 205,
            name: "Basic Watering Can".to_owned(),
            category: "WateringCan".to_owned(),
            range: 1,
            cost: Decimal::ZERO,
            tier: 1,
            max_capacity: Some(dec!(50)),
            refill_rate: Some(dec!(1)),
        };
        let Ok(Record::ToolDefinition(tool)) = row.into_record() else {
            panic!("expected a tool definition");
        };
        assert_eq!(tool.water_stats().map(|s| s.max_capacity), Some(dec!(50)));
    }

    #[test]
    fn unknown_category_is_corrupt() {
        let row = ToolRow {
            id: 299,
            name: "Sprinkler".to_owned(),
            category: "Sprinkler".to_owned(),
            range: 1,
            cost: Decimal::ZERO,
            tier: 1,
            max_capacity: None,
            refill_rate: None,
        };
        assert!(matches!(
            row.into_record(),
            Err(DbError::Corrupt { id: 299, .. })
        ));
    }

    #[test]
    fn negative_quantity_is_corrupt() {
        let row = InventoryRow {
            id: 4,
            definition_id: 1,
            is_seed: false,
            quantity: -3,
        };
        assert!(matches!(
            row.into_record(),
            Err(DbError::Corrupt {
                kind: RecordKind::InventoryItem,
                ..
            })
        ));
    }

    #[test]
    fn half_locked_job_is_corrupt() {
        let row = OwnedMachineRow {
            id: 1,
            machine_id: 301,
            is_processing: true,
            started_at: None,
            locked_input_item: Some(3),
            locked_input_quantity: None,
            locked_output_item: None,
            locked_output_quantity: None,
        };
        assert!(row.into_record().is_err());
    }

    #[test]
    fn inventory_row_keeps_seed_flag() {
        let row = InventoryRow {
            id: 2,
            definition_id: 101,
            is_seed: true,
            quantity: 3,
        };
        let Ok(Record::InventoryItem(item)) = row.into_record() else {
            panic!("expected an inventory row");
        };
        assert_eq!(item.key, StockKey::Seed(SeedId::new(101)));
        assert_eq!(item.quantity, 3);
    }
}
