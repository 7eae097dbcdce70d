//! [`Store`] implementation over `PostgreSQL`.
//!
//! One table per [`RecordKind`]. Store-assigned keys come from each
//! table's identity sequence; a batch from [`Store::apply`] runs inside a
//! single transaction and is rolled back on the first failure.

use sqlx::{PgConnection, PgPool};

use homestead_core::{Store, StoreError};
use homestead_types::{Mutation, Record, RecordKind};

use crate::error::DbError;
use crate::postgres::PostgresPool;
use crate::rows::{
    InventoryRow, ItemRow, MachineRow, OwnedMachineRow, OwnedToolRow, PlayerRow, PlotRow, SeedRow,
    StoredRow, ToolRow,
};

/// A [`Store`] backed by a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap a connected pool. Migrations are expected to have run.
    pub fn new(pool: &PostgresPool) -> Self {
        Self {
            pool: pool.pool().clone(),
        }
    }

    async fn fetch(&self, kind: RecordKind, id: Option<i64>) -> Result<Vec<Record>, DbError> {
        match kind {
            RecordKind::Player => fetch_rows::<PlayerRow>(&self.pool, id).await,
            RecordKind::Plot => fetch_rows::<PlotRow>(&self.pool, id).await,
            RecordKind::InventoryItem => fetch_rows::<InventoryRow>(&self.pool, id).await,
            RecordKind::OwnedTool => fetch_rows::<OwnedToolRow>(&self.pool, id).await,
            RecordKind::OwnedMachine => fetch_rows::<OwnedMachineRow>(&self.pool, id).await,
            RecordKind::ItemDefinition => fetch_rows::<ItemRow>(&self.pool, id).await,
            RecordKind::SeedDefinition => fetch_rows::<SeedRow>(&self.pool, id).await,
            RecordKind::ToolDefinition => fetch_rows::<ToolRow>(&self.pool, id).await,
            RecordKind::MachineDefinition => fetch_rows::<MachineRow>(&self.pool, id).await,
        }
    }

    async fn apply_batch(&self, batch: &[Mutation]) -> Result<Vec<i64>, DbError> {
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(batch.len());
        for mutation in batch {
            let id = match mutation {
                Mutation::Upsert(record) => write_record(&mut tx, record).await?,
                Mutation::Delete { kind, id } => {
                    delete_row(&mut tx, *kind, *id).await?;
                    *id
                }
            };
            ids.push(id);
        }
        tx.commit().await?;
        tracing::debug!(writes = batch.len(), "batch committed");
        Ok(ids)
    }
}

async fn fetch_rows<R: StoredRow>(pool: &PgPool, id: Option<i64>) -> Result<Vec<Record>, DbError> {
    let table = R::KIND.table_name();
    let rows = if let Some(id) = id {
        let sql = format!("SELECT {} FROM {table} WHERE id = $1", R::COLUMNS);
        sqlx::query_as::<_, R>(&sql).bind(id).fetch_all(pool).await?
    } else {
        let sql = format!("SELECT {} FROM {table} ORDER BY id", R::COLUMNS);
        sqlx::query_as::<_, R>(&sql).fetch_all(pool).await?
    };
    rows.into_iter().map(StoredRow::into_record).collect()
}

/// The key a record is written under: its own, or the next value of the
/// table's identity sequence when unset.
async fn resolve_id(conn: &mut PgConnection, record: &Record) -> Result<i64, DbError> {
    let kind = record.kind();
    let id = record.id();
    if id > 0 {
        return Ok(id);
    }
    if kind.is_catalog() || kind == RecordKind::Player {
        return Err(DbError::corrupt(kind, id, "fixed-key row without a key"));
    }
    let (next,): (i64,) = sqlx::query_as("SELECT nextval(pg_get_serial_sequence($1, 'id'))")
        .bind(kind.table_name())
        .fetch_one(&mut *conn)
        .await?;
    Ok(next)
}

fn wide(value: u32) -> i64 {
    i64::from(value)
}

#[allow(clippy::too_many_lines)]
async fn write_record(conn: &mut PgConnection, record: &Record) -> Result<i64, DbError> {
    let id = resolve_id(conn, record).await?;
    let query = match record {
        Record::Player(p) => sqlx::query(
            r"INSERT INTO player_state (id, money, current_water, max_water, refill_rate, selected_hoe, selected_watering_can, last_observed_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
              ON CONFLICT (id) DO UPDATE SET
                money = EXCLUDED.money,
                current_water = EXCLUDED.current_water,
                max_water = EXCLUDED.max_water,
                refill_rate = EXCLUDED.refill_rate,
                selected_hoe = EXCLUDED.selected_hoe,
                selected_watering_can = EXCLUDED.selected_watering_can,
                last_observed_at = EXCLUDED.last_observed_at",
        )
        .bind(id)
        .bind(p.money)
        .bind(p.current_water)
        .bind(p.max_water)
        .bind(p.refill_rate)
        .bind(p.selected_hoe.map(|t| t.get()))
        .bind(p.selected_watering_can.map(|t| t.get()))
        .bind(p.last_observed_at),

        Record::Plot(p) => sqlx::query(
            r"INSERT INTO plots (id, plot_number, tilled, planted_seed, planted_at, watered, growth_progress)
              VALUES ($1, $2, $3, $4, $5, $6, $7)
              ON CONFLICT (id) DO UPDATE SET
                plot_number = EXCLUDED.plot_number,
                tilled = EXCLUDED.tilled,
                planted_seed = EXCLUDED.planted_seed,
                planted_at = EXCLUDED.planted_at,
                watered = EXCLUDED.watered,
                growth_progress = EXCLUDED.growth_progress",
        )
        .bind(id)
        .bind(wide(p.plot_number))
        .bind(p.tilled)
        .bind(p.planted_seed.map(|s| s.get()))
        .bind(p.planted_at)
        .bind(p.watered)
        .bind(p.growth_progress),

        Record::InventoryItem(i) => sqlx::query(
            r"INSERT INTO inventory_items (id, definition_id, is_seed, quantity)
              VALUES ($1, $2, $3, $4)
              ON CONFLICT (id) DO UPDATE SET
                definition_id = EXCLUDED.definition_id,
                is_seed = EXCLUDED.is_seed,
                quantity = EXCLUDED.quantity",
        )
        .bind(id)
        .bind(i.key.definition_id())
        .bind(i.key.is_seed())
        .bind(wide(i.quantity)),

        Record::OwnedTool(t) => sqlx::query(
            r"INSERT INTO owned_tools (id, tool_id)
              VALUES ($1, $2)
              ON CONFLICT (id) DO UPDATE SET tool_id = EXCLUDED.tool_id",
        )
        .bind(id)
        .bind(t.tool.get()),

        Record::OwnedMachine(m) => sqlx::query(
            r"INSERT INTO owned_machines (id, machine_id, is_processing, started_at, locked_input_item, locked_input_quantity, locked_output_item, locked_output_quantity)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
              ON CONFLICT (id) DO UPDATE SET
                machine_id = EXCLUDED.machine_id,
                is_processing = EXCLUDED.is_processing,
                started_at = EXCLUDED.started_at,
                locked_input_item = EXCLUDED.locked_input_item,
                locked_input_quantity = EXCLUDED.locked_input_quantity,
                locked_output_item = EXCLUDED.locked_output_item,
                locked_output_quantity = EXCLUDED.locked_output_quantity",
        )
        .bind(id)
        .bind(m.machine.get())
        .bind(m.is_processing)
        .bind(m.started_at)
        .bind(m.locked_input.map(|s| s.item.get()))
        .bind(m.locked_input.map(|s| wide(s.quantity)))
        .bind(m.locked_output.map(|s| s.item.get()))
        .bind(m.locked_output.map(|s| wide(s.quantity))),

        Record::ItemDefinition(d) => sqlx::query(
            r"INSERT INTO item_definitions (id, name, base_sell_price, can_be_processed)
              VALUES ($1, $2, $3, $4)
              ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                base_sell_price = EXCLUDED.base_sell_price,
                can_be_processed = EXCLUDED.can_be_processed",
        )
        .bind(id)
        .bind(d.name.as_str())
        .bind(d.base_sell_price)
        .bind(d.can_be_processed),

        Record::SeedDefinition(d) => sqlx::query(
            r"INSERT INTO seed_definitions (id, name, cost, grow_time_secs, yields_item_id)
              VALUES ($1, $2, $3, $4, $5)
              ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                cost = EXCLUDED.cost,
                grow_time_secs = EXCLUDED.grow_time_secs,
                yields_item_id = EXCLUDED.yields_item_id",
        )
        .bind(id)
        .bind(d.name.as_str())
        .bind(d.cost)
        .bind(wide(d.grow_time_secs))
        .bind(d.yields.get()),

        Record::ToolDefinition(d) => {
            let stats = d.water_stats();
            sqlx::query(
                r"INSERT INTO tool_definitions (id, name, category, range, cost, tier, max_capacity, refill_rate)
                  VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                  ON CONFLICT (id) DO UPDATE SET
                    name = EXCLUDED.name,
                    category = EXCLUDED.category,
                    range = EXCLUDED.range,
                    cost = EXCLUDED.cost,
                    tier = EXCLUDED.tier,
                    max_capacity = EXCLUDED.max_capacity,
                    refill_rate = EXCLUDED.refill_rate",
            )
            .bind(id)
            .bind(d.name.as_str())
            .bind(d.category().as_str())
            .bind(wide(d.range))
            .bind(d.cost)
            .bind(wide(d.tier))
            .bind(stats.map(|s| s.max_capacity))
            .bind(stats.map(|s| s.refill_rate))
        }

        Record::MachineDefinition(d) => sqlx::query(
            r"INSERT INTO machine_definitions (id, name, cost, processing_time_secs, input_item_id, input_quantity, output_item_id, output_quantity)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
              ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                cost = EXCLUDED.cost,
                processing_time_secs = EXCLUDED.processing_time_secs,
                input_item_id = EXCLUDED.input_item_id,
                input_quantity = EXCLUDED.input_quantity,
                output_item_id = EXCLUDED.output_item_id,
                output_quantity = EXCLUDED.output_quantity",
        )
        .bind(id)
        .bind(d.name.as_str())
        .bind(d.cost)
        .bind(wide(d.processing_time_secs))
        .bind(d.input.item.get())
        .bind(wide(d.input.quantity))
        .bind(d.output.item.get())
        .bind(wide(d.output.quantity)),
    };
    query.execute(&mut *conn).await?;
    Ok(id)
}

async fn delete_row(conn: &mut PgConnection, kind: RecordKind, id: i64) -> Result<bool, DbError> {
    let sql = format!("DELETE FROM {} WHERE id = $1", kind.table_name());
    let result = sqlx::query(&sql).bind(id).execute(&mut *conn).await?;
    Ok(result.rows_affected() > 0)
}

impl Store for PgStore {
    async fn get(&self, kind: RecordKind, id: i64) -> Result<Option<Record>, StoreError> {
        let rows = self.fetch(kind, Some(id)).await?;
        Ok(rows.into_iter().next())
    }

    async fn all(&self, kind: RecordKind) -> Result<Vec<Record>, StoreError> {
        Ok(self.fetch(kind, None).await?)
    }

    async fn upsert(&self, record: Record) -> Result<i64, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        Ok(write_record(&mut conn, &record).await?)
    }

    async fn delete(&self, kind: RecordKind, id: i64) -> Result<bool, StoreError> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        Ok(delete_row(&mut conn, kind, id).await?)
    }

    async fn apply(&self, batch: Vec<Mutation>) -> Result<Vec<i64>, StoreError> {
        self.apply_batch(&batch).await.map_err(|err| {
            tracing::warn!(error = %err, writes = batch.len(), "batch rolled back");
            StoreError::from(err)
        })
    }
}
