//! The persistence contract and an in-memory implementation.
//!
//! A [`Store`] holds one table per [`RecordKind`]. Rows whose key is unset
//! (`0`) are inserted under a fresh key, all others are written in place.
//! [`Store::apply`] writes a whole batch atomically: either every mutation
//! lands or none does.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;

use homestead_types::{Mutation, Record, RecordKind};

/// Errors returned by a store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend refused or failed the write.
    #[error("store unavailable: {reason}")]
    Unavailable {
        /// What went wrong.
        reason: String,
    },

    /// A stored row could not be decoded into a record.
    #[error("corrupt {kind:?} row {id}: {reason}")]
    Corrupt {
        /// Table of the row.
        kind: RecordKind,
        /// Key of the row.
        id: i64,
        /// Why decoding failed.
        reason: String,
    },

    /// A snapshot could not be encoded or decoded.
    #[error("snapshot error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Error raised by a database backend.
    #[error("backend error: {source}")]
    Backend {
        /// The underlying error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Persistence for every entity type.
pub trait Store: Send + Sync {
    /// One row, if present.
    fn get(
        &self,
        kind: RecordKind,
        id: i64,
    ) -> impl Future<Output = Result<Option<Record>, StoreError>> + Send;

    /// Every row of a table, in key order.
    fn all(&self, kind: RecordKind) -> impl Future<Output = Result<Vec<Record>, StoreError>> + Send;

    /// Insert (unset key) or update a row. Returns the effective key.
    fn upsert(&self, record: Record) -> impl Future<Output = Result<i64, StoreError>> + Send;

    /// Remove a row. Returns whether it existed.
    fn delete(
        &self,
        kind: RecordKind,
        id: i64,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Apply a batch atomically. Returns one effective key per mutation,
    /// in batch order.
    fn apply(
        &self,
        batch: Vec<Mutation>,
    ) -> impl Future<Output = Result<Vec<i64>, StoreError>> + Send;
}

impl<S: Store> Store for Arc<S> {
    fn get(
        &self,
        kind: RecordKind,
        id: i64,
    ) -> impl Future<Output = Result<Option<Record>, StoreError>> + Send {
        S::get(self, kind, id)
    }

    fn all(&self, kind: RecordKind) -> impl Future<Output = Result<Vec<Record>, StoreError>> + Send {
        S::all(self, kind)
    }

    fn upsert(&self, record: Record) -> impl Future<Output = Result<i64, StoreError>> + Send {
        S::upsert(self, record)
    }

    fn delete(
        &self,
        kind: RecordKind,
        id: i64,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send {
        S::delete(self, kind, id)
    }

    fn apply(
        &self,
        batch: Vec<Mutation>,
    ) -> impl Future<Output = Result<Vec<i64>, StoreError>> + Send {
        S::apply(self, batch)
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

type Tables = BTreeMap<RecordKind, BTreeMap<i64, Record>>;

#[derive(Debug, Default)]
struct MemoryInner {
    tables: Tables,
    failing_writes: u32,
    writes: u64,
}

impl MemoryInner {
    /// Consume one injected failure, if any are armed.
    fn check_write(&mut self) -> Result<(), StoreError> {
        if self.failing_writes > 0 {
            self.failing_writes = self.failing_writes.saturating_sub(1);
            tracing::warn!(remaining = self.failing_writes, "injected store failure");
            return Err(StoreError::Unavailable {
                reason: "injected write failure".to_owned(),
            });
        }
        self.writes = self.writes.saturating_add(1);
        Ok(())
    }
}

fn upsert_into(tables: &mut Tables, record: Record) -> i64 {
    let table = tables.entry(record.kind()).or_default();
    let id = record.id();
    if id > 0 {
        table.insert(id, record);
        return id;
    }
    let fresh = table
        .last_key_value()
        .map_or(1, |(last, _)| last.saturating_add(1))
        .max(1);
    table.insert(fresh, record.with_id(fresh));
    fresh
}

fn delete_from(tables: &mut Tables, kind: RecordKind, id: i64) -> bool {
    tables
        .get_mut(&kind)
        .is_some_and(|table| table.remove(&id).is_some())
}

/// A store kept in process memory.
///
/// Writes can be made to fail on demand with [`MemoryStore::fail_next_writes`],
/// and the whole content can be saved to and restored from JSON.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` write calls fail with
    /// [`StoreError::Unavailable`], leaving the content untouched.
    pub async fn fail_next_writes(&self, count: u32) {
        self.inner.lock().await.failing_writes = count;
    }

    /// Number of successful write calls so far.
    pub async fn write_count(&self) -> u64 {
        self.inner.lock().await.writes
    }

    /// Number of rows in one table.
    pub async fn count(&self, kind: RecordKind) -> usize {
        self.inner
            .lock()
            .await
            .tables
            .get(&kind)
            .map_or(0, BTreeMap::len)
    }

    /// Every row of every table as a JSON array.
    pub async fn to_json(&self) -> Result<String, StoreError> {
        let inner = self.inner.lock().await;
        let rows: Vec<&Record> = inner.tables.values().flat_map(BTreeMap::values).collect();
        Ok(serde_json::to_string_pretty(&rows)?)
    }

    /// A store holding the rows of a JSON array written by
    /// [`MemoryStore::to_json`].
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let rows: Vec<Record> = serde_json::from_str(json)?;
        let mut tables = Tables::new();
        for row in rows {
            upsert_into(&mut tables, row);
        }
        Ok(Self {
            inner: Mutex::new(MemoryInner {
                tables,
                ..MemoryInner::default()
            }),
        })
    }
}

impl Store for MemoryStore {
    async fn get(&self, kind: RecordKind, id: i64) -> Result<Option<Record>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .tables
            .get(&kind)
            .and_then(|table| table.get(&id))
            .cloned())
    }

    async fn all(&self, kind: RecordKind) -> Result<Vec<Record>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .tables
            .get(&kind)
            .map(|table| table.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn upsert(&self, record: Record) -> Result<i64, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.check_write()?;
        Ok(upsert_into(&mut inner.tables, record))
    }

    async fn delete(&self, kind: RecordKind, id: i64) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.check_write()?;
        Ok(delete_from(&mut inner.tables, kind, id))
    }

    async fn apply(&self, batch: Vec<Mutation>) -> Result<Vec<i64>, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.check_write()?;
        let mut staged = inner.tables.clone();
        let mut ids = Vec::with_capacity(batch.len());
        for mutation in batch {
            let id = match mutation {
                Mutation::Upsert(record) => upsert_into(&mut staged, record),
                Mutation::Delete { kind, id } => {
                    delete_from(&mut staged, kind, id);
                    id
                }
            };
            ids.push(id);
        }
        inner.tables = staged;
        Ok(ids)
    }
}
