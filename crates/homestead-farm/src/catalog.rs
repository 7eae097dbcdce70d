//! The read-only catalog of items, seeds, tools and machines.
//!
//! Loaded once from the store and passed by reference into every
//! operation that needs a definition. Lookups of unknown ids return
//! [`FarmError::NotFound`].

use std::collections::BTreeMap;

use homestead_types::{
    ItemDefinition, ItemId, MachineDefinition, MachineId, Record, SeedDefinition, SeedId,
    StockKey, ToolCategory, ToolDefinition, ToolId,
};

use crate::error::FarmError;

/// All catalog definitions, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    items: BTreeMap<ItemId, ItemDefinition>,
    seeds: BTreeMap<SeedId, SeedDefinition>,
    tools: BTreeMap<ToolId, ToolDefinition>,
    machines: BTreeMap<MachineId, MachineDefinition>,
}

impl Catalog {
    /// Create an empty catalog.
    pub const fn new() -> Self {
        Self {
            items: BTreeMap::new(),
            seeds: BTreeMap::new(),
            tools: BTreeMap::new(),
            machines: BTreeMap::new(),
        }
    }

    /// Build a catalog from stored records. Non-catalog records are ignored.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = Record>,
    {
        let mut catalog = Self::new();
        for record in records {
            catalog.insert(record);
        }
        catalog
    }

    /// Add one catalog record. Returns `false` for non-catalog records.
    pub fn insert(&mut self, record: Record) -> bool {
        match record {
            Record::ItemDefinition(d) => {
                self.items.insert(d.id, d);
            }
            Record::SeedDefinition(d) => {
                self.seeds.insert(d.id, d);
            }
            Record::ToolDefinition(d) => {
                self.tools.insert(d.id, d);
            }
            Record::MachineDefinition(d) => {
                self.machines.insert(d.id, d);
            }
            Record::Player(_)
            | Record::Plot(_)
            | Record::InventoryItem(_)
            | Record::OwnedTool(_)
            | Record::OwnedMachine(_) => return false,
        }
        true
    }

    /// Every definition as a store record, items first.
    pub fn to_records(&self) -> Vec<Record> {
        self.items
            .values()
            .cloned()
            .map(Record::ItemDefinition)
            .chain(self.seeds.values().cloned().map(Record::SeedDefinition))
            .chain(self.tools.values().cloned().map(Record::ToolDefinition))
            .chain(self.machines.values().cloned().map(Record::MachineDefinition))
            .collect()
    }

    /// Whether no definitions are loaded.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
            && self.seeds.is_empty()
            && self.tools.is_empty()
            && self.machines.is_empty()
    }

    /// Look up an item.
    pub fn item(&self, id: ItemId) -> Result<&ItemDefinition, FarmError> {
        self.items.get(&id).ok_or(FarmError::NotFound {
            what: "item",
            id: id.get(),
        })
    }

    /// Look up a seed.
    pub fn seed(&self, id: SeedId) -> Result<&SeedDefinition, FarmError> {
        self.seeds.get(&id).ok_or(FarmError::NotFound {
            what: "seed",
            id: id.get(),
        })
    }

    /// Look up a tool.
    pub fn tool(&self, id: ToolId) -> Result<&ToolDefinition, FarmError> {
        self.tools.get(&id).ok_or(FarmError::NotFound {
            what: "tool",
            id: id.get(),
        })
    }

    /// Look up a machine.
    pub fn machine(&self, id: MachineId) -> Result<&MachineDefinition, FarmError> {
        self.machines.get(&id).ok_or(FarmError::NotFound {
            what: "machine",
            id: id.get(),
        })
    }

    /// All items, by id.
    pub fn items(&self) -> impl Iterator<Item = &ItemDefinition> {
        self.items.values()
    }

    /// All seeds, by id.
    pub fn seeds(&self) -> impl Iterator<Item = &SeedDefinition> {
        self.seeds.values()
    }

    /// All tools, by id.
    pub fn tools(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.values()
    }

    /// Tools of one category, by id.
    pub fn tools_in(&self, category: ToolCategory) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.values().filter(move |t| t.category() == category)
    }

    /// All machines, by id.
    pub fn machines(&self) -> impl Iterator<Item = &MachineDefinition> {
        self.machines.values()
    }

    /// Display name of a stock key, or `"Unknown"`.
    pub fn stock_name(&self, key: StockKey) -> &str {
        match key {
            StockKey::Seed(id) => self.seeds.get(&id).map(|s| s.name.as_str()),
            StockKey::Produce(id) => self.items.get(&id).map(|i| i.name.as_str()),
        }
        .unwrap_or("Unknown")
    }

    /// Display name of an item, or `"Unknown"`.
    pub fn item_name(&self, id: ItemId) -> &str {
        self.stock_name(StockKey::Produce(id))
    }
}
