//! Shared type definitions for the Homestead farming economy.
//!
//! This crate is the single source of truth for all types used across the
//! Homestead workspace. Types defined here flow downstream to `TypeScript`
//! via `ts-rs` for the presentation layer.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe wrappers for catalog ids and row keys
//! - [`enums`] -- Tool categories, lifecycle phases, record kinds
//! - [`structs`] -- Catalog definitions, player rows, journal entries
//! - [`records`] -- Store records and write-batch mutations

pub mod enums;
pub mod ids;
pub mod records;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{
    JournalEntryType, MachinePhase, PlotPhase, RecordKind, ToolCategory, UnknownToolCategory,
};
pub use ids::{
    InventoryRowId, ItemId, JournalEntryId, MachineId, OwnedMachineId, OwnedToolId, PlotId,
    SeedId, ToolId,
};
pub use records::{Mutation, Record};
pub use structs::{
    InventoryItem, ItemDefinition, ItemStack, JournalEntry, MachineDefinition, OwnedMachine,
    OwnedTool, PlayerState, Plot, SeedDefinition, StockKey, ToolDefinition, ToolKind,
    ToolRowError, WateringCanStats,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // Calling export_all writes every #[ts(export)] type to `bindings/`
        // relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::ItemId::export_all();
        let _ = crate::ids::SeedId::export_all();
        let _ = crate::ids::ToolId::export_all();
        let _ = crate::ids::MachineId::export_all();
        let _ = crate::ids::PlotId::export_all();
        let _ = crate::ids::InventoryRowId::export_all();
        let _ = crate::ids::OwnedToolId::export_all();
        let _ = crate::ids::OwnedMachineId::export_all();
        let _ = crate::ids::JournalEntryId::export_all();

        // Enums
        let _ = crate::enums::ToolCategory::export_all();
        let _ = crate::enums::PlotPhase::export_all();
        let _ = crate::enums::MachinePhase::export_all();
        let _ = crate::enums::RecordKind::export_all();
        let _ = crate::enums::JournalEntryType::export_all();

        // Structs
        let _ = crate::structs::ItemDefinition::export_all();
        let _ = crate::structs::SeedDefinition::export_all();
        let _ = crate::structs::WateringCanStats::export_all();
        let _ = crate::structs::ToolKind::export_all();
        let _ = crate::structs::ToolDefinition::export_all();
        let _ = crate::structs::ItemStack::export_all();
        let _ = crate::structs::MachineDefinition::export_all();
        let _ = crate::structs::PlayerState::export_all();
        let _ = crate::structs::Plot::export_all();
        let _ = crate::structs::StockKey::export_all();
        let _ = crate::structs::InventoryItem::export_all();
        let _ = crate::structs::OwnedTool::export_all();
        let _ = crate::structs::OwnedMachine::export_all();
        let _ = crate::structs::JournalEntry::export_all();

        // Records
        let _ = crate::records::Record::export_all();
        let _ = crate::records::Mutation::export_all();
    }
}
