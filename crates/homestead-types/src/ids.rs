//! Type-safe identifier wrappers.
//!
//! Catalog definitions use small pre-assigned integer ids (seeds in the 100s,
//! tools in the 200s, machines in the 300s). Mutable per-player rows use
//! store-assigned integer keys, where `0` means "not inserted yet" and an
//! upsert of such a row performs an insert.
//!
//! Journal entries are never persisted as rows and use UUID v7 instead.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around an `i64` row key with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
            Deserialize, TS,
        )]
        #[serde(transparent)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub i64);

        impl $name {
            /// The key of a row that has not been assigned one by the store.
            pub const UNSET: Self = Self(0);

            /// Wrap a raw key.
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Return the raw key.
            pub const fn get(self) -> i64 {
                self.0
            }

            /// Whether the store still has to assign this key.
            pub const fn is_unset(self) -> bool {
                self.0 == 0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Identifier of an item (produce or processed good) definition.
    ItemId
}

define_id! {
    /// Identifier of a seed definition.
    SeedId
}

define_id! {
    /// Identifier of a tool definition.
    ToolId
}

define_id! {
    /// Identifier of a machine definition.
    MachineId
}

define_id! {
    /// Row key of a plot.
    PlotId
}

define_id! {
    /// Row key of an inventory stack.
    InventoryRowId
}

define_id! {
    /// Row key of an owned tool.
    OwnedToolId
}

define_id! {
    /// Row key of an owned machine.
    OwnedMachineId
}

/// Unique identifier for a money journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct JournalEntryId(pub Uuid);

impl JournalEntryId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for JournalEntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for JournalEntryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_is_zero() {
        assert!(PlotId::UNSET.is_unset());
        assert!(PlotId::default().is_unset());
        assert!(!PlotId::new(3).is_unset());
    }

    #[test]
    fn id_serializes_as_bare_integer() {
        let json = serde_json::to_string(&SeedId::new(101)).ok();
        assert_eq!(json.as_deref(), Some("101"));
        let back: Result<SeedId, _> = serde_json::from_str("101");
        assert_eq!(back.ok(), Some(SeedId::new(101)));
    }

    #[test]
    fn id_display_matches_raw() {
        assert_eq!(ToolId::new(205).to_string(), "205");
        assert_eq!(i64::from(MachineId::new(301)), 301);
    }

    #[test]
    fn journal_ids_are_distinct() {
        assert_ne!(JournalEntryId::new(), JournalEntryId::new());
    }
}
