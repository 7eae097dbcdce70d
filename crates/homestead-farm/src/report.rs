//! Outcome of a reconciliation pass.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use homestead_types::MachineId;

/// The row a correction or skip applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum CorrectionTarget {
    /// A plot, by ordinal.
    Plot {
        /// The plot's ordinal.
        plot_number: u32,
    },
    /// An owned machine, by definition.
    Machine {
        /// The machine's definition id.
        machine: MachineId,
    },
}

/// What was wrong with the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum CorrectionKind {
    /// A watered crop had no plant time. The plot was cleared to empty.
    PlantTimeMissing,
    /// A processing machine had no start time. The machine was reset to
    /// idle.
    StartTimeMissing,
}

/// A self-healing fix applied to corrupted state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Correction {
    /// The row that was fixed.
    pub target: CorrectionTarget,
    /// The defect found.
    pub kind: CorrectionKind,
}

/// Summary of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ReconcileReport {
    /// Water units regained.
    #[ts(as = "String")]
    pub water_gained: Decimal,
    /// Plots whose crop is ready to harvest.
    pub plots_ready: u32,
    /// Machines whose job is ready to collect.
    pub machines_ready: u32,
    /// Self-healing fixes applied.
    pub corrections: Vec<Correction>,
    /// Rows left as stored because their catalog definition is missing.
    pub unresolved: Vec<CorrectionTarget>,
}

impl ReconcileReport {
    /// Whether any correction was applied.
    pub fn has_corrections(&self) -> bool {
        !self.corrections.is_empty()
    }
}
