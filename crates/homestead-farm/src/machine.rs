//! Machine lifecycle: start a job, let it run, collect the output.
//!
//! ```text
//! Idle -> Processing -> ReadyToCollect -> Idle
//! ```
//!
//! A job's input and output are locked onto the machine when it starts.
//! Completion is derived from the start instant and the clock.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use homestead_types::{ItemStack, MachineDefinition, MachinePhase, OwnedMachine, StockKey};

use crate::catalog::Catalog;
use crate::error::{FarmError, TransitionBlocked};
use crate::inventory::Inventory;
use crate::progress::{is_complete, progress};
use crate::report::{Correction, CorrectionKind, CorrectionTarget};

/// Processing fraction of the current job at `now`. Zero when idle.
pub fn progress_at(machine: &OwnedMachine, def: &MachineDefinition, now: DateTime<Utc>) -> Decimal {
    match (machine.is_processing, machine.started_at) {
        (true, Some(start)) => progress(start, def.processing_time_secs, now),
        _ => Decimal::ZERO,
    }
}

/// Current phase at `now`.
pub fn phase(machine: &OwnedMachine, def: &MachineDefinition, now: DateTime<Utc>) -> MachinePhase {
    if !machine.is_processing {
        MachinePhase::Idle
    } else if is_complete(progress_at(machine, def, now)) {
        MachinePhase::ReadyToCollect
    } else {
        MachinePhase::Processing
    }
}

/// Whether the inventory holds enough input to start a job.
pub fn has_input(def: &MachineDefinition, inventory: &Inventory) -> bool {
    inventory.has(StockKey::Produce(def.input.item), def.input.quantity)
}

/// Start a job on an idle machine, taking its input from the inventory.
///
/// Leaves both the machine and the inventory untouched on failure.
pub fn start(
    machine: &mut OwnedMachine,
    def: &MachineDefinition,
    inventory: &mut Inventory,
    catalog: &Catalog,
    now: DateTime<Utc>,
) -> Result<(), FarmError> {
    let current = phase(machine, def, now);
    if current != MachinePhase::Idle {
        return Err(TransitionBlocked::MachineBusy {
            machine: def.name.clone(),
            phase: current,
        }
        .into());
    }
    inventory
        .try_consume(StockKey::Produce(def.input.item), def.input.quantity)
        .map_err(|shortfall| shortfall.named(catalog.item_name(def.input.item)))?;

    machine.is_processing = true;
    machine.started_at = Some(now);
    machine.locked_input = Some(def.input);
    machine.locked_output = Some(def.output);
    tracing::debug!(machine = %def.name, input = %def.input.item, "machine started");
    Ok(())
}

/// Repair a machine whose job has no start time.
///
/// Phase and progress are derived on read, so a healthy machine is left
/// as it is.
pub fn reconcile(machine: &mut OwnedMachine) -> Option<Correction> {
    if machine.is_processing && machine.started_at.is_none() {
        tracing::warn!(
            machine = %machine.machine,
            "processing machine has no start time, resetting to idle"
        );
        machine.reset();
        return Some(Correction {
            target: CorrectionTarget::Machine {
                machine: machine.machine,
            },
            kind: CorrectionKind::StartTimeMissing,
        });
    }
    None
}

/// Collect a finished job into the inventory and return the machine to
/// idle. Returns the stack collected.
pub fn collect(
    machine: &mut OwnedMachine,
    def: &MachineDefinition,
    inventory: &mut Inventory,
    now: DateTime<Utc>,
) -> Result<ItemStack, FarmError> {
    let fraction = progress_at(machine, def, now);
    if !machine.is_processing || !is_complete(fraction) {
        return Err(TransitionBlocked::JobNotReady {
            machine: def.name.clone(),
            progress: fraction,
        }
        .into());
    }
    let output = machine.locked_output.unwrap_or(def.output);
    inventory.add(StockKey::Produce(output.item), output.quantity)?;
    machine.reset();
    Ok(output)
}
