//! Plot lifecycle: till, plant, water, grow, harvest.
//!
//! ```text
//! Empty -> Tilled -> NeedsWater -> Growing -> ReadyToHarvest -> Empty
//! ```
//!
//! Growth is measured from the plant time, counts only once the crop is
//! watered and is recomputed from the clock on every reconciliation. A crop
//! never harvests itself.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use homestead_ledger::water;
use homestead_types::{ItemId, PlayerState, Plot, PlotPhase, SeedDefinition, StockKey};

use crate::catalog::Catalog;
use crate::error::{FarmError, TransitionBlocked};
use crate::inventory::Inventory;
use crate::progress::{is_complete, progress};
use crate::report::{Correction, CorrectionKind, CorrectionTarget};

/// Water units used per watering.
pub const WATER_PER_PLOT: Decimal = Decimal::ONE;

/// Yield of one harvest.
pub const HARVEST_YIELD: u32 = 1;

/// Current phase, from the cached growth fraction.
pub fn phase(plot: &Plot) -> PlotPhase {
    if plot.is_planted() {
        if !plot.watered {
            PlotPhase::NeedsWater
        } else if is_complete(plot.growth_progress) {
            PlotPhase::ReadyToHarvest
        } else {
            PlotPhase::Growing
        }
    } else if plot.tilled {
        PlotPhase::Tilled
    } else {
        PlotPhase::Empty
    }
}

/// Growth fraction at `now`, measured from the plant time. Zero until
/// watered.
pub fn growth_at(plot: &Plot, seed: &SeedDefinition, now: DateTime<Utc>) -> Decimal {
    if !plot.watered {
        return Decimal::ZERO;
    }
    plot.planted_at.map_or(Decimal::ZERO, |start| {
        progress(start, seed.grow_time_secs, now)
    })
}

/// Till an empty plot.
pub fn till(plot: &mut Plot) -> Result<(), FarmError> {
    let current = phase(plot);
    if current != PlotPhase::Empty {
        return Err(TransitionBlocked::PlotNotEmpty {
            plot_number: plot.plot_number,
            phase: current,
        }
        .into());
    }
    plot.clear();
    plot.tilled = true;
    Ok(())
}

/// Plant one seed on a tilled plot, taking it from the inventory.
///
/// Leaves both the plot and the inventory untouched on failure.
pub fn plant(
    plot: &mut Plot,
    inventory: &mut Inventory,
    seed: &SeedDefinition,
    now: DateTime<Utc>,
) -> Result<(), FarmError> {
    let current = phase(plot);
    if current != PlotPhase::Tilled {
        return Err(TransitionBlocked::PlotNotTilled {
            plot_number: plot.plot_number,
            phase: current,
        }
        .into());
    }
    inventory
        .try_consume(StockKey::Seed(seed.id), 1)
        .map_err(|shortfall| shortfall.named(seed.name.as_str()))?;

    plot.clear();
    plot.planted_seed = Some(seed.id);
    plot.planted_at = Some(now);
    Ok(())
}

/// Water a planted, unwatered plot using one unit of the player's water.
pub fn water(plot: &mut Plot, player: &mut PlayerState) -> Result<(), FarmError> {
    if !plot.is_planted() {
        return Err(TransitionBlocked::NothingPlanted {
            plot_number: plot.plot_number,
        }
        .into());
    }
    if plot.watered {
        return Err(TransitionBlocked::AlreadyWatered {
            plot_number: plot.plot_number,
        }
        .into());
    }
    water::consume_water(player, WATER_PER_PLOT)?;
    plot.watered = true;
    Ok(())
}

/// Bring the cached growth fraction up to date at `now`.
///
/// A watered crop without a plant time is cleared to empty and reported.
/// The cached fraction never moves backwards.
pub fn reconcile(
    plot: &mut Plot,
    catalog: &Catalog,
    now: DateTime<Utc>,
) -> Result<Option<Correction>, FarmError> {
    let Some(seed_id) = plot.planted_seed else {
        plot.growth_progress = Decimal::ZERO;
        return Ok(None);
    };
    if !plot.watered {
        plot.growth_progress = Decimal::ZERO;
        return Ok(None);
    }
    if plot.planted_at.is_none() {
        tracing::warn!(
            plot_number = plot.plot_number,
            seed = %seed_id,
            "watered crop has no plant time, clearing plot"
        );
        plot.clear();
        return Ok(Some(Correction {
            target: CorrectionTarget::Plot {
                plot_number: plot.plot_number,
            },
            kind: CorrectionKind::PlantTimeMissing,
        }));
    }

    let seed = catalog.seed(seed_id)?;
    let fraction = growth_at(plot, seed, now);
    plot.growth_progress = plot.growth_progress.max(fraction).min(Decimal::ONE);
    Ok(None)
}

/// Harvest a fully grown crop into the inventory and clear the plot.
///
/// Returns the item harvested.
pub fn harvest(
    plot: &mut Plot,
    inventory: &mut Inventory,
    catalog: &Catalog,
    now: DateTime<Utc>,
) -> Result<ItemId, FarmError> {
    let Some(seed_id) = plot.planted_seed else {
        return Err(TransitionBlocked::NothingPlanted {
            plot_number: plot.plot_number,
        }
        .into());
    };
    let seed = catalog.seed(seed_id)?;
    let fraction = growth_at(plot, seed, now).max(if plot.watered {
        plot.growth_progress
    } else {
        Decimal::ZERO
    });
    if !is_complete(fraction) {
        return Err(TransitionBlocked::CropNotReady {
            plot_number: plot.plot_number,
            progress: fraction,
        }
        .into());
    }
    inventory.add(StockKey::Produce(seed.yields), HARVEST_YIELD)?;
    plot.clear();
    Ok(seed.yields)
}
