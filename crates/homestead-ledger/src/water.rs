//! The player's water supply.
//!
//! Water is not ticked. The level is derived from the last observation
//! instant, the refill rate and the current time, so any number of calls
//! at the same instant yield the same level.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use homestead_types::{PlayerState, ToolId, WateringCanStats};

use crate::LedgerError;

/// Bring the water level up to date at `now` and return the units gained.
///
/// The observation instant only moves forward. A `now` earlier than the
/// last observation (clock moved backwards) gains nothing and leaves the
/// instant where it was.
pub fn refill_water(player: &mut PlayerState, now: DateTime<Utc>) -> Decimal {
    let elapsed_ms = now
        .signed_duration_since(player.last_observed_at)
        .num_milliseconds();
    if elapsed_ms <= 0 {
        return Decimal::ZERO;
    }
    player.last_observed_at = now;

    let before = player.current_water;
    let gained = Decimal::from(elapsed_ms)
        .checked_div(Decimal::ONE_THOUSAND)
        .and_then(|secs| secs.checked_mul(player.refill_rate));
    let level = gained
        .and_then(|g| before.checked_add(g))
        .unwrap_or(player.max_water);
    player.current_water = level.min(player.max_water).max(Decimal::ZERO);
    player
        .current_water
        .checked_sub(before)
        .unwrap_or(Decimal::ZERO)
        .max(Decimal::ZERO)
}

/// Take `units` of water from the player.
///
/// Fails without touching the player when not enough water is held.
pub fn consume_water(player: &mut PlayerState, units: Decimal) -> Result<Decimal, LedgerError> {
    if units.is_sign_negative() {
        return Err(LedgerError::NegativeAmount { amount: units });
    }
    if player.current_water < units {
        return Err(LedgerError::InsufficientWater {
            required: units,
            available: player.current_water,
        });
    }
    player.current_water = player
        .current_water
        .checked_sub(units)
        .ok_or(LedgerError::ArithmeticOverflow("consume_water"))?;
    Ok(player.current_water)
}

/// Equip a watering can: adopt its capacity and refill rate.
///
/// Water already held is kept as is, only capped at the new capacity.
pub fn equip_watering_can(player: &mut PlayerState, tool: ToolId, stats: WateringCanStats) {
    player.selected_watering_can = Some(tool);
    player.max_water = stats.max_capacity;
    player.refill_rate = stats.refill_rate;
    player.current_water = player.current_water.min(player.max_water);
}

/// Fill the supply to capacity.
pub const fn fill_water(player: &mut PlayerState) {
    player.current_water = player.max_water;
}
