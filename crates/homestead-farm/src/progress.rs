//! Elapsed-time progress shared by crop growth and machine processing.
//!
//! Progress is never stored as the source of truth. It is recomputed from
//! a start instant, a duration and the current time.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

/// Fraction of `duration_secs` elapsed between `start` and `now`, clamped
/// to `[0, 1]`.
///
/// A zero duration completes instantly. A `now` before `start` yields 0.
pub fn progress(start: DateTime<Utc>, duration_secs: u32, now: DateTime<Utc>) -> Decimal {
    if duration_secs == 0 {
        return Decimal::ONE;
    }
    let elapsed_ms = now.signed_duration_since(start).num_milliseconds();
    if elapsed_ms <= 0 {
        return Decimal::ZERO;
    }
    let total_ms = u64::from(duration_secs).saturating_mul(1000);
    Decimal::from(elapsed_ms)
        .checked_div(Decimal::from(total_ms))
        .map_or(Decimal::ONE, |fraction| fraction.min(Decimal::ONE))
}

/// Whether a progress fraction is complete.
pub fn is_complete(fraction: Decimal) -> bool {
    fraction >= Decimal::ONE
}

/// Whole percent for display, rounded half away from zero.
pub fn percent(fraction: Decimal) -> Decimal {
    fraction
        .checked_mul(Decimal::ONE_HUNDRED)
        .unwrap_or(Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use rust_decimal_macros::dec;

    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + Duration::days(20_000)
    }

    #[test]
    fn zero_duration_is_complete() {
        assert_eq!(progress(t0(), 0, t0()), Decimal::ONE);
        assert_eq!(progress(t0(), 0, t0() - Duration::hours(1)), Decimal::ONE);
    }

    #[test]
    fn linear_between_start_and_end() {
        assert_eq!(progress(t0(), 10, t0()), Decimal::ZERO);
        assert_eq!(progress(t0(), 10, t0() + Duration::seconds(4)), dec!(0.4));
        assert_eq!(progress(t0(), 10, t0() + Duration::milliseconds(2500)), dec!(0.25));
        assert_eq!(progress(t0(), 10, t0() + Duration::seconds(10)), Decimal::ONE);
    }

    #[test]
    fn clamped_to_unit_interval() {
        assert_eq!(progress(t0(), 5, t0() - Duration::seconds(3)), Decimal::ZERO);
        assert_eq!(progress(t0(), 5, t0() + Duration::days(3)), Decimal::ONE);
    }

    #[test]
    fn monotonic_in_now() {
        let mut last = Decimal::ZERO;
        for ms in (0..12_000).step_by(250) {
            let p = progress(t0(), 7, t0() + Duration::milliseconds(ms));
            assert!(p >= last);
            assert!(p >= Decimal::ZERO && p <= Decimal::ONE);
            last = p;
        }
    }

    #[test]
    fn percent_rounds_for_display() {
        assert_eq!(percent(dec!(0.4)), dec!(40));
        assert_eq!(percent(dec!(0.125)), dec!(13));
        assert_eq!(percent(Decimal::ONE), dec!(100));
        assert!(is_complete(Decimal::ONE));
        assert!(!is_complete(dec!(0.999)));
    }
}
