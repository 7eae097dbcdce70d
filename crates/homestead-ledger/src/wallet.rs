//! Money debits and credits.
//!
//! Every mutation re-rounds the balance to two decimal places with
//! banker's rounding, so the balance never accumulates sub-cent noise.

use rust_decimal::Decimal;

use homestead_types::PlayerState;

use crate::LedgerError;

/// Decimal places kept on money values.
pub const MONEY_SCALE: u32 = 2;

/// Round a money value to cents (midpoint to even).
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp(MONEY_SCALE)
}

/// Whether the player can pay `amount`.
pub fn can_afford(player: &PlayerState, amount: Decimal) -> bool {
    !amount.is_sign_negative() && amount <= player.money
}

/// Debit `amount` from the player and return the new balance.
///
/// Fails without touching the player when the balance is too low.
pub fn spend(player: &mut PlayerState, amount: Decimal) -> Result<Decimal, LedgerError> {
    if amount.is_sign_negative() {
        return Err(LedgerError::NegativeAmount { amount });
    }
    if amount > player.money {
        return Err(LedgerError::InsufficientFunds {
            required: amount,
            available: player.money,
        });
    }
    let remaining = player
        .money
        .checked_sub(amount)
        .ok_or(LedgerError::ArithmeticOverflow("spend"))?;
    player.money = round_money(remaining);
    Ok(player.money)
}

/// Credit `amount` to the player and return the new balance.
pub fn credit(player: &mut PlayerState, amount: Decimal) -> Result<Decimal, LedgerError> {
    if amount.is_sign_negative() {
        return Err(LedgerError::NegativeAmount { amount });
    }
    let total = player
        .money
        .checked_add(amount)
        .ok_or(LedgerError::ArithmeticOverflow("credit"))?;
    player.money = round_money(total);
    Ok(player.money)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal_macros::dec;

    use super::*;

    fn player(money: Decimal) -> PlayerState {
        PlayerState::new(money, Utc::now())
    }

    #[test]
    fn spend_debits_and_returns_balance() {
        let mut p = player(dec!(100));
        assert_eq!(spend(&mut p, dec!(6)), Ok(dec!(94)));
        assert_eq!(p.money, dec!(94));
    }

    #[test]
    fn spend_exact_balance_reaches_zero() {
        let mut p = player(dec!(50));
        assert_eq!(spend(&mut p, dec!(50)), Ok(Decimal::ZERO));
    }

    #[test]
    fn overspend_leaves_balance_untouched() {
        let mut p = player(dec!(5));
        let result = spend(&mut p, dec!(5.01));
        assert_eq!(
            result,
            Err(LedgerError::InsufficientFunds {
                required: dec!(5.01),
                available: dec!(5),
            })
        );
        assert_eq!(p.money, dec!(5));
    }

    #[test]
    fn negative_amounts_rejected() {
        let mut p = player(dec!(5));
        assert!(matches!(spend(&mut p, dec!(-1)), Err(LedgerError::NegativeAmount { .. })));
        assert!(matches!(credit(&mut p, dec!(-1)), Err(LedgerError::NegativeAmount { .. })));
        assert_eq!(p.money, dec!(5));
    }

    #[test]
    fn credit_rounds_to_cents() {
        let mut p = player(dec!(1));
        assert_eq!(credit(&mut p, dec!(0.125)), Ok(dec!(1.12)));
        assert_eq!(credit(&mut p, dec!(0.005)), Ok(dec!(1.12)));
    }

    #[test]
    fn bankers_rounding() {
        assert_eq!(round_money(dec!(2.345)), dec!(2.34));
        assert_eq!(round_money(dec!(2.355)), dec!(2.36));
    }

    #[test]
    fn affordability() {
        let p = player(dec!(10));
        assert!(can_afford(&p, dec!(10)));
        assert!(can_afford(&p, Decimal::ZERO));
        assert!(!can_afford(&p, dec!(10.01)));
    }
}
