//! Lot-size precision and quantity rounding.
//!
//! Exchange `LOT_SIZE` filters express the quantity increment as a decimal
//! string with a single significant digit, e.g. `"0.00100000"` or
//! `"1.00000000"`. The number of permitted decimals (the *tick*) is read
//! directly off the string:
//!
//! - step starting with `1`: `tick = 1 - position_of('.')`, so `"1.000"` gives 0
//!   and `"10.00"` gives -1 (multiples of ten)
//! - otherwise: `tick = position_of('1') - 1`, so `"0.001"` gives 3

use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Largest supported negative tick (step of `10^18`).
const MIN_TICK: i32 = -18;
/// Largest scale a `Decimal` can carry.
const MAX_TICK: i32 = 28;

/// The exchange trading rules for a symbol could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExchangeRuleError {
    /// The step size string is not a decimal with a single `1` digit.
    #[error("malformed LOT_SIZE step size '{0}'")]
    MalformedStepSize(String),

    /// The symbol has no `LOT_SIZE` filter.
    #[error("no LOT_SIZE filter for symbol {0}")]
    MissingLotSize(String),
}

/// Quantity increment derived from a `LOT_SIZE` step size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepSize {
    tick: i32,
}

impl StepSize {
    /// Parse a step size string such as `"0.00100000"`.
    ///
    /// # Errors
    /// `ExchangeRuleError::MalformedStepSize` if the string contains anything
    /// but digits and at most one `.`, has no `1`, or is out of range.
    pub fn parse(step_size: &str) -> Result<Self, ExchangeRuleError> {
        let s = step_size.trim();
        let malformed = || ExchangeRuleError::MalformedStepSize(step_size.to_string());

        let well_formed = !s.is_empty()
            && s.chars().all(|c| c.is_ascii_digit() || c == '.')
            && s.matches('.').count() <= 1;
        if !well_formed {
            return Err(malformed());
        }

        let first_one = s.find('1').ok_or_else(malformed)? as i32;
        let tick = if first_one == 0 {
            let point = s.find('.').unwrap_or(s.len()) as i32;
            1 - point
        } else {
            first_one - 1
        };

        if !(MIN_TICK..=MAX_TICK).contains(&tick) {
            return Err(malformed());
        }

        Ok(Self { tick })
    }

    /// Permitted number of decimals; negative for steps of ten or more.
    pub fn tick(&self) -> i32 {
        self.tick
    }

    /// Smallest quantity increment, `10^-tick`.
    pub fn increment(&self) -> Decimal {
        if self.tick >= 0 {
            Decimal::new(1, self.tick as u32)
        } else {
            Decimal::from(10i64.pow((-self.tick) as u32))
        }
    }

    /// Round `raw` down to a multiple of the increment.
    ///
    /// The result is never greater than `raw` and never negative.
    pub fn round_down(&self, raw: Decimal) -> Decimal {
        if raw <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        if self.tick >= 0 {
            raw.round_dp_with_strategy(self.tick as u32, RoundingStrategy::ToZero)
        } else {
            let increment = self.increment();
            (raw / increment).floor() * increment
        }
    }
}

impl FromStr for StepSize {
    type Err = ExchangeRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for StepSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.increment())
    }
}

/// Round `raw_quantity` down to the precision allowed by `step_size`.
pub fn rounded_quantity(
    raw_quantity: Decimal,
    step_size: &str,
) -> Result<Decimal, ExchangeRuleError> {
    Ok(StepSize::parse(step_size)?.round_down(raw_quantity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tick_from_fractional_step() {
        assert_eq!(StepSize::parse("0.00100000").unwrap().tick(), 3);
        assert_eq!(StepSize::parse("0.10000000").unwrap().tick(), 1);
        assert_eq!(StepSize::parse("0.00000001").unwrap().tick(), 8);
    }

    #[test]
    fn test_tick_from_whole_step() {
        assert_eq!(StepSize::parse("1.00000000").unwrap().tick(), 0);
        assert_eq!(StepSize::parse("10.00000000").unwrap().tick(), -1);
        assert_eq!(StepSize::parse("100").unwrap().tick(), -2);
        assert_eq!(StepSize::parse("1").unwrap().tick(), 0);
    }

    #[test]
    fn test_round_examples() {
        assert_eq!(rounded_quantity(dec!(1.23456), "0.00100000").unwrap(), dec!(1.234));
        assert_eq!(rounded_quantity(dec!(7.9), "1.00000000").unwrap(), dec!(7));
        assert_eq!(rounded_quantity(dec!(1234.5), "10.00000000").unwrap(), dec!(1230));
    }

    #[test]
    fn test_round_never_exceeds_input_and_is_a_multiple() {
        let steps = ["0.00000100", "0.00100000", "0.10000000", "1.00000000", "10.00000000"];
        let raws = [
            dec!(0.000001),
            dec!(0.0999999),
            dec!(1.23456789),
            dec!(19.99),
            dec!(123456.78901234),
        ];

        for step in steps {
            let step_size = StepSize::parse(step).unwrap();
            for raw in raws {
                let rounded = step_size.round_down(raw);
                assert!(rounded <= raw, "{} > {} for step {}", rounded, raw, step);
                assert!(rounded >= Decimal::ZERO);
                assert_eq!(
                    rounded % step_size.increment(),
                    Decimal::ZERO,
                    "{} not a multiple of {}",
                    rounded,
                    step
                );
                assert_eq!(step_size.round_down(rounded), rounded, "not idempotent");
            }
        }
    }

    #[test]
    fn test_round_non_positive_is_zero() {
        let step_size = StepSize::parse("0.01").unwrap();
        assert_eq!(step_size.round_down(Decimal::ZERO), Decimal::ZERO);
        assert_eq!(step_size.round_down(dec!(-3.5)), Decimal::ZERO);
        assert_eq!(step_size.round_down(dec!(0.009)), Decimal::ZERO);
    }

    #[test]
    fn test_malformed_step_sizes() {
        let too_fine = format!("0.{}1", "0".repeat(28));
        for bad in ["", "0.00500000", "abc1", "1.0.0", "-0.01", too_fine.as_str()] {
            assert_eq!(
                StepSize::parse(bad),
                Err(ExchangeRuleError::MalformedStepSize(bad.to_string())),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_display_increment() {
        assert_eq!(StepSize::parse("0.00100000").unwrap().to_string(), "0.001");
        assert_eq!(StepSize::parse("10.0").unwrap().to_string(), "10");
    }
}
