//! Native ledger amounts.
//!
//! Amounts are fixed-point integers (u128) of the ledger's base unit,
//! the "drop". One display unit (MPX) is 1,000,000 drops. Floating point
//! never appears; display conversion is exact decimal string handling.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use thiserror::Error;

/// Number of drops in one display unit (MPX).
pub const DROPS_PER_UNIT: u128 = 1_000_000;

/// Maximum number of decimal places a display amount may carry.
const DISPLAY_SCALE: u32 = 6;

/// Errors arising from amount parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("invalid amount: {0}")]
    Invalid(String),

    #[error("amount has more than {DISPLAY_SCALE} decimal places: {0}")]
    TooPrecise(String),

    #[error("amount overflows the representable range: {0}")]
    Overflow(String),
}

/// A non-negative quantity of the ledger's base unit (drops).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Self = Self(0);

    /// Create an amount from a raw drop count.
    pub fn from_drops(drops: u128) -> Self {
        Self(drops)
    }

    /// Create an amount from a whole number of display units.
    pub fn from_units(units: u128) -> Self {
        Self(units * DROPS_PER_UNIT)
    }

    pub fn drops(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// Parse a drop count from its decimal string form (the node's wire
    /// representation of native balances).
    pub fn parse_drops(s: &str) -> Result<Self, AmountError> {
        s.parse::<u128>()
            .map(Self)
            .map_err(|_| AmountError::Invalid(s.to_string()))
    }

    /// Parse a display amount such as `"1000"` or `"12.5"` into drops.
    pub fn parse_display(s: &str) -> Result<Self, AmountError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AmountError::Invalid(s.to_string()));
        }

        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };
        if frac.len() as u32 > DISPLAY_SCALE {
            return Err(AmountError::TooPrecise(s.to_string()));
        }
        if whole.is_empty() && frac.is_empty() {
            return Err(AmountError::Invalid(s.to_string()));
        }

        let whole_drops = if whole.is_empty() {
            0
        } else {
            whole
                .parse::<u128>()
                .map_err(|_| AmountError::Invalid(s.to_string()))?
                .checked_mul(DROPS_PER_UNIT)
                .ok_or_else(|| AmountError::Overflow(s.to_string()))?
        };

        let frac_drops = if frac.is_empty() {
            0
        } else {
            let parsed = frac
                .parse::<u128>()
                .map_err(|_| AmountError::Invalid(s.to_string()))?;
            parsed * 10u128.pow(DISPLAY_SCALE - frac.len() as u32)
        };

        whole_drops
            .checked_add(frac_drops)
            .map(Self)
            .ok_or_else(|| AmountError::Overflow(s.to_string()))
    }

    /// Format as display units, trimming trailing fractional zeros.
    pub fn to_display(&self) -> String {
        let whole = self.0 / DROPS_PER_UNIT;
        let frac = self.0 % DROPS_PER_UNIT;
        if frac == 0 {
            return whole.to_string();
        }
        let frac_str = format!("{frac:06}");
        format!("{}.{}", whole, frac_str.trim_end_matches('0'))
    }
}

impl Add for Amount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Amount {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} MPX", self.to_display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_whole_units() {
        assert_eq!(Amount::parse_display("1000").unwrap(), Amount::from_units(1000));
    }

    #[test]
    fn parse_fractional() {
        assert_eq!(
            Amount::parse_display("12.5").unwrap(),
            Amount::from_drops(12_500_000)
        );
        assert_eq!(
            Amount::parse_display("0.000001").unwrap(),
            Amount::from_drops(1)
        );
    }

    #[test]
    fn parse_leading_dot() {
        assert_eq!(Amount::parse_display(".5").unwrap(), Amount::from_drops(500_000));
    }

    #[test]
    fn rejects_excess_precision() {
        assert!(matches!(
            Amount::parse_display("1.0000001"),
            Err(AmountError::TooPrecise(_))
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert!(Amount::parse_display("").is_err());
        assert!(Amount::parse_display(".").is_err());
        assert!(Amount::parse_display("12a").is_err());
        assert!(Amount::parse_display("-5").is_err());
    }

    #[test]
    fn display_trims_zeros() {
        assert_eq!(Amount::from_drops(12_500_000).to_display(), "12.5");
        assert_eq!(Amount::from_units(7).to_display(), "7");
    }

    #[test]
    fn drops_roundtrip() {
        let a = Amount::parse_drops("123456789").unwrap();
        assert_eq!(a.drops(), 123_456_789);
    }

    #[test]
    fn checked_arithmetic() {
        let a = Amount::from_drops(10);
        let b = Amount::from_drops(3);
        assert_eq!(a.checked_sub(b), Some(Amount::from_drops(7)));
        assert_eq!(b.checked_sub(a), None);
        assert_eq!(b.saturating_sub(a), Amount::ZERO);
    }
}
