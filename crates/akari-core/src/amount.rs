//! Fixed-point amount types.
//!
//! All balances are `u64` raw units at a scale of 1000 units per displayed
//! point/MYST, because task deltas may be fractional (0.2 per micro-task)
//! while every distribution rule floors. Intermediate products widen to
//! `u128`; division is integer division.

use crate::{AkariError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw units per displayed whole point/MYST.
pub const AMOUNT_SCALE: u64 = 1_000;

/// Non-negative points balance in raw units.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Points(pub u64);

impl Points {
    pub const ZERO: Points = Points(0);

    pub fn from_whole(n: u64) -> Result<Self> {
        n.checked_mul(AMOUNT_SCALE)
            .map(Points)
            .ok_or_else(|| AkariError::InvalidArgument("points amount overflow".into()))
    }

    pub fn raw(self) -> u64 {
        self.0
    }

    pub fn checked_add(self, other: Points) -> Result<Points> {
        self.0
            .checked_add(other.0)
            .map(Points)
            .ok_or_else(|| AkariError::Internal("points balance overflow".into()))
    }

    pub fn checked_sub(self, other: Points) -> Option<Points> {
        self.0.checked_sub(other.0).map(Points)
    }

    pub fn saturating_sub(self, other: Points) -> Points {
        Points(self.0.saturating_sub(other.0))
    }
}

impl fmt::Display for Points {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_scaled(f, self.0)
    }
}

/// Non-negative MYST balance in raw units. Burnable, never negative.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Myst(pub u64);

impl Myst {
    pub const ZERO: Myst = Myst(0);

    pub fn from_whole(n: u64) -> Result<Self> {
        n.checked_mul(AMOUNT_SCALE)
            .map(Myst)
            .ok_or_else(|| AkariError::InvalidArgument("myst amount overflow".into()))
    }

    pub fn raw(self) -> u64 {
        self.0
    }

    pub fn min(self, other: Myst) -> Myst {
        Myst(self.0.min(other.0))
    }

    pub fn checked_add(self, other: Myst) -> Result<Myst> {
        self.0
            .checked_add(other.0)
            .map(Myst)
            .ok_or_else(|| AkariError::Internal("myst balance overflow".into()))
    }

    pub fn checked_sub(self, other: Myst) -> Option<Myst> {
        self.0.checked_sub(other.0).map(Myst)
    }
}

impl fmt::Display for Myst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_scaled(f, self.0)
    }
}

/// Prize amount in USD cents. Confidential for unpaid rewards.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Usd(pub u64);

impl Usd {
    pub fn from_cents(cents: u64) -> Self {
        Usd(cents)
    }

    pub fn cents(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Usd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

fn write_scaled(f: &mut fmt::Formatter<'_>, raw: u64) -> fmt::Result {
    write!(f, "{}.{:03}", raw / AMOUNT_SCALE, raw % AMOUNT_SCALE)
}

/// Floor of `a * b / d` with a widened intermediate.
pub fn mul_div_floor(a: u64, b: u64, d: u64) -> Result<u64> {
    if d == 0 {
        return Err(AkariError::InvalidArgument("division by zero".into()));
    }
    let v = (a as u128) * (b as u128) / (d as u128);
    u64::try_from(v).map_err(|_| AkariError::Internal("amount overflow".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn whole_conversion_scales() {
        assert_eq!(Points::from_whole(5).unwrap(), Points(5_000));
        assert_eq!(Myst::from_whole(0).unwrap(), Myst::ZERO);
    }

    #[test]
    fn display_keeps_fractional_units() {
        assert_eq!(Points(200).to_string(), "0.200");
        assert_eq!(Myst(12_345).to_string(), "12.345");
        assert_eq!(Usd(150).to_string(), "1.50");
    }

    #[test]
    fn mul_div_floor_rejects_zero_divisor() {
        assert!(mul_div_floor(1, 1, 0).is_err());
    }

    #[test]
    fn mul_div_floor_widens_intermediate() {
        // u64::MAX * 2 overflows u64 but not u128.
        assert_eq!(mul_div_floor(u64::MAX, 2, 2).unwrap(), u64::MAX);
    }

    proptest! {
        #[test]
        fn mul_div_floor_never_exceeds_exact(a in 0u64..1_000_000, b in 0u64..1_000_000, d in 1u64..1_000_000) {
            let got = mul_div_floor(a, b, d).unwrap() as u128;
            let exact = (a as u128) * (b as u128) / (d as u128);
            prop_assert_eq!(got, exact);
        }
    }
}
