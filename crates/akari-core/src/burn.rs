//! MYST burn arithmetic for reward claims.
//!
//! The required burn is a fixed USD-to-MYST conversion used to display the
//! threshold. The burn itself is `min(balance, required)` with a floor
//! protection: a positive balance never burns zero, so a claim is never a
//! no-op while the user still holds MYST. Partial burns are accepted by
//! policy; the reward advances regardless of shortfall.

use crate::amount::{mul_div_floor, AMOUNT_SCALE};
use crate::{Myst, Result, Usd};

/// MYST required to unlock a prize of `prize_usd`.
///
/// `myst_per_usd` is in raw MYST units per whole USD (config policy).
pub fn required_burn(prize_usd: Usd, myst_per_usd: u64) -> Result<Myst> {
    mul_div_floor(prize_usd.cents(), myst_per_usd, 100).map(Myst)
}

/// Outcome of applying the burn rule to a balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BurnPlan {
    pub required: Myst,
    pub burned: Myst,
    pub remaining: Myst,
}

impl BurnPlan {
    pub fn shortfall(&self) -> Myst {
        Myst(self.required.raw().saturating_sub(self.burned.raw()))
    }
}

/// Compute the burn for a claim against `balance`.
///
/// Postconditions:
/// - `burned == min(balance, required)` unless that would be zero with a
///   positive balance, in which case up to one whole MYST is burned (a
///   sub-unit balance burns in full).
/// - `remaining == balance - burned`; never underflows.
pub fn plan(balance: Myst, required: Myst) -> BurnPlan {
    let mut burned = balance.min(required);
    if burned == Myst::ZERO && balance > Myst::ZERO {
        burned = balance.min(Myst(AMOUNT_SCALE));
    }
    BurnPlan {
        required,
        burned,
        remaining: Myst(balance.raw() - burned.raw()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn conversion_floors() {
        // $1.50 at 10 MYST per USD = 15 MYST.
        assert_eq!(required_burn(Usd(150), 10_000).unwrap(), Myst(15_000));
        // $0.01 at 10 MYST per USD floors to 0.1 MYST.
        assert_eq!(required_burn(Usd(1), 10_000).unwrap(), Myst(100));
    }

    #[test]
    fn sufficient_balance_burns_requirement() {
        let p = plan(Myst(20_000), Myst(15_000));
        assert_eq!(p.burned, Myst(15_000));
        assert_eq!(p.remaining, Myst(5_000));
        assert_eq!(p.shortfall(), Myst::ZERO);
    }

    #[test]
    fn short_balance_burns_everything() {
        let p = plan(Myst(4_000), Myst(15_000));
        assert_eq!(p.burned, Myst(4_000));
        assert_eq!(p.remaining, Myst::ZERO);
        assert_eq!(p.shortfall(), Myst(11_000));
    }

    #[test]
    fn sub_unit_balance_burns_in_full() {
        let p = plan(Myst(250), Myst(15_000));
        assert_eq!(p.burned, Myst(250));
        assert_eq!(p.remaining, Myst::ZERO);
    }

    #[test]
    fn zero_requirement_still_burns_one_unit() {
        let p = plan(Myst(5_000), Myst::ZERO);
        assert_eq!(p.burned, Myst(AMOUNT_SCALE));
        assert_eq!(p.remaining, Myst(4_000));
    }

    #[test]
    fn zero_balance_burns_nothing() {
        let p = plan(Myst::ZERO, Myst(15_000));
        assert_eq!(p.burned, Myst::ZERO);
        assert_eq!(p.remaining, Myst::ZERO);
    }

    proptest! {
        #[test]
        fn burn_is_bounded_by_balance(balance in 0u64..10_000_000, required in 0u64..10_000_000) {
            let p = plan(Myst(balance), Myst(required));
            prop_assert!(p.burned.raw() <= balance);
            prop_assert_eq!(p.burned.raw() + p.remaining.raw(), balance);
            if balance > 0 {
                prop_assert!(p.burned > Myst::ZERO);
            }
        }
    }
}
