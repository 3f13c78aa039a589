//! Tier bands derived from cumulative points.
//!
//! A tier is a pure function of the current points balance under an ordered
//! list of ascending thresholds: the index of the first threshold the balance
//! falls below is the tier; at or above the top threshold the account holds
//! the highest tier. No hysteresis.

use crate::{AkariError, Points, Result};
use serde::{Deserialize, Serialize};

/// Discrete user rank. `Tier(0)` is the entry band; the highest value equals
/// the number of configured thresholds.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Tier(pub u8);

/// Validated, strictly ascending threshold table (raw points units).
#[derive(Clone, Debug, PartialEq)]
pub struct TierBands {
    thresholds: Vec<u64>,
}

impl TierBands {
    pub fn new(thresholds: Vec<u64>) -> Result<Self> {
        if thresholds.is_empty() {
            return Err(AkariError::InvalidArgument(
                "tier thresholds must not be empty".into(),
            ));
        }
        if thresholds.len() > u8::MAX as usize {
            return Err(AkariError::InvalidArgument("too many tier thresholds".into()));
        }
        for pair in thresholds.windows(2) {
            if pair[0] >= pair[1] {
                return Err(AkariError::InvalidArgument(
                    "tier thresholds must be strictly ascending".into(),
                ));
            }
        }
        Ok(Self { thresholds })
    }

    pub fn tier_for(&self, points: Points) -> Tier {
        for (idx, threshold) in self.thresholds.iter().enumerate() {
            if points.raw() < *threshold {
                return Tier(idx as u8);
            }
        }
        Tier(self.thresholds.len() as u8)
    }

    /// Total number of tiers, including the entry band below the first
    /// threshold.
    pub fn tier_count(&self) -> usize {
        self.thresholds.len() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bands() -> TierBands {
        TierBands::new(vec![5_000, 25_000, 100_000]).unwrap()
    }

    #[test]
    fn rejects_unordered_thresholds() {
        assert!(TierBands::new(vec![10, 10]).is_err());
        assert!(TierBands::new(vec![20, 10]).is_err());
        assert!(TierBands::new(vec![]).is_err());
    }

    #[test]
    fn entry_band_below_first_threshold() {
        assert_eq!(bands().tier_for(Points(0)), Tier(0));
        assert_eq!(bands().tier_for(Points(4_999)), Tier(0));
    }

    #[test]
    fn threshold_boundary_promotes() {
        assert_eq!(bands().tier_for(Points(5_000)), Tier(1));
        assert_eq!(bands().tier_for(Points(24_999)), Tier(1));
        assert_eq!(bands().tier_for(Points(25_000)), Tier(2));
    }

    #[test]
    fn top_threshold_yields_highest_tier() {
        assert_eq!(bands().tier_for(Points(100_000)), Tier(3));
        assert_eq!(bands().tier_for(Points(u64::MAX)), Tier(3));
        assert_eq!(bands().tier_count(), 4);
    }
}
