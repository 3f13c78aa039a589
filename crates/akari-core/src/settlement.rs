//! Prediction settlement arithmetic.
//!
//! Pure planning kernel: partitions bets into winners and losers, deducts the
//! house fee, and distributes the payout pool proportionally with floor
//! rounding. Rounding loss is not redistributed; it stays with the house.
//! Applying the plan (balance credits + state transition) is the engine's
//! job and happens inside a single store transaction.

use crate::amount::mul_div_floor;
use crate::{AkariError, Result, UserId};
use serde::{Deserialize, Serialize};

/// Fee denominator: fees are expressed in basis points.
pub const BPS_DENOM: u64 = 10_000;

/// Stake input to the planner, one per bet on the prediction.
#[derive(Clone, Debug, PartialEq)]
pub struct BetStake {
    pub user: UserId,
    pub option: String,
    pub stake: u64,
}

/// Payout owed to a single winning bet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutCredit {
    pub user: UserId,
    pub stake: u64,
    pub payout: u64,
}

/// Computed distribution for a resolved prediction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementPlan {
    pub winning_option: String,
    pub pot: u64,
    pub house_fee: u64,
    pub payout_pool: u64,
    pub winner_stake_total: u64,
    pub credits: Vec<PayoutCredit>,
}

impl SettlementPlan {
    pub fn paid_total(&self) -> u64 {
        self.credits.iter().map(|c| c.payout).sum()
    }
}

/// Compute the payout distribution for `pot` under `fee_bps`.
///
/// Postconditions:
/// - `house_fee == floor(pot * fee_bps / 10_000)` and
///   `payout_pool == pot - house_fee`.
/// - Sum of credits never exceeds `payout_pool`.
/// - No winning bets produce an empty credit list; the pool is retained by
///   the house. This is a deliberate edge case, not an error.
pub fn plan(
    pot: u64,
    fee_bps: u16,
    bets: &[BetStake],
    winning_option: &str,
) -> Result<SettlementPlan> {
    if u64::from(fee_bps) > BPS_DENOM {
        return Err(AkariError::InvalidArgument(format!(
            "fee {fee_bps} bps exceeds {BPS_DENOM}"
        )));
    }

    let house_fee = mul_div_floor(pot, u64::from(fee_bps), BPS_DENOM)?;
    let payout_pool = pot - house_fee;

    let winners: Vec<&BetStake> = bets.iter().filter(|b| b.option == winning_option).collect();
    let winner_stake_total = winners.iter().try_fold(0u64, |acc, b| {
        acc.checked_add(b.stake)
            .ok_or_else(|| AkariError::Internal("winning stake total overflow".into()))
    })?;

    let mut credits = Vec::with_capacity(winners.len());
    if winner_stake_total > 0 {
        for bet in winners {
            let payout = mul_div_floor(bet.stake, payout_pool, winner_stake_total)?;
            credits.push(PayoutCredit {
                user: bet.user,
                stake: bet.stake,
                payout,
            });
        }
    }

    Ok(SettlementPlan {
        winning_option: winning_option.to_string(),
        pot,
        house_fee,
        payout_pool,
        winner_stake_total,
        credits,
    })
}
