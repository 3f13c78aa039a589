//! Transactional application of the accounting kernels.
//!
//! The engine owns an injected store handle and applies each operation as a
//! single all-or-nothing transaction. Every precondition is (re)checked
//! inside the transaction closure, not only before it, so concurrent calls
//! against the same prediction or reward cannot race a check-then-act
//! window. No operation performs network I/O while a transaction is open.

use crate::audit::SettlementLog;
use crate::burn;
use crate::campaign::Campaign;
use crate::leaderboard::{self, LeaderboardRow};
use crate::settlement::{self, BetStake};
use crate::store::GLOBAL_SCOPE;
use crate::tiers::TierBands;
use crate::validation::{
    validate_option_set, validate_scope_key, validate_ton_wallet, MAX_BETS_PER_PREDICTION_V1,
    MAX_EVENTS_PER_SCOPE_V1,
};
use crate::{
    Account, AkariConfig, AkariError, Bet, CompletionEvent, Denom, EventKind, Myst, Points,
    Prediction, PredictionId, PredictionState, Result, Reward, RewardId, RewardStatus, Tier,
    UserId,
};
use crate::{LedgerState, LedgerStore};
use serde::{Deserialize, Serialize};

/// Result of a points mutation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsReceipt {
    pub balance: Points,
    pub tier: Tier,
}

/// One winning bet's applied credit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinnerCredit {
    pub user: UserId,
    pub stake: u64,
    pub payout: u64,
    pub new_balance: Points,
    pub tier: Tier,
}

/// Applied settlement for a resolved prediction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementReport {
    pub prediction: PredictionId,
    pub winning_option: String,
    pub pot: u64,
    pub house_fee: u64,
    pub payout_pool: u64,
    pub winners: Vec<WinnerCredit>,
}

/// Result of a reward claim.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimReceipt {
    pub burned_myst: Myst,
    pub new_balance: Myst,
    pub required_myst: Myst,
    pub status: RewardStatus,
}

/// Caller-facing view of an unpaid reward. Deliberately carries no USD
/// amount; see the confidentiality rule in the rewards module docs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRewardView {
    pub id: RewardId,
    pub status: RewardStatus,
    pub required_myst: Myst,
    pub burned_myst: Myst,
}

/// Caller-facing view of a paid reward; the prize amount is shown once paid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaidRewardView {
    pub id: RewardId,
    pub prize_usd_cents: u64,
    pub burned_myst: Myst,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardsOverview {
    pub balance: Myst,
    pub current: Vec<PendingRewardView>,
    pub past: Vec<PaidRewardView>,
}

/// The accounting engine: kernels + injected store handle.
pub struct Engine<S> {
    store: S,
    config: AkariConfig,
    bands: TierBands,
    settlement_log: Option<SettlementLog>,
}

impl<S: LedgerStore> Engine<S> {
    pub fn new(store: S, config: AkariConfig) -> Result<Self> {
        config.validate()?;
        let bands = TierBands::new(config.ledger.tier_thresholds.clone())?;
        Ok(Self {
            store,
            config,
            bands,
            settlement_log: None,
        })
    }

    /// Attach a settlement audit log. Appends happen after a settlement
    /// commits and are advisory; failures are logged, not surfaced.
    pub fn with_settlement_log(mut self, log: SettlementLog) -> Self {
        self.settlement_log = Some(log);
        self
    }

    pub fn config(&self) -> &AkariConfig {
        &self.config
    }

    pub fn tier_for(&self, points: Points) -> Tier {
        self.bands.tier_for(points)
    }

    fn retier(&self, account: &mut Account) {
        account.tier = self.bands.tier_for(account.points);
    }

    // =========================================================================
    // Accounts & points ledger
    // =========================================================================

    pub fn register_account(&self, user: UserId) -> Result<Account> {
        self.store.transaction(|state| {
            if state.accounts.contains_key(&user) {
                return Err(AkariError::InvalidState(format!(
                    "account {} already exists",
                    user.0
                )));
            }
            let account = Account {
                user,
                points: Points::ZERO,
                myst: Myst::ZERO,
                tier: self.bands.tier_for(Points::ZERO),
            };
            state.accounts.insert(user, account.clone());
            Ok(account)
        })
    }

    pub fn account(&self, user: UserId) -> Result<Account> {
        self.store.with_state(|state| state.account(user).cloned())
    }

    /// Apply a signed points delta and recompute the tier, atomically.
    ///
    /// A negative delta that would overdraw the balance fails with
    /// `InvalidArgument`; balances never go negative.
    pub fn apply_points_delta(&self, user: UserId, delta: i64) -> Result<PointsReceipt> {
        self.store.transaction(|state| {
            let account = state.account_mut(user)?;
            apply_delta(account, delta)?;
            self.retier(account);
            Ok(PointsReceipt {
                balance: account.points,
                tier: account.tier,
            })
        })
    }

    /// Administrative MYST credit (weekly prizes, corrections).
    pub fn credit_myst(&self, user: UserId, amount: Myst) -> Result<Myst> {
        self.store.transaction(|state| {
            let account = state.account_mut(user)?;
            account.myst = account.myst.checked_add(amount)?;
            Ok(account.myst)
        })
    }

    // =========================================================================
    // Predictions
    // =========================================================================

    pub fn create_prediction(
        &self,
        id: PredictionId,
        options: Vec<String>,
        closes_at_ms: i64,
    ) -> Result<()> {
        validate_option_set(&options)?;
        self.store.transaction(|state| {
            if state.predictions.contains_key(&id) {
                return Err(AkariError::InvalidState(format!(
                    "prediction {} already exists",
                    id.0
                )));
            }
            state.predictions.insert(
                id,
                Prediction {
                    id,
                    options,
                    pot: 0,
                    closes_at_ms,
                    state: PredictionState::Open,
                },
            );
            Ok(())
        })
    }

    /// Record a bet and grow the pot. Bets are immutable once placed.
    pub fn place_bet(
        &self,
        prediction_id: PredictionId,
        user: UserId,
        option: &str,
        stake: u64,
        denom: Denom,
        now_ms: i64,
    ) -> Result<u64> {
        if stake == 0 {
            return Err(AkariError::InvalidArgument("stake must be positive".into()));
        }
        self.store.transaction(|state| {
            state.account(user)?;
            let bet_count = state.bets_for(prediction_id).count();
            let prediction = state
                .predictions
                .get_mut(&prediction_id)
                .ok_or_else(|| AkariError::NotFound(format!("prediction {}", prediction_id.0)))?;
            if prediction.is_resolved() {
                return Err(AkariError::InvalidState(
                    "prediction is already resolved".into(),
                ));
            }
            if now_ms >= prediction.closes_at_ms {
                return Err(AkariError::InvalidState("betting window is closed".into()));
            }
            if !prediction.options.iter().any(|o| o == option) {
                return Err(AkariError::InvalidArgument(format!(
                    "option {option} is not part of the prediction"
                )));
            }
            if bet_count >= MAX_BETS_PER_PREDICTION_V1 {
                return Err(AkariError::InvalidArgument(format!(
                    "prediction is limited to {MAX_BETS_PER_PREDICTION_V1} bets"
                )));
            }
            prediction.pot = prediction
                .pot
                .checked_add(stake)
                .ok_or_else(|| AkariError::Internal("pot overflow".into()))?;
            let pot = prediction.pot;
            state.bets.push(Bet {
                prediction: prediction_id,
                user,
                option: option.to_string(),
                stake,
                denom,
            });
            Ok(pot)
        })
    }

    /// Resolve a prediction and distribute the payout pool.
    ///
    /// Preconditions (re-validated inside the transaction): the prediction
    /// exists, is unresolved, and `winning_option` is one of its options.
    /// Postconditions: every winner credit, every tier recompute and the
    /// terminal state transition commit together, or none do.
    pub fn resolve_prediction(
        &self,
        prediction_id: PredictionId,
        winning_option: &str,
    ) -> Result<SettlementReport> {
        let (report, plan) = self.store.transaction(|state| {
            let prediction = state
                .predictions
                .get(&prediction_id)
                .ok_or_else(|| AkariError::NotFound(format!("prediction {}", prediction_id.0)))?;
            if prediction.is_resolved() {
                return Err(AkariError::InvalidState(
                    "prediction is already resolved".into(),
                ));
            }
            if !prediction.options.iter().any(|o| o == winning_option) {
                return Err(AkariError::InvalidArgument(format!(
                    "option {winning_option} is not part of the prediction"
                )));
            }

            let stakes: Vec<BetStake> = state
                .bets_for(prediction_id)
                .map(|bet| BetStake {
                    user: bet.user,
                    option: bet.option.clone(),
                    stake: bet.stake,
                })
                .collect();
            let plan = settlement::plan(
                prediction.pot,
                self.config.settlement.fee_bps,
                &stakes,
                winning_option,
            )?;

            let mut winners = Vec::with_capacity(plan.credits.len());
            for credit in &plan.credits {
                // A bet referencing a missing account is a data integrity
                // failure, not a caller error.
                let account = state.accounts.get_mut(&credit.user).ok_or_else(|| {
                    AkariError::Internal(format!("bet references missing account {}", credit.user.0))
                })?;
                account.points = account.points.checked_add(Points(credit.payout))?;
                self.retier(account);
                winners.push(WinnerCredit {
                    user: credit.user,
                    stake: credit.stake,
                    payout: credit.payout,
                    new_balance: account.points,
                    tier: account.tier,
                });
            }

            let prediction = state
                .predictions
                .get_mut(&prediction_id)
                .ok_or_else(|| AkariError::Internal("prediction vanished mid-transaction".into()))?;
            prediction.state = PredictionState::Resolved {
                winning_option: winning_option.to_string(),
            };

            let report = SettlementReport {
                prediction: prediction_id,
                winning_option: winning_option.to_string(),
                pot: plan.pot,
                house_fee: plan.house_fee,
                payout_pool: plan.payout_pool,
                winners,
            };
            Ok((report, plan))
        })?;

        if let Some(log) = &self.settlement_log {
            if let Err(e) = log.append(prediction_id, &plan) {
                tracing::warn!(
                    prediction = prediction_id.0,
                    "settlement log append failed: {e}"
                );
            }
        }

        Ok(report)
    }

    // =========================================================================
    // Rewards & MYST burn
    // =========================================================================

    pub fn grant_reward(&self, id: RewardId, owner: UserId, prize_usd_cents: u64) -> Result<()> {
        self.store.transaction(|state| {
            state.account(owner)?;
            if state.rewards.contains_key(&id) {
                return Err(AkariError::InvalidState(format!(
                    "reward {} already exists",
                    id.0
                )));
            }
            state.rewards.insert(
                id,
                Reward {
                    id,
                    owner,
                    prize_usd: crate::Usd::from_cents(prize_usd_cents),
                    status: RewardStatus::PendingBurn,
                    burned_myst: Myst::ZERO,
                    payout_wallet: None,
                },
            );
            Ok(())
        })
    }

    /// Claim a reward by burning MYST.
    ///
    /// Burns `min(balance, required)` with the ≥1-unit floor protection and
    /// advances the reward to `ReadyForPayout` regardless of shortfall;
    /// partial burns are accepted by policy. Balance decrement and reward
    /// mutation are one transaction.
    pub fn claim_reward_with_burn(
        &self,
        user: UserId,
        reward_id: RewardId,
        payout_wallet: Option<String>,
    ) -> Result<ClaimReceipt> {
        if let Some(wallet) = &payout_wallet {
            validate_ton_wallet(wallet)?;
        }
        self.store.transaction(|state| {
            let reward = state
                .rewards
                .get(&reward_id)
                .ok_or_else(|| AkariError::NotFound(format!("reward {}", reward_id.0)))?;
            // Not owned by the caller presents as absent.
            if reward.owner != user {
                return Err(AkariError::NotFound(format!("reward {}", reward_id.0)));
            }
            if reward.status != RewardStatus::PendingBurn {
                return Err(AkariError::InvalidState(
                    "reward is not awaiting a burn".into(),
                ));
            }

            let required = burn::required_burn(reward.prize_usd, self.config.rewards.myst_per_usd)?;
            let account = state.account_mut(user)?;
            let plan = burn::plan(account.myst, required);
            account.myst = plan.remaining;

            let reward = state
                .rewards
                .get_mut(&reward_id)
                .ok_or_else(|| AkariError::Internal("reward vanished mid-transaction".into()))?;
            reward.burned_myst = plan.burned;
            reward.status = RewardStatus::ReadyForPayout;
            if payout_wallet.is_some() {
                reward.payout_wallet = payout_wallet;
            }

            Ok(ClaimReceipt {
                burned_myst: plan.burned,
                new_balance: plan.remaining,
                required_myst: required,
                status: RewardStatus::ReadyForPayout,
            })
        })
    }

    /// Administrative terminal transition after the prize was paid out.
    pub fn mark_reward_paid(&self, reward_id: RewardId) -> Result<()> {
        self.store.transaction(|state| {
            let reward = state
                .rewards
                .get_mut(&reward_id)
                .ok_or_else(|| AkariError::NotFound(format!("reward {}", reward_id.0)))?;
            if reward.status != RewardStatus::ReadyForPayout {
                return Err(AkariError::InvalidState(
                    "reward is not ready for payout".into(),
                ));
            }
            reward.status = RewardStatus::Paid;
            Ok(())
        })
    }

    /// Current and past rewards for a user, with the confidentiality rule
    /// applied: unpaid prize amounts never leave this method.
    pub fn rewards_overview(&self, user: UserId) -> Result<RewardsOverview> {
        self.store.with_state(|state| {
            let account = state.account(user)?;
            let mut current = Vec::new();
            let mut past = Vec::new();
            for reward in state.rewards.values().filter(|r| r.owner == user) {
                match reward.status {
                    RewardStatus::PendingBurn | RewardStatus::ReadyForPayout => {
                        current.push(PendingRewardView {
                            id: reward.id,
                            status: reward.status,
                            required_myst: burn::required_burn(
                                reward.prize_usd,
                                self.config.rewards.myst_per_usd,
                            )?,
                            burned_myst: reward.burned_myst,
                        });
                    }
                    RewardStatus::Paid => {
                        past.push(PaidRewardView {
                            id: reward.id,
                            prize_usd_cents: reward.prize_usd.cents(),
                            burned_myst: reward.burned_myst,
                        });
                    }
                }
            }
            Ok(RewardsOverview {
                balance: account.myst,
                current,
                past,
            })
        })
    }

    // =========================================================================
    // Campaigns & leaderboards
    // =========================================================================

    pub fn create_campaign(&self, campaign: Campaign) -> Result<()> {
        self.store.transaction(|state| {
            if state.campaigns.contains_key(&campaign.id) {
                return Err(AkariError::InvalidState(format!(
                    "campaign {} already exists",
                    campaign.id.0
                )));
            }
            state.campaigns.insert(campaign.id, campaign);
            Ok(())
        })
    }

    /// Attribute one completion/click event to a participant within a scope.
    pub fn record_completion(&self, scope: &str, user: UserId, kind: EventKind) -> Result<u64> {
        validate_scope_key(scope)?;
        self.store.transaction(|state| {
            scope_exists(state, scope)?;
            state.account(user)?;
            let events = state.events.entry(scope.to_string()).or_default();
            if events.len() >= MAX_EVENTS_PER_SCOPE_V1 {
                return Err(AkariError::InvalidArgument(format!(
                    "scope is limited to {MAX_EVENTS_PER_SCOPE_V1} events"
                )));
            }
            events.push(CompletionEvent {
                participant: user,
                kind,
            });
            Ok(events.len() as u64)
        })
    }

    /// Compute the ranked board for a scope from its raw events.
    pub fn compute_leaderboard(
        &self,
        scope: &str,
        top_n: Option<usize>,
    ) -> Result<Vec<LeaderboardRow>> {
        validate_scope_key(scope)?;
        let top_n = top_n.unwrap_or(self.config.leaderboard.top_n);
        self.store.with_state(|state| {
            scope_exists(state, scope)?;
            let events = state.events.get(scope).map(Vec::as_slice).unwrap_or(&[]);
            leaderboard::compute(events, self.config.leaderboard.points_per_completion, top_n)
        })
    }

    /// Recompute and persist the advisory snapshot for a scope.
    pub fn snapshot_leaderboard(&self, scope: &str) -> Result<Vec<LeaderboardRow>> {
        validate_scope_key(scope)?;
        self.store.transaction(|state| {
            scope_exists(state, scope)?;
            let events = state.events.get(scope).map(Vec::as_slice).unwrap_or(&[]);
            let rows = leaderboard::compute(
                events,
                self.config.leaderboard.points_per_completion,
                self.config.leaderboard.top_n,
            )?;
            state.boards.insert(scope.to_string(), rows.clone());
            Ok(rows)
        })
    }
}

fn scope_exists(state: &LedgerState, scope: &str) -> Result<()> {
    if scope == GLOBAL_SCOPE {
        return Ok(());
    }
    let known = state.campaigns.values().any(|c| c.scope_key() == scope);
    if known {
        Ok(())
    } else {
        Err(AkariError::NotFound(format!("scope {scope}")))
    }
}

fn apply_delta(account: &mut Account, delta: i64) -> Result<()> {
    if delta >= 0 {
        account.points = account.points.checked_add(Points(delta as u64))?;
        return Ok(());
    }
    let debit = Points(delta.unsigned_abs());
    match account.points.checked_sub(debit) {
        Some(points) => {
            account.points = points;
            Ok(())
        }
        None => Err(AkariError::InvalidArgument(format!(
            "delta of -{debit} would overdraw balance {}",
            account.points
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    fn engine() -> Engine<MemoryStore> {
        Engine::new(MemoryStore::new(), AkariConfig::default()).unwrap()
    }

    #[test]
    fn delta_on_missing_user_is_not_found() {
        let engine = engine();
        assert!(matches!(
            engine.apply_points_delta(UserId(1), 100),
            Err(AkariError::NotFound(_))
        ));
    }

    #[test]
    fn delta_updates_balance_and_tier_together() {
        let engine = engine();
        engine.register_account(UserId(1)).unwrap();

        let receipt = engine.apply_points_delta(UserId(1), 4_999).unwrap();
        assert_eq!(receipt.tier, Tier(0));

        let receipt = engine.apply_points_delta(UserId(1), 1).unwrap();
        assert_eq!(receipt.balance, Points(5_000));
        assert_eq!(receipt.tier, Tier(1));
    }

    #[test]
    fn overdraw_fails_and_leaves_balance() {
        let engine = engine();
        engine.register_account(UserId(1)).unwrap();
        engine.apply_points_delta(UserId(1), 100).unwrap();

        assert!(matches!(
            engine.apply_points_delta(UserId(1), -200),
            Err(AkariError::InvalidArgument(_))
        ));
        assert_eq!(engine.account(UserId(1)).unwrap().points, Points(100));
    }

    #[test]
    fn bet_on_unknown_option_is_rejected() {
        let engine = engine();
        engine.register_account(UserId(1)).unwrap();
        engine
            .create_prediction(PredictionId(1), vec!["yes".into(), "no".into()], 10_000)
            .unwrap();

        assert!(matches!(
            engine.place_bet(PredictionId(1), UserId(1), "maybe", 100, Denom::Points, 0),
            Err(AkariError::InvalidArgument(_))
        ));
    }

    #[test]
    fn bet_after_close_is_rejected() {
        let engine = engine();
        engine.register_account(UserId(1)).unwrap();
        engine
            .create_prediction(PredictionId(1), vec!["yes".into(), "no".into()], 1_000)
            .unwrap();

        assert!(matches!(
            engine.place_bet(PredictionId(1), UserId(1), "yes", 100, Denom::Points, 1_000),
            Err(AkariError::InvalidState(_))
        ));
    }

    #[test]
    fn claim_with_invalid_wallet_never_opens_a_transaction() {
        let engine = engine();
        let result = engine.claim_reward_with_burn(UserId(1), RewardId(1), Some("bogus".into()));
        assert!(matches!(result, Err(AkariError::InvalidArgument(_))));
    }

    #[test]
    fn claim_of_foreign_reward_presents_as_absent() {
        let engine = engine();
        engine.register_account(UserId(1)).unwrap();
        engine.register_account(UserId(2)).unwrap();
        engine.grant_reward(RewardId(7), UserId(1), 100).unwrap();

        assert!(matches!(
            engine.claim_reward_with_burn(UserId(2), RewardId(7), None),
            Err(AkariError::NotFound(_))
        ));
    }

    #[test]
    fn completion_in_unknown_scope_is_not_found() {
        let engine = engine();
        engine.register_account(UserId(1)).unwrap();
        assert!(matches!(
            engine.record_completion("campaign-9", UserId(1), EventKind::TaskCompleted),
            Err(AkariError::NotFound(_))
        ));
    }
}
