//! Ledger state and the store seam.
//!
//! Operations receive an explicitly constructed store handle; there is no
//! module-level client. `transaction` gives a closure exclusive access to a
//! scratch copy of the whole state: the scratch commits only when the
//! closure returns `Ok`, so an error can never leave partial writes behind.
//! Exclusive access also serializes concurrent operations targeting the same
//! prediction or reward; precondition checks re-run inside the closure.

use crate::campaign::Campaign;
use crate::leaderboard::LeaderboardRow;
use crate::{
    Account, AkariError, Bet, CampaignId, CompletionEvent, Prediction, PredictionId, Result,
    Reward, RewardId, UserId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Scope key for the platform-wide leaderboard; campaign scopes are derived
/// from [`Campaign::scope_key`].
pub const GLOBAL_SCOPE: &str = "global";

/// The whole persisted accounting state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct LedgerState {
    pub accounts: BTreeMap<UserId, Account>,
    pub predictions: BTreeMap<PredictionId, Prediction>,
    pub bets: Vec<Bet>,
    pub rewards: BTreeMap<RewardId, Reward>,
    pub campaigns: BTreeMap<CampaignId, Campaign>,
    pub events: BTreeMap<String, Vec<CompletionEvent>>,
    /// Advisory leaderboard snapshots; recompute always wins.
    pub boards: BTreeMap<String, Vec<LeaderboardRow>>,
}

impl LedgerState {
    pub fn account(&self, user: UserId) -> Result<&Account> {
        self.accounts
            .get(&user)
            .ok_or_else(|| AkariError::NotFound(format!("account {}", user.0)))
    }

    pub fn account_mut(&mut self, user: UserId) -> Result<&mut Account> {
        self.accounts
            .get_mut(&user)
            .ok_or_else(|| AkariError::NotFound(format!("account {}", user.0)))
    }

    pub fn bets_for(&self, prediction: PredictionId) -> impl Iterator<Item = &Bet> + '_ {
        self.bets.iter().filter(move |b| b.prediction == prediction)
    }
}

/// Transactional access to [`LedgerState`].
///
/// Implementations must:
/// - run `f` under exclusive access for `transaction`,
/// - commit the mutated state only when `f` returns `Ok`,
/// - discard every mutation when `f` returns `Err`.
pub trait LedgerStore: Send + Sync {
    fn with_state<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&LedgerState) -> Result<R>;

    fn transaction<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut LedgerState) -> Result<R>;
}

/// In-memory store for tests and ephemeral deployments.
pub struct MemoryStore {
    state: RwLock<LedgerState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(LedgerState::default()),
        }
    }

    pub fn with_initial(state: LedgerState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerStore for MemoryStore {
    fn with_state<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&LedgerState) -> Result<R>,
    {
        let state = self
            .state
            .read()
            .map_err(|_| AkariError::Internal("ledger lock poisoned".into()))?;
        f(&state)
    }

    fn transaction<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut LedgerState) -> Result<R>,
    {
        let mut state = self
            .state
            .write()
            .map_err(|_| AkariError::Internal("ledger lock poisoned".into()))?;
        let mut scratch = state.clone();
        let out = f(&mut scratch)?;
        *state = scratch;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Myst, Points, Tier};

    fn account(user: u64) -> Account {
        Account {
            user: UserId(user),
            points: Points::ZERO,
            myst: Myst::ZERO,
            tier: Tier(0),
        }
    }

    #[test]
    fn transaction_commits_on_ok() {
        let store = MemoryStore::new();
        store
            .transaction(|state| {
                state.accounts.insert(UserId(1), account(1));
                Ok(())
            })
            .unwrap();

        let count = store.with_state(|s| Ok(s.accounts.len())).unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn transaction_rolls_back_on_error() {
        let store = MemoryStore::new();
        let result: Result<()> = store.transaction(|state| {
            state.accounts.insert(UserId(1), account(1));
            Err(AkariError::InvalidState("abort".into()))
        });
        assert!(result.is_err());

        let count = store.with_state(|s| Ok(s.accounts.len())).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn missing_account_is_not_found() {
        let state = LedgerState::default();
        assert!(matches!(
            state.account(UserId(9)),
            Err(AkariError::NotFound(_))
        ));
    }
}
