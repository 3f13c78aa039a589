use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod amount;
pub mod audit;
pub mod burn;
pub mod campaign;
pub mod config;
pub mod engine;
pub mod leaderboard;
pub mod settlement;
pub mod store;
pub mod tiers;
pub mod validation;

pub use amount::{Myst, Points, Usd};
pub use config::AkariConfig;
pub use engine::Engine;
pub use store::{LedgerState, LedgerStore, MemoryStore};
pub use tiers::{Tier, TierBands};

/// Telegram-mapped user identity, resolved by the outer auth layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PredictionId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RewardId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CampaignId(pub u64);

/// A user account holding both balances and the derived tier.
///
/// Invariants:
/// - Balances are non-negative by construction (`u64` fixed-point).
/// - `tier` is a pure function of `points` under the configured bands and is
///   recomputed on every points mutation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub user: UserId,
    pub points: Points,
    pub myst: Myst,
    pub tier: Tier,
}

/// Denomination a bet was staked in. Recorded for reporting; settlement
/// credits are always paid out on the points balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Denom {
    Points,
    Ton,
}

/// Immutable bet record. Created once, consumed only at settlement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bet {
    pub prediction: PredictionId,
    pub user: UserId,
    pub option: String,
    pub stake: u64,
    pub denom: Denom,
}

/// Prediction lifecycle. `Resolved` is terminal: no further bets, no
/// re-resolution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionState {
    Open,
    Resolved { winning_option: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub id: PredictionId,
    pub options: Vec<String>,
    pub pot: u64,
    pub closes_at_ms: i64,
    pub state: PredictionState,
}

impl Prediction {
    pub fn is_resolved(&self) -> bool {
        matches!(self.state, PredictionState::Resolved { .. })
    }
}

/// Weekly leaderboard prize unlocked by burning MYST.
///
/// `prize_usd` is persisted but must never serialize into a caller-facing
/// response while the reward is unpaid; only `status`, the required burn and
/// the recorded burn are exposed pre-payout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub id: RewardId,
    pub owner: UserId,
    pub prize_usd: Usd,
    pub status: RewardStatus,
    pub burned_myst: Myst,
    pub payout_wallet: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardStatus {
    PendingBurn,
    ReadyForPayout,
    Paid,
}

/// Raw engagement event attributed to a participant within a scope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompletionEvent {
    pub participant: UserId,
    pub kind: EventKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    TaskCompleted,
    LinkClick,
}

/// Unified error type for AKARI core operations.
///
/// Every domain check runs before any mutation; an error therefore implies
/// that no partial state was written.
#[derive(Debug, Error)]
pub enum AkariError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AkariError>;
