//! Configuration for the AKARI accounting core.
//!
//! # Configuration Sources
//!
//! Configuration can be loaded from:
//! - Environment variables (prefixed with `AKARI_`)
//! - A JSON configuration file (the server CLI)
//! - Programmatic defaults
//!
//! # Example
//!
//! ```rust,ignore
//! use akari_core::config::AkariConfig;
//!
//! let config = AkariConfig::builder()
//!     .fee_bps(500)
//!     .tier_thresholds(vec![5_000, 25_000, 100_000])
//!     .build()?;
//! ```

use crate::settlement::BPS_DENOM;
use crate::tiers::TierBands;
use crate::{AkariError, Result};
use serde::{Deserialize, Serialize};

/// Complete AKARI configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AkariConfig {
    pub ledger: LedgerConfig,
    pub settlement: SettlementConfig,
    pub rewards: RewardsConfig,
    pub leaderboard: LeaderboardConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Ascending tier thresholds in raw points units.
    pub tier_thresholds: Vec<u64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementConfig {
    /// House fee in basis points of the pot.
    pub fee_bps: u16,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardsConfig {
    /// Raw MYST units required per whole USD of prize value.
    pub myst_per_usd: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderboardConfig {
    /// Raw points credited per completion when scoring.
    pub points_per_completion: u64,
    /// Default number of ranked rows returned.
    pub top_n: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    pub level: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            // 5 / 25 / 100 / 500 displayed points.
            tier_thresholds: vec![5_000, 25_000, 100_000, 500_000],
        }
    }
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self { fee_bps: 500 }
    }
}

impl Default for RewardsConfig {
    fn default() -> Self {
        // 10 MYST per USD.
        Self { myst_per_usd: 10_000 }
    }
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            points_per_completion: 200,
            top_n: 10,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl Default for AkariConfig {
    fn default() -> Self {
        Self {
            ledger: LedgerConfig::default(),
            settlement: SettlementConfig::default(),
            rewards: RewardsConfig::default(),
            leaderboard: LeaderboardConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AkariConfig {
    pub fn builder() -> AkariConfigBuilder {
        AkariConfigBuilder::default()
    }

    /// Load configuration overrides from environment variables.
    ///
    /// Looks for variables prefixed with `AKARI_`:
    /// - `AKARI_FEE_BPS` - house fee in basis points
    /// - `AKARI_MYST_PER_USD` - raw MYST units per whole USD
    /// - `AKARI_POINTS_PER_COMPLETION` - raw points per completion
    /// - `AKARI_LEADERBOARD_TOP_N` - default leaderboard size
    /// - `AKARI_LOG_LEVEL` - logging level
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(fee) = env_parse::<u16>("AKARI_FEE_BPS")? {
            config.settlement.fee_bps = fee;
        }
        if let Some(rate) = env_parse::<u64>("AKARI_MYST_PER_USD")? {
            config.rewards.myst_per_usd = rate;
        }
        if let Some(points) = env_parse::<u64>("AKARI_POINTS_PER_COMPLETION")? {
            config.leaderboard.points_per_completion = points;
        }
        if let Some(top_n) = env_parse::<usize>("AKARI_LEADERBOARD_TOP_N")? {
            config.leaderboard.top_n = top_n;
        }
        if let Ok(level) = std::env::var("AKARI_LOG_LEVEL") {
            config.logging.level = level;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration (fail-closed).
    pub fn validate(&self) -> Result<()> {
        TierBands::new(self.ledger.tier_thresholds.clone())?;

        if u64::from(self.settlement.fee_bps) > BPS_DENOM {
            return Err(AkariError::InvalidArgument(format!(
                "fee_bps must be <= {BPS_DENOM}"
            )));
        }
        if self.rewards.myst_per_usd == 0 {
            return Err(AkariError::InvalidArgument(
                "myst_per_usd must be positive".into(),
            ));
        }
        if self.leaderboard.points_per_completion == 0 {
            return Err(AkariError::InvalidArgument(
                "points_per_completion must be positive".into(),
            ));
        }
        if self.leaderboard.top_n == 0 || self.leaderboard.top_n > 100 {
            return Err(AkariError::InvalidArgument(
                "leaderboard top_n must be in 1..=100".into(),
            ));
        }
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(AkariError::InvalidArgument(format!(
                "unknown log level: {other}"
            ))),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| AkariError::InvalidArgument(format!("invalid {name}: {e}"))),
        Err(_) => Ok(None),
    }
}

/// Configuration builder.
#[derive(Debug, Default)]
pub struct AkariConfigBuilder {
    config: AkariConfig,
}

impl AkariConfigBuilder {
    pub fn fee_bps(mut self, fee_bps: u16) -> Self {
        self.config.settlement.fee_bps = fee_bps;
        self
    }

    pub fn tier_thresholds(mut self, thresholds: Vec<u64>) -> Self {
        self.config.ledger.tier_thresholds = thresholds;
        self
    }

    pub fn myst_per_usd(mut self, rate: u64) -> Self {
        self.config.rewards.myst_per_usd = rate;
        self
    }

    pub fn points_per_completion(mut self, points: u64) -> Self {
        self.config.leaderboard.points_per_completion = points;
        self
    }

    pub fn leaderboard_top_n(mut self, top_n: usize) -> Self {
        self.config.leaderboard.top_n = top_n;
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn build(self) -> Result<AkariConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
