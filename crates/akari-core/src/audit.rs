//! Settlement audit log.
//!
//! Append-only JSONL file of resolved predictions:
//! - one record per settlement,
//! - hash-chained records (anti-equivocation within the log),
//! - deterministic record hash with domain separation.
//!
//! The log is advisory: it is written after the settlement transaction
//! commits, and an append failure never turns into a settlement failure.

use crate::settlement::SettlementPlan;
use crate::{AkariError, PredictionId, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

pub const SETTLEMENT_RECORD_DOMAIN_V1: &[u8] = b"AKARI_SETTLEMENT_RECORD_V1";
const RECORD_VERSION_V1: u32 = 1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SettlementRecordV1 {
    pub record_version: u32,
    pub recorded_at_ms: i64,
    pub prev_record_hash: String,
    pub record_hash: String,

    pub prediction_id: u64,
    pub winning_option: String,
    pub pot: u64,
    pub house_fee: u64,
    pub payout_pool: u64,
    pub winner_count: u32,
    pub paid_total: u64,
}

fn now_ms() -> Result<i64> {
    let ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| AkariError::Internal("system clock error".into()))?
        .as_millis();
    i64::try_from(ms).map_err(|_| AkariError::Internal("system clock overflow".into()))
}

pub fn record_hash_v1(
    prev_record_hash: &[u8; 32],
    recorded_at_ms: i64,
    prediction_id: PredictionId,
    plan: &SettlementPlan,
) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(SETTLEMENT_RECORD_DOMAIN_V1);
    hasher.update(RECORD_VERSION_V1.to_le_bytes());
    hasher.update(recorded_at_ms.to_le_bytes());
    hasher.update(prev_record_hash);
    hasher.update(prediction_id.0.to_le_bytes());
    hasher.update((plan.winning_option.len() as u32).to_le_bytes());
    hasher.update(plan.winning_option.as_bytes());
    hasher.update(plan.pot.to_le_bytes());
    hasher.update(plan.house_fee.to_le_bytes());
    hasher.update(plan.payout_pool.to_le_bytes());
    hasher.update((plan.credits.len() as u32).to_le_bytes());
    hasher.update(plan.paid_total().to_le_bytes());
    hasher.finalize().into()
}

struct LogInner {
    path: PathBuf,
    prev: [u8; 32],
}

/// Append-only settlement log handle. Appends are serialized internally.
pub struct SettlementLog {
    inner: Mutex<LogInner>,
}

impl SettlementLog {
    /// Open (or create) the log at `path`, resuming the hash chain from the
    /// last record if one exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let prev = match last_record(&path)? {
            Some(record) => decode_hash(&record.record_hash)?,
            None => [0u8; 32],
        };
        Ok(Self {
            inner: Mutex::new(LogInner { path, prev }),
        })
    }

    /// Append one settlement record, extending the hash chain.
    pub fn append(&self, prediction_id: PredictionId, plan: &SettlementPlan) -> Result<()> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| AkariError::Internal("settlement log lock poisoned".into()))?;

        let recorded_at_ms = now_ms()?;
        let record_hash = record_hash_v1(&inner.prev, recorded_at_ms, prediction_id, plan);
        let record = SettlementRecordV1 {
            record_version: RECORD_VERSION_V1,
            recorded_at_ms,
            prev_record_hash: hex::encode(inner.prev),
            record_hash: hex::encode(record_hash),
            prediction_id: prediction_id.0,
            winning_option: plan.winning_option.clone(),
            pot: plan.pot,
            house_fee: plan.house_fee,
            payout_pool: plan.payout_pool,
            winner_count: plan.credits.len() as u32,
            paid_total: plan.paid_total(),
        };

        let line = serde_json::to_string(&record)
            .map_err(|e| AkariError::Internal(format!("settlement record encode: {e}")))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&inner.path)
            .map_err(|e| AkariError::Internal(format!("settlement log open: {e}")))?;
        writeln!(file, "{line}")
            .map_err(|e| AkariError::Internal(format!("settlement log write: {e}")))?;

        inner.prev = record_hash;
        Ok(())
    }
}

/// Read all records back, verifying the hash chain.
pub fn read_chain(path: &Path) -> Result<Vec<SettlementRecordV1>> {
    let mut records = Vec::new();
    let mut prev = [0u8; 32];
    for record in read_records(path)? {
        if decode_hash(&record.prev_record_hash)? != prev {
            return Err(AkariError::Internal(format!(
                "settlement log chain break at prediction {}",
                record.prediction_id
            )));
        }
        prev = decode_hash(&record.record_hash)?;
        records.push(record);
    }
    Ok(records)
}

fn read_records(path: &Path) -> Result<Vec<SettlementRecordV1>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = std::fs::File::open(path)
        .map_err(|e| AkariError::Internal(format!("settlement log open: {e}")))?;
    let mut records = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| AkariError::Internal(format!("settlement log read: {e}")))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: SettlementRecordV1 = serde_json::from_str(&line)
            .map_err(|e| AkariError::Internal(format!("settlement record decode: {e}")))?;
        records.push(record);
    }
    Ok(records)
}

fn last_record(path: &Path) -> Result<Option<SettlementRecordV1>> {
    Ok(read_records(path)?.into_iter().last())
}

fn decode_hash(hex_str: &str) -> Result<[u8; 32]> {
    let bytes = hex::decode(hex_str)
        .map_err(|e| AkariError::Internal(format!("settlement hash decode: {e}")))?;
    bytes
        .try_into()
        .map_err(|_| AkariError::Internal("settlement hash length".into()))
}
