//! Boundary validation and capacity bounds.
//!
//! All inputs crossing into the accounting core are bounded and validated
//! fail-closed before any state is touched. Wallet validation is syntactic
//! only; no network I/O runs here.

use crate::{AkariError, Result};

// =============================================================================
// Bounds (v1)
// =============================================================================

pub const MAX_OPTIONS_V1: usize = 16;
pub const MAX_OPTION_LABEL_BYTES_V1: usize = 64;
pub const MAX_TITLE_BYTES_V1: usize = 128;
pub const MAX_DESCRIPTION_BYTES_V1: usize = 2_048;
pub const MAX_TASKS_V1: usize = 32;
pub const MAX_TASK_FIELD_BYTES_V1: usize = 256;
pub const MAX_WALLET_BYTES_V1: usize = 80;
pub const MAX_SCOPE_BYTES_V1: usize = 64;
pub const MAX_BETS_PER_PREDICTION_V1: usize = 4_096;
pub const MAX_EVENTS_PER_SCOPE_V1: usize = 65_536;

/// Validate a single prediction option label.
pub fn validate_option_label(label: &str) -> Result<()> {
    if label.is_empty() {
        return Err(AkariError::InvalidArgument("option label is empty".into()));
    }
    if label.len() > MAX_OPTION_LABEL_BYTES_V1 {
        return Err(AkariError::InvalidArgument(format!(
            "option label exceeds {MAX_OPTION_LABEL_BYTES_V1} bytes"
        )));
    }
    Ok(())
}

/// Validate a prediction's option set: 2..=16 distinct labels.
pub fn validate_option_set(options: &[String]) -> Result<()> {
    if options.len() < 2 {
        return Err(AkariError::InvalidArgument(
            "prediction needs at least two options".into(),
        ));
    }
    if options.len() > MAX_OPTIONS_V1 {
        return Err(AkariError::InvalidArgument(format!(
            "prediction has more than {MAX_OPTIONS_V1} options"
        )));
    }
    for (idx, label) in options.iter().enumerate() {
        validate_option_label(label)?;
        if options[..idx].contains(label) {
            return Err(AkariError::InvalidArgument(format!(
                "duplicate option label: {label}"
            )));
        }
    }
    Ok(())
}

/// Validate a leaderboard scope key.
pub fn validate_scope_key(scope: &str) -> Result<()> {
    if scope.is_empty() || scope.len() > MAX_SCOPE_BYTES_V1 {
        return Err(AkariError::InvalidArgument("invalid scope key".into()));
    }
    if !scope
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return Err(AkariError::InvalidArgument(
            "scope key must be alphanumeric with - or _".into(),
        ));
    }
    Ok(())
}

/// Syntactic TON wallet validation.
///
/// Accepted forms:
/// - raw: `<workchain>:<64 hex>` where workchain is `0` or `-1`,
/// - user-friendly: 48 base64url characters.
pub fn validate_ton_wallet(wallet: &str) -> Result<()> {
    if wallet.is_empty() || wallet.len() > MAX_WALLET_BYTES_V1 {
        return Err(AkariError::InvalidArgument("invalid wallet address".into()));
    }

    if let Some((workchain, account)) = wallet.split_once(':') {
        if workchain != "0" && workchain != "-1" {
            return Err(AkariError::InvalidArgument(
                "wallet workchain must be 0 or -1".into(),
            ));
        }
        if account.len() != 64 || !account.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AkariError::InvalidArgument(
                "wallet account must be 64 hex characters".into(),
            ));
        }
        return Ok(());
    }

    if wallet.len() == 48
        && wallet
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return Ok(());
    }

    Err(AkariError::InvalidArgument(
        "wallet must be raw (wc:hex64) or 48-char base64url".into(),
    ))
}
