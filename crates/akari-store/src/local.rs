//! File-backed ledger store.
//!
//! The whole ledger state is kept in memory and mirrored to a versioned JSON
//! snapshot on every committed transaction. The snapshot is rewritten via a
//! temp file and rename, so a crash mid-write leaves the previous snapshot
//! intact. A transaction whose closure fails, or whose snapshot write fails,
//! commits nothing.

use akari_core::{AkariError, LedgerState, LedgerStore, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

const LEDGER_FILE_VERSION_V1: u32 = 1;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct LedgerFileV1 {
    version: u32,
    state: LedgerState,
}

fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)
        .map_err(|e| AkariError::Internal(format!("ledger snapshot write: {e}")))?;
    fs::rename(&tmp, path)
        .map_err(|e| AkariError::Internal(format!("ledger snapshot rename: {e}")))?;
    Ok(())
}

pub struct LocalStore {
    path: PathBuf,
    state: RwLock<LedgerState>,
}

impl LocalStore {
    /// Open the store at `path`, loading an existing snapshot if present.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| AkariError::Internal(format!("ledger dir create: {e}")))?;
            }
        }

        let state = if path.exists() {
            let bytes = fs::read(&path)
                .map_err(|e| AkariError::Internal(format!("ledger snapshot read: {e}")))?;
            let file: LedgerFileV1 = serde_json::from_slice(&bytes)
                .map_err(|e| AkariError::Internal(format!("ledger snapshot decode: {e}")))?;
            if file.version != LEDGER_FILE_VERSION_V1 {
                return Err(AkariError::Internal(format!(
                    "unsupported ledger snapshot version {}",
                    file.version
                )));
            }
            tracing::debug!(
                accounts = file.state.accounts.len(),
                "loaded ledger snapshot from {}",
                path.display()
            );
            file.state
        } else {
            LedgerState::default()
        };

        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    fn persist(&self, state: &LedgerState) -> Result<()> {
        let file = LedgerFileV1 {
            version: LEDGER_FILE_VERSION_V1,
            state: state.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&file)
            .map_err(|e| AkariError::Internal(format!("ledger snapshot encode: {e}")))?;
        atomic_write(&self.path, &bytes)
    }
}

impl LedgerStore for LocalStore {
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
        // Durable first: the in-memory commit only happens once the snapshot
        // hit disk.
        self.persist(&scratch)?;
        *state = scratch;
        Ok(out)
    }
}
