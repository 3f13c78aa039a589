//! Participant display metadata.
//!
//! Leaderboard rows are enriched with display names in a single batch
//! lookup; callers must never fetch profiles one row at a time.

use akari_core::{AkariError, Result, UserId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::RwLock;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Profile {
    pub display_name: String,
    #[serde(default)]
    pub handle: Option<String>,
}

pub struct ProfileDirectory {
    inner: RwLock<HashMap<UserId, Profile>>,
}

impl ProfileDirectory {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Load a directory from a JSON file mapping user id to profile.
    /// A missing file yields an empty directory.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let bytes = std::fs::read(path)
            .map_err(|e| AkariError::Internal(format!("profile file read: {e}")))?;
        let entries: BTreeMap<UserId, Profile> = serde_json::from_slice(&bytes)
            .map_err(|e| AkariError::Internal(format!("profile file decode: {e}")))?;
        Ok(Self {
            inner: RwLock::new(entries.into_iter().collect()),
        })
    }

    pub fn upsert(&self, user: UserId, profile: Profile) -> Result<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| AkariError::Internal("profile lock poisoned".into()))?;
        inner.insert(user, profile);
        Ok(())
    }

    /// Single-pass batch lookup. Unknown users are simply absent from the
    /// returned map.
    pub fn batch(&self, users: &[UserId]) -> Result<HashMap<UserId, Profile>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| AkariError::Internal("profile lock poisoned".into()))?;
        Ok(users
            .iter()
            .filter_map(|u| inner.get(u).map(|p| (*u, p.clone())))
            .collect())
    }
}

impl Default for ProfileDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str) -> Profile {
        Profile {
            display_name: name.into(),
            handle: None,
        }
    }

    #[test]
    fn batch_returns_only_known_users() {
        let dir = ProfileDirectory::new();
        dir.upsert(UserId(1), profile("alice")).unwrap();
        dir.upsert(UserId(2), profile("bob")).unwrap();

        let got = dir.batch(&[UserId(1), UserId(3)]).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[&UserId(1)].display_name, "alice");
    }

    #[test]
    fn load_from_file_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        std::fs::write(
            &path,
            r#"{"7":{"displayName":"kol","handle":"@kol"}}"#,
        )
        .unwrap();

        let profiles = ProfileDirectory::load(&path).unwrap();
        let got = profiles.batch(&[UserId(7)]).unwrap();
        assert_eq!(got[&UserId(7)].handle.as_deref(), Some("@kol"));
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let profiles = ProfileDirectory::load(&dir.path().join("none.json")).unwrap();
        assert!(profiles.batch(&[UserId(1)]).unwrap().is_empty());
    }
}
