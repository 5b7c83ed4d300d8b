//! Persisted credentials.
//!
//! `LocalStorage` is a small JSON key/value file standing in for the browser's
//! local storage. The session keeps the bearer token under `accessToken` and the
//! serialised user under `userData`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::models::Role;

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const USER_DATA_KEY: &str = "userData";

#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> BTreeMap<String, String> {
        let Ok(raw) = fs::read_to_string(&self.path) else {
            return BTreeMap::new();
        };
        match serde_json::from_str(&raw) {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable storage file {}: {}",
                    self.path.display(),
                    e
                );
                BTreeMap::new()
            }
        }
    }

    fn write_all(&self, map: &BTreeMap<String, String>) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_vec_pretty(map)?)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.read_all().remove(key)
    }

    pub fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut map = self.read_all();
        map.insert(key.to_string(), value.to_string());
        self.write_all(&map)
    }

    pub fn delete(&self, key: &str) -> AppResult<()> {
        let mut map = self.read_all();
        if map.remove(key).is_some() {
            self.write_all(&map)?;
        }
        Ok(())
    }
}

/// Cached copy of the authenticated user, including permission flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub can_mass_download_photos: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub user: UserData,
}

impl Session {
    /// Both keys must be present and the user blob must parse.
    pub fn load(storage: &LocalStorage) -> Option<Self> {
        let access_token = storage.get(ACCESS_TOKEN_KEY).filter(|t| !t.is_empty())?;
        let raw_user = storage.get(USER_DATA_KEY)?;
        let user = match serde_json::from_str::<UserData>(&raw_user) {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!("Stored userData is invalid: {}", e);
                return None;
            }
        };
        Some(Self { access_token, user })
    }

    pub fn save(&self, storage: &LocalStorage) -> AppResult<()> {
        storage.set(ACCESS_TOKEN_KEY, &self.access_token)?;
        storage.set(USER_DATA_KEY, &serde_json::to_string(&self.user)?)?;
        Ok(())
    }

    pub fn clear(storage: &LocalStorage) -> AppResult<()> {
        storage.delete(ACCESS_TOKEN_KEY)?;
        storage.delete(USER_DATA_KEY)?;
        Ok(())
    }
}
