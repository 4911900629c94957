use crate::history::SearchEntry;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;

pub const GUEST_COUNT_KEY: &str = "guestSearchCount";

pub fn user_key(user_id: &str) -> String {
    format!("userData_{}", user_id)
}

/// Everything kept for a signed-in user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedUserState {
    pub search_history: Vec<String>,
    pub navigation_history: Vec<SearchEntry>,
    /// `-1` when the history is empty.
    pub current_index: i64,
    pub last_updated: i64,
}

#[derive(Debug)]
pub enum StoreError {
    Io(io::Error),
    /// Stored data could not be decoded.
    Malformed {
        key: String,
        source: serde_json::Error,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(err) => write!(f, "io error: {}", err),
            StoreError::Malformed { key, source } => {
                write!(f, "malformed value for '{}': {}", key, source)
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(err) => Some(err),
            StoreError::Malformed { source, .. } => Some(source),
        }
    }
}

impl From<io::Error> for StoreError {
    fn from(value: io::Error) -> Self {
        StoreError::Io(value)
    }
}

#[derive(Debug)]
enum Backend {
    Disk(PathBuf),
    Memory(HashMap<String, String>),
}

/// Key-value store of JSON documents, one file per key on disk.
#[derive(Debug)]
pub struct Store {
    backend: Backend,
}

impl Store {
    pub fn persistent(dir: impl Into<PathBuf>) -> Self {
        Self {
            backend: Backend::Disk(dir.into()),
        }
    }

    pub fn ephemeral() -> Self {
        Self {
            backend: Backend::Memory(HashMap::new()),
        }
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let raw = match &self.backend {
            Backend::Disk(dir) => match fs::read_to_string(dir.join(file_name(key))) {
                Ok(raw) => raw,
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(e.into()),
            },
            Backend::Memory(map) => match map.get(key) {
                Some(raw) => raw.clone(),
                None => return Ok(None),
            },
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Malformed {
                key: key.to_string(),
                source,
            })
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(value).map_err(|source| StoreError::Malformed {
            key: key.to_string(),
            source,
        })?;

        match &mut self.backend {
            Backend::Disk(dir) => {
                fs::create_dir_all(&*dir)?;
                fs::write(dir.join(file_name(key)), json)?;
            }
            Backend::Memory(map) => {
                map.insert(key.to_string(), json);
            }
        }
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match &mut self.backend {
            Backend::Disk(dir) => match fs::remove_file(dir.join(file_name(key))) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            },
            Backend::Memory(map) => {
                map.remove(key);
                Ok(())
            }
        }
    }

    /// Writes raw text under `key`, bypassing serialization.
    #[cfg(test)]
    pub fn set_raw(&mut self, key: &str, raw: &str) {
        match &mut self.backend {
            Backend::Disk(dir) => {
                fs::create_dir_all(&*dir).unwrap();
                fs::write(dir.join(file_name(key)), raw).unwrap();
            }
            Backend::Memory(map) => {
                map.insert(key.to_string(), raw.to_string());
            }
        }
    }
}

fn file_name(key: &str) -> String {
    let safe: String = key
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || "._@+-".contains(c) { c } else { '_' })
        .collect();
    format!("{}.json", safe)
}
