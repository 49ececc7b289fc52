//! Daily usage counters kept in an external key/value store.
//!
//! The update is a plain read-modify-write with no locking. Two generations
//! finishing at the same time can both read the same counter and one
//! increment is lost. That matches the extension's storage semantics and is
//! left as is.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::StoreError;

/// Key holding the extension's persisted state object.
pub const STATE_KEY: &str = "plumeState";
const STATS_FIELD: &str = "stats";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    #[serde(default)]
    pub replies_generated: u64,
    #[serde(default)]
    pub tweets_analyzed: u64,
    #[serde(default)]
    pub last_reset: String,
    /// Fields other writers keep under `stats`; written back untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UsageStats {
    pub fn fresh(today: &str) -> Self {
        Self {
            replies_generated: 0,
            tweets_analyzed: 0,
            last_reset: today.to_string(),
            extra: Map::new(),
        }
    }

    /// Zeroes the counters when they were last reset on another day.
    pub fn roll_over(&mut self, today: &str) {
        if self.last_reset != today {
            self.replies_generated = 0;
            self.tweets_analyzed = 0;
            self.last_reset = today.to_string();
        }
    }
}

/// Today's date in the store's `lastReset` format, e.g. `Fri Oct 16 2026`.
pub fn today() -> String {
    Local::now().format("%a %b %d %Y").to_string()
}

/// External key/value store with get/set semantics.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
}

/// In-process store, mainly for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// Store persisted as one JSON object in a file. A missing file reads as empty.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(&self) -> Result<Map<String, Value>, StoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        serde_json::from_str(&raw).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })
    }
}

#[async_trait]
impl Store for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut entries = self.load().await?;
        entries.insert(key.to_string(), value);

        let io_err = |source: std::io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let encoded = serde_json::to_string_pretty(&entries).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        tokio::fs::write(&self.path, encoded).await.map_err(io_err)
    }
}

async fn load_state(store: &dyn Store) -> Result<Map<String, Value>, StoreError> {
    match store.get(STATE_KEY).await? {
        Some(Value::Object(state)) => Ok(state),
        _ => Ok(Map::new()),
    }
}

fn stats_from_state(state: &Map<String, Value>, today: &str) -> Result<UsageStats, StoreError> {
    let mut stats = match state.get(STATS_FIELD) {
        Some(value) => serde_json::from_value(value.clone()).map_err(|source| StoreError::Shape {
            key: format!("{STATE_KEY}.{STATS_FIELD}"),
            source,
        })?,
        None => UsageStats::fresh(today),
    };
    stats.roll_over(today);
    Ok(stats)
}

/// Reads the stats as they stand for `today`, without writing anything back.
pub async fn current_stats(store: &dyn Store, today: &str) -> Result<UsageStats, StoreError> {
    let state = load_state(store).await?;
    stats_from_state(&state, today)
}

/// Counts one successful generation and writes the state back with every
/// other field preserved.
pub async fn record_reply(store: &dyn Store, today: &str) -> Result<UsageStats, StoreError> {
    let mut state = load_state(store).await?;
    let mut stats = stats_from_state(&state, today)?;
    stats.replies_generated += 1;

    let encoded = serde_json::to_value(&stats).map_err(|source| StoreError::Shape {
        key: format!("{STATE_KEY}.{STATS_FIELD}"),
        source,
    })?;
    state.insert(STATS_FIELD.to_string(), encoded);
    store.set(STATE_KEY, Value::Object(state)).await?;

    debug!(replies_generated = stats.replies_generated, "usage stats updated");
    Ok(stats)
}
