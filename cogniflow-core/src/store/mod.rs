//! Storage layer for cogniflow
//!
//! State is persisted in a flat key-value store, one JSON document per key:
//! - [`KeyValueStore`] is the storage seam (get/set by key)
//! - [`MemoryStore`] and [`SqliteStore`] are the two backends
//! - [`StateStore`] is the typed access layer the engine uses

pub mod sqlite;
pub mod state;

pub use sqlite::SqliteStore;
pub use state::{StateStore, WriteBatch};

use crate::error::Result;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Persisted keys, one record per key.
pub mod keys {
    pub const FOCUS_MODE_ACTIVE: &str = "focusModeActive";
    pub const CURRENT_GOAL: &str = "currentGoal";
    pub const SCORE_HISTORY: &str = "scoreHistory";
    pub const WORKSPACES: &str = "workspaces";
    pub const USER_CATEGORIES: &str = "userCategories";
    pub const RULES: &str = "rules";
    pub const REVIEW_QUEUE: &str = "reviewQueue";
    pub const TAB_METADATA: &str = "tabMetadata";
    pub const SESSION_START_TIME: &str = "sessionStartTime";

    pub const ALL: [&str; 9] = [
        FOCUS_MODE_ACTIVE,
        CURRENT_GOAL,
        SCORE_HISTORY,
        WORKSPACES,
        USER_CATEGORIES,
        RULES,
        REVIEW_QUEUE,
        TAB_METADATA,
        SESSION_START_TIME,
    ];
}

/// Abstract key-value storage.
///
/// Implementations only need per-call atomicity: `set_many` must apply all
/// entries or none. Read-modify-write isolation is the caller's job.
pub trait KeyValueStore: Send + Sync {
    /// Read one key
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Write several keys atomically
    fn set_many(&self, entries: Vec<(String, Value)>) -> Result<()>;

    /// Delete one key (no-op when missing)
    fn remove(&self, key: &str) -> Result<()>;

    /// All stored keys
    fn keys(&self) -> Result<Vec<String>>;

    /// Write a single key
    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.set_many(vec![(key.to_string(), value)])
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn set_many(&self, entries: Vec<(String, Value)>) -> Result<()> {
        let mut map = self.entries.lock().unwrap();
        map.extend(entries);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.lock().unwrap().keys().cloned().collect())
    }
}
