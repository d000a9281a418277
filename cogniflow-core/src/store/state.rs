//! Typed access to persisted state
//!
//! [`StateStore`] is the single authoritative view of the key-value store.
//! Rules are cached in memory, but the cache is read-through only and is
//! dropped on every write that touches them.

use super::{keys, KeyValueStore};
use crate::error::Result;
use crate::types::{
    default_rules, Category, ReviewEntry, Rule, ScoreHistoryEntry, TabId, TabRecord, Workspace,
    WorkspaceId,
};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// Tab metadata keyed by tab id
pub type TabMap = BTreeMap<TabId, TabRecord>;

/// Workspaces keyed by id
pub type WorkspaceMap = BTreeMap<WorkspaceId, Workspace>;

/// Typed view over a [`KeyValueStore`].
pub struct StateStore {
    kv: Arc<dyn KeyValueStore>,
    rules_cache: RwLock<Option<Vec<Rule>>>,
}

impl StateStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            rules_cache: RwLock::new(None),
        }
    }

    /// Write defaults for every missing key; existing values are never overwritten.
    ///
    /// Returns the keys that were filled in.
    pub fn initialize(&self, now: DateTime<Utc>) -> Result<Vec<&'static str>> {
        let mut batch = WriteBatch::default();
        let mut filled = Vec::new();

        for key in keys::ALL {
            if self.kv.get(key)?.is_some() {
                continue;
            }
            let value = match key {
                keys::FOCUS_MODE_ACTIVE => Value::Bool(false),
                keys::CURRENT_GOAL => Value::Null,
                keys::SCORE_HISTORY | keys::REVIEW_QUEUE => Value::Array(Vec::new()),
                keys::WORKSPACES | keys::TAB_METADATA => Value::Object(Default::default()),
                keys::USER_CATEGORIES => serde_json::to_value(Category::BASE)?,
                keys::RULES => serde_json::to_value(default_rules())?,
                keys::SESSION_START_TIME => serde_json::to_value(now)?,
                _ => continue,
            };
            batch.entries.push((key.to_string(), value));
            filled.push(key);
        }

        if !filled.is_empty() {
            tracing::info!(keys = ?filled, "Initialized missing state keys");
            self.commit(batch)?;
        }
        Ok(filled)
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.kv.get(key)? {
            Some(Value::Null) | None => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
        }
    }

    fn read_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        Ok(self.read(key)?.unwrap_or_default())
    }

    pub fn focus_mode_active(&self) -> Result<bool> {
        self.read_or_default(keys::FOCUS_MODE_ACTIVE)
    }

    pub fn current_goal(&self) -> Result<Option<String>> {
        self.read(keys::CURRENT_GOAL)
    }

    pub fn score_history(&self) -> Result<Vec<ScoreHistoryEntry>> {
        self.read_or_default(keys::SCORE_HISTORY)
    }

    pub fn workspaces(&self) -> Result<WorkspaceMap> {
        self.read_or_default(keys::WORKSPACES)
    }

    pub fn user_categories(&self) -> Result<Vec<Category>> {
        Ok(self
            .read::<Vec<Category>>(keys::USER_CATEGORIES)?
            .unwrap_or_else(|| Category::BASE.to_vec()))
    }

    pub fn review_queue(&self) -> Result<Vec<ReviewEntry>> {
        self.read_or_default(keys::REVIEW_QUEUE)
    }

    pub fn tab_metadata(&self) -> Result<TabMap> {
        self.read_or_default(keys::TAB_METADATA)
    }

    pub fn session_start_time(&self) -> Result<Option<DateTime<Utc>>> {
        self.read(keys::SESSION_START_TIME)
    }

    /// Stored rules, in storage order (read-through cached)
    pub fn rules(&self) -> Result<Vec<Rule>> {
        if let Some(rules) = self.rules_cache.read().unwrap().as_ref() {
            return Ok(rules.clone());
        }

        let mut cache = self.rules_cache.write().unwrap();
        if let Some(rules) = cache.as_ref() {
            return Ok(rules.clone());
        }
        let rules: Vec<Rule> = self.read_or_default(keys::RULES)?;
        *cache = Some(rules.clone());
        Ok(rules)
    }

    /// Apply a batch of writes atomically.
    pub fn commit(&self, batch: WriteBatch) -> Result<()> {
        if batch.entries.is_empty() {
            return Ok(());
        }

        if batch.touches(keys::RULES) {
            // Hold the cache lock across the write so no reader can refill it
            // with the value being replaced.
            let mut cache = self.rules_cache.write().unwrap();
            let result = self.kv.set_many(batch.entries);
            *cache = None;
            return result;
        }

        self.kv.set_many(batch.entries)
    }
}

/// A set of key writes committed together.
#[derive(Debug, Default)]
pub struct WriteBatch {
    entries: Vec<(String, Value)>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    fn put<T: Serialize + ?Sized>(mut self, key: &str, value: &T) -> Result<Self> {
        let value = serde_json::to_value(value)?;
        self.entries.retain(|(k, _)| k != key);
        self.entries.push((key.to_string(), value));
        Ok(self)
    }

    fn touches(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn focus_mode_active(self, active: bool) -> Result<Self> {
        self.put(keys::FOCUS_MODE_ACTIVE, &active)
    }

    pub fn current_goal(self, goal: Option<&str>) -> Result<Self> {
        self.put(keys::CURRENT_GOAL, &goal)
    }

    pub fn score_history(self, history: &[ScoreHistoryEntry]) -> Result<Self> {
        self.put(keys::SCORE_HISTORY, history)
    }

    pub fn workspaces(self, workspaces: &WorkspaceMap) -> Result<Self> {
        self.put(keys::WORKSPACES, workspaces)
    }

    pub fn user_categories(self, categories: &[Category]) -> Result<Self> {
        self.put(keys::USER_CATEGORIES, categories)
    }

    pub fn rules(self, rules: &[Rule]) -> Result<Self> {
        self.put(keys::RULES, rules)
    }

    pub fn review_queue(self, queue: &[ReviewEntry]) -> Result<Self> {
        self.put(keys::REVIEW_QUEUE, queue)
    }

    pub fn tab_metadata(self, tabs: &TabMap) -> Result<Self> {
        self.put(keys::TAB_METADATA, tabs)
    }

    pub fn session_start_time(self, at: DateTime<Utc>) -> Result<Self> {
        self.put(keys::SESSION_START_TIME, &at)
    }
}
