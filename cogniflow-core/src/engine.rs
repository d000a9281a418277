//! The tab lifecycle engine.
//!
//! [`Engine`] owns the persisted state and is the only writer to it. Every
//! read-modify-write cycle runs under a single write gate; classifier calls
//! and tab directory commands run outside it, and their results are merged
//! field by field into freshly read state. Observers learn about committed
//! changes through [`Engine::subscribe`].

mod events;
mod session;
mod tabs;
mod workspaces;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, Mutex};

use crate::classifier::ClassifierAdapter;
use crate::clock::Clock;
use crate::config::Config;
use crate::directory::TabDirectory;
use crate::error::{Error, Result};
use crate::focus::BypassTokens;
use crate::store::state::{TabMap, WorkspaceMap};
use crate::store::{KeyValueStore, StateStore, WriteBatch};
use crate::types::{
    BulkOutcome, Category, ReviewEntry, Rule, ScoreHistoryEntry, TabId, Workspace,
};
use crate::{review, rules, scoring, timekeeping, workspace};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Which part of the persisted state a committed write touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StateChange {
    FocusMode,
    Goal,
    Categories,
    Rules,
    ReviewQueue,
    Tabs,
    Workspaces,
    ScoreHistory,
    Session,
}

/// Single owner of the tab, workspace and scoring state.
pub struct Engine {
    state: StateStore,
    directory: Arc<dyn TabDirectory>,
    classifier: ClassifierAdapter,
    clock: Arc<dyn Clock>,
    config: Config,
    write_gate: Mutex<()>,
    changes: broadcast::Sender<StateChange>,
    bypass: BypassTokens,
}

impl Engine {
    /// Create an engine over a key-value store, filling in defaults for missing keys.
    pub fn new(
        kv: Arc<dyn KeyValueStore>,
        directory: Arc<dyn TabDirectory>,
        classifier: ClassifierAdapter,
        clock: Arc<dyn Clock>,
        config: Config,
    ) -> Result<Self> {
        let state = StateStore::new(kv);
        state.initialize(clock.now())?;
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);

        tracing::info!(
            classifier = classifier.is_available(),
            "Engine initialized"
        );

        Ok(Self {
            state,
            directory,
            classifier,
            clock,
            config,
            write_gate: Mutex::new(()),
            changes,
            bypass: BypassTokens::new(),
        })
    }

    /// Receive a notification after every committed mutation.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.changes.subscribe()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn directory(&self) -> &Arc<dyn TabDirectory> {
        &self.directory
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Commit a batch, then notify observers.
    ///
    /// Callers must hold the write gate.
    fn commit(&self, batch: WriteBatch, changes: &[StateChange]) -> Result<()> {
        self.state.commit(batch)?;
        for change in changes {
            // No subscribers is fine
            let _ = self.changes.send(*change);
        }
        Ok(())
    }

    // ========== Queries ==========

    pub fn focus_mode_active(&self) -> Result<bool> {
        self.state.focus_mode_active()
    }

    pub fn current_goal(&self) -> Result<Option<String>> {
        self.state.current_goal()
    }

    /// Base categories followed by custom ones, in insertion order
    pub fn list_categories(&self) -> Result<Vec<Category>> {
        self.state.user_categories()
    }

    pub fn list_rules(&self) -> Result<Vec<Rule>> {
        self.state.rules()
    }

    /// Workspaces, oldest first
    pub fn list_workspaces(&self) -> Result<Vec<Workspace>> {
        let mut workspaces: Vec<Workspace> = self.state.workspaces()?.into_values().collect();
        workspaces.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.name.cmp(&b.name)));
        Ok(workspaces)
    }

    pub fn workspace(&self, ws_id: &str) -> Result<Workspace> {
        self.state
            .workspaces()?
            .remove(ws_id)
            .ok_or_else(|| Error::NotFound(format!("workspace {ws_id}")))
    }

    /// Pending reviews in FIFO order
    pub fn list_review_queue(&self) -> Result<Vec<ReviewEntry>> {
        self.state.review_queue()
    }

    pub fn score_history(&self) -> Result<Vec<ScoreHistoryEntry>> {
        self.state.score_history()
    }

    /// Current tab records, keyed by tab id
    pub fn tab_snapshot(&self) -> Result<TabMap> {
        self.state.tab_metadata()
    }

    pub fn session_start_time(&self) -> Result<Option<DateTime<Utc>>> {
        self.state.session_start_time()
    }
}
