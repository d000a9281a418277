//! In-process tab directory
//!
//! Keeps windows and tabs in memory. Used by tests and by event replay,
//! where there is no live browser to talk to.

use super::TabDirectory;
use crate::error::{Error, Result};
use crate::types::{BulkOutcome, TabId, TabInfo};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

const DEFAULT_WINDOW: i64 = 1;

#[derive(Debug)]
struct DirectoryState {
    focused_window: i64,
    tabs: BTreeMap<TabId, TabInfo>,
    next_id: TabId,
    notifications: Vec<String>,
    unreachable: HashSet<String>,
}

/// Tab directory held entirely in memory
#[derive(Debug)]
pub struct InMemoryDirectory {
    state: Mutex<DirectoryState>,
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DirectoryState {
                focused_window: DEFAULT_WINDOW,
                tabs: BTreeMap::new(),
                next_id: 1,
                notifications: Vec::new(),
                unreachable: HashSet::new(),
            }),
        }
    }

    /// Add a tab to the focused window and return its id
    pub fn add_tab(&self, url: &str, title: &str) -> TabId {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        let window_id = state.focused_window;
        state.tabs.insert(
            id,
            TabInfo {
                id,
                window_id,
                url: url.to_string(),
                title: title.to_string(),
                active: false,
            },
        );
        id
    }

    /// Register a tab with a host-chosen id (event replay)
    pub fn upsert_tab(&self, tab: TabInfo) {
        let mut state = self.state.lock().unwrap();
        state.next_id = state.next_id.max(tab.id + 1);
        state.tabs.insert(tab.id, tab);
    }

    /// Make a tab the foreground tab of its window
    pub fn activate(&self, tab_id: TabId) {
        let mut state = self.state.lock().unwrap();
        let Some(window_id) = state.tabs.get(&tab_id).map(|t| t.window_id) else {
            return;
        };
        for tab in state.tabs.values_mut() {
            if tab.window_id == window_id {
                tab.active = tab.id == tab_id;
            }
        }
    }

    /// Drop a tab without going through the batch close command
    pub fn remove_tab(&self, tab_id: TabId) -> Option<TabInfo> {
        self.state.lock().unwrap().tabs.remove(&tab_id)
    }

    pub fn focus_window(&self, window_id: i64) {
        self.state.lock().unwrap().focused_window = window_id;
    }

    /// Make `open_tab` fail for this URL
    pub fn mark_unreachable(&self, url: &str) {
        self.state
            .lock()
            .unwrap()
            .unreachable
            .insert(url.to_string());
    }

    pub fn tabs(&self) -> Vec<TabInfo> {
        self.state.lock().unwrap().tabs.values().cloned().collect()
    }

    pub fn tab(&self, tab_id: TabId) -> Option<TabInfo> {
        self.state.lock().unwrap().tabs.get(&tab_id).cloned()
    }

    pub fn notifications(&self) -> Vec<String> {
        self.state.lock().unwrap().notifications.clone()
    }
}

#[async_trait]
impl TabDirectory for InMemoryDirectory {
    async fn current_window_tabs(&self) -> Result<Vec<TabInfo>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .tabs
            .values()
            .filter(|t| t.window_id == state.focused_window)
            .cloned()
            .collect())
    }

    async fn get_tab(&self, tab_id: TabId) -> Result<Option<TabInfo>> {
        Ok(self.tab(tab_id))
    }

    async fn active_tab(&self) -> Result<Option<TabId>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .tabs
            .values()
            .find(|t| t.window_id == state.focused_window && t.active)
            .map(|t| t.id))
    }

    async fn open_tab(&self, url: &str) -> Result<TabId> {
        if self.state.lock().unwrap().unreachable.contains(url) {
            return Err(Error::Directory(format!("cannot open {url}")));
        }
        Ok(self.add_tab(url, ""))
    }

    async fn close_tabs(&self, tab_ids: &[TabId]) -> BulkOutcome<TabId> {
        let mut state = self.state.lock().unwrap();
        let mut outcome = BulkOutcome::default();
        for &id in tab_ids {
            match state.tabs.remove(&id) {
                Some(_) => outcome.succeeded.push(id),
                None => outcome.failed.push((id, format!("no tab with id {id}"))),
            }
        }
        outcome
    }

    async fn navigate(&self, tab_id: TabId, url: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let tab = state
            .tabs
            .get_mut(&tab_id)
            .ok_or_else(|| Error::NotFound(format!("tab {tab_id}")))?;
        tab.url = url.to_string();
        Ok(())
    }

    async fn notify(&self, message: &str) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .notifications
            .push(message.to_string());
        Ok(())
    }
}
