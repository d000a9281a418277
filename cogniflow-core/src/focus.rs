//! Focus and distraction control
//!
//! Decides which tabs focus mode blocks, builds the interstitial pause URL,
//! and tracks one-shot bypasses granted from the interstitial.

use crate::types::{Category, TabId};
use std::collections::HashSet;
use std::sync::Mutex;
use url::Url;

/// Whether a tab in `category` must be redirected to the pause page.
pub fn should_block(category: &Category, focus_active: bool) -> bool {
    focus_active && category.is_distraction()
}

/// Interstitial URL carrying the blocked URL as `blockedUrl`.
pub fn pause_url(pause_page: &str, blocked: &str) -> String {
    format!(
        "{pause_page}?blockedUrl={}",
        urlencoding::encode(blocked)
    )
}

/// Recover the blocked URL from a pause page URL.
pub fn blocked_url(pause_url: &str) -> Option<String> {
    let parsed = Url::parse(pause_url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == "blockedUrl")
        .map(|(_, value)| value.into_owned())
}

/// One-shot bypasses, keyed by `(tab, url)`.
///
/// A bypass is granted when the user overrides a block and consumed by the
/// next load of that URL in that tab, so the override navigation itself is
/// never blocked again while later visits still are.
#[derive(Debug, Default)]
pub struct BypassTokens {
    tokens: Mutex<HashSet<(TabId, String)>>,
}

impl BypassTokens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&self, tab_id: TabId, url: &str) {
        self.tokens
            .lock()
            .unwrap()
            .insert((tab_id, url.to_string()));
    }

    /// Remove a bypass; returns whether one was present.
    pub fn consume(&self, tab_id: TabId, url: &str) -> bool {
        self.tokens
            .lock()
            .unwrap()
            .remove(&(tab_id, url.to_string()))
    }

    /// Drop every bypass held for a closed tab.
    pub fn forget_tab(&self, tab_id: TabId) {
        self.tokens.lock().unwrap().retain(|(id, _)| *id != tab_id);
    }

    pub fn len(&self) -> usize {
        self.tokens.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
