use super::*;

use crate::focus::{pause_url, should_block};
use crate::timekeeping::Activation;
use crate::types::{is_web_url, TabRecord, TabStatus};

impl Engine {
    // ========== Tab Directory Events ==========

    /// A tab finished (or started) loading a URL.
    ///
    /// Only completed loads of web pages matter: focus mode gets a chance to
    /// block the page, then the tab becomes the foreground tab.
    pub async fn on_tab_updated(&self, tab_id: TabId, status: TabStatus, url: &str) -> Result<()> {
        if status != TabStatus::Complete || !is_web_url(url) {
            return Ok(());
        }

        if self.bypass.consume(tab_id, url) {
            tracing::debug!(tab_id, url, "Load allowed by focus override");
        } else {
            self.enforce_focus(tab_id, url).await?;
        }

        self.activate(tab_id).await
    }

    pub async fn on_tab_activated(&self, tab_id: TabId) -> Result<()> {
        self.activate(tab_id).await
    }

    /// A tab was closed: its record goes, and so does its workspace membership.
    pub async fn on_tab_removed(&self, tab_id: TabId) -> Result<()> {
        self.bypass.forget_tab(tab_id);
        self.forget_tabs(&[tab_id]).await
    }

    /// Page text extracted for a loaded tab.
    pub async fn on_content_extracted(
        &self,
        tab_id: TabId,
        url: &str,
        title: &str,
        text: &str,
    ) -> Result<Category> {
        self.classify_tab(tab_id, url, title, text).await
    }

    /// The user chose to continue to a blocked page from the interstitial.
    ///
    /// Grants a one-shot bypass for this tab and URL, then navigates there.
    pub async fn override_block(&self, tab_id: TabId, url: &str) -> Result<()> {
        if !is_web_url(url) {
            return Err(Error::InvalidUrl(url.to_string()));
        }

        self.bypass.grant(tab_id, url);
        if let Err(e) = self.directory.navigate(tab_id, url).await {
            self.bypass.consume(tab_id, url);
            return Err(e);
        }
        tracing::info!(tab_id, url, "Focus block overridden");
        Ok(())
    }

    // ========== Activation & Focus ==========

    /// Move the foreground to `tab_id`, creating its record if it has none yet.
    ///
    /// A new record is created under the write gate from the directory's view
    /// of the tab; classification then merges into it like any other load.
    pub(super) async fn activate(&self, tab_id: TabId) -> Result<()> {
        let info = if self.state.tab_metadata()?.contains_key(&tab_id) {
            None
        } else {
            self.directory.get_tab(tab_id).await?
        };

        let created = {
            let _gate = self.write_gate.lock().await;
            let now = self.now();
            let mut tabs = self.state.tab_metadata()?;
            let mut created = None;
            if timekeeping::record_activation(&mut tabs, Some(tab_id), now) == Activation::Untracked
            {
                match info {
                    Some(tab) => {
                        tabs.insert(tab_id, TabRecord::new(&tab.url, &tab.title));
                        timekeeping::record_activation(&mut tabs, Some(tab_id), now);
                        created = Some(tab);
                    }
                    None => tracing::debug!(tab_id, "Activated tab is unknown to the directory"),
                }
            }
            self.commit(WriteBatch::new().tab_metadata(&tabs)?, &[StateChange::Tabs])?;
            created
        };

        if let Some(tab) = created {
            // Text arrives later through content extraction
            self.classify_tab(tab_id, &tab.url, &tab.title, "").await?;
        }
        Ok(())
    }

    /// Redirect a freshly loaded tab to the pause page when focus mode blocks it.
    ///
    /// The new URL's rule match decides first; otherwise the category already
    /// recorded for the tab. Redirect failures are logged, not raised.
    async fn enforce_focus(&self, tab_id: TabId, url: &str) -> Result<bool> {
        if !self.state.focus_mode_active()? {
            return Ok(false);
        }

        let category = match rules::classify_by_rule(url, &self.state.rules()?) {
            Some(category) => Some(category),
            None => self
                .state
                .tab_metadata()?
                .get(&tab_id)
                .and_then(|r| r.user_category.clone().or_else(|| r.ai_category.clone())),
        };
        let Some(category) = category else {
            return Ok(false);
        };
        if !should_block(&category, true) {
            return Ok(false);
        }

        let title = match self.directory.get_tab(tab_id).await {
            Ok(Some(tab)) if !tab.title.is_empty() => tab.title,
            _ => url.to_string(),
        };

        let pause = pause_url(&self.config.focus.pause_page, url);
        if let Err(e) = self.directory.navigate(tab_id, &pause).await {
            tracing::error!(tab_id, url, error = %e, "Failed to redirect blocked tab");
            return Ok(false);
        }
        tracing::info!(tab_id, url, category = %category, "Focus mode blocked distracting tab");

        if let Err(e) = self
            .directory
            .notify(&format!("Blocked distracting site: {title}"))
            .await
        {
            tracing::warn!(error = %e, "Failed to send block notification");
        }
        Ok(true)
    }

    /// Drop records and workspace membership of closed tabs.
    pub(super) async fn forget_tabs(&self, tab_ids: &[TabId]) -> Result<()> {
        if tab_ids.is_empty() {
            return Ok(());
        }

        let _gate = self.write_gate.lock().await;
        let mut tabs = self.state.tab_metadata()?;
        let mut workspaces = self.state.workspaces()?;

        let mut batch = WriteBatch::new();
        let mut changes = Vec::new();

        let before = tabs.len();
        tabs.retain(|id, _| !tab_ids.contains(id));
        if tabs.len() != before {
            batch = batch.tab_metadata(&tabs)?;
            changes.push(StateChange::Tabs);
        }

        let mut members_changed = false;
        for tab_id in tab_ids {
            members_changed |= workspace::forget_tab(&mut workspaces, *tab_id);
        }
        if members_changed {
            batch = batch.workspaces(&workspaces)?;
            changes.push(StateChange::Workspaces);
        }

        tracing::debug!(tabs = ?tab_ids, "Forgot closed tabs");
        self.commit(batch, &changes)
    }
}
