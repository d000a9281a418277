use super::*;

impl Engine {
    // ========== Workspace Lifecycle ==========

    pub async fn create_workspace(&self, name: &str) -> Result<Workspace> {
        let name = workspace::validate_name(name)?;

        let _gate = self.write_gate.lock().await;
        let mut workspaces = self.state.workspaces()?;
        if workspace::name_taken(&workspaces, &name, None) {
            return Err(Error::DuplicateName {
                kind: "workspace",
                name,
            });
        }

        let created = workspace::new_workspace(name, self.now());
        workspaces.insert(created.id.clone(), created.clone());
        self.commit(
            WriteBatch::new().workspaces(&workspaces)?,
            &[StateChange::Workspaces],
        )?;

        tracing::info!(workspace = %created.id, name = %created.name, "Workspace created");
        Ok(created)
    }

    /// Move a tab into a workspace, or out of any workspace with `None`.
    pub async fn assign_tab(&self, tab_id: TabId, ws_id: Option<&str>) -> Result<()> {
        let _gate = self.write_gate.lock().await;
        let mut tabs = self.state.tab_metadata()?;
        let mut workspaces = self.state.workspaces()?;

        if !tabs.contains_key(&tab_id) {
            return Err(Error::NotFound(format!("tab {tab_id}")));
        }
        if let Some(ws_id) = ws_id {
            if !workspaces.contains_key(ws_id) {
                return Err(Error::NotFound(format!("workspace {ws_id}")));
            }
        }

        let previous = workspace::detach(&mut workspaces, &mut tabs, tab_id);
        if let Some(ws_id) = ws_id {
            workspace::attach(&mut workspaces, &mut tabs, tab_id, ws_id, self.now())?;
        }

        let batch = WriteBatch::new()
            .tab_metadata(&tabs)?
            .workspaces(&workspaces)?;
        self.commit(batch, &[StateChange::Tabs, StateChange::Workspaces])?;

        tracing::info!(tab_id, from = ?previous, to = ?ws_id, "Tab workspace changed");
        Ok(())
    }

    /// Open one tab per saved URL and start a new session.
    ///
    /// A URL that fails to open is reported and skipped.
    pub async fn load_workspace(&self, ws_id: &str) -> Result<BulkOutcome<String>> {
        let target = self.workspace(ws_id)?;
        if target.urls.is_empty() {
            return Err(Error::Empty(target.name));
        }

        let mut outcome = BulkOutcome::default();
        for url in &target.urls {
            match self.directory.open_tab(url).await {
                Ok(_) => outcome.succeeded.push(url.clone()),
                Err(e) => {
                    tracing::error!(workspace = ws_id, url = %url, error = %e, "Failed to open workspace tab");
                    outcome.failed.push((url.clone(), e.to_string()));
                }
            }
        }

        let _gate = self.write_gate.lock().await;
        let now = self.now();
        let mut batch = WriteBatch::new().session_start_time(now)?;
        let mut changes = vec![StateChange::Session];
        let mut workspaces = self.state.workspaces()?;
        if let Some(loaded) = workspaces.get_mut(ws_id) {
            loaded.last_accessed = now;
            batch = batch.workspaces(&workspaces)?;
            changes.push(StateChange::Workspaces);
        }
        self.commit(batch, &changes)?;

        tracing::info!(
            workspace = ws_id,
            opened = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "Workspace loaded"
        );
        Ok(outcome)
    }

    /// Close every web page in the current window that is not in this workspace.
    pub async fn focus_on_workspace(&self, ws_id: &str) -> Result<BulkOutcome<TabId>> {
        self.workspace(ws_id)?;
        let tabs = self.state.tab_metadata()?;

        let to_close: Vec<TabId> = self
            .directory
            .current_window_tabs()
            .await?
            .into_iter()
            .filter(|tab| tab.is_web_page())
            .filter(|tab| {
                tabs.get(&tab.id)
                    .and_then(|r| r.assigned_workspace.as_deref())
                    != Some(ws_id)
            })
            .map(|tab| tab.id)
            .collect();

        let outcome = self.close_tabs(&to_close).await?;
        self.touch_workspace(ws_id).await?;
        tracing::info!(workspace = ws_id, closed = outcome.succeeded.len(), "Focused on workspace");
        Ok(outcome)
    }

    /// Close every open tab assigned to this workspace; its URLs stay saved.
    pub async fn suspend_workspace(&self, ws_id: &str) -> Result<BulkOutcome<TabId>> {
        self.workspace(ws_id)?;
        let to_close: Vec<TabId> = self
            .state
            .tab_metadata()?
            .into_iter()
            .filter(|(_, r)| r.assigned_workspace.as_deref() == Some(ws_id))
            .map(|(id, _)| id)
            .collect();

        let outcome = self.close_tabs(&to_close).await?;
        self.touch_workspace(ws_id).await?;
        tracing::info!(workspace = ws_id, closed = outcome.succeeded.len(), "Workspace suspended");
        Ok(outcome)
    }

    pub async fn rename_workspace(&self, ws_id: &str, new_name: &str) -> Result<String> {
        let _gate = self.write_gate.lock().await;
        let mut workspaces = self.state.workspaces()?;
        if !workspaces.contains_key(ws_id) {
            return Err(Error::NotFound(format!("workspace {ws_id}")));
        }
        let name = workspace::validate_name(new_name)?;
        if workspace::name_taken(&workspaces, &name, Some(ws_id)) {
            return Err(Error::DuplicateName {
                kind: "workspace",
                name,
            });
        }

        if let Some(renamed) = workspaces.get_mut(ws_id) {
            renamed.name = name.clone();
        }
        self.commit(
            WriteBatch::new().workspaces(&workspaces)?,
            &[StateChange::Workspaces],
        )?;
        tracing::info!(workspace = ws_id, name = %name, "Workspace renamed");
        Ok(name)
    }

    /// Remove a workspace; its tabs stay open and become unassigned.
    pub async fn delete_workspace(&self, ws_id: &str) -> Result<()> {
        let _gate = self.write_gate.lock().await;
        let mut workspaces = self.state.workspaces()?;
        if workspaces.remove(ws_id).is_none() {
            return Err(Error::NotFound(format!("workspace {ws_id}")));
        }

        let mut tabs = self.state.tab_metadata()?;
        let unlinked = workspace::unlink_tabs(&mut tabs, ws_id);

        let batch = WriteBatch::new()
            .workspaces(&workspaces)?
            .tab_metadata(&tabs)?;
        self.commit(batch, &[StateChange::Workspaces, StateChange::Tabs])?;

        tracing::info!(workspace = ws_id, unlinked, "Workspace deleted");
        Ok(())
    }

    // ========== Distractions ==========

    /// Close every distracting web page in the current window, focus mode or not.
    pub async fn cleanup_distractions(&self) -> Result<BulkOutcome<TabId>> {
        let tabs = self.state.tab_metadata()?;
        let to_close: Vec<TabId> = self
            .directory
            .current_window_tabs()
            .await?
            .into_iter()
            .filter(|tab| tab.is_web_page())
            .filter(|tab| {
                tabs.get(&tab.id)
                    .is_some_and(|r| r.effective_category().is_distraction())
            })
            .map(|tab| tab.id)
            .collect();

        let outcome = self.close_tabs(&to_close).await?;
        tracing::info!(closed = outcome.succeeded.len(), "Distractions cleaned up");
        Ok(outcome)
    }

    // ========== Helpers ==========

    /// Close tabs in one directory command and forget the ones that closed.
    async fn close_tabs(&self, tab_ids: &[TabId]) -> Result<BulkOutcome<TabId>> {
        if tab_ids.is_empty() {
            return Ok(BulkOutcome::default());
        }

        let outcome = self.directory.close_tabs(tab_ids).await;
        for (tab_id, reason) in &outcome.failed {
            tracing::warn!(tab_id, reason = %reason, "Failed to close tab");
        }
        for tab_id in &outcome.succeeded {
            self.bypass.forget_tab(*tab_id);
        }
        self.forget_tabs(&outcome.succeeded).await?;
        Ok(outcome)
    }

    async fn touch_workspace(&self, ws_id: &str) -> Result<()> {
        let _gate = self.write_gate.lock().await;
        let mut workspaces = self.state.workspaces()?;
        let Some(touched) = workspaces.get_mut(ws_id) else {
            return Ok(());
        };
        touched.last_accessed = self.now();
        self.commit(
            WriteBatch::new().workspaces(&workspaces)?,
            &[StateChange::Workspaces],
        )
    }
}
