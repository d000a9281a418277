use super::*;

use crate::types::SessionReport;
use chrono::Local;

impl Engine {
    // ========== Focus Mode & Goal ==========

    /// Flip focus mode; returns the new state.
    pub async fn toggle_focus_mode(&self) -> Result<bool> {
        let _gate = self.write_gate.lock().await;
        let active = !self.state.focus_mode_active()?;
        self.commit(
            WriteBatch::new().focus_mode_active(active)?,
            &[StateChange::FocusMode],
        )?;
        tracing::info!(active, "Focus mode toggled");
        Ok(active)
    }

    /// Set the session goal; a blank goal clears it.
    pub async fn set_goal(&self, goal: &str) -> Result<Option<String>> {
        let goal = Some(goal.trim()).filter(|g| !g.is_empty());

        let _gate = self.write_gate.lock().await;
        self.commit(
            WriteBatch::new().current_goal(goal)?,
            &[StateChange::Goal],
        )?;
        tracing::info!(goal = ?goal, "Session goal set");
        Ok(goal.map(str::to_string))
    }

    // ========== Session Analysis ==========

    /// Score the session and append it to the history.
    ///
    /// The foreground tab's running interval is closed into its active time
    /// first and reopened, so the report includes it.
    pub async fn analyze_session(&self) -> Result<SessionReport> {
        let active = match self.directory.active_tab().await {
            Ok(active) => active,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot query active tab; flushing all intervals");
                None
            }
        };

        let _gate = self.write_gate.lock().await;
        let now = self.now();
        let mut tabs = self.state.tab_metadata()?;
        timekeeping::record_activation(&mut tabs, active, now);

        let scored = scoring::score_tabs(&tabs, self.config.scoring.time_sink_ms());
        let session_start = self.state.session_start_time()?.unwrap_or(now);
        let total_session_time_ms = (now - session_start).num_milliseconds().max(0);

        let mut history = self.state.score_history()?;
        history.push(ScoreHistoryEntry {
            date: now.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
            score: scored.score,
            timestamp: now,
            categories_distribution: scored.categories.clone(),
            time_per_category: scored.time_per_category.clone(),
            total_session_time_ms,
            time_sinks: scored.time_sinks.clone(),
        });

        let mut workspaces: WorkspaceMap = self.state.workspaces()?;
        workspace::update_metrics(&mut workspaces, &tabs, scored.score);

        let batch = WriteBatch::new()
            .tab_metadata(&tabs)?
            .score_history(&history)?
            .workspaces(&workspaces)?;
        self.commit(
            batch,
            &[
                StateChange::Tabs,
                StateChange::ScoreHistory,
                StateChange::Workspaces,
            ],
        )?;

        tracing::info!(
            score = scored.score,
            total_tabs = scored.total_tabs,
            time_sinks = scored.time_sinks.len(),
            "Session analyzed"
        );

        Ok(SessionReport {
            categories: scored.categories,
            time_per_category: scored.time_per_category,
            total_tabs: scored.total_tabs,
            score: scored.score,
            time_sinks: scored.time_sinks,
            total_session_time_ms,
        })
    }
}
