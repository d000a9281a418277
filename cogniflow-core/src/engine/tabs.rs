use super::*;

use crate::classifier::Classification;
use crate::review::Resolution;

/// Outcome of the automatic classification step
enum Guess {
    /// A rule matched; authoritative for both categories
    Rule(Category),
    Classifier(Classification),
    /// Backend failed outright
    Failed,
    /// Classifier skipped or unavailable; keep what the record had
    Keep,
}

impl Guess {
    /// Category this guess stands for on its own
    fn category(&self) -> Category {
        match self {
            Guess::Rule(category) => category.clone(),
            Guess::Classifier(classification) => classification.category.clone(),
            Guess::Failed | Guess::Keep => Category::Others,
        }
    }
}

impl Engine {
    // ========== Classification ==========

    /// Classify a tab's page and record it as a fresh load.
    ///
    /// Rules win over the classifier. The classifier runs outside the write
    /// gate; its result is merged into the record read afterwards, so
    /// concurrent activation or assignment changes are kept. Only existing
    /// records are updated: a tab closed while its page was being classified
    /// stays closed, and records are created by activation alone.
    ///
    /// The load resets the tab's active time. A tab that is still in the
    /// foreground restarts its interval now; one that lost the foreground
    /// meanwhile stays inactive. A URL change of a workspace member updates
    /// the workspace's saved URLs.
    pub async fn classify_tab(
        &self,
        tab_id: TabId,
        url: &str,
        title: &str,
        text: &str,
    ) -> Result<Category> {
        let guess = self.guess_category(tab_id, url, text).await?;

        let _gate = self.write_gate.lock().await;
        let now = self.now();
        let mut tabs = self.state.tab_metadata()?;
        let Some(prior_ai) = tabs.get(&tab_id).map(|r| r.ai_category.clone()) else {
            tracing::debug!(tab_id, url, "Tab closed during classification; result dropped");
            return Ok(guess.category());
        };

        let mut batch = WriteBatch::new();
        let mut changes = vec![StateChange::Tabs];

        let (ai_category, rule_category) = match guess {
            Guess::Rule(category) => (category.clone(), Some(category)),
            Guess::Classifier(classification) => {
                let mut ai_category = classification.category.clone();
                if self.classifier.needs_review(&classification) {
                    let mut queue = self.state.review_queue()?;
                    let rules = self.state.rules()?;
                    match review::enqueue(&mut queue, &rules, url, classification.category, now) {
                        Ok(true) => {
                            tracing::info!(tab_id, url, "Queued low-confidence classification for review");
                            batch = batch.review_queue(&queue)?;
                            changes.push(StateChange::ReviewQueue);
                        }
                        Ok(false) => {}
                        Err(e) => {
                            tracing::error!(tab_id, url, error = %e, "Cannot queue review");
                            ai_category = Category::Others;
                        }
                    }
                }
                (ai_category, None)
            }
            Guess::Failed => (Category::Others, None),
            Guess::Keep => (prior_ai.unwrap_or(Category::Others), None),
        };

        let mut workspaces = self.state.workspaces()?;
        if workspace::change_url(&mut workspaces, &mut tabs, tab_id, url) {
            batch = batch.workspaces(&workspaces)?;
            changes.push(StateChange::Workspaces);
        }

        let Some(record) = tabs.get_mut(&tab_id) else {
            return Ok(ai_category);
        };
        record.title = title.to_string();
        record.ai_category = Some(ai_category);
        if let Some(category) = rule_category {
            record.user_category = Some(category);
        }
        let foreground = record.is_active();
        record.time_active_ms = 0;
        record.last_activated_at = None;
        let effective = record.effective_category();

        if foreground {
            timekeeping::record_activation(&mut tabs, Some(tab_id), now);
        }
        batch = batch.tab_metadata(&tabs)?;
        self.commit(batch, &changes)?;

        tracing::debug!(tab_id, url, category = %effective, foreground, "Tab classified");
        Ok(effective)
    }

    /// Pick the category source for a page without touching state.
    async fn guess_category(&self, tab_id: TabId, url: &str, text: &str) -> Result<Guess> {
        if let Some(category) = rules::classify_by_rule(url, &self.state.rules()?) {
            tracing::debug!(tab_id, url, category = %category, "Matched category rule");
            return Ok(Guess::Rule(category));
        }

        // An explicit user choice masks any automatic guess
        let overridden = self
            .state
            .tab_metadata()?
            .get(&tab_id)
            .is_some_and(|r| r.user_category.is_some());
        if overridden || !self.classifier.is_available() || !self.classifier.has_sufficient_text(text)
        {
            return Ok(Guess::Keep);
        }

        match self.classifier.classify(text).await {
            Ok(classification) => Ok(Guess::Classifier(classification)),
            Err(Error::ClassifierUnavailable) | Err(Error::Timeout(_)) => Ok(Guess::Keep),
            Err(e) => {
                tracing::error!(tab_id, url, error = %e, "Classification failed");
                Ok(Guess::Failed)
            }
        }
    }

    // ========== Categories ==========

    /// Set a user override on one tab.
    pub async fn set_tab_category(&self, tab_id: TabId, category: Category) -> Result<()> {
        let category = self.registered_category(category)?;
        let _gate = self.write_gate.lock().await;
        let mut tabs = self.state.tab_metadata()?;
        let record = tabs
            .get_mut(&tab_id)
            .ok_or_else(|| Error::NotFound(format!("tab {tab_id}")))?;
        record.user_category = Some(category.clone());

        self.commit(WriteBatch::new().tab_metadata(&tabs)?, &[StateChange::Tabs])?;
        tracing::info!(tab_id, category = %category, "Tab category overridden");
        Ok(())
    }

    /// Add a custom category label.
    pub async fn add_custom_category(&self, name: &str) -> Result<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::EmptyName("category name"));
        }

        let _gate = self.write_gate.lock().await;
        let mut categories = self.state.user_categories()?;
        if categories
            .iter()
            .any(|c| c.label().eq_ignore_ascii_case(name))
        {
            return Err(Error::DuplicateName {
                kind: "category",
                name: name.to_string(),
            });
        }

        let category = Category::parse(name);
        categories.push(category.clone());
        self.commit(
            WriteBatch::new().user_categories(&categories)?,
            &[StateChange::Categories],
        )?;
        tracing::info!(category = %category, "Added custom category");
        Ok(category)
    }

    /// Stored form of a base or custom category, matched case-insensitively.
    ///
    /// Labels never added through [`Engine::add_custom_category`] are `NotFound`.
    fn registered_category(&self, category: Category) -> Result<Category> {
        self.state
            .user_categories()?
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(category.label()))
            .ok_or_else(|| Error::NotFound(format!("category {category}")))
    }

    // ========== Rules & Review ==========

    /// Add or update a rule and apply it to open tabs it now decides.
    ///
    /// Returns the number of tabs recategorized.
    pub async fn add_rule(&self, pattern: &str, category: Category) -> Result<usize> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(Error::EmptyName("rule pattern"));
        }
        let category = self.registered_category(category)?;

        let _gate = self.write_gate.lock().await;
        let mut rules = self.state.rules()?;
        rules::upsert_rule(&mut rules, pattern, category.clone());

        let mut tabs = self.state.tab_metadata()?;
        let mut updated = 0;
        for record in tabs.values_mut() {
            if !rules::rule_matches(pattern, &record.url) {
                continue;
            }
            if rules::classify_by_rule(&record.url, &rules).as_ref() == Some(&category) {
                record.user_category = Some(category.clone());
                record.ai_category = Some(category.clone());
                updated += 1;
            }
        }

        let mut batch = WriteBatch::new().rules(&rules)?;
        let mut changes = vec![StateChange::Rules];
        if updated > 0 {
            batch = batch.tab_metadata(&tabs)?;
            changes.push(StateChange::Tabs);
        }
        self.commit(batch, &changes)?;

        tracing::info!(pattern, category = %category, tabs = updated, "Rule saved");
        Ok(updated)
    }

    /// Confirm a category for a reviewed URL.
    pub async fn resolve_review(&self, url: &str, category: Category) -> Result<Resolution> {
        let category = self.registered_category(category)?;
        let _gate = self.write_gate.lock().await;
        let mut queue = self.state.review_queue()?;
        let mut rules = self.state.rules()?;
        let mut tabs = self.state.tab_metadata()?;

        let resolution = review::resolve(&mut queue, &mut rules, &mut tabs, url, &category);

        let mut batch = WriteBatch::new()
            .review_queue(&queue)?
            .tab_metadata(&tabs)?;
        let mut changes = vec![StateChange::ReviewQueue, StateChange::Tabs];
        if resolution.rule_domain.is_some() {
            batch = batch.rules(&rules)?;
            changes.push(StateChange::Rules);
        }
        self.commit(batch, &changes)?;

        tracing::info!(
            url,
            category = %category,
            tabs = resolution.tabs_updated,
            "Review resolved"
        );
        Ok(resolution)
    }
}
