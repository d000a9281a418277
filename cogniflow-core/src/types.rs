//! Core domain types for cogniflow
//!
//! These types are the persisted state model: per-tab records, categorization
//! rules, the review queue, workspaces and the score history.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Tab** | One open browser tab instance, identified by the host's tab id |
//! | **Category** | Productivity label attached to a tab (base set plus custom labels) |
//! | **Effective category** | `user_category`, else `ai_category`, else `Others` |
//! | **Rule** | URL pattern mapped to a category; the highest-priority classification source |
//! | **Review entry** | A low-confidence automatic classification awaiting confirmation |
//! | **Workspace** | A named, persisted group of URLs with its currently open tab members |
//! | **Time sink** | A distracting URL whose active time crossed the scoring threshold |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Host-assigned tab identifier
pub type TabId = i64;

/// Workspace identifier (`ws_<uuid>`)
pub type WorkspaceId = String;

// ============================================
// Category
// ============================================

/// Productivity category.
///
/// The base set is fixed; anything else is a user-added custom label.
/// Serialized as its plain label so stored maps stay human-readable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Work,
    Social,
    Entertainment,
    Learning,
    Shopping,
    Neutral,
    Others,
    Custom(String),
}

impl Category {
    /// The fixed base categories, in presentation order
    pub const BASE: [Category; 7] = [
        Category::Work,
        Category::Social,
        Category::Entertainment,
        Category::Learning,
        Category::Shopping,
        Category::Neutral,
        Category::Others,
    ];

    /// Returns the display label for this category
    pub fn label(&self) -> &str {
        match self {
            Category::Work => "Work",
            Category::Social => "Social",
            Category::Entertainment => "Entertainment",
            Category::Learning => "Learning",
            Category::Shopping => "Shopping",
            Category::Neutral => "Neutral",
            Category::Others => "Others",
            Category::Custom(label) => label,
        }
    }

    /// Categories that focus mode blocks and cleanup closes
    pub fn is_distraction(&self) -> bool {
        matches!(
            self,
            Category::Social | Category::Entertainment | Category::Shopping
        )
    }

    /// Categories that count towards the productivity score
    pub fn is_productive(&self) -> bool {
        matches!(self, Category::Work | Category::Learning | Category::Neutral)
    }

    /// Parse a label; base labels match case-insensitively, anything else is custom.
    pub fn parse(label: &str) -> Self {
        let trimmed = label.trim();
        Self::BASE
            .iter()
            .find(|base| base.label().eq_ignore_ascii_case(trimmed))
            .cloned()
            .unwrap_or_else(|| Category::Custom(trimmed.to_string()))
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        Category::parse(&value)
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.label().to_string()
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Category {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Category::parse(s))
    }
}

// ============================================
// Tabs
// ============================================

/// Authoritative per-tab record.
///
/// Created on first activation or content extraction, destroyed when the tab
/// closes. `last_activated_at` is `Some` only for the foreground tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabRecord {
    pub url: String,
    pub title: String,
    /// Last automatic classification
    #[serde(default)]
    pub ai_category: Option<Category>,
    /// Explicit user override or rule match; masks `ai_category`
    #[serde(default)]
    pub user_category: Option<Category>,
    #[serde(default)]
    pub assigned_workspace: Option<WorkspaceId>,
    /// Cumulative active time
    #[serde(default)]
    pub time_active_ms: i64,
    #[serde(default)]
    pub last_activated_at: Option<DateTime<Utc>>,
}

impl TabRecord {
    /// A fresh, unclassified record.
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            ai_category: None,
            user_category: None,
            assigned_workspace: None,
            time_active_ms: 0,
            last_activated_at: None,
        }
    }

    /// `user_category ?? ai_category ?? Others`
    pub fn effective_category(&self) -> Category {
        self.user_category
            .clone()
            .or_else(|| self.ai_category.clone())
            .unwrap_or(Category::Others)
    }

    /// Whether this tab is currently the foreground tab
    pub fn is_active(&self) -> bool {
        self.last_activated_at.is_some()
    }
}

/// Load status reported with a tab update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabStatus {
    Loading,
    Complete,
}

/// Tab as reported by the host tab directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabInfo {
    pub id: TabId,
    pub window_id: i64,
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub active: bool,
}

impl TabInfo {
    /// Regular web pages; extension and browser-internal pages are never touched.
    pub fn is_web_page(&self) -> bool {
        is_web_url(&self.url)
    }
}

/// Whether a URL is an http(s) page
pub fn is_web_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

// ============================================
// Rules & review
// ============================================

/// URL pattern (domain substring or wildcard pattern) mapped to a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub pattern: String,
    pub category: Category,
}

impl Rule {
    pub fn new(pattern: impl Into<String>, category: Category) -> Self {
        Self {
            pattern: pattern.into(),
            category,
        }
    }
}

/// Rules shipped on first start
pub fn default_rules() -> Vec<Rule> {
    [
        ("github.com", Category::Work),
        ("notion.so", Category::Work),
        ("jira.atlassian.net", Category::Work),
        ("trello.com", Category::Work),
        ("stackoverflow.com", Category::Learning),
        ("developer.mozilla.org", Category::Learning),
        ("youtube.com", Category::Entertainment),
        ("netflix.com", Category::Entertainment),
        ("facebook.com", Category::Social),
        ("twitter.com", Category::Social),
        ("instagram.com", Category::Social),
        ("reddit.com", Category::Social),
    ]
    .into_iter()
    .map(|(pattern, category)| Rule::new(pattern, category))
    .collect()
}

/// Low-confidence classification awaiting user confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEntry {
    pub url: String,
    pub ai_guess: Category,
    pub timestamp: DateTime<Utc>,
}

// ============================================
// Workspaces
// ============================================

/// Aggregates refreshed by each session analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceMetrics {
    /// Active time of the tabs assigned at the last analysis
    #[serde(default)]
    pub total_time_spent_ms: i64,
    /// Running mean of session scores while the workspace had open tabs
    #[serde(default)]
    pub avg_focus_score: f64,
    #[serde(default)]
    pub scored_sessions: u32,
}

/// A named, persisted group of URLs.
///
/// `urls` is the durable snapshot and survives tabs closing; `active_tab_ids`
/// tracks the currently open members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: WorkspaceId,
    pub name: String,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default)]
    pub active_tab_ids: Vec<TabId>,
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    #[serde(default)]
    pub metrics: WorkspaceMetrics,
}

// ============================================
// Scoring
// ============================================

/// Immutable record appended by every session analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreHistoryEntry {
    /// Local date/time string for display
    pub date: String,
    pub score: u32,
    pub timestamp: DateTime<Utc>,
    pub categories_distribution: BTreeMap<Category, u32>,
    pub time_per_category: BTreeMap<Category, i64>,
    pub total_session_time_ms: i64,
    pub time_sinks: Vec<String>,
}

/// Snapshot returned by session analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub categories: BTreeMap<Category, u32>,
    pub time_per_category: BTreeMap<Category, i64>,
    pub total_tabs: u32,
    pub score: u32,
    pub time_sinks: Vec<String>,
    pub total_session_time_ms: i64,
}

// ============================================
// Bulk results
// ============================================

/// Result of a best-effort bulk operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOutcome<T> {
    pub succeeded: Vec<T>,
    /// Failed items with the reason reported by the host
    pub failed: Vec<(T, String)>,
}

impl<T> Default for BulkOutcome<T> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl<T> BulkOutcome<T> {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// `PartialFailure` when any item failed
    pub fn failure(&self) -> Option<crate::error::Error> {
        (!self.failed.is_empty()).then(|| crate::error::Error::PartialFailure {
            failed: self.failed.len(),
            total: self.total(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse() {
        assert_eq!(Category::parse("work"), Category::Work);
        assert_eq!(Category::parse(" Social "), Category::Social);
        assert_eq!(
            Category::parse("Research"),
            Category::Custom("Research".to_string())
        );
    }

    #[test]
    fn test_category_serializes_as_label() {
        let json = serde_json::to_string(&Category::Entertainment).unwrap();
        assert_eq!(json, "\"Entertainment\"");

        let mut times = BTreeMap::new();
        times.insert(Category::Custom("Research".to_string()), 10i64);
        let json = serde_json::to_string(&times).unwrap();
        assert_eq!(json, r#"{"Research":10}"#);
        let back: BTreeMap<Category, i64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, times);
    }

    #[test]
    fn test_effective_category_precedence() {
        let mut record = TabRecord::new("https://example.com", "Example");
        assert_eq!(record.effective_category(), Category::Others);

        record.ai_category = Some(Category::Shopping);
        assert_eq!(record.effective_category(), Category::Shopping);

        record.user_category = Some(Category::Work);
        assert_eq!(record.effective_category(), Category::Work);

        record.ai_category = Some(Category::Social);
        assert_eq!(record.effective_category(), Category::Work);
    }

    #[test]
    fn test_tab_record_reads_partial_json() {
        let record: TabRecord =
            serde_json::from_str(r#"{"url":"https://a.com","title":"A"}"#).unwrap();
        assert_eq!(record.time_active_ms, 0);
        assert!(record.ai_category.is_none());
        assert!(!record.is_active());
    }

    #[test]
    fn test_bulk_outcome_failure() {
        let mut outcome: BulkOutcome<TabId> = BulkOutcome::default();
        outcome.succeeded.push(1);
        assert!(outcome.failure().is_none());

        outcome.failed.push((2, "gone".to_string()));
        assert!(matches!(
            outcome.failure(),
            Some(crate::error::Error::PartialFailure {
                failed: 1,
                total: 2
            })
        ));
    }
}
