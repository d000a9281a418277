//! Workspace membership
//!
//! Pure operations over the workspace table and tab records. The engine runs
//! them inside a single read-modify-write cycle so membership on both sides
//! (`Workspace::active_tab_ids` and `TabRecord::assigned_workspace`) always
//! changes together.

use crate::error::{Error, Result};
use crate::store::state::{TabMap, WorkspaceMap};
use crate::types::{TabId, Workspace, WorkspaceMetrics};
use chrono::{DateTime, Utc};

/// Trimmed name, or `EmptyName` when blank.
pub fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyName("workspace name"));
    }
    Ok(trimmed.to_string())
}

/// Whether another workspace already uses `name` (case-insensitive).
pub fn name_taken(workspaces: &WorkspaceMap, name: &str, except: Option<&str>) -> bool {
    let wanted = name.trim().to_lowercase();
    workspaces
        .values()
        .filter(|ws| Some(ws.id.as_str()) != except)
        .any(|ws| ws.name.to_lowercase() == wanted)
}

pub fn new_workspace(name: String, now: DateTime<Utc>) -> Workspace {
    Workspace {
        id: format!("ws_{}", uuid::Uuid::new_v4().simple()),
        name,
        goal: None,
        urls: Vec::new(),
        active_tab_ids: Vec::new(),
        created_at: now,
        last_accessed: now,
        metrics: WorkspaceMetrics::default(),
    }
}

/// Detach a tab from its current workspace, if any.
///
/// The tab's URL leaves the workspace's saved URLs only when no other member
/// tab still shows it. Returns the workspace the tab was detached from.
pub fn detach(workspaces: &mut WorkspaceMap, tabs: &mut TabMap, tab_id: TabId) -> Option<String> {
    let record = tabs.get_mut(&tab_id)?;
    let ws_id = record.assigned_workspace.take()?;
    let url = record.url.clone();

    let Some(workspace) = workspaces.get_mut(&ws_id) else {
        return Some(ws_id);
    };
    workspace.active_tab_ids.retain(|id| *id != tab_id);

    let shared = workspace
        .active_tab_ids
        .iter()
        .any(|id| tabs.get(id).is_some_and(|r| r.url == url));
    if !shared {
        workspace.urls.retain(|u| *u != url);
    }
    Some(ws_id)
}

/// Attach a tab to a workspace: record the link, add the tab to the members
/// and its URL to the saved URLs when absent.
pub fn attach(
    workspaces: &mut WorkspaceMap,
    tabs: &mut TabMap,
    tab_id: TabId,
    ws_id: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let workspace = workspaces
        .get_mut(ws_id)
        .ok_or_else(|| Error::NotFound(format!("workspace {ws_id}")))?;
    let record = tabs
        .get_mut(&tab_id)
        .ok_or_else(|| Error::NotFound(format!("tab {tab_id}")))?;

    record.assigned_workspace = Some(ws_id.to_string());
    if !workspace.active_tab_ids.contains(&tab_id) {
        workspace.active_tab_ids.push(tab_id);
    }
    if !workspace.urls.contains(&record.url) {
        workspace.urls.push(record.url.clone());
    }
    workspace.last_accessed = now;
    Ok(())
}

/// Point a tab record at a newly loaded URL.
///
/// For a workspace member the old URL leaves the saved URLs unless another
/// member still shows it, and the new URL is added when absent. Returns
/// whether a workspace changed.
pub fn change_url(
    workspaces: &mut WorkspaceMap,
    tabs: &mut TabMap,
    tab_id: TabId,
    url: &str,
) -> bool {
    let Some(record) = tabs.get_mut(&tab_id) else {
        return false;
    };
    if record.url == url {
        return false;
    }
    let old_url = std::mem::replace(&mut record.url, url.to_string());
    let Some(ws_id) = record.assigned_workspace.clone() else {
        return false;
    };
    let Some(workspace) = workspaces.get_mut(&ws_id) else {
        return false;
    };

    let shared = workspace
        .active_tab_ids
        .iter()
        .filter(|id| **id != tab_id)
        .any(|id| tabs.get(id).is_some_and(|r| r.url == old_url));
    if !shared {
        workspace.urls.retain(|u| *u != old_url);
    }
    if !workspace.urls.iter().any(|u| u == url) {
        workspace.urls.push(url.to_string());
    }
    true
}

/// Drop a closed tab from every workspace's members; saved URLs stay.
pub fn forget_tab(workspaces: &mut WorkspaceMap, tab_id: TabId) -> bool {
    let mut changed = false;
    for workspace in workspaces.values_mut() {
        let before = workspace.active_tab_ids.len();
        workspace.active_tab_ids.retain(|id| *id != tab_id);
        changed |= workspace.active_tab_ids.len() != before;
    }
    changed
}

/// Clear every tab link pointing at `ws_id`; returns how many were cleared.
pub fn unlink_tabs(tabs: &mut TabMap, ws_id: &str) -> usize {
    let mut cleared = 0;
    for record in tabs.values_mut() {
        if record.assigned_workspace.as_deref() == Some(ws_id) {
            record.assigned_workspace = None;
            cleared += 1;
        }
    }
    cleared
}

/// Refresh each workspace's metrics from its assigned tabs after a scored session.
pub fn update_metrics(workspaces: &mut WorkspaceMap, tabs: &TabMap, score: u32) {
    for workspace in workspaces.values_mut() {
        let assigned: Vec<i64> = tabs
            .values()
            .filter(|r| r.assigned_workspace.as_deref() == Some(workspace.id.as_str()))
            .map(|r| r.time_active_ms)
            .collect();
        if assigned.is_empty() {
            continue;
        }

        let metrics = &mut workspace.metrics;
        metrics.total_time_spent_ms = assigned.iter().sum();
        let n = f64::from(metrics.scored_sessions);
        metrics.avg_focus_score = (metrics.avg_focus_score * n + f64::from(score)) / (n + 1.0);
        metrics.scored_sessions += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TabRecord;

    fn setup() -> (WorkspaceMap, TabMap, String, String) {
        let now = Utc::now();
        let x = new_workspace("X".into(), now);
        let y = new_workspace("Y".into(), now);
        let (x_id, y_id) = (x.id.clone(), y.id.clone());
        let workspaces: WorkspaceMap = [(x.id.clone(), x), (y.id.clone(), y)].into_iter().collect();

        let mut tabs = TabMap::new();
        tabs.insert(1, TabRecord::new("https://docs.rs", "docs"));
        tabs.insert(2, TabRecord::new("https://docs.rs", "docs too"));
        tabs.insert(3, TabRecord::new("https://crates.io", "crates"));
        (workspaces, tabs, x_id, y_id)
    }

    #[test]
    fn test_name_rules() {
        let (workspaces, _, x_id, _) = setup();
        assert!(name_taken(&workspaces, "x", None));
        assert!(name_taken(&workspaces, " X ", None));
        assert!(!name_taken(&workspaces, "x", Some(&x_id)));
        assert!(!name_taken(&workspaces, "Z", None));
        assert!(matches!(validate_name("   "), Err(Error::EmptyName(_))));
        assert_eq!(validate_name(" Proj ").unwrap(), "Proj");
    }

    #[test]
    fn test_ids_are_unique() {
        let now = Utc::now();
        let a = new_workspace("a".into(), now);
        let b = new_workspace("b".into(), now);
        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("ws_"));
    }

    #[test]
    fn test_reassign_keeps_shared_url() {
        let (mut workspaces, mut tabs, x_id, y_id) = setup();
        let now = Utc::now();
        attach(&mut workspaces, &mut tabs, 1, &x_id, now).unwrap();
        attach(&mut workspaces, &mut tabs, 2, &x_id, now).unwrap();
        assert_eq!(workspaces[&x_id].urls, vec!["https://docs.rs".to_string()]);

        assert_eq!(detach(&mut workspaces, &mut tabs, 1), Some(x_id.clone()));
        attach(&mut workspaces, &mut tabs, 1, &y_id, now).unwrap();

        assert_eq!(workspaces[&x_id].urls, vec!["https://docs.rs".to_string()]);
        assert_eq!(workspaces[&x_id].active_tab_ids, vec![2]);
        assert_eq!(workspaces[&y_id].urls, vec!["https://docs.rs".to_string()]);
        assert_eq!(tabs[&1].assigned_workspace.as_deref(), Some(y_id.as_str()));
    }

    #[test]
    fn test_reassign_last_member_drops_url() {
        let (mut workspaces, mut tabs, x_id, y_id) = setup();
        let now = Utc::now();
        attach(&mut workspaces, &mut tabs, 3, &x_id, now).unwrap();
        detach(&mut workspaces, &mut tabs, 3);
        attach(&mut workspaces, &mut tabs, 3, &y_id, now).unwrap();

        assert!(workspaces[&x_id].urls.is_empty());
        assert!(workspaces[&x_id].active_tab_ids.is_empty());
        assert_eq!(workspaces[&y_id].urls, vec!["https://crates.io".to_string()]);
    }

    #[test]
    fn test_attach_missing_workspace() {
        let (mut workspaces, mut tabs, _, _) = setup();
        let result = attach(&mut workspaces, &mut tabs, 1, "ws_missing", Utc::now());
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert!(tabs[&1].assigned_workspace.is_none());
    }

    #[test]
    fn test_forget_tab_keeps_urls() {
        let (mut workspaces, mut tabs, x_id, _) = setup();
        attach(&mut workspaces, &mut tabs, 3, &x_id, Utc::now()).unwrap();
        assert!(forget_tab(&mut workspaces, 3));
        assert!(workspaces[&x_id].active_tab_ids.is_empty());
        assert_eq!(workspaces[&x_id].urls, vec!["https://crates.io".to_string()]);
        assert!(!forget_tab(&mut workspaces, 3));
    }

    #[test]
    fn test_change_url_follows_member_navigation() {
        let (mut workspaces, mut tabs, x_id, _) = setup();
        let now = Utc::now();
        attach(&mut workspaces, &mut tabs, 1, &x_id, now).unwrap();
        attach(&mut workspaces, &mut tabs, 2, &x_id, now).unwrap();
        attach(&mut workspaces, &mut tabs, 3, &x_id, now).unwrap();

        // Tab 2 still shows docs.rs
        assert!(change_url(&mut workspaces, &mut tabs, 1, "https://docs.rs/tokio"));
        assert_eq!(
            workspaces[&x_id].urls,
            vec![
                "https://docs.rs".to_string(),
                "https://crates.io".to_string(),
                "https://docs.rs/tokio".to_string(),
            ]
        );

        assert!(change_url(&mut workspaces, &mut tabs, 3, "https://docs.rs/tokio"));
        assert!(!workspaces[&x_id].urls.contains(&"https://crates.io".to_string()));
        assert_eq!(workspaces[&x_id].urls.len(), 2);
        assert_eq!(tabs[&3].url, "https://docs.rs/tokio");
    }

    #[test]
    fn test_change_url_outside_workspaces() {
        let (mut workspaces, mut tabs, _, _) = setup();
        assert!(!change_url(&mut workspaces, &mut tabs, 1, "https://docs.rs/serde"));
        assert_eq!(tabs[&1].url, "https://docs.rs/serde");
        assert!(!change_url(&mut workspaces, &mut tabs, 1, "https://docs.rs/serde"));
        assert!(!change_url(&mut workspaces, &mut tabs, 9, "https://docs.rs"));
    }

    #[test]
    fn test_update_metrics_running_mean() {
        let (mut workspaces, mut tabs, x_id, y_id) = setup();
        attach(&mut workspaces, &mut tabs, 1, &x_id, Utc::now()).unwrap();
        tabs.get_mut(&1).unwrap().time_active_ms = 1_000;

        update_metrics(&mut workspaces, &tabs, 80);
        update_metrics(&mut workspaces, &tabs, 40);

        let metrics = &workspaces[&x_id].metrics;
        assert_eq!(metrics.total_time_spent_ms, 1_000);
        assert_eq!(metrics.scored_sessions, 2);
        assert!((metrics.avg_focus_score - 60.0).abs() < f64::EPSILON);
        assert_eq!(workspaces[&y_id].metrics.scored_sessions, 0);
    }
}
