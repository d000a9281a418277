//! Event log replay
//!
//! Feeds a recorded browser session through a fresh engine and prints the
//! resulting session report. Each line of the log is a JSON object:
//!
//! ```text
//! {"at": "2025-01-06T09:00:00Z", "event": {"type": "tabUpdated", "tabId": 1, "status": "complete", "url": "https://docs.rs"}}
//! {"at": "2025-01-06T09:00:00Z", "event": {"type": "tabActivated", "tabId": 1}}
//! {"command": {"type": "toggleFocusMode"}}
//! ```
//!
//! `at` moves the engine clock; lines without it happen at the previous
//! instant. State is kept in memory, so replays never touch the database.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use cogniflow_core::{
    Command, Config, Event, InMemoryDirectory, ManualClock, MemoryStore, TabInfo, TabStatus,
};
use serde::Deserialize;

use crate::{build_engine, output};

const REPLAY_WINDOW: i64 = 1;

#[derive(Debug, Deserialize)]
struct ReplayLine {
    #[serde(default)]
    at: Option<DateTime<Utc>>,
    #[serde(default)]
    event: Option<Event>,
    #[serde(default)]
    command: Option<Command>,
}

fn parse_log(content: &str) -> Result<Vec<ReplayLine>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).with_context(|| format!("line {}: invalid entry", i + 1))
        })
        .collect()
}

/// Mirror an event into the directory so the engine sees the same browser.
fn apply_to_directory(directory: &InMemoryDirectory, event: &Event) {
    match event {
        Event::TabUpdated {
            tab_id,
            status,
            url,
        } => {
            let mut tab = directory.tab(*tab_id).unwrap_or_else(|| blank_tab(*tab_id));
            tab.url = url.clone();
            directory.upsert_tab(tab);
            // A completed load is treated as the foreground tab
            if *status == TabStatus::Complete {
                directory.activate(*tab_id);
            }
        }
        Event::ContentExtracted {
            tab_id, url, title, ..
        } => {
            let mut tab = directory.tab(*tab_id).unwrap_or_else(|| blank_tab(*tab_id));
            tab.url = url.clone();
            tab.title = title.clone();
            directory.upsert_tab(tab);
        }
        Event::TabActivated { tab_id } => {
            if directory.tab(*tab_id).is_none() {
                directory.upsert_tab(blank_tab(*tab_id));
            }
            directory.activate(*tab_id);
        }
        Event::TabRemoved { tab_id } => {
            directory.remove_tab(*tab_id);
        }
        Event::OverrideBlock { .. } => {}
    }
}

fn blank_tab(id: i64) -> TabInfo {
    TabInfo {
        id,
        window_id: REPLAY_WINDOW,
        url: String::new(),
        title: String::new(),
        active: false,
    }
}

pub async fn run(config: Config, path: &Path, json: bool) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let lines = parse_log(&content)?;

    let start = lines.iter().find_map(|l| l.at).unwrap_or_else(Utc::now);
    let clock = Arc::new(ManualClock::new(start));
    let directory = Arc::new(InMemoryDirectory::new());
    let engine = build_engine(
        Arc::new(MemoryStore::new()),
        directory.clone(),
        clock.clone(),
        config,
    )?;

    tracing::info!(path = %path.display(), entries = lines.len(), "Replaying event log");

    let mut failures = 0usize;
    for (i, line) in lines.into_iter().enumerate() {
        if let Some(at) = line.at {
            clock.set(at);
        }
        if let Some(event) = line.event {
            apply_to_directory(&directory, &event);
            if let Err(e) = engine.handle_event(event).await {
                tracing::warn!(entry = i + 1, error = %e, "Replayed event failed");
                failures += 1;
            }
        }
        if let Some(command) = line.command {
            let response = engine.execute(command).await;
            if !response.success {
                eprintln!("entry {}: {}", i + 1, response.message);
                failures += 1;
            }
        }
    }

    let report = engine
        .analyze_session()
        .await
        .context("failed to analyze replayed session")?;
    output::report(&report, json)?;

    if failures > 0 && !json {
        println!();
        println!("{failures} entries failed during replay");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_skips_blank_lines() {
        let log = r#"
{"at":"2025-01-06T09:00:00Z","event":{"type":"tabActivated","tabId":1}}

{"command":{"type":"toggleFocusMode"}}
"#;
        let lines = parse_log(log).unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].at.is_some());
        assert_eq!(lines[1].command, Some(Command::ToggleFocusMode));
    }

    #[test]
    fn test_parse_log_reports_line_number() {
        let err = parse_log("{\"command\":{\"type\":\"toggleFocusMode\"}}\nnot json")
            .unwrap_err()
            .to_string();
        assert!(err.contains("line 2"), "unexpected error: {err}");
    }

    #[test]
    fn test_directory_follows_events() {
        let dir = InMemoryDirectory::new();
        apply_to_directory(
            &dir,
            &Event::TabUpdated {
                tab_id: 7,
                status: TabStatus::Complete,
                url: "https://a.com".to_string(),
            },
        );
        apply_to_directory(&dir, &Event::TabActivated { tab_id: 7 });
        assert_eq!(dir.tab(7).map(|t| t.active), Some(true));

        apply_to_directory(
            &dir,
            &Event::ContentExtracted {
                tab_id: 7,
                url: "https://a.com".to_string(),
                title: "A".to_string(),
                text: String::new(),
            },
        );
        let tab = dir.tab(7).unwrap();
        assert_eq!(tab.title, "A");
        assert!(tab.active);

        apply_to_directory(&dir, &Event::TabRemoved { tab_id: 7 });
        assert!(dir.tabs().is_empty());
    }
}
