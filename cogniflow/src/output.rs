//! Text and JSON rendering for CLI results

use anyhow::Result;
use cogniflow_core::{
    Category, CommandResponse, Engine, ReviewEntry, Rule, ScoreHistoryEntry, SessionReport,
    Workspace,
};
use serde::Serialize;

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Failures are printed only in JSON mode; otherwise they surface as the exit error.
pub fn response(response: &CommandResponse, json: bool) -> Result<()> {
    if json {
        return print_json(response);
    }
    if response.success {
        println!("{}", response.message);
    }
    Ok(())
}

pub fn status(engine: &Engine, json: bool) -> Result<()> {
    let focus = engine.focus_mode_active()?;
    let goal = engine.current_goal()?;
    let tabs = engine.tab_snapshot()?;
    let workspaces = engine.list_workspaces()?;
    let review = engine.list_review_queue()?;
    let last_score = engine.score_history()?.last().map(|e| e.score);

    if json {
        return print_json(&serde_json::json!({
            "focusModeActive": focus,
            "currentGoal": goal,
            "trackedTabs": tabs.len(),
            "workspaces": workspaces.len(),
            "pendingReview": review.len(),
            "lastScore": last_score,
        }));
    }

    println!("Focus mode:     {}", if focus { "on" } else { "off" });
    println!("Goal:           {}", goal.as_deref().unwrap_or("-"));
    println!("Tracked tabs:   {}", tabs.len());
    println!("Workspaces:     {}", workspaces.len());
    println!("Pending review: {}", review.len());
    match last_score {
        Some(score) => println!("Last score:     {score}"),
        None => println!("Last score:     -"),
    }
    Ok(())
}

pub fn categories(categories: &[Category], json: bool) -> Result<()> {
    if json {
        return print_json(categories);
    }
    for category in categories {
        println!("{category}");
    }
    Ok(())
}

pub fn rules(rules: &[Rule], json: bool) -> Result<()> {
    if json {
        return print_json(rules);
    }
    if rules.is_empty() {
        println!("No rules.");
        return Ok(());
    }
    let width = rules.iter().map(|r| r.pattern.len()).max().unwrap_or(0);
    for rule in rules {
        println!("{:<width$}  {}", rule.pattern, rule.category);
    }
    Ok(())
}

pub fn review_queue(entries: &[ReviewEntry], json: bool) -> Result<()> {
    if json {
        return print_json(entries);
    }
    if entries.is_empty() {
        println!("Review queue is empty.");
        return Ok(());
    }
    for entry in entries {
        println!(
            "{}  {}  (guess: {})",
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            entry.url,
            entry.ai_guess
        );
    }
    Ok(())
}

pub fn workspaces(workspaces: &[Workspace], json: bool) -> Result<()> {
    if json {
        return print_json(workspaces);
    }
    if workspaces.is_empty() {
        println!("No workspaces.");
        return Ok(());
    }
    for ws in workspaces {
        println!(
            "{}  {}  ({} urls, avg score {:.1} over {} sessions)",
            ws.id,
            ws.name,
            ws.urls.len(),
            ws.metrics.avg_focus_score,
            ws.metrics.scored_sessions
        );
    }
    Ok(())
}

pub fn history(entries: &[ScoreHistoryEntry], json: bool) -> Result<()> {
    if json {
        return print_json(entries);
    }
    if entries.is_empty() {
        println!("No sessions analyzed yet.");
        return Ok(());
    }
    for entry in entries {
        let sinks = if entry.time_sinks.is_empty() {
            String::new()
        } else {
            format!("  time sinks: {}", entry.time_sinks.join(", "))
        };
        println!("{}  score {:>3}{}", entry.date, entry.score, sinks);
    }
    Ok(())
}

pub fn report(report: &SessionReport, json: bool) -> Result<()> {
    if json {
        return print_json(report);
    }

    println!("Productivity score: {}", report.score);
    println!("Tabs tracked:       {}", report.total_tabs);
    println!(
        "Session length:     {}",
        format_duration(report.total_session_time_ms)
    );
    println!();
    println!("By category:");
    for (category, count) in &report.categories {
        let time = report.time_per_category.get(category).copied().unwrap_or(0);
        println!("  {:<14} {:>3} tabs  {}", category.label(), count, format_duration(time));
    }
    if !report.time_sinks.is_empty() {
        println!();
        println!("Time sinks:");
        for url in &report.time_sinks {
            println!("  {url}");
        }
    }
    Ok(())
}

/// Render milliseconds as `1h 02m`, `3m 05s` or `12s`.
pub fn format_duration(ms: i64) -> String {
    let secs = ms.max(0) / 1000;
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}h {m:02}m")
    } else if m > 0 {
        format!("{m}m {s:02}s")
    } else {
        format!("{s}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(12_400), "12s");
        assert_eq!(format_duration(185_000), "3m 05s");
        assert_eq!(format_duration(3_720_000), "1h 02m");
        assert_eq!(format_duration(-5), "0s");
    }
}
