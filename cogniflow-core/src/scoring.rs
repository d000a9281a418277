//! Session scoring
//!
//! Aggregates tab records into per-category counts and times, time sinks and
//! a productivity score in `[0, 100]`.

use crate::store::state::TabMap;
use crate::types::Category;
use std::collections::BTreeMap;

/// Aggregates computed from the tracked tabs
#[derive(Debug, Clone, PartialEq)]
pub struct SessionScore {
    pub categories: BTreeMap<Category, u32>,
    pub time_per_category: BTreeMap<Category, i64>,
    pub total_tabs: u32,
    pub score: u32,
    pub time_sinks: Vec<String>,
}

/// Score the current tab records.
///
/// A distracting tab whose active time exceeds `time_sink_ms` is a time sink;
/// time sinks are listed once per URL in first-seen order.
pub fn score_tabs(tabs: &TabMap, time_sink_ms: i64) -> SessionScore {
    let mut categories: BTreeMap<Category, u32> =
        Category::BASE.iter().map(|c| (c.clone(), 0)).collect();
    let mut time_per_category: BTreeMap<Category, i64> =
        Category::BASE.iter().map(|c| (c.clone(), 0)).collect();
    let mut time_sinks: Vec<String> = Vec::new();

    for record in tabs.values() {
        let category = record.effective_category();
        let time = record.time_active_ms.max(0);

        *categories.entry(category.clone()).or_default() += 1;
        *time_per_category.entry(category.clone()).or_default() += time;

        if category.is_distraction()
            && time > time_sink_ms
            && !time_sinks.contains(&record.url)
        {
            time_sinks.push(record.url.clone());
        }
    }

    SessionScore {
        score: productivity_score(&time_per_category),
        categories,
        time_per_category,
        total_tabs: tabs.len() as u32,
        time_sinks,
    }
}

/// `floor(productive / total * 100)`; 100 when nothing was tracked.
pub fn productivity_score(time_per_category: &BTreeMap<Category, i64>) -> u32 {
    let total: i64 = time_per_category.values().sum();
    if total <= 0 {
        return 100;
    }
    let productive: i64 = time_per_category
        .iter()
        .filter(|(category, _)| category.is_productive())
        .map(|(_, time)| *time)
        .sum();

    (productive.saturating_mul(100) / total) as u32
}
