//! Time accounting
//!
//! Each tab record carries an open interval (`last_activated_at`) while it is
//! the foreground tab. Activating a tab closes every other open interval into
//! `time_active_ms` and opens a new one for the activated tab, so intervals
//! never overlap and accumulated time never decreases.

use crate::store::state::TabMap;
use crate::types::{TabId, TabRecord};
use chrono::{DateTime, Utc};

/// Close a record's open interval, if any.
///
/// Negative elapsed time (clock moved backwards) counts as zero.
pub fn close_interval(record: &mut TabRecord, now: DateTime<Utc>) -> i64 {
    let Some(since) = record.last_activated_at.take() else {
        return 0;
    };
    let elapsed = (now - since).num_milliseconds().max(0);
    record.time_active_ms = record.time_active_ms.saturating_add(elapsed);
    elapsed
}

/// Result of [`record_activation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Active tab's record now has an open interval
    Opened,
    /// Active tab has no record yet; caller must create one
    Untracked,
    /// No active tab; every interval was closed
    AllClosed,
}

/// Move the foreground to `active` (or to nobody when `None`).
pub fn record_activation(
    tabs: &mut TabMap,
    active: Option<TabId>,
    now: DateTime<Utc>,
) -> Activation {
    for (id, record) in tabs.iter_mut() {
        if Some(*id) != active {
            close_interval(record, now);
        }
    }

    let Some(active) = active else {
        return Activation::AllClosed;
    };

    match tabs.get_mut(&active) {
        Some(record) => {
            // Re-activating the foreground tab keeps its time so far.
            close_interval(record, now);
            record.last_activated_at = Some(now);
            Activation::Opened
        }
        None => Activation::Untracked,
    }
}

/// Number of records with an open interval
pub fn open_intervals(tabs: &TabMap) -> usize {
    tabs.values().filter(|r| r.is_active()).count()
}
