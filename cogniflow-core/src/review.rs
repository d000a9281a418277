//! Review queue
//!
//! Low-confidence automatic classifications wait here, FIFO and at most one
//! entry per URL, until the user confirms a category. Resolving an entry turns
//! the answer into a durable domain rule and applies it to the open tabs.

use crate::error::Result;
use crate::rules::{domain_of, has_domain_rule, upsert_rule};
use crate::store::state::TabMap;
use crate::types::{Category, ReviewEntry, Rule};
use chrono::{DateTime, Utc};

/// Append an entry unless the URL is queued already or its domain has a rule.
///
/// Returns whether an entry was added. Fails with `InvalidUrl` when the
/// domain cannot be determined.
pub fn enqueue(
    queue: &mut Vec<ReviewEntry>,
    rules: &[Rule],
    url: &str,
    guess: Category,
    now: DateTime<Utc>,
) -> Result<bool> {
    let domain = domain_of(url)?;
    if queue.iter().any(|entry| entry.url == url) || has_domain_rule(rules, &domain) {
        return Ok(false);
    }

    queue.push(ReviewEntry {
        url: url.to_string(),
        ai_guess: guess,
        timestamp: now,
    });
    Ok(true)
}

/// What resolving a review entry changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub entry_removed: bool,
    /// Domain of the upserted rule; `None` when the URL had no usable domain
    pub rule_domain: Option<String>,
    pub tabs_updated: usize,
}

/// Resolve a URL to a category.
///
/// Removes the URL's entry, upserts a `domain -> category` rule and sets both
/// categories on every tab showing exactly this URL. An unparseable URL only
/// skips the rule; the rest still applies.
pub fn resolve(
    queue: &mut Vec<ReviewEntry>,
    rules: &mut Vec<Rule>,
    tabs: &mut TabMap,
    url: &str,
    category: &Category,
) -> Resolution {
    let before = queue.len();
    queue.retain(|entry| entry.url != url);

    let rule_domain = match domain_of(url) {
        Ok(domain) => {
            upsert_rule(rules, &domain, category.clone());
            Some(domain)
        }
        Err(e) => {
            tracing::error!(url, error = %e, "Cannot create rule for reviewed URL");
            None
        }
    };

    let mut tabs_updated = 0;
    for record in tabs.values_mut().filter(|r| r.url == url) {
        record.user_category = Some(category.clone());
        record.ai_category = Some(category.clone());
        tabs_updated += 1;
    }

    Resolution {
        entry_removed: queue.len() < before,
        rule_domain,
        tabs_updated,
    }
}
