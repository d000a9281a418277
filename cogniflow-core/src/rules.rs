//! Category rule engine
//!
//! Resolves a URL to a category from user-defined rules. A rule matches when
//! the URL contains its pattern literally, or when the pattern read as a
//! wildcard expression (`.` literal, `*` any run of characters) matches.
//!
//! Overlapping rules resolve deterministically: the longest matching pattern
//! wins, and equal lengths fall back to stored order.

use crate::error::{Error, Result};
use crate::types::{Category, Rule};
use regex::Regex;
use url::Url;

/// Category of the best matching rule, or `None` when no rule matches.
pub fn classify_by_rule(url: &str, rules: &[Rule]) -> Option<Category> {
    let mut best: Option<&Rule> = None;

    for rule in rules {
        if !rule_matches(&rule.pattern, url) {
            continue;
        }
        let longer = best.map_or(true, |b| rule.pattern.len() > b.pattern.len());
        if longer {
            best = Some(rule);
        }
    }

    best.map(|rule| rule.category.clone())
}

/// Whether a single pattern matches a URL.
///
/// A pattern that does not compile is a non-match, never an error.
pub fn rule_matches(pattern: &str, url: &str) -> bool {
    if pattern.is_empty() {
        return false;
    }
    if url.contains(pattern) {
        return true;
    }

    match Regex::new(&wildcard_to_regex(pattern)) {
        Ok(re) => re.is_match(url),
        Err(e) => {
            tracing::warn!(pattern, error = %e, "Skipping rule with invalid pattern");
            false
        }
    }
}

fn wildcard_to_regex(pattern: &str) -> String {
    pattern.replace('.', r"\.").replace('*', ".*")
}

/// Host part of a URL, used as the pattern of review-driven rules.
pub fn domain_of(url: &str) -> Result<String> {
    let parsed = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))?;
    parsed
        .host_str()
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidUrl(format!("{url}: no host")))
}

/// Whether a rule keyed exactly on this domain exists.
pub fn has_domain_rule(rules: &[Rule], domain: &str) -> bool {
    rules.iter().any(|rule| rule.pattern == domain)
}

/// Insert a rule or replace the category of an existing one with the same pattern.
///
/// Replacement keeps the rule's position in stored order.
pub fn upsert_rule(rules: &mut Vec<Rule>, pattern: &str, category: Category) {
    match rules.iter_mut().find(|rule| rule.pattern == pattern) {
        Some(existing) => existing.category = category,
        None => rules.push(Rule::new(pattern, category)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::default_rules;

    #[test]
    fn test_substring_match() {
        let rules = default_rules();
        assert_eq!(
            classify_by_rule("https://github.com/rust-lang/rust", &rules),
            Some(Category::Work)
        );
        assert_eq!(
            classify_by_rule("https://www.reddit.com/r/rust", &rules),
            Some(Category::Social)
        );
        assert_eq!(classify_by_rule("https://example.org/", &rules), None);
    }

    #[test]
    fn test_wildcard_match() {
        let rules = vec![Rule::new("docs.*.io", Category::Learning)];
        assert_eq!(
            classify_by_rule("https://docs.tokio.io/guide", &rules),
            Some(Category::Learning)
        );
        // Dot is literal, not "any character"
        assert_eq!(classify_by_rule("https://docsXtokioXio", &rules), None);
    }

    #[test]
    fn test_invalid_pattern_is_skipped() {
        let rules = vec![
            Rule::new("shop(", Category::Shopping),
            Rule::new("example.com", Category::Neutral),
        ];
        assert_eq!(
            classify_by_rule("https://example.com/", &rules),
            Some(Category::Neutral)
        );
        assert!(!rule_matches("shop(", "https://a.com"));
    }

    #[test]
    fn test_longest_pattern_wins() {
        let rules = vec![
            Rule::new("google.com", Category::Neutral),
            Rule::new("mail.google.com", Category::Work),
        ];
        let url = "https://mail.google.com/inbox";
        assert_eq!(classify_by_rule(url, &rules), Some(Category::Work));

        let reversed: Vec<Rule> = rules.into_iter().rev().collect();
        assert_eq!(classify_by_rule(url, &reversed), Some(Category::Work));
    }

    #[test]
    fn test_equal_length_uses_stored_order() {
        let rules = vec![
            Rule::new("a.com", Category::Work),
            Rule::new("*.com", Category::Social),
        ];
        assert_eq!(
            classify_by_rule("https://a.com/", &rules),
            Some(Category::Work)
        );
    }

    #[test]
    fn test_empty_pattern_never_matches() {
        let rules = vec![Rule::new("", Category::Social)];
        assert_eq!(classify_by_rule("https://a.com", &rules), None);
    }

    #[test]
    fn test_domain_of() {
        assert_eq!(domain_of("http://a.com/x").unwrap(), "a.com");
        assert!(matches!(domain_of("not a url"), Err(Error::InvalidUrl(_))));
        assert!(matches!(
            domain_of("data:text/plain,hi"),
            Err(Error::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_upsert_rule_keeps_position() {
        let mut rules = vec![
            Rule::new("a.com", Category::Work),
            Rule::new("b.com", Category::Work),
        ];
        upsert_rule(&mut rules, "a.com", Category::Social);
        upsert_rule(&mut rules, "c.com", Category::Learning);

        assert_eq!(rules[0], Rule::new("a.com", Category::Social));
        assert_eq!(rules[2], Rule::new("c.com", Category::Learning));
        assert!(has_domain_rule(&rules, "b.com"));
        assert!(!has_domain_rule(&rules, "d.com"));
    }
}
