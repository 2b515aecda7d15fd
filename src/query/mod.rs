//! Comparison queries over the records of one finished session.

use crate::errors::ScrapeError;
use crate::models::{LowestPrice, Record};
use crate::site::SiteAdapter;
use regex::Regex;

// ── Title matching ────────────────────────────────────────────────────────────

/// Title patterns, each matched from the start of the lowercased title.
/// A pattern is anchored at the end only if it says so itself.
#[derive(Debug, Clone)]
pub struct TitleMatcher {
    patterns: Vec<Regex>,
}

impl TitleMatcher {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ScrapeError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                let p = p.as_ref();
                Regex::new(&format!("^(?:{p})")).map_err(|source| ScrapeError::TitlePattern {
                    pattern: p.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn for_term(adapter: &dyn SiteAdapter, term: &str) -> Result<Self, ScrapeError> {
        Self::new(&adapter.title_patterns(term))
    }

    pub fn matches(&self, title: &str) -> bool {
        let title = title.to_lowercase();
        self.patterns.iter().any(|re| re.is_match(&title))
    }

    /// In stock with a matching title.
    fn accepts(&self, record: &Record) -> bool {
        record.is_in_stock() && record.title.as_deref().is_some_and(|t| self.matches(t))
    }
}

// ── Queries ───────────────────────────────────────────────────────────────────

/// Cheapest in-stock record whose title matches. Ties keep the earlier
/// record. With no match, returns [`LowestPrice::not_found`] for `term`.
pub fn lowest_price(records: &[Record], matcher: &TitleMatcher, term: &str) -> LowestPrice {
    let mut best: Option<(&Record, f64)> = None;

    for record in records {
        let Some(price) = record.price else { continue };
        if !matcher.accepts(record) {
            continue;
        }
        if best.is_none_or(|(_, lowest)| price < lowest) {
            best = Some((record, price));
        }
    }

    match best {
        Some((record, price)) => LowestPrice {
            title: record.title.clone().unwrap_or_default(),
            category: record.category.clone().unwrap_or_default(),
            price,
            instock: true,
        },
        None => LowestPrice::not_found(term),
    }
}

/// In-stock records whose title matches, in document order.
pub fn available<'r>(records: &'r [Record], matcher: &TitleMatcher) -> Vec<&'r Record> {
    records.iter().filter(|r| matcher.accepts(r)).collect()
}

pub fn lowest_price_for(
    records: &[Record],
    adapter: &dyn SiteAdapter,
    term: &str,
) -> Result<LowestPrice, ScrapeError> {
    Ok(lowest_price(records, &TitleMatcher::for_term(adapter, term)?, term))
}

pub fn available_for<'r>(
    records: &'r [Record],
    adapter: &dyn SiteAdapter,
    term: &str,
) -> Result<Vec<&'r Record>, ScrapeError> {
    Ok(available(records, &TitleMatcher::for_term(adapter, term)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, price: f64, instock: bool) -> Record {
        Record {
            category: None,
            title: Some(title.to_string()),
            price: Some(price),
            instock: Some(instock),
        }
    }

    fn brand_matcher(term: &str) -> TitleMatcher {
        TitleMatcher::new(&[
            format!("{term}$"),
            format!("msi.*{term}.*"),
            format!("asus.*{term}.*"),
            format!("gigabyte.*{term}.*"),
        ])
        .unwrap()
    }

    #[test]
    fn test_lowest_in_stock_match() {
        let records = vec![
            record("MSI RTX 5060", 599.99, true),
            record("ASUS RTX 5060", 549.99, true),
            record("Gigabyte RTX 5060", 500.00, false),
        ];
        let best = lowest_price(&records, &brand_matcher("rtx 5060"), "rtx 5060");
        assert_eq!(
            best.columns(),
            ["ASUS RTX 5060".to_string(), String::new(), "549.99".to_string(), "true".to_string()]
        );
    }

    #[test]
    fn test_no_in_stock_match_returns_term() {
        let records = vec![
            record("Gigabyte RTX 5060", 500.00, false),
            record("Zotac RTX 5060", 450.00, true),
        ];
        let best = lowest_price(&records, &brand_matcher("rtx 5060"), "rtx 5060");
        assert_eq!(best, LowestPrice::not_found("rtx 5060"));
        assert_eq!(
            best.columns(),
            ["rtx 5060".to_string(), String::new(), String::new(), String::new()]
        );
    }

    #[test]
    fn test_ties_keep_first_record() {
        let records = vec![
            record("MSI RTX 5060 Ventus", 499.99, true),
            record("ASUS RTX 5060 Dual", 499.99, true),
        ];
        let best = lowest_price(&records, &brand_matcher("rtx 5060"), "rtx 5060");
        assert_eq!(best.title, "MSI RTX 5060 Ventus");
    }

    #[test]
    fn test_incomplete_records_never_win() {
        let mut no_price = record("MSI RTX 5060", 0.0, true);
        no_price.price = None;
        let mut no_title = record("", 1.0, true);
        no_title.title = None;
        let records = vec![no_price, no_title, record("ASUS RTX 5060", 700.0, true)];
        let best = lowest_price(&records, &brand_matcher("rtx 5060"), "rtx 5060");
        assert_eq!(best.price, 700.0);
    }

    #[test]
    fn test_patterns_anchor_at_start_only() {
        let m = TitleMatcher::new(&["rtx 5060$", "msi.*rtx 5060.*"]).unwrap();
        assert!(m.matches("RTX 5060"));
        assert!(m.matches("MSI Ventus RTX 5060 OC"));
        assert!(!m.matches("RTX 5060 Ti"));
        assert!(!m.matches("Open box MSI RTX 5060"));
    }

    #[test]
    fn test_available_preserves_order() {
        let records = vec![
            record("MSI RTX 5060", 599.99, true),
            record("ASUS RTX 5070", 749.99, true),
            record("ASUS RTX 5060", 549.99, true),
            record("Gigabyte RTX 5060", 500.00, false),
        ];
        let hits = available(&records, &brand_matcher("rtx 5060"));
        let titles: Vec<_> = hits.iter().filter_map(|r| r.title.as_deref()).collect();
        assert_eq!(titles, vec!["MSI RTX 5060", "ASUS RTX 5060"]);
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        assert!(matches!(
            TitleMatcher::new(&["msi.*(rtx"]),
            Err(ScrapeError::TitlePattern { .. })
        ));
    }
}
