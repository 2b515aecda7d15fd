pub mod canada_computers;

use crate::errors::ScrapeError;
use crate::events::HTML_VOID_TAGS;
use crate::extract::schema::{FieldSchema, NodePredicate};
use url::Url;

pub use self::canada_computers::CanadaComputers;

// ── Adapter trait ─────────────────────────────────────────────────────────────

/// Everything retailer-specific: where to search and how a results page is
/// laid out. Read-only once a session has started.
pub trait SiteAdapter: Send + Sync {
    fn name(&self) -> &str;

    fn search_url(&self, term: &str) -> Result<Url, ScrapeError>;

    /// Tags that open without ever closing; dropped before tree building.
    fn void_tags(&self) -> &[&'static str] {
        HTML_VOID_TAGS
    }

    fn item_root(&self) -> NodePredicate;

    fn field_schema(&self) -> Result<FieldSchema, ScrapeError>;

    /// Regex patterns, matched from the start of the lowercased title.
    /// The default accepts titles equal to the term.
    fn title_patterns(&self, term: &str) -> Vec<String> {
        vec![exact_term_pattern(term)]
    }
}

pub fn exact_term_pattern(term: &str) -> String {
    format!("{}$", regex::escape(&term.to_lowercase()))
}

/// Build the adapter named in config.
pub fn adapter_for(config: &crate::config::SiteConfig) -> Result<Box<dyn SiteAdapter>, ScrapeError> {
    match config.adapter.as_str() {
        "canada_computers" => Ok(Box::new(CanadaComputers::new(config)?)),
        other => Err(ScrapeError::Adapter(format!("unknown site adapter {other:?}"))),
    }
}
