pub mod http_client;

use crate::errors::{FetchError, ScrapeError};
use crate::events::tokenize;
use crate::extract::Session;
use crate::models::{Record, SearchOutcome, SearchStatus};
use crate::site::SiteAdapter;
use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use tracing::{error, info, warn};
use url::Url;

pub use self::http_client::HttpClient;

// ── Fetch trait ───────────────────────────────────────────────────────────────

/// Swappable page source: a full response body, or why there is none.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn get_text(&self, url: &Url) -> Result<String, FetchError>;
}

// ── Extraction ────────────────────────────────────────────────────────────────

/// Run one session over a complete page.
pub fn extract_records(site: &dyn SiteAdapter, markup: &str) -> Result<Vec<Record>, ScrapeError> {
    let mut session = Session::begin(site)?;
    tokenize(markup, site.void_tags(), |event| session.feed(event))?;
    Ok(session.end())
}

// ── Product search ────────────────────────────────────────────────────────────

pub struct ProductSearch<F> {
    fetcher: F,
    site: Box<dyn SiteAdapter>,
    error_page: Option<PathBuf>,
}

impl<F: PageFetcher> ProductSearch<F> {
    pub fn new(fetcher: F, site: Box<dyn SiteAdapter>) -> Self {
        Self {
            fetcher,
            site,
            error_page: None,
        }
    }

    /// Save the markup of pages that fail to parse to `path`.
    pub fn with_error_page(mut self, path: Option<PathBuf>) -> Self {
        self.error_page = path;
        self
    }

    pub fn site(&self) -> &dyn SiteAdapter {
        self.site.as_ref()
    }

    /// Fetch and extract one term. Failures are reported in the outcome;
    /// a failed page keeps none of its partial records.
    pub async fn search(&self, term: &str) -> SearchOutcome {
        let searched_at = Utc::now().naive_utc();
        let outcome = |url: Option<&Url>, status, records| SearchOutcome {
            term: term.to_string(),
            url: url.map(|u| u.to_string()),
            searched_at,
            status,
            records,
        };

        let url = match self.site.search_url(term) {
            Ok(url) => url,
            Err(e) => {
                warn!("'{}': no search url: {}", term, e);
                return outcome(None, SearchStatus::Skipped { reason: e.to_string() }, vec![]);
            }
        };

        let markup = match self.fetcher.get_text(&url).await {
            Ok(markup) => markup,
            Err(e) => {
                warn!("'{}' - *** {:#}", term, anyhow::Error::from(e));
                let reason = format!("fetch failed for {url}");
                return outcome(Some(&url), SearchStatus::Skipped { reason }, vec![]);
            }
        };
        info!("'{}' - fetched {} bytes", term, markup.len());

        match extract_records(self.site(), &markup) {
            Ok(records) => {
                info!("'{}' - {} records", term, records.len());
                outcome(Some(&url), SearchStatus::Completed, records)
            }
            Err(e) => {
                error!("'{}' - page rejected: {}", term, e);
                self.save_error_page(&markup);
                outcome(Some(&url), SearchStatus::Failed { reason: e.to_string() }, vec![])
            }
        }
    }

    fn save_error_page(&self, markup: &str) {
        let Some(path) = &self.error_page else { return };
        match std::fs::write(path, markup) {
            Ok(()) => info!("Saved failing page to {:?}", path),
            Err(e) => warn!("Could not save failing page to {:?}: {}", path, e),
        }
    }
}
