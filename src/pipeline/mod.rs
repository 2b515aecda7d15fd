//! Pipeline orchestrator: ties fetch → extraction → query together.
//!
//! Terms run one after another, each in its own session. A term whose page
//! cannot be fetched or parsed is reported and the run moves on; it still
//! gets an output line (the "not found" form), so the output always has one
//! line per term, in input order.

use crate::config::AppConfig;
use crate::models::{LowestPrice, SearchStatus, TermReport};
use crate::query::lowest_price_for;
use crate::scraper::{HttpClient, PageFetcher, ProductSearch};
use crate::site::adapter_for;
use anyhow::{Context, Result};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

pub struct Pipeline {
    config: AppConfig,
}

impl Pipeline {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub async fn run(&self, terms: &[String]) -> Result<(Vec<TermReport>, PipelineStats)> {
        let client = HttpClient::new(&self.config.scraper).context("Failed to build HTTP client")?;
        let site = adapter_for(&self.config.site).context("Failed to build site adapter")?;
        info!("Searching {} for {} term(s)", site.name(), terms.len());

        let search = ProductSearch::new(client, site)
            .with_error_page(self.config.search.error_page_path.clone());
        self.run_with(&search, terms).await
    }

    pub async fn run_with<F: PageFetcher>(
        &self,
        search: &ProductSearch<F>,
        terms: &[String],
    ) -> Result<(Vec<TermReport>, PipelineStats)> {
        let mut reports = Vec::with_capacity(terms.len());
        let mut stats = PipelineStats::default();

        for (i, term) in terms.iter().enumerate() {
            if i > 0 {
                self.polite_delay().await;
            }

            let outcome = search.search(term).await;
            let lowest = match lowest_price_for(&outcome.records, search.site(), term) {
                Ok(lowest) => lowest,
                Err(e) => {
                    warn!("'{}': bad title patterns: {}", term, e);
                    LowestPrice::not_found(term)
                }
            };

            stats.terms += 1;
            stats.records += outcome.records.len();
            match &outcome.status {
                SearchStatus::Completed => stats.completed += 1,
                SearchStatus::Skipped { .. } => stats.skipped += 1,
                SearchStatus::Failed { .. } => stats.failed += 1,
            }

            info!(
                "'{}': {}",
                term,
                if lowest.instock {
                    format!("{} at {:?}", lowest.title, lowest.price)
                } else {
                    "nothing in stock".to_string()
                }
            );
            reports.push(TermReport { outcome, lowest });
        }

        Ok((reports, stats))
    }

    /// Sleep for the configured delay + random jitter.
    async fn polite_delay(&self) {
        let cfg = &self.config.scraper;
        let jitter = if cfg.jitter_ms > 0 {
            rand::random::<u64>() % (cfg.jitter_ms + 1)
        } else {
            0
        };
        let total = cfg.request_delay_ms + jitter;
        if total > 0 {
            sleep(Duration::from_millis(total)).await;
        }
    }
}

#[derive(Debug, Default, PartialEq)]
pub struct PipelineStats {
    pub terms: usize,
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub records: usize,
}
