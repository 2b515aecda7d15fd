use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub site: SiteConfig,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScraperConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Pause between two search terms.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    #[serde(default)]
    pub jitter_ms: u64,

    /// Extra attempts on 429/5xx and transport errors.
    #[serde(default)]
    pub max_retries: u32,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// What to search for and where results go
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    #[serde(default = "default_terms")]
    pub terms: Vec<String>,

    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    /// Where to dump the markup of a page that failed to parse.
    #[serde(default = "default_error_page_path")]
    pub error_page_path: Option<PathBuf>,
}

/// Retailer adapter configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
    #[serde(default = "default_adapter")]
    pub adapter: String,

    #[serde(default = "default_search_url")]
    pub search_url: String,

    #[serde(default = "default_pickup_store")]
    pub pickup_store: String,

    #[serde(default = "default_brands")]
    pub brands: Vec<String>,

    /// Leave unreadable prices unset instead of aborting the page.
    #[serde(default)]
    pub lenient_prices: bool,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_timeout_secs() -> u64 {
    30
}
fn default_request_delay_ms() -> u64 {
    1100
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:138.0) Gecko/20100101 Firefox/138.0".to_string()
}
fn default_terms() -> Vec<String> {
    vec!["rtx 5060".into(), "rtx 5070".into(), "rx 9060".into()]
}
fn default_output_path() -> PathBuf {
    PathBuf::from("found_prices.txt")
}
fn default_error_page_path() -> Option<PathBuf> {
    Some(PathBuf::from("error_page.html"))
}
fn default_adapter() -> String {
    "canada_computers".to_string()
}
fn default_search_url() -> String {
    "https://www.canadacomputers.com/en/search".to_string()
}
fn default_pickup_store() -> String {
    "62".to_string()
}
fn default_brands() -> Vec<String> {
    vec!["msi".into(), "asus".into(), "gigabyte".into()]
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("PRICE_SCOUT").separator("__"))
            .build()?;

        let app_cfg: AppConfig = cfg.try_deserialize().unwrap_or_else(|e| {
            tracing::debug!("Using default configuration ({})", e);
            AppConfig::default()
        });
        Ok(app_cfg)
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            request_delay_ms: default_request_delay_ms(),
            jitter_ms: 0,
            max_retries: 0,
            user_agent: default_user_agent(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            terms: default_terms(),
            output_path: default_output_path(),
            error_page_path: default_error_page_path(),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            adapter: default_adapter(),
            search_url: default_search_url(),
            pickup_store: default_pickup_store(),
            brands: default_brands(),
            lenient_prices: false,
        }
    }
}
