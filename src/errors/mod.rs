use crate::models::Field;
use thiserror::Error;

// ── Session errors ────────────────────────────────────────────────────────────

/// Everything that can abort a scraping session.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// A close event arrived with nothing left on the ancestor stack.
    #[error("close tag </{tag}> with no open element (event source out of sync)")]
    UnbalancedClose { tag: String },

    #[error("could not read {field} from {text:?}: {reason}")]
    FieldParse {
        field: Field,
        text: String,
        reason: String,
    },

    #[error("field {field} cannot hold a {kind} value")]
    FieldType { field: Field, kind: &'static str },

    #[error("site adapter misconfigured: {0}")]
    Adapter(String),

    #[error("invalid title pattern {pattern:?}")]
    TitlePattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid search url")]
    Url(#[from] url::ParseError),
}

// ── Fetch errors ──────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// Worth another attempt: rate limiting, upstream hiccups, transport errors.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Status { status, .. } => matches!(status, 429 | 502 | 503 | 504),
            FetchError::Request { .. } => true,
        }
    }
}
