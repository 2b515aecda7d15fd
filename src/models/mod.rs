use crate::errors::ScrapeError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

// ── Fields ────────────────────────────────────────────────────────────────────

/// Logical product fields a site adapter can route text into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Category,
    Title,
    Price,
    InStock,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Category => "category",
            Field::Title => "title",
            Field::Price => "price",
            Field::InStock => "instock",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed value produced by a field reader.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Flag(bool),
}

impl FieldValue {
    fn kind(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "text",
            FieldValue::Number(_) => "number",
            FieldValue::Flag(_) => "flag",
        }
    }
}

// ── Record ────────────────────────────────────────────────────────────────────

/// One product extracted from an item subtree. Unpopulated fields stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub category: Option<String>,
    pub title: Option<String>,
    pub price: Option<f64>,
    pub instock: Option<bool>,
}

impl Record {
    /// Store a reader's value in the slot for `field`.
    pub fn assign(&mut self, field: Field, value: FieldValue) -> Result<(), ScrapeError> {
        match (field, value) {
            (Field::Category, FieldValue::Text(s)) => self.category = Some(s),
            (Field::Title, FieldValue::Text(s)) => self.title = Some(s),
            (Field::Price, FieldValue::Number(p)) => self.price = Some(p),
            (Field::InStock, FieldValue::Flag(b)) => self.instock = Some(b),
            (field, value) => {
                return Err(ScrapeError::FieldType {
                    field,
                    kind: value.kind(),
                });
            }
        }
        Ok(())
    }

    pub fn get(&self, field: Field) -> Option<FieldValue> {
        match field {
            Field::Category => self.category.clone().map(FieldValue::Text),
            Field::Title => self.title.clone().map(FieldValue::Text),
            Field::Price => self.price.map(FieldValue::Number),
            Field::InStock => self.instock.map(FieldValue::Flag),
        }
    }

    pub fn is_in_stock(&self) -> bool {
        self.instock == Some(true)
    }
}

// ── Query results ─────────────────────────────────────────────────────────────

/// Answer to "cheapest in-stock listing for a term".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LowestPrice {
    pub title: String,
    pub category: String,
    pub price: f64,
    pub instock: bool,
}

impl LowestPrice {
    /// Sentinel for a term with no in-stock match.
    pub fn not_found(term: &str) -> Self {
        Self {
            title: term.to_string(),
            category: String::new(),
            price: 0.0,
            instock: false,
        }
    }

    /// Output columns: title, category, price, instock.
    /// Zero price and `false` render as empty strings.
    pub fn columns(&self) -> [String; 4] {
        let price = if self.price == 0.0 {
            String::new()
        } else {
            format!("{:?}", self.price)
        };
        let instock = if self.instock { "true".to_string() } else { String::new() };
        [self.title.clone(), self.category.clone(), price, instock]
    }
}

// ── Search outcome ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SearchStatus {
    Completed,
    /// The page was never fetched; no events were fed.
    Skipped { reason: String },
    /// The session aborted; its partial records were discarded.
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub term: String,
    pub url: Option<String>,
    pub searched_at: NaiveDateTime,
    #[serde(flatten)]
    pub status: SearchStatus,
    pub records: Vec<Record>,
}

/// One output line's worth of results for a term.
#[derive(Debug, Clone, Serialize)]
pub struct TermReport {
    #[serde(flatten)]
    pub outcome: SearchOutcome,
    pub lowest: LowestPrice,
}
