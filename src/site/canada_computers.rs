//! Canada Computers search results.
//!
//! Layout of one result:
//! ```html
//! <div class="product ...">
//!   <div class="product-title"><a href="...">ASUS Dual GeForce RTX 5060 8GB</a></div>
//!   <span class="price">$449.99</span>
//!   <div class="available-tag"><b>In Store - Available for Pickup</b></div>
//! </div>
//! ```

use crate::config::SiteConfig;
use crate::dom::NodeRef;
use crate::errors::ScrapeError;
use crate::extract::readers::{read_pickup_availability, read_price, read_text};
use crate::extract::schema::{FailurePolicy, FieldSchema, FieldSpec, NodePredicate};
use crate::models::Field;
use crate::site::{SiteAdapter, exact_term_pattern};
use url::Url;

pub struct CanadaComputers {
    search_url: Url,
    pickup_store: String,
    brands: Vec<String>,
    price_policy: FailurePolicy,
}

impl CanadaComputers {
    pub fn new(config: &SiteConfig) -> Result<Self, ScrapeError> {
        if config.search_url.trim().is_empty() {
            return Err(ScrapeError::Adapter("site.search_url is not set".into()));
        }
        Ok(Self {
            search_url: Url::parse(config.search_url.trim())?,
            pickup_store: config.pickup_store.clone(),
            brands: config.brands.iter().map(|b| b.to_lowercase()).collect(),
            price_policy: if config.lenient_prices {
                FailurePolicy::Skip
            } else {
                FailurePolicy::Abort
            },
        })
    }
}

// ── Predicates ────────────────────────────────────────────────────────────────

fn is_product(node: NodeRef<'_>) -> bool {
    node.tag() == "div" && node.has_class("product")
}

fn is_title(node: NodeRef<'_>) -> bool {
    node.tag() == "a" && node.parent().is_some_and(|p| p.has_class("product-title"))
}

fn is_price(node: NodeRef<'_>) -> bool {
    node.tag() == "span" && node.has_class("price")
}

/// Stock is flagged by a `<b>` somewhere under `div.available-tag`.
fn is_availability(node: NodeRef<'_>) -> bool {
    node.tag() == "b"
        && node
            .ancestors_with_tag("div")
            .any(|div| div.has_class("available-tag"))
}

impl SiteAdapter for CanadaComputers {
    fn name(&self) -> &str {
        "canada_computers"
    }

    fn search_url(&self, term: &str) -> Result<Url, ScrapeError> {
        let mut url = self.search_url.clone();
        url.query_pairs_mut()
            .clear()
            .append_pair("s", term)
            .append_pair("pickup", &self.pickup_store);
        Ok(url)
    }

    fn item_root(&self) -> NodePredicate {
        is_product
    }

    fn field_schema(&self) -> Result<FieldSchema, ScrapeError> {
        FieldSchema::new(vec![
            FieldSpec::new(Field::Category),
            FieldSpec::new(Field::Title)
                .opens_on(is_title)
                .closes_on(is_title)
                .read_with(read_text),
            FieldSpec::new(Field::Price)
                .opens_on(is_price)
                .closes_on(is_price)
                .read_with(read_price)
                .on_failure(self.price_policy),
            FieldSpec::new(Field::InStock)
                .opens_on(is_availability)
                .closes_on(is_availability)
                .read_with(read_pickup_availability),
        ])
    }

    /// Exact term, or any configured brand followed by the term.
    fn title_patterns(&self, term: &str) -> Vec<String> {
        let mut patterns = vec![exact_term_pattern(term)];
        let term = regex::escape(&term.to_lowercase());
        patterns.extend(
            self.brands
                .iter()
                .map(|brand| format!("{}.*{}.*", regex::escape(brand), term)),
        );
        patterns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::events::tokenize;
    use crate::extract::Session;

    const PAGE: &str = r#"
<html><head><meta charset="utf-8"><title>Search</title></head>
<body>
  <div class="product col-12">
    <img src="a.jpg">
    <div class="product-title"><a href="/p/1">MSI GeForce RTX 5060 Ventus</a></div>
    <span class="price">
      $599.99
    </span>
    <div class="available-tag"><p><b>
       In Store - Available for Pickup
    </b></p></div>
  </div>
  <div class="product">
    <div class="product-title"><a href="/p/2">ASUS Dual RTX 5060</a></div>
    <span class="price">Sale $1,049.00</span>
    <div class="available-tag"><b>Out of Stock</b></div>
  </div>
</body></html>"#;

    fn adapter() -> CanadaComputers {
        CanadaComputers::new(&AppConfig::default().site).unwrap()
    }

    #[test]
    fn test_search_url_encodes_term() {
        let url = adapter().search_url("rtx 5060").unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.canadacomputers.com/en/search?s=rtx+5060&pickup=62"
        );
    }

    #[test]
    fn test_title_patterns() {
        let patterns = adapter().title_patterns("RTX 5060");
        assert_eq!(patterns[0], "rtx 5060$");
        assert_eq!(patterns[1], "msi.*rtx 5060.*");
        assert_eq!(patterns.len(), 4);
    }

    #[test]
    fn test_extracts_results_page() {
        let site = adapter();
        let mut session = Session::begin(&site).unwrap();
        tokenize(PAGE, site.void_tags(), |e| session.feed(e)).unwrap();
        let records = session.end();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title.as_deref(), Some("MSI GeForce RTX 5060 Ventus"));
        assert_eq!(records[0].price, Some(599.99));
        assert_eq!(records[0].instock, Some(true));
        assert_eq!(records[1].title.as_deref(), Some("ASUS Dual RTX 5060"));
        assert_eq!(records[1].price, Some(1049.0));
        assert_eq!(records[1].instock, None);
    }

    #[test]
    fn test_rejects_missing_search_url() {
        let mut config = AppConfig::default().site;
        config.search_url = String::new();
        assert!(matches!(
            CanadaComputers::new(&config),
            Err(ScrapeError::Adapter(_))
        ));
    }
}
