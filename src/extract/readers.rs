use crate::extract::schema::ReadOutcome;
use crate::models::FieldValue;
use once_cell::sync::Lazy;
use regex::Regex;

/// Availability phrase shown for items that can be picked up in store.
pub const PICKUP_PHRASE: &str = "In Store - Available for Pickup";

/// "$<digits>[,digits]*[.digits]" at the very end of the text.
static PRICE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$(\d+(?:,\d+)*(?:\.\d+)?)$").expect("price pattern compiles")
});

// ── Readers ───────────────────────────────────────────────────────────────────

/// Parse the trailing dollar amount: "Sale  $1,234.56" → 1234.56.
/// Blank text is not a failure, only text with no amount at its end is.
pub fn read_price(text: &str) -> ReadOutcome {
    let text = text.trim();
    if text.is_empty() {
        return ReadOutcome::Incomplete;
    }

    let Some(amount) = PRICE_RE.captures(text).and_then(|c| c.get(1)) else {
        return ReadOutcome::Failure("no trailing $amount".to_string());
    };

    match amount.as_str().replace(',', "").parse::<f64>() {
        Ok(price) => ReadOutcome::Success(FieldValue::Number(price)),
        Err(e) => ReadOutcome::Failure(e.to_string()),
    }
}

/// In stock only when the whole block reads as [`PICKUP_PHRASE`]; anything
/// else leaves the field unset so later text may still decide it.
pub fn read_pickup_availability(text: &str) -> ReadOutcome {
    matches_phrase(text, PICKUP_PHRASE)
}

/// Trimmed text, or keep waiting if there is none yet.
pub fn read_text(text: &str) -> ReadOutcome {
    let text = text.trim();
    if text.is_empty() {
        ReadOutcome::Incomplete
    } else {
        ReadOutcome::Success(FieldValue::Text(text.to_string()))
    }
}

pub fn matches_phrase(text: &str, phrase: &str) -> ReadOutcome {
    let text = text.trim();
    if !text.is_empty() && text.to_lowercase() == phrase.to_lowercase() {
        ReadOutcome::Success(FieldValue::Flag(true))
    } else {
        ReadOutcome::Incomplete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price(text: &str) -> Option<f64> {
        match read_price(text) {
            ReadOutcome::Success(FieldValue::Number(p)) => Some(p),
            _ => None,
        }
    }

    #[test]
    fn test_read_price() {
        assert_eq!(price("  $1,234.56"), Some(1234.56));
        assert_eq!(price("$999"), Some(999.0));
        assert_eq!(price("Was $649.99 Now $599.99\n"), Some(599.99));
        assert_eq!(price("$12,345,678"), Some(12_345_678.0));
    }

    #[test]
    fn test_read_price_failures() {
        assert!(matches!(read_price("Free"), ReadOutcome::Failure(_)));
        assert!(matches!(read_price("$599.99 each"), ReadOutcome::Failure(_)));
        assert!(matches!(read_price("$1,23a"), ReadOutcome::Failure(_)));
        assert_eq!(read_price(" \n\t "), ReadOutcome::Incomplete);
    }

    #[test]
    fn test_read_pickup_availability() {
        assert_eq!(
            read_pickup_availability("\n    in store - AVAILABLE for pickup\n  "),
            ReadOutcome::Success(FieldValue::Flag(true))
        );
        assert_eq!(read_pickup_availability("Out of Stock"), ReadOutcome::Incomplete);
        assert_eq!(read_pickup_availability("   "), ReadOutcome::Incomplete);
        assert_eq!(read_pickup_availability(""), ReadOutcome::Incomplete);
    }

    #[test]
    fn test_read_text_trims() {
        assert_eq!(
            read_text("\n  ASUS Dual RTX 5060  "),
            ReadOutcome::Success(FieldValue::Text("ASUS Dual RTX 5060".into()))
        );
        assert_eq!(read_text("  "), ReadOutcome::Incomplete);
    }
}
