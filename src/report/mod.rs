//! Result files: one tab-separated line per term, or a JSON document.

use crate::models::TermReport;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// `title \t category \t price \t instock`, no header.
pub fn write_tsv<W: Write>(out: W, reports: &[TermReport]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(out);

    for report in reports {
        writer
            .write_record(report.lowest.columns())
            .with_context(|| format!("write line for '{}'", report.outcome.term))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_json<W: Write>(out: W, reports: &[TermReport]) -> Result<()> {
    serde_json::to_writer_pretty(out, reports).context("serialize results")?;
    Ok(())
}

pub fn save(path: &Path, reports: &[TermReport], json: bool) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Could not create dir {:?}", parent))?;
    }
    let file = std::fs::File::create(path).with_context(|| format!("Could not create {:?}", path))?;
    if json {
        write_json(file, reports)?;
    } else {
        write_tsv(file, reports)?;
    }
    info!("Wrote {} line(s) to {:?}", reports.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LowestPrice, Record, SearchOutcome, SearchStatus};
    use chrono::NaiveDate;

    fn report(term: &str, lowest: LowestPrice) -> TermReport {
        let searched_at = NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        TermReport {
            outcome: SearchOutcome {
                term: term.to_string(),
                url: None,
                searched_at,
                status: SearchStatus::Completed,
                records: vec![Record::default()],
            },
            lowest,
        }
    }

    #[test]
    fn test_tsv_lines() {
        let reports = vec![
            report(
                "rtx 5060",
                LowestPrice {
                    title: "ASUS RTX 5060".into(),
                    category: String::new(),
                    price: 549.99,
                    instock: true,
                },
            ),
            report("rx 9060", LowestPrice::not_found("rx 9060")),
        ];
        let mut buf = Vec::new();
        write_tsv(&mut buf, &reports).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "ASUS RTX 5060\t\t549.99\ttrue\nrx 9060\t\t\t\n"
        );
    }

    #[test]
    fn test_json_carries_status_and_lowest() {
        let mut buf = Vec::new();
        write_json(&mut buf, &[report("rx 9060", LowestPrice::not_found("rx 9060"))]).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(v[0]["term"], "rx 9060");
        assert_eq!(v[0]["status"], "completed");
        assert_eq!(v[0]["lowest"]["instock"], false);
        assert_eq!(v[0]["records"].as_array().unwrap().len(), 1);
    }
}
