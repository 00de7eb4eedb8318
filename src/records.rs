//! Retraction CSV parsing.
//!
//! Turns raw CSV rows into typed [`RetractionRecord`]s with tolerant date
//! handling: unparseable dates become absent rather than failing the row, and
//! malformed rows are skipped and counted rather than aborting the run.

use crate::error::Result;
use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::io::Read;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Date formats observed in retraction exports, tried in order.
///
/// A trailing time-of-day (e.g. `12/16/2025 0:00`) is stripped before matching.
const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%m/%d/%Y", "%d-%b-%Y", "%d/%m/%Y", "%Y/%m/%d"];

/// Country entries that mean "no usable country"
const UNKNOWN_COUNTRY: &str = "unknown";

fn year_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(19|20)\d{2}\b").expect("static year pattern"))
}

/// One retraction record as consumed by the aggregation pipeline.
#[derive(Debug, Clone)]
pub struct RetractionRecord {
    /// Opaque identifier from the export, kept for dedup/debugging only
    pub record_id: String,
    /// Countries this record counts toward (a record may list several)
    pub countries: BTreeSet<String>,
    /// Date the retracted paper was originally published
    pub original_paper_date: Option<NaiveDate>,
    /// Date the retraction notice was issued
    pub notice_date: Option<NaiveDate>,
    /// Raw free-text reason field
    pub reason_text: String,
}

/// Result of parsing a full CSV export.
#[derive(Debug)]
pub struct ParsedCsv {
    /// Records usable for aggregation
    pub records: Vec<RetractionRecord>,
    /// Rows the CSV reader could not decode
    pub skipped_rows: usize,
}

/// Raw CSV row, mapped by header name.
///
/// Missing columns degrade to empty values so that minimal exports (without
/// the nature column, say) still parse.
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "Record ID", default)]
    record_id: String,
    #[serde(rename = "Country", default)]
    country: String,
    #[serde(rename = "OriginalPaperDate", default)]
    original_paper_date: String,
    #[serde(rename = "RetractionDate", default)]
    retraction_date: String,
    #[serde(rename = "Reason", default)]
    reason: String,
    #[serde(rename = "RetractionNature", default)]
    retraction_nature: Option<String>,
}

/// Parse a retraction CSV export from any reader.
///
/// Rows the CSV decoder rejects are skipped and counted in
/// [`ParsedCsv::skipped_rows`]. Rows that decode but carry no usable country
/// are excluded from the record list. When the export carries a
/// retraction-nature column, rows whose nature is not `Retraction` (e.g.
/// expressions of concern) are excluded as well.
pub fn parse_csv<R: Read>(reader: R) -> Result<ParsedCsv> {
    let mut rdr = csv::Reader::from_reader(reader);

    let mut records = Vec::new();
    let mut skipped_rows = 0usize;
    let mut non_retractions = 0usize;
    let mut countryless = 0usize;

    for row in rdr.deserialize::<RawRow>() {
        let raw = match row {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Skipping malformed CSV row");
                skipped_rows += 1;
                continue;
            }
        };

        if let Some(nature) = raw.retraction_nature.as_deref() {
            let nature = nature.trim();
            if !nature.is_empty() && nature != "Retraction" {
                non_retractions += 1;
                continue;
            }
        }

        let countries = split_countries(&raw.country);
        if countries.is_empty() {
            debug!(record_id = %raw.record_id, "Row has no usable country");
            countryless += 1;
            continue;
        }

        records.push(RetractionRecord {
            record_id: raw.record_id,
            countries,
            original_paper_date: parse_date(&raw.original_paper_date),
            notice_date: parse_date(&raw.retraction_date),
            reason_text: raw.reason,
        });
    }

    info!(
        records = records.len(),
        skipped_rows, non_retractions, countryless, "Parsed retraction CSV"
    );

    Ok(ParsedCsv { records, skipped_rows })
}

/// Split a semicolon/comma-delimited country field into a set.
///
/// Blank and `Unknown` entries are dropped.
fn split_countries(raw: &str) -> BTreeSet<String> {
    raw.split([';', ','])
        .map(str::trim)
        .filter(|entry| !entry.is_empty() && !entry.eq_ignore_ascii_case(UNKNOWN_COUNTRY))
        .map(str::to_string)
        .collect()
}

/// Parse a date field tolerantly.
///
/// Tries the known formats on the first whitespace-separated token, then
/// falls back to extracting a four-digit year anywhere in the string (mapped
/// to January 1st; only the year is consumed downstream). Returns `None` when
/// nothing usable is found.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let token = raw.split_whitespace().next()?;
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(token, format) {
            return Some(date);
        }
    }

    let year: i32 = year_regex().find(raw)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, 1, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 12, 16);
        assert_eq!(parse_date("2025-12-16"), expected);
        assert_eq!(parse_date("12/16/2025"), expected);
        assert_eq!(parse_date("12/16/2025 0:00"), expected);
        assert_eq!(parse_date("16-Dec-2025"), expected);
        assert_eq!(parse_date("2025/12/16"), expected);
    }

    #[test]
    fn test_parse_date_year_fallback() {
        assert_eq!(parse_date("sometime in 2014"), NaiveDate::from_ymd_opt(2014, 1, 1));
    }

    #[test]
    fn test_parse_date_unusable() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("   "), None);
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("99/99/9999"), None);
    }

    #[test]
    fn test_split_countries() {
        let countries = split_countries("China; United States");
        assert_eq!(countries.len(), 2);
        assert!(countries.contains("China"));
        assert!(countries.contains("United States"));

        assert!(split_countries("Unknown").is_empty());
        assert!(split_countries("; ;").is_empty());
        assert_eq!(split_countries("India, unknown").len(), 1);
    }

    #[test]
    fn test_parse_csv_basic() -> Result<()> {
        let csv = "\
Record ID,Country,OriginalPaperDate,RetractionDate,Reason
1,China; India,2020-01-15,2021-06-01,Plagiarism
2,Germany,not a date,16-Mar-2022,Duplication
";
        let parsed = parse_csv(csv.as_bytes())?;
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.skipped_rows, 0);

        let first = &parsed.records[0];
        assert_eq!(first.record_id, "1");
        assert_eq!(first.countries.len(), 2);
        assert_eq!(first.original_paper_date, NaiveDate::from_ymd_opt(2020, 1, 15));

        let second = &parsed.records[1];
        assert_eq!(second.original_paper_date, None);
        assert_eq!(second.notice_date, NaiveDate::from_ymd_opt(2022, 3, 16));
        Ok(())
    }

    #[test]
    fn test_parse_csv_counts_malformed_rows() -> Result<()> {
        let csv = "\
Record ID,Country,OriginalPaperDate,RetractionDate,Reason
1,France,2020-01-15,2021-06-01,Plagiarism
2,too-few-fields
";
        let parsed = parse_csv(csv.as_bytes())?;
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.skipped_rows, 1);
        Ok(())
    }

    #[test]
    fn test_parse_csv_drops_countryless_rows() -> Result<()> {
        let csv = "\
Record ID,Country,OriginalPaperDate,RetractionDate,Reason
1,Unknown,2020-01-15,2021-06-01,Plagiarism
2,,2020-01-15,2021-06-01,Plagiarism
";
        let parsed = parse_csv(csv.as_bytes())?;
        assert!(parsed.records.is_empty());
        assert_eq!(parsed.skipped_rows, 0);
        Ok(())
    }

    #[test]
    fn test_parse_csv_nature_filter() -> Result<()> {
        let csv = "\
Record ID,Country,OriginalPaperDate,RetractionDate,Reason,RetractionNature
1,Brazil,2020-01-15,2021-06-01,Plagiarism,Retraction
2,Brazil,2020-01-15,2021-06-01,Plagiarism,Expression of concern
";
        let parsed = parse_csv(csv.as_bytes())?;
        assert_eq!(parsed.records.len(), 1);
        Ok(())
    }

    #[test]
    fn test_parse_csv_without_nature_column_keeps_all_rows() -> Result<()> {
        let csv = "\
Record ID,Country,OriginalPaperDate,RetractionDate,Reason
1,Japan,2020-01-15,2021-06-01,Plagiarism
";
        let parsed = parse_csv(csv.as_bytes())?;
        assert_eq!(parsed.records.len(), 1);
        Ok(())
    }
}
