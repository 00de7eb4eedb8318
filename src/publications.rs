//! Per-country publication totals from the reference table.
//!
//! The reference table carries one row per country with one column per year;
//! the index sums the 1996-2024 columns and serves as the denominator for
//! retraction rate computation. Countries absent from the table simply yield
//! a zero total.

use crate::error::{DashboardError, Result};
use std::collections::HashMap;
use std::io::Read;
use tracing::info;

/// Year range of the reference table columns summed into the denominator
pub const FIRST_REFERENCE_YEAR: i32 = 1996;
pub const LAST_REFERENCE_YEAR: i32 = 2024;

/// Publication totals keyed by country name.
pub struct PublicationIndex {
    totals: HashMap<String, f64>,
}

impl PublicationIndex {
    /// Load the reference table from any reader.
    ///
    /// The table must have a `Country` column and at least one year column in
    /// the 1996-2024 range; anything else is an input-shape error since no
    /// denominator could be produced. Non-numeric or empty cells contribute
    /// zero to a country's total.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let headers = rdr.headers()?.clone();

        let country_idx = headers
            .iter()
            .position(|h| h.trim() == "Country")
            .ok_or_else(|| {
                DashboardError::InputShape("reference table has no Country column".to_string())
            })?;

        let year_idxs: Vec<usize> = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| {
                h.trim()
                    .parse::<i32>()
                    .is_ok_and(|y| (FIRST_REFERENCE_YEAR..=LAST_REFERENCE_YEAR).contains(&y))
            })
            .map(|(idx, _)| idx)
            .collect();

        if year_idxs.is_empty() {
            return Err(DashboardError::InputShape(
                "reference table has no 1996-2024 year columns".to_string(),
            ));
        }

        let mut totals = HashMap::new();
        for row in rdr.records() {
            let row = row?;
            let country = row.get(country_idx).unwrap_or("").trim();
            if country.is_empty() {
                continue;
            }
            let total: f64 = year_idxs
                .iter()
                .map(|&idx| {
                    row.get(idx)
                        .and_then(|cell| cell.trim().parse::<f64>().ok())
                        .unwrap_or(0.0)
                })
                .sum();
            totals.insert(country.to_string(), total);
        }

        info!(countries = totals.len(), "Loaded publication reference table");
        Ok(Self { totals })
    }

    /// Total publications for a country, zero when absent from the table.
    pub fn total(&self, country: &str) -> f64 {
        self.totals.get(country).copied().unwrap_or(0.0)
    }

    /// Number of countries in the index
    pub fn len(&self) -> usize {
        self.totals.len()
    }

    /// Whether the index holds no countries
    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}
