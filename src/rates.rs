//! Retraction rate computation and dashboard rows.
//!
//! Joins one aggregation pass against the publication reference table to
//! produce the final artifact rows: category counters, their sum, the
//! retraction rate per 1000 publications, and the derived flag path.

use crate::aggregate::CountryAggregate;
use crate::publications::PublicationIndex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One output row of a dashboard artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardRow {
    pub country: String,
    pub alterations: u64,
    pub research: u64,
    pub integrity: u64,
    pub supplemental: u64,
    pub system: u64,
    /// Sum of the five category counters (not the record count)
    pub total: u64,
    /// Retractions per 1000 publications, 0.0 when the country has no
    /// publication data
    pub retraction_rate: f64,
    /// Derived flag asset path, computed at serialization time
    pub country_flag: String,
}

/// Join aggregates against publication totals into ordered dashboard rows.
///
/// Rows come out sorted by country name ascending so artifacts are
/// reproducible and diffable.
pub fn compute(
    aggregates: &BTreeMap<String, CountryAggregate>,
    publications: &PublicationIndex,
) -> Vec<DashboardRow> {
    aggregates
        .iter()
        .map(|(country, agg)| {
            let total = agg.total();
            DashboardRow {
                country: country.clone(),
                alterations: agg.alterations,
                research: agg.research,
                integrity: agg.integrity,
                supplemental: agg.supplemental,
                system: agg.system,
                total,
                retraction_rate: retraction_rate(total, publications.total(country)),
                country_flag: country_flag_path(country),
            }
        })
        .collect()
}

/// Retractions per 1000 publications, rounded to four decimal places.
///
/// A zero or missing denominator degrades to 0.0 rather than failing.
pub fn retraction_rate(total: u64, publications: f64) -> f64 {
    if publications > 0.0 {
        ((total as f64 / publications) * 1000.0 * 10_000.0).round() / 10_000.0
    } else {
        0.0
    }
}

/// Flag asset path for a country name.
///
/// Pure string transform: spaces and `&` become underscores, parentheses are
/// stripped. No existence check against an actual asset.
pub fn country_flag_path(country: &str) -> String {
    let slug: String = country
        .chars()
        .filter(|c| !matches!(c, '(' | ')'))
        .map(|c| match c {
            ' ' | '&' => '_',
            c => c,
        })
        .collect();
    format!("/country_flags/{slug}.svg")
}
