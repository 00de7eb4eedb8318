//! Per-country aggregation of classified retraction records.
//!
//! One aggregation pass walks the full record list once, keyed by a single
//! date dimension and bounded below by a year window. Counts fan out: a
//! record listing several countries increments every one of them, and a
//! reason matching several categories increments every matched counter.
//! Neither dimension is deduplicated.

use crate::classifier::{Category, KeywordClassifier};
use crate::publications::FIRST_REFERENCE_YEAR;
use crate::records::RetractionRecord;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// Which date field a generation pass aggregates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    /// Date the retracted paper was originally published
    OriginalPaper,
    /// Date the retraction notice was issued
    Notice,
}

impl DateField {
    /// Both date dimensions, in artifact-layout order
    pub const BOTH: [DateField; 2] = [DateField::OriginalPaper, DateField::Notice];

    /// Select this dimension's date from a record
    pub fn of(&self, record: &RetractionRecord) -> Option<NaiveDate> {
        match self {
            DateField::OriginalPaper => record.original_paper_date,
            DateField::Notice => record.notice_date,
        }
    }

    /// Output subdirectory holding this dimension's artifacts
    pub fn output_dir(&self) -> &'static str {
        match self {
            DateField::OriginalPaper => "years",
            DateField::Notice => "notice_years",
        }
    }
}

/// Per-country category counters for one aggregation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryAggregate {
    pub alterations: u64,
    pub research: u64,
    pub integrity: u64,
    pub supplemental: u64,
    pub system: u64,
}

impl CountryAggregate {
    fn bump(&mut self, category: Category) {
        match category {
            Category::Alterations => self.alterations += 1,
            Category::Research => self.research += 1,
            Category::Integrity => self.integrity += 1,
            Category::Supplemental => self.supplemental += 1,
            Category::System => self.system += 1,
        }
    }

    /// Sum of the five category counters.
    ///
    /// A record matching two categories contributes 2 here; the total is the
    /// sum of category counts, not the record count.
    pub fn total(&self) -> u64 {
        self.alterations + self.research + self.integrity + self.supplemental + self.system
    }
}

/// Aggregate classified records per country over one date dimension.
///
/// Records whose selected date is absent are excluded from this pass. The
/// effective lower bound is `max(year_lower_bound, 1996)`: the reference
/// publication table starts in 1996, so earlier records are excluded from
/// every window including the unbounded one. Output is sparse: only countries
/// with at least one category match in range appear.
pub fn aggregate(
    records: &[RetractionRecord],
    date_field: DateField,
    year_lower_bound: Option<i32>,
    classifier: &KeywordClassifier,
) -> BTreeMap<String, CountryAggregate> {
    let min_year = year_lower_bound.map_or(FIRST_REFERENCE_YEAR, |y| y.max(FIRST_REFERENCE_YEAR));

    let mut by_country: BTreeMap<String, CountryAggregate> = BTreeMap::new();
    for record in records {
        let Some(date) = date_field.of(record) else {
            continue;
        };
        if date.year() < min_year {
            continue;
        }

        let matched = classifier.classify(&record.reason_text);
        if matched.is_empty() {
            continue;
        }

        for country in &record.countries {
            let entry = by_country.entry(country.clone()).or_default();
            for category in &matched {
                entry.bump(*category);
            }
        }
    }

    by_country
}
