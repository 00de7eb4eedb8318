//! Orchestration of the dashboard artifact family.
//!
//! One generation run parses the retraction CSV and the publication reference
//! table once, then replays the in-memory record list across every (date
//! dimension, year window) pair: two dimensions times eleven windows
//! (unbounded plus 1-10 year lookbacks), 22 JSON artifacts in total. Each
//! artifact is computed fully in memory and written atomically; a failure in
//! one window is logged and skipped without aborting the rest.

use crate::aggregate::{self, DateField};
use crate::classifier::KeywordClassifier;
use crate::error::Result;
use crate::publications::PublicationIndex;
use crate::rates;
use crate::records::{self, RetractionRecord};
use crate::storage::Storage;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Number of lookback windows per date dimension, in addition to the
/// unbounded artifact
const LOOKBACK_WINDOWS: i32 = 10;

/// Unbounded artifact file name; lookback windows append `_<N>`
const BASE_ARTIFACT: &str = "dashboard_table";

/// Outcome of one full generation run.
#[derive(Debug)]
pub struct GenerationSummary {
    /// Artifacts written, in generation order
    pub written: Vec<PathBuf>,
    /// Malformed CSV rows skipped during parsing
    pub skipped_rows: usize,
}

/// Generates the full dashboard artifact family.
///
/// Holds the classifier (immutable for the run) and the year the lookback
/// windows are anchored to. The anchor year is injected rather than read from
/// the clock so reruns can be pinned; production callers pass the wall-clock
/// year, which makes the 1-10 year windows a deliberately rolling target.
pub struct DashboardGenerator {
    classifier: KeywordClassifier,
    as_of_year: i32,
}

impl DashboardGenerator {
    pub fn new(classifier: KeywordClassifier, as_of_year: i32) -> Self {
        Self { classifier, as_of_year }
    }

    /// Year the lookback windows are anchored to
    pub fn as_of_year(&self) -> i32 {
        self.as_of_year
    }

    /// Run the full pipeline and write all 22 artifacts under `output_dir`.
    ///
    /// An unreadable CSV or reference table is fatal for the whole request;
    /// a failure while computing or writing a single window is isolated to
    /// that artifact.
    pub fn generate_all(
        &self,
        storage: &dyn Storage,
        csv_path: &Path,
        reference_path: &Path,
        output_dir: &Path,
    ) -> Result<GenerationSummary> {
        let csv_bytes = storage.read(csv_path)?;
        let parsed = records::parse_csv(csv_bytes.as_slice())?;

        let reference_bytes = storage.read(reference_path)?;
        let publications = PublicationIndex::from_reader(reference_bytes.as_slice())?;

        info!(
            records = parsed.records.len(),
            skipped_rows = parsed.skipped_rows,
            as_of_year = self.as_of_year,
            "Starting dashboard generation"
        );

        let mut written = Vec::new();
        for date_field in DateField::BOTH {
            let dimension_dir = output_dir.join(date_field.output_dir());
            for (bound, file_name) in self.windows() {
                let path = dimension_dir.join(&file_name);
                match self.generate_one(storage, &parsed.records, &publications, date_field, bound, &path)
                {
                    Ok(countries) => {
                        info!(path = %path.display(), countries, "Wrote artifact");
                        written.push(path);
                    }
                    Err(e) => {
                        error!(path = %path.display(), error = %e, "Window generation failed, skipping artifact");
                    }
                }
            }
        }

        info!(written = written.len(), "Dashboard generation complete");
        Ok(GenerationSummary { written, skipped_rows: parsed.skipped_rows })
    }

    /// Compute and atomically write one artifact; returns its country count.
    fn generate_one(
        &self,
        storage: &dyn Storage,
        records: &[RetractionRecord],
        publications: &PublicationIndex,
        date_field: DateField,
        year_lower_bound: Option<i32>,
        path: &Path,
    ) -> Result<usize> {
        let aggregates = aggregate::aggregate(records, date_field, year_lower_bound, &self.classifier);
        let rows = rates::compute(&aggregates, publications);
        let json = serde_json::to_vec_pretty(&rows)?;
        storage.write(path, &json)?;
        Ok(rows.len())
    }

    /// The eleven windows of one dimension: unbounded first, then lookbacks
    /// 1..=10 where lookback N covers `as_of_year - N + 1 ..= as_of_year`.
    fn windows(&self) -> Vec<(Option<i32>, String)> {
        let mut windows = vec![(None, format!("{BASE_ARTIFACT}.json"))];
        for n in 1..=LOOKBACK_WINDOWS {
            windows.push((Some(self.as_of_year - n + 1), format!("{BASE_ARTIFACT}_{n}.json")));
        }
        windows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Category;
    use crate::error::DashboardError;
    use crate::rates::DashboardRow;
    use crate::storage::LocalStorage;
    use std::fs;
    use std::path::PathBuf;

    const CSV: &str = "\
Record ID,Country,OriginalPaperDate,RetractionDate,Reason
1,Country A; Country B,2023-06-15,2024-02-01,Duplication and manipulation
2,Country A,2015-03-01,2016-01-10,Plagiarism
3,Country C,1990-01-01,1991-01-01,Plagiarism
";

    const REFERENCE: &str = "\
Country,1996,2000,2024
Country A,1000,1000,1000
Country B,500,0,0
";

    fn classifier() -> KeywordClassifier {
        KeywordClassifier::from_keywords(vec![
            (Category::Alterations, vec!["duplication".to_string()]),
            (Category::Research, vec!["manipulation".to_string()]),
            (Category::Integrity, vec!["plagiarism".to_string()]),
        ])
    }

    struct Fixture {
        dir: tempfile::TempDir,
        csv: PathBuf,
        reference: PathBuf,
        output: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().expect("tempdir");
        let csv = dir.path().join("retractions.csv");
        let reference = dir.path().join("reference.csv");
        let output = dir.path().join("out");
        fs::write(&csv, CSV).expect("csv fixture");
        fs::write(&reference, REFERENCE).expect("reference fixture");
        Fixture { dir, csv, reference, output }
    }

    fn read_rows(path: &Path) -> Vec<DashboardRow> {
        let bytes = fs::read(path).expect("artifact");
        serde_json::from_slice(&bytes).expect("artifact JSON")
    }

    #[test]
    fn test_generates_22_artifacts() -> Result<()> {
        let fx = fixture();
        let generator = DashboardGenerator::new(classifier(), 2025);
        let summary =
            generator.generate_all(&LocalStorage::new(), &fx.csv, &fx.reference, &fx.output)?;

        assert_eq!(summary.written.len(), 22);
        assert_eq!(summary.skipped_rows, 0);
        for dimension in ["years", "notice_years"] {
            assert!(fx.output.join(dimension).join("dashboard_table.json").is_file());
            for n in 1..=10 {
                assert!(fx.output.join(dimension).join(format!("dashboard_table_{n}.json")).is_file());
            }
        }
        Ok(())
    }

    #[test]
    fn test_window_membership_for_2023_record() -> Result<()> {
        let fx = fixture();
        let generator = DashboardGenerator::new(classifier(), 2025);
        generator.generate_all(&LocalStorage::new(), &fx.csv, &fx.reference, &fx.output)?;

        let years = fx.output.join("years");

        // The 2023 two-country record is present in the unbounded artifact and
        // in lookbacks 3..=10, absent from lookbacks 1 and 2.
        let unbounded = read_rows(&years.join("dashboard_table.json"));
        let countries: Vec<&str> = unbounded.iter().map(|r| r.country.as_str()).collect();
        assert_eq!(countries, vec!["Country A", "Country B"]);

        for n in 1..=2 {
            let rows = read_rows(&years.join(format!("dashboard_table_{n}.json")));
            assert!(rows.is_empty(), "window {n} should be empty");
        }
        for n in 3..=10 {
            let rows = read_rows(&years.join(format!("dashboard_table_{n}.json")));
            assert!(rows.iter().any(|r| r.country == "Country A"), "window {n}");
            assert!(rows.iter().any(|r| r.country == "Country B"), "window {n}");
        }

        // Both categories incremented for both countries of the 2023 record
        let b_row = unbounded.iter().find(|r| r.country == "Country B").expect("Country B");
        assert_eq!(b_row.alterations, 1);
        assert_eq!(b_row.research, 1);
        assert_eq!(b_row.total, 2);
        assert_eq!(b_row.retraction_rate, 4.0);
        assert_eq!(b_row.country_flag, "/country_flags/Country_B.svg");

        // The pre-1996 record never appears, even unbounded
        assert!(!unbounded.iter().any(|r| r.country == "Country C"));
        Ok(())
    }

    #[test]
    fn test_windows_are_monotonically_nested() -> Result<()> {
        let fx = fixture();
        let generator = DashboardGenerator::new(classifier(), 2025);
        generator.generate_all(&LocalStorage::new(), &fx.csv, &fx.reference, &fx.output)?;

        let years = fx.output.join("years");
        let mut previous: Option<Vec<DashboardRow>> = None;
        for n in 1..=10 {
            let rows = read_rows(&years.join(format!("dashboard_table_{n}.json")));
            if let Some(prev) = &previous {
                for row in prev {
                    let wider = rows.iter().find(|r| r.country == row.country);
                    let wider = wider.unwrap_or_else(|| panic!("{} missing from window {n}", row.country));
                    assert!(wider.total >= row.total);
                }
            }
            previous = Some(rows);
        }
        Ok(())
    }

    #[test]
    fn test_total_identity_in_every_artifact() -> Result<()> {
        let fx = fixture();
        let generator = DashboardGenerator::new(classifier(), 2025);
        let summary =
            generator.generate_all(&LocalStorage::new(), &fx.csv, &fx.reference, &fx.output)?;

        for path in &summary.written {
            for row in read_rows(path) {
                assert_eq!(
                    row.total,
                    row.alterations + row.research + row.integrity + row.supplemental + row.system
                );
            }
        }
        Ok(())
    }

    #[test]
    fn test_rerun_is_byte_identical() -> Result<()> {
        let fx = fixture();
        let generator = DashboardGenerator::new(classifier(), 2025);
        let storage = LocalStorage::new();

        let first = generator.generate_all(&storage, &fx.csv, &fx.reference, &fx.output)?;
        let snapshots: Vec<Vec<u8>> = first
            .written
            .iter()
            .map(|p| fs::read(p).expect("first run artifact"))
            .collect();

        let second = generator.generate_all(&storage, &fx.csv, &fx.reference, &fx.output)?;
        assert_eq!(first.written, second.written);
        for (path, snapshot) in second.written.iter().zip(snapshots) {
            assert_eq!(fs::read(path).expect("second run artifact"), snapshot, "{}", path.display());
        }
        Ok(())
    }

    #[test]
    fn test_missing_csv_is_fatal() {
        let fx = fixture();
        let generator = DashboardGenerator::new(classifier(), 2025);
        let result = generator.generate_all(
            &LocalStorage::new(),
            &fx.dir.path().join("nope.csv"),
            &fx.reference,
            &fx.output,
        );
        assert!(matches!(result, Err(DashboardError::InputNotFound(_))));
    }

    #[test]
    fn test_notice_dimension_uses_notice_dates() -> Result<()> {
        let fx = fixture();
        let generator = DashboardGenerator::new(classifier(), 2025);
        generator.generate_all(&LocalStorage::new(), &fx.csv, &fx.reference, &fx.output)?;

        // Record 1 has a 2024 notice date: present in notice window 2, absent
        // from the years window 2 (paper date 2023 is out of range there).
        let notice_2 = read_rows(&fx.output.join("notice_years").join("dashboard_table_2.json"));
        assert!(notice_2.iter().any(|r| r.country == "Country A"));
        Ok(())
    }
}
