//! # retractiondash
//!
//! Scholarly Retraction Dashboard Pipeline - Rust Microservice
//!
//! ## Modules
//!
//! - [`records`] - Retraction CSV parsing with tolerant date handling
//! - [`classifier`] - Keyword-based retraction reason classification
//! - [`publications`] - Per-country publication totals from the reference table
//! - [`aggregate`] - Per-country category aggregation over year windows
//! - [`rates`] - Retraction rate computation and dashboard rows
//! - [`dashboard`] - Orchestration of the 22 dashboard artifacts
//! - [`storage`] - Storage abstraction (local filesystem with atomic writes)
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use retractiondash::{classifier::KeywordClassifier, dashboard::DashboardGenerator};
//! use retractiondash::storage::LocalStorage;
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let classifier = KeywordClassifier::load_from_dir(Path::new("classification"))?;
//!     let generator = DashboardGenerator::new(classifier, 2025);
//!     let storage = LocalStorage::new();
//!     let summary = generator.generate_all(
//!         &storage,
//!         Path::new("data/retraction_watch.csv"),
//!         Path::new("data/scimago_combined.csv"),
//!         Path::new("dashboard_outputs"),
//!     )?;
//!     println!("Wrote {} artifacts", summary.written.len());
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod classifier;
pub mod dashboard;
pub mod error;
pub mod publications;
pub mod rates;
pub mod records;
pub mod storage;

pub use error::{DashboardError, Result};
