//! Custom error types for retractiondash.
//!
//! This module defines all error types used throughout the application.
//! All functions return `Result<T, DashboardError>` instead of using `unwrap()`.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for retractiondash operations.
///
/// Uses `thiserror` for ergonomic error handling and automatic `Display` implementation.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Required input file does not exist
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// CSV parsing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Input file exists but has an unusable shape (missing columns, empty table)
    #[error("Input shape error: {0}")]
    InputShape(String),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),
}

/// Result type alias using `DashboardError`
pub type Result<T> = std::result::Result<T, DashboardError>;
