//! retractiondash - Scholarly Retraction Dashboard Pipeline
//!
//! Ingests a retraction CSV export, classifies retraction reasons by keyword,
//! aggregates per country across two date dimensions and eleven year windows,
//! and writes the resulting dashboard JSON artifacts.
//!
//! ## Usage
//!
//! ### CLI Mode
//! ```bash
//! retractiondash generate --csv data/retraction_watch.csv --output dashboard_outputs
//! ```
//!
//! ### HTTP Server Mode
//! ```bash
//! retractiondash serve --port 3000
//! ```

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{Path as UrlPath, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use chrono::{Datelike, Local};
use clap::{Parser, Subcommand};
use retractiondash::classifier::KeywordClassifier;
use retractiondash::dashboard::DashboardGenerator;
use retractiondash::storage::{LocalStorage, Storage};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Scholarly Retraction Dashboard Pipeline - Rust Microservice
#[derive(Parser)]
#[command(name = "retractiondash")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Input paths shared by both modes
#[derive(Debug, Clone, clap::Args)]
struct InputArgs {
    /// Retraction CSV export
    #[arg(long, default_value = "data/retraction_watch.csv")]
    csv: PathBuf,

    /// Publication reference table (country x year counts)
    #[arg(long, default_value = "data/scimago_combined.csv")]
    reference: PathBuf,

    /// Directory holding the five keyword files
    #[arg(long, default_value = "classification")]
    keywords: PathBuf,

    /// Output directory for the dashboard artifacts
    #[arg(short, long, default_value = "dashboard_outputs")]
    output: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate all dashboard JSON artifacts from the retraction CSV
    Generate {
        #[command(flatten)]
        inputs: InputArgs,

        /// Pin the year the lookback windows are anchored to
        /// (defaults to the wall-clock year)
        #[arg(long)]
        as_of_year: Option<i32>,
    },

    /// Run as HTTP server
    Serve {
        #[command(flatten)]
        inputs: InputArgs,

        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .init();

    match cli.command {
        Commands::Generate { inputs, as_of_year } => run_generate(inputs, as_of_year),
        Commands::Serve { inputs, port, host } => run_server(inputs, host, port).await,
    }
}

// ============================================================================
// Generation
// ============================================================================

fn run_generate(inputs: InputArgs, as_of_year: Option<i32>) -> Result<()> {
    let classifier = KeywordClassifier::load_from_dir(&inputs.keywords)
        .context("Failed to load classification keywords")?;

    let as_of_year = as_of_year.unwrap_or_else(|| Local::now().year());
    let generator = DashboardGenerator::new(classifier, as_of_year);

    let summary = generator
        .generate_all(&LocalStorage::new(), &inputs.csv, &inputs.reference, &inputs.output)
        .context("Dashboard generation failed")?;

    println!(
        "Wrote {} artifacts to {} ({} malformed rows skipped)",
        summary.written.len(),
        inputs.output.display(),
        summary.skipped_rows
    );
    Ok(())
}

// ============================================================================
// HTTP Server
// ============================================================================

struct AppState {
    inputs: InputArgs,
    classifier: KeywordClassifier,
    storage: LocalStorage,
    /// Regeneration runs are not safe against each other over the same
    /// output directory, so they are serialized here.
    generate_lock: tokio::sync::Mutex<()>,
}

async fn run_server(inputs: InputArgs, host: String, port: u16) -> Result<()> {
    let classifier = KeywordClassifier::load_from_dir(&inputs.keywords)
        .context("Failed to load classification keywords")?;

    info!(host = %host, port = port, "Starting HTTP server");

    let app_state = Arc::new(AppState {
        inputs,
        classifier,
        storage: LocalStorage::new(),
        generate_lock: tokio::sync::Mutex::new(()),
    });

    let app = Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/api/files", get(list_files_handler))
        .route("/api/files/{dimension}/{name}", get(file_handler))
        .route("/api/upload", post(upload_handler))
        .route("/api/generate", post(generate_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .context("Invalid host:port")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}

/// Minimal landing page
async fn index_handler() -> Html<&'static str> {
    Html(
        "<h1>retractiondash</h1>\
         <p>Endpoints: GET /api/files, GET /api/files/{dimension}/{name}, \
         POST /api/upload (CSV body), POST /api/generate</p>",
    )
}

/// Health check endpoint
async fn health_handler() -> &'static str {
    "OK"
}

/// Available artifacts per date dimension
#[derive(Debug, Serialize)]
struct FilesResponse {
    years: Vec<String>,
    notice_years: Vec<String>,
}

async fn list_files_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let list_dimension = |dimension: &str| -> Vec<String> {
        state
            .storage
            .list(&state.inputs.output.join(dimension))
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
            .filter(|name| name.ends_with(".json"))
            .collect()
    };

    Json(FilesResponse {
        years: list_dimension("years"),
        notice_years: list_dimension("notice_years"),
    })
}

/// Serve one dashboard artifact
async fn file_handler(
    State(state): State<Arc<AppState>>,
    UrlPath((dimension, name)): UrlPath<(String, String)>,
) -> impl IntoResponse {
    if !matches!(dimension.as_str(), "years" | "notice_years") {
        return (StatusCode::NOT_FOUND, "Unknown dimension").into_response();
    }
    // Artifact names only; no path traversal
    if !name.ends_with(".json") || name.contains(['/', '\\']) || name.contains("..") {
        return (StatusCode::NOT_FOUND, "Unknown artifact").into_response();
    }

    let path = state.inputs.output.join(&dimension).join(&name);
    match state.storage.read(&path) {
        Ok(bytes) => ([(header::CONTENT_TYPE, "application/json")], bytes).into_response(),
        Err(e) => {
            info!(path = %path.display(), error = %e, "Artifact not available");
            (StatusCode::NOT_FOUND, "Artifact not found").into_response()
        }
    }
}

/// Regeneration outcome
#[derive(Debug, Serialize)]
struct GenerateResponse {
    status: String,
    written: usize,
    skipped_rows: usize,
}

/// Accept a new retraction CSV and regenerate all artifacts
async fn upload_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> impl IntoResponse {
    if body.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(GenerateResponse {
                status: "error: empty upload".to_string(),
                written: 0,
                skipped_rows: 0,
            }),
        );
    }

    info!(bytes = body.len(), "CSV upload received");
    if let Err(e) = state.storage.write(&state.inputs.csv, &body) {
        error!(error = %e, "Failed to store uploaded CSV");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(GenerateResponse {
                status: format!("error: {}", e),
                written: 0,
                skipped_rows: 0,
            }),
        );
    }

    regenerate(state).await
}

/// Regenerate all artifacts from the stored CSV
async fn generate_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    regenerate(state).await
}

async fn regenerate(state: Arc<AppState>) -> (StatusCode, Json<GenerateResponse>) {
    let _guard = state.generate_lock.lock().await;

    let worker_state = Arc::clone(&state);
    let result = tokio::task::spawn_blocking(move || {
        let generator = DashboardGenerator::new(
            worker_state.classifier.clone(),
            Local::now().year(),
        );
        generator.generate_all(
            &worker_state.storage,
            &worker_state.inputs.csv,
            &worker_state.inputs.reference,
            &worker_state.inputs.output,
        )
    })
    .await;

    match result {
        Ok(Ok(summary)) => (
            StatusCode::OK,
            Json(GenerateResponse {
                status: "success".to_string(),
                written: summary.written.len(),
                skipped_rows: summary.skipped_rows,
            }),
        ),
        Ok(Err(e)) => {
            error!(error = %e, "Generation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(GenerateResponse {
                    status: format!("error: {}", e),
                    written: 0,
                    skipped_rows: 0,
                }),
            )
        }
        Err(e) => {
            error!(error = %e, "Generation task panicked");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(GenerateResponse {
                    status: format!("error: {}", e),
                    written: 0,
                    skipped_rows: 0,
                }),
            )
        }
    }
}
