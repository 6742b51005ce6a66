//! # busca-retrabalho
//!
//! Fetches rework ("retrabalho") records from the MES API, enriches each one
//! with material, routing and order data, and writes the planning CSV report.
//!
//! ## Pipeline
//!
//! - **Fetch** - every page of `/retrabalho` for a creation-date range
//! - **Enrich** - three independent lookups per record; failures only empty columns
//! - **Project** - fixed 27-column layout
//! - **Emit** - one CSV file, written once every record is processed
//!
//! ## Quick Start
//!
//! ```no_run
//! use busca_retrabalho::{ApiConfig, Config, OutputConfig, ReportPipeline, RetrabalhoFilter};
//! use busca_retrabalho::utils::parse_iso_datetime;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::new(
//!         ApiConfig::new("http://localhost:6543/", "user", "pass"),
//!         OutputConfig::new("retrabalhos.csv"),
//!     );
//!     let filter = RetrabalhoFilter::new(
//!         parse_iso_datetime("2024-03-01").unwrap(),
//!         parse_iso_datetime("2024-03-31").unwrap(),
//!     );
//!
//!     let mut pipeline = ReportPipeline::new(config)?;
//!     let mut events = pipeline.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let summary = pipeline.run(&filter).await?;
//!     println!("{} rows written to {}", summary.rows, summary.path.display());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// HTTP client for the MES API
pub mod client;
/// Configuration types
pub mod config;
/// Per-record enrichment
pub mod enrich;
/// Error types
pub mod error;
/// Paginated rework fetch
pub mod fetcher;
/// Console and file logging
pub mod logging;
/// Report pipeline orchestration
pub mod pipeline;
/// Report projection and CSV output
pub mod report;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use client::ApiClient;
pub use config::{ApiConfig, Config, FetchConfig, OutputConfig};
pub use enrich::{EnrichmentSource, ResolvedRecord, Resolver};
pub use error::{Error, Result};
pub use fetcher::{RetrabalhoFetcher, RetrabalhoFilter};
pub use pipeline::{ReportPipeline, ReportSummary};
pub use report::{OutputRow, project};
pub use types::{
    Event, Lookup, MaterialInfo, OrderInfo, Retrabalho, RoutingStep, Stage, TipoRetrabalho,
    Urgency,
};

use tokio_util::sync::CancellationToken;

/// Cancel `token` when the process receives a termination signal.
///
/// A cancelled run stops at its next page or record and writes what it has.
///
/// - **Unix:** SIGTERM or SIGINT; falls back to `tokio::signal::ctrl_c()` when
///   the handlers cannot be registered.
/// - **Windows/other:** Ctrl+C via `tokio::signal::ctrl_c()`.
pub async fn cancel_on_signal(token: CancellationToken) {
    tokio::select! {
        signal = wait_for_cancel_request() => {
            tracing::warn!(signal, "Cancellation requested, the report will hold the records processed so far");
            token.cancel();
        }
        _ = token.cancelled() => {}
    }
}

/// Wait for a user cancellation request and name the signal that carried it
#[cfg(unix)]
async fn wait_for_cancel_request() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(mut sigterm), Ok(mut sigint)) => tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        },
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "Signal handlers unavailable, cancelling on Ctrl+C only");
            ctrl_c().await
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_cancel_request() -> &'static str {
    ctrl_c().await
}

async fn ctrl_c() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Cannot listen for Ctrl+C, cancellation disabled");
        std::future::pending::<()>().await;
    }
    "Ctrl+C"
}
