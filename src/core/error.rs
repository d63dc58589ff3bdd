// src/core/error.rs

//! Error taxonomy for a recon run.
//!
//! Source failures are recorded as `Absent` and never leave the orchestrator.
//! Domain failures stop one domain and are reported by the scheduler. Export
//! failures are the only errors that reach the top level.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// A data source did not produce a usable value.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("DNS error: {0}")]
    Resolve(#[from] hickory_resolver::error::ResolveError),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("no data: {0}")]
    NoData(String),

    #[error("source task failed: {0}")]
    Panicked(String),
}

/// Writing an export file failed.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors at the domain and run level.
#[derive(Debug, Error)]
pub enum ReconError {
    #[error("failed to render report for {domain}: {reason}")]
    Render { domain: String, reason: String },

    #[error("processing {domain} failed: {reason}")]
    DomainTask { domain: String, reason: String },

    #[error("no valid domains supplied")]
    NoDomains,

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl ReconError {
    /// Whether this error must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ReconError::Export(_) | ReconError::NoDomains)
    }
}

/// Runs `future` under `budget`, mapping expiry to `SourceError::Timeout`.
pub async fn with_timeout<T, F>(budget: Duration, future: F) -> Result<T, SourceError>
where
    F: std::future::Future<Output = Result<T, SourceError>>,
{
    match tokio::time::timeout(budget, future).await {
        Ok(result) => result,
        Err(_) => Err(SourceError::Timeout(budget)),
    }
}
