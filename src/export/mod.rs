// src/export/mod.rs

//! Persistence of finished reports.
//!
//! `ExportSinks` is an append-only accumulator with a single owner: the
//! single-domain driver or the batch scheduler. Reports come out in the order
//! they were pushed.

mod pricing_csv;
mod pricing_json;
mod report_csv;
mod report_json;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::config::ExportTargets;
use crate::core::error::ExportError;
use crate::core::models::DomainReport;

pub use pricing_csv::write_pricing_csv;
pub use pricing_json::pricing_document;
pub use report_csv::write_report_csv;
pub use report_json::report_document;

/// Separator for multi-valued cells.
pub(crate) const LIST_SEPARATOR: &str = "; ";

pub(crate) fn join_list<S: AsRef<str>>(values: &[S]) -> String {
    values.iter().map(|v| v.as_ref()).collect::<Vec<&str>>().join(LIST_SEPARATOR)
}

pub(crate) fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
}

pub(crate) fn format_price(price: Option<f64>, currency: &str) -> String {
    price.map(|p| format!("{p:.2} {currency}")).unwrap_or_default()
}

pub(crate) fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}

/// Top-level domain of a name, without the dot.
pub(crate) fn tld_of(domain: &str) -> &str {
    domain.rsplit('.').next().unwrap_or(domain)
}

fn create(path: &Path) -> Result<BufWriter<File>, ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|source| ExportError::Io { path: path.to_path_buf(), source })?;
    }
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| ExportError::Io { path: path.to_path_buf(), source })
}

fn write_json(path: &Path, document: &serde_json::Value) -> Result<(), ExportError> {
    let mut writer = create(path)?;
    serde_json::to_writer_pretty(&mut writer, document)?;
    writer
        .flush()
        .map_err(|source| ExportError::Io { path: path.to_path_buf(), source })
}

pub struct ExportSinks {
    targets: ExportTargets,
    reports: Vec<DomainReport>,
}

impl ExportSinks {
    pub fn new(targets: ExportTargets) -> Self {
        Self { targets, reports: Vec::new() }
    }

    pub fn push(&mut self, report: DomainReport) {
        debug!(domain = %report.domain, position = self.reports.len(), "Report queued for export.");
        self.reports.push(report);
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn has_targets(&self) -> bool {
        !self.targets.is_empty()
    }

    /// Writes every configured target from the accumulated reports.
    ///
    /// Returns the paths written. Any failure aborts and is returned.
    pub fn flush(&self) -> Result<Vec<PathBuf>, ExportError> {
        let generated_at = Utc::now();
        let mut written = Vec::new();

        if let Some(path) = &self.targets.csv {
            write_report_csv(create(path)?, &self.reports)?;
            written.push(path.clone());
        }
        if let Some(path) = &self.targets.json {
            write_json(path, &report_document(&self.reports, generated_at))?;
            written.push(path.clone());
        }
        if let Some(path) = &self.targets.pricing_csv {
            write_pricing_csv(create(path)?, &self.reports)?;
            written.push(path.clone());
        }
        if let Some(path) = &self.targets.pricing_json {
            write_json(path, &pricing_document(&self.reports, generated_at))?;
            written.push(path.clone());
        }

        info!(reports = self.reports.len(), files = written.len(), "Exports flushed.");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sinks_in(dir: &Path) -> ExportSinks {
        ExportSinks::new(ExportTargets {
            csv: Some(dir.join("report.csv")),
            json: Some(dir.join("nested/report.json")),
            pricing_csv: Some(dir.join("pricing.csv")),
            pricing_json: Some(dir.join("pricing.json")),
        })
    }

    #[test]
    fn flush_writes_every_target() {
        let dir = tempfile::tempdir().unwrap();
        let mut sinks = sinks_in(dir.path());
        sinks.push(DomainReport::new("example.com"));

        let written = sinks.flush().unwrap();
        assert_eq!(written.len(), 4);
        for path in written {
            assert!(path.exists(), "{} missing", path.display());
        }
    }

    #[test]
    fn write_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();
        let sinks = ExportSinks::new(ExportTargets {
            csv: Some(blocker.join("report.csv")),
            ..Default::default()
        });

        let err = sinks.flush().unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }

    #[test]
    fn reports_keep_submission_order() {
        let mut sinks = ExportSinks::new(ExportTargets::default());
        for domain in ["b.com", "a.com", "c.com"] {
            sinks.push(DomainReport::new(domain));
        }
        let order: Vec<&str> = sinks.reports.iter().map(|r| r.domain.as_str()).collect();
        assert_eq!(order, vec!["b.com", "a.com", "c.com"]);
        assert!(!sinks.has_targets());
    }

    #[test]
    fn cell_helpers() {
        assert_eq!(join_list(&["a", "b"]), "a; b");
        assert_eq!(format_price(Some(9.5), "USD"), "9.50 USD");
        assert_eq!(format_price(None, "USD"), "");
        assert_eq!(tld_of("shop.example.co"), "co");
    }
}
