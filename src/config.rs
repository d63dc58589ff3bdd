// src/config.rs

use std::path::PathBuf;
use std::time::Duration;

use strum::IntoEnumIterator;

use crate::core::models::SourceKind;

/// Default number of domains investigated concurrently in one batch.
pub const DEFAULT_CONCURRENCY: usize = 3;
/// Default pause between two batches.
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(2000);
/// Default I/O budget given to each data source.
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(10);

/// Where finished reports should be written. Every target is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportTargets {
    pub csv: Option<PathBuf>,
    pub json: Option<PathBuf>,
    pub pricing_csv: Option<PathBuf>,
    pub pricing_json: Option<PathBuf>,
}

impl ExportTargets {
    pub fn is_empty(&self) -> bool {
        self.csv.is_none()
            && self.json.is_none()
            && self.pricing_csv.is_none()
            && self.pricing_json.is_none()
    }
}

/// Per-invocation settings, fixed for the whole run.
///
/// The set of active sources is decided here once; nothing downstream
/// re-derives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Skip the network-port scan.
    pub quick: bool,
    pub include_subdomains: bool,
    pub check_pricing: bool,
    pub verbose: bool,
    /// Suppress console rendering of reports.
    pub quiet: bool,
    pub exports: ExportTargets,
    pub concurrency: usize,
    pub batch_delay: Duration,
    pub source_timeout: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            quick: false,
            include_subdomains: false,
            check_pricing: false,
            verbose: false,
            quiet: false,
            exports: ExportTargets::default(),
            concurrency: DEFAULT_CONCURRENCY,
            batch_delay: DEFAULT_BATCH_DELAY,
            source_timeout: DEFAULT_SOURCE_TIMEOUT,
        }
    }
}

impl RunConfig {
    pub fn is_active(&self, kind: SourceKind) -> bool {
        match kind {
            SourceKind::Whois | SourceKind::Dns | SourceKind::Ssl => true,
            SourceKind::Network => !self.quick,
            SourceKind::Subdomains => self.include_subdomains,
            SourceKind::Pricing => self.check_pricing,
        }
    }

    /// The sources this run dispatches for every domain, in slot order.
    pub fn active_sources(&self) -> Vec<SourceKind> {
        SourceKind::iter().filter(|kind| self.is_active(*kind)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_run_activates_core_sources_and_ports() {
        let config = RunConfig::default();
        assert_eq!(
            config.active_sources(),
            vec![SourceKind::Whois, SourceKind::Dns, SourceKind::Ssl, SourceKind::Network]
        );
    }

    #[test]
    fn quick_mode_drops_network_scan() {
        let config = RunConfig { quick: true, check_pricing: true, ..Default::default() };
        assert!(!config.is_active(SourceKind::Network));
        assert!(config.is_active(SourceKind::Pricing));
        assert!(!config.is_active(SourceKind::Subdomains));
    }

    #[test]
    fn export_targets_empty_by_default() {
        assert!(ExportTargets::default().is_empty());
        let targets = ExportTargets { json: Some("out.json".into()), ..Default::default() };
        assert!(!targets.is_empty());
    }
}
