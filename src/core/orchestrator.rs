// src/core/orchestrator.rs

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::RunConfig;
use crate::core::error::{ReconError, SourceError};
use crate::core::models::{DomainReport, SourceKind, SourceOutcome};
use crate::core::pricing;
use crate::core::sources::{SharedSource, SourceSet};
use crate::core::threat;
use crate::export::ExportSinks;
use crate::ui::ReportRenderer;

/// A dispatched source call tagged with its kind, or `None` when the source is
/// disabled for the run.
type Pending<T> = Option<(SourceKind, JoinHandle<Result<T, SourceError>>)>;

/// Runs every active source for one domain and assembles the report.
pub struct Orchestrator {
    config: Arc<RunConfig>,
    sources: SourceSet,
    renderer: Arc<dyn ReportRenderer>,
}

/// Spawns `source` for `domain` when its kind is active for the run; the
/// handle is bound to its slot by the caller at dispatch time.
fn dispatch<T: Send + 'static>(
    source: &SharedSource<T>,
    domain: &str,
    config: &RunConfig,
) -> Pending<T> {
    let kind = source.kind();
    config.is_active(kind).then(|| {
        let source = Arc::clone(source);
        let domain = domain.to_string();
        (kind, tokio::spawn(async move { source.fetch(&domain).await }))
    })
}

impl Orchestrator {
    pub fn new(
        config: Arc<RunConfig>,
        sources: SourceSet,
        renderer: Arc<dyn ReportRenderer>,
    ) -> Self {
        Self { config, sources, renderer }
    }

    /// Waits for one slot to settle. Errors and panics become `Absent`.
    async fn settle<T>(&self, domain: &str, pending: Pending<T>) -> Option<SourceOutcome<T>> {
        let (kind, handle) = pending?;
        let failure = match handle.await {
            Ok(Ok(value)) => {
                debug!(domain, source = %kind, "Source returned data.");
                return Some(SourceOutcome::Present(value));
            }
            Ok(Err(e)) => e,
            Err(join_error) => SourceError::Panicked(join_error.to_string()),
        };

        if self.config.verbose {
            warn!(domain, source = %kind, error = %failure, "Source failed, slot left empty.");
        } else {
            info!(domain, source = %kind, "Source unavailable.");
        }
        Some(SourceOutcome::Absent)
    }

    /// Fans out to every active source concurrently and fans the outcomes back
    /// into their named slots.
    pub async fn investigate(&self, domain: &str) -> DomainReport {
        let config = &self.config;
        info!(domain, sources = ?config.active_sources(), "Investigating domain.");

        // All active calls are in flight before any of them is awaited.
        let whois = dispatch(&self.sources.whois, domain, config);
        let dns = dispatch(&self.sources.dns, domain, config);
        let ssl = dispatch(&self.sources.ssl, domain, config);
        let network = dispatch(&self.sources.network, domain, config);
        let subdomains = dispatch(&self.sources.subdomains, domain, config);
        let pricing = dispatch(&self.sources.pricing, domain, config);

        let (whois, dns, ssl, network, subdomains, pricing) = tokio::join!(
            self.settle(domain, whois),
            self.settle(domain, dns),
            self.settle(domain, ssl),
            self.settle(domain, network),
            self.settle(domain, subdomains),
            self.settle(domain, pricing),
        );

        let report = DomainReport {
            domain: domain.to_string(),
            whois,
            dns,
            ssl,
            network,
            subdomains,
            pricing,
        };
        info!(domain, present = ?report.present_slots(), "Investigation finished.");
        report
    }

    /// Investigates, classifies and renders one domain.
    pub async fn process(&self, domain: &str) -> Result<DomainReport, ReconError> {
        let report = self.investigate(domain).await;
        let assessment = threat::classify(&report);
        let analysis = pricing::analyze_report(&report);

        self.renderer.render(&report, &assessment, analysis.as_ref())?;
        Ok(report)
    }

    /// Single-domain mode: process, then export straight away.
    ///
    /// A domain-level failure is logged and yields `Ok(None)`; an export
    /// failure is returned.
    pub async fn process_and_export(
        &self,
        domain: &str,
        sinks: &mut ExportSinks,
    ) -> Result<Option<DomainReport>, ReconError> {
        let report = match self.process(domain).await {
            Ok(report) => report,
            Err(e) if !e.is_fatal() => {
                error!(domain, error = %e, "Domain processing failed.");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        sinks.push(report.clone());
        if sinks.has_targets() {
            for path in sinks.flush()? {
                info!(path = %path.display(), "Export written.");
            }
        }
        Ok(Some(report))
    }
}
