// src/core/scheduler.rs

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{error, info};

use crate::core::error::ReconError;
use crate::core::orchestrator::Orchestrator;
use crate::export::ExportSinks;

/// A domain that produced no report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainFailure {
    pub domain: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub batch_sizes: Vec<usize>,
    pub processed: usize,
    pub failed: Vec<DomainFailure>,
}

/// Splits `domains` into consecutive batches of at most `limit`.
pub fn plan_batches(domains: &[String], limit: usize) -> Vec<&[String]> {
    domains.chunks(limit.max(1)).collect()
}

/// Processes many domains in bounded, paced batches.
///
/// Domains within a batch run concurrently; batches run one after another with
/// a fixed pause between them. Reports reach the sinks in input order.
pub struct BatchScheduler {
    orchestrator: Arc<Orchestrator>,
    pacing: Duration,
}

impl BatchScheduler {
    pub fn new(orchestrator: Arc<Orchestrator>, pacing: Duration) -> Self {
        Self { orchestrator, pacing }
    }

    pub async fn run(
        &self,
        domains: &[String],
        limit: usize,
        sinks: &mut ExportSinks,
    ) -> Result<RunSummary, ReconError> {
        let batches = plan_batches(domains, limit);
        let mut summary = RunSummary {
            batch_sizes: batches.iter().map(|b| b.len()).collect(),
            ..Default::default()
        };
        info!(domains = domains.len(), batches = batches.len(), "Starting batch run.");

        for (index, batch) in batches.iter().enumerate() {
            if index > 0 && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }
            info!(batch = index + 1, size = batch.len(), "Processing batch.");

            let handles = batch.iter().map(|domain| {
                let orchestrator = Arc::clone(&self.orchestrator);
                let domain = domain.clone();
                tokio::spawn(async move { orchestrator.process(&domain).await })
            });
            let settled = join_all(handles).await;

            for (domain, outcome) in batch.iter().zip(settled) {
                let result = outcome.unwrap_or_else(|join_error| {
                    Err(ReconError::DomainTask {
                        domain: domain.clone(),
                        reason: join_error.to_string(),
                    })
                });
                match result {
                    Ok(report) => {
                        sinks.push(report);
                        summary.processed += 1;
                    }
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => {
                        error!(domain = %domain, error = %e, "Domain processing failed.");
                        summary
                            .failed
                            .push(DomainFailure { domain: domain.clone(), reason: e.to_string() });
                    }
                }
            }
        }

        if sinks.has_targets() {
            info!(reports = sinks.len(), "Writing exports.");
            for path in sinks.flush()? {
                info!(path = %path.display(), "Export written.");
            }
        }
        info!(
            processed = summary.processed,
            failed = summary.failed.len(),
            "Batch run finished."
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExportTargets, RunConfig};
    use crate::core::testing::{self, RecordingRenderer};
    use pretty_assertions::assert_eq;

    fn domains(count: usize) -> Vec<String> {
        (1..=count).map(|n| format!("site{n}.com")).collect()
    }

    fn scheduler(renderer: Arc<RecordingRenderer>) -> BatchScheduler {
        let config = RunConfig { quick: true, ..Default::default() };
        let orchestrator =
            Orchestrator::new(Arc::new(config), testing::healthy_sources(), renderer);
        BatchScheduler::new(Arc::new(orchestrator), Duration::ZERO)
    }

    #[test]
    fn batches_are_bounded_by_the_limit() {
        let list = domains(7);
        let sizes: Vec<usize> = plan_batches(&list, 3).iter().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
        assert_eq!(plan_batches(&list, 0).len(), 7);
        assert!(plan_batches(&[], 3).is_empty());
    }

    fn csv_sinks(path: &std::path::Path) -> ExportSinks {
        ExportSinks::new(ExportTargets { csv: Some(path.to_path_buf()), ..Default::default() })
    }

    fn exported_domains(path: &std::path::Path) -> Vec<String> {
        let mut reader = csv::Reader::from_path(path).unwrap();
        reader.records().map(|r| r.unwrap()[0].to_string()).collect()
    }

    #[tokio::test]
    async fn faulting_domain_does_not_stop_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("batch.csv");
        let mut sinks = csv_sinks(&csv_path);
        let renderer = Arc::new(RecordingRenderer::failing_for(["site4.com"]));
        let list = domains(7);

        let summary = scheduler(renderer.clone()).run(&list, 3, &mut sinks).await.unwrap();

        assert_eq!(summary.batch_sizes, vec![3, 3, 1]);
        assert_eq!(summary.processed, 6);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].domain, "site4.com");
        assert_eq!(renderer.rendered().len(), 6);

        let expected: Vec<String> = list.iter().filter(|d| *d != "site4.com").cloned().collect();
        assert_eq!(exported_domains(&csv_path), expected);
    }

    #[tokio::test]
    async fn panicking_domain_is_recorded_as_failure() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("batch.csv");
        let mut sinks = csv_sinks(&csv_path);
        let renderer = Arc::new(RecordingRenderer::panicking_for(["site2.com"]));
        let list = domains(5);

        let summary = scheduler(renderer.clone()).run(&list, 2, &mut sinks).await.unwrap();

        assert_eq!(summary.processed, 4);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].domain, "site2.com");
        assert!(summary.failed[0].reason.contains("panic"));
        assert_eq!(renderer.rendered().len(), 4);

        let expected: Vec<String> = list.iter().filter(|d| *d != "site2.com").cloned().collect();
        assert_eq!(exported_domains(&csv_path), expected);
    }

    #[tokio::test]
    async fn batches_are_paced() {
        let renderer = Arc::new(RecordingRenderer::default());
        let config = RunConfig { quick: true, ..Default::default() };
        let orchestrator =
            Orchestrator::new(Arc::new(config), testing::healthy_sources(), renderer);
        let pacing = Duration::from_millis(300);
        let scheduler = BatchScheduler::new(Arc::new(orchestrator), pacing);
        let mut sinks = ExportSinks::new(ExportTargets::default());

        let started = std::time::Instant::now();
        let summary = scheduler.run(&domains(4), 2, &mut sinks).await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(summary.batch_sizes, vec![2, 2]);
        assert!(elapsed >= pacing, "finished too early: {elapsed:?}");
        assert!(elapsed < pacing * 2, "paced more than once: {elapsed:?}");
        assert_eq!(sinks.len(), 4);
    }
}
