// src/app.rs

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};
use url::Url;

use crate::config::RunConfig;
use crate::core::error::ReconError;
use crate::core::orchestrator::Orchestrator;
use crate::core::scheduler::{BatchScheduler, DomainFailure, RunSummary};
use crate::export::ExportSinks;

/// Reduces user input such as `HTTPS://Example.com/path` to a bare host name.
pub fn normalize_domain(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let with_scheme = if raw.contains("://") { raw.to_string() } else { format!("https://{raw}") };
    let host = Url::parse(&with_scheme).ok()?.host_str()?.trim_end_matches('.').to_lowercase();
    (!host.is_empty()).then_some(host)
}

/// Normalizes every entry, dropping invalid ones and duplicates while keeping
/// first-seen order.
pub fn normalize_domains<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut domains: Vec<String> = Vec::new();
    for entry in raw {
        let entry: &str = entry.as_ref();
        match normalize_domain(entry) {
            Some(domain) if !domains.contains(&domain) => domains.push(domain),
            Some(_) => {}
            None => warn!(input = entry, "Ignoring invalid domain."),
        }
    }
    domains
}

/// Reads one domain per line. Blank lines and `#` comments are skipped.
pub fn read_domain_file(path: &Path) -> std::io::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(|line| line.split('#').next().unwrap_or_default().trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

pub struct App {
    config: Arc<RunConfig>,
    orchestrator: Arc<Orchestrator>,
}

impl App {
    pub fn new(config: Arc<RunConfig>, orchestrator: Arc<Orchestrator>) -> Self {
        Self { config, orchestrator }
    }

    /// Runs the whole job: one domain goes through the orchestrator directly,
    /// several go through the batch scheduler.
    pub async fn run(&self, raw: &[String]) -> Result<RunSummary, ReconError> {
        let domains = normalize_domains(raw);
        let mut sinks = ExportSinks::new(self.config.exports.clone());

        match domains.as_slice() {
            [] => Err(ReconError::NoDomains),
            [domain] => {
                info!(domain = %domain, "Single-domain mode.");
                let report = self.orchestrator.process_and_export(domain, &mut sinks).await?;
                let failed = match report {
                    Some(_) => Vec::new(),
                    None => vec![DomainFailure {
                        domain: domain.clone(),
                        reason: "processing failed, see log for details".to_string(),
                    }],
                };
                Ok(RunSummary { batch_sizes: vec![1], processed: 1 - failed.len(), failed })
            }
            _ => {
                let scheduler =
                    BatchScheduler::new(Arc::clone(&self.orchestrator), self.config.batch_delay);
                scheduler.run(&domains, self.config.concurrency, &mut sinks).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExportTargets;
    use crate::core::testing::{self, RecordingRenderer};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn app(exports: ExportTargets, renderer: Arc<RecordingRenderer>) -> App {
        let config = Arc::new(RunConfig {
            quick: true,
            exports,
            concurrency: 2,
            batch_delay: Duration::ZERO,
            ..Default::default()
        });
        let orchestrator =
            Orchestrator::new(Arc::clone(&config), testing::healthy_sources(), renderer);
        App::new(config, Arc::new(orchestrator))
    }

    #[test]
    fn normalizes_urls_case_and_duplicates() {
        let domains = normalize_domains([
            "https://Example.COM/some/path",
            "example.com",
            "  ",
            "shop.example.org.",
            "http://user@api.example.net:8080",
        ]);
        assert_eq!(domains, vec!["example.com", "shop.example.org", "api.example.net"]);
    }

    #[test]
    fn domain_file_skips_comments_and_blanks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("domains.txt");
        std::fs::write(&path, "# watch list\nexample.com\n\n  other.org  # second\n").unwrap();

        assert_eq!(read_domain_file(&path).unwrap(), vec!["example.com", "other.org"]);
    }

    #[tokio::test]
    async fn empty_input_is_rejected() {
        let app = app(ExportTargets::default(), Arc::new(RecordingRenderer::default()));
        let err = app.run(&["".to_string()]).await.unwrap_err();
        assert!(matches!(err, ReconError::NoDomains));
    }

    #[tokio::test]
    async fn single_domain_goes_straight_through() {
        let renderer = Arc::new(RecordingRenderer::default());
        let summary = app(ExportTargets::default(), renderer.clone())
            .run(&["Example.com".to_string()])
            .await
            .unwrap();

        assert_eq!(summary.processed, 1);
        assert!(summary.failed.is_empty());
        assert_eq!(renderer.rendered()[0].0, "example.com");
    }

    #[tokio::test]
    async fn many_domains_are_batched_and_exported() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("report.json");
        let exports = ExportTargets { json: Some(json_path.clone()), ..Default::default() };
        let raw: Vec<String> =
            ["a.com", "b.com", "A.com", "c.com"].iter().map(|d| d.to_string()).collect();

        let summary = app(exports, Arc::new(RecordingRenderer::default())).run(&raw).await.unwrap();

        assert_eq!(summary.batch_sizes, vec![2, 1]);
        assert_eq!(summary.processed, 3);
        let doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(json_path).unwrap()).unwrap();
        assert_eq!(doc["domainCount"], 3);
        assert_eq!(doc["domains"][2]["domain"], "c.com");
    }
}
