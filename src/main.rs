// src/main.rs

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tracing::{info, warn};

mod app;
mod config;
mod core;
mod export;
mod logging;
mod ui;

use app::App;
use config::{ExportTargets, RunConfig};
use crate::core::orchestrator::Orchestrator;
use crate::core::sources::SourceSet;
use ui::{ConsoleRenderer, QuietRenderer, ReportRenderer};

/// Passive reconnaissance for one or many domains: registration, DNS,
/// certificates, open ports, subdomains and registrar pricing.
#[derive(Debug, Parser)]
#[command(name = "domain-recon", version, about)]
struct Cli {
    /// Domains or URLs to investigate.
    domains: Vec<String>,

    /// Read additional domains from a file, one per line.
    #[arg(short, long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Skip the port scan.
    #[arg(short, long)]
    quick: bool,

    /// Enumerate subdomains via certificate transparency and DNS.
    #[arg(short, long)]
    subdomains: bool,

    /// Check availability and compare registrar prices.
    #[arg(short, long)]
    pricing: bool,

    /// Log per-source failures and show remediation advice.
    #[arg(short, long)]
    verbose: bool,

    /// Do not print reports; useful with the export flags.
    #[arg(long, conflicts_with = "verbose")]
    quiet: bool,

    #[arg(long, value_name = "PATH")]
    export_csv: Option<PathBuf>,

    #[arg(long, value_name = "PATH")]
    export_json: Option<PathBuf>,

    #[arg(long, value_name = "PATH")]
    export_pricing_csv: Option<PathBuf>,

    #[arg(long, value_name = "PATH")]
    export_pricing_json: Option<PathBuf>,

    /// Domains processed concurrently per batch.
    #[arg(long, env = "DOMAIN_RECON_CONCURRENCY", default_value_t = config::DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Pause between batches, in milliseconds.
    #[arg(long, env = "DOMAIN_RECON_BATCH_DELAY_MS", default_value_t = 2000)]
    batch_delay_ms: u64,

    /// Per-source timeout, in seconds.
    #[arg(long, env = "DOMAIN_RECON_TIMEOUT", default_value_t = 10)]
    timeout: u64,
}

impl Cli {
    fn run_config(&self) -> RunConfig {
        RunConfig {
            quick: self.quick,
            include_subdomains: self.subdomains,
            check_pricing: self.pricing,
            verbose: self.verbose,
            quiet: self.quiet,
            exports: ExportTargets {
                csv: self.export_csv.clone(),
                json: self.export_json.clone(),
                pricing_csv: self.export_pricing_csv.clone(),
                pricing_json: self.export_pricing_json.clone(),
            },
            concurrency: self.concurrency.max(1),
            batch_delay: Duration::from_millis(self.batch_delay_ms),
            source_timeout: Duration::from_secs(self.timeout.max(1)),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let log_path = logging::initialize_logging(cli.verbose)?;
    info!(log = %log_path.display(), "Logging initialized.");

    let mut domains = cli.domains.clone();
    if let Some(path) = &cli.file {
        let listed = app::read_domain_file(path)
            .wrap_err_with(|| format!("could not read domain list {}", path.display()))?;
        domains.extend(listed);
    }

    let config = Arc::new(cli.run_config());
    let renderer: Arc<dyn ReportRenderer> = if config.quiet {
        Arc::new(QuietRenderer)
    } else {
        Arc::new(ConsoleRenderer::new(config.verbose))
    };
    let sources = SourceSet::live(&config);
    let orchestrator = Arc::new(Orchestrator::new(Arc::clone(&config), sources, renderer));

    let summary = App::new(Arc::clone(&config), orchestrator).run(&domains).await?;

    for failure in &summary.failed {
        warn!(domain = %failure.domain, reason = %failure.reason, "Domain skipped.");
    }
    info!(processed = summary.processed, failed = summary.failed.len(), "Run complete.");
    Ok(())
}
