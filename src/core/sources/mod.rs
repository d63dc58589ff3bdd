// src/core/sources/mod.rs

// One module per external data source. Each exposes a single async `fetch`
// behind the `Source` trait so the orchestrator can treat them uniformly.
pub mod dns;
pub mod ports;
pub mod pricing;
pub mod ssl;
pub mod subdomains;
pub mod whois;

use std::sync::Arc;

use async_trait::async_trait;
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};

use crate::config::RunConfig;
use crate::core::error::SourceError;
use crate::core::models::{
    AvailabilityResult, DnsRecords, NetworkService, SourceKind, SslInfo, SubdomainFindings,
    WhoisInfo,
};

use self::dns::DnsSource;
use self::ports::PortScanSource;
use self::pricing::PricingSource;
use self::ssl::SslSource;
use self::subdomains::SubdomainSource;
use self::whois::WhoisSource;

/// A provider of one category of domain data.
///
/// Implementations own their timeouts; any failure (timeout, transport,
/// parse, nothing found) is reported as an `Err` and the orchestrator treats
/// them all the same way.
#[async_trait]
pub trait Source: Send + Sync {
    type Output: Send + 'static;

    fn kind(&self) -> SourceKind;

    async fn fetch(&self, domain: &str) -> Result<Self::Output, SourceError>;
}

pub type SharedSource<T> = Arc<dyn Source<Output = T>>;

/// One source per report slot.
#[derive(Clone)]
pub struct SourceSet {
    pub whois: SharedSource<WhoisInfo>,
    pub dns: SharedSource<DnsRecords>,
    pub ssl: SharedSource<SslInfo>,
    pub network: SharedSource<Vec<NetworkService>>,
    pub subdomains: SharedSource<SubdomainFindings>,
    pub pricing: SharedSource<AvailabilityResult>,
}

impl SourceSet {
    /// The network-backed sources used by the CLI.
    pub fn live(config: &RunConfig) -> Self {
        let timeout = config.source_timeout;
        let resolver = build_resolver(timeout);
        let http = build_http_client(timeout);

        Self {
            whois: Arc::new(WhoisSource::new(timeout)),
            dns: Arc::new(DnsSource::new(resolver.clone(), timeout)),
            ssl: Arc::new(SslSource::new(timeout)),
            network: Arc::new(PortScanSource::new(timeout)),
            subdomains: Arc::new(SubdomainSource::new(http.clone(), resolver.clone(), timeout)),
            pricing: Arc::new(PricingSource::with_default_providers(resolver, http, timeout)),
        }
    }
}

fn build_resolver(timeout: std::time::Duration) -> TokioAsyncResolver {
    let mut opts = ResolverOpts::default();
    opts.timeout = timeout;
    opts.attempts = 1;
    TokioAsyncResolver::tokio(ResolverConfig::default(), opts)
}

fn build_http_client(timeout: std::time::Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(concat!("domain-recon/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Falling back to default HTTP client.");
            reqwest::Client::new()
        })
}
