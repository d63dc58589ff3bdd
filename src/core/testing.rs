// src/core/testing.rs

//! In-memory sources and renderers for exercising the engine without a network.

use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};

use crate::core::error::{ReconError, SourceError};
use crate::core::models::{
    AvailabilityResult, CertificateInfo, DnsRecords, DomainReport, MxRecord, NetworkService,
    PricingQuote, SourceKind, SslInfo, SubdomainFindings, WhoisInfo,
};
use crate::core::pricing::{ESTIMATE_NOTE, PricingAnalysis};
use crate::core::sources::{SharedSource, Source, SourceSet};
use crate::core::threat::{ThreatAssessment, ThreatLevel};
use crate::ui::ReportRenderer;

pub struct StaticSource<T> {
    kind: SourceKind,
    value: T,
    delay: Duration,
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> Source for StaticSource<T> {
    type Output = T;

    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn fetch(&self, _domain: &str) -> Result<T, SourceError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.value.clone())
    }
}

pub struct FailingSource<T> {
    kind: SourceKind,
    panic: bool,
    _output: PhantomData<fn() -> T>,
}

#[async_trait]
impl<T: Send + 'static> Source for FailingSource<T> {
    type Output = T;

    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn fetch(&self, domain: &str) -> Result<T, SourceError> {
        if self.panic {
            panic!("{} source blew up for {domain}", self.kind);
        }
        Err(SourceError::NoData(format!("{} unavailable for {domain}", self.kind)))
    }
}

pub fn fixed<T: Clone + Send + Sync + 'static>(kind: SourceKind, value: T) -> SharedSource<T> {
    Arc::new(StaticSource { kind, value, delay: Duration::ZERO })
}

pub fn slow<T: Clone + Send + Sync + 'static>(
    kind: SourceKind,
    value: T,
    delay: Duration,
) -> SharedSource<T> {
    Arc::new(StaticSource { kind, value, delay })
}

pub fn failing<T: Send + 'static>(kind: SourceKind) -> SharedSource<T> {
    Arc::new(FailingSource { kind, panic: false, _output: PhantomData })
}

pub fn panicking<T: Send + 'static>(kind: SourceKind) -> SharedSource<T> {
    Arc::new(FailingSource { kind, panic: true, _output: PhantomData })
}

pub fn sample_whois() -> WhoisInfo {
    WhoisInfo {
        registrar: Some("Acme, Inc.\"".to_string()),
        creation_date: Some(Utc::now() - ChronoDuration::days(3650)),
        expiration_date: Some(Utc::now() + ChronoDuration::days(365)),
        registrant_country: Some("US".to_string()),
        status: vec!["clientTransferProhibited".to_string(), "serverHold".to_string()],
        name_servers: vec!["ns1.example.net".to_string(), "ns2.example.net".to_string()],
    }
}

pub fn sample_dns() -> DnsRecords {
    DnsRecords {
        ipv4: vec!["93.184.216.34".to_string()],
        ipv6: vec!["2606:2800:220:1:248:1893:25c8:1946".to_string()],
        mx: vec![MxRecord { preference: 10, exchange: "mail.example.com".to_string() }],
        txt: vec!["v=spf1 -all".to_string()],
        ns: vec!["ns1.example.net".to_string()],
    }
}

pub fn sample_ssl(days_until_expiry: i64) -> SslInfo {
    let now = Utc::now();
    SslInfo {
        is_valid: true,
        certificate_info: CertificateInfo {
            subject_name: "CN=example.com".to_string(),
            issuer_name: "C=US, O=Test CA".to_string(),
            not_before: now - ChronoDuration::days(90),
            not_after: now + ChronoDuration::days(days_until_expiry),
            days_until_expiry,
        },
    }
}

pub fn sample_services() -> Vec<NetworkService> {
    vec![
        NetworkService { port: 80, service: "http".to_string() },
        NetworkService { port: 443, service: "https".to_string() },
    ]
}

pub fn sample_subdomains() -> SubdomainFindings {
    SubdomainFindings::from_names(
        ["www", "api", "mail", "dev", "blog", "shop", "vpn"]
            .iter()
            .map(|label| format!("{label}.example.com")),
    )
}

pub fn live_quote(provider: &str, price: f64) -> PricingQuote {
    PricingQuote {
        provider: provider.to_string(),
        available: true,
        registration_price: Some(price),
        renewal_price: Some(price + 2.0),
        currency: "USD".to_string(),
        registration_url: format!("https://{}.example/buy", provider.to_lowercase()),
        error: None,
    }
}

pub fn sample_availability() -> AvailabilityResult {
    AvailabilityResult {
        available: true,
        checked_at: Utc::now(),
        quotes: vec![
            live_quote("Porkbun", 9.73),
            PricingQuote {
                error: Some(format!("{ESTIMATE_NOTE} from Namecheap rate card")),
                ..live_quote("Namecheap", 5.0)
            },
            live_quote("GoDaddy", 12.99),
        ],
    }
}

/// Every source succeeds with the sample data above.
pub fn healthy_sources() -> SourceSet {
    SourceSet {
        whois: fixed(SourceKind::Whois, sample_whois()),
        dns: fixed(SourceKind::Dns, sample_dns()),
        ssl: fixed(SourceKind::Ssl, sample_ssl(200)),
        network: fixed(SourceKind::Network, sample_services()),
        subdomains: fixed(SourceKind::Subdomains, sample_subdomains()),
        pricing: fixed(SourceKind::Pricing, sample_availability()),
    }
}

/// Every enabled source fails.
pub fn broken_sources() -> SourceSet {
    SourceSet {
        whois: failing(SourceKind::Whois),
        dns: failing(SourceKind::Dns),
        ssl: failing(SourceKind::Ssl),
        network: failing(SourceKind::Network),
        subdomains: failing(SourceKind::Subdomains),
        pricing: failing(SourceKind::Pricing),
    }
}

/// What the recording renderer saw: domain, level and cheapest registrar.
pub type RenderedEntry = (String, ThreatLevel, Option<String>);

/// Records what it was asked to render; optionally fails or panics for
/// chosen domains.
#[derive(Default)]
pub struct RecordingRenderer {
    rendered: Mutex<Vec<RenderedEntry>>,
    fail_for: HashSet<String>,
    panic_for: HashSet<String>,
}

impl RecordingRenderer {
    pub fn failing_for<'a>(domains: impl IntoIterator<Item = &'a str>) -> Self {
        Self { fail_for: domains.into_iter().map(str::to_string).collect(), ..Self::default() }
    }

    pub fn panicking_for<'a>(domains: impl IntoIterator<Item = &'a str>) -> Self {
        Self { panic_for: domains.into_iter().map(str::to_string).collect(), ..Self::default() }
    }

    pub fn rendered(&self) -> Vec<RenderedEntry> {
        self.rendered.lock().unwrap().clone()
    }
}

impl ReportRenderer for RecordingRenderer {
    fn render(
        &self,
        report: &DomainReport,
        assessment: &ThreatAssessment,
        pricing: Option<&PricingAnalysis>,
    ) -> Result<(), ReconError> {
        if self.panic_for.contains(&report.domain) {
            panic!("renderer crashed on {}", report.domain);
        }
        if self.fail_for.contains(&report.domain) {
            return Err(ReconError::Render {
                domain: report.domain.clone(),
                reason: "terminal went away".to_string(),
            });
        }
        self.rendered.lock().unwrap().push((
            report.domain.clone(),
            assessment.level,
            pricing.map(|p| p.cheapest_registration.provider.clone()),
        ));
        Ok(())
    }
}
