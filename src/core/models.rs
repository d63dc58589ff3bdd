// src/core/models.rs

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

// --- Source Result Contract ---

/// The settled result of one data source call.
///
/// A source either produced a usable value or it did not; the reason for a
/// failure is logged by the orchestrator and never travels past it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", content = "value", rename_all = "lowercase")]
pub enum SourceOutcome<T> {
    Present(T),
    Absent,
}

impl<T> SourceOutcome<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, SourceOutcome::Present(_))
    }

    pub fn as_present(&self) -> Option<&T> {
        match self {
            SourceOutcome::Present(value) => Some(value),
            SourceOutcome::Absent => None,
        }
    }
}

/// Identifies one category of domain data, and therefore one slot in a `DomainReport`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[strum(to_string = "WHOIS")]
    Whois,
    #[strum(to_string = "DNS")]
    Dns,
    #[strum(to_string = "SSL")]
    Ssl,
    #[strum(to_string = "Network")]
    Network,
    #[strum(to_string = "Subdomains")]
    Subdomains,
    #[strum(to_string = "Pricing")]
    Pricing,
}

// --- Registration (WHOIS) ---

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WhoisInfo {
    pub registrar: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub registrant_country: Option<String>,
    pub status: Vec<String>,
    pub name_servers: Vec<String>,
}

// --- Name Resolution (DNS) ---

/// A mail exchanger record with its preference value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MxRecord {
    pub preference: u16,
    pub exchange: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DnsRecords {
    pub ipv4: Vec<String>,
    pub ipv6: Vec<String>,
    pub mx: Vec<MxRecord>,
    pub txt: Vec<String>,
    pub ns: Vec<String>,
}

impl DnsRecords {
    pub fn is_empty(&self) -> bool {
        self.ipv4.is_empty()
            && self.ipv6.is_empty()
            && self.mx.is_empty()
            && self.txt.is_empty()
            && self.ns.is_empty()
    }
}

// --- Certificate Inspection (SSL/TLS) ---

/// Detailed information extracted from the leaf certificate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CertificateInfo {
    pub subject_name: String,
    pub issuer_name: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub days_until_expiry: i64,
}

/// The certificate presented on port 443, plus whether it passed validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SslInfo {
    pub is_valid: bool,
    pub certificate_info: CertificateInfo,
}

// --- Network Services ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct NetworkService {
    pub port: u16,
    pub service: String,
}

// --- Subdomain Discovery ---

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SubdomainFindings {
    /// Sorted, de-duplicated fully qualified names.
    pub names: Vec<String>,
}

impl SubdomainFindings {
    pub fn from_names<I: IntoIterator<Item = String>>(names: I) -> Self {
        let unique: BTreeSet<String> = names.into_iter().collect();
        Self { names: unique.into_iter().collect() }
    }
}

// --- Pricing & Availability ---

/// One registrar's answer for a domain.
///
/// A quote with `error` set is never used for price comparisons but is still
/// carried through to the exports so the reader can see what happened.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricingQuote {
    pub provider: String,
    pub available: bool,
    pub registration_price: Option<f64>,
    pub renewal_price: Option<f64>,
    pub currency: String,
    pub registration_url: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailabilityResult {
    pub available: bool,
    pub checked_at: DateTime<Utc>,
    pub quotes: Vec<PricingQuote>,
}

// --- Main Report ---

/// Everything gathered about one domain during a run.
///
/// Each slot is `None` when its source was not enabled for the run,
/// `Some(Absent)` when the source was enabled but produced nothing usable, and
/// `Some(Present(_))` otherwise.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DomainReport {
    pub domain: String,
    pub whois: Option<SourceOutcome<WhoisInfo>>,
    pub dns: Option<SourceOutcome<DnsRecords>>,
    pub ssl: Option<SourceOutcome<SslInfo>>,
    pub network: Option<SourceOutcome<Vec<NetworkService>>>,
    pub subdomains: Option<SourceOutcome<SubdomainFindings>>,
    pub pricing: Option<SourceOutcome<AvailabilityResult>>,
}

fn present<T>(slot: &Option<SourceOutcome<T>>) -> Option<&T> {
    slot.as_ref().and_then(SourceOutcome::as_present)
}

impl DomainReport {
    /// An empty report with every slot disabled.
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            whois: None,
            dns: None,
            ssl: None,
            network: None,
            subdomains: None,
            pricing: None,
        }
    }

    pub fn whois(&self) -> Option<&WhoisInfo> {
        present(&self.whois)
    }

    pub fn dns(&self) -> Option<&DnsRecords> {
        present(&self.dns)
    }

    pub fn ssl(&self) -> Option<&SslInfo> {
        present(&self.ssl)
    }

    pub fn network(&self) -> Option<&[NetworkService]> {
        present(&self.network).map(Vec::as_slice)
    }

    pub fn subdomains(&self) -> Option<&SubdomainFindings> {
        present(&self.subdomains)
    }

    pub fn availability(&self) -> Option<&AvailabilityResult> {
        present(&self.pricing)
    }

    fn slot_states(&self) -> [(SourceKind, Option<bool>); 6] {
        [
            (SourceKind::Whois, self.whois.as_ref().map(SourceOutcome::is_present)),
            (SourceKind::Dns, self.dns.as_ref().map(SourceOutcome::is_present)),
            (SourceKind::Ssl, self.ssl.as_ref().map(SourceOutcome::is_present)),
            (SourceKind::Network, self.network.as_ref().map(SourceOutcome::is_present)),
            (SourceKind::Subdomains, self.subdomains.as_ref().map(SourceOutcome::is_present)),
            (SourceKind::Pricing, self.pricing.as_ref().map(SourceOutcome::is_present)),
        ]
    }

    /// Slots whose source was enabled for the run, whatever the outcome.
    pub fn active_slots(&self) -> BTreeSet<SourceKind> {
        self.slot_states()
            .into_iter()
            .filter_map(|(kind, state)| state.map(|_| kind))
            .collect()
    }

    /// Slots that hold a usable value.
    pub fn present_slots(&self) -> BTreeSet<SourceKind> {
        self.slot_states()
            .into_iter()
            .filter_map(|(kind, state)| (state == Some(true)).then_some(kind))
            .collect()
    }
}
