// src/core/threat.rs

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::debug;

use crate::core::models::DomainReport;

/// Certificates closer to expiry than this are flagged.
const EXPIRY_WARNING_DAYS: i64 = 30;
/// Registrations younger than this are flagged.
const RECENT_REGISTRATION_DAYS: i64 = 30;

/// Overall severity of a domain. Ordered so the maximum wins.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ThreatLevel {
    #[default]
    Low,
    Medium,
    High,
}

/// Machine-readable identity of a finding; keys into the knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingKind {
    SslExpiringSoon,
    SslMissing,
    SslInvalid,
    RecentlyRegistered,
}

impl FindingKind {
    pub fn code(self) -> &'static str {
        match self {
            FindingKind::SslExpiringSoon => "SSL_EXPIRING_SOON",
            FindingKind::SslMissing => "SSL_MISSING",
            FindingKind::SslInvalid => "SSL_INVALID",
            FindingKind::RecentlyRegistered => "DOMAIN_RECENTLY_REGISTERED",
        }
    }
}

/// One triggered rule. The severity is fixed when the finding is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatFinding {
    pub kind: FindingKind,
    pub severity: ThreatLevel,
    pub description: String,
}

impl ThreatFinding {
    pub fn new(kind: FindingKind, severity: ThreatLevel, description: impl Into<String>) -> Self {
        Self { kind, severity, description: description.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatAssessment {
    pub level: ThreatLevel,
    pub findings: Vec<ThreatFinding>,
}

impl ThreatAssessment {
    pub fn descriptions(&self) -> Vec<&str> {
        self.findings.iter().map(|f| f.description.as_str()).collect()
    }
}

pub fn classify(report: &DomainReport) -> ThreatAssessment {
    classify_at(report, Utc::now())
}

/// Evaluates the rule set against `report` as of `now`.
///
/// Rules run in a fixed order and every one that applies contributes a
/// finding; the level is the highest severity among them.
pub fn classify_at(report: &DomainReport, now: DateTime<Utc>) -> ThreatAssessment {
    let mut findings = Vec::new();

    match report.ssl() {
        Some(ssl) => {
            let days = ssl.certificate_info.days_until_expiry;
            if days < EXPIRY_WARNING_DAYS {
                findings.push(ThreatFinding::new(
                    FindingKind::SslExpiringSoon,
                    ThreatLevel::Medium,
                    format!("SSL expires in {days} days"),
                ));
            }
        }
        None => findings.push(ThreatFinding::new(
            FindingKind::SslMissing,
            ThreatLevel::High,
            "No SSL certificate detected",
        )),
    }

    if report.ssl().is_some_and(|ssl| !ssl.is_valid) {
        findings.push(ThreatFinding::new(
            FindingKind::SslInvalid,
            ThreatLevel::High,
            "Invalid SSL certificate",
        ));
    }

    if let Some(created) = report.whois().and_then(|w| w.creation_date) {
        if now.signed_duration_since(created) < Duration::days(RECENT_REGISTRATION_DAYS) {
            findings.push(ThreatFinding::new(
                FindingKind::RecentlyRegistered,
                ThreatLevel::Low,
                "Domain registered recently",
            ));
        }
    }

    let level = findings.iter().map(|f| f.severity).max().unwrap_or_default();
    debug!(
        domain = %report.domain,
        %level,
        findings = findings.len(),
        "Threat classification complete."
    );
    ThreatAssessment { level, findings }
}
