// src/core/knowledge_base.rs

//! Human-readable context for every threat finding: what it means and what to
//! do about it.

use crate::core::threat::{FindingKind, ThreatLevel};
use std::fmt;

/// High-level grouping used when rendering findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FindingCategory {
    /// Certificate presence, validity and lifetime.
    Ssl,
    /// Registration record signals.
    Registration,
}

impl fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingCategory::Ssl => write!(f, "SSL/TLS Certificate"),
            FindingCategory::Registration => write!(f, "Domain Registration"),
        }
    }
}

/// Everything needed to explain a finding to a user.
pub struct FindingDetail {
    pub kind: FindingKind,
    pub title: &'static str,
    pub category: FindingCategory,
    /// The severity the classifier attaches to this finding.
    pub severity: ThreatLevel,
    pub description: &'static str,
    pub remediation: &'static str,
}

static FINDINGS: &[FindingDetail] = &[
    FindingDetail {
        kind: FindingKind::SslExpiringSoon,
        title: "SSL Certificate Expiring Soon",
        category: FindingCategory::Ssl,
        severity: ThreatLevel::Medium,
        description: "The certificate served on port 443 expires in less than 30 days. Once it lapses, browsers will block visitors with a security warning.",
        remediation: "Renew the certificate now. If renewals are automated (e.g. ACME/Let's Encrypt), check that the renewal job is still running.",
    },
    FindingDetail {
        kind: FindingKind::SslMissing,
        title: "No SSL Certificate",
        category: FindingCategory::Ssl,
        severity: ThreatLevel::High,
        description: "No certificate could be retrieved from port 443. The site is either not served over HTTPS or the TLS endpoint is unreachable.",
        remediation: "Serve the domain over HTTPS with a certificate from a trusted CA, and make sure port 443 is reachable.",
    },
    FindingDetail {
        kind: FindingKind::SslInvalid,
        title: "Invalid SSL Certificate",
        category: FindingCategory::Ssl,
        severity: ThreatLevel::High,
        description: "A certificate was presented but did not validate: it may be expired, self-signed, issued for another name, or missing intermediates.",
        remediation: "Install a certificate that covers this hostname, is within its validity window, and ships the full intermediate chain.",
    },
    FindingDetail {
        kind: FindingKind::RecentlyRegistered,
        title: "Recently Registered Domain",
        category: FindingCategory::Registration,
        severity: ThreatLevel::Low,
        description: "The domain was registered less than 30 days ago. Freshly registered domains are disproportionately used for phishing and spam.",
        remediation: "Treat links and mail from this domain with extra care until it has an established history.",
    },
];

/// Looks up the explanation for `kind`.
pub fn get_finding_detail(kind: FindingKind) -> Option<&'static FindingDetail> {
    FINDINGS.iter().find(|f| f.kind == kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_finding_kind_is_documented() {
        for kind in [
            FindingKind::SslExpiringSoon,
            FindingKind::SslMissing,
            FindingKind::SslInvalid,
            FindingKind::RecentlyRegistered,
        ] {
            assert!(get_finding_detail(kind).is_some(), "missing entry for {}", kind.code());
        }
    }

    #[test]
    fn catalogue_severity_matches_classifier_tags() {
        let detail = get_finding_detail(FindingKind::SslMissing).unwrap();
        assert_eq!(detail.severity, ThreatLevel::High);
        assert_eq!(detail.category.to_string(), "SSL/TLS Certificate");
    }
}
