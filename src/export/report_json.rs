// src/export/report_json.rs

use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use crate::core::models::DomainReport;
use crate::core::pricing;
use crate::core::threat;

fn domain_entry(report: &DomainReport) -> Value {
    let assessment = threat::classify(report);
    let analysis = pricing::analyze_report(report);
    json!({
        "domain": report.domain,
        "whois": report.whois,
        "dns": report.dns,
        "ssl": report.ssl,
        "network": report.network,
        "subdomains": report.subdomains,
        "pricing": report.pricing,
        "threatAssessment": assessment,
        "pricingAnalysis": analysis,
    })
}

/// The primary JSON export: every report with its threat assessment and
/// pricing analysis attached.
pub fn report_document(reports: &[DomainReport], generated_at: DateTime<Utc>) -> Value {
    json!({
        "generatedAt": generated_at.to_rfc3339(),
        "domainCount": reports.len(),
        "domains": reports.iter().map(domain_entry).collect::<Vec<_>>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::SourceOutcome;
    use crate::core::testing;
    use pretty_assertions::assert_eq;

    #[test]
    fn document_carries_every_domain_in_order() {
        let mut fresh = DomainReport::new("fresh-name.com");
        fresh.pricing = Some(SourceOutcome::Present(testing::sample_availability()));
        let mut broken = DomainReport::new("broken.com");
        broken.ssl = Some(SourceOutcome::Absent);

        let doc = report_document(&[fresh, broken], Utc::now());

        assert_eq!(doc["domainCount"], 2);
        assert_eq!(doc["domains"][0]["domain"], "fresh-name.com");
        assert_eq!(
            doc["domains"][0]["pricingAnalysis"]["cheapestRegistration"]["provider"],
            "Porkbun"
        );
        assert_eq!(doc["domains"][1]["ssl"]["status"], "absent");
        assert_eq!(doc["domains"][1]["whois"], Value::Null);
        assert_eq!(doc["domains"][1]["threatAssessment"]["level"], "HIGH");
        assert_eq!(
            doc["domains"][1]["threatAssessment"]["findings"][0]["kind"],
            "SSL_MISSING"
        );
    }
}
