// src/ui/sections.rs

use std::fmt::Write;

use crossterm::style::{StyledContent, Stylize};

use crate::core::knowledge_base;
use crate::core::models::{DomainReport, SourceOutcome};
use crate::core::pricing::{PricingAnalysis, QuoteDataSource};
use crate::core::threat::{ThreatAssessment, ThreatLevel};

const RULE: &str = "────────────────────────────────────────────────────────";
/// Subdomains listed before the rest are summarized as a count.
const SUBDOMAIN_PREVIEW: usize = 10;

fn level_badge(level: ThreatLevel) -> StyledContent<String> {
    let text = format!(" {level} ");
    match level {
        ThreatLevel::Low => text.black().on_green(),
        ThreatLevel::Medium => text.black().on_yellow(),
        ThreatLevel::High => text.white().on_red(),
    }
}

fn heading(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n{}", title.bold().cyan());
}

fn field(out: &mut String, label: &str, value: impl std::fmt::Display) {
    let _ = writeln!(out, "  {:<20} {}", label.dim(), value);
}

/// Writes the standard "nothing here" line for a slot, or returns the value.
fn slot<'a, T>(out: &mut String, outcome: &'a Option<SourceOutcome<T>>) -> Option<&'a T> {
    match outcome {
        None => {
            let _ = writeln!(out, "  {}", "skipped for this run".dim());
            None
        }
        Some(SourceOutcome::Absent) => {
            let _ = writeln!(out, "  {}", "no data (source failed or timed out)".yellow());
            None
        }
        Some(SourceOutcome::Present(value)) => Some(value),
    }
}

fn join_or_dash(values: &[String]) -> String {
    if values.is_empty() { "-".to_string() } else { values.join(", ") }
}

fn registration(out: &mut String, report: &DomainReport) {
    heading(out, "Registration");
    if let Some(whois) = slot(out, &report.whois) {
        field(out, "Registrar", whois.registrar.as_deref().unwrap_or("-"));
        let date = |d: Option<chrono::DateTime<chrono::Utc>>| {
            d.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_else(|| "-".to_string())
        };
        field(out, "Registered", date(whois.creation_date));
        field(out, "Expires", date(whois.expiration_date));
        field(out, "Country", whois.registrant_country.as_deref().unwrap_or("-"));
        field(out, "Status", join_or_dash(&whois.status));
        field(out, "Name servers", join_or_dash(&whois.name_servers));
    }
}

fn resolution(out: &mut String, report: &DomainReport) {
    heading(out, "DNS");
    if let Some(dns) = slot(out, &report.dns) {
        field(out, "IPv4", join_or_dash(&dns.ipv4));
        field(out, "IPv6", join_or_dash(&dns.ipv6));
        let mx: Vec<String> =
            dns.mx.iter().map(|mx| format!("{} {}", mx.preference, mx.exchange)).collect();
        field(out, "MX", join_or_dash(&mx));
        field(out, "NS", join_or_dash(&dns.ns));
        field(out, "TXT records", dns.txt.len());
    }
}

fn certificate(out: &mut String, report: &DomainReport) {
    heading(out, "SSL/TLS");
    if let Some(ssl) = slot(out, &report.ssl) {
        let cert = &ssl.certificate_info;
        let validity = if ssl.is_valid { "valid".green() } else { "invalid".red() };
        field(out, "Certificate", validity);
        field(out, "Subject", &cert.subject_name);
        field(out, "Issuer", &cert.issuer_name);
        field(out, "Valid from", cert.not_before.format("%Y-%m-%d"));
        field(out, "Valid to", cert.not_after.format("%Y-%m-%d"));
        field(out, "Days left", cert.days_until_expiry);
    }
}

fn network(out: &mut String, report: &DomainReport) {
    heading(out, "Open ports");
    if let Some(services) = slot(out, &report.network) {
        if services.is_empty() {
            let _ = writeln!(out, "  none of the scanned ports are open");
        }
        for service in services {
            let _ = writeln!(out, "  {:>5}/tcp  {}", service.port, service.service);
        }
    }
}

fn subdomains(out: &mut String, report: &DomainReport) {
    heading(out, "Subdomains");
    if let Some(found) = slot(out, &report.subdomains) {
        field(out, "Found", found.names.len());
        for name in found.names.iter().take(SUBDOMAIN_PREVIEW) {
            let _ = writeln!(out, "    {name}");
        }
        if found.names.len() > SUBDOMAIN_PREVIEW {
            let _ = writeln!(out, "    … and {} more", found.names.len() - SUBDOMAIN_PREVIEW);
        }
    }
}

fn pricing(out: &mut String, report: &DomainReport, analysis: Option<&PricingAnalysis>) {
    heading(out, "Availability & pricing");
    let Some(availability) = slot(out, &report.pricing) else { return };
    if !availability.available {
        field(out, "Available", "no (registered)".red());
        return;
    }
    field(out, "Available", "yes".green());

    for quote in &availability.quotes {
        let price = quote
            .registration_price
            .map(|p| format!("{p:.2} {}", quote.currency))
            .unwrap_or_else(|| "-".to_string());
        let renewal = quote
            .renewal_price
            .map(|p| format!("{p:.2}"))
            .unwrap_or_else(|| "-".to_string());
        let source = QuoteDataSource::classify(quote);
        let _ = writeln!(
            out,
            "  {:<12} {:>12}  renew {:>8}  [{}]",
            quote.provider, price, renewal, source
        );
    }

    match analysis {
        Some(analysis) => {
            let best = &analysis.cheapest_registration;
            let offer = format!("{} at {:.2} {}", best.provider, best.price, analysis.currency);
            field(out, "Best registration", offer.green().bold());
            if let Some(renewal) = &analysis.cheapest_renewal {
                field(out, "Best renewal", format!("{} at {:.2}", renewal.provider, renewal.price));
            }
        }
        None => field(out, "Best registration", "no live quotes to compare".yellow()),
    }
}

fn threats(out: &mut String, assessment: &ThreatAssessment, verbose: bool) {
    heading(out, "Threat assessment");
    field(out, "Level", level_badge(assessment.level));
    for finding in &assessment.findings {
        let _ = writeln!(out, "  • {}", finding.description);
        if verbose {
            if let Some(detail) = knowledge_base::get_finding_detail(finding.kind) {
                let tag = format!("[{} {}]", detail.category, finding.kind.code());
                let _ = writeln!(out, "    {} {}", detail.title.bold(), tag.dim());
                let _ = writeln!(out, "    {}", detail.description);
                let _ = writeln!(out, "    Fix: {}", detail.remediation);
            }
        }
    }
}

/// The full console block for one domain.
pub fn format_report(
    report: &DomainReport,
    assessment: &ThreatAssessment,
    analysis: Option<&PricingAnalysis>,
    verbose: bool,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{}", RULE.dim());
    let _ = writeln!(out, "{}  {}", report.domain.as_str().bold(), level_badge(assessment.level));
    let _ = writeln!(out, "{}", RULE.dim());

    registration(&mut out, report);
    resolution(&mut out, report);
    certificate(&mut out, report);
    network(&mut out, report);
    subdomains(&mut out, report);
    pricing(&mut out, report, analysis);
    threats(&mut out, assessment, verbose);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::SourceOutcome;
    use crate::core::testing;
    use crate::core::threat::classify;

    #[test]
    fn failed_and_skipped_slots_are_distinguished() {
        let mut report = DomainReport::new("example.com");
        report.ssl = Some(SourceOutcome::Absent);
        let assessment = classify(&report);

        let text = format_report(&report, &assessment, None, false);
        assert!(text.contains("skipped for this run"));
        assert!(text.contains("no data (source failed or timed out)"));
        assert!(text.contains("No SSL certificate detected"));
    }

    #[test]
    fn verbose_mode_adds_remediation() {
        let mut report = DomainReport::new("example.com");
        report.ssl = Some(SourceOutcome::Absent);
        let assessment = classify(&report);

        let quiet = format_report(&report, &assessment, None, false);
        let verbose = format_report(&report, &assessment, None, true);
        assert!(!quiet.contains("Serve the domain over HTTPS"));
        assert!(!quiet.contains("No SSL Certificate"));
        assert!(verbose.contains("No SSL Certificate"));
        assert!(verbose.contains("SSL_MISSING"));
        assert!(verbose.contains("No certificate could be retrieved from port 443"));
        assert!(verbose.contains("Fix: Serve the domain over HTTPS"));
    }

    #[test]
    fn shows_best_offer_for_available_domains() {
        let mut report = DomainReport::new("fresh-name.com");
        report.pricing = Some(SourceOutcome::Present(testing::sample_availability()));
        let analysis = crate::core::pricing::analyze_report(&report);

        let text = format_report(&report, &classify(&report), analysis.as_ref(), false);
        assert!(text.contains("Porkbun at 9.73 USD"));
        assert!(text.contains("[estimate]"));
    }
}
