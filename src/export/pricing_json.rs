// src/export/pricing_json.rs

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use super::{format_price, tld_of};
use crate::core::models::{DomainReport, PricingQuote};
use crate::core::pricing::{self, QuoteDataSource};

const SCHEMA_VERSION: &str = "1.0";

fn provider_entry(quote: &PricingQuote) -> Value {
    let source = QuoteDataSource::classify(quote);
    json!({
        "provider": quote.provider,
        "available": quote.available,
        "registrationPrice": quote.registration_price,
        "renewalPrice": quote.renewal_price,
        "formattedRegistrationPrice": format_price(quote.registration_price, &quote.currency),
        "formattedRenewalPrice": format_price(quote.renewal_price, &quote.currency),
        "currency": quote.currency,
        "registrationUrl": quote.registration_url,
        "dataSource": source,
        "isLive": source.is_live(),
        "notes": quote.error,
    })
}

fn comparison_entry(report: &DomainReport) -> Value {
    let availability = report.availability();
    json!({
        "domain": report.domain,
        "tld": tld_of(&report.domain),
        "checked": report.pricing.is_some(),
        "available": availability.map(|a| a.available),
        "checkedAt": availability.map(|a| a.checked_at.to_rfc3339()),
        "providers": availability
            .map(|a| a.quotes.iter().map(provider_entry).collect::<Vec<_>>())
            .unwrap_or_default(),
        "analysis": pricing::analyze_report(report),
    })
}

fn summary(reports: &[DomainReport]) -> Value {
    let quotes: Vec<&PricingQuote> =
        reports.iter().filter_map(DomainReport::availability).flat_map(|a| &a.quotes).collect();
    let providers: BTreeSet<&str> = quotes.iter().map(|q| q.provider.as_str()).collect();
    let live = pricing::live_percentage(quotes.iter().copied());
    let (available, registered) = reports
        .iter()
        .filter_map(DomainReport::availability)
        .fold((0usize, 0usize), |(yes, no), a| {
            if a.available { (yes + 1, no) } else { (yes, no + 1) }
        });

    json!({
        "providers": providers,
        "totalQuotes": quotes.len(),
        "liveDataPercentage": live,
        "fallbackDataPercentage": if quotes.is_empty() { 0.0 } else { 100.0 - live },
        "availableDomains": available,
        "registeredDomains": registered,
    })
}

/// The pricing comparison export.
pub fn pricing_document(reports: &[DomainReport], generated_at: DateTime<Utc>) -> Value {
    json!({
        "exportMetadata": {
            "generatedAt": generated_at.to_rfc3339(),
            "domainCount": reports.len(),
            "schemaVersion": SCHEMA_VERSION,
        },
        "pricingComparison": reports.iter().map(comparison_entry).collect::<Vec<_>>(),
        "summary": summary(reports),
    })
}
