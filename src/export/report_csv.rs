// src/export/report_csv.rs

use std::io;

use csv::{QuoteStyle, WriterBuilder};

use super::{format_date, format_price, join_list, yes_no};
use crate::core::error::ExportError;
use crate::core::models::DomainReport;
use crate::core::pricing::{self, QuoteDataSource};
use crate::core::threat;

/// Subdomains listed verbatim in the "Sample Subdomains" column.
const SAMPLE_SUBDOMAINS: usize = 5;

pub const CSV_HEADERS: [&str; 29] = [
    "Domain",
    "Registrar",
    "Registration Date",
    "Expiration Date",
    "Registrant Country",
    "Status",
    "Name Servers",
    "IPv4 Addresses",
    "IPv6 Addresses",
    "MX Records",
    "TXT Records",
    "SSL Issuer",
    "SSL Subject",
    "SSL Valid From",
    "SSL Valid To",
    "SSL Days Until Expiry",
    "SSL Valid",
    "Open Ports",
    "Services",
    "Subdomains Found",
    "Sample Subdomains",
    "Available for Registration",
    "Cheapest Registration Price",
    "Cheapest Renewal Price",
    "Best Registration Provider",
    "Best Renewal Provider",
    "All Pricing Data",
    "Threat Level",
    "Threats",
];

/// One flattened row per report. Cells for absent slots are blank.
pub fn report_row(report: &DomainReport) -> Vec<String> {
    let mut row = Vec::with_capacity(CSV_HEADERS.len());
    row.push(report.domain.clone());

    match report.whois() {
        Some(whois) => row.extend([
            whois.registrar.clone().unwrap_or_default(),
            format_date(whois.creation_date),
            format_date(whois.expiration_date),
            whois.registrant_country.clone().unwrap_or_default(),
            join_list(&whois.status),
            join_list(&whois.name_servers),
        ]),
        None => row.extend(std::iter::repeat_n(String::new(), 6)),
    }

    match report.dns() {
        Some(dns) => {
            let mx: Vec<String> =
                dns.mx.iter().map(|mx| format!("{} {}", mx.preference, mx.exchange)).collect();
            row.extend([
                join_list(&dns.ipv4),
                join_list(&dns.ipv6),
                join_list(&mx),
                join_list(&dns.txt),
            ]);
        }
        None => row.extend(std::iter::repeat_n(String::new(), 4)),
    }

    match report.ssl() {
        Some(ssl) => {
            let cert = &ssl.certificate_info;
            row.extend([
                cert.issuer_name.clone(),
                cert.subject_name.clone(),
                format_date(Some(cert.not_before)),
                format_date(Some(cert.not_after)),
                cert.days_until_expiry.to_string(),
                yes_no(ssl.is_valid).to_string(),
            ]);
        }
        None => row.extend(std::iter::repeat_n(String::new(), 6)),
    }

    match report.network() {
        Some(services) => {
            let ports: Vec<String> = services.iter().map(|s| s.port.to_string()).collect();
            let names: Vec<&str> = services.iter().map(|s| s.service.as_str()).collect();
            row.extend([join_list(&ports), join_list(&names)]);
        }
        None => row.extend(std::iter::repeat_n(String::new(), 2)),
    }

    match report.subdomains() {
        Some(found) => {
            let sample = &found.names[..found.names.len().min(SAMPLE_SUBDOMAINS)];
            row.extend([found.names.len().to_string(), join_list(sample)]);
        }
        None => row.extend(std::iter::repeat_n(String::new(), 2)),
    }

    pricing_cells(report, &mut row);

    let assessment = threat::classify(report);
    row.push(assessment.level.to_string());
    row.push(join_list(&assessment.descriptions()));
    row
}

fn pricing_cells(report: &DomainReport, row: &mut Vec<String>) {
    let Some(availability) = report.availability() else {
        row.extend(std::iter::repeat_n(String::new(), 6));
        return;
    };
    row.push(yes_no(availability.available).to_string());

    match pricing::analyze_report(report) {
        Some(analysis) => {
            let renewal = analysis.cheapest_renewal.as_ref();
            row.extend([
                format_price(Some(analysis.cheapest_registration.price), &analysis.currency),
                format_price(renewal.map(|r| r.price), &analysis.currency),
                analysis.cheapest_registration.provider.clone(),
                renewal.map(|r| r.provider.clone()).unwrap_or_default(),
            ]);
        }
        None => row.extend(std::iter::repeat_n(String::new(), 4)),
    }

    let quotes: Vec<String> = availability
        .quotes
        .iter()
        .map(|quote| {
            let amount = |price: Option<f64>| {
                price.map(|p| format!("{p:.2}")).unwrap_or_else(|| "-".into())
            };
            format!(
                "{}: {}/{} {} ({})",
                quote.provider,
                amount(quote.registration_price),
                amount(quote.renewal_price),
                quote.currency,
                QuoteDataSource::classify(quote),
            )
        })
        .collect();
    row.push(join_list(&quotes));
}

/// Writes the header and one row per report, in order.
pub fn write_report_csv<W: io::Write>(
    writer: W,
    reports: &[DomainReport],
) -> Result<(), ExportError> {
    let mut out = WriterBuilder::new().quote_style(QuoteStyle::Necessary).from_writer(writer);
    out.write_record(CSV_HEADERS)?;
    for report in reports {
        out.write_record(report_row(report))?;
    }
    out.flush().map_err(csv::Error::from)?;
    Ok(())
}
