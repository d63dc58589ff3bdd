// src/export/pricing_csv.rs

use std::io;

use csv::{QuoteStyle, WriterBuilder};

use super::{tld_of, yes_no};
use crate::core::error::ExportError;
use crate::core::models::{DomainReport, SourceOutcome};
use crate::core::pricing::QuoteDataSource;

const HEADERS: [&str; 11] = [
    "Domain",
    "TLD",
    "Available",
    "Checked At",
    "Provider",
    "Registration Price",
    "Renewal Price",
    "Currency",
    "Registration URL",
    "Data Source",
    "Error/Notes",
];

fn amount(price: Option<f64>) -> String {
    price.map(|p| format!("{p:.2}")).unwrap_or_default()
}

/// Why a domain has no provider rows.
fn placeholder_note(report: &DomainReport) -> &'static str {
    match &report.pricing {
        None => "Pricing not checked",
        Some(SourceOutcome::Absent) => "Pricing lookup failed",
        Some(SourceOutcome::Present(a)) if !a.available => "Domain is registered",
        Some(SourceOutcome::Present(_)) => "No provider quotes",
    }
}

fn rows(report: &DomainReport) -> Vec<Vec<String>> {
    let domain = report.domain.clone();
    let tld = tld_of(&report.domain).to_string();

    let quotes = report.availability().map(|a| (a, &a.quotes)).filter(|(_, q)| !q.is_empty());
    let Some((availability, quotes)) = quotes else {
        let available = report.availability().map(|a| yes_no(a.available).to_string());
        let checked_at = report.availability().map(|a| a.checked_at.to_rfc3339());
        let mut row =
            vec![domain, tld, available.unwrap_or_default(), checked_at.unwrap_or_default()];
        row.extend(std::iter::repeat_n(String::new(), 5));
        row.extend([
            QuoteDataSource::Unavailable.to_string(),
            placeholder_note(report).to_string(),
        ]);
        return vec![row];
    };

    quotes
        .iter()
        .map(|quote| {
            vec![
                domain.clone(),
                tld.clone(),
                yes_no(quote.available).to_string(),
                availability.checked_at.to_rfc3339(),
                quote.provider.clone(),
                amount(quote.registration_price),
                amount(quote.renewal_price),
                quote.currency.clone(),
                quote.registration_url.clone(),
                QuoteDataSource::classify(quote).to_string(),
                quote.error.clone().unwrap_or_default(),
            ]
        })
        .collect()
}

/// One row per (domain, provider); domains without quotes get a single
/// placeholder row explaining why.
pub fn write_pricing_csv<W: io::Write>(
    writer: W,
    reports: &[DomainReport],
) -> Result<(), ExportError> {
    let mut out = WriterBuilder::new().quote_style(QuoteStyle::Necessary).from_writer(writer);
    out.write_record(HEADERS)?;
    for row in reports.iter().flat_map(rows) {
        out.write_record(&row)?;
    }
    out.flush().map_err(csv::Error::from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::AvailabilityResult;
    use crate::core::testing;
    use pretty_assertions::assert_eq;

    fn records(reports: &[DomainReport]) -> Vec<csv::StringRecord> {
        let mut buffer = Vec::new();
        write_pricing_csv(&mut buffer, reports).unwrap();
        csv::Reader::from_reader(buffer.as_slice()).records().map(Result::unwrap).collect()
    }

    #[test]
    fn available_domain_gets_a_row_per_provider() {
        let mut report = DomainReport::new("fresh-name.com");
        report.pricing = Some(SourceOutcome::Present(testing::sample_availability()));

        let rows = records(&[report]);
        assert_eq!(rows.len(), 3);
        assert_eq!(&rows[0][1], "com");
        assert_eq!(&rows[0][4], "Porkbun");
        assert_eq!(&rows[0][5], "9.73");
        assert_eq!(&rows[0][9], "live");
        assert_eq!(&rows[1][9], "estimate");
        assert!(rows[1][10].starts_with("Estimated price"));
    }

    #[test]
    fn domains_without_quotes_get_one_placeholder_row() {
        let unchecked = DomainReport::new("a.com");
        let mut failed = DomainReport::new("b.org");
        failed.pricing = Some(SourceOutcome::Absent);
        let mut taken = DomainReport::new("c.net");
        taken.pricing = Some(SourceOutcome::Present(AvailabilityResult {
            available: false,
            checked_at: chrono::Utc::now(),
            quotes: Vec::new(),
        }));

        let rows = records(&[unchecked, failed, taken]);
        let notes: Vec<&str> = rows.iter().map(|r| &r[10]).collect();
        assert_eq!(
            notes,
            vec!["Pricing not checked", "Pricing lookup failed", "Domain is registered"]
        );
        assert_eq!(&rows[2][2], "No");
        assert_eq!(&rows[0][2], "");
    }
}
