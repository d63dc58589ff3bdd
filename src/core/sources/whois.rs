// src/core/sources/whois.rs

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::core::error::{SourceError, with_timeout};
use crate::core::models::{SourceKind, WhoisInfo};
use crate::core::sources::Source;

const WHOIS_PORT: u16 = 43;
const IANA_WHOIS: &str = "whois.iana.org";

/// Responses containing any of these mean the registry has no record.
const NOT_FOUND_PATTERNS: &[&str] = &[
    "no match",
    "not found",
    "no data found",
    "no entries found",
    "domain not found",
    "status: free",
    "status: available",
];

static RE_REFER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?mi)^\s*(?:refer|whois):\s*(\S+)").unwrap());
static RE_REGISTRAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mi)^\s*(?:Registrar|Sponsoring Registrar|registrar name):\s*(.+?)\s*$").unwrap());
static RE_CREATED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?mi)^\s*(?:Creation Date|Created On|Created|Registered on|Registration Time):\s*(.+?)\s*$").unwrap()
});
static RE_EXPIRES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?mi)^\s*(?:Registry Expiry Date|Registrar Registration Expiration Date|Expiration Date|Expiry Date|Expires On|paid-till):\s*(.+?)\s*$",
    )
    .unwrap()
});
static RE_COUNTRY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?mi)^\s*Registrant Country:\s*(.+?)\s*$").unwrap());
static RE_STATUS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?mi)^\s*(?:Domain )?Status:\s*(\S+)").unwrap());
static RE_NAME_SERVER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mi)^\s*(?:Name Server|nserver):\s*(\S+)").unwrap());

/// Queries the registry WHOIS service for a domain's registration record.
pub struct WhoisSource {
    timeout: Duration,
}

impl WhoisSource {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn query(&self, server: &str, query: &str) -> Result<String, SourceError> {
        debug!(server, query, "Sending WHOIS query.");
        with_timeout(self.timeout, async {
            let mut stream = TcpStream::connect((server, WHOIS_PORT)).await?;
            stream.write_all(format!("{query}\r\n").as_bytes()).await?;
            let mut raw = Vec::new();
            stream.read_to_end(&mut raw).await?;
            Ok(String::from_utf8_lossy(&raw).into_owned())
        })
        .await
    }
}

#[async_trait]
impl Source for WhoisSource {
    type Output = WhoisInfo;

    fn kind(&self) -> SourceKind {
        SourceKind::Whois
    }

    async fn fetch(&self, domain: &str) -> Result<WhoisInfo, SourceError> {
        info!(target = %domain, "Starting WHOIS lookup.");
        let tld = domain.rsplit('.').next().unwrap_or(domain);

        let referral = self.query(IANA_WHOIS, tld).await?;
        let server = referral_server(&referral)
            .ok_or_else(|| SourceError::NoData(format!("no WHOIS server known for .{tld}")))?;

        let raw = self.query(&server, domain).await?;
        if is_not_found(&raw) {
            return Err(SourceError::NoData(format!("{server} has no record for {domain}")));
        }

        let info = parse_whois(&raw);
        info!(target = %domain, registrar = ?info.registrar, "WHOIS lookup finished.");
        Ok(info)
    }
}

fn referral_server(response: &str) -> Option<String> {
    RE_REFER.captures(response).map(|c| c[1].to_string())
}

fn is_not_found(response: &str) -> bool {
    let lowered = response.to_lowercase();
    NOT_FOUND_PATTERNS.iter().any(|pattern| lowered.contains(pattern))
}

fn first(re: &Regex, text: &str) -> Option<String> {
    re.captures(text).map(|c| c[1].trim().to_string()).filter(|s| !s.is_empty())
}

/// Parses the common WHOIS date layouts into UTC.
fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    const DATETIME_FORMATS: &[&str] =
        &["%Y-%m-%dT%H:%M:%SZ", "%Y-%m-%dT%H:%M:%S%.fZ", "%Y-%m-%d %H:%M:%S", "%Y.%m.%d %H:%M:%S"];
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed.and_utc());
        }
    }
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%b-%Y", "%Y.%m.%d", "%d.%m.%Y", "%Y/%m/%d"];
    let date_part = value.split_whitespace().next().unwrap_or(value);
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn collect_unique(re: &Regex, text: &str, normalize: impl Fn(&str) -> String) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    for captures in re.captures_iter(text) {
        let value = normalize(&captures[1]);
        if !value.is_empty() && !values.contains(&value) {
            values.push(value);
        }
    }
    values
}

/// Extracts the registration fields from a raw WHOIS response.
pub fn parse_whois(raw: &str) -> WhoisInfo {
    WhoisInfo {
        registrar: first(&RE_REGISTRAR, raw),
        creation_date: first(&RE_CREATED, raw).as_deref().and_then(parse_date),
        expiration_date: first(&RE_EXPIRES, raw).as_deref().and_then(parse_date),
        registrant_country: first(&RE_COUNTRY, raw),
        status: collect_unique(&RE_STATUS, raw, str::to_string),
        name_servers: collect_unique(&RE_NAME_SERVER, raw, |ns| {
            ns.trim_end_matches('.').to_lowercase()
        }),
    }
}
