// src/core/sources/subdomains.rs

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use hickory_resolver::TokioAsyncResolver;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::core::error::{SourceError, with_timeout};
use crate::core::models::{SourceKind, SubdomainFindings};
use crate::core::sources::Source;

/// Labels tried by the DNS brute-force pass.
const COMMON_LABELS: &[&str] = &[
    "www", "mail", "api", "dev", "staging", "test", "admin", "portal", "vpn", "blog", "shop",
    "app", "cdn", "ftp", "m", "docs",
];

#[derive(Debug, Deserialize)]
struct CrtShEntry {
    name_value: String,
}

/// Enumerates subdomains from certificate-transparency logs and common labels.
pub struct SubdomainSource {
    http: reqwest::Client,
    resolver: TokioAsyncResolver,
    timeout: Duration,
}

impl SubdomainSource {
    pub fn new(http: reqwest::Client, resolver: TokioAsyncResolver, timeout: Duration) -> Self {
        Self { http, resolver, timeout }
    }

    async fn from_certificate_logs(&self, domain: &str) -> Result<BTreeSet<String>, SourceError> {
        let url = format!("https://crt.sh/?q=%25.{domain}&output=json");
        debug!(%url, "Querying certificate transparency logs.");
        let entries: Vec<CrtShEntry> = with_timeout(self.timeout, async {
            let response = self.http.get(&url).send().await?.error_for_status()?;
            Ok(response.json().await?)
        })
        .await?;

        Ok(names_for_domain(
            entries.iter().flat_map(|entry| entry.name_value.split('\n')),
            domain,
        ))
    }

    async fn from_common_labels(&self, domain: &str) -> BTreeSet<String> {
        let lookups = COMMON_LABELS.iter().map(|label| {
            let candidate = format!("{label}.{domain}");
            async move {
                let lookup = self.resolver.lookup_ip(candidate.as_str());
                let found = matches!(tokio::time::timeout(self.timeout, lookup).await, Ok(Ok(_)));
                found.then_some(candidate)
            }
        });
        join_all(lookups).await.into_iter().flatten().collect()
    }
}

/// Normalizes raw names and keeps real subdomains of `domain`.
fn names_for_domain<'a>(raw: impl Iterator<Item = &'a str>, domain: &str) -> BTreeSet<String> {
    let suffix = format!(".{domain}");
    raw.map(|name| name.trim().trim_end_matches('.').to_lowercase())
        .filter(|name| !name.starts_with('*') && name.ends_with(&suffix))
        .collect()
}

#[async_trait]
impl Source for SubdomainSource {
    type Output = SubdomainFindings;

    fn kind(&self) -> SourceKind {
        SourceKind::Subdomains
    }

    async fn fetch(&self, domain: &str) -> Result<SubdomainFindings, SourceError> {
        info!(target = %domain, "Starting subdomain discovery.");
        let (logged, guessed) =
            tokio::join!(self.from_certificate_logs(domain), self.from_common_labels(domain));

        let logged = match logged {
            Ok(names) => names,
            Err(e) if guessed.is_empty() => return Err(e),
            Err(e) => {
                warn!(
                    target = %domain,
                    error = %e,
                    "Certificate log query failed, keeping DNS results."
                );
                BTreeSet::new()
            }
        };

        let findings = SubdomainFindings::from_names(logged.into_iter().chain(guessed));
        info!(target = %domain, found = findings.names.len(), "Subdomain discovery finished.");
        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn keeps_only_real_subdomains() {
        let raw = [
            "www.example.com",
            "*.example.com",
            "API.Example.com.",
            "example.com",
            "evil.com",
            " mail.example.com ",
        ];
        let names = names_for_domain(raw.into_iter(), "example.com");
        assert_eq!(
            names.into_iter().collect::<Vec<_>>(),
            vec!["api.example.com", "mail.example.com", "www.example.com"]
        );
    }

    #[test]
    fn parses_crt_sh_payload() {
        let payload = r#"[{"name_value":"a.example.com\nb.example.com","issuer_name":"x"},{"name_value":"a.example.com"}]"#;
        let entries: Vec<CrtShEntry> = serde_json::from_str(payload).unwrap();
        let raw = entries.iter().flat_map(|e| e.name_value.split('\n'));
        let names = names_for_domain(raw, "example.com");
        assert_eq!(names.len(), 2);
    }
}
