// src/core/sources/dns.rs

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use tracing::{debug, info, warn};

use crate::core::error::{SourceError, with_timeout};
use crate::core::models::{DnsRecords, MxRecord, SourceKind};
use crate::core::sources::Source;

/// Resolves the address, mail, text and name-server records of a domain.
pub struct DnsSource {
    resolver: TokioAsyncResolver,
    timeout: Duration,
}

impl DnsSource {
    pub fn new(resolver: TokioAsyncResolver, timeout: Duration) -> Self {
        Self { resolver, timeout }
    }
}

/// Whether a resolver error just means "the name has no such records".
pub(crate) fn is_no_records(error: &ResolveError) -> bool {
    matches!(error.kind(), ResolveErrorKind::NoRecordsFound { .. })
}

/// Maps "no records" to an empty set and keeps every other error.
fn records_or_empty<T>(
    record_type: &str,
    target: &str,
    result: Result<Vec<T>, ResolveError>,
) -> Result<Vec<T>, ResolveError> {
    match result {
        Ok(records) => {
            debug!(target, record_type, count = records.len(), "Lookup finished.");
            Ok(records)
        }
        Err(e) if is_no_records(&e) => {
            debug!(target, record_type, "No records found.");
            Ok(Vec::new())
        }
        Err(e) => {
            warn!(target, record_type, error = %e, "Lookup failed.");
            Err(e)
        }
    }
}

pub(crate) fn trim_fqdn(name: impl ToString) -> String {
    name.to_string().trim_end_matches('.').to_lowercase()
}

#[async_trait]
impl Source for DnsSource {
    type Output = DnsRecords;

    fn kind(&self) -> SourceKind {
        SourceKind::Dns
    }

    async fn fetch(&self, domain: &str) -> Result<DnsRecords, SourceError> {
        info!(target = %domain, "Starting DNS lookups.");
        let resolver = &self.resolver;

        let (ips, mx, txt, ns) = with_timeout(self.timeout, async {
            Ok(tokio::join!(
                async {
                    resolver.lookup_ip(domain).await.map(|l| l.iter().collect::<Vec<IpAddr>>())
                },
                async {
                    resolver.mx_lookup(domain).await.map(|l| {
                        l.iter()
                            .map(|mx| MxRecord {
                                preference: mx.preference(),
                                exchange: trim_fqdn(mx.exchange()),
                            })
                            .collect::<Vec<_>>()
                    })
                },
                async {
                    resolver
                        .txt_lookup(domain)
                        .await
                        .map(|l| l.iter().map(|t| t.to_string()).collect::<Vec<_>>())
                },
                async {
                    resolver
                        .ns_lookup(domain)
                        .await
                        .map(|l| l.iter().map(trim_fqdn).collect::<Vec<_>>())
                },
            ))
        })
        .await?;

        let results = (
            records_or_empty("A/AAAA", domain, ips),
            records_or_empty("MX", domain, mx),
            records_or_empty("TXT", domain, txt),
            records_or_empty("NS", domain, ns),
        );

        // Only give up when every lookup failed outright.
        let (ips, mx, txt, ns) = match results {
            (Err(e), Err(_), Err(_), Err(_)) => return Err(SourceError::Resolve(e)),
            (ips, mx, txt, ns) => (
                ips.unwrap_or_default(),
                mx.unwrap_or_default(),
                txt.unwrap_or_default(),
                ns.unwrap_or_default(),
            ),
        };

        let (ipv4, ipv6) = split_addresses(&ips);
        let mut mx = mx;
        mx.sort_by_key(|record| record.preference);

        let records = DnsRecords { ipv4, ipv6, mx, txt, ns };
        if records.is_empty() {
            return Err(SourceError::NoData(format!("no DNS records for {domain}")));
        }

        info!(
            target = %domain,
            ipv4 = records.ipv4.len(),
            ipv6 = records.ipv6.len(),
            mx = records.mx.len(),
            "DNS lookups finished."
        );
        Ok(records)
    }
}

fn split_addresses(addresses: &[IpAddr]) -> (Vec<String>, Vec<String>) {
    let mut ipv4 = Vec::new();
    let mut ipv6 = Vec::new();
    for address in addresses {
        match address {
            IpAddr::V4(v4) => ipv4.push(v4.to_string()),
            IpAddr::V6(v6) => ipv6.push(v6.to_string()),
        }
    }
    (ipv4, ipv6)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn splits_v4_and_v6_addresses() {
        let (v4, v6) = split_addresses(&[
            IpAddr::V4(Ipv4Addr::new(93, 184, 216, 34)),
            IpAddr::V6(Ipv6Addr::LOCALHOST),
        ]);
        assert_eq!(v4, vec!["93.184.216.34"]);
        assert_eq!(v6, vec!["::1"]);
    }

    #[test]
    fn trims_trailing_dot_and_case() {
        assert_eq!(trim_fqdn("NS1.Example.COM."), "ns1.example.com");
    }
}
