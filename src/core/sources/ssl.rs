// src/core/sources/ssl.rs

use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use native_tls::{HandshakeError, TlsConnector};
use tokio::task::spawn_blocking;
use tracing::{debug, error, info, warn};
use x509_parser::prelude::*;

use crate::core::error::{SourceError, with_timeout};
use crate::core::models::{CertificateInfo, SourceKind, SslInfo};
use crate::core::sources::Source;

const TLS_PORT: u16 = 443;

/// Retrieves and inspects the certificate served on port 443.
pub struct SslSource {
    timeout: Duration,
}

impl SslSource {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Source for SslSource {
    type Output = SslInfo;

    fn kind(&self) -> SourceKind {
        SourceKind::Ssl
    }

    async fn fetch(&self, domain: &str) -> Result<SslInfo, SourceError> {
        info!(target = %domain, "Starting SSL/TLS inspection.");
        let target = domain.to_string();
        let timeout = self.timeout;

        debug!("Spawning blocking task for TLS connection.");
        let task = spawn_blocking(move || perform_tls_scan(&target, timeout));
        // The blocking task keeps its own socket timeouts; this bounds DNS and
        // anything else that could stall inside it.
        let result = with_timeout(timeout * 2, async {
            task.await.unwrap_or_else(|e| {
                error!(panic = %e, "Blocking SSL task panicked!");
                Err(SourceError::Panicked(e.to_string()))
            })
        })
        .await;

        if let Ok(ssl) = &result {
            info!(
                valid = ssl.is_valid,
                days_left = ssl.certificate_info.days_until_expiry,
                "SSL/TLS inspection finished."
            );
        }
        result
    }
}

fn connect(target: &str, timeout: Duration) -> Result<TcpStream, SourceError> {
    let address = (target, TLS_PORT)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| SourceError::NoData(format!("{target} did not resolve")))?;

    debug!(target, %address, "Connecting TCP stream to port 443.");
    let stream = TcpStream::connect_timeout(&address, timeout)?;
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;
    Ok(stream)
}

fn handshake(
    target: &str,
    timeout: Duration,
    verify: bool,
) -> Result<Option<native_tls::Certificate>, SourceError> {
    let connector = TlsConnector::builder()
        .danger_accept_invalid_certs(!verify)
        .danger_accept_invalid_hostnames(!verify)
        .build()
        .map_err(|e| SourceError::Tls(format!("TlsConnector error: {e}")))?;

    let stream = connect(target, timeout)?;
    debug!(target, verify, "Performing TLS handshake.");
    match connector.connect(target, stream) {
        Ok(tls) => tls
            .peer_certificate()
            .map_err(|e| SourceError::Tls(format!("could not read peer certificate: {e}"))),
        Err(HandshakeError::Failure(e)) => Err(SourceError::Tls(e.to_string())),
        Err(HandshakeError::WouldBlock(_)) => {
            Err(SourceError::Tls("handshake interrupted".to_string()))
        }
    }
}

fn perform_tls_scan(target: &str, timeout: Duration) -> Result<SslInfo, SourceError> {
    // A failed verified handshake is retried without verification so an
    // untrusted certificate is still reported, flagged as invalid.
    let (cert, verified) = match handshake(target, timeout, true) {
        Ok(cert) => (cert, true),
        Err(SourceError::Tls(reason)) => {
            warn!(target, %reason, "Verified handshake failed, retrying without verification.");
            (handshake(target, timeout, false)?, false)
        }
        Err(e) => return Err(e),
    };

    let cert = cert.ok_or_else(|| SourceError::NoData("server presented no certificate".into()))?;
    let der = cert
        .to_der()
        .map_err(|e| SourceError::Parse(format!("could not convert certificate to DER: {e}")))?;
    let info = certificate_info(&der, Utc::now())?;

    let within_validity = info.days_until_expiry >= 0;
    Ok(SslInfo { is_valid: verified && within_validity, certificate_info: info })
}

/// Extracts subject, issuer and validity window from a DER certificate.
fn certificate_info(der: &[u8], now: DateTime<Utc>) -> Result<CertificateInfo, SourceError> {
    let (_, x509) = parse_x509_certificate(der).map_err(|e| {
        error!(error = %e, "Failed to parse X.509 certificate");
        SourceError::Parse(format!("X.509 parse error: {e}"))
    })?;

    info!(subject = %x509.subject(), issuer = %x509.issuer(), "Parsed certificate.");

    let validity = x509.validity();
    let not_before = asn1_time_to_chrono_utc(&validity.not_before);
    let not_after = asn1_time_to_chrono_utc(&validity.not_after);

    Ok(CertificateInfo {
        subject_name: x509.subject().to_string(),
        issuer_name: x509.issuer().to_string(),
        not_before,
        not_after,
        days_until_expiry: not_after.signed_duration_since(now).num_days(),
    })
}

fn asn1_time_to_chrono_utc(time: &ASN1Time) -> DateTime<Utc> {
    DateTime::from_timestamp(time.timestamp(), 0).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_garbage_der() {
        let err = certificate_info(b"not a certificate", Utc::now()).unwrap_err();
        assert!(matches!(err, SourceError::Parse(_)));
    }
}
