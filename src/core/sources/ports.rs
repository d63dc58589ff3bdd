// src/core/sources/ports.rs

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::net::{TcpStream, lookup_host};
use tokio::time::timeout;
use tracing::{debug, info};

use crate::core::error::{SourceError, with_timeout};
use crate::core::models::{NetworkService, SourceKind};
use crate::core::sources::Source;

/// Ports checked by the scan, with the service conventionally found there.
pub const COMMON_PORTS: &[(u16, &str)] = &[
    (21, "ftp"),
    (22, "ssh"),
    (23, "telnet"),
    (25, "smtp"),
    (53, "dns"),
    (80, "http"),
    (110, "pop3"),
    (143, "imap"),
    (443, "https"),
    (465, "smtps"),
    (587, "submission"),
    (993, "imaps"),
    (995, "pop3s"),
    (3306, "mysql"),
    (3389, "rdp"),
    (5432, "postgresql"),
    (6379, "redis"),
    (8080, "http-alt"),
    (8443, "https-alt"),
];

/// Per-port connect budget, independent of the source timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// TCP connect scan of well-known ports.
pub struct PortScanSource {
    timeout: Duration,
}

impl PortScanSource {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

pub fn service_name(port: u16) -> &'static str {
    COMMON_PORTS
        .iter()
        .find(|(p, _)| *p == port)
        .map(|(_, name)| *name)
        .unwrap_or("unknown")
}

async fn try_connect(address: SocketAddr) -> Option<u16> {
    match timeout(CONNECT_TIMEOUT, TcpStream::connect(address)).await {
        Ok(Ok(_)) => {
            debug!(%address, "Port open.");
            Some(address.port())
        }
        _ => None,
    }
}

#[async_trait]
impl Source for PortScanSource {
    type Output = Vec<NetworkService>;

    fn kind(&self) -> SourceKind {
        SourceKind::Network
    }

    async fn fetch(&self, domain: &str) -> Result<Vec<NetworkService>, SourceError> {
        info!(target = %domain, ports = COMMON_PORTS.len(), "Starting port scan.");

        let host = with_timeout(self.timeout, async {
            lookup_host((domain, 0))
                .await?
                .next()
                .ok_or_else(|| SourceError::NoData(format!("{domain} did not resolve")))
        })
        .await?;

        let mut attempts: FuturesUnordered<_> = COMMON_PORTS
            .iter()
            .map(|(port, _)| try_connect(SocketAddr::new(host.ip(), *port)))
            .collect();

        let mut open = Vec::new();
        while let Some(result) = attempts.next().await {
            if let Some(port) = result {
                open.push(port);
            }
        }
        open.sort_unstable();

        let services: Vec<NetworkService> = open
            .into_iter()
            .map(|port| NetworkService { port, service: service_name(port).to_string() })
            .collect();
        info!(target = %domain, open = services.len(), "Port scan finished.");
        Ok(services)
    }
}
