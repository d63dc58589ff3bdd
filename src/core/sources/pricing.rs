// src/core/sources/pricing.rs

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use hickory_resolver::TokioAsyncResolver;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::core::error::{SourceError, with_timeout};
use crate::core::models::{AvailabilityResult, PricingQuote, SourceKind};
use crate::core::pricing::{ESTIMATE_NOTE, FALLBACK_NOTE};
use crate::core::sources::Source;
use crate::core::sources::dns::is_no_records;

const PORKBUN_PRICING_URL: &str = "https://api.porkbun.com/api/json/v3/pricing/get";

/// (tld, registration, renewal) in USD.
type RateCard = &'static [(&'static str, f64, f64)];

static PORKBUN_RATES: RateCard = &[
    ("com", 11.08, 11.08),
    ("net", 12.52, 12.52),
    ("org", 10.74, 10.74),
    ("io", 28.12, 46.68),
    ("dev", 10.81, 12.87),
    ("app", 12.87, 14.93),
    ("xyz", 2.06, 12.98),
    ("co", 11.48, 25.48),
];
static NAMECHEAP_RATES: RateCard = &[
    ("com", 10.98, 15.98),
    ("net", 12.98, 16.98),
    ("org", 7.48, 15.98),
    ("io", 34.98, 58.98),
    ("dev", 12.98, 16.98),
    ("app", 14.98, 18.98),
    ("xyz", 1.98, 14.98),
    ("co", 8.98, 29.98),
];
static GODADDY_RATES: RateCard = &[
    ("com", 11.99, 22.99),
    ("net", 14.99, 23.99),
    ("org", 9.99, 23.99),
    ("io", 44.99, 69.99),
    ("dev", 14.99, 20.99),
    ("app", 16.99, 22.99),
    ("xyz", 2.99, 24.99),
    ("co", 11.99, 37.99),
];
static CLOUDFLARE_RATES: RateCard = &[
    ("com", 10.44, 10.44),
    ("net", 11.84, 11.84),
    ("org", 10.11, 10.11),
    ("io", 50.00, 50.00),
    ("dev", 12.18, 12.18),
    ("app", 14.18, 14.18),
    ("xyz", 11.18, 11.18),
];

fn rate_for(card: RateCard, tld: &str) -> Option<(f64, f64)> {
    card.iter().find(|(t, _, _)| *t == tld).map(|(_, reg, renew)| (*reg, *renew))
}

/// One registrar's pricing endpoint.
///
/// Quotes never fail: problems are recorded in `PricingQuote::error` so they
/// stay visible in the exports.
#[async_trait]
pub trait RegistrarProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn quote(&self, domain: &str, tld: &str) -> PricingQuote;
}

/// Quotes from a published rate card, always annotated as estimates.
pub struct EstimateProvider {
    name: &'static str,
    url_template: &'static str,
    rates: RateCard,
}

impl EstimateProvider {
    pub const fn new(name: &'static str, url_template: &'static str, rates: RateCard) -> Self {
        Self { name, url_template, rates }
    }

    fn registration_url(&self, domain: &str) -> String {
        self.url_template.replace("{domain}", domain)
    }
}

#[async_trait]
impl RegistrarProvider for EstimateProvider {
    fn name(&self) -> &str {
        self.name
    }

    async fn quote(&self, domain: &str, tld: &str) -> PricingQuote {
        let rate = rate_for(self.rates, tld);
        PricingQuote {
            provider: self.name.to_string(),
            available: true,
            registration_price: rate.map(|(reg, _)| reg),
            renewal_price: rate.map(|(_, renew)| renew),
            currency: "USD".to_string(),
            registration_url: self.registration_url(domain),
            error: Some(match rate {
                Some(_) => format!("{ESTIMATE_NOTE} from {} rate card", self.name),
                None => format!("No price listed for .{tld}"),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PorkbunResponse {
    status: String,
    #[serde(default)]
    pricing: HashMap<String, PorkbunTldPrice>,
}

#[derive(Debug, Deserialize)]
struct PorkbunTldPrice {
    registration: String,
    renewal: String,
}

type PriceTable = HashMap<String, (f64, f64)>;

/// A usable price: finite and not negative. Rejects "NaN" and "inf".
fn parse_price(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|p| p.is_finite() && *p >= 0.0)
}

fn parse_porkbun(body: &str) -> Result<PriceTable, SourceError> {
    let response: PorkbunResponse =
        serde_json::from_str(body).map_err(|e| SourceError::Parse(e.to_string()))?;
    if response.status != "SUCCESS" {
        return Err(SourceError::NoData(format!("Porkbun status {}", response.status)));
    }
    Ok(response
        .pricing
        .into_iter()
        .filter_map(|(tld, price)| {
            let registration = parse_price(&price.registration)?;
            let renewal = parse_price(&price.renewal)?;
            Some((tld, (registration, renewal)))
        })
        .collect())
}

/// Live prices from Porkbun's public pricing API, with a rate-card fallback.
pub struct PorkbunProvider {
    http: reqwest::Client,
    timeout: Duration,
    table: OnceCell<PriceTable>,
}

impl PorkbunProvider {
    pub fn new(http: reqwest::Client, timeout: Duration) -> Self {
        Self { http, timeout, table: OnceCell::new() }
    }

    /// Fetched once per run; failures are not cached so later domains retry.
    async fn table(&self) -> Result<&PriceTable, SourceError> {
        self.table
            .get_or_try_init(|| async {
                debug!("Fetching Porkbun pricing table.");
                let body = with_timeout(self.timeout, async {
                    let response = self
                        .http
                        .post(PORKBUN_PRICING_URL)
                        .json(&serde_json::json!({}))
                        .send()
                        .await?
                        .error_for_status()?;
                    Ok(response.text().await?)
                })
                .await?;
                let table = parse_porkbun(&body)?;
                info!(tlds = table.len(), "Loaded Porkbun pricing table.");
                Ok(table)
            })
            .await
    }
}

#[async_trait]
impl RegistrarProvider for PorkbunProvider {
    fn name(&self) -> &str {
        "Porkbun"
    }

    async fn quote(&self, domain: &str, tld: &str) -> PricingQuote {
        let mut quote = PricingQuote {
            provider: self.name().to_string(),
            available: true,
            registration_price: None,
            renewal_price: None,
            currency: "USD".to_string(),
            registration_url: format!("https://porkbun.com/checkout/search?q={domain}"),
            error: None,
        };

        let (rate, note) = match self.table().await {
            Ok(table) => match table.get(tld) {
                Some(rate) => (Some(*rate), None),
                None => (None, Some(format!("No price listed for .{tld}"))),
            },
            Err(e) => {
                warn!(error = %e, "Porkbun pricing lookup failed, using rate card.");
                let rate = rate_for(PORKBUN_RATES, tld);
                let note = match rate {
                    Some(_) => format!("{FALLBACK_NOTE}: live lookup failed ({e})"),
                    None => format!("Live lookup failed ({e})"),
                };
                (rate, Some(note))
            }
        };

        quote.registration_price = rate.map(|(reg, _)| reg);
        quote.renewal_price = rate.map(|(_, renew)| renew);
        quote.error = note;
        quote
    }
}

/// Availability check plus registrar quotes for available domains.
pub struct PricingSource {
    resolver: TokioAsyncResolver,
    providers: Vec<Arc<dyn RegistrarProvider>>,
    timeout: Duration,
}

impl PricingSource {
    pub fn new(
        resolver: TokioAsyncResolver,
        providers: Vec<Arc<dyn RegistrarProvider>>,
        timeout: Duration,
    ) -> Self {
        Self { resolver, providers, timeout }
    }

    pub fn with_default_providers(
        resolver: TokioAsyncResolver,
        http: reqwest::Client,
        timeout: Duration,
    ) -> Self {
        let providers: Vec<Arc<dyn RegistrarProvider>> = vec![
            Arc::new(PorkbunProvider::new(http, timeout)),
            Arc::new(EstimateProvider::new(
                "Namecheap",
                "https://www.namecheap.com/domains/registration/results/?domain={domain}",
                NAMECHEAP_RATES,
            )),
            Arc::new(EstimateProvider::new(
                "GoDaddy",
                "https://www.godaddy.com/domainsearch/find?domainToCheck={domain}",
                GODADDY_RATES,
            )),
            Arc::new(EstimateProvider::new(
                "Cloudflare",
                "https://domains.cloudflare.com/?domain={domain}",
                CLOUDFLARE_RATES,
            )),
        ];
        Self::new(resolver, providers, timeout)
    }

    /// Treats a name with no NS records as unregistered.
    ///
    /// This is a proxy signal, not registry data: parked or misconfigured
    /// names can be misreported either way.
    async fn check_availability(&self, domain: &str) -> Result<bool, SourceError> {
        let lookup = with_timeout(self.timeout, async {
            Ok(self.resolver.ns_lookup(domain).await)
        })
        .await?;
        match lookup {
            Ok(ns) => Ok(ns.iter().next().is_none()),
            Err(e) if is_no_records(&e) => Ok(true),
            Err(e) => Err(SourceError::Resolve(e)),
        }
    }

    async fn collect_quotes(&self, domain: &str) -> Vec<PricingQuote> {
        let tld = domain.rsplit('.').next().unwrap_or(domain);
        join_all(self.providers.iter().map(|provider| provider.quote(domain, tld))).await
    }
}

#[async_trait]
impl Source for PricingSource {
    type Output = AvailabilityResult;

    fn kind(&self) -> SourceKind {
        SourceKind::Pricing
    }

    async fn fetch(&self, domain: &str) -> Result<AvailabilityResult, SourceError> {
        info!(target = %domain, "Checking availability.");
        let available = self.check_availability(domain).await?;
        let quotes = if available {
            self.collect_quotes(domain).await
        } else {
            debug!(target = %domain, "Domain is registered, skipping registrar quotes.");
            Vec::new()
        };

        info!(target = %domain, available, quotes = quotes.len(), "Availability check finished.");
        Ok(AvailabilityResult { available, checked_at: Utc::now(), quotes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pricing::{QuoteDataSource, is_valid};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn estimate_provider_annotates_quotes() {
        let provider =
            EstimateProvider::new("Namecheap", "https://nc.example/?d={domain}", NAMECHEAP_RATES);

        let quote = provider.quote("fresh-name.com", "com").await;
        assert_eq!(quote.registration_price, Some(10.98));
        assert_eq!(quote.registration_url, "https://nc.example/?d=fresh-name.com");
        assert_eq!(QuoteDataSource::classify(&quote), QuoteDataSource::Estimate);
        assert!(!is_valid(&quote));

        let unknown = provider.quote("fresh-name.museum", "museum").await;
        assert_eq!(unknown.registration_price, None);
        assert_eq!(QuoteDataSource::classify(&unknown), QuoteDataSource::Unavailable);
    }

    #[test]
    fn parses_porkbun_pricing_table() {
        let body = r#"{"status":"SUCCESS","pricing":{"com":{"registration":"11.08","renewal":"11.08","transfer":"11.08"},"bad":{"registration":"n/a","renewal":"1"}}}"#;
        let table = parse_porkbun(body).unwrap();
        assert_eq!(table.get("com"), Some(&(11.08, 11.08)));
        assert!(!table.contains_key("bad"));
    }

    #[test]
    fn non_numeric_porkbun_prices_are_dropped() {
        let body = r#"{"status":"SUCCESS","pricing":{
            "com":{"registration":"9.50","renewal":"10.50"},
            "nan":{"registration":"NaN","renewal":"1.00"},
            "inf":{"registration":"5.00","renewal":"inf"},
            "neg":{"registration":"-1","renewal":"2.00"}}}"#;
        let table = parse_porkbun(body).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("com"), Some(&(9.5, 10.5)));
    }

    #[test]
    fn rejects_porkbun_error_status() {
        let err = parse_porkbun(r#"{"status":"ERROR"}"#).unwrap_err();
        assert!(matches!(err, SourceError::NoData(_)));
    }
}
