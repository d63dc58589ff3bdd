// src/core/pricing.rs

//! Turns a set of registrar quotes into a best-deal summary.
//!
//! Everything here is a pure function of its input: the same quotes always
//! produce the same analysis.

use serde::{Deserialize, Serialize};
use strum::Display;

use crate::core::models::{DomainReport, PricingQuote};

/// Annotation prefix used by providers that return table prices instead of live data.
pub const ESTIMATE_NOTE: &str = "Estimated price";
/// Annotation prefix used when a live lookup failed and a table price was substituted.
pub const FALLBACK_NOTE: &str = "Fallback estimate";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BestPrice {
    pub provider: String,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
    pub spread: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PricingAnalysis {
    pub cheapest_registration: BestPrice,
    pub cheapest_renewal: Option<BestPrice>,
    pub registration_range: Option<PriceRange>,
    pub renewal_range: Option<PriceRange>,
    pub average_registration_price: Option<f64>,
    pub valid_quotes: usize,
    pub currency: String,
}

/// Where a quote's numbers came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum QuoteDataSource {
    Live,
    Estimate,
    Fallback,
    Unavailable,
}

impl QuoteDataSource {
    pub fn classify(quote: &PricingQuote) -> Self {
        match quote.error.as_deref() {
            None => QuoteDataSource::Live,
            Some(note) if note.starts_with(FALLBACK_NOTE) => QuoteDataSource::Fallback,
            Some(note) if note.starts_with(ESTIMATE_NOTE) => QuoteDataSource::Estimate,
            Some(_) => QuoteDataSource::Unavailable,
        }
    }

    pub fn is_live(self) -> bool {
        self == QuoteDataSource::Live
    }
}

/// A quote that may take part in price comparisons.
pub fn is_valid(quote: &PricingQuote) -> bool {
    quote.available
        && quote.error.is_none()
        && quote.registration_price.is_some_and(f64::is_finite)
}

/// Share of quotes backed by live data, in percent. Zero for an empty set.
pub fn live_percentage<'a, I>(quotes: I) -> f64
where
    I: IntoIterator<Item = &'a PricingQuote>,
{
    let (live, total) = quotes.into_iter().fold((0usize, 0usize), |(live, total), quote| {
        let live = live + usize::from(QuoteDataSource::classify(quote).is_live());
        (live, total + 1)
    });
    if total == 0 {
        0.0
    } else {
        live as f64 * 100.0 / total as f64
    }
}

/// Lowest price on one axis. Ties keep the first quote in input order.
fn cheapest<'a>(
    quotes: &[&'a PricingQuote],
    price: impl Fn(&PricingQuote) -> Option<f64>,
) -> Option<BestPrice> {
    let mut best: Option<(&'a PricingQuote, f64)> = None;
    for quote in quotes {
        let Some(candidate) = price(quote).filter(|p| p.is_finite()) else { continue };
        match best {
            Some((_, current)) if candidate >= current => {}
            _ => best = Some((*quote, candidate)),
        }
    }
    best.map(|(quote, price)| BestPrice { provider: quote.provider.clone(), price })
}

fn positive_prices(
    quotes: &[&PricingQuote],
    price: impl Fn(&PricingQuote) -> Option<f64>,
) -> Vec<f64> {
    quotes
        .iter()
        .filter_map(|quote| price(quote))
        .filter(|p| p.is_finite() && *p > 0.0)
        .collect()
}

fn range(prices: &[f64]) -> Option<PriceRange> {
    let min = prices.iter().copied().reduce(f64::min)?;
    let max = prices.iter().copied().reduce(f64::max)?;
    Some(PriceRange { min, max, spread: max - min })
}

/// Best registration and renewal offers across `quotes`.
///
/// Returns `None` when no quote is valid.
pub fn analyze(quotes: &[PricingQuote]) -> Option<PricingAnalysis> {
    let valid: Vec<&PricingQuote> = quotes.iter().filter(|q| is_valid(q)).collect();
    let cheapest_registration = cheapest(&valid, |q| q.registration_price)?;
    let currency = valid
        .iter()
        .find(|q| q.provider == cheapest_registration.provider)
        .map(|q| q.currency.clone())
        .unwrap_or_default();

    let registration = positive_prices(&valid, |q| q.registration_price);
    let renewal = positive_prices(&valid, |q| q.renewal_price);
    let average_registration_price = (!registration.is_empty())
        .then(|| registration.iter().sum::<f64>() / registration.len() as f64);

    Some(PricingAnalysis {
        cheapest_renewal: cheapest(&valid, |q| q.renewal_price),
        cheapest_registration,
        registration_range: range(&registration),
        renewal_range: range(&renewal),
        average_registration_price,
        valid_quotes: valid.len(),
        currency,
    })
}

/// Analysis for a report whose domain is available. Registered domains and
/// reports without pricing yield `None`.
pub fn analyze_report(report: &DomainReport) -> Option<PricingAnalysis> {
    report
        .availability()
        .filter(|availability| availability.available)
        .and_then(|availability| analyze(&availability.quotes))
}
