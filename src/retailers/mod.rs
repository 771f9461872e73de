use _model::{round_cents, PriceQuote, Source};
use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use typed_floats::tf64::PositiveFinite;

use crate::config::{Credentials, ProductEntry};
use crate::http::Request;

mod bws;
mod coles;
mod dan_murphys;
mod liquorland;
mod woolworths;

/// Why an entry produced no quote. Never fatal to the batch.
#[derive(Debug, Error)]
pub enum Unavailable {
    #[error("cannot build request: {0}")]
    Request(String),
    #[error("network failure: {0}")]
    Network(String),
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("unexpected response: {0}")]
    Response(String),
}

pub type Outcome = Result<PriceQuote, Unavailable>;

/// Prices as a retailer reports them.
#[derive(Debug, Default, PartialEq)]
pub struct RawPrice {
    pub total: Option<f64>,
    pub unit: Option<f64>,
}

/// A price field. Retailers send these as numbers, numeric strings or "$x.yy".
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(try_from = "RawAmount")]
pub struct Amount(pub f64);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(f64),
    Text(String),
}

impl TryFrom<RawAmount> for Amount {
    type Error = String;

    fn try_from(raw: RawAmount) -> Result<Self, Self::Error> {
        match raw {
            RawAmount::Number(x) => Ok(Self(x)),
            RawAmount::Text(x) => x
                .trim()
                .trim_start_matches('$')
                .parse()
                .map(Self)
                .map_err(|_| format!("invalid price: {x:?}")),
        }
    }
}

pub fn amount(x: Option<Amount>) -> Option<f64> {
    x.map(|x| x.0)
}

pub fn build_request(
    entry: &ProductEntry,
    credentials: &Credentials,
) -> Result<Request, Unavailable> {
    Ok(match entry.source {
        Source::DanMurphys => dan_murphys::request(entry),
        Source::Bws => bws::request(entry),
        Source::Liquorland | Source::FirstChoice => liquorland::request(entry),
        Source::Coles => coles::request(entry, credentials)?,
        Source::Woolworths => woolworths::request(entry),
    })
}

pub fn parse_response(entry: &ProductEntry, body: &str) -> Outcome {
    let raw = match entry.source {
        Source::DanMurphys => dan_murphys::extract(body),
        Source::Bws => bws::extract(body),
        Source::Liquorland | Source::FirstChoice => liquorland::extract(body),
        Source::Coles => coles::extract(body),
        Source::Woolworths => woolworths::extract(body),
    }
    .map_err(|e| Unavailable::Response(format!("{e:#}")))?;

    quote(entry, raw, Utc::now().timestamp())
}

fn quote(entry: &ProductEntry, raw: RawPrice, checked_at: i64) -> Outcome {
    let total = raw.total.ok_or_else(|| {
        Unavailable::Response(format!("{} response missing price", entry.source.name()))
    })?;
    let unit = raw.unit.unwrap_or(total / entry.pack_size as f64);

    Ok(PriceQuote {
        retailer: entry.retailer.clone(),
        suburb: entry.suburb.clone(),
        pack_size: entry.pack_size,
        price_total: price(total)?,
        price_unit: price(unit)?,
        checked_at,
        url: entry.url.clone(),
    })
}

fn price(x: f64) -> Result<PositiveFinite, Unavailable> {
    // adding 0.0 turns -0.0 into 0.0
    PositiveFinite::new(round_cents(x) + 0.0)
        .map_err(|_| Unavailable::Response(format!("invalid price: {x}")))
}
