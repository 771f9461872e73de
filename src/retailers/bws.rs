use anyhow::{Context, Result};
use serde::Deserialize;

use super::{amount, Amount, RawPrice};
use crate::config::ProductEntry;
use crate::http::Request;

const ORIGIN: &str = "https://bws.com.au";

pub fn request(entry: &ProductEntry) -> Request {
    Request::get(format!("{ORIGIN}/api/products/{}", entry.product_id))
        .queries(&entry.extra)
        .headers(&entry.headers)
        .default_header("Referer", format!("{ORIGIN}/"))
        .default_header("Origin", ORIGIN)
}

pub fn extract(body: &str) -> Result<RawPrice> {
    let item: Item = serde_json::from_str(body).context("Failed to parse BWS response")?;

    Ok(match item.price {
        Some(Price::Amount(x)) => RawPrice {
            total: Some(x.0),
            unit: None,
        },
        Some(Price::Detail(x)) => RawPrice {
            total: amount(x.current.or(x.actual_price)),
            unit: amount(x.per_item.or(x.cup_price)),
        },
        None => RawPrice::default(),
    })
}

#[derive(Debug, Deserialize)]
struct Item {
    #[serde(alias = "Price")]
    price: Option<Price>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Price {
    Amount(Amount),
    Detail(Pricing),
}

#[derive(Debug, Deserialize)]
struct Pricing {
    current: Option<Amount>,
    #[serde(rename = "ActualPrice")]
    actual_price: Option<Amount>,
    #[serde(rename = "perItem")]
    per_item: Option<Amount>,
    #[serde(rename = "CupPrice")]
    cup_price: Option<Amount>,
}
