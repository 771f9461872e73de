use anyhow::{Context, Result};
use serde::Deserialize;

use super::{amount, Amount, RawPrice, Unavailable};
use crate::config::{Credentials, ProductEntry, COLES_API_KEY};
use crate::http::Request;

const API: &str = "https://api.coles.com.au/product/v1/productdetail";
const KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

pub fn request(entry: &ProductEntry, credentials: &Credentials) -> Result<Request, Unavailable> {
    let key = credentials.coles_api_key.as_deref().ok_or_else(|| {
        Unavailable::Request(format!(
            "Coles API key missing. Set {COLES_API_KEY} or credentials.coles_api_key"
        ))
    })?;

    Ok(Request::get(format!("{API}/{}", entry.product_id))
        .queries(&entry.extra)
        .headers(&entry.headers)
        .header(KEY_HEADER, key))
}

pub fn extract(body: &str) -> Result<RawPrice> {
    let item: Item = serde_json::from_str(body).context("Failed to parse Coles response")?;
    let nested = item.product.and_then(|x| x.price);
    let flat = item.product_price;

    let (nested_total, nested_unit) = split(nested);
    let (flat_total, flat_unit) = split(flat);
    Ok(RawPrice {
        total: amount(nested_total.or(flat_total)),
        unit: amount(nested_unit.or(flat_unit)),
    })
}

fn split(x: Option<Pricing>) -> (Option<Amount>, Option<Amount>) {
    x.map(|x| (x.current, x.unit)).unwrap_or_default()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Item {
    product: Option<Product>,
    product_price: Option<Pricing>,
}

#[derive(Debug, Deserialize)]
struct Product {
    price: Option<Pricing>,
}

#[derive(Debug, Deserialize)]
struct Pricing {
    current: Option<Amount>,
    unit: Option<Amount>,
}
