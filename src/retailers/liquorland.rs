//! Liquorland and First Choice share one GraphQL API.

use _model::Source;
use anyhow::{bail, Result};
use itertools::Itertools;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{amount, Amount, RawPrice};
use crate::config::ProductEntry;
use crate::http::Request;

const API: &str = "https://api.liquorland.com.au/graphql";

const QUERY: &str = "query ProductPricing($id: String!) { \
    product(productId: $id) { pricing { current } cupPrice } }";

fn origin(source: Source) -> &'static str {
    match source {
        Source::FirstChoice => "https://www.firstchoiceliquor.com.au",
        _ => "https://www.liquorland.com.au",
    }
}

pub fn request(entry: &ProductEntry) -> Request {
    let mut variables: Map<String, Value> = entry
        .extra
        .iter()
        .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
        .collect();
    variables.insert("id".to_string(), Value::from(entry.product_id.as_str()));

    let origin = origin(entry.source);
    Request::post_json(API, json!({ "query": QUERY, "variables": variables }))
        .headers(&entry.headers)
        .default_header("Origin", origin)
        .default_header("Referer", format!("{origin}/"))
}

pub fn extract(body: &str) -> Result<RawPrice> {
    let response: Response = serde_json::from_str(body)?;

    let product = match response.data.and_then(|x| x.product) {
        Some(x) => x,
        None if !response.errors.is_empty() => bail!(
            "GraphQL errors: {}",
            response.errors.iter().map(|x| &x.message).join("; ")
        ),
        None => bail!("Liquorland API missing product node"),
    };

    Ok(RawPrice {
        total: amount(product.pricing.and_then(|x| x.current)),
        unit: amount(product.cup_price),
    })
}

#[derive(Debug, Deserialize)]
struct Response {
    data: Option<Data>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct Data {
    product: Option<Product>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Product {
    pricing: Option<Pricing>,
    cup_price: Option<Amount>,
}

#[derive(Debug, Deserialize)]
struct Pricing {
    current: Option<Amount>,
}
