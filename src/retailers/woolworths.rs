use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use super::{amount, Amount, RawPrice};
use crate::config::ProductEntry;
use crate::http::Request;

const API: &str = "https://www.woolworths.com.au/apis/ui/products";

pub fn request(entry: &ProductEntry) -> Request {
    Request::get(format!("{API}/{}", entry.product_id))
        .queries(&entry.extra)
        .headers(&entry.headers)
}

pub fn extract(body: &str) -> Result<RawPrice> {
    let mut value: Value =
        serde_json::from_str(body).context("Failed to parse Woolworths response")?;
    // the root only describes the product when there is no detail node
    let detail = value.get_mut("ProductDetail").map(Value::take);
    let product: Product = match detail {
        Some(detail) if !detail.is_null() => {
            serde_json::from_value(detail).context("Invalid ProductDetail")?
        }
        _ => serde_json::from_value(value).context("Invalid product")?,
    };

    Ok(match product.price {
        Some(Price::Amount(x)) => RawPrice {
            total: Some(x.0),
            unit: amount(product.cup_price),
        },
        Some(Price::Detail(x)) => RawPrice {
            total: amount(x.final_price.or(x.sale_price)),
            unit: amount(x.cup_price.or(product.cup_price)),
        },
        None => RawPrice {
            total: None,
            unit: amount(product.cup_price),
        },
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Product {
    price: Option<Price>,
    cup_price: Option<Amount>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Price {
    Amount(Amount),
    Detail(Pricing),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Pricing {
    final_price: Option<Amount>,
    sale_price: Option<Amount>,
    cup_price: Option<Amount>,
}
