use anyhow::{Context, Result};
use serde::Deserialize;

use super::{amount, Amount, RawPrice};
use crate::config::ProductEntry;
use crate::http::Request;

const API: &str = "https://api.danmurphys.com.au/apis/ui/product/v3/detail";
const ONLINE_STORE: &str = "DMONLINE";

pub fn request(entry: &ProductEntry) -> Request {
    Request::get(format!("{API}/{}", entry.product_id))
        .query("storeId", entry.store_id.as_deref().unwrap_or(ONLINE_STORE))
        .queries(&entry.extra)
        .headers(&entry.headers)
}

pub fn extract(body: &str) -> Result<RawPrice> {
    let item: Item = serde_json::from_str(body).context("Failed to parse Dan Murphy's response")?;

    // some responses wrap the product in a list
    let pricing = item
        .price
        .or_else(|| item.products.into_iter().flatten().next()?.price)
        .context("Unable to locate price data")?;

    Ok(RawPrice {
        total: amount(
            pricing
                .final_price
                .or(pricing.price)
                .or(pricing.sale_price),
        ),
        unit: amount(pricing.unit_price.or(pricing.cup_price)),
    })
}

#[derive(Debug, Deserialize)]
struct Item {
    #[serde(rename = "Price", alias = "price")]
    price: Option<Pricing>,
    #[serde(rename = "Products", alias = "products")]
    products: Option<Vec<Product>>,
}

#[derive(Debug, Deserialize)]
struct Product {
    #[serde(rename = "Price", alias = "price")]
    price: Option<Pricing>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Pricing {
    final_price: Option<Amount>,
    price: Option<Amount>,
    sale_price: Option<Amount>,
    unit_price: Option<Amount>,
    cup_price: Option<Amount>,
}
