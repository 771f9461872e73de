use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use typed_floats::tf64::PositiveFinite;

/// One normalized price, produced for each entry that was fetched successfully.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub retailer: String,
    pub suburb: String,
    pub pack_size: u32,
    pub price_total: PositiveFinite,
    pub price_unit: PositiveFinite,
    pub checked_at: i64,
    pub url: String,
}

/// The document written at the end of every run. Replaces the previous one
/// wholesale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub updated_at: i64,
    pub items: Vec<PriceQuote>,
}

impl Snapshot {
    pub fn new(updated_at: i64, items: Vec<PriceQuote>) -> Self {
        Self { updated_at, items }
    }

    /// Cheapest quote for a pack size, which is what the display page shows.
    pub fn cheapest(&self, pack_size: u32) -> Option<&PriceQuote> {
        self.items
            .iter()
            .filter(|x| x.pack_size == pack_size)
            .min_by(|a, b| a.price_total.get().total_cmp(&b.price_total.get()))
    }

    pub fn pack_sizes(&self) -> BTreeSet<u32> {
        self.items.iter().map(|x| x.pack_size).collect()
    }
}

pub fn round_cents(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
