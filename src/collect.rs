use _model::PriceQuote;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use itertools::{Either, Itertools};
use log::{debug, error};
use rayon::{prelude::*, ThreadPoolBuilder};

use crate::config::{Credentials, ProductEntry};
use crate::http::Fetch;
use crate::retailers::{build_request, parse_response, Outcome, Unavailable};

pub struct Collection {
    pub quotes: Vec<PriceQuote>,
    pub failures: Vec<(ProductEntry, Unavailable)>,
}

fn progress_bar(len: u64) -> ProgressBar {
    ProgressBar::new(len).with_style(
        ProgressStyle::with_template("[{elapsed_precise}] {pos}/{len} packs {wide_msg}")
            .expect("hardcoded"),
    )
}

/// Fetches every entry on a pool of `concurrency` threads. Failed entries are
/// logged and returned separately, they never stop the others.
pub fn collect<F: Fetch + ?Sized>(
    fetch: &F,
    entries: &[ProductEntry],
    credentials: &Credentials,
    concurrency: usize,
) -> Result<Collection> {
    let pool = ThreadPoolBuilder::new()
        .num_threads(concurrency.max(1))
        .build()
        .context("Failed to start fetch pool")?;

    let pb = progress_bar(entries.len() as u64);
    let outcomes: Vec<_> = pool.install(|| {
        entries
            .par_iter()
            .map(|entry| {
                let outcome = fetch_one(fetch, entry, credentials);
                pb.set_message(entry.retailer.clone());
                pb.inc(1);
                (entry, outcome)
            })
            .collect()
    });
    pb.finish_and_clear();

    let (quotes, failures): (Vec<_>, Vec<_>) = outcomes
        .into_iter()
        .partition_map(|(entry, outcome)| match outcome {
            Ok(quote) => Either::Left(quote),
            Err(e) => {
                error!(
                    "Failed to fetch {} {}x ({} {}): {e}",
                    entry.retailer, entry.pack_size, entry.source, entry.product_id
                );
                Either::Right((entry.clone(), e))
            }
        });

    Ok(Collection { quotes, failures })
}

pub fn fetch_one<F: Fetch + ?Sized>(
    fetch: &F,
    entry: &ProductEntry,
    credentials: &Credentials,
) -> Outcome {
    debug!("Fetching {} {}x", entry.retailer, entry.pack_size);
    let request = build_request(entry, credentials)?;
    debug!("{} {} {:?}", request.method, request.url, request.query);
    let body = fetch.fetch(&request)?;
    parse_response(entry, &body)
}
