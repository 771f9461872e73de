use std::path::{Path, PathBuf};

use _model::{Snapshot, Source};
use anyhow::{Context, Result};
use chrono::Utc;
use log::{info, warn};

use crate::{collect::collect, config, http::Fetch, snapshot};

pub struct Options {
    pub config: PathBuf,
    pub output: PathBuf,
    pub concurrency: usize,
    /// Only fetch these sources. Empty means all of them.
    pub sources: Vec<Source>,
}

/// One full batch: load config, fetch every pack, replace the snapshot.
/// Only config and write problems are errors; failed packs are just logged.
pub fn run<F: Fetch + ?Sized>(options: &Options, fetch: &F) -> Result<Snapshot> {
    let config = config::load(&options.config)?;
    let credentials = config.credentials.with_env();

    let packs: Vec<_> = config
        .packs
        .into_iter()
        .filter(|x| options.sources.is_empty() || options.sources.contains(&x.source))
        .collect();
    if packs.is_empty() {
        warn!("No packs match sources {:?}", options.sources);
    }

    info!("Checking {} packs with {} workers", packs.len(), options.concurrency);
    let collection = collect(fetch, &packs, &credentials, options.concurrency)?;
    if collection.quotes.is_empty() {
        warn!("No pricing data collected");
    }

    let snapshot = Snapshot::new(Utc::now().timestamp(), collection.quotes);
    write(&options.output, &snapshot)?;
    info!(
        "Wrote {} price rows to {} ({} failed)",
        snapshot.items.len(),
        options.output.display(),
        collection.failures.len()
    );

    Ok(snapshot)
}

fn write(path: &Path, snapshot: &Snapshot) -> Result<()> {
    snapshot::write(path, snapshot)
        .with_context(|| format!("Failed to write snapshot {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::{
        fs::{read_to_string, write as write_file},
        sync::atomic::Ordering,
    };

    use super::*;
    use crate::collect::tests::FakeFetch;

    const CONFIG: &str = r#"{
        "packs": [
            {"retailer": "BWS", "suburb": "Newtown", "pack_size": 4, "source": "bws",
             "product_id": "1", "url": "https://bws.com.au/product/1"},
            {"retailer": "Woolworths", "suburb": "Newtown", "pack_size": 4, "source": "woolworths",
             "product_id": "2", "url": "https://www.woolworths.com.au/shop/productdetails/2"},
            {"retailer": "Liquorland", "suburb": "Glebe", "pack_size": 10, "source": "liquorland",
             "product_id": "3", "url": "https://www.liquorland.com.au/beer/3"}
        ]
    }"#;

    fn fetch() -> FakeFetch {
        FakeFetch::default()
            .with(
                "https://bws.com.au/api/products/1",
                Ok(r#"{"price": {"current": "24.00"}}"#),
            )
            .with(
                "https://www.woolworths.com.au/apis/ui/products/2",
                Ok(r#"{"ProductDetail": {"Price": {"FinalPrice": 19.5}}}"#),
            )
            .with("https://api.liquorland.com.au/graphql", Err(500))
    }

    fn options(dir: &Path) -> Options {
        Options {
            config: dir.join("config.json"),
            output: dir.join("data/prices.json"),
            concurrency: 2,
            sources: Vec::new(),
        }
    }

    #[test]
    fn batch_writes_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path().join("config.json"), CONFIG).unwrap();
        let options = options(dir.path());

        let first = run(&options, &fetch()).unwrap();
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.cheapest(4).unwrap().retailer, "Woolworths");
        assert!(first.cheapest(10).is_none());

        let on_disk: Snapshot =
            serde_json::from_str(&read_to_string(&options.output).unwrap()).unwrap();
        assert_eq!(on_disk, first);

        // same responses, same document apart from timestamps
        let mut second = run(&options, &fetch()).unwrap();
        second.updated_at = first.updated_at;
        for (a, b) in second.items.iter_mut().zip(&first.items) {
            a.checked_at = b.checked_at;
        }
        assert_eq!(second, first);
    }

    #[test]
    fn no_successes_still_writes() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path().join("config.json"), CONFIG).unwrap();
        let options = options(dir.path());

        let snapshot = run(&options, &FakeFetch::default()).unwrap();
        assert!(snapshot.items.is_empty());
        assert!(snapshot.updated_at > 0);

        let raw: serde_json::Value =
            serde_json::from_str(&read_to_string(&options.output).unwrap()).unwrap();
        assert_eq!(raw["items"], serde_json::json!([]));
        assert!(raw["updated_at"].is_i64());
    }

    #[test]
    fn bad_config_aborts_before_fetching() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path().join("config.json"),
            CONFIG.replacen("\"pack_size\": 4", "\"pack_size\": \"four\"", 1),
        )
        .unwrap();
        let options = options(dir.path());
        let fetch = fetch();

        assert!(run(&options, &fetch).is_err());
        assert_eq!(fetch.calls.load(Ordering::SeqCst), 0);
        assert!(!options.output.exists());
    }

    #[test]
    fn source_filter() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path().join("config.json"), CONFIG).unwrap();
        let mut options = options(dir.path());
        options.sources = vec![Source::Bws];

        let fetch = fetch();
        let snapshot = run(&options, &fetch).unwrap();
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(
            *fetch.seen.lock().unwrap(),
            vec!["https://bws.com.au/api/products/1".to_string()]
        );
    }
}
