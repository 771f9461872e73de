use std::{path::PathBuf, time::Duration};

use _model::{Snapshot, Source};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use itertools::Itertools;

mod collect;
mod config;
mod http;
mod retailers;
mod run;
mod snapshot;

#[derive(Debug, Parser)]
#[command(about = "Collects the cheapest pack prices across retailers")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch every configured pack and replace the snapshot
    Run {
        #[arg(long, default_value = "config.json")]
        config: PathBuf,
        #[arg(long, default_value = "data/prices.json")]
        output: PathBuf,
        /// Requests in flight at once
        #[arg(long, default_value_t = 4)]
        concurrency: usize,
        /// Per-request timeout in seconds
        #[arg(long, default_value_t = 20)]
        timeout: u64,
        /// Only fetch packs from these sources
        #[arg(long = "source", value_enum)]
        sources: Vec<Source>,
    },
    /// Validate the config without fetching anything
    Check {
        #[arg(long, default_value = "config.json")]
        config: PathBuf,
    },
    /// Show the cheapest pack of a size from a snapshot file or url
    Cheapest {
        #[arg(long)]
        pack_size: u32,
        #[arg(long = "snapshot", default_value = "data/prices.json")]
        location: String,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            config,
            output,
            concurrency,
            timeout,
            sources,
        } => {
            let agent = http::agent(Duration::from_secs(timeout));
            let options = run::Options {
                config,
                output,
                concurrency,
                sources,
            };
            run::run(&options, &agent)?;
        }
        Command::Check { config } => {
            let config = config::load(&config)?;
            for x in &config.packs {
                println!(
                    "{:<12} {:>3}x {} {} [{}]",
                    x.source, x.pack_size, x.retailer, x.suburb, x.product_id
                );
            }
            println!("{} packs ok", config.packs.len());
        }
        Command::Cheapest {
            pack_size,
            location,
        } => {
            let agent = http::agent(Duration::from_secs(20));
            let snapshot = snapshot::load(&location, &agent).context("Unable to load pricing")?;
            println!("{}", cheapest(&snapshot, pack_size));
        }
    }

    Ok(())
}

fn cheapest(snapshot: &Snapshot, pack_size: u32) -> String {
    match snapshot.cheapest(pack_size) {
        Some(x) => format!(
            "{} {} {}x ${:.2} (${:.2} each) {}",
            x.retailer,
            x.suburb,
            x.pack_size,
            x.price_total.get(),
            x.price_unit.get(),
            x.url
        ),
        None if snapshot.items.is_empty() => "No live pricing".to_string(),
        None => format!(
            "No live pricing for {pack_size}x, available: {}",
            snapshot.pack_sizes().iter().join(", ")
        ),
    }
}
