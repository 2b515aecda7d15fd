mod config;
mod dom;
mod errors;
mod events;
mod extract;
mod models;
mod pipeline;
mod query;
mod report;
mod scraper;
mod site;
mod utils;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::AppConfig;
use crate::events::tokenize;
use crate::pipeline::Pipeline;
use crate::query::{available_for, lowest_price_for};
use crate::scraper::extract_records;
use crate::site::adapter_for;

#[derive(Parser)]
#[command(name = "price-scout", about = "Lowest in-stock price finder for retailer search pages", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Search every term and write one result line per term
    Search {
        /// Terms to search (default: search.terms from config)
        terms: Vec<String>,

        /// Output file (default: search.output_path from config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write JSON instead of tab-separated lines
        #[arg(long)]
        json: bool,
    },

    /// Extract products from a saved results page
    Extract {
        #[arg(short, long)]
        file: PathBuf,

        /// Term to rank matches against
        #[arg(short, long)]
        term: String,

        #[arg(long)]
        json: bool,
    },

    /// Print the open/close/text events of a saved page
    Tokens {
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Print the search URL for a term
    Url { term: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "price_scout=info,warn",
        1 => "price_scout=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::new(filter))
        .init();

    let config = AppConfig::load()?;

    match cli.command {
        Command::Search { terms, output, json } => {
            let _t = utils::Timer::start("Price search");
            let terms = if terms.is_empty() {
                config.search.terms.clone()
            } else {
                terms
            };
            let output = output.unwrap_or_else(|| config.search.output_path.clone());

            let (reports, stats) = Pipeline::new(config).run(&terms).await?;
            report::save(&output, &reports, json)?;
            info!(
                "Done: {} terms | {} completed | {} skipped | {} failed | {} records",
                stats.terms, stats.completed, stats.skipped, stats.failed, stats.records
            );
        }

        Command::Extract { file, term, json } => {
            let markup = std::fs::read_to_string(&file)
                .with_context(|| format!("Could not read {:?}", file))?;
            let site = adapter_for(&config.site)?;
            let records = extract_records(site.as_ref(), &markup)?;
            let hits = available_for(&records, site.as_ref(), &term)?;
            let best = lowest_price_for(&records, site.as_ref(), &term)?;

            if json {
                let doc = serde_json::json!({
                    "records": records,
                    "available": hits,
                    "lowest": best,
                });
                println!("{}", serde_json::to_string_pretty(&doc)?);
            } else {
                println!("{} records, {} available for '{}'", records.len(), hits.len(), term);
                for r in &records {
                    println!(
                        "  {:<60} {:>10} {}",
                        r.title.as_deref().unwrap_or("-"),
                        r.price.map(|p| format!("${p:.2}")).unwrap_or_default(),
                        if r.is_in_stock() { "in stock" } else { "" }
                    );
                }
                println!("Lowest: {}", best.columns().join("\t"));
            }
        }

        Command::Tokens { file } => {
            let markup = std::fs::read_to_string(&file)
                .with_context(|| format!("Could not read {:?}", file))?;
            let site = adapter_for(&config.site)?;
            tokenize::<_, std::convert::Infallible>(&markup, site.void_tags(), |event| {
                println!("{event}");
                Ok(())
            })?;
        }

        Command::Url { term } => {
            let site = adapter_for(&config.site)?;
            println!("{}", site.search_url(&term)?);
        }
    }

    Ok(())
}
