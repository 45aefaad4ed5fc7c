//! # AlphaStreet Transcripts Scraper
//!
//! Incrementally crawls the AlphaStreet India transcripts listing,
//! extracts article/transcript links into a CSV store, and fetches each
//! linked page's full text with resumable progress tracking.
//!
//! ## Operations
//!
//! ```sh
//! alphastreet_transcripts --crawl              # full crawl to webpage_content.txt
//! alphastreet_transcripts --csv                # parse the dump to transcripts.csv
//! alphastreet_transcripts --crawl-new          # incremental update of transcripts.csv
//! alphastreet_transcripts --fetch-transcripts  # fetch pending full texts
//! ```
//!
//! ## Architecture
//!
//! A pull-based pagination driver feeds annotated page lines to either the
//! raw-dump writer or the incremental sync engine; the resumable fetch
//! queue works through the CSV store one URL at a time, persisting its
//! outcome map after every attempt. Everything runs strictly sequentially
//! with randomized throttling delays between requests.

use clap::{CommandFactory, Parser};
use std::error::Error;
use tracing::{debug, info};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod crawl;
mod fetch;
mod listing;
mod models;
mod pagination;
mod store;
mod sync;
mod transcripts;

use cli::Cli;
use fetch::HttpFetcher;
use pagination::PageCrawler;
use transcripts::ArticleFetcher;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();

    let args = Cli::parse();
    debug!(?args, "parsed CLI arguments");

    if !args.operation_selected() {
        Cli::command().print_help()?;
        return Ok(());
    }

    if args.crawl {
        let fetcher = HttpFetcher::new()?;
        crawl::crawl_to_file(PageCrawler::new(&fetcher), &args.raw_file).await?;
    }

    if args.csv {
        crawl::parse_to_csv(&args.raw_file, &args.csv_file)?;
    }

    if args.fetch_transcripts {
        let fetcher = ArticleFetcher::new()?;
        transcripts::fetch_pending(&fetcher, &args.csv_file, &args.progress_file, &args.data_dir)
            .await?;
    }

    if args.crawl_new {
        let fetcher = HttpFetcher::new()?;
        sync::update_entries(PageCrawler::new(&fetcher), &args.csv_file).await?;
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        "execution complete"
    );
    Ok(())
}
