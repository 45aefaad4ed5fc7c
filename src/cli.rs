//! Command-line interface definitions.
//!
//! Each operation is an independent flag, mirroring how the scraper is
//! driven from cron: a run can combine several (they execute in the order
//! crawl → csv → fetch-transcripts → crawl-new), and a run selecting none
//! prints usage and does nothing.

use clap::Parser;

/// Command-line arguments for the AlphaStreet transcripts scraper.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Run a full crawl of the listing into the raw dump file
    #[arg(long)]
    pub crawl: bool,

    /// Parse the raw dump file into the CSV entry store
    #[arg(long)]
    pub csv: bool,

    /// Fetch full text for stored links with no recorded outcome
    #[arg(long)]
    pub fetch_transcripts: bool,

    /// Incremental update: paginate until a known link, prepend new entries
    #[arg(long)]
    pub crawl_new: bool,

    /// Raw dump file written by --crawl and read by --csv
    #[arg(long, default_value = "webpage_content.txt")]
    pub raw_file: String,

    /// CSV entry store
    #[arg(long, default_value = "transcripts.csv")]
    pub csv_file: String,

    /// JSON progress store used by --fetch-transcripts
    #[arg(long, default_value = "progress.json")]
    pub progress_file: String,

    /// Directory for fetched transcript text files
    #[arg(long, default_value = "transcripts_data")]
    pub data_dir: String,
}

impl Cli {
    /// True when at least one operation flag was given.
    pub fn operation_selected(&self) -> bool {
        self.crawl || self.csv || self.fetch_transcripts || self.crawl_new
    }
}
