//! Full crawl to a raw text dump, and bulk parsing of that dump into the
//! CSV entry store.
//!
//! The two halves are deliberately separable operations: `--crawl` walks
//! every listing page and appends its annotated lines to
//! `webpage_content.txt` under `--- PAGE N ---` markers; `--csv` re-reads
//! that dump offline and extracts every entry. Parsing the same dump twice
//! produces byte-identical CSV output.

use crate::fetch::PageFetcher;
use crate::listing::parse_entry;
use crate::models::ListingEntry;
use crate::pagination::{PageCrawler, PageEvent};
use crate::store::EntryStore;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{error, info};

static PAGE_MARKER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n--- PAGE (\d+) ---\n").unwrap());

/// Run a full crawl and write every page's annotated lines to
/// `output_file`, truncating any previous dump.
pub async fn crawl_to_file<F: PageFetcher>(
    mut crawler: PageCrawler<'_, F>,
    output_file: &str,
) -> Result<(), Box<dyn Error>> {
    info!(%output_file, "starting full crawl to file");
    let mut file = File::create(output_file).await?;

    loop {
        match crawler.next().await {
            PageEvent::Page(page) => {
                let section =
                    format!("\n--- PAGE {} ---\n{}", page.page_number, page.lines.join("\n"));
                file.write_all(section.as_bytes()).await?;
            }
            PageEvent::Stopped(reason) => {
                info!(%reason, "pagination stopped");
                break;
            }
        }
    }

    file.flush().await?;
    info!(%output_file, "crawl to file complete");
    Ok(())
}

/// Parse a raw crawl dump into entries, in page order then line order.
pub fn parse_dump(content: &str) -> Vec<ListingEntry> {
    let mut all_entries = Vec::new();

    for (page_number, section) in split_pages(content) {
        let lines: Vec<String> = section.split('\n').map(str::to_string).collect();
        let mut page_entries = Vec::new();
        for index in 0..lines.len() {
            if let Some(entry) = parse_entry(&lines, index, page_number) {
                page_entries.push(entry);
            }
        }
        if page_entries.is_empty() {
            info!(page = page_number, "found 0 links on page");
        }
        all_entries.extend(page_entries);
    }

    all_entries
}

/// Split a dump into `(page_number, section)` pairs on the page markers.
/// Text before the first marker is ignored.
fn split_pages(content: &str) -> Vec<(u32, &str)> {
    let marks: Vec<(usize, usize, u32)> = PAGE_MARKER_RE
        .captures_iter(content)
        .filter_map(|caps| {
            let m = caps.get(0)?;
            let page_number = caps[1].parse().ok()?;
            Some((m.start(), m.end(), page_number))
        })
        .collect();

    marks
        .iter()
        .enumerate()
        .map(|(i, &(_, body_start, page_number))| {
            let body_end = marks.get(i + 1).map(|m| m.0).unwrap_or(content.len());
            (page_number, &content[body_start..body_end])
        })
        .collect()
}

/// Parse the raw dump at `input_file` and rewrite `output_csv` with every
/// extracted entry. A missing dump is reported and skipped, not an error.
pub fn parse_to_csv(input_file: &str, output_csv: &str) -> Result<(), Box<dyn Error>> {
    if !Path::new(input_file).exists() {
        error!(%input_file, "raw dump does not exist; run the crawler first");
        return Ok(());
    }

    info!(%input_file, %output_csv, "parsing raw dump to CSV");
    let content = std::fs::read_to_string(input_file)?;
    let entries = parse_dump(&content);

    if entries.is_empty() {
        info!("no links found in the source file");
        return Ok(());
    }

    let count = entries.len();
    EntryStore::from_entries(entries).save(output_csv)?;
    info!(count, %output_csv, "aggregation complete");
    Ok(())
}
