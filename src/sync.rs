//! Incremental sync: bring the entry store up to date without re-scraping
//! the whole listing.
//!
//! The listing is newest-first, so the first already-known link proves
//! everything after it is known too: parsing of the current page stops
//! there, no further pages are fetched, and the entries found before the
//! stop are merged ahead of the existing rows.

use crate::fetch::PageFetcher;
use crate::listing::parse_entry;
use crate::models::ListingEntry;
use crate::pagination::{PageCrawler, PageEvent, StopReason};
use crate::store::EntryStore;
use std::collections::HashSet;
use std::error::Error;
use tracing::{info, warn};

/// Run an incremental update of the entry store at `csv_path`.
///
/// A missing store means a fresh file: the run degrades to a full crawl.
/// A fetch failure from the driver aborts the run, but the entries
/// accumulated so far are still merged in — partial progress is kept,
/// without any completeness flag in the store. If no new entries were
/// found, the file is left untouched.
pub async fn update_entries<F: PageFetcher>(
    mut crawler: PageCrawler<'_, F>,
    csv_path: &str,
) -> Result<(), Box<dyn Error>> {
    let mut store = EntryStore::load(csv_path)?;
    let known = store.links();
    info!(known = known.len(), %csv_path, "starting incremental update");

    let new_entries = collect_new_entries(&mut crawler, &known).await;

    if new_entries.is_empty() {
        info!("no new transcript links found");
        return Ok(());
    }

    let added = new_entries.len();
    store.prepend(new_entries);
    store.save(csv_path)?;
    info!(added, total = store.len(), %csv_path, "entry store updated");
    Ok(())
}

/// Walk pages through the driver, collecting entries until a known link or
/// the driver's own termination. Entries found on the stopping page before
/// the known link are kept.
async fn collect_new_entries<F: PageFetcher>(
    crawler: &mut PageCrawler<'_, F>,
    known: &HashSet<String>,
) -> Vec<ListingEntry> {
    let mut new_entries = Vec::new();

    loop {
        match crawler.next().await {
            PageEvent::Page(page) => {
                let mut page_new = Vec::new();
                let mut seen_known = false;

                for index in 0..page.lines.len() {
                    let Some(entry) = parse_entry(&page.lines, index, page.page_number) else {
                        continue;
                    };
                    if known.contains(&entry.link) {
                        info!(page = page.page_number, link = %entry.link, "found existing URL");
                        seen_known = true;
                        break;
                    }
                    page_new.push(entry);
                }

                info!(
                    page = page.page_number,
                    count = page_new.len(),
                    "new entries on page"
                );
                new_entries.extend(page_new);

                if seen_known {
                    info!("stopping pagination; newer entries collected");
                    break;
                }
            }
            PageEvent::Stopped(StopReason::FetchFailure { status }) => {
                // Page coverage up to here is ambiguous; keep what we have
                // and let the next run re-check from page 1.
                warn!(?status, "update aborted by fetch failure; keeping partial progress");
                break;
            }
            PageEvent::Stopped(reason) => {
                info!(%reason, "pagination finished");
                break;
            }
        }
    }

    new_entries
}
