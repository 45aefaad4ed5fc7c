//! Pagination driver: a lazy, finite, pull-based sequence of listing pages.
//!
//! [`PageCrawler`] walks the listing from page 1, fetching one page at a
//! time through a [`PageFetcher`] and yielding each page's annotated line
//! sequence. It buffers at most one page, stops on the first terminal
//! signal, and once stopped stays stopped — the sequence is not
//! restartable.
//!
//! Consumers pull with [`PageCrawler::next`], matching on
//! [`PageEvent::Page`] vs [`PageEvent::Stopped`]; the full-crawl dump and
//! the incremental sync share this driver.

use crate::fetch::{sleep_range_ms, PageFetch, PageFetcher};
use crate::listing::{build_page_url, extract_lines};
use std::fmt;
use tracing::{info, warn};

/// Randomized delay between listing-page fetches (ms).
pub const PAGE_DELAY_MS: (u64, u64) = (2_500, 10_000);

/// Why the page sequence ended.
#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    /// The site returned 404 for the requested page: the expected end of
    /// the listing.
    NotFound,
    /// The previous page carried no `Next` link.
    NoNextLink,
    /// A fetch failed (network error or unexpected HTTP status); abnormal
    /// stop with the last known status attached.
    FetchFailure { status: Option<u16> },
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::NotFound => write!(f, "reached 404, no more pages"),
            StopReason::NoNextLink => write!(f, "no Next link on page"),
            StopReason::FetchFailure { status: Some(s) } => write!(f, "fetch failed (HTTP {s})"),
            StopReason::FetchFailure { status: None } => write!(f, "fetch failed (no status)"),
        }
    }
}

/// One successfully fetched and flattened listing page.
#[derive(Debug)]
pub struct PageItem {
    pub page_number: u32,
    /// Annotated plain-text lines, in document order.
    pub lines: Vec<String>,
}

/// Tagged result of pulling the driver once.
#[derive(Debug)]
pub enum PageEvent {
    Page(PageItem),
    Stopped(StopReason),
}

/// The pagination state machine. Owns nothing but a cursor and the stop
/// state; pages are produced on demand.
pub struct PageCrawler<'a, F> {
    fetcher: &'a F,
    page_number: u32,
    /// Set when the page just yielded had no Next link; consumed by the
    /// following `next()` call.
    pending_stop: Option<StopReason>,
    stopped: Option<StopReason>,
    delay_ms: (u64, u64),
}

impl<'a, F: PageFetcher> PageCrawler<'a, F> {
    pub fn new(fetcher: &'a F) -> Self {
        Self::with_page_delay(fetcher, PAGE_DELAY_MS)
    }

    /// Like [`new`](Self::new) but with explicit inter-page delay bounds;
    /// tests pass `(0, 0)` to run without throttling.
    pub fn with_page_delay(fetcher: &'a F, delay_ms: (u64, u64)) -> Self {
        Self {
            fetcher,
            page_number: 1,
            pending_stop: None,
            stopped: None,
            delay_ms,
        }
    }

    fn stop(&mut self, reason: StopReason) -> PageEvent {
        self.stopped = Some(reason.clone());
        PageEvent::Stopped(reason)
    }

    /// Pull the next page. After the first `Stopped`, every further call
    /// returns the same `Stopped` reason.
    pub async fn next(&mut self) -> PageEvent {
        if let Some(reason) = self.stopped.clone() {
            return PageEvent::Stopped(reason);
        }
        if let Some(reason) = self.pending_stop.take() {
            info!(page = self.page_number - 1, "no Next link found; stopping");
            return self.stop(reason);
        }

        if self.page_number > 1 {
            sleep_range_ms(self.delay_ms).await;
        }

        let url = build_page_url(self.page_number);
        info!(%url, page = self.page_number, "scraping listing page");

        match self.fetcher.fetch_page(&url, self.page_number).await {
            PageFetch::NotFound => {
                info!(page = self.page_number, "reached 404; no more pages");
                self.stop(StopReason::NotFound)
            }
            PageFetch::Failed { status, reason } => {
                warn!(page = self.page_number, ?status, %reason, "stopping pagination on fetch failure");
                self.stop(StopReason::FetchFailure { status })
            }
            PageFetch::Content { body, .. } => {
                let (lines, has_next) = extract_lines(&body);
                if !has_next {
                    self.pending_stop = Some(StopReason::NoNextLink);
                }
                let page_number = self.page_number;
                self.page_number += 1;
                PageEvent::Page(PageItem { page_number, lines })
            }
        }
    }
}
