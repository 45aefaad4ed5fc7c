//! HTTP fetch collaborator for listing pages.
//!
//! Stands in for the browser session the listing crawl runs through: a
//! single [`reqwest::Client`] with a desktop-browser user agent, acquired
//! once per run. Fetches are strictly sequential; all waiting here is
//! deliberate throttling, not contention.
//!
//! The [`PageFetcher`] trait is the seam the pagination driver pulls pages
//! through, so driver and sync logic can be exercised against canned pages
//! in tests.

use rand::{rng, Rng};
use reqwest::Client;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// User agent presented to the site. Matches a current desktop Chrome so
/// the listing serves the same markup it serves a regular visitor.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

/// Pause after a transient fetch error before reporting it upward.
const ERROR_PAUSE: Duration = Duration::from_secs(5);

/// Randomized settle delay after each successful page load (ms).
const SETTLE_MS: (u64, u64) = (2_000, 4_000);

/// Result of fetching one listing page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageFetch {
    /// Page fetched; body ready for extraction.
    Content { status: u16, body: String },
    /// The site returned 404: the expected, clean end of pagination.
    NotFound,
    /// Network error or unexpected HTTP status. `status` is the last known
    /// HTTP status, if any.
    Failed { status: Option<u16>, reason: String },
}

/// Something that can fetch listing pages for the pagination driver.
pub trait PageFetcher {
    async fn fetch_page(&self, url: &str, page_number: u32) -> PageFetch;
}

/// Sleep a random duration within `range` milliseconds. A zeroed upper
/// bound skips the sleep entirely (used by tests).
pub async fn sleep_range_ms(range: (u64, u64)) {
    let (lo, hi) = range;
    if hi == 0 {
        return;
    }
    let ms: u64 = rng().random_range(lo..=hi);
    sleep(Duration::from_millis(ms)).await;
}

/// Listing-page fetcher backed by a shared HTTP client.
pub struct HttpFetcher {
    client: Client,
    settle_ms: (u64, u64),
}

impl HttpFetcher {
    /// Build the fetcher with a 30-second request timeout.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            settle_ms: SETTLE_MS,
        })
    }
}

impl PageFetcher for HttpFetcher {
    /// Fetch one listing page.
    ///
    /// - 404 maps to [`PageFetch::NotFound`] (terminal, not an error)
    /// - any other non-success status maps to [`PageFetch::Failed`]
    /// - a network error is logged, followed by a fixed 5-second pause, and
    ///   reported as [`PageFetch::Failed`] with no status; there is no
    ///   automatic retry — the caller decides whether to advance or abort
    /// - on success a short randomized settle delay bounds the request rate
    async fn fetch_page(&self, url: &str, page_number: u32) -> PageFetch {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(page_number, %url, error = %e, "error fetching page; pausing 5s");
                sleep(ERROR_PAUSE).await;
                return PageFetch::Failed {
                    status: None,
                    reason: e.to_string(),
                };
            }
        };

        let status = response.status().as_u16();
        if status == 404 {
            return PageFetch::NotFound;
        }
        if !response.status().is_success() {
            return PageFetch::Failed {
                status: Some(status),
                reason: format!("HTTP {status}"),
            };
        }

        match response.text().await {
            Ok(body) => {
                info!(page_number, status, bytes = body.len(), "fetched listing page");
                sleep_range_ms(self.settle_ms).await;
                PageFetch::Content { status, body }
            }
            Err(e) => {
                warn!(page_number, %url, error = %e, "error reading page body; pausing 5s");
                sleep(ERROR_PAUSE).await;
                PageFetch::Failed {
                    status: None,
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_fetcher() -> HttpFetcher {
        HttpFetcher {
            client: Client::new(),
            settle_ms: (0, 0),
        }
    }

    #[tokio::test]
    async fn test_fetch_page_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/listing"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let fetcher = test_fetcher();
        let result = fetcher
            .fetch_page(&format!("{}/listing", server.uri()), 1)
            .await;
        assert_eq!(
            result,
            PageFetch::Content {
                status: 200,
                body: "<html>ok</html>".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_fetch_page_not_found_is_terminal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = test_fetcher();
        let result = fetcher.fetch_page(&server.uri(), 99).await;
        assert_eq!(result, PageFetch::NotFound);
    }

    #[tokio::test]
    async fn test_fetch_page_unexpected_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = test_fetcher();
        match fetcher.fetch_page(&server.uri(), 1).await {
            PageFetch::Failed { status, reason } => {
                assert_eq!(status, Some(503));
                assert_eq!(reason, "HTTP 503");
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }
}
