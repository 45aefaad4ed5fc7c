//! Resumable full-text fetching of individual transcript/article pages.
//!
//! Targets come from the CSV entry store; outcomes are recorded per URL in
//! the progress store. Only URLs with no recorded outcome are attempted —
//! a prior failure is as final as a success, and retrying one means
//! editing `progress.json`. The progress map is flushed to disk after
//! every attempt, so an interrupted run resumes where it left off, losing
//! at most the in-flight URL.

use crate::fetch::{sleep_range_ms, BROWSER_USER_AGENT};
use crate::models::FetchOutcome;
use crate::store::{EntryStore, ProgressStore};
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};
use url::Url;

/// Randomized delay between article fetches (ms).
const FETCH_DELAY_MS: (u64, u64) = (4_000, 10_000);

/// Randomized "reading time" after each successful page load (ms).
const READ_DELAY_MS: (u64, u64) = (3_000, 8_000);

static BODY_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("body").unwrap());

/// HTTP client for individual article pages. Articles are heavier than
/// listing pages, hence the generous timeout.
pub struct ArticleFetcher {
    client: Client,
    settle_ms: (u64, u64),
    delay_ms: (u64, u64),
}

impl ArticleFetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            settle_ms: READ_DELAY_MS,
            delay_ms: FETCH_DELAY_MS,
        })
    }
}

/// Fetch full text for every stored link with no recorded outcome.
///
/// Outcomes (success with artifact path, or failure with reason) are
/// written through the progress store after each attempt; progress-store
/// write failures are fatal. A missing CSV store is reported and skipped.
pub async fn fetch_pending(
    fetcher: &ArticleFetcher,
    csv_file: &str,
    progress_file: &str,
    data_dir: &str,
) -> Result<(), Box<dyn Error>> {
    if !Path::new(csv_file).exists() {
        error!(%csv_file, "entry store not found; nothing to fetch");
        return Ok(());
    }

    std::fs::create_dir_all(data_dir)?;
    let store = EntryStore::load(csv_file)?;
    let mut progress = ProgressStore::load(progress_file);

    let pending: Vec<String> = store
        .entries()
        .iter()
        .map(|e| e.link.clone())
        .filter(|link| !progress.contains(link))
        .collect();

    if pending.is_empty() {
        info!("all URLs have already been fetched or attempted");
        return Ok(());
    }
    info!(count = pending.len(), "found new URLs to fetch");

    let total = pending.len();
    for (i, url) in pending.iter().enumerate() {
        info!(current = i + 1, total, %url, "fetching transcript");

        let outcome = fetch_one(fetcher, url, Path::new(data_dir)).await;
        match &outcome {
            FetchOutcome::Success { file } => info!(%url, %file, "saved successfully"),
            FetchOutcome::Failed { error } => warn!(%url, %error, "fetch failed"),
        }

        progress.record(url.clone(), outcome);
        progress.save(progress_file)?;

        sleep_range_ms(fetcher.delay_ms).await;
    }

    info!("finished fetching pending URLs");
    Ok(())
}

/// Attempt one URL. Every failure mode — HTTP status, network error,
/// artifact write error — becomes a `Failed` outcome; nothing here aborts
/// the run.
async fn fetch_one(fetcher: &ArticleFetcher, url: &str, data_dir: &Path) -> FetchOutcome {
    let response = match fetcher.client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            return FetchOutcome::Failed {
                error: e.to_string(),
            }
        }
    };

    let status = response.status();
    if !status.is_success() {
        return FetchOutcome::Failed {
            error: format!("HTTP {}", status.as_u16()),
        };
    }

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            return FetchOutcome::Failed {
                error: e.to_string(),
            }
        }
    };

    sleep_range_ms(fetcher.settle_ms).await;

    let text = extract_body_text(&body);
    let path = artifact_path(url, data_dir);
    let artifact = format!("URL: {url}\n\n{text}");
    match std::fs::write(&path, artifact) {
        Ok(()) => FetchOutcome::Success {
            file: path.to_string_lossy().into_owned(),
        },
        Err(e) => FetchOutcome::Failed {
            error: format!("write failed: {e}"),
        },
    }
}

/// Extract the visible text of the page body, one text node per line.
fn extract_body_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    match doc.select(&BODY_SELECTOR).next() {
        Some(body) => body
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        None => String::new(),
    }
}

/// Derive the artifact file path for a URL: last path segment (separators
/// stripped), `index` when the path is bare, `.txt` suffix.
///
/// Distinct URLs can share a last segment. When the derived file already
/// exists and its `URL:` header names a different URL, probe `-2`, `-3`, …
/// suffixes until a free or matching slot turns up; re-runs of the same
/// URL land on the same file.
fn artifact_path(url: &str, data_dir: &Path) -> PathBuf {
    let stem = Url::parse(url)
        .ok()
        .map(|u| {
            u.path()
                .trim_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or("")
                .to_string()
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "index".to_string());

    let header = format!("URL: {url}");
    let mut path = data_dir.join(format!("{stem}.txt"));
    let mut suffix = 2;
    while path.exists() && !file_belongs_to(&path, &header) {
        path = data_dir.join(format!("{stem}-{suffix}.txt"));
        suffix += 1;
    }
    path
}

fn file_belongs_to(path: &Path, header: &str) -> bool {
    match std::fs::read_to_string(path) {
        Ok(existing) => existing.lines().next() == Some(header),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntryType, ListingEntry};
    use tempfile::tempdir;
    use wiremock::matchers::{method, path as url_path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_fetcher() -> ArticleFetcher {
        ArticleFetcher {
            client: Client::new(),
            settle_ms: (0, 0),
            delay_ms: (0, 0),
        }
    }

    fn entry(link: &str) -> ListingEntry {
        ListingEntry {
            page: 1,
            title: format!("Entry for {link}"),
            date: String::new(),
            link: link.to_string(),
            entry_type: EntryType::Transcript,
        }
    }

    #[test]
    fn test_artifact_path_from_url() {
        let dir = tempdir().unwrap();
        let path = artifact_path("https://alphastreet.com/india/infy-q1-2024/", dir.path());
        assert_eq!(path, dir.path().join("infy-q1-2024.txt"));
    }

    #[test]
    fn test_artifact_path_bare_root_falls_back() {
        let dir = tempdir().unwrap();
        let path = artifact_path("https://alphastreet.com/", dir.path());
        assert_eq!(path, dir.path().join("index.txt"));
    }

    #[test]
    fn test_artifact_path_collision_probes_suffixes() {
        let dir = tempdir().unwrap();
        let first = artifact_path("https://a.com/x/report", dir.path());
        std::fs::write(&first, "URL: https://a.com/x/report\n\nbody").unwrap();

        // Same URL maps back onto its own file.
        assert_eq!(artifact_path("https://a.com/x/report", dir.path()), first);

        // A different URL with the same last segment gets the next slot.
        let second = artifact_path("https://a.com/y/report", dir.path());
        assert_eq!(second, dir.path().join("report-2.txt"));
    }

    #[test]
    fn test_extract_body_text() {
        let html = "<html><body><h1>Title</h1><p>First para.</p><p>Second para.</p></body></html>";
        assert_eq!(extract_body_text(html), "Title\nFirst para.\nSecond para.");
    }

    #[tokio::test]
    async fn test_fetch_pending_skips_recorded_and_records_failure() {
        let server = MockServer::start().await;
        // u2 is the only pending URL; it must be requested exactly once
        // across both runs below.
        Mock::given(method("GET"))
            .and(url_path("/india/u2"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let csv = dir.path().join("transcripts.csv");
        let csv = csv.to_str().unwrap();
        let progress_path = dir.path().join("progress.json");
        let progress_path = progress_path.to_str().unwrap();
        let data_dir = dir.path().join("data");
        let data_dir = data_dir.to_str().unwrap();

        let u1 = format!("{}/india/u1", server.uri());
        let u2 = format!("{}/india/u2", server.uri());
        EntryStore::from_entries(vec![entry(&u1), entry(&u2)])
            .save(csv)
            .unwrap();

        let mut seeded = ProgressStore::default();
        seeded.record(
            u1.clone(),
            FetchOutcome::Success {
                file: "data/u1.txt".to_string(),
            },
        );
        seeded.save(progress_path).unwrap();

        let fetcher = test_fetcher();
        fetch_pending(&fetcher, csv, progress_path, data_dir)
            .await
            .unwrap();

        let progress = ProgressStore::load(progress_path);
        assert_eq!(progress.len(), 2);
        assert!(matches!(
            progress.get(&u1),
            Some(FetchOutcome::Success { .. })
        ));
        assert_eq!(
            progress.get(&u2),
            Some(&FetchOutcome::Failed {
                error: "HTTP 500".to_string()
            })
        );

        // Second run over the same inputs attempts nothing further.
        fetch_pending(&fetcher, csv, progress_path, data_dir)
            .await
            .unwrap();
        assert_eq!(ProgressStore::load(progress_path).len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_pending_writes_artifact_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path("/india/infy-q1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<html><body><h1>Infy Q1</h1><p>Revenue grew.</p></body></html>",
            ))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let csv = dir.path().join("transcripts.csv");
        let csv = csv.to_str().unwrap();
        let progress_path = dir.path().join("progress.json");
        let progress_path = progress_path.to_str().unwrap();
        let data_dir = dir.path().join("data");

        let url = format!("{}/india/infy-q1", server.uri());
        EntryStore::from_entries(vec![entry(&url)]).save(csv).unwrap();

        let fetcher = test_fetcher();
        fetch_pending(&fetcher, csv, progress_path, data_dir.to_str().unwrap())
            .await
            .unwrap();

        let artifact = data_dir.join("infy-q1.txt");
        let content = std::fs::read_to_string(&artifact).unwrap();
        assert_eq!(content, format!("URL: {url}\n\nInfy Q1\nRevenue grew."));

        let progress = ProgressStore::load(progress_path);
        assert_eq!(
            progress.get(&url),
            Some(&FetchOutcome::Success {
                file: artifact.to_string_lossy().into_owned()
            })
        );
    }
}
