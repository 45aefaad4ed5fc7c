//! Data models for listing entries and per-URL fetch outcomes.
//!
//! Two durable record types live here:
//! - [`ListingEntry`]: one extracted article/transcript reference, persisted
//!   as a row of `transcripts.csv`
//! - [`FetchOutcome`]: the recorded result of fetching one URL, persisted
//!   in `progress.json`
//!
//! The serde renames on [`ListingEntry`] pin the CSV header to the exact
//! column names downstream tooling expects: `Page,Transcript,Date,Link,Type`.

use serde::{Deserialize, Serialize};

/// Coarse classification of a listing entry.
///
/// An entry is a [`Transcript`](EntryType::Transcript) when its display
/// text contains the word "transcript" (case-insensitive); everything else
/// on the listing is a regular [`Article`](EntryType::Article).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryType {
    Transcript,
    Article,
}

/// One article/transcript reference extracted from a listing page.
///
/// Identity is the `link` field: links are assumed globally unique on the
/// source site, and the incremental sync uses them to detect already-known
/// entries. `page` is only meaningful within a single crawl pass — after
/// incremental merges, rows from different runs carry unrelated page numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingEntry {
    /// Listing page the entry was found on (1-based).
    #[serde(rename = "Page")]
    pub page: u32,
    /// The anchor's display text, e.g. "Infosys Q1 2024 Earnings Call Transcript".
    #[serde(rename = "Transcript")]
    pub title: String,
    /// Publication date as shown on the listing; empty when absent.
    #[serde(rename = "Date")]
    pub date: String,
    /// Destination URL. Unique within the entry store.
    #[serde(rename = "Link")]
    pub link: String,
    /// Transcript vs. plain article.
    #[serde(rename = "Type")]
    pub entry_type: EntryType,
}

/// Durable outcome of one URL fetch attempt.
///
/// Serializes to the progress-store JSON shape:
/// `{"status":"success","file":"…"}` or `{"status":"failed","error":"…"}`.
/// A recorded outcome — success *or* failure — means the URL is never
/// attempted again; retrying a known failure requires editing the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FetchOutcome {
    /// Page fetched and its text saved to `file`.
    Success { file: String },
    /// Fetch failed; `error` is a human-readable reason (HTTP status or
    /// network error).
    Failed { error: String },
}
