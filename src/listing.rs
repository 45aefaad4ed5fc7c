//! Listing-page link extraction and entry parsing.
//!
//! AlphaStreet's transcript listing is a paginated index of anchors. The
//! extraction pipeline flattens a fetched page into plain-text lines while
//! preserving link destinations inline: every anchor with visible text
//! serializes as `"<text> [<href>]"`, one line per anchor. [`parse_entry`]
//! then recovers structured [`ListingEntry`] records from those lines.
//!
//! # Line format
//!
//! ```text
//! Infosys Q1 2024 Earnings Call Transcript [https://alphastreet.com/india/infosys-q1-2024]
//! ●
//! Jul 20, 2024
//! ```
//!
//! The bullet marker on the following line signals that a date follows.

use crate::models::{EntryType, ListingEntry};
use ego_tree::NodeRef;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

/// Bare listing URL; page 1 of the index.
pub const LISTING_BASE: &str = "https://alphastreet.com/india/category/transcripts/";

/// Prefix every article/transcript URL on the site starts with.
const CONTENT_PREFIX: &str = "https://alphastreet.com/india/";

/// Annotated entry line: display text followed by a trailing bracketed link.
static ENTRY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.*?)\s*\[(.*?)\]$").unwrap());

static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());

/// Build the listing URL for a given page number.
///
/// Page 1 maps to the bare listing URL; page N>1 appends `page/N`.
pub fn build_page_url(page_number: u32) -> String {
    if page_number == 1 {
        LISTING_BASE.to_string()
    } else {
        format!("{LISTING_BASE}page/{page_number}")
    }
}

/// Returns true if the link points at an actual article/transcript page,
/// as opposed to a category index or the site root.
pub fn is_valid_transcript_url(link: &str) -> bool {
    link.starts_with(CONTENT_PREFIX)
        && !link.contains("/category/")
        && link.len() > CONTENT_PREFIX.len()
}

/// Returns true iff any anchor on the page mentions `Next` — the site's
/// pagination convention. No other signal is consulted.
pub fn has_next_page(doc: &Html) -> bool {
    doc.select(&ANCHOR_SELECTOR).any(|a| a.html().contains("Next"))
}

/// Flatten a document into plain-text lines with links annotated inline.
///
/// Walks the tree in document order. Anchors carrying an `href` attribute
/// and non-empty visible text produce a single `"<text> [<href>]"` line
/// (internal whitespace in the label collapsed); anchors with empty text
/// produce nothing. Every other non-empty text node contributes one
/// trimmed line per text line it contains.
pub fn flatten_lines(doc: &Html) -> Vec<String> {
    let mut lines = Vec::new();
    walk(doc.tree.root(), &mut lines);
    lines
}

fn walk(node: NodeRef<'_, Node>, lines: &mut Vec<String>) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => {
                for piece in text.split('\n') {
                    let piece = piece.trim();
                    if !piece.is_empty() {
                        lines.push(piece.to_string());
                    }
                }
            }
            Node::Element(el) => {
                if el.name() == "a" {
                    if let Some(href) = el.attr("href") {
                        let label = ElementRef::wrap(child)
                            .map(|a| {
                                a.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ")
                            })
                            .unwrap_or_default();
                        if !label.is_empty() {
                            lines.push(format!("{label} [{href}]"));
                        }
                        continue;
                    }
                }
                walk(child, lines);
            }
            _ => {}
        }
    }
}

/// Parse one listing page body into its annotated line sequence, and report
/// whether a next page exists.
///
/// Keeping the whole HTML round-trip synchronous means no parsed document
/// is ever held across an await point.
pub fn extract_lines(body: &str) -> (Vec<String>, bool) {
    let doc = Html::parse_document(body);
    let lines = flatten_lines(&doc);
    let has_next = has_next_page(&doc);
    (lines, has_next)
}

/// Attempt to parse the annotated line at `index` into a [`ListingEntry`].
///
/// Returns `None` when the line does not match the `<text> [<link>]`
/// pattern or the link fails [`is_valid_transcript_url`] — navigation and
/// category links are silently skipped, not errors. The date lookahead
/// (`●` marker on the next line, date on the one after) never reads past
/// the end of `lines`.
pub fn parse_entry(lines: &[String], index: usize, page: u32) -> Option<ListingEntry> {
    let caps = ENTRY_RE.captures(&lines[index])?;
    let title = caps[1].trim().to_string();
    let link = caps[2].trim().to_string();

    if !is_valid_transcript_url(&link) {
        return None;
    }

    let date = if index + 2 < lines.len() && lines[index + 1].trim() == "●" {
        lines[index + 2].trim().to_string()
    } else {
        String::new()
    };

    let entry_type = if title.to_lowercase().contains("transcript") {
        EntryType::Transcript
    } else {
        EntryType::Article
    };

    Some(ListingEntry {
        page,
        title,
        date,
        link,
        entry_type,
    })
}
