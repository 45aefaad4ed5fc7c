//! CSV-backed store of extracted listing entries.
//!
//! One row per [`ListingEntry`], header `Page,Transcript,Date,Link,Type`.
//! Saves always rewrite the whole file; in incremental mode new rows are
//! prepended ahead of the previously existing ones, never re-sorted.

use crate::models::ListingEntry;
use std::collections::HashSet;
use std::error::Error;
use std::path::Path;
use tracing::info;

/// Ordered collection of listing entries, keyed by link for existence
/// checks. Link values are unique within a store.
#[derive(Debug, Default)]
pub struct EntryStore {
    entries: Vec<ListingEntry>,
}

impl EntryStore {
    pub fn from_entries(entries: Vec<ListingEntry>) -> Self {
        Self { entries }
    }

    /// Load the store from `path`. A missing file is an empty store, not
    /// an error; a malformed row propagates as one.
    pub fn load(path: &str) -> Result<Self, Box<dyn Error>> {
        if !Path::new(path).exists() {
            info!(%path, "entry store not found; starting empty");
            return Ok(Self::default());
        }

        let mut rdr = csv::Reader::from_path(path)?;
        let mut entries = Vec::new();
        for row in rdr.deserialize() {
            entries.push(row?);
        }
        info!(count = entries.len(), %path, "loaded entry store");
        Ok(Self { entries })
    }

    /// Persist the store to `path`, rewriting the file in full.
    pub fn save(&self, path: &str) -> Result<(), Box<dyn Error>> {
        let mut wtr = csv::Writer::from_path(path)?;
        for entry in &self.entries {
            wtr.serialize(entry)?;
        }
        wtr.flush()?;
        info!(count = self.entries.len(), %path, "wrote entry store");
        Ok(())
    }

    /// The set of known link identities.
    pub fn links(&self) -> HashSet<String> {
        self.entries.iter().map(|e| e.link.clone()).collect()
    }

    /// Merge freshly found entries ahead of the existing rows, preserving
    /// both orders.
    pub fn prepend(&mut self, new_entries: Vec<ListingEntry>) {
        let mut merged = new_entries;
        merged.append(&mut self.entries);
        self.entries = merged;
    }

    pub fn entries(&self) -> &[ListingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
