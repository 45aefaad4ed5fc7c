//! Durable stores: the CSV entry store and the JSON fetch-progress store.
//!
//! Both stores are explicit objects owned by their caller — constructed at
//! the start of a run, persisted at defined checkpoints, no process-wide
//! singletons. The process is the only writer; no external concurrent
//! writers are assumed.

pub mod entries;
pub mod progress;

pub use entries::EntryStore;
pub use progress::ProgressStore;
