//! Dataset Update Checker
//!
//! Watches a periodically updated dataset page and downloads the dataset (a
//! CSV document) when the page reports a newer "last updated" date than the
//! one recorded locally.
//!
//! One call to [`UpdateChecker::check`] is one update cycle. Scheduling the
//! cycles is up to the caller (cron, a systemd timer, a fixed-rate loop).

pub mod checker;
pub mod checkpoint;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod output;
pub mod page;

#[cfg(test)]
mod test_support;

pub use checker::{UpdateChecker, UpdateListener};
pub use checkpoint::{CheckpointStore, LAST_DOWNLOADED_KEY};
pub use error::{DateParseError, FetchError, SourceUnavailable, StoreError, UpdateError};
pub use fetch::{Fetch, HttpFetcher};
pub use page::{ExtractionRule, PageSnapshot};
