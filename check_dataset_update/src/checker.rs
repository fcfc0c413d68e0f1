//! One update cycle: compare the page date with the checkpoint and download
//! the dataset when the page is newer.
//!
//! The checkpoint records the day the check ran, not the page-reported date,
//! so the local clock never has to agree with the publisher's.
//!
//! A new checkpoint is committed only after the download succeeded. A failed
//! download leaves the old checkpoint in place and the next cycle tries again.
//! The listener hears about an update only once the store has been closed.

use std::cmp::Ordering;
use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::checkpoint::{CheckpointStore, LAST_DOWNLOADED_KEY};
use crate::error::{FetchError, UpdateError};
use crate::fetch::{Fetch, HttpFetcher};
use crate::page::{self, ExtractionRule, PageSnapshot};

/// Receives the dataset text whenever a newer version was downloaded.
pub trait UpdateListener: Send + Sync {
    fn on_update_available(&self, csv: &str);
}

impl<F> UpdateListener for F
where
    F: Fn(&str) + Send + Sync,
{
    fn on_update_available(&self, csv: &str) {
        self(csv)
    }
}

/// Result of comparing the page with the checkpoint, decided while the store is open.
enum Outcome {
    NoUpdate,
    FirstRun(String),
    Updated(String),
}

pub struct UpdateChecker<F = HttpFetcher> {
    snapshot: Option<PageSnapshot>,
    store_path: PathBuf,
    dataset_url: String,
    rule: ExtractionRule,
    fetcher: F,
    listener: Option<Box<dyn UpdateListener>>,
    today: fn() -> NaiveDate,
}

impl<F: Fetch> UpdateChecker<F> {
    /// `snapshot` is `None` when the source page could not be retrieved.
    pub fn new(
        snapshot: Option<PageSnapshot>,
        store_path: impl Into<PathBuf>,
        dataset_url: impl Into<String>,
        fetcher: F,
    ) -> Self {
        Self {
            snapshot,
            store_path: store_path.into(),
            dataset_url: dataset_url.into(),
            rule: ExtractionRule::default(),
            fetcher,
            listener: None,
            today: local_today,
        }
    }

    pub fn with_rule(mut self, rule: ExtractionRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn with_listener(mut self, listener: impl UpdateListener + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Runs one cycle. Returns the dataset text when it was downloaded and an
    /// empty string otherwise.
    pub async fn check(&self) -> Result<String, UpdateError> {
        let Some(snapshot) = &self.snapshot else {
            warn!("source page snapshot is unavailable, skipping the change check");
            return Ok(String::new());
        };

        let store = CheckpointStore::open(&self.store_path)?;
        let outcome = self.check_against(&store, snapshot).await?;
        store.close()?;

        match outcome {
            Outcome::NoUpdate => Ok(String::new()),
            Outcome::FirstRun(csv) => Ok(csv),
            Outcome::Updated(csv) => {
                if let Some(listener) = &self.listener {
                    listener.on_update_available(&csv);
                }
                Ok(csv)
            }
        }
    }

    async fn check_against(
        &self,
        store: &CheckpointStore,
        snapshot: &PageSnapshot,
    ) -> Result<Outcome, UpdateError> {
        let today = (self.today)();

        let Some(last_downloaded) = store.get(LAST_DOWNLOADED_KEY)? else {
            info!(%today, "no checkpoint recorded, first run: downloading the dataset");
            let csv = self.download().await?;
            store.put(LAST_DOWNLOADED_KEY, today)?;
            return Ok(Outcome::FirstRun(csv));
        };

        let page_date = page::extract(snapshot, &self.rule)?;
        debug!(%page_date, %last_downloaded, "comparing page date with checkpoint");

        match page_date.cmp(&last_downloaded) {
            Ordering::Greater => {
                info!(%page_date, %last_downloaded, "new dataset available, downloading");
                let csv = self.download().await?;
                store.put(LAST_DOWNLOADED_KEY, today)?;
                Ok(Outcome::Updated(csv))
            }
            Ordering::Equal => {
                info!(%page_date, "no updates found");
                Ok(Outcome::NoUpdate)
            }
            Ordering::Less => {
                warn!(
                    %page_date,
                    %last_downloaded,
                    "page date is older than the checkpoint, treating as no update"
                );
                Ok(Outcome::NoUpdate)
            }
        }
    }

    async fn download(&self) -> Result<String, FetchError> {
        let csv = self.fetcher.fetch(&self.dataset_url).await?;
        if csv.is_empty() {
            return Err(FetchError::EmptyBody {
                url: self.dataset_url.clone(),
            });
        }
        Ok(csv)
    }
}

fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
