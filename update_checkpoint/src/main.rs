//! Update Checkpoint - Dataset Update Checker
//!
//! Marks the dataset as downloaded on a given day (today by default), shows
//! the stored checkpoint, or clears it so the next check downloads the
//! dataset again.
//!
//! The checkpoint represents "last day we downloaded the dataset" rather than
//! "date the publisher reports", so marking it after a manual import keeps the
//! next check from downloading the same data twice.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use check_dataset_update::{CheckpointStore, LAST_DOWNLOADED_KEY};
use chrono::NaiveDate;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "update_checkpoint")]
#[command(about = "Show, set or clear the last dataset download date")]
struct Args {
    /// Checkpoint store holding the last download date
    #[arg(long, default_value = "lasttime.db")]
    store_path: PathBuf,

    /// Date to record (YYYY-MM-DD), defaults to today
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Print the stored checkpoint without changing it
    #[arg(long, conflicts_with_all = ["date", "clear"])]
    show: bool,

    /// Remove the checkpoint so the next check downloads the dataset
    #[arg(long, conflicts_with = "date")]
    clear: bool,
}

#[derive(Debug, PartialEq)]
enum Action {
    Show,
    Clear,
    Mark(NaiveDate),
}

impl Args {
    fn action(&self, today: NaiveDate) -> Action {
        if self.show {
            Action::Show
        } else if self.clear {
            Action::Clear
        } else {
            Action::Mark(self.date.unwrap_or(today))
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let action = args.action(chrono::Local::now().date_naive());

    let checkpoint = apply(&args.store_path, &action)?;

    match (action, checkpoint) {
        (Action::Clear, _) => println!("Cleared checkpoint"),
        (Action::Mark(_), Some(date)) => println!("Updated checkpoint to: {}", date),
        (_, Some(date)) => println!("Last downloaded: {}", date),
        (_, None) => println!("No checkpoint recorded"),
    }
    println!("Store: {}", args.store_path.display());

    Ok(())
}

/// Applies `action` and returns the checkpoint left in the store.
fn apply(store_path: &Path, action: &Action) -> Result<Option<NaiveDate>> {
    let store = CheckpointStore::open(store_path)
        .with_context(|| format!("cannot open {}", store_path.display()))?;

    let checkpoint = match action {
        Action::Show => store.get(LAST_DOWNLOADED_KEY)?,
        Action::Clear => {
            store.remove(LAST_DOWNLOADED_KEY)?;
            None
        }
        Action::Mark(date) => {
            store.put(LAST_DOWNLOADED_KEY, *date)?;
            Some(*date)
        }
    };

    store.close()?;
    Ok(checkpoint)
}
