//! Check Dataset Update
//!
//! Runs one update cycle: retrieves the dataset page, compares its "last
//! updated" date with the locally stored checkpoint and downloads the CSV
//! dataset when the page is newer (or when no checkpoint exists yet).
//!
//! Exit codes:
//! - 0: New dataset downloaded and written to --output
//! - 1: No new data (including an unreachable source page)
//! - 2: Error occurred

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use check_dataset_update::fetch::build_client;
use check_dataset_update::logging::init_logging;
use check_dataset_update::output::write_atomically;
use check_dataset_update::page::{
    self, DEFAULT_CHILD_DEPTH, DEFAULT_DATE_FORMAT, DEFAULT_DATE_SELECTOR,
};
use check_dataset_update::{ExtractionRule, Fetch, HttpFetcher, UpdateChecker};
use clap::Parser;
use reqwest::Client;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "check_dataset_update")]
#[command(about = "Download the dataset when its source page reports a newer update")]
struct Args {
    /// Page carrying the "last updated" date of the dataset
    #[arg(long, default_value = "https://ourworldindata.org/coronavirus-source-data")]
    page_url: String,

    /// CSV dataset to download when an update is found
    #[arg(long, default_value = "https://covid.ourworldindata.org/data/owid-covid-data.csv")]
    dataset_url: String,

    /// Checkpoint store holding the last download date
    #[arg(long, default_value = "lasttime.db")]
    store_path: PathBuf,

    /// Where the downloaded dataset is written
    #[arg(long, default_value = "owid-covid-data.csv")]
    output: PathBuf,

    /// CSS selector of the element wrapping the "last updated" date
    #[arg(long, default_value = DEFAULT_DATE_SELECTOR)]
    date_selector: String,

    /// How many first-child steps lead from the selected element to the date
    #[arg(long, default_value_t = DEFAULT_CHILD_DEPTH)]
    date_child_depth: usize,

    /// chrono format of the "last updated" date
    #[arg(long, default_value = DEFAULT_DATE_FORMAT)]
    date_format: String,

    /// HTTP timeout in seconds for page and dataset requests
    #[arg(long, default_value_t = 300)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging();

    let result = match build_client(Duration::from_secs(args.timeout_secs)) {
        Ok(client) => run(&args, &client, HttpFetcher::from_client(client.clone())).await,
        Err(e) => Err(anyhow::Error::new(e).context("failed to build HTTP client")),
    };

    std::process::exit(exit_code(result));
}

fn exit_code(result: Result<bool>) -> i32 {
    match result {
        Ok(true) => 0,  // New dataset downloaded
        Ok(false) => 1, // No new data
        Err(e) => {
            error!("{:#}", e);
            2
        }
    }
}

/// Runs one update cycle. `Ok(true)` means a new dataset was written to `--output`.
async fn run<F: Fetch>(args: &Args, client: &Client, fetcher: F) -> Result<bool> {
    info!(
        page = %args.page_url,
        dataset = %args.dataset_url,
        store = %args.store_path.display(),
        "checking for a new dataset"
    );

    let rule = ExtractionRule::new(&args.date_selector, args.date_child_depth, &args.date_format)
        .context("invalid --date-selector")?;

    let snapshot = match page::fetch_snapshot(client, &args.page_url).await {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            warn!("{}", e);
            None
        }
    };

    let checker = UpdateChecker::new(snapshot, &args.store_path, &args.dataset_url, fetcher)
        .with_rule(rule)
        .with_listener(log_dataset_summary);

    let csv = checker.check().await?;
    if csv.is_empty() {
        return Ok(false);
    }

    write_atomically(&args.output, &csv)
        .await
        .with_context(|| format!("failed to write dataset to {}", args.output.display()))?;
    info!(path = %args.output.display(), bytes = csv.len(), "dataset written");

    Ok(true)
}

fn log_dataset_summary(csv: &str) {
    let records = csv.lines().count().saturating_sub(1);
    info!(bytes = csv.len(), records, "updated dataset received");
}

#[cfg(test)]
#[path = "test_support.rs"]
mod test_support;
