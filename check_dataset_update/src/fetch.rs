//! Single-attempt HTTP download of the dataset.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::error::FetchError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Fetches a resource as text.
///
/// Implementations make exactly one attempt; retrying is left to whoever
/// schedules the next update cycle.
pub trait Fetch {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// Builds the client shared by the page retriever and the dataset fetcher.
pub fn build_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
}

#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self::from_client(build_client(timeout)?))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        debug!(url, "downloading dataset");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.bytes().await.map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })?;
        debug!(url, bytes = body.len(), "dataset downloaded");

        String::from_utf8(body.to_vec()).map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })
    }
}
