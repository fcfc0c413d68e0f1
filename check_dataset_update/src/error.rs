//! Error kinds raised by an update cycle.
//!
//! `SourceUnavailable` is the only soft condition: the binary turns it into an
//! absent snapshot and the cycle ends with "no update". Everything else is
//! fatal for the call and is handed back to whoever scheduled it.

use std::path::PathBuf;

use thiserror::Error;

/// The source page could not be retrieved.
#[derive(Debug, Error)]
#[error("source page {url} unavailable: {reason}")]
pub struct SourceUnavailable {
    pub url: String,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum DateParseError {
    #[error("no element at child depth {depth} under the first match of `{selector}`")]
    MissingElement { selector: String, depth: usize },

    #[error("`{text}` does not match date format `{format}`: {source}")]
    InvalidDate {
        text: String,
        format: String,
        #[source]
        source: chrono::ParseError,
    },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open checkpoint store at {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: sled::Error,
    },

    #[error("failed to read checkpoint `{key}`: {source}")]
    Read {
        key: String,
        #[source]
        source: sled::Error,
    },

    #[error("failed to write checkpoint `{key}`: {source}")]
    Write {
        key: String,
        #[source]
        source: sled::Error,
    },

    #[error("checkpoint `{key}` holds an unreadable value: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode checkpoint `{key}`: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to read body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned an empty body")]
    EmptyBody { url: String },

    #[error("body from {url} is not valid UTF-8: {source}")]
    Decode {
        url: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

/// Fatal failure of a single update cycle.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error(transparent)]
    DateParse(#[from] DateParseError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// The configured CSS selector for the "last updated" element does not parse.
#[derive(Debug, Error)]
#[error("invalid selector `{selector}`: {reason}")]
pub struct InvalidSelector {
    pub selector: String,
    pub reason: String,
}
