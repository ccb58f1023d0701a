use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single `search` call. There is no partial result: the
/// response is decoded as a whole or not at all.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Connection, DNS or non-2xx failure. Retrying is up to the caller.
    #[error("search request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered but sent an empty body.
    #[error("search response had no data")]
    NoData,

    /// The body did not match the expected response shape.
    #[error("failed to decode search response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Pages are 1-based; nothing is sent for page 0.
    #[error("invalid page {0}: pages start at 1")]
    InvalidPage(u32),

    #[error("invalid API base url {0:?}")]
    InvalidBase(String),
}

impl SearchError {
    /// Whether the caller may reasonably issue the same request again.
    pub fn is_transport(&self) -> bool {
        matches!(self, SearchError::Transport(_))
    }
}

/// Failure while downloading a thumbnail or full-size asset.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("download failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("download of {0} returned an empty body")]
    NoData(String),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot derive a file name from {0:?}")]
    InvalidPath(String),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no configuration directory available on this platform")]
    NoConfigDir,
}

/// A query parameter value that does not belong to its enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected three 0/1 digits, got {0:?}")]
    Flags(String),

    #[error("unknown sorting {0:?} (relevance, random, date_added, views, favorites)")]
    Sorting(String),

    #[error("unknown order {0:?} (asc, desc)")]
    Order(String),

    #[error("invalid page {0:?}")]
    Page(String),
}
