// src/error.rs
//! Error taxonomy for the collection pipeline.
//!
//! - [`ConfigError`] is fatal and ends the process.
//! - [`FetchError`] / [`ParseError`] are isolated to one source (see [`SourceError`]).
//! - [`DeliveryError`] is swallowed by the collector after logging.
//! - [`ControlError`] is retried on the next poll, except for a failed poll task.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("[{section}] `{field}` is required")]
    MissingField {
        section: &'static str,
        field: &'static str,
    },

    #[error("source `{site}` needs a non-empty `{field}` list")]
    MissingCriteria { site: &'static str, field: &'static str },

    #[error("source `{site}` has an invalid endpoint `{uri}`: {reason}")]
    InvalidEndpoint {
        site: &'static str,
        uri: String,
        reason: String,
    },

    #[error("keyword pattern `{pattern}` does not compile: {source}")]
    InvalidKeyword {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("hello_time `{0}` is not HH:MM")]
    InvalidHelloTime(String),

    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),

    #[error("building http client: {0}")]
    Client(#[source] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("no response within {0:?}")]
    Timeout(Duration),
}

impl FetchError {
    /// Short error class used in operator notifications.
    pub fn class(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "Transport",
            FetchError::Status { .. } => "HttpStatus",
            FetchError::Timeout(_) => "Timeout",
        }
    }
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("expected element `{0}` not found")]
    MissingElement(&'static str),

    #[error("row {row}: found {found} cells, layout needs {expected}")]
    RowShape {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("marker `{0}` not found in page")]
    MissingMarker(&'static str),

    #[error("invalid embedded json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid feed: {0}")]
    Feed(#[from] quick_xml::DeError),

    #[error("cannot resolve link `{href}`: {source}")]
    InvalidUrl {
        href: String,
        #[source]
        source: url::ParseError,
    },
}

impl ParseError {
    pub fn class(&self) -> &'static str {
        match self {
            ParseError::MissingElement(_) => "MissingElement",
            ParseError::RowShape { .. } => "RowShape",
            ParseError::MissingMarker(_) => "MissingMarker",
            ParseError::Json(_) => "Json",
            ParseError::Feed(_) => "Feed",
            ParseError::InvalidUrl { .. } => "InvalidUrl",
        }
    }
}

/// Failure of one source within a cycle. Never aborts the cycle.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl SourceError {
    /// Label used in the operator notification subject.
    pub fn kind(&self) -> &'static str {
        match self {
            SourceError::Fetch(_) => "Network error",
            SourceError::Parse(_) => "Parse error",
        }
    }

    pub fn class(&self) -> &'static str {
        match self {
            SourceError::Fetch(e) => e.class(),
            SourceError::Parse(e) => e.class(),
        }
    }

    /// Metric label.
    pub fn metric_kind(&self) -> &'static str {
        match self {
            SourceError::Fetch(_) => "fetch",
            SourceError::Parse(_) => "parse",
        }
    }
}

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("invalid mailbox: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("building message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("smtp: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

#[derive(Error, Debug)]
pub enum ControlError {
    #[error("tls: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("imap: {0}")]
    Imap(#[from] imap::error::Error),

    #[error("mailbox connection: {0}")]
    Io(#[from] std::io::Error),

    #[error("mailbox poll exceeded {0:?}")]
    Timeout(Duration),

    #[error("poll task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ControlError {
    /// Only a crashed poll task is fatal; everything else is retried next interval.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ControlError::Task(_))
    }
}
