//! Error types for dc-replicator
//!
//! Two families, with different propagation rules:
//! - [`ConfigError`] is fatal and stops the run before any network activity.
//! - [`RemoteError`] is per-call; the replication and sweep loops classify it,
//!   log it and move on to the next item.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal configuration error (roster, extracts, settings file)
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Roster entry lacks a required field
    #[error("malformed roster: entry {entry} is missing `{field}`")]
    MalformedRoster { entry: usize, field: &'static str },

    /// Extract header lacks a required column
    #[error("malformed extract {}: missing column `{column}`", .path.display())]
    MalformedExtract { path: PathBuf, column: &'static str },

    /// File could not be read or written
    #[error("IO error on {}: {error}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Roster is not well-formed XML
    #[error("roster XML error: {0}")]
    Xml(#[from] quick_xml::DeError),

    /// Extract could not be parsed or written as CSV
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Settings file is not valid TOML
    #[error("config file error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Settings value is unusable
    #[error("invalid setting `{key}`: {reason}")]
    InvalidSetting { key: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            error,
        }
    }
}

/// Result type for fatal configuration failures
pub type ConfigResult<T> = Result<T, ConfigError>;

/// A source record was built from an empty value
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("`{field}` must not be empty")]
pub struct RecordError {
    pub field: &'static str,
}

/// Classified failure of a single remote call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// 400/422, including duplicate content names
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized: check the tenant credentials")]
    Unauthorized,

    #[error("forbidden: the credentials lack permission for this action")]
    Forbidden,

    #[error("not found: the requested resource does not exist")]
    NotFound,

    /// 5xx, with whatever detail the body carried
    #[error("server error (HTTP {status}): {detail}")]
    ServerError { status: u16, detail: String },

    /// Transport-level failure: timeout, DNS, refused or reset connection
    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected response: {0}")]
    Unknown(String),
}

impl RemoteError {
    /// Classify a non-success HTTP status and its response body
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            400 | 422 => Self::BadRequest(error_detail(body)),
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            500..=599 => Self::ServerError {
                status,
                detail: error_detail(body),
            },
            _ => Self::Unknown(format!("HTTP {}: {}", status, error_detail(body))),
        }
    }

    /// Discriminant used for tallies
    pub fn kind(&self) -> RemoteErrorKind {
        match self {
            Self::BadRequest(_) => RemoteErrorKind::BadRequest,
            Self::Unauthorized => RemoteErrorKind::Unauthorized,
            Self::Forbidden => RemoteErrorKind::Forbidden,
            Self::NotFound => RemoteErrorKind::NotFound,
            Self::ServerError { .. } => RemoteErrorKind::ServerError,
            Self::Network(_) => RemoteErrorKind::Network,
            Self::Unknown(_) => RemoteErrorKind::Unknown,
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Unknown(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

/// Kind of a [`RemoteError`], without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    ServerError,
    Network,
    Unknown,
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BadRequest => "bad_request",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::ServerError => "server_error",
            Self::Network => "network",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Pull a human-readable message out of an error response body.
///
/// The platform answers with `{"error": "...", "description": "..."}` or with
/// `{"error": {"title": ..., "message": ...}}`; anything else is passed through.
fn error_detail(body: &str) -> String {
    let Ok(json) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_string();
    };

    let error = match json.get("error") {
        Some(serde_json::Value::String(s)) => Some(s.clone()),
        Some(serde_json::Value::Object(obj)) => obj
            .get("message")
            .or_else(|| obj.get("title"))
            .and_then(|v| v.as_str())
            .map(String::from),
        _ => None,
    };

    match (error, json.get("description").and_then(|v| v.as_str())) {
        (Some(error), Some(description)) => format!("{}: {}", error, description),
        (Some(error), None) => error,
        (None, Some(description)) => description.to_string(),
        (None, None) => body.trim().to_string(),
    }
}
