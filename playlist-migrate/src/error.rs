//! Typed failures that callers need to tell apart.
//!
//! Everything else in the crate travels as [`eyre::Report`]; these types stay reachable through
//! [`eyre::Report::downcast_ref`] even after context has been attached.

use http::{Method, StatusCode};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// A single download attempt failed.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The source refused to serve the video right now.
    #[error("video {url} is unavailable: {reason}")]
    Unavailable { url: String, reason: String },

    /// The attempt did not finish in time.
    #[error("download of {url} timed out after {after:?}")]
    Timeout { url: String, after: Duration },

    /// The downloader ran and failed for a reason that retrying will not fix.
    #[error("download of {url} failed: {reason}")]
    Failed { url: String, reason: String },

    /// The downloader could not be started at all.
    #[error("could not run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
}

impl MediaError {
    /// Whether another attempt might succeed.
    ///
    /// Only source unavailability and timeouts are retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Timeout { .. })
    }
}

/// The watch page could not be turned into [`crate::metadata::VideoMetadata`].
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("fetch {url}: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("fetch {url}: HTTP {status}")]
    Status { url: String, status: StatusCode },

    #[error("page {url} has no <meta name=\"{field}\"> content")]
    MissingField { url: String, field: &'static str },
}

/// The YouTube API rejected a request.
#[derive(Debug, Error)]
#[error("YouTube API {method} request to {url} failed with status {status}: {body}")]
pub struct ApiError {
    pub method: Method,
    pub url: String,
    pub status: StatusCode,
    pub body: String,
}

/// The ledger file could not be read or extended.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("read ledger {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("append to ledger {}: {source}", path.display())]
    Append {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unavailable_and_timeout_are_transient() {
        let url = "https://www.youtube.com/watch?v=abc".to_string();
        assert!(
            MediaError::Unavailable {
                url: url.clone(),
                reason: "gone".into()
            }
            .is_transient()
        );
        assert!(
            MediaError::Timeout {
                url: url.clone(),
                after: Duration::from_secs(1)
            }
            .is_transient()
        );
        assert!(
            !MediaError::Failed {
                url,
                reason: "unsupported format".into()
            }
            .is_transient()
        );
        assert!(
            !MediaError::Spawn {
                program: "yt-dlp".into(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }
            .is_transient()
        );
    }
}
