//! Remote media service access.
//!
//! The controller only talks to the service through [`MediaBackend`]; the HTTP
//! implementation lives in [`http`].

mod http;

use crate::model::{DownloadListing, DownloadReceipt, HealthStatus, VideoMetadata};
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

pub use http::{HttpBackend, API_BASE_URL};

/// The request could not be completed or its response could not be read.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Writing a fetched file to disk failed.
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of an exchange that reached the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendReply<T> {
    Ok(T),
    /// Non-success status; `error` is the backend's own text when it sent one.
    Failed { error: Option<String> },
}

#[async_trait]
pub trait MediaBackend: Send + Sync {
    async fn video_info(&self, url: &str)
        -> Result<BackendReply<VideoMetadata>, TransportError>;

    /// POST `url` to one of the download endpoints.
    async fn download(
        &self,
        endpoint: &str,
        url: &str,
    ) -> Result<BackendReply<DownloadReceipt>, TransportError>;

    async fn list_downloads(&self) -> Result<BackendReply<Vec<DownloadListing>>, TransportError>;

    async fn health(&self) -> Result<BackendReply<HealthStatus>, TransportError>;

    /// Stream a finished download from the backend's folder into `dest`.
    /// Returns the number of bytes written; `dest` is only created on success.
    async fn fetch_file(
        &self,
        filename: &str,
        dest: &Path,
    ) -> Result<BackendReply<u64>, TransportError>;
}
