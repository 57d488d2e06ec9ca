use super::{BackendReply, MediaBackend, TransportError};
use crate::model::{
    DownloadListing, DownloadListingBody, DownloadReceipt, ErrorBody, HealthStatus, UrlRequest,
    VideoMetadata, INFO_ENDPOINT,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

/// Origin of the media backend. Not configurable.
pub const API_BASE_URL: &str = "http://localhost:5000";

pub struct HttpBackend {
    http: reqwest::Client,
}

impl HttpBackend {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(format!("ytdl-remote/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build HTTP client")?;
        Ok(Self { http })
    }

    fn url(path: &str) -> String {
        format!("{API_BASE_URL}{path}")
    }

    async fn post_url<T: DeserializeOwned>(
        &self,
        path: &str,
        url: &str,
    ) -> Result<BackendReply<T>, TransportError> {
        debug!(path, url, "dispatching request");
        // `.json()` sets `Content-Type: application/json`.
        let resp = self
            .http
            .post(Self::url(path))
            .json(&UrlRequest { url })
            .send()
            .await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        debug!(path, status = status.as_u16(), len = body.len(), "response received");
        interpret_reply(status, &body)
    }

    /// `/api/download-file/<filename>` with the name percent-encoded as one segment.
    fn file_url(filename: &str) -> Option<Url> {
        let mut url = Url::parse(API_BASE_URL).ok()?;
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .extend(["api", "download-file", filename]);
        Some(url)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<BackendReply<T>, TransportError> {
        debug!(path, "GET");
        let resp = self.http.get(Self::url(path)).send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        interpret_reply(status, &body)
    }
}

/// Split a response into success payload or backend-reported failure.
///
/// The body must be JSON in both cases; anything else is a transport failure.
pub fn interpret_reply<T: DeserializeOwned>(
    status: StatusCode,
    body: &[u8],
) -> Result<BackendReply<T>, TransportError> {
    if status.is_success() {
        Ok(BackendReply::Ok(serde_json::from_slice(body)?))
    } else {
        let failure: ErrorBody = serde_json::from_slice(body)?;
        Ok(BackendReply::Failed {
            error: failure.error,
        })
    }
}

/// Copy every chunk of `stream` into `sink`, returning the byte count.
pub(crate) async fn copy_stream<S, B, E, W>(
    mut stream: S,
    sink: &mut W,
) -> Result<u64, TransportError>
where
    S: Stream<Item = std::result::Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    TransportError: From<E>,
    W: AsyncWrite + Unpin,
{
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        sink.write_all(chunk.as_ref()).await?;
        written += chunk.as_ref().len() as u64;
    }
    sink.flush().await?;
    Ok(written)
}

#[async_trait]
impl MediaBackend for HttpBackend {
    async fn video_info(&self, url: &str) -> Result<BackendReply<VideoMetadata>, TransportError> {
        self.post_url(INFO_ENDPOINT, url).await
    }

    async fn download(
        &self,
        endpoint: &str,
        url: &str,
    ) -> Result<BackendReply<DownloadReceipt>, TransportError> {
        self.post_url(endpoint, url).await
    }

    async fn list_downloads(&self) -> Result<BackendReply<Vec<DownloadListing>>, TransportError> {
        let reply: BackendReply<DownloadListingBody> = self.get("/api/downloads").await?;
        Ok(match reply {
            BackendReply::Ok(body) => BackendReply::Ok(body.files),
            BackendReply::Failed { error } => BackendReply::Failed { error },
        })
    }

    async fn health(&self) -> Result<BackendReply<HealthStatus>, TransportError> {
        self.get("/health").await
    }

    async fn fetch_file(
        &self,
        filename: &str,
        dest: &Path,
    ) -> Result<BackendReply<u64>, TransportError> {
        let Some(url) = Self::file_url(filename) else {
            return Ok(BackendReply::Failed {
                error: Some(format!("Invalid file name: {filename}")),
            });
        };
        debug!(%url, "GET");
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.bytes().await?;
            let failure: ErrorBody = serde_json::from_slice(&body)?;
            return Ok(BackendReply::Failed {
                error: failure.error,
            });
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let written = copy_stream(resp.bytes_stream(), &mut file).await?;
        info!(filename, dest = %dest.display(), bytes = written, "file fetched");
        Ok(BackendReply::Ok(written))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_status_decodes_payload() {
        let body = br#"{"success":true,"message":"Video downloaded successfully","filename":"a.mp4","path":"/x/a.mp4"}"#;
        let reply: BackendReply<DownloadReceipt> = interpret_reply(StatusCode::OK, body).unwrap();
        match reply {
            BackendReply::Ok(r) => {
                assert_eq!(r.filename.as_deref(), Some("a.mp4"));
                assert_eq!(r.message.as_deref(), Some("Video downloaded successfully"));
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn failure_status_carries_backend_error() {
        let reply: BackendReply<DownloadReceipt> =
            interpret_reply(StatusCode::BAD_REQUEST, br#"{"error":"bad url"}"#).unwrap();
        assert_eq!(
            reply,
            BackendReply::Failed {
                error: Some("bad url".into())
            }
        );
    }

    #[test]
    fn failure_without_error_field() {
        let reply: BackendReply<VideoMetadata> =
            interpret_reply(StatusCode::INTERNAL_SERVER_ERROR, b"{}").unwrap();
        assert_eq!(reply, BackendReply::Failed { error: None });
    }

    #[test]
    fn non_json_body_is_a_transport_error() {
        let res = interpret_reply::<VideoMetadata>(StatusCode::BAD_GATEWAY, b"<html>502</html>");
        assert!(matches!(res, Err(TransportError::Decode(_))));
    }

    #[test]
    fn file_url_encodes_the_name_as_one_segment() {
        let url = HttpBackend::file_url("my clip #1/x.mp4").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5000/api/download-file/my%20clip%20%231%2Fx.mp4"
        );
    }

    #[tokio::test]
    async fn copy_stream_writes_every_chunk() {
        let chunks = vec![
            Ok::<_, std::io::Error>(b"abc".to_vec()),
            Ok(Vec::new()),
            Ok(b"de".to_vec()),
        ];
        let mut sink = Vec::new();
        let written = copy_stream(futures::stream::iter(chunks), &mut sink)
            .await
            .unwrap();
        assert_eq!(written, 5);
        assert_eq!(sink, b"abcde");
    }

    #[tokio::test]
    async fn copy_stream_stops_at_a_failed_chunk() {
        let chunks = vec![
            Ok(b"abc".to_vec()),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
            Ok(b"never".to_vec()),
        ];
        let mut sink = Vec::new();
        let res = copy_stream(futures::stream::iter(chunks), &mut sink).await;
        assert!(matches!(res, Err(TransportError::Io(_))));
        assert_eq!(sink, b"abc");
    }

    #[test]
    fn endpoint_urls_use_fixed_origin() {
        assert_eq!(
            HttpBackend::url("/api/video-info"),
            "http://localhost:5000/api/video-info"
        );
    }
}
