//! Operation controller.
//!
//! Owns the operation mode, the request target, the last loaded metadata and the
//! outcome text. Each trigger validates the URL, performs one backend exchange and
//! maps the reply into display state. The mode is reset to idle by a drop guard, so
//! every exit path (including a dropped future) ends back in `Idle`.

use crate::backend::{BackendReply, MediaBackend, TransportError};
use crate::model::{
    ControllerEvent, DisplaySnapshot, DownloadKind, DownloadReceipt, OperationMode,
    OutcomeDisplay, RequestTarget, VideoMetadata,
};
use std::ops::{Deref, DerefMut};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

pub(crate) const MSG_URL_MISSING: &str = "Please enter a YouTube URL";
pub(crate) const MSG_URL_INVALID: &str = "Please enter a valid YouTube URL";
pub(crate) const MSG_INFO_LOADED: &str = "Video information loaded successfully";
pub(crate) const MSG_INFO_FAILED: &str = "Failed to fetch video info";
pub(crate) const MSG_VIDEO_FAILED: &str = "Failed to download video";
pub(crate) const MSG_AUDIO_FAILED: &str = "Failed to download audio";
pub(crate) const MSG_UNREACHABLE: &str =
    "Failed to connect to backend. Make sure the backend server is running.";

const ACCEPTED_HOSTS: [&str; 2] = ["youtube.com", "youtu.be"];

/// Why an operation ended without success. The same text is in the error message field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    /// Rejected before any request was sent.
    #[error("{0}")]
    Validation(String),

    /// The backend answered with a non-success status.
    #[error("{0}")]
    Application(String),

    /// The exchange did not complete or the reply was unreadable.
    #[error("{0}")]
    Transport(String),
}

pub struct OperationController<B> {
    backend: B,
    mode: OperationMode,
    target: RequestTarget,
    metadata: Option<VideoMetadata>,
    outcome: OutcomeDisplay,
    events: Option<UnboundedSender<ControllerEvent>>,
}

impl<B: MediaBackend> OperationController<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            mode: OperationMode::Idle,
            target: RequestTarget::default(),
            metadata: None,
            outcome: OutcomeDisplay::default(),
            events: None,
        }
    }

    /// Publish a snapshot to `tx` after every state change.
    pub fn with_events(mut self, tx: UnboundedSender<ControllerEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    #[cfg(test)]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn mode(&self) -> OperationMode {
        self.mode
    }

    pub fn target(&self) -> &RequestTarget {
        &self.target
    }

    pub fn metadata(&self) -> Option<&VideoMetadata> {
        self.metadata.as_ref()
    }

    pub fn outcome(&self) -> &OutcomeDisplay {
        &self.outcome
    }

    pub fn snapshot(&self) -> DisplaySnapshot {
        DisplaySnapshot {
            mode: self.mode,
            target: self.target.clone(),
            metadata: self.metadata.clone(),
            outcome: self.outcome.clone(),
        }
    }

    /// Replace the URL. Ignored unless idle; returns whether it was applied.
    pub fn set_url(&mut self, url: impl Into<String>) -> bool {
        if !self.mode.is_idle() {
            return false;
        }
        self.target.url = url.into();
        self.publish();
        true
    }

    /// Set the playlist toggle. Ignored unless idle; returns whether it was applied.
    pub fn set_playlist(&mut self, on: bool) -> bool {
        if !self.mode.is_idle() {
            return false;
        }
        self.target.is_playlist = on;
        self.publish();
        true
    }

    pub async fn request_info(&mut self) -> Result<(), OperationError> {
        let url = self.validated_url()?;
        let mut op = self.begin(OperationMode::FetchInfo, None);
        let reply = op.backend.video_info(&url).await;
        op.settle_info(reply)
    }

    /// Download the target as `kind`; single item or playlist per the current toggle.
    pub async fn request_download(&mut self, kind: DownloadKind) -> Result<(), OperationError> {
        let url = self.validated_url()?;
        let playlist = self.target.is_playlist;
        let mode = OperationMode::for_download(kind, playlist);
        let mut op = self.begin(mode, Some(in_progress_message(kind, playlist)));
        let reply = op.backend.download(kind.endpoint(playlist), &url).await;
        op.settle_download(kind, playlist, reply)
    }

    fn validated_url(&mut self) -> Result<String, OperationError> {
        let url = self.target.url.trim();
        let rejection = if url.is_empty() {
            Some(MSG_URL_MISSING)
        } else if !ACCEPTED_HOSTS.iter().any(|h| url.contains(h)) {
            Some(MSG_URL_INVALID)
        } else {
            None
        };
        match rejection {
            None => Ok(url.to_string()),
            Some(msg) => {
                debug!(url, reason = msg, "rejected input");
                self.fail(OperationError::Validation(msg.into()))
            }
        }
    }

    /// Enter `mode`: clear the outcome, show the optimistic status if any, publish.
    fn begin(&mut self, mode: OperationMode, optimistic: Option<&str>) -> InFlight<'_, B> {
        self.outcome = match optimistic {
            Some(msg) => OutcomeDisplay::status(msg),
            None => OutcomeDisplay::default(),
        };
        self.mode = mode;
        debug!(?mode, endpoint = mode.endpoint(), "operation started");
        self.publish();
        InFlight { ctrl: self }
    }

    fn settle_info(
        &mut self,
        reply: Result<BackendReply<VideoMetadata>, TransportError>,
    ) -> Result<(), OperationError> {
        match reply {
            Ok(BackendReply::Ok(meta)) => {
                info!(title = %meta.title, "video info loaded");
                self.metadata = Some(meta);
                self.outcome = OutcomeDisplay::status(MSG_INFO_LOADED);
                Ok(())
            }
            Ok(BackendReply::Failed { error }) => self.fail(OperationError::Application(
                non_empty(error).unwrap_or_else(|| MSG_INFO_FAILED.into()),
            )),
            Err(e) => self.transport_failed(e),
        }
    }

    fn settle_download(
        &mut self,
        kind: DownloadKind,
        playlist: bool,
        reply: Result<BackendReply<DownloadReceipt>, TransportError>,
    ) -> Result<(), OperationError> {
        match reply {
            Ok(BackendReply::Ok(receipt)) => {
                let detail = non_empty(receipt.filename)
                    .or(non_empty(receipt.message))
                    .unwrap_or_default();
                info!(?kind, playlist, detail = %detail, "download finished");
                self.outcome = OutcomeDisplay::status(format!(
                    "{} downloaded: {detail}",
                    success_label(kind, playlist)
                ));
                Ok(())
            }
            Ok(BackendReply::Failed { error }) => {
                let fallback = match kind {
                    DownloadKind::Video => MSG_VIDEO_FAILED,
                    DownloadKind::Audio => MSG_AUDIO_FAILED,
                };
                self.fail(OperationError::Application(
                    non_empty(error).unwrap_or_else(|| fallback.into()),
                ))
            }
            Err(e) => self.transport_failed(e),
        }
    }

    fn transport_failed(&mut self, e: TransportError) -> Result<(), OperationError> {
        warn!(error = %e, mode = ?self.mode, "backend exchange failed");
        self.fail(OperationError::Transport(MSG_UNREACHABLE.into()))
    }

    fn fail<T>(&mut self, err: OperationError) -> Result<T, OperationError> {
        if !matches!(err, OperationError::Validation(_)) {
            info!(error = %err, "operation failed");
        }
        self.outcome = OutcomeDisplay::error(err.to_string());
        // Validation never enters a mode, so nothing else will publish this outcome.
        if self.mode.is_idle() {
            self.publish();
        }
        Err(err)
    }

    fn publish(&self) {
        if let Some(tx) = &self.events {
            let _ = tx.send(ControllerEvent::Snapshot(Box::new(self.snapshot())));
        }
    }
}

/// Borrow of the controller for the duration of one exchange; dropping it returns to idle.
struct InFlight<'a, B: MediaBackend> {
    ctrl: &'a mut OperationController<B>,
}

impl<B: MediaBackend> Deref for InFlight<'_, B> {
    type Target = OperationController<B>;

    fn deref(&self) -> &Self::Target {
        self.ctrl
    }
}

impl<B: MediaBackend> DerefMut for InFlight<'_, B> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctrl
    }
}

impl<B: MediaBackend> Drop for InFlight<'_, B> {
    fn drop(&mut self) {
        debug!(mode = ?self.ctrl.mode, "operation settled");
        self.ctrl.mode = OperationMode::Idle;
        self.ctrl.publish();
    }
}

/// Backend text fields count as absent when blank.
fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.is_empty())
}

/// Status shown while a download is outstanding.
pub(crate) fn in_progress_message(kind: DownloadKind, playlist: bool) -> &'static str {
    match (kind, playlist) {
        (DownloadKind::Video, false) => "Downloading video... This may take a few minutes.",
        (DownloadKind::Audio, false) => "Downloading audio... This may take a few minutes.",
        (DownloadKind::Video, true) => {
            "Downloading playlist videos... This may take several minutes."
        }
        (DownloadKind::Audio, true) => {
            "Downloading playlist audio... This may take several minutes."
        }
    }
}

fn success_label(kind: DownloadKind, playlist: bool) -> &'static str {
    match (kind, playlist) {
        (DownloadKind::Video, false) => "Video",
        (DownloadKind::Audio, false) => "Audio",
        (DownloadKind::Video, true) => "Playlist videos",
        (DownloadKind::Audio, true) => "Playlist audio",
    }
}
