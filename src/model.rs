use serde::{Deserialize, Deserializer, Serialize};

pub const INFO_ENDPOINT: &str = "/api/video-info";

/// What the controller is doing right now. Exactly one value is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationMode {
    #[default]
    Idle,
    FetchInfo,
    DownloadVideo,
    DownloadAudio,
    DownloadPlaylistVideo,
    DownloadPlaylistAudio,
}

impl OperationMode {
    pub fn is_idle(self) -> bool {
        self == OperationMode::Idle
    }

    /// Mode entered by a download of `kind`, given the playlist toggle.
    pub fn for_download(kind: DownloadKind, playlist: bool) -> Self {
        match (kind, playlist) {
            (DownloadKind::Video, false) => OperationMode::DownloadVideo,
            (DownloadKind::Audio, false) => OperationMode::DownloadAudio,
            (DownloadKind::Video, true) => OperationMode::DownloadPlaylistVideo,
            (DownloadKind::Audio, true) => OperationMode::DownloadPlaylistAudio,
        }
    }

    /// Backend path serving this mode. `None` for `Idle`.
    pub fn endpoint(self) -> Option<&'static str> {
        match self {
            OperationMode::Idle => None,
            OperationMode::FetchInfo => Some(INFO_ENDPOINT),
            OperationMode::DownloadVideo => Some(DownloadKind::Video.endpoint(false)),
            OperationMode::DownloadAudio => Some(DownloadKind::Audio.endpoint(false)),
            OperationMode::DownloadPlaylistVideo => Some(DownloadKind::Video.endpoint(true)),
            OperationMode::DownloadPlaylistAudio => Some(DownloadKind::Audio.endpoint(true)),
        }
    }

    /// Short label for busy indicators.
    pub fn busy_label(self) -> &'static str {
        match self {
            OperationMode::Idle => "Ready",
            OperationMode::FetchInfo => "Loading...",
            _ => "Downloading...",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadKind {
    Video,
    Audio,
}

impl DownloadKind {
    pub fn endpoint(self, playlist: bool) -> &'static str {
        match (self, playlist) {
            (DownloadKind::Video, false) => "/api/download-video",
            (DownloadKind::Audio, false) => "/api/download-audio",
            (DownloadKind::Video, true) => "/api/download-playlist-video",
            (DownloadKind::Audio, true) => "/api/download-playlist-audio",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestTarget {
    pub url: String,
    pub is_playlist: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetadata {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(
        rename = "duration",
        default,
        deserialize_with = "whole_seconds"
    )]
    pub duration_seconds: u64,
    #[serde(rename = "thumbnail", default, deserialize_with = "null_as_default")]
    pub thumbnail_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub uploader: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub view_count: u64,
}

/// Status and error text shown to the user. A settled operation sets at most one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeDisplay {
    pub status_message: Option<String>,
    pub error_message: Option<String>,
}

impl OutcomeDisplay {
    pub fn status(msg: impl Into<String>) -> Self {
        Self {
            status_message: Some(msg.into()),
            error_message: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            status_message: None,
            error_message: Some(msg.into()),
        }
    }
}

/// Read-only view of the controller handed to presentation layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySnapshot {
    pub mode: OperationMode,
    pub target: RequestTarget,
    pub metadata: Option<VideoMetadata>,
    pub outcome: OutcomeDisplay,
}

/// JSON body shared by every POST endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct UrlRequest<'a> {
    pub url: &'a str,
}

/// Success body of the download endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadReceipt {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

/// Failure body shared by every endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadListing {
    pub filename: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub created: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct DownloadListingBody {
    #[serde(default)]
    pub files: Vec<DownloadListing>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// Events emitted by the controller loop and consumed by UI/CLI layers.
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    Snapshot(Box<DisplaySnapshot>),
    /// A triggered operation has been fully handled (including rejected input).
    Ready,
    /// The loop has stopped and will emit nothing further.
    Stopped,
}

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

// yt-dlp reports some durations as floats.
fn whole_seconds<'de, D>(d: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<f64>::deserialize(d)?;
    Ok(v.filter(|s| s.is_finite() && *s > 0.0)
        .map(|s| s.trunc() as u64)
        .unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_modes_follow_kind_and_playlist() {
        assert_eq!(
            OperationMode::for_download(DownloadKind::Video, false),
            OperationMode::DownloadVideo
        );
        assert_eq!(
            OperationMode::for_download(DownloadKind::Audio, true),
            OperationMode::DownloadPlaylistAudio
        );
        assert_eq!(
            OperationMode::DownloadPlaylistVideo.endpoint(),
            Some("/api/download-playlist-video")
        );
        assert_eq!(OperationMode::Idle.endpoint(), None);
    }

    #[test]
    fn mode_serializes_kebab_case() {
        let s = serde_json::to_string(&OperationMode::DownloadPlaylistAudio).unwrap();
        assert_eq!(s, "\"download-playlist-audio\"");
    }

    #[test]
    fn metadata_tolerates_nulls_and_float_duration() {
        let m: VideoMetadata = serde_json::from_str(
            r#"{"title":"T","duration":125.7,"thumbnail":null,"uploader":"U","view_count":null,"formats":[]}"#,
        )
        .unwrap();
        assert_eq!(m.title, "T");
        assert_eq!(m.duration_seconds, 125);
        assert_eq!(m.thumbnail_url, "");
        assert_eq!(m.view_count, 0);
    }
}
