//! Text rendering of controller state for one-shot CLI output.

use crate::format::{format_bytes, format_count, format_duration, format_timestamp};
use crate::model::{DownloadListing, OutcomeDisplay, VideoMetadata};

/// Pre-formatted lines for text output. `error` goes to stderr.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
    pub error: Option<String>,
}

/// Build a text summary from a settled outcome and whatever metadata is loaded.
pub(crate) fn build_text_summary(
    outcome: &OutcomeDisplay,
    metadata: Option<&VideoMetadata>,
) -> TextSummary {
    let mut lines = Vec::new();

    if let Some(status) = outcome.status_message.as_deref() {
        lines.push(status.to_string());
    }

    if let Some(meta) = metadata {
        lines.push(format!("Title:     {}", meta.title));
        lines.push(format!("Uploader:  {}", meta.uploader));
        lines.push(format!("Duration:  {}", format_duration(meta.duration_seconds)));
        lines.push(format!("Views:     {}", format_count(meta.view_count)));
        if !meta.thumbnail_url.is_empty() {
            lines.push(format!("Thumbnail: {}", meta.thumbnail_url));
        }
    }

    TextSummary {
        lines,
        error: outcome.error_message.clone(),
    }
}

/// One line per file: size, creation time, name.
pub(crate) fn build_listing_lines(files: &[DownloadListing]) -> Vec<String> {
    if files.is_empty() {
        return vec!["No downloads yet".to_string()];
    }
    files
        .iter()
        .map(|f| {
            format!(
                "{:>10}  {}  {}",
                format_bytes(f.size),
                format_timestamp(f.created),
                f.filename
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_summary_lists_metadata() {
        let meta = VideoMetadata {
            title: "T".into(),
            duration_seconds: 3661,
            thumbnail_url: String::new(),
            uploader: "U".into(),
            view_count: 12345,
        };
        let outcome = OutcomeDisplay::status("Video information loaded successfully");
        let s = build_text_summary(&outcome, Some(&meta));
        assert_eq!(s.lines[0], "Video information loaded successfully");
        assert!(s.lines.contains(&"Duration:  1:01:01".to_string()));
        assert!(s.lines.contains(&"Views:     12,345".to_string()));
        assert!(!s.lines.iter().any(|l| l.starts_with("Thumbnail")));
        assert!(s.error.is_none());
    }

    #[test]
    fn error_goes_to_its_own_channel() {
        let s = build_text_summary(&OutcomeDisplay::error("bad url"), None);
        assert!(s.lines.is_empty());
        assert_eq!(s.error.as_deref(), Some("bad url"));
    }

    #[test]
    fn empty_listing_says_so() {
        assert_eq!(build_listing_lines(&[]), vec!["No downloads yet"]);
    }
}
