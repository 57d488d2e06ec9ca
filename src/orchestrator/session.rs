//! Command loop around the operation controller.
//!
//! Presentation layers send [`UiCommand`]s; each one is applied to the controller
//! in arrival order and the resulting snapshots flow back as [`ControllerEvent`]s.
//! Operations are awaited inline, so at most one exchange is ever in flight.

use super::controller::OperationController;
use crate::backend::MediaBackend;
use crate::model::{ControllerEvent, DownloadKind};
use anyhow::Result;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

/// Commands emitted by UI layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum UiCommand {
    SetUrl(String),
    SetPlaylist(bool),
    FetchInfo,
    Download(DownloadKind),
    Quit,
}

/// Apply UI commands to a fresh controller until `Quit` or the command channel closes.
pub(crate) async fn run_controller<B: MediaBackend>(
    backend: B,
    event_tx: UnboundedSender<ControllerEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut ctrl = OperationController::new(backend).with_events(event_tx.clone());
    let _ = event_tx.send(ControllerEvent::Snapshot(Box::new(ctrl.snapshot())));

    while let Some(cmd) = cmd_rx.recv().await {
        debug!(?cmd, mode = ?ctrl.mode(), "ui command");
        match cmd {
            UiCommand::SetUrl(url) => {
                ctrl.set_url(url);
            }
            UiCommand::SetPlaylist(on) => {
                ctrl.set_playlist(on);
            }
            // Failures are already reflected in the published outcome.
            UiCommand::FetchInfo => {
                let _ = ctrl.request_info().await;
                let _ = event_tx.send(ControllerEvent::Ready);
            }
            UiCommand::Download(kind) => {
                let _ = ctrl.request_download(kind).await;
                let _ = event_tx.send(ControllerEvent::Ready);
            }
            UiCommand::Quit => break,
        }
    }

    info!("controller stopped");
    let _ = event_tx.send(ControllerEvent::Stopped);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendReply;
    use crate::model::{DownloadReceipt, OperationMode};
    use crate::orchestrator::controller::tests::ScriptedBackend;
    use tokio::sync::mpsc;

    fn receipt(name: &str) -> DownloadReceipt {
        DownloadReceipt {
            filename: Some(name.into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn playlist_toggle_applies_to_the_next_operation_only() {
        let backend = ScriptedBackend::default();
        backend.push_download(Ok(BackendReply::Ok(receipt("one.mp4"))));
        backend.push_download(Ok(BackendReply::Ok(receipt("list"))));
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        for cmd in [
            UiCommand::SetUrl("https://www.youtube.com/watch?v=a&list=PL1".into()),
            UiCommand::Download(DownloadKind::Video),
            UiCommand::SetPlaylist(true),
            UiCommand::Download(DownloadKind::Video),
            UiCommand::Quit,
        ] {
            cmd_tx.send(cmd).unwrap();
        }
        run_controller(backend, event_tx, cmd_rx).await.unwrap();

        let mut modes = Vec::new();
        let mut last = None;
        let mut stopped = false;
        let mut ready = 0;
        while let Ok(ev) = event_rx.try_recv() {
            match ev {
                ControllerEvent::Snapshot(s) => {
                    modes.push(s.mode);
                    last = Some(*s);
                }
                ControllerEvent::Ready => ready += 1,
                ControllerEvent::Stopped => stopped = true,
            }
        }
        assert!(stopped);
        assert_eq!(ready, 2);
        assert!(modes.contains(&OperationMode::DownloadVideo));
        assert!(modes.contains(&OperationMode::DownloadPlaylistVideo));
        let last = last.unwrap();
        assert_eq!(last.mode, OperationMode::Idle);
        assert!(last.target.is_playlist);
        assert_eq!(
            last.outcome.status_message.as_deref(),
            Some("Playlist videos downloaded: list")
        );
    }

    #[tokio::test]
    async fn closed_command_channel_stops_the_loop() {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();
        drop(cmd_tx);

        run_controller(ScriptedBackend::default(), event_tx, cmd_rx)
            .await
            .unwrap();

        let mut saw_stopped = false;
        while let Ok(ev) = event_rx.try_recv() {
            saw_stopped |= matches!(ev, ControllerEvent::Stopped);
        }
        assert!(saw_stopped);
    }
}
