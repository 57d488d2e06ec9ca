use anyhow::Result;
use std::sync::mpsc::{self, Sender};
use std::sync::OnceLock;
use tracing::warn;

static WORKER: OnceLock<Sender<String>> = OnceLock::new();

/// Owns the clipboard handle on its own thread. On X11/Wayland the copied text is
/// served by whoever holds the handle, so it stays open until the next copy.
fn worker() -> &'static Sender<String> {
    WORKER.get_or_init(|| {
        let (tx, rx) = mpsc::channel::<String>();
        std::thread::spawn(move || {
            let mut board: Option<arboard::Clipboard> = None;
            for text in rx {
                if board.is_none() {
                    board = arboard::Clipboard::new()
                        .map_err(|e| warn!(error = %e, "clipboard unavailable"))
                        .ok();
                }
                if let Some(b) = board.as_mut() {
                    if let Err(e) = b.set_text(text) {
                        warn!(error = %e, "clipboard write failed");
                        board = None;
                    }
                }
            }
        });
        tx
    })
}

/// Hand `text` to the clipboard thread; never blocks the UI.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    worker()
        .send(text.to_owned())
        .map_err(|_| anyhow::anyhow!("clipboard thread has exited"))
}
