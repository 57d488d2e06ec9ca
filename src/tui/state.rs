use crate::model::{ControllerEvent, DisplaySnapshot, DownloadKind};
use crate::orchestrator::UiCommand;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// What the event loop should do after a key press.
#[derive(Debug, PartialEq, Eq)]
pub enum KeyAction {
    Nothing,
    Send(Vec<UiCommand>),
    Copy(String),
    Quit,
}

#[derive(Default)]
pub struct UiState {
    /// Last state published by the controller.
    pub snapshot: DisplaySnapshot,
    /// URL being edited; pushed to the controller with each trigger.
    pub input: String,
    /// Cursor position in `input`, in chars.
    pub cursor: usize,
    /// Local mirror of the playlist toggle so repeated presses don't race the controller.
    pub playlist: bool,
    /// A trigger was sent and the controller has not reported it handled yet.
    pub awaiting: bool,
    pub show_help: bool,
    pub info: String,
    pub stopped: bool,
    pub log_file: Option<String>,
}

impl UiState {
    /// Triggers and edits are refused while this is true.
    pub fn is_busy(&self) -> bool {
        self.awaiting || !self.snapshot.mode.is_idle()
    }

    pub fn apply_event(&mut self, ev: ControllerEvent) {
        match ev {
            ControllerEvent::Snapshot(s) => self.snapshot = *s,
            ControllerEvent::Ready => self.awaiting = false,
            ControllerEvent::Stopped => self.stopped = true,
        }
    }

    pub fn handle_key(&mut self, k: KeyEvent) -> KeyAction {
        let ctrl = k.modifiers.contains(KeyModifiers::CONTROL);
        match (ctrl, k.code) {
            (_, KeyCode::Esc) | (true, KeyCode::Char('c')) => KeyAction::Quit,
            (_, KeyCode::F(1)) => {
                self.show_help = !self.show_help;
                KeyAction::Nothing
            }
            (_, KeyCode::Enter) => self.trigger(UiCommand::FetchInfo),
            (_, KeyCode::F(2)) | (true, KeyCode::Char('d')) => {
                self.trigger(UiCommand::Download(DownloadKind::Video))
            }
            (_, KeyCode::F(3)) | (true, KeyCode::Char('a')) => {
                self.trigger(UiCommand::Download(DownloadKind::Audio))
            }
            (_, KeyCode::F(4)) | (true, KeyCode::Char('p')) => {
                if self.is_busy() {
                    return KeyAction::Nothing;
                }
                self.playlist = !self.playlist;
                KeyAction::Send(vec![UiCommand::SetPlaylist(self.playlist)])
            }
            (_, KeyCode::F(5)) | (true, KeyCode::Char('y')) => {
                let outcome = &self.snapshot.outcome;
                match outcome
                    .status_message
                    .as_ref()
                    .or(outcome.error_message.as_ref())
                {
                    Some(text) => KeyAction::Copy(text.clone()),
                    None => {
                        self.info = "Nothing to copy".into();
                        KeyAction::Nothing
                    }
                }
            }
            (true, KeyCode::Char('u')) => {
                if !self.is_busy() {
                    self.input.clear();
                    self.cursor = 0;
                }
                KeyAction::Nothing
            }
            (false, code) => {
                if !self.is_busy() {
                    self.edit(code);
                }
                KeyAction::Nothing
            }
            _ => KeyAction::Nothing,
        }
    }

    fn trigger(&mut self, cmd: UiCommand) -> KeyAction {
        if self.is_busy() {
            return KeyAction::Nothing;
        }
        self.awaiting = true;
        self.info.clear();
        KeyAction::Send(vec![UiCommand::SetUrl(self.input.clone()), cmd])
    }

    fn byte_index(&self, char_idx: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    fn edit(&mut self, code: KeyCode) {
        let len = self.input.chars().count();
        match code {
            KeyCode::Char(c) => {
                let at = self.byte_index(self.cursor);
                self.input.insert(at, c);
                self.cursor += 1;
            }
            KeyCode::Backspace if self.cursor > 0 => {
                self.cursor -= 1;
                let at = self.byte_index(self.cursor);
                self.input.remove(at);
            }
            KeyCode::Delete if self.cursor < len => {
                let at = self.byte_index(self.cursor);
                self.input.remove(at);
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(len),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = len,
            _ => {}
        }
    }
}
