mod clipboard;
mod help;
mod state;

use crate::backend::HttpBackend;
use crate::format::{format_count, format_duration};
use crate::model::{ControllerEvent, OperationMode};
use crate::orchestrator::{self, UiCommand};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Terminal,
};
use state::{KeyAction, UiState};
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::warn;

pub async fn run() -> Result<()> {
    let backend = HttpBackend::new()?;
    let (event_tx, event_rx) = mpsc::unbounded_channel::<ControllerEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_handle = std::thread::spawn(move || run_threaded(event_rx, cmd_tx));
    let controller = tokio::spawn(orchestrator::run_controller(backend, event_tx, cmd_rx));

    let joined = tokio::task::spawn_blocking(move || ui_handle.join())
        .await
        .context("join TUI thread")?;

    // The UI is gone; any exchange still in flight is abandoned with it.
    controller.abort();
    match controller.await {
        Ok(res) => res?,
        Err(e) if e.is_cancelled() => {}
        Err(e) => return Err(anyhow::anyhow!("controller task failed: {e}")),
    }

    match joined {
        Ok(res) => res,
        Err(_) => Err(anyhow::anyhow!("TUI thread panicked")),
    }
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    mut event_rx: UnboundedReceiver<ControllerEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only.
    let mut state = UiState {
        log_file: crate::logging::log_dir()
            .map(|d| d.join(crate::logging::LOG_FILE).display().to_string()),
        ..Default::default()
    };

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();
    let mut dirty = true;

    let res = loop {
        while let Ok(ev) = event_rx.try_recv() {
            state.apply_event(ev);
            dirty = true;
        }
        if state.stopped {
            break Ok(());
        }

        if dirty || last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
            dirty = false;
        }

        // Short poll timeout keeps the render loop responsive to controller events.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                dirty = true;
                match state.handle_key(k) {
                    KeyAction::Nothing => {}
                    KeyAction::Send(cmds) => {
                        for cmd in cmds {
                            if cmd_tx.send(cmd).is_err() {
                                warn!("controller channel closed");
                                state.stopped = true;
                            }
                        }
                    }
                    KeyAction::Copy(text) => {
                        state.info = match clipboard::copy_to_clipboard(&text) {
                            Ok(()) => "Copied to clipboard".into(),
                            Err(e) => format!("Copy failed: {e:#}"),
                        };
                    }
                    KeyAction::Quit => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3), // url
                Constraint::Length(3), // toggle + actions
                Constraint::Length(4), // outcome
                Constraint::Min(0),    // metadata / help
                Constraint::Length(1), // footer
            ]
            .as_ref(),
        )
        .split(area);

    draw_url_input(chunks[0], f, state);
    draw_controls(chunks[1], f, state);
    draw_outcome(chunks[2], f, state);
    if state.show_help {
        help::draw_help(chunks[3], f, state.log_file.as_deref());
    } else {
        draw_metadata(chunks[3], f, state);
    }
    draw_footer(chunks[4], f, state);
}

fn draw_url_input(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let busy = state.is_busy();
    let (text, style) = if state.input.is_empty() {
        (
            "https://www.youtube.com/watch?v=... or playlist URL".to_string(),
            Style::default().fg(Color::DarkGray),
        )
    } else if busy {
        (state.input.clone(), Style::default().fg(Color::Gray))
    } else {
        (state.input.clone(), Style::default())
    };

    // Scroll horizontally so the cursor stays visible.
    let inner_width = area.width.saturating_sub(2) as usize;
    let skip = state.cursor.saturating_sub(inner_width.saturating_sub(1));
    let visible: String = if state.input.is_empty() {
        text
    } else {
        text.chars().skip(skip).collect()
    };

    let p = Paragraph::new(Span::styled(visible, style))
        .block(Block::default().borders(Borders::ALL).title("YouTube URL"));
    f.render_widget(p, area);

    if !busy && !state.show_help {
        let x = area.x + 1 + (state.cursor - skip) as u16;
        f.set_cursor_position((x.min(area.right().saturating_sub(2)), area.y + 1));
    }
}

fn key_span(key: &str) -> Span<'static> {
    Span::styled(key.to_string(), Style::default().fg(Color::Magenta))
}

fn action_span(label: &str, active: bool, enabled: bool) -> Span<'static> {
    let style = if active {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else if enabled {
        Style::default()
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Span::styled(label.to_string(), style)
}

fn draw_controls(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let mode = state.snapshot.mode;
    let enabled = !state.is_busy();
    let video_active = matches!(
        mode,
        OperationMode::DownloadVideo | OperationMode::DownloadPlaylistVideo
    );
    let audio_active = matches!(
        mode,
        OperationMode::DownloadAudio | OperationMode::DownloadPlaylistAudio
    );
    let info_label = if mode == OperationMode::FetchInfo {
        mode.busy_label()
    } else {
        "Get Info"
    };
    let video_label = if video_active {
        mode.busy_label()
    } else {
        "Download Video"
    };
    let audio_label = if audio_active {
        mode.busy_label()
    } else {
        "Download Audio"
    };

    let checkbox = if state.playlist { "[x]" } else { "[ ]" };
    let lines = vec![
        Line::from(vec![
            key_span("F4 "),
            action_span(
                &format!("{checkbox} Download entire playlist (if URL is a playlist)"),
                false,
                enabled,
            ),
        ]),
        Line::from(vec![
            key_span("Enter "),
            action_span(info_label, mode == OperationMode::FetchInfo, enabled),
            Span::raw("   "),
            key_span("F2 "),
            action_span(video_label, video_active, enabled),
            Span::raw("   "),
            key_span("F3 "),
            action_span(audio_label, audio_active, enabled),
        ]),
    ];
    let p = Paragraph::new(lines).block(Block::default().borders(Borders::LEFT | Borders::RIGHT));
    f.render_widget(p, area);
}

fn draw_outcome(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let outcome = &state.snapshot.outcome;
    let mut lines = Vec::new();
    if let Some(msg) = outcome.status_message.as_deref() {
        lines.push(Line::from(vec![
            Span::styled("✓ ", Style::default().fg(Color::Green)),
            Span::styled(msg.to_string(), Style::default().fg(Color::Green)),
        ]));
    }
    if let Some(err) = outcome.error_message.as_deref() {
        lines.push(Line::from(vec![
            Span::styled("⚠ ", Style::default().fg(Color::Red)),
            Span::styled(err.to_string(), Style::default().fg(Color::Red)),
        ]));
    }
    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(p, area);
}

fn kv(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label:<10}"), Style::default().fg(Color::Gray)),
        Span::raw(value),
    ])
}

fn draw_metadata(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Video Information");
    let Some(meta) = state.snapshot.metadata.as_ref() else {
        let p = Paragraph::new(Line::from(Span::styled(
            "Press Enter to load video information",
            Style::default().fg(Color::DarkGray),
        )))
        .block(block);
        f.render_widget(p, area);
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(
            meta.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        kv("Uploader", meta.uploader.clone()),
        kv("Duration", format_duration(meta.duration_seconds)),
        kv("Views", format_count(meta.view_count)),
    ];
    if !meta.thumbnail_url.is_empty() {
        lines.push(kv("Thumbnail", meta.thumbnail_url.clone()));
    }
    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(block);
    f.render_widget(p, area);
}

fn draw_footer(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let mode = state.snapshot.mode;
    let mut spans = vec![
        Span::styled(
            format!(" {} ", mode.busy_label()),
            if mode.is_idle() {
                Style::default().fg(Color::Black).bg(Color::Green)
            } else {
                Style::default().fg(Color::Black).bg(Color::Yellow)
            },
        ),
        Span::raw("  F1 help  Esc quit"),
    ];
    if !state.info.is_empty() {
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(
            state.info.clone(),
            Style::default().fg(Color::Cyan),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
