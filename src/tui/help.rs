use crate::backend::API_BASE_URL;
use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

fn keybind(keys: &str, action: &str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("{keys:<16}"), Style::default().fg(Color::Magenta)),
        Span::raw(action.to_string()),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame, log_file: Option<&str>) {
    let mut lines = vec![
        Line::from("Keybinds:"),
        keybind("Enter", "Get video info"),
        keybind("F2 / Ctrl-D", "Download video"),
        keybind("F3 / Ctrl-A", "Download audio"),
        keybind("F4 / Ctrl-P", "Toggle playlist mode"),
        keybind("F5 / Ctrl-Y", "Copy status message"),
        keybind("Ctrl-U", "Clear URL"),
        keybind("F1", "Show/hide this help"),
        keybind("Esc / Ctrl-C", "Quit"),
        Line::from(""),
        Line::from("Actions are disabled while a request is running."),
        Line::from(""),
        Line::from(vec![
            Span::raw("Backend: "),
            Span::styled(API_BASE_URL, Style::default().fg(Color::Cyan)),
        ]),
        Line::from("Files are saved in the backend's downloads folder."),
    ];
    if let Some(path) = log_file {
        lines.push(Line::from(vec![
            Span::raw("Log: "),
            Span::styled(path.to_string(), Style::default().fg(Color::Gray)),
        ]));
    }
    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
