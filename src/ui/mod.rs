//! Terminal user interface components.
//!
//! The screen is a header panel (file, tonic, playback, SoundFont), the
//! output panel with the transcript, and a one-line status bar. Dialogs and
//! help are drawn as overlays on top.

mod dialogs;
mod header;
mod help;
mod output;

use crate::app::{App, InputMode, Theme};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use ratatui::Frame;

pub use dialogs::{render_file_browser, render_save_dialog};
pub use header::render_header;
pub use help::render_help;
pub use output::render_output;

/// Colours for one theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Color,
    pub panel: Color,
    pub text: Color,
    pub muted: Color,
    pub border: Color,
    pub accent: Color,
    pub key: Color,
    pub error: Color,
    pub success: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Palette {
                background: Color::White,
                panel: Color::White,
                text: Color::Black,
                muted: Color::DarkGray,
                border: Color::Gray,
                accent: Color::Blue,
                key: Color::Magenta,
                error: Color::Red,
                success: Color::Green,
            },
            Theme::Dark => Palette {
                background: Color::Rgb(0x2e, 0x2e, 0x2e),
                panel: Color::Rgb(0x33, 0x33, 0x33),
                text: Color::White,
                muted: Color::Gray,
                border: Color::DarkGray,
                accent: Color::Cyan,
                key: Color::Yellow,
                error: Color::LightRed,
                success: Color::LightGreen,
            },
        }
    }

    /// Base style for panel contents.
    pub fn base(&self) -> Style {
        Style::default().fg(self.text).bg(self.panel)
    }
}

/// Renders the complete UI.
pub fn render(frame: &mut Frame, app: &App) {
    let palette = Palette::for_theme(app.theme);
    let size = frame.area();

    frame.render_widget(
        Block::default().style(Style::default().bg(palette.background)),
        size,
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Header
            Constraint::Min(5),    // Output
            Constraint::Length(1), // Status bar
        ])
        .split(size);

    render_header(frame, chunks[0], app, &palette);
    render_output(frame, chunks[1], app, &palette);
    render_status_bar(frame, chunks[2], app, &palette);

    // Overlays
    render_file_browser(frame, app, &palette);
    render_save_dialog(frame, app, &palette);
    if app.show_help {
        render_help(frame, app.help_scroll, &palette);
    }
}

/// Status message if one is showing, otherwise key hints.
fn render_status_bar(frame: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let line = if let Some((msg, _)) = &app.status_message {
        Line::from(Span::styled(
            msg.as_str(),
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::ITALIC),
        ))
    } else {
        let hints: &[(&str, &str)] = match app.input_mode {
            InputMode::EditingTonic => &[("Enter", "apply"), ("Esc", "cancel")],
            InputMode::Normal => &[
                ("o", "open"),
                ("t", "tonic"),
                ("p", "play"),
                ("Space", "pause/resume"),
                ("x", "stop"),
                ("s", "save"),
                ("d", "dark mode"),
                ("?", "help"),
                ("q", "quit"),
            ],
        };
        Line::from(
            hints
                .iter()
                .flat_map(|(key, action)| {
                    [
                        Span::styled(
                            format!(" {}", key),
                            Style::default()
                                .fg(palette.key)
                                .add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(format!(" {} ", action), Style::default().fg(palette.muted)),
                    ]
                })
                .collect::<Vec<_>>(),
        )
    };

    frame.render_widget(
        Paragraph::new(line).style(Style::default().bg(palette.background)),
        area,
    );
}

/// Helper function to center a rectangle within another rectangle.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
