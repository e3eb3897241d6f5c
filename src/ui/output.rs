//! Scrollable output panel with the transcript and error lines.

use super::Palette;
use crate::app::App;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

pub fn render_output(frame: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let title = match &app.conversion {
        Some(result) => format!(
            " Output ({} swaras, tonic {}) ",
            result.entries.len(),
            result.tonic
        ),
        None => " Output ".to_string(),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .style(palette.base());

    let lines: Vec<Line> = app
        .output
        .lines()
        .map(|line| {
            let style = if line.starts_with("Error:") {
                Style::default().fg(palette.error)
            } else if line.ends_with(':') || line.starts_with("Identified Raga:") {
                Style::default()
                    .fg(palette.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(palette.text)
            };
            Line::from(Span::styled(line, style))
        })
        .collect();

    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((app.output_scroll, 0)),
        area,
    );
}
