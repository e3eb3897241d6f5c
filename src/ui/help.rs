//! Help overlay rendering.
//!
//! Displays keyboard shortcuts in a scrollable modal overlay.

use super::{centered_rect, Palette};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

/// Key binding entry for the help display.
struct KeyBinding {
    key: &'static str,
    description: &'static str,
}

const CONVERSION_BINDINGS: &[KeyBinding] = &[
    KeyBinding {
        key: "o",
        description: "Open a MIDI file, convert it and play it",
    },
    KeyBinding {
        key: "t",
        description: "Edit the tonic (Enter applies and re-converts)",
    },
    KeyBinding {
        key: "s",
        description: "Save output as text or JSON",
    },
];

const PLAYBACK_BINDINGS: &[KeyBinding] = &[
    KeyBinding {
        key: "p",
        description: "Play the selected file from the start",
    },
    KeyBinding {
        key: "a",
        description: "Pause",
    },
    KeyBinding {
        key: "r",
        description: "Resume",
    },
    KeyBinding {
        key: "Space",
        description: "Pause / Resume",
    },
    KeyBinding {
        key: "x / .",
        description: "Stop",
    },
    KeyBinding {
        key: "f",
        description: "Choose a SoundFont (.sf2)",
    },
];

const VIEW_BINDINGS: &[KeyBinding] = &[
    KeyBinding {
        key: "Up / Down",
        description: "Scroll output by one line",
    },
    KeyBinding {
        key: "PgUp / PgDn",
        description: "Scroll output by a page",
    },
    KeyBinding {
        key: "d",
        description: "Toggle dark mode",
    },
];

const GENERAL_BINDINGS: &[KeyBinding] = &[
    KeyBinding {
        key: "?",
        description: "Toggle this help",
    },
    KeyBinding {
        key: "q / Esc",
        description: "Quit",
    },
    KeyBinding {
        key: "Ctrl+C",
        description: "Force quit",
    },
];

/// Renders the help overlay.
pub fn render_help(frame: &mut Frame, scroll: u16, palette: &Palette) {
    let area = centered_rect(60, 70, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent))
        .style(palette.base());

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Scrollable content above a fixed footer
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    let section_style = Style::default()
        .fg(palette.key)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    let key_style = Style::default()
        .fg(palette.accent)
        .add_modifier(Modifier::BOLD);
    let desc_style = Style::default().fg(palette.text);

    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut add_section = |title: &'static str, bindings: &[KeyBinding]| {
        lines.push(Line::from(Span::styled(title, section_style)));
        for binding in bindings {
            lines.push(Line::from(vec![
                Span::styled(format!("{:15}", binding.key), key_style),
                Span::styled(binding.description, desc_style),
            ]));
        }
        lines.push(Line::from(""));
    };

    add_section("Conversion", CONVERSION_BINDINGS);
    add_section("Playback", PLAYBACK_BINDINGS);
    add_section("View", VIEW_BINDINGS);
    add_section("General", GENERAL_BINDINGS);

    frame.render_widget(Paragraph::new(lines).scroll((scroll, 0)), chunks[0]);

    let footer = Paragraph::new(Line::from(Span::styled(
        "Scroll: Up/Down  |  Close: ?/Esc",
        Style::default()
            .fg(palette.muted)
            .add_modifier(Modifier::ITALIC),
    )));
    frame.render_widget(footer, chunks[1]);
}
