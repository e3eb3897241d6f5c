//! Header panel: selected file, tonic field and playback status.

use super::Palette;
use crate::app::{App, InputMode, DEFAULT_TONIC};
use crate::audio::PlaybackState;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

/// Renders the header panel at the top of the screen.
pub fn render_header(frame: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let block = Block::default()
        .title(" MIDI to Carnatic Converter ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .style(palette.base());

    let label = Style::default().fg(palette.muted);
    let value = Style::default().fg(palette.text).add_modifier(Modifier::BOLD);

    let file = match &app.midi_path {
        Some(path) => Span::styled(path.display().to_string(), value),
        None => Span::styled("No file selected", label.add_modifier(Modifier::ITALIC)),
    };

    let editing = app.input_mode == InputMode::EditingTonic;
    let mut tonic = vec![
        Span::styled("Tonic:     ", label),
        Span::styled(
            app.tonic_input.as_str(),
            if editing {
                value.fg(palette.accent).add_modifier(Modifier::UNDERLINED)
            } else {
                value
            },
        ),
    ];
    if editing {
        tonic.push(Span::styled(
            "_",
            Style::default()
                .fg(palette.text)
                .add_modifier(Modifier::RAPID_BLINK),
        ));
    }
    tonic.push(Span::styled(format!("  (Default: {})", DEFAULT_TONIC), label));

    let state = app.playback_state();
    let state_color = match state {
        PlaybackState::Playing => palette.success,
        PlaybackState::Paused => palette.key,
        PlaybackState::Stopped => palette.error,
        PlaybackState::Idle => palette.muted,
    };
    let mut playback = vec![
        Span::styled("Playback:  ", label),
        Span::styled(
            state.label(),
            Style::default().fg(state_color).add_modifier(Modifier::BOLD),
        ),
    ];
    // The playing file can lag the selection after a failed conversion
    if let Some(name) = app
        .player
        .current_file()
        .filter(|_| state != PlaybackState::Idle)
        .and_then(|p| p.file_name())
    {
        playback.push(Span::styled(
            format!("  ({})", name.to_string_lossy()),
            label,
        ));
    }

    let soundfont = match app.player.soundfont_name() {
        Some(name) => Span::styled(name.to_string(), Style::default().fg(palette.text)),
        None => Span::styled("none (press f)", label.add_modifier(Modifier::ITALIC)),
    };

    let lines = vec![
        Line::from(vec![Span::styled("MIDI file: ", label), file]),
        Line::from(tonic),
        Line::from(playback),
        Line::from(vec![Span::styled("SoundFont: ", label), soundfont]),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
