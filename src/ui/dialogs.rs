//! Dialog overlays for saving output and browsing files.

use super::{centered_rect, Palette};
use crate::app::{App, BrowserPurpose, SaveFormat};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph};
use ratatui::Frame;
use std::path::Path;

/// Truncates a path string to fit within max_width, adding "..." prefix if needed.
#[inline]
fn truncate_path(path_str: &str, max_width: usize) -> String {
    let count = path_str.chars().count();
    if count > max_width && max_width > 3 {
        let tail: String = path_str.chars().skip(count - (max_width - 3)).collect();
        format!("...{}", tail)
    } else {
        path_str.to_string()
    }
}

/// Extracts the display name from a path, returning "?" if extraction fails.
#[inline]
fn path_display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("?")
        .to_string()
}

/// A row of `[key] action` hints.
fn instructions<'a>(palette: &Palette, hints: &[(&'a str, &'a str)]) -> Line<'a> {
    Line::from(
        hints
            .iter()
            .flat_map(|(key, action)| {
                [
                    Span::styled(*key, Style::default().fg(palette.key)),
                    Span::styled(format!(" {}  ", action), Style::default().fg(palette.muted)),
                ]
            })
            .collect::<Vec<_>>(),
    )
}

/// Renders the save dialog overlay.
pub fn render_save_dialog(frame: &mut Frame, app: &App, palette: &Palette) {
    if !app.save_dialog.open {
        return;
    }

    let area = centered_rect(50, 30, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Save Output ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent))
        .style(palette.base());

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Label
            Constraint::Length(1), // Filename input
            Constraint::Length(1), // Spacer
            Constraint::Length(1), // Format selection
            Constraint::Length(1), // Spacer
            Constraint::Min(1),    // Instructions
        ])
        .split(inner);

    frame.render_widget(
        Paragraph::new(Span::styled("Filename:", Style::default().fg(palette.text))),
        chunks[0],
    );

    // Extension hint only when the name has none
    let has_extension = Path::new(app.save_dialog.filename.trim())
        .extension()
        .is_some();
    let extension = if has_extension {
        String::new()
    } else {
        format!(".{}", app.save_dialog.format.extension())
    };
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(
                app.save_dialog.filename.as_str(),
                Style::default()
                    .fg(palette.key)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "_",
                Style::default()
                    .fg(palette.text)
                    .add_modifier(Modifier::RAPID_BLINK),
            ),
            Span::styled(extension, Style::default().fg(palette.muted)),
        ])),
        chunks[1],
    );

    let format_style = |selected: bool| {
        if selected {
            Style::default()
                .fg(palette.success)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.muted)
        }
    };
    let is_text = app.save_dialog.format == SaveFormat::Text;
    let is_json = app.save_dialog.format == SaveFormat::Json;

    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("Format: ", Style::default().fg(palette.text)),
            Span::styled("[", Style::default().fg(palette.muted)),
            Span::styled(if is_text { "X" } else { " " }, format_style(is_text)),
            Span::styled("] Text  ", Style::default().fg(palette.muted)),
            Span::styled("[", Style::default().fg(palette.muted)),
            Span::styled(if is_json { "X" } else { " " }, format_style(is_json)),
            Span::styled("] JSON", Style::default().fg(palette.muted)),
        ])),
        chunks[3],
    );

    frame.render_widget(
        Paragraph::new(instructions(
            palette,
            &[("[Tab]", "Toggle format"), ("[Enter]", "Save"), ("[Esc]", "Cancel")],
        )),
        chunks[5],
    );
}

/// Renders the file browser dialog overlay.
pub fn render_file_browser(frame: &mut Frame, app: &App, palette: &Palette) {
    let browser = &app.file_browser;
    if !browser.open {
        return;
    }

    let area = centered_rect(60, 70, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(browser.purpose.title())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent))
        .style(palette.base());

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Current path
            Constraint::Length(1), // Separator
            Constraint::Min(5),    // File list
            Constraint::Length(1), // Instructions
        ])
        .split(inner);

    let path_str = browser.current_dir.display().to_string();
    let max_width = chunks[0].width.saturating_sub(2) as usize;
    frame.render_widget(
        Paragraph::new(Span::styled(
            truncate_path(&path_str, max_width),
            Style::default().fg(palette.accent),
        )),
        chunks[0],
    );

    let visible_height = chunks[2].height as usize;
    let start_idx = browser.scroll.min(browser.entries.len());
    let end_idx = (start_idx + visible_height).min(browser.entries.len());

    let has_files = browser.entries.iter().any(|p| p.is_file());
    let mut items: Vec<ListItem> = browser.entries[start_idx..end_idx]
        .iter()
        .enumerate()
        .map(|(i, path)| {
            let is_selected = start_idx + i == browser.selected;

            let (icon, name, style) = if path == Path::new("..") {
                (
                    "[..]",
                    "Parent Directory".to_string(),
                    Style::default().fg(palette.accent),
                )
            } else if path.is_dir() {
                ("[D]", path_display_name(path), Style::default().fg(palette.accent))
            } else {
                let icon = match browser.purpose {
                    BrowserPurpose::OpenMidi => "[M]",
                    BrowserPurpose::LoadSoundFont => "[SF2]",
                };
                (icon, path_display_name(path), Style::default().fg(palette.success))
            };

            let display_style = if is_selected {
                style.add_modifier(Modifier::REVERSED)
            } else {
                style
            };

            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", icon), Style::default().fg(palette.muted)),
                Span::styled(name, display_style),
            ]))
        })
        .collect();

    if !has_files {
        let message = match browser.purpose {
            BrowserPurpose::OpenMidi => "No MIDI files in this directory",
            BrowserPurpose::LoadSoundFont => "No SoundFont files in this directory",
        };
        items.push(ListItem::new(Line::from(Span::styled(
            message,
            Style::default()
                .fg(palette.muted)
                .add_modifier(Modifier::ITALIC),
        ))));
    }

    frame.render_widget(List::new(items), chunks[2]);

    frame.render_widget(
        Paragraph::new(instructions(
            palette,
            &[("[Up/Down]", "Navigate"), ("[Enter]", "Open"), ("[Esc]", "Cancel")],
        )),
        chunks[3],
    );
}
