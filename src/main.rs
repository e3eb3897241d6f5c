//! swaratui - MIDI to Carnatic swara converter for the terminal.
//!
//! Opens a MIDI file, names every note as a Carnatic swara relative to a
//! chosen tonic, lists the note timings, looks the sequence up in a small
//! raga table and plays the file through a SoundFont.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- --soundfont piano.sf2 song.mid
//! cargo run -- -t D song.mid
//! ```
//!
//! Press `?` for help with keyboard shortcuts.

use swaratui::app::{App, InputMode, DEFAULT_TONIC};
use swaratui::audio::Player;
use swaratui::ui;

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::time::Duration;

/// Lines moved by PgUp/PgDn.
const PAGE_LINES: u16 = 10;

/// Command-line options for the application.
#[derive(Debug, Default, PartialEq)]
struct CliOptions {
    /// Path to a SoundFont file for playback.
    soundfont: Option<PathBuf>,
    /// Initial tonic field value.
    tonic: Option<String>,
    /// MIDI file to convert on startup.
    midi: Option<PathBuf>,
}

/// What the command line asked for.
#[derive(Debug, PartialEq)]
enum CliCommand {
    Run(CliOptions),
    Help,
}

impl CliOptions {
    /// Parses command-line arguments, exiting on `--help` or bad input.
    fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let program = args.first().map(String::as_str).unwrap_or("swaratui");

        match Self::parse_from(args.iter().skip(1).map(String::as_str)) {
            Ok(CliCommand::Run(options)) => options,
            Ok(CliCommand::Help) => {
                print_usage(program);
                std::process::exit(0);
            }
            Err(message) => {
                eprintln!("Error: {}", message);
                eprintln!("Use --help for usage information");
                std::process::exit(1);
            }
        }
    }

    /// Supports:
    /// - `--soundfont <path>` or `-sf <path>`, or a bare `*.sf2`
    /// - `--tonic <note>` or `-t <note>`
    /// - a bare `*.mid` / `*.midi` to convert on startup
    /// - `--help` or `-h`
    fn parse_from<'a>(args: impl IntoIterator<Item = &'a str>) -> Result<CliCommand, String> {
        let mut options = CliOptions::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg {
                "--soundfont" | "-sf" => {
                    let path = args
                        .next()
                        .ok_or("--soundfont requires a path argument")?;
                    options.soundfont = Some(PathBuf::from(path));
                }
                "--tonic" | "-t" => {
                    let note = args.next().ok_or("--tonic requires a note argument")?;
                    options.tonic = Some(note.to_string());
                }
                "--help" | "-h" => return Ok(CliCommand::Help),
                other => {
                    let lower = other.to_ascii_lowercase();
                    if lower.ends_with(".sf2") {
                        options.soundfont = Some(PathBuf::from(other));
                    } else if lower.ends_with(".mid") || lower.ends_with(".midi") {
                        options.midi = Some(PathBuf::from(other));
                    } else {
                        return Err(format!("Unknown option: {}", other));
                    }
                }
            }
        }

        Ok(CliCommand::Run(options))
    }
}

fn print_usage(program: &str) {
    eprintln!("swaratui - MIDI to Carnatic swara converter");
    eprintln!();
    eprintln!("Usage: {} [OPTIONS] [FILE.mid]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -sf, --soundfont PATH  SoundFont (.sf2) used for playback");
    eprintln!("  -t, --tonic NOTE       Initial tonic (default: {})", DEFAULT_TONIC);
    eprintln!("  -h, --help             Print this help message");
    eprintln!();
    eprintln!("Without a SoundFont, conversion works and one can be chosen with `f`.");
}

fn main() -> Result<()> {
    // Parse CLI options first (before any terminal setup)
    let cli = CliOptions::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut player = Player::new();
    if let Some(path) = &cli.soundfont {
        if let Err(e) = player.load_soundfont(path) {
            tracing::warn!("SoundFont {:?} not loaded: {:#}", path, e);
            eprintln!("Warning: {:#}", e);
            eprintln!("Starting without audio. Press `f` to choose a SoundFont.");
        }
    }

    let tonic = cli.tonic.unwrap_or_else(|| DEFAULT_TONIC.to_string());
    let mut app = App::new(player, tonic);

    let mut terminal = setup_terminal().context("Failed to setup terminal")?;

    if let Some(path) = cli.midi {
        app.select_midi(path);
    }

    let result = run_app(&mut terminal, &mut app);

    restore_terminal(&mut terminal).context("Failed to restore terminal")?;

    result
}

/// Sets up the terminal for TUI rendering.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("Failed to create terminal")?;
    Ok(terminal)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

/// Main application loop.
fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    while !app.should_quit {
        app.tick();

        terminal.draw(|frame| ui::render(frame, app))?;

        // Short timeout so playback state is picked up promptly
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(app, key),
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::ScrollUp if app.show_help => {
                        app.help_scroll = app.help_scroll.saturating_sub(3);
                    }
                    MouseEventKind::ScrollDown if app.show_help => {
                        app.help_scroll = app.help_scroll.saturating_add(3);
                    }
                    MouseEventKind::ScrollUp => app.scroll_output_up(3),
                    MouseEventKind::ScrollDown => app.scroll_output_down(3),
                    _ => {}
                },
                _ => {}
            }
        }
    }

    Ok(())
}

/// Routes a key press to the topmost overlay, the tonic field, or the
/// normal bindings.
fn handle_key(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.show_help {
        match key.code {
            KeyCode::Char('?') | KeyCode::Esc => app.toggle_help(),
            KeyCode::Up | KeyCode::Char('k') => {
                app.help_scroll = app.help_scroll.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                app.help_scroll = app.help_scroll.saturating_add(1);
            }
            KeyCode::PageUp => app.help_scroll = app.help_scroll.saturating_sub(PAGE_LINES),
            KeyCode::PageDown => app.help_scroll = app.help_scroll.saturating_add(PAGE_LINES),
            KeyCode::Home => app.help_scroll = 0,
            _ => {}
        }
        return;
    }

    if app.save_dialog.open {
        match key.code {
            KeyCode::Enter => {
                app.save_dialog_confirm();
            }
            KeyCode::Esc => app.save_dialog_cancel(),
            KeyCode::Tab => app.save_dialog_toggle_format(),
            KeyCode::Backspace => app.save_dialog_backspace(),
            KeyCode::Char(c) => app.save_dialog_input(c),
            _ => {}
        }
        return;
    }

    if app.file_browser.open {
        match key.code {
            KeyCode::Enter => app.file_browser_select(),
            KeyCode::Esc => app.file_browser_cancel(),
            KeyCode::Up | KeyCode::Char('k') => app.file_browser_up(),
            KeyCode::Down | KeyCode::Char('j') => app.file_browser_down(),
            _ => {}
        }
        return;
    }

    if app.input_mode == InputMode::EditingTonic {
        match key.code {
            KeyCode::Enter => app.confirm_tonic(),
            KeyCode::Esc => app.cancel_tonic_edit(),
            KeyCode::Backspace => app.tonic_backspace(),
            KeyCode::Char(c) => app.tonic_input_char(c),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('?') => app.toggle_help(),

        KeyCode::Char('o') => app.open_midi_browser(),
        KeyCode::Char('t') => app.start_tonic_edit(),
        KeyCode::Char('s') => app.open_save_dialog(),
        KeyCode::Char('f') => app.open_soundfont_browser(),
        KeyCode::Char('d') => app.toggle_theme(),

        KeyCode::Char('p') => app.play_selected(),
        KeyCode::Char('a') => app.pause_playback(),
        KeyCode::Char('r') => app.resume_playback(),
        KeyCode::Char(' ') => app.toggle_pause(),
        KeyCode::Char('x') | KeyCode::Char('.') => app.stop_playback(),

        KeyCode::Up | KeyCode::Char('k') => app.scroll_output_up(1),
        KeyCode::Down | KeyCode::Char('j') => app.scroll_output_down(1),
        KeyCode::PageUp => app.scroll_output_up(PAGE_LINES),
        KeyCode::PageDown => app.scroll_output_down(PAGE_LINES),
        KeyCode::Home => app.output_scroll = 0,
        _ => {}
    }
}
