//! Application state and event handling.
//!
//! This module defines the state shared by the key handlers in `main.rs` and
//! the renderers in `ui`: the selected MIDI file, the tonic field, the last
//! conversion, the output text and the dialogs, plus the playback controller.

use crate::audio::{PlaybackState, Player};
use crate::error::ExportError;
use crate::swara::{convert_file, ConversionResult};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Tonic shown in the tonic field at startup.
pub const DEFAULT_TONIC: &str = "C";

/// How long a status message stays visible.
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// Number of browser rows assumed visible when scrolling.
const BROWSER_VISIBLE_ROWS: usize = 10;

/// Colour palette selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Where key presses go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    /// Typing into the tonic field.
    EditingTonic,
}

/// Save file format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveFormat {
    /// The same three sections shown on screen.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl SaveFormat {
    pub fn extension(self) -> &'static str {
        match self {
            SaveFormat::Text => "txt",
            SaveFormat::Json => "json",
        }
    }
}

/// State for the save dialog.
#[derive(Debug, Clone, Default)]
pub struct SaveDialogState {
    /// Whether the dialog is open.
    pub open: bool,
    /// The filename being edited.
    pub filename: String,
    /// Selected save format.
    pub format: SaveFormat,
}

impl SaveDialogState {
    /// Path the dialog would save to. The format's extension is added when
    /// the name has none.
    pub fn target_path(&self) -> PathBuf {
        let path = PathBuf::from(self.filename.trim());
        if path.extension().is_some() {
            path
        } else {
            path.with_extension(self.format.extension())
        }
    }
}

/// What the file browser is picking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrowserPurpose {
    #[default]
    OpenMidi,
    LoadSoundFont,
}

impl BrowserPurpose {
    /// File extensions listed for this purpose (lowercase).
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            BrowserPurpose::OpenMidi => &["mid", "midi"],
            BrowserPurpose::LoadSoundFont => &["sf2"],
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            BrowserPurpose::OpenMidi => " Open MIDI File ",
            BrowserPurpose::LoadSoundFont => " Select SoundFont ",
        }
    }

    fn accepts(self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .is_some_and(|e| self.extensions().contains(&e.as_str()))
    }
}

/// State for the file browser dialog.
#[derive(Debug, Clone)]
pub struct FileBrowserState {
    /// Whether the browser is open.
    pub open: bool,
    pub purpose: BrowserPurpose,
    /// Current directory path.
    pub current_dir: PathBuf,
    /// List of entries in current directory.
    pub entries: Vec<PathBuf>,
    /// Currently selected index.
    pub selected: usize,
    /// Scroll offset for long lists.
    pub scroll: usize,
}

impl Default for FileBrowserState {
    fn default() -> Self {
        Self {
            open: false,
            purpose: BrowserPurpose::default(),
            current_dir: std::env::current_dir().unwrap_or_default(),
            entries: Vec::new(),
            selected: 0,
            scroll: 0,
        }
    }
}

impl FileBrowserState {
    /// Opens the browser in `dir` for `purpose`.
    pub fn open_in(&mut self, purpose: BrowserPurpose, dir: PathBuf) {
        self.open = true;
        self.purpose = purpose;
        self.current_dir = dir;
        self.selected = 0;
        self.scroll = 0;
        self.refresh();
    }

    /// Re-reads the current directory: "..", then directories, then
    /// matching files, each group sorted.
    pub fn refresh(&mut self) {
        self.entries.clear();

        if self.current_dir.parent().is_some() {
            self.entries.push(PathBuf::from(".."));
        }

        match std::fs::read_dir(&self.current_dir) {
            Ok(entries) => {
                let mut dirs: Vec<PathBuf> = Vec::new();
                let mut files: Vec<PathBuf> = Vec::new();

                for entry in entries.flatten() {
                    let path = entry.path();
                    if path.is_dir() {
                        dirs.push(path);
                    } else if self.purpose.accepts(&path) {
                        files.push(path);
                    }
                }

                dirs.sort();
                files.sort();
                self.entries.extend(dirs);
                self.entries.extend(files);
            }
            Err(e) => {
                tracing::warn!("Cannot read directory {:?}: {}", self.current_dir, e);
            }
        }

        if self.selected >= self.entries.len() {
            self.selected = 0;
        }
    }

    pub fn up(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            if self.selected < self.scroll {
                self.scroll = self.selected;
            }
        }
    }

    pub fn down(&mut self) {
        if self.selected + 1 < self.entries.len() {
            self.selected += 1;
            if self.selected >= self.scroll + BROWSER_VISIBLE_ROWS {
                self.scroll = self.selected.saturating_sub(BROWSER_VISIBLE_ROWS - 1);
            }
        }
    }

    /// Activates the selected entry. Directories are entered; a file closes
    /// the browser and is returned.
    pub fn select(&mut self) -> Option<PathBuf> {
        let selected = self.entries.get(self.selected)?.clone();

        if selected == Path::new("..") {
            if let Some(parent) = self.current_dir.parent() {
                self.current_dir = parent.to_path_buf();
                self.selected = 0;
                self.scroll = 0;
                self.refresh();
            }
            None
        } else if selected.is_dir() {
            self.current_dir = selected;
            self.selected = 0;
            self.scroll = 0;
            self.refresh();
            None
        } else {
            self.open = false;
            Some(selected)
        }
    }
}

/// Main application state.
pub struct App {
    /// Set when the user asks to quit.
    pub should_quit: bool,
    pub input_mode: InputMode,
    /// Contents of the tonic field. Validated only when a conversion runs.
    pub tonic_input: String,
    /// Field value before the current edit, restored on cancel.
    tonic_before_edit: Option<String>,
    /// The file chosen in the browser or on the command line.
    pub midi_path: Option<PathBuf>,
    /// Result of the last successful conversion.
    pub conversion: Option<ConversionResult>,
    /// File that produced `conversion`. Differs from `midi_path` after a
    /// failed conversion of a newly selected file.
    pub converted_path: Option<PathBuf>,
    /// Text of the output panel.
    pub output: String,
    pub output_scroll: u16,
    /// Status message with timestamp.
    pub status_message: Option<(String, Instant)>,
    pub theme: Theme,
    pub file_browser: FileBrowserState,
    pub save_dialog: SaveDialogState,
    pub show_help: bool,
    pub help_scroll: u16,
    pub player: Player,
}

impl App {
    pub fn new(player: Player, tonic: impl Into<String>) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            tonic_input: tonic.into(),
            tonic_before_edit: None,
            midi_path: None,
            conversion: None,
            converted_path: None,
            output: String::new(),
            output_scroll: 0,
            status_message: None,
            theme: Theme::default(),
            file_browser: FileBrowserState::default(),
            save_dialog: SaveDialogState::default(),
            show_help: false,
            help_scroll: 0,
            player,
        }
    }

    /// Sets a status message to display temporarily.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
    }

    /// Clears expired status messages.
    pub fn clear_expired_status(&mut self) {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed() > STATUS_TIMEOUT {
                self.status_message = None;
            }
        }
    }

    /// Appends an `Error: ...` line to the output panel.
    ///
    /// Earlier output, including a previous transcript, is kept. Logged at
    /// debug level only: the subscriber writes to the terminal the TUI owns.
    pub fn report_error(&mut self, error: impl fmt::Display) {
        tracing::debug!("Reported to user: {}", error);
        self.output.push_str(&format!("Error: {}\n", error));
        self.set_status("Error, see output");
    }

    /// Per-frame housekeeping.
    pub fn tick(&mut self) {
        self.clear_expired_status();
        if self.player.poll() {
            self.set_status("Playback finished");
        }
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.player.state()
    }

    // ========== CONVERSION ==========

    /// Makes `path` the selected file, converts it and, on success, plays it.
    pub fn select_midi(&mut self, path: PathBuf) {
        self.midi_path = Some(path);
        if self.convert_selected() {
            self.play_selected();
        }
    }

    /// Converts the selected file with the current tonic field.
    ///
    /// On success the output panel shows exactly the new transcript. On
    /// failure the error is appended and the previous result stays.
    pub fn convert_selected(&mut self) -> bool {
        let Some(path) = self.midi_path.clone() else {
            self.report_error("No file selected");
            return false;
        };

        match convert_file(&path, &self.tonic_input) {
            Ok(result) => {
                self.output = result.render_text();
                self.output_scroll = 0;
                self.set_status(format!(
                    "Converted {} ({} swaras)",
                    path.display(),
                    result.entries.len()
                ));
                self.conversion = Some(result);
                self.converted_path = Some(path);
                true
            }
            Err(e) => {
                self.report_error(e);
                false
            }
        }
    }

    // ========== TONIC FIELD ==========

    pub fn start_tonic_edit(&mut self) {
        self.tonic_before_edit = Some(self.tonic_input.clone());
        self.input_mode = InputMode::EditingTonic;
        self.set_status("Editing tonic - Enter to apply, Esc to cancel");
    }

    pub fn tonic_input_char(&mut self, c: char) {
        if self.input_mode == InputMode::EditingTonic && !c.is_control() {
            self.tonic_input.push(c);
        }
    }

    pub fn tonic_backspace(&mut self) {
        if self.input_mode == InputMode::EditingTonic {
            self.tonic_input.pop();
        }
    }

    /// Ends the edit and re-converts the selected file, if any.
    pub fn confirm_tonic(&mut self) {
        self.input_mode = InputMode::Normal;
        self.tonic_before_edit = None;
        if self.midi_path.is_some() {
            self.convert_selected();
        } else {
            self.set_status(format!("Tonic: {}", self.tonic_input.trim()));
        }
    }

    pub fn cancel_tonic_edit(&mut self) {
        self.input_mode = InputMode::Normal;
        if let Some(previous) = self.tonic_before_edit.take() {
            self.tonic_input = previous;
        }
        self.set_status("Tonic edit cancelled");
    }

    // ========== PLAYBACK ==========

    /// Plays the selected file from the beginning.
    pub fn play_selected(&mut self) {
        let Some(path) = self.midi_path.clone() else {
            self.report_error("No file selected for playback.");
            return;
        };
        match self.player.play(&path) {
            Ok(()) => self.set_status("Playing"),
            Err(e) => self.report_error(e),
        }
    }

    pub fn pause_playback(&mut self) {
        match self.player.pause() {
            Ok(true) => self.set_status("Paused"),
            Ok(false) => self.set_status("Nothing is playing"),
            Err(e) => self.report_error(e),
        }
    }

    pub fn resume_playback(&mut self) {
        match self.player.resume() {
            Ok(true) => self.set_status("Playing"),
            Ok(false) => self.set_status("Nothing is paused"),
            Err(e) => self.report_error(e),
        }
    }

    /// Toggles play/pause state.
    pub fn toggle_pause(&mut self) {
        match self.player.state() {
            PlaybackState::Paused => self.resume_playback(),
            _ => self.pause_playback(),
        }
    }

    /// Stops playback and resets to beginning.
    pub fn stop_playback(&mut self) {
        match self.player.stop() {
            Ok(true) => self.set_status("Stopped"),
            Ok(false) => self.set_status("Nothing is playing"),
            Err(e) => self.report_error(e),
        }
    }

    /// Loads a new SoundFont and restarts the audio engine.
    pub fn load_soundfont(&mut self, path: PathBuf) -> bool {
        match self.player.load_soundfont(&path) {
            Ok(()) => {
                let name = self.player.soundfont_name().unwrap_or("unknown").to_string();
                self.set_status(format!("Loaded soundfont: {}", name));
                true
            }
            Err(e) => {
                self.report_error(format!("Failed to load SoundFont: {:#}", e));
                false
            }
        }
    }

    // ========== OUTPUT AND VIEW ==========

    pub fn output_line_count(&self) -> u16 {
        self.output.lines().count().min(u16::MAX as usize) as u16
    }

    pub fn scroll_output_up(&mut self, lines: u16) {
        self.output_scroll = self.output_scroll.saturating_sub(lines);
    }

    pub fn scroll_output_down(&mut self, lines: u16) {
        let max = self.output_line_count().saturating_sub(1);
        self.output_scroll = self.output_scroll.saturating_add(lines).min(max);
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        self.set_status(match self.theme {
            Theme::Dark => "Dark mode",
            Theme::Light => "Light mode",
        });
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
        self.help_scroll = 0;
    }

    // ========== FILE BROWSER ==========

    /// Opens the browser for MIDI files, starting next to the selected file.
    pub fn open_midi_browser(&mut self) {
        let dir = self
            .midi_path
            .as_ref()
            .and_then(|p| p.parent())
            .filter(|p| p.is_dir())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
        self.file_browser.open_in(BrowserPurpose::OpenMidi, dir);
    }

    pub fn open_soundfont_browser(&mut self) {
        let dir = std::env::current_dir().unwrap_or_default();
        self.file_browser.open_in(BrowserPurpose::LoadSoundFont, dir);
    }

    pub fn file_browser_up(&mut self) {
        self.file_browser.up();
    }

    pub fn file_browser_down(&mut self) {
        self.file_browser.down();
    }

    /// Selects the current entry; a chosen file is converted or loaded.
    pub fn file_browser_select(&mut self) {
        if let Some(path) = self.file_browser.select() {
            match self.file_browser.purpose {
                BrowserPurpose::OpenMidi => self.select_midi(path),
                BrowserPurpose::LoadSoundFont => {
                    self.load_soundfont(path);
                }
            }
        }
    }

    pub fn file_browser_cancel(&mut self) {
        self.file_browser.open = false;
        self.set_status("Cancelled");
    }

    // ========== SAVE DIALOG ==========

    /// Opens the save dialog with a default filename derived from the
    /// selected file.
    pub fn open_save_dialog(&mut self) {
        if self.conversion.is_none() {
            self.report_error(ExportError::NothingToExport);
            return;
        }

        let stem = self
            .converted_path
            .as_ref()
            .and_then(|p| p.file_stem())
            .and_then(|s| s.to_str())
            .unwrap_or("output");

        self.save_dialog.filename = format!("{}_swaras", stem);
        self.save_dialog.format = SaveFormat::Text;
        self.save_dialog.open = true;
    }

    /// Handles character input in the save dialog.
    pub fn save_dialog_input(&mut self, c: char) {
        if self.save_dialog.open && !c.is_control() {
            self.save_dialog.filename.push(c);
        }
    }

    /// Handles backspace in the save dialog.
    pub fn save_dialog_backspace(&mut self) {
        if self.save_dialog.open {
            self.save_dialog.filename.pop();
        }
    }

    pub fn save_dialog_toggle_format(&mut self) {
        if self.save_dialog.open {
            self.save_dialog.format = match self.save_dialog.format {
                SaveFormat::Text => SaveFormat::Json,
                SaveFormat::Json => SaveFormat::Text,
            };
        }
    }

    /// Confirms and executes the save.
    pub fn save_dialog_confirm(&mut self) -> bool {
        if !self.save_dialog.open || self.save_dialog.filename.trim().is_empty() {
            return false;
        }
        self.save_dialog.open = false;

        let path = self.save_dialog.target_path();
        match self.save_output(&path, self.save_dialog.format) {
            Ok(()) => {
                tracing::info!("Output saved to {:?}", path);
                self.set_status(format!("Saved: {}", path.display()));
                true
            }
            Err(e) => {
                self.report_error(format!("Save failed: {}", e));
                false
            }
        }
    }

    /// Cancels the save dialog.
    pub fn save_dialog_cancel(&mut self) {
        self.save_dialog.open = false;
        self.set_status("Save cancelled");
    }

    /// Writes the last conversion to `path`.
    pub fn save_output(&self, path: &Path, format: SaveFormat) -> Result<(), ExportError> {
        let conversion = self
            .conversion
            .as_ref()
            .ok_or(ExportError::NothingToExport)?;
        match format {
            SaveFormat::Text => conversion.save_text(path),
            SaveFormat::Json => conversion.save_json(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::build_smf;
    use crate::swara::read_text_export;
    use midly::Format;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::EnvFilter;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("swaratui-app-{}-{}", std::process::id(), name))
    }

    fn c_major_file(name: &str) -> PathBuf {
        let path = temp_path(name);
        let notes: Vec<(u32, u8, u8, u8)> = [60u8, 62, 64, 65, 67]
            .iter()
            .flat_map(|&k| [(0, 0x90, k, 100), (480, 0x80, k, 0)])
            .collect();
        std::fs::write(&path, build_smf(Format::SingleTrack, 480, &[notes])).unwrap();
        path
    }

    fn app() -> App {
        App::new(Player::new(), DEFAULT_TONIC)
    }

    #[test]
    fn test_select_midi_converts_and_reports_missing_soundfont() {
        let path = c_major_file("select.mid");
        let mut app = app();

        app.select_midi(path.clone());

        assert!(app.output.starts_with("Carnatic Swaras:\nSa Ri2 Ga2 Ma1 Pa\n"));
        // Conversion succeeded; auto-play failed without a SoundFont
        assert!(app.output.contains("Error: No SoundFont loaded"));
        assert!(app.conversion.is_some());
        assert_eq!(app.midi_path.as_deref(), Some(path.as_path()));
        assert_eq!(app.playback_state(), PlaybackState::Idle);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_invalid_tonic_keeps_previous_result() {
        let path = c_major_file("tonic.mid");
        let mut app = app();
        app.midi_path = Some(path.clone());
        assert!(app.convert_selected());
        let first = app.output.clone();

        app.start_tonic_edit();
        app.tonic_backspace();
        app.tonic_input_char('H');
        app.confirm_tonic();

        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.output.starts_with(&first));
        assert!(app.output.ends_with("Error: Invalid tonic `H`. Please enter a valid note (e.g., C, D#).\n"));
        assert_eq!(app.conversion.as_ref().map(|c| c.entries.len()), Some(5));

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_successful_reconversion_replaces_output() {
        let path = c_major_file("replace.mid");
        let mut app = app();
        app.midi_path = Some(path.clone());
        app.report_error("earlier");

        app.tonic_input = "d".to_string();
        assert!(app.convert_selected());

        assert!(!app.output.contains("earlier"));
        assert!(app.output.starts_with("Carnatic Swaras:\nNi1 Sa Ri2 Ga1 Ma1\n"));

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_cancel_tonic_edit_restores_value() {
        let mut app = app();
        app.start_tonic_edit();
        app.tonic_input_char('#');
        assert_eq!(app.tonic_input, "C#");
        app.cancel_tonic_edit();
        assert_eq!(app.tonic_input, "C");
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn test_play_without_file() {
        let mut app = app();
        app.play_selected();
        assert_eq!(app.output, "Error: No file selected for playback.\n");
    }

    #[test]
    fn test_pause_when_idle_is_ignored() {
        let mut app = app();
        app.pause_playback();
        app.toggle_pause();
        app.stop_playback();
        assert_eq!(app.playback_state(), PlaybackState::Idle);
        assert!(app.output.is_empty());
    }

    #[test]
    fn test_save_before_conversion() {
        let mut app = app();
        assert!(matches!(
            app.save_output(&temp_path("never.txt"), SaveFormat::Text),
            Err(ExportError::NothingToExport)
        ));
        app.open_save_dialog();
        assert!(!app.save_dialog.open);
        assert!(app.output.contains("Nothing to save yet"));
    }

    #[test]
    fn test_save_dialog_writes_text_export() {
        let midi = c_major_file("save.mid");
        let mut app = app();
        app.midi_path = Some(midi.clone());
        assert!(app.convert_selected());

        app.open_save_dialog();
        assert!(app.save_dialog.open);
        assert!(app.save_dialog.filename.ends_with("save_swaras"));

        let target = temp_path("saved");
        app.save_dialog.filename = target.display().to_string();
        assert_eq!(app.save_dialog.target_path(), target.with_extension("txt"));
        assert!(app.save_dialog_confirm());

        let written = std::fs::read_to_string(target.with_extension("txt")).unwrap();
        assert_eq!(written, app.output);
        let export = read_text_export(target.with_extension("txt")).unwrap();
        assert_eq!(export.swara_line, "Sa Ri2 Ga2 Ma1 Pa");
        assert_eq!(export.raga, "Unknown");

        let _ = std::fs::remove_file(midi);
        let _ = std::fs::remove_file(target.with_extension("txt"));
    }

    #[test]
    fn test_save_name_follows_converted_file() {
        let first = c_major_file("kept.mid");
        let mut app = app();
        app.midi_path = Some(first.clone());
        assert!(app.convert_selected());

        app.midi_path = Some(temp_path("missing.mid"));
        assert!(!app.convert_selected());

        app.open_save_dialog();
        assert!(app.save_dialog.filename.ends_with("kept_swaras"));

        let _ = std::fs::remove_file(first);
    }

    #[derive(Clone, Default)]
    struct LogCapture(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogCapture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Runs `f` under a subscriber filtered by `directive` and returns what it
    /// logged.
    fn captured_logs(directive: &str, f: impl FnOnce()) -> String {
        let capture = LogCapture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(directive))
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = capture.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_reported_errors_stay_quiet_at_default_level() {
        let logs = captured_logs("error", || {
            let mut app = app();
            app.report_error("boom");
            app.play_selected();
            assert!(!app.load_soundfont(temp_path("absent.sf2")));
        });
        assert_eq!(logs, "");
    }

    #[test]
    fn test_soundfont_failure_logged_once() {
        let logs = captured_logs("debug", || {
            let mut app = app();
            assert!(!app.load_soundfont(temp_path("absent.sf2")));
            assert!(app.output.starts_with("Error: Failed to load SoundFont"));
        });
        assert_eq!(logs.matches("Failed to load SoundFont").count(), 1);
    }

    #[test]
    fn test_save_target_keeps_explicit_extension() {
        let mut dialog = SaveDialogState {
            open: true,
            filename: "notes.md".to_string(),
            format: SaveFormat::Json,
        };
        assert_eq!(dialog.target_path(), PathBuf::from("notes.md"));
        dialog.filename = "notes".to_string();
        assert_eq!(dialog.target_path(), PathBuf::from("notes.json"));
    }

    #[test]
    fn test_file_browser_filters_by_purpose() {
        let dir = temp_path("browser");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("sub")).unwrap();
        for name in ["b.mid", "a.MIDI", "font.sf2", "notes.txt"] {
            std::fs::write(dir.join(name), b"").unwrap();
        }

        let mut browser = FileBrowserState::default();
        browser.open_in(BrowserPurpose::OpenMidi, dir.clone());
        let names: Vec<String> = browser
            .entries
            .iter()
            .map(|p| p.file_name().and_then(|n| n.to_str()).unwrap_or("..").to_string())
            .collect();
        assert_eq!(names, vec!["..", "sub", "a.MIDI", "b.mid"]);

        browser.open_in(BrowserPurpose::LoadSoundFont, dir.clone());
        assert_eq!(browser.entries.len(), 3);
        assert!(browser.entries[2].ends_with("font.sf2"));

        // Entering a directory keeps the browser open
        browser.down();
        assert_eq!(browser.select(), None);
        assert!(browser.open);
        assert_eq!(browser.current_dir, dir.join("sub"));

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_output_scroll_is_clamped() {
        let mut app = app();
        app.output = "a\nb\nc\n".to_string();
        app.scroll_output_down(10);
        assert_eq!(app.output_scroll, 2);
        app.scroll_output_up(5);
        assert_eq!(app.output_scroll, 0);
    }

    #[test]
    fn test_theme_toggle() {
        let mut app = app();
        assert_eq!(app.theme, Theme::Light);
        app.toggle_theme();
        assert_eq!(app.theme, Theme::Dark);
        app.toggle_theme();
        assert_eq!(app.theme, Theme::Light);
    }
}
