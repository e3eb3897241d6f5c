//! Audio engine for SoundFont synthesis.
//!
//! Provides a synthesizer rendered by rustysynth and played through rodio.
//! The output stream pulls samples on its own thread; the sequencer thread
//! drives the synthesizer through a [`SynthHandle`].

use anyhow::{Context, Result};
use rodio::{OutputStream, OutputStreamHandle, Source};
use rustysynth::{SoundFont, Synthesizer, SynthesizerSettings};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Sample rate for audio synthesis (44.1 kHz standard).
pub const SAMPLE_RATE: u32 = 44100;

/// Audio buffer size for low-latency playback.
/// Smaller = lower latency but higher CPU usage.
const BUFFER_SIZE: usize = 256;

/// Number of MIDI channels reset before a new file starts.
const MIDI_CHANNELS: u8 = 16;

/// Audio source that generates samples from the synthesizer.
/// Implements rodio's Source trait for playback.
struct SynthSource {
    synth: Arc<Mutex<Synthesizer>>,
    left_buf: Vec<f32>,
    right_buf: Vec<f32>,
    /// Current position in the buffer.
    buf_pos: usize,
    /// Current channel (0 = left, 1 = right).
    channel: usize,
}

impl SynthSource {
    fn new(synth: Arc<Mutex<Synthesizer>>) -> Self {
        Self {
            synth,
            left_buf: vec![0.0; BUFFER_SIZE],
            right_buf: vec![0.0; BUFFER_SIZE],
            buf_pos: BUFFER_SIZE, // Start at end to trigger first render
            channel: 0,
        }
    }
}

impl Iterator for SynthSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.buf_pos >= BUFFER_SIZE {
            // The synthesizer renders silence when nothing is sounding
            if let Ok(mut synth) = self.synth.lock() {
                synth.render(&mut self.left_buf, &mut self.right_buf);
            } else {
                self.left_buf.fill(0.0);
                self.right_buf.fill(0.0);
            }
            self.buf_pos = 0;
        }

        // Interleave stereo samples: L, R, L, R, ...
        let sample = if self.channel == 0 {
            self.left_buf[self.buf_pos]
        } else {
            self.right_buf[self.buf_pos]
        };

        self.channel = 1 - self.channel;
        if self.channel == 0 {
            self.buf_pos += 1;
        }

        Some(sample)
    }
}

impl Source for SynthSource {
    fn current_frame_len(&self) -> Option<usize> {
        None // Continuous stream
    }

    fn channels(&self) -> u16 {
        2
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

/// Cloneable, thread-safe access to the synthesizer.
///
/// A poisoned lock is ignored: the call becomes a no-op rather than a panic
/// on the sequencer thread.
#[derive(Clone)]
pub struct SynthHandle {
    synth: Arc<Mutex<Synthesizer>>,
}

impl SynthHandle {
    /// Starts a note.
    ///
    /// # Arguments
    ///
    /// * `channel` - MIDI channel (0-15)
    /// * `note` - MIDI note number (0-127)
    /// * `velocity` - Note velocity (1-127)
    pub fn note_on(&self, channel: u8, note: u8, velocity: u8) {
        if let Ok(mut synth) = self.synth.lock() {
            synth.note_on(channel as i32, note as i32, velocity as i32);
        }
    }

    /// Releases a note.
    pub fn note_off(&self, channel: u8, note: u8) {
        if let Ok(mut synth) = self.synth.lock() {
            synth.note_off(channel as i32, note as i32);
        }
    }

    /// Stops all sounding notes.
    ///
    /// # Arguments
    ///
    /// * `immediate` - If true, notes stop immediately without release
    pub fn all_notes_off(&self, immediate: bool) {
        if let Ok(mut synth) = self.synth.lock() {
            synth.note_off_all(immediate);
        }
    }

    /// Sets the instrument (program) for a channel.
    pub fn set_program(&self, channel: u8, program: u8) {
        if let Ok(mut synth) = self.synth.lock() {
            // Program change is MIDI command 0xC0 (192)
            synth.process_midi_message(channel as i32, 0xC0, program as i32, 0);
        }
    }

    /// Silences everything and puts every channel back on program 0, so one
    /// file's instrument choices never leak into the next.
    pub fn reset(&self) {
        if let Ok(mut synth) = self.synth.lock() {
            synth.reset();
        }
        for channel in 0..MIDI_CHANNELS {
            self.set_program(channel, 0);
        }
    }
}

/// The audio output: SoundFont, synthesizer and rodio stream.
///
/// Must stay on the thread that created it (the output stream is not `Send`).
pub struct AudioEngine {
    synth: SynthHandle,
    /// Audio output stream (must be kept alive).
    _stream: OutputStream,
    _stream_handle: OutputStreamHandle,
    soundfont_path: PathBuf,
}

impl AudioEngine {
    /// Creates a new audio engine with the specified SoundFont.
    ///
    /// # Arguments
    ///
    /// * `soundfont_path` - Path to the SoundFont file (.sf2)
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The SoundFont file cannot be read
    /// - The SoundFont is invalid
    /// - Audio output cannot be initialized
    pub fn new<P: AsRef<Path>>(soundfont_path: P) -> Result<Self> {
        let soundfont_path = soundfont_path.as_ref();
        let mut file = BufReader::new(File::open(soundfont_path).with_context(|| {
            format!("Failed to open SoundFont: {}", soundfont_path.display())
        })?);
        let soundfont = Arc::new(
            SoundFont::new(&mut file)
                .map_err(|e| anyhow::anyhow!("Failed to load SoundFont: {:?}", e))?,
        );

        let settings = SynthesizerSettings::new(SAMPLE_RATE as i32);
        let synth = Synthesizer::new(&soundfont, &settings)
            .map_err(|e| anyhow::anyhow!("Failed to create synthesizer: {:?}", e))?;
        let synth = Arc::new(Mutex::new(synth));

        let (stream, stream_handle) =
            OutputStream::try_default().context("Failed to open audio output")?;

        let source = SynthSource::new(Arc::clone(&synth));
        stream_handle
            .play_raw(source)
            .context("Failed to start audio playback")?;

        tracing::info!("Audio engine ready with SoundFont {:?}", soundfont_path);

        Ok(Self {
            synth: SynthHandle { synth },
            _stream: stream,
            _stream_handle: stream_handle,
            soundfont_path: soundfont_path.to_path_buf(),
        })
    }

    /// Returns a handle the sequencer thread can drive the synthesizer with.
    pub fn synth(&self) -> SynthHandle {
        self.synth.clone()
    }

    /// File name of the loaded SoundFont, for display.
    pub fn soundfont_name(&self) -> &str {
        self.soundfont_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
    }
}
