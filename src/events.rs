//! Canonical note-event model
//!
//! The shared output contract of both front ends (binary stream decoder and
//! text notation parser) and the sole input of the synthesis back end: a
//! time-ordered sequence of immutable note events in absolute seconds.

use crate::synth::VoiceConfig;

/// One sounding (or resting) interval.
///
/// Value object with no back-references; immutable once emitted to the
/// renderer. A `frequency_hz` of 0 denotes a rest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    /// Fundamental frequency in Hz; 0 = rest
    pub frequency_hz: f64,
    /// Onset in absolute seconds from the start of the piece
    pub start: f64,
    /// Sounding duration in seconds (excluding the voice's release tail)
    pub duration: f64,
    /// Loudness scale in [0, 1]
    pub intensity: f64,
    /// Source channel (binary streams) or voice tag (notation, always 0)
    pub channel: u8,
}

impl NoteEvent {
    /// End of the sounding interval in absolute seconds
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Whether this event is a rest (no pitch)
    pub fn is_rest(&self) -> bool {
        self.frequency_hz == 0.0
    }
}

/// One voice of time-ordered note events with its synthesis configuration
#[derive(Debug, Clone)]
pub struct Track {
    /// Channel tag carried over from the source (0 for notation voices)
    pub channel: u8,
    /// Voice configuration used to render every note of this track
    pub voice: VoiceConfig,
    /// Note events sorted ascending by onset
    pub notes: Vec<NoteEvent>,
}

impl Track {
    /// End time of the last sounding note, in seconds (0 if empty)
    pub fn last_end(&self) -> f64 {
        self.notes.iter().map(NoteEvent::end).fold(0.0, f64::max)
    }
}

/// A complete piece: every decoded/parsed track of one input
#[derive(Debug, Clone, Default)]
pub struct Score {
    /// Tracks in source order; each independently renderable
    pub tracks: Vec<Track>,
}

impl Score {
    /// Whether no track contains any note
    pub fn is_empty(&self) -> bool {
        self.tracks.iter().all(|t| t.notes.is_empty())
    }

    /// Total number of note events across all tracks
    pub fn note_count(&self) -> usize {
        self.tracks.iter().map(|t| t.notes.len()).sum()
    }

    /// End time of the last note across all tracks, in seconds
    pub fn duration(&self) -> f64 {
        self.tracks.iter().map(Track::last_end).fold(0.0, f64::max)
    }
}

/// Frequency of a MIDI pitch number under equal temperament.
///
/// `a4` is the reference tuning (A4 = MIDI 69), conventionally 440 Hz.
pub fn midi_to_freq(midi: i32, a4: f64) -> f64 {
    a4 * 2f64.powf((midi - 69) as f64 / 12.0)
}

/// Nearest MIDI pitch number for a frequency, for display purposes.
///
/// Returns `None` for rests (0 Hz) and frequencies outside the 0..=127
/// pitch range.
pub fn freq_to_midi(frequency_hz: f64, a4: f64) -> Option<u8> {
    if !frequency_hz.is_finite() || frequency_hz <= 0.0 {
        return None;
    }
    let midi = (69.0 + 12.0 * (frequency_hz / a4).log2()).round();
    if (0.0..=127.0).contains(&midi) {
        Some(midi as u8)
    } else {
        None
    }
}
