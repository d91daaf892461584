//! Notation parser: tokens to canonical note events
//!
//! Token-by-token state machine over one voice of notation text. Tracks
//! the inherited duration denominator (persists across barlines), the time
//! cursor in seconds, and the accumulated beat length of the current bar.
//! Chords freeze the time cursor; ties are merged in a post-pass.
//!
//! Tempo is a plain beats-per-minute scalar here, so events are emitted
//! directly in absolute seconds with no tempo map involved.

use super::token::{tokenize, Token};
use crate::config::Meter;
use crate::events::{midi_to_freq, NoteEvent};
use crate::RenderConfig;
use log::warn;

/// Two notes tie together when the successor starts within this many
/// seconds of the predecessor's end
pub const TIE_EPSILON: f64 = 1e-3;

/// A bar may deviate from the meter by this many beats before the
/// advisory warning fires
pub const BAR_TOLERANCE: f64 = 1e-3;

/// The notation letter `c` without octave marks, as a MIDI pitch number
const BASE_C: i32 = 48;

/// Parser for one voice of notation text.
///
/// Construct per voice; the configuration (tempo, meter, transposition,
/// tuning) is immutable across a parse.
#[derive(Debug, Clone)]
pub struct NotationParser {
    bpm: f64,
    target_bar_len: f64,
    transpose: i32,
    a4: f64,
    validate: bool,
}

/// Pre-tie-resolution event
#[derive(Debug, Clone, Copy)]
struct RawNote {
    freq: f64,
    start: f64,
    dur: f64,
    tied: bool,
}

impl NotationParser {
    /// Create a parser with explicit settings
    pub fn new(bpm: f64, meter: Meter, a4: f64, transpose: i32, validate: bool) -> Self {
        NotationParser {
            bpm,
            target_bar_len: meter.bar_length(),
            transpose,
            a4,
            validate,
        }
    }

    /// Create a parser from a render configuration
    pub fn from_config(config: &RenderConfig) -> Self {
        Self::new(
            config.bpm,
            config.meter,
            config.a4,
            config.transpose,
            config.validate,
        )
    }

    /// Parse one voice of notation text into time-ordered note events.
    ///
    /// Rests advance the time cursor but are not emitted. Bar-length
    /// deviations are advisory warnings, never errors.
    pub fn parse(&self, source: &str) -> Vec<NoteEvent> {
        let seconds_per_beat = 60.0 / self.bpm;

        let mut raw: Vec<RawNote> = Vec::new();
        let mut current_time = 0.0;
        let mut last_denominator: u32 = 4;

        let mut bar_len = 0.0;
        let mut bar_counter: u32 = 1;

        let mut in_chord = false;
        let mut chord_start = 0.0;
        let mut chord_max_dur = 0.0;
        let mut chord_max_beats = 0.0;
        let mut chord_members: Vec<usize> = Vec::new();

        for token in tokenize(source) {
            match token {
                Token::Barline => {
                    // The first bar is exempt: a pickup bar is legitimate.
                    if self.validate
                        && bar_counter > 1
                        && (bar_len - self.target_bar_len).abs() > BAR_TOLERANCE
                    {
                        warn!(
                            "bar {bar_counter}: length is {bar_len:.2} beats (expected {})",
                            self.target_bar_len
                        );
                    }
                    bar_len = 0.0;
                    bar_counter += 1;
                }
                Token::ChordOpen => {
                    in_chord = true;
                    chord_start = current_time;
                    chord_max_dur = 0.0;
                    chord_max_beats = 0.0;
                    chord_members.clear();
                }
                Token::ChordClose {
                    denominator,
                    dots,
                    tied,
                } => {
                    in_chord = false;
                    let explicit = denominator.is_some() || dots > 0;
                    let chord_beats = if explicit {
                        // An explicit duration on the closer overwrites
                        // every member note's duration.
                        if let Some(d) = denominator.filter(|&d| d > 0) {
                            last_denominator = d;
                        }
                        let beats = 4.0 / last_denominator as f64 * dot_factor(dots);
                        let dur_sec = beats * seconds_per_beat;
                        for &idx in &chord_members {
                            raw[idx].dur = dur_sec;
                        }
                        current_time = chord_start + dur_sec;
                        beats
                    } else {
                        // No suffix: the chord lasts as long as its
                        // longest member.
                        current_time = chord_start + chord_max_dur;
                        chord_max_beats
                    };
                    bar_len += chord_beats;
                    if tied {
                        for &idx in &chord_members {
                            raw[idx].tied = true;
                        }
                    }
                }
                Token::Note {
                    letter,
                    accidental,
                    octave_shift,
                    denominator,
                    dots,
                    tied,
                } => {
                    if let Some(d) = denominator.filter(|&d| d > 0) {
                        last_denominator = d;
                    }
                    let beats = 4.0 / last_denominator as f64 * dot_factor(dots);
                    let dur_sec = beats * seconds_per_beat;
                    let freq = self.frequency_of(letter, accidental, octave_shift);
                    if in_chord {
                        raw.push(RawNote {
                            freq,
                            start: chord_start,
                            dur: dur_sec,
                            tied,
                        });
                        chord_members.push(raw.len() - 1);
                        chord_max_dur = chord_max_dur.max(dur_sec);
                        chord_max_beats = chord_max_beats.max(beats);
                    } else {
                        raw.push(RawNote {
                            freq,
                            start: current_time,
                            dur: dur_sec,
                            tied,
                        });
                        current_time += dur_sec;
                        bar_len += beats;
                    }
                }
            }
        }

        resolve_ties(raw)
    }

    /// Equal-temperament frequency of a notation pitch; 0 for rests.
    fn frequency_of(&self, letter: char, accidental: i8, octave_shift: i32) -> f64 {
        let base_offset = match letter {
            'c' => 0,
            'd' => 2,
            'e' => 4,
            'f' => 5,
            'g' => 7,
            'a' => 9,
            'b' => 11,
            // 'r' rest, 's' silent skip
            _ => return 0.0,
        };
        let midi = BASE_C + base_offset + accidental as i32 + octave_shift * 12 + self.transpose;
        midi_to_freq(midi, self.a4)
    }
}

/// Duration multiplier for `dots` dot characters: each dot adds half of
/// the previous addition (1 dot -> 1.5, 2 dots -> 1.75, ...).
fn dot_factor(dots: u8) -> f64 {
    let mut factor = 1.0;
    let mut add = 0.5;
    for _ in 0..dots {
        factor += add;
        add /= 2.0;
    }
    factor
}

/// Merge tied notes into single sustained events.
///
/// Notes are time-sorted; a tied note absorbs the next note of equal
/// frequency whose onset matches its end within [`TIE_EPSILON`], chaining
/// while the absorbed note is itself tied. A dangling tie simply stops.
/// Rests are consumed here and never emitted.
fn resolve_ties(mut raw: Vec<RawNote>) -> Vec<NoteEvent> {
    raw.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut merged = Vec::new();
    let mut absorbed = vec![false; raw.len()];

    for i in 0..raw.len() {
        if absorbed[i] {
            continue;
        }
        let mut curr = raw[i];
        if curr.freq == 0.0 {
            continue;
        }

        while curr.tied {
            let expected_start = curr.start + curr.dur;
            let successor = (i + 1..raw.len()).find(|&j| {
                !absorbed[j]
                    && raw[j].freq == curr.freq
                    && (raw[j].start - expected_start).abs() < TIE_EPSILON
            });
            match successor {
                Some(j) => {
                    curr.dur += raw[j].dur;
                    curr.tied = raw[j].tied;
                    absorbed[j] = true;
                }
                None => break, // dangling tie, not an error
            }
        }

        merged.push(NoteEvent {
            frequency_hz: curr.freq,
            start: curr.start,
            duration: curr.dur,
            intensity: 1.0,
            channel: 0,
        });
    }
    merged
}
