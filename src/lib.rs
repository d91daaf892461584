//! Symbolic-music-to-audio renderer
//!
//! Converts two kinds of symbolic music description into one canonical
//! note-event sequence and renders it to 16-bit mono PCM via additive
//! harmonic synthesis:
//!
//! - **Binary event streams** (Standard MIDI Files): chunked container,
//!   variable-length delta times, running status, tempo-map-accurate
//!   tick-to-seconds conversion.
//! - **Compact text notation** (Lilypond-style): pitch letters with
//!   accidentals and octave marks, duration inheritance, dots, ties,
//!   chords and barlines.
//!
//! Both front ends emit the same [`Score`] of time-stamped [`NoteEvent`]s,
//! which the synthesis back end turns into a mixed, peak-normalized,
//! quantized sample buffer.
//!
//! # Pipeline
//! decode/parse -> [`Score`] -> per-note additive rendering -> mixing ->
//! 16-bit PCM encoding -> WAV.
//!
//! The pipeline is single-threaded and batch: all input is read to memory
//! before parsing, every stage completes before the next begins, and
//! identical inputs always produce bit-identical output.
//!
//! # Quick start
//! ```no_run
//! use harmonium::{encode_pcm16, load_path, render_score, write_wav, RenderConfig};
//! # fn main() -> harmonium::Result<()> {
//! let config = RenderConfig::default();
//! let score = load_path("song.mid".as_ref(), &config)?;
//! let master = render_score(&score, &config)?;
//! let pcm = encode_pcm16(&master, config.gain);
//! write_wav("song.wav".as_ref(), &pcm, config.sample_rate)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod events;
pub mod loader;
pub mod midi; // Binary event-stream decoding
pub mod notation; // Text notation parsing
pub mod output; // Mixing, PCM encoding, WAV writing
pub mod synth; // Additive synthesis

/// Error types for decoding, parsing, synthesis and encoding operations
#[derive(thiserror::Error, Debug)]
pub enum HarmoniumError {
    /// Malformed or unsupported container structure. Fatal for that input.
    #[error("format error: {0}")]
    Format(String),

    /// A declared chunk or event length exceeds the available bytes
    #[error("truncated stream: {0}")]
    Truncated(String),

    /// The encoder or mixer was given no audio at all
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// Invalid configuration (unknown preset, malformed meter, bad rates)
    #[error("invalid configuration: {0}")]
    Config(String),

    /// IO error from the filesystem
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error writing the audio file
    #[error("audio file write error: {0}")]
    AudioFile(String),
}

/// Result type for all fallible operations in this crate
pub type Result<T> = std::result::Result<T, HarmoniumError>;

// Public API exports
pub use config::{Meter, RenderConfig};
pub use events::{freq_to_midi, midi_to_freq, NoteEvent, Score, Track};
pub use loader::{decode_stream, load_path};
pub use midi::{RawChannelEvent, SmfParser, TempoMap};
pub use notation::NotationParser;
pub use output::{encode_pcm16, mix, render_score, write_wav};
pub use synth::{render_note, VoiceConfig, VoicePreset};
