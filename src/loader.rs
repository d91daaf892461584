//! Input sniffing and score loading
//!
//! Both front ends converge here: a file is either a binary MIDI stream
//! (recognized by its `MThd` magic) or plain-text notation. Either way
//! the result is a [`Score`] ready for rendering.

use crate::events::{Score, Track};
use crate::midi::{pair_events, SmfParser};
use crate::notation::NotationParser;
use crate::{HarmoniumError, RenderConfig, Result, TempoMap};
use log::{debug, info};
use std::fs;
use std::path::Path;

/// Magic bytes at the start of a standard MIDI file
const MIDI_MAGIC: &[u8] = b"MThd";

/// Read a file and decode it into a score, sniffing its format.
pub fn load_path(path: &Path, config: &RenderConfig) -> Result<Score> {
    let data = fs::read(path)?;
    if data.starts_with(MIDI_MAGIC) {
        debug!("{}: MIDI stream", path.display());
        decode_stream(&data, config)
    } else {
        debug!("{}: notation text", path.display());
        let text = std::str::from_utf8(&data).map_err(|_| {
            HarmoniumError::Format(format!(
                "{} is neither a MIDI stream nor UTF-8 notation",
                path.display()
            ))
        })?;
        parse_notation(text, config)
    }
}

/// Decode a binary MIDI stream into a score.
///
/// Timing comes from the stream's own tempo events unless the
/// configuration carries a tempo override, in which case the whole
/// piece is timed at that fixed rate.
pub fn decode_stream(data: &[u8], config: &RenderConfig) -> Result<Score> {
    let parsed = SmfParser::parse(data)?;
    let tempo_map = match config.tempo_override_bpm {
        Some(bpm) => TempoMap::with_fixed_bpm(parsed.header.ticks_per_beat, bpm)?,
        None => parsed.tempo_map,
    };
    let score = pair_events(&parsed.tracks, &tempo_map, config.a4);
    info!(
        "decoded {} track(s), {} note(s)",
        score.tracks.len(),
        score.note_count()
    );
    Ok(score)
}

/// Parse notation text into a single-voice score.
pub fn parse_notation(text: &str, config: &RenderConfig) -> Result<Score> {
    let parser = NotationParser::from_config(config);
    let notes = parser.parse(text);
    info!("parsed {} note(s) from notation", notes.len());
    Ok(Score {
        tracks: vec![Track {
            channel: 0,
            voice: config.preset.config(),
            notes,
        }],
    })
}
