//! Standard MIDI File decoder
//!
//! Decodes the chunked binary container (one `MThd` header chunk, then
//! `MTrk` track chunks) into per-track tick-stamped channel events plus a
//! tempo map. Only note on/off and tempo carry information for synthesis;
//! every other event is consumed by its declared size and dropped.
//!
//! Decode policies:
//! - Running status: a status byte >= 0x80 becomes the current status; a
//!   data byte in status position repeats the current status.
//! - A NoteOn with velocity 0 is reinterpreted as NoteOff at decode time.
//! - System-common messages (0xF1-0xF3) consume their fixed data bytes and
//!   invalidate the running status; the next event needs a fresh status
//!   byte. Conservative, keeps rare mid-stream messages from corrupting
//!   the decode.
//! - System-realtime messages (>= 0xF8) carry no data and are ignored.
//! - Sysex and meta events are length-prefixed opaque blocks; meta 0x51
//!   feeds the tempo map, meta 0x2F ends the track.

use super::reader::{be_bytes_to_u32, ByteReader};
use super::tempo::TempoMap;
use crate::{HarmoniumError, Result};
use log::{debug, trace};

/// Header chunk signature
pub const HEADER_TAG: &[u8; 4] = b"MThd";
/// Track chunk signature
pub const TRACK_TAG: &[u8; 4] = b"MTrk";

/// Meta event subtype: tempo change (3-byte big-endian us/beat payload)
const META_TEMPO: u8 = 0x51;
/// Meta event subtype: end of track
const META_END_OF_TRACK: u8 = 0x2F;

/// Kind of a decoded channel voice event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelEventKind {
    /// Key pressed
    NoteOn,
    /// Key released (includes NoteOn with velocity 0)
    NoteOff,
}

/// A tick-stamped note event as decoded from one track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawChannelEvent {
    /// Absolute tick within the track
    pub tick: u64,
    /// NoteOn or NoteOff
    pub kind: ChannelEventKind,
    /// Channel 0..15 from the status low nibble
    pub channel: u8,
    /// Pitch number 0..127
    pub pitch: u8,
    /// Velocity 0..127 (0 for NoteOff)
    pub velocity: u8,
}

/// Decoded header chunk fields
#[derive(Debug, Clone, Copy)]
pub struct SmfHeader {
    /// Container format word (0, 1 or 2)
    pub format: u16,
    /// Number of track chunks the header declares
    pub track_count: u16,
    /// Tick division (ticks per quarter note)
    pub ticks_per_beat: u16,
}

/// Full decode result: header, per-track events, tempo map
#[derive(Debug, Clone)]
pub struct ParsedStream {
    /// Header chunk fields
    pub header: SmfHeader,
    /// One event list per decoded track, in file order
    pub tracks: Vec<Vec<RawChannelEvent>>,
    /// Finalized tempo map collected from every track
    pub tempo_map: TempoMap,
}

/// Standard MIDI File parser
pub struct SmfParser;

impl SmfParser {
    /// Decode a complete in-memory stream.
    ///
    /// Fails with [`HarmoniumError::Format`] on a missing header signature
    /// or an SMPTE time division, and [`HarmoniumError::Truncated`] when a
    /// declared chunk or event length runs past the input.
    pub fn parse(data: &[u8]) -> Result<ParsedStream> {
        let mut reader = ByteReader::new(data);
        let header = Self::parse_header(&mut reader)?;
        debug!(
            "header: format {}, {} track(s), {} ticks/beat",
            header.format, header.track_count, header.ticks_per_beat
        );

        let mut tempo_map = TempoMap::new(header.ticks_per_beat);
        let mut tracks = Vec::with_capacity(header.track_count as usize);
        for _ in 0..header.track_count {
            tracks.push(Self::parse_track(&mut reader, &mut tempo_map)?);
        }
        tempo_map.finalize();

        Ok(ParsedStream {
            header,
            tracks,
            tempo_map,
        })
    }

    fn parse_header(reader: &mut ByteReader<'_>) -> Result<SmfHeader> {
        let tag = reader.read_bytes(4).map_err(|_| {
            HarmoniumError::Format("input too short for a header chunk".into())
        })?;
        if tag != HEADER_TAG {
            return Err(HarmoniumError::Format(
                "not a valid event stream (MThd signature missing)".into(),
            ));
        }

        let length = reader.read_u32_be()? as usize;
        if length < 6 {
            return Err(HarmoniumError::Format(format!(
                "header chunk declares {length} bytes, need at least 6"
            )));
        }
        let format = reader.read_u16_be()?;
        let track_count = reader.read_u16_be()?;
        let division = reader.read_u16_be()?;
        // Skip any bytes a future header revision might append.
        reader.skip(length - 6)?;

        if division & 0x8000 != 0 {
            return Err(HarmoniumError::Format(
                "SMPTE (frame-based) time division is not supported".into(),
            ));
        }

        Ok(SmfHeader {
            format,
            track_count,
            ticks_per_beat: division,
        })
    }

    /// Decode one track chunk, appending tempo breakpoints to `tempo_map`.
    ///
    /// Chunks with an unknown tag before the next `MTrk` are skipped by
    /// their declared length.
    fn parse_track(
        reader: &mut ByteReader<'_>,
        tempo_map: &mut TempoMap,
    ) -> Result<Vec<RawChannelEvent>> {
        let track_end = loop {
            let tag_offset = reader.pos();
            let tag: [u8; 4] = reader
                .read_bytes(4)
                .map_err(|_| {
                    HarmoniumError::Truncated(format!(
                        "expected a track chunk at offset {tag_offset}, input ended"
                    ))
                })?
                .try_into()
                .unwrap();
            let length = reader.read_u32_be()? as usize;
            if &tag == TRACK_TAG {
                if length > reader.remaining() {
                    return Err(HarmoniumError::Truncated(format!(
                        "track chunk at offset {tag_offset} declares {length} bytes, only {} available",
                        reader.remaining()
                    )));
                }
                break reader.pos() + length;
            }
            trace!("skipping unknown chunk {:?} ({length} bytes)", tag);
            reader.skip(length)?;
        };

        let mut events = Vec::new();
        let mut abs_tick: u64 = 0;
        let mut running_status: u8 = 0;

        while reader.pos() < track_end {
            let delta = reader.read_vlq()?;
            abs_tick += delta as u64;

            let byte = reader.peek_u8()?;
            if byte >= 0xF8 {
                // System realtime: no data bytes, ignored entirely.
                // Running status survives so interleaved channel events
                // still decode.
                reader.read_u8()?;
                continue;
            }
            let status = if byte >= 0x80 {
                reader.read_u8()?;
                running_status = byte;
                byte
            } else {
                // Data byte in status position: repeat the current status.
                if running_status == 0 {
                    return Err(HarmoniumError::Format(format!(
                        "data byte {byte:#04x} at offset {} with no running status",
                        reader.pos()
                    )));
                }
                running_status
            };

            match status {
                // System common: fixed data byte count per subtype.
                0xF1 | 0xF3 => {
                    reader.skip(1)?;
                    running_status = 0;
                }
                0xF2 => {
                    reader.skip(2)?;
                    running_status = 0;
                }
                // Sysex: length-prefixed opaque block.
                0xF0 | 0xF7 => {
                    running_status = 0;
                    let length = reader.read_vlq()? as usize;
                    reader.skip(length)?;
                }
                // Meta event.
                0xFF => {
                    running_status = 0;
                    let subtype = reader.read_u8()?;
                    let length = reader.read_vlq()? as usize;
                    let payload = reader.read_bytes(length)?;
                    match subtype {
                        META_TEMPO => {
                            tempo_map.push(abs_tick, be_bytes_to_u32(payload));
                        }
                        META_END_OF_TRACK => break,
                        _ => {}
                    }
                }
                // Channel voice events: data byte count fixed by high nibble.
                0x80..=0xEF => {
                    Self::decode_channel_event(reader, status, abs_tick, &mut events)?;
                }
                // 0xF4-0xF6 are undefined and carry no data.
                _ => {}
            }
        }

        if reader.pos() > track_end {
            return Err(HarmoniumError::Truncated(format!(
                "event ran {} byte(s) past the declared track end",
                reader.pos() - track_end
            )));
        }
        // An end-of-track meta can leave trailing declared bytes behind.
        reader.skip(track_end - reader.pos())?;

        Ok(events)
    }

    fn decode_channel_event(
        reader: &mut ByteReader<'_>,
        status: u8,
        tick: u64,
        events: &mut Vec<RawChannelEvent>,
    ) -> Result<()> {
        let channel = status & 0x0F;
        match status & 0xF0 {
            0x80 => {
                let pitch = reader.read_u8()?;
                let _release_velocity = reader.read_u8()?;
                events.push(RawChannelEvent {
                    tick,
                    kind: ChannelEventKind::NoteOff,
                    channel,
                    pitch,
                    velocity: 0,
                });
            }
            0x90 => {
                let pitch = reader.read_u8()?;
                let velocity = reader.read_u8()?;
                let kind = if velocity == 0 {
                    ChannelEventKind::NoteOff
                } else {
                    ChannelEventKind::NoteOn
                };
                events.push(RawChannelEvent {
                    tick,
                    kind,
                    channel,
                    pitch,
                    velocity,
                });
            }
            // Polyphonic pressure, control change, pitch bend: 2 data bytes.
            0xA0 | 0xB0 | 0xE0 => reader.skip(2)?,
            // Program change, channel pressure: 1 data byte.
            0xC0 | 0xD0 => reader.skip(1)?,
            _ => unreachable!("status {status:#04x} is not a channel voice event"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Assemble a single-track stream from raw track-chunk payload bytes.
    fn stream_with_track(track_body: &[u8]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"MThd");
        data.extend_from_slice(&6u32.to_be_bytes());
        data.extend_from_slice(&0u16.to_be_bytes()); // format
        data.extend_from_slice(&1u16.to_be_bytes()); // tracks
        data.extend_from_slice(&480u16.to_be_bytes()); // division
        data.extend_from_slice(b"MTrk");
        data.extend_from_slice(&(track_body.len() as u32).to_be_bytes());
        data.extend_from_slice(track_body);
        data
    }

    #[test]
    fn test_missing_signature_is_format_error() {
        let result = SmfParser::parse(b"RIFF\x00\x00\x00\x06");
        assert!(matches!(result, Err(HarmoniumError::Format(_))));
    }

    #[test]
    fn test_smpte_division_is_rejected() {
        let mut data = Vec::new();
        data.extend_from_slice(b"MThd");
        data.extend_from_slice(&6u32.to_be_bytes());
        data.extend_from_slice(&0u16.to_be_bytes());
        data.extend_from_slice(&0u16.to_be_bytes());
        data.extend_from_slice(&0xE728u16.to_be_bytes()); // SMPTE 25 fps
        let result = SmfParser::parse(&data);
        assert!(matches!(result, Err(HarmoniumError::Format(_))));
    }

    #[test]
    fn test_truncated_track_chunk() {
        let mut data = stream_with_track(&[0x00, 0xFF, 0x2F, 0x00]);
        data.truncate(data.len() - 2);
        let result = SmfParser::parse(&data);
        assert!(matches!(result, Err(HarmoniumError::Truncated(_))));
    }

    #[test]
    fn test_running_status_repeats_note_on() {
        // NoteOn ch0 pitch 60 vel 100, repeated-status NoteOn pitch 61,
        // NoteOff pitch 60.
        let body = [
            0x00, 0x90, 60, 100, //
            0x00, 61, 100, //
            0x00, 0x80, 60, 0, //
            0x00, 0xFF, 0x2F, 0x00,
        ];
        let parsed = SmfParser::parse(&stream_with_track(&body)).unwrap();
        let events = &parsed.tracks[0];
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].kind, ChannelEventKind::NoteOn);
        assert_eq!(events[0].pitch, 60);
        assert_eq!(events[1].kind, ChannelEventKind::NoteOn);
        assert_eq!(events[1].pitch, 61);
        assert_eq!(events[1].channel, 0);
        assert_eq!(events[2].kind, ChannelEventKind::NoteOff);
        assert_eq!(events[2].pitch, 60);
    }

    #[test]
    fn test_note_on_velocity_zero_is_note_off() {
        let body = [
            0x00, 0x90, 60, 100, //
            0x60, 0x90, 60, 0, // vel 0 -> NoteOff
            0x00, 0xFF, 0x2F, 0x00,
        ];
        let parsed = SmfParser::parse(&stream_with_track(&body)).unwrap();
        let events = &parsed.tracks[0];
        assert_eq!(events[1].kind, ChannelEventKind::NoteOff);
        assert_eq!(events[1].tick, 0x60);
    }

    #[test]
    fn test_tempo_meta_feeds_tempo_map() {
        let body = [
            0x00, 0xFF, 0x51, 0x03, 0x0F, 0x42, 0x40, // 1_000_000 us/beat
            0x00, 0x90, 60, 100, //
            0x83, 0x60, 0x80, 60, 0, // delta 480
            0x00, 0xFF, 0x2F, 0x00,
        ];
        let parsed = SmfParser::parse(&stream_with_track(&body)).unwrap();
        // One beat at 60 BPM.
        assert_relative_eq!(parsed.tempo_map.seconds_at(480), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_unsupported_channel_events_are_skipped() {
        let body = [
            0x00, 0xB0, 0x07, 0x64, // control change: 2 data bytes
            0x00, 0xC0, 0x05, // program change: 1 data byte
            0x00, 0xE0, 0x00, 0x40, // pitch bend: 2 data bytes
            0x00, 0x90, 60, 100, //
            0x00, 0xFF, 0x2F, 0x00,
        ];
        let parsed = SmfParser::parse(&stream_with_track(&body)).unwrap();
        assert_eq!(parsed.tracks[0].len(), 1);
        assert_eq!(parsed.tracks[0][0].kind, ChannelEventKind::NoteOn);
    }

    #[test]
    fn test_system_common_invalidates_running_status() {
        // After a Song Select the bare data bytes must not be decoded via
        // the stale NoteOn status.
        let body = [
            0x00, 0x90, 60, 100, //
            0x00, 0xF3, 0x01, // song select, 1 data byte
            0x00, 61, 100, // would be a running-status NoteOn
        ];
        let result = SmfParser::parse(&stream_with_track(&body));
        assert!(matches!(result, Err(HarmoniumError::Format(_))));
    }

    #[test]
    fn test_realtime_messages_are_ignored() {
        let body = [
            0x00, 0xF8, // timing clock, no data
            0x00, 0x90, 60, 100, //
            0x00, 0xFA, // start
            0x00, 60, 0, // running status still 0x90
            0x00, 0xFF, 0x2F, 0x00,
        ];
        let parsed = SmfParser::parse(&stream_with_track(&body)).unwrap();
        let events = &parsed.tracks[0];
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].kind, ChannelEventKind::NoteOff);
    }

    #[test]
    fn test_sysex_is_skipped_opaquely() {
        let body = [
            0x00, 0xF0, 0x03, 0x7E, 0x09, 0xF7, // 3-byte sysex payload
            0x00, 0x90, 60, 100, //
            0x00, 0xFF, 0x2F, 0x00,
        ];
        let parsed = SmfParser::parse(&stream_with_track(&body)).unwrap();
        assert_eq!(parsed.tracks[0].len(), 1);
    }

    #[test]
    fn test_track_without_end_meta_stops_at_chunk_boundary() {
        let body = [0x00, 0x90, 60, 100, 0x10, 0x80, 60, 0];
        let parsed = SmfParser::parse(&stream_with_track(&body)).unwrap();
        assert_eq!(parsed.tracks[0].len(), 2);
    }

    #[test]
    fn test_unknown_chunks_between_tracks_are_skipped() {
        let mut data = Vec::new();
        data.extend_from_slice(b"MThd");
        data.extend_from_slice(&6u32.to_be_bytes());
        data.extend_from_slice(&0u16.to_be_bytes());
        data.extend_from_slice(&1u16.to_be_bytes());
        data.extend_from_slice(&480u16.to_be_bytes());
        // Alien chunk before the track.
        data.extend_from_slice(b"XOXO");
        data.extend_from_slice(&2u32.to_be_bytes());
        data.extend_from_slice(&[0xAB, 0xCD]);
        let body = [0x00, 0x90, 60, 100, 0x00, 0xFF, 0x2F, 0x00];
        data.extend_from_slice(b"MTrk");
        data.extend_from_slice(&(body.len() as u32).to_be_bytes());
        data.extend_from_slice(&body);
        let parsed = SmfParser::parse(&data).unwrap();
        assert_eq!(parsed.tracks[0].len(), 1);
    }

    #[test]
    fn test_decode_is_deterministic() {
        let body = [
            0x00, 0x90, 60, 100, //
            0x40, 61, 100, //
            0x40, 0x80, 60, 0, //
            0x00, 0xFF, 0x2F, 0x00,
        ];
        let data = stream_with_track(&body);
        let first = SmfParser::parse(&data).unwrap();
        let second = SmfParser::parse(&data).unwrap();
        assert_eq!(first.tracks, second.tracks);
    }
}
