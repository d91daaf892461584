//! Event pairing: tick-stamped on/off events into canonical note events
//!
//! Second decode pass. Within a track, each NoteOn opens an entry keyed by
//! `(channel, pitch)`; the matching NoteOff closes it, converting both tick
//! bounds to seconds through the tempo map. A new NoteOn on an open key
//! supersedes it (the earlier note is lost), and a NoteOn never closed by
//! end of track is silently dropped. Deliberate leniency, not an error.

use super::parser::{ChannelEventKind, RawChannelEvent};
use super::tempo::TempoMap;
use crate::events::{midi_to_freq, NoteEvent, Score, Track};
use crate::synth::VoiceConfig;
use log::debug;
use std::collections::HashMap;

/// Headroom factor applied to decoded velocities so several simultaneous
/// channels sum without immediate clipping
pub const INTENSITY_HEADROOM: f64 = 0.5;

/// Pair every track's events and assemble the canonical score.
///
/// Tracks that end up with no closed note are omitted. Each kept track is
/// tagged with the channel of its first NoteOn and given the voice the
/// channel heuristic selects for it.
pub fn pair_events(tracks: &[Vec<RawChannelEvent>], tempo_map: &TempoMap, a4: f64) -> Score {
    let mut score = Score::default();
    for events in tracks {
        let track = pair_track(events, tempo_map, a4);
        if !track.notes.is_empty() {
            score.tracks.push(track);
        }
    }
    score
}

fn pair_track(events: &[RawChannelEvent], tempo_map: &TempoMap, a4: f64) -> Track {
    let mut open: HashMap<(u8, u8), (u64, u8)> = HashMap::new();
    let mut notes = Vec::new();
    let mut track_channel: Option<u8> = None;

    for event in events {
        let key = (event.channel, event.pitch);
        match event.kind {
            ChannelEventKind::NoteOn => {
                // Re-onset on an open key supersedes the old entry.
                open.insert(key, (event.tick, event.velocity));
                track_channel.get_or_insert(event.channel);
            }
            ChannelEventKind::NoteOff => {
                if let Some((onset_tick, velocity)) = open.remove(&key) {
                    let start = tempo_map.seconds_at(onset_tick);
                    let end = tempo_map.seconds_at(event.tick);
                    notes.push(NoteEvent {
                        frequency_hz: midi_to_freq(event.pitch as i32, a4),
                        start,
                        duration: end - start,
                        intensity: velocity as f64 / 127.0 * INTENSITY_HEADROOM,
                        channel: event.channel,
                    });
                }
                // A NoteOff with no open key is ignored.
            }
        }
    }

    if !open.is_empty() {
        debug!("dropping {} unmatched NoteOn(s) at end of track", open.len());
    }

    notes.sort_by(|a, b| a.start.total_cmp(&b.start));
    let channel = track_channel.unwrap_or(0);
    Track {
        channel,
        voice: VoiceConfig::for_channel(channel),
        notes,
    }
}
