//! Binary event-stream decoding
//!
//! Turns a chunked binary note-event container (Standard MIDI File) into
//! the canonical note-event model in two passes: the chunk/event decoder
//! ([`SmfParser`]) produces tick-stamped raw events plus a [`TempoMap`],
//! and the pairing pass ([`pair_events`]) matches NoteOn/NoteOff pairs and
//! converts ticks to seconds.

pub mod notes;
pub mod parser;
pub mod reader;
pub mod tempo;

pub use notes::pair_events;
pub use parser::{ChannelEventKind, ParsedStream, RawChannelEvent, SmfHeader, SmfParser};
pub use reader::{encode_vlq, ByteReader};
pub use tempo::TempoMap;
