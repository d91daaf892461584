//! Additive synthesis
//!
//! Turns canonical note events into sample buffers: a closed set of voice
//! presets ([`VoicePreset`]), immutable per-track timbre configurations
//! ([`VoiceConfig`]) and the per-note harmonic renderer ([`render_note`]).

pub mod render;
pub mod voice;

pub use render::render_note;
pub use voice::{VoiceConfig, VoicePreset, PERCUSSION_CHANNEL};
