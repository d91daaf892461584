//! Mixing, PCM encoding and WAV output
//!
//! The back half of the pipeline: render every track of a score into its
//! own floating-point buffer, sum the buffers into one master, normalize
//! against the peak and a target gain, quantize to signed 16-bit samples
//! and write a mono WAV container.

use crate::events::{Score, Track};
use crate::synth::{render_note, VoiceConfig, PERCUSSION_CHANNEL};
use crate::{HarmoniumError, RenderConfig, Result};
use log::{debug, info};
use std::path::Path;

/// Silence appended after the last release tail, in seconds
const TAIL_PAD: f64 = 0.5;

/// Frequency of the untuned percussion thump, in Hz
const PERCUSSION_HZ: f64 = 100.0;

/// Sounding duration of a percussion hit, in seconds
const PERCUSSION_DURATION: f64 = 0.05;

/// Render one track into a floating-point sample buffer.
///
/// Each note is rendered through the track's voice and summed into the
/// buffer at its onset sample; the buffer grows if a note runs past the
/// precomputed length. Percussion-channel notes are replaced by a short
/// untuned thump.
pub fn render_track(track: &Track, sample_rate: u32) -> Vec<f32> {
    if track.notes.is_empty() {
        return Vec::new();
    }

    let rate = sample_rate as f64;
    let total = track.last_end() + track.voice.release + TAIL_PAD;
    let mut buffer = vec![0.0f32; (total * rate) as usize];

    for note in &track.notes {
        let rendered = if note.channel == PERCUSSION_CHANNEL {
            render_note(
                PERCUSSION_HZ,
                PERCUSSION_DURATION,
                note.intensity,
                &VoiceConfig::percussion(),
                sample_rate,
            )
        } else {
            render_note(
                note.frequency_hz,
                note.duration,
                note.intensity,
                &track.voice,
                sample_rate,
            )
        };
        if let Some(samples) = rendered {
            let start = (note.start * rate) as usize;
            let end = start + samples.len();
            if end > buffer.len() {
                buffer.resize(end, 0.0);
            }
            for (slot, sample) in buffer[start..end].iter_mut().zip(&samples) {
                *slot += sample;
            }
        }
    }

    buffer
}

/// Sum buffers sample-by-sample into one master buffer.
///
/// The master is sized to the longest input; shorter buffers are
/// implicitly zero-extended. Fails with [`HarmoniumError::EmptyInput`]
/// when given no buffers at all.
pub fn mix(buffers: &[Vec<f32>]) -> Result<Vec<f32>> {
    if buffers.is_empty() {
        return Err(HarmoniumError::EmptyInput("no buffers to mix".into()));
    }
    let max_len = buffers.iter().map(Vec::len).max().unwrap_or(0);
    let mut master = vec![0.0f32; max_len];
    for buffer in buffers {
        for (slot, sample) in master.iter_mut().zip(buffer) {
            *slot += sample;
        }
    }
    Ok(master)
}

/// Render and mix every track of a score into one master buffer.
pub fn render_score(score: &Score, config: &RenderConfig) -> Result<Vec<f32>> {
    if score.tracks.is_empty() {
        return Err(HarmoniumError::EmptyInput("score contains no tracks".into()));
    }
    let mut buffers = Vec::with_capacity(score.tracks.len());
    for (i, track) in score.tracks.iter().enumerate() {
        debug!(
            "rendering track {}/{} (channel {}, {} notes)",
            i + 1,
            score.tracks.len(),
            track.channel,
            track.notes.len()
        );
        buffers.push(render_track(track, config.sample_rate));
    }
    let master = mix(&buffers)?;
    info!(
        "mixed {} track(s) into {:.1} s of audio",
        buffers.len(),
        master.len() as f64 / config.sample_rate as f64
    );
    Ok(master)
}

/// Normalize against the peak and quantize to signed 16-bit samples.
///
/// The buffer is scaled so the peak maps to `gain` of full scale, then
/// clipped to [-1, 1] and rounded. A silent buffer passes through
/// unscaled.
pub fn encode_pcm16(samples: &[f32], gain: f64) -> Vec<i16> {
    let peak = samples.iter().fold(0.0f32, |m, &s| m.max(s.abs()));
    let scale = if peak > 0.0 { gain as f32 / peak } else { 1.0 };
    samples
        .iter()
        .map(|&s| ((s * scale).clamp(-1.0, 1.0) * 32767.0).round() as i16)
        .collect()
}

/// Write samples as a mono 16-bit WAV file.
pub fn write_wav(path: &Path, samples: &[i16], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|e| HarmoniumError::AudioFile(format!("{}: {e}", path.display())))?;
    for &sample in samples {
        writer
            .write_sample(sample)
            .map_err(|e| HarmoniumError::AudioFile(e.to_string()))?;
    }
    writer
        .finalize()
        .map_err(|e| HarmoniumError::AudioFile(e.to_string()))?;
    Ok(())
}
