//! Additive-synthesis note renderer
//!
//! One note event in, one sample buffer out. The signal is a sum of
//! sine harmonics at integer multiples of the fundamental, normalized by
//! the voice's total configured amplitude, shaped by a linear
//! attack/sustain/release envelope and scaled by the event's intensity.
//!
//! Harmonics at or above the Nyquist limit (half the sample rate) are not
//! summed; they cannot be represented and would alias. The division still
//! uses the *full* configured amplitude sum so relative loudness across
//! voices stays comparable regardless of how many harmonics a given pitch
//! allowed.
//!
//! Rendering is pure: identical inputs produce bit-identical buffers.

use super::voice::VoiceConfig;
use std::f64::consts::TAU;

/// Render one note into a fresh sample buffer.
///
/// Returns `None` for rests (`frequency_hz <= 0`); the caller skips
/// placement. The buffer covers `duration + release` seconds. A voice
/// whose amplitudes sum to zero renders silence rather than failing.
pub fn render_note(
    frequency_hz: f64,
    duration: f64,
    intensity: f64,
    voice: &VoiceConfig,
    sample_rate: u32,
) -> Option<Vec<f32>> {
    if frequency_hz <= 0.0 {
        return None;
    }

    let rate = sample_rate as f64;
    let total_time = (duration + voice.release).max(0.0);
    let num_samples = (total_time * rate) as usize;
    if num_samples == 0 {
        return Some(Vec::new());
    }
    let dt = total_time / num_samples as f64;

    let total_amplitude: f64 = voice.overtones.iter().sum();
    if total_amplitude <= 0.0 {
        return Some(vec![0.0; num_samples]);
    }

    // Angular frequency per harmonic, Nyquist-limited.
    let nyquist = rate / 2.0;
    let harmonics: Vec<(f64, f64)> = voice
        .overtones
        .iter()
        .enumerate()
        .filter(|&(_, &amplitude)| amplitude > 0.0)
        .map(|(i, &amplitude)| (frequency_hz * (i + 1) as f64, amplitude))
        .filter(|&(harmonic_freq, _)| harmonic_freq < nyquist)
        .map(|(harmonic_freq, amplitude)| (TAU * harmonic_freq, amplitude))
        .collect();

    let attack_len = ((voice.attack * rate) as usize).min(num_samples);
    let sustain_len = (duration * rate) as usize;

    let mut buffer = Vec::with_capacity(num_samples);
    for k in 0..num_samples {
        let t = k as f64 * dt;
        let signal: f64 = harmonics.iter().map(|&(omega, a)| a * (omega * t).sin()).sum();
        let envelope = envelope_at(k, num_samples, attack_len, sustain_len);
        buffer.push((signal / total_amplitude * envelope * intensity) as f32);
    }
    Some(buffer)
}

/// Linear attack / sustain / release envelope value at sample `k`.
///
/// Ramps 0 to 1 over the attack, holds 1 through the sustain, ramps 1 to
/// 0 from the end of the sustain to the end of the buffer.
fn envelope_at(k: usize, num_samples: usize, attack_len: usize, sustain_len: usize) -> f64 {
    if k < attack_len {
        if attack_len > 1 {
            k as f64 / (attack_len - 1) as f64
        } else {
            0.0
        }
    } else if k >= sustain_len && sustain_len < num_samples {
        let release_len = num_samples - sustain_len;
        if release_len > 1 {
            1.0 - (k - sustain_len) as f64 / (release_len - 1) as f64
        } else {
            1.0
        }
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::VoicePreset;

    const RATE: u32 = 44_100;

    #[test]
    fn test_rest_renders_nothing() {
        let voice = VoicePreset::Default.config();
        assert!(render_note(0.0, 1.0, 1.0, &voice, RATE).is_none());
    }

    #[test]
    fn test_buffer_length_includes_release() {
        let voice = VoiceConfig {
            overtones: vec![1.0],
            attack: 0.0,
            release: 0.25,
        };
        let buffer = render_note(440.0, 0.5, 1.0, &voice, RATE).unwrap();
        assert_eq!(buffer.len(), (0.75 * RATE as f64) as usize);
    }

    #[test]
    fn test_nyquist_excludes_high_harmonics() {
        // Fundamental at 15 kHz: harmonic 2 sits at 30 kHz, above the
        // 22.05 kHz Nyquist limit, so only the fundamental may sound.
        let two_harmonics = VoiceConfig {
            overtones: vec![1.0, 1.0],
            attack: 0.0,
            release: 0.0,
        };
        let fundamental_only = VoiceConfig {
            overtones: vec![1.0, 0.0],
            attack: 0.0,
            release: 0.0,
        };
        let with_cut = render_note(15_000.0, 0.01, 1.0, &two_harmonics, RATE).unwrap();
        let reference = render_note(15_000.0, 0.01, 1.0, &fundamental_only, RATE).unwrap();
        // Both divide by the same total amplitude (2.0), and the excluded
        // harmonic contributes nothing, so the buffers are identical.
        assert_eq!(with_cut, reference);
    }

    #[test]
    fn test_all_harmonics_above_nyquist_is_silence() {
        let voice = VoiceConfig {
            overtones: vec![1.0],
            attack: 0.0,
            release: 0.0,
        };
        let buffer = render_note(23_000.0, 0.01, 1.0, &voice, RATE).unwrap();
        assert!(buffer.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_normalization_uses_full_amplitude_sum() {
        // Same fundamental amplitude, but the second config carries a
        // second (audible) harmonic; peak of the first must be roughly
        // half the lone-sine peak because the divisor counts both.
        let lone = VoiceConfig {
            overtones: vec![1.0],
            attack: 0.0,
            release: 0.0,
        };
        let diluted = VoiceConfig {
            overtones: vec![1.0, 1.0],
            attack: 0.0,
            release: 0.0,
        };
        let peak = |buffer: &[f32]| buffer.iter().fold(0.0f32, |m, &s| m.max(s.abs()));
        let lone_peak = peak(&render_note(440.0, 0.1, 1.0, &lone, RATE).unwrap());
        let diluted_fundamental = render_note(15_000.0, 0.1, 1.0, &diluted, RATE).unwrap();
        // At 15 kHz the second harmonic is Nyquist-cut, leaving a pure
        // sine divided by 2.0.
        let diluted_peak = peak(&diluted_fundamental);
        assert!((diluted_peak - lone_peak / 2.0).abs() < 0.01);
    }

    #[test]
    fn test_envelope_starts_and_ends_near_zero() {
        let voice = VoiceConfig {
            overtones: vec![1.0],
            attack: 0.05,
            release: 0.1,
        };
        let buffer = render_note(440.0, 0.3, 1.0, &voice, RATE).unwrap();
        assert_eq!(buffer[0], 0.0);
        // The closing release sample carries an envelope of ~0.
        assert!(buffer[buffer.len() - 1].abs() < 1e-3);
    }

    #[test]
    fn test_intensity_scales_output() {
        let voice = VoicePreset::PureSine.config();
        let loud = render_note(440.0, 0.1, 1.0, &voice, RATE).unwrap();
        let soft = render_note(440.0, 0.1, 0.25, &voice, RATE).unwrap();
        for (l, s) in loud.iter().zip(&soft) {
            assert!((l * 0.25 - s).abs() < 1e-6);
        }
    }

    #[test]
    fn test_zero_duration_degrades_to_release_tail_only() {
        let voice = VoiceConfig {
            overtones: vec![1.0],
            attack: 0.01,
            release: 0.1,
        };
        let buffer = render_note(440.0, 0.0, 1.0, &voice, RATE).unwrap();
        assert_eq!(buffer.len(), (0.1 * RATE as f64) as usize);
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let voice = VoicePreset::Piano.config();
        let first = render_note(261.63, 0.4, 0.8, &voice, RATE).unwrap();
        let second = render_note(261.63, 0.4, 0.8, &voice, RATE).unwrap();
        assert_eq!(first, second);
    }
}
