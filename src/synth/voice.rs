//! Voice presets and configurations
//!
//! A [`VoiceConfig`] is the complete timbre description the renderer
//! needs: one amplitude per harmonic plus attack/release times. Configs
//! are immutable value objects built by pure factories; presets are a
//! closed enumeration, so an unknown preset name is a configuration error
//! instead of a silent fallback.

use crate::{HarmoniumError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Timbre description for one voice or track.
///
/// `overtones[i]` is the amplitude of harmonic `i + 1` (index 0 is the
/// fundamental). Constructed once per voice, read-only during rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceConfig {
    /// Amplitude per harmonic, fundamental first
    pub overtones: Vec<f64>,
    /// Linear fade-in time in seconds (prevents onset clicks)
    pub attack: f64,
    /// Linear fade-out time in seconds, appended after the note's duration
    pub release: f64,
}

impl VoiceConfig {
    /// Voice for a decoded stream track, chosen by channel number.
    ///
    /// Channel 9 is percussion by convention and gets a single-partial
    /// thump; even channels get a piano-like spectrum, odd channels a
    /// strings-like one.
    pub fn for_channel(channel: u8) -> Self {
        if channel == PERCUSSION_CHANNEL {
            Self::percussion()
        } else if channel % 2 == 0 {
            VoiceConfig {
                overtones: vec![1.0, 0.6, 0.3, 0.1, 0.05],
                attack: 0.05,
                release: 0.15,
            }
        } else {
            VoiceConfig {
                overtones: vec![0.8, 0.8, 0.5, 0.2],
                attack: 0.05,
                release: 0.3,
            }
        }
    }

    /// The short untuned thump used for percussion-channel hits
    pub fn percussion() -> Self {
        VoiceConfig {
            overtones: vec![1.0],
            attack: 0.05,
            release: 0.05,
        }
    }
}

/// Percussion channel number in the decoded stream convention
pub const PERCUSSION_CHANNEL: u8 = 9;

/// Closed set of instrument presets for notation voices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoicePreset {
    /// General-purpose default timbre
    #[default]
    Default,
    /// Fundamental only
    PureSine,
    /// Few overtones, slow airy attack
    Flute,
    /// Many steady overtones
    Organ,
    /// Odd harmonics dominate (cylindrical closed pipe)
    Clarinet,
    /// Sawtooth-like 1/n rolloff, soft bow attack
    Violin,
    /// Percussive attack, 1/n^1.3 rolloff with the 7th harmonic struck out
    Piano,
    /// Bright plucked spectrum, short decay
    Harpsichord,
    /// Square-wave odd harmonics, near-instant attack
    Chiptune,
    /// Sparse dissonant partials, long ring-out
    Bell,
}

impl VoicePreset {
    /// Every preset, in declaration order
    pub const ALL: [VoicePreset; 10] = [
        VoicePreset::Default,
        VoicePreset::PureSine,
        VoicePreset::Flute,
        VoicePreset::Organ,
        VoicePreset::Clarinet,
        VoicePreset::Violin,
        VoicePreset::Piano,
        VoicePreset::Harpsichord,
        VoicePreset::Chiptune,
        VoicePreset::Bell,
    ];

    /// The preset's name as accepted by [`FromStr`]
    pub fn name(self) -> &'static str {
        match self {
            VoicePreset::Default => "default",
            VoicePreset::PureSine => "pure_sine",
            VoicePreset::Flute => "flute",
            VoicePreset::Organ => "organ",
            VoicePreset::Clarinet => "clarinet",
            VoicePreset::Violin => "violin",
            VoicePreset::Piano => "piano",
            VoicePreset::Harpsichord => "harpsichord",
            VoicePreset::Chiptune => "chiptune",
            VoicePreset::Bell => "bell",
        }
    }

    /// Build the preset's immutable voice configuration
    pub fn config(self) -> VoiceConfig {
        match self {
            VoicePreset::Default => VoiceConfig {
                overtones: vec![1.0, 0.6, 0.3, 0.1, 0.05],
                attack: 0.05,
                release: 0.2,
            },
            VoicePreset::PureSine => VoiceConfig {
                overtones: vec![1.0],
                attack: 0.05,
                release: 0.1,
            },
            VoicePreset::Flute => VoiceConfig {
                overtones: vec![1.0, 0.5, 0.2],
                attack: 0.1,
                release: 0.1,
            },
            VoicePreset::Organ => VoiceConfig {
                overtones: vec![1.0, 0.5, 0.5, 0.3, 0.2, 0.1, 0.05, 0.05],
                attack: 0.08,
                release: 0.2,
            },
            VoicePreset::Clarinet => VoiceConfig {
                overtones: vec![1.0, 0.0, 0.5, 0.0, 0.3, 0.0, 0.1],
                attack: 0.08,
                release: 0.1,
            },
            VoicePreset::Violin => VoiceConfig {
                overtones: (1..16).map(|n| 1.0 / n as f64).collect(),
                attack: 0.2,
                release: 0.3,
            },
            VoicePreset::Piano => VoiceConfig {
                // The 7th harmonic is suppressed by the hammer strike
                // position on real instruments.
                overtones: (1..12)
                    .map(|n| if n == 7 { 0.0 } else { 1.0 / (n as f64).powf(1.3) })
                    .collect(),
                attack: 0.01,
                release: 0.4,
            },
            VoicePreset::Harpsichord => VoiceConfig {
                overtones: (1..20).map(|n| 0.6 / (n as f64).powf(0.8)).collect(),
                attack: 0.02,
                release: 0.1,
            },
            VoicePreset::Chiptune => VoiceConfig {
                overtones: (1..20)
                    .map(|n| if n % 2 == 0 { 0.0 } else { 1.0 / n as f64 })
                    .collect(),
                attack: 0.005,
                release: 0.05,
            },
            VoicePreset::Bell => VoiceConfig {
                overtones: vec![1.0, 0.0, 0.0, 0.5, 0.0, 0.8, 0.0, 0.0, 0.3],
                attack: 0.005,
                release: 1.5,
            },
        }
    }
}

impl FromStr for VoicePreset {
    type Err = HarmoniumError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.name() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|p| p.name()).collect();
                HarmoniumError::Config(format!(
                    "unknown voice preset '{s}' (known: {})",
                    known.join(", ")
                ))
            })
    }
}

impl std::fmt::Display for VoicePreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_preset_name_round_trips() {
        for preset in VoicePreset::ALL {
            assert_eq!(preset.name().parse::<VoicePreset>().unwrap(), preset);
        }
    }

    #[test]
    fn test_unknown_preset_is_config_error() {
        let result = "theremin".parse::<VoicePreset>();
        assert!(matches!(result, Err(HarmoniumError::Config(_))));
    }

    #[test]
    fn test_preset_configs_are_sane() {
        for preset in VoicePreset::ALL {
            let config = preset.config();
            assert!(!config.overtones.is_empty(), "{preset} has no overtones");
            assert!(config.overtones.iter().all(|&a| a >= 0.0));
            assert!(config.overtones.iter().sum::<f64>() > 0.0);
            assert!(config.attack >= 0.0);
            assert!(config.release >= 0.0);
        }
    }

    #[test]
    fn test_clarinet_favors_odd_harmonics() {
        let config = VoicePreset::Clarinet.config();
        // Even harmonics (indices 1, 3, 5) are silent.
        assert_eq!(config.overtones[1], 0.0);
        assert_eq!(config.overtones[3], 0.0);
        assert!(config.overtones[2] > 0.0);
    }

    #[test]
    fn test_piano_suppresses_seventh_harmonic() {
        let config = VoicePreset::Piano.config();
        assert_eq!(config.overtones[6], 0.0);
        assert!(config.overtones[5] > 0.0);
        assert!(config.overtones[7] > 0.0);
    }

    #[test]
    fn test_channel_heuristic() {
        assert_eq!(VoiceConfig::for_channel(9), VoiceConfig::percussion());
        assert_ne!(VoiceConfig::for_channel(0), VoiceConfig::for_channel(1));
        assert_eq!(VoiceConfig::for_channel(0), VoiceConfig::for_channel(2));
    }

    #[test]
    fn test_preset_deserializes_from_snake_case() {
        let preset: VoicePreset = serde_json::from_str("\"pure_sine\"").unwrap();
        assert_eq!(preset, VoicePreset::PureSine);
        assert!(serde_json::from_str::<VoicePreset>("\"kazoo\"").is_err());
    }
}
