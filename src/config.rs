//! Render configuration
//!
//! The single configuration surface consumed by the pipeline: sample rate,
//! tempo, meter, voice preset, gain and tuning. Loadable from a JSON file
//! so renders are reproducible without re-typing CLI flags.

use crate::synth::VoicePreset;
use crate::{HarmoniumError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// A musical meter (time signature), e.g. `4/4` or `3/8`.
///
/// Used only for the advisory bar-length validation of the notation parser;
/// it never affects timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Meter {
    /// Beats per bar (the numerator)
    pub numerator: u32,
    /// Beat unit as a note denominator (4 = quarter, 8 = eighth)
    pub denominator: u32,
}

impl Meter {
    /// Expected bar length in quarter-note units (4/4 -> 4.0, 6/8 -> 3.0)
    pub fn bar_length(&self) -> f64 {
        self.numerator as f64 * (4.0 / self.denominator as f64)
    }
}

impl Default for Meter {
    fn default() -> Self {
        Meter {
            numerator: 4,
            denominator: 4,
        }
    }
}

impl FromStr for Meter {
    type Err = HarmoniumError;

    fn from_str(s: &str) -> Result<Self> {
        let bad = || HarmoniumError::Config(format!("cannot read meter '{s}', expected 'num/den'"));
        let (num, den) = s.split_once('/').ok_or_else(bad)?;
        let numerator: u32 = num.trim().parse().map_err(|_| bad())?;
        let denominator: u32 = den.trim().parse().map_err(|_| bad())?;
        if numerator == 0 || denominator == 0 {
            return Err(bad());
        }
        Ok(Meter {
            numerator,
            denominator,
        })
    }
}

impl TryFrom<String> for Meter {
    type Error = HarmoniumError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Meter> for String {
    fn from(m: Meter) -> String {
        format!("{}/{}", m.numerator, m.denominator)
    }
}

impl std::fmt::Display for Meter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Configuration for one render of the whole pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Tempo for text notation, in beats per minute
    pub bpm: f64,
    /// Meter used for the advisory bar-length check
    pub meter: Meter,
    /// When set, replaces a decoded stream's entire tempo map with this
    /// fixed rate (defeats per-file tempo automation)
    pub tempo_override_bpm: Option<f64>,
    /// Voice preset applied to text-notation voices
    pub preset: VoicePreset,
    /// Peak level the normalized mix is scaled to, in (0, 1]
    pub gain: f64,
    /// Global transposition for text notation, in semitones
    pub transpose: i32,
    /// Reference tuning: frequency of A4 in Hz
    pub a4: f64,
    /// Whether the notation parser emits bar-length warnings
    pub validate: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            sample_rate: 44_100,
            bpm: 100.0,
            meter: Meter::default(),
            tempo_override_bpm: None,
            preset: VoicePreset::default(),
            gain: 0.85,
            transpose: 0,
            a4: 440.0,
            validate: true,
        }
    }
}

impl RenderConfig {
    /// Load a configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: RenderConfig = serde_json::from_str(&text)
            .map_err(|e| HarmoniumError::Config(format!("{}: {e}", path.display())))?;
        config.checked()
    }

    /// Validate numeric ranges, returning the configuration unchanged
    pub fn checked(self) -> Result<Self> {
        if self.sample_rate == 0 {
            return Err(HarmoniumError::Config("sample rate must be positive".into()));
        }
        if !(self.bpm > 0.0) {
            return Err(HarmoniumError::Config(format!("bpm must be positive, got {}", self.bpm)));
        }
        if let Some(bpm) = self.tempo_override_bpm {
            if !(bpm > 0.0) {
                return Err(HarmoniumError::Config(format!(
                    "tempo override must be positive, got {bpm}"
                )));
            }
        }
        if !(self.gain > 0.0 && self.gain <= 1.0) {
            return Err(HarmoniumError::Config(format!(
                "gain must be in (0, 1], got {}",
                self.gain
            )));
        }
        if !(self.a4 > 0.0) {
            return Err(HarmoniumError::Config(format!("a4 must be positive, got {}", self.a4)));
        }
        Ok(self)
    }
}
