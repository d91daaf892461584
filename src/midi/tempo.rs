//! Tempo map: tick-anchored tempo changes and tick-to-seconds conversion

use crate::{HarmoniumError, Result};

/// Default tempo before any explicit tempo event: 500000 us/beat = 120 BPM
pub const DEFAULT_US_PER_BEAT: u32 = 500_000;

/// Ordered list of `(tick, microseconds-per-beat)` breakpoints.
///
/// Owned by the decoding session; read-only once a stream's decode
/// completes. Conversion walks the breakpoints in ascending order and
/// integrates each tempo segment separately.
#[derive(Debug, Clone)]
pub struct TempoMap {
    ticks_per_beat: u16,
    breakpoints: Vec<(u64, u32)>,
}

impl TempoMap {
    /// Create an empty map for a stream with the given tick division
    pub fn new(ticks_per_beat: u16) -> Self {
        TempoMap {
            ticks_per_beat,
            breakpoints: Vec::new(),
        }
    }

    /// Replace the whole map with a single fixed rate at tick 0.
    ///
    /// Used to defeat per-file tempo automation when the caller wants a
    /// deterministic rate; conversion degenerates to a linear scale.
    pub fn with_fixed_bpm(ticks_per_beat: u16, bpm: f64) -> Result<Self> {
        if !(bpm > 0.0) {
            return Err(HarmoniumError::Config(format!(
                "tempo override must be positive, got {bpm}"
            )));
        }
        Ok(TempoMap {
            ticks_per_beat,
            breakpoints: vec![(0, (60_000_000.0 / bpm).round() as u32)],
        })
    }

    /// Tick division this map was built with
    pub fn ticks_per_beat(&self) -> u16 {
        self.ticks_per_beat
    }

    /// Append a tempo breakpoint (from a decoded tempo meta event)
    pub fn push(&mut self, tick: u64, us_per_beat: u32) {
        self.breakpoints.push((tick, us_per_beat));
    }

    /// Sort breakpoints and install the default tempo if none were seen.
    ///
    /// Call once after every track has been decoded; tracks may contribute
    /// breakpoints out of global tick order.
    pub fn finalize(&mut self) {
        if self.breakpoints.is_empty() {
            self.breakpoints.push((0, DEFAULT_US_PER_BEAT));
        }
        self.breakpoints.sort_by_key(|&(tick, _)| tick);
    }

    /// Absolute time of `tick` in seconds.
    ///
    /// Accumulates `span * (us_per_beat / 1e6) / ticks_per_beat` for every
    /// breakpoint at or below `tick`, then the partial remainder under the
    /// last applicable tempo. Ticks before the first breakpoint run at the
    /// default 120 BPM.
    pub fn seconds_at(&self, tick: u64) -> f64 {
        let tpb = self.ticks_per_beat as f64;
        let mut seconds = 0.0;
        let mut current_tick = 0u64;
        let mut current_us_per_beat = DEFAULT_US_PER_BEAT;

        for &(bp_tick, us_per_beat) in &self.breakpoints {
            if bp_tick > tick {
                break;
            }
            let span = (bp_tick - current_tick) as f64;
            seconds += span * (current_us_per_beat as f64 / 1_000_000.0) / tpb;
            current_tick = bp_tick;
            current_us_per_beat = us_per_beat;
        }

        let span = (tick - current_tick) as f64;
        seconds + span * (current_us_per_beat as f64 / 1_000_000.0) / tpb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_one_beat_at_default_tempo() {
        let mut map = TempoMap::new(480);
        map.finalize();
        assert_relative_eq!(map.seconds_at(480), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_tick_zero_is_time_zero() {
        let mut map = TempoMap::new(480);
        map.finalize();
        assert_relative_eq!(map.seconds_at(0), 0.0);
    }

    #[test]
    fn test_tempo_change_mid_stream() {
        // 480 ticks at 120 BPM (0.5 s), then 480 ticks at 60 BPM (1.0 s).
        let mut map = TempoMap::new(480);
        map.push(480, 1_000_000);
        map.finalize();
        assert_relative_eq!(map.seconds_at(960), 1.5, epsilon = 1e-9);
    }

    #[test]
    fn test_breakpoint_at_target_tick_has_no_effect_yet() {
        let mut map = TempoMap::new(480);
        map.push(480, 1_000_000);
        map.finalize();
        // The new tempo starts *at* tick 480; integrating up to 480 only
        // uses the default.
        assert_relative_eq!(map.seconds_at(480), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_unsorted_breakpoints_are_ordered_by_finalize() {
        let mut map = TempoMap::new(480);
        map.push(960, 250_000);
        map.push(480, 1_000_000);
        map.finalize();
        // 0.5 + 1.0 + (480 ticks at 240 BPM = 0.25)
        assert_relative_eq!(map.seconds_at(1440), 1.75, epsilon = 1e-9);
    }

    #[test]
    fn test_fixed_bpm_override() {
        let map = TempoMap::with_fixed_bpm(480, 120.0).unwrap();
        assert_relative_eq!(map.seconds_at(960), 1.0, epsilon = 1e-9);
        let map = TempoMap::with_fixed_bpm(480, 240.0).unwrap();
        assert_relative_eq!(map.seconds_at(960), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_fixed_bpm_rejects_nonpositive() {
        assert!(TempoMap::with_fixed_bpm(480, 0.0).is_err());
        assert!(TempoMap::with_fixed_bpm(480, -10.0).is_err());
    }
}
