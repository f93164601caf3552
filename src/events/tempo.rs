// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Tempo events for the tempo track.

use super::options::{required_number, TempoOptions};
use crate::error::Result;

/// Largest tempo value a MIDI file's 24-bit field can hold
pub const MAX_MICROS_PER_QUARTER: u32 = 0xFF_FFFF;

/// Tempo change in beats per minute
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoEvent {
    pub bpm: f64,
}

impl TempoEvent {
    /// Create a tempo event
    pub fn new(bpm: f64) -> Self {
        Self { bpm }
    }

    /// Build from dynamic options; `bpm` is required and must be numeric
    pub fn create(opts: &TempoOptions) -> Result<Self> {
        Ok(Self::new(required_number("bpm", opts.bpm.as_ref())?))
    }

    /// Whether the tempo can drive a tempo map
    pub fn is_usable(&self) -> bool {
        self.bpm.is_finite() && self.bpm > 0.0
    }

    /// Microseconds per quarter note, as written to a MIDI file.
    ///
    /// Clamped to the 24-bit range, so tempos below about 3.6 BPM write as
    /// the slowest representable tempo.
    pub fn micros_per_quarter(&self) -> u32 {
        let micros = (60_000_000.0 / self.bpm).round();
        micros.clamp(1.0, MAX_MICROS_PER_QUARTER as f64) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_create() {
        let opts = TempoOptions {
            bpm: Some(120.into()),
        };
        assert_eq!(TempoEvent::create(&opts).unwrap().bpm, 120.0);
        assert!(matches!(
            TempoEvent::create(&TempoOptions::default()),
            Err(Error::MissingField("bpm"))
        ));
    }

    #[test]
    fn test_micros_per_quarter() {
        assert_eq!(TempoEvent::new(120.0).micros_per_quarter(), 500_000);
        assert_eq!(TempoEvent::new(60.0).micros_per_quarter(), 1_000_000);
    }

    #[test]
    fn test_micros_per_quarter_clamped() {
        assert_eq!(TempoEvent::new(1.0).micros_per_quarter(), MAX_MICROS_PER_QUARTER);
        assert_eq!(TempoEvent::new(3.0).micros_per_quarter(), MAX_MICROS_PER_QUARTER);
        assert_eq!(TempoEvent::new(1e9).micros_per_quarter(), 1);
    }

    #[test]
    fn test_usable() {
        assert!(TempoEvent::new(90.0).is_usable());
        assert!(!TempoEvent::new(0.0).is_usable());
        assert!(!TempoEvent::new(-10.0).is_usable());
    }
}
