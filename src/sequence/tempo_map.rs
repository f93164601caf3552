// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Tempo map built from the tempo track.
//!
//! Converts between sequence time (in the sequence's time base), beats and
//! wall-clock seconds. Tempo is piecewise constant between tempo events and
//! defaults to 120 BPM until the first one.

use super::TimeBase;

/// Tempo used before the first tempo event
pub const DEFAULT_BPM: f64 = 120.0;

/// Sample rate used for the samples time base unless configured
pub const DEFAULT_SAMPLE_RATE: f64 = 44_100.0;

/// A stretch of constant tempo
#[derive(Debug, Clone, Copy, PartialEq)]
struct Segment {
    beat: f64,
    seconds: f64,
    bpm: f64,
}

impl Segment {
    fn seconds_per_beat(&self) -> f64 {
        60.0 / self.bpm
    }
}

/// Piecewise-constant tempo curve
#[derive(Debug, Clone, PartialEq)]
pub struct TempoMap {
    segments: Vec<Segment>,
    time_base: TimeBase,
    sample_rate: f64,
}

impl TempoMap {
    /// Constant 120 BPM map
    pub fn new(time_base: TimeBase, sample_rate: f64) -> Self {
        Self {
            segments: vec![Segment {
                beat: 0.0,
                seconds: 0.0,
                bpm: DEFAULT_BPM,
            }],
            time_base,
            sample_rate,
        }
    }

    /// Build from `(time, bpm)` pairs in sequence time, in ascending order.
    ///
    /// Tempo events with a non-positive or non-finite BPM are ignored. A later
    /// event at the same position replaces an earlier one.
    pub fn from_events<I>(time_base: TimeBase, sample_rate: f64, events: I) -> Self
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut map = Self::new(time_base, sample_rate);
        for (time, bpm) in events {
            if !(bpm.is_finite() && bpm > 0.0) {
                continue;
            }
            map.push(time, bpm);
        }
        map
    }

    fn push(&mut self, time: f64, bpm: f64) {
        let last = self.segments[self.segments.len() - 1];
        let (beat, seconds) = match self.time_base {
            TimeBase::Beats => {
                let beat = time.max(last.beat);
                (beat, last.seconds + (beat - last.beat) * last.seconds_per_beat())
            }
            TimeBase::Seconds | TimeBase::Samples => {
                let seconds = self.base_to_seconds(time).max(last.seconds);
                (last.beat + (seconds - last.seconds) / last.seconds_per_beat(), seconds)
            }
        };

        let segment = Segment { beat, seconds, bpm };
        if beat == last.beat {
            let end = self.segments.len() - 1;
            self.segments[end] = segment;
        } else {
            self.segments.push(segment);
        }
    }

    fn segment_for_beat(&self, beat: f64) -> &Segment {
        let index = self.segments.partition_point(|s| s.beat <= beat);
        &self.segments[index.saturating_sub(1)]
    }

    fn segment_for_seconds(&self, seconds: f64) -> &Segment {
        let index = self.segments.partition_point(|s| s.seconds <= seconds);
        &self.segments[index.saturating_sub(1)]
    }

    /// Time base this map interprets sequence time in
    pub fn time_base(&self) -> TimeBase {
        self.time_base
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Tempo in effect at a beat position
    pub fn tempo_at(&self, beat: f64) -> f64 {
        self.segment_for_beat(beat).bpm
    }

    pub fn beats_to_seconds(&self, beat: f64) -> f64 {
        let segment = self.segment_for_beat(beat);
        segment.seconds + (beat - segment.beat) * segment.seconds_per_beat()
    }

    pub fn seconds_to_beats(&self, seconds: f64) -> f64 {
        let segment = self.segment_for_seconds(seconds);
        segment.beat + (seconds - segment.seconds) / segment.seconds_per_beat()
    }

    /// Seconds for a non-beat time base
    fn base_to_seconds(&self, time: f64) -> f64 {
        match self.time_base {
            TimeBase::Samples => time / self.sample_rate,
            _ => time,
        }
    }

    /// Sequence time to seconds
    pub fn to_seconds(&self, time: f64) -> f64 {
        match self.time_base {
            TimeBase::Beats => self.beats_to_seconds(time),
            TimeBase::Seconds | TimeBase::Samples => self.base_to_seconds(time),
        }
    }

    /// Seconds to sequence time
    pub fn from_seconds(&self, seconds: f64) -> f64 {
        match self.time_base {
            TimeBase::Beats => self.seconds_to_beats(seconds),
            TimeBase::Seconds => seconds,
            TimeBase::Samples => seconds * self.sample_rate,
        }
    }

    /// Sequence time to beats
    pub fn to_beats(&self, time: f64) -> f64 {
        match self.time_base {
            TimeBase::Beats => time,
            _ => self.seconds_to_beats(self.base_to_seconds(time)),
        }
    }

    /// Number of tempo segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl Default for TempoMap {
    fn default() -> Self {
        Self::new(TimeBase::Beats, DEFAULT_SAMPLE_RATE)
    }
}
