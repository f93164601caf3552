// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Plain snapshots of a sequence, exchanged with file loaders and savers.

use super::tempo_map::TempoMap;
use super::track::TrackProperties;
use super::TimeBase;
use crate::events::RawEvent;

/// One event with its timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct TimedEvent {
    pub time: f64,
    pub event: RawEvent,
}

impl TimedEvent {
    pub fn new(time: f64, event: impl Into<RawEvent>) -> Self {
        Self {
            time,
            event: event.into(),
        }
    }
}

/// Snapshot of one track
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackData {
    pub properties: TrackProperties,
    /// Events in playback order
    pub events: Vec<TimedEvent>,
}

impl TrackData {
    /// Empty regular track
    pub fn regular() -> Self {
        Self {
            properties: TrackProperties::regular(),
            events: Vec::new(),
        }
    }

    /// Empty tempo track
    pub fn tempo() -> Self {
        Self {
            properties: TrackProperties::tempo(),
            events: Vec::new(),
        }
    }
}

/// Snapshot of a whole sequence
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceData {
    pub time_base: TimeBase,
    pub sample_rate: f64,
    pub tempo: TrackData,
    pub tracks: Vec<TrackData>,
}

impl SequenceData {
    /// Tempo map described by the tempo track's events
    pub fn tempo_map(&self) -> TempoMap {
        TempoMap::from_events(
            self.time_base,
            self.sample_rate,
            self.tempo.events.iter().filter_map(|e| match &e.event {
                RawEvent::Tempo(tempo) => Some((e.time, tempo.bpm)),
                _ => None,
            }),
        )
    }
}

impl Default for SequenceData {
    fn default() -> Self {
        Self {
            time_base: TimeBase::default(),
            sample_rate: super::tempo_map::DEFAULT_SAMPLE_RATE,
            tempo: TrackData::tempo(),
            tracks: Vec::new(),
        }
    }
}
