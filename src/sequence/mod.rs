// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Sequence engine.
//!
//! A [`Sequence`] owns an ordered list of regular tracks plus one tempo
//! track. Tracks, iterators and players refer back to it through weak
//! handles, so dropping the last `Sequence` handle releases everything.

pub mod data;
pub mod iterator;
pub mod tempo_map;
pub mod track;

pub use data::{SequenceData, TimedEvent, TrackData};
pub use iterator::EventIterator;
pub use tempo_map::{TempoMap, DEFAULT_BPM, DEFAULT_SAMPLE_RATE};
pub use track::{LoopInfo, Track, TrackProperties, DEFAULT_TIME_RESOLUTION};

use std::cell::RefCell;
use std::fmt;
use std::path::Path;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::events::RawEvent;
use crate::midi::EndpointRef;
use crate::smf::{SmfLoader, SmfSaver};
use track::TrackStore;

/// Unit system for a sequence's timestamps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeBase {
    #[default]
    Beats,
    Seconds,
    Samples,
}

/// Shared state behind every handle to one sequence
#[derive(Debug)]
pub(crate) struct SequenceState {
    tracks: Vec<Rc<RefCell<TrackStore>>>,
    tempo: Rc<RefCell<TrackStore>>,
    time_base: TimeBase,
    sample_rate: f64,
    destination: Option<EndpointRef>,
}

impl SequenceState {
    fn new() -> Self {
        Self {
            tracks: Vec::new(),
            tempo: Rc::new(RefCell::new(TrackStore::new(TrackProperties::tempo(), true))),
            time_base: TimeBase::default(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            destination: None,
        }
    }
}

/// Handle to a sequence.
///
/// Cloning shares the sequence; it lives until the last `Sequence` handle is
/// dropped.
#[derive(Clone)]
pub struct Sequence {
    state: Rc<RefCell<SequenceState>>,
}

impl Sequence {
    /// Empty sequence with its tempo track
    pub fn new() -> Self {
        debug!("creating sequence");
        Self {
            state: Rc::new(RefCell::new(SequenceState::new())),
        }
    }

    pub(crate) fn from_state(state: Rc<RefCell<SequenceState>>) -> Self {
        Self { state }
    }

    fn track_handle(&self, store: &Rc<RefCell<TrackStore>>) -> Track {
        Track::new(Rc::downgrade(&self.state), store)
    }

    /// Append a regular track
    pub fn new_track(&self) -> Track {
        let store = Rc::new(RefCell::new(TrackStore::new(TrackProperties::regular(), false)));
        let mut state = self.state.borrow_mut();
        state.tracks.push(Rc::clone(&store));
        debug!(index = state.tracks.len() - 1, "added track");
        drop(state);
        self.track_handle(&store)
    }

    /// Indexed view of the regular tracks
    pub fn tracks(&self) -> TrackCollection {
        TrackCollection {
            sequence: self.clone(),
        }
    }

    /// The tempo track
    pub fn tempo_track(&self) -> Track {
        let tempo = Rc::clone(&self.state.borrow().tempo);
        self.track_handle(&tempo)
    }

    pub fn time_base(&self) -> TimeBase {
        self.state.borrow().time_base
    }

    pub fn set_time_base(&self, time_base: TimeBase) {
        debug!(?time_base, "set time base");
        self.state.borrow_mut().time_base = time_base;
    }

    /// Sample rate used by the samples time base
    pub fn sample_rate(&self) -> f64 {
        self.state.borrow().sample_rate
    }

    pub fn set_sample_rate(&self, sample_rate: f64) -> Result<()> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(Error::InvalidOperation("sample rate must be positive"));
        }
        self.state.borrow_mut().sample_rate = sample_rate;
        Ok(())
    }

    /// Route playback to a MIDI destination; `None` leaves the binding as is
    pub fn bind_midi_destination(&self, endpoint: Option<EndpointRef>) {
        if let Some(endpoint) = endpoint {
            debug!(endpoint = endpoint.index(), "bound midi destination");
            self.state.borrow_mut().destination = Some(endpoint);
        }
    }

    pub fn midi_destination(&self) -> Option<EndpointRef> {
        self.state.borrow().destination
    }

    /// Tempo map from the tempo track's current events
    pub fn tempo_map(&self) -> TempoMap {
        let state = self.state.borrow();
        let tempo = state.tempo.borrow();
        TempoMap::from_events(
            state.time_base,
            state.sample_rate,
            tempo.entries().iter().filter_map(|e| match &e.event {
                RawEvent::Tempo(ev) => Some((e.time, ev.bpm)),
                _ => None,
            }),
        )
    }

    /// Sequence time to seconds
    pub fn to_seconds(&self, time: f64) -> f64 {
        self.tempo_map().to_seconds(time)
    }

    /// Seconds to sequence time
    pub fn from_seconds(&self, seconds: f64) -> f64 {
        self.tempo_map().from_seconds(seconds)
    }

    /// Snapshot of every track, tempo track included
    pub fn to_data(&self) -> SequenceData {
        let state = self.state.borrow();
        let snapshot = |store: &Rc<RefCell<TrackStore>>| {
            let store = store.borrow();
            TrackData {
                properties: store.properties().clone(),
                events: store
                    .entries()
                    .iter()
                    .map(|e| TimedEvent {
                        time: e.time,
                        event: e.event.clone(),
                    })
                    .collect(),
            }
        };
        SequenceData {
            time_base: state.time_base,
            sample_rate: state.sample_rate,
            tempo: snapshot(&state.tempo),
            tracks: state.tracks.iter().map(snapshot).collect(),
        }
    }

    /// Build a sequence from a snapshot
    pub fn from_data(data: &SequenceData) -> Result<Self> {
        let sequence = Self::new();
        sequence.set_time_base(data.time_base);
        sequence.set_sample_rate(data.sample_rate)?;

        let fill = |store: &Rc<RefCell<TrackStore>>, track: &TrackData| -> Result<()> {
            let mut store = store.borrow_mut();
            for event in &track.events {
                store.insert(event.time, event.event.clone())?;
            }
            // Stored properties win over the length the inserts produced
            let resolution = store.properties().time_resolution;
            *store.properties_mut() = track.properties.clone();
            if store.is_tempo() && store.properties().time_resolution.is_none() {
                store.properties_mut().time_resolution = resolution;
            }
            Ok(())
        };

        let tempo = Rc::clone(&sequence.state.borrow().tempo);
        fill(&tempo, &data.tempo)?;
        for track_data in &data.tracks {
            let track = sequence.new_track();
            fill(&track.store()?, track_data)?;
        }
        debug!(tracks = data.tracks.len(), "populated sequence from data");
        Ok(sequence)
    }

    /// Load a sequence from a file through an external loader
    pub fn load(path: &Path, loader: &dyn SmfLoader) -> Result<Self> {
        let data = loader.load(path)?;
        Self::from_data(&data)
    }

    /// Save this sequence through a saver
    pub fn save(&self, path: &Path, saver: &dyn SmfSaver) -> Result<()> {
        saver.save(&self.to_data(), path)
    }

    /// Whether two handles refer to the same sequence
    pub fn ptr_eq(&self, other: &Sequence) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    /// Non-owning handle
    pub fn downgrade(&self) -> WeakSequence {
        WeakSequence {
            state: Rc::downgrade(&self.state),
        }
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Sequence {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Sequence")
            .field("tracks", &state.tracks.len())
            .field("time_base", &state.time_base)
            .field("destination", &state.destination)
            .finish()
    }
}

/// Weak handle to a sequence, as held by a player
#[derive(Debug, Clone, Default)]
pub struct WeakSequence {
    state: Weak<RefCell<SequenceState>>,
}

impl WeakSequence {
    /// Strong handle, if the sequence is still alive
    pub fn upgrade(&self) -> Option<Sequence> {
        self.state.upgrade().map(Sequence::from_state)
    }
}

/// Indexed view of a sequence's regular tracks.
///
/// The tempo track never appears in indices or in `size`.
#[derive(Debug, Clone)]
pub struct TrackCollection {
    sequence: Sequence,
}

impl TrackCollection {
    /// Number of regular tracks
    pub fn size(&self) -> usize {
        self.sequence.state.borrow().tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Index of a track
    pub fn index_of(&self, track: &Track) -> Result<u32> {
        self.sequence
            .state
            .borrow()
            .tracks
            .iter()
            .position(|store| track.is_store(store))
            .map(|i| i as u32)
            .ok_or(Error::TrackNotFound)
    }

    /// Track at an index; `None` when out of range
    pub fn get(&self, index: usize) -> Option<Track> {
        self.try_get(index).ok()
    }

    /// Track at an index, failing with [`Error::RangeError`]
    pub fn try_get(&self, index: usize) -> Result<Track> {
        let store = {
            let state = self.sequence.state.borrow();
            let size = state.tracks.len();
            state
                .tracks
                .get(index)
                .cloned()
                .ok_or(Error::RangeError { index, size })?
        };
        Ok(self.sequence.track_handle(&store))
    }

    pub fn tempo_track(&self) -> Track {
        self.sequence.tempo_track()
    }

    /// Append a regular track
    pub fn new_track(&self) -> Track {
        self.sequence.new_track()
    }

    /// Remove a track; later tracks move down one index
    pub fn delete(&self, track: &Track) -> Result<()> {
        let mut state = self.sequence.state.borrow_mut();
        if track.is_store(&state.tempo) {
            return Err(Error::InvalidOperation("the tempo track cannot be deleted"));
        }
        let index = state
            .tracks
            .iter()
            .position(|store| track.is_store(store))
            .ok_or(Error::TrackNotFound)?;
        state.tracks.remove(index);
        debug!(index, "deleted track");
        Ok(())
    }

    /// Tracks in index order
    pub fn iter(&self) -> impl Iterator<Item = Track> + '_ {
        (0..self.size()).filter_map(move |i| self.get(i))
    }
}
