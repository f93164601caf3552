// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Tracks: ordered, mutable event stores owned by a sequence.
//!
//! Provides the event store itself, the per-track property set
//! (loop, offset, mute/solo, length, resolution) and the [`Track`] handle
//! through which callers reach both.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::{Rc, Weak};

use super::iterator::EventIterator;
use super::{Sequence, SequenceState};
use crate::error::{Error, Result};
use crate::events::{ChannelMessage, Event, NoteMessage, RawEvent, TempoEvent};

/// Default time resolution (ticks per quarter note) of a new tempo track
pub const DEFAULT_TIME_RESOLUTION: i16 = 480;

/// Loop settings for a track
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopInfo {
    /// Length of the looped region from the start of the track
    pub duration: f64,
    /// Number of passes; zero or less loops forever
    pub count: i32,
}

impl LoopInfo {
    /// Create loop settings
    pub fn new(duration: f64, count: i32) -> Self {
        Self { duration, count }
    }

    /// Whether the loop never ends
    pub fn is_infinite(&self) -> bool {
        self.count <= 0
    }
}

/// Track property store.
///
/// A `None` entry means the property has no value, which is distinct from a
/// value of `false` or zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackProperties {
    pub loop_info: Option<LoopInfo>,
    pub offset_time: Option<f64>,
    pub mute: Option<bool>,
    pub solo: Option<bool>,
    pub length: Option<f64>,
    /// Only meaningful on the tempo track
    pub time_resolution: Option<i16>,
}

impl TrackProperties {
    /// Properties of a freshly created regular track
    pub fn regular() -> Self {
        Self {
            loop_info: None,
            offset_time: Some(0.0),
            mute: Some(false),
            solo: Some(false),
            length: Some(0.0),
            time_resolution: None,
        }
    }

    /// Properties of a freshly created tempo track
    pub fn tempo() -> Self {
        Self {
            time_resolution: Some(DEFAULT_TIME_RESOLUTION),
            ..Self::regular()
        }
    }
}

/// A stored event with its ordering key
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Entry {
    pub time: f64,
    /// Insertion ordinal; breaks ties between equal timestamps
    pub ordinal: u64,
    pub event: RawEvent,
}

impl Entry {
    fn cmp_key(&self, time: f64, ordinal: u64) -> Ordering {
        self.time
            .total_cmp(&time)
            .then(self.ordinal.cmp(&ordinal))
    }
}

/// Reject timestamps the store cannot order
pub(crate) fn validate_time(time: f64) -> Result<()> {
    if time.is_finite() && time >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidTimestamp(time))
    }
}

/// Reject note durations that would corrupt length or note-off timing
pub(crate) fn validate_event(event: &RawEvent) -> Result<()> {
    match event {
        RawEvent::Note(note) if !(note.duration.is_finite() && note.duration >= 0.0) => {
            Err(Error::InvalidDuration(note.duration))
        }
        _ => Ok(()),
    }
}

/// Event storage for one track.
///
/// Entries are kept sorted by `(time, ordinal)`. New events take the next
/// ordinal, so they land after every event already at their timestamp;
/// relocated events keep their ordinal.
#[derive(Debug)]
pub(crate) struct TrackStore {
    entries: Vec<Entry>,
    next_ordinal: u64,
    properties: TrackProperties,
    is_tempo: bool,
}

impl TrackStore {
    pub fn new(properties: TrackProperties, is_tempo: bool) -> Self {
        Self {
            entries: Vec::new(),
            next_ordinal: 0,
            properties,
            is_tempo,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    pub fn is_tempo(&self) -> bool {
        self.is_tempo
    }

    pub fn properties(&self) -> &TrackProperties {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut TrackProperties {
        &mut self.properties
    }

    /// Insert an event after all events at the same timestamp
    pub fn insert(&mut self, time: f64, event: RawEvent) -> Result<u64> {
        validate_time(time)?;
        validate_event(&event)?;
        let ordinal = self.next_ordinal;
        self.next_ordinal += 1;

        let end = time + event.duration();
        let index = self.entries.partition_point(|e| e.time <= time);
        self.entries.insert(
            index,
            Entry {
                time,
                ordinal,
                event,
            },
        );
        self.extend_length(end);
        Ok(ordinal)
    }

    /// Exact position of an event key
    pub fn find(&self, time: f64, ordinal: u64) -> Option<usize> {
        self.entries
            .binary_search_by(|e| e.cmp_key(time, ordinal))
            .ok()
    }

    /// Position of an ordinal regardless of time
    pub fn find_ordinal(&self, ordinal: u64) -> Option<usize> {
        self.entries.iter().position(|e| e.ordinal == ordinal)
    }

    /// First position whose key is not less than the given key
    pub fn lower_bound(&self, time: f64, ordinal: u64) -> usize {
        self.entries
            .partition_point(|e| e.cmp_key(time, ordinal) == Ordering::Less)
    }

    /// First position at or after `time`
    pub fn seek_index(&self, time: f64) -> usize {
        self.entries.partition_point(|e| e.time < time)
    }

    /// Move an event to a new timestamp, returning its new position
    pub fn relocate(&mut self, index: usize, time: f64) -> Result<usize> {
        validate_time(time)?;
        let mut entry = self.entries.remove(index);
        entry.time = time;
        let end = time + entry.event.duration();
        let position = self.lower_bound(time, entry.ordinal);
        self.entries.insert(position, entry);
        self.extend_length(end);
        Ok(position)
    }

    /// Overwrite an event's payload in place
    pub fn replace(&mut self, index: usize, event: RawEvent) -> Result<()> {
        validate_event(&event)?;
        let entry = &mut self.entries[index];
        let end = entry.time + event.duration();
        entry.event = event;
        self.extend_length(end);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Entry {
        self.entries.remove(index)
    }

    /// Length only ever grows implicitly
    fn extend_length(&mut self, end: f64) {
        match self.properties.length {
            Some(length) if length >= end => {}
            _ => self.properties.length = Some(end),
        }
    }
}

/// Handle to a track owned by a sequence.
///
/// Handles are cheap to clone and compare by identity. They do not keep the
/// sequence alive: once the sequence is dropped, or the track removed from
/// it, operations return [`Error::StaleHandle`] (or
/// [`Error::IllegalTrackDestination`] when adding events to a removed track).
#[derive(Clone)]
pub struct Track {
    sequence: Weak<RefCell<SequenceState>>,
    store: Weak<RefCell<TrackStore>>,
}

impl Track {
    pub(crate) fn new(
        sequence: Weak<RefCell<SequenceState>>,
        store: &Rc<RefCell<TrackStore>>,
    ) -> Self {
        Self {
            sequence,
            store: Rc::downgrade(store),
        }
    }

    pub(crate) fn is_store(&self, store: &Rc<RefCell<TrackStore>>) -> bool {
        Weak::ptr_eq(&self.store, &Rc::downgrade(store))
    }

    /// Resolve the backing store
    pub(crate) fn store(&self) -> Result<Rc<RefCell<TrackStore>>> {
        if self.sequence.strong_count() == 0 {
            return Err(Error::StaleHandle("sequence"));
        }
        self.store.upgrade().ok_or(Error::StaleHandle("track"))
    }

    /// Resolve the backing store as an insertion target
    fn destination(&self) -> Result<Rc<RefCell<TrackStore>>> {
        if self.sequence.strong_count() == 0 {
            return Err(Error::StaleHandle("sequence"));
        }
        self.store.upgrade().ok_or(Error::IllegalTrackDestination)
    }

    /// Owning sequence
    pub fn sequence(&self) -> Result<Sequence> {
        self.sequence
            .upgrade()
            .map(Sequence::from_state)
            .ok_or(Error::StaleHandle("sequence"))
    }

    /// Add any event at time `at`
    pub fn add(&self, at: f64, event: impl Into<RawEvent>) -> Result<()> {
        let store = self.destination()?;
        let mut store = store.borrow_mut();
        store.insert(at, event.into())?;
        Ok(())
    }

    /// Add a loader-produced event (null, meta or sysex included)
    pub fn add_raw(&self, at: f64, event: RawEvent) -> Result<()> {
        self.add(at, event)
    }

    /// Add a note
    pub fn add_note(&self, at: f64, msg: NoteMessage) -> Result<()> {
        self.add(at, msg)
    }

    /// Add a raw channel message
    pub fn add_channel_message(&self, at: f64, msg: ChannelMessage) -> Result<()> {
        self.add(at, msg)
    }

    /// Add a tempo change; only the tempo track feeds the tempo map
    pub fn add_tempo_event(&self, at: f64, bpm: f64) -> Result<()> {
        self.add(at, TempoEvent::new(bpm))
    }

    /// Number of stored events
    pub fn event_count(&self) -> Result<usize> {
        Ok(self.store()?.borrow().len())
    }

    /// Decoded listing of every event, in order; null events are skipped
    pub fn events(&self) -> Result<Vec<(f64, Event)>> {
        let store = self.store()?;
        let store = store.borrow();
        let mut events = Vec::with_capacity(store.len());
        for entry in store.entries() {
            if let Some(event) = entry.event.decode()? {
                events.push((entry.time, event));
            }
        }
        Ok(events)
    }

    /// Cursor over this track's events, on the first event
    pub fn iterator(&self) -> Result<EventIterator> {
        EventIterator::new(self.clone())
    }

    /// Whether this is the sequence's tempo track
    pub fn is_tempo_track(&self) -> Result<bool> {
        Ok(self.store()?.borrow().is_tempo())
    }

    /// Snapshot of every property
    pub fn properties(&self) -> Result<TrackProperties> {
        Ok(self.store()?.borrow().properties().clone())
    }

    pub fn loop_info(&self) -> Result<Option<LoopInfo>> {
        Ok(self.store()?.borrow().properties().loop_info)
    }

    pub fn set_loop_info(&self, info: LoopInfo) -> Result<()> {
        validate_time(info.duration)?;
        self.store()?.borrow_mut().properties_mut().loop_info = Some(info);
        Ok(())
    }

    pub fn clear_loop_info(&self) -> Result<()> {
        self.store()?.borrow_mut().properties_mut().loop_info = None;
        Ok(())
    }

    pub fn offset_time(&self) -> Result<Option<f64>> {
        Ok(self.store()?.borrow().properties().offset_time)
    }

    pub fn set_offset_time(&self, offset: f64) -> Result<()> {
        if !offset.is_finite() {
            return Err(Error::InvalidTimestamp(offset));
        }
        self.store()?.borrow_mut().properties_mut().offset_time = Some(offset);
        Ok(())
    }

    pub fn mute_status(&self) -> Result<Option<bool>> {
        Ok(self.store()?.borrow().properties().mute)
    }

    pub fn set_mute_status(&self, muted: bool) -> Result<()> {
        self.store()?.borrow_mut().properties_mut().mute = Some(muted);
        Ok(())
    }

    pub fn solo_status(&self) -> Result<Option<bool>> {
        Ok(self.store()?.borrow().properties().solo)
    }

    pub fn set_solo_status(&self, soloed: bool) -> Result<()> {
        self.store()?.borrow_mut().properties_mut().solo = Some(soloed);
        Ok(())
    }

    /// Track length; grows automatically when events end past it
    pub fn length(&self) -> Result<Option<f64>> {
        Ok(self.store()?.borrow().properties().length)
    }

    pub fn set_length(&self, length: f64) -> Result<()> {
        validate_time(length)?;
        self.store()?.borrow_mut().properties_mut().length = Some(length);
        Ok(())
    }

    /// Ticks per quarter note; tempo track only
    pub fn time_resolution(&self) -> Result<Option<i16>> {
        let store = self.store()?;
        let store = store.borrow();
        if !store.is_tempo() {
            return Err(Error::InvalidOperation(
                "time resolution is only defined on the tempo track",
            ));
        }
        Ok(store.properties().time_resolution)
    }

    pub fn set_time_resolution(&self, resolution: i16) -> Result<()> {
        let store = self.store()?;
        let mut store = store.borrow_mut();
        if !store.is_tempo() {
            return Err(Error::InvalidOperation(
                "time resolution is only defined on the tempo track",
            ));
        }
        if resolution <= 0 {
            return Err(Error::InvalidOperation("time resolution must be positive"));
        }
        store.properties_mut().time_resolution = Some(resolution);
        Ok(())
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        Weak::ptr_eq(&self.store, &other.store)
    }
}

impl Eq for Track {}

impl fmt::Debug for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.store.upgrade() {
            Some(store) => {
                let store = store.borrow();
                f.debug_struct("Track")
                    .field("tempo", &store.is_tempo())
                    .field("events", &store.len())
                    .finish()
            }
            None => f.write_str("Track(<released>)"),
        }
    }
}
