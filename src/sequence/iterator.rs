// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Event iterator: a cursor over one track's events.
//!
//! The cursor remembers *which* event it is on (timestamp and insertion
//! ordinal), not an index. Insertions elsewhere in the track and
//! relocation through [`EventIterator::set_time`] therefore never move it
//! onto a different event. If its event is removed through another handle,
//! the cursor lands on the event that followed it.
//!
//! A fresh iterator sits on the first event. Positions are "at event i" or
//! "after last"; stepping back from the first event fails with
//! [`Error::StartOfTrack`], stepping past "after last" with
//! [`Error::EndOfTrack`].

use super::track::{Track, TrackStore};
use crate::error::{Error, Result};
use crate::events::{Event, RawEvent};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Cursor {
    At { time: f64, ordinal: u64 },
    AfterLast,
}

impl Cursor {
    fn at(store: &TrackStore, index: usize) -> Self {
        match store.entry(index) {
            Some(entry) => Cursor::At {
                time: entry.time,
                ordinal: entry.ordinal,
            },
            None => Cursor::AfterLast,
        }
    }
}

/// Cursor over a single track
#[derive(Debug, Clone)]
pub struct EventIterator {
    track: Track,
    cursor: Cursor,
}

impl EventIterator {
    /// Create an iterator positioned on the track's first event
    pub fn new(track: Track) -> Result<Self> {
        let store = track.store()?;
        let cursor = Cursor::at(&store.borrow(), 0);
        Ok(Self { track, cursor })
    }

    /// Track being iterated
    pub fn track(&self) -> &Track {
        &self.track
    }

    /// Resolve the cursor to an index, normalising it if its event moved
    /// or disappeared. `None` means after-last.
    fn locate(&mut self, store: &TrackStore) -> Option<usize> {
        let (time, ordinal) = match self.cursor {
            Cursor::At { time, ordinal } => (time, ordinal),
            Cursor::AfterLast => return None,
        };

        if let Some(index) = store.find(time, ordinal) {
            return Some(index);
        }
        if let Some(index) = store.find_ordinal(ordinal) {
            self.cursor = Cursor::at(store, index);
            return Some(index);
        }

        // Event was removed elsewhere; its successor becomes current
        let index = store.lower_bound(time, ordinal);
        self.cursor = Cursor::at(store, index);
        match self.cursor {
            Cursor::At { .. } => Some(index),
            Cursor::AfterLast => None,
        }
    }

    /// Move to the first event at or after `time`, or after-last
    pub fn seek(&mut self, time: f64) -> Result<()> {
        let store = self.track.store()?;
        let store = store.borrow();
        self.cursor = Cursor::at(&store, store.seek_index(time));
        Ok(())
    }

    /// Advance one event
    pub fn next(&mut self) -> Result<()> {
        let store = self.track.store()?;
        let store = store.borrow();
        let index = self.locate(&store).ok_or(Error::EndOfTrack)?;
        self.cursor = Cursor::at(&store, index + 1);
        Ok(())
    }

    /// Step back one event
    pub fn prev(&mut self) -> Result<()> {
        let store = self.track.store()?;
        let store = store.borrow();
        let index = match self.locate(&store) {
            Some(0) => return Err(Error::StartOfTrack),
            Some(index) => index - 1,
            None if store.len() == 0 => return Err(Error::StartOfTrack),
            None => store.len() - 1,
        };
        self.cursor = Cursor::at(&store, index);
        Ok(())
    }

    /// Whether the cursor is on an event
    pub fn has_current(&mut self) -> bool {
        let Ok(store) = self.track.store() else {
            return false;
        };
        let store = store.borrow();
        self.locate(&store).is_some()
    }

    /// Whether an event follows the current one
    pub fn has_next(&mut self) -> bool {
        let Ok(store) = self.track.store() else {
            return false;
        };
        let store = store.borrow();
        matches!(self.locate(&store), Some(index) if index + 1 < store.len())
    }

    /// Whether an event precedes the cursor
    pub fn has_previous(&mut self) -> bool {
        let Ok(store) = self.track.store() else {
            return false;
        };
        let store = store.borrow();
        match self.locate(&store) {
            Some(index) => index > 0,
            None => store.len() > 0,
        }
    }

    /// Timestamp of the current event
    pub fn time(&mut self) -> Result<f64> {
        let store = self.track.store()?;
        let store = store.borrow();
        let index = self.locate(&store).ok_or(Error::EndOfTrack)?;
        Ok(store.entries()[index].time)
    }

    /// Move the current event to a new timestamp; the cursor follows it
    pub fn set_time(&mut self, time: f64) -> Result<()> {
        let store = self.track.store()?;
        let mut store = store.borrow_mut();
        let index = self.locate(&store).ok_or(Error::EndOfTrack)?;
        let position = store.relocate(index, time)?;
        self.cursor = Cursor::at(&store, position);
        Ok(())
    }

    /// Decoded current event; `None` for a null event
    pub fn event(&mut self) -> Result<Option<Event>> {
        let store = self.track.store()?;
        let store = store.borrow();
        let index = self.locate(&store).ok_or(Error::EndOfTrack)?;
        store.entries()[index].event.decode()
    }

    /// Current event as stored, without decoding
    pub fn raw_event(&mut self) -> Result<RawEvent> {
        let store = self.track.store()?;
        let store = store.borrow();
        let index = self.locate(&store).ok_or(Error::EndOfTrack)?;
        Ok(store.entries()[index].event.clone())
    }

    /// Overwrite the current event's payload; its type may change
    pub fn set_event(&mut self, event: impl Into<RawEvent>) -> Result<()> {
        let store = self.track.store()?;
        let mut store = store.borrow_mut();
        let index = self.locate(&store).ok_or(Error::EndOfTrack)?;
        store.replace(index, event.into())
    }

    /// Remove the current event; the following event becomes current
    pub fn delete(&mut self) -> Result<()> {
        let store = self.track.store()?;
        let mut store = store.borrow_mut();
        let index = self.locate(&store).ok_or(Error::EndOfTrack)?;
        store.remove(index);
        self.cursor = Cursor::at(&store, index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ChannelMessage, ChannelMessageKind, NoteMessage, TempoEvent};
    use crate::sequence::Sequence;

    fn two_note_track() -> (Sequence, Track, Event, Event) {
        let sequence = Sequence::new();
        let track = sequence.new_track();
        let ev1 = NoteMessage::new(60);
        let ev2 = NoteMessage::new(67);
        track.add_note(0.0, ev1).unwrap();
        track.add_note(1.0, ev2).unwrap();
        (sequence, track, Event::Note(ev1), Event::Note(ev2))
    }

    #[test]
    fn test_seek() {
        let (_seq, track, ev1, ev2) = two_note_track();
        let mut iter = track.iterator().unwrap();

        iter.seek(0.0).unwrap();
        assert_eq!(iter.event().unwrap(), Some(ev1));

        // Between onsets the cursor advances to the next onset
        iter.seek(0.1).unwrap();
        assert_eq!(iter.event().unwrap(), Some(ev2));

        iter.seek(100.0).unwrap();
        assert!(!iter.has_current());

        iter.seek(-5.0).unwrap();
        assert_eq!(iter.event().unwrap(), Some(ev1));
    }

    #[test]
    fn test_has_current() {
        let (_seq, track, _, _) = two_note_track();
        let mut iter = track.iterator().unwrap();
        assert!(iter.has_current());
        iter.next().unwrap();
        assert!(iter.has_current());
        iter.next().unwrap();
        assert!(!iter.has_current());
    }

    #[test]
    fn test_next() {
        let (_seq, track, _, _) = two_note_track();
        let mut iter = track.iterator().unwrap();
        iter.next().unwrap();
        iter.next().unwrap();
        assert!(matches!(iter.next(), Err(Error::EndOfTrack)));
    }

    #[test]
    fn test_has_next() {
        let (_seq, track, _, _) = two_note_track();
        let mut iter = track.iterator().unwrap();
        assert!(iter.has_next());
        iter.next().unwrap();
        assert!(!iter.has_next());
        // One step beyond the last event is allowed
        iter.next().unwrap();
        assert!(matches!(iter.next(), Err(Error::EndOfTrack)));
    }

    #[test]
    fn test_prev() {
        let (_seq, track, _, _) = two_note_track();
        let mut iter = track.iterator().unwrap();
        iter.next().unwrap();
        iter.prev().unwrap();
        assert!(matches!(iter.prev(), Err(Error::StartOfTrack)));
    }

    #[test]
    fn test_has_previous() {
        let (_seq, track, _, _) = two_note_track();
        let mut iter = track.iterator().unwrap();
        assert!(!iter.has_previous());
        iter.next().unwrap();
        assert!(iter.has_previous());
        iter.next().unwrap();
        assert!(iter.has_previous());
        iter.prev().unwrap();
        assert_eq!(iter.time().unwrap(), 1.0);
    }

    #[test]
    fn test_empty_track_boundaries() {
        let sequence = Sequence::new();
        let track = sequence.new_track();
        let mut iter = track.iterator().unwrap();
        assert!(!iter.has_current());
        assert!(!iter.has_previous());
        assert!(matches!(iter.next(), Err(Error::EndOfTrack)));
        assert!(matches!(iter.prev(), Err(Error::StartOfTrack)));
        assert!(matches!(iter.time(), Err(Error::EndOfTrack)));
        assert!(matches!(iter.delete(), Err(Error::EndOfTrack)));
    }

    #[test]
    fn test_time() {
        let (_seq, track, _, _) = two_note_track();
        let mut iter = track.iterator().unwrap();
        assert_eq!(iter.time().unwrap(), 0.0);
        iter.next().unwrap();
        assert_eq!(iter.time().unwrap(), 1.0);
        iter.next().unwrap();
        assert!(matches!(iter.time(), Err(Error::EndOfTrack)));
        iter.seek(0.0).unwrap();
        assert_eq!(iter.time().unwrap(), 0.0);
    }

    #[test]
    fn test_set_time_swaps_onsets() {
        let (_seq, track, ev1, ev2) = two_note_track();
        let mut iter = track.iterator().unwrap();

        assert_eq!(iter.time().unwrap(), 0.0);
        iter.set_time(1.0).unwrap();
        assert_eq!(iter.time().unwrap(), 1.0);
        iter.next().unwrap();
        assert_eq!(iter.time().unwrap(), 1.0);
        iter.set_time(0.0).unwrap();

        iter.seek(0.0).unwrap();
        assert_eq!(iter.event().unwrap(), Some(ev2));
        iter.next().unwrap();
        assert_eq!(iter.event().unwrap(), Some(ev1));
    }

    #[test]
    fn test_set_time_rejects_negative() {
        let (_seq, track, _, _) = two_note_track();
        let mut iter = track.iterator().unwrap();
        assert!(matches!(iter.set_time(-1.0), Err(Error::InvalidTimestamp(_))));
        assert_eq!(iter.time().unwrap(), 0.0);
        assert_eq!(track.event_count().unwrap(), 2);
    }

    #[test]
    fn test_event_channel_kinds() {
        let sequence = Sequence::new();
        let track = sequence.new_track();
        let messages = [
            ChannelMessage::key_pressure(1, 60, 64),
            ChannelMessage::control_change(1, 1, 127),
            ChannelMessage::program_change(1, 42),
            ChannelMessage::channel_pressure(1, 37),
            ChannelMessage::pitch_bend(1, 84),
        ];
        for msg in messages {
            track.add_channel_message(0.0, msg).unwrap();
        }

        let mut iter = track.iterator().unwrap();
        for msg in messages {
            assert_eq!(iter.event().unwrap(), Some(Event::Channel(msg.kind().unwrap())));
            iter.next().unwrap();
        }
        assert!(!iter.has_current());
    }

    #[test]
    fn test_event_tempo() {
        let sequence = Sequence::new();
        let tempo = sequence.tempo_track();
        tempo.add_tempo_event(0.0, 120.0).unwrap();
        let mut iter = tempo.iterator().unwrap();
        assert_eq!(iter.event().unwrap(), Some(Event::Tempo(TempoEvent::new(120.0))));
    }

    #[test]
    fn test_event_unrecognized_status() {
        let sequence = Sequence::new();
        let track = sequence.new_track();
        track.add_channel_message(0.0, ChannelMessage::new(42, 0, 0)).unwrap();
        let mut iter = track.iterator().unwrap();
        assert!(matches!(iter.event(), Err(Error::UnrecognizedMessageType(42))));
        assert_eq!(
            iter.raw_event().unwrap(),
            RawEvent::Channel(ChannelMessage::new(42, 0, 0))
        );
    }

    #[test]
    fn test_event_null_and_meta() {
        let sequence = Sequence::new();
        let track = sequence.new_track();
        track.add(0.0, RawEvent::Null).unwrap();
        track
            .add(
                1.0,
                RawEvent::Meta {
                    kind: 0x03,
                    data: b"Lead".to_vec(),
                },
            )
            .unwrap();

        let mut iter = track.iterator().unwrap();
        assert_eq!(iter.event().unwrap(), None);
        iter.next().unwrap();
        assert!(matches!(iter.event(), Err(Error::UnsupportedEventType("meta"))));
    }

    #[test]
    fn test_set_event() {
        let (sequence, track, ev1, ev2) = two_note_track();
        let mut iter = track.iterator().unwrap();

        // Swap the notes
        iter.set_event(ev2).unwrap();
        iter.next().unwrap();
        iter.set_event(ev1).unwrap();

        iter.seek(0.0).unwrap();
        assert_eq!(iter.event().unwrap(), Some(ev2));
        iter.next().unwrap();
        assert_eq!(iter.event().unwrap(), Some(ev1));

        // Event types may change
        iter.seek(0.0).unwrap();
        let cc = Event::Channel(ChannelMessageKind::ControlChange {
            channel: 1,
            number: 2,
            value: 3,
        });
        iter.set_event(cc).unwrap();
        assert_eq!(iter.event().unwrap(), Some(cc));

        // No current event
        while iter.has_current() {
            iter.next().unwrap();
        }
        assert!(matches!(
            iter.set_event(NoteMessage::new(60)),
            Err(Error::EndOfTrack)
        ));

        // Tempo tracks are iterable too
        let tempo = sequence.tempo_track();
        tempo.add_tempo_event(0.0, 120.0).unwrap();
        let mut iter = tempo.iterator().unwrap();
        iter.set_event(TempoEvent::new(60.0)).unwrap();
        assert_eq!(iter.event().unwrap(), Some(Event::Tempo(TempoEvent::new(60.0))));
    }

    #[test]
    fn test_set_event_rejects_bad_duration() {
        let (_seq, track, ev1, _) = two_note_track();
        let mut iter = track.iterator().unwrap();
        let bad = NoteMessage {
            duration: -1.0,
            ..NoteMessage::new(72)
        };
        assert!(matches!(iter.set_event(bad), Err(Error::InvalidDuration(_))));
        assert_eq!(iter.event().unwrap(), Some(ev1));
    }

    #[test]
    fn test_set_event_extends_length() {
        let (_seq, track, _, _) = two_note_track();
        let mut iter = track.iterator().unwrap();
        iter.next().unwrap();
        iter.set_event(NoteMessage::new(72).with_duration(4.0)).unwrap();
        assert_eq!(track.length().unwrap(), Some(5.0));
    }

    #[test]
    fn test_delete() {
        let (_seq, track, ev1, ev2) = two_note_track();
        let mut iter = track.iterator().unwrap();

        assert_eq!(iter.event().unwrap(), Some(ev1));
        iter.delete().unwrap();
        assert_eq!(track.event_count().unwrap(), 1);
        assert_eq!(iter.event().unwrap(), Some(ev2));
        iter.delete().unwrap();
        assert_eq!(track.event_count().unwrap(), 0);

        assert!(!iter.has_current());
        assert!(matches!(iter.delete(), Err(Error::EndOfTrack)));
    }

    #[test]
    fn test_cursor_survives_insertions() {
        let (_seq, track, _, ev2) = two_note_track();
        let mut iter = track.iterator().unwrap();
        iter.next().unwrap();

        track.add_note(0.5, NoteMessage::new(62)).unwrap();
        track.add_note(0.0, NoteMessage::new(48)).unwrap();
        assert_eq!(iter.event().unwrap(), Some(ev2));
    }

    #[test]
    fn test_cursor_after_external_delete() {
        let (_seq, track, _, ev2) = two_note_track();
        let mut first = track.iterator().unwrap();
        let mut second = track.iterator().unwrap();

        second.delete().unwrap();
        assert_eq!(first.event().unwrap(), Some(ev2));
    }

    #[test]
    fn test_cursor_after_external_relocation() {
        let (_seq, track, ev1, _) = two_note_track();
        let mut first = track.iterator().unwrap();
        let mut second = track.iterator().unwrap();

        second.set_time(3.0).unwrap();
        assert_eq!(first.event().unwrap(), Some(ev1));
        assert_eq!(first.time().unwrap(), 3.0);
        assert!(!first.has_next());
    }

    #[test]
    fn test_stale_iterator() {
        let (sequence, track, _, _) = two_note_track();
        let mut iter = track.iterator().unwrap();
        drop(track);
        drop(sequence);

        assert!(!iter.has_current());
        assert!(matches!(iter.next(), Err(Error::StaleHandle(_))));
    }
}
