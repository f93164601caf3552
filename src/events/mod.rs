// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Event types stored in tracks.
//!
//! This module provides:
//! - Note, channel and tempo messages with validated constructors
//! - The public [`Event`] union returned by iterators
//! - [`RawEvent`], the stored form, which also carries loader-produced
//!   events (null, meta, sysex) that the public union cannot express

pub mod channel;
pub mod note;
pub mod options;
pub mod tempo;

pub use channel::{ChannelMessage, ChannelMessageKind};
pub use note::NoteMessage;
pub use options::{ChannelOptions, FieldValue, NoteOptions, TempoOptions};
pub use tempo::TempoEvent;

use crate::error::{Error, Result};

/// A decoded track event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    Note(NoteMessage),
    Channel(ChannelMessageKind),
    Tempo(TempoEvent),
}

impl Event {
    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Event::Note(_) => "note",
            Event::Channel(kind) => kind.name(),
            Event::Tempo(_) => "tempo",
        }
    }
}

impl From<NoteMessage> for Event {
    fn from(msg: NoteMessage) -> Self {
        Event::Note(msg)
    }
}

impl From<ChannelMessageKind> for Event {
    fn from(kind: ChannelMessageKind) -> Self {
        Event::Channel(kind)
    }
}

impl From<TempoEvent> for Event {
    fn from(ev: TempoEvent) -> Self {
        Event::Tempo(ev)
    }
}

impl TryFrom<ChannelMessage> for Event {
    type Error = Error;

    fn try_from(msg: ChannelMessage) -> Result<Self> {
        Ok(Event::Channel(msg.kind()?))
    }
}

/// Stored event payload
#[derive(Debug, Clone, PartialEq)]
pub enum RawEvent {
    /// Placeholder with no content
    Null,
    Note(NoteMessage),
    Channel(ChannelMessage),
    Tempo(TempoEvent),
    /// Meta event (type byte and payload)
    Meta { kind: u8, data: Vec<u8> },
    /// System exclusive payload, without the framing bytes
    Sysex(Vec<u8>),
}

impl RawEvent {
    /// Decode into the public event union.
    ///
    /// Null events decode to `None`; meta and sysex events have no public
    /// representation.
    pub fn decode(&self) -> Result<Option<Event>> {
        match self {
            RawEvent::Null => Ok(None),
            RawEvent::Note(msg) => Ok(Some(Event::Note(*msg))),
            RawEvent::Channel(msg) => Ok(Some(Event::Channel(msg.kind()?))),
            RawEvent::Tempo(ev) => Ok(Some(Event::Tempo(*ev))),
            RawEvent::Meta { .. } => Err(Error::UnsupportedEventType("meta")),
            RawEvent::Sysex(_) => Err(Error::UnsupportedEventType("sysex")),
        }
    }

    /// Time the event occupies after its timestamp
    pub fn duration(&self) -> f64 {
        match self {
            RawEvent::Note(msg) => msg.duration,
            _ => 0.0,
        }
    }
}

impl From<Event> for RawEvent {
    fn from(ev: Event) -> Self {
        match ev {
            Event::Note(msg) => RawEvent::Note(msg),
            Event::Channel(kind) => RawEvent::Channel(kind.to_raw()),
            Event::Tempo(tempo) => RawEvent::Tempo(tempo),
        }
    }
}

impl From<NoteMessage> for RawEvent {
    fn from(msg: NoteMessage) -> Self {
        RawEvent::Note(msg)
    }
}

impl From<ChannelMessage> for RawEvent {
    fn from(msg: ChannelMessage) -> Self {
        RawEvent::Channel(msg)
    }
}

impl From<TempoEvent> for RawEvent {
    fn from(ev: TempoEvent) -> Self {
        RawEvent::Tempo(ev)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_null_is_absent() {
        assert_eq!(RawEvent::Null.decode().unwrap(), None);
    }

    #[test]
    fn test_decode_unsupported() {
        let meta = RawEvent::Meta {
            kind: 0x03,
            data: b"Piano".to_vec(),
        };
        assert!(matches!(meta.decode(), Err(Error::UnsupportedEventType("meta"))));
        assert!(matches!(
            RawEvent::Sysex(vec![0x7E]).decode(),
            Err(Error::UnsupportedEventType("sysex"))
        ));
    }

    #[test]
    fn test_decode_channel() {
        let raw = RawEvent::Channel(ChannelMessage::program_change(0, 1));
        assert_eq!(
            raw.decode().unwrap(),
            Some(Event::Channel(ChannelMessageKind::ProgramChange {
                channel: 0,
                program: 1
            }))
        );
        assert!(RawEvent::Channel(ChannelMessage::new(42, 0, 0)).decode().is_err());
    }

    #[test]
    fn test_event_to_raw() {
        let ev = Event::Channel(ChannelMessageKind::ControlChange {
            channel: 1,
            number: 2,
            value: 3,
        });
        assert_eq!(
            RawEvent::from(ev),
            RawEvent::Channel(ChannelMessage::new(0xB1, 2, 3))
        );
        assert_eq!(RawEvent::from(NoteMessage::new(60).with_duration(0.5)).duration(), 0.5);
        assert_eq!(RawEvent::from(TempoEvent::new(90.0)).duration(), 0.0);
    }
}
