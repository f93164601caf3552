// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! MIDI sequence engine and music player.
//!
//! - [`sequence`]: sequences, tracks, event iterators and the tempo map
//! - [`events`]: note, channel and tempo events
//! - [`player`]: transport bound to a sequence, with cooperative dispatch
//! - [`midi`]: output backends and destination registries
//! - [`smf`]: Standard MIDI File hooks and writer
//! - [`config`]: YAML song files and TOML player settings

pub mod config;
pub mod error;
pub mod events;
pub mod midi;
pub mod player;
pub mod sequence;
pub mod smf;

pub use error::{Error, Result};
pub use events::{
    ChannelMessage, ChannelMessageKind, ChannelOptions, Event, FieldValue, NoteMessage,
    NoteOptions, RawEvent, TempoEvent, TempoOptions,
};
pub use midi::{DestinationRegistry, EndpointRef, MemoryOutput, MidiOutput};
pub use player::{Player, PlayerState};
pub use sequence::{
    EventIterator, LoopInfo, Sequence, SequenceData, TempoMap, TimeBase, TimedEvent, Track,
    TrackCollection, TrackData, TrackProperties, WeakSequence,
};
pub use smf::{SmfLoader, SmfSaver, SmfWriter};
