// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Error type shared by the sequence engine and the player.

use thiserror::Error;

/// Errors raised by sequence, track, iterator and player operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A required field was not supplied to an event constructor
    #[error("{0} is required")]
    MissingField(&'static str),

    /// A field was supplied with a value of the wrong kind
    #[error("{field} must be numeric, got {found}")]
    TypeError { field: &'static str, found: String },

    /// Track index outside the collection
    #[error("track index {index} out of range (size {size})")]
    RangeError { index: usize, size: usize },

    /// Track does not belong to this sequence
    #[error("track not found in sequence")]
    TrackNotFound,

    /// No current event, or no event after the cursor
    #[error("end of track")]
    EndOfTrack,

    /// No event before the cursor
    #[error("start of track")]
    StartOfTrack,

    /// Player has no sequence bound
    #[error("player has no sequence")]
    NoSequence,

    /// Track can no longer receive events
    #[error("illegal track destination")]
    IllegalTrackDestination,

    /// Stored event has a kind the event model cannot express
    #[error("unsupported event type: {0}")]
    UnsupportedEventType(&'static str),

    /// Channel message status nibble outside 0xA..=0xE
    #[error("unrecognized channel message type: status 0x{0:02X}")]
    UnrecognizedMessageType(u8),

    /// Operation not valid for this object
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),

    /// Underlying transport or output reported a failure
    #[error("transport failure: {0}")]
    TransportFailure(String),

    /// Handle outlived the sequence (or track) it refers to
    #[error("stale handle: {0} has been released")]
    StaleHandle(&'static str),

    /// Timestamp is negative or not finite
    #[error("invalid timestamp {0}")]
    InvalidTimestamp(f64),

    /// Note duration is negative or not finite
    #[error("invalid note duration {0}")]
    InvalidDuration(f64),

    /// Play rate must be positive and finite
    #[error("invalid play rate {0}")]
    InvalidPlayRate(f64),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
