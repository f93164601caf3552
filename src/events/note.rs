// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Note messages.

use super::options::{byte_or, number_or, required_byte, NoteOptions};
use crate::error::Result;
use crate::midi::messages;

/// A note with its own duration, stored as a single track event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteMessage {
    /// MIDI channel
    pub channel: u8,
    /// MIDI note number
    pub note: u8,
    /// Note-on velocity
    pub velocity: u8,
    /// Note-off velocity
    pub release_velocity: u8,
    /// Duration in sequence time units
    pub duration: f64,
}

impl NoteMessage {
    pub const DEFAULT_CHANNEL: u8 = 1;
    pub const DEFAULT_VELOCITY: u8 = 64;
    pub const DEFAULT_RELEASE_VELOCITY: u8 = 0;
    pub const DEFAULT_DURATION: f64 = 1.0;

    /// Create a note with default channel, velocities and duration
    pub fn new(note: u8) -> Self {
        Self {
            channel: Self::DEFAULT_CHANNEL,
            note,
            velocity: Self::DEFAULT_VELOCITY,
            release_velocity: Self::DEFAULT_RELEASE_VELOCITY,
            duration: Self::DEFAULT_DURATION,
        }
    }

    /// Build a note from dynamic options.
    ///
    /// `note` is required; every other field falls back to its default when
    /// absent or not numeric.
    pub fn create(opts: &NoteOptions) -> Result<Self> {
        let note = required_byte("note", opts.note.as_ref())?;
        let duration = number_or(opts.duration.as_ref(), Self::DEFAULT_DURATION);
        Ok(Self {
            channel: byte_or(opts.channel.as_ref(), Self::DEFAULT_CHANNEL),
            note,
            velocity: byte_or(opts.velocity.as_ref(), Self::DEFAULT_VELOCITY),
            release_velocity: byte_or(
                opts.release_velocity.as_ref(),
                Self::DEFAULT_RELEASE_VELOCITY,
            ),
            duration: duration.max(0.0),
        })
    }

    /// Set channel
    pub fn with_channel(mut self, channel: u8) -> Self {
        self.channel = channel;
        self
    }

    /// Set velocity
    pub fn with_velocity(mut self, velocity: u8) -> Self {
        self.velocity = velocity;
        self
    }

    /// Set release velocity
    pub fn with_release_velocity(mut self, release_velocity: u8) -> Self {
        self.release_velocity = release_velocity;
        self
    }

    /// Set duration (negative durations become zero)
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        self
    }

    /// Note On bytes
    pub fn note_on_bytes(&self) -> [u8; 3] {
        [
            messages::NOTE_ON | (self.channel & 0x0F),
            self.note & 0x7F,
            self.velocity & 0x7F,
        ]
    }

    /// Note Off bytes
    pub fn note_off_bytes(&self) -> [u8; 3] {
        [
            messages::NOTE_OFF | (self.channel & 0x0F),
            self.note & 0x7F,
            self.release_velocity & 0x7F,
        ]
    }
}
