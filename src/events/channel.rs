// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Channel voice messages.
//!
//! Tracks store channel messages as raw status/data bytes. The typed view
//! ([`ChannelMessageKind`]) is derived from the status nibble when an event
//! is read back out.

use super::options::{byte_or, required_byte, ChannelOptions};
use crate::error::{Error, Result};
use crate::midi::messages;

/// Raw channel message as stored in a track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelMessage {
    /// Status byte (message type in the high nibble, channel in the low)
    pub status: u8,
    /// First data byte
    pub data1: u8,
    /// Second data byte
    pub data2: u8,
}

impl ChannelMessage {
    /// Create a raw channel message
    pub fn new(status: u8, data1: u8, data2: u8) -> Self {
        Self {
            status,
            data1,
            data2,
        }
    }

    /// Build a message from dynamic options; `status` is required
    pub fn create(opts: &ChannelOptions) -> Result<Self> {
        let status = required_byte("status", opts.status.as_ref())?;
        Ok(Self {
            status,
            data1: byte_or(opts.data1.as_ref(), 0),
            data2: byte_or(opts.data2.as_ref(), 0),
        })
    }

    /// Polyphonic key pressure
    pub fn key_pressure(channel: u8, note: u8, pressure: u8) -> Self {
        Self::new(messages::POLY_AFTERTOUCH | (channel & 0x0F), note, pressure)
    }

    /// Control change
    pub fn control_change(channel: u8, number: u8, value: u8) -> Self {
        Self::new(messages::CONTROL_CHANGE | (channel & 0x0F), number, value)
    }

    /// Program change
    pub fn program_change(channel: u8, program: u8) -> Self {
        Self::new(messages::PROGRAM_CHANGE | (channel & 0x0F), program, 0)
    }

    /// Channel pressure
    pub fn channel_pressure(channel: u8, pressure: u8) -> Self {
        Self::new(messages::CHANNEL_AFTERTOUCH | (channel & 0x0F), pressure, 0)
    }

    /// Pitch bend (single data byte, as the binding has always stored it)
    pub fn pitch_bend(channel: u8, value: u8) -> Self {
        Self::new(messages::PITCH_BEND | (channel & 0x0F), value, 0)
    }

    /// Channel encoded in the status byte
    pub fn channel(&self) -> u8 {
        self.status & 0x0F
    }

    /// Decode into the typed view
    pub fn kind(&self) -> Result<ChannelMessageKind> {
        ChannelMessageKind::from_raw(self)
    }

    /// Raw MIDI bytes; program change and channel pressure carry one data byte
    pub fn to_midi_bytes(&self) -> Vec<u8> {
        match self.status & 0xF0 {
            messages::PROGRAM_CHANGE | messages::CHANNEL_AFTERTOUCH => {
                vec![self.status, self.data1 & 0x7F]
            }
            _ => vec![self.status, self.data1 & 0x7F, self.data2 & 0x7F],
        }
    }
}

/// Typed view of a channel message, selected by the status nibble
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMessageKind {
    KeyPressure { channel: u8, note: u8, pressure: u8 },
    ControlChange { channel: u8, number: u8, value: u8 },
    ProgramChange { channel: u8, program: u8 },
    ChannelPressure { channel: u8, pressure: u8 },
    PitchBend { channel: u8, value: u8 },
}

impl ChannelMessageKind {
    /// Decode a raw message by its status nibble
    pub fn from_raw(msg: &ChannelMessage) -> Result<Self> {
        let channel = msg.status & 0x0F;
        match msg.status & 0xF0 {
            messages::POLY_AFTERTOUCH => Ok(Self::KeyPressure {
                channel,
                note: msg.data1,
                pressure: msg.data2,
            }),
            messages::CONTROL_CHANGE => Ok(Self::ControlChange {
                channel,
                number: msg.data1,
                value: msg.data2,
            }),
            messages::PROGRAM_CHANGE => Ok(Self::ProgramChange {
                channel,
                program: msg.data1,
            }),
            messages::CHANNEL_AFTERTOUCH => Ok(Self::ChannelPressure {
                channel,
                pressure: msg.data1,
            }),
            messages::PITCH_BEND => Ok(Self::PitchBend {
                channel,
                value: msg.data1,
            }),
            _ => Err(Error::UnrecognizedMessageType(msg.status)),
        }
    }

    /// Encode back into a raw message
    pub fn to_raw(&self) -> ChannelMessage {
        match *self {
            Self::KeyPressure {
                channel,
                note,
                pressure,
            } => ChannelMessage::key_pressure(channel, note, pressure),
            Self::ControlChange {
                channel,
                number,
                value,
            } => ChannelMessage::control_change(channel, number, value),
            Self::ProgramChange { channel, program } => {
                ChannelMessage::program_change(channel, program)
            }
            Self::ChannelPressure { channel, pressure } => {
                ChannelMessage::channel_pressure(channel, pressure)
            }
            Self::PitchBend { channel, value } => ChannelMessage::pitch_bend(channel, value),
        }
    }

    /// MIDI channel
    pub fn channel(&self) -> u8 {
        match *self {
            Self::KeyPressure { channel, .. }
            | Self::ControlChange { channel, .. }
            | Self::ProgramChange { channel, .. }
            | Self::ChannelPressure { channel, .. }
            | Self::PitchBend { channel, .. } => channel,
        }
    }

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::KeyPressure { .. } => "key pressure",
            Self::ControlChange { .. } => "control change",
            Self::ProgramChange { .. } => "program change",
            Self::ChannelPressure { .. } => "channel pressure",
            Self::PitchBend { .. } => "pitch bend",
        }
    }
}

impl TryFrom<ChannelMessage> for ChannelMessageKind {
    type Error = Error;

    fn try_from(msg: ChannelMessage) -> Result<Self> {
        Self::from_raw(&msg)
    }
}

impl From<ChannelMessageKind> for ChannelMessage {
    fn from(kind: ChannelMessageKind) -> Self {
        kind.to_raw()
    }
}
