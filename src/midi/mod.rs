// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! MIDI output abstraction layer.
//!
//! This module provides a trait-based abstraction for MIDI output and for
//! enumerating system destinations, allowing different backends (Core MIDI,
//! midir, in-memory) to be used interchangeably.

#[cfg(target_os = "macos")]
pub mod coremidi_backend;
pub mod memory;
#[cfg(feature = "midir-backend")]
pub mod midir_backend;

use std::fmt;

use anyhow::{anyhow, Result};

pub use memory::MemoryOutput;

/// Trait for MIDI output implementations.
///
/// This trait abstracts over different MIDI backends, providing a unified
/// interface for sending MIDI messages with optional timestamps.
pub trait MidiOutput: Send {
    /// Send a MIDI message immediately.
    ///
    /// # Arguments
    /// * `message` - Raw MIDI bytes (e.g., `[0x90, 60, 127]` for Note On)
    fn send(&mut self, message: &[u8]) -> Result<()>;

    /// Send a MIDI message at a specific timestamp.
    ///
    /// # Arguments
    /// * `message` - Raw MIDI bytes
    /// * `timestamp` - Timestamp in microseconds (host time)
    fn send_at(&mut self, message: &[u8], timestamp: u64) -> Result<()>;
}

/// Opaque reference to a system MIDI destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EndpointRef(u32);

impl EndpointRef {
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    /// Position in the registry that produced it
    pub fn index(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for EndpointRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "destination {}", self.0)
    }
}

/// Enumerates the MIDI destinations a backend can reach
pub trait DestinationRegistry {
    /// Number of destinations
    fn count(&self) -> u32;

    /// Destination at an index, if present
    fn get(&self, index: u32) -> Option<EndpointRef> {
        (index < self.count()).then(|| EndpointRef::new(index))
    }

    /// Display name of a destination
    fn name(&self, endpoint: EndpointRef) -> Option<String>;

    /// Every destination with its display name
    fn list(&self) -> Vec<(EndpointRef, String)> {
        (0..self.count())
            .filter_map(|i| self.get(i))
            .map(|endpoint| {
                let name = self
                    .name(endpoint)
                    .unwrap_or_else(|| format!("Unknown {}", endpoint.index()));
                (endpoint, name)
            })
            .collect()
    }

    /// Open an output connected to a destination
    fn open(&self, endpoint: EndpointRef) -> Result<Box<dyn MidiOutput>>;
}

/// Registry used when no platform backend is compiled in
#[derive(Debug, Default)]
pub struct NoDestinations;

impl DestinationRegistry for NoDestinations {
    fn count(&self) -> u32 {
        0
    }

    fn name(&self, _endpoint: EndpointRef) -> Option<String> {
        None
    }

    fn open(&self, endpoint: EndpointRef) -> Result<Box<dyn MidiOutput>> {
        Err(anyhow!("MIDI {} not found (no MIDI backend available)", endpoint))
    }
}

/// Registry for the platform's preferred backend
pub fn system_registry() -> Box<dyn DestinationRegistry> {
    #[cfg(target_os = "macos")]
    {
        Box::new(coremidi_backend::CoreMidiRegistry)
    }
    #[cfg(all(not(target_os = "macos"), feature = "midir-backend"))]
    {
        Box::new(midir_backend::MidirRegistry)
    }
    #[cfg(all(not(target_os = "macos"), not(feature = "midir-backend")))]
    {
        Box::new(NoDestinations)
    }
}

/// Print all available MIDI destinations to stdout.
pub fn print_destinations(registry: &dyn DestinationRegistry) {
    let destinations = registry.list();
    if destinations.is_empty() {
        println!("No MIDI destinations found.");
    } else {
        println!("Available MIDI destinations:");
        for (endpoint, name) in destinations {
            println!("  {}: {}", endpoint.index(), name);
        }
    }
}

/// MIDI message constants
pub mod messages {
    // Channel Voice Messages (upper nibble, lower nibble is channel 0-15)
    pub const NOTE_OFF: u8 = 0x80;
    pub const NOTE_ON: u8 = 0x90;
    pub const POLY_AFTERTOUCH: u8 = 0xA0;
    pub const CONTROL_CHANGE: u8 = 0xB0;
    pub const PROGRAM_CHANGE: u8 = 0xC0;
    pub const CHANNEL_AFTERTOUCH: u8 = 0xD0;
    pub const PITCH_BEND: u8 = 0xE0;

    // System Common Messages
    pub const SYSEX_START: u8 = 0xF0;
    pub const SYSEX_END: u8 = 0xF7;

    // Controller numbers
    pub const CC_ALL_NOTES_OFF: u8 = 123;
}
