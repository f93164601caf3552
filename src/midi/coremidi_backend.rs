// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Core MIDI backend for macOS.
//!
//! Enumerates system destinations and sends sequence playback to one of them.

use anyhow::{anyhow, Result};
use coremidi::{Client, Destination, Destinations, OutputPort, PacketBuffer};

use super::{DestinationRegistry, EndpointRef, MidiOutput};

/// Core MIDI output connected to one destination
pub struct CoreMidiOutput {
    _client: Client,
    output_port: OutputPort,
    destination: Destination,
}

impl CoreMidiOutput {
    /// Connect to a destination.
    ///
    /// # Returns
    /// * `Err` if the client or port could not be created, or the
    ///   destination no longer exists
    pub fn new(endpoint: EndpointRef) -> Result<Self> {
        let client = Client::new("musicseq")
            .map_err(|e| anyhow!("Failed to create MIDI client: {:?}", e))?;

        let output_port = client
            .output_port("musicseq output")
            .map_err(|e| anyhow!("Failed to create output port: {:?}", e))?;

        let index = endpoint.index() as usize;
        let count = Destinations::count();
        if index >= count {
            return Err(anyhow!(
                "MIDI destination {} not found (only {} available)",
                index,
                count
            ));
        }

        let destination = Destination::from_index(index)
            .ok_or_else(|| anyhow!("MIDI destination {} not found", index))?;

        Ok(Self {
            _client: client,
            output_port,
            destination,
        })
    }
}

impl MidiOutput for CoreMidiOutput {
    fn send(&mut self, message: &[u8]) -> Result<()> {
        // Timestamp 0 sends immediately
        self.send_at(message, 0)
    }

    fn send_at(&mut self, message: &[u8], timestamp: u64) -> Result<()> {
        let packet_buffer = PacketBuffer::new(timestamp, message);
        self.output_port
            .send(&self.destination, &packet_buffer)
            .map_err(|e| anyhow!("Failed to send MIDI message: {:?}", e))?;
        Ok(())
    }
}

/// System destinations as seen by Core MIDI
#[derive(Debug, Default)]
pub struct CoreMidiRegistry;

impl DestinationRegistry for CoreMidiRegistry {
    fn count(&self) -> u32 {
        Destinations::count() as u32
    }

    fn name(&self, endpoint: EndpointRef) -> Option<String> {
        Destination::from_index(endpoint.index() as usize)?.display_name()
    }

    fn open(&self, endpoint: EndpointRef) -> Result<Box<dyn MidiOutput>> {
        Ok(Box::new(CoreMidiOutput::new(endpoint)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_destinations() {
        // Destinations vary by system; listing must simply not panic
        let registry = CoreMidiRegistry;
        let destinations = registry.list();
        assert_eq!(destinations.len(), registry.count() as usize);
    }

    #[test]
    fn test_out_of_range_destination() {
        let registry = CoreMidiRegistry;
        assert_eq!(registry.get(registry.count()), None);
    }
}
