// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Cross-platform output through midir.

use anyhow::{anyhow, Result};
use midir::{MidiOutput as MidirOutput, MidiOutputConnection};

use super::{DestinationRegistry, EndpointRef, MidiOutput};

/// midir connection to one output port
pub struct MidirMidiOutput {
    connection: MidiOutputConnection,
}

impl MidirMidiOutput {
    pub fn new(endpoint: EndpointRef) -> Result<Self> {
        let midi_output = MidirOutput::new("musicseq")
            .map_err(|e| anyhow!("Failed to create MIDI output: {}", e))?;

        let ports = midi_output.ports();
        let port = ports
            .get(endpoint.index() as usize)
            .ok_or_else(|| anyhow!("MIDI {} not found", endpoint))?;

        let connection = midi_output
            .connect(port, "musicseq output")
            .map_err(|e| anyhow!("Failed to connect to MIDI {}: {}", endpoint, e))?;

        Ok(Self { connection })
    }
}

impl MidiOutput for MidirMidiOutput {
    fn send(&mut self, message: &[u8]) -> Result<()> {
        self.connection
            .send(message)
            .map_err(|e| anyhow!("Failed to send MIDI message: {}", e))
    }

    /// midir has no scheduled send; the message goes out immediately
    fn send_at(&mut self, message: &[u8], _timestamp: u64) -> Result<()> {
        self.send(message)
    }
}

/// Output ports as seen by midir
#[derive(Debug, Default)]
pub struct MidirRegistry;

impl DestinationRegistry for MidirRegistry {
    fn count(&self) -> u32 {
        MidirOutput::new("musicseq scanner")
            .map(|output| output.port_count() as u32)
            .unwrap_or(0)
    }

    fn name(&self, endpoint: EndpointRef) -> Option<String> {
        let output = MidirOutput::new("musicseq scanner").ok()?;
        let ports = output.ports();
        let port = ports.get(endpoint.index() as usize)?;
        output.port_name(port).ok()
    }

    fn open(&self, endpoint: EndpointRef) -> Result<Box<dyn MidiOutput>> {
        Ok(Box::new(MidirMidiOutput::new(endpoint)?))
    }
}
