// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! In-memory MIDI output, for offline rendering and tests.

use anyhow::Result;

use super::MidiOutput;

/// Records every message sent to it
#[derive(Debug, Default, Clone)]
pub struct MemoryOutput {
    messages: Vec<(Option<u64>, Vec<u8>)>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages in send order, without timestamps
    pub fn messages(&self) -> Vec<Vec<u8>> {
        self.messages.iter().map(|(_, m)| m.clone()).collect()
    }

    /// Messages with the timestamp they were sent at, if any
    pub fn timed_messages(&self) -> &[(Option<u64>, Vec<u8>)] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl MidiOutput for MemoryOutput {
    fn send(&mut self, message: &[u8]) -> Result<()> {
        self.messages.push((None, message.to_vec()));
        Ok(())
    }

    fn send_at(&mut self, message: &[u8], timestamp: u64) -> Result<()> {
        self.messages.push((Some(timestamp), message.to_vec()));
        Ok(())
    }
}
