// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Standard MIDI file writer.
//!
//! Writes a sequence snapshot as a Type 1 file: the tempo track first, then
//! one chunk per regular track. Resolution comes from the tempo track.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use super::SmfSaver;
use crate::error::Result;
use crate::events::RawEvent;
use crate::midi::messages;
use crate::sequence::{SequenceData, TempoMap, TrackData, DEFAULT_TIME_RESOLUTION};

/// MIDI event for export
#[derive(Debug, Clone)]
struct SmfEvent {
    /// Absolute tick
    tick: u64,
    /// Note-offs sort ahead of everything else on the same tick
    rank: u8,
    /// Event data
    data: Vec<u8>,
}

impl SmfEvent {
    fn new(tick: u64, data: Vec<u8>) -> Self {
        Self { tick, rank: 1, data }
    }

    fn note_off(tick: u64, data: Vec<u8>) -> Self {
        Self { tick, rank: 0, data }
    }

    fn tempo(tick: u64, micros_per_quarter: u32) -> Self {
        Self::new(
            tick,
            vec![
                0xFF,
                0x51,
                0x03,
                ((micros_per_quarter >> 16) & 0xFF) as u8,
                ((micros_per_quarter >> 8) & 0xFF) as u8,
                (micros_per_quarter & 0xFF) as u8,
            ],
        )
    }

    fn meta(tick: u64, kind: u8, payload: &[u8]) -> Self {
        let mut data = vec![0xFF, kind & 0x7F];
        write_variable_length(&mut data, payload.len() as u32);
        data.extend_from_slice(payload);
        Self::new(tick, data)
    }

    fn sysex(tick: u64, payload: &[u8]) -> Self {
        let mut data = vec![messages::SYSEX_START];
        write_variable_length(&mut data, payload.len() as u32 + 1);
        data.extend_from_slice(payload);
        data.push(messages::SYSEX_END);
        Self::new(tick, data)
    }
}

/// Largest value a four-byte variable-length quantity can hold
const MAX_VARIABLE_LENGTH: u64 = 0x0FFF_FFFF;

/// Write variable-length quantity
fn write_variable_length(buffer: &mut Vec<u8>, mut value: u32) {
    let mut bytes = Vec::new();

    bytes.push((value & 0x7F) as u8);
    value >>= 7;

    while value > 0 {
        bytes.push((value & 0x7F) as u8 | 0x80);
        value >>= 7;
    }

    bytes.reverse();
    buffer.extend_from_slice(&bytes);
}

/// Type 1 Standard MIDI File writer
#[derive(Debug, Clone, Default)]
pub struct SmfWriter;

impl SmfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Ticks per quarter note for a snapshot
    pub fn ppqn(data: &SequenceData) -> u16 {
        match data.tempo.properties.time_resolution {
            Some(resolution) if resolution > 0 => resolution as u16,
            _ => DEFAULT_TIME_RESOLUTION as u16,
        }
    }

    /// Encode a snapshot to bytes
    pub fn to_bytes(&self, data: &SequenceData) -> io::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.write(data, &mut buffer)?;
        Ok(buffer)
    }

    /// Write MIDI data to writer
    pub fn write<W: Write>(&self, data: &SequenceData, writer: &mut W) -> io::Result<()> {
        let ppqn = Self::ppqn(data);
        let map = data.tempo_map();
        let num_tracks = data.tracks.len() + 1;

        self.write_header(writer, num_tracks as u16, ppqn)?;
        self.write_track(writer, &track_events(&data.tempo, &map, ppqn))?;
        for track in &data.tracks {
            self.write_track(writer, &track_events(track, &map, ppqn))?;
        }
        Ok(())
    }

    /// Write MIDI file header chunk
    fn write_header<W: Write>(&self, writer: &mut W, num_tracks: u16, ppqn: u16) -> io::Result<()> {
        writer.write_all(b"MThd")?;
        // Chunk length (always 6)
        writer.write_all(&[0, 0, 0, 6])?;
        // Format 1
        writer.write_all(&1u16.to_be_bytes())?;
        writer.write_all(&num_tracks.to_be_bytes())?;
        writer.write_all(&ppqn.to_be_bytes())?;
        Ok(())
    }

    /// Write a track chunk
    fn write_track<W: Write>(&self, writer: &mut W, events: &[SmfEvent]) -> io::Result<()> {
        let mut track_data = Vec::new();
        let mut last_tick = 0u64;

        for event in events {
            let delta = event.tick.saturating_sub(last_tick);
            if delta > MAX_VARIABLE_LENGTH {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("delta of {} ticks exceeds the MIDI file limit", delta),
                ));
            }
            write_variable_length(&mut track_data, delta as u32);
            track_data.extend_from_slice(&event.data);
            last_tick = event.tick;
        }

        // End of track
        write_variable_length(&mut track_data, 0);
        track_data.extend_from_slice(&[0xFF, 0x2F, 0x00]);

        writer.write_all(b"MTrk")?;
        writer.write_all(&(track_data.len() as u32).to_be_bytes())?;
        writer.write_all(&track_data)?;
        Ok(())
    }
}

impl SmfSaver for SmfWriter {
    fn save(&self, data: &SequenceData, path: &Path) -> Result<()> {
        let mut file = BufWriter::new(File::create(path)?);
        self.write(data, &mut file)?;
        file.flush()?;
        debug!(path = %path.display(), tracks = data.tracks.len(), "wrote midi file");
        Ok(())
    }
}

/// Sequence time to absolute ticks
fn to_tick(map: &TempoMap, time: f64, ppqn: u16) -> u64 {
    (map.to_beats(time) * ppqn as f64).round().max(0.0) as u64
}

/// Flatten one track's events into tick-ordered MIDI events
fn track_events(track: &TrackData, map: &TempoMap, ppqn: u16) -> Vec<SmfEvent> {
    let mut events = Vec::with_capacity(track.events.len() * 2);

    for timed in &track.events {
        let tick = to_tick(map, timed.time, ppqn);
        match &timed.event {
            RawEvent::Null => {}
            RawEvent::Note(note) => {
                events.push(SmfEvent::new(tick, note.note_on_bytes().to_vec()));
                let end = to_tick(map, timed.time + note.duration, ppqn);
                let off = note.note_off_bytes().to_vec();
                if end > tick {
                    events.push(SmfEvent::note_off(end, off));
                } else {
                    // Same tick as its note-on: stable sort keeps it behind
                    events.push(SmfEvent::new(tick, off));
                }
            }
            RawEvent::Channel(msg) => {
                // Running-status data bytes would corrupt the stream
                if msg.status & 0x80 != 0 && msg.status < messages::SYSEX_START {
                    events.push(SmfEvent::new(tick, msg.to_midi_bytes()));
                }
            }
            RawEvent::Tempo(tempo) => {
                if tempo.is_usable() {
                    events.push(SmfEvent::tempo(tick, tempo.micros_per_quarter()));
                }
            }
            RawEvent::Meta { kind, data } => events.push(SmfEvent::meta(tick, *kind, data)),
            RawEvent::Sysex(data) => events.push(SmfEvent::sysex(tick, data)),
        }
    }

    events.sort_by_key(|e| (e.tick, e.rank));
    events
}
