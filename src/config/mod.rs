// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Configuration files.
//!
//! This module provides YAML song files, which describe a sequence's tracks
//! and events and build a populated [`Sequence`], and TOML player settings.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::events::{
    ChannelMessage, ChannelOptions, NoteMessage, NoteOptions, TempoEvent, TempoOptions,
};
use crate::midi::EndpointRef;
use crate::sequence::{
    LoopInfo, Sequence, TimeBase, Track, DEFAULT_BPM, DEFAULT_SAMPLE_RATE, DEFAULT_TIME_RESOLUTION,
};

/// Root configuration for a song
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SongFile {
    /// Song metadata and settings
    pub song: SongConfig,
    /// Track definitions
    #[serde(default)]
    pub tracks: Vec<TrackConfig>,
}

impl SongFile {
    /// Load a song from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read song file: {:?}", path.as_ref()))?;
        Self::from_yaml(&contents)
    }

    /// Parse a song from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse YAML song file")
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize song to YAML")
    }

    /// Save the song to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write song file: {:?}", path.as_ref()))
    }

    /// Build the sequence this song describes
    pub fn build(&self) -> Result<Sequence> {
        let sequence = Sequence::new();
        sequence.set_time_base(self.song.time_base);
        sequence.set_sample_rate(self.song.sample_rate)?;
        sequence.bind_midi_destination(self.song.destination.map(EndpointRef::new));

        let tempo_track = sequence.tempo_track();
        tempo_track.set_time_resolution(self.song.resolution)?;
        for change in &self.song.tempo {
            tempo_track
                .add_tempo_event(change.at, change.bpm)
                .with_context(|| format!("Invalid tempo change at {}", change.at))?;
        }

        for config in &self.tracks {
            let track = sequence.new_track();
            track.set_mute_status(config.mute)?;
            track.set_solo_status(config.solo)?;
            track.set_offset_time(config.offset)?;
            if let Some(info) = config.loop_info {
                track.set_loop_info(LoopInfo::new(info.duration, info.count))?;
            }

            for (i, event) in config.events.iter().enumerate() {
                event
                    .add_to(&track)
                    .with_context(|| format!("Track '{}', event {}", config.name, i))?;
            }

            // Explicit length applies after events have extended it
            if let Some(length) = config.length {
                track.set_length(length)?;
            }
        }

        debug!(
            name = %self.song.name,
            tracks = self.tracks.len(),
            "built sequence from song"
        );
        Ok(sequence)
    }
}

/// Song-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SongConfig {
    /// Song name
    pub name: String,
    /// Unit for every timestamp in the song
    #[serde(default)]
    pub time_base: TimeBase,
    /// Sample rate for the samples time base
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f64,
    /// Ticks per quarter note when written to a MIDI file
    #[serde(default = "default_resolution")]
    pub resolution: i16,
    /// Tempo changes; 120 BPM when empty
    #[serde(default = "default_tempo")]
    pub tempo: Vec<TempoChange>,
    /// Index of the MIDI destination to play to
    #[serde(default)]
    pub destination: Option<u32>,
}

fn default_sample_rate() -> f64 {
    DEFAULT_SAMPLE_RATE
}
fn default_resolution() -> i16 {
    DEFAULT_TIME_RESOLUTION
}
fn default_tempo() -> Vec<TempoChange> {
    vec![TempoChange {
        at: 0.0,
        bpm: DEFAULT_BPM,
    }]
}

impl Default for SongConfig {
    fn default() -> Self {
        Self {
            name: "Untitled".to_string(),
            time_base: TimeBase::default(),
            sample_rate: default_sample_rate(),
            resolution: default_resolution(),
            tempo: default_tempo(),
            destination: None,
        }
    }
}

/// A tempo change on the tempo track
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TempoChange {
    #[serde(default)]
    pub at: f64,
    pub bpm: f64,
}

/// Loop settings for a track
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LoopConfig {
    pub duration: f64,
    /// Zero loops forever
    #[serde(default)]
    pub count: i32,
}

/// Track configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackConfig {
    /// Track name, used in error messages
    #[serde(default = "default_track_name")]
    pub name: String,
    #[serde(default)]
    pub mute: bool,
    #[serde(default)]
    pub solo: bool,
    /// Time added to every event on playback
    #[serde(default)]
    pub offset: f64,
    /// Explicit track length
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default, rename = "loop")]
    pub loop_info: Option<LoopConfig>,
    #[serde(default)]
    pub events: Vec<EventConfig>,
}

fn default_track_name() -> String {
    "Track".to_string()
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            name: default_track_name(),
            mute: false,
            solo: false,
            offset: 0.0,
            length: None,
            loop_info: None,
            events: Vec::new(),
        }
    }
}

/// One event; exactly one of `note`, `channel` or `tempo` is set
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct EventConfig {
    /// Timestamp in the song's time base
    pub at: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<NoteOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<ChannelOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo: Option<TempoOptions>,
}

impl EventConfig {
    fn add_to(&self, track: &Track) -> Result<()> {
        match (&self.note, &self.channel, &self.tempo) {
            (Some(opts), None, None) => track.add_note(self.at, NoteMessage::create(opts)?)?,
            (None, Some(opts), None) => {
                track.add_channel_message(self.at, ChannelMessage::create(opts)?)?
            }
            (None, None, Some(opts)) => track.add(self.at, TempoEvent::create(opts)?)?,
            (None, None, None) => bail!("event at {} has no note, channel or tempo", self.at),
            _ => bail!("event at {} sets more than one event kind", self.at),
        }
        Ok(())
    }
}

/// Player settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerSettings {
    /// Playback speed multiplier
    #[serde(default = "default_play_rate")]
    pub play_rate: f64,
    /// Overrides the song's sample rate when set
    #[serde(default)]
    pub sample_rate: Option<f64>,
    /// Overrides the song's MIDI destination when set
    #[serde(default)]
    pub destination: Option<u32>,
    /// Milliseconds between dispatch passes
    #[serde(default = "default_pump_interval_ms")]
    pub pump_interval_ms: u64,
}

fn default_play_rate() -> f64 {
    1.0
}
fn default_pump_interval_ms() -> u64 {
    5
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            play_rate: default_play_rate(),
            sample_rate: None,
            destination: None,
            pump_interval_ms: default_pump_interval_ms(),
        }
    }
}

impl PlayerSettings {
    /// Load settings from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read settings file: {:?}", path.as_ref()))?;
        Self::from_toml(&contents)
    }

    /// Parse settings from TOML string
    pub fn from_toml(source: &str) -> Result<Self> {
        toml::from_str(source).context("Failed to parse TOML settings")
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).context("Failed to serialize settings to TOML")
    }
}
