// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Music player.
//!
//! A [`Player`] is a transport bound weakly to one sequence. Playback is
//! cooperative: the host calls [`Player::pump`] regularly and every event
//! whose time has been reached since the previous pump is sent to the given
//! output.

pub mod scheduler;
pub mod transport;

pub use scheduler::{ScheduledMessage, Scheduler};
pub use transport::{ClockTransport, Clock, ManualClock, SystemClock, Transport};

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::events::RawEvent;
use crate::midi::{messages, MidiOutput};
use crate::sequence::{Sequence, TrackProperties, WeakSequence};

/// Player state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Unbound,
    Stopped,
    Playing,
}

/// Whether a track is heard given the sequence's solo state
fn should_output(props: &TrackProperties, has_solo: bool) -> bool {
    if props.mute == Some(true) {
        return false;
    }
    if has_solo {
        return props.solo == Some(true);
    }
    true
}

/// Bytes sent live for a stored event, if it has a live form
fn live_bytes(event: &RawEvent) -> Option<Vec<u8>> {
    match event {
        RawEvent::Channel(msg) if msg.status & 0x80 != 0 && msg.status < messages::SYSEX_START => {
            Some(msg.to_midi_bytes())
        }
        RawEvent::Sysex(data) => {
            let mut bytes = Vec::with_capacity(data.len() + 2);
            bytes.push(messages::SYSEX_START);
            bytes.extend_from_slice(data);
            bytes.push(messages::SYSEX_END);
            Some(bytes)
        }
        _ => None,
    }
}

/// Transport bound to a sequence
pub struct Player {
    transport: Box<dyn Transport>,
    sequence: Option<WeakSequence>,
    /// Sequence time dispatched up to (exclusive)
    cursor: f64,
    scheduler: Scheduler,
    /// Pending note-offs go out on the next pump regardless of time
    flush_pending: bool,
    released: bool,
}

impl Player {
    /// Player on the system clock
    pub fn new() -> Self {
        Self::with_transport(Box::new(ClockTransport::default()))
    }

    /// Player on a custom transport
    pub fn with_transport(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            sequence: None,
            cursor: 0.0,
            scheduler: Scheduler::new(),
            flush_pending: false,
            released: false,
        }
    }

    fn check_released(&self) -> Result<()> {
        if self.released {
            return Err(Error::InvalidOperation("player has been released"));
        }
        Ok(())
    }

    /// Bound sequence
    pub fn sequence(&self) -> Result<Sequence> {
        self.sequence
            .as_ref()
            .ok_or(Error::NoSequence)?
            .upgrade()
            .ok_or(Error::StaleHandle("sequence"))
    }

    /// Bind a sequence, stopping playback first and rewinding to zero
    pub fn bind(&mut self, sequence: &Sequence) -> Result<()> {
        self.check_released()?;
        if self.transport.is_playing() {
            self.transport.stop()?;
            info!("stopped playback to rebind");
        }
        self.transport.set_time(0.0)?;
        self.sequence = Some(sequence.downgrade());
        self.cursor = 0.0;
        self.flush_pending = !self.scheduler.is_empty();
        debug!(tracks = sequence.tracks().size(), "bound sequence");
        Ok(())
    }

    pub fn start(&mut self) -> Result<()> {
        self.check_released()?;
        self.sequence()?;
        if !self.transport.is_playing() {
            self.transport.start()?;
            info!(time = self.cursor, "playback started");
        }
        Ok(())
    }

    /// Stop playback; idempotent. Sounding notes are released on the next
    /// pump.
    ///
    /// The transport stops even when the bound sequence is gone; the stale
    /// handle is still reported.
    pub fn stop(&mut self) -> Result<()> {
        if self.transport.is_playing() {
            self.transport.stop()?;
            self.flush_pending = true;
            info!(time = self.cursor, "playback stopped");
        }
        self.sequence()?;
        Ok(())
    }

    pub fn is_playing(&self) -> bool {
        self.transport.is_playing()
    }

    pub fn state(&self) -> PlayerState {
        match self.sequence {
            None => PlayerState::Unbound,
            Some(_) if self.transport.is_playing() => PlayerState::Playing,
            Some(_) => PlayerState::Stopped,
        }
    }

    /// Playback position in the sequence's time base
    pub fn time(&self) -> Result<f64> {
        let sequence = self.sequence()?;
        Ok(sequence.from_seconds(self.transport.time()?))
    }

    /// Move the playback position
    pub fn set_time(&mut self, time: f64) -> Result<()> {
        let sequence = self.sequence()?;
        if !(time.is_finite() && time >= 0.0) {
            return Err(Error::InvalidTimestamp(time));
        }
        self.transport.set_time(sequence.to_seconds(time))?;
        self.cursor = time;
        self.flush_pending = !self.scheduler.is_empty();
        debug!(time, "moved playback position");
        Ok(())
    }

    pub fn play_rate_scalar(&self) -> f64 {
        self.transport.rate()
    }

    /// Scale playback speed; must be positive and finite
    pub fn set_play_rate_scalar(&mut self, rate: f64) -> Result<()> {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(Error::InvalidPlayRate(rate));
        }
        self.transport.set_rate(rate)
    }

    /// Number of note-offs waiting to be sent
    pub fn pending(&self) -> usize {
        self.scheduler.len()
    }

    /// Send every pending message now
    pub fn flush(&mut self, output: &mut dyn MidiOutput) -> Result<usize> {
        self.flush_pending = false;
        let mut sent = 0;
        while let Some(msg) = self.scheduler.pop_next() {
            send(output, &msg.data)?;
            sent += 1;
        }
        Ok(sent)
    }

    /// Drop pending note-offs and send All Notes Off on every channel
    pub fn all_notes_off(&mut self, output: &mut dyn MidiOutput) -> Result<usize> {
        self.scheduler.clear();
        self.flush_pending = false;
        for channel in 0..16u8 {
            send(
                output,
                &[messages::CONTROL_CHANGE | channel, messages::CC_ALL_NOTES_OFF, 0],
            )?;
        }
        debug!("sent all notes off");
        Ok(16)
    }

        /// Dispatch everything due since the previous pump.
    ///
    /// Returns the number of messages sent. When stopped this only releases
    /// notes left sounding by a stop or reposition.
    pub fn pump(&mut self, output: &mut dyn MidiOutput) -> Result<usize> {
        let sequence = self.sequence()?;
        let mut sent = 0;
        if self.flush_pending {
            sent += self.flush(output)?;
        }
        if !self.transport.is_playing() {
            return Ok(sent);
        }

        let now = sequence.from_seconds(self.transport.time()?);
        if now <= self.cursor {
            return Ok(sent);
        }

        self.collect(&sequence, self.cursor, now)?;
        while let Some(msg) = self.scheduler.pop_due(now) {
            send(output, &msg.data)?;
            sent += 1;
        }
        self.cursor = now;
        Ok(sent)
    }

    /// Schedule every event positioned in `[from, to)`
    fn collect(&mut self, sequence: &Sequence, from: f64, to: f64) -> Result<()> {
        let tracks: Vec<_> = sequence.tracks().iter().collect();
        let mut props = Vec::with_capacity(tracks.len());
        for track in &tracks {
            props.push(track.properties()?);
        }
        let has_solo = props.iter().any(|p| p.solo == Some(true));

        for (track, props) in tracks.iter().zip(&props) {
            if !should_output(props, has_solo) {
                continue;
            }
            let offset = props.offset_time.unwrap_or(0.0);
            let store = track.store()?;
            let store = store.borrow();

            let looping = props.loop_info.filter(|l| l.duration > 0.0);
            let Some(info) = looping else {
                for entry in store.entries() {
                    let at = offset + entry.time;
                    if at >= from && at < to {
                        self.schedule(at, &entry.event);
                    }
                }
                continue;
            };

            // Events inside the loop region repeat once per pass
            let span = info.duration;
            let first = (((from - offset) / span).floor() - 1.0).max(0.0) as u64;
            let mut last = ((to - offset) / span).floor().max(0.0) as u64;
            if !info.is_infinite() {
                last = last.min(info.count as u64 - 1);
            }
            for pass in first..=last {
                let base = offset + pass as f64 * span;
                for entry in store.entries().iter().take_while(|e| e.time < span) {
                    let at = base + entry.time;
                    if at >= from && at < to {
                        self.schedule(at, &entry.event);
                    }
                }
            }
        }
        Ok(())
    }

    fn schedule(&mut self, at: f64, event: &RawEvent) {
        match event {
            RawEvent::Note(note) => {
                self.scheduler.schedule_note(
                    at,
                    note.note_on_bytes().to_vec(),
                    at + note.duration,
                    note.note_off_bytes().to_vec(),
                );
            }
            other => {
                if let Some(bytes) = live_bytes(other) {
                    self.scheduler.schedule(at, bytes);
                }
            }
        }
    }

    /// Stop the transport and detach; later calls are no-ops
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if self.transport.is_playing() {
            if let Err(e) = self.transport.stop() {
                warn!("failed to stop transport on release: {}", e);
            }
        }
        self.sequence = None;
        debug!("player released");
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.release();
    }
}

fn send(output: &mut dyn MidiOutput, data: &[u8]) -> Result<()> {
    output
        .send(data)
        .map_err(|e| Error::TransportFailure(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ChannelMessage, NoteMessage};
    use crate::midi::MemoryOutput;
    use crate::sequence::{LoopInfo, TimeBase};

    fn manual_player() -> (ManualClock, Player) {
        let clock = ManualClock::new();
        let player = Player::with_transport(Box::new(ClockTransport::new(clock.clone())));
        (clock, player)
    }

    #[test]
    fn test_unbound_player() {
        let (_clock, mut player) = manual_player();
        assert_eq!(player.state(), PlayerState::Unbound);
        assert!(matches!(player.start(), Err(Error::NoSequence)));
        assert!(matches!(player.stop(), Err(Error::NoSequence)));
        assert!(matches!(player.time(), Err(Error::NoSequence)));
        assert!(matches!(player.set_time(1.0), Err(Error::NoSequence)));
        assert!(!player.is_playing());
    }

    #[test]
    fn test_start_after_bind() {
        let (_clock, mut player) = manual_player();
        let seq = Sequence::new();
        player.bind(&seq).unwrap();
        assert_eq!(player.state(), PlayerState::Stopped);

        player.start().unwrap();
        assert!(player.is_playing());
        assert_eq!(player.state(), PlayerState::Playing);

        player.stop().unwrap();
        player.stop().unwrap();
        assert!(!player.is_playing());
    }

    #[test]
    fn test_time_follows_tempo() {
        let (clock, mut player) = manual_player();
        let seq = Sequence::new();
        player.bind(&seq).unwrap();
        player.start().unwrap();

        // 120 BPM: two beats per second
        clock.advance(1.5);
        assert_eq!(player.time().unwrap(), 3.0);

        seq.set_time_base(TimeBase::Seconds);
        assert_eq!(player.time().unwrap(), 1.5);
    }

    #[test]
    fn test_set_time() {
        let (clock, mut player) = manual_player();
        let seq = Sequence::new();
        player.bind(&seq).unwrap();
        player.set_time(4.0).unwrap();
        assert_eq!(player.time().unwrap(), 4.0);

        player.start().unwrap();
        clock.advance(0.5);
        assert_eq!(player.time().unwrap(), 5.0);
        assert!(matches!(player.set_time(-1.0), Err(Error::InvalidTimestamp(_))));
    }

    #[test]
    fn test_play_rate() {
        let (clock, mut player) = manual_player();
        let seq = Sequence::new();
        player.bind(&seq).unwrap();
        assert_eq!(player.play_rate_scalar(), 1.0);

        player.set_play_rate_scalar(2.0).unwrap();
        player.start().unwrap();
        clock.advance(1.0);
        assert_eq!(player.time().unwrap(), 4.0);

        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                player.set_play_rate_scalar(bad),
                Err(Error::InvalidPlayRate(_))
            ));
        }
        assert_eq!(player.play_rate_scalar(), 2.0);
    }

    #[test]
    fn test_rebind_stops_and_rewinds() {
        let (clock, mut player) = manual_player();
        let first = Sequence::new();
        let second = Sequence::new();
        player.bind(&first).unwrap();
        player.start().unwrap();
        clock.advance(2.0);

        player.bind(&second).unwrap();
        assert!(!player.is_playing());
        assert_eq!(player.time().unwrap(), 0.0);
        assert!(player.sequence().unwrap().ptr_eq(&second));
    }

    #[test]
    fn test_dropped_sequence() {
        let (_clock, mut player) = manual_player();
        let seq = Sequence::new();
        player.bind(&seq).unwrap();
        drop(seq);
        assert!(matches!(player.start(), Err(Error::StaleHandle(_))));
        assert_eq!(player.state(), PlayerState::Stopped);
    }

    #[test]
    fn test_pump_dispatches_in_order() {
        let (clock, mut player) = manual_player();
        let seq = Sequence::new();
        let track = seq.new_track();
        track.add_note(0.0, NoteMessage::new(60).with_channel(0)).unwrap();
        track.add_note(1.0, NoteMessage::new(64).with_channel(0)).unwrap();

        let mut output = MemoryOutput::new();
        player.bind(&seq).unwrap();
        player.start().unwrap();
        assert_eq!(player.pump(&mut output).unwrap(), 0);

        clock.advance(0.25);
        assert_eq!(player.pump(&mut output).unwrap(), 1);
        assert_eq!(output.messages(), vec![vec![0x90, 60, 64]]);

        clock.advance(0.5);
        assert_eq!(player.pump(&mut output).unwrap(), 2);
        assert_eq!(output.messages()[1], vec![0x80, 60, 0]);
        assert_eq!(output.messages()[2], vec![0x90, 64, 64]);
        assert_eq!(player.pending(), 1);

        // Stopping releases the sounding note on the next pump
        player.stop().unwrap();
        assert_eq!(player.pump(&mut output).unwrap(), 1);
        assert_eq!(output.messages()[3], vec![0x80, 64, 0]);
        assert_eq!(player.pending(), 0);
    }

    #[test]
    fn test_pump_mute_and_solo() {
        let (clock, mut player) = manual_player();
        let seq = Sequence::new();
        let a = seq.new_track();
        let b = seq.new_track();
        a.add_channel_message(0.0, ChannelMessage::program_change(0, 1)).unwrap();
        b.add_channel_message(0.0, ChannelMessage::program_change(1, 2)).unwrap();
        b.set_solo_status(true).unwrap();

        let mut output = MemoryOutput::new();
        player.bind(&seq).unwrap();
        player.start().unwrap();
        clock.advance(0.1);
        player.pump(&mut output).unwrap();
        assert_eq!(output.messages(), vec![vec![0xC1, 2]]);

        b.set_mute_status(true).unwrap();
        player.set_time(0.0).unwrap();
        output.clear();
        clock.advance(0.1);
        assert_eq!(player.pump(&mut output).unwrap(), 0);
    }

    #[test]
    fn test_pump_offset() {
        let (clock, mut player) = manual_player();
        let seq = Sequence::new();
        seq.set_time_base(TimeBase::Seconds);
        let track = seq.new_track();
        track.add_channel_message(0.0, ChannelMessage::control_change(0, 7, 100)).unwrap();
        track.set_offset_time(1.0).unwrap();

        let mut output = MemoryOutput::new();
        player.bind(&seq).unwrap();
        player.start().unwrap();
        clock.advance(0.9);
        assert_eq!(player.pump(&mut output).unwrap(), 0);
        clock.advance(0.2);
        assert_eq!(player.pump(&mut output).unwrap(), 1);
    }

    #[test]
    fn test_pump_loops() {
        let (clock, mut player) = manual_player();
        let seq = Sequence::new();
        seq.set_time_base(TimeBase::Seconds);
        let track = seq.new_track();
        track.add_channel_message(0.0, ChannelMessage::program_change(0, 1)).unwrap();
        // Outside the loop region; never heard while looping
        track.add_channel_message(3.0, ChannelMessage::program_change(0, 9)).unwrap();
        track.set_loop_info(LoopInfo::new(1.0, 3)).unwrap();

        let mut output = MemoryOutput::new();
        player.bind(&seq).unwrap();
        player.start().unwrap();
        clock.advance(10.0);
        assert_eq!(player.pump(&mut output).unwrap(), 3);
        assert!(output.messages().iter().all(|m| m == &vec![0xC0, 1]));
    }

    #[test]
    fn test_pump_infinite_loop_windows() {
        let (clock, mut player) = manual_player();
        let seq = Sequence::new();
        seq.set_time_base(TimeBase::Seconds);
        let track = seq.new_track();
        track.add_channel_message(0.5, ChannelMessage::program_change(0, 1)).unwrap();
        track.set_loop_info(LoopInfo::new(1.0, 0)).unwrap();

        let mut output = MemoryOutput::new();
        player.bind(&seq).unwrap();
        player.start().unwrap();
        let mut total = 0;
        for _ in 0..8 {
            clock.advance(0.5);
            total += player.pump(&mut output).unwrap();
        }
        // Passes at 0.5, 1.5, 2.5 and 3.5
        assert_eq!(total, 4);
    }

    #[test]
    fn test_zero_length_note_is_released() {
        let (clock, mut player) = manual_player();
        let seq = Sequence::new();
        seq.set_time_base(TimeBase::Seconds);
        let track = seq.new_track();
        track
            .add_note(0.5, NoteMessage::new(60).with_channel(0).with_duration(0.0))
            .unwrap();

        let mut output = MemoryOutput::new();
        player.bind(&seq).unwrap();
        player.start().unwrap();
        clock.advance(1.0);
        player.pump(&mut output).unwrap();

        assert_eq!(
            output.messages(),
            vec![vec![0x90, 60, 64], vec![0x80, 60, 0]]
        );
        assert_eq!(player.pending(), 0);
    }

    #[test]
    fn test_stop_after_sequence_dropped() {
        let (_clock, mut player) = manual_player();
        let seq = Sequence::new();
        player.bind(&seq).unwrap();
        player.start().unwrap();
        drop(seq);

        assert!(matches!(player.stop(), Err(Error::StaleHandle(_))));
        assert!(!player.is_playing());
        assert!(matches!(player.stop(), Err(Error::StaleHandle(_))));
    }

    #[test]
    fn test_all_notes_off() {
        let (clock, mut player) = manual_player();
        let seq = Sequence::new();
        let track = seq.new_track();
        track.add_note(0.0, NoteMessage::new(60).with_duration(8.0)).unwrap();

        let mut output = MemoryOutput::new();
        player.bind(&seq).unwrap();
        player.start().unwrap();
        clock.advance(0.1);
        player.pump(&mut output).unwrap();
        assert_eq!(player.pending(), 1);
        output.clear();

        assert_eq!(player.all_notes_off(&mut output).unwrap(), 16);
        assert_eq!(player.pending(), 0);
        let messages = output.messages();
        assert_eq!(messages.len(), 16);
        assert_eq!(messages[0], vec![0xB0, 123, 0]);
        assert_eq!(messages[15], vec![0xBF, 123, 0]);

        // Nothing left to release on stop
        player.stop().unwrap();
        assert_eq!(player.pump(&mut output).unwrap(), 0);
    }

    #[test]
    fn test_release_is_idempotent() {
        let (_clock, mut player) = manual_player();
        let seq = Sequence::new();
        player.bind(&seq).unwrap();
        player.start().unwrap();

        player.release();
        assert!(player.is_released());
        assert!(!player.is_playing());
        player.release();
        assert!(matches!(player.start(), Err(Error::InvalidOperation(_))));
        assert_eq!(player.state(), PlayerState::Unbound);
    }
}
