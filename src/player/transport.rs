// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Playback transport.
//!
//! The transport owns playback time: elapsed seconds since the start of the
//! sequence, advancing at `rate` times wall-clock speed while playing.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use crate::error::Result;

/// Monotonic time source in seconds
pub trait Clock {
    fn now(&self) -> f64;
}

/// Wall clock based on [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Hand-driven clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward by `seconds`
    pub fn advance(&self, seconds: f64) {
        self.now.set(self.now.get() + seconds);
    }

    pub fn set(&self, seconds: f64) {
        self.now.set(seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}

/// Playback engine behind a player
pub trait Transport {
    fn start(&mut self) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
    /// Playback position in seconds
    fn time(&self) -> Result<f64>;
    fn set_time(&mut self, seconds: f64) -> Result<()>;
    fn rate(&self) -> f64;
    fn set_rate(&mut self, rate: f64) -> Result<()>;
    fn is_playing(&self) -> bool;
}

/// Transport driven by a [`Clock`]
pub struct ClockTransport {
    clock: Box<dyn Clock>,
    playing: bool,
    rate: f64,
    /// Clock reading when position was last anchored
    anchor_clock: f64,
    /// Position at the anchor
    anchor_time: f64,
}

impl ClockTransport {
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self {
            clock: Box::new(clock),
            playing: false,
            rate: 1.0,
            anchor_clock: 0.0,
            anchor_time: 0.0,
        }
    }

    fn position(&self) -> f64 {
        if self.playing {
            self.anchor_time + (self.clock.now() - self.anchor_clock) * self.rate
        } else {
            self.anchor_time
        }
    }

    fn reanchor(&mut self, time: f64) {
        self.anchor_time = time;
        self.anchor_clock = self.clock.now();
    }
}

impl Default for ClockTransport {
    fn default() -> Self {
        Self::new(SystemClock::new())
    }
}

impl Transport for ClockTransport {
    fn start(&mut self) -> Result<()> {
        if !self.playing {
            let time = self.anchor_time;
            self.reanchor(time);
            self.playing = true;
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if self.playing {
            let time = self.position();
            self.playing = false;
            self.reanchor(time);
        }
        Ok(())
    }

    fn time(&self) -> Result<f64> {
        Ok(self.position())
    }

    fn set_time(&mut self, seconds: f64) -> Result<()> {
        self.reanchor(seconds);
        Ok(())
    }

    fn rate(&self) -> f64 {
        self.rate
    }

    fn set_rate(&mut self, rate: f64) -> Result<()> {
        let time = self.position();
        self.reanchor(time);
        self.rate = rate;
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> (ManualClock, ClockTransport) {
        let clock = ManualClock::new();
        let transport = ClockTransport::new(clock.clone());
        (clock, transport)
    }

    #[test]
    fn test_stopped_time_is_frozen() {
        let (clock, transport) = transport();
        clock.advance(5.0);
        assert_eq!(transport.time().unwrap(), 0.0);
        assert!(!transport.is_playing());
    }

    #[test]
    fn test_start_stop() {
        let (clock, mut transport) = transport();
        clock.advance(1.0);
        transport.start().unwrap();
        clock.advance(2.0);
        assert_eq!(transport.time().unwrap(), 2.0);

        transport.stop().unwrap();
        clock.advance(3.0);
        assert_eq!(transport.time().unwrap(), 2.0);

        // Resume from where it stopped
        transport.start().unwrap();
        clock.advance(1.0);
        assert_eq!(transport.time().unwrap(), 3.0);
    }

    #[test]
    fn test_rate_scales_time() {
        let (clock, mut transport) = transport();
        transport.start().unwrap();
        clock.advance(1.0);
        transport.set_rate(2.0).unwrap();
        clock.advance(1.0);
        assert_eq!(transport.time().unwrap(), 3.0);
        assert_eq!(transport.rate(), 2.0);
    }

    #[test]
    fn test_set_time_while_playing() {
        let (clock, mut transport) = transport();
        transport.start().unwrap();
        clock.advance(4.0);
        transport.set_time(1.0).unwrap();
        assert_eq!(transport.time().unwrap(), 1.0);
        clock.advance(0.5);
        assert_eq!(transport.time().unwrap(), 1.5);
    }

    #[test]
    fn test_system_clock_advances() {
        let clock = SystemClock::new();
        let first = clock.now();
        assert!(clock.now() >= first);
    }
}
