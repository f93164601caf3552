// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Dispatch queue for timed MIDI messages.
//!
//! A min-heap keyed on sequence time. Note-offs sort ahead of other
//! messages at the same time, then messages keep scheduling order. A note's
//! own note-off never sorts ahead of its note-on.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A scheduled MIDI message
#[derive(Debug, Clone)]
pub struct ScheduledMessage {
    /// Sequence time the message is due
    pub time: f64,
    /// Raw MIDI bytes
    pub data: Vec<u8>,
    note_off: bool,
    order: u64,
}

impl ScheduledMessage {
    fn key(&self) -> (f64, bool, u64) {
        (self.time, !self.note_off, self.order)
    }
}

// For BinaryHeap - we want minimum time first
impl Eq for ScheduledMessage {}

impl PartialEq for ScheduledMessage {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Ord for ScheduledMessage {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a_time, a_rank, a_order) = self.key();
        let (b_time, b_rank, b_order) = other.key();
        // Reverse ordering for min-heap behavior
        b_time
            .total_cmp(&a_time)
            .then(b_rank.cmp(&a_rank))
            .then(b_order.cmp(&a_order))
    }
}

impl PartialOrd for ScheduledMessage {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Pending messages ordered by due time
#[derive(Debug, Default)]
pub struct Scheduler {
    queue: BinaryHeap<ScheduledMessage>,
    next_order: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, time: f64, data: Vec<u8>, note_off: bool) {
        let order = self.next_order;
        self.next_order += 1;
        self.queue.push(ScheduledMessage {
            time,
            data,
            note_off,
            order,
        });
    }

    /// Schedule a message
    pub fn schedule(&mut self, time: f64, data: Vec<u8>) {
        self.push(time, data, false);
    }

    /// Schedule a note-off
    pub fn schedule_note_off(&mut self, time: f64, data: Vec<u8>) {
        self.push(time, data, true);
    }

    /// Schedule a note-on and its note-off.
    ///
    /// A note-off at or before the note-on time is queued as an ordinary
    /// message right behind it, so a zero-length note still ends.
    pub fn schedule_note(&mut self, on_time: f64, on: Vec<u8>, off_time: f64, off: Vec<u8>) {
        self.schedule(on_time, on);
        if off_time > on_time {
            self.schedule_note_off(off_time, off);
        } else {
            self.schedule(on_time, off);
        }
    }

    /// Next message due strictly before `time`
    pub fn pop_due(&mut self, time: f64) -> Option<ScheduledMessage> {
        if self.queue.peek()?.time < time {
            self.queue.pop()
        } else {
            None
        }
    }

    /// Next message regardless of time
    pub fn pop_next(&mut self) -> Option<ScheduledMessage> {
        self.queue.pop()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_time_first() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(2.0, vec![2]);
        scheduler.schedule(0.5, vec![0]);
        scheduler.schedule(1.0, vec![1]);

        let order: Vec<u8> = std::iter::from_fn(|| scheduler.pop_next())
            .map(|m| m.data[0])
            .collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_note_off_first_on_ties() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(1.0, vec![0x90, 64, 64]);
        scheduler.schedule_note_off(1.0, vec![0x80, 60, 0]);
        scheduler.schedule(1.0, vec![0xB0, 7, 100]);

        assert_eq!(scheduler.pop_next().unwrap().data[0], 0x80);
        assert_eq!(scheduler.pop_next().unwrap().data[0], 0x90);
        assert_eq!(scheduler.pop_next().unwrap().data[0], 0xB0);
    }

    #[test]
    fn test_pop_due_is_exclusive() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(1.0, vec![1]);
        scheduler.schedule(2.0, vec![2]);

        assert!(scheduler.pop_due(1.0).is_none());
        assert_eq!(scheduler.pop_due(1.5).unwrap().time, 1.0);
        assert!(scheduler.pop_due(1.5).is_none());
        assert_eq!(scheduler.len(), 1);

        scheduler.clear();
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_zero_length_note_ends_after_start() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_note(1.0, vec![0x90, 60, 64], 1.0, vec![0x80, 60, 0]);
        // Another note ending here still goes first
        scheduler.schedule_note_off(1.0, vec![0x80, 48, 0]);

        let order: Vec<Vec<u8>> = std::iter::from_fn(|| scheduler.pop_next())
            .map(|m| m.data)
            .collect();
        assert_eq!(
            order,
            vec![vec![0x80, 48, 0], vec![0x90, 60, 64], vec![0x80, 60, 0]]
        );
    }

    #[test]
    fn test_note_pair_with_duration() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_note(0.0, vec![0x90, 60, 64], 2.0, vec![0x80, 60, 0]);
        scheduler.schedule(2.0, vec![0x90, 62, 64]);

        assert_eq!(scheduler.pop_due(1.0).unwrap().data[0], 0x90);
        assert!(scheduler.pop_due(1.0).is_none());
        assert_eq!(scheduler.pop_next().unwrap().data, vec![0x80, 60, 0]);
        assert_eq!(scheduler.pop_next().unwrap().data, vec![0x90, 62, 64]);
    }
}
