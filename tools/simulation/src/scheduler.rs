//! Event scheduler with a phase-ordered integer time key
//!
//! One simulation cycle runs three phases: every agent submits orders,
//! then markets match and clear, then settlement moves actual cash and
//! shares. The time key is a composite of integers, so ordering is exact
//! at any cycle count; no fractional offsets, no precision loss. Within a
//! phase, events run in insertion order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The three phases of one simulation cycle, in execution order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Phase {
    SubmitOrders,
    MatchAndClear,
    Settle,
}

/// Totally ordered event key: cycle, then phase, then insertion sequence.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TimeKey {
    pub cycle: u64,
    pub phase: Phase,
    pub seq: u64,
}

/// Single-threaded cooperative event queue. Exactly one event executes at
/// a time; "suspension" is scheduling a future event, never yielding
/// mid-function.
#[derive(Debug, Default)]
pub struct Scheduler<E> {
    queue: BTreeMap<TimeKey, E>,
    next_seq: u64,
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            queue: BTreeMap::new(),
            next_seq: 0,
        }
    }

    /// Enqueue an event for a cycle and phase. Events scheduled for the
    /// same (cycle, phase) run in the order they were scheduled.
    pub fn schedule(&mut self, cycle: u64, phase: Phase, event: E) -> TimeKey {
        let key = TimeKey {
            cycle,
            phase,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.queue.insert(key, event);
        key
    }

    /// Remove and return the earliest pending event.
    pub fn pop(&mut self) -> Option<(TimeKey, E)> {
        self.queue.pop_first()
    }

    pub fn peek(&self) -> Option<&TimeKey> {
        self.queue.keys().next()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
