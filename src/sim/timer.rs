//! Cancellable one-shot timers on a host-driven clock
//!
//! Payloads are plain data. The queue never runs callbacks itself: the owner
//! pops due entries and decides what to do with them.

use serde::{Deserialize, Serialize};

/// Handle returned by [`TimerQueue::schedule`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Scheduled<T> {
    id: TimerId,
    due_ms: u64,
    payload: T,
}

/// Pending timers, fired in due-time order (ties in scheduling order)
#[derive(Debug, Clone)]
pub struct TimerQueue<T> {
    next_id: u64,
    pending: Vec<Scheduled<T>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            pending: Vec::new(),
        }
    }

    pub fn schedule(&mut self, due_ms: u64, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push(Scheduled {
            id,
            due_ms,
            payload,
        });
        id
    }

    /// Returns false if the timer already fired or was cancelled
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|s| s.id != id);
        self.pending.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Earliest due time, if anything is pending
    pub fn next_due(&self) -> Option<u64> {
        self.pending.iter().map(|s| s.due_ms).min()
    }

    /// Remove and return the earliest timer due at or before `now_ms`
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(u64, T)> {
        let index = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, s)| s.due_ms <= now_ms)
            .min_by_key(|(_, s)| (s.due_ms, s.id.0))
            .map(|(i, _)| i)?;
        let fired = self.pending.remove(index);
        Some((fired.due_ms, fired.payload))
    }
}

/// What a driver timer does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerKind {
    /// Flip unresolved decoys to safe
    SafeFlip,
    /// Evaluate misses and start the next beat
    BeatEnd,
}

/// Driver timer payload, stamped with the cycle that scheduled it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerEvent {
    pub cycle: u64,
    pub kind: TimerKind,
}
