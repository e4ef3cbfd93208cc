// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deferred actions keyed by recognizer and purpose.
//!
//! ## Overview
//!
//! Recognizers never own timers. They ask the dispatcher to run a named
//! action ([`TimerKind`]) at a deadline; the dispatcher stores the request in
//! a [`Scheduler`] and fires due entries from
//! [`Dispatcher::advance`](crate::dispatcher::Dispatcher::advance) and before
//! each processed event. Everything runs on the caller's thread, in deadline
//! order, so deferred actions interleave with pointer events deterministically.
//!
//! ## Semantics
//!
//! - At most one entry exists per [`TimerKey`]; scheduling again supersedes it.
//! - Entries with equal deadlines fire in the order they were scheduled.
//! - Cancelling is idempotent, and firing a stale action is harmless because
//!   recognizers re-check their state when it runs.

use alloc::vec::Vec;

use crate::types::RecognizerId;

/// Purpose of a deferred action.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum TimerKind {
    /// Return to `Possible` after a completed gesture.
    Reset,
    /// Give up waiting for the next tap or for the gesture to qualify.
    Failed,
    /// The press has been held long enough.
    LongPress,
    /// A lifted finger stops counting toward the touch count.
    PointerUp,
}

/// Key of a deferred action: who asked and for what.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TimerKey {
    /// Recognizer the action belongs to.
    pub owner: RecognizerId,
    /// Purpose of the action.
    pub kind: TimerKind,
}

impl TimerKey {
    /// Create a key.
    pub const fn new(owner: RecognizerId, kind: TimerKind) -> Self {
        Self { owner, kind }
    }
}

/// Storage for deferred actions.
///
/// Implement this to back deferred actions with a host run loop; the default
/// [`TimerQueue`] is a plain in-memory queue driven by a simulated clock.
pub trait Scheduler {
    /// Schedule `key` at `deadline` (milliseconds), replacing any pending entry for `key`.
    fn schedule(&mut self, key: TimerKey, deadline: u64);
    /// Drop the pending entry for `key`, if any.
    fn cancel(&mut self, key: TimerKey);
    /// Drop every pending entry owned by `owner`.
    fn cancel_owner(&mut self, owner: RecognizerId);
    /// Earliest pending deadline.
    fn next_deadline(&self) -> Option<u64>;
    /// Remove and return the earliest entry due at or before `now`.
    fn pop_due(&mut self, now: u64) -> Option<(u64, TimerKey)>;
}

#[derive(Copy, Clone, Debug)]
struct Pending {
    deadline: u64,
    seq: u64,
    key: TimerKey,
}

/// In-memory [`Scheduler`].
///
/// Holds a handful of entries per recognizer at most, so a flat vector with
/// linear scans beats a heap that would still need keyed removal.
#[derive(Clone, Debug, Default)]
pub struct TimerQueue {
    pending: Vec<Pending>,
    seq: u64,
}

impl TimerQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending entries.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Deadline of the pending entry for `key`.
    pub fn deadline_of(&self, key: TimerKey) -> Option<u64> {
        self.pending
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.deadline)
    }

    fn earliest(&self) -> Option<usize> {
        self.pending
            .iter()
            .enumerate()
            .min_by_key(|(_, p)| (p.deadline, p.seq))
            .map(|(i, _)| i)
    }
}

impl Scheduler for TimerQueue {
    fn schedule(&mut self, key: TimerKey, deadline: u64) {
        self.cancel(key);
        self.seq += 1;
        self.pending.push(Pending {
            deadline,
            seq: self.seq,
            key,
        });
    }

    fn cancel(&mut self, key: TimerKey) {
        self.pending.retain(|p| p.key != key);
    }

    fn cancel_owner(&mut self, owner: RecognizerId) {
        self.pending.retain(|p| p.key.owner != owner);
    }

    fn next_deadline(&self) -> Option<u64> {
        self.earliest().map(|i| self.pending[i].deadline)
    }

    fn pop_due(&mut self, now: u64) -> Option<(u64, TimerKey)> {
        let i = self.earliest()?;
        if self.pending[i].deadline > now {
            return None;
        }
        let p = self.pending.swap_remove(i);
        Some((p.deadline, p.key))
    }
}
