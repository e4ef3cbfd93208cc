// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Build well-formed pointer event sequences.
//!
//! [`PointerStream`] remembers which contacts are down so callers only say
//! what happens to one contact at a time. It picks `Down` vs `PointerDown`
//! and `Up` vs `PointerUp`, fills in the action index, and carries the
//! stream's down timestamp. Handy for tests, benchmarks, and replaying
//! recorded input.
//!
//! ```
//! use kurbo::Point;
//! use understory_gestures::stream::PointerStream;
//! use understory_gestures::types::PointerPhase;
//!
//! let mut s = PointerStream::new();
//! assert_eq!(s.down(0, Point::new(10.0, 10.0), 0).phase, PointerPhase::Down);
//! assert_eq!(s.down(1, Point::new(50.0, 10.0), 5).phase, PointerPhase::PointerDown);
//! assert_eq!(s.up(1, 20).phase, PointerPhase::PointerUp);
//! assert_eq!(s.up(0, 30).phase, PointerPhase::Up);
//! assert!(s.is_empty());
//! ```

use alloc::vec::Vec;
use kurbo::Point;

use crate::types::{Pointer, PointerEvent, PointerId, PointerPhase};

/// Stateful builder of [`PointerEvent`]s.
#[derive(Clone, Debug, Default)]
pub struct PointerStream {
    pointers: Vec<Pointer>,
    down_timestamp: u64,
}

impl PointerStream {
    /// Create a stream with no contacts down.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no contact is down.
    pub fn is_empty(&self) -> bool {
        self.pointers.is_empty()
    }

    /// Contacts currently down.
    pub fn pointers(&self) -> &[Pointer] {
        &self.pointers
    }

    fn event(&self, phase: PointerPhase, action_index: usize, timestamp: u64) -> PointerEvent {
        PointerEvent::new(phase, self.pointers.clone(), timestamp)
            .with_action_index(action_index)
            .with_down_timestamp(self.down_timestamp)
    }

    /// Put contact `id` down at `at`.
    ///
    /// If `id` is already down this moves it instead.
    pub fn down(&mut self, id: u32, at: Point, timestamp: u64) -> PointerEvent {
        let id = PointerId(id);
        if let Some(i) = self.pointers.iter().position(|p| p.id == id) {
            self.pointers[i].position = at;
            return self.event(PointerPhase::Move, i, timestamp);
        }
        let phase = if self.pointers.is_empty() {
            self.down_timestamp = timestamp;
            PointerPhase::Down
        } else {
            PointerPhase::PointerDown
        };
        self.pointers.push(Pointer::new(id, at));
        self.event(phase, self.pointers.len() - 1, timestamp)
    }

    /// Move contact `id` to `at`. Unknown ids produce a move of the others.
    pub fn move_to(&mut self, id: u32, at: Point, timestamp: u64) -> PointerEvent {
        self.move_all(&[(id, at)], timestamp)
    }

    /// Move several contacts in one event.
    pub fn move_all(&mut self, positions: &[(u32, Point)], timestamp: u64) -> PointerEvent {
        let mut action = 0;
        for &(id, at) in positions {
            if let Some(i) = self.pointers.iter().position(|p| p.id == PointerId(id)) {
                self.pointers[i].position = at;
                action = i;
            }
        }
        self.event(PointerPhase::Move, action, timestamp)
    }

    /// Lift contact `id`. Unknown ids produce a plain move.
    pub fn up(&mut self, id: u32, timestamp: u64) -> PointerEvent {
        let Some(i) = self.pointers.iter().position(|p| p.id == PointerId(id)) else {
            return self.event(PointerPhase::Move, 0, timestamp);
        };
        let phase = if self.pointers.len() == 1 {
            PointerPhase::Up
        } else {
            PointerPhase::PointerUp
        };
        let ev = self.event(phase, i, timestamp);
        self.pointers.remove(i);
        ev
    }

    /// Abort the stream; every contact is released.
    pub fn cancel(&mut self, timestamp: u64) -> PointerEvent {
        let ev = self.event(PointerPhase::Cancel, 0, timestamp);
        self.pointers.clear();
        ev
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streams_share_down_timestamp() {
        let mut s = PointerStream::new();
        s.down(0, Point::ZERO, 7);
        let ev = s.down(4, Point::new(1.0, 1.0), 9);
        assert_eq!(ev.down_timestamp, 7);
        assert_eq!(ev.action_index, 1);
        assert_eq!(ev.pointers.len(), 2);
        let ev = s.up(0, 12);
        assert_eq!(ev.phase, PointerPhase::PointerUp);
        assert_eq!(ev.action_index, 0);
        assert_eq!(ev.pointers.len(), 2, "lifting contact is still reported");
        assert_eq!(s.pointers().len(), 1);
    }

    #[test]
    fn cancel_releases_everything() {
        let mut s = PointerStream::new();
        s.down(0, Point::ZERO, 0);
        s.down(1, Point::ZERO, 0);
        let ev = s.cancel(3);
        assert_eq!(ev.phase, PointerPhase::Cancel);
        assert!(s.is_empty());
        // The next contact starts a fresh stream.
        assert_eq!(s.down(2, Point::ZERO, 10).down_timestamp, 10);
    }
}
