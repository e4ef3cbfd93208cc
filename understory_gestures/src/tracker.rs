// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-recognizer pointer bookkeeping: live contacts, centroid, and down history.

use alloc::vec::Vec;
use kurbo::{Point, Vec2};

use crate::types::{PointerEvent, PointerId, PointerPhase};

/// Live contacts seen by one recognizer and the values derived from them.
///
/// Only ids announced by `Down`/`PointerDown` are live; anything else in an
/// event is ignored. `touches` and `location` exclude a contact that is being
/// lifted by `PointerUp`.
#[derive(Clone, Debug, Default)]
pub(crate) struct PointerTracker {
    live: Vec<PointerId>,
    touches: usize,
    location: Point,
    down_location: Point,
    previous_down_location: Point,
}

impl PointerTracker {
    pub(crate) fn update(&mut self, event: &PointerEvent) {
        let action = event.action_pointer().copied();
        match event.phase {
            PointerPhase::Down => {
                self.live.clear();
                if let Some(p) = action {
                    self.live.push(p.id);
                    self.previous_down_location = self.down_location;
                    self.down_location = p.position;
                }
            }
            PointerPhase::PointerDown => {
                if let Some(p) = action {
                    if !self.live.contains(&p.id) {
                        self.live.push(p.id);
                    }
                }
            }
            _ => {}
        }

        let lifting = match event.phase {
            PointerPhase::PointerUp => action.map(|p| p.id),
            _ => None,
        };
        let mut sum = Vec2::ZERO;
        let mut n = 0_usize;
        for p in &event.pointers {
            if Some(p.id) != lifting && self.live.contains(&p.id) {
                sum += p.position.to_vec2();
                n += 1;
            }
        }
        self.touches = n;
        if n > 0 {
            self.location = (sum / n as f64).to_point();
        }

        match event.phase {
            PointerPhase::PointerUp | PointerPhase::Up => {
                if let Some(p) = action {
                    self.live.retain(|id| *id != p.id);
                }
            }
            PointerPhase::Cancel => self.live.clear(),
            _ => {}
        }
    }

    pub(crate) fn touches(&self) -> usize {
        self.touches
    }

    pub(crate) fn location(&self) -> Point {
        self.location
    }

    pub(crate) fn down_location(&self) -> Point {
        self.down_location
    }

    pub(crate) fn previous_down_location(&self) -> Point {
        self.previous_down_location
    }

    pub(crate) fn is_live(&self, id: PointerId) -> bool {
        self.live.contains(&id)
    }

    /// Live ids in the order they touched down.
    pub(crate) fn live(&self) -> &[PointerId] {
        &self.live
    }

    /// The contact velocities are reported for: the oldest live one, or the
    /// contact that just lifted when none remain.
    pub(crate) fn primary(&self, event: &PointerEvent) -> Option<PointerId> {
        self.live
            .first()
            .copied()
            .or_else(|| event.action_pointer().map(|p| p.id))
    }

    /// Positions of live contacts in `event`, skipping one being lifted.
    pub(crate) fn positions<'a>(
        &'a self,
        event: &'a PointerEvent,
    ) -> impl Iterator<Item = (PointerId, Point)> + 'a {
        let lifting = match event.phase {
            PointerPhase::PointerUp | PointerPhase::Up => event.action_pointer().map(|p| p.id),
            _ => None,
        };
        event
            .pointers
            .iter()
            .filter(move |p| Some(p.id) != lifting && (self.live.contains(&p.id)))
            .map(|p| (p.id, p.position))
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}
