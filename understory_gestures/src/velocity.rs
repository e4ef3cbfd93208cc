// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Least-squares velocity estimation per contact.

use alloc::vec::Vec;
use kurbo::{Point, Vec2};

use crate::tracker::PointerTracker;
use crate::types::{PointerEvent, PointerId, PointerPhase};

/// Samples older than this (relative to the newest) do not contribute.
const HORIZON_MS: u64 = 100;
/// A gap this long between samples means the contact stopped.
const ASSUME_STOPPED_MS: u64 = 40;
const HISTORY: usize = 20;

#[derive(Clone, Debug)]
struct Track {
    id: PointerId,
    samples: Vec<(u64, Point)>,
}

/// Velocity of each contact, in pixels per second.
#[derive(Clone, Debug, Default)]
pub(crate) struct VelocityTracker {
    tracks: Vec<Track>,
}

impl VelocityTracker {
    pub(crate) fn clear(&mut self) {
        self.tracks.clear();
    }

    /// Record the positions of the live contacts in `event` (plus the one
    /// lifting, whose last position still counts).
    pub(crate) fn add_movement(&mut self, event: &PointerEvent, pointers: &PointerTracker) {
        let lifting = match event.phase {
            PointerPhase::Up | PointerPhase::PointerUp => event.action_pointer().map(|p| p.id),
            _ => None,
        };
        for p in &event.pointers {
            if !pointers.is_live(p.id) && Some(p.id) != lifting {
                continue;
            }
            let track = match self.tracks.iter().position(|t| t.id == p.id) {
                Some(i) => &mut self.tracks[i],
                None => {
                    self.tracks.push(Track {
                        id: p.id,
                        samples: Vec::new(),
                    });
                    let last = self.tracks.len() - 1;
                    &mut self.tracks[last]
                }
            };
            if let Some(&(t, _)) = track.samples.last() {
                if event.timestamp.saturating_sub(t) > ASSUME_STOPPED_MS {
                    track.samples.clear();
                } else if t == event.timestamp {
                    track.samples.pop();
                }
            }
            track.samples.push((event.timestamp, p.position));
            if track.samples.len() > HISTORY {
                track.samples.remove(0);
            }
        }
    }

    /// Velocity of `id`, each axis clamped to `±max`.
    pub(crate) fn velocity(&self, id: PointerId, max: f64) -> Vec2 {
        let Some(track) = self.tracks.iter().find(|t| t.id == id) else {
            return Vec2::ZERO;
        };
        let Some(&(newest, _)) = track.samples.last() else {
            return Vec2::ZERO;
        };
        let mut n = 0.0;
        let (mut st, mut stt) = (0.0, 0.0);
        let (mut sx, mut stx) = (0.0, 0.0);
        let (mut sy, mut sty) = (0.0, 0.0);
        for &(time, pos) in track.samples.iter().rev() {
            let age = newest - time;
            if age > HORIZON_MS {
                break;
            }
            // Seconds, relative to the newest sample.
            let t = -(age as f64) / 1000.0;
            n += 1.0;
            st += t;
            stt += t * t;
            sx += pos.x;
            stx += t * pos.x;
            sy += pos.y;
            sty += t * pos.y;
        }
        let denom = n * stt - st * st;
        if n < 2.0 || denom == 0.0 {
            return Vec2::ZERO;
        }
        let vx = (n * stx - st * sx) / denom;
        let vy = (n * sty - st * sy) / denom;
        Vec2::new(vx.clamp(-max, max), vy.clamp(-max, max))
    }

    /// Forget history when the contact lifting at `lifted` was moving against
    /// any of the remaining ones.
    pub(crate) fn clear_if_diverging(
        &mut self,
        lifted: PointerId,
        remaining: &[PointerId],
        max: f64,
    ) {
        let v = self.velocity(lifted, max);
        let diverging = remaining
            .iter()
            .filter(|id| **id != lifted)
            .any(|id| v.dot(self.velocity(*id, max)) < 0.0);
        if diverging {
            self.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::PointerStream;

    fn feed(tracker: &mut VelocityTracker, pointers: &mut PointerTracker, ev: &PointerEvent) {
        pointers.update(ev);
        tracker.add_movement(ev, pointers);
    }

    #[test]
    fn constant_motion_gives_constant_velocity() {
        let mut s = PointerStream::new();
        let mut p = PointerTracker::default();
        let mut v = VelocityTracker::default();
        feed(&mut v, &mut p, &s.down(0, Point::new(0.0, 0.0), 0));
        for i in 1..=5_u32 {
            let t = u64::from(i) * 10;
            // 1 px per ms to the right.
            feed(&mut v, &mut p, &s.move_to(0, Point::new(f64::from(i) * 10.0, 0.0), t));
        }
        let vel = v.velocity(PointerId(0), 8000.0);
        assert!((vel.x - 1000.0).abs() < 1e-6, "vx = {}", vel.x);
        assert!(vel.y.abs() < 1e-6, "vy = {}", vel.y);
    }

    #[test]
    fn velocity_is_clamped() {
        let mut s = PointerStream::new();
        let mut p = PointerTracker::default();
        let mut v = VelocityTracker::default();
        feed(&mut v, &mut p, &s.down(0, Point::ZERO, 0));
        feed(&mut v, &mut p, &s.move_to(0, Point::new(0.0, -500.0), 10));
        let vel = v.velocity(PointerId(0), 1000.0);
        assert_eq!(vel.y, -1000.0);
    }

    #[test]
    fn pause_discards_history() {
        let mut s = PointerStream::new();
        let mut p = PointerTracker::default();
        let mut v = VelocityTracker::default();
        feed(&mut v, &mut p, &s.down(0, Point::ZERO, 0));
        feed(&mut v, &mut p, &s.move_to(0, Point::new(50.0, 0.0), 10));
        // Held still for a while, then a single new sample.
        feed(&mut v, &mut p, &s.move_to(0, Point::new(50.0, 0.0), 200));
        assert_eq!(v.velocity(PointerId(0), 8000.0), Vec2::ZERO);
    }

    #[test]
    fn opposite_fingers_clear_history() {
        let mut s = PointerStream::new();
        let mut p = PointerTracker::default();
        let mut v = VelocityTracker::default();
        feed(&mut v, &mut p, &s.down(0, Point::new(100.0, 0.0), 0));
        feed(&mut v, &mut p, &s.down(1, Point::new(200.0, 0.0), 0));
        feed(
            &mut v,
            &mut p,
            &s.move_all(&[(0, Point::new(90.0, 0.0)), (1, Point::new(210.0, 0.0))], 10),
        );
        v.clear_if_diverging(PointerId(1), &[PointerId(0)], 8000.0);
        assert_eq!(v.velocity(PointerId(0), 8000.0), Vec2::ZERO);
    }
}
