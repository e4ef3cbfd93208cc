// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rotate: two contacts turning around each other.
//!
//! The first two live contacts are designated. Each move measures how far the
//! line through them turned since the previous move. The rotation begins once
//! the accumulated angle exceeds the threshold, and from then on reports the
//! total angle since the stream started along with an angular velocity.

use core::f64::consts::{PI, TAU};

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::Point;
use log::debug;

use crate::recognizer::{Core, Cx, Gesture, Machine, Recognizer};
use crate::scheduler::TimerKind;
use crate::types::{Details, GestureKind, PointerEvent, PointerId, PointerPhase, State};

/// Configuration of a rotate recognizer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RotateConfig {
    /// Angle in radians the contacts must turn before the rotation begins.
    pub rotation_threshold: f64,
}

impl Default for RotateConfig {
    fn default() -> Self {
        Self {
            rotation_threshold: 0.008,
        }
    }
}

/// Wrap an angle in degrees into `[-180, 180]`.
///
/// ```
/// use understory_gestures::recognizers::normalize_degrees;
///
/// assert_eq!(normalize_degrees(270.0), -90.0);
/// assert_eq!(normalize_degrees(-190.0), 170.0);
/// assert_eq!(normalize_degrees(45.0), 45.0);
/// ```
pub fn normalize_degrees(degrees: f64) -> f64 {
    let mut angle = degrees % 360.0;
    if angle < -180.0 {
        angle += 360.0;
    }
    if angle > 180.0 {
        angle -= 360.0;
    }
    angle
}

/// Wrap an angle in radians into `(-PI, PI]`.
fn normalize_radians(mut angle: f64) -> f64 {
    angle %= TAU;
    if angle <= -PI {
        angle += TAU;
    }
    if angle > PI {
        angle -= TAU;
    }
    angle
}

impl Recognizer {
    /// A rotate recognizer.
    pub fn rotate(config: RotateConfig) -> Self {
        Self::from_gesture(GestureKind::Rotate, Gesture::Rotate(Rotate::new(config)))
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Rotate {
    config: RotateConfig,
    pair: Option<(PointerId, PointerId)>,
    previous: (Point, Point),
    previous_time: u64,
    /// Turned so far this stream.
    rotation: f64,
    velocity: f64,
}

impl Rotate {
    fn new(config: RotateConfig) -> Self {
        Self {
            config,
            pair: None,
            previous: (Point::ZERO, Point::ZERO),
            previous_time: 0,
            rotation: 0.0,
            velocity: 0.0,
        }
    }

    /// Designate the first two live contacts and remember where they are.
    fn designate(&mut self, core: &Core, event: &PointerEvent) {
        let mut live = core.pointers.positions(event);
        self.pair = match (live.next(), live.next()) {
            (Some((a, pa)), Some((b, pb))) => {
                self.previous = (pa, pb);
                Some((a, b))
            }
            _ => None,
        };
        self.previous_time = event.timestamp;
    }

    fn on_move(&mut self, core: &mut Core, cx: &mut Cx<'_>, event: &PointerEvent) {
        let Some((a, b)) = self.pair else {
            return;
        };
        let (Some(pa), Some(pb)) = (event.position_of(a), event.position_of(b)) else {
            return;
        };
        let before = self.previous.1 - self.previous.0;
        let after = pb - pa;
        let delta = normalize_radians(after.atan2() - before.atan2());
        let elapsed = event.timestamp.saturating_sub(self.previous_time);
        self.previous = (pa, pb);
        self.previous_time = event.timestamp;
        if delta == 0.0 {
            return;
        }
        self.rotation += delta;
        self.velocity = if elapsed > 0 {
            delta / elapsed as f64 * 1000.0
        } else {
            0.0
        };

        match core.state {
            State::Possible => {
                if self.rotation.abs() > self.config.rotation_threshold {
                    // Blocked stays `Possible` and retries on the next move.
                    core.try_begin(cx, self.details());
                }
            }
            State::Began | State::Changed => {
                if core.began_firing {
                    core.set_state(State::Changed);
                    core.fire(self.details());
                }
            }
            _ => {}
        }
    }

    fn end(&mut self, core: &mut Core, cx: &mut Cx<'_>) {
        match core.state {
            State::Possible => core.set_state(State::Failed),
            State::Began | State::Changed => {
                cx.awaiting = false;
                self.velocity = 0.0;
                core.set_state(State::Ended);
                core.fire_if_began(self.details());
            }
            _ => {}
        }
    }
}

impl Machine for Rotate {
    fn on_pointer(&mut self, core: &mut Core, cx: &mut Cx<'_>, event: &PointerEvent) {
        match event.phase {
            PointerPhase::Down => {
                cx.cancel(TimerKind::Reset);
                if core.state.is_terminal() {
                    core.set_state(State::Possible);
                }
                core.began_firing = false;
                self.pair = None;
                self.rotation = 0.0;
                self.velocity = 0.0;
            }
            PointerPhase::PointerDown => {
                if self.pair.is_none() && core.state != State::Failed {
                    self.designate(core, event);
                }
            }
            PointerPhase::PointerUp => {
                let lifted = event.action_pointer().map(|p| p.id);
                let Some((a, b)) = self.pair else {
                    return;
                };
                if lifted != Some(a) && lifted != Some(b) {
                    return;
                }
                if core.touches() >= 2 {
                    debug!("rotate: re-designating after {lifted:?} lifted");
                    self.designate(core, event);
                } else {
                    self.pair = None;
                    self.end(core, cx);
                }
            }
            PointerPhase::Move => self.on_move(core, cx, event),
            PointerPhase::Up => {
                self.pair = None;
                self.end(core, cx);
                cx.schedule_in(TimerKind::Reset, 0);
            }
            PointerPhase::Cancel => {
                self.pair = None;
                cx.awaiting = false;
                if matches!(core.state, State::Possible | State::Began | State::Changed) {
                    core.set_state(State::Cancelled);
                }
                core.began_firing = false;
                cx.schedule_in(TimerKind::Reset, 0);
            }
        }
    }

    fn on_timer(&mut self, core: &mut Core, _cx: &mut Cx<'_>, kind: TimerKind) {
        if kind == TimerKind::Reset {
            if core.state.is_terminal() {
                core.set_state(State::Possible);
            }
            core.began_firing = false;
        }
    }

    fn on_dependency(&mut self, core: &mut Core, cx: &mut Cx<'_>, target: State) {
        if core.settle_dependency(cx, self.details(), target) == Some(false) {
            core.began_firing = false;
        }
    }

    fn details(&self) -> Details {
        Details::Rotate {
            rotation: self.rotation,
            velocity: self.velocity,
        }
    }

    fn reset(&mut self) {
        *self = Self::new(self.config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Dispatcher;
    use crate::recognizers::testing::{all_legal, attach, state_of};
    use crate::stream::PointerStream;
    use alloc::vec;

    /// Point on a circle of radius 100 around (200, 200).
    fn on_circle(radians: f64) -> Point {
        Point::new(200.0 + 100.0 * radians.cos(), 200.0 + 100.0 * radians.sin())
    }

    fn turn(s: &mut PointerStream, radians: f64, t: u64) -> PointerEvent {
        s.move_all(&[(0, on_circle(radians + PI)), (1, on_circle(radians))], t)
    }

    fn rotation_of(details: Details) -> f64 {
        match details {
            Details::Rotate { rotation, .. } => rotation,
            other => panic!("unexpected details {other:?}"),
        }
    }

    #[test]
    fn wraps_radians_into_half_open_range() {
        assert!((normalize_radians(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-12);
        assert!((normalize_radians(-PI) - PI).abs() < 1e-12);
        assert_eq!(normalize_radians(0.25), 0.25);
    }

    #[test]
    fn wraps_degrees() {
        assert_eq!(normalize_degrees(540.0), 180.0);
        assert_eq!(normalize_degrees(-540.0), -180.0);
        assert_eq!(normalize_degrees(-45.0), -45.0);
    }

    #[test]
    fn turning_two_fingers_rotates() {
        let mut d = Dispatcher::new();
        let (id, log) = attach(&mut d, Recognizer::rotate(RotateConfig::default()));
        let mut s = PointerStream::new();
        d.process(&s.down(0, on_circle(PI), 0));
        d.process(&s.down(1, on_circle(0.0), 0));
        d.process(&turn(&mut s, 0.005, 10));
        assert_eq!(state_of(&d, id), Some(State::Possible));
        d.process(&turn(&mut s, 0.1, 20));
        assert_eq!(state_of(&d, id), Some(State::Began));
        d.process(&turn(&mut s, 0.3, 30));
        d.process(&s.up(1, 40));
        d.process(&s.up(0, 50));
        assert!(all_legal(&log));

        let log = log.borrow();
        assert_eq!(
            log.fired_states(),
            vec![State::Began, State::Changed, State::Ended]
        );
        assert!((rotation_of(log.fired[1].1) - 0.3).abs() < 1e-9);
        match log.fired[1].1 {
            Details::Rotate { velocity, .. } => assert!((velocity - 20.0).abs() < 1e-6),
            other => panic!("unexpected details {other:?}"),
        }
    }

    #[test]
    fn counter_clockwise_is_negative() {
        let mut d = Dispatcher::new();
        let (_, log) = attach(&mut d, Recognizer::rotate(RotateConfig::default()));
        let mut s = PointerStream::new();
        d.process(&s.down(0, on_circle(PI), 0));
        d.process(&s.down(1, on_circle(0.0), 0));
        d.process(&turn(&mut s, -0.2, 10));
        let log = log.borrow();
        assert!(rotation_of(log.fired[0].1) < -0.19);
    }

    #[test]
    fn lifting_a_finger_before_turning_fails() {
        let mut d = Dispatcher::new();
        let (id, log) = attach(&mut d, Recognizer::rotate(RotateConfig::default()));
        let mut s = PointerStream::new();
        d.process(&s.down(0, on_circle(PI), 0));
        d.process(&s.down(1, on_circle(0.0), 0));
        d.process(&s.up(1, 10));
        assert_eq!(state_of(&d, id), Some(State::Failed));
        d.process(&s.up(0, 20));
        assert!(log.borrow().fired.is_empty());
        d.advance(20);
        assert_eq!(state_of(&d, id), Some(State::Possible));
    }

    #[test]
    fn third_finger_takes_over_a_lifted_one() {
        let mut d = Dispatcher::new();
        let (id, _) = attach(&mut d, Recognizer::rotate(RotateConfig::default()));
        let mut s = PointerStream::new();
        d.process(&s.down(0, on_circle(PI), 0));
        d.process(&s.down(1, on_circle(0.0), 0));
        d.process(&turn(&mut s, 0.1, 10));
        d.process(&s.down(2, on_circle(PI / 2.0), 20));
        d.process(&s.up(1, 30));
        assert_eq!(state_of(&d, id), Some(State::Began));
        // 0 and 2 are now the pair; swing 2 further round.
        d.process(&s.move_to(2, on_circle(PI / 2.0 + 0.2), 40));
        assert_eq!(state_of(&d, id), Some(State::Changed));
    }

    #[test]
    fn single_finger_never_rotates() {
        let mut d = Dispatcher::new();
        let (id, _) = attach(&mut d, Recognizer::rotate(RotateConfig::default()));
        let mut s = PointerStream::new();
        d.process(&s.down(0, on_circle(0.0), 0));
        d.process(&s.move_to(0, on_circle(1.0), 10));
        assert_eq!(state_of(&d, id), Some(State::Possible));
        d.process(&s.up(0, 20));
        assert_eq!(state_of(&d, id), Some(State::Failed));
    }
}
