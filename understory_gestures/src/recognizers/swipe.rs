// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Swipe: a quick straight flick in one of the allowed directions.
//!
//! A swipe is discrete. It succeeds during the stream, as soon as the focus
//! has travelled `minimum_swipe_distance` along its dominant axis fast enough,
//! within `maximum_touch_fling_time` of the down event. The first motion past
//! the touch slop must come within `maximum_touch_slop_time` and already head
//! in an allowed direction.

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Point, Vec2};
use log::{debug, trace};

use crate::config::TouchConfig;
use crate::recognizer::{Begin, Core, Cx, Gesture, Machine, Recognizer};
use crate::scheduler::TimerKind;
use crate::types::{Details, GestureKind, PointerEvent, PointerPhase, State};
use crate::velocity::VelocityTracker;

bitflags::bitflags! {
    /// Swipe directions, combinable into a mask.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct SwipeDirection: u8 {
        /// Towards increasing `x`.
        const RIGHT = 1 << 1;
        /// Towards decreasing `x`.
        const LEFT = 1 << 2;
        /// Towards decreasing `y`.
        const UP = 1 << 3;
        /// Towards increasing `y`.
        const DOWN = 1 << 4;
    }
}

impl Default for SwipeDirection {
    fn default() -> Self {
        Self::RIGHT
    }
}

/// Configuration of a swipe recognizer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SwipeConfig {
    /// Directions that count.
    pub direction: SwipeDirection,
    /// Exact number of contacts.
    pub touches_required: usize,
    /// Distance the focus must travel before the direction is judged.
    pub touch_slop: f64,
    /// Distance along the dominant axis needed to succeed.
    pub minimum_swipe_distance: f64,
    /// Speed the dominant axis must exceed.
    pub minimum_fling_velocity: f64,
    /// Speed velocities are clamped to.
    pub maximum_fling_velocity: f64,
    /// Time from down within which the slop must be crossed.
    pub maximum_touch_slop_time: u64,
    /// Time from down within which the swipe must complete.
    pub maximum_touch_fling_time: u64,
}

impl SwipeConfig {
    /// Seed from platform metrics.
    pub fn from_touch_config(c: &TouchConfig) -> Self {
        Self {
            direction: SwipeDirection::default(),
            touches_required: 1,
            touch_slop: c.touch_slop,
            minimum_swipe_distance: c.touch_slop * 3.0,
            minimum_fling_velocity: c.minimum_fling_velocity,
            maximum_fling_velocity: c.maximum_fling_velocity,
            maximum_touch_slop_time: 150,
            maximum_touch_fling_time: 300,
        }
    }

    /// Default metrics accepting `direction`.
    pub fn new(direction: SwipeDirection) -> Self {
        Self {
            direction,
            ..Self::default()
        }
    }
}

impl Default for SwipeConfig {
    fn default() -> Self {
        Self::from_touch_config(&TouchConfig::DEFAULT)
    }
}

impl Recognizer {
    /// A swipe recognizer.
    pub fn swipe(config: SwipeConfig) -> Self {
        Self::from_gesture(GestureKind::Swipe, Gesture::Swipe(Swipe::new(config)))
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Swipe {
    config: SwipeConfig,
    down: bool,
    /// Past the slop in an acceptable direction.
    started: bool,
    down_focus: Point,
    /// Where distances are measured from; moves forward while the velocity
    /// estimate is still zero.
    anchor: Point,
    recognized: SwipeDirection,
    translation: Vec2,
    velocity: Vec2,
    tracker: VelocityTracker,
}

impl Swipe {
    fn new(config: SwipeConfig) -> Self {
        Self {
            config,
            down: false,
            started: false,
            down_focus: Point::ZERO,
            anchor: Point::ZERO,
            recognized: SwipeDirection::empty(),
            translation: Vec2::ZERO,
            velocity: Vec2::ZERO,
            tracker: VelocityTracker::default(),
        }
    }

    /// Dominant-axis direction of `d`, if it clears `threshold` and the
    /// velocity on that axis is fast enough.
    fn direction_of(&self, d: Vec2, threshold: f64) -> SwipeDirection {
        let min = self.config.minimum_fling_velocity;
        let v = self.velocity;
        if d.x.abs() > d.y.abs() {
            if d.x.abs() > threshold && v.x.abs() > min {
                return if d.x > 0.0 {
                    SwipeDirection::RIGHT
                } else {
                    SwipeDirection::LEFT
                };
            }
        } else if d.y.abs() > threshold && v.y.abs() > min {
            return if d.y > 0.0 {
                SwipeDirection::DOWN
            } else {
                SwipeDirection::UP
            };
        }
        SwipeDirection::empty()
    }

    fn fail(&mut self, core: &mut Core, cx: &mut Cx<'_>) {
        self.started = false;
        cx.cancel(TimerKind::Failed);
        core.set_state(State::Failed);
    }

    fn on_down(&mut self, core: &mut Core, cx: &mut Cx<'_>, event: &PointerEvent) {
        cx.cancel(TimerKind::Reset);
        self.down = true;
        self.started = false;
        self.down_focus = core.location();
        self.anchor = core.location();
        self.recognized = SwipeDirection::empty();
        self.translation = Vec2::ZERO;
        self.velocity = Vec2::ZERO;
        if core.state.is_terminal() {
            core.set_state(State::Possible);
        }
        core.began_firing = false;
        cx.schedule_at(
            TimerKind::Failed,
            event
                .down_timestamp
                .saturating_add(self.config.maximum_touch_fling_time),
        );
    }

    fn on_move(&mut self, core: &mut Core, cx: &mut Cx<'_>, event: &PointerEvent) {
        if core.state != State::Possible {
            return;
        }
        self.velocity = match core.pointers.primary(event) {
            Some(id) => self
                .tracker
                .velocity(id, self.config.maximum_fling_velocity),
            None => Vec2::ZERO,
        };
        self.translation = core.location() - self.down_focus;
        let elapsed = event.timestamp.saturating_sub(event.down_timestamp);
        let d = core.location() - self.anchor;

        if !self.started {
            if d.hypot() <= self.config.touch_slop {
                return;
            }
            if core.touches() != self.config.touches_required {
                debug!(
                    "swipe: {} touches, need {}",
                    core.touches(),
                    self.config.touches_required
                );
                self.fail(core, cx);
            } else if elapsed > self.config.maximum_touch_slop_time {
                debug!("swipe: slop crossed after {elapsed} ms");
                self.fail(core, cx);
            } else if self.velocity == Vec2::ZERO {
                trace!("swipe: no velocity yet, re-anchoring");
                self.anchor = core.location();
            } else {
                let direction = self.direction_of(d, 0.0);
                if direction.is_empty() || !self.config.direction.intersects(direction) {
                    debug!("swipe: direction {direction:?} not accepted");
                    self.fail(core, cx);
                } else {
                    self.started = true;
                }
            }
            return;
        }

        if elapsed > self.config.maximum_touch_fling_time {
            debug!("swipe: too slow ({elapsed} ms)");
            self.fail(core, cx);
            return;
        }
        let direction = self.direction_of(d, self.config.minimum_swipe_distance);
        if direction.is_empty() {
            return;
        }
        if !self.config.direction.intersects(direction) {
            debug!("swipe: turned to {direction:?}");
            self.fail(core, cx);
            return;
        }
        self.recognized = direction;
        match core.try_begin(cx, self.details()) {
            // Retried on the next move.
            Begin::Blocked => self.recognized = SwipeDirection::empty(),
            Begin::Refused | Begin::Vetoed => {
                self.started = false;
                cx.cancel(TimerKind::Failed);
            }
            Begin::Fired | Begin::Awaiting => cx.cancel(TimerKind::Failed),
        }
    }
}

impl Machine for Swipe {
    fn on_pointer(&mut self, core: &mut Core, cx: &mut Cx<'_>, event: &PointerEvent) {
        if event.phase == PointerPhase::Down {
            self.tracker.clear();
        }
        self.tracker.add_movement(event, &core.pointers);
        match event.phase {
            PointerPhase::Down => self.on_down(core, cx, event),
            PointerPhase::PointerDown => {
                self.anchor = core.location();
                if core.state == State::Possible
                    && !self.started
                    && core.touches() > self.config.touches_required
                {
                    self.fail(core, cx);
                }
            }
            PointerPhase::PointerUp => {
                if let Some(lifted) = event.action_pointer() {
                    self.tracker.clear_if_diverging(
                        lifted.id,
                        core.pointers.live(),
                        self.config.maximum_fling_velocity,
                    );
                }
                self.anchor = core.location();
                if core.state == State::Possible
                    && !self.started
                    && core.touches() < self.config.touches_required
                {
                    self.fail(core, cx);
                }
            }
            PointerPhase::Move => self.on_move(core, cx, event),
            PointerPhase::Up => {
                self.down = false;
                cx.cancel(TimerKind::Failed);
                if core.state == State::Possible {
                    self.fail(core, cx);
                }
                if !cx.awaiting {
                    cx.schedule_in(TimerKind::Reset, 0);
                }
            }
            PointerPhase::Cancel => {
                self.down = false;
                self.started = false;
                cx.cancel_all();
                if core.state == State::Possible {
                    core.set_state(State::Cancelled);
                } else if core.state == State::Ended && cx.awaiting {
                    core.set_state(State::Failed);
                }
                cx.awaiting = false;
                core.began_firing = false;
                cx.schedule_in(TimerKind::Reset, 0);
            }
        }
    }

    fn on_timer(&mut self, core: &mut Core, cx: &mut Cx<'_>, kind: TimerKind) {
        match kind {
            TimerKind::Failed => {
                if core.state == State::Possible {
                    debug!("swipe: timed out");
                    self.fail(core, cx);
                }
            }
            TimerKind::Reset => {
                if core.state.is_terminal() && !cx.awaiting {
                    core.set_state(State::Possible);
                }
                self.started = false;
                core.began_firing = false;
            }
            _ => {}
        }
    }

    fn on_dependency(&mut self, core: &mut Core, cx: &mut Cx<'_>, target: State) {
        match core.settle_dependency(cx, self.details(), target) {
            Some(true) => {
                if !self.down {
                    cx.schedule_in(TimerKind::Reset, 0);
                }
            }
            Some(false) => {
                self.started = false;
                core.began_firing = false;
                if !self.down {
                    cx.schedule_in(TimerKind::Reset, 0);
                }
            }
            None => {}
        }
    }

    fn details(&self) -> Details {
        Details::Swipe {
            direction: self.recognized,
            translation: self.translation,
            velocity: self.velocity,
        }
    }

    fn reset(&mut self) {
        *self = Self::new(self.config);
    }
}
