// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pan: a drag with one or more fingers, and its edge-anchored variant.
//!
//! A pan begins once the focus (the centroid of the live contacts) travels
//! farther than the touch slop from where the stream started. From then on it
//! reports a translation relative to the point where it began and a velocity
//! in pixels per second.
//!
//! A screen-edge pan is the same machine with a gate in front: the stream
//! must start within `edge_limit` of the configured edge and the first
//! motion past the slop must lead away from that edge.

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Point, Size, Vec2};
use log::{debug, warn};

use crate::config::TouchConfig;
use crate::recognizer::{Core, Cx, Gesture, Machine, Recognizer};
use crate::scheduler::TimerKind;
use crate::types::{Details, GestureKind, PointerEvent, PointerPhase, State};
use crate::velocity::VelocityTracker;

/// Configuration of a pan recognizer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PanConfig {
    /// Fewest contacts that may drive the pan.
    pub minimum_number_of_touches: usize,
    /// Most contacts that may drive the pan.
    pub maximum_number_of_touches: usize,
    /// Distance the focus must travel before the pan begins.
    pub touch_slop: f64,
    /// Speed above which an ended pan counts as a fling.
    pub minimum_fling_velocity: f64,
    /// Speed velocities are clamped to.
    pub maximum_fling_velocity: f64,
}

impl PanConfig {
    /// Seed from platform metrics.
    pub fn from_touch_config(c: &TouchConfig) -> Self {
        Self {
            minimum_number_of_touches: 1,
            maximum_number_of_touches: usize::MAX,
            touch_slop: c.touch_slop,
            minimum_fling_velocity: c.minimum_fling_velocity,
            maximum_fling_velocity: c.maximum_fling_velocity,
        }
    }
}

impl Default for PanConfig {
    fn default() -> Self {
        Self::from_touch_config(&TouchConfig::DEFAULT)
    }
}

/// A surface edge.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ScreenEdge {
    /// `x == 0`.
    Left,
    /// `y == 0`.
    Top,
    /// `x == bounds.width`.
    Right,
    /// `y == bounds.height`.
    Bottom,
}

/// Configuration of a screen-edge pan recognizer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScreenEdgePanConfig {
    /// Edge the drag must start from.
    pub edge: ScreenEdge,
    /// Width of the band along the edge where the drag may start.
    pub edge_limit: f64,
    /// Size of the surface, needed for the right and bottom edges.
    pub bounds: Size,
    /// Settings shared with a plain pan.
    pub pan: PanConfig,
}

impl ScreenEdgePanConfig {
    /// Seed from platform metrics.
    pub fn from_touch_config(c: &TouchConfig, edge: ScreenEdge, bounds: Size) -> Self {
        Self {
            edge,
            edge_limit: c.screen_edge_limit,
            bounds,
            pan: PanConfig::from_touch_config(c),
        }
    }

    /// Default metrics for `edge` of a surface of size `bounds`.
    pub fn new(edge: ScreenEdge, bounds: Size) -> Self {
        Self::from_touch_config(&TouchConfig::DEFAULT, edge, bounds)
    }
}

impl Default for ScreenEdgePanConfig {
    fn default() -> Self {
        Self::new(ScreenEdge::Left, Size::ZERO)
    }
}

impl Recognizer {
    /// A pan recognizer.
    pub fn pan(config: PanConfig) -> Self {
        Self::from_gesture(GestureKind::Pan, Gesture::Pan(Pan::new(config, None)))
    }

    /// A pan recognizer that only starts at a surface edge.
    pub fn screen_edge_pan(config: ScreenEdgePanConfig) -> Self {
        let gate = EdgeGate {
            edge: config.edge,
            limit: config.edge_limit,
            bounds: config.bounds,
        };
        Self::from_gesture(
            GestureKind::ScreenEdgePan,
            Gesture::Pan(Pan::new(config.pan, Some(gate))),
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
struct EdgeGate {
    edge: ScreenEdge,
    limit: f64,
    bounds: Size,
}

impl EdgeGate {
    fn contains(&self, p: Point) -> bool {
        match self.edge {
            ScreenEdge::Left => p.x <= self.limit,
            ScreenEdge::Right => p.x >= self.bounds.width - self.limit,
            ScreenEdge::Top => p.y <= self.limit,
            ScreenEdge::Bottom => p.y >= self.bounds.height - self.limit,
        }
    }

    /// Whether the dominant axis of `d` leads away from the edge.
    fn leads_inward(&self, d: Vec2) -> bool {
        let horizontal = d.x.abs() >= d.y.abs();
        match self.edge {
            ScreenEdge::Left => horizontal && d.x > 0.0,
            ScreenEdge::Right => horizontal && d.x < 0.0,
            ScreenEdge::Top => !horizontal && d.y > 0.0,
            ScreenEdge::Bottom => !horizontal && d.y < 0.0,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Pan {
    config: PanConfig,
    edge: Option<EdgeGate>,
    down: bool,
    ended: bool,
    down_focus: Point,
    last_focus: Point,
    translation: Vec2,
    velocity: Vec2,
    tracker: VelocityTracker,
}

impl Pan {
    fn new(config: PanConfig, edge: Option<EdgeGate>) -> Self {
        Self {
            config,
            edge,
            down: false,
            ended: false,
            down_focus: Point::ZERO,
            last_focus: Point::ZERO,
            translation: Vec2::ZERO,
            velocity: Vec2::ZERO,
            tracker: VelocityTracker::default(),
        }
    }

    fn is_fling(&self) -> bool {
        let min = self.config.minimum_fling_velocity;
        self.ended && (self.velocity.x.abs() > min || self.velocity.y.abs() > min)
    }

    fn touches_in_bounds(&self, touches: usize) -> bool {
        (self.config.minimum_number_of_touches..=self.config.maximum_number_of_touches)
            .contains(&touches)
    }

    fn update_velocity(&mut self, core: &Core, event: &PointerEvent) {
        self.velocity = match core.pointers.primary(event) {
            Some(id) => self
                .tracker
                .velocity(id, self.config.maximum_fling_velocity),
            None => Vec2::ZERO,
        };
    }

    fn on_down(&mut self, core: &mut Core, cx: &mut Cx<'_>) {
        cx.cancel(TimerKind::Reset);
        self.down = true;
        self.ended = false;
        self.down_focus = core.location();
        self.last_focus = core.location();
        self.translation = Vec2::ZERO;
        self.velocity = Vec2::ZERO;
        core.set_state(State::Possible);
        core.began_firing = false;
        if let Some(gate) = self.edge {
            if !gate.contains(core.location()) {
                debug!("edge pan: down away from {:?} edge", gate.edge);
                core.set_state(State::Failed);
            }
        }
    }

    fn on_move(&mut self, core: &mut Core, cx: &mut Cx<'_>, event: &PointerEvent) {
        if !self.down {
            return;
        }
        match core.state {
            State::Possible => {
                let d = core.location() - self.down_focus;
                let slop = self.config.touch_slop;
                if d.hypot2() <= slop * slop {
                    return;
                }
                if !self.touches_in_bounds(core.touches()) {
                    warn!("pan: {} touches out of bounds", core.touches());
                    core.set_state(State::Failed);
                    return;
                }
                if let Some(gate) = self.edge {
                    if !gate.leads_inward(d) {
                        debug!("edge pan: drag does not lead away from {:?} edge", gate.edge);
                        core.set_state(State::Failed);
                        return;
                    }
                }
                self.update_velocity(core, event);
                self.translation = Vec2::ZERO;
                self.last_focus = core.location();
                // Blocked stays `Possible` and retries on the next move.
                core.try_begin(cx, self.details());
            }
            State::Began | State::Changed => {
                self.translation += core.location() - self.last_focus;
                self.last_focus = core.location();
                self.update_velocity(core, event);
                if core.began_firing {
                    core.set_state(State::Changed);
                    core.fire(self.details());
                }
            }
            _ => {}
        }
    }

    fn on_up(&mut self, core: &mut Core, cx: &mut Cx<'_>, event: &PointerEvent) {
        self.down = false;
        cx.cancel(TimerKind::Reset);
        match core.state {
            State::Began | State::Changed => {
                self.translation += core.location() - self.last_focus;
                self.last_focus = core.location();
                self.update_velocity(core, event);
                self.ended = true;
                cx.awaiting = false;
                core.set_state(State::Ended);
                core.fire_if_began(self.details());
            }
            State::Possible => core.set_state(State::Failed),
            _ => {}
        }
        cx.schedule_in(TimerKind::Reset, 0);
    }
}

impl Machine for Pan {
    fn on_pointer(&mut self, core: &mut Core, cx: &mut Cx<'_>, event: &PointerEvent) {
        if event.phase == PointerPhase::Down {
            self.tracker.clear();
        }
        self.tracker.add_movement(event, &core.pointers);
        match event.phase {
            PointerPhase::Down => self.on_down(core, cx),
            PointerPhase::PointerDown => {
                self.down_focus = core.location();
                self.last_focus = core.location();
                if self.down
                    && core.state == State::Possible
                    && core.touches() > self.config.maximum_number_of_touches
                {
                    warn!("pan: too many touches");
                    core.set_state(State::Failed);
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
                self.down_focus = core.location();
                self.last_focus = core.location();
                if self.down
                    && core.state == State::Possible
                    && core.touches() < self.config.minimum_number_of_touches
                {
                    warn!("pan: too few touches");
                    core.set_state(State::Failed);
                }
            }
            PointerPhase::Move => self.on_move(core, cx, event),
            PointerPhase::Up => self.on_up(core, cx, event),
            PointerPhase::Cancel => {
                self.down = false;
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
        let fling = self.is_fling();
        match self.edge {
            Some(gate) => Details::ScreenEdgePan {
                edge: gate.edge,
                translation: self.translation,
                velocity: self.velocity,
                fling,
            },
            None => Details::Pan {
                translation: self.translation,
                velocity: self.velocity,
                fling,
            },
        }
    }

    fn reset(&mut self) {
        *self = Self::new(self.config, self.edge);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Dispatcher;
    use crate::recognizers::testing::{all_legal, attach, state_of};
    use crate::stream::PointerStream;
    use alloc::vec;

    #[test]
    fn drag_begins_past_slop_and_tracks_translation() {
        let mut d = Dispatcher::new();
        let (id, log) = attach(&mut d, Recognizer::pan(PanConfig::default()));
        let mut s = PointerStream::new();
        d.process(&s.down(0, Point::new(100.0, 100.0), 0));
        d.process(&s.move_to(0, Point::new(105.0, 100.0), 10));
        assert_eq!(state_of(&d, id), Some(State::Possible));
        d.process(&s.move_to(0, Point::new(110.0, 100.0), 20));
        assert_eq!(state_of(&d, id), Some(State::Began));
        d.process(&s.move_to(0, Point::new(130.0, 110.0), 30));
        d.process(&s.up(0, 40));
        let log = log.borrow();
        assert_eq!(
            log.fired_states(),
            vec![State::Began, State::Changed, State::Ended]
        );
        match log.fired[2].1 {
            Details::Pan { translation, .. } => {
                // Measured from where the pan began.
                assert_eq!(translation, Vec2::new(20.0, 10.0));
            }
            other => panic!("unexpected details {other:?}"),
        }
        assert!(log.changes.iter().all(|c| c.is_legal()));
    }

    #[test]
    fn fast_release_is_a_fling() {
        let mut d = Dispatcher::new();
        let (_, log) = attach(&mut d, Recognizer::pan(PanConfig::default()));
        let mut s = PointerStream::new();
        d.process(&s.down(0, Point::new(0.0, 0.0), 0));
        for i in 1..=5_u32 {
            let x = f64::from(i) * 20.0;
            d.process(&s.move_to(0, Point::new(x, 0.0), u64::from(i) * 10));
        }
        d.process(&s.up(0, 60));
        let log = log.borrow();
        let Some((State::Ended, Details::Pan { velocity, fling, .. })) = log.fired.last().copied()
        else {
            panic!("pan did not end");
        };
        assert!(fling);
        assert!(velocity.x > 1000.0, "vx = {}", velocity.x);
    }

    #[test]
    fn slow_release_is_not_a_fling() {
        let mut d = Dispatcher::new();
        let (_, log) = attach(&mut d, Recognizer::pan(PanConfig::default()));
        let mut s = PointerStream::new();
        d.process(&s.down(0, Point::new(0.0, 0.0), 0));
        d.process(&s.move_to(0, Point::new(20.0, 0.0), 10));
        // Hold still long enough for the velocity history to lapse.
        d.process(&s.move_to(0, Point::new(20.0, 0.0), 200));
        d.process(&s.up(0, 210));
        let log = log.borrow();
        let Some((_, Details::Pan { fling, .. })) = log.fired.last().copied() else {
            panic!("pan did not fire");
        };
        assert!(!fling);
    }

    #[test]
    fn lifting_without_dragging_fails() {
        let mut d = Dispatcher::new();
        let (id, log) = attach(&mut d, Recognizer::pan(PanConfig::default()));
        let mut s = PointerStream::new();
        d.process(&s.down(0, Point::ZERO, 0));
        d.process(&s.up(0, 50));
        assert_eq!(state_of(&d, id), Some(State::Failed));
        d.advance(50);
        assert_eq!(state_of(&d, id), Some(State::Possible));
        assert!(all_legal(&log));
    }

    #[test]
    fn too_many_touches_fail() {
        let mut d = Dispatcher::new();
        let config = PanConfig {
            maximum_number_of_touches: 1,
            ..PanConfig::default()
        };
        let (id, _) = attach(&mut d, Recognizer::pan(config));
        let mut s = PointerStream::new();
        d.process(&s.down(0, Point::ZERO, 0));
        d.process(&s.down(1, Point::new(50.0, 0.0), 5));
        assert_eq!(state_of(&d, id), Some(State::Failed));
    }

    #[test]
    fn two_finger_pan_waits_for_second_finger() {
        let mut d = Dispatcher::new();
        let config = PanConfig {
            minimum_number_of_touches: 2,
            ..PanConfig::default()
        };
        let (id, _) = attach(&mut d, Recognizer::pan(config));
        let mut s = PointerStream::new();
        d.process(&s.down(0, Point::ZERO, 0));
        d.process(&s.down(1, Point::new(50.0, 0.0), 5));
        d.process(&s.move_all(&[(0, Point::new(0.0, 20.0)), (1, Point::new(50.0, 20.0))], 15));
        assert_eq!(state_of(&d, id), Some(State::Began));
    }

    #[test]
    fn one_finger_drag_fails_two_finger_pan() {
        let mut d = Dispatcher::new();
        let config = PanConfig {
            minimum_number_of_touches: 2,
            ..PanConfig::default()
        };
        let (id, _) = attach(&mut d, Recognizer::pan(config));
        let mut s = PointerStream::new();
        d.process(&s.down(0, Point::ZERO, 0));
        d.process(&s.move_to(0, Point::new(30.0, 0.0), 10));
        assert_eq!(state_of(&d, id), Some(State::Failed));
    }

    #[test]
    fn adding_a_finger_does_not_jump_translation() {
        let mut d = Dispatcher::new();
        let (id, _) = attach(&mut d, Recognizer::pan(PanConfig::default()));
        let mut s = PointerStream::new();
        d.process(&s.down(0, Point::ZERO, 0));
        d.process(&s.move_to(0, Point::new(20.0, 0.0), 10));
        d.process(&s.down(1, Point::new(220.0, 0.0), 20));
        d.process(&s.move_all(&[(0, Point::new(30.0, 0.0)), (1, Point::new(230.0, 0.0))], 30));
        let Some(Details::Pan { translation, .. }) = d.get(id).map(Recognizer::details) else {
            panic!("missing pan");
        };
        assert_eq!(translation, Vec2::new(10.0, 0.0));
    }

    #[test]
    fn edge_pan_starts_only_at_its_edge() {
        let mut d = Dispatcher::new();
        let config = ScreenEdgePanConfig::new(ScreenEdge::Left, Size::new(400.0, 800.0));
        let (id, log) = attach(&mut d, Recognizer::screen_edge_pan(config));
        let mut s = PointerStream::new();

        // Away from the edge.
        d.process(&s.down(0, Point::new(200.0, 300.0), 0));
        assert_eq!(state_of(&d, id), Some(State::Failed));
        d.process(&s.move_to(0, Point::new(260.0, 300.0), 10));
        d.process(&s.up(0, 20));
        assert!(log.borrow().fired.is_empty());

        // From the edge, inward.
        d.process(&s.down(0, Point::new(5.0, 300.0), 100));
        d.process(&s.move_to(0, Point::new(40.0, 302.0), 110));
        assert_eq!(state_of(&d, id), Some(State::Began));
        d.process(&s.up(0, 120));
        let log = log.borrow();
        assert_eq!(log.fired_states(), vec![State::Began, State::Ended]);
        assert!(matches!(
            log.fired[0].1,
            Details::ScreenEdgePan {
                edge: ScreenEdge::Left,
                ..
            }
        ));
    }

    #[test]
    fn edge_pan_rejects_drag_along_the_edge() {
        let mut d = Dispatcher::new();
        let config = ScreenEdgePanConfig::new(ScreenEdge::Right, Size::new(400.0, 800.0));
        let (id, _) = attach(&mut d, Recognizer::screen_edge_pan(config));
        let mut s = PointerStream::new();
        d.process(&s.down(0, Point::new(395.0, 300.0), 0));
        assert_eq!(state_of(&d, id), Some(State::Possible));
        d.process(&s.move_to(0, Point::new(394.0, 360.0), 10));
        assert_eq!(state_of(&d, id), Some(State::Failed));
    }

    #[test]
    fn edge_gate_geometry() {
        let gate = EdgeGate {
            edge: ScreenEdge::Bottom,
            limit: 20.0,
            bounds: Size::new(100.0, 200.0),
        };
        assert!(gate.contains(Point::new(50.0, 190.0)));
        assert!(!gate.contains(Point::new(50.0, 170.0)));
        assert!(gate.leads_inward(Vec2::new(1.0, -10.0)));
        assert!(!gate.leads_inward(Vec2::new(1.0, 10.0)));
        assert!(!gate.leads_inward(Vec2::new(-30.0, -10.0)));
    }
}
