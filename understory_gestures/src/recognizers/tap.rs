// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tap: `taps_required` quick presses with `touches_required` fingers.

use kurbo::Point;
use log::warn;

use crate::config::TouchConfig;
use crate::recognizer::{Begin, Core, Cx, Gesture, Machine, Recognizer};
use crate::scheduler::TimerKind;
use crate::types::{Details, GestureKind, PointerEvent, PointerPhase, State};

/// Configuration of a tap recognizer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TapConfig {
    /// Fingers that must take part in each tap.
    pub touches_required: usize,
    /// Taps in the sequence.
    pub taps_required: usize,
    /// Movement allowed during a single-finger tap.
    pub touch_slop: f64,
    /// Distance allowed between successive taps, and movement allowed during
    /// multi-finger multi-taps.
    pub double_tap_slop: f64,
    /// Delay before a lifted finger stops counting toward the touch count.
    pub tap_timeout: u64,
    /// Maximum wait for the next tap of a sequence.
    pub double_tap_timeout: u64,
    /// Pressing longer than this fails the tap.
    pub long_press_timeout: u64,
    /// Slack added to the long-press deadline.
    pub timeout_delay: u64,
}

impl TapConfig {
    /// Seed from platform metrics.
    pub fn from_touch_config(c: &TouchConfig) -> Self {
        Self {
            touches_required: 1,
            taps_required: 1,
            touch_slop: c.touch_slop,
            double_tap_slop: c.double_tap_slop,
            tap_timeout: c.tap_timeout,
            double_tap_timeout: c.double_tap_timeout,
            long_press_timeout: c.long_press_timeout,
            timeout_delay: c.timeout_delay,
        }
    }
}

impl Default for TapConfig {
    fn default() -> Self {
        Self::from_touch_config(&TouchConfig::DEFAULT)
    }
}

impl Recognizer {
    /// A tap recognizer.
    pub fn tap(config: TapConfig) -> Self {
        Self::from_gesture(GestureKind::Tap, Gesture::Tap(Tap::new(config)))
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Tap {
    config: TapConfig,
    started: bool,
    in_tap_region: bool,
    taps: usize,
    /// Fingers counted toward the current tap; lags the live count by
    /// `tap_timeout` when fingers lift.
    touches: usize,
    settling: Option<usize>,
    down_focus: Point,
    previous_tap_location: Point,
}

impl Tap {
    fn new(config: TapConfig) -> Self {
        Self {
            config,
            started: false,
            in_tap_region: false,
            taps: 0,
            touches: 0,
            settling: None,
            down_focus: Point::ZERO,
            previous_tap_location: Point::ZERO,
        }
    }

    fn multi_tap(&self) -> bool {
        self.config.taps_required > 1
    }

    fn fail(&mut self, core: &mut Core, cx: &mut Cx<'_>) {
        cx.cancel_all();
        self.started = false;
        self.settling = None;
        core.began_firing = false;
        core.set_state(State::Failed);
        if core.pointers.live().is_empty() {
            cx.schedule_in(TimerKind::Reset, 0);
        }
    }

    fn on_down(&mut self, core: &mut Core, cx: &mut Cx<'_>) {
        cx.cancel_all();
        self.in_tap_region = true;
        self.touches = core.touches();
        self.settling = None;
        core.set_state(State::Possible);
        core.began_firing = false;

        if !self.started {
            self.taps = 0;
            self.started = true;
        } else if self.config.touches_required == 1 && self.multi_tap() {
            let gap = core.pointers.down_location() - core.pointers.previous_down_location();
            if gap.hypot2() > self.config.double_tap_slop * self.config.double_tap_slop {
                warn!("tap: next tap too far from the previous one");
                self.fail(core, cx);
                return;
            }
        }
        cx.schedule_in(
            TimerKind::LongPress,
            self.config.long_press_timeout + self.config.timeout_delay,
        );
        self.taps += 1;
        self.down_focus = core.location();
    }

    fn on_pointer_down(&mut self, core: &mut Core, cx: &mut Cx<'_>) {
        if core.state != State::Possible || !self.started {
            return;
        }
        cx.cancel(TimerKind::PointerUp);
        self.settling = None;
        self.touches = core.touches();
        if self.touches > self.config.touches_required {
            warn!("tap: {} touches, {} required", self.touches, self.config.touches_required);
            self.fail(core, cx);
            return;
        }
        if self.touches == self.config.touches_required && self.multi_tap() {
            if self.taps < self.config.taps_required {
                self.previous_tap_location = core.location();
            } else {
                let gap = core.location() - self.previous_tap_location;
                if gap.hypot2() > self.config.double_tap_slop * self.config.double_tap_slop {
                    warn!("tap: next tap too far from the previous one");
                    self.fail(core, cx);
                    return;
                }
            }
        }
        self.down_focus = core.location();
    }

    fn on_pointer_up(&mut self, core: &mut Core, cx: &mut Cx<'_>) {
        if core.state != State::Possible || !self.started {
            return;
        }
        cx.cancel(TimerKind::Reset);
        self.down_focus = core.location();
        let counted = self.settling.unwrap_or(self.touches);
        self.settling = Some(counted.saturating_sub(1));
        cx.schedule_in(TimerKind::PointerUp, self.config.tap_timeout);
    }

    fn on_move(&mut self, core: &mut Core, cx: &mut Cx<'_>) {
        if core.state != State::Possible || !self.started || !self.in_tap_region {
            return;
        }
        let slop = if self.config.touches_required > 1 && self.multi_tap() {
            self.config.double_tap_slop
        } else {
            self.config.touch_slop
        };
        if (core.location() - self.down_focus).hypot2() > slop * slop {
            warn!("tap: moved beyond slop");
            self.in_tap_region = false;
            self.fail(core, cx);
        }
    }

    fn on_up(&mut self, core: &mut Core, cx: &mut Cx<'_>) {
        cx.cancel(TimerKind::Reset);
        cx.cancel(TimerKind::PointerUp);
        cx.cancel(TimerKind::LongPress);
        self.settling = None;

        if core.state == State::Possible && self.started {
            if self.touches != self.config.touches_required {
                warn!("tap: {} touches, {} required", self.touches, self.config.touches_required);
                self.fail(core, cx);
            } else if self.taps < self.config.taps_required {
                cx.schedule_in(TimerKind::Failed, self.config.double_tap_timeout);
            } else {
                match core.try_begin(cx, self.details()) {
                    Begin::Fired => {
                        self.started = false;
                        cx.schedule_in(TimerKind::Reset, 0);
                    }
                    Begin::Awaiting => self.started = false,
                    // Held back for this event only; give up at the next turn.
                    Begin::Blocked => cx.schedule_in(TimerKind::Failed, 0),
                    Begin::Refused | Begin::Vetoed => {
                        self.started = false;
                        cx.cancel_all();
                        cx.schedule_in(TimerKind::Reset, 0);
                    }
                }
            }
        } else if core.state.is_terminal() && !cx.awaiting {
            cx.schedule_in(TimerKind::Reset, 0);
        }
    }
}

impl Machine for Tap {
    fn on_pointer(&mut self, core: &mut Core, cx: &mut Cx<'_>, event: &PointerEvent) {
        match event.phase {
            PointerPhase::Down => self.on_down(core, cx),
            PointerPhase::PointerDown => self.on_pointer_down(core, cx),
            PointerPhase::PointerUp => self.on_pointer_up(core, cx),
            PointerPhase::Move => self.on_move(core, cx),
            PointerPhase::Up => self.on_up(core, cx),
            PointerPhase::Cancel => {
                cx.cancel_all();
                self.started = false;
                self.settling = None;
                core.began_firing = false;
                if core.state == State::Possible {
                    core.set_state(State::Cancelled);
                }
                if !cx.awaiting {
                    cx.schedule_in(TimerKind::Reset, 0);
                }
            }
        }
    }

    fn on_timer(&mut self, core: &mut Core, cx: &mut Cx<'_>, kind: TimerKind) {
        match kind {
            TimerKind::Reset => {
                if core.state.is_terminal() && !cx.awaiting {
                    core.set_state(State::Possible);
                }
                self.started = false;
                core.began_firing = false;
            }
            TimerKind::Failed | TimerKind::LongPress => {
                if core.state == State::Possible && self.started {
                    warn!("tap: timed out after {} of {} taps", self.taps, self.config.taps_required);
                    self.fail(core, cx);
                }
            }
            TimerKind::PointerUp => {
                if let Some(touches) = self.settling.take() {
                    self.touches = touches;
                }
            }
        }
    }

    fn on_dependency(&mut self, core: &mut Core, cx: &mut Cx<'_>, target: State) {
        match core.settle_dependency(cx, self.details(), target) {
            Some(true) => cx.schedule_in(TimerKind::Reset, 0),
            Some(false) => {
                cx.cancel_all();
                self.started = false;
                core.began_firing = false;
                cx.schedule_in(TimerKind::Reset, 0);
            }
            None => {}
        }
    }

    fn details(&self) -> Details {
        Details::Tap { taps: self.taps }
    }

    fn reset(&mut self) {
        *self = Self::new(self.config);
    }

    fn in_sequence(&self) -> bool {
        self.started
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Dispatcher;
    use crate::recognizers::testing::{all_legal, attach, state_of};
    use crate::stream::PointerStream;
    use alloc::vec;
    use alloc::vec::Vec;

    fn tap_at(d: &mut Dispatcher, s: &mut PointerStream, at: Point, t: u64) {
        d.process(&s.down(0, at, t));
        d.process(&s.up(0, t + 50));
    }

    #[test]
    fn single_tap_fires_once() {
        let mut d = Dispatcher::new();
        let (id, log) = attach(&mut d, Recognizer::tap(TapConfig::default()));
        let mut s = PointerStream::new();
        tap_at(&mut d, &mut s, Point::new(10.0, 10.0), 0);
        assert_eq!(log.borrow().fired_states(), vec![State::Ended]);
        assert_eq!(state_of(&d, id), Some(State::Ended));
        // The zero-delay reset runs on the next turn.
        d.advance(60);
        assert_eq!(state_of(&d, id), Some(State::Possible));
        assert!(all_legal(&log));
    }

    #[test]
    fn double_tap_needs_both_taps() {
        let mut d = Dispatcher::new();
        let config = TapConfig {
            taps_required: 2,
            ..TapConfig::default()
        };
        let (id, log) = attach(&mut d, Recognizer::tap(config));
        let mut s = PointerStream::new();
        tap_at(&mut d, &mut s, Point::new(10.0, 10.0), 0);
        assert!(log.borrow().fired.is_empty());
        tap_at(&mut d, &mut s, Point::new(12.0, 10.0), 150);
        assert_eq!(log.borrow().fired.len(), 1);
        assert_eq!(log.borrow().fired[0].1, Details::Tap { taps: 2 });
        assert_eq!(state_of(&d, id), Some(State::Ended));
        assert!(all_legal(&log));
    }

    #[test]
    fn double_tap_times_out_after_one_tap() {
        let mut d = Dispatcher::new();
        let config = TapConfig {
            taps_required: 2,
            ..TapConfig::default()
        };
        let (id, log) = attach(&mut d, Recognizer::tap(config));
        let mut s = PointerStream::new();
        tap_at(&mut d, &mut s, Point::ZERO, 0);
        // Up at 50, so the wait for the next tap ends at 350.
        d.advance(349);
        assert_eq!(state_of(&d, id), Some(State::Possible));
        assert!(log.borrow().changes.is_empty());
        d.advance(350);
        // Failed, then straight back to Possible on the same turn.
        let states: Vec<_> = log.borrow().changes.iter().map(|c| c.to).collect();
        assert_eq!(states, vec![State::Failed, State::Possible]);
        assert_eq!(state_of(&d, id), Some(State::Possible));
        assert_eq!(d.next_deadline(), None);
        assert!(log.borrow().fired.is_empty());
        assert!(all_legal(&log));

        // The next pair of taps starts a fresh sequence.
        tap_at(&mut d, &mut s, Point::ZERO, 1000);
        tap_at(&mut d, &mut s, Point::ZERO, 1150);
        assert_eq!(log.borrow().fired_states(), vec![State::Ended]);
    }

    #[test]
    fn failed_taps_return_to_possible_once_lifted() {
        let mut d = Dispatcher::new();
        let (id, log) = attach(&mut d, Recognizer::tap(TapConfig::default()));
        let mut s = PointerStream::new();

        // Slop failure: stays failed while the finger is down.
        d.process(&s.down(0, Point::ZERO, 0));
        d.process(&s.move_to(0, Point::new(30.0, 0.0), 10));
        d.advance(100);
        assert_eq!(state_of(&d, id), Some(State::Failed));
        d.process(&s.up(0, 120));
        d.advance(120);
        assert_eq!(state_of(&d, id), Some(State::Possible));

        // Too many fingers.
        d.process(&s.down(0, Point::ZERO, 200));
        d.process(&s.down(1, Point::new(30.0, 0.0), 210));
        assert_eq!(state_of(&d, id), Some(State::Failed));
        d.process(&s.up(1, 220));
        d.process(&s.up(0, 230));
        d.advance(230);
        assert_eq!(state_of(&d, id), Some(State::Possible));

        // Held past the long-press guard.
        d.process(&s.down(0, Point::ZERO, 300));
        d.process(&s.up(0, 900));
        d.advance(900);
        assert_eq!(state_of(&d, id), Some(State::Possible));

        assert_eq!(d.next_deadline(), None);
        assert!(log.borrow().fired.is_empty());
        assert!(all_legal(&log));
    }

    #[test]
    fn second_tap_too_far_fails() {
        let mut d = Dispatcher::new();
        let config = TapConfig {
            taps_required: 2,
            ..TapConfig::default()
        };
        let (id, log) = attach(&mut d, Recognizer::tap(config));
        let mut s = PointerStream::new();
        tap_at(&mut d, &mut s, Point::ZERO, 0);
        d.process(&s.down(0, Point::new(300.0, 0.0), 150));
        assert_eq!(state_of(&d, id), Some(State::Failed));
        d.process(&s.up(0, 200));
        assert!(log.borrow().fired.is_empty());
    }

    #[test]
    fn moving_beyond_slop_fails() {
        let mut d = Dispatcher::new();
        let (id, log) = attach(&mut d, Recognizer::tap(TapConfig::default()));
        let mut s = PointerStream::new();
        d.process(&s.down(0, Point::ZERO, 0));
        d.process(&s.move_to(0, Point::new(5.0, 5.0), 10));
        assert_eq!(state_of(&d, id), Some(State::Possible));
        // 9 > 8 on one axis.
        d.process(&s.move_to(0, Point::new(9.0, 0.0), 20));
        assert_eq!(state_of(&d, id), Some(State::Failed));
        d.process(&s.up(0, 30));
        assert!(log.borrow().fired.is_empty());
        assert!(all_legal(&log));
    }

    #[test]
    fn holding_too_long_fails() {
        let mut d = Dispatcher::new();
        let (id, log) = attach(&mut d, Recognizer::tap(TapConfig::default()));
        let mut s = PointerStream::new();
        d.process(&s.down(0, Point::ZERO, 0));
        d.advance(505);
        assert_eq!(state_of(&d, id), Some(State::Failed));
        d.process(&s.up(0, 600));
        assert!(log.borrow().fired.is_empty());
    }

    #[test]
    fn two_finger_tap_counts_fingers_lifted_together() {
        let mut d = Dispatcher::new();
        let config = TapConfig {
            touches_required: 2,
            ..TapConfig::default()
        };
        let (_, log) = attach(&mut d, Recognizer::tap(config));
        let mut s = PointerStream::new();
        d.process(&s.down(0, Point::new(0.0, 0.0), 0));
        d.process(&s.down(1, Point::new(40.0, 0.0), 10));
        d.process(&s.up(1, 60));
        // Within the settle delay the lifted finger still counts.
        d.process(&s.up(0, 90));
        assert_eq!(log.borrow().fired.len(), 1);
    }

    #[test]
    fn two_finger_tap_fails_when_fingers_lift_far_apart_in_time() {
        let mut d = Dispatcher::new();
        let config = TapConfig {
            touches_required: 2,
            ..TapConfig::default()
        };
        let (id, log) = attach(&mut d, Recognizer::tap(config));
        let mut s = PointerStream::new();
        d.process(&s.down(0, Point::new(0.0, 0.0), 0));
        d.process(&s.down(1, Point::new(40.0, 0.0), 10));
        d.process(&s.up(1, 60));
        // Settle fires at 160; by the final lift only one finger counts.
        d.process(&s.up(0, 250));
        assert!(log.borrow().fired.is_empty());
        assert_eq!(state_of(&d, id), Some(State::Failed));
    }

    #[test]
    fn extra_finger_fails_single_finger_tap() {
        let mut d = Dispatcher::new();
        let (id, _) = attach(&mut d, Recognizer::tap(TapConfig::default()));
        let mut s = PointerStream::new();
        d.process(&s.down(0, Point::ZERO, 0));
        d.process(&s.down(1, Point::new(30.0, 0.0), 10));
        assert_eq!(state_of(&d, id), Some(State::Failed));
    }

    #[test]
    fn cancel_moves_to_cancelled_then_resets() {
        let mut d = Dispatcher::new();
        let (id, log) = attach(&mut d, Recognizer::tap(TapConfig::default()));
        let mut s = PointerStream::new();
        d.process(&s.down(0, Point::ZERO, 0));
        d.process(&s.cancel(10));
        assert_eq!(state_of(&d, id), Some(State::Cancelled));
        d.advance(10);
        assert_eq!(state_of(&d, id), Some(State::Possible));
        assert!(all_legal(&log));
    }
}
