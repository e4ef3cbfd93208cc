// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Long press: a press held in place, optionally after a number of quick taps.

use kurbo::Point;
use log::warn;

use crate::config::TouchConfig;
use crate::recognizer::{Begin, Core, Cx, Gesture, Machine, Recognizer};
use crate::scheduler::TimerKind;
use crate::types::{Details, GestureKind, PointerEvent, PointerPhase, State};

/// Configuration of a long-press recognizer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LongPressConfig {
    /// Fingers that must be held down.
    pub touches_required: usize,
    /// Quick taps before the press that is held.
    pub taps_required: usize,
    /// Hold duration, measured from the last down.
    pub minimum_press_duration: u64,
    /// Movement allowed before the press is recognized.
    pub allowable_movement: f64,
    /// Movement after recognition that counts as a change.
    pub touch_slop: f64,
    /// Distance allowed between the pre-taps.
    pub double_tap_slop: f64,
    /// Maximum wait for the next pre-tap.
    pub double_tap_timeout: u64,
    /// Delay before a lifted finger stops counting toward the touch count.
    pub tap_timeout: u64,
}

impl LongPressConfig {
    /// Seed from platform metrics.
    pub fn from_touch_config(c: &TouchConfig) -> Self {
        Self {
            touches_required: 1,
            taps_required: 0,
            minimum_press_duration: c.long_press_timeout,
            allowable_movement: c.touch_slop,
            touch_slop: c.touch_slop,
            double_tap_slop: c.double_tap_slop,
            double_tap_timeout: c.double_tap_timeout,
            tap_timeout: c.tap_timeout,
        }
    }
}

impl Default for LongPressConfig {
    fn default() -> Self {
        Self::from_touch_config(&TouchConfig::DEFAULT)
    }
}

impl Recognizer {
    /// A long-press recognizer.
    pub fn long_press(config: LongPressConfig) -> Self {
        Self::from_gesture(
            GestureKind::LongPress,
            Gesture::LongPress(LongPress::new(config)),
        )
    }
}

#[derive(Clone, Debug)]
pub(crate) struct LongPress {
    config: LongPressConfig,
    started: bool,
    in_tap_region: bool,
    /// Moved beyond slop after recognition.
    moved: bool,
    /// The hold qualified but an earlier recognizer held it back.
    retry_begin: bool,
    downs: usize,
    touches: usize,
    settling: Option<usize>,
    down_focus: Point,
    start: Point,
}

impl LongPress {
    fn new(config: LongPressConfig) -> Self {
        Self {
            config,
            started: false,
            in_tap_region: false,
            moved: false,
            retry_begin: false,
            downs: 0,
            touches: 0,
            settling: None,
            down_focus: Point::ZERO,
            start: Point::ZERO,
        }
    }

    fn fail(&mut self, core: &mut Core, cx: &mut Cx<'_>) {
        cx.cancel_all();
        self.started = false;
        self.downs = 0;
        self.settling = None;
        core.began_firing = false;
        core.set_state(State::Failed);
    }

    /// Finish an active press.
    fn end(&mut self, core: &mut Core, cx: &mut Cx<'_>) {
        cx.cancel(TimerKind::PointerUp);
        cx.cancel(TimerKind::LongPress);
        core.set_state(State::Ended);
        core.fire_if_began(self.details());
    }

    fn on_down(&mut self, core: &mut Core, cx: &mut Cx<'_>, event: &PointerEvent) {
        cx.cancel_all();
        self.in_tap_region = true;
        self.moved = false;
        self.retry_begin = false;
        self.touches = core.touches();
        self.settling = None;
        core.set_state(State::Possible);
        core.began_firing = false;

        if !self.started {
            self.started = true;
            self.downs = 1;
        } else {
            self.downs += 1;
            let gap = core.pointers.down_location() - core.pointers.previous_down_location();
            if gap.hypot2() > self.config.double_tap_slop * self.config.double_tap_slop {
                warn!("long press: tap too far from the previous one");
                self.fail(core, cx);
                return;
            }
        }
        if self.downs > self.config.taps_required {
            cx.schedule_at(
                TimerKind::LongPress,
                event
                    .down_timestamp
                    .saturating_add(self.config.minimum_press_duration),
            );
        } else {
            cx.schedule_in(TimerKind::Failed, self.config.double_tap_timeout);
        }
        self.down_focus = core.location();
        self.start = core.location();
    }

    fn on_move(&mut self, core: &mut Core, cx: &mut Cx<'_>) {
        match core.state {
            State::Possible if self.started && self.in_tap_region => {
                let d = core.location() - self.down_focus;
                let limit = self.config.allowable_movement;
                if d.hypot2() > limit * limit {
                    warn!("long press: moved before recognition");
                    self.in_tap_region = false;
                    self.fail(core, cx);
                } else if self.retry_begin {
                    self.begin(core, cx);
                }
            }
            State::Began => {
                let d = core.location() - self.down_focus;
                let slop = self.config.touch_slop;
                if !self.moved && d.hypot2() > slop * slop {
                    self.moved = true;
                    if core.began_firing {
                        core.set_state(State::Changed);
                        core.fire(self.details());
                    }
                }
            }
            State::Changed => {
                core.set_state(State::Changed);
                core.fire(self.details());
            }
            _ => {}
        }
    }

    fn on_up(&mut self, core: &mut Core, cx: &mut Cx<'_>) {
        cx.cancel(TimerKind::Reset);
        cx.cancel(TimerKind::PointerUp);
        cx.cancel(TimerKind::LongPress);
        self.settling = None;
        match core.state {
            State::Possible if self.started => {
                if self.touches != self.config.touches_required {
                    warn!(
                        "long press: {} touches, {} required",
                        self.touches, self.config.touches_required
                    );
                    self.fail(core, cx);
                } else if self.downs <= self.config.taps_required {
                    cx.schedule_in(TimerKind::Failed, self.config.double_tap_timeout);
                } else {
                    warn!("long press: lifted too early");
                    self.fail(core, cx);
                }
            }
            State::Began | State::Changed => {
                self.started = false;
                self.downs = 0;
                cx.awaiting = false;
                self.end(core, cx);
                cx.schedule_in(TimerKind::Reset, 0);
            }
            _ => {
                self.started = false;
                if core.state.is_terminal() {
                    cx.schedule_in(TimerKind::Reset, 0);
                }
            }
        }
    }

    fn on_long_press(&mut self, core: &mut Core, cx: &mut Cx<'_>) {
        cx.cancel(TimerKind::Failed);
        if core.state != State::Possible || !self.started {
            return;
        }
        if self.touches != self.config.touches_required {
            warn!(
                "long press: {} touches, {} required",
                self.touches, self.config.touches_required
            );
            self.fail(core, cx);
            return;
        }
        self.start = core.location();
        self.begin(core, cx);
    }

    fn begin(&mut self, core: &mut Core, cx: &mut Cx<'_>) {
        self.retry_begin = false;
        match core.try_begin(cx, self.details()) {
            Begin::Fired | Begin::Awaiting => {}
            // Try again on the next move.
            Begin::Blocked => self.retry_begin = true,
            Begin::Refused | Begin::Vetoed => {
                cx.cancel_all();
                self.started = false;
                self.downs = 0;
            }
        }
    }
}

impl Machine for LongPress {
    fn on_pointer(&mut self, core: &mut Core, cx: &mut Cx<'_>, event: &PointerEvent) {
        match event.phase {
            PointerPhase::Down => self.on_down(core, cx, event),
            PointerPhase::PointerDown => match core.state {
                State::Possible if self.started => {
                    cx.cancel(TimerKind::PointerUp);
                    self.settling = None;
                    self.touches = core.touches();
                    if self.touches > self.config.touches_required {
                        warn!("long press: too many touches");
                        self.fail(core, cx);
                        return;
                    }
                    self.down_focus = core.location();
                }
                State::Began | State::Changed => self.touches = core.touches(),
                _ => {}
            },
            PointerPhase::PointerUp => match core.state {
                State::Possible if self.started => {
                    self.down_focus = core.location();
                    let counted = self.settling.unwrap_or(self.touches);
                    self.settling = Some(counted.saturating_sub(1));
                    cx.schedule_in(TimerKind::PointerUp, self.config.tap_timeout);
                }
                State::Began | State::Changed => {
                    self.touches = core.touches();
                    if self.touches < self.config.touches_required {
                        self.started = false;
                        cx.awaiting = false;
                        self.end(core, cx);
                        cx.schedule_in(TimerKind::Reset, 0);
                    }
                }
                _ => {}
            },
            PointerPhase::Move => self.on_move(core, cx),
            PointerPhase::Up => self.on_up(core, cx),
            PointerPhase::Cancel => {
                cx.cancel_all();
                cx.awaiting = false;
                self.started = false;
                self.downs = 0;
                if matches!(core.state, State::Possible | State::Began | State::Changed) {
                    core.set_state(State::Cancelled);
                }
                core.began_firing = false;
                cx.schedule_in(TimerKind::Reset, 0);
            }
        }
    }

    fn on_timer(&mut self, core: &mut Core, cx: &mut Cx<'_>, kind: TimerKind) {
        match kind {
            TimerKind::LongPress => self.on_long_press(core, cx),
            TimerKind::Failed => {
                if core.state == State::Possible && self.started {
                    warn!("long press: next tap never came");
                    self.fail(core, cx);
                }
            }
            TimerKind::PointerUp => {
                if let Some(touches) = self.settling.take() {
                    self.touches = touches;
                }
            }
            TimerKind::Reset => {
                if core.state.is_terminal() {
                    core.set_state(State::Possible);
                }
                self.started = false;
                core.began_firing = false;
            }
        }
    }

    fn on_dependency(&mut self, core: &mut Core, cx: &mut Cx<'_>, target: State) {
        match core.settle_dependency(cx, self.details(), target) {
            Some(true) => {
                if self.moved {
                    core.set_state(State::Changed);
                }
            }
            Some(false) => {
                cx.cancel_all();
                self.started = false;
                self.downs = 0;
                core.began_firing = false;
            }
            None => {}
        }
    }

    fn details(&self) -> Details {
        Details::LongPress { start: self.start }
    }

    fn reset(&mut self) {
        *self = Self::new(self.config);
    }

    fn in_sequence(&self) -> bool {
        self.started
    }
}
