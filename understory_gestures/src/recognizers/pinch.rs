// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pinch: two or more contacts moving apart or together.
//!
//! The span between the contacts is estimated by a [`SpanDetector`]. A pinch
//! begins once the span leaves the span slop around its starting value and
//! is at least the minimum span. The reported scale is the running product
//! of per-update scale factors, starting at `1.0`.
//!
//! Adding or lifting a contact while at least two remain continues the same
//! pinch against a rebased span. Dropping below two contacts ends it.

use log::trace;

use crate::config::TouchConfig;
use crate::recognizer::{Begin, Core, Cx, Gesture, Machine, Recognizer};
use crate::recognizers::span::{ScaleListener, SpanDetector};
use crate::scheduler::TimerKind;
use crate::types::{Details, GestureKind, PointerEvent, PointerPhase, State};

/// Configuration of a pinch recognizer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PinchConfig {
    /// Touch slop; the span must change by twice this before a pinch begins.
    pub touch_slop: f64,
    /// Smallest span at which a pinch may begin.
    pub minimum_span: f64,
}

impl PinchConfig {
    /// Seed from platform metrics.
    pub fn from_touch_config(c: &TouchConfig) -> Self {
        Self {
            touch_slop: c.touch_slop,
            minimum_span: c.minimum_scaling_span,
        }
    }
}

impl Default for PinchConfig {
    fn default() -> Self {
        Self::from_touch_config(&TouchConfig::DEFAULT)
    }
}

impl Recognizer {
    /// A pinch recognizer.
    pub fn pinch(config: PinchConfig) -> Self {
        Self::from_gesture(GestureKind::Pinch, Gesture::Pinch(Pinch::new(config)))
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Pinch {
    config: PinchConfig,
    detector: SpanDetector,
    scale: f64,
    /// The detector ended a scale because the contact set changed; a begin
    /// on the same event continues the pinch.
    rebasing: bool,
}

impl Pinch {
    fn new(config: PinchConfig) -> Self {
        Self {
            config,
            detector: SpanDetector::new(config.touch_slop * 2.0, config.minimum_span),
            scale: 1.0,
            rebasing: false,
        }
    }
}

fn details_of(scale: f64, detector: &SpanDetector) -> Details {
    Details::Pinch {
        scale,
        scale_factor: detector.scale_factor(),
        span: detector.current_span(),
        previous_span: detector.previous_span(),
        time_delta: detector.time_delta(),
    }
}

fn finish(core: &mut Core, cx: &mut Cx<'_>, details: Details, cancelled: bool) {
    cx.awaiting = false;
    if cancelled {
        core.set_state(State::Cancelled);
        core.began_firing = false;
    } else {
        core.set_state(State::Ended);
        core.fire_if_began(details);
    }
}

/// Couples detector callbacks to the recognizer for one event.
struct Handler<'a, 'b> {
    core: &'a mut Core,
    cx: &'a mut Cx<'b>,
    scale: &'a mut f64,
    rebasing: &'a mut bool,
    phase: PointerPhase,
}

impl ScaleListener for Handler<'_, '_> {
    fn on_scale_begin(&mut self, detector: &SpanDetector) -> bool {
        if *self.rebasing {
            *self.rebasing = false;
            trace!("pinch: continuing across a contact change");
            return true;
        }
        if self.core.state != State::Possible {
            return false;
        }
        *self.scale = 1.0;
        match self.core.try_begin(self.cx, details_of(1.0, detector)) {
            // Retried on the next move outside the slop.
            Begin::Blocked => false,
            Begin::Refused | Begin::Vetoed => false,
            Begin::Fired | Begin::Awaiting => true,
        }
    }

    fn on_scale(&mut self, detector: &SpanDetector) -> bool {
        if !self.core.state.is_active() {
            return true;
        }
        *self.scale *= detector.scale_factor();
        if self.core.began_firing {
            self.core.set_state(State::Changed);
            self.core.fire(details_of(*self.scale, detector));
        }
        true
    }

    fn on_scale_end(&mut self, detector: &SpanDetector) {
        if !self.core.state.is_active() {
            return;
        }
        let contact_change = matches!(
            self.phase,
            PointerPhase::PointerDown | PointerPhase::PointerUp
        );
        if contact_change && self.core.touches() >= 2 {
            *self.rebasing = true;
            return;
        }
        finish(
            self.core,
            self.cx,
            details_of(*self.scale, detector),
            self.phase == PointerPhase::Cancel,
        );
    }
}

impl Machine for Pinch {
    fn on_pointer(&mut self, core: &mut Core, cx: &mut Cx<'_>, event: &PointerEvent) {
        if event.phase == PointerPhase::Down {
            cx.cancel(TimerKind::Reset);
            if core.state.is_terminal() {
                core.set_state(State::Possible);
            }
            core.began_firing = false;
            self.scale = 1.0;
            self.rebasing = false;
        }

        let (_, span) = SpanDetector::measure(&core.pointers, event);
        let Self {
            detector,
            scale,
            rebasing,
            ..
        } = self;
        let mut handler = Handler {
            core: &mut *core,
            cx: &mut *cx,
            scale,
            rebasing,
            phase: event.phase,
        };
        detector.on_event(event.phase, event.timestamp, span, &mut handler);

        if self.rebasing {
            // Too little spread left to carry on.
            self.rebasing = false;
            finish(core, cx, self.details(), false);
        }

        match event.phase {
            PointerPhase::Up => {
                if core.state == State::Possible {
                    core.set_state(State::Failed);
                }
                cx.schedule_in(TimerKind::Reset, 0);
            }
            PointerPhase::Cancel => {
                cx.awaiting = false;
                if core.state == State::Possible {
                    core.set_state(State::Cancelled);
                }
                core.began_firing = false;
                cx.schedule_in(TimerKind::Reset, 0);
            }
            _ => {}
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
        details_of(self.scale, &self.detector)
    }

    fn reset(&mut self) {
        *self = Self::new(self.config);
    }
}
