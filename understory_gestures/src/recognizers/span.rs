// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Span estimation for pinch: focus, spread of the contacts, and when a
//! scale is in progress.
//!
//! The span is the diameter of the contacts around their focus, taken as
//! twice the mean absolute deviation on each axis combined with `hypot`.
//! For two contacts this is exactly their distance.
//!
//! Adding or removing a contact rebases the span. A scale ends at every
//! rebase and may start again right away if the spread is still large
//! enough; callers that want one continuous gesture across a rebase
//! handle that in their [`ScaleListener`].

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Point, Vec2};

use crate::tracker::PointerTracker;
use crate::types::{PointerEvent, PointerPhase};

/// Receives scale progress from [`SpanDetector::on_event`].
pub(crate) trait ScaleListener {
    /// Return `false` to keep the detector from entering a scale.
    fn on_scale_begin(&mut self, detector: &SpanDetector) -> bool;
    /// Return `false` to keep accumulating against the same previous span.
    fn on_scale(&mut self, detector: &SpanDetector) -> bool;
    fn on_scale_end(&mut self, detector: &SpanDetector);
}

#[derive(Clone, Debug, Default)]
pub(crate) struct SpanDetector {
    current_span: f64,
    previous_span: f64,
    initial_span: f64,
    current_time: u64,
    previous_time: u64,
    in_progress: bool,
    span_slop: f64,
    min_span: f64,
}

impl SpanDetector {
    pub(crate) fn new(span_slop: f64, min_span: f64) -> Self {
        Self {
            span_slop,
            min_span,
            ..Self::default()
        }
    }

    pub(crate) fn current_span(&self) -> f64 {
        self.current_span
    }

    pub(crate) fn previous_span(&self) -> f64 {
        self.previous_span
    }

    pub(crate) fn scale_factor(&self) -> f64 {
        if self.previous_span > 0.0 {
            self.current_span / self.previous_span
        } else {
            1.0
        }
    }

    pub(crate) fn time_delta(&self) -> u64 {
        self.current_time.saturating_sub(self.previous_time)
    }

    /// Focus and span of the live contacts, excluding one being lifted.
    pub(crate) fn measure(pointers: &PointerTracker, event: &PointerEvent) -> (Point, f64) {
        let mut sum = Vec2::ZERO;
        let mut n = 0.0;
        for (_, p) in pointers.positions(event) {
            sum += p.to_vec2();
            n += 1.0;
        }
        if n == 0.0 {
            return (Point::ZERO, 0.0);
        }
        let focus = (sum / n).to_point();
        let mut dev = Vec2::ZERO;
        for (_, p) in pointers.positions(event) {
            let d = p - focus;
            dev += Vec2::new(d.x.abs(), d.y.abs());
        }
        let span = (dev / n * 2.0).hypot();
        (focus, span)
    }

    /// Feed one event, already reduced to its phase, time, and span as
    /// given by [`measure`](Self::measure).
    pub(crate) fn on_event(
        &mut self,
        phase: PointerPhase,
        timestamp: u64,
        span: f64,
        listener: &mut dyn ScaleListener,
    ) {
        self.current_time = timestamp;

        let stream_complete = matches!(phase, PointerPhase::Up | PointerPhase::Cancel);
        if phase == PointerPhase::Down || stream_complete {
            if self.in_progress {
                listener.on_scale_end(self);
                self.in_progress = false;
                self.initial_span = 0.0;
            }
            if stream_complete {
                return;
            }
        }

        let config_changed = matches!(
            phase,
            PointerPhase::Down | PointerPhase::PointerDown | PointerPhase::PointerUp
        );

        let was_in_progress = self.in_progress;
        if self.in_progress && config_changed {
            listener.on_scale_end(self);
            self.in_progress = false;
            self.initial_span = span;
        }
        if config_changed {
            self.initial_span = span;
            self.current_span = span;
            self.previous_span = span;
        }

        if !self.in_progress
            && span >= self.min_span
            && (was_in_progress || (span - self.initial_span).abs() > self.span_slop)
        {
            self.current_span = span;
            self.previous_span = span;
            self.previous_time = self.current_time;
            self.in_progress = listener.on_scale_begin(self);
        }

        if phase == PointerPhase::Move {
            self.current_span = span;
            let mut update_previous = true;
            if self.in_progress {
                update_previous = listener.on_scale(self);
            }
            if update_previous {
                self.previous_span = self.current_span;
                self.previous_time = self.current_time;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::PointerStream;
    use alloc::vec::Vec;

    #[derive(Default)]
    struct Record {
        events: Vec<(&'static str, f64)>,
    }

    impl ScaleListener for Record {
        fn on_scale_begin(&mut self, d: &SpanDetector) -> bool {
            self.events.push(("begin", d.current_span()));
            true
        }
        fn on_scale(&mut self, d: &SpanDetector) -> bool {
            self.events.push(("scale", d.scale_factor()));
            true
        }
        fn on_scale_end(&mut self, d: &SpanDetector) {
            self.events.push(("end", d.current_span()));
        }
    }

    fn feed(det: &mut SpanDetector, p: &mut PointerTracker, rec: &mut Record, ev: &PointerEvent) {
        p.update(ev);
        let (_, span) = SpanDetector::measure(p, ev);
        det.on_event(ev.phase, ev.timestamp, span, rec);
    }

    #[test]
    fn two_pointer_span_is_their_distance() {
        let mut s = PointerStream::new();
        let mut p = PointerTracker::default();
        p.update(&s.down(0, Point::new(0.0, 0.0), 0));
        let ev = s.down(1, Point::new(30.0, 40.0), 0);
        p.update(&ev);
        let (focus, span) = SpanDetector::measure(&p, &ev);
        assert_eq!(focus, Point::new(15.0, 20.0));
        assert!((span - 50.0).abs() < 1e-9);
    }

    #[test]
    fn scale_begins_after_span_slop() {
        let mut s = PointerStream::new();
        let mut p = PointerTracker::default();
        let mut det = SpanDetector::new(16.0, 32.0);
        let mut rec = Record::default();
        feed(&mut det, &mut p, &mut rec, &s.down(0, Point::new(100.0, 0.0), 0));
        feed(&mut det, &mut p, &mut rec, &s.down(1, Point::new(200.0, 0.0), 0));
        // 10 px wider: inside the slop.
        feed(&mut det, &mut p, &mut rec, &s.move_to(1, Point::new(210.0, 0.0), 10));
        assert!(rec.events.is_empty());
        // 120 wide now.
        feed(&mut det, &mut p, &mut rec, &s.move_to(1, Point::new(220.0, 0.0), 20));
        assert_eq!(rec.events[0], ("begin", 120.0));
        assert_eq!(rec.events[1], ("scale", 1.0));
        feed(&mut det, &mut p, &mut rec, &s.move_to(1, Point::new(340.0, 0.0), 30));
        assert_eq!(rec.events[2], ("scale", 2.0));
        feed(&mut det, &mut p, &mut rec, &s.up(1, 40));
        assert_eq!(rec.events[3].0, "end");
    }

    #[test]
    fn small_spans_never_begin() {
        let mut s = PointerStream::new();
        let mut p = PointerTracker::default();
        let mut det = SpanDetector::new(16.0, 500.0);
        let mut rec = Record::default();
        feed(&mut det, &mut p, &mut rec, &s.down(0, Point::new(0.0, 0.0), 0));
        feed(&mut det, &mut p, &mut rec, &s.down(1, Point::new(10.0, 0.0), 0));
        feed(&mut det, &mut p, &mut rec, &s.move_to(1, Point::new(200.0, 0.0), 10));
        assert!(rec.events.is_empty());
    }
}
