// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Competing recognizers.
//!
//! A single tap waits for a double tap to fail, and an arbiter keeps a pan
//! from being recognized while a pinch is already running. Every state change
//! is printed as it happens.
//!
//! Run:
//! - `cargo run -p understory_examples --example gestures_competition`

use kurbo::Point;
use understory_gestures::arbiter::Arbiter;
use understory_gestures::dispatcher::Dispatcher;
use understory_gestures::recognizer::Recognizer;
use understory_gestures::recognizers::{PanConfig, PinchConfig, TapConfig};
use understory_gestures::stream::PointerStream;
use understory_gestures::types::{GestureKind, GestureView, StateChange};

#[derive(Debug)]
struct PinchOverPan;

impl Arbiter for PinchOverPan {
    fn should_recognize_simultaneously(
        &self,
        recognizer: &GestureView<'_>,
        other: &GestureView<'_>,
    ) -> bool {
        !(recognizer.kind == GestureKind::Pan && other.kind == GestureKind::Pinch)
    }
}

fn traced(recognizer: Recognizer, tag: &'static str) -> Recognizer {
    recognizer
        .with_tag(tag)
        .with_state_listener(move |c: &StateChange| {
            println!("  {tag:<7} {:?} -> {:?}", c.from, c.to);
        })
        .with_action(|v: &GestureView<'_>| {
            println!("  {:<7} fired in {:?}", v.tag.unwrap_or("?"), v.state);
        })
}

fn main() {
    let mut dispatcher = Dispatcher::with_arbiter(PinchOverPan);
    let double = dispatcher.add(traced(
        Recognizer::tap(TapConfig {
            taps_required: 2,
            ..TapConfig::default()
        }),
        "double",
    ));
    let single = dispatcher.add(traced(Recognizer::tap(TapConfig::default()), "single"));
    if let Err(err) = dispatcher.require_failure_of(single, Some(double)) {
        eprintln!("cannot wire taps: {err}");
        return;
    }
    dispatcher.add(traced(Recognizer::pinch(PinchConfig::default()), "pinch"));
    dispatcher.add(traced(Recognizer::pan(PanConfig::default()), "pan"));

    let mut s = PointerStream::new();

    println!("== One tap: the single tap fires once the double tap gives up ==");
    dispatcher.process(&s.down(0, Point::new(50.0, 50.0), 0));
    dispatcher.process(&s.up(0, 50));
    if let Some(deadline) = dispatcher.next_deadline() {
        println!("  (idle until {deadline} ms)");
        dispatcher.advance(deadline);
    }
    dispatcher.advance(1000);

    println!("== Two taps: only the double tap fires ==");
    dispatcher.process(&s.down(0, Point::new(50.0, 50.0), 2000));
    dispatcher.process(&s.up(0, 2040));
    dispatcher.process(&s.down(0, Point::new(52.0, 50.0), 2150));
    dispatcher.process(&s.up(0, 2190));
    dispatcher.advance(3000);

    println!("== Two fingers spreading while drifting: pinch wins, pan waits ==");
    dispatcher.process(&s.down(0, Point::new(300.0, 300.0), 4000));
    dispatcher.process(&s.down(1, Point::new(360.0, 300.0), 4004));
    for i in 1..=4_u32 {
        let spread = f64::from(i) * 25.0;
        let drift = f64::from(i) * 15.0;
        dispatcher.process(&s.move_all(
            &[
                (0, Point::new(300.0 - spread, 300.0 + drift)),
                (1, Point::new(360.0 + spread, 300.0 + drift)),
            ],
            4004 + u64::from(i) * 16,
        ));
    }
    dispatcher.process(&s.up(1, 4100));
    dispatcher.process(&s.up(0, 4110));
    dispatcher.advance(5000);
}
