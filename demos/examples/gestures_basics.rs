// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Gesture basics.
//!
//! Attaches a tap, a pan, and a pinch to one dispatcher, then replays three
//! short touch streams and prints what each recognizer reports.
//!
//! Run:
//! - `cargo run -p understory_examples --example gestures_basics`

use kurbo::Point;
use understory_gestures::dispatcher::Dispatcher;
use understory_gestures::recognizer::Recognizer;
use understory_gestures::recognizers::{PanConfig, PinchConfig, TapConfig};
use understory_gestures::stream::PointerStream;
use understory_gestures::types::{Details, GestureView};

fn report(view: &GestureView<'_>) {
    let what = match view.details {
        Details::Tap { taps } => format!("taps={taps}"),
        Details::Pan {
            translation,
            velocity,
            ..
        } => format!(
            "translation=({:.1}, {:.1}) velocity=({:.0}, {:.0})",
            translation.x, translation.y, velocity.x, velocity.y
        ),
        Details::Pinch { scale, span, .. } => format!("scale={scale:.3} span={span:.1}"),
        other => format!("{other:?}"),
    };
    println!(
        "  {:<6} {:?} at ({:.1}, {:.1}) {}",
        view.tag.unwrap_or("?"),
        view.state,
        view.location.x,
        view.location.y,
        what
    );
}

fn main() {
    let mut dispatcher = Dispatcher::new();
    dispatcher.add(
        Recognizer::tap(TapConfig::default())
            .with_tag("tap")
            .with_action(report),
    );
    dispatcher.add(
        Recognizer::pan(PanConfig::default())
            .with_tag("pan")
            .with_action(report),
    );
    dispatcher.add(
        Recognizer::pinch(PinchConfig::default())
            .with_tag("pinch")
            .with_action(report),
    );

    let mut s = PointerStream::new();

    println!("== Tap ==");
    dispatcher.process(&s.down(0, Point::new(40.0, 40.0), 0));
    dispatcher.process(&s.up(0, 60));

    println!("== Drag ==");
    dispatcher.process(&s.down(0, Point::new(100.0, 100.0), 1000));
    for i in 1..=5_u32 {
        let x = 100.0 + f64::from(i) * 12.0;
        dispatcher.process(&s.move_to(0, Point::new(x, 100.0), 1000 + u64::from(i) * 16));
    }
    dispatcher.process(&s.up(0, 1100));

    println!("== Pinch out ==");
    dispatcher.process(&s.down(0, Point::new(200.0, 200.0), 2000));
    dispatcher.process(&s.down(1, Point::new(260.0, 200.0), 2004));
    for i in 1..=4_u32 {
        let spread = f64::from(i) * 20.0;
        dispatcher.process(&s.move_all(
            &[
                (0, Point::new(200.0 - spread, 200.0)),
                (1, Point::new(260.0 + spread, 200.0)),
            ],
            2004 + u64::from(i) * 16,
        ));
    }
    dispatcher.process(&s.up(1, 2100));
    dispatcher.process(&s.up(0, 2110));

    dispatcher.advance(3000);
}
