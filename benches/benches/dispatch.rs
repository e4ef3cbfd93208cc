// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::{Point, Size};
use understory_gestures::dispatcher::Dispatcher;
use understory_gestures::recognizer::Recognizer;
use understory_gestures::recognizers::{
    LongPressConfig, PanConfig, PinchConfig, RotateConfig, ScreenEdge, ScreenEdgePanConfig,
    SwipeConfig, SwipeDirection, TapConfig,
};
use understory_gestures::stream::PointerStream;
use understory_gestures::types::PointerEvent;

fn full_set() -> Dispatcher {
    let bounds = Size::new(1000.0, 1000.0);
    let mut d = Dispatcher::new();
    let single = d.add(Recognizer::tap(TapConfig::default()));
    let double = d.add(Recognizer::tap(TapConfig {
        taps_required: 2,
        ..TapConfig::default()
    }));
    d.require_failure_of(single, Some(double)).expect("valid edge");
    d.add(Recognizer::long_press(LongPressConfig::default()));
    d.add(Recognizer::pan(PanConfig::default()));
    d.add(Recognizer::screen_edge_pan(ScreenEdgePanConfig::new(
        ScreenEdge::Left,
        bounds,
    )));
    d.add(Recognizer::pinch(PinchConfig::default()));
    d.add(Recognizer::rotate(RotateConfig::default()));
    d.add(Recognizer::swipe(SwipeConfig::new(SwipeDirection::all())));
    d
}

/// One finger dragged along a line in `steps` moves.
fn drag(steps: usize) -> Vec<PointerEvent> {
    let mut s = PointerStream::new();
    let mut out = Vec::with_capacity(steps + 2);
    out.push(s.down(0, Point::new(100.0, 100.0), 0));
    for i in 1..=steps {
        let t = i as u64 * 8;
        out.push(s.move_to(0, Point::new(100.0 + i as f64 * 3.0, 100.0), t));
    }
    out.push(s.up(0, (steps as u64 + 1) * 8));
    out
}

/// Two fingers spreading and turning around a common center in `steps` moves.
fn pinch_and_turn(steps: usize) -> Vec<PointerEvent> {
    let center = Point::new(500.0, 500.0);
    let at = |radius: f64, angle: f64| center + kurbo::Vec2::from_angle(angle) * radius;
    let mut s = PointerStream::new();
    let mut out = Vec::with_capacity(steps + 4);
    out.push(s.down(0, at(50.0, 0.0), 0));
    out.push(s.down(1, at(50.0, core::f64::consts::PI), 4));
    for i in 1..=steps {
        let t = i as u64 * 8;
        let r = 50.0 + i as f64 * 2.0;
        let a = i as f64 * 0.02;
        out.push(s.move_all(&[(0, at(r, a)), (1, at(r, a + core::f64::consts::PI))], t));
    }
    let end = (steps as u64 + 1) * 8;
    out.push(s.up(1, end));
    out.push(s.up(0, end + 4));
    out
}

/// A burst of quick taps, each far enough from the last to start a new sequence.
fn taps(count: usize) -> Vec<PointerEvent> {
    let mut s = PointerStream::new();
    let mut out = Vec::with_capacity(count * 2);
    for i in 0..count {
        let t = i as u64 * 400;
        let p = Point::new(50.0 + (i % 10) as f64 * 80.0, 300.0);
        out.push(s.down(0, p, t));
        out.push(s.up(0, t + 40));
    }
    out
}

fn bench_streams(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    let cases = [
        ("drag_256", drag(256)),
        ("pinch_and_turn_256", pinch_and_turn(256)),
        ("taps_64", taps(64)),
    ];
    for (name, events) in &cases {
        group.throughput(Throughput::Elements(events.len() as u64));
        group.bench_function(*name, |b| {
            b.iter_batched(
                full_set,
                |mut d| {
                    let mut consumed = false;
                    for ev in events {
                        consumed |= d.process(ev);
                    }
                    d.advance(1_000_000);
                    black_box(consumed);
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_idle_advance(c: &mut Criterion) {
    let mut group = c.benchmark_group("advance");
    for &n in &[8usize, 64, 256] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("pending_timers_n{}", n), |b| {
            b.iter_batched(
                || {
                    let mut d = Dispatcher::new();
                    for _ in 0..n {
                        d.add(Recognizer::long_press(LongPressConfig::default()));
                    }
                    let mut s = PointerStream::new();
                    d.process(&s.down(0, Point::new(10.0, 10.0), 0));
                    d
                },
                |mut d| {
                    d.advance(10_000);
                    black_box(d.next_deadline());
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_streams, bench_idle_advance);
criterion_main!(benches);
