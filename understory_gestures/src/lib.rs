// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Gestures: deterministic, `no_std` gesture recognizers.
//!
//! ## Overview
//!
//! This crate turns a stream of multi-pointer events into recognized gestures:
//! taps and multi-taps, long presses, pans, screen-edge pans, pinches,
//! rotations, and swipes. It does not hit test and does not own a clock.
//! Feed it [`PointerEvent`](crate::types::PointerEvent)s already routed to one
//! surface, and advance time explicitly; it invokes your callbacks
//! synchronously on the calling thread.
//!
//! ## Recognizers
//!
//! Every [`Recognizer`](crate::recognizer::Recognizer) walks the same state
//! automaton:
//!
//! ```text
//! discrete   (tap, swipe):  Possible -> Ended | Failed | Cancelled -> Possible
//! continuous (the rest):    Possible -> Began -> Changed* -> Ended | Cancelled -> Possible
//! ```
//!
//! The action callback fires on success (discrete) or on every update after
//! the gesture began (continuous). Per-kind geometry travels in
//! [`Details`](crate::types::Details).
//!
//! ## Competition
//!
//! Recognizers attached to one [`Dispatcher`](crate::dispatcher::Dispatcher)
//! see the same events, in registration order. Two mechanisms decide who wins:
//!
//! - Failure dependencies: a recognizer can be made to wait for another one
//!   to fail before it fires, the classic single tap waiting on a double tap.
//! - An [`Arbiter`](crate::arbiter::Arbiter): application policy that can
//!   veto a begin, keep a recognizer out of a touch stream, or forbid two
//!   gestures from being recognized at once.
//!
//! ## Time
//!
//! Timeouts (double-tap windows, long-press delays, resets) are deferred
//! actions kept by a [`Scheduler`](crate::scheduler::Scheduler). They run when
//! the dispatcher is told the time has come, either by the timestamp of the
//! next event or by [`Dispatcher::advance`](crate::dispatcher::Dispatcher::advance).
//! Replaying the same events yields the same callbacks.
//!
//! ## Example
//!
//! ```
//! use kurbo::Point;
//! use understory_gestures::dispatcher::Dispatcher;
//! use understory_gestures::recognizer::Recognizer;
//! use understory_gestures::recognizers::PanConfig;
//! use understory_gestures::stream::PointerStream;
//! use understory_gestures::types::{Details, State};
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.add(Recognizer::pan(PanConfig::default()).with_action(|view| {
//!     if let Details::Pan { translation, .. } = view.details {
//!         assert!(view.state != State::Possible);
//!         let _ = translation;
//!     }
//! }));
//!
//! let mut stream = PointerStream::new();
//! dispatcher.process(&stream.down(0, Point::new(10.0, 10.0), 0));
//! dispatcher.process(&stream.move_to(0, Point::new(40.0, 10.0), 16));
//! dispatcher.process(&stream.up(0, 32));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod arbiter;
pub mod config;
pub mod dispatcher;
pub mod recognizer;
pub mod recognizers;
pub mod scheduler;
pub mod stream;
pub mod types;

mod error;
mod tracker;
mod velocity;

pub use error::Error;
