// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types for gesture recognition: states, pointer events, identifiers, and views.
//!
//! ## Overview
//!
//! These types describe what flows into the [`Dispatcher`](crate::dispatcher::Dispatcher)
//! (pointer events) and what flows out of it (state changes and [`GestureView`] snapshots).
//! They carry no behavior beyond the state automaton in [`State::can_transition_to`].

use alloc::vec::Vec;
use kurbo::{Point, Vec2};

use crate::recognizers::{ScreenEdge, SwipeDirection, normalize_degrees};

/// Recognition state of a single recognizer.
///
/// Every recognizer starts in [`Possible`](State::Possible). Discrete gestures
/// (tap, swipe) move straight to [`Ended`](State::Ended) on success, while
/// continuous gestures go through [`Began`](State::Began) and
/// [`Changed`](State::Changed) first.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum State {
    /// Waiting for input that could match.
    #[default]
    Possible,
    /// A continuous gesture was recognized and is now tracking.
    Began,
    /// A continuous gesture received an update.
    Changed,
    /// The input can no longer match this gesture.
    Failed,
    /// The gesture was interrupted by a cancel event.
    Cancelled,
    /// The gesture completed.
    Ended,
}

impl State {
    /// Returns `true` for the states that end a gesture cycle.
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Ended | Self::Failed | Self::Cancelled)
    }

    /// Returns `true` for the success states.
    #[inline]
    pub const fn is_recognized(self) -> bool {
        matches!(self, Self::Began | Self::Changed | Self::Ended)
    }

    /// Returns `true` for the states of a continuous gesture in progress.
    #[inline]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Began | Self::Changed)
    }

    /// Whether the automaton allows moving from `self` to `next`.
    ///
    /// `discrete` selects the edge set of discrete gestures, which succeed
    /// directly from `Possible` into `Ended` and may still be vetoed from
    /// `Ended` into `Failed` while waiting on a failure dependency.
    pub const fn can_transition_to(self, next: Self, discrete: bool) -> bool {
        use State::*;
        match (self, next) {
            (Possible, Failed | Cancelled) => true,
            (Possible, Ended) => discrete,
            (Possible, Began) => !discrete,
            (Began, Changed | Ended | Failed | Cancelled) => !discrete,
            (Changed, Changed | Ended | Cancelled) => !discrete,
            (Ended, Failed) => discrete,
            (Ended | Failed | Cancelled, Possible) => true,
            _ => false,
        }
    }
}

/// Identifier of a physical contact within a touch stream.
///
/// Ids are stable for the lifetime of a contact and may be reused after release.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct PointerId(pub u32);

/// One contact and its position in surface coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pointer {
    /// Contact identifier.
    pub id: PointerId,
    /// Position in surface coordinates.
    pub position: Point,
}

impl Pointer {
    /// Create a pointer from an id and a position.
    pub const fn new(id: PointerId, position: Point) -> Self {
        Self { id, position }
    }
}

/// What happened to the pointer at [`PointerEvent::action_index`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum PointerPhase {
    /// First contact of a touch stream.
    Down,
    /// One or more contacts moved.
    Move,
    /// Last contact lifted; the touch stream ends.
    Up,
    /// An additional contact touched down.
    PointerDown,
    /// A non-final contact lifted.
    PointerUp,
    /// The host aborted the touch stream.
    Cancel,
}

/// A multi-pointer input event.
///
/// Timestamps are in milliseconds on the same clock the
/// [`Dispatcher`](crate::dispatcher::Dispatcher) uses for its deferred actions.
#[derive(Clone, Debug, PartialEq)]
pub struct PointerEvent {
    /// Kind of change.
    pub phase: PointerPhase,
    /// All contacts currently on the surface, including one being lifted.
    pub pointers: Vec<Pointer>,
    /// Index into `pointers` of the contact that changed.
    pub action_index: usize,
    /// Event time in milliseconds.
    pub timestamp: u64,
    /// Time of the `Down` that started this touch stream.
    pub down_timestamp: u64,
}

impl PointerEvent {
    /// Create an event whose action pointer is the first one and whose stream
    /// started at `timestamp`.
    pub fn new(phase: PointerPhase, pointers: Vec<Pointer>, timestamp: u64) -> Self {
        Self {
            phase,
            pointers,
            action_index: 0,
            timestamp,
            down_timestamp: timestamp,
        }
    }

    /// Set the index of the contact that changed.
    #[must_use]
    pub fn with_action_index(mut self, action_index: usize) -> Self {
        self.action_index = action_index;
        self
    }

    /// Set the start time of the touch stream.
    #[must_use]
    pub fn with_down_timestamp(mut self, down_timestamp: u64) -> Self {
        self.down_timestamp = down_timestamp;
        self
    }

    /// The contact that changed, if `action_index` is in range.
    pub fn action_pointer(&self) -> Option<&Pointer> {
        self.pointers.get(self.action_index)
    }

    /// Position of the contact with `id`, if present in this event.
    pub fn position_of(&self, id: PointerId) -> Option<Point> {
        self.pointers
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.position)
    }

    /// `true` for the event that starts a touch stream.
    pub fn is_stream_start(&self) -> bool {
        self.phase == PointerPhase::Down
    }

    /// `true` for the events that end a touch stream.
    pub fn is_stream_end(&self) -> bool {
        matches!(self.phase, PointerPhase::Up | PointerPhase::Cancel)
    }
}

/// Identifier for a recognizer attached to a [`Dispatcher`](crate::dispatcher::Dispatcher).
///
/// A slot index plus a generation counter. Removing a recognizer frees its
/// slot; reusing the slot bumps the generation, so a stale id never refers to
/// a different recognizer.
///
/// Ordering follows `(slot, generation)` and is only meant for use as a map key.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct RecognizerId(pub(crate) u32, pub(crate) u32);

impl RecognizerId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    /// Generation of the slot this id was issued for.
    pub const fn generation(self) -> u32 {
        self.1
    }
}

/// The kind of a recognizer.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum GestureKind {
    /// One or more taps with one or more fingers.
    Tap,
    /// A press held in place.
    LongPress,
    /// A drag.
    Pan,
    /// Two or more fingers moving apart or together.
    Pinch,
    /// Two fingers turning around each other.
    Rotate,
    /// A quick directional flick.
    Swipe,
    /// A drag that starts at a surface edge.
    ScreenEdgePan,
}

impl GestureKind {
    /// Discrete gestures succeed at most once per touch stream and skip
    /// `Began`/`Changed`.
    pub const fn is_discrete(self) -> bool {
        matches!(self, Self::Tap | Self::Swipe)
    }
}

/// Per-kind geometry carried by a [`GestureView`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Details {
    /// Tap geometry.
    Tap {
        /// Taps counted in the current sequence.
        taps: usize,
    },
    /// Long-press geometry.
    LongPress {
        /// Focus when the press started.
        start: Point,
    },
    /// Pan geometry.
    Pan {
        /// Focus displacement since the pan began.
        translation: Vec2,
        /// Focus velocity in pixels per second.
        velocity: Vec2,
        /// Whether the pan ended fast enough to count as a fling.
        fling: bool,
    },
    /// Screen-edge pan geometry.
    ScreenEdgePan {
        /// The edge this recognizer watches.
        edge: ScreenEdge,
        /// Focus displacement since the pan began.
        translation: Vec2,
        /// Focus velocity in pixels per second.
        velocity: Vec2,
        /// Whether the pan ended fast enough to count as a fling.
        fling: bool,
    },
    /// Pinch geometry.
    Pinch {
        /// Product of every scale factor since the pinch began.
        scale: f64,
        /// Current span divided by the previous span.
        scale_factor: f64,
        /// Current span.
        span: f64,
        /// Span at the previous update.
        previous_span: f64,
        /// Milliseconds since the previous update.
        time_delta: u64,
    },
    /// Rotation geometry.
    Rotate {
        /// Accumulated rotation in radians.
        rotation: f64,
        /// Angular velocity in radians per second.
        velocity: f64,
    },
    /// Swipe geometry.
    Swipe {
        /// Direction of the recognized swipe; empty until recognized.
        direction: SwipeDirection,
        /// Focus displacement since the down event.
        translation: Vec2,
        /// Focus velocity in pixels per second.
        velocity: Vec2,
    },
}

impl Details {
    /// The kind these details belong to.
    pub const fn kind(&self) -> GestureKind {
        match self {
            Self::Tap { .. } => GestureKind::Tap,
            Self::LongPress { .. } => GestureKind::LongPress,
            Self::Pan { .. } => GestureKind::Pan,
            Self::ScreenEdgePan { .. } => GestureKind::ScreenEdgePan,
            Self::Pinch { .. } => GestureKind::Pinch,
            Self::Rotate { .. } => GestureKind::Rotate,
            Self::Swipe { .. } => GestureKind::Swipe,
        }
    }

    /// Rotation in degrees, wrapped into `[-180, 180]`.
    ///
    /// `None` for anything but rotate details.
    pub fn rotation_in_degrees(&self) -> Option<f64> {
        match *self {
            Self::Rotate { rotation, .. } => {
                Some(normalize_degrees(rotation.to_degrees()))
            }
            _ => None,
        }
    }
}

/// Borrowed snapshot of a recognizer.
///
/// Handed to action listeners when a gesture fires and to the
/// [`Arbiter`](crate::arbiter::Arbiter) when a policy decision is needed.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GestureView<'a> {
    /// Recognizer id, or `None` while detached.
    pub id: Option<RecognizerId>,
    /// Recognizer kind.
    pub kind: GestureKind,
    /// Optional application label.
    pub tag: Option<&'a str>,
    /// Current state.
    pub state: State,
    /// Centroid of the live contacts.
    pub location: Point,
    /// Number of live contacts.
    pub number_of_touches: usize,
    /// Per-kind geometry.
    pub details: Details,
}

/// A single state transition, as reported to a state listener.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct StateChange {
    /// Recognizer id, or `None` while detached.
    pub id: Option<RecognizerId>,
    /// Recognizer kind.
    pub kind: GestureKind,
    /// State before the transition.
    pub from: State,
    /// State after the transition.
    pub to: State,
}

impl StateChange {
    /// Whether this change is an edge of the state automaton for its kind.
    pub const fn is_legal(&self) -> bool {
        self.from.can_transition_to(self.to, self.kind.is_discrete())
    }
}
