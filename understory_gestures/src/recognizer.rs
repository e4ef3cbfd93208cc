// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The recognizer type and the protocol every gesture kind shares.
//!
//! ## Overview
//!
//! A [`Recognizer`] pairs common bookkeeping (state, tag, listeners, live
//! contacts) with one gesture-specific state machine. Recognizers are built
//! with the constructors in [`recognizers`](crate::recognizers), configured
//! with the `with_*` builders, and then handed to a
//! [`Dispatcher`](crate::dispatcher::Dispatcher), which owns them and feeds
//! them events.
//!
//! ## Succeeding
//!
//! When a gesture is locally ready to succeed it goes through the same steps
//! regardless of kind:
//!
//! 1. If a recognizer registered earlier has succeeded (or is about to) and
//!    the [`Arbiter`](crate::arbiter::Arbiter) does not allow both at once,
//!    stay `Possible` for this event.
//! 2. If [`should_begin`](crate::arbiter::Arbiter::should_begin) says no, fail.
//! 3. Enter `Began` (continuous) or `Ended` (discrete).
//! 4. Check the failure dependency. With none, or with a failed one, fire the
//!    action right away. With one that already succeeded, fail. Otherwise wait:
//!    the dispatcher forwards the dependency's next transitions until it
//!    resolves one way or the other.
//!
//! ## Listeners
//!
//! The action listener runs each time the gesture fires. The optional state
//! listener sees every transition, including the ones that do not fire, and
//! is mostly useful for diagnostics.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use kurbo::Point;
use log::{debug, trace};

use crate::arbiter::Arbiter;
use crate::recognizers::{LongPress, Pan, Pinch, Rotate, Swipe, Tap};
use crate::scheduler::{Scheduler, TimerKey, TimerKind};
use crate::tracker::PointerTracker;
use crate::types::{
    Details, GestureKind, GestureView, PointerEvent, PointerPhase, RecognizerId, State,
    StateChange,
};

/// Callback invoked when a gesture fires.
pub type Action = Box<dyn FnMut(&GestureView<'_>)>;

/// Callback invoked on every state transition.
pub type StateListener = Box<dyn FnMut(&StateChange)>;

/// What the dispatcher lends a recognizer while it handles one input.
pub(crate) struct Cx<'a> {
    pub(crate) now: u64,
    pub(crate) owner: RecognizerId,
    pub(crate) arbiter: &'a dyn Arbiter,
    pub(crate) scheduler: &'a mut dyn Scheduler,
    /// Every slot of the dispatcher; the recognizer being driven is taken out.
    pub(crate) peers: &'a [Option<Recognizer>],
    /// Recognizers registered before this one, in registration order.
    pub(crate) earlier: &'a [RecognizerId],
    pub(crate) dependency: Option<RecognizerId>,
    /// Whether the recognizer is waiting on `dependency`. Read back by the dispatcher.
    pub(crate) awaiting: bool,
}

impl Cx<'_> {
    pub(crate) fn schedule_in(&mut self, kind: TimerKind, delay: u64) {
        self.schedule_at(kind, self.now.saturating_add(delay));
    }

    pub(crate) fn schedule_at(&mut self, kind: TimerKind, deadline: u64) {
        self.scheduler
            .schedule(TimerKey::new(self.owner, kind), deadline);
    }

    pub(crate) fn cancel(&mut self, kind: TimerKind) {
        self.scheduler.cancel(TimerKey::new(self.owner, kind));
    }

    pub(crate) fn cancel_all(&mut self) {
        self.scheduler.cancel_owner(self.owner);
    }

    fn peer(&self, id: RecognizerId) -> Option<&Recognizer> {
        self.peers
            .get(id.idx())?
            .as_ref()
            .filter(|r| r.core.id == Some(id))
    }

    pub(crate) fn dependency_state(&self) -> Option<State> {
        self.peer(self.dependency?).map(|r| r.core.state)
    }

    /// Whether every earlier-registered recognizer that has succeeded, or is
    /// about to, tolerates `view` succeeding too.
    pub(crate) fn allows_simultaneous(&self, view: &GestureView<'_>) -> bool {
        self.earlier
            .iter()
            .filter_map(|id| self.peer(*id))
            .filter(|p| p.core.enabled && p.core.state.is_recognized())
            .all(|p| {
                let other = p.view();
                let ok = self.arbiter.should_recognize_simultaneously(view, &other);
                if !ok {
                    trace!("{:?} held back by {:?}", view.kind, other.kind);
                }
                ok
            })
    }
}

/// Outcome of [`Core::try_begin`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Begin {
    /// An earlier-registered recognizer does not allow this one to succeed yet.
    Blocked,
    /// The arbiter vetoed; now `Failed`.
    Refused,
    /// Succeeded and fired.
    Fired,
    /// Succeeded, waiting on the failure dependency.
    Awaiting,
    /// The failure dependency already succeeded; now `Failed`.
    Vetoed,
}

/// State shared by every gesture kind.
pub(crate) struct Core {
    pub(crate) id: Option<RecognizerId>,
    pub(crate) kind: GestureKind,
    pub(crate) tag: Option<String>,
    pub(crate) state: State,
    pub(crate) enabled: bool,
    pub(crate) cancels_touches_in_view: bool,
    /// Cleared when the arbiter keeps the current touch stream from this recognizer.
    pub(crate) receiving: bool,
    /// Fired at least once in the current cycle.
    pub(crate) began_firing: bool,
    pub(crate) pointers: PointerTracker,
    /// Transitions since the dispatcher last looked; drained for dependents.
    pub(crate) transitions: Vec<State>,
    action: Option<Action>,
    state_listener: Option<StateListener>,
}

impl core::fmt::Debug for Core {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Core")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("tag", &self.tag)
            .field("state", &self.state)
            .field("enabled", &self.enabled)
            .field("began_firing", &self.began_firing)
            .field("touches", &self.pointers.touches())
            .finish_non_exhaustive()
    }
}

impl Core {
    fn new(kind: GestureKind) -> Self {
        Self {
            id: None,
            kind,
            tag: None,
            state: State::Possible,
            enabled: true,
            cancels_touches_in_view: true,
            receiving: true,
            began_firing: false,
            pointers: PointerTracker::default(),
            transitions: Vec::new(),
            action: None,
            state_listener: None,
        }
    }

    pub(crate) fn touches(&self) -> usize {
        self.pointers.touches()
    }

    pub(crate) fn location(&self) -> Point {
        self.pointers.location()
    }

    pub(crate) fn set_state(&mut self, next: State) {
        let from = self.state;
        if from == next && next != State::Changed {
            return;
        }
        self.state = next;
        debug!("{:?} {:?}: {:?} -> {:?}", self.kind, self.id, from, next);
        self.transitions.push(next);
        if let Some(listener) = self.state_listener.as_mut() {
            listener(&StateChange {
                id: self.id,
                kind: self.kind,
                from,
                to: next,
            });
        }
    }

    pub(crate) fn view(&self, details: Details) -> GestureView<'_> {
        GestureView {
            id: self.id,
            kind: self.kind,
            tag: self.tag.as_deref(),
            state: self.state,
            location: self.pointers.location(),
            number_of_touches: self.pointers.touches(),
            details,
        }
    }

    /// Invoke the action listener with the current state.
    pub(crate) fn fire(&mut self, details: Details) {
        self.began_firing = true;
        trace!("{:?} {:?} fires in {:?}", self.kind, self.id, self.state);
        if let Some(action) = self.action.as_mut() {
            let view = GestureView {
                id: self.id,
                kind: self.kind,
                tag: self.tag.as_deref(),
                state: self.state,
                location: self.pointers.location(),
                number_of_touches: self.pointers.touches(),
                details,
            };
            action(&view);
        }
    }

    /// Fire if the gesture already fired once this cycle; a recognizer still
    /// waiting on its dependency stays quiet.
    pub(crate) fn fire_if_began(&mut self, details: Details) {
        if self.began_firing {
            self.fire(details);
        }
    }

    /// Move from `Possible` into the success state, consulting the arbiter and
    /// the failure dependency.
    pub(crate) fn try_begin(&mut self, cx: &mut Cx<'_>, details: Details) -> Begin {
        let (simultaneous, allowed) = {
            let view = self.view(details);
            let simultaneous = cx.allows_simultaneous(&view);
            (simultaneous, simultaneous && cx.arbiter.should_begin(&view))
        };
        if !simultaneous {
            return Begin::Blocked;
        }
        if !allowed {
            debug!("{:?} {:?}: should_begin declined", self.kind, self.id);
            self.set_state(State::Failed);
            return Begin::Refused;
        }
        let success = if self.kind.is_discrete() {
            State::Ended
        } else {
            State::Began
        };
        self.set_state(success);
        match cx.dependency_state() {
            None | Some(State::Failed | State::Cancelled) => {
                self.fire(details);
                Begin::Fired
            }
            Some(State::Began | State::Changed | State::Ended) => {
                self.set_state(State::Failed);
                Begin::Vetoed
            }
            Some(State::Possible) => {
                trace!("{:?} {:?} waits for {:?}", self.kind, self.id, cx.dependency);
                cx.awaiting = true;
                Begin::Awaiting
            }
        }
    }

    /// React to a transition of the failure dependency while waiting on it.
    ///
    /// Returns `Some(true)` when the gesture fired, `Some(false)` when it
    /// failed, and `None` while still waiting.
    pub(crate) fn settle_dependency(
        &mut self,
        cx: &mut Cx<'_>,
        details: Details,
        target: State,
    ) -> Option<bool> {
        match target {
            State::Failed | State::Cancelled => {
                cx.awaiting = false;
                if self.kind.is_discrete() && !cx.allows_simultaneous(&self.view(details)) {
                    self.set_state(State::Failed);
                    return Some(false);
                }
                self.fire(details);
                Some(true)
            }
            State::Began | State::Ended => {
                cx.awaiting = false;
                self.set_state(State::Failed);
                Some(false)
            }
            State::Possible | State::Changed => None,
        }
    }
}

/// Behavior each gesture kind plugs into [`Recognizer`].
pub(crate) trait Machine {
    fn on_pointer(&mut self, core: &mut Core, cx: &mut Cx<'_>, event: &PointerEvent);
    fn on_timer(&mut self, core: &mut Core, cx: &mut Cx<'_>, kind: TimerKind);
    fn on_dependency(&mut self, core: &mut Core, cx: &mut Cx<'_>, target: State);
    fn details(&self) -> Details;
    /// Forget everything about the current cycle.
    fn reset(&mut self);
    /// Whether a new `Down` continues the current sequence (multi-tap).
    fn in_sequence(&self) -> bool {
        false
    }
}

#[derive(Debug)]
pub(crate) enum Gesture {
    Tap(Tap),
    LongPress(LongPress),
    Pan(Pan),
    Pinch(Pinch),
    Rotate(Rotate),
    Swipe(Swipe),
}

impl Gesture {
    fn machine(&mut self) -> &mut dyn Machine {
        match self {
            Self::Tap(g) => g,
            Self::LongPress(g) => g,
            Self::Pan(g) => g,
            Self::Pinch(g) => g,
            Self::Rotate(g) => g,
            Self::Swipe(g) => g,
        }
    }

    fn machine_ref(&self) -> &dyn Machine {
        match self {
            Self::Tap(g) => g,
            Self::LongPress(g) => g,
            Self::Pan(g) => g,
            Self::Pinch(g) => g,
            Self::Rotate(g) => g,
            Self::Swipe(g) => g,
        }
    }
}

/// A gesture recognizer.
///
/// Construct one with [`Recognizer::tap`], [`Recognizer::pan`], and friends,
/// then attach it with [`Dispatcher::add`](crate::dispatcher::Dispatcher::add).
pub struct Recognizer {
    pub(crate) core: Core,
    gesture: Gesture,
}

impl core::fmt::Debug for Recognizer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Recognizer")
            .field("core", &self.core)
            .field("gesture", &self.gesture)
            .finish()
    }
}

impl Recognizer {
    pub(crate) fn from_gesture(kind: GestureKind, gesture: Gesture) -> Self {
        Self {
            core: Core::new(kind),
            gesture,
        }
    }

    /// Label the recognizer.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.core.tag = Some(tag.into());
        self
    }

    /// Set the callback invoked when the gesture fires.
    #[must_use]
    pub fn with_action(mut self, action: impl FnMut(&GestureView<'_>) + 'static) -> Self {
        self.core.action = Some(Box::new(action));
        self
    }

    /// Set the callback invoked on every state transition.
    #[must_use]
    pub fn with_state_listener(mut self, listener: impl FnMut(&StateChange) + 'static) -> Self {
        self.core.state_listener = Some(Box::new(listener));
        self
    }

    /// Set what event processing reports as consumed.
    #[must_use]
    pub fn with_cancels_touches_in_view(mut self, cancels: bool) -> Self {
        self.core.cancels_touches_in_view = cancels;
        self
    }

    /// Replace the tag.
    pub fn set_tag(&mut self, tag: Option<String>) {
        self.core.tag = tag;
    }

    /// Replace the action listener; `None` detaches it.
    pub fn set_action(&mut self, action: Option<Action>) {
        self.core.action = action;
    }

    /// Replace the state listener; `None` detaches it.
    pub fn set_state_listener(&mut self, listener: Option<StateListener>) {
        self.core.state_listener = listener;
    }

    /// Set what event processing reports as consumed.
    pub fn set_cancels_touches_in_view(&mut self, cancels: bool) {
        self.core.cancels_touches_in_view = cancels;
    }

    /// Id assigned by the owning dispatcher, `None` while detached.
    pub fn id(&self) -> Option<RecognizerId> {
        self.core.id
    }

    /// Gesture kind.
    pub fn kind(&self) -> GestureKind {
        self.core.kind
    }

    /// Application label.
    pub fn tag(&self) -> Option<&str> {
        self.core.tag.as_deref()
    }

    /// Current state.
    pub fn state(&self) -> State {
        self.core.state
    }

    /// Whether the recognizer takes part in event processing.
    pub fn is_enabled(&self) -> bool {
        self.core.enabled
    }

    /// Value reported as consumed by event processing.
    pub fn cancels_touches_in_view(&self) -> bool {
        self.core.cancels_touches_in_view
    }

    /// Whether the action fired during the current cycle.
    pub fn has_began_firing(&self) -> bool {
        self.core.began_firing
    }

    /// Live contacts as of the last event.
    pub fn number_of_touches(&self) -> usize {
        self.core.touches()
    }

    /// Centroid of the live contacts as of the last event.
    pub fn location(&self) -> Point {
        self.core.location()
    }

    /// Where the current touch stream started.
    pub fn down_location(&self) -> Point {
        self.core.pointers.down_location()
    }

    /// Per-kind geometry.
    pub fn details(&self) -> Details {
        self.gesture.machine_ref().details()
    }

    /// Snapshot handed to listeners and to the arbiter.
    pub fn view(&self) -> GestureView<'_> {
        self.core.view(self.details())
    }

    pub(crate) fn in_sequence(&self) -> bool {
        self.gesture.machine_ref().in_sequence()
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.core.enabled = enabled;
    }

    /// Process one event. Returns whether the event counts as consumed.
    pub(crate) fn handle_pointer(&mut self, cx: &mut Cx<'_>, event: &PointerEvent) -> bool {
        if !self.core.enabled {
            return false;
        }
        if event.phase == PointerPhase::Down && self.core.state.is_active() {
            // The previous stream never ended.
            debug!("{:?} {:?}: down while active", self.core.kind, self.core.id);
            cx.cancel_all();
            cx.awaiting = false;
            self.core.set_state(State::Cancelled);
            self.core.began_firing = false;
            self.gesture.machine().reset();
        }
        self.core.pointers.update(event);
        if event.phase == PointerPhase::Down && !self.in_sequence() {
            self.screen(cx);
        }
        if self.core.receiving {
            self.gesture.machine().on_pointer(&mut self.core, cx, event);
        }
        self.core.cancels_touches_in_view
    }

    /// Ask the arbiter whether this touch stream is ours. A refused stream
    /// fails the recognizer so dependents are not left waiting.
    fn screen(&mut self, cx: &mut Cx<'_>) {
        self.core.receiving = cx.arbiter.should_receive_touch(&self.view());
        if self.core.receiving {
            return;
        }
        debug!("{:?} {:?}: touch refused", self.core.kind, self.core.id);
        cx.cancel_all();
        cx.awaiting = false;
        if self.core.state.is_terminal() {
            self.core.set_state(State::Possible);
        }
        self.core.set_state(State::Failed);
        self.core.began_firing = false;
        self.gesture.machine().reset();
    }

    pub(crate) fn handle_timer(&mut self, cx: &mut Cx<'_>, kind: TimerKind) {
        if !self.core.enabled {
            return;
        }
        trace!("{:?} {:?}: timer {:?}", self.core.kind, self.core.id, kind);
        self.gesture.machine().on_timer(&mut self.core, cx, kind);
    }

    pub(crate) fn handle_dependency(&mut self, cx: &mut Cx<'_>, target: State) {
        if !self.core.enabled {
            cx.awaiting = false;
            return;
        }
        self.gesture
            .machine()
            .on_dependency(&mut self.core, cx, target);
    }

    /// Return to `Possible` through legal transitions and forget the cycle.
    ///
    /// Pending deferred actions are the caller's to cancel.
    pub(crate) fn reset(&mut self) {
        if self.core.state.is_active() {
            self.core.set_state(State::Cancelled);
        }
        if self.core.state.is_terminal() {
            self.core.set_state(State::Possible);
        }
        self.core.began_firing = false;
        self.core.receiving = true;
        self.core.pointers.clear();
        self.gesture.machine().reset();
    }
}
