// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The recognizer set: ownership, event delivery, dependencies, and time.
//!
//! ## Overview
//!
//! A [`Dispatcher`] owns its recognizers and hands out [`RecognizerId`]s.
//! Each [`process`](Dispatcher::process) call first runs the deferred actions
//! that fell due before the event, then delivers the event to every attached
//! recognizer in registration order. Registration order is also precedence
//! order: a recognizer that wants to succeed while an earlier one already has
//! must be allowed to by the [`Arbiter`].
//!
//! ## Failure dependencies
//!
//! [`require_failure_of`](Dispatcher::require_failure_of) makes one
//! recognizer wait for another to fail before it fires. The waiting one still
//! enters its success state on time; the dispatcher then forwards every
//! transition of the target until the wait resolves. Edges form a forest:
//! self-dependencies and cycles are rejected.
//!
//! ## Time
//!
//! Timestamps are milliseconds on a caller-supplied clock. Deferred actions
//! fire from [`advance`](Dispatcher::advance), which `process` calls with the
//! event timestamp. Hosts with a run loop can poll
//! [`next_deadline`](Dispatcher::next_deadline) to know when to call
//! `advance` without an event.
//!
//! ## Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use kurbo::Point;
//! use understory_gestures::dispatcher::Dispatcher;
//! use understory_gestures::recognizer::Recognizer;
//! use understory_gestures::recognizers::TapConfig;
//! use understory_gestures::stream::PointerStream;
//! use understory_gestures::types::State;
//!
//! let fired = Rc::new(Cell::new(0));
//! let count = fired.clone();
//! let mut dispatcher = Dispatcher::new();
//! let single = dispatcher.add(
//!     Recognizer::tap(TapConfig::default()).with_action(move |_| count.set(count.get() + 1)),
//! );
//! let double = dispatcher.add(Recognizer::tap(TapConfig {
//!     taps_required: 2,
//!     ..TapConfig::default()
//! }));
//! dispatcher.require_failure_of(single, Some(double)).unwrap();
//!
//! let mut stream = PointerStream::new();
//! dispatcher.process(&stream.down(0, Point::new(10.0, 10.0), 0));
//! dispatcher.process(&stream.up(0, 40));
//! // The single tap has succeeded but waits for the double tap to give up.
//! assert_eq!(dispatcher.get(single).map(Recognizer::state), Some(State::Ended));
//! assert_eq!(fired.get(), 0);
//!
//! // The double tap fails at 340 and the single tap fires. Both reset on
//! // the same turn.
//! dispatcher.advance(340);
//! assert_eq!(fired.get(), 1);
//! assert_eq!(dispatcher.get(double).map(Recognizer::state), Some(State::Possible));
//! assert_eq!(dispatcher.get(single).map(Recognizer::state), Some(State::Possible));
//! ```

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;
use log::{debug, trace};

use crate::arbiter::{AllowAll, Arbiter};
use crate::error::Error;
use crate::recognizer::{Cx, Recognizer};
use crate::scheduler::{Scheduler, TimerQueue};
use crate::types::{PointerEvent, RecognizerId, State};

/// Owns recognizers and drives them with pointer events and time.
pub struct Dispatcher<A: Arbiter = AllowAll, S: Scheduler = TimerQueue> {
    slots: Vec<Option<Recognizer>>,
    generations: Vec<u32>, // last generation per slot (persists across frees)
    free_list: Vec<usize>,
    /// Live ids in registration order.
    order: Vec<RecognizerId>,
    /// Dependent to target.
    dependencies: BTreeMap<RecognizerId, RecognizerId>,
    /// Dependents in a success state that have not fired yet.
    awaiting: BTreeSet<RecognizerId>,
    arbiter: A,
    scheduler: S,
    enabled: bool,
    now: u64,
}

impl<A: Arbiter, S: Scheduler> core::fmt::Debug for Dispatcher<A, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("recognizers", &self.order.len())
            .field("free_list", &self.free_list.len())
            .field("dependencies", &self.dependencies)
            .field("awaiting", &self.awaiting)
            .field("enabled", &self.enabled)
            .field("now", &self.now)
            .finish_non_exhaustive()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Create an empty dispatcher with the permissive policy and an in-memory
    /// timer queue.
    pub fn new() -> Self {
        Self::with_parts(AllowAll, TimerQueue::new())
    }
}

impl<A: Arbiter> Dispatcher<A> {
    /// Create an empty dispatcher consulting `arbiter`.
    pub fn with_arbiter(arbiter: A) -> Self {
        Self::with_parts(arbiter, TimerQueue::new())
    }
}

impl<A: Arbiter, S: Scheduler> Dispatcher<A, S> {
    /// Create an empty dispatcher from a policy and a timer store.
    pub fn with_parts(arbiter: A, scheduler: S) -> Self {
        Self {
            slots: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            order: Vec::new(),
            dependencies: BTreeMap::new(),
            awaiting: BTreeSet::new(),
            arbiter,
            scheduler,
            enabled: true,
            now: 0,
        }
    }

    /// The policy.
    pub fn arbiter(&self) -> &A {
        &self.arbiter
    }

    /// Mutable access to the policy.
    pub fn arbiter_mut(&mut self) -> &mut A {
        &mut self.arbiter
    }

    /// Latest time seen by [`process`](Self::process) or [`advance`](Self::advance).
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Attach a recognizer. It is delivered events after every recognizer
    /// attached before it.
    pub fn add(&mut self, mut recognizer: Recognizer) -> RecognizerId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            #[allow(
                clippy::cast_possible_truncation,
                reason = "RecognizerId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.slots.push(None);
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "RecognizerId uses 32-bit indices by design."
            )]
            ((self.slots.len() - 1) as u32, generation)
        };
        let id = RecognizerId::new(idx, generation);
        recognizer.core.id = Some(id);
        debug!("add {:?} as {:?}", recognizer.kind(), id);
        self.slots[id.idx()] = Some(recognizer);
        self.order.push(id);
        id
    }

    /// Detach a recognizer and hand it back, reset to `Possible`.
    ///
    /// Its deferred actions are cancelled and its dependency edges dropped
    /// in both directions. Dependents that were waiting on it resolve as if
    /// it had failed.
    pub fn remove(&mut self, id: RecognizerId) -> Option<Recognizer> {
        if !self.contains(id) {
            return None;
        }
        self.drive(id, self.now, |r, cx| {
            cx.cancel_all();
            cx.awaiting = false;
            r.reset();
        });
        let waiting: Vec<_> = self.listeners_of(id).collect();
        for dependent in waiting {
            self.drive(dependent, self.now, |r, cx| {
                r.handle_dependency(cx, State::Failed);
            });
        }
        self.dependencies.remove(&id);
        self.dependencies.retain(|_, target| *target != id);
        self.awaiting.remove(&id);
        self.order.retain(|o| *o != id);
        let mut recognizer = self.slots[id.idx()].take()?;
        self.free_list.push(id.idx());
        recognizer.core.id = None;
        debug!("removed {:?}", id);
        Some(recognizer)
    }

    /// Detach and drop every recognizer.
    pub fn clear(&mut self) {
        for id in core::mem::take(&mut self.order) {
            self.scheduler.cancel_owner(id);
            if self.slots[id.idx()].take().is_some() {
                self.free_list.push(id.idx());
            }
        }
        self.dependencies.clear();
        self.awaiting.clear();
    }

    /// Number of attached recognizers.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// `true` when no recognizer is attached.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Whether `id` refers to an attached recognizer.
    pub fn contains(&self, id: RecognizerId) -> bool {
        self.get(id).is_some()
    }

    /// Attached ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = RecognizerId> + '_ {
        self.order.iter().copied()
    }

    /// The recognizer for `id`, if attached.
    pub fn get(&self, id: RecognizerId) -> Option<&Recognizer> {
        self.slots
            .get(id.idx())?
            .as_ref()
            .filter(|r| r.core.id == Some(id))
    }

    /// Mutable access for the setters on [`Recognizer`]: tag, listeners, and
    /// the consumed flag.
    pub fn get_mut(&mut self, id: RecognizerId) -> Option<&mut Recognizer> {
        self.slots
            .get_mut(id.idx())?
            .as_mut()
            .filter(|r| r.core.id == Some(id))
    }

    /// Make `id` wait for `target` to fail before firing; `None` removes the
    /// dependency.
    ///
    /// If `id` is already waiting, it resolves against the new target right
    /// away (or fires, when the dependency is removed).
    pub fn require_failure_of(
        &mut self,
        id: RecognizerId,
        target: Option<RecognizerId>,
    ) -> Result<(), Error> {
        if !self.contains(id) {
            return Err(Error::UnknownRecognizer(id));
        }
        match target {
            Some(target) => {
                if !self.contains(target) {
                    return Err(Error::UnknownRecognizer(target));
                }
                if target == id {
                    return Err(Error::SelfDependency(id));
                }
                let mut next = Some(target);
                while let Some(current) = next {
                    if current == id {
                        return Err(Error::DependencyCycle {
                            dependent: id,
                            target,
                        });
                    }
                    next = self.dependencies.get(&current).copied();
                }
                debug!("{:?} requires failure of {:?}", id, target);
                self.dependencies.insert(id, target);
            }
            None => {
                self.dependencies.remove(&id);
            }
        }

        if self.awaiting.contains(&id) {
            let resolution = match target.and_then(|t| self.get(t)).map(Recognizer::state) {
                None => Some(State::Failed),
                Some(State::Possible) => None,
                Some(State::Changed) => Some(State::Began),
                Some(state) => Some(state),
            };
            if let Some(state) = resolution {
                self.drive(id, self.now, |r, cx| r.handle_dependency(cx, state));
            }
        }
        Ok(())
    }

    /// The recognizer `id` waits on, if any.
    pub fn failure_dependency(&self, id: RecognizerId) -> Option<RecognizerId> {
        self.dependencies.get(&id).copied()
    }

    /// Dependents currently waiting on `id`, in registration order.
    pub fn listeners_of(&self, id: RecognizerId) -> impl Iterator<Item = RecognizerId> + '_ {
        self.order.iter().copied().filter(move |dependent| {
            self.awaiting.contains(dependent) && self.dependencies.get(dependent) == Some(&id)
        })
    }

    /// Enable or disable one recognizer. Disabling resets it to `Possible`
    /// and cancels its deferred actions; a disabled recognizer ignores input.
    pub fn set_enabled(&mut self, id: RecognizerId, enabled: bool) -> Result<(), Error> {
        if !self.contains(id) {
            return Err(Error::UnknownRecognizer(id));
        }
        if !enabled {
            self.drive(id, self.now, |r, cx| {
                cx.cancel_all();
                cx.awaiting = false;
                r.reset();
            });
        }
        if let Some(r) = self.get_mut(id) {
            r.set_enabled(enabled);
        }
        Ok(())
    }

    /// Gate event delivery as a whole.
    pub fn set_dispatcher_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether events are delivered.
    pub fn is_dispatcher_enabled(&self) -> bool {
        self.enabled
    }

    /// Deliver one event to every attached recognizer.
    ///
    /// Returns `true` when any recognizer that handled the event has
    /// `cancels_touches_in_view` set.
    pub fn process(&mut self, event: &PointerEvent) -> bool {
        self.advance(event.timestamp);
        if !self.enabled {
            return false;
        }
        trace!(
            "process {:?} with {} pointers at {}",
            event.phase,
            event.pointers.len(),
            event.timestamp
        );
        let mut consumed = false;
        let mut i = 0;
        while let Some(&id) = self.order.get(i) {
            consumed |= self
                .drive(id, self.now, |r, cx| r.handle_pointer(cx, event))
                .unwrap_or(false);
            i += 1;
        }
        consumed
    }

    /// Move the clock to `now` and run every deferred action due by then, in
    /// deadline order.
    pub fn advance(&mut self, now: u64) {
        self.now = self.now.max(now);
        while let Some((deadline, key)) = self.scheduler.pop_due(self.now) {
            trace!("{:?} for {:?} due at {}", key.kind, key.owner, deadline);
            self.drive(key.owner, deadline, |r, cx| r.handle_timer(cx, key.kind));
        }
    }

    /// Earliest pending deferred action.
    pub fn next_deadline(&self) -> Option<u64> {
        self.scheduler.next_deadline()
    }

    /// Run `f` on the recognizer `id` with a context lent from the rest of the
    /// dispatcher, then propagate the transitions it made to waiting dependents.
    fn drive<R>(
        &mut self,
        id: RecognizerId,
        now: u64,
        f: impl FnOnce(&mut Recognizer, &mut Cx<'_>) -> R,
    ) -> Option<R> {
        let slot = self.slots.get_mut(id.idx())?;
        if !slot.as_ref().is_some_and(|r| r.core.id == Some(id)) {
            return None;
        }
        let mut recognizer = slot.take()?;
        let pos = self.order.iter().position(|o| *o == id).unwrap_or(0);
        let mut cx = Cx {
            now,
            owner: id,
            arbiter: &self.arbiter,
            scheduler: &mut self.scheduler,
            peers: &self.slots,
            earlier: &self.order[..pos],
            dependency: self.dependencies.get(&id).copied(),
            awaiting: self.awaiting.contains(&id),
        };
        let out = f(&mut recognizer, &mut cx);
        let awaiting =
            cx.awaiting && matches!(recognizer.core.state, State::Began | State::Ended);
        if awaiting {
            self.awaiting.insert(id);
        } else {
            self.awaiting.remove(&id);
        }
        let transitions = core::mem::take(&mut recognizer.core.transitions);
        self.slots[id.idx()] = Some(recognizer);
        for state in transitions {
            self.notify_dependents(id, state, now);
        }
        Some(out)
    }

    fn notify_dependents(&mut self, target: RecognizerId, state: State, now: u64) {
        let waiting: Vec<_> = self.listeners_of(target).collect();
        for dependent in waiting {
            // An earlier dependent's resolution may have settled this one.
            if !self.awaiting.contains(&dependent) {
                continue;
            }
            trace!("{:?} sees {:?} enter {:?}", dependent, target, state);
            self.drive(dependent, now, |r, cx| r.handle_dependency(cx, state));
        }
    }
}
