// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Gesture kinds and their configuration.
//!
//! Each submodule adds a constructor to [`Recognizer`](crate::recognizer::Recognizer)
//! and a plain configuration struct:
//!
//! | Kind | Constructor | Config | Discrete |
//! |---|---|---|---|
//! | Tap | [`Recognizer::tap`](crate::recognizer::Recognizer::tap) | [`TapConfig`] | yes |
//! | Long press | [`Recognizer::long_press`](crate::recognizer::Recognizer::long_press) | [`LongPressConfig`] | no |
//! | Pan | [`Recognizer::pan`](crate::recognizer::Recognizer::pan) | [`PanConfig`] | no |
//! | Screen-edge pan | [`Recognizer::screen_edge_pan`](crate::recognizer::Recognizer::screen_edge_pan) | [`ScreenEdgePanConfig`] | no |
//! | Pinch | [`Recognizer::pinch`](crate::recognizer::Recognizer::pinch) | [`PinchConfig`] | no |
//! | Rotate | [`Recognizer::rotate`](crate::recognizer::Recognizer::rotate) | [`RotateConfig`] | no |
//! | Swipe | [`Recognizer::swipe`](crate::recognizer::Recognizer::swipe) | [`SwipeConfig`] | yes |
//!
//! Every config implements `Default` from [`TouchConfig::default`](crate::config::TouchConfig)
//! and has a `from_touch_config` constructor for scaled metrics.

mod long_press;
mod pan;
mod pinch;
mod rotate;
mod span;
mod swipe;
mod tap;

pub use long_press::LongPressConfig;
pub use pan::{PanConfig, ScreenEdge, ScreenEdgePanConfig};
pub use pinch::PinchConfig;
pub use rotate::{RotateConfig, normalize_degrees};
pub use swipe::{SwipeConfig, SwipeDirection};
pub use tap::TapConfig;

pub(crate) use long_press::LongPress;
pub(crate) use pan::Pan;
pub(crate) use pinch::Pinch;
pub(crate) use rotate::Rotate;
pub(crate) use swipe::Swipe;
pub(crate) use tap::Tap;

#[cfg(test)]
pub(crate) mod testing {
    //! Shared harness for recognizer tests.

    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use crate::arbiter::Arbiter;
    use crate::dispatcher::Dispatcher;
    use crate::recognizer::Recognizer;
    use crate::scheduler::Scheduler;
    use crate::types::{Details, RecognizerId, State, StateChange};

    /// What a recognizer reported through its listeners.
    #[derive(Clone, Debug, Default)]
    pub(crate) struct Log {
        pub(crate) fired: Vec<(State, Details)>,
        pub(crate) changes: Vec<StateChange>,
    }

    impl Log {
        pub(crate) fn fired_states(&self) -> Vec<State> {
            self.fired.iter().map(|(s, _)| *s).collect()
        }
    }

    /// Attach listeners that record into a shared log.
    pub(crate) fn recorded(recognizer: Recognizer) -> (Recognizer, Rc<RefCell<Log>>) {
        let log = Rc::new(RefCell::new(Log::default()));
        let fired = log.clone();
        let changes = log.clone();
        let recognizer = recognizer
            .with_action(move |v| fired.borrow_mut().fired.push((v.state, v.details)))
            .with_state_listener(move |c| changes.borrow_mut().changes.push(*c));
        (recognizer, log)
    }

    /// Add a recorded recognizer to `dispatcher`.
    pub(crate) fn attach<A: Arbiter, S: Scheduler>(
        dispatcher: &mut Dispatcher<A, S>,
        recognizer: Recognizer,
    ) -> (RecognizerId, Rc<RefCell<Log>>) {
        let (recognizer, log) = recorded(recognizer);
        (dispatcher.add(recognizer), log)
    }

    pub(crate) fn state_of<A: Arbiter, S: Scheduler>(
        dispatcher: &Dispatcher<A, S>,
        id: RecognizerId,
    ) -> Option<State> {
        dispatcher.get(id).map(Recognizer::state)
    }

    pub(crate) fn all_legal(log: &Rc<RefCell<Log>>) -> bool {
        log.borrow().changes.iter().all(StateChange::is_legal)
    }
}
