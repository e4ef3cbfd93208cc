// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Application policy consulted while recognizers compete.
//!
//! The [`Dispatcher`](crate::dispatcher::Dispatcher) asks its [`Arbiter`]
//! three questions:
//!
//! - [`should_receive_touch`](Arbiter::should_receive_touch) when a touch
//!   stream starts, to decide whether a recognizer sees it at all.
//! - [`should_recognize_simultaneously`](Arbiter::should_recognize_simultaneously)
//!   before a recognizer succeeds while others are already firing.
//! - [`should_begin`](Arbiter::should_begin) as the final veto before a
//!   recognizer leaves `Possible` for a success state.
//!
//! All three default to `true`, so an empty `impl Arbiter for MyPolicy {}`
//! behaves like [`AllowAll`].

use crate::types::GestureView;

/// Policy hooks consulted by the dispatcher.
pub trait Arbiter {
    /// Whether `recognizer` may leave `Possible` for its success state.
    fn should_begin(&self, recognizer: &GestureView<'_>) -> bool {
        let _ = recognizer;
        true
    }

    /// Whether `recognizer` should see the touch stream that is starting.
    fn should_receive_touch(&self, recognizer: &GestureView<'_>) -> bool {
        let _ = recognizer;
        true
    }

    /// Whether `recognizer` may succeed while `other` has already begun firing.
    fn should_recognize_simultaneously(
        &self,
        recognizer: &GestureView<'_>,
        other: &GestureView<'_>,
    ) -> bool {
        let _ = (recognizer, other);
        true
    }
}

/// The permissive policy used by [`Dispatcher::new`](crate::dispatcher::Dispatcher::new).
#[derive(Copy, Clone, Debug, Default)]
pub struct AllowAll;

impl Arbiter for AllowAll {}

impl<A: Arbiter + ?Sized> Arbiter for &A {
    #[inline]
    fn should_begin(&self, recognizer: &GestureView<'_>) -> bool {
        (**self).should_begin(recognizer)
    }

    #[inline]
    fn should_receive_touch(&self, recognizer: &GestureView<'_>) -> bool {
        (**self).should_receive_touch(recognizer)
    }

    #[inline]
    fn should_recognize_simultaneously(
        &self,
        recognizer: &GestureView<'_>,
        other: &GestureView<'_>,
    ) -> bool {
        (**self).should_recognize_simultaneously(recognizer, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Details, GestureKind, State};
    use kurbo::Point;

    fn view(kind: GestureKind, details: Details) -> GestureView<'static> {
        GestureView {
            id: None,
            kind,
            tag: Some("t"),
            state: State::Possible,
            location: Point::ZERO,
            number_of_touches: 1,
            details,
        }
    }

    struct NoPinchWithPan;

    impl Arbiter for NoPinchWithPan {
        fn should_recognize_simultaneously(
            &self,
            recognizer: &GestureView<'_>,
            other: &GestureView<'_>,
        ) -> bool {
            !(recognizer.kind == GestureKind::Pinch && other.kind == GestureKind::Pan)
        }
    }

    #[test]
    fn allow_all_allows_everything() {
        let v = view(GestureKind::Tap, Details::Tap { taps: 1 });
        assert!(AllowAll.should_begin(&v));
        assert!(AllowAll.should_receive_touch(&v));
        assert!(AllowAll.should_recognize_simultaneously(&v, &v));
    }

    #[test]
    fn overriding_one_hook_keeps_other_defaults() {
        let pinch = view(
            GestureKind::Pinch,
            Details::Pinch {
                scale: 1.0,
                scale_factor: 1.0,
                span: 0.0,
                previous_span: 0.0,
                time_delta: 0,
            },
        );
        let pan = view(
            GestureKind::Pan,
            Details::Pan {
                translation: kurbo::Vec2::ZERO,
                velocity: kurbo::Vec2::ZERO,
                fling: false,
            },
        );
        let policy = NoPinchWithPan;
        assert!(!policy.should_recognize_simultaneously(&pinch, &pan));
        assert!(policy.should_recognize_simultaneously(&pan, &pinch));
        assert!(policy.should_begin(&pinch));
        // Borrowed policies forward.
        let by_ref = &policy;
        assert!(!by_ref.should_recognize_simultaneously(&pinch, &pan));
    }
}
