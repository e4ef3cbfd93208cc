// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors from dispatcher setup.

use crate::types::RecognizerId;

/// Errors returned by [`Dispatcher`](crate::dispatcher::Dispatcher) setup operations.
///
/// Event processing itself never fails; malformed input resolves to
/// [`State::Failed`](crate::types::State::Failed) or
/// [`State::Cancelled`](crate::types::State::Cancelled).
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// The id is stale or belongs to another dispatcher.
    #[error("recognizer {0:?} is not attached to this dispatcher")]
    UnknownRecognizer(RecognizerId),
    /// A recognizer cannot wait for its own failure.
    #[error("recognizer {0:?} cannot require its own failure")]
    SelfDependency(RecognizerId),
    /// The requested failure dependency would close a cycle.
    #[error("requiring failure of {target:?} from {dependent:?} would form a cycle")]
    DependencyCycle {
        /// Recognizer that would wait.
        dependent: RecognizerId,
        /// Recognizer it would wait on.
        target: RecognizerId,
    },
}
