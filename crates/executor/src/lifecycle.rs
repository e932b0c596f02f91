use std::fmt;

use actroute_core::{ActionError, Fault, RequestId};
use thiserror::Error;
use tracing::{debug, warn};

/// Position of one action instance in its lifecycle.
///
/// The sequence is strictly linear: `Created → PreAction → DoAction →
/// PostAction → ResultReady → Completed`. Any failing step jumps straight to
/// `Failed`. There is no re-entry and no skipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    Created,
    PreAction,
    DoAction,
    PostAction,
    ResultReady,
    Completed,
    Failed,
}

impl LifecycleState {
    /// The state that follows a successful step, or `None` for terminal
    /// states.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Created => Some(Self::PreAction),
            Self::PreAction => Some(Self::DoAction),
            Self::DoAction => Some(Self::PostAction),
            Self::PostAction => Some(Self::ResultReady),
            Self::ResultReady => Some(Self::Completed),
            Self::Completed | Self::Failed => None,
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::PreAction => "pre_action",
            Self::DoAction => "do_action",
            Self::PostAction => "post_action",
            Self::ResultReady => "result_ready",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lifecycle that ended in [`LifecycleState::Failed`].
///
/// Records the step that failed alongside the classified error.
#[derive(Debug, Error)]
#[error("action failed during {state}: {error}")]
pub struct LifecycleFailure {
    pub state: LifecycleState,
    #[source]
    pub error: ActionError,
}

impl LifecycleFailure {
    #[must_use]
    pub fn fault(&self) -> Fault {
        self.error.fault()
    }
}

/// Tracks the state of one run and logs a cancellation if the run is
/// dropped before reaching a terminal state.
pub(crate) struct RunTracker {
    action: &'static str,
    request_id: RequestId,
    state: LifecycleState,
}

impl RunTracker {
    pub(crate) fn new(action: &'static str, request_id: RequestId) -> Self {
        Self {
            action,
            request_id,
            state: LifecycleState::Created,
        }
    }

    pub(crate) fn state(&self) -> LifecycleState {
        self.state
    }

    /// Move to the next state in the sequence.
    pub(crate) fn advance(&mut self) {
        if let Some(next) = self.state.next() {
            debug!(action = self.action, from = %self.state, to = %next, "lifecycle transition");
            self.state = next;
        }
    }

    /// Record a failure in the current step.
    pub(crate) fn fail(&mut self, error: ActionError) -> LifecycleFailure {
        let failure = LifecycleFailure {
            state: self.state,
            error,
        };
        self.state = LifecycleState::Failed;
        failure
    }
}

impl Drop for RunTracker {
    fn drop(&mut self) {
        if !self.state.is_terminal() {
            warn!(
                action = self.action,
                request_id = %self.request_id,
                state = %self.state,
                "action lifecycle cancelled before completion"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_follow_fixed_sequence() {
        let mut state = LifecycleState::Created;
        let mut seen = vec![state];
        while let Some(next) = state.next() {
            state = next;
            seen.push(state);
        }
        assert_eq!(
            seen,
            [
                LifecycleState::Created,
                LifecycleState::PreAction,
                LifecycleState::DoAction,
                LifecycleState::PostAction,
                LifecycleState::ResultReady,
                LifecycleState::Completed,
            ]
        );
        assert!(LifecycleState::Failed.next().is_none());
    }

    #[test]
    fn failure_records_step() {
        let mut tracker = RunTracker::new("t", RequestId::new("r"));
        tracker.advance();
        tracker.advance();
        let failure = tracker.fail(ActionError::not_found("gone"));
        assert_eq!(failure.state, LifecycleState::DoAction);
        assert_eq!(failure.fault(), Fault::Caller);
        assert_eq!(tracker.state(), LifecycleState::Failed);
        assert_eq!(failure.to_string(), "action failed during do_action: gone");
    }

    #[test]
    fn terminal_states_do_not_advance() {
        let mut tracker = RunTracker::new("t", RequestId::new("r"));
        for _ in 0..10 {
            tracker.advance();
        }
        assert_eq!(tracker.state(), LifecycleState::Completed);
    }
}
