//! Fail-fast run state for one test.
//!
//! Once an action fails, every later guarded action in the same test becomes a
//! silent no-op: no driver traffic, no report entries, no counter changes. The
//! first failure is kept so the caller can inspect the root cause.

use crate::result::{ActionError, ActionResult};

/// Whether guarded actions still execute
#[derive(Debug, Default)]
pub struct RunState {
    stopped: bool,
    first_failure: Option<ActionError>,
    skipped: usize,
}

/// What the guard did with an action
#[derive(Debug)]
pub enum Guarded<T> {
    /// Action ran and succeeded
    Completed(T),
    /// Run state was already stopped; action never ran
    Skipped,
    /// Action ran and its error was absorbed; the run state is now stopped
    Absorbed,
}

impl<T> Guarded<T> {
    /// Collapse to the action's value or the skip value
    pub fn unwrap_or(self, on_skip: T) -> T {
        match self {
            Self::Completed(value) => value,
            Self::Skipped | Self::Absorbed => on_skip,
        }
    }

    /// Collapse to the action's value or `T::default()`
    pub fn unwrap_or_default(self) -> T
    where
        T: Default,
    {
        self.unwrap_or(T::default())
    }

    /// True if the action actually ran to completion
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

impl RunState {
    /// A running state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True while guarded actions execute
    #[must_use]
    pub const fn is_running(&self) -> bool {
        !self.stopped
    }

    /// Stop the run, remembering `error` if it is the first failure
    pub fn stop(&mut self, error: Option<ActionError>) {
        self.stopped = true;
        if self.first_failure.is_none() {
            self.first_failure = error;
        }
    }

    /// Back to running; called once per test at setup
    pub fn reset(&mut self) {
        self.stopped = false;
        self.first_failure = None;
        self.skipped = 0;
    }

    /// Root cause of the stop, if any
    #[must_use]
    pub const fn first_failure(&self) -> Option<&ActionError> {
        self.first_failure.as_ref()
    }

    /// Number of actions skipped since the stop
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.skipped
    }

    /// Run `action` unless stopped.
    ///
    /// Interaction errors are absorbed: the state stops and [`Guarded::Absorbed`]
    /// is returned. Any other error stops the state and is returned as `Err`.
    pub fn guard<T>(&mut self, action: impl FnOnce() -> ActionResult<T>) -> ActionResult<Guarded<T>> {
        if self.check_skip() {
            return Ok(Guarded::Skipped);
        }
        self.settle(action())
    }

    /// True (and counted as a skip) when the run is stopped
    pub fn check_skip(&mut self) -> bool {
        if self.stopped {
            self.skipped += 1;
        }
        self.stopped
    }

    /// Apply the guard policy to the result of an action that already ran
    pub fn settle<T>(&mut self, result: ActionResult<T>) -> ActionResult<Guarded<T>> {
        match result {
            Ok(value) => Ok(Guarded::Completed(value)),
            Err(err) if err.is_absorbed() => {
                tracing::debug!(error = %err, "run stopped by absorbed failure");
                self.stop(Some(err));
                Ok(Guarded::Absorbed)
            }
            Err(err) => {
                tracing::debug!(error = %err, "run stopped by surfaced failure");
                self.stop(Some(err.clone()));
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_running() {
        let state = RunState::new();
        assert!(state.is_running());
        assert!(state.first_failure().is_none());
    }

    #[test]
    fn test_success_passes_value_through() {
        let mut state = RunState::new();
        let out = state.guard(|| Ok(7)).unwrap();
        assert!(out.is_completed());
        assert_eq!(out.unwrap_or(0), 7);
        assert!(state.is_running());
    }

    #[test]
    fn test_interaction_error_is_absorbed() {
        let mut state = RunState::new();
        let out = state
            .guard(|| -> ActionResult<bool> { Err(ActionError::not_interactable("//a", "disabled")) })
            .unwrap();
        assert!(matches!(out, Guarded::Absorbed));
        assert!(!state.is_running());
        assert!(matches!(
            state.first_failure(),
            Some(ActionError::ElementNotInteractable { .. })
        ));
    }

    #[test]
    fn test_fixture_error_is_surfaced() {
        let mut state = RunState::new();
        let err = state
            .guard(|| -> ActionResult<()> {
                Err(ActionError::MalformedDelegate {
                    delegate: "x".into(),
                })
            })
            .unwrap_err();
        assert!(matches!(err, ActionError::MalformedDelegate { .. }));
        assert!(!state.is_running());
        assert!(matches!(
            state.first_failure(),
            Some(ActionError::MalformedDelegate { .. })
        ));
    }

    #[test]
    fn test_stopped_state_skips_without_running_action() {
        let mut state = RunState::new();
        state.stop(None);

        let mut ran = false;
        let out = state
            .guard(|| {
                ran = true;
                Ok(())
            })
            .unwrap();
        assert!(matches!(out, Guarded::Skipped));
        assert!(!ran);
        assert_eq!(state.skipped(), 1);
    }

    #[test]
    fn test_first_failure_is_kept() {
        let mut state = RunState::new();
        state.stop(Some(ActionError::driver("first")));
        state.stop(Some(ActionError::driver("second")));
        assert!(state.first_failure().unwrap().to_string().contains("first"));
    }

    #[test]
    fn test_reset() {
        let mut state = RunState::new();
        state.stop(Some(ActionError::driver("boom")));
        let _ = state.guard(|| Ok(())).unwrap();
        state.reset();
        assert!(state.is_running());
        assert!(state.first_failure().is_none());
        assert_eq!(state.skipped(), 0);
    }
}
