//! Submission state machine
//!
//! `Idle → SubmittingCourse → SubmittingTree → Done | Failed`, with
//! `Cancelled` reachable from every non-terminal phase.

use crate::error::PhaseError;
use crate::progress::{ProgressEvent, ProgressSink};
use crate::types::SubmissionId;
use serde::{Deserialize, Serialize};

/// Phase of a single submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionPhase {
    /// Nothing issued yet
    Idle,
    /// Course create/update in flight
    SubmittingCourse,
    /// Chapter/lecture reconciliation in progress
    SubmittingTree,
    /// Every node persisted
    Done,
    /// A write failed
    Failed,
    /// Caller cancelled before the end
    Cancelled,
}

impl SubmissionPhase {
    /// No further transitions possible
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        allowed_transitions(*self).is_empty()
    }
}

/// Phases reachable from `from`
#[must_use]
pub fn allowed_transitions(from: SubmissionPhase) -> Vec<SubmissionPhase> {
    use SubmissionPhase::*;
    match from {
        Idle => vec![SubmittingCourse, Cancelled],
        SubmittingCourse => vec![SubmittingTree, Failed, Cancelled],
        SubmittingTree => vec![Done, Failed, Cancelled],
        Done | Failed | Cancelled => vec![],
    }
}

/// Validate a phase transition.
///
/// # Errors
/// `PhaseError::IllegalTransition` if `to` is not reachable from `from`.
pub fn validate_transition(from: SubmissionPhase, to: SubmissionPhase) -> Result<(), PhaseError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(PhaseError::IllegalTransition { from, to })
    }
}

/// Current phase of one submission, announcing each change
#[derive(Debug)]
pub(crate) struct PhaseTracker {
    submission: SubmissionId,
    current: SubmissionPhase,
    progress: ProgressSink,
}

impl PhaseTracker {
    pub(crate) fn new(submission: SubmissionId, progress: ProgressSink) -> Self {
        Self {
            submission,
            current: SubmissionPhase::Idle,
            progress,
        }
    }

    pub(crate) fn current(&self) -> SubmissionPhase {
        self.current
    }

    /// Move to `to`; an illegal request is logged and leaves the phase as is.
    pub(crate) fn advance(&mut self, to: SubmissionPhase) {
        let from = self.current;
        if let Err(e) = validate_transition(from, to) {
            tracing::error!(submission = %self.submission, "{}", e);
            return;
        }
        tracing::info!(submission = %self.submission, ?from, ?to, "submission phase changed");
        self.current = to;
        self.progress.emit(ProgressEvent::PhaseChanged {
            submission: self.submission,
            from,
            to,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use SubmissionPhase::*;

    fn any_phase() -> impl Strategy<Value = SubmissionPhase> {
        prop_oneof![
            Just(Idle),
            Just(SubmittingCourse),
            Just(SubmittingTree),
            Just(Done),
            Just(Failed),
            Just(Cancelled),
        ]
    }

    #[test]
    fn happy_path_is_allowed() {
        assert!(validate_transition(Idle, SubmittingCourse).is_ok());
        assert!(validate_transition(SubmittingCourse, SubmittingTree).is_ok());
        assert!(validate_transition(SubmittingTree, Done).is_ok());
    }

    #[test]
    fn tree_cannot_start_before_course() {
        assert_eq!(
            validate_transition(Idle, SubmittingTree),
            Err(PhaseError::IllegalTransition {
                from: Idle,
                to: SubmittingTree
            })
        );
        assert!(validate_transition(SubmittingCourse, Done).is_err());
    }

    #[test]
    fn terminal_phases() {
        assert!(Done.is_terminal());
        assert!(Failed.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(!SubmittingTree.is_terminal());
    }

    #[test]
    fn tracker_ignores_illegal_moves() {
        let mut tracker = PhaseTracker::new(SubmissionId::new(), ProgressSink::none());
        tracker.advance(Done);
        assert_eq!(tracker.current(), Idle);
        tracker.advance(SubmittingCourse);
        assert_eq!(tracker.current(), SubmittingCourse);
    }

    proptest! {
        #[test]
        fn validation_agrees_with_table(from in any_phase(), to in any_phase()) {
            let allowed = allowed_transitions(from);
            prop_assert_eq!(validate_transition(from, to).is_ok(), allowed.contains(&to));
        }
    }
}
