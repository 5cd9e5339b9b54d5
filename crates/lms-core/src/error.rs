//! Error types for course submission
//!
//! Covers:
//! - A single failed write, located in the tree ([`RemoteMutationError`])
//! - A reconciler stopping early ([`ReconcileAbort`])
//! - "Course saved, tree partial" ([`PartialTreeFailure`])
//! - The caller-facing summary ([`SubmissionError`])
//! - Illegal submission phase transitions

use crate::phase::SubmissionPhase;
use crate::types::ReconciliationOutcome;
use lms_model::CourseId;
use lms_remote::RemoteError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Level of the course tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeLevel {
    /// The course record itself
    Course,
    /// A chapter
    Chapter,
    /// A lecture
    Lecture,
}

/// Position of a node in the submitted tree
///
/// Indexes are positions in the caller's arrays, not server ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "lowercase")]
pub enum NodeRef {
    /// The course record
    Course,
    /// `chapters[index]`
    Chapter {
        /// Chapter position
        index: usize,
    },
    /// `chapters[chapter_index].lectures[index]`
    Lecture {
        /// Parent chapter position
        chapter_index: usize,
        /// Lecture position
        index: usize,
    },
}

impl NodeRef {
    /// Tree level
    #[inline]
    #[must_use]
    pub fn level(&self) -> NodeLevel {
        match self {
            Self::Course => NodeLevel::Course,
            Self::Chapter { .. } => NodeLevel::Chapter,
            Self::Lecture { .. } => NodeLevel::Lecture,
        }
    }

    /// Index within the parent's list (none for the course)
    #[inline]
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Course => None,
            Self::Chapter { index } | Self::Lecture { index, .. } => Some(*index),
        }
    }

    /// Index of the chapter this node belongs to, or is
    #[inline]
    #[must_use]
    pub fn chapter_index(&self) -> Option<usize> {
        match self {
            Self::Course => None,
            Self::Chapter { index } => Some(*index),
            Self::Lecture { chapter_index, .. } => Some(*chapter_index),
        }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Course => write!(f, "course"),
            Self::Chapter { index } => write!(f, "chapter {index}"),
            Self::Lecture {
                chapter_index,
                index,
            } => write!(f, "lecture {index} of chapter {chapter_index}"),
        }
    }
}

/// A create/update call was rejected
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
#[error("{node} write failed: {source}")]
pub struct RemoteMutationError {
    /// Failing node
    pub node: NodeRef,
    /// Underlying client error
    pub source: RemoteError,
}

impl RemoteMutationError {
    /// Locate `source` at `node`
    #[inline]
    #[must_use]
    pub fn new(node: NodeRef, source: RemoteError) -> Self {
        Self { node, source }
    }

    /// Tree level of the failing node
    #[inline]
    #[must_use]
    pub fn level(&self) -> NodeLevel {
        self.node.level()
    }
}

/// Why a reconciler stopped before the end of its list
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AbortCause {
    /// A write failed
    #[error(transparent)]
    Failed(#[from] RemoteMutationError),

    /// The caller cancelled; `0` is the first node not attempted
    #[error("cancelled before {0}")]
    Cancelled(NodeRef),
}

/// A reconciler stopped early
///
/// Carries every outcome recorded before stopping, including the failed
/// node's own outcome when the cause is a failed write.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("reconciliation stopped after {} node(s): {cause}", .outcomes.len())]
pub struct ReconcileAbort {
    /// Outcomes recorded so far, in input order
    pub outcomes: Vec<ReconciliationOutcome>,
    /// Why processing stopped
    pub cause: AbortCause,
}

impl ReconcileAbort {
    /// Stopped on a failed write
    #[must_use]
    pub fn failed(outcomes: Vec<ReconciliationOutcome>, error: RemoteMutationError) -> Self {
        Self {
            outcomes,
            cause: AbortCause::Failed(error),
        }
    }

    /// Stopped on cancellation
    #[must_use]
    pub fn cancelled(outcomes: Vec<ReconciliationOutcome>, at: NodeRef) -> Self {
        Self {
            outcomes,
            cause: AbortCause::Cancelled(at),
        }
    }

    /// The node that stopped processing
    #[must_use]
    pub fn node(&self) -> NodeRef {
        match &self.cause {
            AbortCause::Failed(error) => error.node,
            AbortCause::Cancelled(at) => *at,
        }
    }
}

/// The course persisted but its chapter tree did not fully reconcile
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("course {course_id} was saved but its content was not fully updated: {error}")]
pub struct PartialTreeFailure {
    /// Persisted course
    pub course_id: CourseId,
    /// First (and only) failed write
    pub error: RemoteMutationError,
    /// Chapter outcomes gathered up to and including the failure
    pub outcomes: Vec<ReconciliationOutcome>,
}

/// Caller-facing failure of a submission
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SubmissionError {
    /// Nothing was saved
    #[error("course was not saved: {0}")]
    CourseRejected(RemoteMutationError),

    /// Course saved, tree partially saved
    #[error(transparent)]
    PartialTree(#[from] PartialTreeFailure),

    /// Caller cancelled; earlier writes stand
    #[error("submission cancelled before {at}")]
    Cancelled {
        /// First node not attempted
        at: NodeRef,
        /// Course id if the course write already went through
        course_id: Option<CourseId>,
        /// Chapter outcomes gathered before cancelling
        outcomes: Vec<ReconciliationOutcome>,
    },
}

impl SubmissionError {
    /// Whether the course record itself was persisted
    #[inline]
    #[must_use]
    pub fn course_saved(&self) -> bool {
        match self {
            Self::CourseRejected(_) => false,
            Self::PartialTree(_) => true,
            Self::Cancelled { course_id, .. } => course_id.is_some(),
        }
    }

    /// The failed write, if a write failed
    #[must_use]
    pub fn mutation_error(&self) -> Option<&RemoteMutationError> {
        match self {
            Self::CourseRejected(error) => Some(error),
            Self::PartialTree(failure) => Some(&failure.error),
            Self::Cancelled { .. } => None,
        }
    }
}

/// Submission state machine errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PhaseError {
    /// Transition not in the allowed table
    #[error("illegal submission phase transition: {from:?} -> {to:?}")]
    IllegalTransition {
        /// Current phase
        from: SubmissionPhase,
        /// Requested phase
        to: SubmissionPhase,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ref_display_and_accessors() {
        let lecture = NodeRef::Lecture {
            chapter_index: 2,
            index: 1,
        };
        assert_eq!(lecture.to_string(), "lecture 1 of chapter 2");
        assert_eq!(lecture.level(), NodeLevel::Lecture);
        assert_eq!(lecture.chapter_index(), Some(2));
        assert_eq!(NodeRef::Course.index(), None);
    }

    #[test]
    fn mutation_error_message_names_node() {
        let err = RemoteMutationError::new(
            NodeRef::Chapter { index: 0 },
            RemoteError::status(500, "boom"),
        );
        assert_eq!(
            err.to_string(),
            "chapter 0 write failed: server returned 500: boom"
        );
        assert_eq!(err.level(), NodeLevel::Chapter);
    }

    #[test]
    fn only_course_rejection_means_nothing_saved() {
        let err = RemoteMutationError::new(NodeRef::Course, RemoteError::status(422, ""));
        assert!(!SubmissionError::CourseRejected(err.clone()).course_saved());

        let partial = SubmissionError::from(PartialTreeFailure {
            course_id: CourseId(5),
            error: RemoteMutationError::new(NodeRef::Chapter { index: 1 }, err.source),
            outcomes: Vec::new(),
        });
        assert!(partial.course_saved());
        assert_eq!(
            partial.mutation_error().map(|e| e.node),
            Some(NodeRef::Chapter { index: 1 })
        );
    }
}
