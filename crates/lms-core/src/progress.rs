//! Progress notifications for a running submission
//!
//! The UI can follow a submission node by node through an unbounded channel.
//! Sending never blocks and a dropped receiver is ignored.

use crate::phase::SubmissionPhase;
use crate::types::{Action, ReconciliationOutcome, SubmissionId};
use lms_model::CourseId;
use lms_remote::RemoteError;
use tokio::sync::mpsc;

/// Something happened in a submission
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// State machine moved
    PhaseChanged {
        /// Submission
        submission: SubmissionId,
        /// Previous phase
        from: SubmissionPhase,
        /// New phase
        to: SubmissionPhase,
    },
    /// Course write settled
    CourseSettled {
        /// Submission
        submission: SubmissionId,
        /// Resolved id on success
        course_id: Option<CourseId>,
        /// Create or update
        action: Action,
        /// Failure detail
        error: Option<RemoteError>,
    },
    /// Chapter or lecture write settled
    ///
    /// Chapter outcomes are sent before their lectures run, so `lectures`
    /// is always empty here.
    NodeSettled {
        /// Submission
        submission: SubmissionId,
        /// Node outcome
        outcome: ReconciliationOutcome,
    },
}

/// Optional sender side of a progress channel
#[derive(Debug, Clone, Default)]
pub struct ProgressSink(Option<mpsc::UnboundedSender<ProgressEvent>>);

impl ProgressSink {
    /// Discard all events
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self(None)
    }

    /// Forward events to `sender`
    #[inline]
    #[must_use]
    pub fn new(sender: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self(Some(sender))
    }

    /// Create a sink and its receiving end
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub(crate) fn emit(&self, event: ProgressEvent) {
        if let Some(sender) = &self.0 {
            // Receiver gone: nobody is watching.
            let _ = sender.send(event);
        }
    }
}
