//! LMS Core - course tree reconciliation
//!
//! Persists a course edit (course → chapters → lectures) through a backend
//! that only offers flat, single-entity create/update endpoints:
//! - Writes the course first, then each chapter, then that chapter's lectures
//! - Issues one call at a time, each child only after its parent id exists
//! - Stops at the first failed write and reports exactly what was saved
//! - Separates "nothing saved" from "course saved, tree partial"
//!
//! # Example
//!
//! ```rust,ignore
//! use lms_core::prelude::*;
//! use lms_remote::{ClientConfig, HttpResourceClient};
//! use std::sync::Arc;
//!
//! # async fn example(edit: CourseEdit) -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpResourceClient::new(ClientConfig::new())?;
//! let coordinator = CourseSubmissionCoordinator::new(Arc::new(client));
//!
//! let result = coordinator.submit(&edit).await;
//! println!("{:?}: {:?}", result.status(), result.counts());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod chapters;
pub mod context;
pub mod coordinator;
pub mod error;
pub mod lectures;
pub mod phase;
pub mod plan;
pub mod progress;
pub mod types;

pub use chapters::ChapterReconciler;
pub use context::ReconcileContext;
pub use coordinator::{CourseSubmissionCoordinator, SubmitOptions};
pub use error::{
    AbortCause, NodeLevel, NodeRef, PartialTreeFailure, PhaseError, ReconcileAbort,
    RemoteMutationError, SubmissionError,
};
pub use lectures::LectureReconciler;
pub use phase::{allowed_transitions, validate_transition, SubmissionPhase};
pub use plan::{plan_submission, IdRef, PlannedCall, SubmissionPlan};
pub use progress::{ProgressEvent, ProgressSink};
pub use types::{
    Action, OutcomeCounts, ReconciliationOutcome, SubmissionConfig, SubmissionId,
    SubmissionResult, SubmissionStatus,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for submitting course edits
    pub use crate::{
        plan_submission, CourseSubmissionCoordinator, ProgressEvent, ProgressSink,
        ReconciliationOutcome, SubmissionConfig, SubmissionError, SubmissionResult,
        SubmissionStatus, SubmitOptions,
    };
    pub use lms_model::{ChapterEdit, CourseEdit, CourseFields, LectureEdit, NodeKey};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
