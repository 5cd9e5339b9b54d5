//! Course submission coordinator
//!
//! Top-level entry point: writes the course record, then hands the chapter
//! tree to the reconcilers under the resolved course id. Owns the submission
//! state machine and is the only place that tells "nothing saved" apart from
//! "course saved, tree partial".

use crate::chapters::ChapterReconciler;
use crate::context::ReconcileContext;
use crate::error::{AbortCause, NodeRef};
use crate::phase::{PhaseTracker, SubmissionPhase};
use crate::progress::{ProgressEvent, ProgressSink};
use crate::types::{Action, SubmissionConfig, SubmissionId, SubmissionResult};
use lms_model::{CourseEdit, CourseId, NodeKey};
use lms_remote::{RemoteError, RemoteResourceClient};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Per-submission options
#[derive(Debug, Clone, Default)]
pub struct SubmitOptions {
    /// Checked before every remote call
    pub cancel: CancellationToken,
    /// Progress notifications
    pub progress: ProgressSink,
}

impl SubmitOptions {
    /// No cancellation, no progress
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With cancellation token
    #[inline]
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// With progress sink
    #[inline]
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressSink) -> Self {
        self.progress = progress;
        self
    }
}

/// Submits whole course edits against a [`RemoteResourceClient`]
///
/// Cheap to clone; independent submissions may run concurrently on the same
/// coordinator, each strictly sequential inside.
#[derive(Clone)]
pub struct CourseSubmissionCoordinator {
    client: Arc<dyn RemoteResourceClient>,
    config: SubmissionConfig,
}

impl CourseSubmissionCoordinator {
    /// Coordinator with default configuration
    #[must_use]
    pub fn new(client: Arc<dyn RemoteResourceClient>) -> Self {
        Self {
            client,
            config: SubmissionConfig::default(),
        }
    }

    /// With submission configuration
    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: SubmissionConfig) -> Self {
        self.config = config;
        self
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SubmissionConfig {
        &self.config
    }

    /// Submit `edit` without cancellation or progress reporting.
    ///
    /// Never fails as a whole: every failure is described in the returned
    /// [`SubmissionResult`]. Use [`SubmissionResult::into_result`] for a
    /// `Result` view.
    pub async fn submit(&self, edit: &CourseEdit) -> SubmissionResult {
        self.submit_with(edit, SubmitOptions::default()).await
    }

    /// Submit `edit` with caller-supplied cancellation and progress sink.
    ///
    /// # Workflow
    /// 1. Create or update the course with its scalar fields
    /// 2. On success, reconcile every chapter (and its lectures) in order
    /// 3. Stop at the first failed write or at cancellation
    pub async fn submit_with(&self, edit: &CourseEdit, options: SubmitOptions) -> SubmissionResult {
        let submission = SubmissionId::new();
        let span = tracing::info_span!(
            "submission",
            id = %submission,
            chapters = edit.chapters.len(),
            lectures = edit.lecture_count()
        );
        self.run(submission, edit, options).instrument(span).await
    }

    async fn run(&self, submission: SubmissionId, edit: &CourseEdit, options: SubmitOptions) -> SubmissionResult {
        let ctx = ReconcileContext::new(Arc::clone(&self.client), submission)
            .with_cancel(options.cancel)
            .with_progress(options.progress.clone())
            .with_call_timeout(self.config.call_timeout());
        let mut phase = PhaseTracker::new(submission, options.progress);
        let mut result = SubmissionResult::pending(submission, &edit.key);

        if ctx.is_cancelled() {
            tracing::info!("cancelled before the course was written");
            result.cancelled_at = Some(NodeRef::Course);
            phase.advance(SubmissionPhase::Cancelled);
            result.phase = phase.current();
            return result;
        }

        phase.advance(SubmissionPhase::SubmittingCourse);
        let written = self.write_course(&ctx, edit).await;
        ctx.progress().emit(ProgressEvent::CourseSettled {
            submission,
            course_id: written.as_ref().ok().copied(),
            action: result.course_action,
            error: written.as_ref().err().cloned(),
        });

        let course_id = match written {
            Ok(course_id) => course_id,
            Err(error) => {
                tracing::warn!(%error, "course write failed, nothing saved");
                result.fatal_at = Some(NodeRef::Course);
                result.error = Some(error);
                phase.advance(SubmissionPhase::Failed);
                result.phase = phase.current();
                return result;
            }
        };
        result.course_id = Some(course_id);
        result.course_succeeded = true;

        phase.advance(SubmissionPhase::SubmittingTree);
        match ChapterReconciler::new(&ctx)
            .reconcile(course_id, &edit.chapters)
            .await
        {
            Ok(outcomes) => {
                result.chapter_outcomes = outcomes;
                phase.advance(SubmissionPhase::Done);
            }
            Err(abort) => {
                result.chapter_outcomes = abort.outcomes;
                match abort.cause {
                    AbortCause::Failed(error) => {
                        tracing::warn!(%course_id, node = %error.node, "course saved, tree partially saved");
                        result.fatal_at = Some(error.node);
                        result.error = Some(error.source);
                        phase.advance(SubmissionPhase::Failed);
                    }
                    AbortCause::Cancelled(at) => {
                        result.cancelled_at = Some(at);
                        phase.advance(SubmissionPhase::Cancelled);
                    }
                }
            }
        }
        result.phase = phase.current();

        let counts = result.counts();
        tracing::info!(
            %course_id,
            status = ?result.status(),
            created = counts.created,
            updated = counts.updated,
            failed = counts.failed,
            "submission finished"
        );
        result
    }

    async fn write_course(&self, ctx: &ReconcileContext, edit: &CourseEdit) -> Result<CourseId, RemoteError> {
        let client = ctx.client();
        tracing::debug!(action = ?Action::for_key(&edit.key), "writing course");
        match edit.key {
            NodeKey::New => ctx
                .create(client.create_course(&edit.fields))
                .await
                .map(|persisted| persisted.id),
            NodeKey::Existing(course_id) => ctx
                .call(client.update_course(course_id, &edit.fields))
                .await
                .map(|_| course_id),
        }
    }
}

impl std::fmt::Debug for CourseSubmissionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CourseSubmissionCoordinator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
