//! Lecture reconciliation
//!
//! Writes every lecture of one chapter, in order, under a chapter id that is
//! already persisted.

use crate::context::ReconcileContext;
use crate::error::{NodeRef, ReconcileAbort, RemoteMutationError};
use crate::types::{Action, ReconciliationOutcome};
use lms_model::{ChapterId, CourseId, LectureEdit, NodeKey};

/// Sequential create/update of a chapter's lectures
#[derive(Debug)]
pub struct LectureReconciler<'a> {
    ctx: &'a ReconcileContext,
}

impl<'a> LectureReconciler<'a> {
    /// Reconciler bound to one submission context
    #[inline]
    #[must_use]
    pub fn new(ctx: &'a ReconcileContext) -> Self {
        Self { ctx }
    }

    /// Persist `lectures` under `chapter_id`.
    ///
    /// `chapter_index` is the parent's position in the course, used to tag
    /// outcomes. Each call is awaited before the next is issued; the first
    /// failure is recorded and ends the chapter.
    ///
    /// # Errors
    /// [`ReconcileAbort`] carrying every outcome so far (the failed one
    /// included) when a write fails or the submission is cancelled.
    pub async fn reconcile(
        &self,
        course_id: CourseId,
        chapter_id: ChapterId,
        chapter_index: usize,
        lectures: &[LectureEdit],
    ) -> Result<Vec<ReconciliationOutcome>, ReconcileAbort> {
        let client = self.ctx.client();
        let mut outcomes = Vec::with_capacity(lectures.len());

        for (index, lecture) in lectures.iter().enumerate() {
            let node = NodeRef::Lecture {
                chapter_index,
                index,
            };
            if self.ctx.is_cancelled() {
                tracing::info!(%course_id, %chapter_id, lecture_index = index, "lecture reconciliation cancelled");
                return Err(ReconcileAbort::cancelled(outcomes, node));
            }

            let action = Action::for_key(&lecture.key);
            tracing::debug!(%course_id, %chapter_id, lecture_index = index, ?action, "writing lecture");

            let written = match lecture.key {
                NodeKey::New => self
                    .ctx
                    .create(client.create_lecture(course_id, chapter_id, &lecture.fields))
                    .await
                    .map(|persisted| persisted.id),
                NodeKey::Existing(lecture_id) => self
                    .ctx
                    .call(client.update_lecture(course_id, chapter_id, lecture_id, &lecture.fields))
                    .await
                    .map(|_| lecture_id),
            };

            match written {
                Ok(lecture_id) => {
                    let outcome = ReconciliationOutcome::succeeded(node, action, lecture_id.get());
                    self.ctx.node_settled(&outcome);
                    outcomes.push(outcome);
                }
                Err(error) => {
                    tracing::warn!(%course_id, %chapter_id, lecture_index = index, %error, "lecture write failed");
                    let outcome = ReconciliationOutcome::failed(
                        node,
                        action,
                        lecture.key.id().map(u64::from),
                        error.clone(),
                    );
                    self.ctx.node_settled(&outcome);
                    outcomes.push(outcome);
                    return Err(ReconcileAbort::failed(
                        outcomes,
                        RemoteMutationError::new(node, error),
                    ));
                }
            }
        }

        Ok(outcomes)
    }
}
