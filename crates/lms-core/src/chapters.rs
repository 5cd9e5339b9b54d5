//! Chapter reconciliation
//!
//! Chapters are written one at a time under a persisted course id. Each
//! chapter's lectures are reconciled right after the chapter itself, before
//! the next chapter is attempted, because a new chapter's id only exists once
//! its create call has returned.

use crate::context::ReconcileContext;
use crate::error::{NodeRef, ReconcileAbort, RemoteMutationError};
use crate::lectures::LectureReconciler;
use crate::types::{Action, ReconciliationOutcome};
use lms_model::{ChapterEdit, CourseId, NodeKey};

/// Sequential create/update of a course's chapters and their lectures
#[derive(Debug)]
pub struct ChapterReconciler<'a> {
    ctx: &'a ReconcileContext,
}

impl<'a> ChapterReconciler<'a> {
    /// Reconciler bound to one submission context
    #[inline]
    #[must_use]
    pub fn new(ctx: &'a ReconcileContext) -> Self {
        Self { ctx }
    }

    /// Persist `chapters` and their lectures under `course_id`.
    ///
    /// Returns one outcome per chapter, in input order, each carrying its
    /// lecture outcomes.
    ///
    /// # Errors
    /// [`ReconcileAbort`] on the first failed write anywhere in the tree, or
    /// on cancellation. Its outcomes include the chapter being processed when
    /// processing stopped, with whatever lectures it got through.
    pub async fn reconcile(
        &self,
        course_id: CourseId,
        chapters: &[ChapterEdit],
    ) -> Result<Vec<ReconciliationOutcome>, ReconcileAbort> {
        let client = self.ctx.client();
        let lectures = LectureReconciler::new(self.ctx);
        let mut outcomes = Vec::with_capacity(chapters.len());

        for (index, chapter) in chapters.iter().enumerate() {
            let node = NodeRef::Chapter { index };
            if self.ctx.is_cancelled() {
                tracing::info!(%course_id, chapter_index = index, "chapter reconciliation cancelled");
                return Err(ReconcileAbort::cancelled(outcomes, node));
            }

            let action = Action::for_key(&chapter.key);
            tracing::debug!(%course_id, chapter_index = index, ?action, "writing chapter");

            let written = match chapter.key {
                NodeKey::New => self
                    .ctx
                    .create(client.create_chapter(course_id, &chapter.fields))
                    .await
                    .map(|persisted| persisted.id),
                NodeKey::Existing(chapter_id) => self
                    .ctx
                    .call(client.update_chapter(course_id, chapter_id, &chapter.fields))
                    .await
                    .map(|_| chapter_id),
            };

            let chapter_id = match written {
                Ok(chapter_id) => chapter_id,
                Err(error) => {
                    tracing::warn!(%course_id, chapter_index = index, %error, "chapter write failed");
                    let outcome = ReconciliationOutcome::failed(
                        node,
                        action,
                        chapter.key.id().map(u64::from),
                        error.clone(),
                    );
                    self.ctx.node_settled(&outcome);
                    outcomes.push(outcome);
                    return Err(ReconcileAbort::failed(
                        outcomes,
                        RemoteMutationError::new(node, error),
                    ));
                }
            };

            let mut outcome = ReconciliationOutcome::succeeded(node, action, chapter_id.get());
            self.ctx.node_settled(&outcome);

            match lectures
                .reconcile(course_id, chapter_id, index, &chapter.lectures)
                .await
            {
                Ok(lecture_outcomes) => {
                    outcome.lectures = lecture_outcomes;
                    outcomes.push(outcome);
                }
                Err(abort) => {
                    outcome.lectures = abort.outcomes;
                    outcomes.push(outcome);
                    return Err(ReconcileAbort {
                        outcomes,
                        cause: abort.cause,
                    });
                }
            }
        }

        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AbortCause;
    use crate::types::SubmissionId;
    use lms_model::{ChapterId, LectureEdit, LectureId, PersistedChapter, PersistedLecture};
    use lms_remote::{MockRemoteResourceClient, RemoteError};
    use mockall::Sequence;
    use std::sync::Arc;

    fn context(mock: MockRemoteResourceClient) -> ReconcileContext {
        ReconcileContext::new(Arc::new(mock), SubmissionId::new())
    }

    #[tokio::test]
    async fn lectures_run_under_the_chapter_id_just_created() {
        let mut mock = MockRemoteResourceClient::new();
        let mut seq = Sequence::new();

        mock.expect_create_chapter()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|course, fields| Ok(PersistedChapter::echo(ChapterId(40), Some(course), fields)));
        mock.expect_create_lecture()
            .withf(|course, chapter, _| *course == CourseId(7) && *chapter == ChapterId(40))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, chapter, fields| Ok(PersistedLecture::echo(LectureId(50), Some(chapter), fields)));
        mock.expect_update_chapter()
            .withf(|course, chapter, _| *course == CourseId(7) && *chapter == ChapterId(2))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|course, id, fields| Ok(PersistedChapter::echo(id, Some(course), fields)));

        let ctx = context(mock);
        let chapters = vec![
            ChapterEdit::new("Basics", 1).with_lecture(LectureEdit::new("Hello", 1)),
            ChapterEdit::new("Traits", 2).with_id(ChapterId(2)),
        ];

        let outcomes = ChapterReconciler::new(&ctx)
            .reconcile(CourseId(7), &chapters)
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].chapter_id(), Some(ChapterId(40)));
        assert_eq!(outcomes[0].lectures.len(), 1);
        assert_eq!(outcomes[0].lectures[0].lecture_id(), Some(LectureId(50)));
        assert_eq!(outcomes[1].action, Action::Updated);
        assert_eq!(outcomes[1].chapter_id(), Some(ChapterId(2)));
        assert!(outcomes.iter().all(ReconciliationOutcome::tree_succeeded));
    }

    #[tokio::test]
    async fn failed_chapter_skips_its_lectures_and_later_chapters() {
        let mut mock = MockRemoteResourceClient::new();
        mock.expect_update_chapter()
            .times(1)
            .returning(|_, _, _| Err(RemoteError::status(404, "no such chapter")));
        mock.expect_create_lecture().times(0);
        mock.expect_create_chapter().times(0);

        let ctx = context(mock);
        let chapters = vec![
            ChapterEdit::new("Gone", 1)
                .with_id(ChapterId(8))
                .with_lecture(LectureEdit::new("Orphan", 1)),
            ChapterEdit::new("Later", 2),
        ];

        let abort = ChapterReconciler::new(&ctx)
            .reconcile(CourseId(1), &chapters)
            .await
            .unwrap_err();

        assert_eq!(abort.outcomes.len(), 1);
        assert!(!abort.outcomes[0].success());
        // Update failures keep the id the caller supplied.
        assert_eq!(abort.outcomes[0].resolved_id, Some(8));
        assert!(abort.outcomes[0].lectures.is_empty());
        assert_eq!(abort.node(), NodeRef::Chapter { index: 0 });
    }

    #[tokio::test]
    async fn lecture_failure_is_reported_inside_its_chapter() {
        let mut mock = MockRemoteResourceClient::new();
        mock.expect_create_chapter()
            .times(1)
            .returning(|course, fields| Ok(PersistedChapter::echo(ChapterId(3), Some(course), fields)));
        mock.expect_create_lecture()
            .times(1)
            .returning(|_, _, _| Err(RemoteError::status(400, "bad media")));

        let ctx = context(mock);
        let chapters = vec![
            ChapterEdit::new("One", 1).with_lecture(LectureEdit::new("Bad", 1)),
            ChapterEdit::new("Two", 2),
        ];

        let abort = ChapterReconciler::new(&ctx)
            .reconcile(CourseId(1), &chapters)
            .await
            .unwrap_err();

        assert_eq!(abort.outcomes.len(), 1);
        let chapter = &abort.outcomes[0];
        assert!(chapter.success());
        assert!(!chapter.tree_succeeded());
        assert_eq!(chapter.lectures.len(), 1);
        match abort.cause {
            AbortCause::Failed(error) => {
                assert_eq!(
                    error.node,
                    NodeRef::Lecture {
                        chapter_index: 0,
                        index: 0
                    }
                );
                assert_eq!(error.source.http_status(), Some(400));
            }
            AbortCause::Cancelled(_) => panic!("expected a failed write"),
        }
    }
}
