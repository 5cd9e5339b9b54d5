use lms_core::{
    Action, CourseSubmissionCoordinator, NodeRef, SubmissionError, SubmissionPhase,
    SubmissionStatus,
};
use lms_model::{ChapterEdit, ChapterId, CourseEdit, CourseFields, CourseId, LectureEdit};
use lms_remote::{RemoteError, RemoteResourceClient};
use lms_test_utils::{new_course, sample_edit, Call, Op, RecordingClient};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn coordinator(client: &Arc<RecordingClient>) -> CourseSubmissionCoordinator {
    CourseSubmissionCoordinator::new(Arc::clone(client) as Arc<dyn RemoteResourceClient>)
}

#[tokio::test]
async fn new_course_with_two_chapters_and_one_lecture() {
    let client = Arc::new(RecordingClient::new());
    let result = coordinator(&client).submit(&sample_edit()).await;

    assert_eq!(
        client.operations().await,
        vec!["create-course", "create-chapter", "create-chapter", "create-lecture"]
    );
    assert!(result.course_succeeded);
    assert_eq!(result.course_id, Some(CourseId(100)));
    assert_eq!(result.chapter_outcomes.len(), 2);
    assert_eq!(result.chapter_outcomes[1].lectures.len(), 1);
    assert_eq!(result.status(), SubmissionStatus::Complete);
    assert_eq!(result.phase, SubmissionPhase::Done);

    // The lecture went to the chapter id the second create returned.
    let calls = client.calls().await;
    assert_eq!(
        calls[3],
        Call::CreateLecture {
            course_id: CourseId(100),
            chapter_id: ChapterId(201),
            title: "Lecture 1.0".into(),
            order: 1,
        }
    );
}

#[tokio::test]
async fn existing_course_and_chapter_are_updated() {
    let client = Arc::new(RecordingClient::new());
    let edit = CourseEdit::existing(CourseId(5), CourseFields::new("Rust")).with_chapter(
        ChapterEdit::new("Ownership", 1)
            .with_id(ChapterId(10))
            .with_lecture(LectureEdit::new("Moves", 1)),
    );

    let result = coordinator(&client).submit(&edit).await;

    assert_eq!(
        client.calls().await,
        vec![
            Call::UpdateCourse {
                course_id: CourseId(5),
                title: "Rust".into()
            },
            Call::UpdateChapter {
                course_id: CourseId(5),
                chapter_id: ChapterId(10),
                title: "Ownership".into(),
                order: 1,
            },
            Call::CreateLecture {
                course_id: CourseId(5),
                chapter_id: ChapterId(10),
                title: "Moves".into(),
                order: 1,
            },
        ]
    );
    assert!(result.is_complete());
    assert_eq!(result.course_action, Action::Updated);
    assert_eq!(result.chapter_outcomes[0].action, Action::Updated);
    assert_eq!(result.chapter_outcomes[0].lectures[0].action, Action::Created);
}

#[tokio::test]
async fn order_numbers_reach_the_backend_unchanged() {
    let client = Arc::new(RecordingClient::new());
    let edit = CourseEdit::new(CourseFields::new("Gaps"))
        .with_chapter(
            ChapterEdit::new("Late", 40)
                .with_lecture(LectureEdit::new("b", 7))
                .with_lecture(LectureEdit::new("a", -3)),
        )
        .with_chapter(ChapterEdit::new("Early", 2).with_id(ChapterId(9)));

    let result = coordinator(&client).submit(&edit).await;

    assert!(result.is_complete());
    let orders: Vec<_> = client.calls().await.iter().map(Call::order).collect();
    assert_eq!(orders, vec![None, Some(40), Some(7), Some(-3), Some(2)]);
}

#[tokio::test]
async fn serialized_result_reports_success_per_node() {
    let client = Arc::new(RecordingClient::new().fail_nth(
        Op::CreateLecture,
        0,
        RemoteError::status(400, "media_url invalid"),
    ));

    let result = coordinator(&client).submit(&new_course(&[1])).await;
    let json = serde_json::to_value(&result).unwrap();

    let chapter = &json["chapter_outcomes"][0];
    assert_eq!(chapter["kind"], "chapter");
    assert_eq!(chapter["resolved_id"], 200);
    assert_eq!(chapter["success"], true);
    assert_eq!(chapter["lectures"][0]["success"], false);
    assert_eq!(chapter["lectures"][0]["action"], "created");
    assert_eq!(chapter["lectures"][0]["error"]["status"], 400);
}

#[tokio::test]
async fn first_chapter_rejected_stops_the_tree() {
    let client = Arc::new(
        RecordingClient::new().fail_nth(
            Op::CreateChapter,
            0,
            RemoteError::status(422, r#"{"title":["too short"]}"#),
        ),
    );

    let result = coordinator(&client).submit(&new_course(&[1, 1])).await;

    assert_eq!(client.operations().await, vec!["create-course", "create-chapter"]);
    assert!(result.course_succeeded);
    assert_eq!(result.fatal_at, Some(NodeRef::Chapter { index: 0 }));
    assert_eq!(result.chapter_outcomes.len(), 1);
    assert!(!result.chapter_outcomes[0].success());
    assert_eq!(result.status(), SubmissionStatus::PartialTree);
    assert_eq!(result.phase, SubmissionPhase::Failed);

    match result.into_result() {
        Err(SubmissionError::PartialTree(failure)) => {
            assert_eq!(failure.course_id, CourseId(100));
            assert_eq!(failure.error.node, NodeRef::Chapter { index: 0 });
            assert!(failure.error.source.is_validation());
        }
        other => panic!("expected a partial tree failure, got {other:?}"),
    }
}

#[tokio::test]
async fn course_update_rejected_saves_nothing() {
    let client = Arc::new(RecordingClient::new().fail_nth(
        Op::UpdateCourse,
        0,
        RemoteError::status(409, "stale"),
    ));
    let edit = CourseEdit::existing(CourseId(5), CourseFields::new("Rust"))
        .with_chapter(ChapterEdit::new("A", 1).with_lecture(LectureEdit::new("a", 1)));

    let result = coordinator(&client).submit(&edit).await;

    assert_eq!(client.operations().await, vec!["update-course"]);
    assert!(!result.course_succeeded);
    assert!(result.chapter_outcomes.is_empty());
    assert_eq!(result.fatal_at, Some(NodeRef::Course));
    assert_eq!(result.status(), SubmissionStatus::CourseFailed);

    let err = result.into_result().unwrap_err();
    assert!(!err.course_saved());
    assert!(matches!(err, SubmissionError::CourseRejected(_)));
}

#[tokio::test]
async fn lecture_failure_ends_the_submission_and_is_located() {
    let client = Arc::new(RecordingClient::new().fail_nth(
        Op::CreateLecture,
        1,
        RemoteError::status(400, "media_url invalid"),
    ));

    let result = coordinator(&client).submit(&new_course(&[2, 1])).await;

    assert_eq!(
        client.operations().await,
        vec!["create-course", "create-chapter", "create-lecture", "create-lecture"]
    );
    assert_eq!(
        result.fatal_at,
        Some(NodeRef::Lecture {
            chapter_index: 0,
            index: 1
        })
    );
    assert_eq!(result.chapter_outcomes.len(), 1);
    let chapter = &result.chapter_outcomes[0];
    assert!(chapter.success());
    assert_eq!(chapter.lectures.len(), 2);
    assert!(chapter.lectures[0].success());
    assert!(!chapter.lectures[1].success());
    assert_eq!(result.status(), SubmissionStatus::PartialTree);
}

#[tokio::test]
async fn identical_submissions_differ_only_in_assigned_ids() {
    let client = Arc::new(RecordingClient::new());
    let coordinator = coordinator(&client);
    let edit = new_course(&[2, 0, 1]);

    let first = coordinator.submit(&edit).await;
    let second = coordinator.submit(&edit).await;

    let calls = client.calls().await;
    let (a, b) = calls.split_at(calls.len() / 2);
    let shape = |calls: &[Call]| {
        calls
            .iter()
            .map(|c| (c.op(), c.title().to_owned()))
            .collect::<Vec<_>>()
    };
    assert_eq!(shape(a), shape(b));

    let outcome_shape = |r: &lms_core::SubmissionResult| {
        r.chapter_outcomes
            .iter()
            .map(|c| (c.supplied_index, c.action, c.lectures.len()))
            .collect::<Vec<_>>()
    };
    assert_eq!(outcome_shape(&first), outcome_shape(&second));
    assert_ne!(first.course_id, second.course_id);
    assert_eq!(first.status(), second.status());
}

#[tokio::test]
async fn independent_submissions_can_run_together() {
    let client = Arc::new(RecordingClient::new());
    let coordinator = coordinator(&client);
    let left = new_course(&[1]);
    let right = new_course(&[0, 2]);

    let (a, b) = tokio::join!(coordinator.submit(&left), coordinator.submit(&right));

    assert!(a.is_complete());
    assert!(b.is_complete());
    assert_ne!(a.submission_id, b.submission_id);
    assert_eq!(client.count(Op::CreateCourse).await, 2);
    assert_eq!(client.count(Op::CreateLecture).await, 3);
}
