//! Testing utilities for the LMS workspace
//!
//! An in-memory [`RemoteResourceClient`] that records every call, assigns
//! sequential ids, and fails or cancels on request, plus edit-tree fixtures.

#![allow(missing_docs)]

use async_trait::async_trait;
use lms_model::{
    ChapterEdit, ChapterFields, ChapterId, CourseEdit, CourseFields, CourseId, LectureEdit,
    LectureFields, LectureId, MediaKind, PersistedChapter, PersistedCourse, PersistedLecture,
};
use lms_remote::{RemoteError, RemoteResourceClient};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// First id handed out per level
pub const FIRST_COURSE_ID: u64 = 100;
pub const FIRST_CHAPTER_ID: u64 = 200;
pub const FIRST_LECTURE_ID: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    CreateCourse,
    UpdateCourse,
    CreateChapter,
    UpdateChapter,
    CreateLecture,
    UpdateLecture,
}

impl Op {
    /// Same names the submission plan uses
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::CreateCourse => "create-course",
            Self::UpdateCourse => "update-course",
            Self::CreateChapter => "create-chapter",
            Self::UpdateChapter => "update-chapter",
            Self::CreateLecture => "create-lecture",
            Self::UpdateLecture => "update-lecture",
        }
    }
}

/// A call as the backend saw it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateCourse {
        title: String,
    },
    UpdateCourse {
        course_id: CourseId,
        title: String,
    },
    CreateChapter {
        course_id: CourseId,
        title: String,
        order: i32,
    },
    UpdateChapter {
        course_id: CourseId,
        chapter_id: ChapterId,
        title: String,
        order: i32,
    },
    CreateLecture {
        course_id: CourseId,
        chapter_id: ChapterId,
        title: String,
        order: i32,
    },
    UpdateLecture {
        course_id: CourseId,
        chapter_id: ChapterId,
        lecture_id: LectureId,
        title: String,
        order: i32,
    },
}

impl Call {
    #[must_use]
    pub fn op(&self) -> Op {
        match self {
            Self::CreateCourse { .. } => Op::CreateCourse,
            Self::UpdateCourse { .. } => Op::UpdateCourse,
            Self::CreateChapter { .. } => Op::CreateChapter,
            Self::UpdateChapter { .. } => Op::UpdateChapter,
            Self::CreateLecture { .. } => Op::CreateLecture,
            Self::UpdateLecture { .. } => Op::UpdateLecture,
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::CreateCourse { title }
            | Self::UpdateCourse { title, .. }
            | Self::CreateChapter { title, .. }
            | Self::UpdateChapter { title, .. }
            | Self::CreateLecture { title, .. }
            | Self::UpdateLecture { title, .. } => title,
        }
    }

    /// Order number as received, for chapters and lectures
    #[must_use]
    pub fn order(&self) -> Option<i32> {
        match self {
            Self::CreateCourse { .. } | Self::UpdateCourse { .. } => None,
            Self::CreateChapter { order, .. }
            | Self::UpdateChapter { order, .. }
            | Self::CreateLecture { order, .. }
            | Self::UpdateLecture { order, .. } => Some(*order),
        }
    }

    /// Id the caller supplied, for updates
    fn given_id(&self) -> Option<u64> {
        match self {
            Self::UpdateCourse { course_id, .. } => Some(course_id.get()),
            Self::UpdateChapter { chapter_id, .. } => Some(chapter_id.get()),
            Self::UpdateLecture { lecture_id, .. } => Some(lecture_id.get()),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct State {
    calls: Vec<Call>,
    seen: HashMap<Op, usize>,
    failures: HashMap<(Op, usize), RemoteError>,
    cancels: HashMap<(Op, usize), CancellationToken>,
    next_course: u64,
    next_chapter: u64,
    next_lecture: u64,
}

impl State {
    fn assign(&mut self, op: Op) -> u64 {
        let counter = match op {
            Op::CreateCourse => &mut self.next_course,
            Op::CreateChapter => &mut self.next_chapter,
            _ => &mut self.next_lecture,
        };
        let id = *counter;
        *counter += 1;
        id
    }
}

/// In-memory backend that records calls in issue order
///
/// Stateless apart from its id counters: updates always succeed for any id,
/// creates always get a fresh id.
#[derive(Debug)]
pub struct RecordingClient {
    state: Mutex<State>,
    delay: Option<Duration>,
}

impl Default for RecordingClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingClient {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                calls: Vec::new(),
                seen: HashMap::new(),
                failures: HashMap::new(),
                cancels: HashMap::new(),
                next_course: FIRST_COURSE_ID,
                next_chapter: FIRST_CHAPTER_ID,
                next_lecture: FIRST_LECTURE_ID,
            }),
            delay: None,
        }
    }

    /// Reject the `n`th (zero-based) call of `op` with `error`
    #[must_use]
    pub fn fail_nth(mut self, op: Op, n: usize, error: RemoteError) -> Self {
        self.state.get_mut().failures.insert((op, n), error);
        self
    }

    /// Cancel `token` while serving the `n`th call of `op`; that call still succeeds
    #[must_use]
    pub fn cancel_on(mut self, op: Op, n: usize, token: CancellationToken) -> Self {
        self.state.get_mut().cancels.insert((op, n), token);
        self
    }

    /// Sleep this long before answering each call
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.state.lock().await.calls.clone()
    }

    pub async fn ops(&self) -> Vec<Op> {
        self.state.lock().await.calls.iter().map(Call::op).collect()
    }

    /// Operation names in issue order
    pub async fn operations(&self) -> Vec<&'static str> {
        self.ops().await.into_iter().map(Op::name).collect()
    }

    pub async fn count(&self, op: Op) -> usize {
        self.state.lock().await.seen.get(&op).copied().unwrap_or(0)
    }

    async fn respond(&self, call: Call) -> Result<u64, RemoteError> {
        let outcome = {
            let mut state = self.state.lock().await;
            let op = call.op();
            let seen = state.seen.entry(op).or_insert(0);
            let n = *seen;
            *seen += 1;

            let given = call.given_id();
            state.calls.push(call);
            if let Some(token) = state.cancels.remove(&(op, n)) {
                token.cancel();
            }
            let failure = state.failures.remove(&(op, n));
            match failure {
                Some(error) => Err(error),
                None => Ok(given.unwrap_or_else(|| state.assign(op))),
            }
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        outcome
    }
}

#[async_trait]
impl RemoteResourceClient for RecordingClient {
    async fn create_course(&self, fields: &CourseFields) -> Result<PersistedCourse, RemoteError> {
        let id = self
            .respond(Call::CreateCourse {
                title: fields.title.clone(),
            })
            .await?;
        Ok(PersistedCourse::echo(CourseId(id), fields))
    }

    async fn update_course(
        &self,
        course_id: CourseId,
        fields: &CourseFields,
    ) -> Result<PersistedCourse, RemoteError> {
        self.respond(Call::UpdateCourse {
            course_id,
            title: fields.title.clone(),
        })
        .await?;
        Ok(PersistedCourse::echo(course_id, fields))
    }

    async fn create_chapter(
        &self,
        course_id: CourseId,
        fields: &ChapterFields,
    ) -> Result<PersistedChapter, RemoteError> {
        let id = self
            .respond(Call::CreateChapter {
                course_id,
                title: fields.title.clone(),
                order: fields.order,
            })
            .await?;
        Ok(PersistedChapter::echo(ChapterId(id), Some(course_id), fields))
    }

    async fn update_chapter(
        &self,
        course_id: CourseId,
        chapter_id: ChapterId,
        fields: &ChapterFields,
    ) -> Result<PersistedChapter, RemoteError> {
        self.respond(Call::UpdateChapter {
            course_id,
            chapter_id,
            title: fields.title.clone(),
            order: fields.order,
        })
        .await?;
        Ok(PersistedChapter::echo(chapter_id, Some(course_id), fields))
    }

    async fn create_lecture(
        &self,
        course_id: CourseId,
        chapter_id: ChapterId,
        fields: &LectureFields,
    ) -> Result<PersistedLecture, RemoteError> {
        let id = self
            .respond(Call::CreateLecture {
                course_id,
                chapter_id,
                title: fields.title.clone(),
                order: fields.order,
            })
            .await?;
        Ok(PersistedLecture::echo(LectureId(id), Some(chapter_id), fields))
    }

    async fn update_lecture(
        &self,
        course_id: CourseId,
        chapter_id: ChapterId,
        lecture_id: LectureId,
        fields: &LectureFields,
    ) -> Result<PersistedLecture, RemoteError> {
        self.respond(Call::UpdateLecture {
            course_id,
            chapter_id,
            lecture_id,
            title: fields.title.clone(),
            order: fields.order,
        })
        .await?;
        Ok(PersistedLecture::echo(lecture_id, Some(chapter_id), fields))
    }
}

// ---- fixtures ----

/// All-new course with one chapter per entry of `lectures_per_chapter`
#[must_use]
pub fn new_course(lectures_per_chapter: &[usize]) -> CourseEdit {
    lectures_per_chapter
        .iter()
        .enumerate()
        .fold(CourseEdit::new(CourseFields::new("Test course")), |edit, (c, &n)| {
            edit.with_chapter(chapter(c, n))
        })
}

/// New chapter `index` holding `lectures` new lectures
#[must_use]
pub fn chapter(index: usize, lectures: usize) -> ChapterEdit {
    let order = i32::try_from(index + 1).unwrap_or(i32::MAX);
    (0..lectures).fold(
        ChapterEdit::new(format!("Chapter {index}"), order),
        |chapter, l| {
            let order = i32::try_from(l + 1).unwrap_or(i32::MAX);
            chapter.with_lecture(
                LectureEdit::new(format!("Lecture {index}.{l}"), order)
                    .with_media(format!("https://cdn.example.com/{index}/{l}.mp4"), MediaKind::Video),
            )
        },
    )
}

/// Scenario-style tree: new course, two new chapters, the second with one lecture
#[must_use]
pub fn sample_edit() -> CourseEdit {
    new_course(&[0, 1])
}
