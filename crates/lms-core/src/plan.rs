//! Dry-run submission plan
//!
//! Lists the remote calls a fully successful submission of an edit would
//! issue, in order. Ids that only exist after an earlier create returns are
//! shown as references to the node that will produce them.

use crate::error::NodeRef;
use lms_model::{ChapterId, CourseEdit, CourseId, LectureId, NodeKey};
use serde::Serialize;
use std::fmt;

/// Id known up front, or produced by an earlier create in the same plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdRef<I> {
    /// Supplied by the caller
    Known(I),
    /// Assigned by the create call of this node
    Pending(NodeRef),
}

impl<I: Copy> IdRef<I> {
    fn of(key: &NodeKey<I>, node: NodeRef) -> Self {
        match key {
            NodeKey::New => Self::Pending(node),
            NodeKey::Existing(id) => Self::Known(*id),
        }
    }
}

impl<I: fmt::Display> fmt::Display for IdRef<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(id) => write!(f, "{id}"),
            Self::Pending(node) => write!(f, "<id of {node}>"),
        }
    }
}

/// One remote call in a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "operation", rename_all = "kebab-case")]
pub enum PlannedCall {
    /// POST the course
    CreateCourse,
    /// PUT the course
    UpdateCourse {
        /// Course
        course_id: CourseId,
    },
    /// POST a chapter
    CreateChapter {
        /// Chapter position
        node: NodeRef,
        /// Parent course
        course: IdRef<CourseId>,
    },
    /// PUT a chapter
    UpdateChapter {
        /// Chapter position
        node: NodeRef,
        /// Parent course
        course: IdRef<CourseId>,
        /// Chapter
        chapter_id: ChapterId,
    },
    /// POST a lecture
    CreateLecture {
        /// Lecture position
        node: NodeRef,
        /// Course
        course: IdRef<CourseId>,
        /// Parent chapter
        chapter: IdRef<ChapterId>,
    },
    /// PUT a lecture
    UpdateLecture {
        /// Lecture position
        node: NodeRef,
        /// Course
        course: IdRef<CourseId>,
        /// Parent chapter
        chapter: IdRef<ChapterId>,
        /// Lecture
        lecture_id: LectureId,
    },
}

impl PlannedCall {
    /// Operation name, e.g. `create-chapter`
    #[must_use]
    pub fn operation(&self) -> &'static str {
        match self {
            Self::CreateCourse => "create-course",
            Self::UpdateCourse { .. } => "update-course",
            Self::CreateChapter { .. } => "create-chapter",
            Self::UpdateChapter { .. } => "update-chapter",
            Self::CreateLecture { .. } => "create-lecture",
            Self::UpdateLecture { .. } => "update-lecture",
        }
    }

    /// Node this call writes
    #[must_use]
    pub fn node(&self) -> NodeRef {
        match self {
            Self::CreateCourse | Self::UpdateCourse { .. } => NodeRef::Course,
            Self::CreateChapter { node, .. }
            | Self::UpdateChapter { node, .. }
            | Self::CreateLecture { node, .. }
            | Self::UpdateLecture { node, .. } => *node,
        }
    }
}

impl fmt::Display for PlannedCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = self.operation();
        match self {
            Self::CreateCourse => write!(f, "{op}"),
            Self::UpdateCourse { course_id } => write!(f, "{op} course={course_id}"),
            Self::CreateChapter { node, course } => write!(f, "{op} [{node}] course={course}"),
            Self::UpdateChapter {
                node,
                course,
                chapter_id,
            } => write!(f, "{op} [{node}] course={course} chapter={chapter_id}"),
            Self::CreateLecture {
                node,
                course,
                chapter,
            } => write!(f, "{op} [{node}] course={course} chapter={chapter}"),
            Self::UpdateLecture {
                node,
                course,
                chapter,
                lecture_id,
            } => write!(
                f,
                "{op} [{node}] course={course} chapter={chapter} lecture={lecture_id}"
            ),
        }
    }
}

/// Ordered calls of a fully successful submission
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SubmissionPlan {
    /// Calls in issue order
    pub calls: Vec<PlannedCall>,
}

impl SubmissionPlan {
    /// Number of calls
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Always false for a real edit: the course call is always planned
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Operation names in order
    #[must_use]
    pub fn operations(&self) -> Vec<&'static str> {
        self.calls.iter().map(PlannedCall::operation).collect()
    }
}

impl fmt::Display for SubmissionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, call) in self.calls.iter().enumerate() {
            writeln!(f, "{:>3}. {call}", i + 1)?;
        }
        Ok(())
    }
}

/// Plan the calls submitting `edit` would make if every call succeeded.
#[must_use]
pub fn plan_submission(edit: &CourseEdit) -> SubmissionPlan {
    let mut calls = Vec::with_capacity(1 + edit.chapters.len() + edit.lecture_count());

    calls.push(match edit.key {
        NodeKey::New => PlannedCall::CreateCourse,
        NodeKey::Existing(course_id) => PlannedCall::UpdateCourse { course_id },
    });
    let course = IdRef::of(&edit.key, NodeRef::Course);

    for (index, chapter) in edit.chapters.iter().enumerate() {
        let node = NodeRef::Chapter { index };
        calls.push(match chapter.key {
            NodeKey::New => PlannedCall::CreateChapter { node, course },
            NodeKey::Existing(chapter_id) => PlannedCall::UpdateChapter {
                node,
                course,
                chapter_id,
            },
        });
        let chapter_ref = IdRef::of(&chapter.key, node);

        for (lecture_index, lecture) in chapter.lectures.iter().enumerate() {
            let node = NodeRef::Lecture {
                chapter_index: index,
                index: lecture_index,
            };
            calls.push(match lecture.key {
                NodeKey::New => PlannedCall::CreateLecture {
                    node,
                    course,
                    chapter: chapter_ref,
                },
                NodeKey::Existing(lecture_id) => PlannedCall::UpdateLecture {
                    node,
                    course,
                    chapter: chapter_ref,
                    lecture_id,
                },
            });
        }
    }

    SubmissionPlan { calls }
}
