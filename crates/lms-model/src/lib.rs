//! LMS Model - course edit tree
//!
//! Value types shared by every crate in the workspace:
//! - Typed identifiers and the tagged [`NodeKey`] (new vs existing)
//! - The editor-side [`CourseEdit`] tree (course → chapters → lectures)
//! - Records returned by the backend after a write

#![warn(unreachable_pub)]

pub mod edit;
pub mod node;
pub mod persisted;

pub use edit::{
    ChapterEdit, ChapterFields, CourseEdit, CourseFields, LectureEdit, LectureFields, MaterialRef,
    MediaKind, MediaRef,
};
pub use node::{classify, ChapterId, CourseId, LectureId, NodeKey, NodeStatus};
pub use persisted::{PersistedChapter, PersistedCourse, PersistedLecture};
