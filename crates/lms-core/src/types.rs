//! Core types for course submission
//!
//! Defines:
//! - Submission configuration and identity
//! - Per-node reconciliation outcomes
//! - The aggregate [`SubmissionResult`] and its conversions

use crate::error::{
    NodeLevel, NodeRef, PartialTreeFailure, RemoteMutationError, SubmissionError,
};
use crate::phase::SubmissionPhase;
use lms_model::{ChapterId, CourseEdit, CourseId, LectureId, NodeKey};
use lms_remote::RemoteError;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::time::Duration;
use ulid::Ulid;

/// Unique submission identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubmissionId(pub Ulid);

impl SubmissionId {
    /// Generate new submission ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Submission configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionConfig {
    /// Deadline for each individual remote call in seconds (0 = none)
    pub call_timeout_secs: u64,
}

impl SubmissionConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With per-call timeout
    #[inline]
    #[must_use]
    pub fn with_call_timeout_secs(mut self, secs: u64) -> Self {
        self.call_timeout_secs = secs;
        self
    }

    /// Per-call deadline, if any
    #[inline]
    #[must_use]
    pub fn call_timeout(&self) -> Option<Duration> {
        (self.call_timeout_secs > 0).then(|| Duration::from_secs(self.call_timeout_secs))
    }
}

/// Which write a node needed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// create-* call
    Created,
    /// update-* call
    Updated,
}

impl Action {
    /// Create for new nodes, update for existing ones
    #[inline]
    #[must_use]
    pub fn for_key<I: Copy>(key: &NodeKey<I>) -> Self {
        if key.is_new() {
            Self::Created
        } else {
            Self::Updated
        }
    }
}

/// Result of writing one chapter or lecture
///
/// Serializes with a derived `success` key; on input that key is ignored and
/// success follows from `error`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReconciliationOutcome {
    /// Chapter or lecture
    pub kind: NodeLevel,
    /// Position in the caller's list
    pub supplied_index: usize,
    /// Parent chapter position, for lectures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_index: Option<usize>,
    /// Create or update
    pub action: Action,
    /// Persisted id: server-assigned for created nodes, the input id for
    /// updated ones; absent when a create failed
    pub resolved_id: Option<u64>,
    /// Failure detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RemoteError>,
    /// Lecture outcomes, for chapters
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lectures: Vec<ReconciliationOutcome>,
}

impl ReconciliationOutcome {
    /// Successful write of `node`
    #[must_use]
    pub fn succeeded(node: NodeRef, action: Action, resolved_id: u64) -> Self {
        Self::at(node, action, Some(resolved_id), None)
    }

    /// Failed write of `node`; `known_id` is the input id for updates
    #[must_use]
    pub fn failed(node: NodeRef, action: Action, known_id: Option<u64>, error: RemoteError) -> Self {
        Self::at(node, action, known_id, Some(error))
    }

    fn at(node: NodeRef, action: Action, resolved_id: Option<u64>, error: Option<RemoteError>) -> Self {
        let parent_index = match node {
            NodeRef::Lecture { chapter_index, .. } => Some(chapter_index),
            _ => None,
        };
        Self {
            kind: node.level(),
            supplied_index: node.index().unwrap_or_default(),
            parent_index,
            action,
            resolved_id,
            error,
            lectures: Vec::new(),
        }
    }

    /// This node's own write succeeded
    #[inline]
    #[must_use]
    pub fn success(&self) -> bool {
        self.error.is_none()
    }

    /// This node and every lecture under it succeeded
    #[must_use]
    pub fn tree_succeeded(&self) -> bool {
        self.success() && self.lectures.iter().all(Self::tree_succeeded)
    }

    /// Tree position
    #[must_use]
    pub fn node(&self) -> NodeRef {
        match (self.kind, self.parent_index) {
            (NodeLevel::Lecture, Some(chapter_index)) => NodeRef::Lecture {
                chapter_index,
                index: self.supplied_index,
            },
            (NodeLevel::Course, _) => NodeRef::Course,
            _ => NodeRef::Chapter {
                index: self.supplied_index,
            },
        }
    }

    /// Resolved id as a chapter id
    #[must_use]
    pub fn chapter_id(&self) -> Option<ChapterId> {
        (self.kind == NodeLevel::Chapter)
            .then_some(self.resolved_id)
            .flatten()
            .map(ChapterId)
    }

    /// Resolved id as a lecture id
    #[must_use]
    pub fn lecture_id(&self) -> Option<LectureId> {
        (self.kind == NodeLevel::Lecture)
            .then_some(self.resolved_id)
            .flatten()
            .map(LectureId)
    }
}

impl Serialize for ReconciliationOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ReconciliationOutcome", 8)?;
        state.serialize_field("kind", &self.kind)?;
        state.serialize_field("supplied_index", &self.supplied_index)?;
        match self.parent_index {
            Some(parent) => state.serialize_field("parent_index", &parent)?,
            None => state.skip_field("parent_index")?,
        }
        state.serialize_field("action", &self.action)?;
        state.serialize_field("resolved_id", &self.resolved_id)?;
        state.serialize_field("success", &self.success())?;
        match &self.error {
            Some(error) => state.serialize_field("error", error)?,
            None => state.skip_field("error")?,
        }
        if self.lectures.is_empty() {
            state.skip_field("lectures")?;
        } else {
            state.serialize_field("lectures", &self.lectures)?;
        }
        state.end()
    }
}

/// Overall shape of a finished submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Course and every node persisted
    Complete,
    /// Nothing persisted: the course write failed
    CourseFailed,
    /// Course persisted, a chapter or lecture write failed
    PartialTree,
    /// Caller cancelled; earlier writes stand
    Cancelled,
}

/// Created / updated / failed tallies across the whole submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OutcomeCounts {
    /// Successful creates
    pub created: usize,
    /// Successful updates
    pub updated: usize,
    /// Failed writes (0 or 1 under fail-fast)
    pub failed: usize,
}

impl OutcomeCounts {
    fn record(&mut self, action: Action, success: bool) {
        match (success, action) {
            (false, _) => self.failed += 1,
            (true, Action::Created) => self.created += 1,
            (true, Action::Updated) => self.updated += 1,
        }
    }
}

/// Aggregate result of one submission
///
/// `chapter_outcomes[i]` always describes `edit.chapters[i]`; a failed
/// chapter's own outcome is included, so after a failure at chapter `k` the
/// list has `k + 1` entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResult {
    /// Submission this result belongs to
    pub submission_id: SubmissionId,
    /// Course id: server-assigned on create, input id on update
    pub course_id: Option<CourseId>,
    /// Create or update for the course
    pub course_action: Action,
    /// Course write went through
    pub course_succeeded: bool,
    /// Per-chapter outcomes, each carrying its lectures
    pub chapter_outcomes: Vec<ReconciliationOutcome>,
    /// First failing node (the course itself when nothing was saved)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fatal_at: Option<NodeRef>,
    /// Failure detail of `fatal_at`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RemoteError>,
    /// First node not attempted because of cancellation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<NodeRef>,
    /// Final state machine phase
    pub phase: SubmissionPhase,
}

impl SubmissionResult {
    /// Empty result for a submission that has not issued anything yet
    #[must_use]
    pub fn pending(submission_id: SubmissionId, key: &NodeKey<CourseId>) -> Self {
        Self {
            submission_id,
            course_id: key.id(),
            course_action: Action::for_key(key),
            course_succeeded: false,
            chapter_outcomes: Vec::new(),
            fatal_at: None,
            error: None,
            cancelled_at: None,
            phase: SubmissionPhase::Idle,
        }
    }

    /// Overall shape
    #[must_use]
    pub fn status(&self) -> SubmissionStatus {
        if self.cancelled_at.is_some() {
            SubmissionStatus::Cancelled
        } else if !self.course_succeeded {
            SubmissionStatus::CourseFailed
        } else if self.fatal_at.is_some() {
            SubmissionStatus::PartialTree
        } else {
            SubmissionStatus::Complete
        }
    }

    /// Everything persisted
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status() == SubmissionStatus::Complete
    }

    /// Tallies across course, chapters and lectures
    #[must_use]
    pub fn counts(&self) -> OutcomeCounts {
        let mut counts = OutcomeCounts::default();
        if self.course_succeeded || self.fatal_at == Some(NodeRef::Course) {
            counts.record(self.course_action, self.course_succeeded);
        }
        for chapter in &self.chapter_outcomes {
            counts.record(chapter.action, chapter.success());
            for lecture in &chapter.lectures {
                counts.record(lecture.action, lecture.success());
            }
        }
        counts
    }

    /// Convert into `Ok` only when everything persisted.
    ///
    /// # Errors
    /// The matching [`SubmissionError`] for every other status.
    pub fn into_result(self) -> Result<Self, SubmissionError> {
        match self.status() {
            SubmissionStatus::Complete => Ok(self),
            SubmissionStatus::Cancelled => Err(SubmissionError::Cancelled {
                at: self.cancelled_at.unwrap_or(NodeRef::Course),
                course_id: self.course_id.filter(|_| self.course_succeeded),
                outcomes: self.chapter_outcomes,
            }),
            SubmissionStatus::CourseFailed => Err(SubmissionError::CourseRejected(
                RemoteMutationError::new(NodeRef::Course, self.error_or_unknown()),
            )),
            SubmissionStatus::PartialTree => {
                let node = self.fatal_at.unwrap_or(NodeRef::Course);
                let error = RemoteMutationError::new(node, self.error_or_unknown());
                match self.course_id {
                    Some(course_id) => Err(SubmissionError::PartialTree(PartialTreeFailure {
                        course_id,
                        error,
                        outcomes: self.chapter_outcomes,
                    })),
                    None => Err(SubmissionError::CourseRejected(error)),
                }
            }
        }
    }

    fn error_or_unknown(&self) -> RemoteError {
        self.error
            .clone()
            .unwrap_or_else(|| RemoteError::transport("unknown failure"))
    }

    /// Write every successfully resolved id back into `edit`.
    ///
    /// After a partial failure this turns already-created nodes into
    /// existing ones, so that submitting `edit` again updates them instead
    /// of creating duplicates. `edit` must be the tree this result was
    /// produced from. Returns the number of nodes that changed from new to
    /// existing.
    pub fn adopt_ids(&self, edit: &mut CourseEdit) -> usize {
        let mut adopted = 0;

        if self.course_succeeded {
            if let (Some(id), true) = (self.course_id, edit.key.is_new()) {
                edit.key = NodeKey::Existing(id);
                adopted += 1;
            }
        }

        for outcome in &self.chapter_outcomes {
            let Some(chapter) = edit.chapters.get_mut(outcome.supplied_index) else {
                continue;
            };
            if let (Some(id), true) = (outcome.chapter_id(), chapter.key.is_new()) {
                if outcome.success() {
                    chapter.key = NodeKey::Existing(id);
                    adopted += 1;
                }
            }
            for lecture_outcome in &outcome.lectures {
                let Some(lecture) = chapter.lectures.get_mut(lecture_outcome.supplied_index) else {
                    continue;
                };
                if let (Some(id), true) = (lecture_outcome.lecture_id(), lecture.key.is_new()) {
                    if lecture_outcome.success() {
                        lecture.key = NodeKey::Existing(id);
                        adopted += 1;
                    }
                }
            }
        }

        adopted
    }
}
