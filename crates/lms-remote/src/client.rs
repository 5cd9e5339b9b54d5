//! The single-entity write contract
//!
//! The backend has no nested-write endpoint: every level of the course tree
//! is created or updated on its own, and each call returns the persisted row
//! with its server-assigned id.

use crate::error::RemoteError;
use async_trait::async_trait;
use lms_model::{
    ChapterFields, ChapterId, CourseFields, CourseId, LectureFields, LectureId, PersistedChapter,
    PersistedCourse, PersistedLecture,
};
use std::sync::Arc;

/// Remote course store
///
/// Implementations must settle each call (success or failure) before
/// returning; callers rely on that to order dependent writes.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait RemoteResourceClient: Send + Sync {
    /// Create a course
    async fn create_course(&self, fields: &CourseFields) -> Result<PersistedCourse, RemoteError>;

    /// Update a course
    async fn update_course(
        &self,
        course_id: CourseId,
        fields: &CourseFields,
    ) -> Result<PersistedCourse, RemoteError>;

    /// Create a chapter under a persisted course
    async fn create_chapter(
        &self,
        course_id: CourseId,
        fields: &ChapterFields,
    ) -> Result<PersistedChapter, RemoteError>;

    /// Update a chapter
    async fn update_chapter(
        &self,
        course_id: CourseId,
        chapter_id: ChapterId,
        fields: &ChapterFields,
    ) -> Result<PersistedChapter, RemoteError>;

    /// Create a lecture under a persisted chapter
    async fn create_lecture(
        &self,
        course_id: CourseId,
        chapter_id: ChapterId,
        fields: &LectureFields,
    ) -> Result<PersistedLecture, RemoteError>;

    /// Update a lecture
    async fn update_lecture(
        &self,
        course_id: CourseId,
        chapter_id: ChapterId,
        lecture_id: LectureId,
        fields: &LectureFields,
    ) -> Result<PersistedLecture, RemoteError>;
}

#[async_trait]
impl<T: RemoteResourceClient + ?Sized> RemoteResourceClient for Arc<T> {
    async fn create_course(&self, fields: &CourseFields) -> Result<PersistedCourse, RemoteError> {
        (**self).create_course(fields).await
    }

    async fn update_course(
        &self,
        course_id: CourseId,
        fields: &CourseFields,
    ) -> Result<PersistedCourse, RemoteError> {
        (**self).update_course(course_id, fields).await
    }

    async fn create_chapter(
        &self,
        course_id: CourseId,
        fields: &ChapterFields,
    ) -> Result<PersistedChapter, RemoteError> {
        (**self).create_chapter(course_id, fields).await
    }

    async fn update_chapter(
        &self,
        course_id: CourseId,
        chapter_id: ChapterId,
        fields: &ChapterFields,
    ) -> Result<PersistedChapter, RemoteError> {
        (**self).update_chapter(course_id, chapter_id, fields).await
    }

    async fn create_lecture(
        &self,
        course_id: CourseId,
        chapter_id: ChapterId,
        fields: &LectureFields,
    ) -> Result<PersistedLecture, RemoteError> {
        (**self).create_lecture(course_id, chapter_id, fields).await
    }

    async fn update_lecture(
        &self,
        course_id: CourseId,
        chapter_id: ChapterId,
        lecture_id: LectureId,
        fields: &LectureFields,
    ) -> Result<PersistedLecture, RemoteError> {
        (**self)
            .update_lecture(course_id, chapter_id, lecture_id, fields)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn arc_forwards_to_inner_client() {
        let mut mock = MockRemoteResourceClient::new();
        mock.expect_update_course()
            .withf(|id, fields| *id == CourseId(5) && fields.title == "Intro")
            .times(1)
            .returning(|id, fields| Ok(PersistedCourse::echo(id, fields)));

        let shared: Arc<dyn RemoteResourceClient> = Arc::new(mock);
        let persisted = shared
            .update_course(CourseId(5), &CourseFields::new("Intro"))
            .await
            .unwrap();

        assert_eq!(persisted.id, CourseId(5));
    }
}
