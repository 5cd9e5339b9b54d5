//! REST implementation of [`RemoteResourceClient`]
//!
//! Maps each single-entity write onto the nested resource routes
//! (`/courses/{id}/chapters/{id}/lectures/{id}`) using [`reqwest`] and JSON.

use crate::client::RemoteResourceClient;
use crate::config::ClientConfig;
use crate::error::RemoteError;
use async_trait::async_trait;
use lms_model::{
    ChapterFields, ChapterId, CourseFields, CourseId, LectureFields, LectureId, PersistedChapter,
    PersistedCourse, PersistedLecture,
};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// HTTP client for the course admin API
#[derive(Debug, Clone)]
pub struct HttpResourceClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpResourceClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    /// `RemoteError::InvalidRequest` if the underlying client cannot be
    /// constructed (bad TLS backend, etc.).
    pub fn new(config: ClientConfig) -> Result<Self, RemoteError> {
        let mut builder = reqwest::Client::builder();
        if config.request_timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.request_timeout_secs));
        }
        let client = builder.build().map_err(|e| RemoteError::InvalidRequest {
            message: e.to_string(),
        })?;
        Ok(Self { client, config })
    }

    /// Reuse an existing [`reqwest::Client`] (shared connection pool).
    #[must_use]
    pub fn with_client(client: reqwest::Client, config: ClientConfig) -> Self {
        Self { client, config }
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn write<B, T>(&self, method: Method, path: String, body: &B) -> Result<T, RemoteError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.config.endpoint(&path);
        tracing::debug!(%method, %url, "remote write");

        let mut request = self.client.request(method, &url).json(body);
        if let Some(token) = &self.config.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| self.map_reqwest(&e))?;
        let response = Self::ensure_success(response).await?;
        let value: Value = response.json().await.map_err(|e| self.map_reqwest(&e))?;
        Self::parse_record(value)
    }

    // ---- private helpers ----

    /// Turn a non-2xx response into [`RemoteError::Status`].
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            tracing::warn!(status = status.as_u16(), "remote write rejected");
            return Err(RemoteError::status(status.as_u16(), body));
        }
        Ok(response)
    }

    /// Accept both a bare record and a `{"data": {...}}` envelope.
    fn parse_record<T: DeserializeOwned>(value: Value) -> Result<T, RemoteError> {
        let record = match value {
            Value::Object(mut map) if !map.contains_key("id") && map.contains_key("data") => {
                map.remove("data").unwrap_or(Value::Null)
            }
            other => other,
        };
        serde_json::from_value(record).map_err(|e| RemoteError::decode(e.to_string()))
    }

    fn map_reqwest(&self, error: &reqwest::Error) -> RemoteError {
        if error.is_timeout() {
            RemoteError::Timeout {
                after_secs: self.config.request_timeout_secs,
            }
        } else if error.is_builder() {
            RemoteError::InvalidRequest {
                message: error.to_string(),
            }
        } else if error.is_decode() {
            RemoteError::decode(error.to_string())
        } else {
            RemoteError::transport(error.to_string())
        }
    }
}

#[async_trait]
impl RemoteResourceClient for HttpResourceClient {
    async fn create_course(&self, fields: &CourseFields) -> Result<PersistedCourse, RemoteError> {
        self.write(Method::POST, "courses".to_string(), fields).await
    }

    async fn update_course(
        &self,
        course_id: CourseId,
        fields: &CourseFields,
    ) -> Result<PersistedCourse, RemoteError> {
        self.write(Method::PUT, format!("courses/{course_id}"), fields)
            .await
    }

    async fn create_chapter(
        &self,
        course_id: CourseId,
        fields: &ChapterFields,
    ) -> Result<PersistedChapter, RemoteError> {
        self.write(Method::POST, format!("courses/{course_id}/chapters"), fields)
            .await
    }

    async fn update_chapter(
        &self,
        course_id: CourseId,
        chapter_id: ChapterId,
        fields: &ChapterFields,
    ) -> Result<PersistedChapter, RemoteError> {
        self.write(
            Method::PUT,
            format!("courses/{course_id}/chapters/{chapter_id}"),
            fields,
        )
        .await
    }

    async fn create_lecture(
        &self,
        course_id: CourseId,
        chapter_id: ChapterId,
        fields: &LectureFields,
    ) -> Result<PersistedLecture, RemoteError> {
        self.write(
            Method::POST,
            format!("courses/{course_id}/chapters/{chapter_id}/lectures"),
            fields,
        )
        .await
    }

    async fn update_lecture(
        &self,
        course_id: CourseId,
        chapter_id: ChapterId,
        lecture_id: LectureId,
        fields: &LectureFields,
    ) -> Result<PersistedLecture, RemoteError> {
        self.write(
            Method::PUT,
            format!("courses/{course_id}/chapters/{chapter_id}/lectures/{lecture_id}"),
            fields,
        )
        .await
    }
}
