//! Records returned by the backend after a create or update
//!
//! Only the identifiers matter to reconciliation. Everything else the server
//! echoes back is kept verbatim in `attributes`.

use crate::node::{ChapterId, CourseId, LectureId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Persisted course row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedCourse {
    /// Server-assigned id
    pub id: CourseId,
    /// Remaining echoed fields
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Persisted chapter row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedChapter {
    /// Server-assigned id
    pub id: ChapterId,
    /// Owning course; create responses carry it, update responses may not
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_id: Option<CourseId>,
    /// Remaining echoed fields
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Persisted lecture row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedLecture {
    /// Server-assigned id
    pub id: LectureId,
    /// Owning chapter; create responses carry it, update responses may not
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_id: Option<ChapterId>,
    /// Remaining echoed fields
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Serialize `fields` into an attribute map, dropping anything that is not
/// a JSON object.
pub fn attributes_of<T: Serialize>(fields: &T) -> Map<String, Value> {
    match serde_json::to_value(fields) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

impl PersistedCourse {
    /// Record echoing `fields` under `id`
    pub fn echo<T: Serialize>(id: CourseId, fields: &T) -> Self {
        Self {
            id,
            attributes: attributes_of(fields),
        }
    }
}

impl PersistedChapter {
    /// Record echoing `fields` under `id`
    pub fn echo<T: Serialize>(id: ChapterId, course_id: Option<CourseId>, fields: &T) -> Self {
        Self {
            id,
            course_id,
            attributes: attributes_of(fields),
        }
    }
}

impl PersistedLecture {
    /// Record echoing `fields` under `id`
    pub fn echo<T: Serialize>(id: LectureId, chapter_id: Option<ChapterId>, fields: &T) -> Self {
        Self {
            id,
            chapter_id,
            attributes: attributes_of(fields),
        }
    }
}
