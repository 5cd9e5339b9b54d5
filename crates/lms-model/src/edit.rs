//! Editor-side value objects
//!
//! A [`CourseEdit`] is built from form state, submitted once and then either
//! discarded or kept for correction. Field structs (`*Fields`) are exactly
//! what goes over the wire for a single-entity create or update; the tree
//! structure and node keys never do.

use crate::node::{ChapterId, CourseId, LectureId, NodeKey};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Scalar course fields sent by create-course / update-course
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CourseFields {
    /// Course title
    pub title: String,
    /// Long description
    #[serde(default)]
    pub description: String,
    /// Catalogue category
    #[serde(default)]
    pub category: String,
    /// Difficulty level label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// List price
    #[serde(default)]
    pub price: f64,
    /// Discounted price, if a promotion is running
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_price: Option<f64>,
    /// Cover image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// Enrollment opens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// Enrollment closes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Visible in the catalogue
    #[serde(default)]
    pub published: bool,
}

impl CourseFields {
    /// Fields with only a title set
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// With description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// With category
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// With list price
    #[must_use]
    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }

    /// With enrollment window
    #[must_use]
    pub fn with_schedule(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }
}

/// A course plus its chapter tree, as edited
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CourseEdit {
    /// New or existing course
    #[serde(rename = "id", default)]
    pub key: NodeKey<CourseId>,
    /// Scalar fields
    #[serde(flatten)]
    pub fields: CourseFields,
    /// Chapters in submission order
    #[serde(default)]
    pub chapters: Vec<ChapterEdit>,
}

impl CourseEdit {
    /// Edit for a course that does not exist yet
    #[must_use]
    pub fn new(fields: CourseFields) -> Self {
        Self {
            key: NodeKey::New,
            fields,
            chapters: Vec::new(),
        }
    }

    /// Edit for an already persisted course
    #[must_use]
    pub fn existing(id: CourseId, fields: CourseFields) -> Self {
        Self {
            key: NodeKey::Existing(id),
            fields,
            chapters: Vec::new(),
        }
    }

    /// Append a chapter
    #[must_use]
    pub fn with_chapter(mut self, chapter: ChapterEdit) -> Self {
        self.chapters.push(chapter);
        self
    }

    /// Total number of lectures across all chapters
    #[must_use]
    pub fn lecture_count(&self) -> usize {
        self.chapters.iter().map(|c| c.lectures.len()).sum()
    }
}

/// Chapter fields sent by create-chapter / update-chapter
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChapterFields {
    /// Chapter title
    pub title: String,
    /// Chapter summary
    #[serde(default)]
    pub description: String,
    /// Caller-supplied position, passed through untouched
    #[serde(default)]
    pub order: i32,
}

/// A chapter and its lectures, as edited
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChapterEdit {
    /// New or existing chapter
    #[serde(rename = "id", default)]
    pub key: NodeKey<ChapterId>,
    /// Scalar fields
    #[serde(flatten)]
    pub fields: ChapterFields,
    /// Lectures in submission order
    #[serde(default)]
    pub lectures: Vec<LectureEdit>,
}

impl ChapterEdit {
    /// New chapter
    #[must_use]
    pub fn new(title: impl Into<String>, order: i32) -> Self {
        Self {
            key: NodeKey::New,
            fields: ChapterFields {
                title: title.into(),
                description: String::new(),
                order,
            },
            lectures: Vec::new(),
        }
    }

    /// Mark as already persisted under `id`
    #[must_use]
    pub fn with_id(mut self, id: ChapterId) -> Self {
        self.key = NodeKey::Existing(id);
        self
    }

    /// With description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.fields.description = description.into();
        self
    }

    /// Append a lecture
    #[must_use]
    pub fn with_lecture(mut self, lecture: LectureEdit) -> Self {
        self.lectures.push(lecture);
        self
    }
}

/// Kind of media a lecture plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Hosted video
    #[default]
    Video,
    /// Audio only
    Audio,
    /// Slides, PDF, article
    Document,
    /// Third-party embed
    Embed,
}

/// Where a lecture's primary media lives
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MediaRef {
    /// Media URL
    #[serde(rename = "media_url", default)]
    pub url: String,
    /// Media kind
    #[serde(rename = "media_type", default)]
    pub kind: MediaKind,
}

/// Downloadable supplementary material
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialRef {
    /// Download URL
    pub url: String,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Lecture fields sent by create-lecture / update-lecture
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LectureFields {
    /// Lecture title
    pub title: String,
    /// Lecture notes
    #[serde(default)]
    pub description: String,
    /// Primary media
    #[serde(flatten)]
    pub media: MediaRef,
    /// Length in seconds
    #[serde(rename = "duration", default)]
    pub duration_secs: u32,
    /// Caller-supplied position, passed through untouched
    #[serde(default)]
    pub order: i32,
    /// Optional attachment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<MaterialRef>,
}

/// A lecture, as edited
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LectureEdit {
    /// New or existing lecture
    #[serde(rename = "id", default)]
    pub key: NodeKey<LectureId>,
    /// Scalar fields
    #[serde(flatten)]
    pub fields: LectureFields,
}

impl LectureEdit {
    /// New lecture
    #[must_use]
    pub fn new(title: impl Into<String>, order: i32) -> Self {
        Self {
            key: NodeKey::New,
            fields: LectureFields {
                title: title.into(),
                order,
                ..LectureFields::default()
            },
        }
    }

    /// Mark as already persisted under `id`
    #[must_use]
    pub fn with_id(mut self, id: LectureId) -> Self {
        self.key = NodeKey::Existing(id);
        self
    }

    /// With primary media
    #[must_use]
    pub fn with_media(mut self, url: impl Into<String>, kind: MediaKind) -> Self {
        self.fields.media = MediaRef {
            url: url.into(),
            kind,
        };
        self
    }

    /// With duration in seconds
    #[must_use]
    pub fn with_duration(mut self, secs: u32) -> Self {
        self.fields.duration_secs = secs;
        self
    }

    /// With downloadable material
    #[must_use]
    pub fn with_material(mut self, material: MaterialRef) -> Self {
        self.fields.material = Some(material);
        self
    }
}
