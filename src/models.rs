// ABOUTME: Core data models and types for the Todak parenting diary domain
// ABOUTME: Defines DiaryRecord, Attachment, Caption, ChildProfile and related structures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Todak Parenting Intelligence

//! # Data Models
//!
//! This module contains the core data structures shared across the pipeline.
//! A diary entry written by a parent is the unit of retrieval: its text (and
//! captions generated for its attachments) is embedded by the search engine,
//! and its content is what context assembly quotes back to the model.
//!
//! ## Design Principles
//!
//! - **Serializable**: All models support JSON serialization at the engine
//!   and store boundaries
//! - **Type Safe**: Captions are a distinct type from user-visible text so
//!   model-facing strings cannot leak into UI responses

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Media category of a diary attachment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Still image (photo)
    Image,
    /// Video clip
    Video,
}

impl MediaType {
    /// Whether this attachment needs the upload-and-poll path
    #[must_use]
    pub const fn is_video(&self) -> bool {
        matches!(self, Self::Video)
    }

    /// Generic MIME default used when the file extension is unrecognized
    #[must_use]
    pub const fn fallback_mime(&self) -> &'static str {
        match self {
            Self::Image => "image/jpeg",
            Self::Video => "video/mp4",
        }
    }
}

/// A media file attached to a diary entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attachment {
    /// Local path of the stored media file
    pub path: PathBuf,
    /// Declared media category
    pub media_type: MediaType,
}

impl Attachment {
    /// Image attachment at the given path
    #[must_use]
    pub fn image(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            media_type: MediaType::Image,
        }
    }

    /// Video attachment at the given path
    #[must_use]
    pub fn video(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            media_type: MediaType::Video,
        }
    }
}

/// Model-generated description of one attachment.
///
/// Captions exist to enrich embeddings and prompts. They are never surfaced
/// to users, so the type carries no `Display` implementation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Caption(String);

impl Caption {
    /// Wrap raw model output as a caption
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Model-facing text of this caption
    #[must_use]
    pub fn as_text(&self) -> &str {
        &self.0
    }

    /// Whether the caption carries any text
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

/// A diary entry not yet persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDiary {
    /// Child the entry is about
    pub child_id: i64,
    /// Parent who wrote the entry
    pub parent_id: i64,
    /// Day the entry describes; one entry per child and day
    pub date: NaiveDate,
    /// Diary text as written by the parent
    pub content: String,
    /// Media attached to the entry
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// A persisted diary entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiaryRecord {
    /// Store-assigned identifier, stable across upserts of the same day
    pub diary_id: i64,
    /// Child the entry is about
    pub child_id: i64,
    /// Parent who wrote the entry
    pub parent_id: i64,
    /// Day the entry describes
    pub date: NaiveDate,
    /// Diary text as written by the parent
    pub content: String,
    /// Media attached to the entry
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// Profile of a child, used as a structured context block in reports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildProfile {
    /// Store identifier
    pub child_id: i64,
    /// Given name
    pub name: String,
    /// Birth date, when recorded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    /// Free-form gender label, when recorded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    /// Caregiver notes, when recorded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ChildProfile {
    /// Render the profile as a JSON value for bullet-list context blocks.
    ///
    /// Unset fields are omitted entirely so the assembler skips them instead
    /// of printing empty bullets.
    #[must_use]
    pub fn to_context_value(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        map.insert("name".into(), serde_json::Value::String(self.name.clone()));
        if let Some(birth_date) = self.birth_date {
            map.insert(
                "birth_date".into(),
                serde_json::Value::String(birth_date.to_string()),
            );
        }
        if let Some(gender) = &self.gender {
            map.insert("gender".into(), serde_json::Value::String(gender.clone()));
        }
        if let Some(notes) = &self.notes {
            map.insert("notes".into(), serde_json::Value::String(notes.clone()));
        }
        serde_json::Value::Object(map)
    }
}
