// ABOUTME: Conversation history decoding and compression for query augmentation
// ABOUTME: Turns loosely-shaped wire history into tagged turns and bounded text
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Todak Parenting Intelligence

//! # Conversation History
//!
//! Callers submit prior turns in whatever shape their chat client serialized,
//! commonly the LangChain message envelope with `kwargs.content` and a class
//! path in `id`. Everything loose is decoded once at this boundary into
//! [`ConversationTurn`] so the rest of the crate only matches on explicit
//! tags, never on duck-typed objects.
//!
//! Compression renders the most recent turns as `<label>: <text>` lines with
//! media parts collapsed to `[image]` / `[video]` placeholder tokens. The
//! compressed block is prepended to the user input before retrieval so the
//! similarity query carries conversational context.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// The parent asking questions
    Human,
    /// The assistant's reply
    Ai,
}

impl TurnRole {
    /// Label used when rendering compressed history lines
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Human => "User",
            Self::Ai => "AI",
        }
    }
}

/// One piece of a turn's content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type", content = "value")]
pub enum TurnPart {
    /// Plain text written or generated in the turn
    Text(String),
    /// An attached image, carried only as a placeholder
    Image,
    /// An attached video, carried only as a placeholder
    Video,
}

/// One prior conversation turn with an explicit role tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Speaker of the turn
    pub role: TurnRole,
    /// Ordered content parts
    pub parts: Vec<TurnPart>,
}

impl ConversationTurn {
    /// Text-only turn from the parent
    #[must_use]
    pub fn human(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Human,
            parts: vec![TurnPart::Text(text.into())],
        }
    }

    /// Text-only turn from the assistant
    #[must_use]
    pub fn ai(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Ai,
            parts: vec![TurnPart::Text(text.into())],
        }
    }

    /// Parts rendered to one string, media collapsed to placeholders
    #[must_use]
    pub fn flattened_text(&self) -> String {
        let rendered: Vec<&str> = self
            .parts
            .iter()
            .map(|part| match part {
                TurnPart::Text(text) => text.as_str(),
                TurnPart::Image => "[image]",
                TurnPart::Video => "[video]",
            })
            .collect();
        rendered.join("\n").trim().to_owned()
    }

    /// True when the turn carries no renderable content
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flattened_text().is_empty()
    }
}

/// Decode wire-shaped history into tagged turns.
///
/// Accepts both the LangChain serialized envelope (`kwargs.content`, class
/// path in `id`) and plain `{role/type, content}` objects. Content may be a
/// string or a part array; text parts are trimmed, `image_url` / `video_url`
/// parts become placeholders. Turns left with no content are dropped, and
/// anything undecodable is skipped rather than failing the request.
#[must_use]
pub fn decode_history(raw: &Value) -> Vec<ConversationTurn> {
    let Some(entries) = raw.as_array() else {
        return Vec::new();
    };

    let mut turns = Vec::with_capacity(entries.len());
    for entry in entries {
        let content = entry
            .get("kwargs")
            .and_then(|kwargs| kwargs.get("content"))
            .or_else(|| entry.get("content"));

        let parts = match content {
            Some(Value::String(text)) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    Vec::new()
                } else {
                    vec![TurnPart::Text(trimmed.to_owned())]
                }
            }
            Some(Value::Array(items)) => decode_parts(items),
            _ => Vec::new(),
        };

        let turn = ConversationTurn {
            role: decode_role(entry),
            parts,
        };
        if !turn.is_empty() {
            turns.push(turn);
        }
    }
    turns
}

/// Multimodal part array decoding: text kept, media collapsed
fn decode_parts(items: &[Value]) -> Vec<TurnPart> {
    let mut parts = Vec::new();
    for item in items {
        if !item.is_object() {
            continue;
        }
        if let Some(text) = item.get("text").and_then(Value::as_str) {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                parts.push(TurnPart::Text(trimmed.to_owned()));
            }
        }
        if item.get("image_url").is_some_and(|v| v.is_string() || v.is_object()) {
            parts.push(TurnPart::Image);
        }
        if item.get("video_url").is_some_and(|v| v.is_string() || v.is_object()) {
            parts.push(TurnPart::Video);
        }
    }
    parts
}

/// Role recovery: class path in `id` first, then a `type` hint, default AI
fn decode_role(entry: &Value) -> TurnRole {
    let mut role = TurnRole::Ai;

    let class_name = entry
        .get("id")
        .and_then(Value::as_array)
        .and_then(|path| path.last())
        .and_then(Value::as_str);
    if class_name == Some("HumanMessage") {
        role = TurnRole::Human;
    }

    match entry.get("type").and_then(Value::as_str) {
        Some("human") => role = TurnRole::Human,
        Some("ai") => role = TurnRole::Ai,
        _ => {}
    }
    role
}

/// Render the most recent `window` non-empty turns as labeled lines.
///
/// Returns `None` when nothing survives filtering, so callers can skip the
/// conversation block entirely instead of emitting an empty header.
#[must_use]
pub fn compress_history(turns: &[ConversationTurn], window: usize) -> Option<String> {
    let kept: Vec<&ConversationTurn> = turns.iter().filter(|turn| !turn.is_empty()).collect();
    if kept.is_empty() || window == 0 {
        return None;
    }

    let start = kept.len().saturating_sub(window);
    let lines: Vec<String> = kept[start..]
        .iter()
        .map(|turn| format!("{}: {}", turn.role.label(), turn.flattened_text()))
        .collect();
    Some(lines.join("\n"))
}
