// ABOUTME: Model invocation gateway with typed messages and the ChatModel contract
// ABOUTME: Defines roles, multimodal content parts, and request/response shapes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Todak Parenting Intelligence

//! # Model Invocation Gateway
//!
//! This module defines the contract every LLM call in the Todak pipeline
//! goes through. Callers hand a provider a fully-built request (ordered
//! messages, optional model override, optional temperature) and receive the
//! answer flattened to a single string; transport details never leak out.
//!
//! ## Key Concepts
//!
//! - **`ChatMessage`**: Role-based message whose content is a part list, so
//!   a user turn can carry text next to inline image bytes or a remote file
//!   reference
//! - **`ChatRequest`**: Request configuration including model and temperature
//! - **`ChatModel`**: Async trait for a single-attempt completion call
//!
//! ## Example: Using a Provider
//!
//! ```rust,no_run
//! use todak_intelligence::llm::{ChatModel, ChatMessage, ChatRequest};
//!
//! async fn example(model: &dyn ChatModel) {
//!     let messages = vec![
//!         ChatMessage::system("당신은 육아상담 에이전트입니다."),
//!         ChatMessage::user("아기 수면 교육은 언제 시작하나요?"),
//!     ];
//!
//!     let request = ChatRequest::new(messages);
//!     let response = model.complete(&request).await;
//! }
//! ```

pub mod files;
mod gemini;
pub mod prompts;

pub use files::{FileState, FileStore, GeminiFileStore, wait_until_active};
pub use gemini::{GeminiProvider, normalize_model};

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

// ============================================================================
// Message Types
// ============================================================================

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction message
    System,
    /// User input message
    User,
    /// Assistant response message
    Assistant,
}

impl MessageRole {
    /// Convert to string representation for API calls
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One piece of message content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ContentPart {
    /// Plain text content
    Text {
        /// The text itself
        text: String,
    },
    /// Media bytes carried inline, base64-encoded
    InlineData {
        /// MIME type of the encoded bytes
        mime_type: String,
        /// Base64 payload
        data: String,
    },
    /// Media already uploaded to a remote file store
    FileData {
        /// MIME type of the stored file
        mime_type: String,
        /// Opaque URI returned by the store
        uri: String,
    },
}

impl ContentPart {
    /// Create a text part
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create an inline media part, encoding the raw bytes to base64
    pub fn inline_from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::InlineData {
            mime_type: mime_type.into(),
            data: BASE64_STANDARD.encode(bytes),
        }
    }

    /// Create a remote file reference part
    pub fn file(mime_type: impl Into<String>, uri: impl Into<String>) -> Self {
        Self::FileData {
            mime_type: mime_type.into(),
            uri: uri.into(),
        }
    }
}

/// A single message in a chat conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: MessageRole,
    /// Ordered content parts of the message
    pub parts: Vec<ContentPart>,
}

impl ChatMessage {
    /// Create a message with explicit parts
    #[must_use]
    pub const fn new(role: MessageRole, parts: Vec<ContentPart>) -> Self {
        Self { role, parts }
    }

    /// Create a text-only message with an explicit role
    pub fn text(role: MessageRole, content: impl Into<String>) -> Self {
        Self::new(role, vec![ContentPart::text(content)])
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::text(MessageRole::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::text(MessageRole::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(MessageRole::Assistant, content)
    }

    /// Create a user message carrying mixed text and media parts
    #[must_use]
    pub const fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self::new(MessageRole::User, parts)
    }

    /// Text parts concatenated in order, newline-joined, media parts ignored
    #[must_use]
    pub fn flattened_text(&self) -> String {
        let texts: Vec<&str> = self
            .parts
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        texts.join("\n")
    }

    /// True when any part carries media rather than text
    #[must_use]
    pub fn has_media(&self) -> bool {
        self.parts
            .iter()
            .any(|part| !matches!(part, ContentPart::Text { .. }))
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Configuration for a chat completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Conversation messages, system instruction first
    pub messages: Vec<ChatMessage>,
    /// Model identifier; providers normalize it and fall back to their default
    pub model: Option<String>,
    /// Temperature for response randomness (0.0 - 2.0)
    pub temperature: Option<f32>,
}

impl ChatRequest {
    /// Create a new chat request with messages
    #[must_use]
    pub const fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model: None,
            temperature: None,
        }
    }

    /// Set the model to use
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the temperature
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Modality label derived from the message parts, used for logging
    #[must_use]
    pub fn modality(&self) -> &'static str {
        let mut has_inline = false;
        for message in &self.messages {
            for part in &message.parts {
                match part {
                    ContentPart::FileData { .. } => return "video",
                    ContentPart::InlineData { .. } => has_inline = true,
                    ContentPart::Text { .. } => {}
                }
            }
        }
        if has_inline { "image" } else { "text" }
    }
}

/// Response from a chat completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Generated content with text parts joined by newlines; may be empty
    pub content: String,
    /// Model used for generation
    pub model: String,
    /// Token usage statistics
    pub usage: Option<TokenUsage>,
    /// Finish reason (stop, length, etc.)
    pub finish_reason: Option<String>,
}

/// Token usage statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of tokens in the prompt
    pub prompt_tokens: u32,
    /// Number of tokens in the completion
    pub completion_tokens: u32,
    /// Total tokens used
    pub total_tokens: u32,
}

// ============================================================================
// Provider Trait
// ============================================================================

/// LLM provider trait for chat completion
///
/// A single attempt per call: no retry, no fallback model. Errors carry the
/// provider's human-readable message and always surface to the caller.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Unique provider identifier (e.g., "gemini")
    fn name(&self) -> &'static str;

    /// Default model to use if not specified in the request
    fn default_model(&self) -> &str;

    /// Perform a chat completion
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError>;
}
