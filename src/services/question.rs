// ABOUTME: Conversational question answering over retrieved diary context
// ABOUTME: Builds the combined input, runs the vector search, and dispatches by modality
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Todak Parenting Intelligence

//! Question answering service
//!
//! One question flows through four steps: compress prior turns above the
//! input, search the diary index with that combined text, append retrieved
//! diary content below it, and hand the result to the model under the fixed
//! question-agent role prompt. Attached media changes only the final message
//! shape, never the retrieval steps.
//!
//! Retrieval is strictly additive: when the search engine fails, the answer
//! degrades to the bare question instead of failing the request.

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{AgentDefaults, AgentRole, PollConfig, SearchTuning};
use crate::errors::{AppError, AppResult};
use crate::llm::prompts;
use crate::llm::{
    wait_until_active, ChatMessage, ChatModel, ChatRequest, ContentPart, FileStore, MessageRole,
};
use crate::rag::{
    augment_with_history, append_related_diaries, decode_history, ConversationTurn, TurnRole,
};
use crate::search::SearchEngine;

/// Uploaded media accompanying a question
#[derive(Debug, Clone)]
pub struct MediaPayload {
    /// Raw file bytes as received from the caller
    pub bytes: Vec<u8>,
    /// Declared MIME type of the upload
    pub mime_type: String,
}

impl MediaPayload {
    /// Create a payload from bytes and a MIME type
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    fn is_video(&self) -> bool {
        self.mime_type.starts_with("video/")
    }
}

/// One conversational question with its optional history, media, and tuning
#[derive(Debug, Clone)]
pub struct QuestionRequest {
    /// The parent's question text
    pub input: String,
    /// Prior turns, oldest first
    pub history: Vec<ConversationTurn>,
    /// Attached image or video, when present
    pub media: Option<MediaPayload>,
    /// Model identifier override; normalized by the provider
    pub model: Option<String>,
    /// Sampling temperature override
    pub temperature: Option<f32>,
    /// Retrieval tuning for the diary search
    pub search: SearchTuning,
    /// Most recent turns kept when compressing history
    pub history_window: usize,
}

impl QuestionRequest {
    /// Create a request with default tuning and no history or media
    pub fn new(input: impl Into<String>) -> Self {
        let defaults = AgentDefaults::default();
        Self {
            input: input.into(),
            history: Vec::new(),
            media: None,
            model: None,
            temperature: None,
            search: defaults.question_search,
            history_window: defaults.history_window,
        }
    }

    /// Attach already-decoded conversation turns
    #[must_use]
    pub fn with_history(mut self, history: Vec<ConversationTurn>) -> Self {
        self.history = history;
        self
    }

    /// Decode and attach history from its wire shape
    #[must_use]
    pub fn with_wire_history(mut self, history: &Value) -> Self {
        self.history = decode_history(history);
        self
    }

    /// Attach uploaded media
    #[must_use]
    pub fn with_media(mut self, media: MediaPayload) -> Self {
        self.media = Some(media);
        self
    }

    /// Override the model identifier
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Override the sampling temperature
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Override the retrieval tuning
    #[must_use]
    pub const fn with_search(mut self, search: SearchTuning) -> Self {
        self.search = search;
        self
    }
}

/// A generated answer and the model that produced it
#[derive(Debug, Clone)]
pub struct QuestionAnswer {
    /// Answer text returned by the model
    pub content: String,
    /// Resolved model identifier that served the request
    pub model: String,
}

/// Answer a parenting question grounded in retrieved diary content.
///
/// Business rules:
/// - Prior turns are compressed above the input; the combined text is both
///   the search query and the base of the user message
/// - Retrieved diary texts are appended below the combined input
/// - Search failures degrade to the bare question with a warning
/// - Media dispatch: images inline, videos upload and wait for activation
/// - A video answer that comes back empty is substituted with a fixed notice
///
/// # Errors
///
/// Returns an invalid input error for unsupported media types, media
/// processing or timeout errors from the video path, and model invocation
/// errors from the gateway. Search errors never surface.
pub async fn answer_question(
    engine: &dyn SearchEngine,
    model: &dyn ChatModel,
    files: &dyn FileStore,
    poll: &PollConfig,
    request: &QuestionRequest,
) -> AppResult<QuestionAnswer> {
    let mut combined =
        augment_with_history(&request.input, &request.history, request.history_window);

    if !combined.is_empty() {
        match engine.search(&combined, request.search).await {
            Ok(results) => {
                debug!(count = results.len(), "Diary search returned results");
                combined = append_related_diaries(&combined, &results);
            }
            Err(e) => {
                warn!(error = %e, "Diary search failed; answering from the question alone");
                combined = request.input.trim().to_owned();
            }
        }
    }

    let system_prompt = prompts::get_question_agent_prompt();
    let mut video_request = false;

    let user_message = match &request.media {
        None => ChatMessage::user(prompts::non_empty_or(&combined, prompts::QUESTION_TEXT_FALLBACK)),
        Some(media) if media.is_image() => ChatMessage::user_parts(vec![
            ContentPart::text(prompts::non_empty_or(&combined, prompts::QUESTION_IMAGE_FALLBACK)),
            ContentPart::inline_from_bytes(&media.mime_type, &media.bytes),
        ]),
        Some(media) if media.is_video() => {
            let uri = files
                .upload(&media.bytes, &media.mime_type, "uploaded-video")
                .await?;
            wait_until_active(files, &uri, poll).await?;
            video_request = true;
            ChatMessage::user_parts(vec![
                ContentPart::text(prompts::video_request_text(
                    &combined,
                    prompts::QUESTION_VIDEO_FALLBACK,
                )),
                ContentPart::file(&media.mime_type, uri),
            ])
        }
        Some(media) => {
            return Err(AppError::invalid_input(format!(
                "Unsupported media type: {}",
                media.mime_type
            )));
        }
    };

    let mut chat_request = ChatRequest::new(vec![ChatMessage::system(system_prompt), user_message]);
    if let Some(model_id) = &request.model {
        chat_request = chat_request.with_model(model_id.clone());
    }
    if let Some(temperature) = request.temperature.or(AgentRole::Question.default_temperature()) {
        chat_request = chat_request.with_temperature(temperature);
    }

    let response = model.complete(&chat_request).await?;
    if let Some(usage) = &response.usage {
        debug!(
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "Question answered"
        );
    }

    let content = if video_request && response.content.trim().is_empty() {
        prompts::EMPTY_ANALYSIS_FALLBACK.to_owned()
    } else {
        response.content
    };

    Ok(QuestionAnswer {
        content,
        model: response.model,
    })
}

/// Summarize a conversation into a single sentence.
///
/// Prior turns map onto user/assistant messages as-is; a fixed instruction
/// closes the list. No system message is sent.
///
/// # Errors
///
/// Returns an invalid input error when no non-empty turns remain, and model
/// invocation errors from the gateway.
pub async fn summarize_conversation(
    model: &dyn ChatModel,
    history: &[ConversationTurn],
) -> AppResult<String> {
    let turns: Vec<&ConversationTurn> = history.iter().filter(|t| !t.is_empty()).collect();
    if turns.is_empty() {
        return Err(AppError::invalid_input("No conversation to summarize"));
    }

    let mut messages = Vec::with_capacity(turns.len() + 1);
    for turn in turns {
        let role = match turn.role {
            TurnRole::Human => MessageRole::User,
            TurnRole::Ai => MessageRole::Assistant,
        };
        messages.push(ChatMessage::text(role, turn.flattened_text()));
    }
    messages.push(ChatMessage::user(prompts::SUMMARIZE_INSTRUCTION));

    let response = model.complete(&ChatRequest::new(messages)).await?;
    Ok(response.content)
}
