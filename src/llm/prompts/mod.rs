// ABOUTME: System prompts for LLM interactions loaded at compile time
// ABOUTME: Provides the question agent and media caption prompts plus fallback user inputs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Todak Parenting Intelligence

//! # System Prompts
//!
//! This module provides system prompts for LLM interactions.
//! Prompts are loaded at compile time from markdown files for easy maintenance.
//!
//! The fallback constants are the user-turn texts substituted when a caller
//! submits an empty input alongside media. They keep the model pointed at the
//! task instead of receiving a bare image or video with no instruction.

/// Question agent system prompt
///
/// Instructs the model to answer parenting questions grounded in the
/// caller's diary entries, and to say so when no diary content was provided.
pub const QUESTION_AGENT_PROMPT: &str = include_str!("question_agent.md");

/// Media caption system prompt
///
/// Instructs the model to summarize an image or video factually, starting
/// with a fixed marker sentence and avoiding markdown.
pub const MEDIA_CAPTION_PROMPT: &str = include_str!("media_caption.md");

/// Get the system prompt for the question agent
#[must_use]
pub const fn get_question_agent_prompt() -> &'static str {
    QUESTION_AGENT_PROMPT
}

/// Get the system prompt for media captioning
#[must_use]
pub const fn get_media_caption_prompt() -> &'static str {
    MEDIA_CAPTION_PROMPT
}

// ============================================================================
// Fallback User Inputs
// ============================================================================

/// Question with no usable text: ask for a concise, practical answer
pub const QUESTION_TEXT_FALLBACK: &str = "부모의 질문에 간결하고 실용적으로 답변해 주세요.";

/// Question about an image with no text: extract what is needed to answer
pub const QUESTION_IMAGE_FALLBACK: &str =
    "부모의 질문에 답변하기 위한 필요한 정보를 추출해 답변해 주세요.";

/// Question about a video with no text
pub const QUESTION_VIDEO_FALLBACK: &str = "영상 기반으로 부모의 질문에 답변해 주세요.";

/// Caption request with neither media-specific hint nor text
pub const CAPTION_TEXT_FALLBACK: &str = "간결한 설명을 작성해 주세요.";

/// Caption request for an image with no accompanying text
pub const CAPTION_IMAGE_FALLBACK: &str = "이미지에 대한 간결한 캡션을 작성해 주세요.";

/// Caption request for a video with no accompanying text
pub const CAPTION_VIDEO_FALLBACK: &str = "영상에 대한 간결한 캡션/요약을 작성해 주세요.";

/// Substituted answer when a video analysis returns empty content
pub const EMPTY_ANALYSIS_FALLBACK: &str = "분석 결과가 비어 있습니다.";

/// Instruction appended after prior turns when summarizing a conversation
pub const SUMMARIZE_INSTRUCTION: &str = "이 대화 내용을 한국어 한 문장으로 간결하게 요약해줘.";

/// Prefix that marks the caller's request in a video prompt
pub const VIDEO_REQUEST_PREFIX: &str = "요청:";

/// Return the trimmed input, or the fallback when the input is blank
#[must_use]
pub fn non_empty_or(input: &str, fallback: &'static str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        fallback.to_owned()
    } else {
        trimmed.to_owned()
    }
}

/// Build the user text for a video request: `요청:{input}`, or the fallback
/// when the input is blank
#[must_use]
pub fn video_request_text(input: &str, fallback: &'static str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        fallback.to_owned()
    } else {
        format!("{VIDEO_REQUEST_PREFIX}{trimmed}")
    }
}
