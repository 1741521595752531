// ABOUTME: Retrieval-augmented generation assembly layer
// ABOUTME: History compression, context assembly, and prompt construction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Todak Parenting Intelligence

//! # RAG Assembly
//!
//! The pipeline that turns a free-text question or diary content into a
//! bounded, deterministic prompt:
//!
//! 1. prior turns are decoded and compressed ([`history`])
//! 2. retrieved snippets and structured data are merged into one context
//!    block ([`assembler`])
//! 3. the context joins a system/user message pair ([`prompt`])
//!
//! All three stages are pure functions so identical input always produces
//! identical prompts.

pub mod assembler;
pub mod history;
pub mod prompt;

pub use assembler::{
    CONVERSATION_BLOCK_LABEL, NamedBlock, RELATED_DIARIES_LABEL, append_related_diaries, assemble,
    augment_with_history, checklist_evidence, render_bullets,
};
pub use history::{ConversationTurn, TurnPart, TurnRole, compress_history, decode_history};
pub use prompt::{
    DEFAULT_REPORT_PROMPT, ReportSpec, build_report_messages, build_system_prompt,
};
