// ABOUTME: Deterministic prompt construction for report synthesis
// ABOUTME: Renders spec directives into a system prompt and builds the message list
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Todak Parenting Intelligence

//! # Prompt Builder
//!
//! The system prompt states how to answer; the user turn carries what to
//! answer from. Retrieved context is never folded into the system prompt,
//! only into the final user message, so evidence text can never be mistaken
//! for policy instructions.
//!
//! Formatting directives arrive as a loosely-typed spec. Recognized keys
//! render through a fixed ordered table, one directive per key; unknown keys
//! are ignored rather than rejected so callers can ship new keys before this
//! crate learns them.

use crate::llm::{ChatMessage, MessageRole};
use crate::rag::assembler::render_bullets;
use crate::rag::history::{ConversationTurn, TurnRole};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Base role instruction used when the caller does not override it
pub const DEFAULT_REPORT_PROMPT: &str = "You are a professional report writing assistant. Produce accurate, well-structured, and concise reports.";

/// Heading under which decision criteria render in the system prompt
pub const DECISION_CRITERIA_HEADING: &str = "Decision criteria:";

/// Structured formatting directives for a report request.
///
/// Every field is optional; an empty spec renders no directives. Unknown
/// wire keys are dropped during deserialization without error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportSpec {
    /// Kind of report, e.g. "Development Assessment Report"
    pub report_type: Option<String>,
    /// Who will read the report
    pub audience: Option<String>,
    /// Requested tone of voice
    pub tone: Option<String>,
    /// Requested length guidance
    pub length: Option<String>,
    /// Output language
    pub language: Option<String>,
    /// Output format hint
    pub format: Option<String>,
    /// Section headings the report must contain, in order
    pub sections: Vec<String>,
    /// Ask for an executive summary up front
    pub include_summary: bool,
    /// Ask for citations where applicable
    pub citations: bool,
}

type DirectiveFn = fn(&ReportSpec) -> Option<String>;

/// Recognized directive renderers in their fixed output order
const DIRECTIVE_TABLE: [DirectiveFn; 9] = [
    report_type_directive,
    audience_directive,
    tone_directive,
    length_directive,
    language_directive,
    format_directive,
    sections_directive,
    summary_directive,
    citations_directive,
];

fn report_type_directive(spec: &ReportSpec) -> Option<String> {
    spec.report_type.as_deref().map(|v| format!("Report type: {v}"))
}

fn audience_directive(spec: &ReportSpec) -> Option<String> {
    spec.audience.as_deref().map(|v| format!("Target audience: {v}"))
}

fn tone_directive(spec: &ReportSpec) -> Option<String> {
    spec.tone.as_deref().map(|v| format!("Tone: {v}"))
}

fn length_directive(spec: &ReportSpec) -> Option<String> {
    spec.length.as_deref().map(|v| format!("Target length: {v}"))
}

fn language_directive(spec: &ReportSpec) -> Option<String> {
    spec.language.as_deref().map(|v| format!("Language: {v}"))
}

fn format_directive(spec: &ReportSpec) -> Option<String> {
    spec.format
        .as_deref()
        .map(|v| format!("Output format: {v} (use markdown if applicable)"))
}

fn sections_directive(spec: &ReportSpec) -> Option<String> {
    if spec.sections.is_empty() {
        return None;
    }
    let mut lines = vec!["Required sections:".to_owned()];
    for section in &spec.sections {
        lines.push(format!("- {section}"));
    }
    Some(lines.join("\n"))
}

fn summary_directive(spec: &ReportSpec) -> Option<String> {
    spec.include_summary
        .then(|| "Include an executive summary at the beginning.".to_owned())
}

fn citations_directive(spec: &ReportSpec) -> Option<String> {
    spec.citations
        .then(|| "Add citations or references when applicable.".to_owned())
}

/// Build the system prompt from a base instruction, spec, and criteria.
///
/// The base instruction is always the first line. Directives follow in table
/// order, then decision criteria as a bullet outline under a fixed heading.
#[must_use]
pub fn build_system_prompt(
    base: Option<&str>,
    spec: &ReportSpec,
    decision_criteria: Option<&Value>,
) -> String {
    let base = match base.map(str::trim) {
        Some(text) if !text.is_empty() => text,
        _ => DEFAULT_REPORT_PROMPT,
    };

    let mut lines = vec![base.to_owned()];
    for render in DIRECTIVE_TABLE {
        if let Some(directive) = render(spec) {
            lines.push(directive);
        }
    }

    if let Some(criteria) = decision_criteria {
        let bullets = render_bullets(criteria);
        if !bullets.is_empty() {
            lines.push(format!("{DECISION_CRITERIA_HEADING}\n{bullets}"));
        }
    }

    lines.join("\n")
}

/// Build the full message list for one report invocation.
///
/// Exactly one system message, placed first; prior turns keep their
/// chronological order; the final user message carries the current request
/// and the assembled context.
#[must_use]
pub fn build_report_messages(
    system_prompt: &str,
    history: &[ConversationTurn],
    input: &str,
    context: Option<&str>,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system_prompt));

    for turn in history {
        let role = match turn.role {
            TurnRole::Human => MessageRole::User,
            TurnRole::Ai => MessageRole::Assistant,
        };
        messages.push(ChatMessage::text(role, turn.flattened_text()));
    }

    messages.push(ChatMessage::user(format!(
        "User request:\n{input}\n\nContext (optional):\n{}",
        context.unwrap_or("")
    )));
    messages
}
