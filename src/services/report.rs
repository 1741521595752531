// ABOUTME: Report synthesis service wiring retrieval, prompt building, and invocation
// ABOUTME: Covers direct reports, RAG-assembled reports, search-only, and checklist evidence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Todak Parenting Intelligence

//! Report synthesis service
//!
//! A report request carries the task instruction, optional prior turns,
//! optional pre-assembled context, and structured formatting directives. The
//! service renders directives into the system prompt, keeps evidence in the
//! user turn, and returns the generated text with the resolved model metadata.
//!
//! The RAG variant assembles the context itself from a diary search before
//! delegating, and degrades to an empty evidence block when the search fails.
//! The search-only entry point is the exception: there the search result IS
//! the product, so engine errors surface to the caller.

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::SearchTuning;
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::llm::{ChatModel, ChatRequest};
use crate::rag::{
    assemble, build_report_messages, build_system_prompt, checklist_evidence, ConversationTurn,
    NamedBlock, ReportSpec,
};
use crate::search::{SearchEngine, SearchResult};

/// One report invocation: instruction, history, evidence, and directives
#[derive(Debug, Clone, Default)]
pub struct ReportRequest {
    /// Task instruction for the report
    pub input: String,
    /// Prior turns, oldest first
    pub history: Vec<ConversationTurn>,
    /// Pre-assembled evidence text placed in the user turn
    pub context: Option<String>,
    /// Base role instruction override
    pub system_prompt: Option<String>,
    /// Model identifier override; normalized by the provider
    pub model: Option<String>,
    /// Sampling temperature; omitted from the request when unset
    pub temperature: Option<f32>,
    /// Structured formatting directives
    pub spec: ReportSpec,
    /// Structured rubric rendered under the decision-criteria heading
    pub decision_criteria: Option<Value>,
}

impl ReportRequest {
    /// Create a request carrying only the task instruction
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            ..Self::default()
        }
    }

    /// Attach already-decoded conversation turns
    #[must_use]
    pub fn with_history(mut self, history: Vec<ConversationTurn>) -> Self {
        self.history = history;
        self
    }

    /// Attach pre-assembled context text
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Override the base role instruction
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Override the model identifier
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the sampling temperature
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Attach formatting directives
    #[must_use]
    pub fn with_spec(mut self, spec: ReportSpec) -> Self {
        self.spec = spec;
        self
    }

    /// Attach a decision-criteria rubric
    #[must_use]
    pub fn with_decision_criteria(mut self, criteria: Value) -> Self {
        self.decision_criteria = Some(criteria);
        self
    }
}

/// A generated report and the settings that produced it
#[derive(Debug, Clone)]
pub struct ReportOutput {
    /// Generated report text
    pub content: String,
    /// Resolved model identifier that served the request
    pub model: String,
    /// Temperature actually sent, when one was set
    pub temperature: Option<f32>,
}

/// Generate a report from the given request.
///
/// Business rules:
/// - The input instruction is required
/// - Directives and decision criteria render into the system prompt; context
///   only ever lands in the final user message
/// - History turns keep their chronological order between the two
///
/// # Errors
///
/// Returns a missing-field error when the input is blank, and model
/// invocation errors from the gateway.
pub async fn run_report(model: &dyn ChatModel, request: &ReportRequest) -> AppResult<ReportOutput> {
    if request.input.trim().is_empty() {
        return Err(AppError::new(
            ErrorCode::MissingRequiredField,
            "Report input is required",
        ));
    }

    let system_prompt = build_system_prompt(
        request.system_prompt.as_deref(),
        &request.spec,
        request.decision_criteria.as_ref(),
    );
    let messages = build_report_messages(
        &system_prompt,
        &request.history,
        &request.input,
        request.context.as_deref(),
    );

    let mut chat_request = ChatRequest::new(messages);
    if let Some(model_id) = &request.model {
        chat_request = chat_request.with_model(model_id.clone());
    }
    if let Some(temperature) = request.temperature {
        chat_request = chat_request.with_temperature(temperature);
    }

    let response = model.complete(&chat_request).await?;
    if let Some(usage) = &response.usage {
        debug!(
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "Report generated"
        );
    }

    Ok(ReportOutput {
        content: response.content,
        model: response.model,
        temperature: request.temperature,
    })
}

/// Search the diary index and generate a report from the assembled results.
///
/// Business rules:
/// - Retrieved snippets and the given structured blocks are assembled into
///   the request context, replacing any caller-provided context
/// - A failed search degrades to an assembly with zero results rather than
///   failing the report
///
/// # Errors
///
/// Returns the same errors as [`run_report`]. Search errors never surface.
pub async fn run_rag_report(
    engine: &dyn SearchEngine,
    model: &dyn ChatModel,
    query: &str,
    tuning: SearchTuning,
    blocks: &[NamedBlock],
    request: &ReportRequest,
) -> AppResult<ReportOutput> {
    let results = match engine.search(query, tuning).await {
        Ok(results) => results,
        Err(e) => {
            warn!(error = %e, "Diary search failed; generating the report without retrieved context");
            Vec::new()
        }
    };

    let context = assemble(query, &results, blocks);
    let grounded = request.clone().with_context(context);
    run_report(model, &grounded).await
}

/// Search the diary index and return the ranked results.
///
/// Unlike the generation flows, the search result is the product here, so
/// engine failures are the caller's to handle.
///
/// # Errors
///
/// Returns an invalid input error for a blank query and every engine failure
/// unchanged.
pub async fn rag_search(
    engine: &dyn SearchEngine,
    query: &str,
    tuning: SearchTuning,
) -> AppResult<Vec<SearchResult>> {
    if query.trim().is_empty() {
        return Err(AppError::invalid_input("Search query is required"));
    }
    engine.search(query, tuning).await
}

/// Run one search per checklist question and merge the hits into a single
/// chronological evidence string.
///
/// Business rules:
/// - Questions run sequentially to bound engine load
/// - A failed search contributes no hits but does not abort the batch
/// - Duplicate diary entries keep their first occurrence across questions
pub async fn collect_checklist_evidence(
    engine: &dyn SearchEngine,
    questions: &[String],
    tuning: SearchTuning,
) -> String {
    let mut result_sets = Vec::with_capacity(questions.len());
    for question in questions {
        match engine.search(question, tuning).await {
            Ok(results) => result_sets.push(results),
            Err(e) => {
                warn!(error = %e, question = %question, "Checklist search failed; skipping question");
                result_sets.push(Vec::new());
            }
        }
    }
    checklist_evidence(&result_sets)
}
