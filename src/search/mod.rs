// ABOUTME: Vector search engine boundary with typed wire contracts
// ABOUTME: Defines the SearchEngine trait, result normalization, and request shapes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Todak Parenting Intelligence

//! # Vector Search Engine Boundary
//!
//! The embedding index lives in a separate engine process; this crate talks
//! to it through a one-shot JSON exchange per operation. The engine is a
//! black box: it receives one JSON document on stdin and answers with one
//! JSON document on stdout. Everything else (index layout, embedding model)
//! is its own business.
//!
//! Results handed to callers are normalized here regardless of engine
//! behavior: sorted by non-increasing score, filtered to the score floor,
//! and truncated to the requested limit.

use crate::config::SearchTuning;
use crate::errors::AppResult;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub mod subprocess;

pub use subprocess::ScriptEngine;

/// One ranked diary snippet returned by the engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// Diary entry the embedding belongs to
    pub diary_id: i64,
    /// Cosine similarity in `[0, 1]`, higher is closer
    pub score: f64,
    /// Day of the entry as stored in the index payload
    pub date: String,
    /// Raw diary text stored in the index payload
    pub text: String,
    /// Diary text enriched with attachment captions, when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combined_text: Option<String>,
}

impl SearchResult {
    /// Text quoted into prompts: caption-enriched when available
    #[must_use]
    pub fn display_text(&self) -> &str {
        match &self.combined_text {
            Some(combined) if !combined.trim().is_empty() => combined,
            _ => &self.text,
        }
    }
}

/// Request to index (or re-index) one diary entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertRequest {
    /// Diary entry identifier; the engine keeps at most one embedding per ID
    pub diary_id: i64,
    /// Diary text as written by the parent
    pub content: String,
    /// Day the entry describes
    pub date: NaiveDate,
    /// Child the entry is about
    pub child_id: i64,
    /// Model-generated captions for the entry's attachments
    #[serde(default)]
    pub captions: Vec<String>,
    /// Parent who wrote the entry
    pub parent_id: i64,
}

/// Core engine abstraction trait
///
/// One implementation drives the production subprocess engine; tests provide
/// an in-memory fake with deterministic scoring.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Similarity search over indexed diary entries
    async fn search(&self, query: &str, tuning: SearchTuning) -> AppResult<Vec<SearchResult>>;

    /// Index or replace the embedding for one diary entry
    async fn upsert(&self, request: UpsertRequest) -> AppResult<()>;

    /// Drop the embedding for one diary entry
    async fn delete(&self, diary_id: i64) -> AppResult<()>;
}

/// Enforce ordering, score floor, and limit on engine output.
///
/// The engine already applies all three, but callers must be able to rely on
/// them no matter which engine implementation answered.
#[must_use]
pub fn normalize_results(mut results: Vec<SearchResult>, tuning: SearchTuning) -> Vec<SearchResult> {
    results.retain(|r| r.score >= tuning.score_threshold);
    results.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.diary_id.cmp(&b.diary_id))
    });
    results.truncate(tuning.limit);
    results
}
