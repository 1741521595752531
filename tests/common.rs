// ABOUTME: Shared test utilities and fake collaborators for integration tests
// ABOUTME: Provides logging setup, a deterministic search engine, and scripted gateway fakes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Todak Parenting Intelligence
#![allow(
    dead_code,
    clippy::wildcard_in_or_patterns,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]
//! Shared test utilities for `todak_intelligence`
//!
//! This module provides fake collaborators so service flows can run without
//! a Python engine process or network access: an in-memory search engine
//! with deterministic overlap scoring, a chat model that records every
//! request, and a file store that replays scripted lifecycle states.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, Once};
use todak_intelligence::config::SearchTuning;
use todak_intelligence::errors::{AppError, AppResult, ErrorCode};
use todak_intelligence::llm::{
    ChatModel, ChatRequest, ChatResponse, FileState, FileStore, TokenUsage,
};
use todak_intelligence::models::NewDiary;
use todak_intelligence::search::{SearchEngine, SearchResult, UpsertRequest, normalize_results};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        // Check for TEST_LOG environment variable to control test logging level
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            Ok("WARN" | "ERROR") | _ => tracing::Level::WARN, // Default to WARN for quiet tests
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Build a ranked result row for assembler tests
pub fn search_result(diary_id: i64, score: f64, date: &str, text: &str) -> SearchResult {
    SearchResult {
        diary_id,
        score,
        date: date.to_owned(),
        text: text.to_owned(),
        combined_text: None,
    }
}

/// Build an unsaved diary entry for store and pipeline tests
pub fn new_diary(child_id: i64, date: &str, content: &str) -> NewDiary {
    NewDiary {
        child_id,
        parent_id: 100,
        date: date.parse().unwrap(),
        content: content.to_owned(),
        attachments: Vec::new(),
    }
}

// ============================================================================
// Fake Search Engine
// ============================================================================

struct IndexedEntry {
    date: String,
    content: String,
    combined: String,
}

/// In-memory search engine with deterministic character-bigram scoring.
///
/// Queries score against the caption-enriched text the way the production
/// engine embeds it, so tests can index Korean diary entries and retrieve
/// them with related-word queries without an embedding model.
#[derive(Default)]
pub struct FakeEngine {
    entries: Mutex<BTreeMap<i64, IndexedEntry>>,
    queries: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail the way a dead engine process would
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Queries received by `search`, in call order
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    /// Whether an embedding is currently indexed under the given ID
    pub fn contains(&self, diary_id: i64) -> bool {
        self.entries.lock().unwrap().contains_key(&diary_id)
    }

    /// Indexed text for one entry, captions included
    pub fn indexed_text(&self, diary_id: i64) -> Option<String> {
        self.entries
            .lock()
            .unwrap()
            .get(&diary_id)
            .map(|entry| entry.combined.clone())
    }

    fn bigrams(text: &str) -> HashSet<(char, char)> {
        let chars: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
        chars.windows(2).map(|pair| (pair[0], pair[1])).collect()
    }

    /// Dice coefficient over character bigrams, in `[0, 1]`
    fn score(query: &str, text: &str) -> f64 {
        let query_grams = Self::bigrams(query);
        let text_grams = Self::bigrams(text);
        if query_grams.is_empty() || text_grams.is_empty() {
            return 0.0;
        }
        let shared = query_grams.intersection(&text_grams).count();
        (2.0 * shared as f64) / ((query_grams.len() + text_grams.len()) as f64)
    }
}

#[async_trait]
impl SearchEngine for FakeEngine {
    async fn search(&self, query: &str, tuning: SearchTuning) -> AppResult<Vec<SearchResult>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::search_failed("engine process unavailable"));
        }
        self.queries.lock().unwrap().push(query.to_owned());

        let entries = self.entries.lock().unwrap();
        let results: Vec<SearchResult> = entries
            .iter()
            .map(|(diary_id, entry)| SearchResult {
                diary_id: *diary_id,
                score: Self::score(query, &entry.combined),
                date: entry.date.clone(),
                text: entry.content.clone(),
                combined_text: (entry.combined != entry.content).then(|| entry.combined.clone()),
            })
            .collect();
        Ok(normalize_results(results, tuning))
    }

    async fn upsert(&self, request: UpsertRequest) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::search_failed("engine process unavailable"));
        }
        let combined = if request.captions.is_empty() {
            request.content.clone()
        } else {
            format!("{}\n{}", request.content, request.captions.join("\n"))
        };
        self.entries.lock().unwrap().insert(
            request.diary_id,
            IndexedEntry {
                date: request.date.to_string(),
                content: request.content,
                combined,
            },
        );
        Ok(())
    }

    async fn delete(&self, diary_id: i64) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::search_failed("engine process unavailable"));
        }
        self.entries.lock().unwrap().remove(&diary_id);
        Ok(())
    }
}

// ============================================================================
// Fake Chat Model
// ============================================================================

/// Chat model that records every request and replays queued replies.
///
/// An empty reply queue answers with a fixed Korean sentence so flows that
/// only assert on the outgoing request do not need to queue anything.
#[derive(Default)]
pub struct FakeChatModel {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<ChatRequest>>,
    fail_next: Mutex<Option<(ErrorCode, String)>>,
}

impl FakeChatModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(reply: &str) -> Self {
        let model = Self::default();
        model.push_reply(reply);
        model
    }

    /// Queue one reply; replies are consumed in FIFO order
    pub fn push_reply(&self, reply: &str) {
        self.replies.lock().unwrap().push_back(reply.to_owned());
    }

    /// Make the next `complete` call fail with the given error
    pub fn fail_next(&self, code: ErrorCode, message: &str) {
        *self.fail_next.lock().unwrap() = Some((code, message.to_owned()));
    }

    /// Requests received so far, in call order
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The most recent request; panics when none was made
    pub fn last_request(&self) -> ChatRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was made")
    }
}

#[async_trait]
impl ChatModel for FakeChatModel {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn default_model(&self) -> &str {
        "gemini-2.5-flash"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some((code, message)) = self.fail_next.lock().unwrap().take() {
            return Err(AppError::new(code, message));
        }

        let content = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "네, 아이의 상황을 보면 자연스러운 발달 과정입니다.".to_owned());
        Ok(ChatResponse {
            content,
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.default_model().to_owned()),
            usage: Some(TokenUsage {
                prompt_tokens: 120,
                completion_tokens: 48,
                total_tokens: 168,
            }),
            finish_reason: Some("stop".to_owned()),
        })
    }
}

// ============================================================================
// Scripted File Store
// ============================================================================

/// One recorded upload call
#[derive(Debug, Clone)]
pub struct UploadRecord {
    pub mime_type: String,
    pub display_name: String,
    pub byte_len: usize,
}

/// File store that records uploads and replays scripted lifecycle states.
///
/// State polls consume the script front-to-back; an exhausted script keeps
/// answering `Active` so activation waits terminate.
#[derive(Default)]
pub struct ScriptedFileStore {
    states: Mutex<VecDeque<FileState>>,
    uploads: Mutex<Vec<UploadRecord>>,
    state_calls: AtomicUsize,
}

impl ScriptedFileStore {
    /// Store whose polls walk the given states, then stay `Active`
    pub fn with_states(states: Vec<FileState>) -> Self {
        Self {
            states: Mutex::new(states.into()),
            uploads: Mutex::new(Vec::new()),
            state_calls: AtomicUsize::new(0),
        }
    }

    /// Store that reports `Active` from the first poll
    pub fn always_active() -> Self {
        Self::default()
    }

    /// Upload calls received so far, in call order
    pub fn uploads(&self) -> Vec<UploadRecord> {
        self.uploads.lock().unwrap().clone()
    }

    /// Number of state polls received so far
    pub fn state_calls(&self) -> usize {
        self.state_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileStore for ScriptedFileStore {
    async fn upload(
        &self,
        bytes: &[u8],
        mime_type: &str,
        display_name: &str,
    ) -> AppResult<String> {
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push(UploadRecord {
            mime_type: mime_type.to_owned(),
            display_name: display_name.to_owned(),
            byte_len: bytes.len(),
        });
        Ok(format!(
            "https://generativelanguage.googleapis.com/v1beta/files/test-{}",
            uploads.len()
        ))
    }

    async fn state(&self, _uri: &str) -> AppResult<FileState> {
        self.state_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .states
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(FileState::Active))
    }
}
