// ABOUTME: Subprocess-backed search engine speaking one-shot JSON over stdio
// ABOUTME: Spawns engine scripts, writes the request to stdin, and decodes stdout
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Todak Parenting Intelligence

//! # Subprocess Search Engine
//!
//! Production [`SearchEngine`] implementation. Each operation spawns the
//! matching engine script (`search_diaries.py`, `upsert_diary.py`,
//! `delete_diary.py`) with the configured interpreter, writes one JSON
//! request to the child's stdin, closes the pipe, and waits for the child
//! to exit with one JSON response on stdout.
//!
//! The working directory is set to the script directory so the scripts can
//! resolve their sibling modules and index files with relative paths.
//!
//! Failure taxonomy:
//! - spawn or pipe errors map to `PROCESS_FAILED`
//! - non-zero exit maps to `SEARCH_FAILED` with a bounded stderr snippet
//! - engine-reported `success: false` also maps to `SEARCH_FAILED`
//! - undecodable stdout maps to `PARSE_FAILED`
//! - an exchange that outlives the configured deadline maps to `TIMEOUT`
//!   and the child is killed when its handle drops

use crate::config::{EngineConfig, SearchTuning};
use crate::constants::limits::MAX_STDERR_SNIPPET;
use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;
use crate::search::{SearchEngine, SearchResult, UpsertRequest, normalize_results};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Search engine backed by one-shot engine script invocations
#[derive(Debug, Clone)]
pub struct ScriptEngine {
    config: EngineConfig,
}

/// Wire request for the search script
#[derive(Debug, Serialize)]
struct WireSearchRequest<'a> {
    query: &'a str,
    limit: usize,
    score_threshold: f64,
}

/// Wire request for the delete script
#[derive(Debug, Serialize)]
struct WireDeleteRequest {
    diary_id: i64,
}

/// One result row as the engine emits it
#[derive(Debug, Deserialize)]
struct WireSearchResult {
    id: i64,
    score: f64,
    #[serde(default)]
    date: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    combined_text: Option<String>,
}

/// Search script response envelope
#[derive(Debug, Deserialize)]
struct WireSearchResponse {
    success: bool,
    #[serde(default)]
    results: Vec<WireSearchResult>,
    #[serde(default)]
    error: Option<String>,
}

/// Upsert/delete script response envelope
#[derive(Debug, Deserialize)]
struct WireAck {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

impl From<WireSearchResult> for SearchResult {
    fn from(wire: WireSearchResult) -> Self {
        Self {
            diary_id: wire.id,
            score: wire.score,
            date: wire.date,
            text: wire.text,
            combined_text: wire.combined_text.filter(|c| !c.trim().is_empty()),
        }
    }
}

impl ScriptEngine {
    /// Create an engine over the given script configuration
    #[must_use]
    pub const fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Engine resolved from environment variables
    pub fn from_env() -> Self {
        Self::new(EngineConfig::from_env())
    }

    /// Run one request/response exchange against an engine script.
    ///
    /// The child's stdin is closed after the request is written; the scripts
    /// read to EOF before answering, so leaving the pipe open would hang the
    /// exchange until the deadline.
    async fn exchange<T: DeserializeOwned>(
        &self,
        script: &Path,
        payload: &impl Serialize,
        operation: &str,
    ) -> AppResult<T> {
        let body = serde_json::to_vec(payload).map_err(|e| {
            AppError::internal(format!("failed to encode engine {operation} request")).with_source(e)
        })?;

        let mut child = Command::new(&self.config.program)
            .arg(script)
            .current_dir(&self.config.script_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                AppError::process_failed(format!(
                    "failed to spawn engine {operation} process '{}'",
                    self.config.program.display()
                ))
                .with_source(e)
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // A write error here usually means the child died on startup;
            // keep going so the exit status and stderr tell the real story.
            if let Err(e) = stdin.write_all(&body).await {
                debug!("engine {operation} stdin write failed: {e}");
            }
        }

        let output = timeout(self.config.exchange_timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                AppError::timeout(format!(
                    "engine {operation} did not answer within {}s",
                    self.config.exchange_timeout.as_secs()
                ))
            })?
            .map_err(|e| {
                AppError::process_failed(format!("failed to collect engine {operation} output"))
                    .with_source(e)
            })?;

        if !output.status.success() {
            let stderr = stderr_snippet(&output.stderr);
            warn!("engine {operation} exited abnormally: {stderr}");
            return Err(AppError::search_failed(format!(
                "engine {operation} exited with {}: {stderr}",
                output.status
            )));
        }

        serde_json::from_slice(&output.stdout).map_err(|e| {
            AppError::parse_failed(format!("engine {operation} answered with invalid JSON: {e}"))
        })
    }
}

#[async_trait]
impl SearchEngine for ScriptEngine {
    async fn search(&self, query: &str, tuning: SearchTuning) -> AppResult<Vec<SearchResult>> {
        let request = WireSearchRequest {
            query,
            limit: tuning.limit,
            score_threshold: tuning.score_threshold,
        };
        let started = Instant::now();
        let outcome: AppResult<WireSearchResponse> = self
            .exchange(&self.config.search_script(), &request, "search")
            .await;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        AppLogger::log_engine_call("search", outcome.is_ok(), duration_ms);

        let response = outcome?;
        if !response.success {
            return Err(AppError::search_failed(
                response
                    .error
                    .unwrap_or_else(|| "engine reported an unspecified search failure".into()),
            ));
        }

        let results: Vec<SearchResult> =
            response.results.into_iter().map(SearchResult::from).collect();
        debug!(
            "engine search returned {} result(s) before normalization",
            results.len()
        );
        Ok(normalize_results(results, tuning))
    }

    async fn upsert(&self, request: UpsertRequest) -> AppResult<()> {
        let started = Instant::now();
        let outcome: AppResult<WireAck> = self
            .exchange(&self.config.upsert_script(), &request, "upsert")
            .await;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        AppLogger::log_engine_call("upsert", outcome.is_ok(), duration_ms);

        let ack = outcome?;
        if !ack.success {
            return Err(AppError::search_failed(
                ack.error
                    .unwrap_or_else(|| "engine reported an unspecified upsert failure".into()),
            ));
        }
        Ok(())
    }

    async fn delete(&self, diary_id: i64) -> AppResult<()> {
        let request = WireDeleteRequest { diary_id };
        let started = Instant::now();
        let outcome: AppResult<WireAck> = self
            .exchange(&self.config.delete_script(), &request, "delete")
            .await;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        AppLogger::log_engine_call("delete", outcome.is_ok(), duration_ms);

        let ack = outcome?;
        if !ack.success {
            return Err(AppError::search_failed(
                ack.error
                    .unwrap_or_else(|| "engine reported an unspecified delete failure".into()),
            ));
        }
        Ok(())
    }
}

/// Bounded, lossy stderr excerpt for error messages
fn stderr_snippet(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return "(no stderr output)".into();
    }
    let mut snippet: String = trimmed.chars().take(MAX_STDERR_SNIPPET).collect();
    if trimmed.chars().count() > MAX_STDERR_SNIPPET {
        snippet.push_str("...");
    }
    snippet
}
