// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Resolves Gemini API access, engine process location, and agent defaults once
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Todak Parenting Intelligence

//! Environment-backed configuration structs.
//!
//! Every scattered default in the pipeline resolves here, once, at the
//! service boundary. Call sites receive fully populated structs and never
//! consult `std::env` themselves.

use crate::constants::{defaults, engine, env_config, gemini};
use crate::errors::{AppError, AppResult};
use std::path::PathBuf;
use std::time::Duration;

use super::types::SearchTuning;

/// Access configuration for the Gemini API
#[derive(Clone)]
pub struct GeminiConfig {
    /// API key sent as the `key` query parameter
    pub api_key: String,
    /// Base URL for generateContent calls
    pub generate_base: String,
    /// Base URL for media uploads and file-state polling
    pub upload_base: String,
}

impl GeminiConfig {
    /// Build from environment variables.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigMissing` error when `GEMINI_API_KEY` is unset or empty.
    pub fn from_env() -> AppResult<Self> {
        let api_key = env_config::gemini_api_key().ok_or_else(|| {
            AppError::new(
                crate::errors::ErrorCode::ConfigMissing,
                "GEMINI_API_KEY is not set",
            )
        })?;
        Ok(Self {
            api_key,
            generate_base: env_config::generate_base_url(),
            upload_base: env_config::upload_base_url(),
        })
    }

    /// Build with an explicit key and default endpoints
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            generate_base: gemini::GENERATE_BASE_URL.to_owned(),
            upload_base: gemini::UPLOAD_BASE_URL.to_owned(),
        }
    }
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"[REDACTED]")
            .field("generate_base", &self.generate_base)
            .field("upload_base", &self.upload_base)
            .finish()
    }
}

/// Location and bounds of the external search engine process
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Interpreter or binary that runs the engine scripts
    pub program: PathBuf,
    /// Directory holding the engine entrypoint scripts
    pub script_dir: PathBuf,
    /// Overall deadline for one request/response exchange
    pub exchange_timeout: Duration,
}

impl EngineConfig {
    /// Build from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            program: PathBuf::from(env_config::engine_program()),
            script_dir: PathBuf::from(env_config::engine_script_dir()),
            exchange_timeout: Duration::from_secs(engine::EXCHANGE_TIMEOUT_SECS),
        }
    }

    /// Build with explicit program and script directory
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, script_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            script_dir: script_dir.into(),
            exchange_timeout: Duration::from_secs(engine::EXCHANGE_TIMEOUT_SECS),
        }
    }

    /// Override the per-exchange deadline
    #[must_use]
    pub const fn with_exchange_timeout(mut self, timeout: Duration) -> Self {
        self.exchange_timeout = timeout;
        self
    }

    /// Absolute path of an engine entrypoint script
    #[must_use]
    pub fn script_path(&self, script: &str) -> PathBuf {
        self.script_dir.join(script)
    }

    /// Path of the similarity-search entrypoint
    #[must_use]
    pub fn search_script(&self) -> PathBuf {
        self.script_path(engine::SEARCH_SCRIPT)
    }

    /// Path of the embedding-upsert entrypoint
    #[must_use]
    pub fn upsert_script(&self) -> PathBuf {
        self.script_path(engine::UPSERT_SCRIPT)
    }

    /// Path of the embedding-delete entrypoint
    #[must_use]
    pub fn delete_script(&self) -> PathBuf {
        self.script_path(engine::DELETE_SCRIPT)
    }
}

/// Polling cadence for remote file activation
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    /// Delay between consecutive state checks
    pub interval: Duration,
    /// Overall deadline before the wait gives up
    pub deadline: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(gemini::POLL_INTERVAL_MS),
            deadline: Duration::from_millis(gemini::POLL_DEADLINE_MS),
        }
    }
}

impl PollConfig {
    /// Build with explicit cadence (tests use short values)
    #[must_use]
    pub const fn new(interval: Duration, deadline: Duration) -> Self {
        Self { interval, deadline }
    }
}

/// Single source of agent defaults, resolved once at the service boundary
#[derive(Debug, Clone)]
pub struct AgentDefaults {
    /// Model used when a request names none
    pub model: String,
    /// Retrieval tuning for the question flow
    pub question_search: SearchTuning,
    /// Retrieval tuning for report-context assembly
    pub report_search: SearchTuning,
    /// Most recent turns kept when compressing history
    pub history_window: usize,
}

impl Default for AgentDefaults {
    fn default() -> Self {
        Self {
            model: defaults::DEFAULT_MODEL.to_owned(),
            question_search: SearchTuning::question(),
            report_search: SearchTuning::report(),
            history_window: defaults::HISTORY_WINDOW,
        }
    }
}
