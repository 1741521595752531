// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Groups model defaults, engine protocol values, and environment lookups
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Todak Parenting Intelligence

//! Constants module
//!
//! This module organizes application constants by domain. Defaults that the
//! service layer resolves at its boundary live here so call sites never carry
//! inline literals.

use std::env;

/// Model and agent defaults
pub mod defaults {
    /// Canonical fast model identifier; also the default when none is given
    pub const FLASH_MODEL: &str = "gemini-2.5-flash";

    /// Canonical reasoning model identifier
    pub const PRO_MODEL: &str = "gemini-2.5-pro";

    /// Default model for every agent role
    pub const DEFAULT_MODEL: &str = FLASH_MODEL;

    /// Sampling temperature for the question-answering agent
    pub const QUESTION_TEMPERATURE: f32 = 0.3;

    /// Sampling temperature for media captioning (factual output)
    pub const CAPTION_TEMPERATURE: f32 = 0.0;

    /// Retrieval depth for the conversational question flow
    pub const QUESTION_SEARCH_LIMIT: usize = 3;

    /// Score floor for the conversational question flow
    pub const QUESTION_SCORE_THRESHOLD: f64 = 0.0;

    /// Retrieval depth for report-context assembly
    pub const REPORT_SEARCH_LIMIT: usize = 5;

    /// Score floor for report-context assembly
    pub const REPORT_SCORE_THRESHOLD: f64 = 0.5;

    /// Number of most recent conversation turns kept when compressing history
    pub const HISTORY_WINDOW: usize = 6;
}

/// Gemini API endpoints and media polling parameters
pub mod gemini {
    /// Base URL for generateContent calls
    pub const GENERATE_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

    /// Base URL for the resumable/multipart file upload endpoint
    pub const UPLOAD_BASE_URL: &str = "https://generativelanguage.googleapis.com";

    /// Delay between file-state polls while waiting for ACTIVE
    pub const POLL_INTERVAL_MS: u64 = 2_000;

    /// Overall deadline for a file to become ACTIVE
    pub const POLL_DEADLINE_MS: u64 = 120_000;
}

/// Search engine subprocess protocol values
pub mod engine {
    /// Entrypoint script for similarity search
    pub const SEARCH_SCRIPT: &str = "search_diaries.py";

    /// Entrypoint script for embedding upsert
    pub const UPSERT_SCRIPT: &str = "upsert_diary.py";

    /// Entrypoint script for embedding deletion
    pub const DELETE_SCRIPT: &str = "delete_diary.py";

    /// Overall deadline for one request/response exchange with the engine.
    /// Cold starts load an embedding model, which dominates this bound.
    pub const EXCHANGE_TIMEOUT_SECS: u64 = 120;
}

/// Size limits
pub mod limits {
    /// Longest stderr excerpt attached to engine failure messages
    pub const MAX_STDERR_SNIPPET: usize = 500;

    /// Largest media file the captioning pipeline will read
    pub const MAX_MEDIA_BYTES: u64 = 50 * 1024 * 1024;
}

/// Environment-based configuration
pub mod env_config {
    use super::env;

    /// Get the Gemini API key, if configured
    #[must_use]
    pub fn gemini_api_key() -> Option<String> {
        env::var("GEMINI_API_KEY").ok().filter(|v| !v.is_empty())
    }

    /// Get the generateContent base URL from environment or default
    #[must_use]
    pub fn generate_base_url() -> String {
        env::var("GEMINI_API_BASE").unwrap_or_else(|_| super::gemini::GENERATE_BASE_URL.to_owned())
    }

    /// Get the file upload base URL from environment or default
    #[must_use]
    pub fn upload_base_url() -> String {
        env::var("GEMINI_UPLOAD_BASE").unwrap_or_else(|_| super::gemini::UPLOAD_BASE_URL.to_owned())
    }

    /// Get the interpreter used to run the search engine scripts
    #[must_use]
    pub fn engine_program() -> String {
        env::var("SEARCH_ENGINE_PYTHON").unwrap_or_else(|_| "python3".to_owned())
    }

    /// Get the directory holding the search engine scripts
    #[must_use]
    pub fn engine_script_dir() -> String {
        env::var("SEARCH_ENGINE_DIR").unwrap_or_else(|_| "./search-engine-py".to_owned())
    }
}
