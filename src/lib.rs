// ABOUTME: Main library entry point for the Todak parenting intelligence core
// ABOUTME: Provides diary search, RAG assembly, and Gemini model invocation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Todak Parenting Intelligence

// Crate-level attributes:
// - deny(unsafe_code): Zero-tolerance unsafe policy. Every flow in this crate
//   is plain async Rust over subprocess and HTTP boundaries.
#![deny(unsafe_code)]

//! # Todak Intelligence Core
//!
//! Retrieval-augmented conversation and report synthesis over parenting
//! diaries. The crate connects a Python vector-search engine, the Gemini
//! generative API, and a diary store into the flows the Todak backend
//! exposes: answering parent questions with related diary context,
//! captioning photo and video attachments, and producing structured
//! development reports.
//!
//! ## Features
//!
//! - **Vector search client**: per-call Python subprocesses exchanging one
//!   JSON request and one JSON response for diary search, upsert, and delete
//! - **Context assembly**: compressed conversation history, related-diary
//!   blocks, and checklist evidence merged into model-ready context
//! - **Prompt building**: report directives rendered from a declarative
//!   spec, with decision criteria and prior turns woven into Gemini messages
//! - **Model gateway**: text, image, and video invocation against the
//!   Gemini REST API with alias resolution and quota-aware errors
//! - **Media captioning**: multipart file upload with activation polling,
//!   producing per-attachment captions for diary indexing
//!
//! ## Quick Start
//!
//! 1. Set `GEMINI_API_KEY` and point `SEARCH_ENGINE_DIR` at the Python
//!    search scripts
//! 2. Build a [`search::ScriptEngine`], a [`llm::GeminiProvider`], and a
//!    [`llm::GeminiFileStore`] from the environment
//! 3. Drive the flows in [`services`]: question answering, captioning,
//!    diary save, and report synthesis
//!
//! ## Architecture
//!
//! The crate follows a layered architecture:
//! - **Search**: `SearchEngine` trait with a subprocess-backed client
//! - **RAG**: history compression, context assembly, and prompt building
//! - **LLM**: `ChatModel` and `FileStore` traits with Gemini implementations
//! - **Store**: `DiaryStore` trait for diary and child profile persistence
//! - **Services**: the question, caption, diary, and report flows on top
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use todak_intelligence::config::{EngineConfig, PollConfig};
//! use todak_intelligence::errors::AppResult;
//! use todak_intelligence::llm::{GeminiFileStore, GeminiProvider};
//! use todak_intelligence::search::ScriptEngine;
//! use todak_intelligence::services::{answer_question, QuestionRequest};
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     // Load configuration
//!     let engine = ScriptEngine::new(EngineConfig::from_env());
//!     let model = GeminiProvider::from_env()?;
//!     let files = GeminiFileStore::from_env()?;
//!     let poll = PollConfig::default();
//!
//!     // Answer a parent question with related diary context
//!     let request = QuestionRequest::new("아이가 이유식을 거부하면 어떻게 해야 하나요?");
//!     let answer = answer_question(&engine, &model, &files, &poll, &request).await?;
//!     println!("{}", answer.content);
//!
//!     Ok(())
//! }
//! ```

// ── Public API ──────────────────────────────────────────────────────────
// These modules are used by integration tests (tests/) and downstream
// binaries. They must remain `pub` so external consumers can access them.

/// Configuration for Gemini access, the search engine, and agent defaults
pub mod config;

/// Application constants and environment accessors
pub mod constants;

/// Unified error handling system with standard error codes
pub mod errors;

/// Chat model and file store abstractions with the Gemini implementations
pub mod llm;

/// Production logging and structured output
pub mod logging;

/// Common data models for diaries, children, and media attachments
pub mod models;

/// Conversation history, context assembly, and report prompt building
pub mod rag;

/// Vector search engine abstraction and the subprocess client
pub mod search;

/// Question answering, captioning, diary, and report service flows
pub mod services;

/// Diary persistence abstraction and the in-memory store
pub mod store;
