// ABOUTME: Configuration management module for centralized pipeline settings
// ABOUTME: Handles environment configs, agent defaults, and retrieval tuning
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Todak Parenting Intelligence

//! Configuration module for the Todak intelligence core
//!
//! This module provides centralized configuration management for all
//! components of the pipeline, including:
//!
//! - **Environment**: Gemini API access and engine process location from
//!   environment variables
//! - **Types**: Agent roles and retrieval tuning presets
//! - **Defaults**: The single `AgentDefaults` struct resolved once at the
//!   service boundary

/// Environment and collaborator configuration
pub mod environment;
/// Core configuration type definitions
pub mod types;

pub use environment::{AgentDefaults, EngineConfig, GeminiConfig, PollConfig};
pub use types::{AgentRole, SearchTuning};
