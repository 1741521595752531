// ABOUTME: Unified error handling with typed failure codes for the RAG and report pipeline
// ABOUTME: Defines AppError, ErrorCode, error context, and HTTP response formatting
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Todak Parenting Intelligence

//! # Unified Error Handling System
//!
//! This module provides a centralized error handling system for the Todak
//! intelligence core. It defines standard error types, error codes, and HTTP
//! response formatting so the search engine boundary, the model gateway, and
//! the media pipeline all fail the same way.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Vector search engine boundary (1000-1999)
    /// Engine process ran and reported failure (non-zero exit)
    #[serde(rename = "SEARCH_FAILED")]
    SearchFailed = 1000,
    /// Engine output was not valid JSON or not the expected shape
    #[serde(rename = "PARSE_FAILED")]
    ParseFailed = 1001,
    /// Engine process could not be spawned or driven
    #[serde(rename = "PROCESS_FAILED")]
    ProcessFailed = 1002,

    // Media pipeline (2000-2999)
    /// Remote file store reported a terminal failure for uploaded media
    #[serde(rename = "MEDIA_PROCESSING_FAILED")]
    MediaProcessingFailed = 2000,
    /// A bounded wait elapsed before the operation completed
    #[serde(rename = "TIMEOUT")]
    Timeout = 2001,

    // Model gateway (3000-3999)
    /// LLM invocation failed or returned no usable content
    #[serde(rename = "MODEL_INVOCATION_ERROR")]
    ModelInvocation = 3000,
    /// LLM provider rejected the request for quota or rate reasons
    #[serde(rename = "RATE_LIMITED")]
    RateLimited = 3001,

    // Validation (4000-4999)
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 4000,
    #[serde(rename = "MISSING_REQUIRED_FIELD")]
    MissingRequiredField = 4001,

    // Resource Management (5000-5999)
    #[serde(rename = "RESOURCE_NOT_FOUND")]
    NotFound = 5000,

    // Configuration (6000-6999)
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError = 6000,
    #[serde(rename = "CONFIG_MISSING")]
    ConfigMissing = 6001,

    // Internal Errors (9000-9999)
    #[serde(rename = "INTERNAL_ERROR")]
    Internal = 9000,
    #[serde(rename = "SERIALIZATION_ERROR")]
    Serialization = 9001,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> u16 {
        match self {
            // 400 Bad Request
            ErrorCode::InvalidInput | ErrorCode::MissingRequiredField => 400,

            // 404 Not Found
            ErrorCode::NotFound => 404,

            // 502 Bad Gateway: an external collaborator misbehaved
            ErrorCode::SearchFailed
            | ErrorCode::ParseFailed
            | ErrorCode::ProcessFailed
            | ErrorCode::MediaProcessingFailed
            | ErrorCode::ModelInvocation => 502,

            // 429 Too Many Requests
            ErrorCode::RateLimited => 429,

            // 504 Gateway Timeout
            ErrorCode::Timeout => 504,

            // 500 Internal Server Error
            ErrorCode::ConfigError
            | ErrorCode::ConfigMissing
            | ErrorCode::Internal
            | ErrorCode::Serialization => 500,
        }
    }

    /// Get a user-friendly description of this error
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::SearchFailed => "The diary search engine reported a failure",
            ErrorCode::ParseFailed => "The diary search engine returned an unreadable response",
            ErrorCode::ProcessFailed => "The diary search engine process could not be run",
            ErrorCode::MediaProcessingFailed => "The uploaded media could not be processed",
            ErrorCode::Timeout => "The operation did not complete within the allowed time",
            ErrorCode::ModelInvocation => "The language model invocation failed",
            ErrorCode::RateLimited => "The language model provider is rate limiting requests",
            ErrorCode::InvalidInput => "The provided input is invalid",
            ErrorCode::MissingRequiredField => "A required field is missing from the request",
            ErrorCode::NotFound => "The requested resource was not found",
            ErrorCode::ConfigError => "Configuration error encountered",
            ErrorCode::ConfigMissing => "Required configuration is missing",
            ErrorCode::Internal => "An internal error occurred",
            ErrorCode::Serialization => "Data serialization/deserialization failed",
        }
    }
}

/// Additional context that can be attached to errors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Request ID for tracing
    pub request_id: Option<String>,
    /// Resource ID if applicable (diary ID, file URI, model ID)
    pub resource_id: Option<String>,
    /// Additional key-value context
    pub details: serde_json::Value,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            request_id: None,
            resource_id: None,
            details: serde_json::Value::Object(serde_json::Map::new()),
        }
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional context
    pub context: ErrorContext,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new AppError with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add a request ID to the error context
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.context.request_id = Some(request_id.into());
        self
    }

    /// Add a resource ID to the error context
    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.context.resource_id = Some(resource_id.into());
        self
    }

    /// Add details to the error context
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.context.details = details;
        self
    }

    /// Add a source error for error chaining
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// HTTP error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorResponseDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        Self {
            error: ErrorResponseDetails {
                code: error.code,
                message: error.message,
                request_id: error.context.request_id,
                details: error.context.details,
            },
        }
    }
}

/// Convenience functions for creating common errors
impl AppError {
    /// Search engine reported failure (non-zero exit, stderr attached by caller)
    pub fn search_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SearchFailed, message)
    }

    /// Search engine output could not be parsed
    pub fn parse_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseFailed, message)
    }

    /// Search engine process could not be spawned or driven
    pub fn process_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ProcessFailed, message)
    }

    /// Media upload/processing failed terminally
    pub fn media_processing(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MediaProcessingFailed, message)
    }

    /// A bounded wait elapsed
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Timeout, message)
    }

    /// Model invocation failed
    pub fn model_invocation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ModelInvocation, message)
    }

    /// Resource not found
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::NotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }
}

/// Conversion from anyhow::Error to AppError
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        // Extract the root cause if available for better error chaining
        match error.source() {
            Some(source) => AppError::new(ErrorCode::Internal, error.to_string()).with_details(
                serde_json::json!({
                    "source": source.to_string()
                }),
            ),
            None => AppError::new(ErrorCode::Internal, error.to_string()),
        }
    }
}
