// ABOUTME: Gemini file store client for uploading media and polling activation state
// ABOUTME: Implements the multipart/related upload protocol and the ACTIVE/FAILED wait loop
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Todak Parenting Intelligence

//! # Gemini File Store
//!
//! Video content is too large to inline into a `generateContent` call, so it
//! is first uploaded to the Gemini file store and referenced by URI. Uploaded
//! files are not immediately usable: the service transcodes them in the
//! background and reports a lifecycle state (`PROCESSING`, `ACTIVE`,
//! `FAILED`). [`wait_until_active`] polls that state until the file becomes
//! usable, fails fast on `FAILED`, and gives up after a deadline.
//!
//! ## Key Concepts
//!
//! - **Upload**: a single `multipart/related` POST carrying a JSON metadata
//!   part and the raw media bytes.
//! - **Activation**: the poll loop that gates caption requests on the file
//!   reaching `ACTIVE`.

use std::fmt::{Debug, Formatter, Result as FmtResult};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::{GeminiConfig, PollConfig};
use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;

/// Lifecycle state of an uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    /// File is ready to reference from a generation request
    Active,
    /// Server-side processing failed; the file will never become usable
    Failed,
    /// File is still being processed (or the state was not reported yet)
    Processing,
}

impl FileState {
    /// Decode the wire state string; unknown or missing states count as
    /// still-processing so the wait loop keeps polling.
    #[must_use]
    pub fn from_wire(state: Option<&str>) -> Self {
        match state {
            Some("ACTIVE") => Self::Active,
            Some("FAILED") => Self::Failed,
            _ => Self::Processing,
        }
    }
}

/// Remote store for media files referenced by generation requests
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Upload raw media bytes and return the URI of the stored file
    async fn upload(&self, bytes: &[u8], mime_type: &str, display_name: &str)
        -> AppResult<String>;

    /// Fetch the current lifecycle state of an uploaded file
    async fn state(&self, uri: &str) -> AppResult<FileState>;
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: Option<UploadedFile>,
}

#[derive(Debug, Deserialize)]
struct UploadedFile {
    uri: Option<String>,
}

/// State responses come in two shapes: `{"state": ...}` from the file
/// resource itself and `{"file": {"state": ...}}` from wrapper endpoints.
#[derive(Debug, Deserialize)]
struct StateResponse {
    state: Option<String>,
    file: Option<StateFile>,
}

#[derive(Debug, Deserialize)]
struct StateFile {
    state: Option<String>,
}

impl StateResponse {
    fn into_state(self) -> FileState {
        let wire = self
            .state
            .or_else(|| self.file.and_then(|f| f.state));
        FileState::from_wire(wire.as_deref())
    }
}

// ============================================================================
// Gemini Implementation
// ============================================================================

/// File store backed by the Gemini media upload endpoint
pub struct GeminiFileStore {
    config: GeminiConfig,
    client: Client,
}

impl GeminiFileStore {
    /// Create a new file store with the given configuration
    #[must_use]
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    /// Create a file store from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if `GEMINI_API_KEY` is not set.
    pub fn from_env() -> AppResult<Self> {
        Ok(Self::new(GeminiConfig::from_env()?))
    }

    /// Assemble the `multipart/related` body: a JSON metadata part followed by
    /// the raw media part, CRLF-delimited exactly as the endpoint requires.
    fn multipart_body(
        boundary: &str,
        display_name: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> Vec<u8> {
        let name = if display_name.is_empty() {
            "uploaded-file"
        } else {
            display_name
        };
        let metadata = json!({ "file": { "displayName": name } }).to_string();

        let mut body = Vec::with_capacity(bytes.len() + metadata.len() + 256);
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(
            format!("--{boundary}\r\nContent-Type: {mime_type}\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
        body
    }
}

#[async_trait]
impl FileStore for GeminiFileStore {
    async fn upload(
        &self,
        bytes: &[u8],
        mime_type: &str,
        display_name: &str,
    ) -> AppResult<String> {
        let boundary = format!("----TodakGeminiUpload{}", Uuid::new_v4().simple());
        let body = Self::multipart_body(&boundary, display_name, mime_type, bytes);
        let url = format!(
            "{}/upload/v1beta/files?upload_type=multipart&key={}",
            self.config.upload_base, self.config.api_key
        );

        debug!(size = bytes.len(), mime_type = %mime_type, "Uploading media to Gemini file store");

        let response = self
            .client
            .post(&url)
            .header(
                "Content-Type",
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body)
            .send()
            .await
            .map_err(|e| AppError::media_processing(format!("File upload request failed: {e}")))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            AppError::media_processing(format!("Failed to read upload response: {e}"))
        })?;

        if !status.is_success() {
            return Err(AppError::media_processing(format!(
                "File upload failed ({status}): {text}"
            )));
        }

        let parsed: UploadResponse = serde_json::from_str(&text).map_err(|e| {
            AppError::media_processing(format!("Failed to parse upload response: {e}"))
        })?;

        let uri = parsed
            .file
            .and_then(|f| f.uri)
            .ok_or_else(|| AppError::media_processing("Upload response did not contain a file URI"))?;

        AppLogger::log_media_event("upload", &uri);
        Ok(uri)
    }

    async fn state(&self, uri: &str) -> AppResult<FileState> {
        let url = format!("{uri}?key={}", self.config.api_key);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::media_processing(format!("File state request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::media_processing(format!(
                "File state request failed ({status})"
            )));
        }

        let parsed: StateResponse = response.json().await.map_err(|e| {
            AppError::media_processing(format!("Failed to parse file state response: {e}"))
        })?;

        Ok(parsed.into_state())
    }
}

impl Debug for GeminiFileStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("GeminiFileStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Activation Wait Loop
// ============================================================================

/// Poll an uploaded file until it becomes `ACTIVE`.
///
/// The state is checked immediately and then every `poll.interval` until
/// `poll.deadline` has elapsed. A `FAILED` state aborts the wait at once
/// rather than burning the rest of the deadline on a file that can never
/// activate. Transient state-check errors are logged and retried.
///
/// # Errors
///
/// Returns a media processing error when the file reaches `FAILED`, or a
/// timeout error when the deadline passes without activation.
pub async fn wait_until_active<S>(store: &S, uri: &str, poll: &PollConfig) -> AppResult<()>
where
    S: FileStore + ?Sized,
{
    let started = tokio::time::Instant::now();

    loop {
        match store.state(uri).await {
            Ok(FileState::Active) => {
                AppLogger::log_media_event("activated", uri);
                return Ok(());
            }
            Ok(FileState::Failed) => {
                AppLogger::log_media_event("failed", uri);
                return Err(AppError::media_processing(
                    "Uploaded file entered FAILED state during processing",
                ));
            }
            Ok(FileState::Processing) => {
                debug!(uri = %uri, "File still processing");
            }
            Err(e) => {
                warn!(uri = %uri, error = %e, "Transient error while checking file state");
            }
        }

        if started.elapsed() >= poll.deadline {
            return Err(AppError::timeout(format!(
                "File did not become ACTIVE within {}s",
                poll.deadline.as_secs()
            )));
        }
        tokio::time::sleep(poll.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::errors::ErrorCode;

    struct ScriptedStore {
        states: Mutex<VecDeque<AppResult<FileState>>>,
    }

    impl ScriptedStore {
        fn new(states: Vec<AppResult<FileState>>) -> Self {
            Self {
                states: Mutex::new(states.into_iter().collect()),
            }
        }
    }

    #[async_trait]
    impl FileStore for ScriptedStore {
        async fn upload(&self, _: &[u8], _: &str, _: &str) -> AppResult<String> {
            Ok("https://example.invalid/files/test".to_owned())
        }

        async fn state(&self, _: &str) -> AppResult<FileState> {
            self.states
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(FileState::Processing))
        }
    }

    #[test]
    fn test_state_decoding() {
        assert_eq!(FileState::from_wire(Some("ACTIVE")), FileState::Active);
        assert_eq!(FileState::from_wire(Some("FAILED")), FileState::Failed);
        assert_eq!(FileState::from_wire(Some("PROCESSING")), FileState::Processing);
        assert_eq!(FileState::from_wire(Some("SOMETHING_NEW")), FileState::Processing);
        assert_eq!(FileState::from_wire(None), FileState::Processing);
    }

    #[test]
    fn test_state_response_nested_shape() {
        let top: StateResponse = serde_json::from_str(r#"{"state": "ACTIVE"}"#).unwrap();
        assert_eq!(top.into_state(), FileState::Active);

        let nested: StateResponse =
            serde_json::from_str(r#"{"file": {"state": "FAILED"}}"#).unwrap();
        assert_eq!(nested.into_state(), FileState::Failed);

        let empty: StateResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.into_state(), FileState::Processing);
    }

    #[test]
    fn test_multipart_body_layout() {
        let body = GeminiFileStore::multipart_body("----abc", "photo.jpg", "image/jpeg", b"RAW");
        let text = String::from_utf8(body).unwrap();

        assert!(text.starts_with(
            "------abc\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n"
        ));
        assert!(text.contains(r#"{"file":{"displayName":"photo.jpg"}}"#));
        assert!(text.contains("\r\n------abc\r\nContent-Type: image/jpeg\r\n\r\nRAW"));
        assert!(text.ends_with("\r\n------abc--\r\n"));
    }

    #[test]
    fn test_multipart_body_empty_display_name() {
        let body = GeminiFileStore::multipart_body("----abc", "", "video/mp4", b"V");
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains(r#"{"file":{"displayName":"uploaded-file"}}"#));
    }

    #[tokio::test]
    async fn test_wait_returns_when_active() {
        let store = ScriptedStore::new(vec![Ok(FileState::Active)]);
        let poll = PollConfig::default();
        assert!(wait_until_active(&store, "files/a", &poll).await.is_ok());
    }

    #[tokio::test]
    async fn test_wait_fails_fast_on_failed_state() {
        let store = ScriptedStore::new(vec![Ok(FileState::Processing), Ok(FileState::Failed)]);
        let poll = PollConfig {
            interval: Duration::from_millis(1),
            deadline: Duration::from_secs(60),
        };
        let error = wait_until_active(&store, "files/a", &poll).await.unwrap_err();
        assert_eq!(error.code, ErrorCode::MediaProcessingFailed);
    }

    #[tokio::test]
    async fn test_wait_ignores_transient_errors() {
        let store = ScriptedStore::new(vec![
            Err(AppError::media_processing("connection reset")),
            Ok(FileState::Active),
        ]);
        let poll = PollConfig {
            interval: Duration::from_millis(1),
            deadline: Duration::from_secs(60),
        };
        assert!(wait_until_active(&store, "files/a", &poll).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out_at_deadline() {
        let store = ScriptedStore::new(vec![]);
        let poll = PollConfig::default();
        let error = wait_until_active(&store, "files/a", &poll).await.unwrap_err();
        assert_eq!(error.code, ErrorCode::Timeout);
    }
}
