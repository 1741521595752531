// ABOUTME: Media captioning sub-pipeline turning diary attachments into short captions
// ABOUTME: Resolves bytes and MIME types, routes image/video modalities, swallows per-item failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Todak Parenting Intelligence

//! Media captioning sub-pipeline
//!
//! Captions exist to enrich the embedding text of a diary entry, not to be
//! shown to anyone. The pipeline is therefore best-effort end to end: a
//! caption that cannot be produced becomes `None`, and a batch of attachments
//! never fails as a whole. Diary saves must not be blocked by a broken video
//! file or a model hiccup.
//!
//! The system instruction is fixed and not caller-configurable: captions must
//! stay factual, markdown-free, and uniformly phrased no matter which flow
//! requested them.

use std::ffi::OsStr;

use tracing::{debug, warn};

use crate::config::{AgentRole, PollConfig};
use crate::constants::limits;
use crate::errors::{AppError, AppResult};
use crate::llm::prompts;
use crate::llm::{wait_until_active, ChatMessage, ChatModel, ChatRequest, ContentPart, FileStore};
use crate::logging::AppLogger;
use crate::models::{Attachment, Caption};

/// Resolve the MIME type for an attachment from its file extension.
///
/// Unrecognized or missing extensions fall back to the generic default for
/// the attachment's declared media type.
#[must_use]
pub fn mime_for_attachment(attachment: &Attachment) -> &'static str {
    let extension = attachment
        .path
        .extension()
        .and_then(OsStr::to_str)
        .map(str::to_lowercase);

    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("heic") => "image/heic",
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("m4v") => "video/x-m4v",
        Some("avi") => "video/x-msvideo",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        _ => attachment.media_type.fallback_mime(),
    }
}

/// Captioning pipeline with its injected collaborators.
///
/// Holds the chat model that writes captions and the file store used for the
/// video upload-and-activate protocol.
pub struct CaptionPipeline<'a> {
    model: &'a dyn ChatModel,
    files: &'a dyn FileStore,
    poll: PollConfig,
}

impl<'a> CaptionPipeline<'a> {
    /// Create a pipeline with default polling cadence
    #[must_use]
    pub fn new(model: &'a dyn ChatModel, files: &'a dyn FileStore) -> Self {
        Self {
            model,
            files,
            poll: PollConfig::default(),
        }
    }

    /// Override the video activation polling cadence
    #[must_use]
    pub const fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Caption a single attachment.
    ///
    /// Business rules:
    /// - Bytes are read from the local path; files over the size limit are
    ///   rejected before any network traffic
    /// - Images are inlined as base64; videos go through upload + activation
    /// - The caption system prompt and temperature are fixed per role
    ///
    /// # Errors
    ///
    /// Returns a media processing error when the file cannot be read or the
    /// video never activates, an invalid input error for oversized files, and
    /// model invocation errors from the gateway.
    pub async fn caption_attachment(&self, attachment: &Attachment) -> AppResult<Caption> {
        let bytes = tokio::fs::read(&attachment.path).await.map_err(|e| {
            AppError::media_processing(format!(
                "Failed to read media file {}: {e}",
                attachment.path.display()
            ))
        })?;

        let byte_len = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        if byte_len > limits::MAX_MEDIA_BYTES {
            return Err(AppError::invalid_input(format!(
                "Media file {} exceeds the {} MB limit",
                attachment.path.display(),
                limits::MAX_MEDIA_BYTES / (1024 * 1024)
            )));
        }

        let mime_type = mime_for_attachment(attachment);

        let user_parts = if attachment.media_type.is_video() {
            let display_name = attachment
                .path
                .file_name()
                .map_or_else(|| "uploaded-video".to_owned(), |n| n.to_string_lossy().into_owned());
            let uri = self.files.upload(&bytes, mime_type, &display_name).await?;
            wait_until_active(self.files, &uri, &self.poll).await?;
            vec![
                ContentPart::text(prompts::CAPTION_VIDEO_FALLBACK),
                ContentPart::file(mime_type, uri),
            ]
        } else {
            vec![
                ContentPart::text(prompts::CAPTION_IMAGE_FALLBACK),
                ContentPart::inline_from_bytes(mime_type, &bytes),
            ]
        };

        let mut request = ChatRequest::new(vec![
            ChatMessage::system(prompts::MEDIA_CAPTION_PROMPT),
            ChatMessage::user_parts(user_parts),
        ]);
        if let Some(temperature) = AgentRole::Caption.default_temperature() {
            request = request.with_temperature(temperature);
        }

        let response = self.model.complete(&request).await?;
        AppLogger::log_media_event("caption", &attachment.path.display().to_string());
        Ok(Caption::new(response.content))
    }

    /// Caption every attachment in order, one at a time.
    ///
    /// The returned vector is positionally aligned with the input: failures
    /// and empty captions become `None` instead of aborting the batch.
    pub async fn caption_all(&self, attachments: &[Attachment]) -> Vec<Option<Caption>> {
        let mut captions = Vec::with_capacity(attachments.len());
        for attachment in attachments {
            let caption = match self.caption_attachment(attachment).await {
                Ok(caption) if !caption.is_empty() => Some(caption),
                Ok(_) => {
                    debug!(path = %attachment.path.display(), "Caption response was empty");
                    None
                }
                Err(e) => {
                    warn!(
                        path = %attachment.path.display(),
                        error = %e,
                        "Caption generation failed; continuing without one"
                    );
                    None
                }
            };
            captions.push(caption);
        }
        captions
    }
}
