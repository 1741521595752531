// ABOUTME: Diary lifecycle service keeping the relational store and vector index in step
// ABOUTME: Saves entries with best-effort captions and removes embeddings on delete
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Todak Parenting Intelligence

//! Diary lifecycle service
//!
//! Saving a diary entry has three steps: persist the record, caption its
//! attachments, and index the content (with captions) in the vector store.
//! Captioning is best-effort and never blocks the save; indexing is not, so
//! a failed upsert surfaces to the caller after the record is already safe
//! in the relational store.

use tracing::debug;

use crate::errors::AppResult;
use crate::models::{Caption, DiaryRecord, NewDiary};
use crate::search::{SearchEngine, UpsertRequest};
use crate::services::caption::CaptionPipeline;
use crate::store::DiaryStore;

/// Save or overwrite a diary entry and index it for retrieval.
///
/// Business rules:
/// - One entry per `(child_id, date)`: saving again replaces content but
///   keeps the assigned `diary_id`, and the engine overwrites the embedding
///   under that same id
/// - Attachment captions enrich the indexed text; a failed caption is
///   dropped, never fatal
///
/// # Errors
///
/// Returns store errors from the upsert and engine errors from indexing. On
/// an indexing error the record is already persisted; re-saving repairs the
/// index.
pub async fn save_diary(
    store: &dyn DiaryStore,
    engine: &dyn SearchEngine,
    captions: &CaptionPipeline<'_>,
    diary: NewDiary,
) -> AppResult<DiaryRecord> {
    let record = store.upsert_diary(diary).await?;

    let caption_texts: Vec<String> = captions
        .caption_all(&record.attachments)
        .await
        .into_iter()
        .flatten()
        .map(|caption: Caption| caption.as_text().to_owned())
        .collect();
    debug!(
        diary_id = record.diary_id,
        captions = caption_texts.len(),
        "Captions collected for diary entry"
    );

    engine
        .upsert(UpsertRequest {
            diary_id: record.diary_id,
            content: record.content.clone(),
            date: record.date,
            child_id: record.child_id,
            captions: caption_texts,
            parent_id: record.parent_id,
        })
        .await?;

    Ok(record)
}

/// Delete a diary entry and its embedding.
///
/// The embedding is removed even when the relational store had no record,
/// which makes the operation safe to repeat.
///
/// # Errors
///
/// Returns store errors from the delete and engine errors from the index
/// removal.
pub async fn delete_diary(
    store: &dyn DiaryStore,
    engine: &dyn SearchEngine,
    diary_id: i64,
) -> AppResult<bool> {
    let existed = store.delete_diary(diary_id).await?;
    engine.delete(diary_id).await?;
    Ok(existed)
}
