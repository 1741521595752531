// ABOUTME: Relational store abstraction for diary entries and child profiles
// ABOUTME: Plugin architecture so the core never depends on a concrete database
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Todak Parenting Intelligence

//! # Diary Store Abstraction
//!
//! The intelligence core treats the relational store as a collaborator: it
//! asks for records and gets back a record or not-found, nothing more. The
//! platform's persistence layer implements [`DiaryStore`]; this crate ships
//! an in-memory implementation used by tests and embedded deployments.

use crate::errors::AppResult;
use crate::models::{ChildProfile, DiaryRecord, NewDiary};
use async_trait::async_trait;

pub mod memory;

pub use memory::MemoryDiaryStore;

/// Core store abstraction trait
///
/// All store implementations must implement this trait to provide a
/// consistent interface for the service layer.
#[async_trait]
pub trait DiaryStore: Send + Sync {
    // ================================
    // Diary Entries
    // ================================

    /// Insert or overwrite the entry for `(child_id, date)`.
    ///
    /// A child has at most one entry per day. Saving again on the same day
    /// replaces content and attachments but keeps the assigned `diary_id`.
    async fn upsert_diary(&self, diary: NewDiary) -> AppResult<DiaryRecord>;

    /// Get a diary entry by ID
    async fn get_diary(&self, diary_id: i64) -> AppResult<Option<DiaryRecord>>;

    /// Get a diary entry by ID (required - fails if not found)
    async fn get_diary_required(&self, diary_id: i64) -> AppResult<DiaryRecord>;

    /// Delete a diary entry; returns whether an entry existed
    async fn delete_diary(&self, diary_id: i64) -> AppResult<bool>;

    /// All entries for a child, ordered by date ascending
    async fn diaries_for_child(&self, child_id: i64) -> AppResult<Vec<DiaryRecord>>;

    // ================================
    // Child Profiles
    // ================================

    /// Get a child profile by ID
    async fn get_child(&self, child_id: i64) -> AppResult<Option<ChildProfile>>;

    /// Insert or replace a child profile
    async fn upsert_child(&self, profile: ChildProfile) -> AppResult<()>;
}
