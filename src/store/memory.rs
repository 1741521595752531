// ABOUTME: In-memory DiaryStore implementation backed by ordered maps
// ABOUTME: Used by tests and embedded deployments without a relational database
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Todak Parenting Intelligence

//! In-memory diary store.
//!
//! Ordered maps keep iteration deterministic, which the assembler tests rely
//! on. IDs are assigned monotonically and survive same-day overwrites.

use crate::errors::{AppError, AppResult};
use crate::models::{ChildProfile, DiaryRecord, NewDiary};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::DiaryStore;

#[derive(Default)]
struct Inner {
    next_id: i64,
    diaries: BTreeMap<i64, DiaryRecord>,
    by_child_date: BTreeMap<(i64, NaiveDate), i64>,
    children: BTreeMap<i64, ChildProfile>,
}

/// Thread-safe in-memory store
#[derive(Clone, Default)]
pub struct MemoryDiaryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryDiaryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DiaryStore for MemoryDiaryStore {
    async fn upsert_diary(&self, diary: NewDiary) -> AppResult<DiaryRecord> {
        let mut inner = self.inner.write().await;

        let key = (diary.child_id, diary.date);
        let diary_id = match inner.by_child_date.get(&key) {
            Some(existing) => *existing,
            None => {
                inner.next_id += 1;
                let id = inner.next_id;
                inner.by_child_date.insert(key, id);
                id
            }
        };

        let record = DiaryRecord {
            diary_id,
            child_id: diary.child_id,
            parent_id: diary.parent_id,
            date: diary.date,
            content: diary.content,
            attachments: diary.attachments,
        };
        inner.diaries.insert(diary_id, record.clone());
        Ok(record)
    }

    async fn get_diary(&self, diary_id: i64) -> AppResult<Option<DiaryRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.diaries.get(&diary_id).cloned())
    }

    async fn get_diary_required(&self, diary_id: i64) -> AppResult<DiaryRecord> {
        self.get_diary(diary_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("diary {diary_id}")))
    }

    async fn delete_diary(&self, diary_id: i64) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        let Some(record) = inner.diaries.remove(&diary_id) else {
            return Ok(false);
        };
        inner.by_child_date.remove(&(record.child_id, record.date));
        Ok(true)
    }

    async fn diaries_for_child(&self, child_id: i64) -> AppResult<Vec<DiaryRecord>> {
        let inner = self.inner.read().await;
        // by_child_date is ordered by (child_id, date), so the range scan
        // yields entries in date order without an explicit sort.
        let records = inner
            .by_child_date
            .range((child_id, NaiveDate::MIN)..=(child_id, NaiveDate::MAX))
            .filter_map(|(_, id)| inner.diaries.get(id).cloned())
            .collect();
        Ok(records)
    }

    async fn get_child(&self, child_id: i64) -> AppResult<Option<ChildProfile>> {
        let inner = self.inner.read().await;
        Ok(inner.children.get(&child_id).cloned())
    }

    async fn upsert_child(&self, profile: ChildProfile) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.children.insert(profile.child_id, profile);
        Ok(())
    }
}
