// ABOUTME: Domain service layer for business logic behind the intelligence pipeline
// ABOUTME: Protocol-agnostic flows reusable from any transport a deployment puts in front
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Todak Parenting Intelligence

//! Domain service layer
//!
//! This module contains protocol-agnostic business logic composed from the
//! search, assembly, prompt, and gateway layers. Services take their
//! collaborators as trait objects, ensuring consistent business rules no
//! matter which entry point a deployment wires them to.

/// Media captioning sub-pipeline: MIME resolution, modality routing, best-effort batches
pub mod caption;

/// Diary lifecycle: save with captions and indexing, delete with index cleanup
pub mod diary;

/// Conversational question answering over retrieved diary context
pub mod question;

/// Report synthesis: direct, RAG-assembled, search-only, and checklist evidence
pub mod report;

pub use caption::{mime_for_attachment, CaptionPipeline};
pub use diary::{delete_diary, save_diary};
pub use question::{answer_question, summarize_conversation, MediaPayload, QuestionAnswer, QuestionRequest};
pub use report::{
    collect_checklist_evidence, rag_search, run_rag_report, run_report, ReportOutput, ReportRequest,
};
