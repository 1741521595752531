// ABOUTME: Deterministic context assembly from search results and structured blocks
// ABOUTME: Builds the bounded text handed to the model as user-turn evidence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Todak Parenting Intelligence

//! # Context Assembler
//!
//! Everything the model is allowed to cite lives in one bounded text block
//! built here. Assembly is a pure function of its inputs: no timestamps, no
//! randomness, byte-identical output for identical input.
//!
//! Two assembly styles exist:
//! - report contexts: a query header, ranked snippets with dates and
//!   3-decimal scores, then named structured blocks rendered as bullet
//!   outlines (retrieved snippets always precede structured blocks)
//! - conversational contexts: a `[Conversation summary]` block above the
//!   user input and a `[Related diaries]` block below it

use crate::rag::history::{ConversationTurn, compress_history};
use crate::search::SearchResult;
use serde_json::Value;

/// Label above compressed prior turns in conversational contexts
pub const CONVERSATION_BLOCK_LABEL: &str = "[Conversation summary]";

/// Label above retrieved diary texts in conversational contexts
pub const RELATED_DIARIES_LABEL: &str = "[Related diaries]";

/// A labeled structured payload appended after retrieved snippets
#[derive(Debug, Clone)]
pub struct NamedBlock {
    /// Heading rendered above the bullet outline
    pub name: String,
    /// Arbitrary structured data rendered as bullets
    pub value: Value,
}

impl NamedBlock {
    /// Create a named block
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Assemble a report context from ranked results and structured blocks.
///
/// Header first, then one line per result in ranked order carrying index,
/// date, content, and the similarity score at fixed 3-decimal precision,
/// then each named block as a bullet outline.
#[must_use]
pub fn assemble(query: &str, results: &[SearchResult], blocks: &[NamedBlock]) -> String {
    let mut sections = Vec::with_capacity(1 + blocks.len());

    let mut snippet_lines = Vec::with_capacity(1 + results.len());
    snippet_lines.push(format!(
        "Related diary entries for \"{query}\" ({} found):",
        results.len()
    ));
    for (index, result) in results.iter().enumerate() {
        snippet_lines.push(format!(
            "{}. [{}] (score {:.3}) {}",
            index + 1,
            result.date,
            result.score,
            result.display_text()
        ));
    }
    sections.push(snippet_lines.join("\n"));

    for block in blocks {
        let bullets = render_bullets(&block.value);
        if bullets.is_empty() {
            continue;
        }
        sections.push(format!("{}:\n{bullets}", block.name));
    }

    sections.join("\n\n")
}

/// Render arbitrary structured data as a bullet outline.
///
/// Objects become `- key: value` lines with nested objects and arrays
/// indented below a bare `- key:` line; arrays flatten to sub-bullets;
/// null leaves are skipped. Object keys render in sorted order, which keeps
/// the output stable for identical input.
#[must_use]
pub fn render_bullets(value: &Value) -> String {
    let mut lines = Vec::new();
    push_bullets(value, 0, &mut lines);
    lines.join("\n")
}

fn push_bullets(value: &Value, depth: usize, lines: &mut Vec<String>) {
    let pad = "  ".repeat(depth);
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                match child {
                    Value::Null => {}
                    Value::Object(_) | Value::Array(_) => {
                        lines.push(format!("{pad}- {key}:"));
                        push_bullets(child, depth + 1, lines);
                    }
                    scalar => lines.push(format!("{pad}- {key}: {}", scalar_text(scalar))),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::Null => {}
                    Value::Object(_) | Value::Array(_) => push_bullets(item, depth, lines),
                    scalar => lines.push(format!("{pad}- {}", scalar_text(scalar))),
                }
            }
        }
        Value::Null => {}
        scalar => lines.push(format!("{pad}- {}", scalar_text(scalar))),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Prepend compressed conversation history to the user input.
///
/// Returns the input unchanged when no prior turns survive compression.
#[must_use]
pub fn augment_with_history(input: &str, turns: &[ConversationTurn], window: usize) -> String {
    let trimmed = input.trim();
    match compress_history(turns, window) {
        Some(compressed) => {
            let block = format!("{CONVERSATION_BLOCK_LABEL}\n{compressed}");
            if trimmed.is_empty() {
                block
            } else {
                format!("{block}\n\n{trimmed}")
            }
        }
        None => trimmed.to_owned(),
    }
}

/// Append retrieved diary texts below the combined input.
///
/// Results with no usable text are skipped; when none remain the input is
/// returned unchanged so the model never sees an empty evidence block.
#[must_use]
pub fn append_related_diaries(combined: &str, results: &[SearchResult]) -> String {
    let texts: Vec<&str> = results
        .iter()
        .map(SearchResult::display_text)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect();
    if texts.is_empty() {
        return combined.to_owned();
    }

    let block = format!("{RELATED_DIARIES_LABEL}\n{}", texts.join("\n"));
    if combined.is_empty() {
        block
    } else {
        format!("{combined}\n\n{block}")
    }
}

/// Merge per-question search results into one chronological evidence string.
///
/// Duplicate diary ids keep their first occurrence, entries sort ascending
/// by date with blank dates treated as the epoch sentinel, and each line is
/// rendered as `<date>, <content>`.
#[must_use]
pub fn checklist_evidence(result_sets: &[Vec<SearchResult>]) -> String {
    let mut seen_ids = std::collections::HashSet::new();
    let mut unique: Vec<&SearchResult> = Vec::new();
    for set in result_sets {
        for result in set {
            if seen_ids.insert(result.diary_id) {
                unique.push(result);
            }
        }
    }

    unique.sort_by(|a, b| date_sort_key(&a.date).cmp(date_sort_key(&b.date)));

    let lines: Vec<String> = unique
        .iter()
        .map(|result| format!("{}, {}", result.date, result.display_text()))
        .collect();
    lines.join("\n")
}

fn date_sort_key(date: &str) -> &str {
    if date.is_empty() { "0000-00-00" } else { date }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(diary_id: i64, score: f64, date: &str, text: &str) -> SearchResult {
        SearchResult {
            diary_id,
            score,
            date: date.into(),
            text: text.into(),
            combined_text: None,
        }
    }

    #[test]
    fn test_assemble_header_and_ranked_lines() {
        let results = vec![
            result(5, 0.91234, "2024-06-01", "처음으로 뒤집기에 성공했다"),
            result(2, 0.5, "2024-05-20", "배밀이 연습을 계속한다"),
        ];
        let assembled = assemble("뒤집기", &results, &[]);
        let lines: Vec<&str> = assembled.lines().collect();
        assert_eq!(lines[0], "Related diary entries for \"뒤집기\" (2 found):");
        assert_eq!(lines[1], "1. [2024-06-01] (score 0.912) 처음으로 뒤집기에 성공했다");
        assert_eq!(lines[2], "2. [2024-05-20] (score 0.500) 배밀이 연습을 계속한다");
    }

    #[test]
    fn test_assemble_snippets_precede_blocks() {
        let results = vec![result(1, 0.8, "2024-06-01", "첫 걸음마")];
        let blocks = vec![NamedBlock::new(
            "Children Context",
            json!({ "name": "서연", "birth_date": "2024-01-15" }),
        )];
        let assembled = assemble("걸음마", &results, &blocks);

        let snippet_at = assembled.find("첫 걸음마").unwrap();
        let block_at = assembled.find("Children Context:").unwrap();
        assert!(snippet_at < block_at);
        assert!(assembled.contains("- name: 서연"));
    }

    #[test]
    fn test_assemble_is_deterministic() {
        let results = vec![result(1, 0.7, "2024-06-01", "낮잠 기록")];
        let blocks = vec![NamedBlock::new(
            "Decision Criteria",
            json!({ "영역": ["대근육", "소근육"], "기준": { "통과": 2, "관찰": 1 } }),
        )];
        let first = assemble("낮잠", &results, &blocks);
        let second = assemble("낮잠", &results, &blocks);
        assert_eq!(first, second);
    }

    #[test]
    fn test_render_bullets_nested_and_null_skipping() {
        let value = json!({
            "name": "서연",
            "notes": null,
            "milestones": ["뒤집기", "배밀이"],
            "checkup": { "weight_kg": 7.8, "comment": null }
        });
        let rendered = render_bullets(&value);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(
            lines,
            vec![
                "- checkup:",
                "  - weight_kg: 7.8",
                "- milestones:",
                "  - 뒤집기",
                "  - 배밀이",
                "- name: 서연",
            ]
        );
    }

    #[test]
    fn test_augment_with_history_prepends_block() {
        let turns = vec![
            ConversationTurn::human("밤에 자주 깨요"),
            ConversationTurn::ai("수면 환경을 확인해 보세요."),
        ];
        let combined = augment_with_history("  낮잠은 어떻게 하나요?  ", &turns, 6);
        assert!(combined.starts_with("[Conversation summary]\nUser: 밤에 자주 깨요"));
        assert!(combined.ends_with("낮잠은 어떻게 하나요?"));
        assert!(combined.contains("\n\n"));
    }

    #[test]
    fn test_augment_without_history_trims_only() {
        let combined = augment_with_history("  질문  ", &[], 6);
        assert_eq!(combined, "질문");
    }

    #[test]
    fn test_append_related_diaries_prefers_combined_text() {
        let mut enriched = result(1, 0.9, "2024-06-01", "이유식 시작");
        enriched.combined_text = Some("이유식 시작\n사진 속 아기가 숟가락을 쥐고 있다".into());
        let plain = result(2, 0.4, "2024-05-01", "");
        let appended = append_related_diaries("질문", &[enriched, plain]);
        assert_eq!(
            appended,
            "질문\n\n[Related diaries]\n이유식 시작\n사진 속 아기가 숟가락을 쥐고 있다"
        );
    }

    #[test]
    fn test_append_related_diaries_no_usable_results() {
        let appended = append_related_diaries("질문", &[result(1, 0.9, "2024-06-01", "   ")]);
        assert_eq!(appended, "질문");
    }

    #[test]
    fn test_checklist_evidence_dedupes_and_sorts_by_date() {
        let per_question = vec![
            vec![
                result(10, 0.9, "2024-06-10", "뒤집기를 했다"),
                result(11, 0.6, "", "날짜가 비어 있는 기록"),
            ],
            vec![
                result(10, 0.95, "2024-06-10", "중복이라 무시되어야 한다"),
                result(12, 0.7, "2024-05-01", "배밀이를 시작했다"),
            ],
        ];
        let evidence = checklist_evidence(&per_question);
        let lines: Vec<&str> = evidence.lines().collect();
        assert_eq!(
            lines,
            vec![
                ", 날짜가 비어 있는 기록",
                "2024-05-01, 배밀이를 시작했다",
                "2024-06-10, 뒤집기를 했다",
            ]
        );
    }
}
