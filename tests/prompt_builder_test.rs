// ABOUTME: Integration tests for report directive rendering and message building
// ABOUTME: Validates directive order, spec decoding, and system/user content separation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Todak Parenting Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use serde_json::json;
use todak_intelligence::llm::MessageRole;
use todak_intelligence::rag::{
    ConversationTurn, DEFAULT_REPORT_PROMPT, ReportSpec, build_report_messages,
    build_system_prompt,
};

/// The briefing-report spec the Todak frontend submits by default
fn briefing_spec() -> ReportSpec {
    serde_json::from_value(json!({
        "reportType": "육아일지 기반 아동발달 상황 브리핑 보고서",
        "audience": "부모",
        "tone": "전문적이고 차분한",
        "length": "간결하게",
        "language": "한국어",
        "format": "markdown",
        "sections": ["요약", "핵심 내용", "권고사항", "K-DST 문항별 점수 채점 및 또래 아동과 비교"],
        "includeSummary": true,
        "citations": false
    }))
    .unwrap()
}

// ============================================================================
// System Prompt Rendering
// ============================================================================

#[test]
fn test_briefing_spec_renders_in_directive_order() {
    let prompt = build_system_prompt(None, &briefing_spec(), None);

    let expected = [
        DEFAULT_REPORT_PROMPT,
        "Report type: 육아일지 기반 아동발달 상황 브리핑 보고서",
        "Target audience: 부모",
        "Tone: 전문적이고 차분한",
        "Target length: 간결하게",
        "Language: 한국어",
        "Output format: markdown (use markdown if applicable)",
        "Required sections:",
        "- 요약",
        "- 핵심 내용",
        "- 권고사항",
        "- K-DST 문항별 점수 채점 및 또래 아동과 비교",
        "Include an executive summary at the beginning.",
    ]
    .join("\n");
    assert_eq!(prompt, expected);
    assert!(!prompt.contains("citations"), "citations off renders nothing");
}

#[test]
fn test_custom_base_replaces_default() {
    let prompt = build_system_prompt(
        Some("당신은 아동발달 보고서 전문가입니다."),
        &ReportSpec::default(),
        None,
    );
    assert_eq!(prompt, "당신은 아동발달 보고서 전문가입니다.");

    let blank = build_system_prompt(Some("   "), &ReportSpec::default(), None);
    assert_eq!(blank, DEFAULT_REPORT_PROMPT, "blank base falls back");
}

#[test]
fn test_decision_criteria_follow_directives() {
    let criteria = json!({
        "age_band": "8-9개월",
        "checklist": ["뒤집기", "배밀이"]
    });
    let spec = ReportSpec {
        tone: Some("차분한".to_owned()),
        ..ReportSpec::default()
    };

    let prompt = build_system_prompt(None, &spec, Some(&criteria));
    let lines: Vec<&str> = prompt.lines().collect();
    let tone_at = lines.iter().position(|l| *l == "Tone: 차분한").unwrap();
    let criteria_at = lines
        .iter()
        .position(|l| *l == "Decision criteria:")
        .unwrap();
    assert!(tone_at < criteria_at);
    assert!(prompt.contains("- age_band: 8-9개월"));
    assert!(prompt.contains("- checklist:"));
    assert!(prompt.contains("- 뒤집기"));
}

#[test]
fn test_spec_decoding_tolerates_unknown_keys() {
    let spec: ReportSpec = serde_json::from_value(json!({
        "reportType": "간단 보고서",
        "maxTokens": 512,
        "responseStyle": "friendly"
    }))
    .unwrap();
    assert_eq!(spec.report_type.as_deref(), Some("간단 보고서"));
    assert!(spec.sections.is_empty());
    assert!(!spec.include_summary);
    assert!(!spec.citations);
}

// ============================================================================
// Message Building
// ============================================================================

#[test]
fn test_messages_keep_history_between_system_and_request() {
    let history = vec![
        ConversationTurn::human("지난주 보고서도 만들었어요"),
        ConversationTurn::ai("네, 지난주 분량은 전달드렸습니다."),
    ];
    let messages = build_report_messages(
        "시스템 지시문",
        &history,
        "이번 주 보고서를 만들어줘",
        Some("지난 7일 일기 요약"),
    );

    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0].role, MessageRole::System);
    assert_eq!(messages[0].flattened_text(), "시스템 지시문");
    assert_eq!(messages[1].role, MessageRole::User);
    assert_eq!(messages[1].flattened_text(), "지난주 보고서도 만들었어요");
    assert_eq!(messages[2].role, MessageRole::Assistant);
    assert_eq!(
        messages[3].flattened_text(),
        "User request:\n이번 주 보고서를 만들어줘\n\nContext (optional):\n지난 7일 일기 요약"
    );
}

#[test]
fn test_missing_context_renders_empty_section() {
    let messages = build_report_messages("시스템 지시문", &[], "보고서를 만들어줘", None);
    assert_eq!(messages.len(), 2);
    assert_eq!(
        messages[1].flattened_text(),
        "User request:\n보고서를 만들어줘\n\nContext (optional):\n"
    );
}

#[test]
fn test_directives_and_context_never_cross() {
    let spec = ReportSpec {
        tone: Some("TONE-SENTINEL".to_owned()),
        ..ReportSpec::default()
    };
    let system_prompt = build_system_prompt(None, &spec, None);
    let messages = build_report_messages(&system_prompt, &[], "보고서", Some("CONTEXT-SENTINEL"));

    let system_text = messages[0].flattened_text();
    let user_text = messages[1].flattened_text();
    assert!(system_text.contains("TONE-SENTINEL"));
    assert!(!system_text.contains("CONTEXT-SENTINEL"));
    assert!(user_text.contains("CONTEXT-SENTINEL"));
    assert!(!user_text.contains("TONE-SENTINEL"));
}
