// ABOUTME: Core configuration type definitions for agent roles and retrieval tuning
// ABOUTME: Contains AgentRole and SearchTuning used across config and service modules
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Todak Parenting Intelligence

use crate::constants::defaults;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Agent role selection for prompt and default resolution
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    /// Conversational question answering over diary context (default)
    #[default]
    Question,
    /// Media captioning for diary attachments
    Caption,
    /// Developmental report synthesis
    Report,
}

impl AgentRole {
    /// Parse from string with fallback to default
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "caption" | "multimodal" => Self::Caption,
            "report" => Self::Report,
            _ => Self::Question, // Default fallback (including "question")
        }
    }

    /// Default sampling temperature for this role.
    ///
    /// `None` means the temperature field is omitted from the request and the
    /// provider's own default applies.
    #[must_use]
    pub const fn default_temperature(&self) -> Option<f32> {
        match self {
            Self::Question => Some(defaults::QUESTION_TEMPERATURE),
            Self::Caption => Some(defaults::CAPTION_TEMPERATURE),
            Self::Report => None,
        }
    }
}

impl Display for AgentRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Question => write!(f, "question"),
            Self::Caption => write!(f, "caption"),
            Self::Report => write!(f, "report"),
        }
    }
}

/// Retrieval tuning for one search call
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SearchTuning {
    /// Maximum number of results requested from the engine
    pub limit: usize,
    /// Minimum similarity score a result must carry
    pub score_threshold: f64,
}

impl SearchTuning {
    /// Tuning for the conversational question flow
    #[must_use]
    pub const fn question() -> Self {
        Self {
            limit: defaults::QUESTION_SEARCH_LIMIT,
            score_threshold: defaults::QUESTION_SCORE_THRESHOLD,
        }
    }

    /// Tuning for report-context assembly
    #[must_use]
    pub const fn report() -> Self {
        Self {
            limit: defaults::REPORT_SEARCH_LIMIT,
            score_threshold: defaults::REPORT_SCORE_THRESHOLD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_role_from_str() {
        assert_eq!(AgentRole::from_str_or_default("report"), AgentRole::Report);
        assert_eq!(
            AgentRole::from_str_or_default("multimodal"),
            AgentRole::Caption
        );
        assert_eq!(
            AgentRole::from_str_or_default("anything-else"),
            AgentRole::Question
        );
    }

    #[test]
    fn test_role_temperatures() {
        assert_eq!(AgentRole::Question.default_temperature(), Some(0.3));
        assert_eq!(AgentRole::Caption.default_temperature(), Some(0.0));
        assert_eq!(AgentRole::Report.default_temperature(), None);
    }

    #[test]
    fn test_search_tuning_presets() {
        let question = SearchTuning::question();
        assert_eq!(question.limit, 3);
        assert!(question.score_threshold.abs() < f64::EPSILON);

        let report = SearchTuning::report();
        assert_eq!(report.limit, 5);
        assert!((report.score_threshold - 0.5).abs() < f64::EPSILON);
    }
}
