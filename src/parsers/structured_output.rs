// Structured output parser - decodes collaborator payloads into workflow models

use crate::models::Question;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Error type for structured output parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredOutputError {
    pub message: String,
    pub item_index: Option<usize>,
}

impl StructuredOutputError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            item_index: None,
        }
    }

    fn at(index: usize, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            item_index: Some(index),
        }
    }
}

impl std::fmt::Display for StructuredOutputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(idx) = self.item_index {
            write!(f, "Question {}: {}", idx, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for StructuredOutputError {}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    #[serde(default)]
    questions: Vec<Question>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    prd: String,
}

static FENCE_PATTERN: OnceLock<Regex> = OnceLock::new();

fn get_fence_pattern() -> &'static Regex {
    FENCE_PATTERN.get_or_init(|| {
        Regex::new(r"^```(?:json)?\s*\n?([\s\S]*?)\s*```$").expect("fence pattern")
    })
}

/// Remove a surrounding ```json ... ``` fence if present
pub fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    match get_fence_pattern().captures(trimmed).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => trimmed,
    }
}

/// Parse the analysis payload (`{"questions": [...]}`) into a question sequence
pub fn parse_analysis_response(content: &str) -> Result<Vec<Question>, StructuredOutputError> {
    let body = strip_code_fence(content);
    let response: AnalyzeResponse = serde_json::from_str(body).map_err(|e| {
        log::debug!("Analysis payload rejected: {}", e);
        StructuredOutputError::new("Failed to parse LLM response")
    })?;

    validate_questions(&response.questions)?;
    Ok(response.questions)
}

/// Parse the generation payload (`{"prd": "..."}`) into document text
pub fn parse_generation_response(content: &str) -> Result<String, StructuredOutputError> {
    let response: GenerateResponse = serde_json::from_str(content.trim())
        .map_err(|_| StructuredOutputError::new("Failed to parse generation response"))?;

    if response.prd.trim().is_empty() {
        return Err(StructuredOutputError::new("Generated document is empty"));
    }

    Ok(response.prd)
}

/// Validate a question sequence for required fields and unique identifiers
pub fn validate_questions(questions: &[Question]) -> Result<(), StructuredOutputError> {
    let mut seen_ids = HashSet::new();

    for (index, question) in questions.iter().enumerate() {
        if question.id.trim().is_empty() {
            return Err(StructuredOutputError::at(index, "Question ID is required"));
        }

        if !seen_ids.insert(question.id.as_str()) {
            return Err(StructuredOutputError::at(
                index,
                format!("Duplicate question ID '{}'", question.id),
            ));
        }

        if question.prompt.trim().is_empty() {
            return Err(StructuredOutputError::at(
                index,
                format!("Question '{}' has empty text", question.id),
            ));
        }

        if question.options.is_empty() {
            return Err(StructuredOutputError::at(
                index,
                format!("Question '{}' has no options", question.id),
            ));
        }

        let mut seen_values = HashSet::new();
        for option in &question.options {
            if !seen_values.insert(option.value.as_str()) {
                return Err(StructuredOutputError::at(
                    index,
                    format!(
                        "Question '{}' repeats option value '{}'",
                        question.id, option.value
                    ),
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_QUESTIONS: &str = r#"{
        "questions": [
            {
                "id": "q1",
                "category": "auth",
                "question": "How should users log in?",
                "options": [
                    {"label": "Email magic link", "value": "magic_link"},
                    {"label": "Google OAuth", "value": "google"}
                ]
            },
            {
                "id": "q2",
                "category": "ui_layout",
                "question": "Which navigation pattern?",
                "options": [
                    {"label": "Sidebar", "value": "sidebar"},
                    {"label": "Top bar", "value": "topbar"}
                ]
            }
        ]
    }"#;

    #[test]
    fn test_parse_plain_json() {
        let questions = parse_analysis_response(TWO_QUESTIONS).unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].id, "q1");
        assert_eq!(questions[1].options[0].value, "sidebar");
    }

    #[test]
    fn test_parse_fenced_json() {
        let fenced = format!("```json\n{}\n```", TWO_QUESTIONS);
        let questions = parse_analysis_response(&fenced).unwrap();
        assert_eq!(questions.len(), 2);

        let bare_fence = format!("```\n{}\n```", TWO_QUESTIONS);
        assert_eq!(parse_analysis_response(&bare_fence).unwrap().len(), 2);
    }

    #[test]
    fn test_strip_code_fence_leaves_plain_text() {
        assert_eq!(strip_code_fence("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn test_parse_garbage() {
        let err = parse_analysis_response("Sure! Here are your questions").unwrap_err();
        assert_eq!(err.message, "Failed to parse LLM response");
        assert_eq!(err.item_index, None);
    }

    #[test]
    fn test_missing_questions_key_is_empty() {
        assert!(parse_analysis_response("{}").unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_question_ids() {
        let json = r#"{"questions": [
            {"id": "q1", "category": "auth", "question": "A?", "options": [{"label": "x", "value": "x"}]},
            {"id": "q1", "category": "auth", "question": "B?", "options": [{"label": "y", "value": "y"}]}
        ]}"#;
        let err = parse_analysis_response(json).unwrap_err();
        assert_eq!(err.item_index, Some(1));
        assert!(err.to_string().starts_with("Question 1:"));
    }

    #[test]
    fn test_question_without_options() {
        let json = r#"{"questions": [
            {"id": "q1", "category": "auth", "question": "A?", "options": []}
        ]}"#;
        let err = parse_analysis_response(json).unwrap_err();
        assert!(err.message.contains("no options"));
    }

    #[test]
    fn test_parse_generation_response() {
        let prd = parse_generation_response(r##"{"prd": "# Todo App PRD\n..."}"##).unwrap();
        assert!(prd.starts_with("# Todo App PRD"));

        assert!(parse_generation_response(r#"{"prd": "  "}"#).is_err());
        assert!(parse_generation_response("not json").is_err());
    }
}
