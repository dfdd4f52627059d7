//! Answer set for the clarifying questions
//!
//! One selected option value per question id. Completeness is a count check,
//! not an id-coverage check: `is_complete(n)` is true when exactly `n` entries
//! exist, whichever ids they belong to. The workflow keeps keys within the
//! current question sequence, which makes the two equivalent there.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::Question;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet {
    entries: HashMap<String, String>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` for `question_id`, replacing any previous selection
    pub fn set(&mut self, question_id: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(question_id.into(), value.into());
    }

    pub fn get(&self, question_id: &str) -> Option<&str> {
        self.entries.get(question_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fraction of `total_questions` answered, in `0.0..=1.0`.
    /// An empty question list counts as fully answered, matching `is_complete(0)`.
    pub fn completion_ratio(&self, total_questions: usize) -> f64 {
        if total_questions == 0 {
            return 1.0;
        }
        (self.entries.len() as f64 / total_questions as f64).min(1.0)
    }

    /// Completion as a whole percentage (0-100)
    pub fn completion_percentage(&self, total_questions: usize) -> u8 {
        (self.completion_ratio(total_questions) * 100.0).round() as u8
    }

    pub fn is_complete(&self, total_questions: usize) -> bool {
        self.entries.len() == total_questions
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Copy of the underlying mapping, as sent to the generation collaborator
    pub fn to_map(&self) -> HashMap<String, String> {
        self.entries.clone()
    }

    /// Questions from `questions` that have no answer yet, in order
    pub fn unanswered<'a>(&self, questions: &'a [Question]) -> Vec<&'a Question> {
        questions
            .iter()
            .filter(|q| !self.entries.contains_key(&q.id))
            .collect()
    }

    /// `- question_id: value` lines in question order
    pub fn summary(&self, questions: &[Question]) -> String {
        format_answer_lines(questions, &self.entries)
    }
}

/// `- question_id: value` lines.
///
/// Answers to `questions` come first in question order; ids outside the
/// sequence follow, sorted.
pub fn format_answer_lines(questions: &[Question], answers: &HashMap<String, String>) -> String {
    let mut lines: Vec<String> = questions
        .iter()
        .filter_map(|q| answers.get(&q.id).map(|v| format!("- {}: {}", q.id, v)))
        .collect();

    let mut extra: Vec<&String> = answers
        .keys()
        .filter(|k| !questions.iter().any(|q| &q.id == *k))
        .collect();
    extra.sort();
    lines.extend(extra.into_iter().map(|k| format!("- {}: {}", k, answers[k])));

    lines.join("\n")
}
