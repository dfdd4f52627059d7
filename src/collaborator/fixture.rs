// Offline collaborator backed by a JSON fixture

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use super::{PrdService, ServiceError, ServiceErrorKind};
use crate::models::Question;
use crate::parsers::{parse_analysis_response, parse_generation_response, StructuredOutputError};
use crate::prd_workflow::answers::format_answer_lines;

const BUILTIN_FIXTURE: &str = include_str!("default_fixture.json");

/// Serves canned questions and a document template.
///
/// The fixture has the same shape as the collaborator responses merged into one
/// object: `{"questions": [...], "prd": "..."}`. The `prd` text may contain
/// `{idea}` and `{answers}` placeholders.
#[derive(Debug, Clone)]
pub struct FixtureService {
    questions: Vec<Question>,
    prd_template: String,
    latency: Duration,
}

impl FixtureService {
    pub fn new(questions: Vec<Question>, prd_template: impl Into<String>) -> Self {
        Self {
            questions,
            prd_template: prd_template.into(),
            latency: Duration::ZERO,
        }
    }

    /// Parse a fixture document
    pub fn from_json(content: &str) -> Result<Self, StructuredOutputError> {
        let questions = parse_analysis_response(content)?;
        let prd_template = parse_generation_response(content)?;
        Ok(Self::new(questions, prd_template))
    }

    /// Load a fixture from disk
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read fixture '{}': {}", path.display(), e))?;
        Self::from_json(&content)
            .map_err(|e| anyhow!("Invalid fixture '{}': {}", path.display(), e))
    }

    /// The fixture compiled into the binary
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_FIXTURE).map_err(|e| anyhow!("Invalid built-in fixture: {}", e))
    }

    /// Delay every call by `latency` to mimic a remote service
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    fn render_document(&self, idea: &str, answers: &HashMap<String, String>) -> String {
        self.prd_template
            .replace("{idea}", idea.trim())
            .replace("{answers}", &format_answer_lines(&self.questions, answers))
    }
}

impl PrdService for FixtureService {
    async fn analyze_idea(&self, idea: String) -> Result<Vec<Question>, ServiceError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if idea.trim().is_empty() {
            return Err(ServiceError::new(
                ServiceErrorKind::Validation,
                "Idea cannot be empty",
            ));
        }

        log::debug!("Fixture analysis returning {} questions", self.questions.len());
        Ok(self.questions.clone())
    }

    async fn generate_document(
        &self,
        idea: String,
        answers: HashMap<String, String>,
    ) -> Result<String, ServiceError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        Ok(self.render_document(&idea, &answers))
    }
}
