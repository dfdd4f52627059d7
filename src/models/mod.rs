// Data models shared by the workflow, the collaborators, and the host view

pub mod state_machine;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::parsers::markdown::{render, RenderNode};

/// One selectable answer for a clarifying question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOption {
    /// Value recorded in the answer set when selected
    pub value: String,
    /// Human-readable option text
    pub label: String,
}

impl QuestionOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// A clarifying question produced by the analysis collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Opaque identifier, unique within one question sequence
    pub id: String,
    /// Category tag (see [`QuestionCategory`])
    pub category: String,
    /// The question text to display
    #[serde(rename = "question", alias = "prompt")]
    pub prompt: String,
    /// Ordered list of options
    pub options: Vec<QuestionOption>,
}

impl Question {
    /// Resolve the category tag into a known category
    pub fn category(&self) -> QuestionCategory {
        QuestionCategory::from_tag(&self.category)
    }

    /// Whether `value` is one of this question's options
    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|o| o.value == value)
    }

    /// Label of the option with the given value, if any
    pub fn option_label(&self, value: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.value == value)
            .map(|o| o.label.as_str())
    }
}

/// Known question categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionCategory {
    Auth,
    DataComplexity,
    UiLayout,
    UiComponents,
    Features,
    EdgeCases,
    Integrations,
    /// Any tag not in the list above
    Other,
}

impl QuestionCategory {
    /// Returns all named categories (excludes the fallback)
    pub fn all() -> &'static [QuestionCategory] {
        &[
            QuestionCategory::Auth,
            QuestionCategory::DataComplexity,
            QuestionCategory::UiLayout,
            QuestionCategory::UiComponents,
            QuestionCategory::Features,
            QuestionCategory::EdgeCases,
            QuestionCategory::Integrations,
        ]
    }

    /// Map a wire tag to a category, falling back to `Other`
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "auth" => QuestionCategory::Auth,
            "data_complexity" => QuestionCategory::DataComplexity,
            "ui_layout" => QuestionCategory::UiLayout,
            "ui_components" => QuestionCategory::UiComponents,
            "features" => QuestionCategory::Features,
            "edge_cases" => QuestionCategory::EdgeCases,
            "integrations" => QuestionCategory::Integrations,
            _ => QuestionCategory::Other,
        }
    }

    /// Returns the wire tag for this category
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionCategory::Auth => "auth",
            QuestionCategory::DataComplexity => "data_complexity",
            QuestionCategory::UiLayout => "ui_layout",
            QuestionCategory::UiComponents => "ui_components",
            QuestionCategory::Features => "features",
            QuestionCategory::EdgeCases => "edge_cases",
            QuestionCategory::Integrations => "integrations",
            QuestionCategory::Other => "other",
        }
    }

    /// Get the display label for this category
    pub fn label(&self) -> &'static str {
        match self {
            QuestionCategory::Auth => "Authentication",
            QuestionCategory::DataComplexity => "Data Architecture",
            QuestionCategory::UiLayout => "UI Layout",
            QuestionCategory::UiComponents => "UI Components",
            QuestionCategory::Features => "Core Features",
            QuestionCategory::EdgeCases => "Edge Cases",
            QuestionCategory::Integrations => "Integrations",
            QuestionCategory::Other => "General",
        }
    }

    /// Get the icon shown next to questions in this category
    pub fn icon(&self) -> &'static str {
        match self {
            QuestionCategory::Auth => "🔐",
            QuestionCategory::DataComplexity => "🗄",
            QuestionCategory::UiLayout => "🧭",
            QuestionCategory::UiComponents => "🧩",
            QuestionCategory::Features => "✨",
            QuestionCategory::EdgeCases => "⚠",
            QuestionCategory::Integrations => "🔌",
            QuestionCategory::Other => "❓",
        }
    }
}

/// The generated requirements document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Raw markdown returned by the generation collaborator
    pub content: String,
    /// Render nodes derived from `content`
    pub nodes: Vec<RenderNode>,
    pub generated_at: DateTime<Utc>,
}

impl Document {
    /// Build a document from raw markdown, rendering it once
    pub fn new(content: String) -> Self {
        let nodes = render(&content);
        Self {
            content,
            nodes,
            generated_at: Utc::now(),
        }
    }

    /// Text of the first level-1 heading, used as the document title
    pub fn title(&self) -> Option<&str> {
        self.nodes.iter().find_map(|node| match node {
            RenderNode::Heading { level: 1, text } => Some(text.as_str()),
            _ => None,
        })
    }
}
