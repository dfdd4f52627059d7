//! Interview workflow state
//!
//! Defines the phases and the read-only snapshot handed to host views.

use serde::{Deserialize, Serialize};

use super::answers::AnswerSet;
use crate::models::Question;
use crate::parsers::RenderNode;

/// Workflow phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowPhase {
    /// Free-text idea capture
    Idea,
    /// Time-boxed clarifying questions
    Questioning,
    /// Waiting on the generation collaborator
    Generating,
    /// Generated document on display
    Result,
}

impl WorkflowPhase {
    /// Get all phases in order
    pub fn all() -> &'static [WorkflowPhase] {
        &[
            WorkflowPhase::Idea,
            WorkflowPhase::Questioning,
            WorkflowPhase::Generating,
            WorkflowPhase::Result,
        ]
    }

    /// Get the display name for this phase
    pub fn display_name(&self) -> &'static str {
        match self {
            WorkflowPhase::Idea => "Your Idea",
            WorkflowPhase::Questioning => "Clarifying Questions",
            WorkflowPhase::Generating => "Generating",
            WorkflowPhase::Result => "Your PRD",
        }
    }

    /// Get the phase index (0-based), used for step indicators
    pub fn index(&self) -> usize {
        match self {
            WorkflowPhase::Idea => 0,
            WorkflowPhase::Questioning => 1,
            WorkflowPhase::Generating => 2,
            WorkflowPhase::Result => 3,
        }
    }
}

impl Default for WorkflowPhase {
    fn default() -> Self {
        WorkflowPhase::Idea
    }
}

/// Which collaborator call is outstanding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Analysis,
    Generation,
}

/// Everything a host view needs to draw the current step
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSnapshot {
    pub session_id: String,
    pub phase: WorkflowPhase,
    pub idea: String,
    pub questions: Vec<Question>,
    pub answers: AnswerSet,
    pub completion_percentage: u8,
    /// Whether the submit-answers action is enabled
    pub can_generate: bool,
    /// Set while a collaborator call is outstanding; submit actions are disabled
    pub pending: Option<RequestKind>,
    pub countdown_remaining: u32,
    pub countdown_expired: bool,
    pub current_tip: Option<String>,
    pub document: Option<String>,
    pub document_nodes: Vec<RenderNode>,
}

impl WorkflowSnapshot {
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_phase_is_idea() {
        assert_eq!(WorkflowPhase::default(), WorkflowPhase::Idea);
    }

    #[test]
    fn test_phase_indices_follow_order() {
        for (i, phase) in WorkflowPhase::all().iter().enumerate() {
            assert_eq!(phase.index(), i);
        }
    }

    #[test]
    fn test_phase_serialization() {
        let json = serde_json::to_string(&WorkflowPhase::Questioning).unwrap();
        assert_eq!(json, "\"questioning\"");
        let phase: WorkflowPhase = serde_json::from_str("\"result\"").unwrap();
        assert_eq!(phase, WorkflowPhase::Result);
    }
}
