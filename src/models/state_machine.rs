// Workflow phase state machine with validation

use crate::prd_workflow::WorkflowPhase;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhaseTransitionError {
    #[error("Invalid phase transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: WorkflowPhase,
        to: WorkflowPhase,
    },
}

/// Validates if the workflow can move from one phase to another
pub fn can_transition(from: WorkflowPhase, to: WorkflowPhase) -> bool {
    match (from, to) {
        // From Idea
        (WorkflowPhase::Idea, WorkflowPhase::Questioning) => true,

        // From Questioning
        (WorkflowPhase::Questioning, WorkflowPhase::Idea) => true, // Back
        (WorkflowPhase::Questioning, WorkflowPhase::Generating) => true,

        // From Generating
        (WorkflowPhase::Generating, WorkflowPhase::Result) => true,
        (WorkflowPhase::Generating, WorkflowPhase::Questioning) => true, // Generation failed

        // From Result - only a new session
        (WorkflowPhase::Result, WorkflowPhase::Idea) => true,

        _ => false,
    }
}

/// Validates and performs a phase transition
pub fn transition_phase(
    current: WorkflowPhase,
    target: WorkflowPhase,
) -> Result<WorkflowPhase, PhaseTransitionError> {
    if !can_transition(current, target) {
        return Err(PhaseTransitionError::InvalidTransition {
            from: current,
            to: target,
        });
    }

    Ok(target)
}

/// Check if a phase owns the countdown timer
pub fn owns_countdown(phase: WorkflowPhase) -> bool {
    matches!(phase, WorkflowPhase::Questioning)
}

/// Check if a phase owns the tip rotation
pub fn owns_tip_rotation(phase: WorkflowPhase) -> bool {
    matches!(phase, WorkflowPhase::Generating)
}

/// Get all valid next phases from the current phase
pub fn valid_next_phases(current: WorkflowPhase) -> Vec<WorkflowPhase> {
    WorkflowPhase::all()
        .iter()
        .copied()
        .filter(|&phase| can_transition(current, phase))
        .collect()
}
