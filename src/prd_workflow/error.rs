// Workflow error taxonomy

use thiserror::Error;

use super::state::WorkflowPhase;
use crate::clipboard::CopyError;
use crate::collaborator::ServiceError;
use crate::models::state_machine::PhaseTransitionError;

/// Input problems caught before any collaborator call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter your idea")]
    EmptyIdea,

    #[error("Please answer all questions ({answered}/{total} answered)")]
    IncompleteAnswers { answered: usize, total: usize },

    #[error("Unknown question '{0}'")]
    UnknownQuestion(String),

    #[error("'{value}' is not an option for question '{question_id}'")]
    UnknownOption { question_id: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Analysis failed: {0}")]
    Analysis(ServiceError),

    #[error("Generation failed: {0}")]
    Generation(ServiceError),

    #[error(transparent)]
    Copy(#[from] CopyError),

    #[error(transparent)]
    Transition(#[from] PhaseTransitionError),

    #[error("Action not available in the {0:?} phase")]
    WrongPhase(WorkflowPhase),

    #[error("A request is already in progress")]
    Busy,

    #[error("Workflow runtime has stopped")]
    Closed,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl WorkflowError {
    pub fn is_validation(&self) -> bool {
        matches!(self, WorkflowError::Validation(_))
    }
}
