//! PRD Workflow Module - Guided interview from idea to requirements document
//!
//! ## Workflow Phases
//!
//! 1. **Idea** - Free-text product idea, sent to the analysis collaborator
//! 2. **Questioning** - Multiple-choice clarifying questions under a countdown
//! 3. **Generating** - Waiting on the generation collaborator while tips rotate
//! 4. **Result** - Rendered document with a copy action
//!
//! ## Layout
//!
//! - [`WorkflowMachine`] holds all session state and validates every transition.
//!   It is synchronous and never awaits.
//! - [`WorkflowRuntime`] drives a machine from an async loop: host commands,
//!   timer ticks and collaborator results are applied one at a time.
//! - Hosts observe [`WorkflowSnapshot`]s and subscribe to events through
//!   [`WorkflowHandle`].

pub mod answers;
pub mod error;
pub mod machine;
pub mod runtime;
pub mod state;


// Re-export main types
pub use answers::{format_answer_lines, AnswerSet};
pub use error::{ValidationError, WorkflowError};
pub use machine::{AnalysisRequest, GenerationRequest, WorkflowMachine};
pub use runtime::{WorkflowCommand, WorkflowHandle, WorkflowRuntime};
pub use state::{RequestKind, WorkflowPhase, WorkflowSnapshot};
