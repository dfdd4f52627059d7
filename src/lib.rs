// Clippy allows for reasonable defaults
// These suppress warnings where the suggested change doesn't improve readability
#![allow(clippy::new_without_default)] // Default not always appropriate for stateful types
#![allow(clippy::derivable_impls)] // Explicit Default impls can be clearer
#![allow(clippy::needless_borrow)] // Explicit borrows can clarify ownership
#![allow(clippy::clone_on_copy)] // .clone() can be clearer than implicit copy
#![allow(clippy::redundant_closure)] // |x| f(x) can be clearer than f
#![allow(clippy::unwrap_or_default)] // unwrap_or_else(Default::default) can be clearer

//! ClearPRD - guided interview that turns a product idea into a requirements document
//!
//! The library owns the interview workflow only. Question analysis and document
//! generation are supplied by a [`collaborator::PrdService`]; display is up to
//! the host, which observes [`prd_workflow::WorkflowSnapshot`]s and
//! [`events::WorkflowEvent`]s.

// Module declarations
pub mod clipboard;
pub mod collaborator;
pub mod config;
pub mod events;
pub mod models;
pub mod parsers;
pub mod prd_workflow;
pub mod timers;

// Re-export the types most hosts need
pub use collaborator::{FixtureService, PrdService, ServiceError};
pub use config::ClearPrdConfig;
pub use events::EventBroadcaster;
pub use models::{Document, Question, QuestionCategory, QuestionOption};
pub use prd_workflow::{WorkflowHandle, WorkflowMachine, WorkflowPhase, WorkflowRuntime};
