//! Collaborator contract for question analysis and document generation
//!
//! The workflow never talks to a transport directly. Hosts supply a
//! [`PrdService`]; the workflow runtime calls it and feeds the settled result
//! back into the state machine.

pub mod fixture;

pub use fixture::FixtureService;

use serde::Deserialize;
use std::collections::HashMap;
use std::future::Future;
use thiserror::Error;

use crate::models::Question;

/// Message shown when an analysis failure carries no detail
pub const ANALYSIS_FALLBACK_MESSAGE: &str = "Failed to analyze your idea. Please try again.";
/// Message shown when a generation failure carries no detail
pub const GENERATION_FALLBACK_MESSAGE: &str = "Failed to generate PRD. Please try again.";

/// Where a collaborator call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    /// The collaborator could not be reached
    Network,
    /// The collaborator rejected the request
    Validation,
    /// The collaborator failed while handling the request
    Service,
}

impl std::fmt::Display for ServiceErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ServiceErrorKind::Network => "network",
            ServiceErrorKind::Validation => "validation",
            ServiceErrorKind::Service => "service",
        };
        write!(f, "{}", name)
    }
}

/// A failed collaborator call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} error: {}", .detail.as_deref().unwrap_or("no detail"))]
pub struct ServiceError {
    pub kind: ServiceErrorKind,
    /// Server-provided message, shown to the user verbatim
    pub detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl ServiceError {
    pub fn new(kind: ServiceErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: Some(detail.into()),
        }
    }

    pub fn without_detail(kind: ServiceErrorKind) -> Self {
        Self { kind, detail: None }
    }

    pub fn network(detail: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Network, detail)
    }

    pub fn service(detail: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Service, detail)
    }

    /// Build an error from a non-success response.
    ///
    /// A `{"detail": "..."}` body supplies the user-facing message; 4xx statuses
    /// are validation failures, everything else is a service failure.
    pub fn from_response(status: u16, body: &str) -> Self {
        let kind = if (400..500).contains(&status) {
            ServiceErrorKind::Validation
        } else {
            ServiceErrorKind::Service
        };

        let detail = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| match b.detail {
                serde_json::Value::String(s) => Some(s).filter(|s| !s.trim().is_empty()),
                serde_json::Value::Null => None,
                // Validation errors arrive as a list of field problems
                other => Some(other.to_string()),
            });

        Self { kind, detail }
    }

    /// The message to show the user
    pub fn user_message(&self, fallback: &str) -> String {
        match self.detail.as_deref() {
            Some(detail) if !detail.trim().is_empty() => detail.to_string(),
            _ => fallback.to_string(),
        }
    }
}

/// The analysis and generation operations the workflow depends on
pub trait PrdService: Send + Sync + 'static {
    /// Turn an idea into an ordered sequence of clarifying questions
    fn analyze_idea(
        &self,
        idea: String,
    ) -> impl Future<Output = Result<Vec<Question>, ServiceError>> + Send;

    /// Produce the requirements document (markdown) for an idea and its answers
    fn generate_document(
        &self,
        idea: String,
        answers: HashMap<String, String>,
    ) -> impl Future<Output = Result<String, ServiceError>> + Send;
}
