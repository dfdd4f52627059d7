//! Interview workflow state machine
//!
//! All mutation goes through the handlers on [`WorkflowMachine`]. Each handler
//! runs to completion; collaborator calls are issued by the caller from the
//! returned request and their results come back through `complete_*` with the
//! ticket they were issued under. A result whose ticket is no longer pending is
//! dropped without touching state.

use std::collections::HashMap;
use std::sync::Arc;

use super::answers::AnswerSet;
use super::error::{ValidationError, WorkflowError};
use super::state::{RequestKind, WorkflowPhase, WorkflowSnapshot};
use crate::clipboard::{copy_with_fallback, ClipboardBackend, MANUAL_COPY_MESSAGE};
use crate::collaborator::{ServiceError, ANALYSIS_FALLBACK_MESSAGE, GENERATION_FALLBACK_MESSAGE};
use crate::config::loader::validate_config;
use crate::config::ClearPrdConfig;
use crate::events::{
    CountdownTickPayload, DocumentReadyPayload, EventBroadcaster, Notification,
    PhaseChangedPayload, TipRotatedPayload, EVENT_COUNTDOWN_EXPIRED, EVENT_COUNTDOWN_TICK,
    EVENT_DOCUMENT_READY, EVENT_PHASE_CHANGED, EVENT_TIP_ROTATED,
};
use crate::models::state_machine::{owns_countdown, owns_tip_rotation, transition_phase};
use crate::models::{Document, Question};
use crate::timers::{CountdownTick, CountdownTimer, TickSender, TimerTick, TipRotator};

/// Analysis call to issue after a successful `submit_idea`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub ticket: u64,
    pub idea: String,
}

/// Generation call to issue after a successful `submit_answers`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub ticket: u64,
    pub idea: String,
    pub answers: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy)]
struct PendingRequest {
    ticket: u64,
    kind: RequestKind,
}

pub struct WorkflowMachine {
    session_id: String,
    budget_secs: u32,
    phase: WorkflowPhase,
    idea: String,
    questions: Vec<Question>,
    answers: AnswerSet,
    document: Option<Document>,
    countdown: CountdownTimer,
    tips: TipRotator,
    pending: Option<PendingRequest>,
    next_ticket: u64,
    events: Arc<EventBroadcaster>,
    ticks: Option<TickSender>,
}

impl WorkflowMachine {
    /// Create a machine in the `Idea` phase.
    ///
    /// Without a tick sender no timer tasks are spawned; ticks are then
    /// delivered by hand through [`WorkflowMachine::on_tick`]. Zero timer
    /// periods and empty tip lists are rejected.
    pub fn new(config: &ClearPrdConfig, events: Arc<EventBroadcaster>) -> Result<Self, WorkflowError> {
        validate_config(config).map_err(|e| WorkflowError::Config(e.to_string()))?;

        let budget_secs = config.interview.question_budget_secs;
        Ok(Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            budget_secs,
            phase: WorkflowPhase::Idea,
            idea: String::new(),
            questions: Vec::new(),
            answers: AnswerSet::new(),
            document: None,
            countdown: CountdownTimer::new(budget_secs, config.interview.tick_interval()),
            tips: TipRotator::new(config.tips.messages.clone(), config.tips.interval()),
            pending: None,
            next_ticket: 1,
            events,
            ticks: None,
        })
    }

    /// Attach the channel that timer tasks send their ticks to
    pub fn with_ticks(mut self, ticks: TickSender) -> Self {
        self.ticks = Some(ticks);
        self
    }

    // Accessors

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn phase(&self) -> WorkflowPhase {
        self.phase
    }

    pub fn idea(&self) -> &str {
        &self.idea
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn countdown(&self) -> &CountdownTimer {
        &self.countdown
    }

    pub fn tips(&self) -> &TipRotator {
        &self.tips
    }

    pub fn events(&self) -> &Arc<EventBroadcaster> {
        &self.events
    }

    pub fn pending(&self) -> Option<RequestKind> {
        self.pending.map(|p| p.kind)
    }

    /// Whether the submit-answers action should be enabled
    pub fn can_submit_answers(&self) -> bool {
        self.phase == WorkflowPhase::Questioning
            && self.pending.is_none()
            && self.answers.is_complete(self.questions.len())
    }

    // Idea phase

    /// Replace the idea text. Only allowed before the analysis call is made.
    pub fn set_idea(&mut self, idea: impl Into<String>) -> Result<(), WorkflowError> {
        self.require_phase(WorkflowPhase::Idea)?;
        self.require_idle()?;
        self.idea = idea.into();
        Ok(())
    }

    /// Validate the idea and hand back the analysis call to make
    pub fn submit_idea(&mut self) -> Result<AnalysisRequest, WorkflowError> {
        self.require_phase(WorkflowPhase::Idea)?;
        self.require_idle()?;

        if self.idea.trim().is_empty() {
            return Err(self.reject(ValidationError::EmptyIdea));
        }

        let ticket = self.issue(RequestKind::Analysis);
        log::info!("[Workflow] Analyzing idea (ticket {})", ticket);

        Ok(AnalysisRequest {
            ticket,
            idea: self.idea.trim().to_string(),
        })
    }

    /// Apply a settled analysis call. Returns `Ok(false)` when the result was stale.
    pub fn complete_analysis(
        &mut self,
        ticket: u64,
        result: Result<Vec<Question>, ServiceError>,
    ) -> Result<bool, WorkflowError> {
        if !self.settle(ticket, RequestKind::Analysis) {
            return Ok(false);
        }

        match result {
            Ok(questions) => {
                log::info!("[Workflow] Analysis returned {} questions", questions.len());
                self.enter(WorkflowPhase::Questioning)?;
                self.questions = questions;
                self.answers.reset();
                Ok(true)
            }
            Err(e) => {
                log::warn!("[Workflow] Analysis failed: {}", e);
                self.events
                    .notify(Notification::error(e.user_message(ANALYSIS_FALLBACK_MESSAGE)));
                Err(WorkflowError::Analysis(e))
            }
        }
    }

    // Questioning phase

    /// Record the selected option for a question
    pub fn select_answer(&mut self, question_id: &str, value: &str) -> Result<(), WorkflowError> {
        self.require_phase(WorkflowPhase::Questioning)?;

        let question = self
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .ok_or_else(|| ValidationError::UnknownQuestion(question_id.to_string()))?;

        if !question.has_option(value) {
            return Err(ValidationError::UnknownOption {
                question_id: question_id.to_string(),
                value: value.to_string(),
            }
            .into());
        }

        self.answers.set(question_id, value);
        log::debug!(
            "[Workflow] Answered {} ({}/{})",
            question_id,
            self.answers.len(),
            self.questions.len()
        );
        Ok(())
    }

    /// Return to idea editing. Questions and answers stay until a new analysis succeeds.
    pub fn back(&mut self) -> Result<(), WorkflowError> {
        self.require_phase(WorkflowPhase::Questioning)?;
        self.enter(WorkflowPhase::Idea)
    }

    /// Check completeness and hand back the generation call to make
    pub fn submit_answers(&mut self) -> Result<GenerationRequest, WorkflowError> {
        self.require_phase(WorkflowPhase::Questioning)?;
        self.require_idle()?;

        let total = self.questions.len();
        if !self.answers.is_complete(total) {
            return Err(self.reject(ValidationError::IncompleteAnswers {
                answered: self.answers.len(),
                total,
            }));
        }

        self.enter(WorkflowPhase::Generating)?;
        let ticket = self.issue(RequestKind::Generation);
        log::info!("[Workflow] Generating document (ticket {})", ticket);

        Ok(GenerationRequest {
            ticket,
            idea: self.idea.trim().to_string(),
            answers: self.answers.to_map(),
        })
    }

    // Generating phase

    /// Apply a settled generation call. Returns `Ok(false)` when the result was stale.
    pub fn complete_generation(
        &mut self,
        ticket: u64,
        result: Result<String, ServiceError>,
    ) -> Result<bool, WorkflowError> {
        if !self.settle(ticket, RequestKind::Generation) {
            return Ok(false);
        }

        match result {
            Ok(content) => {
                self.enter(WorkflowPhase::Result)?;
                let document = Document::new(content);
                log::info!(
                    "[Workflow] Document ready ({} nodes)",
                    document.nodes.len()
                );

                self.events.broadcast(
                    EVENT_DOCUMENT_READY,
                    DocumentReadyPayload {
                        session_id: self.session_id.clone(),
                        title: document.title().map(str::to_string),
                        node_count: document.nodes.len(),
                    },
                );
                self.events
                    .notify(Notification::success("PRD generated successfully!"));
                self.document = Some(document);
                Ok(true)
            }
            Err(e) => {
                log::warn!("[Workflow] Generation failed: {}", e);
                self.enter(WorkflowPhase::Questioning)?;
                self.events
                    .notify(Notification::error(e.user_message(GENERATION_FALLBACK_MESSAGE)));
                Err(WorkflowError::Generation(e))
            }
        }
    }

    /// Abandon the outstanding collaborator call.
    ///
    /// A pending analysis leaves the machine in `Idea`; a pending generation
    /// returns it to `Questioning` with answers intact. Either way the late
    /// result is discarded when it arrives.
    pub fn cancel(&mut self) -> Result<(), WorkflowError> {
        let Some(pending) = self.pending.take() else {
            return Err(WorkflowError::WrongPhase(self.phase));
        };
        log::info!("[Workflow] Abandoned request {}", pending.ticket);

        if pending.kind == RequestKind::Generation {
            self.enter(WorkflowPhase::Questioning)?;
        }
        self.events.notify(Notification::info("Request cancelled"));
        Ok(())
    }

    // Result phase

    /// Start a new session, clearing everything from the previous one
    pub fn reset(&mut self) -> Result<(), WorkflowError> {
        self.require_phase(WorkflowPhase::Result)?;
        self.enter(WorkflowPhase::Idea)?;

        self.idea.clear();
        self.questions.clear();
        self.answers.reset();
        self.document = None;
        self.pending = None;
        self.session_id = uuid::Uuid::new_v4().to_string();
        log::info!("[Workflow] New session {}", self.session_id);
        Ok(())
    }

    /// Copy the document text, trying `primary` then `fallback`.
    ///
    /// The outcome is always reported as a notification; the phase never changes.
    pub fn copy_document(
        &mut self,
        primary: &mut dyn ClipboardBackend,
        fallback: Option<&mut dyn ClipboardBackend>,
    ) -> Result<&'static str, WorkflowError> {
        self.require_phase(WorkflowPhase::Result)?;
        let content = self
            .document
            .as_ref()
            .map(|d| d.content.as_str())
            .unwrap_or_default();

        match copy_with_fallback(content, primary, fallback) {
            Ok(backend) => {
                log::debug!("[Workflow] Copied document via {}", backend);
                self.events.notify(Notification::success("Copied to clipboard!"));
                Ok(backend)
            }
            Err(e) => {
                log::warn!("[Workflow] Copy failed: {}", e);
                self.events.notify(Notification::error(MANUAL_COPY_MESSAGE));
                Err(e.into())
            }
        }
    }

    // Timers

    /// Apply a timer tick. Returns whether it changed any state.
    pub fn on_tick(&mut self, tick: TimerTick) -> bool {
        match tick {
            TimerTick::Countdown { epoch } => match self.countdown.tick(epoch) {
                CountdownTick::Ignored => false,
                CountdownTick::Remaining(remaining_secs) => {
                    self.events.broadcast(
                        EVENT_COUNTDOWN_TICK,
                        CountdownTickPayload {
                            remaining_secs,
                            expired: false,
                        },
                    );
                    true
                }
                CountdownTick::Expired => {
                    self.events.broadcast(
                        EVENT_COUNTDOWN_TICK,
                        CountdownTickPayload {
                            remaining_secs: 0,
                            expired: true,
                        },
                    );
                    self.events.broadcast(EVENT_COUNTDOWN_EXPIRED, &self.session_id);
                    self.events.notify(Notification::info(
                        "Time's up! Finish your answers when you're ready.",
                    ));
                    true
                }
            },
            TimerTick::Tip { epoch } => {
                if !self.tips.tick(epoch) {
                    return false;
                }
                self.events.broadcast(
                    EVENT_TIP_ROTATED,
                    TipRotatedPayload {
                        index: self.tips.current_index(),
                        tip: self.tips.current_tip().to_string(),
                    },
                );
                true
            }
        }
    }

    /// Stop both timers. Used when the host is shutting down.
    ///
    /// Phase and pending request are left as they were; the call is abandoned
    /// with the runtime.
    pub fn shutdown(&mut self) {
        self.countdown.stop();
        self.tips.stop();
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        let total = self.questions.len();
        let in_questioning = self.phase == WorkflowPhase::Questioning;

        WorkflowSnapshot {
            session_id: self.session_id.clone(),
            phase: self.phase,
            idea: self.idea.clone(),
            questions: self.questions.clone(),
            answers: self.answers.clone(),
            completion_percentage: self.answers.completion_percentage(total),
            can_generate: self.can_submit_answers(),
            pending: self.pending(),
            countdown_remaining: self.countdown.remaining(),
            countdown_expired: in_questioning && self.countdown.is_expired(),
            current_tip: (self.phase == WorkflowPhase::Generating)
                .then(|| self.tips.current_tip().to_string()),
            document: self.document.as_ref().map(|d| d.content.clone()),
            document_nodes: self
                .document
                .as_ref()
                .map(|d| d.nodes.clone())
                .unwrap_or_default(),
        }
    }

    // Internals

    /// Move to `target`. Timers owned by the old phase stop before anything else.
    fn enter(&mut self, target: WorkflowPhase) -> Result<(), WorkflowError> {
        let old = self.phase;
        transition_phase(old, target)?;

        if owns_countdown(old) {
            self.countdown.stop();
        }
        if owns_tip_rotation(old) {
            self.tips.stop();
        }

        self.phase = target;

        if owns_countdown(target) {
            self.countdown.start(self.budget_secs, self.ticks.as_ref());
        }
        if owns_tip_rotation(target) {
            self.tips.start(self.ticks.as_ref());
        }

        log::info!("[Workflow] Phase {:?} -> {:?}", old, target);
        self.events.broadcast(
            EVENT_PHASE_CHANGED,
            PhaseChangedPayload {
                session_id: self.session_id.clone(),
                old_phase: old,
                new_phase: target,
            },
        );
        Ok(())
    }

    fn issue(&mut self, kind: RequestKind) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.pending = Some(PendingRequest { ticket, kind });
        ticket
    }

    /// Clear the pending request if `ticket` matches it
    fn settle(&mut self, ticket: u64, kind: RequestKind) -> bool {
        match self.pending {
            Some(p) if p.ticket == ticket && p.kind == kind => {
                self.pending = None;
                true
            }
            _ => {
                log::debug!("[Workflow] Discarding stale {:?} result (ticket {})", kind, ticket);
                false
            }
        }
    }

    fn reject(&self, error: ValidationError) -> WorkflowError {
        self.events.notify(Notification::error(error.to_string()));
        error.into()
    }

    fn require_phase(&self, phase: WorkflowPhase) -> Result<(), WorkflowError> {
        if self.phase != phase {
            return Err(WorkflowError::WrongPhase(self.phase));
        }
        Ok(())
    }

    fn require_idle(&self) -> Result<(), WorkflowError> {
        if self.pending.is_some() {
            return Err(WorkflowError::Busy);
        }
        Ok(())
    }
}
