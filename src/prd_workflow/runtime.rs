//! Async driver for the workflow machine
//!
//! [`WorkflowRuntime::run`] owns the machine and serializes everything that can
//! change it: host commands, timer ticks and settled collaborator calls. Calls
//! run on spawned tasks so the loop keeps processing ticks while they are in
//! flight. Hosts hold a cloneable [`WorkflowHandle`].

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

use super::error::WorkflowError;
use super::machine::{AnalysisRequest, GenerationRequest, WorkflowMachine};
use super::state::{WorkflowPhase, WorkflowSnapshot};
use crate::clipboard::{ClipboardBackend, Osc52Clipboard, SystemClipboard};
use crate::collaborator::{PrdService, ServiceError};
use crate::config::ClearPrdConfig;
use crate::events::{EventBroadcaster, WorkflowEvent};
use crate::models::Question;
use crate::timers::TimerTick;

const COMMAND_BUFFER: usize = 32;

/// Actions a host can request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowCommand {
    SetIdea(String),
    SubmitIdea,
    SelectAnswer { question_id: String, value: String },
    Back,
    SubmitAnswers,
    Cancel,
    Reset,
    CopyDocument,
    Shutdown,
}

struct Envelope {
    command: WorkflowCommand,
    reply: oneshot::Sender<Result<(), WorkflowError>>,
}

enum Settled {
    Analysis {
        ticket: u64,
        result: Result<Vec<Question>, ServiceError>,
    },
    Generation {
        ticket: u64,
        result: Result<String, ServiceError>,
    },
}

type Backend = Box<dyn ClipboardBackend + Send>;

pub struct WorkflowRuntime<S: PrdService> {
    machine: WorkflowMachine,
    service: Arc<S>,
    commands: mpsc::Receiver<Envelope>,
    ticks: mpsc::UnboundedReceiver<TimerTick>,
    settled_tx: mpsc::UnboundedSender<Settled>,
    settled_rx: mpsc::UnboundedReceiver<Settled>,
    snapshots: watch::Sender<WorkflowSnapshot>,
    primary_clipboard: Backend,
    fallback_clipboard: Option<Backend>,
    stop_on_interrupt: bool,
}

impl<S: PrdService> WorkflowRuntime<S> {
    /// Build a runtime and the handle that drives it.
    ///
    /// Must be called inside a Tokio runtime; timer tasks are spawned on it.
    pub fn new(
        config: &ClearPrdConfig,
        service: S,
        events: Arc<EventBroadcaster>,
    ) -> Result<(Self, WorkflowHandle), WorkflowError> {
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
        let (settled_tx, settled_rx) = mpsc::unbounded_channel();

        let machine = WorkflowMachine::new(config, events.clone())?.with_ticks(tick_tx);
        let (snap_tx, snap_rx) = watch::channel(machine.snapshot());

        let fallback_clipboard: Option<Backend> = if config.copy.osc52_fallback {
            Some(Box::new(Osc52Clipboard::stdout()))
        } else {
            None
        };

        let runtime = Self {
            machine,
            service: Arc::new(service),
            commands: cmd_rx,
            ticks: tick_rx,
            settled_tx,
            settled_rx,
            snapshots: snap_tx,
            primary_clipboard: Box::new(SystemClipboard),
            fallback_clipboard,
            stop_on_interrupt: false,
        };

        let handle = WorkflowHandle {
            commands: cmd_tx,
            snapshots: snap_rx,
            events,
        };

        Ok((runtime, handle))
    }

    /// Replace the clipboard backends used by the copy action
    pub fn with_clipboard(mut self, primary: Backend, fallback: Option<Backend>) -> Self {
        self.primary_clipboard = primary;
        self.fallback_clipboard = fallback;
        self
    }

    /// Stop the loop on Ctrl-C
    pub fn with_interrupt_handling(mut self) -> Self {
        self.stop_on_interrupt = true;
        self
    }

    /// Process commands until `Shutdown`, until every handle is dropped, or on interrupt
    pub async fn run(mut self) {
        log::info!("[Runtime] Session {} started", self.machine.session_id());

        let interrupt = tokio::signal::ctrl_c();
        tokio::pin!(interrupt);

        loop {
            tokio::select! {
                envelope = self.commands.recv() => {
                    let Some(Envelope { command, reply }) = envelope else {
                        break;
                    };
                    let stop = command == WorkflowCommand::Shutdown;
                    let result = self.apply(command);
                    self.publish();
                    let _ = reply.send(result);
                    if stop {
                        break;
                    }
                }
                Some(tick) = self.ticks.recv() => {
                    if self.machine.on_tick(tick) {
                        self.publish();
                    }
                }
                Some(settled) = self.settled_rx.recv() => {
                    self.settle(settled);
                    self.publish();
                }
                _ = &mut interrupt, if self.stop_on_interrupt => {
                    log::info!("[Runtime] Interrupted");
                    break;
                }
            }
        }

        self.machine.shutdown();
        self.publish();
        log::info!("[Runtime] Stopped");
    }

    fn apply(&mut self, command: WorkflowCommand) -> Result<(), WorkflowError> {
        log::debug!("[Runtime] Command {:?}", command);

        match command {
            WorkflowCommand::SetIdea(idea) => self.machine.set_idea(idea),
            WorkflowCommand::SubmitIdea => {
                let request = self.machine.submit_idea()?;
                self.spawn_analysis(request);
                Ok(())
            }
            WorkflowCommand::SelectAnswer { question_id, value } => {
                self.machine.select_answer(&question_id, &value)
            }
            WorkflowCommand::Back => self.machine.back(),
            WorkflowCommand::SubmitAnswers => {
                let request = self.machine.submit_answers()?;
                self.spawn_generation(request);
                Ok(())
            }
            WorkflowCommand::Cancel => self.machine.cancel(),
            WorkflowCommand::Reset => self.machine.reset(),
            WorkflowCommand::CopyDocument => {
                let fallback = self
                    .fallback_clipboard
                    .as_deref_mut()
                    .map(|b| b as &mut dyn ClipboardBackend);
                self.machine
                    .copy_document(self.primary_clipboard.as_mut(), fallback)
                    .map(|_| ())
            }
            WorkflowCommand::Shutdown => Ok(()),
        }
    }

    fn settle(&mut self, settled: Settled) {
        let outcome = match settled {
            Settled::Analysis { ticket, result } => self.machine.complete_analysis(ticket, result),
            Settled::Generation { ticket, result } => {
                self.machine.complete_generation(ticket, result)
            }
        };

        // Failures were already reported as notifications
        if let Err(e) = outcome {
            log::debug!("[Runtime] Request settled with error: {}", e);
        }
    }

    fn spawn_analysis(&self, request: AnalysisRequest) {
        let service = self.service.clone();
        let tx = self.settled_tx.clone();
        tokio::spawn(async move {
            let result = service.analyze_idea(request.idea).await;
            let _ = tx.send(Settled::Analysis {
                ticket: request.ticket,
                result,
            });
        });
    }

    fn spawn_generation(&self, request: GenerationRequest) {
        let service = self.service.clone();
        let tx = self.settled_tx.clone();
        tokio::spawn(async move {
            let result = service
                .generate_document(request.idea, request.answers)
                .await;
            let _ = tx.send(Settled::Generation {
                ticket: request.ticket,
                result,
            });
        });
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.machine.snapshot());
    }
}

/// Cloneable host-side handle to a running workflow
#[derive(Clone)]
pub struct WorkflowHandle {
    commands: mpsc::Sender<Envelope>,
    snapshots: watch::Receiver<WorkflowSnapshot>,
    events: Arc<EventBroadcaster>,
}

impl WorkflowHandle {
    /// Send a command and wait for the machine to apply it
    pub async fn send(&self, command: WorkflowCommand) -> Result<(), WorkflowError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Envelope { command, reply })
            .await
            .map_err(|_| WorkflowError::Closed)?;
        rx.await.map_err(|_| WorkflowError::Closed)?
    }

    /// Set the idea and submit it for analysis
    pub async fn submit_idea(&self, idea: impl Into<String>) -> Result<(), WorkflowError> {
        self.send(WorkflowCommand::SetIdea(idea.into())).await?;
        self.send(WorkflowCommand::SubmitIdea).await
    }

    pub async fn select_answer(
        &self,
        question_id: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), WorkflowError> {
        self.send(WorkflowCommand::SelectAnswer {
            question_id: question_id.into(),
            value: value.into(),
        })
        .await
    }

    pub async fn back(&self) -> Result<(), WorkflowError> {
        self.send(WorkflowCommand::Back).await
    }

    pub async fn submit_answers(&self) -> Result<(), WorkflowError> {
        self.send(WorkflowCommand::SubmitAnswers).await
    }

    pub async fn cancel(&self) -> Result<(), WorkflowError> {
        self.send(WorkflowCommand::Cancel).await
    }

    pub async fn reset(&self) -> Result<(), WorkflowError> {
        self.send(WorkflowCommand::Reset).await
    }

    pub async fn copy_document(&self) -> Result<(), WorkflowError> {
        self.send(WorkflowCommand::CopyDocument).await
    }

    pub async fn shutdown(&self) -> Result<(), WorkflowError> {
        self.send(WorkflowCommand::Shutdown).await
    }

    /// Resolves once the runtime has stopped
    pub async fn closed(&self) {
        self.commands.closed().await
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> WorkflowSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that is notified whenever a new snapshot is published
    pub fn watch(&self) -> watch::Receiver<WorkflowSnapshot> {
        self.snapshots.clone()
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<WorkflowEvent> {
        self.events.subscribe()
    }

    /// Wait until no collaborator call is outstanding
    pub async fn wait_idle(&self) -> Result<WorkflowSnapshot, WorkflowError> {
        self.wait_for(|s| !s.is_busy()).await
    }

    /// Wait until the workflow reaches `phase` with no call outstanding
    pub async fn wait_for_phase(&self, phase: WorkflowPhase) -> Result<WorkflowSnapshot, WorkflowError> {
        self.wait_for(|s| s.phase == phase && !s.is_busy()).await
    }

    /// Fails with `Closed` once the runtime has stopped, even if the last
    /// published snapshot matches
    async fn wait_for(
        &self,
        predicate: impl FnMut(&WorkflowSnapshot) -> bool,
    ) -> Result<WorkflowSnapshot, WorkflowError> {
        if self.is_closed() {
            return Err(WorkflowError::Closed);
        }

        let mut rx = self.snapshots.clone();
        let snapshot = rx
            .wait_for(predicate)
            .await
            .map_err(|_| WorkflowError::Closed)?
            .clone();

        if self.is_closed() {
            return Err(WorkflowError::Closed);
        }
        Ok(snapshot)
    }
}
