//! Round-robin orchestration — drives workers through a fixed turn cycle.
//!
//! The orchestrator owns the [`ChatHistory`] and is its only writer. It asks
//! one worker at a time for a reply, appends the reply, and moves on to the
//! next worker in construction order:
//!
//! ```text
//! Idle ──start──► Dispatching(0) ──reply──► Dispatching(1) ── ... ──► Dispatching((i+1) mod N)
//!                      │                          │
//!                      └──── halt / abandoned / external / turn limit ────► Halted
//! ```
//!
//! There is no progress detection: a cycle of workers that keep asking for
//! clarification runs until a worker, the halt handle, or `max_turns` stops it.

use chrono::Utc;
use roundtable_core::error::{SessionError, TurnError};
use roundtable_core::event::{DomainEvent, EventBus};
use roundtable_core::message::{ChatHistory, ConversationId, Message};
use roundtable_core::worker::Worker;
use roundtable_core::CancellationToken;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

const PREVIEW_CHARS: usize = 100;

/// Why a session stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HaltReason {
    /// A worker returned a reply with `halt` set.
    WorkerRequested { worker: String },
    /// A worker's turn ended without a reply.
    TurnAbandoned { worker: String, reason: String },
    /// The halt handle was triggered from outside the cycle.
    External,
    /// `max_turns` replies were appended.
    TurnLimit { turns: usize },
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HaltReason::WorkerRequested { worker } => write!(f, "{worker} requested halt"),
            HaltReason::TurnAbandoned { worker, reason } => {
                write!(f, "turn of {worker} abandoned: {reason}")
            }
            HaltReason::External => write!(f, "halted externally"),
            HaltReason::TurnLimit { turns } => write!(f, "turn limit of {turns} reached"),
        }
    }
}

/// Orchestrator state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorState {
    Idle,
    /// Waiting on the worker at this cycle index.
    Dispatching(usize),
    Halted(HaltReason),
}

impl OrchestratorState {
    pub fn is_halted(&self) -> bool {
        matches!(self, OrchestratorState::Halted(_))
    }
}

/// Summary of a finished session.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub conversation_id: ConversationId,
    /// Replies appended to the history
    pub turns: usize,
    pub halt_reason: HaltReason,
}

/// Drives a fixed cycle of workers, one turn at a time.
pub struct RoundRobinOrchestrator {
    workers: Vec<Arc<dyn Worker>>,
    history: ChatHistory,
    state: OrchestratorState,
    turns: usize,
    max_turns: Option<usize>,
    halt: CancellationToken,
    event_bus: Arc<EventBus>,
}

impl RoundRobinOrchestrator {
    /// Create an orchestrator over a fixed cycle.
    ///
    /// The cycle must be non-empty and worker names must be unique.
    pub fn new(workers: Vec<Arc<dyn Worker>>) -> Result<Self, SessionError> {
        if workers.is_empty() {
            return Err(SessionError::EmptyCycle);
        }

        let mut seen = HashSet::new();
        for worker in &workers {
            if !seen.insert(worker.name()) {
                return Err(SessionError::DuplicateWorker(worker.name().to_string()));
            }
        }

        Ok(Self {
            workers,
            history: ChatHistory::new(),
            state: OrchestratorState::Idle,
            turns: 0,
            max_turns: None,
            halt: CancellationToken::new(),
            event_bus: Arc::new(EventBus::default()),
        })
    }

    /// Start from an existing history (e.g. a seeded task message).
    pub fn with_history(mut self, history: ChatHistory) -> Self {
        self.history = history;
        self
    }

    /// Stop after this many replies. `None` = unlimited.
    pub fn with_max_turns(mut self, max_turns: Option<usize>) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = event_bus;
        self
    }

    /// Token that halts the session when cancelled. Cancelling it also
    /// cancels the turn in flight.
    pub fn halt_handle(&self) -> CancellationToken {
        self.halt.clone()
    }

    pub fn state(&self) -> &OrchestratorState {
        &self.state
    }

    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    pub fn into_history(self) -> ChatHistory {
        self.history
    }

    /// Replies appended so far.
    pub fn turns(&self) -> usize {
        self.turns
    }

    /// Worker names in cycle order.
    pub fn worker_names(&self) -> Vec<&str> {
        self.workers.iter().map(|w| w.name()).collect()
    }

    /// Idle → Dispatching(0). A no-op once dispatching.
    pub fn start(&mut self) -> Result<(), SessionError> {
        match self.state {
            OrchestratorState::Idle => {
                info!(
                    conversation_id = %self.history.id,
                    workers = ?self.worker_names(),
                    "Starting round-robin session"
                );
                self.state = OrchestratorState::Dispatching(0);
                Ok(())
            }
            OrchestratorState::Dispatching(_) => Ok(()),
            OrchestratorState::Halted(_) => Err(SessionError::AlreadyHalted),
        }
    }

    /// Run one turn of the current worker. Starts the session if idle.
    pub async fn step(&mut self) -> Result<&OrchestratorState, SessionError> {
        self.start()?;
        let OrchestratorState::Dispatching(index) = self.state else {
            return Err(SessionError::AlreadyHalted);
        };

        if self.halt.is_cancelled() {
            self.finish(HaltReason::External);
            return Ok(&self.state);
        }

        if self.max_turns.is_some_and(|max| self.turns >= max) {
            self.finish(HaltReason::TurnLimit { turns: self.turns });
            return Ok(&self.state);
        }

        let worker = self.workers[index].clone();
        debug!(turn = self.turns, worker = worker.name(), "Dispatching reply request");
        self.event_bus.publish(DomainEvent::TurnStarted {
            conversation_id: self.history.id.to_string(),
            turn: self.turns,
            worker: worker.name().to_string(),
            timestamp: Utc::now(),
        });

        let turn_token = self.halt.child_token();
        let result = worker.generate_reply(&self.history, &turn_token).await;

        match result {
            Ok(decision) => {
                self.event_bus.publish(DomainEvent::TurnCompleted {
                    conversation_id: self.history.id.to_string(),
                    turn: self.turns,
                    worker: worker.name().to_string(),
                    halt: decision.halt,
                    content_preview: decision.content.chars().take(PREVIEW_CHARS).collect(),
                    timestamp: Utc::now(),
                });
                self.history
                    .push(Message::new(worker.role(), worker.name(), decision.content));
                self.turns += 1;

                if decision.halt {
                    self.finish(HaltReason::WorkerRequested {
                        worker: worker.name().to_string(),
                    });
                } else {
                    self.state = OrchestratorState::Dispatching((index + 1) % self.workers.len());
                }
            }
            Err(err) => {
                warn!(worker = worker.name(), error = %err, "Turn abandoned");
                self.event_bus.publish(DomainEvent::TurnAbandoned {
                    conversation_id: self.history.id.to_string(),
                    turn: self.turns,
                    worker: worker.name().to_string(),
                    reason: err.to_string(),
                    timestamp: Utc::now(),
                });

                let reason = if self.halt.is_cancelled() {
                    HaltReason::External
                } else {
                    abandoned(err)
                };
                self.finish(reason);
            }
        }

        Ok(&self.state)
    }

    /// Drive turns until the session halts.
    pub async fn run(&mut self) -> Result<SessionReport, SessionError> {
        self.start()?;
        loop {
            let halted = match self.step().await? {
                OrchestratorState::Halted(reason) => Some(reason.clone()),
                _ => None,
            };
            if let Some(halt_reason) = halted {
                return Ok(SessionReport {
                    conversation_id: self.history.id.clone(),
                    turns: self.turns,
                    halt_reason,
                });
            }
        }
    }

    fn finish(&mut self, reason: HaltReason) {
        info!(turns = self.turns, reason = %reason, "Session halted");
        self.event_bus.publish(DomainEvent::SessionHalted {
            conversation_id: self.history.id.to_string(),
            turns: self.turns,
            reason: reason.to_string(),
            timestamp: Utc::now(),
        });
        self.state = OrchestratorState::Halted(reason);
    }
}

fn abandoned(err: TurnError) -> HaltReason {
    let worker = err.worker().to_string();
    HaltReason::TurnAbandoned {
        worker,
        reason: err.to_string(),
    }
}
