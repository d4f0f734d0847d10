//! Worker trait — the abstraction over conversation participants.
//!
//! A worker reads the shared [`ChatHistory`], decides whether it has something
//! to contribute, and returns a [`ReplyDecision`]. Workers never write to the
//! history themselves; the orchestrator appends their replies.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::TurnError;
use crate::message::{ChatHistory, Role};

/// The outcome of a completed turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyDecision {
    /// Whether the turn cycle should stop after this reply
    pub halt: bool,

    /// Reply text to append to the conversation
    pub content: String,
}

impl ReplyDecision {
    /// Reply and pass the turn to the next participant.
    pub fn proceed(content: impl Into<String>) -> Self {
        Self {
            halt: false,
            content: content.into(),
        }
    }

    /// Reply and stop the turn cycle.
    pub fn halt(content: impl Into<String>) -> Self {
        Self {
            halt: true,
            content: content.into(),
        }
    }
}

/// The core Worker trait.
///
/// Implemented by each participant in a round-robin cycle (document
/// preprocessor, user proxy, ...). The orchestrator holds workers as
/// `Arc<dyn Worker>` in a fixed cycle.
#[async_trait]
pub trait Worker: Send + Sync {
    /// The unique name of this worker within a cycle (e.g. "document_preprocessor").
    fn name(&self) -> &str;

    /// What this worker does and how to address it.
    fn description(&self) -> &str;

    /// Role the orchestrator records this worker's replies under.
    fn role(&self) -> Role {
        Role::Assistant
    }

    /// Produce a reply for the current state of the conversation.
    ///
    /// Returns `Err` only when the turn is abandoned (cancelled or unable to
    /// produce any reply); recoverable problems belong in the reply text.
    async fn generate_reply(
        &self,
        history: &ChatHistory,
        cancel: &CancellationToken,
    ) -> std::result::Result<ReplyDecision, TurnError>;
}
