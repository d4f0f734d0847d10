//! # Roundtable Core
//!
//! Domain types, traits, and error definitions for the Roundtable turn-taking
//! agent runtime. It depends on no HTTP, CLI, or config crate and defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The shared conversation ([`ChatHistory`]) and the participant contract
//! ([`Worker`]) live here. Concrete workers, the preprocessing client and the
//! orchestrator live in their own crates and depend inward on core. This enables:
//! - Driving the orchestrator with scripted workers in tests
//! - Swapping the remote service for a fake without touching the reply protocol
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod event;
pub mod message;
pub mod worker;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result, SessionError, TurnError};
pub use event::{DomainEvent, EventBus};
pub use message::{ChatHistory, ConversationId, Message, MessageContent, Role};
pub use worker::{ReplyDecision, Worker};

/// Cancellation primitive shared by every suspension point in a turn.
pub use tokio_util::sync::CancellationToken;
