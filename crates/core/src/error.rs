//! Error types for the Roundtable domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.
//!
//! Most failures inside a turn never reach these types: missing files and
//! remote failures are folded into the worker's reply text. Only an abandoned
//! turn surfaces to the orchestrator, as a [`TurnError`].

use thiserror::Error;

/// The top-level error type for all Roundtable operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Turn errors ---
    #[error("Turn error: {0}")]
    Turn(#[from] TurnError),

    // --- Session errors ---
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Why a worker's turn produced no reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnError {
    #[error("Turn of {worker} was cancelled")]
    Cancelled { worker: String },

    #[error("Turn of {worker} failed: {reason}")]
    Failed { worker: String, reason: String },
}

impl TurnError {
    /// Name of the worker whose turn was abandoned.
    pub fn worker(&self) -> &str {
        match self {
            TurnError::Cancelled { worker } | TurnError::Failed { worker, .. } => worker,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Worker cycle is empty")]
    EmptyCycle,

    #[error("Duplicate worker name in cycle: {0}")]
    DuplicateWorker(String),

    #[error("Session already halted")]
    AlreadyHalted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_error_displays_correctly() {
        let err = Error::Turn(TurnError::Failed {
            worker: "document_preprocessor".into(),
            reason: "input closed".into(),
        });
        assert!(err.to_string().contains("document_preprocessor"));
        assert!(err.to_string().contains("input closed"));
    }

    #[test]
    fn turn_error_names_worker() {
        let err = TurnError::Cancelled {
            worker: "user_proxy".into(),
        };
        assert_eq!(err.worker(), "user_proxy");
    }

    #[test]
    fn session_error_displays_correctly() {
        let err = Error::Session(SessionError::DuplicateWorker("file_check".into()));
        assert!(err.to_string().contains("file_check"));
    }
}
