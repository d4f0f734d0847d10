//! Concrete workers for a Roundtable session.
//!
//! Each worker follows the same turn protocol:
//!
//! 1. **Receive** a reply request with a read-only view of the shared history
//! 2. **Decide** whether there is anything to act on
//! 3. **Act** (upload documents, ask the human, ...)
//! 4. **Return** a [`ReplyDecision`](roundtable_core::ReplyDecision) for the orchestrator to append
//!
//! Failures inside a turn become reply text; only an abandoned turn is an error.

pub mod document_preprocessor;
pub mod user_proxy;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use document_preprocessor::{CLARIFICATION_TEMPLATE, DEFAULT_LOOKBACK, DocumentPreprocessor};
pub use user_proxy::{InputSource, ScriptedInput, StdinInput, UserProxy};
