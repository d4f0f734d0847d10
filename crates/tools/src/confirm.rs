//! Confirmation before a document leaves the machine.
//!
//! A prompt blocks the turn until the user answers. The wait is a suspension
//! point: a cancellation signal ends it with [`Confirmation::Cancelled`].

use crate::preprocess::{PreprocessResult, Preprocessor};
use async_trait::async_trait;
use roundtable_core::CancellationToken;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::debug;

/// Answer to a confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Approved,
    Declined,
    Cancelled,
}

#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, prompt: &str, cancel: &CancellationToken) -> Confirmation;
}

/// Approves everything without asking.
pub struct AcceptAll;

#[async_trait]
impl Confirmer for AcceptAll {
    async fn confirm(&self, _prompt: &str, _cancel: &CancellationToken) -> Confirmation {
        Confirmation::Approved
    }
}

type AskFn = dyn Fn(&str) -> io::Result<String> + Send + Sync;

/// Asks a yes/no question and approves only on `yes` (case-insensitive).
///
/// The question is answered on a blocking thread so the runtime keeps
/// servicing the cancellation token meanwhile.
pub struct PromptConfirmer {
    ask: Arc<AskFn>,
}

impl PromptConfirmer {
    /// Prompt on stdout and read the answer from stdin.
    pub fn stdin() -> Self {
        Self::with_reader(|prompt| {
            let mut stdout = io::stdout();
            write!(stdout, "{prompt} (yes/no): ")?;
            stdout.flush()?;
            let mut answer = String::new();
            io::stdin().lock().read_line(&mut answer)?;
            Ok(answer)
        })
    }

    /// Use a custom blocking reader for the answer.
    pub fn with_reader(ask: impl Fn(&str) -> io::Result<String> + Send + Sync + 'static) -> Self {
        Self { ask: Arc::new(ask) }
    }
}

#[async_trait]
impl Confirmer for PromptConfirmer {
    async fn confirm(&self, prompt: &str, cancel: &CancellationToken) -> Confirmation {
        if cancel.is_cancelled() {
            return Confirmation::Cancelled;
        }

        let ask = self.ask.clone();
        let prompt = prompt.to_string();
        let answer = tokio::task::spawn_blocking(move || ask(&prompt));

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Confirmation::Cancelled,
            joined = answer => match joined {
                Ok(Ok(line)) if line.trim().eq_ignore_ascii_case("yes") => Confirmation::Approved,
                Ok(Ok(line)) => {
                    debug!(answer = line.trim(), "Confirmation declined");
                    Confirmation::Declined
                }
                Ok(Err(e)) => {
                    debug!(error = %e, "Confirmation prompt failed, treating as declined");
                    Confirmation::Declined
                }
                Err(_) => Confirmation::Declined,
            },
        }
    }
}

/// Ask `confirmer` about `path`, then preprocess it only if approved.
pub async fn process_confirmed(
    confirmer: &dyn Confirmer,
    service: &dyn Preprocessor,
    path: &str,
    cancel: &CancellationToken,
) -> PreprocessResult {
    let prompt = format!("Upload '{path}' to the document preprocessing service?");
    match confirmer.confirm(&prompt, cancel).await {
        Confirmation::Approved => service.process(path, cancel).await,
        Confirmation::Declined => PreprocessResult::Declined {
            path: path.to_string(),
        },
        Confirmation::Cancelled => PreprocessResult::Cancelled {
            path: path.to_string(),
        },
    }
}
