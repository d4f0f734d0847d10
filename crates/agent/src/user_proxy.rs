//! User proxy worker — puts the human in the turn cycle.
//!
//! On its turn it shows what the other workers said since its last turn, then
//! waits for the user's next message. Exit words or end of input halt the cycle.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use roundtable_core::message::{ChatHistory, Message, Role};
use roundtable_core::worker::{ReplyDecision, Worker};
use roundtable_core::{CancellationToken, TurnError};
use tracing::debug;

pub const DEFAULT_NAME: &str = "user_proxy";

const EXIT_WORDS: &[&str] = &["exit", "quit", "/exit", "/quit", ":q"];

/// Where the user's messages come from.
#[async_trait]
pub trait InputSource: Send + Sync {
    /// Show `prompt` and read one message. `Ok(None)` means input is exhausted.
    async fn read_message(&self, prompt: &str) -> io::Result<Option<String>>;
}

/// Reads from the terminal. A message ends at a blank line or end of input,
/// so multi-line `<FilePath>` blocks can be typed directly.
pub struct StdinInput;

#[async_trait]
impl InputSource for StdinInput {
    async fn read_message(&self, prompt: &str) -> io::Result<Option<String>> {
        let prompt = prompt.to_string();
        tokio::task::spawn_blocking(move || {
            let mut stdout = io::stdout();
            if !prompt.is_empty() {
                writeln!(stdout, "{prompt}")?;
            }
            write!(stdout, "  You > ")?;
            stdout.flush()?;

            let stdin = io::stdin();
            let mut lines = Vec::new();
            for line in stdin.lock().lines() {
                let line = line?;
                if line.trim().is_empty() {
                    if lines.is_empty() {
                        continue;
                    }
                    break;
                }
                let single_exit = lines.is_empty() && EXIT_WORDS.contains(&line.trim());
                lines.push(line);
                if single_exit {
                    break;
                }
            }

            if lines.is_empty() {
                return Ok(None);
            }
            Ok(Some(lines.join("\n")))
        })
        .await
        .map_err(io::Error::other)?
    }
}

/// Replays a fixed list of messages, then reports end of input.
pub struct ScriptedInput {
    messages: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedInput {
    pub fn new<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            messages: Mutex::new(messages.into_iter().map(Into::into).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts shown so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl InputSource for ScriptedInput {
    async fn read_message(&self, prompt: &str) -> io::Result<Option<String>> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        let mut messages = self
            .messages
            .lock()
            .map_err(|_| io::Error::other("scripted input poisoned"))?;
        Ok(messages.pop_front())
    }
}

/// Worker that relays messages from a human.
pub struct UserProxy {
    name: String,
    description: String,
    input: Arc<dyn InputSource>,
}

impl UserProxy {
    pub fn new(input: Arc<dyn InputSource>) -> Self {
        Self {
            name: DEFAULT_NAME.into(),
            description: "The current user interacting with you.".into(),
            input,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Messages from other participants since this worker last spoke.
    fn prompt_for(&self, history: &ChatHistory) -> String {
        let mut unseen: Vec<&Message> = history
            .iter_recent()
            .take_while(|m| m.author != self.name)
            .collect();
        unseen.reverse();
        unseen
            .iter()
            .map(|m| format!("[{}] {}", m.author, m.text()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl Worker for UserProxy {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn role(&self) -> Role {
        Role::User
    }

    async fn generate_reply(
        &self,
        history: &ChatHistory,
        cancel: &CancellationToken,
    ) -> Result<ReplyDecision, TurnError> {
        let prompt = self.prompt_for(history);

        let read = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(TurnError::Cancelled { worker: self.name.clone() });
            }
            read = self.input.read_message(&prompt) => read,
        };

        match read {
            Ok(Some(text)) if EXIT_WORDS.contains(&text.trim()) => {
                debug!(worker = %self.name, "User asked to stop");
                Ok(ReplyDecision::halt(text.trim()))
            }
            Ok(Some(text)) => Ok(ReplyDecision::proceed(text)),
            Ok(None) => {
                debug!(worker = %self.name, "Input exhausted");
                Ok(ReplyDecision::halt(""))
            }
            Err(e) => Err(TurnError::Failed {
                worker: self.name.clone(),
                reason: e.to_string(),
            }),
        }
    }
}
