//! Document preprocessor worker.
//!
//! Looks back through the conversation for the most recent actionable message
//! carrying a `<FilePath>` block, sends each listed document to the
//! preprocessing service, and reports one outcome line per document.
//!
//! ```text
//! history (newest first)
//!   ├─ not actionable ──────────────► skip
//!   ├─ actionable, no paths ────────► attempts += 1 ─► attempts > K? ─► clarify
//!   └─ actionable, paths [p1..pn] ──► process p1..pn in order ─► reply
//! ```
//!
//! The worker never asks to halt; its turn always passes on.

use std::sync::Arc;

use async_trait::async_trait;
use roundtable_core::message::{ChatHistory, Message, Role};
use roundtable_core::worker::{ReplyDecision, Worker};
use roundtable_core::{CancellationToken, TurnError};
use roundtable_tools::confirm::{AcceptAll, Confirmer, process_confirmed};
use roundtable_tools::path_block::{FilePathList, extract_file_paths};
use roundtable_tools::preprocess::Preprocessor;
use tracing::{debug, info, warn};

/// Default number of actionable messages scanned before asking for paths.
pub const DEFAULT_LOOKBACK: usize = 5;

pub const DEFAULT_NAME: &str = "document_preprocessor";

pub const DEFAULT_DESCRIPTION: &str = "\
I preprocess PDF files into JSON. Before giving me instructions, confirm that each PDF \
exists and include its path in the instructions.

File paths must be enclosed within <FilePath></FilePath> tags, with one file path per line.

Example:

<FilePath>
File Path 1
File Path 2
...
</FilePath>
";

/// Reply sent when no file paths were found within the lookback window.
pub const CLARIFICATION_TEMPLATE: &str = "
File path information was not included.
To use FileSurfer to determine if a PDF file exists, you must include the path to the PDF file in the directive.
When passing file paths, they must be enclosed in <FilePath></FilePath> tags, and one path must be passed per line.

Example)

<FilePath>
FilePath 1
FilePath 2
...

</FilePath>
";

/// Worker that hands documents named in the conversation to a [`Preprocessor`].
pub struct DocumentPreprocessor {
    name: String,
    description: String,
    /// Actionable messages without paths tolerated before clarifying (K).
    lookback: usize,
    actionable_roles: Vec<Role>,
    service: Arc<dyn Preprocessor>,
    confirmer: Arc<dyn Confirmer>,
}

impl DocumentPreprocessor {
    /// Create a preprocessor worker with default name, lookback, and no confirmation.
    pub fn new(service: Arc<dyn Preprocessor>) -> Self {
        Self {
            name: DEFAULT_NAME.into(),
            description: DEFAULT_DESCRIPTION.into(),
            lookback: DEFAULT_LOOKBACK,
            actionable_roles: vec![Role::User],
            service,
            confirmer: Arc::new(AcceptAll),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_lookback(mut self, lookback: usize) -> Self {
        self.lookback = lookback;
        self
    }

    /// Roles whose messages are scanned for paths (default: `User`).
    pub fn with_actionable_roles(mut self, roles: Vec<Role>) -> Self {
        self.actionable_roles = roles;
        self
    }

    /// Ask before every upload.
    pub fn with_confirmer(mut self, confirmer: Arc<dyn Confirmer>) -> Self {
        self.confirmer = confirmer;
        self
    }

    fn is_actionable(&self, message: &Message) -> bool {
        message.author != self.name && self.actionable_roles.contains(&message.role)
    }

    fn cancelled(&self) -> TurnError {
        TurnError::Cancelled {
            worker: self.name.clone(),
        }
    }

    /// Process every path in order, one outcome line each.
    async fn preprocess_all(
        &self,
        paths: &FilePathList,
        cancel: &CancellationToken,
    ) -> Result<String, TurnError> {
        let mut lines = Vec::with_capacity(paths.len());

        for path in paths.iter() {
            let outcome =
                process_confirmed(self.confirmer.as_ref(), self.service.as_ref(), path, cancel)
                    .await;

            if outcome.is_cancelled() {
                warn!(worker = %self.name, path, "Turn abandoned during preprocessing");
                return Err(self.cancelled());
            }

            debug!(worker = %self.name, path, outcome = %outcome, "Document handled");
            lines.push(outcome.to_string());
        }

        Ok(lines.join("\n"))
    }
}

#[async_trait]
impl Worker for DocumentPreprocessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn generate_reply(
        &self,
        history: &ChatHistory,
        cancel: &CancellationToken,
    ) -> Result<ReplyDecision, TurnError> {
        if cancel.is_cancelled() {
            return Err(self.cancelled());
        }

        let mut attempts = 0usize;
        for message in history.iter_recent() {
            if !self.is_actionable(message) {
                continue;
            }

            match extract_file_paths(&message.text()) {
                Some(paths) if !paths.is_empty() => {
                    info!(worker = %self.name, count = paths.len(), "Preprocessing requested documents");
                    let content = self.preprocess_all(&paths, cancel).await?;
                    return Ok(ReplyDecision::proceed(content));
                }
                _ => {
                    attempts += 1;
                    if attempts > self.lookback {
                        break;
                    }
                }
            }
        }

        debug!(worker = %self.name, attempts, "No file paths in lookback window");
        Ok(ReplyDecision::proceed(CLARIFICATION_TEMPLATE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::ScriptedPreprocessor;
    use roundtable_config::PreprocessConfig;
    use roundtable_tools::confirm::PromptConfirmer;
    use roundtable_tools::preprocess::{DocumentPreprocessingClient, PreprocessResult};
    use std::path::PathBuf;

    fn block(paths: &[&str]) -> String {
        roundtable_tools::format_file_paths(paths)
    }

    fn success_for_all() -> Arc<ScriptedPreprocessor> {
        Arc::new(ScriptedPreprocessor::new(|_| PreprocessResult::Success {
            output_path: PathBuf::from("./output.json"),
        }))
    }

    async fn reply(worker: &DocumentPreprocessor, history: &ChatHistory) -> ReplyDecision {
        worker
            .generate_reply(history, &CancellationToken::new())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn empty_history_asks_for_paths() {
        let service = success_for_all();
        let worker = DocumentPreprocessor::new(service.clone());

        let decision = reply(&worker, &ChatHistory::new()).await;

        assert_eq!(decision, ReplyDecision::proceed(CLARIFICATION_TEMPLATE));
        assert!(service.calls().is_empty());
    }

    #[tokio::test]
    async fn processes_each_path_in_order() {
        let service = Arc::new(ScriptedPreprocessor::new(|path| {
            if path.starts_with("missing") {
                PreprocessResult::NotFound { path: path.into() }
            } else {
                PreprocessResult::Success {
                    output_path: PathBuf::from("./output.json"),
                }
            }
        }));
        let worker = DocumentPreprocessor::new(service.clone());
        let history = ChatHistory::with_messages(vec![Message::user(format!(
            "Please convert these.\n{}",
            block(&["a.pdf", "missing.pdf", "c.pdf"])
        ))]);

        let decision = reply(&worker, &history).await;

        assert!(!decision.halt);
        assert_eq!(service.calls(), vec!["a.pdf", "missing.pdf", "c.pdf"]);
        let lines: Vec<&str> = decision.content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "The processed JSON has been saved to './output.json'.",
                "'missing.pdf' not found.",
                "The processed JSON has been saved to './output.json'.",
            ]
        );
    }

    #[tokio::test]
    async fn missing_report_is_reported_with_real_client() {
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("report.pdf");
        let report = report.to_str().unwrap();
        let client = DocumentPreprocessingClient::new(&PreprocessConfig {
            output_path: dir.path().join("output.json"),
            ..PreprocessConfig::default()
        })
        .unwrap();
        let worker = DocumentPreprocessor::new(Arc::new(client));
        let history = ChatHistory::with_messages(vec![Message::user(format!(
            "<FilePath>\n{report}\n</FilePath>"
        ))]);

        let decision = reply(&worker, &history).await;

        assert_eq!(decision, ReplyDecision::proceed(format!("'{report}' not found.")));
    }

    #[tokio::test]
    async fn remote_failure_is_echoed() {
        let service = Arc::new(ScriptedPreprocessor::new(|_| {
            PreprocessResult::RemoteFailure {
                status_code: 500,
                message: "server error".into(),
            }
        }));
        let worker = DocumentPreprocessor::new(service);
        let history = ChatHistory::with_messages(vec![Message::user(block(&["doc.pdf"]))]);

        let decision = reply(&worker, &history).await;

        assert!(!decision.halt);
        assert!(
            decision
                .content
                .contains("Failed to process the document. Status code: 500, Response: server error")
        );
    }

    #[tokio::test]
    async fn six_messages_without_paths_exceed_lookback_of_five() {
        let service = success_for_all();
        let worker = DocumentPreprocessor::new(service.clone()).with_lookback(5);
        let history =
            ChatHistory::with_messages((1..=6).map(|i| Message::user(format!("message {i}"))));

        let decision = reply(&worker, &history).await;

        assert_eq!(decision, ReplyDecision::proceed(CLARIFICATION_TEMPLATE));
        assert!(service.calls().is_empty());
    }

    #[tokio::test]
    async fn paths_beyond_lookback_are_ignored() {
        let service = success_for_all();
        let worker = DocumentPreprocessor::new(service.clone()).with_lookback(2);
        let mut messages = vec![Message::user(block(&["old.pdf"]))];
        messages.extend((0..3).map(|i| Message::user(format!("chatter {i}"))));
        let history = ChatHistory::with_messages(messages);

        let decision = reply(&worker, &history).await;

        assert_eq!(decision.content, CLARIFICATION_TEMPLATE);
        assert!(service.calls().is_empty());
    }

    #[tokio::test]
    async fn block_after_k_default_chatter_messages_is_still_processed() {
        let service = success_for_all();
        let worker = DocumentPreprocessor::new(service.clone());
        let mut messages = vec![Message::user(block(&["old.pdf"]))];
        messages.extend((0..DEFAULT_LOOKBACK).map(|i| Message::user(format!("chatter {i}"))));
        let history = ChatHistory::with_messages(messages);

        reply(&worker, &history).await;

        assert_eq!(service.calls(), vec!["old.pdf"]);
    }

    #[tokio::test]
    async fn block_in_message_k_plus_one_is_still_processed() {
        let service = success_for_all();
        let worker = DocumentPreprocessor::new(service.clone()).with_lookback(2);
        let mut messages = vec![Message::user(block(&["edge.pdf"]))];
        messages.extend((0..2).map(|i| Message::user(format!("chatter {i}"))));
        let history = ChatHistory::with_messages(messages);

        reply(&worker, &history).await;

        assert_eq!(service.calls(), vec!["edge.pdf"]);
    }

    #[tokio::test]
    async fn non_actionable_messages_do_not_count() {
        let service = success_for_all();
        let worker = DocumentPreprocessor::new(service.clone()).with_lookback(1);
        let history = ChatHistory::with_messages(vec![
            Message::user(block(&["wanted.pdf"])),
            Message::assistant("file_surfer", "checked"),
            Message::system("rules"),
            Message::assistant("file_surfer", "still checking"),
        ]);

        reply(&worker, &history).await;

        assert_eq!(service.calls(), vec!["wanted.pdf"]);
    }

    #[tokio::test]
    async fn paths_in_assistant_messages_are_not_acted_on_by_default() {
        let service = success_for_all();
        let worker = DocumentPreprocessor::new(service.clone());
        let history = ChatHistory::with_messages(vec![Message::assistant(
            "file_surfer",
            block(&["agent.pdf"]),
        )]);

        let decision = reply(&worker, &history).await;

        assert_eq!(decision.content, CLARIFICATION_TEMPLATE);
        assert!(service.calls().is_empty());
    }

    #[tokio::test]
    async fn configured_roles_widen_actionable_input() {
        let service = success_for_all();
        let worker = DocumentPreprocessor::new(service.clone())
            .with_actionable_roles(vec![Role::User, Role::Assistant]);
        let history = ChatHistory::with_messages(vec![Message::assistant(
            "file_surfer",
            block(&["agent.pdf"]),
        )]);

        reply(&worker, &history).await;

        assert_eq!(service.calls(), vec!["agent.pdf"]);
    }

    #[tokio::test]
    async fn own_messages_are_skipped() {
        let service = success_for_all();
        let worker = DocumentPreprocessor::new(service.clone())
            .with_actionable_roles(vec![Role::User, Role::Assistant]);
        let history = ChatHistory::with_messages(vec![
            Message::user(block(&["user.pdf"])),
            Message::assistant(DEFAULT_NAME, block(&["echoed.pdf"])),
        ]);

        reply(&worker, &history).await;

        assert_eq!(service.calls(), vec!["user.pdf"]);
    }

    #[tokio::test]
    async fn empty_block_falls_through_to_older_message() {
        let service = success_for_all();
        let worker = DocumentPreprocessor::new(service.clone());
        let history = ChatHistory::with_messages(vec![
            Message::user(block(&["older.pdf"])),
            Message::user("<FilePath>\n\n</FilePath>"),
        ]);

        reply(&worker, &history).await;

        assert_eq!(service.calls(), vec!["older.pdf"]);
    }

    #[tokio::test]
    async fn most_recent_block_wins() {
        let service = success_for_all();
        let worker = DocumentPreprocessor::new(service.clone());
        let history = ChatHistory::with_messages(vec![
            Message::user(block(&["first.pdf"])),
            Message::user(block(&["second.pdf"])),
        ]);

        reply(&worker, &history).await;

        assert_eq!(service.calls(), vec!["second.pdf"]);
    }

    #[tokio::test]
    async fn declined_upload_is_reported_and_skipped() {
        let service = success_for_all();
        let worker = DocumentPreprocessor::new(service.clone())
            .with_confirmer(Arc::new(PromptConfirmer::with_reader(|_| Ok("no".into()))));
        let history = ChatHistory::with_messages(vec![Message::user(block(&["secret.pdf"]))]);

        let decision = reply(&worker, &history).await;

        assert_eq!(decision.content, "Upload of 'secret.pdf' was declined.");
        assert!(service.calls().is_empty());
    }

    #[tokio::test]
    async fn cancelled_upload_abandons_turn() {
        let service = Arc::new(ScriptedPreprocessor::new(|path| {
            if path == "b.pdf" {
                PreprocessResult::Cancelled { path: path.into() }
            } else {
                PreprocessResult::NotFound { path: path.into() }
            }
        }));
        let worker = DocumentPreprocessor::new(service.clone());
        let history =
            ChatHistory::with_messages(vec![Message::user(block(&["a.pdf", "b.pdf", "c.pdf"]))]);

        let err = worker
            .generate_reply(&history, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            TurnError::Cancelled {
                worker: DEFAULT_NAME.into()
            }
        );
        assert_eq!(service.calls(), vec!["a.pdf", "b.pdf"]);
    }

    #[tokio::test]
    async fn pre_cancelled_token_abandons_turn() {
        let service = success_for_all();
        let worker = DocumentPreprocessor::new(service.clone());
        let token = CancellationToken::new();
        token.cancel();
        let history = ChatHistory::with_messages(vec![Message::user(block(&["a.pdf"]))]);

        let result = worker.generate_reply(&history, &token).await;

        assert!(matches!(result, Err(TurnError::Cancelled { .. })));
        assert!(service.calls().is_empty());
    }

    #[tokio::test]
    async fn history_is_untouched() {
        let worker = DocumentPreprocessor::new(success_for_all());
        let history = ChatHistory::with_messages(vec![Message::user(block(&["a.pdf"]))]);

        reply(&worker, &history).await;

        assert_eq!(history.len(), 1);
    }
}
