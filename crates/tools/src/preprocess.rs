//! Document preprocessing client — uploads a file to the remote service.
//!
//! One synchronous request per document: a multipart POST with a single file
//! part. A 200 response body is written verbatim to a single well-known output
//! file, overwriting whatever was there. No retries.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use roundtable_config::PreprocessConfig;
use roundtable_core::CancellationToken;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Outcome of preprocessing one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreprocessResult {
    /// The service accepted the document; its response was saved.
    Success { output_path: PathBuf },
    /// The path does not exist locally. No request was made.
    NotFound { path: String },
    /// The service answered with a non-200 status.
    RemoteFailure { status_code: u16, message: String },
    /// No status was obtained (unreadable file, network error, timeout,
    /// or the response could not be saved).
    Transport { path: String, reason: String },
    /// The upload was refused at the confirmation prompt.
    Declined { path: String },
    /// The call was aborted by a cancellation signal.
    Cancelled { path: String },
}

impl PreprocessResult {
    pub fn is_success(&self) -> bool {
        matches!(self, PreprocessResult::Success { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, PreprocessResult::Cancelled { .. })
    }
}

/// One human-readable line per outcome, as posted back to the conversation.
impl fmt::Display for PreprocessResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreprocessResult::Success { output_path } => write!(
                f,
                "The processed JSON has been saved to '{}'.",
                output_path.display()
            ),
            PreprocessResult::NotFound { path } => write!(f, "'{path}' not found."),
            PreprocessResult::RemoteFailure {
                status_code,
                message,
            } => write!(
                f,
                "Failed to process the document. Status code: {status_code}, Response: {message}"
            ),
            PreprocessResult::Transport { path, reason } => write!(
                f,
                "Failed to reach the preprocessing service for '{path}': {reason}"
            ),
            PreprocessResult::Declined { path } => write!(f, "Upload of '{path}' was declined."),
            PreprocessResult::Cancelled { path } => {
                write!(f, "Preprocessing of '{path}' was cancelled.")
            }
        }
    }
}

/// Something that can turn a document path into a [`PreprocessResult`].
///
/// Never fails: every failure is a variant of the result.
#[async_trait]
pub trait Preprocessor: Send + Sync {
    async fn process(&self, path: &str, cancel: &CancellationToken) -> PreprocessResult;
}

/// HTTP client for the remote document preprocessing service.
pub struct DocumentPreprocessingClient {
    endpoint: String,
    upload_field: String,
    part_mime: String,
    output_path: PathBuf,
    client: reqwest::Client,
}

impl DocumentPreprocessingClient {
    /// Create a client from configuration.
    pub fn new(config: &PreprocessConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            upload_field: config.upload_field.clone(),
            part_mime: config.part_mime.clone(),
            output_path: config.output_path.clone(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST the document. `Ok` carries a 200 response body still to be saved.
    async fn send(&self, path: &str) -> Result<String, PreprocessResult> {
        let transport = |reason: String| PreprocessResult::Transport {
            path: path.to_string(),
            reason,
        };

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| transport(format!("failed to read file: {e}")))?;

        let file_name = Path::new(path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(&self.part_mime)
            .map_err(|e| transport(format!("invalid part MIME type: {e}")))?;
        let form = Form::new().part(self.upload_field.clone(), part);

        debug!(path, endpoint = %self.endpoint, "Uploading document");

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport(format!("failed to read response body: {e}")))?;

        if status != reqwest::StatusCode::OK {
            warn!(path, status = status.as_u16(), "Preprocessing service rejected document");
            return Err(PreprocessResult::RemoteFailure {
                status_code: status.as_u16(),
                message: body,
            });
        }

        Ok(body)
    }

    /// Overwrite the shared output file with a response body.
    async fn save(&self, path: &str, body: String) -> PreprocessResult {
        if let Err(e) = tokio::fs::write(&self.output_path, body.as_bytes()).await {
            return PreprocessResult::Transport {
                path: path.to_string(),
                reason: format!("failed to write {}: {e}", self.output_path.display()),
            };
        }

        info!(path, output = %self.output_path.display(), "Document preprocessed");
        PreprocessResult::Success {
            output_path: self.output_path.clone(),
        }
    }
}

#[async_trait]
impl Preprocessor for DocumentPreprocessingClient {
    async fn process(&self, path: &str, cancel: &CancellationToken) -> PreprocessResult {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            debug!(path, "Document not found, skipping upload");
            return PreprocessResult::NotFound {
                path: path.to_string(),
            };
        }

        // Only the request is raced; once a body is in hand it is saved.
        let sent = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(path, "Document upload cancelled");
                return PreprocessResult::Cancelled { path: path.to_string() };
            }
            sent = self.send(path) => sent,
        };

        match sent {
            Ok(body) => self.save(path, body).await,
            Err(outcome) => outcome,
        }
    }
}
