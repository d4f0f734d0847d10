//! Shared test helpers for worker tests.

use async_trait::async_trait;
use roundtable_core::CancellationToken;
use roundtable_tools::preprocess::{PreprocessResult, Preprocessor};
use std::sync::Mutex;

type Script = dyn Fn(&str) -> PreprocessResult + Send + Sync;

/// A preprocessor that answers from a closure and records every path it saw.
pub struct ScriptedPreprocessor {
    script: Box<Script>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedPreprocessor {
    pub fn new(script: impl Fn(&str) -> PreprocessResult + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Paths processed so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Preprocessor for ScriptedPreprocessor {
    async fn process(&self, path: &str, _cancel: &CancellationToken) -> PreprocessResult {
        self.calls.lock().unwrap().push(path.to_string());
        (self.script)(path)
    }
}
