//! `roundtable preprocess` — upload documents without a session.

use std::sync::Arc;

use roundtable_config::AppConfig;
use roundtable_core::CancellationToken;
use roundtable_tools::{
    AcceptAll, Confirmer, DocumentPreprocessingClient, PreprocessResult, Preprocessor,
    PromptConfirmer, process_confirmed,
};

pub async fn run(paths: Vec<String>, confirm: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let client = DocumentPreprocessingClient::new(&config.preprocess)?;
    let confirmer = confirmer_for(&config, confirm);
    tracing::info!(endpoint = client.endpoint(), count = paths.len(), "Uploading documents");

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let outcomes = upload_all(confirmer.as_ref(), &client, &paths, &cancel, |outcome| {
        println!("{outcome}")
    })
    .await;

    if outcomes.last().is_some_and(PreprocessResult::is_cancelled) {
        return Err("Preprocessing cancelled".into());
    }
    let failures = outcomes.iter().filter(|o| !o.is_success()).count();
    if failures > 0 {
        return Err(format!("{failures} of {} documents failed", paths.len()).into());
    }
    Ok(())
}

/// Ask before each upload when confirmation is enabled by flag or config.
fn confirmer_for(config: &AppConfig, confirm: bool) -> Arc<dyn Confirmer> {
    if confirm || config.worker.confirm_uploads {
        Arc::new(PromptConfirmer::stdin())
    } else {
        Arc::new(AcceptAll)
    }
}

/// Handle paths in order, stopping at the first cancellation.
async fn upload_all(
    confirmer: &dyn Confirmer,
    service: &dyn Preprocessor,
    paths: &[String],
    cancel: &CancellationToken,
    mut report: impl FnMut(&PreprocessResult),
) -> Vec<PreprocessResult> {
    let mut outcomes = Vec::with_capacity(paths.len());
    for path in paths {
        let outcome = process_confirmed(confirmer, service, path, cancel).await;
        report(&outcome);
        let stop = outcome.is_cancelled();
        outcomes.push(outcome);
        if stop {
            break;
        }
    }
    outcomes
}
