//! `roundtable session` — interactive turn cycle of you and the document preprocessor.

use std::sync::Arc;

use roundtable_agent::{DocumentPreprocessor, StdinInput, UserProxy};
use roundtable_config::AppConfig;
use roundtable_core::event::{DomainEvent, EventBus};
use roundtable_core::worker::Worker;
use roundtable_core::Error;
use roundtable_tools::{DocumentPreprocessingClient, PromptConfirmer};
use roundtable_workflow::{HaltReason, RoundRobinOrchestrator};
use tokio::sync::broadcast;

pub async fn run(
    max_turns: Option<usize>,
    confirm: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let event_bus = Arc::new(EventBus::new(config.session.event_capacity));
    let mut orchestrator = build(&config, confirm, event_bus.clone())?
        .with_max_turns(max_turns.or(config.session.max_turns));

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║        Roundtable — Interactive Session      ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Service:   {}", config.preprocess.endpoint);
    println!("  Output:    {}", config.preprocess.output_path.display());
    println!("  Lookback:  {}", config.worker.lookback);
    println!();
    println!("  Name documents in a block, then an empty line:");
    println!("    <FilePath>");
    println!("    ./report.pdf");
    println!("    </FilePath>");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    let halt = orchestrator.halt_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received, halting session");
            halt.cancel();
        }
    });

    tokio::spawn(log_events(event_bus.subscribe()));

    let report = orchestrator.run().await.map_err(Error::from)?;

    // Replies after the user's last prompt were never shown.
    if let Some(last) = orchestrator.history().last() {
        if last.author != roundtable_agent::user_proxy::DEFAULT_NAME && !last.text().is_empty() {
            for line in last.text().lines() {
                println!("  [{}] {line}", last.author);
            }
        }
    }

    println!();
    println!(
        "  Session {} ended after {} turns ({}).",
        report.conversation_id, report.turns, report.halt_reason
    );
    println!();

    if report.halt_reason == HaltReason::External {
        // A blocking stdin read may still be pending.
        std::process::exit(130);
    }

    Ok(())
}

/// Log session events until the bus closes. Returns how many were logged.
async fn log_events(mut events: broadcast::Receiver<Arc<DomainEvent>>) -> usize {
    let mut logged = 0;
    loop {
        match events.recv().await {
            Ok(event) => {
                if let DomainEvent::TurnStarted { worker, turn, .. } = event.as_ref() {
                    tracing::debug!(turn, worker = %worker, "Turn started");
                }
                logged += 1;
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event log fell behind");
            }
            Err(broadcast::error::RecvError::Closed) => return logged,
        }
    }
}

/// Wire the user proxy and document preprocessor into one cycle.
fn build(
    config: &AppConfig,
    confirm: bool,
    event_bus: Arc<EventBus>,
) -> roundtable_core::Result<RoundRobinOrchestrator> {
    let client = DocumentPreprocessingClient::new(&config.preprocess).map_err(|e| Error::Config {
        message: format!("cannot build preprocessing client: {e}"),
    })?;

    let mut preprocessor =
        DocumentPreprocessor::new(Arc::new(client)).with_lookback(config.worker.lookback);
    if confirm || config.worker.confirm_uploads {
        preprocessor = preprocessor.with_confirmer(Arc::new(PromptConfirmer::stdin()));
    }

    let workers: Vec<Arc<dyn Worker>> = vec![
        Arc::new(UserProxy::new(Arc::new(StdinInput))),
        Arc::new(preprocessor),
    ];

    Ok(RoundRobinOrchestrator::new(workers)?.with_event_bus(event_bus))
}
