//! Run the store lifecycle in the foreground.
//!
//! Mirrors the chat page: startup runs before the UI would mount, the mount
//! step awaits the ready signal, and Ctrl-C stands in for the page being
//! discarded. Teardown runs however the session in between ends.

use console::style;
use tracing::{debug, error, info};

use ga_core::config::ConfigHandle;
use ga_core::error::{GaError, GaResult};
use ga_services::event_bus::EventBus;
use ga_services::{LifecycleController, Service, TeardownOutcome};
use ga_store::{DeleteOutcome, MessageSnapshot};
use crate::OutputFormat;

pub async fn run(config: ConfigHandle, once: bool, format: OutputFormat) -> GaResult<()> {
    let (store, app_config) = super::open_store(&config).await?;
    let partition = app_config.store.partition.clone();

    let event_bus = EventBus::default();
    let mut events = event_bus.subscribe();
    let mut controller = LifecycleController::new(store, &app_config, event_bus);
    controller.init()?;

    let session = session(&mut controller, &partition, once, format).await;
    if let Err(e) = &session {
        error!("session ended with an error, tearing down: {e}");
    }

    let outcome = controller.shutdown_sequence().await;
    controller.shutdown()?;

    for event in std::iter::from_fn(|| events.try_recv().ok()) {
        debug!("store event: {event:?}");
    }

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "phase": controller.phase().to_string(),
                    "teardown": teardown_label(&outcome),
                })
            );
        }
        OutputFormat::Text => {
            println!("  Teardown:   {}", teardown_label(&outcome));
        }
    }
    session
}

/// Startup, mount, report, and wait for the discard event.
async fn session(
    controller: &mut LifecycleController,
    partition: &str,
    once: bool,
    format: OutputFormat,
) -> GaResult<()> {
    // The mount step waits on the signal while startup runs.
    let mut signal = controller.ready_signal();
    let mount = tokio::spawn(async move { signal.wait().await });

    let report = controller.startup().await;
    let ready = mount
        .await
        .map_err(|e| GaError::Internal(format!("mount task failed: {e}")))?;

    let snapshot = read_snapshot(controller, partition).await;

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "phase": controller.phase().to_string(),
                    "degraded": ready.degraded,
                    "reset": report.reset.as_ref().map(|o| o.to_string()),
                    "opened": report.opened,
                    "seeded": report.seed.as_ref().map(|s| s.written),
                    "seed_failures": report.seed.as_ref().map(|s| s.failed.len()),
                    "partition": partition,
                    "messages": snapshot.as_ref().map(|s| &s.messages),
                }))?
            );
        }
        OutputFormat::Text => {
            println!("{}", style("Local Store").bold().underlined());
            println!("  Status:     {}", controller.diagnostics());
            if ready.degraded {
                println!(
                    "  {} Running without full local history.",
                    style("WARN").yellow().bold()
                );
            } else {
                println!("  {} Ready.", style("OK").green().bold());
            }
            if let Some(seed) = &report.seed {
                println!("  Seed:       {seed}");
            }
            if let Some(snapshot) = &snapshot {
                println!();
                println!("{}", super::message_table(&snapshot.messages));
            }
        }
    }

    if !once {
        if let OutputFormat::Text = format {
            println!();
            println!("  Press Ctrl-C to discard the session.");
        }
        tokio::signal::ctrl_c().await?;
        info!("discard requested");
    }
    Ok(())
}

/// Read the partition for display. A failed read is logged and shown as no
/// messages.
async fn read_snapshot(controller: &LifecycleController, partition: &str) -> Option<MessageSnapshot> {
    let query = controller.query()?;
    match query.snapshot(partition).await {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            error!("reading '{partition}' failed: {e}");
            None
        }
    }
}

fn teardown_label(outcome: &TeardownOutcome) -> String {
    match outcome {
        TeardownOutcome::Closed => "closed, database kept".to_string(),
        TeardownOutcome::Delete(DeleteOutcome::Deleted) => "database deleted".to_string(),
        TeardownOutcome::Delete(DeleteOutcome::Absent) => "no database to delete".to_string(),
        TeardownOutcome::Delete(DeleteOutcome::Failed(reason)) => format!("delete failed: {reason}"),
        TeardownOutcome::TimedOut => "delete timed out".to_string(),
        TeardownOutcome::Skipped => "already torn down".to_string(),
    }
}
