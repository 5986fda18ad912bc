//! Lifecycle controller for the local message store.
//!
//! Orchestrates startup (optional reset, open, seed, ready) and teardown
//! (close, delete) around the host page's lifecycle. Storage failures never
//! stop startup: the controller logs them and reaches `Ready` in degraded
//! mode so the chat UI stays usable without local history.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use ga_core::config::{AppConfig, SeedConfig, StoreConfig};
use ga_core::error::GaResult;
use ga_store::seed::placeholder_messages;
use ga_store::{Database, DeleteOutcome, LocalStore, MessageQuery, SeedLoader, SeedReport};

use crate::event_bus::{EventBus, StoreEvent};
use crate::service::{Service, ServiceState};

/// Store lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecyclePhase {
    /// Nothing has happened yet.
    Uninitialized,
    /// Opening (and possibly creating) the database.
    Opening,
    /// Writing the placeholder set.
    Seeding,
    /// Startup finished; queries may run.
    Ready,
    /// Teardown in progress.
    Closing,
    /// Handles closed and the database not confirmed gone: kept under the
    /// persistent policy, or its deletion failed or timed out.
    Closed,
    /// Database deleted on teardown (or there was none to delete).
    Deleted,
}

impl LifecyclePhase {
    /// Whether startup has finished, successfully or not.
    pub fn has_reached_ready(&self) -> bool {
        *self >= LifecyclePhase::Ready
    }

    /// Whether teardown has started or finished.
    pub fn is_torn_down(&self) -> bool {
        matches!(
            self,
            LifecyclePhase::Closing | LifecyclePhase::Closed | LifecyclePhase::Deleted
        )
    }
}

impl std::fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Opening => write!(f, "opening"),
            Self::Seeding => write!(f, "seeding"),
            Self::Ready => write!(f, "ready"),
            Self::Closing => write!(f, "closing"),
            Self::Closed => write!(f, "closed"),
            Self::Deleted => write!(f, "deleted"),
        }
    }
}

/// Value published on the lifecycle watch channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleStatus {
    pub phase: LifecyclePhase,
    pub degraded: bool,
}

/// What the UI mount step learns once startup has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadyState {
    /// Local history is unavailable or incomplete.
    pub degraded: bool,
}

/// Awaitable "ready" signal handed to the UI mount step.
///
/// Clones are independent; subscribers created after startup finished
/// resolve immediately.
#[derive(Debug, Clone)]
pub struct ReadySignal {
    rx: watch::Receiver<LifecycleStatus>,
}

impl ReadySignal {
    /// Wait until startup has reached `Ready` (or any later phase).
    ///
    /// If the controller is dropped before that, resolves as degraded.
    pub async fn wait(&mut self) -> ReadyState {
        match self.rx.wait_for(|status| status.phase.has_reached_ready()).await {
            Ok(status) => ReadyState {
                degraded: status.degraded,
            },
            Err(_) => {
                warn!("lifecycle controller dropped before ready");
                ReadyState { degraded: true }
            }
        }
    }

    /// Whether startup has already finished.
    pub fn is_ready(&self) -> bool {
        self.rx.borrow().phase.has_reached_ready()
    }

    /// Current lifecycle status.
    pub fn status(&self) -> LifecycleStatus {
        *self.rx.borrow()
    }
}

/// Summary of a startup run.
#[derive(Debug, Clone, Default)]
pub struct StartupReport {
    /// Outcome of the reset-on-load delete, if the policy ran it.
    pub reset: Option<DeleteOutcome>,
    /// Whether the database handle was opened.
    pub opened: bool,
    /// Result of seeding, if it ran.
    pub seed: Option<SeedReport>,
    /// Startup completed without local history or with a partial seed.
    pub degraded: bool,
}

/// Result of tearing the store down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeardownOutcome {
    /// The handle was closed and the database kept (persistent policy).
    Closed,
    /// Deletion was attempted with this outcome.
    Delete(DeleteOutcome),
    /// Deletion did not finish before the deadline.
    TimedOut,
    /// Teardown had already run.
    Skipped,
}

/// Orchestrates the store around the page lifecycle.
///
/// Owns the `LocalStore` and the open `Database` handle; the seeder and
/// query layer receive that handle explicitly.
pub struct LifecycleController {
    state: ServiceState,
    store: LocalStore,
    store_config: StoreConfig,
    seed_config: SeedConfig,
    event_bus: EventBus,
    status_tx: Arc<watch::Sender<LifecycleStatus>>,
    teardown: Arc<Mutex<Option<TeardownOutcome>>>,
    database: Option<Database>,
}

impl LifecycleController {
    /// Create a controller over `store` using the store and seed sections of
    /// `config`.
    pub fn new(store: LocalStore, config: &AppConfig, event_bus: EventBus) -> Self {
        let (status_tx, _) = watch::channel(LifecycleStatus {
            phase: LifecyclePhase::Uninitialized,
            degraded: false,
        });
        Self {
            state: ServiceState::Created,
            store,
            store_config: config.store.clone(),
            seed_config: config.seed.clone(),
            event_bus,
            status_tx: Arc::new(status_tx),
            teardown: Arc::new(Mutex::new(None)),
            database: None,
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> LifecyclePhase {
        self.status_tx.borrow().phase
    }

    /// Whether startup finished without full local history.
    pub fn is_degraded(&self) -> bool {
        self.status_tx.borrow().degraded
    }

    /// A new ready signal for the UI mount step.
    pub fn ready_signal(&self) -> ReadySignal {
        ReadySignal {
            rx: self.status_tx.subscribe(),
        }
    }

    /// The storage origin.
    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// The open database handle, if startup opened one.
    pub fn database(&self) -> Option<&Database> {
        self.database.as_ref()
    }

    /// Query surface over the open database, if any.
    pub fn query(&self) -> Option<MessageQuery> {
        self.database.clone().map(MessageQuery::new)
    }

    /// Run the startup sequence.
    ///
    /// Steps:
    /// 1. Delete any pre-existing database if `reset_on_load` is set
    /// 2. Open the database, creating the configured partition on upgrade
    /// 3. Seed the partition with the placeholder set
    /// 4. Publish `Ready`
    ///
    /// Never fails: errors are logged and leave the controller degraded.
    pub async fn startup(&mut self) -> StartupReport {
        let mut report = StartupReport::default();

        if self.phase() != LifecyclePhase::Uninitialized {
            warn!("ignoring startup in phase: {}", self.phase());
            report.opened = self.database.is_some();
            report.degraded = self.is_degraded();
            return report;
        }

        let name = self.store_config.database_name.clone();
        info!("starting local store '{name}'");

        // Step 1: reset-on-load
        if self.store_config.reset_on_load {
            let outcome = self.store.delete_database(&name).await;
            debug!("reset-on-load delete: {outcome}");
            report.reset = Some(outcome);
        }

        // Step 2: open
        self.set_phase(LifecyclePhase::Opening, false);
        let partition = self.store_config.partition.clone();
        let setup_partition = partition.clone();
        let opened = self
            .store
            .open(&name, self.store_config.schema_version, move |upgrade| {
                upgrade.create_partition(&setup_partition)
            })
            .await;

        match opened {
            Ok(db) => {
                report.opened = true;
                self.database = Some(db);
            }
            Err(e) => {
                if e.is_storage_unavailable() {
                    error!("local store unavailable, continuing without local history: {e}");
                } else {
                    error!("failed to open local store, continuing without local history: {e}");
                }
                report.degraded = true;
                self.event_bus.emit(StoreEvent::StartupDegraded {
                    reason: e.to_string(),
                });
            }
        }

        // Step 3: seed
        self.set_phase(LifecyclePhase::Seeding, report.degraded);
        if let Some(db) = self.database.clone() {
            if self.seed_config.enabled {
                let messages = placeholder_messages(
                    self.seed_config.messages.as_slice(),
                    self.seed_config.doublings,
                );
                let seed = SeedLoader::new(db).seed(&partition, messages.as_slice()).await;
                self.event_bus.emit(StoreEvent::Seeded {
                    partition: partition.clone(),
                    written: seed.written,
                    failed: seed.failed.len(),
                });
                if !seed.is_complete() {
                    warn!("seeding '{partition}' incomplete: {seed}");
                    report.degraded = true;
                    self.event_bus.emit(StoreEvent::StartupDegraded {
                        reason: format!("seeding incomplete: {seed}"),
                    });
                }
                report.seed = Some(seed);
            } else {
                debug!("seeding disabled");
            }
        }

        // Step 4: ready
        self.set_phase(LifecyclePhase::Ready, report.degraded);
        if report.degraded {
            warn!("local store ready (degraded)");
        } else {
            info!("local store ready");
        }
        report
    }

    /// Handle the page's "about to discard" event.
    ///
    /// Spawns a detached teardown task bounded by `teardown_deadline_ms` and
    /// returns immediately. The host is not expected to await the handle;
    /// failures are only logged. The controller drops its database handle
    /// right away so no further queries are issued through it.
    pub fn on_page_discard(&mut self) -> JoinHandle<TeardownOutcome> {
        if self.phase().is_torn_down() {
            debug!("ignoring page discard in phase: {}", self.phase());
            return tokio::spawn(async { TeardownOutcome::Skipped });
        }

        let degraded = self.is_degraded();
        self.set_phase(LifecyclePhase::Closing, degraded);
        self.database = None;

        let ctx = Teardown {
            store: self.store.clone(),
            name: self.store_config.database_name.clone(),
            delete: self.store_config.delete_on_unload,
            deadline: Duration::from_millis(self.store_config.teardown_deadline_ms),
            status_tx: Arc::clone(&self.status_tx),
            event_bus: self.event_bus.clone(),
            degraded,
            recorded: Arc::clone(&self.teardown),
        };
        tokio::spawn(ctx.run())
    }

    /// Run teardown and wait for it, for hosts that are able to wait.
    pub async fn shutdown_sequence(&mut self) -> TeardownOutcome {
        match self.on_page_discard().await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("teardown task failed: {e}");
                TeardownOutcome::Delete(DeleteOutcome::Failed(e.to_string()))
            }
        }
    }

    /// Outcome of the teardown, once it has finished.
    pub fn teardown_outcome(&self) -> Option<TeardownOutcome> {
        self.teardown.lock().ok().and_then(|outcome| outcome.clone())
    }

    /// Summary of the controller for diagnostics.
    pub fn diagnostics(&self) -> LifecycleDiagnostics {
        LifecycleDiagnostics {
            phase: self.phase(),
            degraded: self.is_degraded(),
            database_open: self.database.as_ref().is_some_and(|db| !db.is_closed()),
            service_state: self.state,
            teardown: self.teardown_outcome(),
        }
    }

    fn set_phase(&self, phase: LifecyclePhase, degraded: bool) {
        publish(&self.status_tx, &self.event_bus, phase, degraded);
    }
}

fn publish(
    status_tx: &watch::Sender<LifecycleStatus>,
    event_bus: &EventBus,
    phase: LifecyclePhase,
    degraded: bool,
) {
    let previous = status_tx.send_replace(LifecycleStatus { phase, degraded });
    debug!("lifecycle: {} -> {phase}", previous.phase);
    event_bus.emit(StoreEvent::PhaseChanged { phase });
}

/// Everything the detached teardown task needs, owned.
struct Teardown {
    store: LocalStore,
    name: String,
    delete: bool,
    deadline: Duration,
    status_tx: Arc<watch::Sender<LifecycleStatus>>,
    event_bus: EventBus,
    degraded: bool,
    recorded: Arc<Mutex<Option<TeardownOutcome>>>,
}

impl Teardown {
    async fn run(self) -> TeardownOutcome {
        let outcome = self.execute().await;
        if let Ok(mut recorded) = self.recorded.lock() {
            *recorded = Some(outcome.clone());
        }

        let phase = match &outcome {
            TeardownOutcome::Delete(result) if result.is_gone() => LifecyclePhase::Deleted,
            _ => LifecyclePhase::Closed,
        };
        publish(&self.status_tx, &self.event_bus, phase, self.degraded);
        outcome
    }

    async fn execute(&self) -> TeardownOutcome {
        if !self.delete {
            self.store.close_all();
            info!("local store '{}' closed and kept", self.name);
            return TeardownOutcome::Closed;
        }

        match tokio::time::timeout(self.deadline, self.store.delete_database(&self.name)).await {
            Ok(outcome) => {
                self.event_bus.emit(StoreEvent::DatabaseDeleted {
                    name: self.name.clone(),
                    outcome: outcome.to_string(),
                });
                TeardownOutcome::Delete(outcome)
            }
            Err(_) => {
                self.store.close_all();
                warn!(
                    "deleting '{}' did not finish within {:?}",
                    self.name, self.deadline
                );
                TeardownOutcome::TimedOut
            }
        }
    }
}

/// Diagnostic information about the lifecycle controller.
#[derive(Debug, Clone)]
pub struct LifecycleDiagnostics {
    pub phase: LifecyclePhase,
    pub degraded: bool,
    pub database_open: bool,
    pub service_state: ServiceState,
    pub teardown: Option<TeardownOutcome>,
}

impl std::fmt::Display for LifecycleDiagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "phase={}, degraded={}, db_open={}, state={}",
            self.phase, self.degraded, self.database_open, self.service_state,
        )?;
        match &self.teardown {
            Some(TeardownOutcome::Delete(result)) => write!(f, ", teardown=delete {result}"),
            Some(outcome) => write!(f, ", teardown={outcome:?}"),
            None => Ok(()),
        }
    }
}

impl Service for LifecycleController {
    fn name(&self) -> &str {
        "lifecycle"
    }

    fn state(&self) -> ServiceState {
        self.state
    }

    fn init(&mut self) -> GaResult<()> {
        self.state = ServiceState::Running;
        info!("lifecycle controller initialized");
        Ok(())
    }

    /// Synchronous stop: closes handles without deleting anything.
    fn shutdown(&mut self) -> GaResult<()> {
        self.database = None;
        self.store.close_all();
        self.state = ServiceState::Stopped;
        info!("lifecycle controller stopped");
        Ok(())
    }
}
