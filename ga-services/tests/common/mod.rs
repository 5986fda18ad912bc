//! Shared test utilities for integration tests.

#![allow(dead_code)]

use ga_core::config::{AppConfig, StoreConfig};
use ga_services::event_bus::{EventBus, StoreEvent};
use ga_services::LifecycleController;
use ga_store::LocalStore;
use tempfile::TempDir;
use tokio::sync::broadcast;

/// Create a default test configuration rooted at `dir`.
pub fn create_test_config(dir: &TempDir) -> AppConfig {
    AppConfig {
        store: StoreConfig::in_directory(dir.path()),
        ..AppConfig::default()
    }
}

/// Create a store rooted in a fresh temporary directory.
/// Returns the store and the TempDir (must be held alive for the duration of the test).
pub fn create_test_store() -> (LocalStore, TempDir) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let store = LocalStore::new(dir.path(), StoreConfig::in_directory(dir.path()));
    (store, dir)
}

/// Create an EventBus with a small buffer suitable for tests.
pub fn create_test_event_bus() -> EventBus {
    EventBus::new(64)
}

/// Create a controller over `config`, rooted where `config.store` points.
pub fn create_test_controller(config: &AppConfig) -> (LifecycleController, EventBus) {
    let bus = create_test_event_bus();
    let store = LocalStore::new(&config.store.directory, config.store.clone());
    (LifecycleController::new(store, config, bus.clone()), bus)
}

/// Collect every event already sitting in `rx`.
pub fn drain_events(rx: &mut broadcast::Receiver<StoreEvent>) -> Vec<StoreEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
