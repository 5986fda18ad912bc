//! GaChat Services - Store lifecycle orchestration.
//!
//! This crate provides:
//! - The `Service` trait for long-lived components
//! - A typed event bus carrying store lifecycle events
//! - `LifecycleController`: reset, open, seed, ready, and page-discard
//!   teardown of the local message store, plus the ready signal the UI
//!   mount step awaits

pub mod service;
pub mod event_bus;
pub mod lifecycle;

// Re-export key types
pub use service::{Service, ServiceState};
pub use event_bus::{EventBus, StoreEvent};
pub use lifecycle::{
    LifecycleController, LifecycleDiagnostics, LifecyclePhase, LifecycleStatus, ReadySignal, ReadyState,
    StartupReport, TeardownOutcome,
};
