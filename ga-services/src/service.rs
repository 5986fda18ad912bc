//! Service trait and run state.
//!
//! Long-lived components implement `Service` so a host can initialize,
//! health-check, and stop them uniformly.

use ga_core::error::GaResult;

/// Run state of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// Service has been created but not initialized.
    Created,
    /// Service is running and ready.
    Running,
    /// Service has been stopped.
    Stopped,
    /// Service encountered a fatal error.
    Failed,
}

impl std::fmt::Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Trait implemented by long-lived GaChat services.
pub trait Service: Send + Sync {
    /// Human-readable name of this service.
    fn name(&self) -> &str;

    /// Current state of this service.
    fn state(&self) -> ServiceState;

    /// Initialize the service. Called once before use.
    fn init(&mut self) -> GaResult<()>;

    /// Stop the service and release its resources.
    fn shutdown(&mut self) -> GaResult<()>;

    /// Health check. Returns true if the service is operational.
    fn is_healthy(&self) -> bool {
        self.state() == ServiceState::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        state: ServiceState,
    }

    impl Service for Counter {
        fn name(&self) -> &str {
            "counter"
        }
        fn state(&self) -> ServiceState {
            self.state
        }
        fn init(&mut self) -> GaResult<()> {
            self.state = ServiceState::Running;
            Ok(())
        }
        fn shutdown(&mut self) -> GaResult<()> {
            self.state = ServiceState::Stopped;
            Ok(())
        }
    }

    #[test]
    fn test_service_health_follows_state() {
        let mut svc = Counter { state: ServiceState::Created };
        assert!(!svc.is_healthy());
        svc.init().unwrap();
        assert!(svc.is_healthy());
        svc.shutdown().unwrap();
        assert!(!svc.is_healthy());
        assert_eq!(svc.state().to_string(), "stopped");
    }
}
