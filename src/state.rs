use std::sync::Arc;

use crate::handlers::{IntakeHandler, LifecycleHandler};
use crate::registry::ConnectionRegistry;
use crate::store::ConnectionStore;
use crate::transport::{SessionTable, TransportProvider};

#[derive(Clone)]
pub struct AppState {
    pub registry: ConnectionRegistry,
    pub lifecycle: LifecycleHandler,
    pub intake: IntakeHandler,
    pub sessions: SessionTable,
    /// Stage name reported for messages arriving on the built-in gateway.
    pub stage: String,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ConnectionStore>,
        ttl: chrono::Duration,
        transports: Arc<dyn TransportProvider>,
        sessions: SessionTable,
        endpoint_override: Option<String>,
        stage: &str,
    ) -> Self {
        let registry = ConnectionRegistry::new(store, ttl);
        Self {
            lifecycle: LifecycleHandler::new(registry.clone()),
            intake: IntakeHandler::new(registry.clone(), transports, endpoint_override),
            registry,
            sessions,
            stage: stage.to_string(),
        }
    }
}
