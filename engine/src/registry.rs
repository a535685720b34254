//! Named adapter instances resolved by engine identifier.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::EngineAdapter;

/// Owns every adapter the service can route to.
///
/// Created at boot and torn down at shutdown; registration and resolution
/// are safe to interleave from concurrent tasks.
#[derive(Default)]
pub struct EngineRegistry {
    engines: RwLock<HashMap<String, Arc<dyn EngineAdapter>>>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, id: impl Into<String>, adapter: Arc<dyn EngineAdapter>) {
        let id = id.into();
        tracing::info!(engine = %id, "registering engine");
        self.engines.write().await.insert(id, adapter);
    }

    pub async fn resolve(&self, id: &str) -> Option<Arc<dyn EngineAdapter>> {
        self.engines.read().await.get(id).cloned()
    }

    pub async fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.engines.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Stop every registered engine; used on shutdown.
    pub async fn stop_all(&self) {
        let engines: Vec<Arc<dyn EngineAdapter>> =
            self.engines.read().await.values().cloned().collect();
        for engine in engines {
            tracing::info!(engine = engine.name(), "stopping engine");
            engine.stop().await;
        }
    }
}
