//! Construct-once cache of provider clients.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{ProviderClient, ProviderKind};
use crate::config::Settings;
use crate::llm::BackendFactory;

/// Registry of provider clients keyed by provider.
///
/// Clients are built lazily on first `get`, at most once per provider. The
/// check-then-create runs under a synchronous mutex with no `.await` inside,
/// so concurrent first use cannot build duplicates and a cancelled caller can
/// never leave the cache half-written.
pub struct ProviderRegistry {
    settings: Arc<Settings>,
    factory: Arc<dyn BackendFactory>,
    clients: Mutex<HashMap<ProviderKind, Arc<ProviderClient>>>,
}

impl ProviderRegistry {
    pub fn new(settings: Arc<Settings>, factory: Arc<dyn BackendFactory>) -> Self {
        Self {
            settings,
            factory,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Get the client for `kind`, constructing it on first use.
    pub fn get(&self, kind: ProviderKind) -> Arc<ProviderClient> {
        let mut clients = self.clients.lock().unwrap_or_else(|e| e.into_inner());
        let client = clients.entry(kind).or_insert_with(|| {
            tracing::debug!(provider = %kind, "Constructing provider client");
            Arc::new(ProviderClient::connect(
                kind,
                self.settings.provider(kind).clone(),
                self.factory.as_ref(),
            ))
        });
        Arc::clone(client)
    }

    /// The cached client for `kind`, if one was built.
    pub fn cached(&self, kind: ProviderKind) -> Option<Arc<ProviderClient>> {
        self.clients
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&kind)
            .cloned()
    }

    /// Drop every cached client. Clients already handed out stay usable.
    pub fn reset(&self) {
        self.clients.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}
