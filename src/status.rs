//! Readiness snapshot across providers and the overlay.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::overlay::{OverlayProbe, OverlayStatus};
use crate::provider::{ProviderClient, ProviderKind, ProviderRegistry};

/// Readiness of one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderStatus {
    /// An API key is present.
    pub configured: bool,
    pub model: String,
    /// A connection handle exists.
    pub ready: bool,
    /// Mode flags, e.g. `headless_mode`.
    pub extra: BTreeMap<String, bool>,
}

impl From<&ProviderClient> for ProviderStatus {
    fn from(client: &ProviderClient) -> Self {
        Self {
            configured: client.is_configured(),
            model: client.model().to_string(),
            ready: client.is_ready(),
            extra: client.config().flags.clone(),
        }
    }
}

/// Consolidated readiness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub providers: BTreeMap<String, ProviderStatus>,
    pub network_identity: Option<OverlayStatus>,
}

impl StatusSnapshot {
    pub fn provider(&self, kind: ProviderKind) -> Option<&ProviderStatus> {
        self.providers.get(kind.name())
    }
}

/// Builds `StatusSnapshot`s. Never fails: an unconfigured or broken
/// provider is a reportable state, not an error.
pub struct StatusAggregator {
    registry: Arc<ProviderRegistry>,
    probe: Option<Arc<OverlayProbe>>,
}

impl StatusAggregator {
    pub fn new(registry: Arc<ProviderRegistry>, probe: Option<Arc<OverlayProbe>>) -> Self {
        Self { registry, probe }
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let providers = ProviderKind::ALL
            .iter()
            .map(|&kind| {
                let client = self.registry.get(kind);
                (kind.name().to_string(), ProviderStatus::from(client.as_ref()))
            })
            .collect();

        StatusSnapshot {
            providers,
            network_identity: self.probe.as_ref().map(|probe| probe.status()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HEADLESS_MODE_FLAG, OverlayConfig, Settings};
    use crate::llm::testing::{ScriptedLlm, StubFactory};

    fn aggregator(settings: Settings, overlay: Option<OverlayConfig>) -> StatusAggregator {
        let factory = Arc::new(StubFactory::new(ScriptedLlm::always_ok()));
        let registry = Arc::new(ProviderRegistry::new(Arc::new(settings), factory));
        StatusAggregator::new(registry, overlay.map(|c| Arc::new(OverlayProbe::new(c))))
    }

    #[test]
    fn unconfigured_providers_are_not_ready() {
        let snapshot = aggregator(Settings::default(), None).snapshot();

        assert_eq!(snapshot.providers.len(), 2);
        for status in snapshot.providers.values() {
            assert!(!status.configured);
            assert!(!status.ready);
        }
        assert!(snapshot.network_identity.is_none());
    }

    #[test]
    fn ready_tracks_connection() {
        let mut settings = Settings::default();
        settings.claude = settings.claude.with_api_key("sk");
        let snapshot = aggregator(settings, None).snapshot();

        let claude = snapshot.provider(ProviderKind::Claude).unwrap();
        assert!(claude.configured && claude.ready);
        assert_eq!(claude.extra.get(HEADLESS_MODE_FLAG), Some(&true));

        let gemini = snapshot.provider(ProviderKind::Gemini).unwrap();
        assert!(!gemini.configured && !gemini.ready);
        assert!(gemini.extra.is_empty());
    }

    #[test]
    fn snapshot_is_idempotent() {
        let mut settings = Settings::default();
        settings.gemini = settings.gemini.with_api_key("g");
        let agg = aggregator(
            settings,
            Some(OverlayConfig {
                enabled: true,
                hostname: Some("goose-box".into()),
                ..Default::default()
            }),
        );
        assert_eq!(agg.snapshot(), agg.snapshot());
    }

    #[test]
    fn includes_overlay_status() {
        let snapshot = aggregator(Settings::default(), Some(OverlayConfig::default())).snapshot();
        let overlay = snapshot.network_identity.unwrap();
        assert!(!overlay.enabled && !overlay.connected);
        assert!(overlay.hostname.is_none());
    }

    #[test]
    fn serializes_as_keyed_document() {
        let json = serde_json::to_value(aggregator(Settings::default(), None).snapshot()).unwrap();
        assert_eq!(json["providers"]["gemini"]["ready"], false);
        assert_eq!(json["providers"]["claude"]["extra"]["headless_mode"], true);
        assert!(json["network_identity"].is_null());
    }
}
