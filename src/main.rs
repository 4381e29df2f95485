use std::sync::Arc;

use goose_dispatch::Orchestrator;
use goose_dispatch::api;
use goose_dispatch::config::Settings;
use goose_dispatch::llm::RigBackendFactory;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let settings = Settings::from_env();
    let addr = settings.bind_socket_addr()?;

    let orchestrator = Arc::new(Orchestrator::new(settings, Arc::new(RigBackendFactory)));
    let snapshot = orchestrator.status();

    eprintln!("goose-dispatch v{}", env!("CARGO_PKG_VERSION"));
    for (name, provider) in &snapshot.providers {
        eprintln!(
            "   {}: model {}, {}",
            name,
            provider.model,
            if provider.ready {
                "ready"
            } else if provider.configured {
                "configured but unavailable"
            } else {
                "not configured"
            }
        );
    }
    if let Some(overlay) = &snapshot.network_identity {
        eprintln!(
            "   Tailscale: {}",
            if overlay.enabled { "enabled" } else { "disabled" }
        );
    }
    eprintln!("   API: http://{}/api/status\n", addr);

    api::serve(orchestrator, addr).await?;

    Ok(())
}
