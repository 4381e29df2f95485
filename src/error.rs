//! Error types for goose-dispatch.

/// Top-level error type for the dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Overlay error: {0}")]
    Overlay(#[from] OverlayError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors raised at the vendor SDK boundary.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited")]
    RateLimited { provider: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },
}

/// Failures of a single provider operation.
///
/// These never cross the `ProviderClient` boundary as errors: the client logs
/// them and hands back a failed `TaskResult`. `try_send_raw` exposes them for
/// callers that want the distinction.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Provider {provider} is not initialized")]
    NotInitialized { provider: String },

    #[error("Provider {provider} does not support {kind} tasks")]
    Unsupported { provider: String, kind: String },

    #[error("Upstream call to {provider} failed: {source}")]
    Upstream {
        provider: String,
        #[source]
        source: LlmError,
    },

    #[error("Provider {provider} returned an empty response")]
    EmptyResponse { provider: String },

    #[error("Batch item {index} failed: {reason}")]
    BatchItem { index: usize, reason: String },
}

/// Overlay network (Tailscale) errors.
#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error("Overlay network is not configured for API access")]
    NotConfigured,

    #[error("Overlay API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Overlay API returned status {status}")]
    Status { status: u16 },
}

/// Result type alias for the dispatcher.
pub type Result<T> = std::result::Result<T, Error>;
