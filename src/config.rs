//! Configuration types.
//!
//! Everything here is resolved once at process start and never mutated
//! afterwards. A missing API key is a valid state: the provider is reported
//! as unconfigured rather than failing startup.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::provider::ProviderKind;

/// Default Gemini model when `GEMINI_MODEL` is unset.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro";

/// Default Claude model when `CLAUDE_MODEL` is unset.
pub const DEFAULT_CLAUDE_MODEL: &str = "claude-3-5-sonnet-20241022";

/// Default bind address for the HTTP API.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

/// Base URL of the Tailscale control-plane API.
pub const TAILSCALE_API_BASE: &str = "https://api.tailscale.com/api/v2";

/// Flag name for Claude's headless automation mode.
pub const HEADLESS_MODE_FLAG: &str = "headless_mode";

/// Provider-specific sampling knobs.
///
/// This is the closed set of options that may reach a vendor call. Unknown
/// keys are rejected when deserializing, so request bodies cannot smuggle
/// arbitrary parameters through to the SDK.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationOptions {
    /// Sampling randomness.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus-sampling cutoff.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Only sample from the top K candidates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// Sequences that stop generation.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop_sequences: Vec<String>,
}

impl GenerationOptions {
    /// Field-by-field merge: anything set in `overrides` wins.
    pub fn merged(&self, overrides: &GenerationOptions) -> GenerationOptions {
        GenerationOptions {
            temperature: overrides.temperature.or(self.temperature),
            top_p: overrides.top_p.or(self.top_p),
            top_k: overrides.top_k.or(self.top_k),
            stop_sequences: if overrides.stop_sequences.is_empty() {
                self.stop_sequences.clone()
            } else {
                overrides.stop_sequences.clone()
            },
        }
    }

    /// Read `<PREFIX>_TEMPERATURE`, `<PREFIX>_TOP_P` and `<PREFIX>_TOP_K`.
    /// Values that fail to parse are dropped with a warning.
    fn from_lookup<F>(prefix: &str, lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            temperature: parse_var(lookup, &format!("{prefix}_TEMPERATURE")),
            top_p: parse_var(lookup, &format!("{prefix}_TOP_P")),
            top_k: parse_var(lookup, &format!("{prefix}_TOP_K")),
            stop_sequences: Vec::new(),
        }
    }
}

/// Configuration for a single provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// API key. `None` means the provider is unconfigured.
    pub api_key: Option<SecretString>,
    /// Model identifier passed to the vendor.
    pub model: String,
    /// Mode flags, e.g. `headless_mode`.
    pub flags: BTreeMap<String, bool>,
    /// Default sampling options for every call.
    pub options: GenerationOptions,
}

impl ProviderConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            api_key: None,
            model: model.into(),
            flags: BTreeMap::new(),
            options: GenerationOptions::default(),
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(key.into()));
        self
    }

    pub fn with_flag(mut self, name: impl Into<String>, value: bool) -> Self {
        self.flags.insert(name.into(), value);
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Whether a credential is present.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Read a mode flag; unknown flags are `false`.
    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }
}

/// Tailscale overlay configuration.
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    pub enabled: bool,
    pub hostname: Option<String>,
    /// API access token for device listing.
    pub api_key: Option<SecretString>,
    /// Tailnet name used in API paths.
    pub tailnet: Option<String>,
    pub api_base: String,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            hostname: None,
            api_key: None,
            tailnet: None,
            api_base: TAILSCALE_API_BASE.to_string(),
        }
    }
}

/// Process-wide settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub gemini: ProviderConfig,
    pub claude: ProviderConfig,
    pub overlay: OverlayConfig,
    pub bind_addr: String,
}

impl Settings {
    /// Build settings from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut gemini = ProviderConfig::new(
            get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
        )
        .with_options(GenerationOptions::from_lookup("GEMINI", &get));
        if let Some(key) = get("GEMINI_API_KEY") {
            gemini = gemini.with_api_key(key);
        }

        let headless = parse_bool(&get, "CLAUDE_HEADLESS_MODE").unwrap_or(true);
        let mut claude = ProviderConfig::new(
            get("CLAUDE_MODEL").unwrap_or_else(|| DEFAULT_CLAUDE_MODEL.to_string()),
        )
        .with_flag(HEADLESS_MODE_FLAG, headless)
        .with_options(GenerationOptions::from_lookup("CLAUDE", &get));
        if let Some(key) = get("ANTHROPIC_API_KEY") {
            claude = claude.with_api_key(key);
        }

        let overlay = OverlayConfig {
            enabled: parse_bool(&get, "TAILSCALE_ENABLED").unwrap_or(false),
            hostname: get("TAILSCALE_HOSTNAME"),
            api_key: get("TAILSCALE_API_KEY").map(SecretString::from),
            tailnet: get("TAILSCALE_TAILNET"),
            api_base: get("TAILSCALE_API_BASE").unwrap_or_else(|| TAILSCALE_API_BASE.to_string()),
        };

        Self {
            gemini,
            claude,
            overlay,
            bind_addr: get("GOOSE_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        }
    }

    /// Configuration for one provider.
    pub fn provider(&self, kind: ProviderKind) -> &ProviderConfig {
        match kind {
            ProviderKind::Gemini => &self.gemini,
            ProviderKind::Claude => &self.claude,
        }
    }

    /// Parse the HTTP bind address.
    pub fn bind_socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_addr
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::InvalidValue {
                key: "GOOSE_BIND_ADDR".to_string(),
                message: e.to_string(),
            })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key = key, value = %raw, "Ignoring unparseable option");
            None
        }
    }
}

fn parse_bool<F>(lookup: &F, key: &str) -> Option<bool>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            tracing::warn!(key = key, value = %raw, "Ignoring unparseable boolean");
            None
        }
    }
}
