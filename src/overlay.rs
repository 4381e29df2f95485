//! Tailscale overlay probe.
//!
//! `status()` is a local heuristic: "connected" means a hostname is
//! configured, not that a packet made it anywhere. Only `devices()` talks to
//! the Tailscale API, and only when the overlay is enabled and an API key is
//! present.

use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::OverlayConfig;
use crate::error::OverlayError;

/// Overlay status as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverlayStatus {
    pub enabled: bool,
    pub hostname: Option<String>,
    pub connected: bool,
}

/// A peer device on the tailnet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayDevice {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub addresses: Vec<String>,
    #[serde(default)]
    pub os: String,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct DeviceList {
    #[serde(default)]
    devices: Vec<OverlayDevice>,
}

/// Reports on the optional overlay network.
pub struct OverlayProbe {
    config: OverlayConfig,
    http: reqwest::Client,
}

impl OverlayProbe {
    pub fn new(config: OverlayConfig) -> Self {
        if config.enabled {
            info!(hostname = ?config.hostname, "Tailscale integration enabled");
        } else {
            info!("Tailscale integration disabled");
        }
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Heuristic connectivity check. No network I/O.
    pub fn check_connection(&self) -> bool {
        if !self.config.enabled {
            return false;
        }
        match &self.config.hostname {
            Some(hostname) => {
                tracing::debug!(hostname = %hostname, "Tailscale hostname configured");
                true
            }
            None => false,
        }
    }

    pub fn status(&self) -> OverlayStatus {
        if !self.config.enabled {
            return OverlayStatus {
                enabled: false,
                hostname: None,
                connected: false,
            };
        }
        OverlayStatus {
            enabled: true,
            hostname: self.config.hostname.clone(),
            connected: self.check_connection(),
        }
    }

    /// List tailnet devices.
    ///
    /// Returns `NotConfigured` without any request when the overlay is
    /// disabled or has no API key. Without a tailnet name there is no endpoint
    /// to call, so the result is an empty list.
    pub async fn devices(&self) -> Result<Vec<OverlayDevice>, OverlayError> {
        let api_key = match (&self.config.api_key, self.config.enabled) {
            (Some(key), true) => key,
            _ => {
                warn!("Tailscale not configured for API access");
                return Err(OverlayError::NotConfigured);
            }
        };

        let Some(tailnet) = self.config.tailnet.as_deref() else {
            warn!("TAILSCALE_TAILNET not set; device listing unavailable");
            return Ok(Vec::new());
        };

        let url = format!(
            "{}/tailnet/{}/devices",
            self.config.api_base.trim_end_matches('/'),
            tailnet
        );
        info!(tailnet = %tailnet, "Getting Tailscale devices");

        let response = self
            .http
            .get(&url)
            .bearer_auth(api_key.expose_secret())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Tailscale device listing rejected");
            return Err(OverlayError::Status {
                status: status.as_u16(),
            });
        }

        let list: DeviceList = response.json().await?;
        Ok(list.devices)
    }
}
