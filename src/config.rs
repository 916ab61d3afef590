//! Configuration for gpscan.
//!
//! Loads optional TOML config, falling back to defaults on any error, then
//! applies environment overrides for secrets (`GPSCAN_CREDENTIAL`,
//! `GPSCAN_WEBHOOK_URL`).

use std::path::Path;

use serde::Deserialize;

use crate::fetch::DEFAULT_API_BASE;

/// Raw TOML shape; every field optional.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Cache TTL in seconds (<= 0 disables caching)
    pub cache_ttl_seconds: Option<i64>,
    /// Steady outbound request rate per second
    pub api_rps: Option<f64>,
    /// Token-bucket burst capacity
    pub api_burst: Option<u32>,
    /// Authenticated-session credential for non-public pricing
    pub credential: Option<String>,
    /// Interaction webhook URL for delivery
    pub webhook_url: Option<String>,
    /// Listing-details API base URL
    pub api_base_url: Option<String>,
    /// Liveness server bind address
    pub bind: Option<String>,
    /// Render backend: "components" or "embeds"
    pub render: Option<String>,
}

/// Which message payload shape to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderKind {
    Components,
    Embeds,
}

/// Resolved application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub cache_ttl_seconds: i64,
    pub api_rps: f64,
    pub api_burst: u32,
    pub credential: Option<String>,
    pub webhook_url: Option<String>,
    pub api_base_url: String,
    pub bind: String,
    pub render: RenderKind,
}

impl Config {
    /// Load config from the given path (default `gpscan.toml`), falling back
    /// to defaults on any error, then apply env overrides.
    pub fn load(path: Option<&Path>) -> Self {
        let path = path.unwrap_or_else(|| Path::new("gpscan.toml"));
        let file = match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(file) => {
                    tracing::info!(path = %path.display(), "loaded config");
                    file
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to parse config, using defaults");
                    ConfigFile::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "config file not found, using defaults");
                ConfigFile::default()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read config, using defaults");
                ConfigFile::default()
            }
        };

        let mut config = Self::from_file(file);
        if let Ok(credential) = std::env::var("GPSCAN_CREDENTIAL") {
            config.credential = sanitize_credential(&credential);
        }
        if let Ok(url) = std::env::var("GPSCAN_WEBHOOK_URL") {
            if !url.trim().is_empty() {
                config.webhook_url = Some(url.trim().to_string());
            }
        }
        config
    }

    /// Resolve a raw file into a full config with defaults.
    pub fn from_file(file: ConfigFile) -> Self {
        let render = match file.render.as_deref() {
            None | Some("components") => RenderKind::Components,
            Some("embeds") => RenderKind::Embeds,
            Some(other) => {
                tracing::warn!(render = other, "unknown render backend, using components");
                RenderKind::Components
            }
        };
        Self {
            cache_ttl_seconds: file.cache_ttl_seconds.unwrap_or(300),
            api_rps: file.api_rps.unwrap_or(3.0),
            api_burst: file.api_burst.unwrap_or(6),
            credential: file.credential.as_deref().and_then(sanitize_credential),
            webhook_url: file.webhook_url,
            api_base_url: file
                .api_base_url
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            bind: file.bind.unwrap_or_else(|| "127.0.0.1:8080".to_string()),
            render,
        }
    }
}

/// Strip CR/LF and surrounding whitespace; empty credentials become `None`.
fn sanitize_credential(raw: &str) -> Option<String> {
    let cleaned: String = raw.chars().filter(|c| *c != '\r' && *c != '\n').collect();
    let cleaned = cleaned.trim().to_string();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}
