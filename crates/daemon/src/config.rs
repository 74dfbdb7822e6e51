use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use drivegate_core::oauth::{AUTHORIZATION_ENDPOINT, TOKEN_ENDPOINT};
use drivegate_core::Settings;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub listen: SocketAddr,

    /// Where the callback handler stores the raw token endpoint response.
    pub token_file: PathBuf,

    pub authorization_endpoint: String,
    pub token_endpoint: String,

    /// Mount point for the Drive routes, e.g. `/api/drive`. Empty mounts at the root.
    pub route_prefix: String,

    /// Allowed CORS origins; `*` allows any.
    pub cors_origins: Vec<String>,

    /// When set, plain-HTTP requests (per `X-Forwarded-Proto`) are redirected to this HTTPS port.
    pub https_port: Option<u16>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 5000)),
            token_file: PathBuf::from("google-token.json"),
            authorization_endpoint: AUTHORIZATION_ENDPOINT.to_string(),
            token_endpoint: TOKEN_ENDPOINT.to_string(),
            route_prefix: String::new(),
            cors_origins: vec!["http://localhost:4200".to_string()],
            https_port: None,
        }
    }
}

impl DaemonConfig {
    /// The route prefix with a leading slash and no trailing slash, or empty.
    pub fn normalized_prefix(&self) -> String {
        let trimmed = self.route_prefix.trim().trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        }
    }
}

/// Loads the settings file and applies `Section__Key` environment overrides.
pub fn load_settings(path: &Path) -> Result<Settings> {
    let mut settings =
        Settings::load(path).with_context(|| format!("load settings from {}", path.display()))?;
    let applied = settings
        .apply_env(std::env::vars())
        .context("apply environment overrides")?;
    info!(path = %path.display(), env_overrides = applied, "settings loaded");

    for key in settings.missing_keys() {
        warn!(key, "configuration value missing; dependent endpoints will fail");
    }
    Ok(settings)
}
