//! Environment-driven configuration.
//!
//! One `AppConfig` is built at startup and passed by reference into each
//! component; there is no ambient global credential state.

use std::collections::HashMap;

use serde::Serialize;
use snaptask_core::SnapError;

pub const DEFAULT_VISION_MODEL: &str = "claude-3-7-sonnet-20250219";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_TODOIST_BASE_URL: &str = "https://api.todoist.com";

/// Runtime configuration for the snaptask service.
#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    /// Anthropic API key used for the vision call.
    pub anthropic_api_key: String,
    /// Todoist API key used for task creation and uploads.
    pub todoist_api_key: String,
    /// Vision model identifier.
    pub vision_model: String,
    /// Base URL of the vision provider (overridable for tests).
    pub anthropic_base_url: String,
    /// Base URL of the task store (overridable for tests).
    pub todoist_base_url: String,
    /// HTTP server bind address.
    pub bind_address: String,
    /// HTTP server port.
    pub port: u16,
    /// Directory for rolling log files.
    pub log_dir: String,
    /// Default log level when RUST_LOG is unset.
    pub log_level: String,
}

impl AppConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, SnapError> {
        Self::from_map(&std::env::vars().collect())
    }

    /// Load configuration from a provided map (useful for testing).
    pub fn from_map(env: &HashMap<String, String>) -> Result<Self, SnapError> {
        let required = |key: &str| -> Result<String, SnapError> {
            match env.get(key) {
                Some(v) if !v.is_empty() => Ok(v.clone()),
                _ => Err(SnapError::Config(format!("missing required env var {key}"))),
            }
        };
        let or_default = |key: &str, default: &str| -> String {
            env.get(key).filter(|v| !v.is_empty()).cloned().unwrap_or_else(|| default.to_string())
        };

        Ok(Self {
            anthropic_api_key: required("ANTHROPIC_API_KEY")?,
            todoist_api_key: required("TODOIST_API_KEY")?,
            vision_model: or_default("SNAPTASK_MODEL", DEFAULT_VISION_MODEL),
            anthropic_base_url: or_default("ANTHROPIC_BASE_URL", DEFAULT_ANTHROPIC_BASE_URL),
            todoist_base_url: or_default("TODOIST_BASE_URL", DEFAULT_TODOIST_BASE_URL),
            bind_address: or_default("SNAPTASK_BIND", "0.0.0.0"),
            port: env
                .get("SNAPTASK_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            log_dir: or_default("SNAPTASK_LOG_DIR", "logs"),
            log_level: or_default("RUST_LOG", "info"),
        })
    }

    /// Copy of the config safe to log at startup: API keys are masked
    /// down to their last four characters.
    pub fn redacted(&self) -> Self {
        Self {
            anthropic_api_key: mask(&self.anthropic_api_key),
            todoist_api_key: mask(&self.todoist_api_key),
            ..self.clone()
        }
    }
}

fn mask(secret: &str) -> String {
    if secret.len() <= 4 {
        "***".to_string()
    } else {
        format!("***{}", &secret[secret.len() - 4..])
    }
}
