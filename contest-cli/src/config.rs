//! Settings management for the kiosk binary.
//!
//! Settings are stored as TOML (`settings.toml`) in the data directory.

use anyhow::{Context, Result};
use climbcontest_client::{ApiConfig, CodeFormat, KioskConfig, TransportConfig};
use climbcontest_core::{
    RejectionPolicy, RetryPolicy, SessionConfig, SubmitTrigger, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_RETRY_DELAY, DEFAULT_SUCCESS_DISPLAY,
};
use climbcontest_types::ApiVersion;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const SETTINGS_FILE: &str = "settings.toml";

/// Kiosk settings stored locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KioskSettings {
    /// Contest server: a host, `host:port`, or a base URL with scheme.
    pub server: String,
    /// Server API revision (default: v2).
    #[serde(default)]
    pub api_version: ApiVersion,
    /// Keep the climber after each registration (default: false).
    #[serde(default)]
    pub auto_evaluate: bool,
    /// Wait for an explicit submit instead of submitting on the second scan.
    #[serde(default)]
    pub manual_submit: bool,
    /// Send the session token on v2 requests too (default: false).
    #[serde(default)]
    pub tag_requests: bool,
    /// Accept self-signed server certificates (default: false).
    #[serde(default)]
    pub accept_invalid_certs: bool,
    /// Per-request timeout in milliseconds (default: 10000).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Registration attempts, including the first (default: 5).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Pause between registration attempts in milliseconds (default: 150).
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// What a `success: false` registration reply does (default: retry).
    #[serde(default)]
    pub on_rejection: RejectionPolicy,
    /// How long a registration stays on screen before the reset (default: 500).
    #[serde(default = "default_success_display_ms")]
    pub success_display_ms: u64,
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_retry_delay_ms() -> u64 {
    DEFAULT_RETRY_DELAY.as_millis() as u64
}

fn default_success_display_ms() -> u64 {
    DEFAULT_SUCCESS_DISPLAY.as_millis() as u64
}

impl KioskSettings {
    /// Create settings for a server with every other field at its default.
    pub fn new(server: &str) -> Self {
        Self {
            server: server.to_string(),
            api_version: ApiVersion::default(),
            auto_evaluate: false,
            manual_submit: false,
            tag_requests: false,
            accept_invalid_certs: false,
            request_timeout_ms: default_request_timeout_ms(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            on_rejection: RejectionPolicy::default(),
            success_display_ms: default_success_display_ms(),
        }
    }

    /// Path of the settings file inside a data directory.
    pub fn path(data_dir: &Path) -> PathBuf {
        data_dir.join(SETTINGS_FILE)
    }

    /// Load settings from a directory.
    pub async fn load(data_dir: &Path) -> Result<Self> {
        let path = Self::path(data_dir);
        let contents = tokio::fs::read_to_string(&path)
            .await
            .context("Kiosk not configured. Run 'kiosk configure --server <host>' first.")?;
        toml::from_str(&contents)
            .with_context(|| format!("Invalid settings file {}", path.display()))
    }

    /// Save settings to a directory.
    pub async fn save(&self, data_dir: &Path) -> Result<()> {
        let path = Self::path(data_dir);
        let contents = toml::to_string_pretty(self).context("Failed to encode settings")?;
        tokio::fs::write(&path, contents)
            .await
            .context("Failed to save settings")?;
        set_file_permissions_0600(&path).await?;
        Ok(())
    }

    /// Check if settings exist.
    pub async fn exists(data_dir: &Path) -> bool {
        tokio::fs::try_exists(Self::path(data_dir))
            .await
            .unwrap_or(false)
    }

    /// Pairing session behaviour.
    pub fn session_config(&self) -> SessionConfig {
        let trigger = if self.manual_submit {
            SubmitTrigger::Manual
        } else {
            SubmitTrigger::Auto
        };
        SessionConfig::default()
            .with_auto_evaluate(self.auto_evaluate)
            .with_submit_trigger(trigger)
            .with_success_display(Duration::from_millis(self.success_display_ms))
    }

    /// Submission retry bounds.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.retry_delay_ms))
            .with_rejection_policy(self.on_rejection)
    }

    /// API revision and tagging.
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig::new(self.api_version).with_tag_requests(self.tag_requests)
    }

    /// HTTP connection settings.
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig::new(self.server.clone())
            .with_timeout(Duration::from_millis(self.request_timeout_ms))
            .with_accept_invalid_certs(self.accept_invalid_certs)
    }

    /// Everything the kiosk actor needs.
    pub fn kiosk_config(&self) -> KioskConfig {
        KioskConfig::default()
            .with_session(self.session_config())
            .with_api(self.api_config())
            .with_retry(self.retry_policy())
            .with_scan_format(CodeFormat::QrCode)
    }
}

/// Set file permissions to 0600 (owner read/write only) on Unix.
/// No-op on non-Unix platforms.
async fn set_file_permissions_0600(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .await
            .context("Failed to set file permissions")?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}

/// Set directory permissions to 0700 (owner only) on Unix.
/// No-op on non-Unix platforms.
pub async fn set_dir_permissions_0700(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
            .await
            .context("Failed to set directory permissions")?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}
