//! Create or update kiosk settings.

use anyhow::Result;
use climbcontest_core::RejectionPolicy;
use climbcontest_types::ApiVersion;
use std::path::Path;

use crate::config::KioskSettings;

/// Settings changes requested on the command line.
#[derive(Debug, Default, Clone)]
pub struct SettingsUpdate {
    pub server: Option<String>,
    pub api_version: Option<ApiVersion>,
    pub auto_evaluate: Option<bool>,
    pub manual_submit: Option<bool>,
    pub tag_requests: Option<bool>,
    pub accept_invalid_certs: Option<bool>,
    pub request_timeout_ms: Option<u64>,
    pub max_attempts: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    pub on_rejection: Option<RejectionPolicy>,
    pub success_display_ms: Option<u64>,
}

impl SettingsUpdate {
    fn apply(self, settings: &mut KioskSettings) {
        if let Some(server) = self.server {
            settings.server = server;
        }
        if let Some(version) = self.api_version {
            settings.api_version = version;
        }
        if let Some(value) = self.auto_evaluate {
            settings.auto_evaluate = value;
        }
        if let Some(value) = self.manual_submit {
            settings.manual_submit = value;
        }
        if let Some(value) = self.tag_requests {
            settings.tag_requests = value;
        }
        if let Some(value) = self.accept_invalid_certs {
            settings.accept_invalid_certs = value;
        }
        if let Some(value) = self.request_timeout_ms {
            settings.request_timeout_ms = value;
        }
        if let Some(value) = self.max_attempts {
            settings.max_attempts = value;
        }
        if let Some(value) = self.retry_delay_ms {
            settings.retry_delay_ms = value;
        }
        if let Some(value) = self.on_rejection {
            settings.on_rejection = value;
        }
        if let Some(value) = self.success_display_ms {
            settings.success_display_ms = value;
        }
    }
}

/// Run the configure command.
pub async fn run(data_dir: &Path, update: SettingsUpdate) -> Result<KioskSettings> {
    let mut settings = if KioskSettings::exists(data_dir).await {
        KioskSettings::load(data_dir).await?
    } else {
        let server = update
            .server
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("First-time setup needs --server <host>"))?;
        KioskSettings::new(server)
    };

    update.apply(&mut settings);
    if settings.server.trim().is_empty() {
        anyhow::bail!("Server address cannot be empty");
    }
    settings.save(data_dir).await?;

    println!("Settings saved to {}", KioskSettings::path(data_dir).display());
    Ok(settings)
}
