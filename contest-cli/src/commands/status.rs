//! Show kiosk settings.

use anyhow::Result;
use std::path::Path;

use crate::config::KioskSettings;

/// Run the status command.
pub async fn run(data_dir: &Path) -> Result<()> {
    println!("=== kiosk status ===");
    println!();

    let settings = match KioskSettings::load(data_dir).await {
        Ok(settings) => settings,
        Err(_) => {
            println!("Settings: NOT CONFIGURED");
            println!();
            println!("Run 'kiosk configure --server <host>' to get started.");
            return Ok(());
        }
    };

    println!("Server:");
    println!("  Address:     {}", settings.server);
    println!("  API:         {}", settings.api_version);
    println!("  Timeout:     {} ms", settings.request_timeout_ms);
    println!(
        "  TLS:         {}",
        if settings.accept_invalid_certs {
            "self-signed accepted"
        } else {
            "verified"
        }
    );
    println!(
        "  Tagging:     {}",
        if settings.tag_requests || settings.api_version.requires_token() {
            "session token sent"
        } else {
            "off"
        }
    );
    println!();

    println!("Session:");
    println!("  Mode:        {}", mode_label(&settings));
    println!(
        "  Submit:      {}",
        if settings.manual_submit {
            "manual"
        } else {
            "on second scan"
        }
    );
    println!("  Reset after: {} ms", settings.success_display_ms);
    println!();

    println!("Registration:");
    println!(
        "  Attempts:    {} ({} ms apart)",
        settings.max_attempts, settings.retry_delay_ms
    );
    println!("  Rejection:   {:?}", settings.on_rejection);

    Ok(())
}

fn mode_label(settings: &KioskSettings) -> &'static str {
    if settings.auto_evaluate {
        "auto-evaluate (climber kept between blocs)"
    } else {
        "standard (full reset after each pair)"
    }
}
