//! # kiosk
//!
//! Check-in kiosk for climbing contests.
//!
//! ## Commands
//!
//! - `configure`: Create or update kiosk settings
//! - `status`: Show kiosk settings
//! - `check`: Look up one climber or bloc
//! - `register`: Register one climber/bloc pair
//! - `run`: Start the interactive kiosk
//!
//! ## Example
//!
//! ```bash
//! # Point the kiosk at the contest server
//! kiosk configure --server contest.example.org
//!
//! # Check that a bib is known
//! kiosk check climber 12
//!
//! # Run the kiosk; scan "c 12" then "b F3"
//! kiosk run
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use climbcontest_client::{HttpsTransport, MockTransport};
use climbcontest_core::RejectionPolicy;
use climbcontest_types::{ApiVersion, Category};
use serde_json::json;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::configure::SettingsUpdate;
use commands::{check, configure, register, run, status};
use config::KioskSettings;

/// Check-in kiosk for climbing contests.
#[derive(Parser, Debug)]
#[command(name = "kiosk")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Data directory for storing kiosk settings
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use a mock server that accepts everything (for testing/demo)
    #[arg(long, global = true)]
    mock: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create or update kiosk settings
    Configure {
        /// Contest server (host, host:port or base URL)
        #[arg(long)]
        server: Option<String>,

        /// Server API revision (v1 or v2)
        #[arg(long)]
        api_version: Option<ApiVersion>,

        /// Keep the climber between registrations
        #[arg(long)]
        auto_evaluate: Option<bool>,

        /// Wait for an explicit submit instead of submitting on the second scan
        #[arg(long)]
        manual_submit: Option<bool>,

        /// Send the session token on v2 requests too
        #[arg(long)]
        tag_requests: Option<bool>,

        /// Accept self-signed server certificates
        #[arg(long)]
        accept_invalid_certs: Option<bool>,

        /// Per-request timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Registration attempts, including the first
        #[arg(long)]
        max_attempts: Option<u32>,

        /// Pause between registration attempts in milliseconds
        #[arg(long)]
        retry_delay_ms: Option<u64>,

        /// Stop retrying when the server rejects a registration
        #[arg(long)]
        stop_on_rejection: Option<bool>,

        /// How long a registration stays on screen, in milliseconds
        #[arg(long)]
        success_display_ms: Option<u64>,
    },

    /// Show kiosk settings
    Status,

    /// Look up one climber or bloc
    Check {
        /// climber or bloc
        category: Category,

        /// Identifier to look up
        id: String,
    },

    /// Register one climber/bloc pair
    Register {
        /// Climber bib
        bib: String,

        /// Bloc identifier
        bloc: String,
    },

    /// Start the interactive kiosk
    Run,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Determine data directory
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };

    // Ensure data directory exists
    tokio::fs::create_dir_all(&data_dir)
        .await
        .context("Failed to create data directory")?;
    config::set_dir_permissions_0700(&data_dir).await?;

    match cli.command {
        Commands::Configure {
            server,
            api_version,
            auto_evaluate,
            manual_submit,
            tag_requests,
            accept_invalid_certs,
            timeout_ms,
            max_attempts,
            retry_delay_ms,
            stop_on_rejection,
            success_display_ms,
        } => {
            let update = SettingsUpdate {
                server,
                api_version,
                auto_evaluate,
                manual_submit,
                tag_requests,
                accept_invalid_certs,
                request_timeout_ms: timeout_ms,
                max_attempts,
                retry_delay_ms,
                on_rejection: stop_on_rejection.map(|stop| {
                    if stop {
                        RejectionPolicy::Terminal
                    } else {
                        RejectionPolicy::Retry
                    }
                }),
                success_display_ms,
            };
            configure::run(&data_dir, update).await?;
        }
        Commands::Status => {
            status::run(&data_dir).await?;
        }
        Commands::Check { category, id } => {
            let settings = KioskSettings::load(&data_dir).await?;
            if cli.mock {
                check::run(mock_server(), settings.api_config(), category, &id).await?;
            } else {
                let transport = HttpsTransport::new(&settings.transport_config())
                    .context("Failed to set up HTTPS transport")?;
                check::run(transport, settings.api_config(), category, &id).await?;
            }
        }
        Commands::Register { bib, bloc } => {
            let settings = KioskSettings::load(&data_dir).await?;
            let (api, policy) = (settings.api_config(), settings.retry_policy());
            if cli.mock {
                register::run(mock_server(), api, policy, &bib, &bloc).await?;
            } else {
                let transport = HttpsTransport::new(&settings.transport_config())
                    .context("Failed to set up HTTPS transport")?;
                register::run(transport, api, policy, &bib, &bloc).await?;
            }
        }
        Commands::Run => {
            let settings = KioskSettings::load(&data_dir).await?;
            if cli.mock {
                run::run(&data_dir, settings, mock_server()).await?;
            } else {
                let transport = HttpsTransport::new(&settings.transport_config())
                    .context("Failed to set up HTTPS transport")?;
                run::run(&data_dir, settings, transport).await?;
            }
        }
    }

    Ok(())
}

/// Mock server that confirms every id and accepts every registration.
fn mock_server() -> MockTransport {
    let transport = MockTransport::new();
    transport.always(Ok(json!({ "success": true })));
    transport
}

/// Get the default data directory for the kiosk.
fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("org", "climbcontest", "kiosk")
        .context("Could not determine home directory")?;
    Ok(dirs.data_dir().to_path_buf())
}
