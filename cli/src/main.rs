//! Hotel booking service - CLI server
//!
//! Headless booking lifecycle, refund and check-in API suitable for a
//! systemd unit, a container or a standalone process.
//!
//! ```sh
//! # Default config (~/.config/hotel-booking/config.toml)
//! booking-service
//!
//! # Custom config path
//! booking-service --config /etc/hotel-booking/config.toml
//!
//! # Throwaway in-memory store on another port
//! booking-service --memory --api-port 9090
//!
//! # Validate config without starting
//! booking-service --check
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use hotel_booking::config::AppConfig;
use hotel_booking::server::{init_tracing, ServerHandle, ServerOptions};

#[derive(Parser, Debug)]
#[command(
    name = "booking-service",
    version,
    about = "Hotel booking lifecycle, refund and check-in service",
    long_about = "REST API for hotel room and event bookings: lifecycle transitions, \
                  policy-evaluated refunds and QR check-in.\n\n\
                  Default config: ~/.config/hotel-booking/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "BOOKING_CONFIG")]
    config: Option<PathBuf>,

    /// Override the REST API listen port.
    #[arg(long)]
    api_port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Keep bookings in memory instead of the configured database.
    #[arg(long)]
    memory: bool,

    /// Validate the configuration and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(hotel_booking::default_config_path);

    let mut config = match AppConfig::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Invalid configuration in {}: {}", config_path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    // ── CLI overrides ──────────────────────────────────────────
    if let Some(port) = cli.api_port {
        config.server.api_port = port;
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    if cli.memory {
        config.database.memory = true;
    }
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration after overrides: {}", e);
        return ExitCode::FAILURE;
    }

    if cli.check {
        println!("Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   API address : {}:{}", config.server.api_host, config.server.api_port);
        if config.database.memory {
            println!("   Storage     : in-memory");
        } else {
            println!("   Storage     : {}", config.database.url);
        }
        println!("   Currency    : {} (scale {})", config.refunds.currency, config.refunds.currency_scale);
        println!("   Log level   : {}", config.logging.level);
        return ExitCode::SUCCESS;
    }

    init_tracing(&config);
    info!("Configuration loaded from {}", config_path.display());

    let handle = match ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.no_migrate,
    })
    .await
    {
        Ok(handle) => handle,
        Err(e) => {
            error!("Failed to start: {}", e);
            return ExitCode::FAILURE;
        }
    };

    handle.install_signal_handler();
    info!("Press Ctrl+C to shut down gracefully");

    handle.shutdown_signal().wait().await;
    handle.wait().await;

    ExitCode::SUCCESS
}
