//! Turnlink serial console.
//!
//! # Usage
//!
//! ```bash
//! # Prompt for the port, 9600 baud
//! turnlink
//!
//! # Explicit port and speed
//! turnlink --port /dev/ttyUSB0 --baud 115200
//!
//! # Show what is plugged in
//! turnlink --list-ports
//! ```

mod console;
mod error;

use std::{io, path::PathBuf, process::ExitCode, time::Duration};

use clap::Parser;
use console::{ConsoleOutput, StdinOperator};
use error::CliError;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use turnlink_app::{
    Session, SessionConfig,
    serial::{self, SerialSettings, SerialTransport},
};
use turnlink_core::DEFAULT_CONFIG_PATH;

/// Half-duplex serial console for a turn-based game device
#[derive(Parser, Debug)]
#[command(name = "turnlink")]
#[command(about = "Talk to a turn-based game device over a serial line")]
#[command(version)]
struct Args {
    /// Serial device, e.g. /dev/ttyUSB0 or COM3 (prompted for if omitted)
    #[arg(short, long)]
    port: Option<String>,

    /// Line speed
    #[arg(short, long, default_value = "9600")]
    baud: u32,

    /// Read timeout in milliseconds
    #[arg(long, default_value = "1000")]
    timeout_ms: u64,

    /// Where `save` writes the game configuration
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config_path: PathBuf,

    /// List available serial ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            // Nothing left to report to if the console itself is gone
            let _ = console::say(&format!("Error: {e}"));
            ExitCode::FAILURE
        },
    }
}

async fn run(args: Args) -> Result<(), CliError> {
    if args.list_ports {
        return list_ports();
    }

    let port = match args.port {
        Some(port) => port,
        None => console::prompt_line("Enter the serial port (e.g., /dev/ttyUSB0 or COM3): ")?
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .ok_or(CliError::NoPort)?,
    };

    let settings = SerialSettings {
        port,
        baud_rate: args.baud,
        timeout: Duration::from_millis(args.timeout_ms),
    };
    let transport = SerialTransport::open(&settings)?;

    let session =
        Session::new(transport, ConsoleOutput, SessionConfig { config_path: args.config_path });
    let input = StdinOperator::spawn()?;
    let end = session.run(input, shutdown_signal()).await?;

    tracing::info!(?end, "turnlink finished");
    Ok(())
}

fn list_ports() -> Result<(), CliError> {
    let ports = serial::available_ports()?;
    if ports.is_empty() {
        console::say("No serial ports found")?;
    }
    for port in ports {
        console::say(&port)?;
    }
    Ok(())
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}
