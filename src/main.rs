//! # CRSF Telemetry
//!
//! Listen to a CRSF (Crossfire) telemetry link and print what it says.
//!
//! Reads raw bytes from a serial port (or a captured byte file), recovers
//! frames, decodes them and hands the results to the console and, when
//! enabled, a rotating JSONL log.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, error, info, warn};

use crsf_telemetry::config::Config;
use crsf_telemetry::serial::TelemetrySerial;
use crsf_telemetry::telemetry::{pump, ConsoleSink, JsonlLogger, TelemetryReader, TelemetrySink};

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "crsf-telemetry", version, about = "Decode CRSF telemetry from a serial link")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial port (overrides the configuration file)
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate (overrides the configuration file)
    #[arg(short, long)]
    baud: Option<u32>,

    /// Decode a captured raw byte file instead of a serial port
    #[arg(long, conflicts_with_all = ["port", "baud"])]
    replay: Option<PathBuf>,
}

/// Main entry point for CRSF Telemetry
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging with tracing subscriber
///    - Load configuration and apply command line overrides
///    - Build the output sinks (console, optional JSONL log)
///
/// 2. **Main Loop**
///    - Open the serial port and decode frames as they arrive
///    - Log a note when the link has been quiet for `timeout_ms`
///    - On I/O failure, wait `reconnect_interval_ms` and reopen
///    - Handle Ctrl+C for graceful shutdown
///
/// # Examples
///
/// ```bash
/// cargo run --release -- --port /dev/ttyUSB0 --baud 416666
/// cargo run --release -- --replay capture.bin
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
        )
        .init();

    info!("CRSF Telemetry v{} starting...", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(port) = args.port {
        config.serial.port = port;
    }
    if let Some(baud) = args.baud {
        config.serial.baud_rate = baud;
    }
    config.validate().context("Invalid configuration")?;

    let mut sinks: Vec<Box<dyn TelemetrySink>> = vec![Box::new(ConsoleSink::new())];
    if config.telemetry.enabled {
        sinks.push(Box::new(JsonlLogger::new(&config.telemetry)?));
    }

    if let Some(path) = args.replay {
        let file = tokio::fs::File::open(&path)
            .await
            .with_context(|| format!("Failed to open capture {}", path.display()))?;
        let mut reader = TelemetryReader::new(file, config.decoder.options());
        let summary = pump(&mut reader, &mut sinks).await?;
        info!(
            "Replay finished: {} events, {} diagnostics, {} bytes discarded",
            summary.events,
            summary.diagnostics,
            reader.stats().discarded_bytes
        );
        return Ok(());
    }

    tokio::select! {
        result = listen(&config, &mut sinks) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
            Ok(())
        }
    }
}

/// Read from the serial link forever, reopening it after failures
async fn listen<S>(config: &Config, sinks: &mut S) -> Result<()>
where
    S: TelemetrySink + ?Sized,
{
    let idle = Duration::from_millis(config.serial.timeout_ms);
    let reconnect = Duration::from_millis(config.serial.reconnect_interval_ms);

    loop {
        let serial = match TelemetrySerial::open(&config.serial) {
            Ok(serial) => serial,
            Err(e) => {
                warn!("{}; retrying in {:?}", e, reconnect);
                sleep(reconnect).await;
                continue;
            }
        };
        info!("Listening for CRSF telemetry on {}", serial.device_path());

        let mut reader = serial.into_reader(config.decoder.options());

        loop {
            match timeout(idle, reader.next()).await {
                Err(_) => debug!("No telemetry for {:?}", idle),
                Ok(Ok(Some(Ok(event)))) => {
                    if let Err(e) = sinks.on_event(&event) {
                        error!("Telemetry sink failed: {}", e);
                    }
                }
                Ok(Ok(Some(Err(diagnostic)))) => {
                    if let Err(e) = sinks.on_diagnostic(&diagnostic) {
                        error!("Telemetry sink failed: {}", e);
                    }
                }
                Ok(Ok(None)) => {
                    warn!("Serial stream closed");
                    break;
                }
                Ok(Err(e)) => {
                    warn!("Serial read failed: {}", e);
                    break;
                }
            }
        }

        let stats = reader.stats();
        info!(
            "Link lost after {} frames ({} bytes discarded, {} resyncs); reconnecting in {:?}",
            stats.frames, stats.discarded_bytes, stats.resync_drops, reconnect
        );
        sleep(reconnect).await;
    }
}
