//! # Serial Communication Module
//!
//! Opens the serial link that carries CRSF telemetry.
//!
//! This module handles:
//! - Opening a serial port (8N1, no flow control) at the configured baud rate
//! - Auto-detecting the device over common paths
//! - Handing the port to a [`TelemetryReader`] as its byte source

use crate::config::SerialConfig;
use crate::crsf::decoder::DecoderOptions;
use crate::error::{Result, TelemetryError};
use crate::telemetry::TelemetryReader;
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

/// Default device paths to try when no port is configured (in order of preference)
pub const DEFAULT_DEVICE_PATHS: &[&str] = &[
    "/dev/ttyACM0", // USB CDC devices (most common for ELRS)
    "/dev/ttyUSB0", // USB-to-serial adapters
];

/// Serial port carrying CRSF telemetry
pub struct TelemetrySerial {
    port: tokio_serial::SerialStream,
    device_path: String,
}

impl std::fmt::Debug for TelemetrySerial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetrySerial")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl TelemetrySerial {
    /// Open the port described by `config`
    ///
    /// An empty `port` tries [`DEFAULT_DEVICE_PATHS`] in order.
    ///
    /// # Errors
    ///
    /// Returns error if no device could be opened
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use crsf_telemetry::config::SerialConfig;
    /// use crsf_telemetry::serial::TelemetrySerial;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let serial = TelemetrySerial::open(&SerialConfig::default())?;
    ///     println!("Listening on {}", serial.device_path());
    ///     Ok(())
    /// }
    /// ```
    pub fn open(config: &SerialConfig) -> Result<Self> {
        if config.port.is_empty() {
            Self::open_with_paths(DEFAULT_DEVICE_PATHS, config.baud_rate)
        } else {
            Self::open_with_paths(&[config.port.as_str()], config.baud_rate)
        }
    }

    /// Open the first device in `paths` that can be opened
    pub fn open_with_paths(paths: &[&str], baud_rate: u32) -> Result<Self> {
        for path in paths {
            debug!("Trying to open serial port: {}", path);

            match Self::open_port(path, baud_rate) {
                Ok(port) => {
                    info!("Opened {} at {} baud", path, baud_rate);
                    return Ok(Self {
                        port,
                        device_path: path.to_string(),
                    });
                }
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                    continue;
                }
            }
        }

        Err(TelemetryError::SerialPortNotFound(paths.join(", ")))
    }

    fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| TelemetryError::Serial(format!("Failed to open {}: {}", path, e)))?;

        Ok(port)
    }

    /// Get the device path of the opened serial port
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Turn the port into a decoding reader
    pub fn into_reader(self, options: DecoderOptions) -> TelemetryReader<tokio_serial::SerialStream> {
        TelemetryReader::new(self.port, options)
    }
}
