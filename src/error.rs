//! # Error Types
//!
//! Custom error types for CRSF Telemetry using `thiserror`.
//!
//! Per-frame decode problems are not errors: they are reported as
//! [`Diagnostic`](crate::crsf::decoder::Diagnostic) values so that one bad
//! frame never stops the pipeline.

use thiserror::Error;

/// Main error type for CRSF Telemetry
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// CRSF protocol errors (frame construction)
    #[error("CRSF protocol error: {0}")]
    CrsfProtocol(String),

    /// Serial port errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// None of the candidate serial devices could be opened
    #[error("No serial device found (tried: {0})")]
    SerialPortNotFound(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Telemetry log serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for CRSF Telemetry
pub type Result<T> = std::result::Result<T, TelemetryError>;
