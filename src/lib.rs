//! # CRSF Telemetry Library
//!
//! Decode CRSF (Crossfire) telemetry arriving over a serial link.
//!
//! Raw bytes flow one way: byte source → [`crsf::assembler::FrameAssembler`]
//! → [`crsf::decoder::decode_packet`] → [`telemetry::TelemetrySink`].

pub mod config;
pub mod error;
pub mod crsf;
pub mod serial;
pub mod telemetry;
