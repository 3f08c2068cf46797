//! # CRSF Protocol Module
//!
//! Receive side of the Crossfire (CRSF) protocol.
//!
//! This module handles:
//! - Frame synchronization over an unstructured byte stream
//! - CRC8-DVB-S2 checksum calculation
//! - Telemetry packet decoding (GPS, Battery, Link Stats, Attitude, Flight Mode)
//! - Frame construction for fixtures and replays

pub mod protocol;
pub mod assembler;
pub mod encoder;
pub mod decoder;
pub mod crc;
