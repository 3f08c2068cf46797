//! # CRSF Protocol Constants and Types
//!
//! Wire constants and the typed telemetry records carried by CRSF frames.
//!
//! Frame layout on the wire:
//!
//! ```text
//! [sync] [length] [type] [payload ...] [crc]
//!   C8    N        1 B    N - 2 bytes   1 B
//! ```
//!
//! `length` counts `type + payload + crc`, so a complete frame is
//! `length + 2` bytes long.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TelemetryError};

/// CRSF frame sync byte (always 0xC8)
pub const CRSF_SYNC_BYTE: u8 = 0xC8;

/// Smallest complete frame: sync(1) + length(1) + type(1) + crc(1)
pub const CRSF_MIN_FRAME_SIZE: usize = 4;

/// Largest complete frame accepted on the wire
pub const CRSF_MAX_FRAME_SIZE: usize = 64;

/// Bytes that are not payload: sync, length, type, crc
pub const CRSF_FRAME_OVERHEAD: usize = 4;

/// Maximum CRSF payload size (64 - 4 = 60 bytes)
pub const CRSF_MAX_PAYLOAD_SIZE: usize = CRSF_MAX_FRAME_SIZE - CRSF_FRAME_OVERHEAD;

/// GPS packet type
pub const CRSF_FRAMETYPE_GPS: u8 = 0x02;

/// Battery Sensor packet type
pub const CRSF_FRAMETYPE_BATTERY_SENSOR: u8 = 0x08;

/// Link Statistics packet type
pub const CRSF_FRAMETYPE_LINK_STATISTICS: u8 = 0x14;

/// Attitude packet type
pub const CRSF_FRAMETYPE_ATTITUDE: u8 = 0x1E;

/// Flight Mode packet type
pub const CRSF_FRAMETYPE_FLIGHT_MODE: u8 = 0x21;

/// GPS payload size
pub const CRSF_GPS_PAYLOAD_SIZE: usize = 15;

/// Minimum Battery Sensor payload (voltage only)
pub const CRSF_BATTERY_VOLTAGE_PAYLOAD_SIZE: usize = 2;

/// Full Battery Sensor payload (voltage, current, capacity, remaining)
pub const CRSF_BATTERY_SENSOR_PAYLOAD_SIZE: usize = 8;

/// Minimum Link Statistics payload (rssi1, rssi2, lq, snr)
pub const CRSF_LINK_STATS_MIN_PAYLOAD_SIZE: usize = 4;

/// Full Link Statistics payload
pub const CRSF_LINK_STATS_PAYLOAD_SIZE: usize = 10;

/// Attitude payload size (pitch, roll, yaw)
pub const CRSF_ATTITUDE_PAYLOAD_SIZE: usize = 6;

/// Minimum Flight Mode payload
pub const CRSF_FLIGHT_MODE_MIN_PAYLOAD_SIZE: usize = 1;

/// Human readable name of a frame type, for logs
pub fn frame_type_name(frame_type: u8) -> &'static str {
    match frame_type {
        CRSF_FRAMETYPE_GPS => "GPS",
        CRSF_FRAMETYPE_BATTERY_SENSOR => "Battery",
        CRSF_FRAMETYPE_LINK_STATISTICS => "LinkStatistics",
        CRSF_FRAMETYPE_ATTITUDE => "Attitude",
        CRSF_FRAMETYPE_FLIGHT_MODE => "FlightMode",
        _ => "Unknown",
    }
}

/// GPS telemetry data
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GpsData {
    /// Latitude in degrees
    pub latitude: f64,

    /// Longitude in degrees
    pub longitude: f64,

    /// Ground speed in m/s
    pub ground_speed: f32,

    /// Heading in degrees
    pub heading: f32,

    /// Altitude in meters
    pub altitude: i32,

    /// Number of satellites
    pub satellites: u8,
}

/// Battery sensor telemetry data
///
/// Only the voltage is guaranteed; the remaining fields are present when the
/// sender transmits the full 8-byte payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatterySensor {
    /// Battery voltage in volts
    pub voltage: f32,

    /// Current draw in amperes
    pub current: Option<f32>,

    /// Capacity used in mAh
    pub capacity_used: Option<u32>,

    /// Battery remaining percentage (0-100%)
    pub remaining_percent: Option<u8>,
}

/// Link statistics telemetry data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LinkStatistics {
    /// Uplink RSSI (antenna 1) in -dBm
    pub uplink_rssi_1: u8,

    /// Uplink RSSI (antenna 2) in -dBm (diversity)
    pub uplink_rssi_2: u8,

    /// Uplink link quality (0-100%)
    pub uplink_lq: u8,

    /// Uplink SNR in dB
    pub uplink_snr: i8,

    /// Remaining fields of the full 10-byte layout
    pub downlink: Option<LinkStatisticsDownlink>,
}

/// Second half of a full Link Statistics payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LinkStatisticsDownlink {
    /// Active antenna (0 or 1)
    pub active_antenna: u8,

    /// RF mode / packet rate
    pub rf_mode: u8,

    /// Uplink TX power (encoded)
    pub uplink_tx_power: u8,

    /// Downlink RSSI in -dBm
    pub downlink_rssi: u8,

    /// Downlink link quality (0-100%)
    pub downlink_lq: u8,

    /// Downlink SNR in dB
    pub downlink_snr: i8,
}

/// Attitude telemetry data, in radians
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Attitude {
    pub pitch: f32,
    pub roll: f32,
    pub yaw: f32,
}

/// How the trailing bytes of a Flight Mode payload are stripped
///
/// Senders usually terminate the mode string with a NUL. Some firmware pads
/// a fixed number of trailing bytes instead; `FixedTrailer(n)` drops exactly
/// `n` bytes from the end before decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightModeTrim {
    /// Cut at the first NUL byte
    #[default]
    NullTerminated,

    /// Drop a fixed number of trailing bytes
    FixedTrailer(usize),
}

/// A decoded, structurally valid telemetry packet
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryEvent {
    Gps(GpsData),
    Battery(BatterySensor),
    LinkStatistics(LinkStatistics),
    Attitude(Attitude),
    FlightMode { mode: String },
    /// Checksum-valid frame of a type this decoder does not interpret
    Unknown { frame_type: u8, payload: Vec<u8> },
}

impl TelemetryEvent {
    /// Wire type code this event was decoded from
    pub fn frame_type(&self) -> u8 {
        match self {
            TelemetryEvent::Gps(_) => CRSF_FRAMETYPE_GPS,
            TelemetryEvent::Battery(_) => CRSF_FRAMETYPE_BATTERY_SENSOR,
            TelemetryEvent::LinkStatistics(_) => CRSF_FRAMETYPE_LINK_STATISTICS,
            TelemetryEvent::Attitude(_) => CRSF_FRAMETYPE_ATTITUDE,
            TelemetryEvent::FlightMode { .. } => CRSF_FRAMETYPE_FLIGHT_MODE,
            TelemetryEvent::Unknown { frame_type, .. } => *frame_type,
        }
    }
}

impl fmt::Display for TelemetryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryEvent::Gps(gps) => write!(
                f,
                "GPS lat={:.7} lon={:.7} speed={:.2}m/s heading={:.1}° alt={}m sats={}",
                gps.latitude, gps.longitude, gps.ground_speed, gps.heading, gps.altitude, gps.satellites
            ),
            TelemetryEvent::Battery(battery) => {
                write!(f, "Battery {:.1}V", battery.voltage)?;
                if let Some(current) = battery.current {
                    write!(f, " {:.1}A", current)?;
                }
                if let Some(capacity) = battery.capacity_used {
                    write!(f, " {}mAh", capacity)?;
                }
                if let Some(remaining) = battery.remaining_percent {
                    write!(f, " {}%", remaining)?;
                }
                Ok(())
            }
            TelemetryEvent::LinkStatistics(stats) => write!(
                f,
                "Link RSSI1=-{}dBm RSSI2=-{}dBm LQ={}% SNR={}dB",
                stats.uplink_rssi_1, stats.uplink_rssi_2, stats.uplink_lq, stats.uplink_snr
            ),
            TelemetryEvent::Attitude(att) => write!(
                f,
                "Attitude pitch={:.4} roll={:.4} yaw={:.4} rad",
                att.pitch, att.roll, att.yaw
            ),
            TelemetryEvent::FlightMode { mode } => write!(f, "Flight mode {:?}", mode),
            TelemetryEvent::Unknown { frame_type, payload } => write!(
                f,
                "Unknown type 0x{:02X} payload {:02X?}",
                frame_type, payload
            ),
        }
    }
}

/// CRSF frame structure
#[derive(Debug, Clone)]
pub struct CrsfFrame {
    /// Frame type
    pub frame_type: u8,

    /// Payload data
    pub payload: Vec<u8>,
}

impl CrsfFrame {
    /// Create a new CRSF frame
    ///
    /// # Errors
    ///
    /// Returns error if payload exceeds CRSF_MAX_PAYLOAD_SIZE (60 bytes)
    pub fn new(frame_type: u8, payload: Vec<u8>) -> Result<Self> {
        if payload.len() > CRSF_MAX_PAYLOAD_SIZE {
            return Err(TelemetryError::CrsfProtocol(
                format!("Payload size {} exceeds maximum {}", payload.len(), CRSF_MAX_PAYLOAD_SIZE)
            ));
        }

        Ok(Self {
            frame_type,
            payload,
        })
    }

    /// Get frame length field (type + payload + crc)
    ///
    /// Cannot overflow since payload is validated to be ≤ 60 bytes
    pub fn length(&self) -> u8 {
        (1 + self.payload.len() + 1) as u8
    }

    /// Total bytes on the wire (length field + sync + length byte)
    pub fn total_len(&self) -> usize {
        self.length() as usize + 2
    }
}
