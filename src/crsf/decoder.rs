//! # CRSF Packet Decoder
//!
//! Validates candidate frames and decodes telemetry payloads (GPS, Battery,
//! Link Statistics, Attitude, Flight Mode).
//!
//! All multi-byte fields are big-endian. Every decode is independent: a bad
//! frame produces a [`Diagnostic`] and leaves nothing behind for the next one.

use serde::Serialize;
use thiserror::Error;

use super::crc::crc8_dvb_s2;
use super::protocol::*;

/// Per-frame decode problem
///
/// These are reported alongside telemetry rather than propagated as errors.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The trailing CRC byte does not match the computed checksum
    #[error("CRC mismatch: expected 0x{expected:02X}, got 0x{received:02X} (frame {frame:02X?})")]
    ChecksumMismatch {
        frame: Vec<u8>,
        expected: u8,
        received: u8,
    },

    /// Recognized type whose payload is too short for its fields
    #[error("Payload for type 0x{frame_type:02X} too short: {actual} bytes, need {required}")]
    MalformedPayload {
        frame_type: u8,
        required: usize,
        actual: usize,
    },

    /// Bytes that do not form a frame at all (bad sync, bad length)
    #[error("Invalid frame of {len} bytes: {reason}")]
    InvalidFrame { len: usize, reason: String },
}

/// Result of decoding one candidate frame
pub type Decoded = std::result::Result<TelemetryEvent, Diagnostic>;

/// Options that change how payloads are interpreted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderOptions {
    pub flight_mode_trim: FlightModeTrim,
}

/// Validate and decode a complete CRSF frame
///
/// # Arguments
///
/// * `frame` - Complete frame bytes (sync, length, type, payload, crc), as
///   produced by the frame assembler
/// * `options` - Payload interpretation options
///
/// # Returns
///
/// * `Ok(TelemetryEvent)` - Decoded telemetry, or `TelemetryEvent::Unknown`
///   for a valid frame of an unrecognized type
/// * `Err(Diagnostic)` - Checksum mismatch, short payload, or a slice that
///   is not a frame
pub fn decode_packet(frame: &[u8], options: &DecoderOptions) -> Decoded {
    check_frame_shape(frame)?;

    let crc_index = frame.len() - 1;
    let expected = crc8_dvb_s2(&frame[2..crc_index]);
    let received = frame[crc_index];

    if expected != received {
        return Err(Diagnostic::ChecksumMismatch {
            frame: frame.to_vec(),
            expected,
            received,
        });
    }

    let frame_type = frame[2];
    let payload = &frame[3..crc_index];

    match frame_type {
        CRSF_FRAMETYPE_GPS => decode_gps(payload).map(TelemetryEvent::Gps),
        CRSF_FRAMETYPE_BATTERY_SENSOR => decode_battery_sensor(payload).map(TelemetryEvent::Battery),
        CRSF_FRAMETYPE_LINK_STATISTICS => {
            decode_link_statistics(payload).map(TelemetryEvent::LinkStatistics)
        }
        CRSF_FRAMETYPE_ATTITUDE => decode_attitude(payload).map(TelemetryEvent::Attitude),
        CRSF_FRAMETYPE_FLIGHT_MODE => decode_flight_mode(payload, options.flight_mode_trim)
            .map(|mode| TelemetryEvent::FlightMode { mode }),
        _ => Ok(TelemetryEvent::Unknown {
            frame_type,
            payload: payload.to_vec(),
        }),
    }
}

fn check_frame_shape(frame: &[u8]) -> std::result::Result<(), Diagnostic> {
    let invalid = |reason: String| Diagnostic::InvalidFrame {
        len: frame.len(),
        reason,
    };

    if frame.len() < CRSF_MIN_FRAME_SIZE || frame.len() > CRSF_MAX_FRAME_SIZE {
        return Err(invalid(format!(
            "size outside {}..={}",
            CRSF_MIN_FRAME_SIZE, CRSF_MAX_FRAME_SIZE
        )));
    }

    if frame[0] != CRSF_SYNC_BYTE {
        return Err(invalid(format!("sync byte 0x{:02X}", frame[0])));
    }

    if frame[1] as usize + 2 != frame.len() {
        return Err(invalid(format!("length field {} does not match", frame[1])));
    }

    Ok(())
}

fn require(frame_type: u8, payload: &[u8], required: usize) -> std::result::Result<(), Diagnostic> {
    if payload.len() < required {
        return Err(Diagnostic::MalformedPayload {
            frame_type,
            required,
            actual: payload.len(),
        });
    }
    Ok(())
}

/// Decode GPS telemetry packet
///
/// # Arguments
///
/// * `payload` - GPS payload (15 bytes)
///
/// # Returns
///
/// * `Result<GpsData, Diagnostic>` - Decoded GPS data
pub fn decode_gps(payload: &[u8]) -> std::result::Result<GpsData, Diagnostic> {
    require(CRSF_FRAMETYPE_GPS, payload, CRSF_GPS_PAYLOAD_SIZE)?;

    // Latitude / longitude: degrees × 10^7
    let lat_raw = i32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]);
    let lon_raw = i32::from_be_bytes([payload[4], payload[5], payload[6], payload[7]]);

    // Ground speed: km/h × 10, so /36 gives m/s
    let speed_raw = u16::from_be_bytes([payload[8], payload[9]]);

    // Heading: degrees × 100
    let heading_raw = u16::from_be_bytes([payload[10], payload[11]]);

    // Altitude: meters + 1000
    let altitude_raw = u16::from_be_bytes([payload[12], payload[13]]);

    Ok(GpsData {
        latitude: lat_raw as f64 / 10_000_000.0,
        longitude: lon_raw as f64 / 10_000_000.0,
        ground_speed: speed_raw as f32 / 36.0,
        heading: heading_raw as f32 / 100.0,
        altitude: altitude_raw as i32 - 1000,
        satellites: payload[14],
    })
}

/// Decode Battery Sensor telemetry packet
///
/// Voltage (decivolts) is required. Current, capacity and remaining charge
/// are filled in only when the full 8-byte payload is present.
pub fn decode_battery_sensor(payload: &[u8]) -> std::result::Result<BatterySensor, Diagnostic> {
    require(CRSF_FRAMETYPE_BATTERY_SENSOR, payload, CRSF_BATTERY_VOLTAGE_PAYLOAD_SIZE)?;

    let voltage_dv = u16::from_be_bytes([payload[0], payload[1]]);
    let mut battery = BatterySensor {
        voltage: voltage_dv as f32 / 10.0,
        current: None,
        capacity_used: None,
        remaining_percent: None,
    };

    if payload.len() >= CRSF_BATTERY_SENSOR_PAYLOAD_SIZE {
        // Current: deci-amps
        let current_da = u16::from_be_bytes([payload[2], payload[3]]);
        battery.current = Some(current_da as f32 / 10.0);
        // Capacity: 3 bytes, mAh
        battery.capacity_used = Some(u32::from_be_bytes([0, payload[4], payload[5], payload[6]]));
        battery.remaining_percent = Some(payload[7]);
    }

    Ok(battery)
}

/// Decode Link Statistics telemetry packet
///
/// The first four bytes are required; the downlink block is decoded when
/// the full 10-byte payload is present.
pub fn decode_link_statistics(payload: &[u8]) -> std::result::Result<LinkStatistics, Diagnostic> {
    require(CRSF_FRAMETYPE_LINK_STATISTICS, payload, CRSF_LINK_STATS_MIN_PAYLOAD_SIZE)?;

    let downlink = (payload.len() >= CRSF_LINK_STATS_PAYLOAD_SIZE).then(|| LinkStatisticsDownlink {
        active_antenna: payload[4],
        rf_mode: payload[5],
        uplink_tx_power: payload[6],
        downlink_rssi: payload[7],
        downlink_lq: payload[8],
        downlink_snr: payload[9] as i8,
    });

    Ok(LinkStatistics {
        uplink_rssi_1: payload[0],
        uplink_rssi_2: payload[1],
        uplink_lq: payload[2],
        uplink_snr: payload[3] as i8,
        downlink,
    })
}

/// Decode Attitude telemetry packet (radians × 10000)
pub fn decode_attitude(payload: &[u8]) -> std::result::Result<Attitude, Diagnostic> {
    require(CRSF_FRAMETYPE_ATTITUDE, payload, CRSF_ATTITUDE_PAYLOAD_SIZE)?;

    let angle = |hi: u8, lo: u8| i16::from_be_bytes([hi, lo]) as f32 / 10_000.0;

    Ok(Attitude {
        pitch: angle(payload[0], payload[1]),
        roll: angle(payload[2], payload[3]),
        yaw: angle(payload[4], payload[5]),
    })
}

/// Decode Flight Mode telemetry packet
///
/// The payload is ASCII text. `trim` selects how the terminator is removed;
/// trailing control bytes are stripped either way. Non-ASCII bytes are
/// replaced rather than rejected.
pub fn decode_flight_mode(payload: &[u8], trim: FlightModeTrim) -> std::result::Result<String, Diagnostic> {
    require(CRSF_FRAMETYPE_FLIGHT_MODE, payload, CRSF_FLIGHT_MODE_MIN_PAYLOAD_SIZE)?;

    let text = match trim {
        FlightModeTrim::NullTerminated => {
            let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
            &payload[..end]
        }
        FlightModeTrim::FixedTrailer(count) => &payload[..payload.len().saturating_sub(count)],
    };

    let mode = String::from_utf8_lossy(text);
    Ok(mode.trim_end_matches(|c: char| c.is_control()).to_string())
}
