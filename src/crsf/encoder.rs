//! # CRSF Frame Encoder
//!
//! Builds complete, checksum-valid CRSF frames from a type and payload.
//! Used to produce fixtures and replay captures; this crate never transmits.

use super::crc::Crc8;
use super::protocol::*;
use crate::error::Result;

/// Encode a [`CrsfFrame`] into its wire bytes
///
/// Produces `sync + length + type + payload + crc`, with the CRC computed
/// over `type + payload`.
///
/// # Examples
///
/// ```
/// use crsf_telemetry::crsf::encoder::encode_frame;
/// use crsf_telemetry::crsf::protocol::{CrsfFrame, CRSF_FRAMETYPE_BATTERY_SENSOR};
///
/// let frame = CrsfFrame::new(CRSF_FRAMETYPE_BATTERY_SENSOR, vec![0x00, 0xF0]).unwrap();
/// let bytes = encode_frame(&frame);
/// assert_eq!(bytes.len(), 6);
/// assert_eq!(&bytes[..3], &[0xC8, 0x04, 0x08]);
/// ```
pub fn encode_frame(frame: &CrsfFrame) -> Vec<u8> {
    let mut crc = Crc8::new();
    crc.update(&[frame.frame_type]);
    crc.update(&frame.payload);

    let mut bytes = Vec::with_capacity(frame.total_len());
    bytes.push(CRSF_SYNC_BYTE);
    bytes.push(frame.length());
    bytes.push(frame.frame_type);
    bytes.extend_from_slice(&frame.payload);
    bytes.push(crc.finish());

    bytes
}

/// Build a frame straight from a type code and payload slice
///
/// # Errors
///
/// Returns error if the payload exceeds CRSF_MAX_PAYLOAD_SIZE
pub fn encode_packet(frame_type: u8, payload: &[u8]) -> Result<Vec<u8>> {
    let frame = CrsfFrame::new(frame_type, payload.to_vec())?;
    Ok(encode_frame(&frame))
}
