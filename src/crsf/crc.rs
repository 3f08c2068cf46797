//! # CRC8-DVB-S2 Implementation
//!
//! CRC-8-DVB-S2 checksum used to validate CRSF frames.
//!
//! **Polynomial**: 0xD5 (x^8 + x^7 + x^6 + x^4 + x^2 + 1)
//! **Initial Value**: 0x00, no reflection, no final XOR
//!
//! The checksum covers `type + payload`: frame bytes `2 .. len - 1`.

/// CRC-8-DVB-S2 polynomial
const CRC8_POLY: u8 = 0xD5;

/// Precomputed lookup table, one entry per input byte
const CRC8_TABLE: [u8; 256] = generate_crc8_table();

const fn generate_crc8_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;

    while i < 256 {
        let mut crc = i as u8;
        let mut j = 0;

        while j < 8 {
            if (crc & 0x80) != 0 {
                crc = (crc << 1) ^ CRC8_POLY;
            } else {
                crc <<= 1;
            }
            j += 1;
        }

        table[i] = crc;
        i += 1;
    }

    table
}

/// Incremental CRC8-DVB-S2 accumulator
///
/// Lives for a single checksum computation.
///
/// ```
/// use crsf_telemetry::crsf::crc::{crc8_dvb_s2, Crc8};
///
/// let mut crc = Crc8::new();
/// crc.update(&[0x08]);
/// crc.update(&[0x00, 0xF0]);
/// assert_eq!(crc.finish(), crc8_dvb_s2(&[0x08, 0x00, 0xF0]));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Crc8 {
    value: u8,
}

impl Crc8 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            self.value = CRC8_TABLE[(self.value ^ byte) as usize];
        }
    }

    pub fn finish(self) -> u8 {
        self.value
    }
}

/// Calculate CRC8-DVB-S2 checksum of `data` (Type + Payload)
pub fn crc8_dvb_s2(data: &[u8]) -> u8 {
    let mut crc = Crc8::new();
    crc.update(data);
    crc.finish()
}

/// Bit-at-a-time reference implementation, used to check the table
#[cfg(test)]
fn crc8_dvb_s2_bitwise(data: &[u8]) -> u8 {
    let mut crc: u8 = 0;

    for &byte in data {
        crc ^= byte;

        for _ in 0..8 {
            if (crc & 0x80) != 0 {
                crc = (crc << 1) ^ CRC8_POLY;
            } else {
                crc <<= 1;
            }
        }
    }

    crc
}
