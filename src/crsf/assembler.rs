//! # CRSF Frame Assembler
//!
//! Recovers candidate frames from an arbitrarily chunked byte stream.
//!
//! The stream may start mid-frame, lose bytes, or carry noise. The assembler
//! resynchronizes on the sync byte and, when a length field is implausible,
//! drops exactly one byte and rescans instead of discarding the whole buffer.
//! A single corrupted length byte therefore costs one byte, not every frame
//! already buffered behind it.
//!
//! Candidate frames are only structurally delimited here; checksum and payload
//! validation happen in [`decoder`](super::decoder).

use bytes::{Buf, Bytes, BytesMut};
use tracing::{debug, trace};

use super::protocol::{CRSF_MAX_FRAME_SIZE, CRSF_MIN_FRAME_SIZE, CRSF_SYNC_BYTE};

/// Outcome of one [`FrameAssembler::next_frame`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramePoll {
    /// A complete candidate frame, removed from the buffer
    Frame(Bytes),

    /// Not enough bytes buffered to decide; feed more input
    NeedMore,

    /// No sync byte was present; this many bytes were discarded
    Cleared(usize),
}

/// Counters for bytes the assembler has consumed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblerStats {
    /// Candidate frames emitted
    pub frames: u64,

    /// Bytes discarded as noise (skipped prefixes, cleared buffers, resync drops)
    pub discarded_bytes: u64,

    /// Single-byte drops caused by an out-of-range length field
    pub resync_drops: u64,

    /// Times the whole buffer was cleared for lack of a sync byte
    pub buffer_clears: u64,
}

/// Rolling byte buffer that splits a CRSF stream into candidate frames
///
/// One assembler serves one link; it is not meant to be shared between
/// concurrent callers.
///
/// # Examples
///
/// ```
/// use crsf_telemetry::crsf::assembler::{FrameAssembler, FramePoll};
///
/// let mut assembler = FrameAssembler::new();
/// assembler.feed(&[0x00, 0x13, 0xC8, 0x04, 0x08, 0x00]);
/// assert_eq!(assembler.next_frame(), FramePoll::NeedMore);
///
/// assembler.feed(&[0xF0, 0x2E]);
/// assert!(matches!(assembler.next_frame(), FramePoll::Frame(_)));
/// ```
#[derive(Debug, Default)]
pub struct FrameAssembler {
    buffer: BytesMut,
    stats: AssemblerStats,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(CRSF_MAX_FRAME_SIZE * 4),
            stats: AssemblerStats::default(),
        }
    }

    /// Append received bytes to the buffer
    ///
    /// Empty input is accepted and changes nothing.
    pub fn feed(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to extract one candidate frame
    ///
    /// Call repeatedly until [`FramePoll::NeedMore`] to drain every frame
    /// already buffered. Never blocks and never returns without either
    /// consuming input or reporting `NeedMore`.
    pub fn next_frame(&mut self) -> FramePoll {
        if self.buffer.len() < 2 {
            return FramePoll::NeedMore;
        }

        loop {
            match self.buffer.iter().position(|&b| b == CRSF_SYNC_BYTE) {
                None => {
                    let cleared = self.buffer.len();
                    self.buffer.clear();
                    self.stats.discarded_bytes += cleared as u64;
                    self.stats.buffer_clears += 1;
                    debug!("No sync byte in {} buffered bytes, buffer cleared", cleared);
                    return FramePoll::Cleared(cleared);
                }
                Some(0) => {}
                Some(offset) => {
                    trace!("Skipping {} bytes before sync byte", offset);
                    self.discard(offset);
                }
            }

            if self.buffer.len() < 2 {
                return FramePoll::NeedMore;
            }

            let frame_len = self.buffer[1] as usize + 2;

            if !(CRSF_MIN_FRAME_SIZE..=CRSF_MAX_FRAME_SIZE).contains(&frame_len) {
                trace!("Implausible frame length {}, dropping one byte", frame_len);
                self.discard(1);
                self.stats.resync_drops += 1;
                continue;
            }

            if self.buffer.len() < frame_len {
                return FramePoll::NeedMore;
            }

            self.stats.frames += 1;
            return FramePoll::Frame(self.buffer.split_to(frame_len).freeze());
        }
    }

    /// Extract every complete frame currently buffered, in stream order
    pub fn drain(&mut self) -> Vec<Bytes> {
        let mut frames = Vec::new();

        loop {
            match self.next_frame() {
                FramePoll::Frame(frame) => frames.push(frame),
                FramePoll::Cleared(_) => continue,
                FramePoll::NeedMore => break,
            }
        }

        frames
    }

    /// Feed `data` and return every frame it completes
    pub fn push(&mut self, data: &[u8]) -> Vec<Bytes> {
        self.feed(data);
        self.drain()
    }

    /// Number of bytes waiting for framing
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn stats(&self) -> AssemblerStats {
        self.stats
    }

    /// Forget buffered bytes, e.g. after the transport reconnects
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    fn discard(&mut self, count: usize) {
        self.buffer.advance(count);
        self.stats.discarded_bytes += count as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crsf::encoder::encode_packet;
    use crate::crsf::protocol::{CRSF_FRAMETYPE_ATTITUDE, CRSF_FRAMETYPE_BATTERY_SENSOR};

    fn battery_frame() -> Vec<u8> {
        encode_packet(CRSF_FRAMETYPE_BATTERY_SENSOR, &[0x00, 0xF0]).unwrap()
    }

    #[test]
    fn test_empty_and_single_byte_need_more() {
        let mut assembler = FrameAssembler::new();
        assert_eq!(assembler.next_frame(), FramePoll::NeedMore);

        assembler.feed(&[0x42]);
        assert_eq!(assembler.next_frame(), FramePoll::NeedMore);
        assert_eq!(assembler.buffered_len(), 1);
    }

    #[test]
    fn test_zero_byte_feed_is_harmless() {
        let mut assembler = FrameAssembler::new();
        assembler.feed(&[]);
        assert_eq!(assembler.next_frame(), FramePoll::NeedMore);
        assert_eq!(assembler.stats(), AssemblerStats::default());
    }

    #[test]
    fn test_complete_frame_extracted() {
        let frame = battery_frame();
        let mut assembler = FrameAssembler::new();
        assembler.feed(&frame);

        assert_eq!(assembler.next_frame(), FramePoll::Frame(Bytes::from(frame)));
        assert_eq!(assembler.next_frame(), FramePoll::NeedMore);
        assert_eq!(assembler.buffered_len(), 0);
        assert_eq!(assembler.stats().frames, 1);
    }

    #[test]
    fn test_buffer_without_sync_is_cleared() {
        let mut assembler = FrameAssembler::new();
        assembler.feed(&[0x01, 0x02, 0x03, 0x04, 0x05]);

        assert_eq!(assembler.next_frame(), FramePoll::Cleared(5));
        assert_eq!(assembler.buffered_len(), 0);
        assert_eq!(assembler.next_frame(), FramePoll::NeedMore);

        let stats = assembler.stats();
        assert_eq!(stats.buffer_clears, 1);
        assert_eq!(stats.discarded_bytes, 5);
    }

    #[test]
    fn test_noise_before_sync_is_skipped() {
        let frame = battery_frame();
        let mut assembler = FrameAssembler::new();
        assembler.feed(&[0x11, 0x22, 0x33]);
        assembler.feed(&frame);

        assert_eq!(assembler.next_frame(), FramePoll::Frame(Bytes::from(frame)));
        assert_eq!(assembler.stats().discarded_bytes, 3);
    }

    #[test]
    fn test_partial_frame_waits_without_consuming() {
        let frame = battery_frame();
        let mut assembler = FrameAssembler::new();
        assembler.feed(&frame[..4]);

        assert_eq!(assembler.next_frame(), FramePoll::NeedMore);
        assert_eq!(assembler.buffered_len(), 4);

        assembler.feed(&frame[4..]);
        assert_eq!(assembler.next_frame(), FramePoll::Frame(Bytes::from(frame)));
    }

    #[test]
    fn test_sync_byte_alone_after_noise_needs_more() {
        let mut assembler = FrameAssembler::new();
        assembler.feed(&[0x10, 0x20, CRSF_SYNC_BYTE]);

        assert_eq!(assembler.next_frame(), FramePoll::NeedMore);
        assert_eq!(assembler.buffered_len(), 1);
    }

    #[test]
    fn test_length_too_small_drops_one_byte() {
        // 0xC8 0x01 declares a 3-byte frame, below the minimum
        let frame = battery_frame();
        let mut assembler = FrameAssembler::new();
        assembler.feed(&[CRSF_SYNC_BYTE, 0x01]);
        assembler.feed(&frame);

        assert_eq!(assembler.next_frame(), FramePoll::Frame(Bytes::from(frame)));
        let stats = assembler.stats();
        assert_eq!(stats.resync_drops, 1);
        assert_eq!(stats.discarded_bytes, 2);
    }

    #[test]
    fn test_length_too_large_keeps_following_frame() {
        // A full-buffer clear here would also lose the valid frame behind it
        let frame = battery_frame();
        let mut assembler = FrameAssembler::new();
        let mut stream = vec![CRSF_SYNC_BYTE, 0xF0];
        stream.extend_from_slice(&frame);
        assembler.feed(&stream);

        assert_eq!(assembler.drain(), vec![Bytes::from(frame)]);
        assert_eq!(assembler.stats().resync_drops, 1);
    }

    #[test]
    fn test_bogus_length_makes_forward_progress() {
        let mut assembler = FrameAssembler::new();
        assembler.feed(&[CRSF_SYNC_BYTE, 0xFF, CRSF_SYNC_BYTE, 0xFE, CRSF_SYNC_BYTE, 0x00]);

        let mut previous = assembler.buffered_len();
        for _ in 0..10 {
            match assembler.next_frame() {
                FramePoll::NeedMore => break,
                FramePoll::Cleared(_) => {}
                FramePoll::Frame(frame) => panic!("unexpected frame {:02X?}", frame),
            }
            assert!(assembler.buffered_len() < previous);
            previous = assembler.buffered_len();
        }

        assert_eq!(assembler.next_frame(), FramePoll::NeedMore);
        assert!(assembler.buffered_len() <= 1);
    }

    #[test]
    fn test_bogus_length_then_no_sync_clears_remainder() {
        let mut assembler = FrameAssembler::new();
        assembler.feed(&[CRSF_SYNC_BYTE, 0xFF]);

        // The sync candidate is dropped, then the lone 0xFF has no sync byte
        assert_eq!(assembler.next_frame(), FramePoll::Cleared(1));
        assert_eq!(assembler.buffered_len(), 0);
    }

    #[test]
    fn test_maximum_length_frame_accepted() {
        let frame = encode_packet(0x7F, &[0xAB; 60]).unwrap();
        assert_eq!(frame.len(), CRSF_MAX_FRAME_SIZE);

        let mut assembler = FrameAssembler::new();
        assert_eq!(assembler.push(&frame), vec![Bytes::from(frame)]);
    }

    #[test]
    fn test_drain_returns_frames_in_order() {
        let first = battery_frame();
        let second = encode_packet(CRSF_FRAMETYPE_ATTITUDE, &[1, 2, 3, 4, 5, 6]).unwrap();

        let mut stream = first.clone();
        stream.extend_from_slice(&[0x00, 0x55]);
        stream.extend_from_slice(&second);

        let mut assembler = FrameAssembler::new();
        assert_eq!(assembler.push(&stream), vec![Bytes::from(first), Bytes::from(second)]);
    }

    #[test]
    fn test_emitted_frame_survives_later_mutation() {
        let frame = battery_frame();
        let mut assembler = FrameAssembler::new();
        let emitted = assembler.push(&frame);

        assembler.feed(&[0xAA; 32]);
        assembler.drain();

        assert_eq!(emitted[0].as_ref(), frame.as_slice());
    }

    #[test]
    fn test_reset_discards_partial_frame() {
        let frame = battery_frame();
        let mut assembler = FrameAssembler::new();
        assembler.feed(&frame[..3]);
        assembler.reset();

        assembler.feed(&frame);
        assert_eq!(assembler.drain().len(), 1);
    }
}
