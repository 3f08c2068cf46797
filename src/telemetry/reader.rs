//! Async read/decode pipeline
//!
//! One reader owns one byte source and one [`FrameAssembler`], so frames come
//! out in exactly the order their bytes arrived.

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, trace};

use super::TelemetrySink;
use crate::crsf::assembler::{AssemblerStats, FrameAssembler, FramePoll};
use crate::crsf::decoder::{decode_packet, Decoded, DecoderOptions};
use crate::crsf::protocol::CRSF_MAX_FRAME_SIZE;
use crate::error::Result;

/// Bytes requested from the source per read
const READ_CHUNK_SIZE: usize = CRSF_MAX_FRAME_SIZE * 4;

/// Decodes CRSF frames from an async byte source
pub struct TelemetryReader<R> {
    source: R,
    assembler: FrameAssembler,
    options: DecoderOptions,
    read_buf: Vec<u8>,
}

impl<R> std::fmt::Debug for TelemetryReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryReader")
            .field("assembler", &self.assembler)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<R: AsyncRead + Unpin> TelemetryReader<R> {
    pub fn new(source: R, options: DecoderOptions) -> Self {
        Self {
            source,
            assembler: FrameAssembler::new(),
            options,
            read_buf: vec![0u8; READ_CHUNK_SIZE],
        }
    }

    /// Next decoded frame from the stream
    ///
    /// # Returns
    ///
    /// * `Ok(Some(decoded))` - One frame's event or diagnostic
    /// * `Ok(None)` - The source reached end of stream
    ///
    /// # Errors
    ///
    /// Returns error if reading from the source fails. Buffered bytes are
    /// kept, so the call may be retried.
    ///
    /// # Cancel safety
    ///
    /// Cancel safe: bytes are only fed to the assembler once a read has
    /// completed, so dropping this future (e.g. on a timeout) loses nothing.
    pub async fn next(&mut self) -> Result<Option<Decoded>> {
        loop {
            match self.assembler.next_frame() {
                FramePoll::Frame(frame) => {
                    let decoded = decode_packet(&frame, &self.options);
                    if let Err(diagnostic) = &decoded {
                        debug!("Dropped frame: {}", diagnostic);
                    }
                    return Ok(Some(decoded));
                }
                FramePoll::Cleared(count) => {
                    trace!("Discarded {} unsynchronized bytes", count);
                }
                FramePoll::NeedMore => {
                    let n = self.source.read(&mut self.read_buf).await?;
                    if n == 0 {
                        return Ok(None);
                    }
                    trace!("Read {} bytes", n);
                    self.assembler.feed(&self.read_buf[..n]);
                }
            }
        }
    }

    pub fn stats(&self) -> AssemblerStats {
        self.assembler.stats()
    }

    /// Give back the byte source, dropping any partially buffered frame
    pub fn into_inner(self) -> R {
        self.source
    }
}

/// Counts of what [`pump`] delivered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpSummary {
    pub events: u64,
    pub diagnostics: u64,
}

/// Forward every decoded frame to `sink` until the source ends
///
/// # Errors
///
/// Returns error on a source read failure or a sink failure.
pub async fn pump<R, S>(reader: &mut TelemetryReader<R>, sink: &mut S) -> Result<PumpSummary>
where
    R: AsyncRead + Unpin,
    S: TelemetrySink + ?Sized,
{
    let mut summary = PumpSummary::default();

    while let Some(decoded) = reader.next().await? {
        match decoded {
            Ok(event) => {
                sink.on_event(&event)?;
                summary.events += 1;
            }
            Err(diagnostic) => {
                sink.on_diagnostic(&diagnostic)?;
                summary.diagnostics += 1;
            }
        }
    }

    Ok(summary)
}
