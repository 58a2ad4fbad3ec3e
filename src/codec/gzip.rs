//! Pooled gzip encoding.
//!
//! # Responsibilities
//! - Keep a bounded pool of idle deflate engines
//! - Reset a checked-out engine against a fresh output buffer
//! - Frame the raw deflate stream as gzip (header, CRC32, ISIZE)
//!
//! The engine is never shared: it leaves the pool for the duration of one
//! encode and goes back only after the stream has been finalized.

use std::io::{Read, Write};
use std::sync::{Mutex, PoisonError};

use flate2::read::GzDecoder;
use flate2::write::DeflateEncoder;
use flate2::{Compression, Crc};

use super::CodecError;

/// Fixed 10-byte gzip header: magic, deflate method, no flags, no mtime,
/// unknown OS.
const GZIP_HEADER: [u8; 10] = [0x1f, 0x8b, 0x08, 0, 0, 0, 0, 0, 0, 0xff];

const DEFAULT_MAX_IDLE: usize = 32;

/// A pool of reusable gzip encoders.
#[derive(Debug)]
pub struct GzipPool {
    idle: Mutex<Vec<DeflateEncoder<Vec<u8>>>>,
    level: Compression,
    max_idle: usize,
}

impl GzipPool {
    pub fn new(level: Compression, max_idle: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            level,
            max_idle,
        }
    }

    /// Number of encoders currently parked in the pool.
    pub fn idle_count(&self) -> usize {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn checkout(&self) -> DeflateEncoder<Vec<u8>> {
        self.idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .unwrap_or_else(|| DeflateEncoder::new(Vec::new(), self.level))
    }

    fn checkin(&self, encoder: DeflateEncoder<Vec<u8>>) {
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < self.max_idle {
            idle.push(encoder);
        }
    }

    /// Compress `input` into a complete gzip member.
    pub fn encode(&self, input: &[u8]) -> Result<Vec<u8>, CodecError> {
        let mut encoder = self.checkout();

        let mut buffer = Vec::with_capacity(GZIP_HEADER.len() + input.len() / 2 + 16);
        buffer.extend_from_slice(&GZIP_HEADER);
        encoder.reset(buffer).map_err(CodecError::stream("gzip"))?;

        encoder.write_all(input).map_err(CodecError::stream("gzip"))?;
        // Finishing swaps the completed stream out and leaves the engine idle.
        let mut out = encoder.reset(Vec::new()).map_err(CodecError::stream("gzip"))?;
        self.checkin(encoder);

        let mut crc = Crc::new();
        crc.update(input);
        out.extend_from_slice(&crc.sum().to_le_bytes());
        out.extend_from_slice(&crc.amount().to_le_bytes());
        Ok(out)
    }
}

impl Default for GzipPool {
    fn default() -> Self {
        Self::new(Compression::default(), DEFAULT_MAX_IDLE)
    }
}

/// Decompress a gzip stream, rejecting anything without a gzip header.
pub fn decode(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    if input.len() < GZIP_HEADER.len() || input[..3] != GZIP_HEADER[..3] {
        return Err(CodecError::InvalidHeader { encoding: "gzip" });
    }

    let mut out = Vec::new();
    GzDecoder::new(input)
        .read_to_end(&mut out)
        .map_err(CodecError::stream("gzip"))?;
    Ok(out)
}
