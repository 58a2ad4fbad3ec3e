//! Content-encoding codecs.
//!
//! # Data Flow
//! ```text
//! behavior body (bytes)
//!     → negotiate.rs (Accept-Encoding → EncodingVariant)
//!     → CodecSet::encode (gzip pool / zlib / brotli)
//!     → corrupt.rs (only for EncodingVariant::Corrupted)
//!     → response body + Content-Encoding header
//! ```
//!
//! # Design Decisions
//! - gzip encoders are pooled and reset per use; deflate and brotli are
//!   cheap enough to build per call
//! - Decoders exist so tests and clients can verify what was sent
//! - A corrupted stream is always detected at the header, never mid-stream

pub mod brotli;
pub mod corrupt;
pub mod deflate;
pub mod gzip;
pub mod negotiate;

pub use corrupt::corrupt;
pub use gzip::GzipPool;
pub use negotiate::negotiate;

/// The encodings a behavior can put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncodingVariant {
    Identity,
    Gzip,
    Deflate,
    Brotli,
    /// A gzip stream whose leading bytes have been overwritten.
    Corrupted,
}

impl EncodingVariant {
    /// Value of the `Content-Encoding` header announced for this variant.
    pub fn content_encoding(&self) -> &'static str {
        match self {
            EncodingVariant::Identity => "identity",
            EncodingVariant::Gzip | EncodingVariant::Corrupted => "gzip",
            EncodingVariant::Deflate => "deflate",
            EncodingVariant::Brotli => "br",
        }
    }
}

impl std::fmt::Display for EncodingVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodingVariant::Corrupted => f.write_str("corrupted"),
            other => f.write_str(other.content_encoding()),
        }
    }
}

/// Error type for encode and decode operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The stream does not start with a valid header for its encoding.
    #[error("invalid {encoding} header")]
    InvalidHeader { encoding: &'static str },
    /// The underlying compressor or decompressor failed.
    #[error("{encoding} stream error: {source}")]
    Stream {
        encoding: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl CodecError {
    pub(crate) fn stream(encoding: &'static str) -> impl FnOnce(std::io::Error) -> Self {
        move |source| CodecError::Stream { encoding, source }
    }

    pub fn is_invalid_header(&self) -> bool {
        matches!(self, CodecError::InvalidHeader { .. })
    }
}

/// The full set of codecs shared by every behavior.
#[derive(Debug, Default)]
pub struct CodecSet {
    gzip: GzipPool,
}

impl CodecSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encode(&self, variant: EncodingVariant, input: &[u8]) -> Result<Vec<u8>, CodecError> {
        match variant {
            EncodingVariant::Identity => Ok(input.to_vec()),
            EncodingVariant::Gzip => self.gzip.encode(input),
            EncodingVariant::Deflate => deflate::encode(input),
            EncodingVariant::Brotli => brotli::encode(input),
            EncodingVariant::Corrupted => self.gzip.encode(input).map(corrupt),
        }
    }

    pub fn decode(&self, variant: EncodingVariant, input: &[u8]) -> Result<Vec<u8>, CodecError> {
        match variant {
            EncodingVariant::Identity => Ok(input.to_vec()),
            EncodingVariant::Gzip | EncodingVariant::Corrupted => gzip::decode(input),
            EncodingVariant::Deflate => deflate::decode(input),
            EncodingVariant::Brotli => brotli::decode(input),
        }
    }
}
