//! `deflate` content-encoding, which HTTP defines as zlib-wrapped deflate.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use super::CodecError;

pub fn encode(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(input.len() / 2 + 16), Compression::default());
    encoder.write_all(input).map_err(CodecError::stream("deflate"))?;
    encoder.finish().map_err(CodecError::stream("deflate"))
}

pub fn decode(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    if !valid_zlib_header(input) {
        return Err(CodecError::InvalidHeader { encoding: "deflate" });
    }

    let mut out = Vec::new();
    ZlibDecoder::new(input)
        .read_to_end(&mut out)
        .map_err(CodecError::stream("deflate"))?;
    Ok(out)
}

/// CMF must announce deflate and CMF/FLG must be a multiple of 31 (RFC 1950).
fn valid_zlib_header(input: &[u8]) -> bool {
    match input {
        [cmf, flg, ..] => cmf & 0x0f == 8 && (u16::from(*cmf) << 8 | u16::from(*flg)) % 31 == 0,
        _ => false,
    }
}
