//! Brotli (`br`) encode and decode.

use std::io::{Read, Write};

use super::CodecError;

const BUFFER_SIZE: usize = 4096;
const QUALITY: u32 = 5;
const WINDOW_BITS: u32 = 22;

pub fn encode(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut writer = brotli::CompressorWriter::new(Vec::new(), BUFFER_SIZE, QUALITY, WINDOW_BITS);
    writer.write_all(input).map_err(CodecError::stream("br"))?;
    writer.flush().map_err(CodecError::stream("br"))?;
    Ok(writer.into_inner())
}

pub fn decode(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    brotli::Decompressor::new(input, BUFFER_SIZE)
        .read_to_end(&mut out)
        .map_err(CodecError::stream("br"))?;
    Ok(out)
}
