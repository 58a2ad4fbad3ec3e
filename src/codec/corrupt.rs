//! Deterministic corruption of a compressed stream.

/// Bytes written over the head of a valid stream. Overwriting the gzip magic
/// guarantees decoders reject it before reading any payload.
pub const CORRUPTION_PATTERN: [u8; 17] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 1, 0, 0];

/// Overwrite the leading bytes of `stream` with [`CORRUPTION_PATTERN`],
/// keeping its length unchanged.
pub fn corrupt(mut stream: Vec<u8>) -> Vec<u8> {
    let n = stream.len().min(CORRUPTION_PATTERN.len());
    stream[..n].copy_from_slice(&CORRUPTION_PATTERN[..n]);
    stream
}
