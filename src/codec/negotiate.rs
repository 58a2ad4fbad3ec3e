//! Accept-Encoding negotiation.
//!
//! Deliberately naive: the first supported token found by substring match, in
//! the fixed order br, gzip, deflate. Quality values are ignored.

use super::EncodingVariant;

const PRIORITY: [(&str, EncodingVariant); 3] = [
    ("br", EncodingVariant::Brotli),
    ("gzip", EncodingVariant::Gzip),
    ("deflate", EncodingVariant::Deflate),
];

pub fn negotiate(accept_encoding: Option<&str>) -> EncodingVariant {
    let Some(accept) = accept_encoding else {
        return EncodingVariant::Identity;
    };

    PRIORITY
        .iter()
        .find(|(token, _)| accept.contains(token))
        .map(|(_, variant)| *variant)
        .unwrap_or(EncodingVariant::Identity)
}
