//! Content-encoding behaviors.
//!
//! Each endpoint answers with a fixed marker body run through one codec and
//! announces the matching `Content-Encoding`. `badgzip` announces gzip but
//! sends a stream whose header has been overwritten, and `choose` picks an
//! encoding from the request's `Accept-Encoding`.

use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;

use crate::codec::{negotiate, CodecError, EncodingVariant};
use crate::http::request::request_id;
use crate::http::response::{hello, identity, respond};
use crate::http::server::AppState;
use crate::observability::metrics;

/// Encode `body` with `variant` and wrap it in a 200.
fn encoded_response(
    state: &AppState,
    behavior: &'static str,
    variant: EncodingVariant,
    body: &[u8],
    headers: &HeaderMap,
) -> Response {
    let (variant, encoded) = or_identity(behavior, variant, body, state.codecs.encode(variant, body));

    tracing::info!(
        behavior,
        request_id = %request_id(headers),
        encoding = %variant,
        encoded_bytes = encoded.len(),
        "Served request"
    );
    metrics::record_behavior(behavior);

    respond(
        StatusCode::OK,
        Some(HeaderValue::from_static(variant.content_encoding())),
        encoded,
    )
}

/// An encoder failure falls back to the plain body, labeled identity.
fn or_identity(
    behavior: &'static str,
    variant: EncodingVariant,
    body: &[u8],
    encoded: Result<Vec<u8>, CodecError>,
) -> (EncodingVariant, Vec<u8>) {
    match encoded {
        Ok(encoded) => (variant, encoded),
        Err(e) => {
            tracing::error!(behavior, encoding = %variant, error = %e, "Encoding failed, serving identity");
            (EncodingVariant::Identity, body.to_vec())
        }
    }
}

pub async fn tiny_identity(headers: HeaderMap) -> Response {
    tracing::info!(behavior = "tinyidentity", request_id = %request_id(&headers), "Served request");
    metrics::record_behavior("tinyidentity");
    identity("{}")
}

pub async fn tiny_gzip(State(state): State<AppState>, headers: HeaderMap) -> Response {
    encoded_response(&state, "tinygzip", EncodingVariant::Gzip, b"{}", &headers)
}

pub async fn gzip(State(state): State<AppState>, headers: HeaderMap) -> Response {
    encoded_response(&state, "gzip", EncodingVariant::Gzip, hello("gzip").as_bytes(), &headers)
}

pub async fn deflate(State(state): State<AppState>, headers: HeaderMap) -> Response {
    encoded_response(&state, "deflate", EncodingVariant::Deflate, hello("deflate").as_bytes(), &headers)
}

pub async fn brotli(State(state): State<AppState>, headers: HeaderMap) -> Response {
    encoded_response(&state, "brotli", EncodingVariant::Brotli, hello("brotli").as_bytes(), &headers)
}

pub async fn bad_gzip(State(state): State<AppState>, headers: HeaderMap) -> Response {
    encoded_response(&state, "badgzip", EncodingVariant::Corrupted, hello("gzip").as_bytes(), &headers)
}

/// Serve whichever encoding behavior the `Accept-Encoding` header selects.
pub async fn choose(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let accept = headers
        .get(header::ACCEPT_ENCODING)
        .and_then(|v| v.to_str().ok());
    let variant = negotiate(accept);

    tracing::info!(
        accept_encoding = accept.unwrap_or(""),
        chosen = %variant,
        request_id = %request_id(&headers),
        "Negotiated encoding"
    );

    match variant {
        EncodingVariant::Brotli => brotli(State(state), headers).await,
        EncodingVariant::Gzip => gzip(State(state), headers).await,
        EncodingVariant::Deflate => deflate(State(state), headers).await,
        EncodingVariant::Identity | EncodingVariant::Corrupted => super::simple::get(headers).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoder_failure_serves_the_plain_body() {
        let failed = Err(CodecError::InvalidHeader { encoding: "gzip" });
        let (variant, body) = or_identity("gzip", EncodingVariant::Gzip, b"{\"a\":1}", failed);
        assert_eq!(variant, EncodingVariant::Identity);
        assert_eq!(variant.content_encoding(), "identity");
        assert_eq!(body, b"{\"a\":1}");
    }

    #[test]
    fn encoder_success_keeps_the_requested_variant() {
        let (variant, body) = or_identity("brotli", EncodingVariant::Brotli, b"x", Ok(vec![1, 2, 3]));
        assert_eq!(variant, EncodingVariant::Brotli);
        assert_eq!(body, vec![1, 2, 3]);
    }
}
