//! Response construction shared by the behaviors.
//!
//! Bodies carry the `{"wirefault":"..."}` marker so a client can tell which
//! behavior answered. Content-Encoding is always set by the caller; the
//! `Server` header is added by the router layer.

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::Response;

use crate::http::request::request_id;
use crate::observability::metrics;

pub const IDENTITY: HeaderValue = HeaderValue::from_static("identity");

/// `{"wirefault":"<text>"}`
pub fn marker(text: impl std::fmt::Display) -> String {
    format!(r#"{{"wirefault":"{text}"}}"#)
}

/// `{"wirefault":"Hello from the <endpoint> endpoint"}`
pub fn hello(endpoint: &str) -> String {
    marker(format_args!("Hello from the {endpoint} endpoint"))
}

/// Build a response with an explicit status and optional Content-Encoding.
pub fn respond(status: StatusCode, encoding: Option<HeaderValue>, body: impl Into<Body>) -> Response {
    let mut response = Response::new(body.into());
    *response.status_mut() = status;
    if let Some(encoding) = encoding {
        response.headers_mut().insert(header::CONTENT_ENCODING, encoding);
    }
    response
}

/// 200 with `Content-Encoding: identity`.
pub fn identity(body: impl Into<Body>) -> Response {
    respond(StatusCode::OK, Some(IDENTITY), body)
}

/// Fallback for paths outside the registry.
pub async fn not_found(uri: Uri, headers: HeaderMap) -> Response {
    tracing::info!(
        path = %uri.path(),
        request_id = %request_id(&headers),
        status = 404,
        "Served unknown path"
    );
    metrics::record_behavior("not_found");
    respond(StatusCode::NOT_FOUND, Some(IDENTITY), marker(404))
}

/// Fallback for a known behavior called with a method it does not serve.
pub async fn method_not_allowed(method: Method, uri: Uri, headers: HeaderMap) -> Response {
    tracing::info!(
        path = %uri.path(),
        method = %method,
        request_id = %request_id(&headers),
        status = 405,
        "Served disallowed method"
    );
    metrics::record_behavior("method_not_allowed");
    respond(StatusCode::METHOD_NOT_ALLOWED, Some(IDENTITY), marker(405))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_bodies() {
        assert_eq!(marker(404), r#"{"wirefault":"404"}"#);
        assert_eq!(hello("get"), r#"{"wirefault":"Hello from the get endpoint"}"#);
    }

    #[test]
    fn respond_sets_encoding_only_when_given() {
        let response = respond(StatusCode::CREATED, None, "x");
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(response.headers().get(header::CONTENT_ENCODING).is_none());

        let response = identity("x");
        assert_eq!(response.headers()[header::CONTENT_ENCODING], "identity");
    }

    #[tokio::test]
    async fn fallbacks_carry_status_markers() {
        let response = not_found(Uri::from_static("/nope"), HeaderMap::new()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], br#"{"wirefault":"404"}"#);

        let response = method_not_allowed(Method::POST, Uri::from_static("/x"), HeaderMap::new()).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
