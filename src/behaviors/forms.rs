//! Form submission echo endpoints.
//!
//! Both answer with a dump of the request as received, so a client can see
//! exactly what it sent after any proxies in between.

use axum::body::Bytes;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri, Version};
use axum::response::Response;

use crate::http::request::{request_id, QueryParams};
use crate::http::response::respond;
use crate::observability::metrics;

/// Render a request in wire form: request line, headers, blank line, body.
pub fn dump_request(method: &Method, uri: &Uri, version: Version, headers: &HeaderMap, body: &[u8]) -> String {
    let target = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let mut out = format!("{method} {target} {version:?}\r\n");
    for (name, value) in headers {
        out.push_str(name.as_str());
        out.push_str(": ");
        out.push_str(&String::from_utf8_lossy(value.as_bytes()));
        out.push_str("\r\n");
    }
    out.push_str("\r\n");
    out.push_str(&String::from_utf8_lossy(body));
    out
}

pub async fn form_get(method: Method, uri: Uri, version: Version, query: QueryParams, headers: HeaderMap) -> Response {
    let id = request_id(&headers);
    for (key, value) in query.iter() {
        tracing::info!(key, value, request_id = %id, "Received form field");
    }

    let dump = dump_request(&method, &uri, version, &headers, b"");
    tracing::info!(request_id = %id, raw = %dump, "Received form GET");
    metrics::record_behavior("formget");

    respond(StatusCode::OK, None, format!("received GET: {dump}"))
}

pub async fn form_post(method: Method, uri: Uri, version: Version, headers: HeaderMap, body: Bytes) -> Response {
    let id = request_id(&headers);
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let dump = dump_request(&method, &uri, version, &headers, &body);
    metrics::record_behavior("formpost");

    if content_type.contains("application/x-www-form-urlencoded") {
        for (key, value) in url::form_urlencoded::parse(&body) {
            tracing::info!(key = %key, value = %value, request_id = %id, "Received form field");
        }
        tracing::info!(request_id = %id, raw = %dump, "Received urlencoded form POST");
        respond(
            StatusCode::OK,
            None,
            format!("received post encoded as application/x-www-form-urlencoded: {dump}"),
        )
    } else if content_type.contains("multipart/form-data") {
        tracing::info!(request_id = %id, body_bytes = body.len(), raw = %dump, "Received multipart form POST");
        respond(
            StatusCode::OK,
            None,
            format!("received post encoded as multipart/form-data: {dump}"),
        )
    } else {
        tracing::warn!(request_id = %id, content_type = %content_type, "Unsupported form encoding");
        respond(
            StatusCode::INTERNAL_SERVER_ERROR,
            None,
            format!("received post with unsupported encoding as : {content_type}"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn dump_matches_wire_layout() {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("localhost"));
        let dump = dump_request(
            &Method::POST,
            &Uri::from_static("/wirefault/formpost?x=1"),
            Version::HTTP_11,
            &headers,
            b"a=1",
        );
        assert_eq!(dump, "POST /wirefault/formpost?x=1 HTTP/1.1\r\nhost: localhost\r\n\r\na=1");
    }
}
