//! Single-shot responders.
//!
//! Plain, well-formed answers to each HTTP method plus a few echo and
//! header-shaping endpoints. Misbehaving clients are tested against the
//! other modules; these give them a known-good baseline.

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::Response;

use crate::http::request::{expects_continue, request_id, QueryParams};
use crate::http::response::{hello, identity, marker, respond, IDENTITY};
use crate::http::server::AppState;
use crate::observability::metrics;

/// Statuses that also get a `Location` header from `send`.
const REDIRECT_CODES: [u16; 7] = [300, 301, 302, 303, 305, 307, 308];

fn served(behavior: &'static str, headers: &HeaderMap, status: StatusCode) {
    tracing::info!(
        behavior,
        request_id = %request_id(headers),
        status = status.as_u16(),
        "Served request"
    );
    metrics::record_behavior(behavior);
}

fn served_with_body(behavior: &'static str, headers: &HeaderMap, status: StatusCode, body: &Bytes) {
    tracing::info!(
        behavior,
        request_id = %request_id(headers),
        status = status.as_u16(),
        body_bytes = body.len(),
        expect_continue = expects_continue(headers),
        "Served request"
    );
    metrics::record_behavior(behavior);
}

/// Parse a status code query value, defaulting to 200 when absent or out of
/// range.
fn status_from(query: &QueryParams) -> StatusCode {
    query
        .int("code")
        .and_then(Result::ok)
        .filter(|code| (100..=999).contains(code))
        .and_then(|code| StatusCode::from_u16(code as u16).ok())
        .unwrap_or(StatusCode::OK)
}

pub async fn get(headers: HeaderMap) -> Response {
    served("get", &headers, StatusCode::OK);
    identity(hello("get"))
}

pub async fn post(headers: HeaderMap, body: Bytes) -> Response {
    served_with_body("post", &headers, StatusCode::CREATED, &body);
    respond(StatusCode::CREATED, Some(IDENTITY), hello("post"))
}

pub async fn put(headers: HeaderMap, body: Bytes) -> Response {
    served_with_body("put", &headers, StatusCode::OK, &body);
    identity(hello("put"))
}

pub async fn patch(headers: HeaderMap, body: Bytes) -> Response {
    served_with_body("patch", &headers, StatusCode::OK, &body);
    identity(hello("patch"))
}

pub async fn delete(headers: HeaderMap, body: Bytes) -> Response {
    served_with_body("delete", &headers, StatusCode::NO_CONTENT, &body);
    respond(StatusCode::NO_CONTENT, None, Body::empty())
}

pub async fn options(query: QueryParams, headers: HeaderMap) -> Response {
    let status = status_from(&query);
    let body = if query.contains("body") {
        Body::from(hello("options"))
    } else {
        Body::empty()
    };

    let mut response = respond(status, None, body);
    response
        .headers_mut()
        .append(header::ALLOW, HeaderValue::from_static("OPTIONS"));
    response
        .headers_mut()
        .append(header::ALLOW, HeaderValue::from_static("GET"));

    served("options", &headers, status);
    response
}

pub async fn trace(headers: HeaderMap, body: Bytes) -> Response {
    served_with_body("trace", &headers, StatusCode::OK, &body);
    let mut response = respond(StatusCode::OK, None, hello("trace"));
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("message/http"));
    response
}

/// GET returns the body with its length; HEAD returns a weak ETag and a
/// Content-Length of zero unless `cl` is present.
pub async fn get_or_head(method: Method, query: QueryParams, headers: HeaderMap) -> Response {
    let body = hello("getorhead");

    let response = if method == Method::HEAD {
        let length = if query.contains("cl") { body.len() } else { 0 };
        let mut response = identity(Body::empty());
        response
            .headers_mut()
            .insert(header::ETAG, HeaderValue::from_static("W/0815"));
        response
            .headers_mut()
            .insert(header::CONTENT_LENGTH, HeaderValue::from(length));
        response
    } else {
        let length = body.len();
        let mut response = identity(body);
        response
            .headers_mut()
            .insert(header::CONTENT_LENGTH, HeaderValue::from(length));
        response
    };

    tracing::debug!(method = %method, "Answering getorhead");
    served("getorhead", &headers, StatusCode::OK);
    response
}

pub async fn echo_query(query: QueryParams, headers: HeaderMap) -> Response {
    served("echoquery", &headers, StatusCode::OK);
    identity(marker(format_args!(
        "Hello from the echo query endpoint. Your query string was {}",
        query.encode_sorted()
    )))
}

pub async fn echo_port(State(state): State<AppState>, headers: HeaderMap) -> Response {
    served("echoport", &headers, StatusCode::OK);
    identity(marker(format_args!(
        "Hello from the echo port endpoint. My port is {}",
        state.ctx.port
    )))
}

pub async fn echo_header(headers: HeaderMap) -> Response {
    let mut pairs: Vec<String> = headers
        .iter()
        .map(|(name, value)| format!("{}={}", name, String::from_utf8_lossy(value.as_bytes())))
        .collect();
    pairs.sort();

    served("echoheader", &headers, StatusCode::OK);
    let body = serde_json::json!({
        "wirefault": format!("Hello from the echo header endpoint. {}", pairs.join(", ")),
    });
    identity(body.to_string())
}

pub async fn redirected(headers: HeaderMap) -> Response {
    served("redirected", &headers, StatusCode::OK);
    identity(marker(
        "Hello from the redirected endpoint. if you're reading this and you didn't load this URL, chances are you've been redirected.'",
    ))
}

/// Reply with any status from `code`, adding `Location` for redirects.
pub async fn send(State(state): State<AppState>, query: QueryParams, headers: HeaderMap) -> Response {
    let status = status_from(&query);

    let body = if status.as_u16() >= 200 {
        Body::from(marker(status.as_u16()))
    } else {
        Body::empty()
    };
    let mut response = respond(status, Some(IDENTITY), body);

    if REDIRECT_CODES.contains(&status.as_u16()) {
        let location = match query.first("url") {
            Some(url) => url.to_string(),
            None => {
                let host = headers
                    .get(header::HOST)
                    .and_then(|v| v.to_str().ok())
                    .map(strip_port)
                    .unwrap_or_default();
                format!("http://{host}:{}{}redirected", state.ctx.port, state.ctx.prefix)
            }
        };
        match HeaderValue::from_str(&location) {
            Ok(value) => {
                response.headers_mut().insert(header::LOCATION, value);
                tracing::debug!(location = %location, "Redirecting");
            }
            Err(_) => tracing::warn!(location = %location, "Unusable redirect location"),
        }
    }

    served("send", &headers, status);
    response
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return host.split_once(']').map(|(h, _)| &host[..h.len() + 1]).unwrap_or(host);
    }
    host.split(':').next().unwrap_or(host)
}

pub async fn no_content_encoding(headers: HeaderMap) -> Response {
    served("nocontentenc", &headers, StatusCode::OK);
    respond(StatusCode::OK, None, hello("nocontentenc"))
}

pub async fn unknown_content_encoding(headers: HeaderMap) -> Response {
    served("unknowncontentenc", &headers, StatusCode::OK);
    respond(
        StatusCode::OK,
        Some(HeaderValue::from_static("unknown")),
        hello("unknowncontentenc"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parsing() {
        assert_eq!(status_from(&QueryParams::parse(None)), StatusCode::OK);
        assert_eq!(status_from(&QueryParams::parse(Some("code=418"))).as_u16(), 418);
        assert_eq!(status_from(&QueryParams::parse(Some("code=99"))), StatusCode::OK);
        assert_eq!(status_from(&QueryParams::parse(Some("code=1000"))), StatusCode::OK);
        assert_eq!(status_from(&QueryParams::parse(Some("code=abc"))), StatusCode::OK);
        assert_eq!(status_from(&QueryParams::parse(Some("code=999"))).as_u16(), 999);
    }

    #[test]
    fn host_port_stripping() {
        assert_eq!(strip_port("localhost:8081"), "localhost");
        assert_eq!(strip_port("example.test"), "example.test");
        assert_eq!(strip_port("[::1]:8081"), "[::1]");
        assert_eq!(strip_port(""), "");
    }
}
