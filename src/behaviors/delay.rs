//! Delay behaviors served through hyper.
//!
//! `slowheader` holds the whole response back for the wait; `chunked`
//! sends its first chunk at once and the second after the wait.

use std::convert::Infallible;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use futures_util::stream::{self, StreamExt};

use crate::http::request::{request_id, QueryParams};
use crate::http::response::{identity, respond, IDENTITY};
use crate::http::server::AppState;
use crate::observability::metrics;

pub async fn slow_header(State(state): State<AppState>, query: QueryParams, headers: HeaderMap) -> Response {
    let wait = state.ctx.wait.resolve(query.first("wait"));
    tokio::time::sleep(wait).await;

    tracing::info!(
        behavior = "slowheader",
        request_id = %request_id(&headers),
        wait_secs = wait.as_secs(),
        "Served request"
    );
    metrics::record_behavior("slowheader");

    identity(format!(
        r#"{{"wirefault":"Hello from the slowheader endpoint", "waitSeconds":"{}"}}"#,
        wait.as_secs()
    ))
}

pub async fn chunked(State(state): State<AppState>, query: QueryParams, headers: HeaderMap) -> Response {
    let wait = state.ctx.wait.resolve(query.first("wait"));

    let first = Bytes::from_static(br#"[{"wirefault":"Hello from the chunked endpoint"}"#);
    let second = Bytes::from(format!(
        r#",{{"wirefault":"and some more data from the chunked endpoint", "waitSeconds":"{}"}}]"#,
        wait.as_secs()
    ));

    let body = stream::once(async move { Ok::<_, Infallible>(first) }).chain(stream::once(async move {
        tokio::time::sleep(wait).await;
        Ok(second)
    }));

    let mut response = respond(StatusCode::OK, Some(IDENTITY), Body::from_stream(body));
    let response_headers = response.headers_mut();
    response_headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response_headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));

    tracing::info!(
        behavior = "chunked",
        request_id = %request_id(&headers),
        wait_secs = wait.as_secs(),
        "Streaming chunked response"
    );
    metrics::record_behavior("chunked");
    response
}
