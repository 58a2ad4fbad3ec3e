//! End-to-end behavior tests against a live server.

mod common;

use std::io::Read;
use std::time::{Duration, Instant};

use common::{client, get_request, raw_exchange, start_server, start_server_with, test_config};
use reqwest::header;
use reqwest::StatusCode;
use wirefault::behaviors::context::server_header;

fn body_of(bytes: &[u8]) -> &str {
    std::str::from_utf8(bytes).unwrap()
}

#[tokio::test]
async fn get_serves_marker_with_identity_encoding() {
    let server = start_server().await;
    let response = client().get(server.url("get")).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_ENCODING], "identity");
    assert_eq!(response.headers()[header::SERVER], server_header().as_str());
    assert_eq!(
        response.text().await.unwrap(),
        r#"{"wirefault":"Hello from the get endpoint"}"#
    );
}

#[tokio::test]
async fn unknown_path_is_404_marker() {
    let server = start_server().await;
    let response = client().get(server.url("nope")).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.text().await.unwrap(), r#"{"wirefault":"404"}"#);
}

#[tokio::test]
async fn wrong_method_is_405_marker() {
    let server = start_server().await;
    let response = client().post(server.url("get")).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.text().await.unwrap(), r#"{"wirefault":"405"}"#);
}

#[tokio::test]
async fn post_is_created() {
    let server = start_server().await;
    let response = client()
        .post(server.url("post"))
        .body("payload")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn send_redirect_points_back_at_this_server() {
    let server = start_server().await;
    let response = client().get(server.url("send?code=302")).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers()[header::LOCATION],
        format!("http://127.0.0.1:{}/wirefault/redirected", server.addr.port()).as_str()
    );
}

#[tokio::test]
async fn send_redirect_honors_url_parameter() {
    let server = start_server().await;
    let response = client()
        .get(server.url("send?code=307&url=http%3A%2F%2Fexample.com%2Fx"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[header::LOCATION], "http://example.com/x");
}

#[tokio::test]
async fn send_uses_requested_status() {
    let server = start_server().await;
    let response = client().get(server.url("send?code=418")).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(response.text().await.unwrap(), r#"{"wirefault":"418"}"#);
}

#[tokio::test]
async fn gzip_body_decodes() {
    let server = start_server().await;
    let response = client().get(server.url("gzip")).send().await.unwrap();
    assert_eq!(response.headers()[header::CONTENT_ENCODING], "gzip");

    let encoded = response.bytes().await.unwrap();
    let mut decoded = String::new();
    flate2::read::GzDecoder::new(&encoded[..])
        .read_to_string(&mut decoded)
        .unwrap();
    assert_eq!(decoded, r#"{"wirefault":"Hello from the gzip endpoint"}"#);
}

#[tokio::test]
async fn bad_gzip_claims_gzip_but_does_not_decode() {
    let server = start_server().await;
    let response = client().get(server.url("badgzip")).send().await.unwrap();
    assert_eq!(response.headers()[header::CONTENT_ENCODING], "gzip");

    let encoded = response.bytes().await.unwrap();
    let mut decoded = Vec::new();
    assert!(flate2::read::GzDecoder::new(&encoded[..])
        .read_to_end(&mut decoded)
        .is_err());
}

#[tokio::test]
async fn choose_prefers_brotli() {
    let server = start_server().await;
    let response = client()
        .get(server.url("choose"))
        .header(header::ACCEPT_ENCODING, "gzip, deflate, br")
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()[header::CONTENT_ENCODING], "br");

    let response = client().get(server.url("choose")).send().await.unwrap();
    assert_eq!(response.headers()[header::CONTENT_ENCODING], "identity");
}

#[tokio::test]
async fn slowheader_waits_before_responding() {
    let server = start_server().await;
    let started = Instant::now();
    let response = client().get(server.url("slowheader?wait=1")).send().await.unwrap();

    assert!(started.elapsed() >= Duration::from_secs(1));
    assert!(response.text().await.unwrap().contains(r#""waitSeconds":"1""#));
}

#[tokio::test]
async fn chunked_sends_first_chunk_before_waiting() {
    let server = start_server().await;
    let started = Instant::now();
    let mut response = client().get(server.url("chunked?wait=1")).send().await.unwrap();
    assert_eq!(response.headers()[header::TRANSFER_ENCODING], "chunked");
    assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");

    let first = response.chunk().await.unwrap().unwrap();
    assert_eq!(body_of(&first), r#"[{"wirefault":"Hello from the chunked endpoint"}"#);
    assert!(started.elapsed() < Duration::from_secs(1));

    let mut rest = Vec::new();
    while let Some(chunk) = response.chunk().await.unwrap() {
        rest.extend_from_slice(&chunk);
    }
    assert!(started.elapsed() >= Duration::from_secs(1));
    assert!(body_of(&rest).ends_with(r#""waitSeconds":"1"}]"#));
}

#[tokio::test]
async fn jwks_serves_a_key_set() {
    let server = start_server().await;
    let body = client().get(server.url("jwks")).send().await.unwrap().bytes().await.unwrap();

    let document: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(!document["keys"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn slowbody_writes_exact_bytes_in_two_halves() {
    let server = start_server().await;
    let started = Instant::now();
    let received = raw_exchange(server.addr, &get_request("slowbody?wait=2")).await;

    assert!(started.elapsed() >= Duration::from_secs(2));
    let expected = format!(
        "HTTP/1.1 200 OK\nServer: {}\nContent-Encoding: identity\nConnection: close\n\n\
         [{{\"wirefault\":\"Hello from the slowbody endpoint\"}}\
         ,{{\"wirefault\":\"and some more data from the slowbody endpoint\", \"waitSeconds\":\"2\"}}]",
        server_header()
    );
    assert_eq!(body_of(&received), expected);
}

#[tokio::test]
async fn badcontentlength_body_is_short() {
    let server = start_server().await;
    let response = client().get(server.url("badcontentlength")).send().await.unwrap();

    assert_eq!(response.headers()[header::CONTENT_LENGTH], "2048");
    assert!(response.bytes().await.is_err());
}

#[tokio::test]
async fn hangup_during_header_leaves_head_unterminated() {
    let server = start_server().await;
    let started = Instant::now();
    let received = raw_exchange(server.addr, &get_request("hangupduringheader")).await;

    assert!(started.elapsed() >= Duration::from_secs(1));
    let text = body_of(&received);
    assert!(text.starts_with("HTTP/1.1 200 OK\n"));
    assert!(text.ends_with("Content-Length: 1024"));
}

#[tokio::test]
async fn hangup_after_header_sends_no_body() {
    let server = start_server().await;
    let received = raw_exchange(server.addr, &get_request("hangupafterheader")).await;

    assert!(body_of(&received).ends_with("Content-Length: 1024\n\n"));
}

#[tokio::test]
async fn hangup_during_body_sends_partial_body() {
    let server = start_server().await;
    let received = raw_exchange(server.addr, &get_request("hangupduringbody")).await;

    assert!(body_of(&received)
        .ends_with("\n\n[{\"wirefault\":\"Hello from the /hangupduringbody endpoint\"}"));
}

#[tokio::test]
async fn malformed_request_gets_400() {
    let server = start_server().await;
    let received = raw_exchange(
        server.addr,
        "GET /wirefault/get HTTP/1.1\r\nNot A Header\r\n\r\n",
    )
    .await;

    assert!(body_of(&received).starts_with("HTTP/1.1 400"));
}

#[tokio::test]
async fn connect_answers_only_connect() {
    let server = start_server().await;

    let received = raw_exchange(
        server.addr,
        "CONNECT /wirefault/connect?body HTTP/1.1\r\nHost: localhost\r\n\r\n",
    )
    .await;
    let text = body_of(&received);
    assert!(text.starts_with("HTTP/1.1 200 OK\n"));
    assert!(text.ends_with("\n\n{\"wirefault\":\"Hello from the connect endpoint\"}"));

    let received = raw_exchange(
        server.addr,
        "CONNECT /wirefault/connect HTTP/1.1\r\nHost: localhost\r\n\r\n",
    )
    .await;
    assert!(body_of(&received).ends_with("Connection: close\n\n"));

    let response = client().get(server.url("connect")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn stalled_request_body_is_cut_off() {
    let mut config = test_config();
    config.timeouts.idle_secs = 1;
    let server = start_server_with(config).await;

    let started = Instant::now();
    let received = raw_exchange(
        server.addr,
        "POST /wirefault/post HTTP/1.1\r\nHost: localhost\r\nContent-Length: 10\r\n\r\n",
    )
    .await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(body_of(&received).starts_with("HTTP/1.1 4"));
}
