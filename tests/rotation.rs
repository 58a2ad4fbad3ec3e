//! Key-rotation sequences served by `jwksrotate` and `jwksbadrotate`.

mod common;

use common::{client, start_server, start_server_with, test_config};
use wirefault::rotation::RotationMode;

async fn kids(url: &str) -> Vec<String> {
    let body = client().get(url).send().await.unwrap().bytes().await.unwrap();
    let document: serde_json::Value = serde_json::from_slice(&body).unwrap();
    document["keys"]
        .as_array()
        .unwrap()
        .iter()
        .map(|key| key["kid"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn walks_the_sequence_then_stays_steady() {
    let server = start_server().await;
    let url = server.url("jwksrotate");

    assert_eq!(kids(&url).await, ["k1"]);
    assert_eq!(kids(&url).await, ["k2"]);
    assert_eq!(kids(&url).await, ["k2b"]);
    assert_eq!(kids(&url).await, ["k3", "k4"]);
    assert_eq!(kids(&url).await, ["k3", "k4"]);
}

#[tokio::test]
async fn reset_restarts_the_sequence() {
    let mut config = test_config();
    config.behaviors.rotation = RotationMode::Serialized;
    let server = start_server_with(config).await;
    let url = server.url("jwksrotate");

    for _ in 0..4 {
        kids(&url).await;
    }
    assert_eq!(kids(&server.url("jwksrotate?rc=0")).await, ["k1"]);
    assert_eq!(kids(&url).await, ["k2"]);

    // An unparsable value also resets; a nonzero one does not.
    assert_eq!(kids(&server.url("jwksrotate?rc=x")).await, ["k1"]);
    assert_eq!(kids(&server.url("jwksrotate?rc=5")).await, ["k2"]);
}

#[tokio::test]
async fn bad_rotate_shares_the_counter() {
    let server = start_server().await;

    assert_eq!(kids(&server.url("jwksbadrotate")).await, ["k1"]);
    assert_eq!(kids(&server.url("jwksrotate")).await, ["k2"]);
    assert_eq!(kids(&server.url("jwksbadrotate")).await, ["k2b"]);
    assert_eq!(kids(&server.url("jwksbadrotate?rc=0")).await, ["k1"]);
}

#[tokio::test]
async fn clock_rotation_leaves_the_counter_alone() {
    let server = start_server().await;

    for _ in 0..3 {
        let served = kids(&server.url("jwksrotate?clock")).await;
        assert!(served == ["k1"] || served == ["k2"], "unexpected keys {served:?}");
    }
    assert_eq!(kids(&server.url("jwksrotate")).await, ["k1"]);
}
