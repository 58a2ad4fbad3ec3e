//! JSON Web Key Set fixtures.
//!
//! The key material is static and never validated; clients under test only
//! care about the shape of the documents and how they change over time.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;

use crate::http::request::{request_id, QueryParams};
use crate::http::response::identity;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::rotation::{RotationSet, RotationStage};

/// Two RSA signing keys, `k1` and `k2`.
pub const JWKS: &str = include_str!("fixtures/jwks.json");
/// Keys without an `alg` member.
pub const JWKS_BAD: &str = include_str!("fixtures/jwksbad.json");
/// One RSA and one EC key.
pub const JWKS_MIX: &str = include_str!("fixtures/jwksmix.json");
/// A single ES256 key.
pub const JWKS_ES256: &str = include_str!("fixtures/jwkses256.json");

/// Payloads served by `jwksrotate`, one per rotation stage.
pub const ROTATION: RotationSet<&str> = RotationSet {
    initial: include_str!("fixtures/rotation_k1.json"),
    rotated: include_str!("fixtures/rotation_k2.json"),
    intermediate: include_str!("fixtures/rotation_k2b.json"),
    steady: include_str!("fixtures/rotation_k3k4.json"),
};

fn serve_fixture(behavior: &'static str, fixture: &'static str, headers: &HeaderMap) -> Response {
    tracing::info!(behavior, request_id = %request_id(headers), "Served request");
    metrics::record_behavior(behavior);
    identity(fixture)
}

pub async fn jwks(headers: HeaderMap) -> Response {
    serve_fixture("jwks", JWKS, &headers)
}

pub async fn jwks_bad(headers: HeaderMap) -> Response {
    serve_fixture("jwksbad", JWKS_BAD, &headers)
}

pub async fn jwks_mix(headers: HeaderMap) -> Response {
    serve_fixture("jwksmix", JWKS_MIX, &headers)
}

pub async fn jwks_es256(headers: HeaderMap) -> Response {
    serve_fixture("jwkses256", JWKS_ES256, &headers)
}

/// Stage served by the wall-clock rotation: `k1` on even seconds, `k2` on odd.
pub fn clock_stage(epoch_secs: u64) -> RotationStage {
    if epoch_secs % 2 == 0 {
        RotationStage::Initial
    } else {
        RotationStage::Rotated
    }
}

/// Serve the key set for the next counter stage.
///
/// Any `rc` value that is not a non-zero integer resets the cycle first.
fn serve_counted(behavior: &'static str, state: &AppState, query: &QueryParams, headers: &HeaderMap) -> Response {
    let reset = query
        .int("rc")
        .is_some_and(|rc| rc.map_or(true, |value| value == 0));
    let (value, stage) = state.rotation.next_stage(reset);

    tracing::info!(
        behavior,
        request_id = %request_id(headers),
        reset,
        count = value,
        stage = ?stage,
        "Served request"
    );
    metrics::record_behavior(behavior);
    metrics::record_rotation(value);

    identity(ROTATION.select(stage))
}

/// Counter-driven rotation, or the wall-clock alternation with `?clock`.
pub async fn jwks_rotate(State(state): State<AppState>, query: QueryParams, headers: HeaderMap) -> Response {
    if !query.contains("clock") {
        return serve_counted("jwksrotate", &state, &query, &headers);
    }

    let epoch_secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();
    let stage = clock_stage(epoch_secs);

    tracing::info!(
        behavior = "jwksrotate",
        request_id = %request_id(&headers),
        epoch_secs,
        stage = ?stage,
        "Served request"
    );
    metrics::record_behavior("jwksrotate");

    identity(ROTATION.select(stage))
}

/// Always counter-driven; shares its counter with `jwksrotate`.
pub async fn jwks_bad_rotate(State(state): State<AppState>, query: QueryParams, headers: HeaderMap) -> Response {
    serve_counted("jwksbadrotate", &state, &query, &headers)
}
