// tests/health.rs

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::state;
use herbtrace::{config::AppState, handlers::health, services::fixtures::SeedFixtures};
use http_body_util::BodyExt;
use rstest::rstest;
use serde_json::Value;
use tower::ServiceExt;

async fn get(state: &AppState, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = health::router(state.clone())
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, body)
}

#[rstest]
#[tokio::test]
async fn liveness_answers_ok(state: AppState) {
    let (status, body) = get(&state, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[rstest]
#[tokio::test]
async fn empty_store_is_unavailable(state: AppState) {
    let (status, body) = get(&state, "/api/health/consistency").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let report: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(report["counts"]["organizations"], 0);
}

#[rstest]
#[tokio::test]
async fn seeded_store_is_ready(state: AppState) {
    state.seed_planner(SeedFixtures::default()).run().await.unwrap();

    let (status, body) = get(&state, "/api/health/consistency").await;
    assert_eq!(status, StatusCode::OK);

    let report: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(report["counts"]["organizations"], 5);
    assert_eq!(report["danglingReferences"].as_array().map(Vec::len), Some(0));
}
