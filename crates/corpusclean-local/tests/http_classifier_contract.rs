//! Offline contract test for the HTTP classifier adapter: local axum fixture
//! server, no network, no model weights.

use axum::{routing::post, Json, Router};
use corpusclean_core::{Classifier, Error};
use corpusclean_local::HttpClassifier;
use std::net::SocketAddr;
use std::time::Duration;

async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fixture server");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("axum serve");
    });
    addr
}

#[tokio::test]
async fn scores_text_against_fixture_endpoint() {
    let app = Router::new().route(
        "/score",
        post(|Json(body): Json<serde_json::Value>| async move {
            // Fixture model: long texts are "relevant".
            let text = body["text"].as_str().unwrap_or_default();
            let score = if text.len() > 20 { 0.92 } else { 0.05 };
            Json(serde_json::json!({ "score": score }))
        }),
    );
    let addr = serve(app).await;

    let clf = HttpClassifier::new(
        reqwest::Client::new(),
        format!("http://{addr}/score"),
        Duration::from_secs(5),
    );
    let high = clf
        .score("a reasonably long academic paragraph of text")
        .await
        .unwrap();
    let low = clf.score("short").await.unwrap();
    assert!(high > 0.9, "expected relevant score, got {high}");
    assert!(low < 0.1, "expected irrelevant score, got {low}");
}

#[tokio::test]
async fn http_error_maps_to_classifier_unavailable() {
    let app = Router::new().route(
        "/score",
        post(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let addr = serve(app).await;

    let clf = HttpClassifier::new(
        reqwest::Client::new(),
        format!("http://{addr}/score"),
        Duration::from_secs(5),
    );
    let err = clf.score("anything").await.unwrap_err();
    assert!(matches!(err, Error::ClassifierUnavailable(_)), "{err}");
}

#[tokio::test]
async fn out_of_range_score_is_rejected() {
    let app = Router::new().route(
        "/score",
        post(|| async { Json(serde_json::json!({ "score": 3.5 })) }),
    );
    let addr = serve(app).await;

    let clf = HttpClassifier::new(
        reqwest::Client::new(),
        format!("http://{addr}/score"),
        Duration::from_secs(5),
    );
    let err = clf.score("anything").await.unwrap_err();
    assert!(matches!(err, Error::ClassifierUnavailable(_)), "{err}");
}

#[tokio::test]
async fn unreachable_endpoint_is_classifier_unavailable() {
    // Reserved port with nothing listening.
    let clf = HttpClassifier::new(
        reqwest::Client::new(),
        "http://127.0.0.1:9/score",
        Duration::from_millis(500),
    );
    let err = clf.score("anything").await.unwrap_err();
    assert!(matches!(err, Error::ClassifierUnavailable(_)), "{err}");
}
