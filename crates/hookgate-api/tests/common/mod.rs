//! Router harness shared by the API integration tests.

#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc};

use axum::{
    body::Body,
    extract::connect_info::MockConnectInfo,
    http::{Request, Response},
    Router,
};
use hookgate_api::{config::SecretString, create_router, AppState, Config};
use hookgate_core::TestClock;
use hookgate_testing::{test_verifier, CountingVerifier, DeliveryBuilder, TEST_SECRET};
use serde_json::Value;
use tower::ServiceExt;

pub const PROVIDER_PEER: ([u8; 4], u16) = ([140, 82, 112, 5], 443);
pub const FOREIGN_PEER: ([u8; 4], u16) = ([203, 0, 113, 10], 443);

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub verifier: CountingVerifier,
    pub clock: TestClock,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        Self::with_peer(config, PROVIDER_PEER)
    }

    pub fn with_peer(config: Config, peer: impl Into<SocketAddr>) -> Self {
        let clock = TestClock::new();
        let verifier = CountingVerifier::new(test_verifier());
        let state =
            AppState::with_verifier(config, Arc::new(verifier.clone()), Arc::new(clock.clone()))
                .expect("state should build");
        let router = create_router(state.clone()).layer(MockConnectInfo(peer.into()));
        Self { router, state, verifier, clock }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.expect("failed to make request")
    }

    pub async fn deliver(&self, delivery: &DeliveryBuilder) -> Response<Body> {
        self.send(webhook_request(delivery)).await
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        let request = Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }
}

pub fn test_config() -> Config {
    Config { webhook_secret: SecretString::new(TEST_SECRET), ..Config::default() }
}

pub fn webhook_request(delivery: &DeliveryBuilder) -> Request<Body> {
    let mut request = Request::builder()
        .method("POST")
        .uri("/webhook/github")
        .body(Body::from(delivery.body()))
        .unwrap();
    *request.headers_mut() = delivery.headers();
    request
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&bytes).expect("response should be valid JSON")
}

pub async fn text_body(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    String::from_utf8(bytes.to_vec()).expect("response should be UTF-8")
}
