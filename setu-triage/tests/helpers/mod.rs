//! Test Helper Utilities
//!
//! Shared utilities for testing setu-triage

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod mock_services;

pub use mock_services::{
    spawn_server, MockAnalyzerService, MockAssistantService, UNREACHABLE_URL,
};

use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use serde_json::Value;

/// Build a JSON POST request
pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Build a GET request
pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Collect a response body as JSON
pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
