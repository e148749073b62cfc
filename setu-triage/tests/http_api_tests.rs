//! HTTP API Integration Tests
//!
//! Routes are exercised in-process with `Router::oneshot`; analyzers and the
//! assistant are throwaway services on ephemeral ports.

mod helpers;

use axum::http::StatusCode;
use helpers::{get, json_body, post_json, MockAnalyzerService, MockAssistantService, UNREACHABLE_URL};
use serde_json::json;
use setu_triage::config::TriageConfig;
use setu_triage::{build_router, AppState};
use tower::ServiceExt;

const EPS: f64 = 1e-9;

/// Config pointing at the given services ("" disables one)
fn config(text_url: &str, image_url: &str, assistant_url: &str) -> TriageConfig {
    let mut config = TriageConfig::default();
    config.analyzers.text_url = text_url.to_string();
    config.analyzers.image_url = image_url.to_string();
    config.analyzers.timeout_ms = 2000;
    config.analyzers.probe_timeout_ms = 500;
    config.assistant.url = assistant_url.to_string();
    config.assistant.timeout_ms = 2000;
    config
}

fn app(config: &TriageConfig) -> axum::Router {
    build_router(AppState::from_config(config).unwrap())
}

/// App with no analyzers and no assistant
fn bare_app() -> axum::Router {
    app(&config("", "", ""))
}

#[tokio::test]
async fn health_reports_module_and_version() {
    let response = bare_app().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "setu-triage");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["uptime_seconds"].is_u64());
}

#[tokio::test]
async fn fusion_reference_scenario() {
    let response = bare_app()
        .oneshot(post_json(
            "/analyze/fusion",
            json!({
                "report_id": "rpt-100",
                "text_score": 0.85,
                "image_score": 0.78,
                "metadata_features": {"has_media": 1, "text_length": 150}
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["report_id"], "rpt-100");
    assert!((body["fusion_score"].as_f64().unwrap() - 0.8485).abs() < EPS);
    assert_eq!(body["confidence"], body["fusion_score"]);
    assert_eq!(body["priority"], "high");
    assert_eq!(body["should_verify"], false);
    assert_eq!(body["degraded"], false);
    assert_eq!(body["metadata_score"], 1.0);
    assert!((body["contributing_weights"]["image"].as_f64().unwrap() - 0.45).abs() < EPS);
}

#[tokio::test]
async fn fusion_with_nothing_but_report_id_is_neutral() {
    let response = bare_app()
        .oneshot(post_json(
            "/analyze/fusion",
            json!({"report_id": "rpt-101", "text_score": null, "image_score": null}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["fusion_score"], 0.5);
    assert_eq!(body["priority"], "low");
    assert_eq!(body["should_verify"], true);
    assert_eq!(body["degraded"], true);
    assert_eq!(body["contributing_weights"], json!({"metadata": 1.0}));
}

#[tokio::test]
async fn fusion_rejects_invalid_requests() {
    let cases = [
        json!({"report_id": "rpt-1", "text_score": 1.5}),
        json!({"report_id": "", "text_score": 0.5}),
        json!({"report_id": "rpt-1", "metadata_features": {"district": "Wayanad"}}),
        json!({"report_id": "rpt-1", "image_score": "high"}),
    ];

    for case in cases {
        let response = bare_app()
            .oneshot(post_json("/analyze/fusion", case.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "case {}", case);

        let body = json_body(response).await;
        assert!(body["error"]["code"].is_string());
        assert!(body["error"]["message"].is_string());
    }
}

#[tokio::test]
async fn triage_fuses_analyzer_signals() {
    let text = MockAnalyzerService::scoring(json!({"score": 0.85, "classification_label": "disaster"}));
    let image = MockAnalyzerService::scoring(json!({"score": 0.78, "flags": ["tampered"]}));
    let config = config(&text.spawn().await, &image.spawn().await, "");

    let response = app(&config)
        .oneshot(post_json(
            "/triage",
            json!({
                "report_id": "rpt-200",
                "text": "Flood water entering houses near the bridge",
                "image_base64": "/9j/4AAQSkZJRg==",
                "metadata_features": {"text_length": 150}
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert!((body["fusion_score"].as_f64().unwrap() - 0.8485).abs() < EPS);
    assert_eq!(body["priority"], "high");
    assert_eq!(body["degraded"], false);
    assert_eq!(body["signals"]["text"]["present"], true);
    assert_eq!(body["signals"]["text"]["label"], "disaster");
    assert_eq!(body["signals"]["image"]["flags"], json!(["tampered"]));
}

#[tokio::test]
async fn triage_degrades_when_analyzer_unreachable() {
    let config = config(UNREACHABLE_URL, "", "");

    let response = app(&config)
        .oneshot(post_json(
            "/triage",
            json!({"report_id": "rpt-201", "text": "Building on fire", "metadata_features": {"has_media": 1}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["degraded"], true);
    assert_eq!(body["fusion_score"], 1.0);
    assert_eq!(body["signals"]["text"]["absence"], "unavailable");
    assert_eq!(body["signals"]["image"]["absence"], "not_requested");
}

#[tokio::test]
async fn triage_rejects_invalid_image_encoding() {
    let response = bare_app()
        .oneshot(post_json(
            "/triage",
            json!({"report_id": "rpt-202", "image_base64": "%%% not base64 %%%"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn chat_returns_assistant_answer() {
    let assistant = MockAssistantService::answering("Stay indoors and call 112.");
    let config = config("", "", &assistant.spawn().await);

    let response = app(&config)
        .oneshot(post_json("/chat", json!({"message": "Cyclone warning, what do I do?"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["response"], "Stay indoors and call 112.");
    assert_eq!(body["data"]["is_fallback"], false);
    assert_eq!(body["data"]["model"], "aapda-assistant");
}

#[tokio::test]
async fn chat_falls_back_when_assistant_down() {
    let config = config("", "", UNREACHABLE_URL);

    let response = app(&config)
        .oneshot(post_json("/chat", json!({"message": "Where is the shelter?"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["data"]["is_fallback"], true);
    assert_eq!(body["data"]["fallback_reason"]["kind"], "unreachable");
    assert!(body["data"]["response"].as_str().unwrap().contains("1078"));
}

#[tokio::test]
async fn chat_rejects_blank_message() {
    let response = bare_app()
        .oneshot(post_json("/chat", json!({"message": "   "})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn chat_health_unavailable_without_assistant() {
    let response = bare_app().oneshot(get("/chat/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let assistant = MockAssistantService::answering("ok");
    let config = config("", "", &assistant.spawn().await);
    let response = app(&config).oneshot(get("/chat/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["data"]["model_ready"], true);
}

#[tokio::test]
async fn dependencies_healthy_when_everything_reachable() {
    let text = MockAnalyzerService::scoring(json!({"score": 0.5}));
    let image = MockAnalyzerService::scoring(json!({"score": 0.5}));
    let assistant = MockAssistantService::answering("ok");
    let config = config(&text.spawn().await, &image.spawn().await, &assistant.spawn().await);

    let response = app(&config).oneshot(get("/health/dependencies")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["overall"], "healthy");
    assert_eq!(body["dependencies"]["text_analyzer"], "ok");
}

#[tokio::test]
async fn dependencies_degraded_when_analyzer_down() {
    let image = MockAnalyzerService::scoring(json!({"score": 0.5}));
    let config = config(UNREACHABLE_URL, &image.spawn().await, "");

    let response = app(&config).oneshot(get("/health/dependencies")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = json_body(response).await;
    assert_eq!(body["overall"], "degraded");
    assert_eq!(body["dependencies"]["text_analyzer"], "unreachable");
    assert_eq!(body["dependencies"]["image_analyzer"], "ok");
    assert_eq!(body["dependencies"]["assistant"], "not_configured");
}
