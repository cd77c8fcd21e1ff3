// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! GET / and GET /health

use axum::http::{Method, StatusCode};
use imagegen_service::config::{Credentials, ServiceConfig};

use super::common::{app, send};

#[tokio::test]
async fn test_health() {
    let (status, body) = send(
        app(ServiceConfig::default(), Credentials::default()),
        Method::GET,
        "/health",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({"status": "healthy"}));
}

#[tokio::test]
async fn test_discovery_only_free_renderer_without_keys() {
    let (status, body) = send(
        app(ServiceConfig::default(), Credentials::default()),
        Method::GET,
        "/",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "AI Image Generation Service");
    assert_eq!(body["status"], "running");
    assert_eq!(body["models"], serde_json::json!(["pollinations"]));
    assert_eq!(
        body["free_models"],
        serde_json::json!(["pollinations", "huggingface"])
    );
    assert_eq!(body["paid_models"], serde_json::json!(["grok", "dall-e"]));
    assert!(body["note"].as_str().unwrap().contains("pollinations"));
}

#[tokio::test]
async fn test_discovery_lists_credentialed_providers() {
    let credentials = Credentials::from_pairs([
        ("HUGGINGFACE_API_KEY", "hf"),
        ("GROK_API_KEY", "xai"),
    ]);
    let (_, body) = send(
        app(ServiceConfig::default(), credentials),
        Method::GET,
        "/",
        None,
    )
    .await;

    assert_eq!(
        body["models"],
        serde_json::json!(["pollinations", "huggingface", "grok"])
    );
}

#[tokio::test]
async fn test_discovery_is_idempotent() {
    let credentials = Credentials::from_pairs([("OPENAI_API_KEY", "sk")]);
    let mut config = ServiceConfig::default();
    config.local_pipeline.configured = true;
    let app = app(config, credentials);

    let (_, first) = send(app.clone(), Method::GET, "/", None).await;
    let (_, second) = send(app, Method::GET, "/", None).await;

    assert_eq!(first, second);
    assert_eq!(
        first["models"],
        serde_json::json!(["pollinations", "dall-e", "stable-diffusion"])
    );
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let (status, body) = send(
        app(ServiceConfig::default(), Credentials::default()),
        Method::GET,
        "/v1/images",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_type"], "not_found");
}
