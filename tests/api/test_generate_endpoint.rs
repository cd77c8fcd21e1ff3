// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! POST /generate

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
};
use httpmock::{Method::GET, MockServer};
use imagegen_service::config::{Credentials, ServiceConfig};
use serde_json::json;
use tower::util::ServiceExt;

use super::common::{app, config_with_renderer, png_bytes, send};

#[tokio::test]
async fn test_generate_success_with_defaults() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path_includes("/prompt/")
                .query_param("width", "512")
                .query_param("height", "512");
            then.status(200).body(png_bytes());
        })
        .await;

    let app = app(config_with_renderer(server.base_url()), Credentials::default());
    let (status, body) = send(
        app,
        Method::POST,
        "/generate",
        Some(json!({"prompt": "a quiet harbor at dawn"})),
    )
    .await;

    mock.assert_async().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Image generated successfully");
    assert!(body["image_base64"].as_str().unwrap().starts_with("iVBORw0KGgo"));
}

#[tokio::test]
async fn test_unknown_provider_is_400_with_result_body() {
    let app = app(ServiceConfig::default(), Credentials::default());
    let (status, body) = send(
        app,
        Method::POST,
        "/generate",
        Some(json!({"prompt": "x", "model_type": "midjourney"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body.get("image_base64").is_none());
    assert_eq!(
        body["message"],
        "Error generating image: Unsupported model type: midjourney. Available: pollinations (FREE), huggingface (FREE), stable-diffusion, grok, dall-e"
    );
}

#[tokio::test]
async fn test_invalid_dimensions_are_200_with_success_false() {
    let app = app(ServiceConfig::default(), Credentials::default());
    let (status, body) = send(
        app,
        Method::POST,
        "/generate",
        Some(json!({"prompt": "x", "width": 0})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("Invalid request"));
}

#[tokio::test]
async fn test_blank_prompt_is_200_with_success_false() {
    let app = app(ServiceConfig::default(), Credentials::default());
    let (status, body) = send(app, Method::POST, "/generate", Some(json!({"prompt": "   "}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        "Error generating image: Invalid request: prompt must not be empty"
    );
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_provider_failure_is_200_with_success_false() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path_includes("/prompt/");
            then.status(503).body("service overloaded");
        })
        .await;

    let app = app(config_with_renderer(server.base_url()), Credentials::default());
    let (status, body) = send(
        app,
        Method::POST,
        "/generate",
        Some(json!({"prompt": "harbor", "model_type": "pollinations"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("service overloaded"));
}

#[tokio::test]
async fn test_missing_credential_is_200_with_success_false() {
    let app = app(ServiceConfig::default(), Credentials::default());
    let (status, body) = send(
        app,
        Method::POST,
        "/generate",
        Some(json!({"prompt": "harbor", "model_type": "dall-e"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(
        body["message"],
        "Error generating image: OPENAI_API_KEY not found in environment variables"
    );
}

#[tokio::test]
async fn test_missing_prompt_is_result_body() {
    let app = app(ServiceConfig::default(), Credentials::default());
    let (status, body) = send(
        app,
        Method::POST,
        "/generate",
        Some(json!({"model_type": "pollinations"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("Invalid request"));
    assert!(message.contains("prompt"));
}

#[tokio::test]
async fn test_negative_seed_reaches_renderer() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path_includes("/prompt/")
                .query_param("seed", "-1");
            then.status(200).body(png_bytes());
        })
        .await;

    let app = app(config_with_renderer(server.base_url()), Credentials::default());
    let (status, body) = send(
        app,
        Method::POST,
        "/generate",
        Some(json!({"prompt": "harbor", "seed": -1})),
    )
    .await;

    mock.assert_async().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_non_json_body_is_invalid_request() {
    let app = app(ServiceConfig::default(), Credentials::default());
    let request = Request::builder()
        .method(Method::POST)
        .uri("/generate")
        .header("content-type", "application/json")
        .body(Body::from("prompt=harbor"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error_type"], "invalid_request");
}
