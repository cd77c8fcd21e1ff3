// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Hugging Face adapter against a simulated inference API

use httpmock::{Method::POST, MockServer};
use imagegen_service::config::Credentials;
use imagegen_service::generation::{GenerationRouter, ProviderId};

use super::common::{dimensions, mock_config, png_bytes, request, HF_MODEL_PATH};

fn hf_credentials() -> Credentials {
    Credentials::from_pairs([("HUGGINGFACE_API_KEY", "hf_test_token")])
}

#[tokio::test]
async fn test_huggingface_success() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(HF_MODEL_PATH)
                .header("authorization", "Bearer hf_test_token")
                .body_includes("\"inputs\":\"a watercolor harbor\"")
                .body_includes("\"num_inference_steps\":50");
            then.status(200)
                .header("content-type", "image/png")
                .body(png_bytes(8, 8, [10, 200, 10]));
        })
        .await;

    let router = GenerationRouter::new(&mock_config(&server), hf_credentials()).unwrap();
    let result = router
        .generate(&request("a watercolor harbor", ProviderId::HuggingFace))
        .await;

    mock.assert_async().await;
    assert!(result.success, "unexpected failure: {}", result.message);
    assert_eq!(dimensions(&result.image_base64.unwrap()), (8, 8));
}

#[tokio::test]
async fn test_huggingface_structured_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(HF_MODEL_PATH);
            then.status(503)
                .header("content-type", "application/json")
                .body(r#"{"error":"Model stabilityai/stable-diffusion-2-1 is currently loading","estimated_time":20.0}"#);
        })
        .await;

    let router = GenerationRouter::new(&mock_config(&server), hf_credentials()).unwrap();
    let result = router
        .generate(&request("a watercolor harbor", ProviderId::HuggingFace))
        .await;

    assert!(!result.success);
    assert_eq!(
        result.message,
        "Error generating image: huggingface API error (503): Model stabilityai/stable-diffusion-2-1 is currently loading"
    );
}

#[tokio::test]
async fn test_huggingface_plain_text_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(HF_MODEL_PATH);
            then.status(500).body("Internal Server Error");
        })
        .await;

    let router = GenerationRouter::new(&mock_config(&server), hf_credentials()).unwrap();
    let result = router
        .generate(&request("harbor", ProviderId::HuggingFace))
        .await;

    assert!(!result.success);
    assert!(result.message.contains("(500): Internal Server Error"));
}

#[tokio::test]
async fn test_huggingface_missing_key_makes_no_call() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path(HF_MODEL_PATH);
            then.status(200).body(png_bytes(8, 8, [0, 0, 0]));
        })
        .await;

    let router = GenerationRouter::new(&mock_config(&server), Credentials::default()).unwrap();
    let result = router
        .generate(&request("harbor", ProviderId::HuggingFace))
        .await;

    mock.assert_calls_async(0).await;
    assert!(!result.success);
    assert_eq!(
        result.message,
        "Error generating image: HUGGINGFACE_API_KEY not found in environment variables"
    );
}
