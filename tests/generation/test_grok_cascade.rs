// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Grok prompt enhancement followed by the delivery cascade

use httpmock::{
    Method::{GET, POST},
    Mock, MockServer,
};
use imagegen_service::config::Credentials;
use imagegen_service::generation::{GenerationRouter, ProviderId};

use super::common::{
    chat_reply, mock_config, png_bytes, request, HF_MODEL_PATH, LOCAL_HEALTH_PATH,
    LOCAL_IMAGES_PATH, OPENAI_IMAGES_PATH, XAI_CHAT_PATH,
};

const ENHANCED: &str = "luminous-fox-in-moonlit-snow";

struct Backends<'a> {
    pollinations: Mock<'a>,
    local_health: Mock<'a>,
    local_images: Mock<'a>,
    openai: Mock<'a>,
    huggingface: Mock<'a>,
}

async fn enhancer_ok(server: &MockServer) -> Mock<'_> {
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path(XAI_CHAT_PATH)
                .header("authorization", "Bearer xai-test")
                .body_includes("\"model\":\"grok-beta\"")
                .body_includes("\"max_tokens\":300")
                .body_includes("Enhance this image generation prompt to be more detailed and descriptive: fox");
            then.status(200)
                .header("content-type", "application/json")
                .body(chat_reply(&format!("  {}\n", ENHANCED)));
        })
        .await
}

/// Every image backend fails
async fn failing_backends(server: &MockServer) -> Backends<'_> {
    Backends {
        pollinations: server
            .mock_async(|when, then| {
                when.method(GET).path_includes("/pollinations/prompt/");
                then.status(500).body("renderer down");
            })
            .await,
        local_health: server
            .mock_async(|when, then| {
                when.method(GET).path(LOCAL_HEALTH_PATH);
                then.status(503);
            })
            .await,
        local_images: server
            .mock_async(|when, then| {
                when.method(POST).path(LOCAL_IMAGES_PATH);
                then.status(500);
            })
            .await,
        openai: server
            .mock_async(|when, then| {
                when.method(POST).path(OPENAI_IMAGES_PATH);
                then.status(500).body("billing hard limit reached");
            })
            .await,
        huggingface: server
            .mock_async(|when, then| {
                when.method(POST).path(HF_MODEL_PATH);
                then.status(503).body(r#"{"error":"Model is overloaded"}"#);
            })
            .await,
    }
}

#[tokio::test]
async fn test_enhanced_prompt_reaches_first_backend() {
    let server = MockServer::start_async().await;
    let enhancer = enhancer_ok(&server).await;
    let pollinations = server
        .mock_async(|when, then| {
            when.method(GET)
                .path_includes(format!("/pollinations/prompt/{}", ENHANCED));
            then.status(200).body(png_bytes(8, 8, [255, 255, 255]));
        })
        .await;
    let local_health = server
        .mock_async(|when, then| {
            when.method(GET).path(LOCAL_HEALTH_PATH);
            then.status(200);
        })
        .await;

    let credentials = Credentials::from_pairs([("XAI_API_KEY", "xai-test")]);
    let router = GenerationRouter::new(&mock_config(&server), credentials).unwrap();
    let result = router.generate(&request("fox", ProviderId::Grok)).await;

    assert!(result.success, "unexpected failure: {}", result.message);
    enhancer.assert_async().await;
    pollinations.assert_async().await;
    local_health.assert_calls_async(0).await;
}

#[tokio::test]
async fn test_grok_alias_key_is_accepted() {
    let server = MockServer::start_async().await;
    let enhancer = enhancer_ok(&server).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path_includes("/pollinations/prompt/");
            then.status(200).body(png_bytes(8, 8, [1, 1, 1]));
        })
        .await;

    let credentials = Credentials::from_pairs([("GROK_API_KEY", "xai-test")]);
    let router = GenerationRouter::new(&mock_config(&server), credentials).unwrap();
    let result = router.generate(&request("fox", ProviderId::Grok)).await;

    enhancer.assert_async().await;
    assert!(result.success, "unexpected failure: {}", result.message);
}

#[tokio::test]
async fn test_enhancer_failure_never_starts_cascade() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(XAI_CHAT_PATH);
            then.status(401).body(r#"{"error":"Incorrect API key provided"}"#);
        })
        .await;
    let backends = failing_backends(&server).await;

    let credentials = Credentials::from_pairs([
        ("XAI_API_KEY", "xai-test"),
        ("OPENAI_API_KEY", "sk-test"),
        ("HUGGINGFACE_API_KEY", "hf-test"),
    ]);
    let router = GenerationRouter::new(&mock_config(&server), credentials).unwrap();
    let result = router.generate(&request("fox", ProviderId::Grok)).await;

    assert!(!result.success);
    assert!(result.message.contains("grok API error (401)"));
    assert!(result.message.contains("Incorrect API key provided"));

    backends.pollinations.assert_calls_async(0).await;
    backends.local_health.assert_calls_async(0).await;
    backends.local_images.assert_calls_async(0).await;
    backends.openai.assert_calls_async(0).await;
    backends.huggingface.assert_calls_async(0).await;
}

#[tokio::test]
async fn test_empty_rewrite_is_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(XAI_CHAT_PATH);
            then.status(200).body(chat_reply("   "));
        })
        .await;
    let backends = failing_backends(&server).await;

    let credentials = Credentials::from_pairs([("XAI_API_KEY", "xai-test")]);
    let router = GenerationRouter::new(&mock_config(&server), credentials).unwrap();
    let result = router.generate(&request("fox", ProviderId::Grok)).await;

    assert!(!result.success);
    assert!(result.message.contains("empty enhanced prompt"));
    backends.pollinations.assert_calls_async(0).await;
}

#[tokio::test]
async fn test_missing_enhancer_key() {
    let server = MockServer::start_async().await;
    let backends = failing_backends(&server).await;

    let router = GenerationRouter::new(&mock_config(&server), Credentials::default()).unwrap();
    let result = router.generate(&request("fox", ProviderId::Grok)).await;

    assert!(!result.success);
    assert_eq!(
        result.message,
        "Error generating image: XAI_API_KEY or GROK_API_KEY not found in environment variables"
    );
    backends.pollinations.assert_calls_async(0).await;
}

#[tokio::test]
async fn test_exhausted_cascade_attempts_each_credentialed_step_once() {
    let server = MockServer::start_async().await;
    let enhancer = enhancer_ok(&server).await;
    let backends = failing_backends(&server).await;

    // No OPENAI_API_KEY: three steps are eligible (pollinations, local, huggingface)
    let credentials = Credentials::from_pairs([
        ("XAI_API_KEY", "xai-test"),
        ("HUGGINGFACE_API_KEY", "hf-test"),
    ]);
    let router = GenerationRouter::new(&mock_config(&server), credentials).unwrap();
    let result = router.generate(&request("fox", ProviderId::Grok)).await;

    enhancer.assert_async().await;
    assert!(!result.success);
    assert!(
        result.message.contains("No image generation service available"),
        "got: {}",
        result.message
    );

    backends.pollinations.assert_calls_async(1).await;
    backends.local_health.assert_calls_async(1).await;
    backends.local_images.assert_calls_async(0).await;
    backends.openai.assert_calls_async(0).await;
    backends.huggingface.assert_calls_async(1).await;

    let pollinations_at = result.message.find("pollinations:").unwrap();
    let local_at = result.message.find("stable-diffusion:").unwrap();
    let hf_at = result.message.find("huggingface:").unwrap();
    assert!(pollinations_at < local_at && local_at < hf_at);
    assert!(!result.message.contains("dall-e:"));
    assert!(result.message.contains("Model is overloaded"));
}

#[tokio::test]
async fn test_cascade_uses_paid_backend_before_last_resort() {
    let server = MockServer::start_async().await;
    enhancer_ok(&server).await;
    let pollinations = server
        .mock_async(|when, then| {
            when.method(GET).path_includes("/pollinations/prompt/");
            then.status(429).body("too many requests");
        })
        .await;
    let local_health = server
        .mock_async(|when, then| {
            when.method(GET).path(LOCAL_HEALTH_PATH);
            then.status(503);
        })
        .await;
    let image_url = server.url("/cdn/dalle.png");
    let openai = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(OPENAI_IMAGES_PATH)
                .body_includes(format!("\"prompt\":\"{}\"", ENHANCED));
            then.status(200)
                .body(serde_json::json!({"data": [{"url": image_url}]}).to_string());
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/cdn/dalle.png");
            then.status(200).body(png_bytes(8, 8, [3, 3, 3]));
        })
        .await;
    let huggingface = server
        .mock_async(|when, then| {
            when.method(POST).path(HF_MODEL_PATH);
            then.status(200).body(png_bytes(8, 8, [4, 4, 4]));
        })
        .await;

    let credentials = Credentials::from_pairs([
        ("XAI_API_KEY", "xai-test"),
        ("OPENAI_API_KEY", "sk-test"),
        ("HUGGINGFACE_API_KEY", "hf-test"),
    ]);
    let router = GenerationRouter::new(&mock_config(&server), credentials).unwrap();
    let result = router.generate(&request("fox", ProviderId::Grok)).await;

    assert!(result.success, "unexpected failure: {}", result.message);
    pollinations.assert_calls_async(1).await;
    local_health.assert_calls_async(1).await;
    openai.assert_async().await;
    huggingface.assert_calls_async(0).await;
}
