// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Hugging Face Inference API provider
//!
//! Calls a hosted text-to-image model. The response body is raw image bytes;
//! errors come back as JSON with an `error` field (e.g. while the model is
//! loading).

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use super::image_utils::decode_image_bytes;
use super::provider::ImageProvider;
use super::types::{GeneratedImage, GenerationError, GenerationRequest, ProviderId};
use crate::config::Credentials;

/// Hugging Face Inference API provider
pub struct HuggingFaceProvider {
    client: Client,
    model_url: String,
    credentials: Credentials,
}

#[derive(Debug, Serialize)]
struct InferencePayload<'a> {
    inputs: &'a str,
    parameters: InferenceParameters<'a>,
}

#[derive(Debug, Serialize)]
struct InferenceParameters<'a> {
    width: u32,
    height: u32,
    num_inference_steps: u32,
    guidance_scale: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    negative_prompt: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<i64>,
}

impl HuggingFaceProvider {
    /// Create a new Hugging Face provider
    ///
    /// # Arguments
    /// * `base_url` - Inference API base URL
    /// * `model` - Model repository id (e.g. "stabilityai/stable-diffusion-2-1")
    /// * `credentials` - Source of `HUGGINGFACE_API_KEY`, read on every call
    /// * `timeout` - Request timeout
    pub fn new(
        base_url: &str,
        model: &str,
        credentials: Credentials,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            model_url: format!(
                "{}/models/{}",
                base_url.trim_end_matches('/'),
                model.trim_matches('/')
            ),
            credentials,
        })
    }

    fn payload<'a>(request: &'a GenerationRequest) -> InferencePayload<'a> {
        InferencePayload {
            inputs: &request.prompt,
            parameters: InferenceParameters {
                width: request.width,
                height: request.height,
                num_inference_steps: request.num_inference_steps,
                guidance_scale: request.guidance_scale,
                negative_prompt: request.negative_prompt.as_deref(),
                seed: request.seed,
            },
        }
    }
}

/// Prefer the `error` field of a JSON error body, fall back to the raw text
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl ImageProvider for HuggingFaceProvider {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedImage, GenerationError> {
        let api_key = self
            .credentials
            .for_provider(self.id())
            .ok_or_else(|| GenerationError::missing_credential(self.id()))?;

        debug!("Calling Hugging Face API: {}", self.model_url);

        let response = self
            .client
            .post(&self.model_url)
            .bearer_auth(api_key)
            .json(&Self::payload(request))
            .send()
            .await
            .map_err(|e| GenerationError::transport(self.id(), e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::ProviderError {
                provider: self.id(),
                status: Some(status.as_u16()),
                message: error_message(&body),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GenerationError::transport(self.id(), e))?;

        Ok(GeneratedImage {
            image: decode_image_bytes(&bytes)?,
            provider: self.id(),
        })
    }

    fn id(&self) -> ProviderId {
        ProviderId::HuggingFace
    }

    fn is_available(&self) -> bool {
        self.credentials.is_satisfied(self.id())
    }
}
