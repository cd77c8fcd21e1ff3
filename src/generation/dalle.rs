// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! OpenAI DALL-E provider
//!
//! Two round trips: the images endpoint returns a hosted URL, which is then
//! fetched to materialize the pixels.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::image_utils::decode_image_bytes;
use super::provider::ImageProvider;
use super::types::{GeneratedImage, GenerationError, GenerationRequest, ProviderId};
use crate::config::Credentials;

/// OpenAI image generation provider
pub struct DallEProvider {
    client: Client,
    base_url: String,
    model: String,
    credentials: Credentials,
}

#[derive(Debug, Serialize)]
struct ImagesRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: String,
    quality: &'static str,
    n: u32,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
}

impl DallEProvider {
    /// Create a new DALL-E provider
    ///
    /// # Arguments
    /// * `base_url` - OpenAI API base URL (e.g. "https://api.openai.com/v1")
    /// * `model` - Image model id (e.g. "dall-e-3")
    /// * `credentials` - Source of `OPENAI_API_KEY`, read on every call
    /// * `timeout` - Timeout applied to each of the two requests
    pub fn new(
        base_url: &str,
        model: &str,
        credentials: Credentials,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            credentials,
        })
    }

    /// Request an image and return its hosted URL
    async fn request_image_url(
        &self,
        api_key: &str,
        request: &GenerationRequest,
    ) -> Result<String, GenerationError> {
        let url = format!("{}/images/generations", self.base_url);
        let body = ImagesRequest {
            model: &self.model,
            prompt: &request.prompt,
            size: request.size_string(),
            quality: "standard",
            n: 1,
        };
        debug!("DALL-E generate POST {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::transport(self.id(), e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GenerationError::ProviderError {
                provider: self.id(),
                status: Some(status.as_u16()),
                message,
            });
        }

        let parsed: ImagesResponse = response.json().await.map_err(|e| {
            GenerationError::provider(self.id(), format!("JSON parse error: {}", e))
        })?;

        parsed
            .data
            .into_iter()
            .next()
            .and_then(|d| d.url)
            .ok_or_else(|| GenerationError::provider(self.id(), "no image url in response"))
    }

    async fn download(&self, image_url: &str) -> Result<GeneratedImage, GenerationError> {
        debug!("DALL-E download GET {}", image_url);

        let response = self
            .client
            .get(image_url)
            .send()
            .await
            .map_err(|e| GenerationError::transport(self.id(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::ProviderError {
                provider: self.id(),
                status: Some(status.as_u16()),
                message: format!("image download failed: {}", image_url),
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
}

#[async_trait]
impl ImageProvider for DallEProvider {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedImage, GenerationError> {
        let api_key = self
            .credentials
            .for_provider(self.id())
            .ok_or_else(|| GenerationError::missing_credential(self.id()))?;

        let image_url = self.request_image_url(&api_key, request).await?;
        self.download(&image_url).await
    }

    fn id(&self) -> ProviderId {
        ProviderId::DallE
    }

    fn is_available(&self) -> bool {
        self.credentials.is_satisfied(self.id())
    }
}
