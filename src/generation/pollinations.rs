// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Pollinations.ai renderer
//!
//! Free hosted renderer, no API key. The prompt travels in the URL path and
//! the response body is the image itself.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::image_utils::decode_image_bytes;
use super::provider::ImageProvider;
use super::types::{GeneratedImage, GenerationError, GenerationRequest, ProviderId};

/// Pollinations.ai image provider
pub struct PollinationsProvider {
    client: Client,
    base_url: String,
}

impl PollinationsProvider {
    /// Create a new Pollinations provider
    ///
    /// # Arguments
    /// * `base_url` - Renderer base URL (e.g. "https://image.pollinations.ai")
    /// * `timeout` - Request timeout
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build `{base}/prompt/{encoded prompt}?width=..&height=..[&seed=..]&nologo=true&enhance=true`
    pub fn build_url(&self, request: &GenerationRequest) -> Result<Url, GenerationError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            GenerationError::provider(self.id(), format!("invalid base url: {}", e))
        })?;

        url.path_segments_mut()
            .map_err(|_| GenerationError::provider(self.id(), "base url cannot hold a path"))?
            .pop_if_empty()
            .push("prompt")
            .push(&request.prompt);

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("width", &request.width.to_string())
                .append_pair("height", &request.height.to_string());
            if let Some(seed) = request.seed {
                query.append_pair("seed", &seed.to_string());
            }
            // Always on: drop the watermark and let the renderer expand the prompt
            query
                .append_pair("nologo", "true")
                .append_pair("enhance", "true");
        }

        Ok(url)
    }
}

#[async_trait]
impl ImageProvider for PollinationsProvider {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedImage, GenerationError> {
        let url = self.build_url(request)?;
        debug!("Calling Pollinations.ai API: {}", url);

        let response = self
            .client
            .get(url)
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
        ProviderId::Pollinations
    }
}
