// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Generation router
//!
//! Resolves `model_type` to an adapter, runs it, and normalizes the produced
//! image into a [`GenerationResult`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::dalle::DallEProvider;
use super::grok::GrokPromptEnhancer;
use super::huggingface::HuggingFaceProvider;
use super::image_utils::encode_png_base64;
use super::local_pipeline::LocalPipelineProvider;
use super::pollinations::PollinationsProvider;
use super::provider::ImageProvider;
use super::types::{
    GeneratedImage, GenerationError, GenerationRequest, GenerationResult, ProviderId,
};
use crate::config::{Credentials, ServiceConfig};

/// Dispatches generation requests to the provider adapters
pub struct GenerationRouter {
    providers: HashMap<ProviderId, Arc<dyn ImageProvider>>,
}

impl GenerationRouter {
    /// Build all adapters from configuration
    ///
    /// The enhancer's cascade shares the adapter instances used for direct
    /// dispatch, so the local pipeline handle is initialized at most once.
    pub fn new(config: &ServiceConfig, credentials: Credentials) -> anyhow::Result<Self> {
        let endpoints = &config.endpoints;
        let timeouts = &config.timeouts;

        let pollinations: Arc<dyn ImageProvider> = Arc::new(PollinationsProvider::new(
            &endpoints.pollinations_url,
            timeouts.pollinations,
        )?);
        let huggingface: Arc<dyn ImageProvider> = Arc::new(HuggingFaceProvider::new(
            &endpoints.huggingface_url,
            &endpoints.huggingface_model,
            credentials.clone(),
            timeouts.huggingface,
        )?);
        let dalle: Arc<dyn ImageProvider> = Arc::new(DallEProvider::new(
            &endpoints.openai_url,
            &endpoints.openai_image_model,
            credentials.clone(),
            timeouts.openai,
        )?);
        let local: Arc<dyn ImageProvider> = Arc::new(LocalPipelineProvider::new(
            config.local_pipeline.clone(),
            timeouts,
        )?);

        // Cost-ordered: free, free-but-heavy, paid, paid-cold
        let cascade = vec![
            pollinations.clone(),
            local.clone(),
            dalle.clone(),
            huggingface.clone(),
        ];
        let grok = GrokPromptEnhancer::new(
            &endpoints.xai_url,
            &endpoints.grok_model,
            credentials,
            timeouts.enhancer,
            cascade,
        )?;
        debug!("Grok delivery cascade: {:?}", grok.cascade_order());
        let grok: Arc<dyn ImageProvider> = Arc::new(grok);

        Ok(Self::with_providers(vec![
            pollinations,
            huggingface,
            grok,
            dalle,
            local,
        ]))
    }

    /// Build a router over explicit adapters, keyed by their `id()`
    pub fn with_providers(providers: Vec<Arc<dyn ImageProvider>>) -> Self {
        let providers = providers.into_iter().map(|p| (p.id(), p)).collect();
        Self { providers }
    }

    /// Registered routing keys, in discovery order
    pub fn provider_ids(&self) -> Vec<ProviderId> {
        ProviderId::ALL
            .into_iter()
            .filter(|id| self.providers.contains_key(id))
            .collect()
    }

    /// Resolve, validate and dispatch a request, returning the raw image
    pub async fn generate_image(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedImage, GenerationError> {
        let id = request.provider()?;
        request.validate()?;

        let provider = self
            .providers
            .get(&id)
            .ok_or_else(|| GenerationError::BackendUnavailable {
                provider: id,
                reason: "provider not configured".to_string(),
            })?;

        let start = Instant::now();
        match provider.generate(request).await {
            Ok(generated) => {
                info!(
                    "Generated {}x{} image via {} (requested {}) in {}ms",
                    generated.image.width(),
                    generated.image.height(),
                    generated.provider,
                    id,
                    start.elapsed().as_millis()
                );
                Ok(generated)
            }
            Err(e) => {
                warn!(
                    "Generation via {} failed after {}ms: {}",
                    id,
                    start.elapsed().as_millis(),
                    e
                );
                Err(e)
            }
        }
    }

    /// Dispatch a request and encode the image as base64 PNG
    ///
    /// Errors are returned so the HTTP layer can pick a status code;
    /// [`GenerationRouter::generate`] folds them into the result instead.
    pub async fn try_generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, GenerationError> {
        let generated = self.generate_image(request).await?;
        let encoded = encode_png_base64(&generated.image)?;
        Ok(GenerationResult::success(encoded))
    }

    /// Dispatch a request; every failure becomes a `success: false` result
    pub async fn generate(&self, request: &GenerationRequest) -> GenerationResult {
        match self.try_generate(request).await {
            Ok(result) => result,
            Err(e) => GenerationResult::failure(&e),
        }
    }

    /// Run requests one after another, one result per item in input order
    ///
    /// Items that already failed to parse are reported without dispatch.
    pub async fn generate_batch(
        &self,
        requests: Vec<Result<GenerationRequest, GenerationError>>,
    ) -> Vec<GenerationResult> {
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            let result = match request {
                Ok(request) => self.generate(&request).await,
                Err(e) => {
                    warn!("Skipping batch item: {}", e);
                    GenerationResult::failure(&e)
                }
            };
            results.push(result);
        }
        let succeeded = results.iter().filter(|r| r.success).count();
        info!(
            "Batch complete: {}/{} images generated",
            succeeded,
            results.len()
        );
        results
    }
}
