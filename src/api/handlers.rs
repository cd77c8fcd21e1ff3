// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::http_server::AppState;
use crate::config::{Credentials, ServiceConfig};
use crate::generation::{ProviderId, ProviderTier};

const SERVICE_NAME: &str = "AI Image Generation Service";

const DISCOVERY_NOTE: &str = "Use 'pollinations' for 100% FREE image generation (no API key needed!). Use 'huggingface' for FREE Hugging Face API (requires HUGGINGFACE_API_KEY). Use 'grok' to enhance the prompt with Grok before generating (requires XAI_API_KEY or GROK_API_KEY). Use 'dall-e' for DALL-E API (requires OPENAI_API_KEY). Use 'stable-diffusion' for local generation (requires LOCAL_DIFFUSION_ENDPOINT).";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
}

/// Capability discovery payload served on `GET /`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceInfoResponse {
    pub message: String,
    pub status: String,
    /// Providers whose requirements are currently met
    pub models: Vec<String>,
    pub free_models: Vec<String>,
    pub paid_models: Vec<String>,
    pub note: String,
}

impl ServiceInfoResponse {
    /// Build the discovery payload from the registered providers and the
    /// current credentials and configuration
    pub fn discover(
        registered: &[ProviderId],
        credentials: &Credentials,
        config: &ServiceConfig,
    ) -> Self {
        let models = registered
            .iter()
            .copied()
            .filter(|id| match id {
                ProviderId::StableDiffusion => config.local_pipeline.configured,
                other => credentials.is_satisfied(*other),
            })
            .map(|id| id.as_str().to_string())
            .collect();

        let by_tier = |tier: ProviderTier| -> Vec<String> {
            ProviderId::ALL
                .into_iter()
                .filter(|id| id.tier() == tier)
                .map(|id| id.as_str().to_string())
                .collect()
        };

        Self {
            message: SERVICE_NAME.to_string(),
            status: "running".to_string(),
            models,
            free_models: by_tier(ProviderTier::Free),
            paid_models: by_tier(ProviderTier::Paid),
            note: DISCOVERY_NOTE.to_string(),
        }
    }
}

/// GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

/// GET / - list the providers usable right now
pub async fn service_info_handler(
    State(state): State<Arc<AppState>>,
) -> Json<ServiceInfoResponse> {
    Json(ServiceInfoResponse::discover(
        &state.router.provider_ids(),
        &state.credentials,
        &state.config,
    ))
}
