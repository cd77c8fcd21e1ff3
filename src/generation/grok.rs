// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Grok prompt enhancer
//!
//! Grok has no image endpoint. It rewrites the prompt through xAI chat
//! completions, then the rewritten prompt is delivered through the image
//! cascade: Pollinations, local pipeline, DALL-E, Hugging Face.

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::cascade::run_cascade;
use super::provider::ImageProvider;
use super::types::{GeneratedImage, GenerationError, GenerationRequest, ProviderId};
use crate::config::Credentials;

const ENHANCER_SYSTEM_PROMPT: &str = "You are a professional prompt engineer for AI image generation. Enhance the given prompt to be more detailed, descriptive, and optimized for image generation. Include style, composition, lighting, and other visual details. Return ONLY the enhanced prompt, nothing else.";

const ENHANCE_MAX_TOKENS: u32 = 300;
const ENHANCE_TEMPERATURE: f32 = 0.7;

// --- OpenAI-compatible serde structs ---

#[derive(serde::Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(serde::Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(serde::Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(serde::Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(serde::Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Prompt-enhancing provider that cascades into the image providers
pub struct GrokPromptEnhancer {
    client: Client,
    endpoint: String,
    model: String,
    credentials: Credentials,
    cascade: Vec<Arc<dyn ImageProvider>>,
}

impl GrokPromptEnhancer {
    /// Create a new enhancer
    ///
    /// # Arguments
    /// * `base_url` - xAI API base URL (e.g. "https://api.x.ai/v1")
    /// * `model` - Chat model id (e.g. "grok-beta")
    /// * `credentials` - Source of `XAI_API_KEY` / `GROK_API_KEY`
    /// * `timeout` - Timeout of the rewrite call only
    /// * `cascade` - Image providers tried in order with the rewritten prompt
    pub fn new(
        base_url: &str,
        model: &str,
        credentials: Credentials,
        timeout: Duration,
        cascade: Vec<Arc<dyn ImageProvider>>,
    ) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.to_string(),
            credentials,
            cascade,
        })
    }

    /// Providers of the delivery cascade, in order
    pub fn cascade_order(&self) -> Vec<ProviderId> {
        self.cascade.iter().map(|p| p.id()).collect()
    }

    /// Rewrite `prompt` into a more detailed image prompt
    pub async fn enhance(&self, api_key: &str, prompt: &str) -> Result<String, GenerationError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: ENHANCER_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!(
                        "Enhance this image generation prompt to be more detailed and descriptive: {}",
                        prompt
                    ),
                },
            ],
            max_tokens: ENHANCE_MAX_TOKENS,
            temperature: ENHANCE_TEMPERATURE,
        };

        debug!("Grok enhance POST {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::transport(self.id(), e))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let message = response.text().await.unwrap_or_default();
            return Err(GenerationError::ProviderError {
                provider: self.id(),
                status: Some(status.as_u16()),
                message,
            });
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            GenerationError::provider(self.id(), format!("JSON parse error: {}", e))
        })?;

        let enhanced = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();

        if enhanced.is_empty() {
            return Err(GenerationError::provider(
                self.id(),
                "empty enhanced prompt in response",
            ));
        }

        Ok(enhanced)
    }
}

#[async_trait]
impl ImageProvider for GrokPromptEnhancer {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedImage, GenerationError> {
        let api_key = self
            .credentials
            .for_provider(self.id())
            .ok_or_else(|| GenerationError::missing_credential(self.id()))?;

        info!("Using Grok to enhance prompt: {}", request.prompt);
        let enhanced = self.enhance(&api_key, &request.prompt).await?;
        info!("Enhanced prompt from Grok: {}", enhanced);

        run_cascade(&self.cascade, request, &enhanced).await
    }

    fn id(&self) -> ProviderId {
        ProviderId::Grok
    }

    fn is_available(&self) -> bool {
        self.credentials.is_satisfied(self.id())
    }
}
