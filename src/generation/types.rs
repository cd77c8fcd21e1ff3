// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Core types for image generation routing

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::image_utils::ImageError;

/// Human-readable list of routable providers, used in `UnsupportedProvider` messages
pub const AVAILABLE_PROVIDERS_HINT: &str =
    "pollinations (FREE), huggingface (FREE), stable-diffusion, grok, dall-e";

pub const SUCCESS_MESSAGE: &str = "Image generated successfully";

fn default_model_type() -> String {
    ProviderId::Pollinations.as_str().to_string()
}

fn default_dimension() -> u32 {
    512
}

fn default_steps() -> u32 {
    50
}

fn default_guidance_scale() -> f32 {
    7.5
}

/// Routing key for the image generation backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    /// Free hosted renderer (image.pollinations.ai), no credential
    Pollinations,
    /// Hosted inference API (Hugging Face)
    HuggingFace,
    /// Prompt enhancer (xAI Grok) that cascades into the image backends
    Grok,
    /// Commercial image API (OpenAI DALL-E 3)
    DallE,
    /// Local diffusion runtime
    StableDiffusion,
}

/// Billing tier reported by the discovery endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderTier {
    Free,
    Paid,
    Local,
}

impl ProviderId {
    /// All providers, in the order the discovery endpoint reports them
    pub const ALL: [ProviderId; 5] = [
        ProviderId::Pollinations,
        ProviderId::HuggingFace,
        ProviderId::Grok,
        ProviderId::DallE,
        ProviderId::StableDiffusion,
    ];

    /// Wire name used in `model_type`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pollinations => "pollinations",
            Self::HuggingFace => "huggingface",
            Self::Grok => "grok",
            Self::DallE => "dall-e",
            Self::StableDiffusion => "stable-diffusion",
        }
    }

    /// Environment keys accepted as this provider's credential, in lookup order.
    /// Empty when the provider needs no credential.
    pub fn credential_keys(&self) -> &'static [&'static str] {
        match self {
            Self::Pollinations | Self::StableDiffusion => &[],
            Self::HuggingFace => &["HUGGINGFACE_API_KEY"],
            Self::Grok => &["XAI_API_KEY", "GROK_API_KEY"],
            Self::DallE => &["OPENAI_API_KEY"],
        }
    }

    pub fn requires_credential(&self) -> bool {
        !self.credential_keys().is_empty()
    }

    pub fn tier(&self) -> ProviderTier {
        match self {
            Self::Pollinations | Self::HuggingFace => ProviderTier::Free,
            Self::Grok | Self::DallE => ProviderTier::Paid,
            Self::StableDiffusion => ProviderTier::Local,
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| GenerationError::UnsupportedProvider {
                name: s.to_string(),
            })
    }
}

/// A text-to-image generation request
///
/// Deserialized directly from the `/generate` body. `model_type` stays free
/// text so unknown names reach the router and are reported as
/// `UnsupportedProvider` instead of a deserialization rejection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Text description of the image
    pub prompt: String,

    /// Backend name (e.g. "pollinations", "grok")
    #[serde(default = "default_model_type")]
    pub model_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,

    #[serde(default = "default_dimension")]
    pub width: u32,

    #[serde(default = "default_dimension")]
    pub height: u32,

    /// Diffusion steps, ignored by hosted renderers
    #[serde(default = "default_steps")]
    pub num_inference_steps: u32,

    #[serde(default = "default_guidance_scale")]
    pub guidance_scale: f32,

    /// Random seed for reproducibility
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
}

impl GenerationRequest {
    /// Create a request with default sampling parameters
    pub fn new(prompt: impl Into<String>, provider: ProviderId) -> Self {
        Self {
            prompt: prompt.into(),
            model_type: provider.as_str().to_string(),
            negative_prompt: None,
            width: default_dimension(),
            height: default_dimension(),
            num_inference_steps: default_steps(),
            guidance_scale: default_guidance_scale(),
            seed: None,
        }
    }

    /// Resolve `model_type` to a routing key
    pub fn provider(&self) -> Result<ProviderId, GenerationError> {
        self.model_type.parse()
    }

    /// Copy of this request with a replaced prompt, routed to `provider`
    pub fn derive(&self, prompt: &str, provider: ProviderId) -> Self {
        Self {
            prompt: prompt.to_string(),
            model_type: provider.as_str().to_string(),
            ..self.clone()
        }
    }

    /// "WxH" size string used by OpenAI-compatible image APIs
    pub fn size_string(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }

    /// Validate the request fields
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.prompt.trim().is_empty() {
            return Err(GenerationError::InvalidRequest(
                "prompt must not be empty".to_string(),
            ));
        }
        if self.width == 0 || self.height == 0 {
            return Err(GenerationError::InvalidRequest(format!(
                "width and height must be > 0, got {}x{}",
                self.width, self.height
            )));
        }
        if self.num_inference_steps == 0 {
            return Err(GenerationError::InvalidRequest(
                "num_inference_steps must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Normalized outcome of one generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub success: bool,
    /// PNG image, base64-encoded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub message: String,
}

impl GenerationResult {
    pub fn success(image_base64: String) -> Self {
        Self {
            success: true,
            image_base64: Some(image_base64),
            image_url: None,
            message: SUCCESS_MESSAGE.to_string(),
        }
    }

    pub fn failure(error: &GenerationError) -> Self {
        Self {
            success: false,
            image_base64: None,
            image_url: None,
            message: format!("Error generating image: {}", error),
        }
    }
}

/// An in-memory image produced by one of the adapters
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub image: DynamicImage,
    /// Adapter that produced the pixels
    pub provider: ProviderId,
}

/// One failed step of the enhancer cascade
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeAttempt {
    pub provider: ProviderId,
    pub reason: String,
}

/// Errors that can occur while routing a generation request
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Required API key absent from configuration
    #[error("{} not found in environment variables", .keys.join(" or "))]
    MissingCredential {
        provider: ProviderId,
        keys: Vec<&'static str>,
    },

    /// Required local runtime is not reachable or not installed
    #[error("{provider} backend unavailable: {reason}")]
    BackendUnavailable { provider: ProviderId, reason: String },

    /// Unknown routing key
    #[error("Unsupported model type: {name}. Available: {}", AVAILABLE_PROVIDERS_HINT)]
    UnsupportedProvider { name: String },

    /// Non-success response, transport failure or unusable body from a provider
    #[error("{provider} API error{}: {message}", .status.map(|s| format!(" ({})", s)).unwrap_or_default())]
    ProviderError {
        provider: ProviderId,
        status: Option<u16>,
        message: String,
    },

    /// Every step of the enhancer cascade failed
    #[error("No image generation service available (attempted: {})", format_attempts(.attempted))]
    NoProviderAvailable { attempted: Vec<CascadeAttempt> },

    /// Request failed validation
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Provider output could not be normalized to PNG
    #[error("Image normalization failed: {0}")]
    Image(#[from] ImageError),
}

fn format_attempts(attempted: &[CascadeAttempt]) -> String {
    if attempted.is_empty() {
        return "none".to_string();
    }
    attempted
        .iter()
        .map(|a| format!("{}: {}", a.provider, a.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

impl GenerationError {
    /// Shorthand for a provider error without an HTTP status
    pub fn provider(provider: ProviderId, message: impl Into<String>) -> Self {
        Self::ProviderError {
            provider,
            status: None,
            message: message.into(),
        }
    }

    /// Transport-level failure from reqwest
    pub fn transport(provider: ProviderId, err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("request timed out: {}", err)
        } else {
            format!("request failed: {}", err)
        };
        Self::provider(provider, message)
    }

    pub fn missing_credential(provider: ProviderId) -> Self {
        Self::MissingCredential {
            provider,
            keys: provider.credential_keys().to_vec(),
        }
    }

    /// Routing-level contract violations that surface as a client error status.
    /// Validation failures are reported like any other failed generation.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::UnsupportedProvider { .. })
    }
}
