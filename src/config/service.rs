// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Configuration for provider endpoints, timeouts and the local diffusion runtime

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_POLLINATIONS_URL: &str = "https://image.pollinations.ai";
pub const DEFAULT_HUGGINGFACE_URL: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_HUGGINGFACE_MODEL: &str = "stabilityai/stable-diffusion-2-1";
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_IMAGE_MODEL: &str = "dall-e-3";
pub const DEFAULT_XAI_URL: &str = "https://api.x.ai/v1";
pub const DEFAULT_GROK_MODEL: &str = "grok-beta";
pub const DEFAULT_LOCAL_DIFFUSION_ENDPOINT: &str = "http://localhost:8082";
pub const DEFAULT_LOCAL_DIFFUSION_MODEL: &str = "runwayml/stable-diffusion-v1-5";
pub const DEFAULT_MAX_BATCH_SIZE: usize = 16;

/// Complete service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub endpoints: ProviderEndpoints,
    pub timeouts: ProviderTimeouts,
    pub local_pipeline: LocalPipelineConfig,
    /// Upper bound on requests accepted by one `/generate-batch` call
    pub max_batch_size: usize,
}

/// Base URLs and model identifiers of the remote providers
#[derive(Debug, Clone)]
pub struct ProviderEndpoints {
    pub pollinations_url: String,
    pub huggingface_url: String,
    pub huggingface_model: String,
    pub openai_url: String,
    pub openai_image_model: String,
    pub xai_url: String,
    pub grok_model: String,
}

/// Per-provider request timeouts
///
/// Short for the free renderer and the enhancer text call, long for the
/// backends that may cold-start or run on CPU.
#[derive(Debug, Clone)]
pub struct ProviderTimeouts {
    pub pollinations: Duration,
    pub huggingface: Duration,
    pub openai: Duration,
    pub enhancer: Duration,
    pub local_probe: Duration,
    pub local_generation: Duration,
}

/// Requested compute device for the local pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevicePreference {
    Auto,
    Cuda,
    Cpu,
}

impl DevicePreference {
    /// Parse from string, unknown values fall back to `Auto`
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "cuda" | "gpu" => Self::Cuda,
            "cpu" => Self::Cpu,
            _ => Self::Auto,
        }
    }
}

/// Local diffusion runtime settings
#[derive(Debug, Clone)]
pub struct LocalPipelineConfig {
    /// Base URL of the runtime's OpenAI-compatible API
    pub endpoint: String,
    pub model: String,
    pub device: DevicePreference,
    /// Whether the endpoint was set explicitly rather than defaulted.
    /// Discovery only advertises `stable-diffusion` in that case.
    pub configured: bool,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            pollinations_url: DEFAULT_POLLINATIONS_URL.to_string(),
            huggingface_url: DEFAULT_HUGGINGFACE_URL.to_string(),
            huggingface_model: DEFAULT_HUGGINGFACE_MODEL.to_string(),
            openai_url: DEFAULT_OPENAI_URL.to_string(),
            openai_image_model: DEFAULT_OPENAI_IMAGE_MODEL.to_string(),
            xai_url: DEFAULT_XAI_URL.to_string(),
            grok_model: DEFAULT_GROK_MODEL.to_string(),
        }
    }
}

impl Default for ProviderTimeouts {
    fn default() -> Self {
        Self {
            pollinations: Duration::from_secs(60),
            huggingface: Duration::from_secs(120),
            openai: Duration::from_secs(120),
            enhancer: Duration::from_secs(30),
            local_probe: Duration::from_secs(5),
            local_generation: Duration::from_secs(300),
        }
    }
}

impl Default for LocalPipelineConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_LOCAL_DIFFUSION_ENDPOINT.to_string(),
            model: DEFAULT_LOCAL_DIFFUSION_MODEL.to_string(),
            device: DevicePreference::Auto,
            configured: false,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoints: ProviderEndpoints::default(),
            timeouts: ProviderTimeouts::default(),
            local_pipeline: LocalPipelineConfig::default(),
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Parse an override value, keeping `default` when it is absent or unparseable
fn parse_override<T: FromStr + fmt::Display>(key: &str, raw: Option<String>, default: T) -> T {
    let Some(raw) = raw.filter(|v| !v.trim().is_empty()) else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!("Ignoring {}={:?}: not a valid number, using {}", key, raw, default);
            default
        }
    }
}

fn env_parsed<T: FromStr + fmt::Display>(key: &str, default: T) -> T {
    parse_override(key, env::var(key).ok(), default)
}

fn env_secs(key: &str, default: Duration) -> Duration {
    Duration::from_secs(env_parsed(key, default.as_secs()))
}

impl ServiceConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = ProviderTimeouts::default();
        let local_endpoint = env::var("LOCAL_DIFFUSION_ENDPOINT")
            .ok()
            .filter(|v| !v.trim().is_empty());

        Self {
            endpoints: ProviderEndpoints {
                pollinations_url: env_or("POLLINATIONS_BASE_URL", DEFAULT_POLLINATIONS_URL),
                huggingface_url: env_or("HUGGINGFACE_BASE_URL", DEFAULT_HUGGINGFACE_URL),
                huggingface_model: env_or("HUGGINGFACE_MODEL", DEFAULT_HUGGINGFACE_MODEL),
                openai_url: env_or("OPENAI_BASE_URL", DEFAULT_OPENAI_URL),
                openai_image_model: env_or("OPENAI_IMAGE_MODEL", DEFAULT_OPENAI_IMAGE_MODEL),
                xai_url: env_or("XAI_BASE_URL", DEFAULT_XAI_URL),
                grok_model: env_or("GROK_MODEL", DEFAULT_GROK_MODEL),
            },
            timeouts: ProviderTimeouts {
                pollinations: env_secs("POLLINATIONS_TIMEOUT_SECS", defaults.pollinations),
                huggingface: env_secs("HUGGINGFACE_TIMEOUT_SECS", defaults.huggingface),
                openai: env_secs("OPENAI_TIMEOUT_SECS", defaults.openai),
                enhancer: env_secs("GROK_TIMEOUT_SECS", defaults.enhancer),
                local_probe: defaults.local_probe,
                local_generation: env_secs(
                    "LOCAL_DIFFUSION_TIMEOUT_SECS",
                    defaults.local_generation,
                ),
            },
            local_pipeline: LocalPipelineConfig {
                configured: local_endpoint.is_some(),
                endpoint: local_endpoint
                    .unwrap_or_else(|| DEFAULT_LOCAL_DIFFUSION_ENDPOINT.to_string()),
                model: env_or("LOCAL_DIFFUSION_MODEL", DEFAULT_LOCAL_DIFFUSION_MODEL),
                device: env::var("LOCAL_DIFFUSION_DEVICE")
                    .map(|v| DevicePreference::parse(&v))
                    .unwrap_or(DevicePreference::Auto),
            },
            max_batch_size: env_parsed("MAX_BATCH_SIZE", DEFAULT_MAX_BATCH_SIZE),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        let t = &self.timeouts;
        let all = [
            ("pollinations", t.pollinations),
            ("huggingface", t.huggingface),
            ("openai", t.openai),
            ("enhancer", t.enhancer),
            ("local_probe", t.local_probe),
            ("local_generation", t.local_generation),
        ];
        if let Some((name, _)) = all.iter().find(|(_, d)| d.is_zero()) {
            return Err(format!("{} timeout must be greater than 0", name));
        }
        if self.max_batch_size == 0 {
            return Err("max_batch_size must be greater than 0".to_string());
        }

        let urls = [
            &self.endpoints.pollinations_url,
            &self.endpoints.huggingface_url,
            &self.endpoints.openai_url,
            &self.endpoints.xai_url,
            &self.local_pipeline.endpoint,
        ];
        for raw in urls {
            url::Url::parse(raw).map_err(|e| format!("invalid endpoint '{}': {}", raw, e))?;
        }
        Ok(())
    }
}
