// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Local diffusion pipeline provider
//!
//! Drives a local diffusion runtime (sidecar process with an OpenAI-compatible
//! images API). The pipeline handle is created on first use by probing the
//! runtime, then shared for the process lifetime. A failed probe is cached
//! too, so later calls fail fast with `BackendUnavailable`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::image_utils::decode_base64_image;
use super::provider::ImageProvider;
use super::types::{GeneratedImage, GenerationError, GenerationRequest, ProviderId};
use crate::config::{DevicePreference, LocalPipelineConfig, ProviderTimeouts};

/// Compute device the pipeline is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputeDevice {
    Cuda,
    Cpu,
}

impl ComputeDevice {
    /// Resolve a device preference. `Auto` picks CUDA only when
    /// `CUDA_VISIBLE_DEVICES` names at least one device.
    pub fn resolve(preference: DevicePreference, cuda_visible_devices: Option<&str>) -> Self {
        match preference {
            DevicePreference::Cuda => Self::Cuda,
            DevicePreference::Cpu => Self::Cpu,
            DevicePreference::Auto => {
                let visible = cuda_visible_devices
                    .map(str::trim)
                    .filter(|v| !v.is_empty() && *v != "-1" && !v.eq_ignore_ascii_case("none"));
                if visible.is_some() {
                    Self::Cuda
                } else {
                    Self::Cpu
                }
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cuda => "cuda",
            Self::Cpu => "cpu",
        }
    }

    /// Half precision on GPU, full precision on CPU
    pub fn precision(&self) -> &'static str {
        match self {
            Self::Cuda => "float16",
            Self::Cpu => "float32",
        }
    }
}

/// Handle to an initialized local pipeline
#[derive(Debug, Clone)]
pub struct LocalPipeline {
    endpoint: String,
    model: String,
    device: ComputeDevice,
}

impl LocalPipeline {
    pub fn device(&self) -> ComputeDevice {
        self.device
    }
}

/// Cached outcome of pipeline initialization
enum PipelineSlot {
    Ready(Arc<LocalPipeline>),
    Failed(String),
}

impl PipelineSlot {
    fn get(&self) -> Result<Arc<LocalPipeline>, GenerationError> {
        match self {
            Self::Ready(pipeline) => Ok(pipeline.clone()),
            Self::Failed(reason) => Err(GenerationError::BackendUnavailable {
                provider: ProviderId::StableDiffusion,
                reason: reason.clone(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct LocalGenerationBody<'a> {
    prompt: &'a str,
    model: &'a str,
    size: String,
    n: u32,
    response_format: &'static str,
    num_inference_steps: u32,
    guidance_scale: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    negative_prompt: Option<&'a str>,
    device: &'static str,
    torch_dtype: &'static str,
    safety_checker: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    generator: Option<GeneratorState>,
}

/// Seeded random-generator state, scoped to the pipeline's device
#[derive(Debug, Serialize)]
struct GeneratorState {
    device: &'static str,
    seed: i64,
}

#[derive(Debug, Deserialize)]
struct LocalImageResponse {
    data: Vec<LocalImageData>,
}

#[derive(Debug, Deserialize)]
struct LocalImageData {
    b64_json: Option<String>,
}

/// Local diffusion runtime provider
pub struct LocalPipelineProvider {
    probe_client: Client,
    client: Client,
    config: LocalPipelineConfig,
    slot: RwLock<Option<PipelineSlot>>,
}

impl LocalPipelineProvider {
    /// Create the provider. No network traffic happens until the first
    /// generation request.
    pub fn new(config: LocalPipelineConfig, timeouts: &ProviderTimeouts) -> anyhow::Result<Self> {
        let probe_client = Client::builder().timeout(timeouts.local_probe).build()?;
        let client = Client::builder()
            .timeout(timeouts.local_generation)
            .build()?;

        Ok(Self {
            probe_client,
            client,
            config: LocalPipelineConfig {
                endpoint: config.endpoint.trim_end_matches('/').to_string(),
                ..config
            },
            slot: RwLock::new(None),
        })
    }

    /// Get the shared pipeline handle, initializing it on first use
    pub async fn pipeline(&self) -> Result<Arc<LocalPipeline>, GenerationError> {
        if let Some(slot) = self.slot.read().await.as_ref() {
            return slot.get();
        }

        let mut guard = self.slot.write().await;
        // Another caller may have finished initialization while we waited
        if let Some(slot) = guard.as_ref() {
            return slot.get();
        }

        let slot = match self.load().await {
            Ok(pipeline) => PipelineSlot::Ready(Arc::new(pipeline)),
            Err(reason) => {
                warn!("Local diffusion pipeline unavailable: {}", reason);
                PipelineSlot::Failed(reason)
            }
        };
        let result = slot.get();
        *guard = Some(slot);
        result
    }

    async fn load(&self) -> Result<LocalPipeline, String> {
        let endpoint = &self.config.endpoint;
        let cuda_visible = std::env::var("CUDA_VISIBLE_DEVICES").ok();
        let device = ComputeDevice::resolve(self.config.device, cuda_visible.as_deref());

        info!(
            "Loading local diffusion pipeline: endpoint={}, model={}, device={}",
            endpoint,
            self.config.model,
            device.as_str()
        );

        let response = self
            .probe_client
            .get(format!("{}/health", endpoint))
            .send()
            .await
            .map_err(|e| format!("runtime not reachable at {}: {}", endpoint, e))?;

        if !response.status().is_success() {
            return Err(format!(
                "runtime at {} reported {}",
                endpoint,
                response.status()
            ));
        }

        info!("Local diffusion pipeline ready on {}", device.as_str());
        Ok(LocalPipeline {
            endpoint: endpoint.clone(),
            model: self.config.model.clone(),
            device,
        })
    }

    fn body<'a>(pipeline: &'a LocalPipeline, request: &'a GenerationRequest) -> LocalGenerationBody<'a> {
        let device = pipeline.device;
        LocalGenerationBody {
            prompt: &request.prompt,
            model: &pipeline.model,
            size: request.size_string(),
            n: 1,
            response_format: "b64_json",
            num_inference_steps: request.num_inference_steps,
            guidance_scale: request.guidance_scale,
            negative_prompt: request.negative_prompt.as_deref(),
            device: device.as_str(),
            torch_dtype: device.precision(),
            safety_checker: false,
            generator: request.seed.map(|seed| GeneratorState {
                device: device.as_str(),
                seed,
            }),
        }
    }
}

#[async_trait]
impl ImageProvider for LocalPipelineProvider {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedImage, GenerationError> {
        let pipeline = self.pipeline().await?;

        let url = format!("{}/v1/images/generations", pipeline.endpoint);
        debug!("Local diffusion generate POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(&Self::body(&pipeline, request))
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

        let parsed: LocalImageResponse = response.json().await.map_err(|e| {
            GenerationError::provider(self.id(), format!("JSON parse error: {}", e))
        })?;

        let b64 = parsed
            .data
            .into_iter()
            .next()
            .and_then(|d| d.b64_json)
            .ok_or_else(|| GenerationError::provider(self.id(), "no b64_json in response"))?;

        Ok(GeneratedImage {
            image: decode_base64_image(&b64)?,
            provider: self.id(),
        })
    }

    fn id(&self) -> ProviderId {
        ProviderId::StableDiffusion
    }
}
