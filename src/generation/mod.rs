// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text-to-image generation routing
//!
//! Adapters for the supported image backends behind one dispatch function:
//! - Pollinations.ai (free, no key)
//! - Hugging Face Inference API (`HUGGINGFACE_API_KEY`)
//! - Grok prompt enhancer cascading into the others (`XAI_API_KEY` / `GROK_API_KEY`)
//! - OpenAI DALL-E (`OPENAI_API_KEY`)
//! - Local diffusion runtime

pub mod cascade;
pub mod dalle;
pub mod grok;
pub mod huggingface;
pub mod image_utils;
pub mod local_pipeline;
pub mod pollinations;
pub mod provider;
pub mod router;
pub mod types;

pub use cascade::run_cascade;
pub use dalle::DallEProvider;
pub use grok::GrokPromptEnhancer;
pub use huggingface::HuggingFaceProvider;
pub use image_utils::{decode_base64_image, decode_image_bytes, encode_png_base64, ImageError};
pub use local_pipeline::{ComputeDevice, LocalPipeline, LocalPipelineProvider};
pub use pollinations::PollinationsProvider;
pub use provider::ImageProvider;
pub use router::GenerationRouter;
pub use types::{
    CascadeAttempt, GeneratedImage, GenerationError, GenerationRequest, GenerationResult,
    ProviderId, ProviderTier,
};
