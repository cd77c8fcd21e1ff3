// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image provider trait definition

use async_trait::async_trait;

use super::types::{GeneratedImage, GenerationError, GenerationRequest, ProviderId};

/// Trait for implementing image generation adapters
///
/// Each adapter translates a [`GenerationRequest`] to one external provider's
/// API and returns an in-memory image. Failures are returned as values; the
/// enhancer cascade relies on that to move on to the next adapter.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Generate an image for `request`
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedImage, GenerationError>;

    /// Routing key of this adapter
    fn id(&self) -> ProviderId;

    /// Check if the provider can be called (credential present, etc.)
    ///
    /// Evaluated at call time. Adapters that can only find out by trying,
    /// like the local pipeline, report `true`.
    fn is_available(&self) -> bool {
        true
    }
}
