// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Ordered stop-on-first-success delivery over several image providers

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::provider::ImageProvider;
use super::types::{CascadeAttempt, GeneratedImage, GenerationError, GenerationRequest};

/// Try `steps` in order with `prompt` until one produces an image
///
/// Each step receives a copy of `request` with the prompt replaced and the
/// routing key set to the step's provider. Steps reporting themselves
/// unavailable are skipped without an attempt. Every failure, whatever its
/// kind, moves on to the next step.
pub async fn run_cascade(
    steps: &[Arc<dyn ImageProvider>],
    request: &GenerationRequest,
    prompt: &str,
) -> Result<GeneratedImage, GenerationError> {
    let start = Instant::now();
    let mut attempted = Vec::new();

    for step in steps {
        if !step.is_available() {
            debug!("Skipping {} (credential not configured)", step.id());
            continue;
        }

        debug!("Trying image provider: {}", step.id());
        let derived = request.derive(prompt, step.id());

        match step.generate(&derived).await {
            Ok(image) => {
                info!(
                    "Cascade delivered image via {} after {} failed attempt(s) in {}ms",
                    step.id(),
                    attempted.len(),
                    start.elapsed().as_millis()
                );
                return Ok(image);
            }
            Err(e) => {
                warn!("Image provider {} failed: {}, trying next", step.id(), e);
                attempted.push(CascadeAttempt {
                    provider: step.id(),
                    reason: e.to_string(),
                });
            }
        }
    }

    Err(GenerationError::NoProviderAvailable { attempted })
}
