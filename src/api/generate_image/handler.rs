// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image generation endpoint handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::api::errors::{ApiError, ApiErrorResponse};
use crate::api::http_server::AppState;
use crate::generation::{GenerationError, GenerationRequest, GenerationResult};

/// Read one request out of a JSON value
///
/// Shape errors (missing `prompt`, negative `width`, ...) become
/// `InvalidRequest` so they are reported like any other failed generation.
fn parse_request(value: serde_json::Value) -> Result<GenerationRequest, GenerationError> {
    serde_json::from_value(value).map_err(|e| GenerationError::InvalidRequest(e.to_string()))
}

/// POST /generate - Generate one image from a text prompt
///
/// Failures are reported in the body with `success: false` and status 200.
/// Only an unknown `model_type` gets the same body with status 400. A body
/// that is not JSON at all is rejected with an `ErrorResponse`.
pub async fn generate_image_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Response {
    let Json(value) = match payload {
        Ok(value) => value,
        Err(rejection) => {
            warn!("Rejected generation request body: {}", rejection.body_text());
            return ApiErrorResponse(ApiError::InvalidRequest(rejection.body_text()))
                .into_response();
        }
    };

    let outcome = match parse_request(value) {
        Ok(request) => {
            debug!(
                "Image generation request received: model_type={}, prompt_len={}, size={}",
                request.model_type,
                request.prompt.len(),
                request.size_string()
            );
            state.router.try_generate(&request).await
        }
        Err(e) => Err(e),
    };

    match outcome {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => {
            let status = if e.is_client_error() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::OK
            };
            (status, Json(GenerationResult::failure(&e))).into_response()
        }
    }
}

/// POST /generate-batch - Generate several images, one after another
///
/// Answers 200 with one result per item, in input order. An item that does
/// not describe a valid request fails on its own.
pub async fn generate_batch_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Vec<serde_json::Value>>, JsonRejection>,
) -> Result<Json<Vec<GenerationResult>>, ApiErrorResponse> {
    let Json(items) = payload.map_err(|rejection| {
        warn!("Rejected batch request body: {}", rejection.body_text());
        ApiError::InvalidRequest(rejection.body_text())
    })?;

    let limit = state.config.max_batch_size;
    if items.len() > limit {
        warn!("Batch of {} requests exceeds limit {}", items.len(), limit);
        return Err(ApiError::PayloadTooLarge { limit }.into());
    }

    debug!("Batch generation request received: {} items", items.len());
    let requests: Vec<_> = items.into_iter().map(parse_request).collect();
    Ok(Json(state.router.generate_batch(requests).await))
}
