// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image generation API endpoint module
//!
//! Provides POST /generate and POST /generate-batch.

pub mod handler;

pub use handler::{generate_batch_handler, generate_image_handler};
