// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod generation;
pub mod version;

pub use config::{Credentials, ServiceConfig};
pub use generation::{
    GenerationError, GenerationRequest, GenerationResult, GenerationRouter, ImageProvider,
    ProviderId,
};
