// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod credentials;
pub mod service;

pub use credentials::Credentials;
pub use service::{
    DevicePreference, LocalPipelineConfig, ProviderEndpoints, ProviderTimeouts, ServiceConfig,
};
