// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Result};
use clap::Parser;
use imagegen_service::{
    api::{start_server, AppState},
    cli::Cli,
    config::{Credentials, ServiceConfig},
    generation::ProviderId,
    version,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; the process environment still applies
    let dotenv_loaded = dotenv::dotenv().is_ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting {}", version::get_version_string());
    if !dotenv_loaded {
        info!("No .env file found, using process environment only");
    }

    let cli = Cli::parse();
    let addr = cli.socket_addr()?;

    let config = ServiceConfig::from_env();
    config
        .validate()
        .map_err(|e| anyhow!("invalid configuration: {}", e))?;

    let credentials = Credentials::from_env();
    for id in ProviderId::ALL {
        if !credentials.is_satisfied(id) {
            warn!(
                "{} disabled until {} is set",
                id,
                id.credential_keys().join(" or ")
            );
        }
    }
    if config.local_pipeline.configured {
        info!(
            "Local diffusion runtime: {} ({})",
            config.local_pipeline.endpoint, config.local_pipeline.model
        );
    }

    let state = AppState::new(config, credentials)?;
    start_server(state, addr).await
}
