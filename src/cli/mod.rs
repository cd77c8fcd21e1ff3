// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Parser;
use std::net::{IpAddr, SocketAddr};

/// AI image generation service
#[derive(Parser, Debug)]
#[command(name = "imagegen-service")]
#[command(version)]
#[command(about = "HTTP façade routing text-to-image requests to hosted and local providers", long_about = None)]
pub struct Cli {
    /// Interface to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,
}

impl Cli {
    /// Socket address built from `--host` and `--port`
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .with_context(|| format!("invalid --host '{}'", self.host))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}
