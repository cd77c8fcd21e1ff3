// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Provider credential lookup
//!
//! Every keyed adapter and the discovery endpoint resolve API keys through
//! [`Credentials`]. Lookups happen at call time so a key exported (or removed)
//! after startup is picked up on the next request.

use std::collections::BTreeMap;
use std::fmt;

use crate::generation::ProviderId;

/// Read access to provider API keys
///
/// Values come from an explicit override map first, then (unless disabled)
/// from the process environment. Blank values count as absent.
#[derive(Clone, Default)]
pub struct Credentials {
    overrides: BTreeMap<String, String>,
    inherit_process_env: bool,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<&str> = self.overrides.keys().map(|k| k.as_str()).collect();
        f.debug_struct("Credentials")
            .field("override_keys", &keys)
            .field("inherit_process_env", &self.inherit_process_env)
            .finish()
    }
}

impl Credentials {
    /// Credentials backed by the process environment (after `.env` loading)
    pub fn from_env() -> Self {
        Self {
            overrides: BTreeMap::new(),
            inherit_process_env: true,
        }
    }

    /// Credentials backed only by the given pairs; the process environment is ignored
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            overrides: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            inherit_process_env: false,
        }
    }

    /// Add or replace a single key
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.insert(key.into(), value.into());
        self
    }

    /// Look up a key
    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = self.overrides.get(key) {
            return Some(value.clone()).filter(|v| !v.trim().is_empty());
        }
        if !self.inherit_process_env {
            return None;
        }
        std::env::var(key)
            .ok()
            .filter(|value| !value.trim().is_empty())
    }

    /// First present value among `keys`, in order
    pub fn first_of(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.get(key))
    }

    /// API key for `provider`, honoring its accepted aliases
    pub fn for_provider(&self, provider: ProviderId) -> Option<String> {
        self.first_of(provider.credential_keys())
    }

    /// Whether `provider` can be called as far as credentials go.
    /// Providers without a credential requirement are always satisfied.
    pub fn is_satisfied(&self, provider: ProviderId) -> bool {
        !provider.requires_credential() || self.for_provider(provider).is_some()
    }
}
