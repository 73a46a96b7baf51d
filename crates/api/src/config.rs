//! Server configuration, read from the environment.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use listings_catalog::{Branch, ProductRecord};
use listings_sync::InMemoryBackend;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// JSON file with initial `{products, branches}`.
    pub seed: Option<PathBuf>,
}

/// Initial backend contents.
#[derive(Debug, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub products: Vec<ProductRecord>,
    #[serde(default)]
    pub branches: Vec<Branch>,
}

impl ServerConfig {
    /// Read `LISTINGS_BIND_ADDR` and `LISTINGS_SEED`.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind = lookup("LISTINGS_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind
            .parse::<SocketAddr>()
            .with_context(|| format!("LISTINGS_BIND_ADDR is not a socket address: {bind:?}"))?;

        let seed = lookup("LISTINGS_SEED").filter(|s| !s.is_empty()).map(PathBuf::from);
        if seed.is_none() {
            tracing::warn!("LISTINGS_SEED not set; starting with an empty catalog");
        }

        Ok(Self { bind_addr, seed })
    }

    /// Build the backend, loading the seed file if one is configured.
    pub fn backend(&self) -> anyhow::Result<InMemoryBackend> {
        let seed = match &self.seed {
            Some(path) => load_seed(path)?,
            None => Seed::default(),
        };
        tracing::info!(
            products = seed.products.len(),
            branches = seed.branches.len(),
            "catalog seeded"
        );
        Ok(InMemoryBackend::new(seed.products, seed.branches))
    }
}

pub fn load_seed(path: &Path) -> anyhow::Result<Seed> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid seed file {}", path.display()))
}
