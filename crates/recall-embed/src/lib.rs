//! recall-embed
//!
//! Embedders implementing `recall_core::traits::Embedder`: a deterministic
//! hashing embedder for development and tests, and an HTTP client for an
//! OpenAI-compatible `/embeddings` endpoint.

mod hash;
mod http;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tracing::info;

use recall_core::traits::Embedder;

pub use hash::HashEmbedder;
pub use http::HttpEmbedder;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbedderConfig {
    /// `hash` or `http`.
    pub provider: String,
    pub dim: usize,
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            provider: "http".to_string(),
            dim: 1536,
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "text-embedding-3-small".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Either embedder, chosen at runtime from configuration.
pub enum DefaultEmbedder {
    Hash(HashEmbedder),
    Http(HttpEmbedder),
}

impl Embedder for DefaultEmbedder {
    fn dim(&self) -> usize {
        match self {
            Self::Hash(e) => e.dim(),
            Self::Http(e) => e.dim(),
        }
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        match self {
            Self::Hash(e) => e.embed_query(text).await,
            Self::Http(e) => e.embed_query(text).await,
        }
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        match self {
            Self::Hash(e) => e.embed_batch(texts).await,
            Self::Http(e) => e.embed_batch(texts).await,
        }
    }
}

/// Build the configured embedder. `APP_USE_FAKE_EMBEDDINGS=1` forces the
/// hashing embedder regardless of configuration.
pub fn default_embedder(config: &EmbedderConfig) -> Result<DefaultEmbedder> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));
    if use_fake || config.provider == "hash" {
        info!(dim = config.dim, "using hash embedder");
        return Ok(DefaultEmbedder::Hash(HashEmbedder::new(config.dim)?));
    }
    match config.provider.as_str() {
        "http" => {
            info!(endpoint = %config.endpoint, model = %config.model, "using http embedder");
            Ok(DefaultEmbedder::Http(HttpEmbedder::from_config(config)?))
        }
        other => Err(anyhow!("unknown embedding provider '{other}'")),
    }
}
