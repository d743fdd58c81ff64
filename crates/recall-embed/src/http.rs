use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use recall_core::traits::Embedder;

use crate::EmbedderConfig;

/// Client for an OpenAI-compatible `POST {endpoint}/embeddings` API.
pub struct HttpEmbedder {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: Option<String>,
    dim: usize,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl HttpEmbedder {
    pub fn from_config(config: &EmbedderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("building http client")?;
        let api_key = std::env::var(&config.api_key_env).ok().filter(|k| !k.is_empty());
        Ok(Self {
            client,
            url: format!("{}/embeddings", config.endpoint.trim_end_matches('/')),
            model: config.model.clone(),
            api_key,
            dim: config.dim,
        })
    }

    async fn request(&self, input: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut req = self.client.post(&self.url).json(&EmbeddingRequest { model: &self.model, input });
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await.with_context(|| format!("POST {}", self.url))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("embedding request failed with {status}: {body}"));
        }
        let parsed: EmbeddingResponse = resp.json().await.context("decoding embedding response")?;
        let vectors = order_by_index(parsed.data, input.len())?;
        debug!(n = input.len(), "embedded batch");
        Ok(vectors)
    }
}

/// Put response items back in input order. The `index` values must be
/// exactly `0..expected`.
fn order_by_index(mut data: Vec<EmbeddingData>, expected: usize) -> Result<Vec<Vec<f32>>> {
    if data.len() != expected {
        return Err(anyhow!("embedder returned {} vectors for {} inputs", data.len(), expected));
    }
    data.sort_by_key(|d| d.index);
    if let Some((pos, d)) = data.iter().enumerate().find(|(pos, d)| d.index != *pos) {
        return Err(anyhow!("embedder response has index {} where {pos} was expected", d.index));
    }
    Ok(data.into_iter().map(|d| d.embedding).collect())
}

impl Embedder for HttpEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let input = [text.to_string()];
        self.request(&input)
            .await?
            .pop()
            .ok_or_else(|| anyhow!("embedder returned no vector"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(body: &str) -> Vec<EmbeddingData> {
        serde_json::from_str::<EmbeddingResponse>(body).expect("response body").data
    }

    #[test]
    fn reorders_by_index() {
        let body = r#"{"data": [
            {"index": 1, "embedding": [0.0, 1.0], "object": "embedding"},
            {"index": 0, "embedding": [1.0, 0.0], "object": "embedding"}
        ], "model": "m"}"#;
        let vectors = order_by_index(data(body), 2).expect("ordered");
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn rejects_count_mismatch() {
        let body = r#"{"data": [{"index": 0, "embedding": [1.0]}]}"#;
        assert!(order_by_index(data(body), 2).is_err());
    }

    #[test]
    fn rejects_duplicate_and_out_of_range_indices() {
        let dup = r#"{"data": [{"index": 0, "embedding": [1.0]}, {"index": 0, "embedding": [2.0]}]}"#;
        let err = order_by_index(data(dup), 2).unwrap_err();
        assert!(err.to_string().contains("index 0 where 1"), "{err}");

        let gap = r#"{"data": [{"index": 0, "embedding": [1.0]}, {"index": 5, "embedding": [2.0]}]}"#;
        assert!(order_by_index(data(gap), 2).is_err());
    }
}
