#![allow(dead_code)]

use std::sync::Arc;

use recall_core::traits::Embedder;
use recall_core::types::Document;
use recall_retrieval::{Corpus, RetrievalConfig, RetrievalEngine};

/// Returns the same vector for every query.
pub struct ConstEmbedder(pub Vec<f32>);

impl Embedder for ConstEmbedder {
    fn dim(&self) -> usize {
        self.0.len()
    }

    async fn embed_query(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
        Ok(self.0.clone())
    }

    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| self.0.clone()).collect())
    }
}

pub struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn dim(&self) -> usize {
        2
    }

    async fn embed_query(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
        Err(anyhow::anyhow!("embedding service unavailable"))
    }

    async fn embed_batch(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Err(anyhow::anyhow!("embedding service unavailable"))
    }
}

/// Query vector all fixtures are scored against.
pub const QUERY: [f32; 2] = [1.0, 0.0];

/// Unit vector whose cosine with [`QUERY`] is `sim`.
pub fn at(sim: f32) -> Vec<f32> {
    vec![sim, (1.0 - sim * sim).max(0.0).sqrt()]
}

pub fn doc(id: &str, group: &str, text: &str) -> Document {
    Document::new(id, text, group)
}

pub fn plain_config() -> RetrievalConfig {
    RetrievalConfig { lexical_prefilter: false, neighbor_window: 0, ..RetrievalConfig::default() }
}

pub fn engine(entries: Vec<(Document, Vec<f32>)>, config: RetrievalConfig) -> RetrievalEngine<ConstEmbedder> {
    let corpus = Corpus::new(entries).expect("corpus");
    RetrievalEngine::new(Arc::new(corpus), ConstEmbedder(QUERY.to_vec()), config).expect("engine")
}

pub fn ids(docs: &[Document]) -> Vec<&str> {
    docs.iter().map(|d| d.id.as_str()).collect()
}
