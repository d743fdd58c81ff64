use std::future::Future;

use crate::types::CorpusRecord;

/// Turns text into vectors. Query-side embedding may be a network round trip,
/// so the calls are futures; everything downstream of them is CPU-bound.
pub trait Embedder: Send + Sync {
    /// Output dimensionality (D).
    fn dim(&self) -> usize;

    /// Embed a single query string.
    fn embed_query(&self, text: &str) -> impl Future<Output = anyhow::Result<Vec<f32>>> + Send;

    /// Embed passages for ingestion. Output is aligned with `texts`.
    fn embed_batch(&self, texts: &[String]) -> impl Future<Output = anyhow::Result<Vec<Vec<f32>>>> + Send;
}

/// Storage collaborator that supplies the documents and vectors of one partition.
///
/// Only rows that finished processing are returned. Zero rows is a valid,
/// successful answer.
pub trait CorpusSource {
    fn load(&self, partition_id: &str) -> impl Future<Output = anyhow::Result<Vec<CorpusRecord>>>;
}
