//! Immutable (document, vector) snapshot of one partition.
//!
//! Vectors are stored row-major in one buffer with their norms precomputed,
//! and document text is lower-cased once for lexical matching. Nothing here
//! is mutated after construction; to refresh a partition, build a new
//! `Corpus` and a new engine around it.

use tracing::{info, warn};

use recall_core::error::{Error, Result};
use recall_core::traits::CorpusSource;
use recall_core::types::{CorpusRecord, Document};

#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: Vec<Document>,
    lowered: Vec<String>,
    vectors: Vec<f32>,
    norms: Vec<f32>,
    dim: usize,
}

impl Corpus {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from positionally aligned documents and vectors.
    pub fn from_parts(documents: Vec<Document>, vectors: Vec<Vec<f32>>) -> Result<Self> {
        if documents.len() != vectors.len() {
            return Err(Error::InvalidCorpus(format!(
                "{} documents but {} vectors",
                documents.len(),
                vectors.len()
            )));
        }
        let Some(dim) = vectors.first().map(Vec::len) else {
            return Ok(Self::empty());
        };
        if dim == 0 {
            return Err(Error::InvalidConfig("vector dimensionality must be positive".into()));
        }
        let mut flat = Vec::with_capacity(dim * vectors.len());
        let mut norms = Vec::with_capacity(vectors.len());
        for (i, v) in vectors.iter().enumerate() {
            if v.len() != dim {
                return Err(Error::InvalidCorpus(format!(
                    "vector {i} ({}) has {} dimensions, expected {dim}",
                    documents[i].id,
                    v.len()
                )));
            }
            norms.push(v.iter().map(|x| x * x).sum::<f32>().sqrt());
            flat.extend_from_slice(v);
        }
        let lowered = documents.iter().map(|d| d.text.to_lowercase()).collect();
        Ok(Self { documents, lowered, vectors: flat, norms, dim })
    }

    pub fn new(entries: Vec<(Document, Vec<f32>)>) -> Result<Self> {
        let (documents, vectors) = entries.into_iter().unzip();
        Self::from_parts(documents, vectors)
    }

    /// Build from source records, skipping records that have no vector yet.
    pub fn from_records(records: Vec<CorpusRecord>) -> Result<Self> {
        let total = records.len();
        let entries: Vec<(Document, Vec<f32>)> = records
            .into_iter()
            .filter_map(|r| match r.vector {
                Some(v) if !v.is_empty() => Some((r.document, v)),
                _ => None,
            })
            .collect();
        let skipped = total - entries.len();
        if skipped > 0 {
            warn!(skipped, total, "skipped documents without a vector");
        }
        Self::new(entries)
    }

    /// Fetch one partition from the storage collaborator. Source failures
    /// propagate unchanged; zero rows is an empty corpus.
    pub async fn load<S: CorpusSource>(source: &S, partition_id: &str) -> Result<Self> {
        let records = source.load(partition_id).await?;
        let corpus = Self::from_records(records)?;
        info!(partition = partition_id, documents = corpus.len(), dim = corpus.dim(), "corpus loaded");
        Ok(corpus)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Vector dimensionality; 0 for an empty corpus.
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document(&self, idx: usize) -> &Document {
        &self.documents[idx]
    }

    pub fn vector(&self, idx: usize) -> &[f32] {
        &self.vectors[idx * self.dim..(idx + 1) * self.dim]
    }

    pub fn norm(&self, idx: usize) -> f32 {
        self.norms[idx]
    }

    /// Lower-cased document text.
    pub fn lowered_text(&self, idx: usize) -> &str {
        &self.lowered[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str) -> Document {
        Document::new(id, format!("Text of {id}"), "g")
    }

    #[test]
    fn rejects_mismatched_cardinality() {
        let err = Corpus::from_parts(vec![doc("a"), doc("b")], vec![vec![1.0]]).unwrap_err();
        assert!(matches!(err, Error::InvalidCorpus(_)));
    }

    #[test]
    fn rejects_ragged_vectors() {
        let err = Corpus::new(vec![(doc("a"), vec![1.0, 0.0]), (doc("b"), vec![1.0])]).unwrap_err();
        assert!(matches!(err, Error::InvalidCorpus(_)));
    }

    #[test]
    fn rejects_zero_dimensionality() {
        let err = Corpus::from_parts(vec![doc("a")], vec![vec![]]).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn records_without_vectors_are_skipped() {
        let corpus = Corpus::from_records(vec![
            CorpusRecord::new(doc("a"), vec![3.0, 4.0]),
            CorpusRecord::without_vector(doc("b")),
            CorpusRecord::new(doc("c"), vec![]),
        ])
        .expect("corpus");
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.document(0).id, "a");
        assert_eq!(corpus.vector(0), &[3.0, 4.0]);
        assert!((corpus.norm(0) - 5.0).abs() < 1e-6);
        assert_eq!(corpus.lowered_text(0), "text of a");
    }

    #[test]
    fn no_records_is_an_empty_corpus() {
        let corpus = Corpus::from_records(vec![]).expect("corpus");
        assert!(corpus.is_empty());
        assert_eq!(corpus.dim(), 0);
    }
}
