//! Domain types shared by the corpus sources, embedders and the retrieval engine.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type DocumentId = String;
pub type Meta = HashMap<String, String>;

/// A passage of a source document, as served back to the caller.
///
/// - `id`: unique within a partition
/// - `text`: the passage payload
/// - `group_id`: the source unit the passage came from (file, page set, ...)
/// - `order_key`: position within the group, when the source has a linear order
/// - `metadata`: opaque key/value pairs carried through untouched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub text: String,
    pub group_id: String,
    #[serde(default)]
    pub order_key: Option<i64>,
    #[serde(default)]
    pub metadata: Meta,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>, group_id: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), group_id: group_id.into(), order_key: None, metadata: Meta::new() }
    }

    pub fn with_order_key(mut self, key: i64) -> Self {
        self.order_key = Some(key);
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// One row handed over by a [`crate::traits::CorpusSource`]: a document plus
/// its precomputed vector, if the storage has one yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusRecord {
    pub document: Document,
    pub vector: Option<Vec<f32>>,
}

impl CorpusRecord {
    pub fn new(document: Document, vector: Vec<f32>) -> Self {
        Self { document, vector: Some(vector) }
    }

    pub fn without_vector(document: Document) -> Self {
        Self { document, vector: None }
    }

    /// Parse a vector stored as JSON text (`"[0.1, 0.2, ...]"`), as some
    /// databases return vector columns.
    pub fn vector_from_json(text: &str) -> anyhow::Result<Vec<f32>> {
        let values: Vec<f64> = serde_json::from_str(text.trim())
            .map_err(|e| anyhow::anyhow!("vector is not a JSON number array: {e}"))?;
        #[allow(clippy::cast_possible_truncation)]
        Ok(values.into_iter().map(|v| v as f32).collect())
    }
}
