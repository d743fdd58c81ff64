//! LanceDB storage for retrieval corpora.
//!
//! One `documents` table holds every partition. Ingestion writes rows through
//! [`CorpusWriter`]; [`LanceCorpusSource`] reads one partition's `ready` rows
//! back as [`recall_core::types::CorpusRecord`]s.

pub mod schema;
pub mod source;
pub mod table;
pub mod writer;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use recall_core::config::{expand_path, Config};

pub use source::LanceCorpusSource;
pub use writer::CorpusWriter;

pub const DEFAULT_DOCUMENTS_TABLE: &str = "documents";

/// `[data]` table of the layered config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub lancedb_dir: String,
    pub documents_table: String,
    /// Default input directory for `ingest`.
    pub raw_txt_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            lancedb_dir: "../dev_data/indexes/lancedb".to_string(),
            documents_table: DEFAULT_DOCUMENTS_TABLE.to_string(),
            raw_txt_dir: "../dev_data/txt".to_string(),
        }
    }
}

impl StorageConfig {
    pub fn from_config(config: &Config) -> recall_core::Result<Self> {
        config.get_or_default("data")
    }

    pub fn lancedb_path(&self) -> PathBuf {
        expand_path(&self.lancedb_dir)
    }

    pub fn raw_txt_path(&self) -> PathBuf {
        expand_path(&self.raw_txt_dir)
    }
}
