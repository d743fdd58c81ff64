//! recall-retrieval
//!
//! Selects an ordered, bounded set of passages for a query from a fixed,
//! pre-embedded corpus. No index is built: every query is an O(N·D) cosine
//! scan, layered with lexical gating, quantile abstention, source-grouped
//! neighbor expansion and diversity backfill. See [`engine::RetrievalEngine`].

pub mod abstain;
pub mod config;
pub mod corpus;
pub mod diversity;
pub mod engine;
pub mod gate;
pub mod group;
pub mod neighbors;
pub mod query;
pub mod similarity;

pub use config::{GroupingKey, RetrievalConfig};
pub use corpus::Corpus;
pub use engine::{RankedHit, RetrievalEngine, Stage};
pub use query::{FocusTerm, QueryAnalyzer};
pub use similarity::{CosineScorer, SimilarityScorer};
