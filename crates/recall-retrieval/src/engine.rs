//! RetrievalEngine: orchestrates the per-query pipeline.
//!
//! Gate → Score → Abstain? → SelectGroup → Expand → Fill → Return.
//!
//! The engine owns an immutable [`Corpus`] behind an `Arc` and holds no other
//! mutable state, so one instance can serve concurrent queries. Refreshing a
//! partition means building a new engine and swapping the reference.

use std::sync::Arc;
use tracing::{debug, info};

use recall_core::error::{Error, Result};
use recall_core::traits::{CorpusSource, Embedder};
use recall_core::types::Document;

use crate::abstain::should_abstain;
use crate::config::RetrievalConfig;
use crate::corpus::Corpus;
use crate::diversity::{fill, FillPolicy};
use crate::gate::lexical_candidates;
use crate::group::{select_group, GroupIndex};
use crate::neighbors::{expand, sort_by_score};
use crate::query::QueryAnalyzer;
use crate::similarity::{CosineScorer, SimilarityScorer};

/// Which phase admitted a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// The selected group's seeds and their ordering-key neighbors.
    Neighborhood,
    /// One-per-group backfill.
    Diversity,
    /// Plain score backfill.
    ScoreFill,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedHit {
    pub document: Document,
    pub score: f32,
    pub stage: Stage,
}

pub struct RetrievalEngine<E, S = CosineScorer> {
    corpus: Arc<Corpus>,
    groups: GroupIndex,
    embedder: E,
    scorer: S,
    analyzer: QueryAnalyzer,
    config: RetrievalConfig,
}

impl<E: Embedder> RetrievalEngine<E> {
    /// Validates the configuration and, for a non-empty corpus, that the
    /// embedder produces vectors of the corpus dimensionality.
    pub fn new(corpus: Arc<Corpus>, embedder: E, config: RetrievalConfig) -> Result<Self> {
        Self::with_scorer(corpus, embedder, CosineScorer, config)
    }

    /// Load one partition from `source` and build an engine over it.
    pub async fn from_source<Src: CorpusSource>(
        source: &Src,
        partition_id: &str,
        embedder: E,
        config: RetrievalConfig,
    ) -> Result<Self> {
        config.validate()?;
        let corpus = Corpus::load(source, partition_id).await?;
        Self::new(Arc::new(corpus), embedder, config)
    }
}

impl<E: Embedder, S: SimilarityScorer> RetrievalEngine<E, S> {
    pub fn with_scorer(corpus: Arc<Corpus>, embedder: E, scorer: S, config: RetrievalConfig) -> Result<Self> {
        config.validate()?;
        if !corpus.is_empty() && embedder.dim() != corpus.dim() {
            return Err(Error::DimensionMismatch { expected: corpus.dim(), actual: embedder.dim() });
        }
        let groups = GroupIndex::build(&corpus, &config.grouping_key);
        let analyzer = QueryAnalyzer::new(config.min_token_len);
        debug!(documents = corpus.len(), groups = groups.len(), "retrieval engine ready");
        Ok(Self { corpus, groups, embedder, scorer, analyzer, config })
    }

    pub fn corpus(&self) -> &Arc<Corpus> {
        &self.corpus
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Up to `k` documents for `query`, best context first. An empty list
    /// means nothing relevant was found (or the engine abstained).
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Document>> {
        let hits = self.retrieve_ranked(query, k).await?;
        Ok(hits.into_iter().map(|h| h.document).collect())
    }

    /// Like [`Self::retrieve`] with the configured default `k`.
    pub async fn retrieve_default(&self, query: &str) -> Result<Vec<Document>> {
        self.retrieve(query, self.config.k).await
    }

    pub async fn retrieve_ranked(&self, query: &str, k: usize) -> Result<Vec<RankedHit>> {
        if k == 0 || self.corpus.is_empty() {
            return Ok(Vec::new());
        }
        let vector = self.embedder.embed_query(query).await?;
        self.retrieve_with_vector(query, &vector, k)
    }

    /// The whole pipeline with a precomputed query vector. CPU-bound, no I/O.
    pub fn retrieve_with_vector(&self, query: &str, vector: &[f32], k: usize) -> Result<Vec<RankedHit>> {
        let corpus = self.corpus.as_ref();
        if k == 0 || corpus.is_empty() {
            return Ok(Vec::new());
        }
        if vector.len() != corpus.dim() {
            return Err(Error::DimensionMismatch { expected: corpus.dim(), actual: vector.len() });
        }

        let terms = self.analyzer.analyze(query);
        let candidates = lexical_candidates(corpus, &terms, self.config.lexical_prefilter);

        // Abstention and neighbor expansion need scores outside the gated
        // subset, so the whole corpus is scored.
        let all: Vec<usize> = (0..corpus.len()).collect();
        let scores = self.scorer.score(vector, corpus, &all);

        if let Some(q) = self.config.abstention_quantile {
            if should_abstain(&scores, q, self.config.abstention_delta) {
                info!(quantile = q, delta = self.config.abstention_delta, "abstained: no score clears the bar");
                return Ok(Vec::new());
            }
        }

        let mut ranking = candidates;
        sort_by_score(&mut ranking, &scores);
        let slice_len = self.config.oversample_len(k).min(ranking.len());
        let slice = &ranking[..slice_len];

        let Some(choice) = select_group(
            slice,
            &scores,
            corpus,
            &self.groups,
            &terms,
            self.config.focus_bonus_weight,
        ) else {
            return Ok(Vec::new());
        };

        let limit = self.config.per_group_cap.map_or(k, |cap| cap.min(k));
        let neighborhood = expand(
            &choice.seeds,
            choice.group,
            &self.groups,
            &scores,
            self.config.neighbor_window,
            limit,
        );

        let backfill = fill(
            &neighborhood,
            &ranking,
            &self.groups,
            k,
            FillPolicy {
                per_group_cap: self.config.per_group_cap,
                diversity_first_fraction: self.config.diversity_first_fraction,
            },
        );

        debug!(
            terms = terms.len(),
            candidates = ranking.len(),
            neighborhood = neighborhood.len(),
            diversity = backfill.diversity.len(),
            score_fill = backfill.score_fill.len(),
            "pipeline stages complete"
        );

        let hit = |idx: usize, stage: Stage| RankedHit {
            document: corpus.document(idx).clone(),
            score: scores[idx],
            stage,
        };
        let hits: Vec<RankedHit> = neighborhood
            .iter()
            .map(|&i| hit(i, Stage::Neighborhood))
            .chain(backfill.diversity.iter().map(|&i| hit(i, Stage::Diversity)))
            .chain(backfill.score_fill.iter().map(|&i| hit(i, Stage::ScoreFill)))
            .collect();

        info!(k, returned = hits.len(), group = self.groups.label(choice.group), "retrieval complete");
        Ok(hits)
    }
}
