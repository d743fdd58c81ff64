//! Cosine similarity over the corpus.
//!
//! The default scorer is a linear scan, O(N·D) per query. An approximate
//! index can replace it behind [`SimilarityScorer`] without touching the
//! other stages.

use crate::corpus::Corpus;

/// Denominator used when either norm is exactly zero.
pub const NORM_EPSILON: f32 = 1e-12;

pub trait SimilarityScorer: Send + Sync {
    /// Scores aligned with `candidates`, each within [-1, 1].
    fn score(&self, query: &[f32], corpus: &Corpus, candidates: &[usize]) -> Vec<f32>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CosineScorer;

impl SimilarityScorer for CosineScorer {
    fn score(&self, query: &[f32], corpus: &Corpus, candidates: &[usize]) -> Vec<f32> {
        let q_norm = l2_norm(query);
        candidates
            .iter()
            .map(|&i| cosine_with_norms(query, corpus.vector(i), q_norm, corpus.norm(i)))
            .collect()
    }
}

pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    cosine_with_norms(a, b, l2_norm(a), l2_norm(b))
}

fn cosine_with_norms(a: &[f32], b: &[f32], a_norm: f32, b_norm: f32) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let mut denom = a_norm * b_norm;
    if denom == 0.0 {
        denom = NORM_EPSILON;
    }
    (dot / denom).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use recall_core::types::Document;

    #[test]
    fn known_values() {
        assert!((cosine(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine(&[1.0, 0.0], &[0.0, 3.0]).abs() < 1e-6);
        assert!((cosine(&[1.0, 1.0], &[-2.0, -2.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_vectors_score_zero_instead_of_failing() {
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn scorer_output_is_aligned_with_candidates() {
        let corpus = Corpus::new(vec![
            (Document::new("a", "a", "g"), vec![1.0, 0.0]),
            (Document::new("b", "b", "g"), vec![0.0, 1.0]),
            (Document::new("c", "c", "g"), vec![1.0, 1.0]),
        ])
        .expect("corpus");
        let scores = CosineScorer.score(&[0.0, 2.0], &corpus, &[2, 1]);
        assert_eq!(scores.len(), 2);
        assert!((scores[0] - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
        assert!((scores[1] - 1.0).abs() < 1e-6);
        assert!(CosineScorer.score(&[0.0, 2.0], &corpus, &[]).is_empty());
    }
}
