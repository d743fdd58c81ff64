//! Lexical pre-filter: narrow candidates to passages containing a focus term.

use tracing::debug;

use crate::corpus::Corpus;
use crate::query::FocusTerm;

/// Corpus indices eligible for selection.
///
/// A passage passes when it matches at least one focus term (see
/// [`FocusTerm::matches`]).
/// Disabled gating, no terms, or no passing passage all yield the full
/// corpus: gating alone never empties a result.
pub fn lexical_candidates(corpus: &Corpus, terms: &[FocusTerm], enabled: bool) -> Vec<usize> {
    let all = || (0..corpus.len()).collect::<Vec<_>>();
    if !enabled || terms.is_empty() {
        return all();
    }
    let gated: Vec<usize> = (0..corpus.len())
        .filter(|&i| {
            let text = corpus.lowered_text(i);
            terms.iter().any(|t| t.matches(text))
        })
        .collect();
    if gated.is_empty() {
        debug!(terms = terms.len(), "lexical gate matched nothing, using full corpus");
        return all();
    }
    debug!(kept = gated.len(), of = corpus.len(), "lexical gate applied");
    gated
}
