//! Source groups and selection of the single best-matching group.

use std::collections::HashMap;
use tracing::debug;

use crate::config::GroupingKey;
use crate::corpus::Corpus;
use crate::query::FocusTerm;

/// Group membership of every corpus document under one grouping key,
/// built once per engine.
#[derive(Debug, Clone)]
pub struct GroupIndex {
    labels: Vec<String>,
    of_doc: Vec<usize>,
    /// Per group: (ordering key, corpus index) of keyed members, sorted by key.
    keyed: Vec<Vec<(i64, usize)>>,
}

impl GroupIndex {
    pub fn build(corpus: &Corpus, key: &GroupingKey) -> Self {
        let mut labels: Vec<String> = Vec::new();
        let mut ordinals: HashMap<String, usize> = HashMap::new();
        let mut of_doc = Vec::with_capacity(corpus.len());
        let mut keyed: Vec<Vec<(i64, usize)>> = Vec::new();

        for (idx, doc) in corpus.documents().iter().enumerate() {
            let label = match key {
                GroupingKey::Source => doc.group_id.as_str(),
                GroupingKey::Metadata(name) => doc.metadata.get(name).map_or(doc.group_id.as_str(), String::as_str),
            };
            let g = *ordinals.entry(label.to_string()).or_insert_with(|| {
                labels.push(label.to_string());
                keyed.push(Vec::new());
                labels.len() - 1
            });
            of_doc.push(g);
            if let Some(order_key) = doc.order_key {
                keyed[g].push((order_key, idx));
            }
        }
        for members in &mut keyed {
            members.sort_unstable();
        }
        Self { labels, of_doc, keyed }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of corpus documents indexed.
    pub fn doc_count(&self) -> usize {
        self.of_doc.len()
    }

    pub fn group_of(&self, idx: usize) -> usize {
        self.of_doc[idx]
    }

    pub fn label(&self, group: usize) -> &str {
        &self.labels[group]
    }

    /// Members of `group` that carry an ordering key, ascending by key.
    pub fn keyed_members(&self, group: usize) -> &[(i64, usize)] {
        &self.keyed[group]
    }
}

/// Winner of group selection.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupChoice {
    pub group: usize,
    pub score: f32,
    /// Members of the group found in the oversampled slice, in rank order.
    pub seeds: Vec<usize>,
}

/// Pick the group maximizing `max_similarity + bonus_weight * focus_bonus`
/// over the oversampled slice, where the focus bonus is the most focus terms
/// any one of the group's slice members contains. Ties go to the group whose
/// best member ranks first. `None` when the slice is empty.
pub fn select_group(
    slice: &[usize],
    scores: &[f32],
    corpus: &Corpus,
    groups: &GroupIndex,
    terms: &[FocusTerm],
    bonus_weight: f32,
) -> Option<GroupChoice> {
    struct Tally {
        group: usize,
        max_sim: f32,
        bonus: usize,
    }

    let mut tallies: Vec<Tally> = Vec::new();
    let mut slot: HashMap<usize, usize> = HashMap::new();
    for &idx in slice {
        let group = groups.group_of(idx);
        let hits = if terms.is_empty() {
            0
        } else {
            let text = corpus.lowered_text(idx);
            terms.iter().filter(|t| t.matches(text)).count()
        };
        let at = *slot.entry(group).or_insert_with(|| {
            tallies.push(Tally { group, max_sim: f32::NEG_INFINITY, bonus: 0 });
            tallies.len() - 1
        });
        let tally = &mut tallies[at];
        tally.max_sim = tally.max_sim.max(scores[idx]);
        tally.bonus = tally.bonus.max(hits);
    }

    let mut best: Option<(usize, f32)> = None;
    for tally in &tallies {
        #[allow(clippy::cast_precision_loss)]
        let blended = tally.max_sim + bonus_weight * tally.bonus as f32;
        if best.map_or(true, |(_, s)| blended > s) {
            best = Some((tally.group, blended));
        }
    }
    let (group, score) = best?;
    let seeds: Vec<usize> = slice.iter().copied().filter(|&i| groups.group_of(i) == group).collect();
    debug!(group = groups.label(group), score, seeds = seeds.len(), candidates = tallies.len(), "selected group");
    Some(GroupChoice { group, score, seeds })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryAnalyzer;
    use recall_core::types::Document;

    fn corpus(docs: Vec<Document>) -> Corpus {
        let n = docs.len();
        Corpus::from_parts(docs, vec![vec![1.0]; n]).expect("corpus")
    }

    #[test]
    fn groups_by_source_or_metadata() {
        let c = corpus(vec![
            Document::new("0", "x", "a").with_meta("file", "f1").with_order_key(2),
            Document::new("1", "x", "b").with_meta("file", "f1").with_order_key(1),
            Document::new("2", "x", "a"),
        ]);
        let by_source = GroupIndex::build(&c, &GroupingKey::Source);
        assert_eq!(by_source.len(), 2);
        assert_eq!(by_source.group_of(0), by_source.group_of(2));
        assert_eq!(by_source.keyed_members(by_source.group_of(0)), &[(2, 0)]);

        let by_file = GroupIndex::build(&c, &GroupingKey::Metadata("file".into()));
        assert_eq!(by_file.group_of(0), by_file.group_of(1));
        assert_eq!(by_file.label(by_file.group_of(2)), "a", "missing metadata falls back to group_id");
        assert_eq!(by_file.keyed_members(by_file.group_of(0)), &[(1, 1), (2, 0)]);
    }

    #[test]
    fn highest_similarity_wins() {
        let c = corpus(vec![
            Document::new("0", "x", "a"),
            Document::new("1", "x", "b"),
            Document::new("2", "x", "b"),
        ]);
        let g = GroupIndex::build(&c, &GroupingKey::Source);
        let scores = [0.5, 0.9, 0.7];
        let choice = select_group(&[1, 2, 0], &scores, &c, &g, &[], 0.05).expect("choice");
        assert_eq!(g.label(choice.group), "b");
        assert_eq!(choice.seeds, vec![1, 2]);
    }

    #[test]
    fn focus_bonus_breaks_near_ties_only() {
        let c = corpus(vec![
            Document::new("0", "generic pump notes", "a"),
            Document::new("1", "the Grundfos Alpha circulator", "b"),
        ]);
        let g = GroupIndex::build(&c, &GroupingKey::Source);
        let terms = QueryAnalyzer::default().analyze("is the Grundfos Alpha quiet");

        let near_tie = [0.80, 0.78];
        let choice = select_group(&[0, 1], &near_tie, &c, &g, &terms, 0.05).expect("choice");
        assert_eq!(g.label(choice.group), "b");

        let clear = [0.90, 0.70];
        let choice = select_group(&[0, 1], &clear, &c, &g, &terms, 0.05).expect("choice");
        assert_eq!(g.label(choice.group), "a");
    }

    #[test]
    fn empty_slice_selects_nothing() {
        let c = corpus(vec![Document::new("0", "x", "a")]);
        let g = GroupIndex::build(&c, &GroupingKey::Source);
        assert!(select_group(&[], &[0.3], &c, &g, &[], 0.05).is_none());
    }
}
