//! Backfill after the neighborhood: spread across groups first, then by score.

use crate::group::GroupIndex;

#[derive(Debug, Clone, Copy, Default)]
pub struct FillPolicy {
    pub per_group_cap: Option<usize>,
    pub diversity_first_fraction: Option<f32>,
}

/// Picks added by each phase, in admission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fill {
    pub diversity: Vec<usize>,
    pub score_fill: Vec<usize>,
}

/// Top `selected` up to `k` by walking `ranking` (best first).
///
/// The diversity phase admits up to `floor(k * fraction)` passages whose group
/// has nothing in the result yet. The score phase then admits anything not yet
/// chosen. Both phases respect `per_group_cap`.
pub fn fill(selected: &[usize], ranking: &[usize], groups: &GroupIndex, k: usize, policy: FillPolicy) -> Fill {
    let mut out = Fill::default();
    if selected.len() >= k {
        return out;
    }
    let mut chosen = vec![false; groups.doc_count()];
    let mut per_group = vec![0usize; groups.len()];
    for &idx in selected {
        chosen[idx] = true;
        per_group[groups.group_of(idx)] += 1;
    }
    let under_cap = |count: usize| policy.per_group_cap.map_or(true, |cap| count < cap);
    let mut total = selected.len();

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let quota = policy.diversity_first_fraction.map_or(0, |f| (k as f32 * f.clamp(0.0, 1.0)).floor() as usize);
    if quota > 0 {
        for &idx in ranking {
            if out.diversity.len() >= quota || total >= k {
                break;
            }
            let g = groups.group_of(idx);
            if chosen[idx] || per_group[g] > 0 || !under_cap(per_group[g]) {
                continue;
            }
            chosen[idx] = true;
            per_group[g] += 1;
            total += 1;
            out.diversity.push(idx);
        }
    }

    for &idx in ranking {
        if total >= k {
            break;
        }
        let g = groups.group_of(idx);
        if chosen[idx] || !under_cap(per_group[g]) {
            continue;
        }
        chosen[idx] = true;
        per_group[g] += 1;
        total += 1;
        out.score_fill.push(idx);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GroupingKey;
    use crate::corpus::Corpus;
    use recall_core::types::Document;

    /// Indices 0..=5 in group "a", 6..=7 in "b", 8..=9 in "c".
    fn groups() -> GroupIndex {
        let docs: Vec<Document> = (0..10)
            .map(|i| {
                let g = match i {
                    0..=5 => "a",
                    6..=7 => "b",
                    _ => "c",
                };
                Document::new(i.to_string(), "x", g)
            })
            .collect();
        let corpus = Corpus::from_parts(docs, vec![vec![1.0]; 10]).expect("corpus");
        GroupIndex::build(&corpus, &GroupingKey::Source)
    }

    fn ranking() -> Vec<usize> {
        (0..10).collect()
    }

    #[test]
    fn full_selection_needs_no_fill() {
        let out = fill(&[0, 1], &ranking(), &groups(), 2, FillPolicy::default());
        assert_eq!(out, Fill::default());
    }

    #[test]
    fn plain_score_fill_follows_ranking() {
        let out = fill(&[0], &ranking(), &groups(), 4, FillPolicy::default());
        assert!(out.diversity.is_empty());
        assert_eq!(out.score_fill, vec![1, 2, 3]);
    }

    #[test]
    fn cap_pushes_fill_into_other_groups() {
        let policy = FillPolicy { per_group_cap: Some(1), ..Default::default() };
        let out = fill(&[0], &ranking(), &groups(), 5, policy);
        assert_eq!(out.score_fill, vec![6, 8], "one per group and the ranking runs out of groups");
    }

    #[test]
    fn diversity_phase_takes_new_groups_first() {
        let policy = FillPolicy { diversity_first_fraction: Some(0.5), ..Default::default() };
        let out = fill(&[0], &ranking(), &groups(), 5, policy);
        assert_eq!(out.diversity, vec![6, 8]);
        assert_eq!(out.score_fill, vec![1, 2]);
    }

    #[test]
    fn diversity_quota_is_floored() {
        let policy = FillPolicy { diversity_first_fraction: Some(0.3), ..Default::default() };
        let out = fill(&[0], &ranking(), &groups(), 3, policy);
        assert!(out.diversity.is_empty(), "floor(3 * 0.3) = 0");
        assert_eq!(out.score_fill, vec![1, 2]);
    }
}
