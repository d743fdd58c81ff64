//! Neighbor expansion inside the selected group.

use std::cmp::Ordering;

use crate::group::GroupIndex;

/// Seeds plus every same-group passage whose ordering key is within `window`
/// of some seed's key, sorted by descending score and cut to `limit`.
///
/// Passages without an ordering key are never pulled in as neighbors, and
/// seeds without one contribute no window; they still stay in the result.
pub fn expand(
    seeds: &[usize],
    group: usize,
    groups: &GroupIndex,
    scores: &[f32],
    window: usize,
    limit: usize,
) -> Vec<usize> {
    let members = groups.keyed_members(group);
    let mut seed_keys: Vec<i64> = members
        .iter()
        .filter(|(_, idx)| seeds.contains(idx))
        .map(|&(key, _)| key)
        .collect();
    seed_keys.dedup();

    let window = window as u64;
    let mut picked: Vec<usize> = seeds.iter().copied().filter(|&i| groups.group_of(i) == group).collect();
    if !seed_keys.is_empty() {
        for &(key, idx) in members {
            // seed_keys is sorted, so only the nearest seed on each side matters.
            let at = seed_keys.partition_point(|&s| s < key);
            let near = [at.checked_sub(1), Some(at)]
                .into_iter()
                .flatten()
                .filter_map(|i| seed_keys.get(i))
                .any(|&s| s.abs_diff(key) <= window);
            if near {
                picked.push(idx);
            }
        }
    }

    picked.sort_unstable();
    picked.dedup();
    sort_by_score(&mut picked, scores);
    picked.truncate(limit);
    picked
}

/// Descending score, ties by corpus position.
pub(crate) fn sort_by_score(indices: &mut [usize], scores: &[f32]) {
    indices.sort_by(|&a, &b| match scores[b].total_cmp(&scores[a]) {
        Ordering::Equal => a.cmp(&b),
        other => other,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GroupingKey;
    use crate::corpus::Corpus;
    use recall_core::types::Document;

    /// Group "a" with keys 0..=9 at indices 0..=9, plus one group "b" doc.
    fn setup() -> (Corpus, GroupIndex) {
        let mut docs: Vec<Document> =
            (0..10).map(|i| Document::new(i.to_string(), "x", "a").with_order_key(i)).collect();
        docs.push(Document::new("b0", "x", "b").with_order_key(5));
        docs.push(Document::new("a-unkeyed", "x", "a"));
        let n = docs.len();
        let corpus = Corpus::from_parts(docs, vec![vec![1.0]; n]).expect("corpus");
        let groups = GroupIndex::build(&corpus, &GroupingKey::Source);
        (corpus, groups)
    }

    #[test]
    fn window_around_single_seed() {
        let (_, groups) = setup();
        // Score favors higher keys so the sort order is easy to read.
        #[allow(clippy::cast_precision_loss)]
        let scores: Vec<f32> = (0..12).map(|i| i as f32 / 10.0).collect();
        let g = groups.group_of(5);
        let out = expand(&[5], g, &groups, &scores, 3, 100);
        assert_eq!(out, vec![8, 7, 6, 5, 4, 3, 2]);

        let truncated = expand(&[5], g, &groups, &scores, 3, 4);
        assert_eq!(truncated, vec![8, 7, 6, 5]);
    }

    #[test]
    fn never_crosses_groups_and_skips_unkeyed_neighbors() {
        let (_, groups) = setup();
        let scores = vec![0.5; 12];
        let out = expand(&[5], groups.group_of(5), &groups, &scores, 0, 100);
        assert_eq!(out, vec![5], "doc b0 shares key 5 but is in another group");
    }

    #[test]
    fn unkeyed_seed_is_kept() {
        let (_, groups) = setup();
        let scores = vec![0.5; 12];
        let out = expand(&[11, 0], groups.group_of(0), &groups, &scores, 1, 100);
        assert_eq!(out, vec![0, 1, 11]);
    }

    #[test]
    fn overlapping_windows_do_not_duplicate() {
        let (_, groups) = setup();
        let scores = vec![0.5; 12];
        let out = expand(&[2, 3], groups.group_of(2), &groups, &scores, 1, 100);
        assert_eq!(out, vec![1, 2, 3, 4]);
    }
}
