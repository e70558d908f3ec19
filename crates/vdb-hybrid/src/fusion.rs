// Reciprocal Rank Fusion (RRF)

use std::collections::HashMap;
use std::hash::Hash;

/// Default smoothing constant, from Cormack, Clarke and Buettcher (SIGIR 2009).
pub const RRF_K: f32 = 60.0;

#[derive(Debug, Clone, PartialEq)]
pub struct FusedHit<K> {
    pub key: K,
    pub score: f32,
    /// 1-based rank of `key` in each input list, `None` where it is absent.
    pub ranks: Vec<Option<usize>>,
}

/// Merge ranked lists (best first) into one list of at most `limit` hits.
///
/// score(d) = sum over lists containing d of 1 / (k + rank(d))
///
/// Only ranks matter; the lists' own scores are ignored. A key repeated
/// within one list counts once, at its best rank. Equal scores keep
/// first-seen order: keys of the first list in its order, then new keys of
/// the second list, and so on.
pub fn reciprocal_rank_fusion<K: Clone + Eq + Hash>(lists: &[Vec<K>], k: f32, limit: usize) -> Vec<FusedHit<K>> {
    let mut slot: HashMap<K, usize> = HashMap::new();
    let mut hits: Vec<FusedHit<K>> = Vec::new();

    for (list_idx, list) in lists.iter().enumerate() {
        for (pos, key) in list.iter().enumerate() {
            let i = *slot.entry(key.clone()).or_insert_with(|| {
                hits.push(FusedHit { key: key.clone(), score: 0.0, ranks: vec![None; lists.len()] });
                hits.len() - 1
            });
            let hit = &mut hits[i];
            if hit.ranks[list_idx].is_some() {
                continue;
            }
            let rank = pos + 1;
            hit.ranks[list_idx] = Some(rank);
            hit.score += 1.0 / (k + rank as f32);
        }
    }

    // stable: ties keep insertion order
    hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    hits.truncate(limit);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score_of(fused: &[FusedHit<u32>], id: u32) -> f32 {
        fused.iter().find(|h| h.key == id).map(|h| h.score).unwrap_or(f32::NAN)
    }

    #[test]
    fn overlapping_results_rank_first() {
        let dense = vec![1, 2, 3];
        let sparse = vec![1, 3, 5];
        let fused = reciprocal_rank_fusion(&[dense, sparse], RRF_K, 10);
        assert_eq!(fused.len(), 4);
        assert_eq!(fused[0].key, 1);
        assert_eq!(fused[0].ranks, vec![Some(1), Some(1)]);
        assert_eq!(fused[1].key, 3);
    }

    #[test]
    fn swapped_ranks_score_equally() {
        let fused = reciprocal_rank_fusion(&[vec![1, 2, 3, 4], vec![4, 3, 2, 1]], RRF_K, 10);
        assert!((score_of(&fused, 1) - score_of(&fused, 4)).abs() < 1e-6);
        assert!((score_of(&fused, 2) - score_of(&fused, 3)).abs() < 1e-6);
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let fused = reciprocal_rank_fusion(&[vec![7, 8], vec![9, 10]], RRF_K, 10);
        let keys: Vec<u32> = fused.iter().map(|h| h.key).collect();
        assert_eq!(keys, vec![7, 9, 8, 10]);
    }

    #[test]
    fn duplicates_within_a_list_count_once() {
        let fused = reciprocal_rank_fusion(&[vec![1, 1, 2]], RRF_K, 10);
        assert!((score_of(&fused, 1) - 1.0 / 61.0).abs() < 1e-7);
        assert!((score_of(&fused, 2) - 1.0 / 63.0).abs() < 1e-7);
    }

    #[test]
    fn limit_truncates_and_empty_inputs_are_fine() {
        assert_eq!(reciprocal_rank_fusion(&[vec![1, 2, 3]], RRF_K, 2).len(), 2);
        assert!(reciprocal_rank_fusion::<u32>(&[vec![], vec![]], RRF_K, 5).is_empty());
        assert!(reciprocal_rank_fusion::<u32>(&[], RRF_K, 5).is_empty());
    }
}
