use vdb_core::config::SearchSettings;
use vdb_core::{Error, HybridSearchOptions, HybridSearchRequest, Rerank};
use vdb_hybrid::{plan_hybrid, reciprocal_rank_fusion, RRF_K};
use vdb_text::SparseTokenizer;

fn score(fused: &[vdb_hybrid::FusedHit<&str>], key: &str) -> f32 {
    fused.iter().find(|h| h.key == key).map(|h| h.score).expect("key present")
}

#[test]
fn dense_only_top_hit_scores_one_over_k_plus_one() {
    for k in [1.0f32, 10.0, 60.0, 500.0] {
        let fused = reciprocal_rank_fusion(&[vec!["a", "b"], vec![]], k, 10);
        assert!((score(&fused, "a") - 1.0 / (k + 1.0)).abs() < 1e-7);
    }
}

#[test]
fn top_of_both_lists_beats_top_of_one() {
    for k in [0.5f32, 1.0, 60.0, 1000.0] {
        let fused = reciprocal_rank_fusion(&[vec!["both", "dense_only"], vec!["both"]], k, 10);
        assert!((score(&fused, "both") - 2.0 / (k + 1.0)).abs() < 1e-6);
        assert!((score(&fused, "dense_only") - 1.0 / (k + 2.0)).abs() < 1e-7);
        assert_eq!(fused[0].key, "both");

        // and when the single-list item is itself rank 1
        let fused = reciprocal_rank_fusion(&[vec!["dense_only"], vec!["both"], vec!["both"]], k, 10);
        assert!(score(&fused, "both") > score(&fused, "dense_only"));
    }
}

#[test]
fn sparse_only_item_scores_below_dense_item_at_same_rank_that_is_also_sparse() {
    let k = RRF_K;
    // "d" is rank 2 in dense and also present in sparse (rank 3); "s" is rank 2 in sparse only
    let dense = vec!["x", "d"];
    let sparse = vec!["y", "s", "d"];
    let fused = reciprocal_rank_fusion(&[dense, sparse], k, 10);
    assert!((score(&fused, "s") - 1.0 / (k + 2.0)).abs() < 1e-7);
    assert!(score(&fused, "s") < score(&fused, "d"));
}

#[test]
fn dense_only_results_follow_reciprocal_rank() {
    let dense: Vec<String> = (0..10).map(|i| format!("doc{i}")).collect();
    let fused = reciprocal_rank_fusion(&[dense, vec![]], 60.0, 5);
    assert_eq!(fused.len(), 5);
    for (i, hit) in fused.iter().enumerate() {
        assert_eq!(hit.key, format!("doc{i}"));
        assert!((hit.score - 1.0 / (60.0 + (i + 1) as f32)).abs() < 1e-7);
    }
    assert!(fused.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn fusion_is_commutative_across_lists() {
    let a = vec!["p", "q", "r"];
    let b = vec!["r", "s"];
    let ab = reciprocal_rank_fusion(&[a.clone(), b.clone()], 60.0, 10);
    let ba = reciprocal_rank_fusion(&[b, a], 60.0, 10);
    for key in ["p", "q", "r", "s"] {
        assert!((score(&ab, key) - score(&ba, key)).abs() < 1e-7);
    }
}

#[test]
fn plan_rejects_text_only_requests() {
    let requests = vec![HybridSearchRequest::text("where is the config loader", 10)];
    let err = plan_hybrid(&requests, &HybridSearchOptions::default(), &SearchSettings::default(), &SparseTokenizer::default())
        .expect_err("dense is required");
    assert!(matches!(err, Error::InvalidArgument(ref m) if m.contains("dense")));
}

#[test]
fn plan_uses_candidate_multiplier_and_request_limits() {
    let requests = vec![HybridSearchRequest::dense(vec![0.1, 0.2], 3), HybridSearchRequest::text("load config", 50)];
    let options = HybridSearchOptions { limit: 5, rerank: Some(Rerank::Rrf { k: 20.0 }) };
    let plan = plan_hybrid(&requests, &options, &SearchSettings::default(), &SparseTokenizer::default()).unwrap();
    assert_eq!(plan.dense_depth, 10);
    assert_eq!(plan.sparse_depth, 50);
    assert_eq!(plan.k, 20.0);
    assert_eq!(plan.sparse.as_ref().map(|s| s.len()), Some(2));
}

#[test]
fn plan_defaults_k_and_drops_tokenless_text() {
    let requests = vec![HybridSearchRequest::dense(vec![1.0], 0), HybridSearchRequest::text("?!", 10)];
    let settings = SearchSettings { rrf_k: 42.0, ..SearchSettings::default() };
    let plan = plan_hybrid(&requests, &HybridSearchOptions { limit: 4, rerank: None }, &settings, &SparseTokenizer::default()).unwrap();
    assert_eq!(plan.k, 42.0);
    assert!(plan.sparse.is_none());
    assert_eq!(plan.sparse_depth, 0);
}

#[test]
fn plan_rejects_bad_k_and_empty_vectors() {
    let tok = SparseTokenizer::default();
    let settings = SearchSettings::default();
    let requests = vec![HybridSearchRequest::dense(vec![1.0], 10)];
    let bad_k = HybridSearchOptions { limit: 5, rerank: Some(Rerank::Rrf { k: 0.0 }) };
    assert!(plan_hybrid(&requests, &bad_k, &settings, &tok).is_err());

    let empty = vec![HybridSearchRequest::dense(vec![], 10)];
    assert!(plan_hybrid(&empty, &HybridSearchOptions::default(), &settings, &tok).is_err());
}
