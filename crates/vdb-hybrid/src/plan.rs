//! Turns hybrid search requests into the two legs to run against a store.

use tracing::debug;
use vdb_core::config::SearchSettings;
use vdb_core::{Error, HybridSearchOptions, HybridSearchRequest, QueryData, Rerank, Result, SparseVector};
use vdb_text::SparseTokenizer;

#[derive(Debug, Clone, PartialEq)]
pub struct HybridPlan<'a> {
    pub dense: &'a [f32],
    pub dense_depth: usize,
    /// `None` when no text request was given or the text has no tokens.
    pub sparse: Option<SparseVector>,
    pub sparse_depth: usize,
    pub k: f32,
    pub limit: usize,
}

/// Validate `requests` and work out what each leg queries and how deep.
///
/// The dense request is mandatory; a text-only search is rejected here,
/// before anything reaches the backend. Each leg fetches
/// `max(request.limit, limit * candidate_multiplier)` candidates so fusion
/// has more than `limit` to choose from.
pub fn plan_hybrid<'a>(
    requests: &'a [HybridSearchRequest],
    options: &HybridSearchOptions,
    settings: &SearchSettings,
    tokenizer: &SparseTokenizer,
) -> Result<HybridPlan<'a>> {
    let mut dense: Option<(&'a [f32], usize)> = None;
    let mut text: Option<(&'a str, usize)> = None;
    for req in requests {
        match &req.data {
            QueryData::Dense(v) if dense.is_none() => dense = Some((v.as_slice(), req.limit)),
            QueryData::Text(t) if text.is_none() => text = Some((t.as_str(), req.limit)),
            _ => debug!("ignoring extra hybrid request on field '{}'", req.anns_field),
        }
    }

    let (dense, dense_limit) = dense.ok_or_else(|| Error::invalid_argument("hybrid search requires a dense vector request"))?;
    if dense.is_empty() {
        return Err(Error::invalid_argument("dense query vector is empty"));
    }

    let k = match options.rerank {
        Some(Rerank::Rrf { k }) => k,
        None => settings.rrf_k,
    };
    if !(k > 0.0) || !k.is_finite() {
        return Err(Error::invalid_argument(format!("rrf k must be positive, got {k}")));
    }

    let base_depth = options.limit.saturating_mul(settings.candidate_multiplier.max(1));
    let (sparse, sparse_limit) = match text {
        Some((t, l)) => {
            let v = tokenizer.sparse_vector(t);
            if v.is_empty() { debug!("sparse query text has no tokens; running dense leg only"); (None, 0) } else { (Some(v), l) }
        }
        None => (None, 0),
    };

    Ok(HybridPlan {
        dense,
        dense_depth: dense_limit.max(base_depth),
        sparse_depth: if sparse.is_some() { sparse_limit.max(base_depth) } else { 0 },
        sparse,
        k,
        limit: options.limit,
    })
}
