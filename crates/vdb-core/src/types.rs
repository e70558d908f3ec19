//! Domain types shared by the adapter, the fusion step and the stores.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type DocumentId = String;
pub type Metadata = Map<String, Value>;

/// A caller-owned record stored in a collection.
///
/// - `id`: caller-assigned identity, unique within a collection
/// - `vector`: dense embedding, fixed dimension per collection
/// - `content`: the text payload; also the source of the sparse vector in
///   hybrid collections
/// - `relative_path`/`start_line`/`end_line`/`file_extension`: where the
///   content came from
/// - `metadata`: open key/value map carried through untouched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorDocument {
    pub id: DocumentId,
    #[serde(default)]
    pub vector: Vec<f32>,
    pub content: String,
    #[serde(default)]
    pub relative_path: String,
    #[serde(default)]
    pub start_line: i64,
    #[serde(default)]
    pub end_line: i64,
    #[serde(default)]
    pub file_extension: String,
    #[serde(default)]
    pub metadata: Metadata,
}

/// A ranked hit.
///
/// `document.vector` is the query vector echoed back, not the stored one.
/// `score` is the backend similarity for dense search and the fused rank
/// score for hybrid search; the two are not comparable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub document: VectorDocument,
    pub score: f32,
}

/// Bag of hashed tokens. `indices` are unique bucket ids and `values[i]` is
/// the weight of `indices[i]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    pub indices: Vec<u32>,
    pub values: Vec<f32>,
}

impl SparseVector {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Dot product over shared indices.
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let mut score = 0.0;
        for (i, idx) in self.indices.iter().enumerate() {
            if let Some(j) = other.indices.iter().position(|o| o == idx) {
                score += self.values[i] * other.values[j];
            }
        }
        score
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    pub top_k: usize,
    pub threshold: Option<f32>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self { top_k: 10, threshold: None }
    }
}

/// What a single leg of a hybrid search queries with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryData {
    /// Dense query vector.
    Dense(Vec<f32>),
    /// Free text, turned into a sparse vector by the tokenizer.
    Text(String),
}

/// One leg of a hybrid search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridSearchRequest {
    pub data: QueryData,
    /// Field the request targets (`vector`, `sparse_vector`). Informational;
    /// the leg kind is decided by `data`.
    #[serde(default)]
    pub anns_field: String,
    #[serde(default)]
    pub limit: usize,
}

impl HybridSearchRequest {
    pub fn dense(vector: Vec<f32>, limit: usize) -> Self {
        Self { data: QueryData::Dense(vector), anns_field: "vector".to_string(), limit }
    }

    pub fn text(text: impl Into<String>, limit: usize) -> Self {
        Self { data: QueryData::Text(text.into()), anns_field: "sparse_vector".to_string(), limit }
    }
}

/// Rank fusion strategy for hybrid search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", content = "params", rename_all = "lowercase")]
pub enum Rerank {
    Rrf { k: f32 },
}

impl Default for Rerank {
    fn default() -> Self {
        Rerank::Rrf { k: 60.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HybridSearchOptions {
    pub limit: usize,
    /// `None` uses RRF with the configured `k`.
    pub rerank: Option<Rerank>,
}

impl Default for HybridSearchOptions {
    fn default() -> Self {
        Self { limit: 10, rerank: None }
    }
}

/// A raw record returned by `query`: the original id plus the selected
/// payload fields.
pub type Record = Map<String, Value>;
