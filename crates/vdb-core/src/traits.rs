use async_trait::async_trait;

use crate::error::Result;
use crate::types::{HybridSearchOptions, HybridSearchRequest, Record, SearchOptions, SearchResult, VectorDocument};

pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// The generic vector database surface callers program against.
///
/// Creation and dropping are idempotent: creating an existing collection and
/// dropping a missing one both succeed.
#[async_trait]
pub trait VectorDatabase: Send + Sync {
    async fn create_collection(&self, name: &str, dim: usize) -> Result<()>;
    /// Like `create_collection` plus a named sparse vector field.
    async fn create_hybrid_collection(&self, name: &str, dim: usize) -> Result<()>;
    async fn drop_collection(&self, name: &str) -> Result<()>;
    async fn has_collection(&self, name: &str) -> Result<bool>;
    async fn list_collections(&self) -> Result<Vec<String>>;

    /// Upsert by document id.
    async fn insert(&self, name: &str, documents: &[VectorDocument]) -> Result<()>;
    /// Upsert with a sparse vector synthesized from each document's content.
    async fn insert_hybrid(&self, name: &str, documents: &[VectorDocument]) -> Result<()>;

    async fn search(&self, name: &str, query_vector: &[f32], options: SearchOptions) -> Result<Vec<SearchResult>>;
    /// Dense + sparse search merged by rank fusion. A dense request is required.
    async fn hybrid_search(
        &self,
        name: &str,
        requests: &[HybridSearchRequest],
        options: HybridSearchOptions,
    ) -> Result<Vec<SearchResult>>;

    async fn delete(&self, name: &str, ids: &[String]) -> Result<()>;
    /// Scan up to `limit` records. `filter` is accepted but not applied.
    async fn query(&self, name: &str, filter: &str, output_fields: &[String], limit: usize) -> Result<Vec<Record>>;

    /// Whether another collection may be created.
    async fn check_collection_limit(&self) -> Result<bool>;
}
