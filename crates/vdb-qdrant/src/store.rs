//! The seam between the adapter and a concrete point store.
//!
//! The adapter only speaks in [`StoredPoint`]s and [`StoreHit`]s; the Qdrant
//! client types stay inside `qdrant.rs`. [`crate::memory::MemoryStore`]
//! implements the same contract in-process.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use vdb_core::{PointKey, SparseVector};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("collection '{0}' already exists")]
    AlreadyExists(String),

    #[error("collection '{0}' not found")]
    NotFound(String),

    #[error(transparent)]
    Qdrant(#[from] qdrant_client::QdrantError),

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSpec {
    pub name: String,
    pub dim: usize,
    /// Adds the named sparse vector field.
    pub hybrid: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredPoint {
    pub key: PointKey,
    pub dense: Vec<f32>,
    pub sparse: Option<SparseVector>,
    pub payload: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VectorQuery {
    Dense(Vec<f32>),
    Sparse(SparseVector),
}

impl VectorQuery {
    pub fn kind(&self) -> &'static str {
        match self {
            VectorQuery::Dense(_) => "dense",
            VectorQuery::Sparse(_) => "sparse",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreHit {
    pub key: PointKey,
    pub score: f32,
    pub payload: Map<String, Value>,
}

#[async_trait]
pub trait PointStore: Send + Sync {
    /// Where the store lives, for error messages.
    fn endpoint(&self) -> String;

    async fn health_check(&self) -> Result<(), StoreError>;
    async fn list_collections(&self) -> Result<Vec<String>, StoreError>;
    async fn collection_exists(&self, name: &str) -> Result<bool, StoreError>;
    async fn create_collection(&self, spec: &CollectionSpec) -> Result<(), StoreError>;
    async fn delete_collection(&self, name: &str) -> Result<(), StoreError>;

    /// Insert or overwrite by key. All points land or none do.
    async fn upsert(&self, collection: &str, points: Vec<StoredPoint>) -> Result<(), StoreError>;

    /// Nearest points, best first. Hits scoring below `threshold` are dropped.
    async fn query(&self, collection: &str, query: VectorQuery, limit: usize, threshold: Option<f32>)
        -> Result<Vec<StoreHit>, StoreError>;

    async fn delete_points(&self, collection: &str, keys: Vec<PointKey>) -> Result<(), StoreError>;

    /// Up to `limit` points with payload, in store order. `score` is 0.
    async fn scroll(&self, collection: &str, limit: usize) -> Result<Vec<StoreHit>, StoreError>;
}
