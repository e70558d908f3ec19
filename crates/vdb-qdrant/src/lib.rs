//! Qdrant-backed [`vdb_core::VectorDatabase`].
//!
//! [`QdrantVectorDatabase`] talks to a [`PointStore`]: [`QdrantStore`] for a
//! real server, [`MemoryStore`] for tests and offline runs.

pub mod adapter;
pub mod classify;
pub mod memory;
pub mod payload;
pub mod qdrant;
pub mod store;

pub use adapter::{InitState, QdrantVectorDatabase};
pub use classify::{classify, ErrorClass};
pub use memory::{CallCounts, MemoryStore};
pub use qdrant::QdrantStore;
pub use store::{CollectionSpec, PointStore, StoreError, StoreHit, StoredPoint, VectorQuery};
