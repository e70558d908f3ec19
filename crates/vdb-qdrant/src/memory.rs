//! In-process [`PointStore`] with the same observable behaviour as the
//! Qdrant store: cosine dense scoring, dot-product sparse scoring, upsert by
//! key, and "already exists" / "not found" failures on collection calls.
//! Every call is counted so callers can assert what reached the store.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use vdb_core::PointKey;

use crate::store::{CollectionSpec, PointStore, StoreError, StoreHit, StoredPoint, VectorQuery};

#[derive(Debug)]
struct MemCollection {
    dim: usize,
    hybrid: bool,
    points: BTreeMap<PointKey, StoredPoint>,
}

/// Per-operation call counters.
#[derive(Debug, Default)]
pub struct CallCounts {
    pub health_check: AtomicUsize,
    pub create_collection: AtomicUsize,
    pub delete_collection: AtomicUsize,
    pub upsert: AtomicUsize,
    pub query: AtomicUsize,
    pub delete_points: AtomicUsize,
    pub scroll: AtomicUsize,
}

impl CallCounts {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, MemCollection>>,
    calls: CallCounts,
    offline: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose health check always fails.
    pub fn unreachable() -> Self {
        Self { offline: true, ..Self::default() }
    }

    pub fn calls(&self) -> &CallCounts {
        &self.calls
    }

    pub async fn point_count(&self, collection: &str) -> Option<usize> {
        self.collections.read().await.get(collection).map(|c| c.points.len())
    }

    pub async fn point(&self, collection: &str, key: &PointKey) -> Option<StoredPoint> {
        self.collections.read().await.get(collection).and_then(|c| c.points.get(key).cloned())
    }
}

fn bump(counter: &AtomicUsize) {
    counter.fetch_add(1, Ordering::SeqCst);
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 { 0.0 } else { dot / (na * nb) }
}

#[async_trait]
impl PointStore for MemoryStore {
    fn endpoint(&self) -> String {
        "memory://".to_string()
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        bump(&self.calls.health_check);
        if self.offline { Err(StoreError::Other("connection refused".to_string())) } else { Ok(()) }
    }

    async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        let mut names: Vec<String> = self.collections.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn collection_exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.collections.read().await.contains_key(name))
    }

    async fn create_collection(&self, spec: &CollectionSpec) -> Result<(), StoreError> {
        bump(&self.calls.create_collection);
        let mut collections = self.collections.write().await;
        if collections.contains_key(&spec.name) {
            return Err(StoreError::Other(format!("Wrong input: Collection `{}` already exists!", spec.name)));
        }
        collections.insert(spec.name.clone(), MemCollection { dim: spec.dim, hybrid: spec.hybrid, points: BTreeMap::new() });
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<(), StoreError> {
        bump(&self.calls.delete_collection);
        match self.collections.write().await.remove(name) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(name.to_string())),
        }
    }

    async fn upsert(&self, collection: &str, points: Vec<StoredPoint>) -> Result<(), StoreError> {
        bump(&self.calls.upsert);
        let mut collections = self.collections.write().await;
        let c = collections.get_mut(collection).ok_or_else(|| StoreError::NotFound(collection.to_string()))?;
        // validate the whole batch before touching anything
        for p in &points {
            if p.dense.len() != c.dim {
                return Err(StoreError::Other(format!(
                    "Wrong input: Vector dimension error: expected dim: {}, got {}",
                    c.dim,
                    p.dense.len()
                )));
            }
            if p.sparse.is_some() && !c.hybrid {
                return Err(StoreError::Other(format!("Wrong input: collection `{}` has no sparse vector field", collection)));
            }
        }
        for p in points {
            c.points.insert(p.key.clone(), p);
        }
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        query: VectorQuery,
        limit: usize,
        threshold: Option<f32>,
    ) -> Result<Vec<StoreHit>, StoreError> {
        bump(&self.calls.query);
        let collections = self.collections.read().await;
        let c = collections.get(collection).ok_or_else(|| StoreError::NotFound(collection.to_string()))?;
        let mut hits: Vec<StoreHit> = match &query {
            VectorQuery::Dense(v) => {
                if v.len() != c.dim {
                    return Err(StoreError::Other(format!(
                        "Wrong input: Vector dimension error: expected dim: {}, got {}",
                        c.dim,
                        v.len()
                    )));
                }
                c.points
                    .values()
                    .map(|p| StoreHit { key: p.key.clone(), score: cosine(v, &p.dense), payload: p.payload.clone() })
                    .collect()
            }
            VectorQuery::Sparse(q) => {
                if !c.hybrid {
                    return Err(StoreError::Other(format!("Wrong input: collection `{}` has no sparse vector field", collection)));
                }
                c.points
                    .values()
                    .filter_map(|p| {
                        let score = p.sparse.as_ref()?.dot(q);
                        (score > 0.0).then(|| StoreHit { key: p.key.clone(), score, payload: p.payload.clone() })
                    })
                    .collect()
            }
        };
        if let Some(t) = threshold {
            hits.retain(|h| h.score >= t);
        }
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn delete_points(&self, collection: &str, keys: Vec<PointKey>) -> Result<(), StoreError> {
        bump(&self.calls.delete_points);
        let mut collections = self.collections.write().await;
        let c = collections.get_mut(collection).ok_or_else(|| StoreError::NotFound(collection.to_string()))?;
        for key in &keys {
            c.points.remove(key);
        }
        Ok(())
    }

    async fn scroll(&self, collection: &str, limit: usize) -> Result<Vec<StoreHit>, StoreError> {
        bump(&self.calls.scroll);
        let collections = self.collections.read().await;
        let c = collections.get(collection).ok_or_else(|| StoreError::NotFound(collection.to_string()))?;
        Ok(c.points
            .values()
            .take(limit)
            .map(|p| StoreHit { key: p.key.clone(), score: 0.0, payload: p.payload.clone() })
            .collect())
    }
}
