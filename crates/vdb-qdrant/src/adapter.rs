//! [`VectorDatabase`] over a [`PointStore`].
//!
//! The adapter owns id mapping, payload layout, sparse vector synthesis and
//! rank fusion; the store only moves points. The backend is probed once,
//! lazily, on the first call that needs it.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use vdb_core::config::{SearchSettings, Settings};
use vdb_core::{
    to_point_key, Error, HybridSearchOptions, HybridSearchRequest, PointKey, Record, Result, SearchOptions,
    SearchResult, VectorDatabase, VectorDocument,
};
use vdb_hybrid::{plan_hybrid, reciprocal_rank_fusion};
use vdb_text::SparseTokenizer;

use crate::classify::{classify, ErrorClass};
use crate::payload::{to_document, to_payload, to_record};
use crate::qdrant::QdrantStore;
use crate::store::{CollectionSpec, PointStore, StoreHit, StoredPoint, VectorQuery};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitState {
    Uninitialized,
    Ready,
}

pub struct QdrantVectorDatabase<S: PointStore = QdrantStore> {
    store: S,
    settings: SearchSettings,
    tokenizer: SparseTokenizer,
    ready: OnceCell<()>,
}

impl QdrantVectorDatabase<QdrantStore> {
    /// Build against the configured Qdrant server. Performs no I/O.
    pub fn connect(settings: &Settings) -> Result<Self> {
        let store = QdrantStore::connect(&settings.qdrant, &settings.search).map_err(|e| Error::Connection {
            url: settings.qdrant.url.clone(),
            source: e.into(),
        })?;
        Ok(Self::with_store(store, settings.search.clone()))
    }
}

impl<S: PointStore> QdrantVectorDatabase<S> {
    pub fn with_store(store: S, settings: SearchSettings) -> Self {
        let tokenizer = SparseTokenizer::new(settings.sparse_buckets);
        Self { store, settings, tokenizer, ready: OnceCell::new() }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    pub fn state(&self) -> InitState {
        if self.ready.initialized() { InitState::Ready } else { InitState::Uninitialized }
    }

    /// Probe the backend once. A failed probe is not cached, so the next
    /// call probes again; concurrent first calls wait on a single probe.
    pub async fn ensure_ready(&self) -> Result<()> {
        self.ready
            .get_or_try_init(|| async {
                self.store.health_check().await.map_err(|e| Error::Connection { url: self.store.endpoint(), source: e.into() })?;
                info!("vector store reachable at {}", self.store.endpoint());
                Ok::<(), Error>(())
            })
            .await?;
        Ok(())
    }

    async fn create(&self, name: &str, dim: usize, hybrid: bool) -> Result<()> {
        let operation = if hybrid { "create hybrid collection" } else { "create collection" };
        if dim == 0 {
            return Err(Error::invalid_argument(format!("collection '{name}' needs a positive dimension")));
        }
        self.ensure_ready().await?;
        let spec = CollectionSpec { name: name.to_string(), dim, hybrid };
        match self.store.create_collection(&spec).await {
            Ok(()) => {
                info!("created collection '{}' (dim={}, hybrid={})", name, dim, hybrid);
                Ok(())
            }
            Err(e) if classify(&e) == ErrorClass::AlreadyExists => {
                debug!("collection '{}' already exists", name);
                Ok(())
            }
            Err(e) => Err(Error::backend(operation, name, e)),
        }
    }

    async fn upsert_documents(&self, name: &str, documents: &[VectorDocument], hybrid: bool) -> Result<()> {
        let operation = if hybrid { "insert hybrid" } else { "insert" };
        if documents.is_empty() {
            return Ok(());
        }
        check_dimensions(documents)?;
        self.ensure_ready().await?;
        let points: Vec<StoredPoint> = documents
            .iter()
            .map(|doc| StoredPoint {
                key: to_point_key(&doc.id),
                dense: doc.vector.clone(),
                sparse: if hybrid { Some(self.tokenizer.sparse_vector(&doc.content)).filter(|s| !s.is_empty()) } else { None },
                payload: to_payload(doc),
            })
            .collect();
        self.store.upsert(name, points).await.map_err(|e| Error::backend(operation, name, e))?;
        debug!("upserted {} documents into '{}'", documents.len(), name);
        Ok(())
    }

    fn to_results(&self, name: &str, hits: Vec<StoreHit>, query_vector: &[f32]) -> Result<Vec<SearchResult>> {
        hits.into_iter()
            .map(|h| Ok(SearchResult { document: to_document(name, h.payload, query_vector)?, score: h.score }))
            .collect()
    }
}

fn check_dimensions(documents: &[VectorDocument]) -> Result<()> {
    let dim = documents[0].vector.len();
    if dim == 0 {
        return Err(Error::invalid_argument(format!("document '{}' has an empty vector", documents[0].id)));
    }
    if let Some(bad) = documents.iter().find(|d| d.vector.len() != dim) {
        return Err(Error::invalid_argument(format!(
            "document '{}' has dimension {}, expected {}",
            bad.id,
            bad.vector.len(),
            dim
        )));
    }
    Ok(())
}

#[async_trait]
impl<S: PointStore> VectorDatabase for QdrantVectorDatabase<S> {
    async fn create_collection(&self, name: &str, dim: usize) -> Result<()> {
        self.create(name, dim, false).await
    }

    async fn create_hybrid_collection(&self, name: &str, dim: usize) -> Result<()> {
        self.create(name, dim, true).await
    }

    async fn drop_collection(&self, name: &str) -> Result<()> {
        self.ensure_ready().await?;
        match self.store.delete_collection(name).await {
            Ok(()) => {
                info!("dropped collection '{}'", name);
                Ok(())
            }
            Err(e) if classify(&e) == ErrorClass::NotFound => {
                debug!("collection '{}' does not exist, nothing to drop", name);
                Ok(())
            }
            Err(e) => Err(Error::backend("drop collection", name, e)),
        }
    }

    async fn has_collection(&self, name: &str) -> Result<bool> {
        self.ensure_ready().await?;
        self.store.collection_exists(name).await.map_err(|e| Error::backend("has collection", name, e))
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        self.ensure_ready().await?;
        self.store.list_collections().await.map_err(|e| Error::backend("list collections", "*", e))
    }

    async fn insert(&self, name: &str, documents: &[VectorDocument]) -> Result<()> {
        self.upsert_documents(name, documents, false).await
    }

    async fn insert_hybrid(&self, name: &str, documents: &[VectorDocument]) -> Result<()> {
        self.upsert_documents(name, documents, true).await
    }

    async fn search(&self, name: &str, query_vector: &[f32], options: SearchOptions) -> Result<Vec<SearchResult>> {
        if query_vector.is_empty() {
            return Err(Error::invalid_argument("query vector is empty"));
        }
        if options.top_k == 0 {
            return Ok(Vec::new());
        }
        self.ensure_ready().await?;
        let hits = self
            .store
            .query(name, VectorQuery::Dense(query_vector.to_vec()), options.top_k, options.threshold)
            .await
            .map_err(|e| Error::backend("search", name, e))?;
        self.to_results(name, hits, query_vector)
    }

    async fn hybrid_search(
        &self,
        name: &str,
        requests: &[HybridSearchRequest],
        options: HybridSearchOptions,
    ) -> Result<Vec<SearchResult>> {
        let plan = plan_hybrid(requests, &options, &self.settings, &self.tokenizer)?;
        if plan.limit == 0 {
            return Ok(Vec::new());
        }
        self.ensure_ready().await?;

        let dense_leg = self.store.query(name, VectorQuery::Dense(plan.dense.to_vec()), plan.dense_depth, None);
        let sparse_leg = async {
            match &plan.sparse {
                Some(sparse) => self.store.query(name, VectorQuery::Sparse(sparse.clone()), plan.sparse_depth, None).await,
                None => Ok(Vec::new()),
            }
        };
        let (dense_hits, sparse_hits) =
            tokio::try_join!(dense_leg, sparse_leg).map_err(|e| Error::backend("hybrid search", name, e))?;
        debug!("hybrid search on '{}': {} dense, {} sparse candidates", name, dense_hits.len(), sparse_hits.len());

        let dense_keys: Vec<PointKey> = dense_hits.iter().map(|h| h.key.clone()).collect();
        let sparse_keys: Vec<PointKey> = sparse_hits.iter().map(|h| h.key.clone()).collect();
        let mut payloads: HashMap<PointKey, StoreHit> = HashMap::new();
        for hit in dense_hits.into_iter().chain(sparse_hits) {
            payloads.entry(hit.key.clone()).or_insert(hit);
        }

        let fused = reciprocal_rank_fusion(&[dense_keys, sparse_keys], plan.k, plan.limit);
        let mut results = Vec::with_capacity(fused.len());
        for hit in fused {
            let Some(stored) = payloads.remove(&hit.key) else {
                warn!("fused key {} has no payload", hit.key);
                continue;
            };
            results.push(SearchResult { document: to_document(name, stored.payload, plan.dense)?, score: hit.score });
        }
        Ok(results)
    }

    async fn delete(&self, name: &str, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        self.ensure_ready().await?;
        let keys: Vec<PointKey> = ids.iter().map(|id| to_point_key(id)).collect();
        self.store.delete_points(name, keys).await.map_err(|e| Error::backend("delete", name, e))?;
        debug!("deleted {} ids from '{}'", ids.len(), name);
        Ok(())
    }

    /// Scrolls up to `limit` records. The filter expression is accepted but
    /// not applied; every record is a candidate.
    async fn query(&self, name: &str, filter: &str, output_fields: &[String], limit: usize) -> Result<Vec<Record>> {
        if !filter.trim().is_empty() {
            debug!("filter '{}' on '{}' is not applied", filter, name);
        }
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.ensure_ready().await?;
        let hits = self.store.scroll(name, limit).await.map_err(|e| Error::backend("query", name, e))?;
        hits.into_iter().map(|h| to_record(name, h.payload, output_fields)).collect()
    }

    async fn check_collection_limit(&self) -> Result<bool> {
        Ok(true)
    }
}
