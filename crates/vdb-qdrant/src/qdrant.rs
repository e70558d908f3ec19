//! [`PointStore`] over the official Qdrant gRPC client.
//!
//! Collections always use a named dense vector (cosine); hybrid collections
//! add a named sparse vector. Payloads are converted between `serde_json`
//! and Qdrant's protobuf `Value` here and nowhere else.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, DeletePointsBuilder, Distance, ListValue, NamedVectors, PointId, PointStruct,
    PointsIdsList, Query, QueryPointsBuilder, ScrollPointsBuilder, SparseVectorParamsBuilder,
    SparseVectorsConfigBuilder, Struct, UpsertPointsBuilder, Value as QdrantValue, Vector, VectorInput,
    VectorParamsBuilder, VectorsConfigBuilder,
};
use qdrant_client::{Payload, Qdrant};
use serde_json::{Map, Number, Value as JsonValue};
use tracing::{debug, warn};

use vdb_core::config::{QdrantSettings, SearchSettings};
use vdb_core::PointKey;

use crate::store::{CollectionSpec, PointStore, StoreError, StoreHit, StoredPoint, VectorQuery};

pub struct QdrantStore {
    client: Qdrant,
    url: String,
    dense_name: String,
    sparse_name: String,
}

impl QdrantStore {
    /// Build a client; no request is sent until first use.
    pub fn connect(qdrant: &QdrantSettings, search: &SearchSettings) -> Result<Self, StoreError> {
        let client = Qdrant::from_url(&qdrant.url)
            .api_key(qdrant.api_key.clone())
            .timeout(Duration::from_secs(qdrant.timeout_secs))
            .build()?;
        Ok(Self::from_client(client, &qdrant.url, search))
    }

    pub fn from_client(client: Qdrant, url: &str, search: &SearchSettings) -> Self {
        Self {
            client,
            url: url.to_string(),
            dense_name: search.dense_vector_name.clone(),
            sparse_name: search.sparse_vector_name.clone(),
        }
    }

    fn to_point(&self, point: StoredPoint) -> PointStruct {
        let mut vectors = NamedVectors::default().add_vector(self.dense_name.clone(), Vector::new_dense(point.dense));
        if let Some(sparse) = point.sparse {
            vectors = vectors.add_vector(self.sparse_name.clone(), Vector::new_sparse(sparse.indices, sparse.values));
        }
        PointStruct::new(point_id(&point.key), vectors, to_qdrant_payload(point.payload))
    }
}

#[async_trait]
impl PointStore for QdrantStore {
    fn endpoint(&self) -> String {
        self.url.clone()
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        let reply = self.client.health_check().await?;
        debug!("qdrant {} at {}", reply.version, self.url);
        Ok(())
    }

    async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        let reply = self.client.list_collections().await?;
        Ok(reply.collections.into_iter().map(|c| c.name).collect())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.client.collection_exists(name).await?)
    }

    async fn create_collection(&self, spec: &CollectionSpec) -> Result<(), StoreError> {
        let mut vectors = VectorsConfigBuilder::default();
        vectors.add_named_vector_params(
            self.dense_name.clone(),
            VectorParamsBuilder::new(spec.dim as u64, Distance::Cosine).build(),
        );
        let mut builder = CreateCollectionBuilder::new(spec.name.clone()).vectors_config(vectors);
        if spec.hybrid {
            let mut sparse = SparseVectorsConfigBuilder::default();
            sparse.add_named_vector_params(self.sparse_name.clone(), SparseVectorParamsBuilder::default());
            builder = builder.sparse_vectors_config(sparse);
        }
        self.client.create_collection(builder).await?;
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<(), StoreError> {
        let reply = self.client.delete_collection(name).await?;
        if reply.result { Ok(()) } else { Err(StoreError::NotFound(name.to_string())) }
    }

    async fn upsert(&self, collection: &str, points: Vec<StoredPoint>) -> Result<(), StoreError> {
        let points: Vec<PointStruct> = points.into_iter().map(|p| self.to_point(p)).collect();
        self.client.upsert_points(UpsertPointsBuilder::new(collection, points).wait(true)).await?;
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        query: VectorQuery,
        limit: usize,
        threshold: Option<f32>,
    ) -> Result<Vec<StoreHit>, StoreError> {
        debug!("{} query on '{}' (limit {})", query.kind(), collection, limit);
        let (input, using) = match query {
            VectorQuery::Dense(v) => (VectorInput::new_dense(v), &self.dense_name),
            VectorQuery::Sparse(s) => (VectorInput::new_sparse(s.indices, s.values), &self.sparse_name),
        };
        let mut request = QueryPointsBuilder::new(collection)
            .query(Query::new_nearest(input))
            .using(using.clone())
            .limit(limit as u64)
            .with_payload(true);
        if let Some(t) = threshold {
            request = request.score_threshold(t);
        }
        let reply = self.client.query(request).await?;
        reply
            .result
            .into_iter()
            .map(|p| Ok(StoreHit { key: point_key(p.id)?, score: p.score, payload: to_json_payload(p.payload) }))
            .collect()
    }

    async fn delete_points(&self, collection: &str, keys: Vec<PointKey>) -> Result<(), StoreError> {
        let ids: Vec<PointId> = keys.iter().map(point_id).collect();
        self.client
            .delete_points(DeletePointsBuilder::new(collection).points(PointsIdsList { ids }).wait(true))
            .await?;
        Ok(())
    }

    async fn scroll(&self, collection: &str, limit: usize) -> Result<Vec<StoreHit>, StoreError> {
        let limit = u32::try_from(limit).unwrap_or(u32::MAX);
        let reply = self
            .client
            .scroll(ScrollPointsBuilder::new(collection).limit(limit).with_payload(true).with_vectors(false))
            .await?;
        reply
            .result
            .into_iter()
            .map(|p| Ok(StoreHit { key: point_key(p.id)?, score: 0.0, payload: to_json_payload(p.payload) }))
            .collect()
    }
}

fn point_id(key: &PointKey) -> PointId {
    match key {
        PointKey::Num(n) => PointId::from(*n),
        PointKey::Uuid(u) => PointId::from(u.clone()),
    }
}

fn point_key(id: Option<PointId>) -> Result<PointKey, StoreError> {
    match id.and_then(|id| id.point_id_options) {
        Some(PointIdOptions::Num(n)) => Ok(PointKey::Num(n)),
        Some(PointIdOptions::Uuid(u)) => Ok(PointKey::Uuid(u)),
        None => Err(StoreError::Other("point returned without an id".to_string())),
    }
}

fn to_qdrant_payload(map: Map<String, JsonValue>) -> Payload {
    let fields: HashMap<String, QdrantValue> = map.into_iter().map(|(k, v)| (k, json_to_qdrant(v))).collect();
    Payload::from(fields)
}

fn to_json_payload(payload: HashMap<String, QdrantValue>) -> Map<String, JsonValue> {
    payload.into_iter().filter_map(|(k, v)| qdrant_to_json(v).map(|v| (k, v))).collect()
}

fn json_to_qdrant(value: JsonValue) -> QdrantValue {
    let kind = match value {
        JsonValue::Null => Kind::NullValue(0),
        JsonValue::Bool(b) => Kind::BoolValue(b),
        JsonValue::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => Kind::IntegerValue(i),
            (None, Some(u)) => {
                warn!("payload integer {} exceeds i64, stored as a double", u);
                Kind::DoubleValue(u as f64)
            }
            (None, None) => Kind::DoubleValue(n.as_f64().unwrap_or_default()),
        },
        JsonValue::String(s) => Kind::StringValue(s),
        JsonValue::Array(items) => Kind::ListValue(ListValue { values: items.into_iter().map(json_to_qdrant).collect() }),
        JsonValue::Object(map) => Kind::StructValue(Struct {
            fields: map.into_iter().map(|(k, v)| (k, json_to_qdrant(v))).collect(),
        }),
    };
    QdrantValue { kind: Some(kind) }
}

fn qdrant_to_json(value: QdrantValue) -> Option<JsonValue> {
    match value.kind? {
        Kind::NullValue(_) => Some(JsonValue::Null),
        Kind::BoolValue(b) => Some(JsonValue::Bool(b)),
        Kind::IntegerValue(i) => Some(JsonValue::Number(Number::from(i))),
        Kind::DoubleValue(f) => {
            let number = Number::from_f64(f).map(JsonValue::Number);
            if number.is_none() {
                warn!("payload double {} has no JSON form, dropped", f);
            }
            number
        }
        Kind::StringValue(s) => Some(JsonValue::String(s)),
        Kind::ListValue(list) => Some(JsonValue::Array(list.values.into_iter().filter_map(qdrant_to_json).collect())),
        Kind::StructValue(s) => Some(JsonValue::Object(
            s.fields.into_iter().filter_map(|(k, v)| qdrant_to_json(v).map(|v| (k, v))).collect(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_payload_survives_qdrant_values() {
        let original = json!({
            "originalId": "a",
            "startLine": 3,
            "score": 0.25,
            "flags": [true, null],
            "metadata": {"lang": "rust", "tags": ["x", "y"]}
        });
        let JsonValue::Object(map) = original.clone() else { unreachable!() };
        let fields: HashMap<String, QdrantValue> = map.into_iter().map(|(k, v)| (k, json_to_qdrant(v))).collect();
        assert_eq!(JsonValue::Object(to_json_payload(fields)), original);
    }

    #[test]
    fn out_of_range_numbers_degrade_predictably() {
        let big = json_to_qdrant(serde_json::json!(u64::MAX));
        assert!(matches!(big.kind, Some(Kind::DoubleValue(f)) if f == u64::MAX as f64));

        let nan = QdrantValue { kind: Some(Kind::DoubleValue(f64::NAN)) };
        assert_eq!(qdrant_to_json(nan), None);
        let values = vec![
            QdrantValue { kind: Some(Kind::DoubleValue(f64::INFINITY)) },
            QdrantValue { kind: Some(Kind::IntegerValue(1)) },
        ];
        let inside = QdrantValue { kind: Some(Kind::ListValue(ListValue { values })) };
        assert_eq!(qdrant_to_json(inside), Some(serde_json::json!([1])));
    }

    #[test]
    fn point_keys_map_both_ways() {
        for key in [PointKey::Num(7), PointKey::Uuid("550e8400-e29b-41d4-a716-446655440000".into())] {
            assert_eq!(point_key(Some(point_id(&key))).unwrap(), key);
        }
        assert!(point_key(None).is_err());
    }
}
