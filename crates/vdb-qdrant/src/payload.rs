//! Record payload layout.
//!
//! Every point carries the full document minus its vector, plus the caller's
//! original id, so reads never depend on the backend point key.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use vdb_core::{Error, Metadata, Record, Result, VectorDocument, ORIGINAL_ID_FIELD};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredPayload {
    original_id: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    relative_path: String,
    #[serde(default)]
    start_line: i64,
    #[serde(default)]
    end_line: i64,
    #[serde(default)]
    file_extension: String,
    #[serde(default)]
    metadata: Metadata,
}

pub fn to_payload(doc: &VectorDocument) -> Map<String, Value> {
    let stored = StoredPayload {
        original_id: doc.id.clone(),
        content: doc.content.clone(),
        relative_path: doc.relative_path.clone(),
        start_line: doc.start_line,
        end_line: doc.end_line,
        file_extension: doc.file_extension.clone(),
        metadata: doc.metadata.clone(),
    };
    match serde_json::to_value(stored) {
        Ok(Value::Object(map)) => map,
        // a struct of strings, ints and a map always serializes to an object
        _ => Map::new(),
    }
}

/// Rebuild a document from its payload, with `vector` as the document vector.
pub fn to_document(collection: &str, payload: Map<String, Value>, vector: &[f32]) -> Result<VectorDocument> {
    let stored: StoredPayload = serde_json::from_value(Value::Object(payload)).map_err(|e| Error::Payload {
        collection: collection.to_string(),
        reason: e.to_string(),
    })?;
    Ok(VectorDocument {
        id: stored.original_id,
        vector: vector.to_vec(),
        content: stored.content,
        relative_path: stored.relative_path,
        start_line: stored.start_line,
        end_line: stored.end_line,
        file_extension: stored.file_extension,
        metadata: stored.metadata,
    })
}

/// `id` (the original id) plus the requested payload fields; every field
/// when `output_fields` is empty. Unknown fields are skipped.
pub fn to_record(collection: &str, mut payload: Map<String, Value>, output_fields: &[String]) -> Result<Record> {
    let id = payload.remove(ORIGINAL_ID_FIELD).ok_or_else(|| Error::Payload {
        collection: collection.to_string(),
        reason: format!("missing '{}'", ORIGINAL_ID_FIELD),
    })?;
    let mut record = Record::new();
    record.insert("id".to_string(), id);
    if output_fields.is_empty() {
        record.extend(payload);
    } else {
        for field in output_fields {
            if field == "id" {
                continue;
            }
            if let Some(v) = payload.remove(field) {
                record.insert(field.clone(), v);
            }
        }
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> VectorDocument {
        let mut metadata = Metadata::new();
        metadata.insert("lang".into(), json!("rust"));
        VectorDocument {
            id: "src/lib.rs:1-20".into(),
            vector: vec![0.1, 0.2],
            content: "pub mod config;".into(),
            relative_path: "src/lib.rs".into(),
            start_line: 1,
            end_line: 20,
            file_extension: ".rs".into(),
            metadata,
        }
    }

    #[test]
    fn payload_keeps_original_id_and_fields() {
        let p = to_payload(&doc());
        assert_eq!(p[ORIGINAL_ID_FIELD], json!("src/lib.rs:1-20"));
        assert_eq!(p["relativePath"], json!("src/lib.rs"));
        assert_eq!(p["metadata"]["lang"], json!("rust"));
        assert!(!p.contains_key("vector"));
    }

    #[test]
    fn document_is_rebuilt_with_given_vector() {
        let rebuilt = to_document("c", to_payload(&doc()), &[9.0]).unwrap();
        assert_eq!(rebuilt.id, "src/lib.rs:1-20");
        assert_eq!(rebuilt.vector, vec![9.0]);
        assert_eq!(rebuilt.end_line, 20);
        assert_eq!(rebuilt.metadata["lang"], json!("rust"));
    }

    #[test]
    fn payload_without_original_id_is_rejected() {
        let mut p = to_payload(&doc());
        p.remove(ORIGINAL_ID_FIELD);
        assert!(matches!(to_document("c", p.clone(), &[]), Err(Error::Payload { .. })));
        assert!(to_record("c", p, &[]).is_err());
    }

    #[test]
    fn record_selects_fields() {
        let fields = vec!["content".to_string(), "id".to_string(), "nope".to_string()];
        let r = to_record("c", to_payload(&doc()), &fields).unwrap();
        assert_eq!(r.len(), 2);
        assert_eq!(r["id"], json!("src/lib.rs:1-20"));
        assert_eq!(r["content"], json!("pub mod config;"));

        let all = to_record("c", to_payload(&doc()), &[]).unwrap();
        assert!(all.contains_key("startLine") && all.contains_key("metadata"));
        assert!(!all.contains_key(ORIGINAL_ID_FIELD));
    }
}
