//! Separates benign backend conditions from real failures.
//!
//! gRPC status codes are checked first. Qdrant reports some of these
//! conditions only in the message text (an existing collection comes back as
//! `InvalidArgument` "... already exists!"), so the message is the fallback.

use qdrant_client::QdrantError;

use crate::store::StoreError;

// tonic::Code discriminants
const GRPC_NOT_FOUND: i32 = 5;
const GRPC_ALREADY_EXISTS: i32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    AlreadyExists,
    NotFound,
    Other,
}

pub fn classify(err: &StoreError) -> ErrorClass {
    match err {
        StoreError::AlreadyExists(_) => ErrorClass::AlreadyExists,
        StoreError::NotFound(_) => ErrorClass::NotFound,
        StoreError::Qdrant(QdrantError::ResponseError { status }) => match status.code() as i32 {
            GRPC_ALREADY_EXISTS => ErrorClass::AlreadyExists,
            GRPC_NOT_FOUND => ErrorClass::NotFound,
            _ => classify_message(status.message()),
        },
        StoreError::Qdrant(other) => classify_message(&other.to_string()),
        StoreError::Other(msg) => classify_message(msg),
    }
}

pub fn classify_message(msg: &str) -> ErrorClass {
    let msg = msg.to_lowercase();
    if msg.contains("already exists") {
        ErrorClass::AlreadyExists
    } else if msg.contains("not found") || msg.contains("doesn't exist") || msg.contains("does not exist") {
        ErrorClass::NotFound
    } else {
        ErrorClass::Other
    }
}
