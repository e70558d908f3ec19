//! Mapping between caller document ids and backend point keys.
//!
//! Qdrant only accepts unsigned integers or UUIDs as point ids, while callers
//! hand us arbitrary strings. The mapping is a pure function of the input so
//! repeated upserts and deletes of the same id address the same point. The
//! original id travels in the payload under [`ORIGINAL_ID_FIELD`].

use std::fmt;
use uuid::Uuid;

/// Payload key holding the caller's id.
pub const ORIGINAL_ID_FIELD: &str = "originalId";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PointKey {
    Num(u64),
    Uuid(String),
}

impl fmt::Display for PointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointKey::Num(n) => write!(f, "{n}"),
            PointKey::Uuid(u) => f.write_str(u),
        }
    }
}

/// Map a caller id to a point key.
///
/// Only ids already in the backend's canonical spelling pass through: a
/// lowercase hyphenated UUID, or a decimal `u64` without leading zeros. Any
/// other id ("042", an uppercase or braced UUID) becomes the first 16 bytes
/// of its BLAKE3 digest formatted as a UUID, so two distinct ids never share
/// a key by normalisation. Hash collisions are not detected.
pub fn to_point_key(id: &str) -> PointKey {
    if let Ok(uuid) = Uuid::parse_str(id) {
        let canonical = uuid.hyphenated().to_string();
        if canonical == id {
            return PointKey::Uuid(canonical);
        }
    }
    if let Ok(n) = id.parse::<u64>() {
        if n.to_string() == id {
            return PointKey::Num(n);
        }
    }
    let digest = blake3::hash(id.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest.as_bytes()[..16]);
    PointKey::Uuid(Uuid::from_bytes(bytes).hyphenated().to_string())
}
