//! Text to sparse vector synthesis.
//!
//! Text is lowercased, stripped to ASCII word characters and whitespace, split
//! into tokens, and each token is hashed into a fixed bucket space. The result
//! is a bag of buckets weighted by occurrence count. Different tokens can land
//! in the same bucket; that noise is accepted in exchange for needing no
//! vocabulary. Documents and queries go through the same tokenizer.

use std::collections::HashMap;

use vdb_core::SparseVector;

pub const DEFAULT_BUCKETS: u32 = 65_536;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SparseTokenizer {
    buckets: u32,
}

impl Default for SparseTokenizer {
    fn default() -> Self {
        Self { buckets: DEFAULT_BUCKETS }
    }
}

impl SparseTokenizer {
    /// `buckets` is clamped to at least 1.
    pub fn new(buckets: u32) -> Self {
        Self { buckets: buckets.max(1) }
    }

    pub fn buckets(&self) -> u32 {
        self.buckets
    }

    pub fn sparse_vector(&self, text: &str) -> SparseVector {
        let mut out = SparseVector::default();
        let mut slot: HashMap<u32, usize> = HashMap::new();
        for token in tokenize(text) {
            let bucket = self.bucket(&token);
            match slot.get(&bucket) {
                Some(&i) => out.values[i] += 1.0,
                None => {
                    slot.insert(bucket, out.indices.len());
                    out.indices.push(bucket);
                    out.values.push(1.0);
                }
            }
        }
        out
    }

    pub fn bucket(&self, token: &str) -> u32 {
        token_hash(token).unsigned_abs() % self.buckets
    }
}

/// Lowercased word tokens. Anything that is not `[a-z0-9_]` or whitespace
/// separates tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c.is_whitespace() { c } else { ' ' })
        .collect();
    cleaned.split_whitespace().map(str::to_string).collect()
}

/// 32-bit rolling hash `h = h * 31 + unit` over UTF-16 code units, wrapping.
pub fn token_hash(token: &str) -> i32 {
    token.encode_utf16().fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
}
