//! Deterministic feature-hashing embedder.
//!
//! Produces L2-normalised dense vectors without a model: every whitespace
//! token is hashed with xxHash64 into one of `dim` slots. Texts sharing tokens
//! get nearby vectors, which is enough to drive indexing and search end to
//! end in tooling and tests.

use anyhow::{bail, Result};
use std::hash::Hasher;
use twox_hash::XxHash64;
use tracing::debug;

use vdb_core::traits::Embedder;

pub const DEFAULT_DIM: usize = 384;

pub struct HashEmbedder { dim: usize, seed: u64 }

impl HashEmbedder {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 { bail!("embedding dimension must be positive"); }
        Ok(Self { dim, seed: 0 })
    }

    pub fn with_seed(mut self, seed: u64) -> Self { self.seed = seed; self }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(self.seed);
            hasher.write(token.to_lowercase().as_bytes());
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v { *x /= norm; }
        v
    }
}

impl Embedder for HashEmbedder {
    fn dim(&self) -> usize { self.dim }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        debug!("embedding {} texts at d={}", texts.len(), self.dim);
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

/// Embedder used by the CLI. `APP_EMBED_DIM` overrides the dimension.
pub fn get_default_embedder() -> Result<Box<dyn Embedder>> {
    let dim = match std::env::var("APP_EMBED_DIM") {
        Ok(v) => v.parse::<usize>().map_err(|e| anyhow::anyhow!("APP_EMBED_DIM={}: {}", v, e))?,
        Err(_) => DEFAULT_DIM,
    };
    Ok(Box::new(HashEmbedder::new(dim)?))
}
