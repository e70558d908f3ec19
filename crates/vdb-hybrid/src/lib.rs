//! Hybrid search building blocks: request planning and rank fusion.

pub mod fusion;
pub mod plan;

pub use fusion::{reciprocal_rank_fusion, FusedHit, RRF_K};
pub use plan::{plan_hybrid, HybridPlan};
