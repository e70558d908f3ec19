pub mod config;
pub mod data_processor;
pub mod error;
pub mod id;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use id::{to_point_key, PointKey, ORIGINAL_ID_FIELD};
pub use traits::{Embedder, VectorDatabase};
pub use types::*;
