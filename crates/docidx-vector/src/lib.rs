//! docidx-vector
//!
//! Dense side of the retrieval engine: cosine/Euclidean distances and an
//! exact in-memory nearest-neighbor index with optional on-the-fly embedding.

pub mod distance;
pub mod index;

pub use distance::{compute_distance, cosine_distance, euclidean_distance};
pub use index::DenseIndex;
