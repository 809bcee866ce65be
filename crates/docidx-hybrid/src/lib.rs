//! docidx-hybrid
//!
//! Hybrid retrieval: fans documents out to a set of [`docidx_core::SearchIndex`]
//! implementations, fuses their rankings with Reciprocal Rank Fusion and
//! optionally reorders the fused top-k with a [`docidx_core::Reranker`].

pub mod fusion;
pub mod ids;
pub mod rerank;
pub mod retriever;

pub use fusion::{reciprocal_rank_fusion, FusedCandidate};
pub use ids::IdAssigner;
pub use rerank::{Completion, LlmReranker};
pub use retriever::{Retriever, DEFAULT_K_RRF, FETCH_MULTIPLIER};
