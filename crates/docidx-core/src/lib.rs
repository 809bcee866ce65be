//! docidx-core
//!
//! Shared vocabulary for the retrieval engine: the `Document` model, the
//! `SearchIndex`/`Embedder`/`Reranker` seams, the error taxonomy, Figment-based
//! configuration and documentation chunking.

pub mod config;
pub mod data_processor;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::{Embedder, Reranker, SearchIndex};
pub use types::{DistanceMetric, Document, DocumentId, Query, ScoredDocument};
