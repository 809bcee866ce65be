use std::sync::Arc;

use crate::error::Result;
use crate::types::{Document, Query, ScoredDocument};

/// External text → vector collaborator. Must be deterministic for a given input.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;

    /// Vectors come back in input order. Override when the backend can batch.
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// External second-pass ordering. Returns document ids, most relevant first.
pub trait Reranker: Send + Sync {
    fn rerank(&self, documents: &[Arc<Document>], query: &str, k: usize) -> anyhow::Result<Vec<String>>;
}

impl<F> Reranker for F
where
    F: Fn(&[Arc<Document>], &str, usize) -> anyhow::Result<Vec<String>> + Send + Sync,
{
    fn rerank(&self, documents: &[Arc<Document>], query: &str, k: usize) -> anyhow::Result<Vec<String>> {
        self(documents, query, k)
    }
}

/// Anything the retriever can fan documents and queries out to.
///
/// Each implementation owns its own score convention (see [`ScoredDocument`]);
/// only the rank order of `search` results matters to fusion.
pub trait SearchIndex: Send + Sync {
    fn name(&self) -> &str;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool { self.len() == 0 }
    fn add_document(&mut self, document: Arc<Document>) -> Result<()>;
    fn add_documents(&mut self, documents: &[Arc<Document>]) -> Result<()>;
    fn search(&self, query: Query<'_>, k: usize) -> Result<Vec<ScoredDocument>>;
}
