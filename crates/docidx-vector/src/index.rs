use std::sync::Arc;
use tracing::{debug, trace};

use docidx_core::{DistanceMetric, Document, Embedder, Error, Query, Result, ScoredDocument, SearchIndex};

use crate::distance::compute_distance;

struct VectorEntry {
    vector: Vec<f32>,
    document: Arc<Document>,
}

/// Exact nearest-neighbor index over fixed-width vectors.
///
/// The first stored vector fixes the dimensionality for the lifetime of the
/// index. Results are `(document, distance)` ascending; ties keep insertion
/// order.
pub struct DenseIndex {
    metric: DistanceMetric,
    embedder: Option<Arc<dyn Embedder>>,
    entries: Vec<VectorEntry>,
    dim: Option<usize>,
}

impl DenseIndex {
    pub fn new(metric: DistanceMetric) -> Self {
        Self { metric, embedder: None, entries: Vec::new(), dim: None }
    }

    /// Parse the metric by name (`"cosine"` or `"euclidean"`).
    pub fn with_metric_name(metric: &str) -> Result<Self> { Ok(Self::new(metric.parse()?)) }

    pub fn with_embedder(self, embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder: Some(embedder), ..self }
    }

    pub fn metric(&self) -> DistanceMetric { self.metric }

    pub fn dimension(&self) -> Option<usize> { self.dim }

    fn embedder(&self) -> Result<&Arc<dyn Embedder>> { self.embedder.as_ref().ok_or(Error::MissingEmbedder) }

    /// Store a precomputed vector for `document`, bypassing the embedder.
    pub fn add_vector(&mut self, vector: Vec<f32>, document: Arc<Document>) -> Result<()> {
        document.validate()?;
        self.check_vector(&vector)?;
        self.dim.get_or_insert(vector.len());
        self.entries.push(VectorEntry { vector, document });
        Ok(())
    }

    fn check_vector(&self, vector: &[f32]) -> Result<()> {
        if vector.is_empty() {
            return Err(Error::InvalidVector("vector must not be empty".into()));
        }
        if let Some(pos) = vector.iter().position(|x| !x.is_finite()) {
            return Err(Error::InvalidVector(format!("component {pos} is not a finite number")));
        }
        match self.dim {
            Some(expected) if expected != vector.len() => {
                Err(Error::DimensionMismatch { expected, actual: vector.len() })
            }
            _ => Ok(()),
        }
    }

    /// Nearest `k` documents to a raw vector.
    pub fn search_vector(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredDocument>> {
        let Some(expected) = self.dim else { return Ok(vec![]) };
        if vector.len() != expected {
            return Err(Error::DimensionMismatch { expected, actual: vector.len() });
        }
        if k == 0 { return Err(Error::InvalidK); }
        if vector.iter().any(|x| !x.is_finite()) {
            return Err(Error::InvalidVector("query vector contains a non-finite component".into()));
        }

        let mut scored: Vec<(f32, &VectorEntry)> = self
            .entries
            .iter()
            .map(|e| (compute_distance(vector, &e.vector, self.metric), e))
            .collect();
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));
        scored.truncate(k);
        trace!(metric = %self.metric, hits = scored.len(), "dense ranked");

        Ok(scored.into_iter().map(|(d, e)| ScoredDocument::new(e.document.clone(), d)).collect())
    }

    /// Embed `text` with the configured embedder, then search.
    pub fn search_text(&self, text: &str, k: usize) -> Result<Vec<ScoredDocument>> {
        if self.entries.is_empty() { return Ok(vec![]); }
        let vector = self.embedder()?.embed(text).map_err(Error::Embedding)?;
        let hits = self.search_vector(&vector, k)?;
        debug!(k, hits = hits.len(), "dense search");
        Ok(hits)
    }
}

impl SearchIndex for DenseIndex {
    fn name(&self) -> &str { "dense" }

    fn len(&self) -> usize { self.entries.len() }

    fn add_document(&mut self, document: Arc<Document>) -> Result<()> {
        let embedder = self.embedder()?.clone();
        document.validate()?;
        let vector = embedder.embed(document.content()).map_err(Error::Embedding)?;
        self.add_vector(vector, document)
    }

    /// One batched embedding call. Nothing is stored unless every document
    /// and every returned vector is valid.
    fn add_documents(&mut self, documents: &[Arc<Document>]) -> Result<()> {
        let embedder = self.embedder()?.clone();
        if documents.is_empty() { return Ok(()); }
        for (i, d) in documents.iter().enumerate() {
            d.validate().map_err(|e| Error::InvalidDocument(format!("document at index {i}: {e}")))?;
        }
        let contents: Vec<String> = documents.iter().map(|d| d.content().to_string()).collect();
        let vectors = embedder.embed_batch(&contents).map_err(Error::Embedding)?;
        if vectors.len() != documents.len() {
            return Err(Error::Embedding(anyhow::anyhow!(
                "embedder returned {} vectors for {} documents",
                vectors.len(),
                documents.len()
            )));
        }

        let batch_dim = self.dim.or_else(|| vectors.first().map(Vec::len));
        for v in &vectors {
            self.check_vector(v)?;
            if let Some(expected) = batch_dim {
                if v.len() != expected {
                    return Err(Error::DimensionMismatch { expected, actual: v.len() });
                }
            }
        }
        for (vector, document) in vectors.into_iter().zip(documents) {
            self.add_vector(vector, document.clone())?;
        }
        debug!(added = documents.len(), total = self.entries.len(), "dense batch insert");
        Ok(())
    }

    fn search(&self, query: Query<'_>, k: usize) -> Result<Vec<ScoredDocument>> {
        match query {
            Query::Text(text) => self.search_text(text, k),
            Query::Vector(vector) => self.search_vector(vector, k),
        }
    }
}
