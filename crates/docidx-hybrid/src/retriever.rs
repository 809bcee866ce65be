use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

use docidx_core::config::RetrievalSettings;
use docidx_core::{Document, Embedder, Error, Query, Reranker, Result, ScoredDocument, SearchIndex};
use docidx_text::Bm25Index;
use docidx_vector::DenseIndex;

use crate::fusion::reciprocal_rank_fusion;
use crate::ids::IdAssigner;

/// Each index is asked for this many times `k` candidates before fusion.
pub const FETCH_MULTIPLIER: usize = 5;
pub const DEFAULT_K_RRF: f32 = 60.0;

/// Hybrid retriever: fans documents out to every index, fuses their rankings
/// with RRF and optionally hands the fused top-k to a reranker.
///
/// Returned scores are fused RRF scores, **higher is better**.
pub struct Retriever {
    indexes: Vec<Box<dyn SearchIndex>>,
    reranker: Option<Arc<dyn Reranker>>,
    k_rrf: f32,
    ids: Mutex<IdAssigner>,
}

impl Retriever {
    pub fn new(indexes: Vec<Box<dyn SearchIndex>>) -> Result<Self> {
        if indexes.is_empty() { return Err(Error::NoIndexes); }
        Ok(Self { indexes, reranker: None, k_rrf: DEFAULT_K_RRF, ids: Mutex::new(IdAssigner::new()) })
    }

    /// Dense index (given embedder) followed by a BM25 index.
    pub fn from_settings(settings: &RetrievalSettings, embedder: Arc<dyn Embedder>) -> Result<Self> {
        settings.validate()?;
        let dense = DenseIndex::new(settings.metric).with_embedder(embedder);
        let lexical = Bm25Index::with_settings(settings.bm25)?;
        info!(metric = %settings.metric, k_rrf = settings.k_rrf, "retriever configured");
        Self::new(vec![Box::new(dense), Box::new(lexical)])?.with_rrf_constant(settings.k_rrf)
    }

    pub fn with_reranker(self, reranker: Arc<dyn Reranker>) -> Self { Self { reranker: Some(reranker), ..self } }

    pub fn with_rrf_constant(self, k_rrf: f32) -> Result<Self> {
        check_rrf_constant(k_rrf)?;
        Ok(Self { k_rrf, ..self })
    }

    /// Deterministic id generation.
    pub fn with_id_seed(self, seed: u64) -> Self { Self { ids: Mutex::new(IdAssigner::with_seed(seed)), ..self } }

    pub fn indexes(&self) -> &[Box<dyn SearchIndex>] { &self.indexes }

    pub fn rrf_constant(&self) -> f32 { self.k_rrf }

    pub fn has_reranker(&self) -> bool { self.reranker.is_some() }

    fn assigner(&self) -> std::sync::MutexGuard<'_, IdAssigner> { self.ids.lock().unwrap_or_else(PoisonError::into_inner) }

    /// Add one document to every index. Missing ids are assigned first.
    ///
    /// Adding the same content twice yields two distinct documents.
    pub fn add_document(&mut self, document: impl Into<Arc<Document>>) -> Result<Arc<Document>> {
        let document = document.into();
        document.validate()?;
        self.assigner().assign(&document);
        for index in &mut self.indexes {
            index.add_document(document.clone())?;
        }
        Ok(document)
    }

    /// Batch form of [`Retriever::add_document`]; every index receives the
    /// whole batch in one call.
    pub fn add_documents<D>(&mut self, documents: impl IntoIterator<Item = D>) -> Result<Vec<Arc<Document>>>
    where
        D: Into<Arc<Document>>,
    {
        let documents: Vec<Arc<Document>> = documents.into_iter().map(Into::into).collect();
        for (i, d) in documents.iter().enumerate() {
            d.validate().map_err(|e| Error::InvalidDocument(format!("document at index {i}: {e}")))?;
        }
        {
            let mut ids = self.assigner();
            for d in &documents { ids.assign(d); }
        }
        for index in &mut self.indexes {
            index.add_documents(&documents)?;
        }
        debug!(added = documents.len(), indexes = self.indexes.len(), "retriever batch insert");
        Ok(documents)
    }

    pub fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredDocument>> { self.search_with_rrf(query, k, self.k_rrf) }

    /// Search with an explicit RRF constant for this call only.
    pub fn search_with_rrf(&self, query: &str, k: usize, k_rrf: f32) -> Result<Vec<ScoredDocument>> {
        if k == 0 { return Err(Error::InvalidK); }
        check_rrf_constant(k_rrf)?;

        let fetch = k.saturating_mul(FETCH_MULTIPLIER);
        let mut ranked_lists = Vec::with_capacity(self.indexes.len());
        for index in &self.indexes {
            let hits = index.search(Query::Text(query), fetch)?;
            debug!(index = index.name(), hits = hits.len(), "index candidates");
            ranked_lists.push(hits);
        }

        let mut fused = reciprocal_rank_fusion(&ranked_lists, k_rrf)?;
        fused.truncate(k);
        let candidates: Vec<ScoredDocument> = fused.into_iter().map(ScoredDocument::from).collect();

        match &self.reranker {
            Some(reranker) if !candidates.is_empty() => self.apply_reranker(reranker.as_ref(), candidates, query, k),
            _ => Ok(candidates),
        }
    }

    /// The reranker's order and cardinality win. Unknown ids are skipped,
    /// omitted candidates are dropped, fused scores are kept.
    fn apply_reranker(
        &self,
        reranker: &dyn Reranker,
        candidates: Vec<ScoredDocument>,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredDocument>> {
        let ids: Vec<String> = {
            let mut assigner = self.assigner();
            candidates.iter().map(|c| assigner.assign(&c.document)).collect()
        };
        // Shared ids resolve to the best-fused candidate.
        let mut by_id: HashMap<&str, usize> = HashMap::new();
        for (pos, id) in ids.iter().enumerate() {
            by_id.entry(id.as_str()).or_insert(pos);
        }

        let documents: Vec<Arc<Document>> = candidates.iter().map(|c| c.document.clone()).collect();
        let order = reranker.rerank(&documents, query, k).map_err(Error::Reranker)?;

        let mut taken = vec![false; candidates.len()];
        let mut out = Vec::with_capacity(order.len().min(candidates.len()));
        for id in &order {
            match by_id.get(id.as_str()) {
                Some(&pos) if !taken[pos] => {
                    taken[pos] = true;
                    out.push(candidates[pos].clone());
                }
                Some(_) => warn!(id = %id, "reranker repeated a document id; ignoring"),
                None => warn!(id = %id, "reranker returned an unknown document id; ignoring"),
            }
        }
        debug!(candidates = candidates.len(), kept = out.len(), "reranked");
        Ok(out)
    }
}

fn check_rrf_constant(k_rrf: f32) -> Result<()> {
    if !(k_rrf >= 0.0) || !k_rrf.is_finite() { return Err(Error::InvalidRrfConstant(k_rrf)); }
    Ok(())
}
