//! Reciprocal Rank Fusion.
//!
//! RRF score = Σ 1/(k_rrf + rank_r(d)) over every ranked list r, with 1-based
//! ranks. A list that does not contain d contributes nothing (rank ∞).
//!
//! Works on ranks only, so the per-index score conventions (ascending
//! distances, ascending normalized BM25) never meet. Fused scores are
//! **higher is better**.

use std::collections::HashMap;
use std::sync::Arc;

use docidx_core::{Document, Error, Result, ScoredDocument};

/// One fused document with its rank in each input list (`None` = absent).
#[derive(Debug, Clone)]
pub struct FusedCandidate {
    pub document: Arc<Document>,
    pub score: f32,
    pub ranks: Vec<Option<usize>>,
}

impl From<FusedCandidate> for ScoredDocument {
    fn from(c: FusedCandidate) -> Self { ScoredDocument::new(c.document, c.score) }
}

/// Fuse ranked lists, best first.
///
/// Documents are identified by `Arc` pointer, not content. Documents with a
/// fused score of zero are dropped. Equal scores keep first-seen order: list
/// order, then rank within the list.
pub fn reciprocal_rank_fusion(ranked_lists: &[Vec<ScoredDocument>], k_rrf: f32) -> Result<Vec<FusedCandidate>> {
    if !(k_rrf >= 0.0) || !k_rrf.is_finite() { return Err(Error::InvalidRrfConstant(k_rrf)); }

    let mut slot_of: HashMap<*const Document, usize> = HashMap::new();
    let mut candidates: Vec<FusedCandidate> = Vec::new();
    for (list_idx, results) in ranked_lists.iter().enumerate() {
        for (pos, hit) in results.iter().enumerate() {
            let slot = *slot_of.entry(Arc::as_ptr(&hit.document)).or_insert_with(|| {
                candidates.push(FusedCandidate {
                    document: hit.document.clone(),
                    score: 0.0,
                    ranks: vec![None; ranked_lists.len()],
                });
                candidates.len() - 1
            });
            // A list repeating a document keeps its best rank.
            candidates[slot].ranks[list_idx].get_or_insert(pos + 1);
        }
    }

    let k = f64::from(k_rrf);
    for c in &mut candidates {
        c.score = c.ranks.iter().flatten().map(|&r| 1.0 / (k + r as f64)).sum::<f64>() as f32;
    }
    candidates.retain(|c| c.score > 0.0);
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    Ok(candidates)
}
