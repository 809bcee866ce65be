//! docidx-embed
//!
//! Deterministic feature-hashing embedder. Real deployments plug an external
//! embedding model in through `docidx_core::Embedder`; this one needs no model
//! files, so the CLI and tests run offline.

use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::info;
use twox_hash::XxHash64;

use docidx_core::config::EmbeddingSettings;
use docidx_core::{Embedder, Error, Result};

/// Hashes each lowercased word into one of `dim` buckets and L2-normalizes.
/// Texts sharing words land close together under cosine distance.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 { return Err(Error::InvalidConfig("embedding dimension must be positive".into())); }
        Ok(Self { dim })
    }

    pub fn dim(&self) -> usize { self.dim }
}

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut v = vec![0f32; self.dim];
        let words = text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty());
        for (i, word) in words.enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            word.to_lowercase().hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            let val = 0.5 + ((h >> 32) as u32) as f32 / u32::MAX as f32;
            v[idx] += val + (i % 3) as f32 * 0.01;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v { *x /= norm; }
        }
        Ok(v)
    }
}

pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    let embedder = HashEmbedder::new(settings.dimension)?;
    info!(dimension = settings.dimension, "using hashing embedder");
    Ok(Arc::new(embedder))
}
