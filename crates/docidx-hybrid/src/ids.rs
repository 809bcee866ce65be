//! Short random document identifiers for reranker round-trips.
//!
//! 8 symbols from `[A-Za-z0-9]` give 62^8 ≈ 2.18e14 values; by the birthday
//! bound n ids collide with probability ≈ n² / 4.4e14 (about 2.3e-5 for
//! 100 000 documents). The assigner also remembers every id it has seen and
//! redraws on collision, so ids it hands out are unique within one retriever.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

use docidx_core::Document;

pub const ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
pub const ID_LENGTH: usize = 8;

pub struct IdAssigner {
    rng: StdRng,
    seen: HashSet<String>,
}

impl Default for IdAssigner {
    fn default() -> Self { Self { rng: StdRng::from_entropy(), seen: HashSet::new() } }
}

impl IdAssigner {
    pub fn new() -> Self { Self::default() }

    /// Reproducible sequence, for tests and debugging.
    pub fn with_seed(seed: u64) -> Self { Self { rng: StdRng::seed_from_u64(seed), seen: HashSet::new() } }

    /// Returns the document's id, generating one if it has none.
    pub fn assign(&mut self, document: &Document) -> String {
        if let Some(id) = document.id() {
            self.seen.insert(id.to_string());
            return id.to_string();
        }
        let fresh = self.generate();
        // Another holder of the same Arc may have set it first; keep whatever won.
        let id = document.id_or_insert_with(|| fresh.clone()).to_string();
        self.seen.insert(id.clone());
        id
    }

    fn generate(&mut self) -> String {
        loop {
            let id: String = (0..ID_LENGTH)
                .map(|_| ID_ALPHABET[self.rng.gen_range(0..ID_ALPHABET.len())] as char)
                .collect();
            if !self.seen.contains(&id) { return id; }
        }
    }
}
