//! In-memory BM25 lexical index.
//!
//! Raw BM25 scores are **higher is better**. `search` maps them through
//! `exp(-factor * raw)` so that, like dense distances, returned scores are
//! **lower is better**. Use `raw_search` to see the unmapped scores.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};
use tracing::{debug, trace};

use docidx_core::config::Bm25Settings;
use docidx_core::{Document, Error, Query, Result, ScoredDocument, SearchIndex};

use crate::tokenizer::{Tokenizer, WordTokenizer};

/// Scores at or below this are treated as "no lexical overlap".
pub const SCORE_EPSILON: f64 = 1e-9;

struct DocTerms {
    len: usize,
    counts: HashMap<String, u32>,
}

/// Derived from the corpus; rebuilt on the first search after any insertion.
#[derive(Debug)]
struct CorpusStats {
    avg_doc_len: f64,
    idf: HashMap<String, f64>,
}

pub struct Bm25Index {
    params: Bm25Settings,
    tokenizer: Box<dyn Tokenizer>,
    documents: Vec<Arc<Document>>,
    doc_terms: Vec<DocTerms>,
    doc_freqs: HashMap<String, usize>,
    stats: OnceLock<CorpusStats>,
}

impl Default for Bm25Index {
    fn default() -> Self {
        Self {
            params: Bm25Settings::default(),
            tokenizer: Box::new(WordTokenizer),
            documents: Vec::new(),
            doc_terms: Vec::new(),
            doc_freqs: HashMap::new(),
            stats: OnceLock::new(),
        }
    }
}

impl Bm25Index {
    pub fn new() -> Self { Self::default() }

    pub fn with_settings(params: Bm25Settings) -> Result<Self> {
        params.validate()?;
        Ok(Self { params, ..Self::default() })
    }

    pub fn with_tokenizer(self, tokenizer: impl Tokenizer + 'static) -> Self {
        Self { tokenizer: Box::new(tokenizer), ..self }
    }

    pub fn settings(&self) -> &Bm25Settings { &self.params }

    /// True when an insertion happened since statistics were last computed.
    pub fn is_stale(&self) -> bool { self.stats.get().is_none() }

    /// Number of documents containing `term`.
    pub fn document_frequency(&self, term: &str) -> usize { self.doc_freqs.get(term).copied().unwrap_or(0) }

    fn insert(&mut self, document: Arc<Document>) {
        let tokens = self.tokenizer.tokenize(document.content());
        let mut counts: HashMap<String, u32> = HashMap::new();
        let mut seen = HashSet::new();
        for token in &tokens {
            *counts.entry(token.clone()).or_insert(0) += 1;
            if seen.insert(token.as_str()) {
                *self.doc_freqs.entry(token.clone()).or_insert(0) += 1;
            }
        }
        self.doc_terms.push(DocTerms { len: tokens.len(), counts });
        self.documents.push(document);
        self.stats = OnceLock::new();
    }

    fn stats(&self) -> &CorpusStats {
        self.stats.get_or_init(|| {
            let n = self.documents.len();
            if n == 0 {
                return CorpusStats { avg_doc_len: 0.0, idf: HashMap::new() };
            }
            let total: usize = self.doc_terms.iter().map(|d| d.len).sum();
            let n_f = n as f64;
            let idf = self
                .doc_freqs
                .iter()
                .map(|(term, &df)| {
                    let df = df as f64;
                    (term.clone(), ((n_f - df + 0.5) / (df + 0.5) + 1.0).ln())
                })
                .collect();
            debug!(documents = n, terms = self.doc_freqs.len(), "rebuilt bm25 statistics");
            CorpusStats { avg_doc_len: total as f64 / n_f, idf }
        })
    }

    fn score(&self, stats: &CorpusStats, query_tokens: &[String], doc_index: usize) -> f64 {
        let terms = &self.doc_terms[doc_index];
        let Bm25Settings { k1, b, .. } = self.params;
        let length_norm = 1.0 - b + b * (terms.len as f64 / stats.avg_doc_len);
        query_tokens
            .iter()
            .filter_map(|token| stats.idf.get(token).map(|idf| (token, *idf)))
            .map(|(token, idf)| {
                let tf = f64::from(terms.counts.get(token).copied().unwrap_or(0));
                idf * tf * (k1 + 1.0) / (tf + k1 * length_norm + SCORE_EPSILON)
            })
            .sum()
    }

    /// Top `k` positions with raw score above epsilon, best first. Equal
    /// scores keep insertion order.
    fn ranked(&self, query: &str, k: usize) -> Result<Vec<(usize, f64)>> {
        if self.documents.is_empty() { return Ok(vec![]); }
        if k == 0 { return Err(Error::InvalidK); }
        let stats = self.stats();
        if stats.avg_doc_len == 0.0 { return Ok(vec![]); }
        let query_tokens = self.tokenizer.tokenize(query);
        if query_tokens.is_empty() { return Ok(vec![]); }

        let mut scored: Vec<(usize, f64)> = (0..self.documents.len())
            .map(|i| (i, self.score(stats, &query_tokens, i)))
            .filter(|(_, s)| *s > SCORE_EPSILON)
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);
        trace!(query, hits = scored.len(), "bm25 ranked");
        Ok(scored)
    }

    /// Raw BM25 scores, descending.
    pub fn raw_search(&self, query: &str, k: usize) -> Result<Vec<ScoredDocument>> {
        Ok(self
            .ranked(query, k)?
            .into_iter()
            .map(|(i, raw)| ScoredDocument::new(self.documents[i].clone(), raw as f32))
            .collect())
    }

    /// Normalized scores `exp(-factor * raw)`, ascending (smaller is more relevant).
    pub fn search_text(&self, query: &str, k: usize) -> Result<Vec<ScoredDocument>> {
        let factor = self.params.normalization_factor;
        let mut hits: Vec<ScoredDocument> = self
            .ranked(query, k)?
            .into_iter()
            .map(|(i, raw)| ScoredDocument::new(self.documents[i].clone(), (-factor * raw).exp() as f32))
            .collect();
        hits.sort_by(|a, b| a.score.total_cmp(&b.score));
        debug!(k, hits = hits.len(), "bm25 search");
        Ok(hits)
    }
}

impl SearchIndex for Bm25Index {
    fn name(&self) -> &str { "bm25" }

    fn len(&self) -> usize { self.documents.len() }

    fn add_document(&mut self, document: Arc<Document>) -> Result<()> {
        document.validate()?;
        self.insert(document);
        Ok(())
    }

    fn add_documents(&mut self, documents: &[Arc<Document>]) -> Result<()> {
        for (i, d) in documents.iter().enumerate() {
            d.validate().map_err(|e| Error::InvalidDocument(format!("document at index {i}: {e}")))?;
        }
        for d in documents {
            self.insert(d.clone());
        }
        Ok(())
    }

    fn search(&self, query: Query<'_>, k: usize) -> Result<Vec<ScoredDocument>> {
        match query {
            Query::Text(text) => self.search_text(text, k),
            Query::Vector(_) => Err(Error::InvalidQuery("the BM25 index requires a text query".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_of(contents: &[&str]) -> Bm25Index {
        let mut index = Bm25Index::new();
        for c in contents {
            index.add_document(Arc::new(Document::new(*c))).unwrap();
        }
        index
    }

    #[test]
    fn statistics_are_lazy() {
        let mut index = index_of(&["alpha beta", "beta gamma"]);
        assert!(index.is_stale());
        index.search_text("beta", 5).unwrap();
        assert!(!index.is_stale());
        index.add_document(Arc::new(Document::new("delta"))).unwrap();
        assert!(index.is_stale());
    }

    #[test]
    fn document_frequency_counts_once_per_document() {
        let index = index_of(&["spam spam spam", "spam eggs"]);
        assert_eq!(index.document_frequency("spam"), 2);
        assert_eq!(index.document_frequency("eggs"), 1);
        assert_eq!(index.document_frequency("ham"), 0);
    }

    #[test]
    fn idf_matches_formula() {
        let index = index_of(&["a b", "a c", "d"]);
        let stats = index.stats();
        let expected_a = ((3.0 - 2.0 + 0.5) / (2.0 + 0.5) + 1.0_f64).ln();
        assert!((stats.idf["a"] - expected_a).abs() < 1e-12);
        assert!((stats.avg_doc_len - 5.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn single_term_score_matches_formula() {
        let index = index_of(&["cat dog", "dog dog bird"]);
        let hits = index.raw_search("bird", 5).unwrap();
        assert_eq!(hits.len(), 1);
        let idf = ((2.0 - 1.0 + 0.5) / (1.0 + 0.5) + 1.0_f64).ln();
        let avg = 2.5;
        let expected = idf * 1.0 * 2.5 / (1.0 + 1.5 * (1.0 - 0.75 + 0.75 * 3.0 / avg) + SCORE_EPSILON);
        assert!((f64::from(hits[0].score) - expected).abs() < 1e-5);
    }

    #[test]
    fn repeated_query_terms_count_twice() {
        let index = index_of(&["cat", "dog"]);
        let once = index.raw_search("cat", 1).unwrap()[0].score;
        let twice = index.raw_search("cat cat", 1).unwrap()[0].score;
        assert!((twice - 2.0 * once).abs() < 1e-5);
    }

    #[test]
    fn vector_query_is_rejected() {
        let index = index_of(&["x"]);
        let err = index.search(Query::Vector(&[1.0]), 1).unwrap_err();
        assert!(matches!(err, Error::InvalidQuery(_)));
    }

    #[test]
    fn invalid_settings_fail() {
        let bad = Bm25Settings { b: -0.1, ..Default::default() };
        assert!(Bm25Index::with_settings(bad).is_err());
    }
}
